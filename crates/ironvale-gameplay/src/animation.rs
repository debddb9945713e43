//! Frame-set arena and animation clocks.
//!
//! This module provides:
//! - `ResourceProvider`, the narrow image-loading seam
//! - `FrameSetArena`, frame sets shared per sprite type
//! - `AnimationPlayer`, a frame clock with a finished flag
//! - `AnimState` and `Facing` used to key frame sets
//!
//! Frame sets follow the `enemy/<sprite>/<state>/<state>_<dir>_NN.png`
//! layout. A missing set falls back to an inert placeholder so a missing
//! asset never stops the simulation.

use glam::Vec2;
use ironvale_common::{ResourceError, SpriteTypeId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Seconds each frame is shown by default.
pub const DEFAULT_FRAME_DURATION: f32 = 0.15;

/// Placeholder sprite side length in pixels.
pub const PLACEHOLDER_SIZE: u32 = 28;

/// Upper bound on frames probed per sequence.
const MAX_SEQUENCE_FRAMES: u32 = 99;

// ============================================================================
// Keys
// ============================================================================

/// Animation state an actor can be drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimState {
    /// Standing still
    Idle,
    /// Moving
    Walk,
    /// Hurt-stun
    Hurt,
    /// Dying / dead
    Dead,
    /// Boss wind-up
    Charge,
    /// Boss strike or player attack
    Attack,
}

impl AnimState {
    /// States loaded for every enemy sprite.
    pub const ENEMY: [Self; 4] = [Self::Idle, Self::Walk, Self::Hurt, Self::Dead];

    /// Extra states loaded for elite sprites.
    pub const BOSS: [Self; 2] = [Self::Charge, Self::Attack];

    /// Folder and file name fragment.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Walk => "walk",
            Self::Hurt => "hurt",
            Self::Dead => "dead",
            Self::Charge => "charge",
            Self::Attack => "attack",
        }
    }
}

/// Four-way facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    /// Toward +y
    #[default]
    Down,
    /// Toward -y
    Up,
    /// Toward -x
    Left,
    /// Toward +x
    Right,
}

impl Facing {
    /// All facings in load order.
    pub const ALL: [Self; 4] = [Self::Down, Self::Left, Self::Right, Self::Up];

    /// Facing for a direction vector, or `None` for a zero vector.
    ///
    /// Horizontal wins when `|x| > |y|`.
    #[must_use]
    pub fn from_vector(v: Vec2) -> Option<Self> {
        if v.length_squared() == 0.0 {
            return None;
        }
        Some(if v.x.abs() > v.y.abs() {
            if v.x > 0.0 {
                Self::Right
            } else {
                Self::Left
            }
        } else if v.y > 0.0 {
            Self::Down
        } else {
            Self::Up
        })
    }

    /// Unit vector for this facing.
    #[must_use]
    pub const fn unit(self) -> Vec2 {
        match self {
            Self::Down => Vec2::new(0.0, 1.0),
            Self::Up => Vec2::new(0.0, -1.0),
            Self::Left => Vec2::new(-1.0, 0.0),
            Self::Right => Vec2::new(1.0, 0.0),
        }
    }

    /// File name fragment.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Down => "down",
            Self::Up => "up",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

// ============================================================================
// Resources
// ============================================================================

/// A loaded image, owned by the resource layer and referenced by handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHandle {
    /// Relative path the image was loaded from
    pub path: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Image loading seam. Failures are recoverable.
pub trait ResourceProvider {
    /// Load an image by relative path.
    fn load_image(&self, path: &str) -> Result<ImageHandle, ResourceError>;
}

/// In-memory listing of the images a content pack ships.
#[derive(Debug, Clone, Default)]
pub struct ImageManifest {
    images: HashMap<String, (u32, u32)>,
}

impl ImageManifest {
    /// Create an empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare one image.
    pub fn insert(&mut self, path: impl Into<String>, width: u32, height: u32) {
        self.images.insert(path.into(), (width, height));
    }

    /// Declare a numbered frame sequence for an enemy sprite (builder pattern).
    #[must_use]
    pub fn with_sequence(mut self, sprite: &str, state: AnimState, facing: Facing, frames: u32) -> Self {
        for index in 1..=frames {
            self.insert(frame_path(sprite, state, facing, index), 64, 64);
        }
        self
    }

    /// Declare a sequence for every facing (builder pattern).
    #[must_use]
    pub fn with_all_facings(mut self, sprite: &str, state: AnimState, frames: u32) -> Self {
        for facing in Facing::ALL {
            self = self.with_sequence(sprite, state, facing, frames);
        }
        self
    }

    /// Number of declared images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ResourceProvider for ImageManifest {
    fn load_image(&self, path: &str) -> Result<ImageHandle, ResourceError> {
        self.images
            .get(path)
            .map(|(width, height)| ImageHandle {
                path: path.to_string(),
                width: *width,
                height: *height,
            })
            .ok_or_else(|| ResourceError::ImageNotFound(path.to_string()))
    }
}

/// Relative path for one frame.
#[must_use]
pub fn frame_path(sprite: &str, state: AnimState, facing: Facing, index: u32) -> String {
    format!(
        "enemy/{sprite}/{state}/{state}_{dir}_{index:02}.png",
        state = state.name(),
        dir = facing.name()
    )
}

// ============================================================================
// Frame Sets
// ============================================================================

/// Ordered frames for one (sprite, state, facing).
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSet {
    /// Frames in play order (never empty)
    pub frames: Vec<ImageHandle>,
    /// Seconds per frame
    pub frame_duration: f32,
    /// True when no real frames were found
    pub placeholder: bool,
}

impl FrameSet {
    /// One inert frame standing in for missing art.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            frames: vec![ImageHandle {
                path: String::new(),
                width: PLACEHOLDER_SIZE,
                height: PLACEHOLDER_SIZE,
            }],
            frame_duration: DEFAULT_FRAME_DURATION,
            placeholder: true,
        }
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the set has no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Clock that plays this set.
    #[must_use]
    pub fn player(&self, looping: bool) -> AnimationPlayer {
        AnimationPlayer::new(self.len(), self.frame_duration, looping)
    }
}

/// Shared frame sets, loaded once per sprite type.
#[derive(Debug)]
pub struct FrameSetArena {
    names: Vec<String>,
    by_name: HashMap<String, SpriteTypeId>,
    sets: HashMap<(SpriteTypeId, AnimState, Facing), FrameSet>,
    placeholder: FrameSet,
    warned: HashSet<String>,
}

impl Default for FrameSetArena {
    fn default() -> Self {
        Self {
            names: Vec::new(),
            by_name: HashMap::new(),
            sets: HashMap::new(),
            placeholder: FrameSet::placeholder(),
            warned: HashSet::new(),
        }
    }
}

impl FrameSetArena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every frame set for a sprite, or return the existing id.
    pub fn register<P>(&mut self, sprite: &str, include_boss_states: bool, provider: &P) -> SpriteTypeId
    where
        P: ResourceProvider + ?Sized,
    {
        if let Some(id) = self.by_name.get(sprite) {
            return *id;
        }

        let id = SpriteTypeId::new(self.names.len() as u32);
        self.names.push(sprite.to_string());
        self.by_name.insert(sprite.to_string(), id);

        let extra: &[AnimState] = if include_boss_states { &AnimState::BOSS } else { &[] };
        let mut missing = 0;
        for state in AnimState::ENEMY.iter().chain(extra) {
            for facing in Facing::ALL {
                let frames = load_sequence(provider, sprite, *state, facing);
                if frames.is_empty() {
                    missing += 1;
                    continue;
                }
                self.sets.insert(
                    (id, *state, facing),
                    FrameSet {
                        frames,
                        frame_duration: DEFAULT_FRAME_DURATION,
                        placeholder: false,
                    },
                );
            }
        }

        if missing > 0 && self.warned.insert(sprite.to_string()) {
            warn!(sprite, missing, "frame sets missing, using placeholder art");
        }
        debug!(sprite, id = id.raw(), "sprite type registered");
        id
    }

    /// Id for an already registered sprite.
    #[must_use]
    pub fn sprite_id(&self, sprite: &str) -> Option<SpriteTypeId> {
        self.by_name.get(sprite).copied()
    }

    /// Sprite name for an id.
    #[must_use]
    pub fn sprite_name(&self, id: SpriteTypeId) -> Option<&str> {
        self.names.get(id.index()).map(String::as_str)
    }

    /// Frame set for a key, falling back to the placeholder.
    #[must_use]
    pub fn frame_set(&self, id: SpriteTypeId, state: AnimState, facing: Facing) -> &FrameSet {
        self.sets
            .get(&(id, state, facing))
            .unwrap_or(&self.placeholder)
    }

    /// Whether real frames exist for a key.
    #[must_use]
    pub fn has_frames(&self, id: SpriteTypeId, state: AnimState, facing: Facing) -> bool {
        self.sets.contains_key(&(id, state, facing))
    }

    /// Seconds the death animation plays before removal.
    ///
    /// 0.15 s per dead frame, or 0.4 s when the sprite has none.
    #[must_use]
    pub fn death_duration(&self, id: SpriteTypeId, facing: Facing) -> f32 {
        match self.sets.get(&(id, AnimState::Dead, facing)) {
            Some(set) => DEFAULT_FRAME_DURATION * set.len() as f32,
            None => 0.4,
        }
    }

    /// Number of registered sprite types.
    #[must_use]
    pub fn sprite_count(&self) -> usize {
        self.names.len()
    }
}

fn load_sequence<P>(provider: &P, sprite: &str, state: AnimState, facing: Facing) -> Vec<ImageHandle>
where
    P: ResourceProvider + ?Sized,
{
    (1..=MAX_SEQUENCE_FRAMES)
        .map_while(|index| provider.load_image(&frame_path(sprite, state, facing, index)).ok())
        .collect()
}

// ============================================================================
// Clock
// ============================================================================

/// Frame clock for one animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationPlayer {
    frame_count: usize,
    frame_duration: f32,
    looping: bool,
    frame: usize,
    accumulator: f32,
    finished: bool,
}

impl AnimationPlayer {
    /// Create a clock. A zero frame count is treated as one frame.
    #[must_use]
    pub fn new(frame_count: usize, frame_duration: f32, looping: bool) -> Self {
        Self {
            frame_count: frame_count.max(1),
            frame_duration: frame_duration.max(f32::EPSILON),
            looping,
            frame: 0,
            accumulator: 0.0,
            finished: false,
        }
    }

    /// Advance by `dt`. Large steps may cross several frames.
    ///
    /// A non-looping clock finishes when it runs past its last frame, so a
    /// single-frame animation finishes after one frame duration.
    pub fn advance(&mut self, dt: f32) {
        if self.finished {
            return;
        }
        self.accumulator += dt.max(0.0);
        while self.accumulator >= self.frame_duration {
            self.accumulator -= self.frame_duration;
            self.frame += 1;
            if self.frame >= self.frame_count {
                if self.looping {
                    self.frame = 0;
                } else {
                    self.frame = self.frame_count - 1;
                    self.finished = true;
                    break;
                }
            }
        }
    }

    /// Restart from the first frame.
    pub fn reset(&mut self) {
        self.frame = 0;
        self.accumulator = 0.0;
        self.finished = false;
    }

    /// Current frame index.
    #[must_use]
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Whether a non-looping clock has played through.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Total play time for one pass.
    #[must_use]
    pub fn total_duration(&self) -> f32 {
        self.frame_count as f32 * self.frame_duration
    }
}
