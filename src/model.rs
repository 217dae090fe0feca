use crate::{
    error::{FadedeckError, FadedeckResult},
    tween::Ease,
};

/// Load state of one slide's backing image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LoadState {
    Pending,
    Ready,
    Failed,
}

/// One slide of the deck. Created once at construction; the ordinal index is
/// fixed for the component's lifetime.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Slide {
    pub index: usize,
    pub source: String,
    #[serde(default)]
    pub caption: Option<String>,
}

/// An ephemeral navigation intent. The direction sign is advisory, used only
/// for ancillary visuals; `target` is reduced modulo the slide count before
/// any use.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NavigationRequest {
    pub target: usize,
    pub direction: i32,
    pub requested_at: f64,
}

/// Duration profile applied to a session and its subordinate animations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SpeedClass {
    Normal,
    Fast,
}

/// One in-flight primary image transition.
///
/// At most one session is active at any instant; progress is non-decreasing
/// within a session.
#[derive(Clone, Copy, Debug)]
pub struct TransitionSession {
    pub id: u64,
    pub src: usize,
    pub dst: usize,
    pub progress: f64,
    pub started_at: f64,
    pub speed: SpeedClass,
}

/// Which optional sub-systems this slideshow instance carries. The source
/// variants differed only in these capabilities; here they are explicit.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct Capabilities {
    pub has_extra_counter: bool,
    pub has_indicator: bool,
    pub text_animation_enabled: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            has_extra_counter: false,
            has_indicator: true,
            text_animation_enabled: true,
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SlideshowConfig {
    /// Primary transition duration, seconds, for `SpeedClass::Normal`.
    pub normal_duration: f64,
    /// Shortened duration applied to coalesced/interrupting sessions.
    pub fast_duration: f64,
    /// Minimum age of an active session before a new request may interrupt
    /// it early instead of waiting for completion.
    pub grace_interval: f64,
    /// Displacement strength passed to the compositor.
    pub strength: f32,
    /// Fraction of the viewport the presented image may occupy.
    pub image_scale: f64,
    /// Ceiling on indicator morph duration, seconds.
    pub indicator_morph_ceiling: f64,
    pub ease: Ease,
    pub capabilities: Capabilities,
}

impl Default for SlideshowConfig {
    fn default() -> Self {
        Self {
            normal_duration: 0.8,
            fast_duration: 0.4,
            grace_interval: 0.3,
            strength: 0.1,
            image_scale: 0.35,
            indicator_morph_ceiling: 0.4,
            ease: Ease::InOutQuad,
            capabilities: Capabilities::default(),
        }
    }
}

impl SlideshowConfig {
    pub fn validate(&self) -> FadedeckResult<()> {
        for (name, v) in [
            ("normal_duration", self.normal_duration),
            ("fast_duration", self.fast_duration),
            ("indicator_morph_ceiling", self.indicator_morph_ceiling),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(FadedeckError::validation(format!("{name} must be > 0")));
            }
        }
        if !self.grace_interval.is_finite() || self.grace_interval < 0.0 {
            return Err(FadedeckError::validation("grace_interval must be >= 0"));
        }
        if !self.strength.is_finite() || self.strength < 0.0 {
            return Err(FadedeckError::validation("strength must be >= 0"));
        }
        if !self.image_scale.is_finite() || self.image_scale <= 0.0 || self.image_scale > 1.0 {
            return Err(FadedeckError::validation("image_scale must be in (0, 1]"));
        }
        Ok(())
    }

    pub fn duration_for(&self, speed: SpeedClass) -> f64 {
        match speed {
            SpeedClass::Normal => self.normal_duration,
            SpeedClass::Fast => self.fast_duration,
        }
    }
}

/// Counter text for the current slide plus its wrapped neighbors, rendered
/// as 1-based, zero-padded ordinals ("01", "02", ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CounterText {
    pub current: String,
    pub prev: String,
    pub next: String,
}

impl CounterText {
    pub fn for_index(index: usize, total: usize) -> Self {
        Self {
            current: format_ordinal(index),
            prev: format_ordinal(wrap_step(index, -1, total)),
            next: format_ordinal(wrap_step(index, 1, total)),
        }
    }
}

/// Wrapping step arithmetic for arrow navigation.
pub fn wrap_step(index: usize, direction: i32, total: usize) -> usize {
    debug_assert!(total > 0);
    (index as i64 + direction as i64).rem_euclid(total as i64) as usize
}

pub fn format_ordinal(index: usize) -> String {
    format!("{:02}", index + 1)
}
