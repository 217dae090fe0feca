use crate::error::{FadedeckError, FadedeckResult};

/// Easing curves applied to normalized transition progress.
///
/// `InOutQuad` is the primary-session default ("power2.inOut" in the
/// original timeline engine).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    OutCubic,
    InOutCubic,
    OutExpo,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::OutExpo => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - (2.0f64).powf(-10.0 * t)
                }
            }
        }
    }
}

/// A single numeric tween: `from` → `to` over `duration` seconds, starting
/// `delay` seconds after `started_at`.
///
/// Time is an externally supplied monotonic clock in seconds; sampling is a
/// pure function of `now`, so owners cancel a tween by dropping or replacing
/// it; there is no background state to unwind.
#[derive(Clone, Copy, Debug)]
pub struct Tween {
    pub from: f64,
    pub to: f64,
    pub started_at: f64,
    pub delay: f64,
    pub duration: f64,
    pub ease: Ease,
}

impl Tween {
    pub fn new(from: f64, to: f64, started_at: f64, duration: f64, ease: Ease) -> FadedeckResult<Self> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(FadedeckError::animation("tween duration must be > 0"));
        }
        Ok(Self {
            from,
            to,
            started_at,
            delay: 0.0,
            duration,
            ease,
        })
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    /// Eased progress in [0,1]. Clamps before the delayed start and after
    /// the end, so sampling outside the active window is well defined.
    pub fn progress(&self, now: f64) -> f64 {
        let elapsed = now - self.started_at - self.delay;
        self.ease.apply(elapsed / self.duration)
    }

    pub fn sample(&self, now: f64) -> f64 {
        let t = self.progress(now);
        self.from + (self.to - self.from) * t
    }

    pub fn finished(&self, now: f64) -> bool {
        now - self.started_at - self.delay >= self.duration
    }
}
