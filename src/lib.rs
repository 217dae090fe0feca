#![forbid(unsafe_code)]

pub mod assets;
pub mod compositor;
pub mod coordinator;
pub mod error;
pub mod indicator;
pub mod model;
pub mod scheduler;
pub mod slideshow;
pub mod tween;

pub use assets::{AssetReadinessTracker, Texture, decode_texture};
pub use compositor::{PlaneSize, TransitionStyle, blend_at, compose_into, displace_blend, fit_plane, parse_style};
pub use coordinator::{AnimationCoordinator, CaptionSpans, TextSplitter, WhitespaceSplitter};
pub use error::{FadedeckError, FadedeckResult};
pub use indicator::IndicatorTracker;
pub use model::{Capabilities, CounterText, LoadState, NavigationRequest, Slide, SlideshowConfig, SpeedClass, TransitionSession};
pub use scheduler::{Decision, DropReason, NavigationScheduler, SessionStart, TickOutcome};
pub use slideshow::{NullSurface, RenderFrame, RenderSurface, Slideshow, SlideshowEvent};
pub use tween::{Ease, Tween};
