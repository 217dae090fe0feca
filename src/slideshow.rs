use kurbo::Rect;
use tracing::debug;

use crate::{
    assets::AssetReadinessTracker,
    compositor::{PlaneSize, TransitionStyle, compose_into, fit_plane},
    coordinator::{AnimationCoordinator, CaptionFrame, CaptionSpans, CoordinatorConfig, TextSplitter, WhitespaceSplitter},
    error::{FadedeckError, FadedeckResult},
    indicator::IndicatorTracker,
    model::{CounterText, Slide, SlideshowConfig},
    scheduler::{Decision, NavigationScheduler, SchedulerConfig, SessionStart, TickOutcome},
};

/// What the rendering surface needs to draw one frame: the texture pair,
/// the eased progress, and the aspect-fit plane size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderFrame {
    pub from: usize,
    pub to: usize,
    pub progress: f32,
    pub strength: f32,
    pub plane: Option<PlaneSize>,
}

/// Rendering collaborator: receives a "render now" call every frame while a
/// session is active or after a resize.
pub trait RenderSurface {
    fn render(&mut self, frame: &RenderFrame);
}

/// A surface that ignores frames. Useful for headless operation and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSurface;

impl RenderSurface for NullSurface {
    fn render(&mut self, _frame: &RenderFrame) {}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SlideshowEvent {
    /// Every asset has resolved; controls may be enabled.
    Ready,
    SessionStarted {
        id: u64,
        src: usize,
        dst: usize,
    },
    /// The authoritative current index changed (session completion or
    /// interruption commit). Hosts update active/selected control styling.
    IndexChanged {
        index: usize,
    },
    SessionCompleted {
        id: u64,
        index: usize,
    },
}

/// The slide presentation component: one constructed instance holding all
/// state explicitly, no process-wide globals.
///
/// Wires the asset tracker, navigation scheduler, animation coordinator and
/// indicator tracker together and drives the render surface. All methods
/// take `now` in seconds from the host's monotonic clock.
pub struct Slideshow<S: RenderSurface> {
    config: SlideshowConfig,
    style: TransitionStyle,
    slides: Vec<Slide>,
    tracker: AssetReadinessTracker,
    scheduler: NavigationScheduler,
    coordinator: AnimationCoordinator,
    indicator: Option<IndicatorTracker>,
    splitter: Box<dyn TextSplitter>,
    surface: S,
    viewport: (u32, u32),
    frame: RenderFrame,
    last_session_id: u64,
    events: Vec<SlideshowEvent>,
}

impl<S: RenderSurface> Slideshow<S> {
    pub fn new(
        config: SlideshowConfig,
        slides: Vec<Slide>,
        anchors: Option<Vec<Rect>>,
        viewport: (u32, u32),
        surface: S,
    ) -> FadedeckResult<Self> {
        config.validate()?;

        // Required-collaborator check, performed once, failing fast.
        if slides.is_empty() {
            return Err(FadedeckError::missing_collaborator(
                "slide controls: at least one image-backed slide is required",
            ));
        }
        if viewport.0 == 0 || viewport.1 == 0 {
            return Err(FadedeckError::missing_collaborator(
                "rendering surface: viewport must be non-zero",
            ));
        }
        let indicator = if config.capabilities.has_indicator {
            let anchors = anchors.ok_or_else(|| {
                FadedeckError::missing_collaborator(
                    "indicator anchors: capability enabled but no anchor boxes supplied",
                )
            })?;
            if anchors.len() != slides.len() {
                return Err(FadedeckError::missing_collaborator(
                    "indicator anchors: one anchor box per slide is required",
                ));
            }
            Some(IndicatorTracker::new(
                anchors,
                config.indicator_morph_ceiling,
                config.ease,
            )?)
        } else {
            None
        };
        if config.capabilities.text_animation_enabled
            && slides.iter().all(|s| s.caption.is_none())
        {
            return Err(FadedeckError::missing_collaborator(
                "text splitter input: text animation enabled but no slide has a caption",
            ));
        }

        let sources: Vec<String> = slides.iter().map(|s| s.source.clone()).collect();
        let tracker = AssetReadinessTracker::new(&sources)?;
        let scheduler = NavigationScheduler::new(
            slides.len(),
            SchedulerConfig {
                normal_duration: config.normal_duration,
                fast_duration: config.fast_duration,
                grace_interval: config.grace_interval,
                ease: config.ease,
            },
        )?;
        let coordinator = AnimationCoordinator::new(slides.len(), CoordinatorConfig::default());
        let style = TransitionStyle::Displace {
            strength: config.strength,
        };

        Ok(Self {
            config,
            style,
            slides,
            tracker,
            scheduler,
            coordinator,
            indicator,
            splitter: Box::new(WhitespaceSplitter),
            surface,
            viewport,
            frame: RenderFrame {
                from: 0,
                to: 0,
                progress: 0.0,
                strength: 0.0,
                plane: None,
            },
            last_session_id: 0,
            events: Vec::new(),
        })
    }

    pub fn with_splitter(mut self, splitter: Box<dyn TextSplitter>) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_style(mut self, style: TransitionStyle) -> Self {
        self.style = style;
        self
    }

    pub fn is_ready(&self) -> bool {
        !self.scheduler.is_loading()
    }

    pub fn current_index(&self) -> usize {
        self.scheduler.current()
    }

    pub fn counter(&self) -> &CounterText {
        self.coordinator.counter()
    }

    /// The wrapped prev/next ordinals for the auxiliary counter headings,
    /// present only when the capability is configured.
    pub fn auxiliary_counter(&self) -> Option<(&str, &str)> {
        if !self.config.capabilities.has_extra_counter {
            return None;
        }
        let c = self.coordinator.counter();
        Some((c.prev.as_str(), c.next.as_str()))
    }

    /// Drain events accumulated since the last call.
    pub fn drain_events(&mut self) -> Vec<SlideshowEvent> {
        std::mem::take(&mut self.events)
    }

    /// Deliver encoded image bytes for a slide. Decode failures are
    /// recorded per the fallback policy, never fatal.
    pub fn load_bytes(&mut self, index: usize, bytes: &[u8]) -> FadedeckResult<()> {
        if self.tracker.load_bytes(index, bytes)? {
            self.on_all_ready();
        }
        Ok(())
    }

    /// Deliver an already decoded texture for a slide.
    pub fn resolve_texture(
        &mut self,
        index: usize,
        texture: crate::assets::Texture,
    ) -> FadedeckResult<()> {
        if self.tracker.resolve_ok(index, texture)? {
            self.on_all_ready();
        }
        Ok(())
    }

    /// Record a permanent load failure for a slide.
    pub fn resolve_failure(&mut self, index: usize, err: &FadedeckError) -> FadedeckResult<()> {
        if self.tracker.resolve_err(index, err)? {
            self.on_all_ready();
        }
        Ok(())
    }

    fn on_all_ready(&mut self) {
        self.scheduler.mark_ready();
        self.frame.plane = self.plane_for(self.scheduler.current());
        self.events.push(SlideshowEvent::Ready);
        self.surface.render(&self.frame);
    }

    /// Arrow navigation; wraps modulo the slide count.
    pub fn advance(&mut self, direction: i32, now: f64) {
        let decision = self.scheduler.request_step(direction, now);
        self.apply_decision(decision, now);
    }

    /// Thumbnail click: absolute target index.
    pub fn jump(&mut self, target: usize, now: f64) {
        let decision = self.scheduler.request_jump(target, now);
        self.apply_decision(decision, now);
    }

    pub fn hover_enter(&mut self, index: usize, now: f64) {
        if let Some(ind) = &mut self.indicator {
            ind.hover_enter(index, now);
        }
    }

    pub fn hover_exit(&mut self, now: f64) {
        if let Some(ind) = &mut self.indicator {
            ind.hover_exit(now);
        }
    }

    /// Viewport resize: recompute the presentation plane and redraw.
    pub fn resize(&mut self, width: u32, height: u32) -> FadedeckResult<()> {
        if width == 0 || height == 0 {
            return Err(FadedeckError::validation("viewport must be non-zero"));
        }
        self.viewport = (width, height);
        self.frame.plane = self.plane_for(self.frame.to);
        self.surface.render(&self.frame);
        Ok(())
    }

    /// Advance animations to `now` and render if a session is live.
    #[tracing::instrument(skip(self))]
    pub fn tick(&mut self, now: f64) {
        let Some(outcome) = self.scheduler.tick(now) else {
            return;
        };
        match outcome {
            TickOutcome::Progress(p) => {
                self.frame.progress = p as f32;
                self.surface.render(&self.frame);
            }
            TickOutcome::Completed { current, promoted } => {
                self.frame.progress = 1.0;
                self.frame.from = current;
                self.frame.to = current;
                let completed_id = self.last_session_id;
                self.events.push(SlideshowEvent::IndexChanged { index: current });
                self.events.push(SlideshowEvent::SessionCompleted {
                    id: completed_id,
                    index: current,
                });
                match promoted {
                    Some(start) => self.start_session(start, now),
                    None => self.surface.render(&self.frame),
                }
            }
        }
    }

    /// Sampled caption styles for the current instant.
    pub fn caption_frame(&self, now: f64) -> CaptionFrame {
        self.coordinator.sample(now)
    }

    /// The indicator marker's box, if the capability is enabled.
    pub fn indicator_rect(&self, now: f64) -> Option<Rect> {
        self.indicator.as_ref().map(|i| i.sample(now))
    }

    /// Compose the current transition frame into an RGBA8 buffer through
    /// the pure blend, applying the Failed-slide texture fallback.
    pub fn compose_frame(&self, dst: &mut [u8], width: u32, height: u32) -> FadedeckResult<()> {
        let from = self
            .tracker
            .texture(self.frame.from)
            .ok_or_else(|| FadedeckError::asset("no slide texture available"))?;
        let to = self
            .tracker
            .texture(self.frame.to)
            .ok_or_else(|| FadedeckError::asset("no slide texture available"))?;
        compose_into(dst, width, height, from, to, self.frame.progress, &self.style)
    }

    pub fn render_frame(&self) -> &RenderFrame {
        &self.frame
    }

    fn apply_decision(&mut self, decision: Decision, now: f64) {
        match decision {
            Decision::Started(start) => self.start_session(start, now),
            Decision::Interrupted { committed, started } => {
                // Commit the interrupted session's destination before the
                // replacement begins; no state straddles two transitions.
                // The indicator is left alone: `select` restarts its morph
                // from the sampled mid-flight box, so the marker never snaps.
                self.coordinator.kill();
                self.events
                    .push(SlideshowEvent::IndexChanged { index: committed });
                self.start_session(started, now);
            }
            Decision::Coalesced | Decision::Dropped(_) => {}
        }
    }

    fn start_session(&mut self, start: SessionStart, now: f64) {
        self.frame = RenderFrame {
            from: start.src,
            to: start.dst,
            progress: 0.0,
            strength: self.config.strength,
            plane: self.plane_for(start.dst),
        };

        if self.config.capabilities.text_animation_enabled {
            let out_spans = self.spans_for(start.src);
            let in_spans = self.spans_for(start.dst);
            self.coordinator
                .begin_transition(&start, out_spans, in_spans, now);
        } else {
            // Counter digits still update immediately even without text
            // animation.
            self.coordinator
                .begin_transition(&start, CaptionSpans::default(), CaptionSpans::default(), now);
        }
        if let Some(ind) = &mut self.indicator {
            ind.select(start.dst, start.duration, now);
        }

        debug!(id = start.id, src = start.src, dst = start.dst, "slideshow session started");
        self.last_session_id = start.id;
        self.events.push(SlideshowEvent::SessionStarted {
            id: start.id,
            src: start.src,
            dst: start.dst,
        });
        self.surface.render(&self.frame);
    }

    fn spans_for(&self, index: usize) -> CaptionSpans {
        self.slides
            .get(index)
            .and_then(|s| s.caption.as_deref())
            .map(|c| self.splitter.split(c))
            .unwrap_or_default()
    }

    fn plane_for(&self, index: usize) -> Option<PlaneSize> {
        let tex = self.tracker.texture(index)?;
        fit_plane(
            tex.width,
            tex.height,
            self.viewport.0,
            self.viewport.1,
            self.config.image_scale,
        )
        .ok()
    }
}

impl<S: RenderSurface + std::fmt::Debug> std::fmt::Debug for Slideshow<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slideshow")
            .field("slides", &self.slides.len())
            .field("ready", &self.is_ready())
            .field("current", &self.current_index())
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}
