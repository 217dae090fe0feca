use crate::{
    model::{CounterText, SpeedClass},
    scheduler::SessionStart,
    tween::Ease,
};

/// Counts of animatable sub-elements for one caption, as produced by the
/// text-splitting collaborator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptionSpans {
    pub chars: usize,
    pub lines: usize,
}

/// Splits a caption into tween-able spans. Only the counts matter here; the
/// host owns the actual sub-elements.
pub trait TextSplitter {
    fn split(&self, caption: &str) -> CaptionSpans;
}

/// Default splitter: one span per non-whitespace character, one per line.
#[derive(Clone, Copy, Debug, Default)]
pub struct WhitespaceSplitter;

impl TextSplitter for WhitespaceSplitter {
    fn split(&self, caption: &str) -> CaptionSpans {
        CaptionSpans {
            chars: caption.chars().filter(|c| !c.is_whitespace()).count(),
            lines: caption.lines().count(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CoordinatorConfig {
    /// Per-character reveal duration, seconds.
    pub char_duration: f64,
    /// Per-line reveal duration, seconds.
    pub line_duration: f64,
    /// Start offset between consecutive characters.
    pub stagger: f64,
    /// Delay before the incoming caption starts revealing, by speed class.
    pub in_delay_normal: f64,
    pub in_delay_fast: f64,
    /// Vertical displacement at the hidden end of the reveal, px.
    pub rise: f64,
    /// Blur at the hidden end of the reveal, px.
    pub blur: f64,
    pub ease: Ease,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            char_duration: 0.3,
            line_duration: 0.4,
            stagger: 0.02,
            in_delay_normal: 0.3,
            in_delay_fast: 0.15,
            rise: 20.0,
            blur: 8.0,
            ease: Ease::OutCubic,
        }
    }
}

/// Visual state of one span at a sampled instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpanStyle {
    pub opacity: f64,
    pub offset_y: f64,
    pub blur: f64,
}

impl SpanStyle {
    fn visible() -> Self {
        Self {
            opacity: 1.0,
            offset_y: 0.0,
            blur: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RevealPhase {
    Out,
    In,
}

#[derive(Clone, Copy, Debug)]
struct RevealTimeline {
    slide: usize,
    phase: RevealPhase,
    spans: CaptionSpans,
    started_at: f64,
    delay: f64,
}

/// Sampled caption styles for one slide.
#[derive(Clone, Debug)]
pub struct SlideCaption {
    pub slide: usize,
    pub chars: Vec<SpanStyle>,
    pub lines: Vec<SpanStyle>,
}

/// Sampled secondary-animation state for one frame.
#[derive(Clone, Debug, Default)]
pub struct CaptionFrame {
    pub outgoing: Option<SlideCaption>,
    pub incoming: Option<SlideCaption>,
}

/// Sequences caption reveal-out/in relative to the primary transition.
///
/// Character and line reveals run in parallel for the outgoing slide; the
/// incoming slide starts after a delay proportional to the speed class.
/// Counter digits update the moment the destination is decided, not at
/// completion. Everything here is a pure function of the sampled time, so
/// killing a timeline snaps spans to their end state with no partial frame.
#[derive(Debug)]
pub struct AnimationCoordinator {
    config: CoordinatorConfig,
    total: usize,
    counter: CounterText,
    out_timeline: Option<RevealTimeline>,
    in_timeline: Option<RevealTimeline>,
}

impl AnimationCoordinator {
    pub fn new(total: usize, config: CoordinatorConfig) -> Self {
        Self {
            config,
            total,
            counter: CounterText::for_index(0, total),
            out_timeline: None,
            in_timeline: None,
        }
    }

    pub fn counter(&self) -> &CounterText {
        &self.counter
    }

    /// Start the sub-timelines for a newly admitted session. Any in-flight
    /// reveal is killed first; the superseded slide snaps to hidden.
    pub fn begin_transition(
        &mut self,
        start: &SessionStart,
        out_spans: CaptionSpans,
        in_spans: CaptionSpans,
        now: f64,
    ) {
        self.kill();
        self.counter = CounterText::for_index(start.dst, self.total);

        let delay = match start.speed {
            SpeedClass::Normal => self.config.in_delay_normal,
            SpeedClass::Fast => self.config.in_delay_fast,
        };

        self.out_timeline = Some(RevealTimeline {
            slide: start.src,
            phase: RevealPhase::Out,
            spans: out_spans,
            started_at: now,
            delay: 0.0,
        });
        self.in_timeline = Some(RevealTimeline {
            slide: start.dst,
            phase: RevealPhase::In,
            spans: in_spans,
            started_at: now,
            delay,
        });
    }

    /// Cancel all sub-timelines without visual glitch: subsequent samples
    /// report no outgoing spans (hidden) and no incoming animation (the
    /// host shows the settled caption).
    pub fn kill(&mut self) {
        self.out_timeline = None;
        self.in_timeline = None;
    }

    pub fn is_settled(&self, now: f64) -> bool {
        self.timeline_finished(self.out_timeline.as_ref(), now)
            && self.timeline_finished(self.in_timeline.as_ref(), now)
    }

    pub fn sample(&self, now: f64) -> CaptionFrame {
        CaptionFrame {
            outgoing: self.out_timeline.as_ref().map(|tl| self.sample_timeline(tl, now)),
            incoming: self.in_timeline.as_ref().map(|tl| self.sample_timeline(tl, now)),
        }
    }

    fn timeline_finished(&self, tl: Option<&RevealTimeline>, now: f64) -> bool {
        let Some(tl) = tl else { return true };
        let last_char = tl.spans.chars.saturating_sub(1) as f64 * self.config.stagger
            + self.config.char_duration;
        let end = last_char.max(self.config.line_duration);
        now - tl.started_at - tl.delay >= end
    }

    fn sample_timeline(&self, tl: &RevealTimeline, now: f64) -> SlideCaption {
        let local = now - tl.started_at - tl.delay;
        let chars = (0..tl.spans.chars)
            .map(|i| {
                let t = (local - i as f64 * self.config.stagger) / self.config.char_duration;
                self.span_style(tl.phase, self.config.ease.apply(t))
            })
            .collect();
        let lines = (0..tl.spans.lines)
            .map(|_| {
                let t = local / self.config.line_duration;
                self.span_style(tl.phase, self.config.ease.apply(t))
            })
            .collect();
        SlideCaption {
            slide: tl.slide,
            chars,
            lines,
        }
    }

    fn span_style(&self, phase: RevealPhase, t: f64) -> SpanStyle {
        match phase {
            // Visible -> hidden: fade, rise, blur.
            RevealPhase::Out => SpanStyle {
                opacity: 1.0 - t,
                offset_y: -self.config.rise * t,
                blur: self.config.blur * t,
            },
            // Symmetric: starts at the same hidden/offset state.
            RevealPhase::In => SpanStyle {
                opacity: t,
                offset_y: -self.config.rise * (1.0 - t),
                blur: self.config.blur * (1.0 - t),
            },
        }
    }
}
