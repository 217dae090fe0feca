use kurbo::Rect;

use crate::{
    error::{FadedeckError, FadedeckResult},
    tween::{Ease, Tween},
};

#[derive(Clone, Copy, Debug)]
struct Morph {
    from: Rect,
    target: usize,
    tween: Tween,
}

/// Moves the shared selection marker between per-slide anchor boxes.
///
/// Morphs are FLIP-style: the marker's current interpolated box is recorded,
/// then tweened to the target anchor's natural box. A new target always
/// kills and restarts the in-flight morph, never stacks. Exactly one anchor
/// is authoritative at rest; during a morph the previous box is referenced
/// only through the recorded start state.
#[derive(Debug)]
pub struct IndicatorTracker {
    anchors: Vec<Rect>,
    selected: usize,
    hovered: Option<usize>,
    morph: Option<Morph>,
    /// Morph durations never exceed this ceiling, nor the duration of the
    /// transition they accompany.
    morph_ceiling: f64,
    ease: Ease,
}

impl IndicatorTracker {
    pub fn new(anchors: Vec<Rect>, morph_ceiling: f64, ease: Ease) -> FadedeckResult<Self> {
        if anchors.is_empty() {
            return Err(FadedeckError::validation(
                "indicator needs at least one anchor",
            ));
        }
        if !morph_ceiling.is_finite() || morph_ceiling <= 0.0 {
            return Err(FadedeckError::validation("morph ceiling must be > 0"));
        }
        Ok(Self {
            anchors,
            selected: 0,
            hovered: None,
            morph: None,
            morph_ceiling,
            ease,
        })
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn is_morphing(&self, now: f64) -> bool {
        self.morph.is_some_and(|m| !m.tween.finished(now))
    }

    /// Replace anchor layout (viewport resize). An in-flight morph keeps its
    /// recorded start but retargets the new boxes.
    pub fn set_anchors(&mut self, anchors: Vec<Rect>) -> FadedeckResult<()> {
        if anchors.len() != self.anchors.len() {
            return Err(FadedeckError::validation(
                "anchor count is fixed at construction",
            ));
        }
        self.anchors = anchors;
        Ok(())
    }

    pub fn hover_enter(&mut self, index: usize, now: f64) {
        if index >= self.anchors.len() || self.hovered == Some(index) {
            return;
        }
        self.hovered = Some(index);
        self.morph_to(index, self.morph_ceiling, now);
    }

    /// Morph back to the authoritative (selected) anchor.
    pub fn hover_exit(&mut self, now: f64) {
        if self.hovered.take().is_some() {
            self.morph_to(self.selected, self.morph_ceiling, now);
        }
    }

    /// Selection change at transition start. The morph is capped so the
    /// indicator never outlives the primary transition it accompanies.
    pub fn select(&mut self, index: usize, session_duration: f64, now: f64) {
        if index >= self.anchors.len() {
            return;
        }
        self.selected = index;
        self.hovered = None;
        self.morph_to(index, self.morph_ceiling.min(session_duration), now);
    }

    /// Kill any in-flight morph and snap to the authoritative anchor.
    pub fn kill(&mut self) {
        self.morph = None;
        self.hovered = None;
    }

    /// The marker's box at `now`.
    pub fn sample(&self, now: f64) -> Rect {
        match &self.morph {
            None => self.anchors[self.selected],
            Some(m) => {
                let t = m.tween.sample(now);
                lerp_rect(m.from, self.anchors[m.target], t)
            }
        }
    }

    fn morph_to(&mut self, target: usize, duration: f64, now: f64) {
        // FLIP: record the pre-move box, then animate to the natural layout.
        let from = self.sample(now);
        self.morph = Some(Morph {
            from,
            target,
            tween: Tween {
                from: 0.0,
                to: 1.0,
                started_at: now,
                delay: 0.0,
                duration: duration.max(f64::EPSILON),
                ease: self.ease,
            },
        });
    }
}

fn lerp_rect(a: Rect, b: Rect, t: f64) -> Rect {
    Rect::new(
        a.x0 + (b.x0 - a.x0) * t,
        a.y0 + (b.y0 - a.y0) * t,
        a.x1 + (b.x1 - a.x1) * t,
        a.y1 + (b.y1 - a.y1) * t,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchors(n: usize) -> Vec<Rect> {
        (0..n)
            .map(|i| Rect::new(i as f64 * 100.0, 0.0, i as f64 * 100.0 + 80.0, 40.0))
            .collect()
    }

    fn tracker() -> IndicatorTracker {
        IndicatorTracker::new(anchors(4), 0.4, Ease::Linear).unwrap()
    }

    #[test]
    fn rests_on_selected_anchor() {
        let t = tracker();
        assert_eq!(t.sample(0.0), anchors(4)[0]);
        assert!(!t.is_morphing(0.0));
    }

    #[test]
    fn hover_morphs_to_hovered_then_back_to_selected() {
        let mut t = tracker();
        t.hover_enter(2, 0.0);
        assert!(t.is_morphing(0.1));
        let mid = t.sample(0.2);
        assert!(mid.x0 > 0.0 && mid.x0 < 200.0);
        assert_eq!(t.sample(1.0), anchors(4)[2]);

        // Hover exit returns to the selected anchor, not the hovered one.
        t.hover_exit(1.0);
        assert_eq!(t.selected(), 0);
        assert_eq!(t.sample(2.0), anchors(4)[0]);
    }

    #[test]
    fn select_caps_duration_to_session() {
        let mut t = tracker();
        t.select(3, 0.1, 0.0);
        // Ceiling is 0.4 but the session runs 0.1, so the morph is done by then.
        assert_eq!(t.sample(0.1), anchors(4)[3]);
        assert_eq!(t.selected(), 3);
    }

    #[test]
    fn retarget_restarts_from_current_box() {
        let mut t = tracker();
        t.hover_enter(2, 0.0);
        let mid = t.sample(0.2);
        // Retarget mid-flight: new morph starts from the recorded mid box.
        t.hover_enter(1, 0.2);
        assert_eq!(t.sample(0.2), mid);
        assert_eq!(t.sample(1.0), anchors(4)[1]);
    }

    #[test]
    fn kill_snaps_to_authoritative_anchor() {
        let mut t = tracker();
        t.hover_enter(2, 0.0);
        t.kill();
        assert_eq!(t.sample(0.1), anchors(4)[0]);
    }

    #[test]
    fn rejects_empty_anchor_set_and_count_changes() {
        assert!(IndicatorTracker::new(vec![], 0.4, Ease::Linear).is_err());
        let mut t = tracker();
        assert!(t.set_anchors(anchors(3)).is_err());
        assert!(t.set_anchors(anchors(4)).is_ok());
    }
}
