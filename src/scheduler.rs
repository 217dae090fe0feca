use tracing::{debug, trace};

use crate::{
    error::{FadedeckError, FadedeckResult},
    model::{NavigationRequest, SpeedClass, TransitionSession, wrap_step},
    tween::Ease,
};

#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    pub normal_duration: f64,
    pub fast_duration: f64,
    pub grace_interval: f64,
    pub ease: Ease,
}

/// Snapshot of a session at the moment it is admitted. Carried on decisions
/// and tick outcomes so subordinate systems can start their own timelines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionStart {
    pub id: u64,
    pub src: usize,
    pub dst: usize,
    pub speed: SpeedClass,
    pub duration: f64,
}

/// Outcome of submitting a navigation request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Decision {
    /// A new session began from idle.
    Started(SessionStart),
    /// The active session was past the grace interval: its destination was
    /// committed immediately and the request became a new Fast session.
    Interrupted { committed: usize, started: SessionStart },
    /// Stored as the pending request, overwriting any prior one.
    Coalesced,
    Dropped(DropReason),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// Assets not ready yet; the UI is inert.
    NotReady,
    /// Request targets the slide already current.
    AlreadyCurrent,
    /// Request targets the active session's destination.
    AlreadyActiveDestination,
    /// Request targets the slide already pending.
    AlreadyPending,
}

/// Outcome of a render tick while a session is active.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    /// Session still running; carries the eased progress.
    Progress(f64),
    /// Session finished; `current` is the committed index, `promoted` the
    /// Fast session spawned from a pending request, if one was waiting.
    Completed {
        current: usize,
        promoted: Option<SessionStart>,
    },
}

#[derive(Clone, Copy, Debug)]
enum State {
    Loading,
    Idle,
    Transitioning(TransitionSession),
}

/// Decides, under arbitrary and possibly rapid input, which transition is
/// live versus coalesced or dropped.
///
/// Exactly one session is active at any instant. A request arriving during
/// a young session (under the grace interval) replaces the pending request
/// (last wins, never queued); past the grace interval it interrupts the
/// session outright, committing its destination first so state never
/// straddles two transitions.
#[derive(Debug)]
pub struct NavigationScheduler {
    config: SchedulerConfig,
    state: State,
    pending: Option<NavigationRequest>,
    current: usize,
    total: usize,
    next_session_id: u64,
}

impl NavigationScheduler {
    pub fn new(total: usize, config: SchedulerConfig) -> FadedeckResult<Self> {
        if total == 0 {
            return Err(FadedeckError::validation("slide count must be > 0"));
        }
        Ok(Self {
            config,
            state: State::Loading,
            pending: None,
            current: 0,
            total,
            next_session_id: 1,
        })
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, State::Loading)
    }

    pub fn active_session(&self) -> Option<&TransitionSession> {
        match &self.state {
            State::Transitioning(s) => Some(s),
            _ => None,
        }
    }

    pub fn pending_target(&self) -> Option<usize> {
        self.pending.map(|r| r.target)
    }

    /// All assets resolved; navigation may begin.
    pub fn mark_ready(&mut self) {
        if matches!(self.state, State::Loading) {
            debug!("scheduler ready, accepting navigation");
            self.state = State::Idle;
        }
    }

    /// The index a step request should advance from: the latest decided
    /// destination, so bursts of arrow presses move sequentially.
    fn step_base(&self) -> usize {
        self.pending
            .map(|r| r.target)
            .or_else(|| self.active_session().map(|s| s.dst))
            .unwrap_or(self.current)
    }

    /// Arrow navigation: wraps modulo the slide count.
    pub fn request_step(&mut self, direction: i32, now: f64) -> Decision {
        let target = wrap_step(self.step_base(), direction, self.total);
        self.request(
            NavigationRequest {
                target,
                direction,
                requested_at: now,
            },
            now,
        )
    }

    /// Direct jump (thumbnail click): absolute target, normalized modulo
    /// the slide count before use, never surfaced as an error.
    pub fn request_jump(&mut self, target: usize, now: f64) -> Decision {
        let target = target % self.total;
        let direction = if target >= self.step_base() { 1 } else { -1 };
        self.request(
            NavigationRequest {
                target,
                direction,
                requested_at: now,
            },
            now,
        )
    }

    pub fn request(&mut self, request: NavigationRequest, now: f64) -> Decision {
        let request = NavigationRequest {
            target: request.target % self.total,
            ..request
        };

        match self.state {
            State::Loading => {
                trace!(target = request.target, "dropping request while loading");
                Decision::Dropped(DropReason::NotReady)
            }
            State::Idle => {
                if request.target == self.current {
                    return Decision::Dropped(DropReason::AlreadyCurrent);
                }
                let start = self.begin_session(request.target, SpeedClass::Normal, now);
                Decision::Started(start)
            }
            State::Transitioning(session) => {
                if request.target == session.dst {
                    return Decision::Dropped(DropReason::AlreadyActiveDestination);
                }
                if self.pending_target() == Some(request.target) {
                    return Decision::Dropped(DropReason::AlreadyPending);
                }

                if now - session.started_at >= self.config.grace_interval {
                    // Already committed: end the session early and promote
                    // the request without waiting for completion.
                    self.current = session.dst;
                    self.pending = None;
                    debug!(
                        session = session.id,
                        committed = session.dst,
                        target = request.target,
                        "interrupting active session"
                    );
                    let start = self.begin_session(request.target, SpeedClass::Fast, now);
                    Decision::Interrupted {
                        committed: start.src,
                        started: start,
                    }
                } else {
                    trace!(
                        session = session.id,
                        target = request.target,
                        replaced = ?self.pending.map(|r| r.target),
                        "coalescing request"
                    );
                    self.pending = Some(request);
                    Decision::Coalesced
                }
            }
        }
    }

    /// Advance the active session to `now`. Returns `None` while idle or
    /// loading. Progress is eased and non-decreasing within a session.
    pub fn tick(&mut self, now: f64) -> Option<TickOutcome> {
        let State::Transitioning(session) = &mut self.state else {
            return None;
        };

        let duration = match session.speed {
            SpeedClass::Normal => self.config.normal_duration,
            SpeedClass::Fast => self.config.fast_duration,
        };
        let elapsed = now - session.started_at;

        if elapsed < duration {
            let eased = self.config.ease.apply(elapsed / duration);
            session.progress = session.progress.max(eased);
            return Some(TickOutcome::Progress(session.progress));
        }

        let finished = *session;
        self.current = finished.dst;
        self.state = State::Idle;
        debug!(session = finished.id, current = self.current, "session completed");

        let promoted = self.pending.take().map(|r| {
            let start = self.begin_session(r.target, SpeedClass::Fast, now);
            debug!(target = r.target, "promoting coalesced request");
            start
        });

        Some(TickOutcome::Completed {
            current: finished.dst,
            promoted,
        })
    }

    fn begin_session(&mut self, dst: usize, speed: SpeedClass, now: f64) -> SessionStart {
        let id = self.next_session_id;
        self.next_session_id += 1;
        let duration = match speed {
            SpeedClass::Normal => self.config.normal_duration,
            SpeedClass::Fast => self.config.fast_duration,
        };
        let session = TransitionSession {
            id,
            src: self.current,
            dst,
            progress: 0.0,
            started_at: now,
            speed,
        };
        debug!(id, src = session.src, dst, ?speed, "session started");
        self.state = State::Transitioning(session);
        SessionStart {
            id,
            src: session.src,
            dst,
            speed,
            duration,
        }
    }
}
