/// Render pass scheduling.
///
/// Viewport events arrive far faster than heat passes are worth running,
/// so requests funnel through a three-state machine: `Idle` accepts a
/// request and either fires right away (enough time since the last pass)
/// or arms a trailing-edge deadline; further requests while `Pending`
/// collapse into that one deadline; requests while `Rendering` mark the
/// pass dirty so exactly one follow-up runs afterwards.
///
/// The scheduler never sleeps or spawns anything. The host pumps it with
/// [`RenderScheduler::poll`] from its event loop and parks on
/// [`RenderScheduler::next_deadline`] in between, which keeps the whole
/// pipeline single-threaded and deterministic under test.
use instant::Instant;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Pending,
    Rendering,
}

/// What a render request resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderDecision {
    /// Due now; the next poll in the same event turn picks it up.
    Immediate,
    /// Armed for the trailing edge of the throttle window.
    Scheduled(Instant),
    /// A pass is mid-flight; it re-arms itself on completion.
    Deferred,
}

pub struct RenderScheduler {
    interval: Duration,
    state: SchedulerState,
    deadline: Option<Instant>,
    last_finish: Option<Instant>,
    dirty: bool,
}

impl RenderScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: SchedulerState::Idle,
            deadline: None,
            last_finish: None,
            dirty: false,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Swap the throttle interval (zoom band changes). Takes effect on the
    /// next request; an already-armed deadline is left alone.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Deadline the host should wake at, if one is armed.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            SchedulerState::Pending => self.deadline,
            _ => None,
        }
    }

    /// Ask for a render pass.
    pub fn request(&mut self, now: Instant) -> RenderDecision {
        match self.state {
            SchedulerState::Rendering => {
                self.dirty = true;
                RenderDecision::Deferred
            }
            SchedulerState::Idle => {
                let due = self
                    .last_finish
                    .map_or(true, |t| now.duration_since(t) >= self.interval);
                self.state = SchedulerState::Pending;
                if due {
                    self.deadline = Some(now);
                    RenderDecision::Immediate
                } else {
                    // last_finish is always set when we are not yet due
                    let deadline = self.last_finish.map_or(now, |t| t + self.interval);
                    self.deadline = Some(deadline);
                    RenderDecision::Scheduled(deadline)
                }
            }
            SchedulerState::Pending => {
                // Trailing edge: every request inside the window re-arms the
                // same target, recomputed so an interval change (zoom band
                // switch) is picked up mid-flight.
                let target = self
                    .last_finish
                    .map_or(now, |t| (t + self.interval).max(now));
                self.deadline = Some(target);
                if target <= now {
                    RenderDecision::Immediate
                } else {
                    RenderDecision::Scheduled(target)
                }
            }
        }
    }

    /// True exactly once per armed deadline, when it has elapsed. The
    /// caller must run the pass and then call [`RenderScheduler::finish`].
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.state != SchedulerState::Pending {
            return false;
        }
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.state = SchedulerState::Rendering;
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Record pass completion. If requests arrived mid-pass, arm exactly
    /// one trailing deadline a full interval out.
    pub fn finish(&mut self, now: Instant) {
        self.last_finish = Some(now);
        if self.dirty {
            self.dirty = false;
            self.state = SchedulerState::Pending;
            self.deadline = Some(now + self.interval);
        } else {
            self.state = SchedulerState::Idle;
            self.deadline = None;
        }
    }

    /// Drop any armed deadline and pending dirt. Nothing fires after this
    /// until a fresh request arrives.
    pub fn cancel(&mut self) {
        self.state = SchedulerState::Idle;
        self.deadline = None;
        self.dirty = false;
    }
}
