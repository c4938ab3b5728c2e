/*
 * Scheduler Module
 *
 * Frame pacing and deferred actions for the single-threaded engine.
 *
 * The AnimationScheduler gates the host's frame callback to a target rate:
 * a frame opportunity only becomes a tick once a full interval has passed,
 * and the leftover time is carried so the cadence does not drift.
 *
 * Debounce is a single-slot deferred action. Scheduling again replaces the
 * pending value and restarts the delay; every schedule hands back a token
 * that can cancel exactly that scheduling.
 */

use std::time::{Duration, Instant};

pub const DEFAULT_TARGET_FPS: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

#[derive(Debug)]
pub struct AnimationScheduler {
    state: SchedulerState,
    interval: Duration,
    last_tick: Option<Instant>,
    ticks_run: u64,
    ticks_skipped: u64,
}

impl AnimationScheduler {
    pub fn new(target_fps: f32) -> Self {
        let fps = if target_fps.is_finite() && target_fps > 0.0 {
            target_fps
        } else {
            DEFAULT_TARGET_FPS
        };

        Self {
            state: SchedulerState::Stopped,
            interval: Duration::from_secs_f64(1.0 / fps as f64),
            last_tick: None,
            ticks_run: 0,
            ticks_skipped: 0,
        }
    }

    pub fn start(&mut self) {
        if self.state == SchedulerState::Stopped {
            self.state = SchedulerState::Running;
            self.last_tick = None;
        }
    }

    pub fn stop(&mut self) {
        self.state = SchedulerState::Stopped;
        self.last_tick = None;
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    // Decides whether this frame opportunity runs a tick. The first
    // opportunity after `start` always does
    pub fn should_tick(&mut self, now: Instant) -> bool {
        if !self.is_running() {
            return false;
        }

        let last = match self.last_tick {
            Some(last) => last,
            None => {
                self.last_tick = Some(now);
                self.ticks_run += 1;
                return true;
            }
        };

        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.interval {
            self.ticks_skipped += 1;
            return false;
        }

        // Carry the part of the elapsed time that did not fill an interval
        let remainder = elapsed.as_nanos() % self.interval.as_nanos().max(1);
        let remainder = Duration::from_nanos(remainder as u64);
        self.last_tick = Some(now.checked_sub(remainder).unwrap_or(now));
        self.ticks_run += 1;
        true
    }

    pub fn ticks_run(&self) -> u64 {
        self.ticks_run
    }

    pub fn ticks_skipped(&self) -> u64 {
        self.ticks_skipped
    }
}

// Identifies one call to Debounce::schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CancelToken(u64);

#[derive(Debug)]
struct Pending<T> {
    token: CancelToken,
    due: Instant,
    value: T,
}

#[derive(Debug)]
pub struct Debounce<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
    next_token: u64,
}

impl<T> Debounce<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            next_token: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    // Replaces whatever was pending and restarts the delay
    pub fn schedule(&mut self, value: T, now: Instant) -> CancelToken {
        self.next_token += 1;
        let token = CancelToken(self.next_token);
        self.pending = Some(Pending {
            token,
            due: now + self.delay,
            value,
        });
        token
    }

    // Cancels the pending action if it still belongs to `token`
    pub fn cancel(&mut self, token: CancelToken) -> bool {
        match &self.pending {
            Some(pending) if pending.token == token => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    // Hands out the pending value once its delay has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self.pending.as_ref()?.due;
        if now < due {
            return None;
        }
        self.pending.take().map(|pending| pending.value)
    }
}
