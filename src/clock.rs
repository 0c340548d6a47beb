use bevy::time::{Timer, TimerMode};
use std::time::Duration;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum LoopState {
    #[default]
    Running,
    Paused,
}

#[derive(Debug)]
struct PendingResume {
    timer: Timer,
    /// Transition count when the resume was armed.
    epoch: u64,
}

/// Gate for the simulation tick. The presentation tick never consults it.
#[derive(Debug, Default)]
pub struct SimClock {
    state: LoopState,
    epoch: u64,
    pending_resume: Option<PendingResume>,
    ticks: u64,
}

impl SimClock {
    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Number of simulation ticks taken so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn record_tick(&mut self) {
        self.ticks += 1;
    }

    /// Returns `true` when this call changed the state.
    pub fn pause(&mut self) -> bool {
        self.transition(LoopState::Paused)
    }

    pub fn resume(&mut self) -> bool {
        self.transition(LoopState::Running)
    }

    pub fn toggle(&mut self) {
        match self.state {
            LoopState::Running => self.pause(),
            LoopState::Paused => self.resume(),
        };
    }

    /// Arms a delayed resume, replacing any earlier one. It only fires if no
    /// pause or resume happened in between.
    pub fn schedule_resume(&mut self, delay: Duration) {
        self.pending_resume = Some(PendingResume {
            timer: Timer::new(delay, TimerMode::Once),
            epoch: self.epoch,
        });
    }

    pub fn has_pending_resume(&self) -> bool {
        self.pending_resume.is_some()
    }

    /// Advances the auto-resume timer. Returns `true` if it resumed the clock.
    pub fn tick(&mut self, delta: Duration) -> bool {
        let Some(pending) = self.pending_resume.as_mut() else {
            return false;
        };
        pending.timer.tick(delta);
        if !pending.timer.finished() {
            return false;
        }
        let armed_at = pending.epoch;
        self.pending_resume = None;

        // A manual transition since arming makes this resume stale.
        if armed_at != self.epoch || self.state != LoopState::Paused {
            return false;
        }
        self.resume()
    }

    fn transition(&mut self, to: LoopState) -> bool {
        if self.state == to {
            return false;
        }
        self.state = to;
        self.epoch += 1;
        true
    }
}
