//! Time-based progress simulation shown while an upload is in flight.
//!
//! The numbers here are cosmetic: the server reports nothing until the whole
//! report is ready, so the bar walks toward per-stage targets on a fixed tick
//! while a second timer promotes the stage label.

use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;

pub const TICK_INTERVAL: Duration = Duration::from_millis(100);
pub const TICK_STEP: f32 = 0.5;
pub const COMPLETED_LABEL: &str = "Completed!";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stage {
    pub label: &'static str,
    pub target: f32,
    pub dwell: Duration,
}

pub const STAGES: [Stage; 4] = [
    Stage {
        label: "Uploading file...",
        target: 25.0,
        dwell: Duration::from_millis(2000),
    },
    Stage {
        label: "Reading domains...",
        target: 40.0,
        dwell: Duration::from_millis(2000),
    },
    // Domain checks dominate server latency.
    Stage {
        label: "Checking domains...",
        target: 90.0,
        dwell: Duration::from_millis(5000),
    },
    Stage {
        label: "Building Excel report...",
        target: 100.0,
        dwell: Duration::from_millis(2000),
    },
];

/// Progress of one session. `percent` never decreases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSimulation {
    percent: f32,
    stage: usize,
    finished: bool,
}

impl Default for ProgressSimulation {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSimulation {
    pub fn new() -> Self {
        Self {
            percent: 0.0,
            stage: 0,
            finished: false,
        }
    }

    pub fn percent(&self) -> f32 {
        self.percent
    }

    pub fn stage_index(&self) -> usize {
        self.stage
    }

    pub fn stage(&self) -> &'static Stage {
        &STAGES[self.stage]
    }

    pub fn is_final_stage(&self) -> bool {
        self.stage + 1 == STAGES.len()
    }

    pub fn label(&self) -> &'static str {
        if self.finished {
            COMPLETED_LABEL
        } else {
            self.stage().label
        }
    }

    /// One tick: move toward the current stage's target without overshooting.
    /// Returns whether the value changed.
    pub fn tick(&mut self) -> bool {
        if self.finished {
            return false;
        }
        let target = self.stage().target;
        if self.percent >= target {
            return false;
        }
        self.percent = (self.percent + TICK_STEP).min(target);
        true
    }

    /// Promotes the label to the next stage. Returns false on the last stage.
    pub fn advance_stage(&mut self) -> bool {
        if self.finished || self.is_final_stage() {
            return false;
        }
        self.stage += 1;
        true
    }

    /// A terminal response arrived: jump to 100 whatever the current value.
    pub fn complete(&mut self) {
        self.percent = 100.0;
        self.stage = STAGES.len() - 1;
        self.finished = true;
    }

    pub fn view(&self) -> ProgressView {
        ProgressView {
            percent: self.percent,
            stage_label: self.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressView {
    pub percent: f32,
    pub stage_label: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimerCounts {
    pub tick: usize,
    pub stage_advance: usize,
}

impl TimerCounts {
    pub fn total(&self) -> usize {
        self.tick + self.stage_advance
    }
}

/// Timer handles of the live session. Cancelling aborts both tasks; callbacks
/// additionally re-check their session id, so an aborted task that was
/// already past its await point still changes nothing.
#[derive(Debug, Default)]
pub struct ProgressTimers {
    tick: Option<JoinHandle<()>>,
    stage_advance: Option<JoinHandle<()>>,
}

impl ProgressTimers {
    pub fn arm(&mut self, tick: JoinHandle<()>, stage_advance: JoinHandle<()>) {
        self.cancel();
        self.tick = Some(tick);
        self.stage_advance = Some(stage_advance);
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.tick.take() {
            handle.abort();
        }
        if let Some(handle) = self.stage_advance.take() {
            handle.abort();
        }
    }

    pub fn counts(&self) -> TimerCounts {
        let live = |handle: &Option<JoinHandle<()>>| {
            usize::from(handle.as_ref().is_some_and(|handle| !handle.is_finished()))
        };
        TimerCounts {
            tick: live(&self.tick),
            stage_advance: live(&self.stage_advance),
        }
    }
}

impl Drop for ProgressTimers {
    fn drop(&mut self) {
        self.cancel();
    }
}
