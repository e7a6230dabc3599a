use log::{log_enabled, trace, warn, Level};
use std::time::{Duration, Instant};

/// Scoped timer for one phase of a solver step.
///
/// Emits trace records on entry and exit and, when given a sink, adds the
/// elapsed time to it so step metrics can report per-phase cost.
pub struct ScopedTimer<'a> {
    label: &'static str,
    start: Instant,
    sink: Option<&'a mut Duration>,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'static str) -> Self {
        if log_enabled!(Level::Trace) {
            trace!("start {label}");
        }
        Self {
            label,
            start: Instant::now(),
            sink: None,
        }
    }

    pub fn recording(label: &'static str, sink: &'a mut Duration) -> Self {
        let mut timer = Self::new(label);
        timer.sink = Some(sink);
        timer
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        if let Some(sink) = self.sink.as_deref_mut() {
            *sink += elapsed;
        }
        if log_enabled!(Level::Trace) {
            trace!("end {} ({} µs)", self.label, elapsed.as_micros());
        }
    }
}

/// Logs a warning when a step overruns its real-time budget.
pub fn warn_if_step_budget_exceeded(duration: Duration, budget: Duration) {
    if duration > budget {
        warn!(
            "solver step exceeded budget: {:.3} ms > {:.3} ms",
            duration.as_secs_f64() * 1000.0,
            budget.as_secs_f64() * 1000.0
        );
    }
}
