use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::state::{Progress, RunState};

const BAR_TEMPLATE: &str = ":: Progress: [{pos}/{len}] ({percent}%) :: {per_sec} :: Duration: [{elapsed_precise}] :: {msg}";
const SPINNER_TEMPLATE: &str = "{spinner} :: Progress: [{pos}] :: {per_sec} :: Duration: [{elapsed_precise}] :: {msg}";

/// Bar when the candidate count is known, spinner otherwise. Hidden when
/// progress output is disabled, so callers can print through it either way.
pub fn progress_bar(expected: Option<usize>, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let (bar, template) = match expected {
        Some(n) => (ProgressBar::new(n as u64), BAR_TEMPLATE),
        None => (ProgressBar::new_spinner(), SPINNER_TEMPLATE),
    };
    bar.set_draw_target(ProgressDrawTarget::stderr());
    match ProgressStyle::with_template(template) {
        Ok(style) => bar.set_style(style.progress_chars("#>-")),
        Err(e) => tracing::debug!(error = %e, "falling back to default progress style"),
    }
    bar
}

fn refresh(bar: &ProgressBar, progress: &Progress) {
    if progress.expected > 0 {
        bar.set_length(progress.expected as u64);
    }
    bar.set_position(progress.issued as u64);
    bar.set_message(format!("Errors: {}", progress.errors));
}

/// Redraw from a `RunState` snapshot every second until `stop` fires.
pub fn spawn_progress(bar: ProgressBar, state: Arc<RunState>, stop: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = tick.tick() => refresh(&bar, &state.snapshot()),
            }
        }
        refresh(&bar, &state.snapshot());
        bar.finish_and_clear();
    })
}
