//! Replay of the winner's recorded solution as a timed sequence of step
//! events. The task only paces the replay; the coordinator applies each
//! step to the robots it owns, so a cancelled preview can never mutate
//! anything after the fact.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::round::InternalEvent;

#[derive(Debug)]
struct ActivePreview {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// At most one preview runs at a time; starting a new one supersedes the
/// old, and stale step events are filtered by generation.
#[derive(Debug, Default)]
pub struct Preview {
    generation: u64,
    active: Option<ActivePreview>,
}

impl Preview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a step event carrying this generation belongs to the
    /// preview currently in flight.
    pub fn current(&self, generation: u64) -> bool {
        self.active.is_some() && self.generation == generation
    }

    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(|a| !a.task.is_finished())
    }

    /// Pace a replay of `move_count` steps: one step event after each
    /// delay, a trailing delay, then a done event so the board can be put
    /// back the way it was before the preview.
    pub fn start(
        &mut self,
        move_count: usize,
        step: Duration,
        tx: &mpsc::UnboundedSender<InternalEvent>,
    ) {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let tx = tx.clone();
        tracing::debug!(moves = move_count, "solution preview started");

        let task = tokio::spawn(async move {
            for index in 0..move_count {
                // Biased so that cancellation wins over an already-elapsed
                // sleep; a cancelled preview must never emit another step.
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(step) => {},
                }
                if tx.send(InternalEvent::PreviewStep { generation, index }).is_err() {
                    return;
                }
            }
            tokio::select! {
                biased;
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(step) => {},
            }
            let _ = tx.send(InternalEvent::PreviewDone { generation });
        });

        self.active = Some(ActivePreview { cancel, task });
    }

    /// Stop the running preview, if any. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            tracing::debug!("solution preview cancelled");
        }
    }
}
