//! Cancellable one-second countdown tasks. The round runs two of these —
//! one for the solution-bid window, one for the move-submission window —
//! and at most one instance of each kind may be in flight.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::round::InternalEvent;

/// Which countdown a tick belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Solution,
    Moves,
}

impl TimerKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Solution => "solution",
            Self::Moves => "moves",
        }
    }
}

#[derive(Debug)]
struct ActiveCountdown {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// A restartable countdown of one kind.
///
/// Each start supersedes the previous instance: the old task is cancelled
/// (observed at its next one-second suspension point) and a bumped
/// generation makes any of its still-queued ticks inert. Cancelling when
/// nothing runs is a no-op.
#[derive(Debug)]
pub struct Countdown {
    kind: TimerKind,
    generation: u64,
    active: Option<ActiveCountdown>,
}

impl Countdown {
    pub fn new(kind: TimerKind) -> Self {
        Self {
            kind,
            generation: 0,
            active: None,
        }
    }

    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a tick carrying this generation belongs to the countdown
    /// currently in flight (and not to a cancelled predecessor).
    pub fn current(&self, generation: u64) -> bool {
        self.active.is_some() && self.generation == generation
    }

    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(|a| !a.task.is_finished())
    }

    /// Count down from the server-supplied number of seconds, emitting one
    /// tick per second and a final elapsed event. Any instance already
    /// running is cancelled first.
    pub fn start(&mut self, seconds: u32, tx: &mpsc::UnboundedSender<InternalEvent>) {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let kind = self.kind;
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let tx = tx.clone();
        tracing::debug!(timer = kind.name(), seconds, "countdown started");

        let task = tokio::spawn(async move {
            for _ in 0..seconds {
                // Biased so that cancellation wins over an already-elapsed
                // sleep; a retired countdown must never tick again.
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {},
                }
                if tx.send(InternalEvent::Tick { kind, generation }).is_err() {
                    return;
                }
            }
            let _ = tx.send(InternalEvent::Elapsed { kind, generation });
        });

        self.active = Some(ActiveCountdown { cancel, task });
    }

    /// Stop the running countdown, if any.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            tracing::debug!(timer = self.kind.name(), "countdown cancelled");
        }
    }
}
