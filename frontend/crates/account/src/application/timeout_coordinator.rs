//! Session Timeout Coordinator
//!
//! Runs [`SessionTimeout`] on a background task. The task owns exactly one
//! sleep per loop iteration: every activity or extend signal drops the
//! pending sleep and arms a new one for the recomputed deadline, so timers
//! never overlap. State changes are published on a watch channel and the
//! sign-out handler runs once when the session expires.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

use crate::domain::session_timeout::{SessionTimeout, SessionTimeoutConfig, TimeoutState};

/// Invoked when the inactivity window runs out
#[trait_variant::make(SignOutHandler: Send)]
pub trait LocalSignOutHandler {
    async fn on_timeout(&self);
}

#[derive(Debug, Clone, Copy)]
enum Signal {
    Activity,
    Extend,
}

/// What the coordinator last published
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutSnapshot {
    pub state: TimeoutState,
    /// Set while in Warning: when sign-out happens
    pub expires_at: Option<Instant>,
}

impl TimeoutSnapshot {
    fn of(machine: &SessionTimeout) -> Self {
        let expires_at = match machine.state() {
            TimeoutState::Warning => machine.next_deadline(),
            _ => None,
        };
        Self {
            state: machine.state(),
            expires_at,
        }
    }

    /// Countdown shown in the warning prompt
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}

/// Handle to a running coordinator; dropping it stops the task
pub struct SessionTimeoutHandle {
    signals: mpsc::UnboundedSender<Signal>,
    state: watch::Receiver<TimeoutSnapshot>,
    task: JoinHandle<()>,
}

impl SessionTimeoutHandle {
    /// Start counting from now
    pub fn spawn<H>(config: SessionTimeoutConfig, handler: Arc<H>) -> Self
    where
        H: SignOutHandler + Send + Sync + 'static,
    {
        let machine = SessionTimeout::new(config, Instant::now());
        let (signals, signal_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(TimeoutSnapshot::of(&machine));
        let task = tokio::spawn(run(machine, signal_rx, state_tx, handler));
        Self {
            signals,
            state,
            task,
        }
    }

    /// Pointer, key, touch or scroll activity
    pub fn record_activity(&self) {
        let _ = self.signals.send(Signal::Activity);
    }

    /// "Stay signed in" from the warning prompt
    pub fn extend(&self) {
        let _ = self.signals.send(Signal::Extend);
    }

    pub fn snapshot(&self) -> TimeoutSnapshot {
        *self.state.borrow()
    }

    pub fn state(&self) -> TimeoutState {
        self.snapshot().state
    }

    pub fn subscribe(&self) -> watch::Receiver<TimeoutSnapshot> {
        self.state.clone()
    }

    /// Whether the coordinator has stopped (expired or cancelled)
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SessionTimeoutHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<H>(
    mut machine: SessionTimeout,
    mut signals: mpsc::UnboundedReceiver<Signal>,
    state_tx: watch::Sender<TimeoutSnapshot>,
    handler: Arc<H>,
) where
    H: SignOutHandler + Send + Sync + 'static,
{
    while let Some(deadline) = machine.next_deadline() {
        tokio::select! {
            _ = sleep_until(deadline) => {
                machine.poll(Instant::now());
            }
            signal = signals.recv() => match signal {
                Some(Signal::Activity) => {
                    machine.record_activity(Instant::now());
                }
                Some(Signal::Extend) => {
                    if machine.extend(Instant::now()) {
                        tracing::debug!("Session extended");
                    }
                }
                None => return,
            },
        }

        let snapshot = TimeoutSnapshot::of(&machine);
        state_tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });

        match snapshot.state {
            TimeoutState::Warning => {
                tracing::debug!(
                    remaining_secs = snapshot.remaining(Instant::now()).map(|d| d.as_secs()),
                    "Session about to expire"
                );
            }
            TimeoutState::Expired => {
                tracing::info!("Session expired after inactivity");
                handler.on_timeout().await;
                return;
            }
            TimeoutState::Idle => {}
        }
    }
}
