//! Client-side reconnect policy for the live event subscription.
//!
//! Exponential backoff with a cap and an attempt budget, driven by a single
//! supervisor task so attempts never overlap and an explicit disconnect is
//! one cancellation, not a flag checked across callbacks.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Failed,
}

#[derive(Debug)]
pub enum ConnectError {
    /// Transport-level failure; retried with backoff.
    Transport(String),
    /// The server rejected our credentials; retrying cannot help.
    AuthRejected,
}

#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            cap: Duration::from_secs(30),
            max_attempts: 6,
        }
    }
}

impl BackoffPolicy {
    /// Delay before reconnect attempt `attempt` (1-based):
    /// `min(base * 2^(attempt-1), cap)`. None once the budget is spent.
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let exp = (attempt - 1).min(31);
        let delay = self.base.saturating_mul(1u32 << exp);
        Some(delay.min(self.cap))
    }
}

/// Transport adapter the supervisor drives. Implementations wrap whatever
/// the client platform uses to hold the event subscription open.
#[async_trait]
pub trait Connector: Send {
    /// Try to establish the subscription; returns once connected.
    async fn connect(&mut self) -> Result<(), ConnectError>;

    /// Serve the established session; returns when the transport drops it.
    async fn serve(&mut self);
}

pub struct ReconnectHandle {
    cancel_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl ReconnectHandle {
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Explicit client-initiated disconnect: cancels any in-flight connect
    /// attempt or pending backoff without consuming retries.
    pub fn disconnect(&self) {
        let _ = self.cancel_tx.send(true);
    }
}

pub struct Reconnector<C> {
    connector: C,
    policy: BackoffPolicy,
    state_tx: watch::Sender<ConnectionState>,
    cancel_rx: watch::Receiver<bool>,
}

impl<C: Connector> Reconnector<C> {
    pub fn new(connector: C, policy: BackoffPolicy) -> (Self, ReconnectHandle) {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        (
            Self {
                connector,
                policy,
                state_tx,
                cancel_rx,
            },
            ReconnectHandle {
                cancel_tx,
                state_rx,
            },
        )
    }

    fn set(&self, state: ConnectionState) {
        let _ = self.state_tx.send(state);
    }

    /// Drive the connection until it fails permanently or is disconnected.
    /// Attempts never overlap: a new one is only scheduled after the previous
    /// resolves.
    pub async fn run(mut self) -> ConnectionState {
        let mut attempt: u32 = 0;

        loop {
            self.set(if attempt == 0 {
                ConnectionState::Connecting
            } else {
                ConnectionState::Reconnecting
            });

            let result = tokio::select! {
                _ = cancelled(&mut self.cancel_rx) => {
                    self.set(ConnectionState::Disconnected);
                    return ConnectionState::Disconnected;
                }
                result = self.connector.connect() => result,
            };

            match result {
                Ok(()) => {
                    self.set(ConnectionState::Connected);
                    // Successful connect resets the attempt counter.
                    attempt = 0;

                    tokio::select! {
                        _ = cancelled(&mut self.cancel_rx) => {
                            self.set(ConnectionState::Disconnected);
                            return ConnectionState::Disconnected;
                        }
                        _ = self.connector.serve() => {
                            tracing::debug!("event subscription dropped, scheduling reconnect");
                        }
                    }
                }
                Err(ConnectError::AuthRejected) => {
                    self.set(ConnectionState::Failed);
                    return ConnectionState::Failed;
                }
                Err(ConnectError::Transport(reason)) => {
                    tracing::debug!("connect attempt failed: {reason}");
                }
            }

            attempt += 1;
            let Some(delay) = self.policy.delay(attempt) else {
                self.set(ConnectionState::Failed);
                return ConnectionState::Failed;
            };

            self.set(ConnectionState::Reconnecting);
            tokio::select! {
                _ = cancelled(&mut self.cancel_rx) => {
                    self.set(ConnectionState::Disconnected);
                    return ConnectionState::Disconnected;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

async fn cancelled(rx: &mut watch::Receiver<bool>) {
    if *rx.borrow() {
        return;
    }
    while rx.changed().await.is_ok() {
        if *rx.borrow() {
            return;
        }
    }
    // Handle dropped without disconnecting; never cancel.
    std::future::pending::<()>().await
}
