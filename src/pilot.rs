//! # Pilot
//!
//! Connects a [`ControlSession`] to a [`DroneTransport`].
//!
//! The pilot is driven by the single control loop in `main`: input events
//! and ticks arrive one at a time, so session state needs no locking.
//!
//! - Button actions are forwarded immediately, fire-and-forget
//! - Velocities only leave through [`Pilot::on_tick`], once per period
//! - Failed sends are counted and logged, never retried; the next tick
//!   carries the latest state anyway

use tracing::{debug, info, trace, warn};

use crate::controller::events::PadEvent;
use crate::controller::translator::{ControlSession, DroneAction};
use crate::drone::{self, DroneTransport};

/// Number of velocity commands between status log messages.
pub const LOG_INTERVAL_COMMANDS: u64 = 1000;

/// Whether the control loop should keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Counters for the status log and the shutdown summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PilotStats {
    pub commands_sent: u64,
    pub send_failures: u64,
    pub actions_sent: u64,
    pub action_failures: u64,
}

/// Owns the control session and the drone link for one flight.
#[derive(Debug)]
pub struct Pilot<T: DroneTransport> {
    session: ControlSession,
    transport: T,
    stats: PilotStats,
    last_log_count: u64,
}

impl<T: DroneTransport> Pilot<T> {
    /// Creates a pilot around a fresh session.
    pub fn new(session: ControlSession, transport: T) -> Self {
        Self {
            session,
            transport,
            stats: PilotStats::default(),
            last_log_count: 0,
        }
    }

    /// The control session.
    pub fn session(&self) -> &ControlSession {
        &self.session
    }

    /// Counters so far.
    pub fn stats(&self) -> PilotStats {
        self.stats
    }

    /// Feeds one input event through the session.
    ///
    /// Returns [`Flow::Stop`] on [`PadEvent::Quit`].
    pub async fn handle_event(&mut self, event: PadEvent) -> Flow {
        if event == PadEvent::Quit {
            return Flow::Stop;
        }

        trace!("{}", event);

        if let Some(action) = self.session.handle_event(&event) {
            self.dispatch(action).await;
        }

        Flow::Continue
    }

    /// Sends the current velocity snapshot if armed.
    ///
    /// Returns `true` if a command was sent successfully.
    pub async fn on_tick(&mut self) -> bool {
        let Some(command) = self.session.tick() else {
            return false;
        };

        match self.transport.send_velocity(command).await {
            Ok(()) => {
                self.stats.commands_sent += 1;

                if self.stats.commands_sent - self.last_log_count >= LOG_INTERVAL_COMMANDS {
                    info!(
                        "Sent {} velocity commands ({} failed)",
                        self.stats.commands_sent, self.stats.send_failures
                    );
                    self.last_log_count = self.stats.commands_sent;
                }
                true
            }
            Err(e) => {
                self.stats.send_failures += 1;
                debug!("Failed to send velocity: {}", e);
                false
            }
        }
    }

    /// Ends the flight, landing first if still armed.
    pub async fn shutdown(mut self) -> PilotStats {
        if let Some(action) = self.session.release() {
            info!("Still armed, landing before exit");
            self.dispatch(action).await;
        }
        self.stats
    }

    async fn dispatch(&mut self, action: DroneAction) {
        debug!("Dispatching {:?}", action);

        match drone::execute(&mut self.transport, action).await {
            Ok(()) => self.stats.actions_sent += 1,
            Err(e) => {
                self.stats.action_failures += 1;
                warn!("{:?} failed: {}", action, e);
            }
        }
    }
}
