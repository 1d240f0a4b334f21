//! # Drone Module
//!
//! Outbound link to the drone.
//!
//! This module handles:
//! - The transport seam the control loop talks to ([`DroneTransport`])
//! - Tello SDK command encoding and reply parsing
//! - The UDP connection to a Tello

pub mod protocol;
pub mod tello;

use async_trait::async_trait;

use crate::controller::translator::{DroneAction, FlipDirection, VelocityCommand};
use crate::error::Result;

/// Commands the control loop can send to a drone.
///
/// Implementations own range enforcement, timeouts and failure reporting.
/// Callers never retry: a failed velocity send is superseded by the next tick.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DroneTransport: Send {
    /// Send stick velocities (left/right, forward/back, up/down, yaw).
    async fn send_velocity(&mut self, command: VelocityCommand) -> Result<()>;

    /// Request an automatic takeoff.
    async fn takeoff(&mut self) -> Result<()>;

    /// Request an automatic landing.
    async fn land(&mut self) -> Result<()>;

    /// Request a flip.
    async fn flip(&mut self, direction: FlipDirection) -> Result<()>;
}

/// Forwards a translator action to the matching transport call.
pub async fn execute<T: DroneTransport + ?Sized>(transport: &mut T, action: DroneAction) -> Result<()> {
    match action {
        DroneAction::Takeoff => transport.takeoff().await,
        DroneAction::Land => transport.land().await,
        DroneAction::Flip(direction) => transport.flip(direction).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_execute_takeoff() {
        let mut mock = MockDroneTransport::new();
        mock.expect_takeoff().times(1).returning(|| Ok(()));
        mock.expect_land().never();

        assert!(execute(&mut mock, DroneAction::Takeoff).await.is_ok());
    }

    #[tokio::test]
    async fn test_execute_land() {
        let mut mock = MockDroneTransport::new();
        mock.expect_land().times(1).returning(|| Ok(()));

        assert!(execute(&mut mock, DroneAction::Land).await.is_ok());
    }

    #[tokio::test]
    async fn test_execute_flip_passes_direction() {
        let mut mock = MockDroneTransport::new();
        mock.expect_flip()
            .with(eq(FlipDirection::Left))
            .times(1)
            .returning(|_| Ok(()));

        assert!(execute(&mut mock, DroneAction::Flip(FlipDirection::Left)).await.is_ok());
    }

    #[test]
    fn test_execute_propagates_error() {
        let mut mock = MockDroneTransport::new();
        mock.expect_takeoff()
            .returning(|| Err(crate::error::TelloPadError::Transport("unreachable".into())));

        let result = tokio_test::block_on(execute(&mut mock, DroneAction::Takeoff));
        assert!(result.is_err());
    }

    #[test]
    fn test_velocity_through_trait_object() {
        let mut mock = MockDroneTransport::new();
        mock.expect_send_velocity()
            .withf(|cmd| cmd.yaw == -30)
            .times(1)
            .returning(|_| Ok(()));

        let transport: &mut dyn DroneTransport = &mut mock;
        let command = VelocityCommand { lateral: 0, longitudinal: 0, vertical: 0, yaw: -30 };
        assert!(tokio_test::block_on(transport.send_velocity(command)).is_ok());
    }
}
