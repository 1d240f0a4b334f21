//! # Tello UDP Link
//!
//! Sends SDK commands to a Tello over UDP.
//!
//! Connecting performs the `command` handshake and waits for `ok`, then sets
//! the configured speed. After that, every command is fire-and-forget: replies
//! are drained by a background task and only logged, so a slow `takeoff`
//! acknowledgement never stalls the control loop.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, trace, warn};

use super::protocol::{Reply, TelloCommand};
use super::DroneTransport;
use crate::config::DroneConfig;
use crate::controller::translator::{FlipDirection, VelocityCommand};
use crate::error::{Result, TelloPadError};

/// Largest reply datagram we expect.
const REPLY_BUFFER_SIZE: usize = 1024;

/// Connected Tello command link.
pub struct TelloLink {
    socket: Arc<UdpSocket>,
    drone_addr: SocketAddr,
    replies: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for TelloLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelloLink")
            .field("drone_addr", &self.drone_addr)
            .finish_non_exhaustive()
    }
}

impl TelloLink {
    /// Bind the local command port and put the drone into SDK mode.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the address cannot be resolved, the port cannot
    /// be bound, or the drone does not answer `command` with `ok` within
    /// `response_timeout_ms`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tello_pad::config::Config;
    /// use tello_pad::drone::tello::TelloLink;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let config = Config::default();
    ///     let link = TelloLink::connect(&config.drone).await?;
    ///     println!("Connected to {}", link.drone_addr());
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(config: &DroneConfig) -> Result<Self> {
        let drone_addr = tokio::net::lookup_host((config.host.as_str(), config.command_port))
            .await
            .map_err(|e| TelloPadError::Transport(format!("Failed to resolve {}: {}", config.host, e)))?
            .next()
            .ok_or_else(|| TelloPadError::Transport(format!("No address for {}", config.host)))?;

        let socket = UdpSocket::bind(("0.0.0.0", config.local_port))
            .await
            .map_err(|e| {
                TelloPadError::Transport(format!("Failed to bind UDP port {}: {}", config.local_port, e))
            })?;

        let mut link = Self {
            socket: Arc::new(socket),
            drone_addr,
            replies: None,
        };

        let wait = Duration::from_millis(config.response_timeout_ms);

        match link.request(TelloCommand::Command, wait).await? {
            Reply::Ok => info!("Tello at {} entered SDK mode", drone_addr),
            other => {
                return Err(TelloPadError::Transport(format!(
                    "Drone refused SDK mode: {}",
                    other
                )))
            }
        }

        match link.request(TelloCommand::Speed(config.speed), wait).await {
            Ok(Reply::Ok) => debug!("Speed set to {} cm/s", config.speed),
            Ok(other) => warn!("Drone rejected speed {}: {}", config.speed, other),
            Err(e) => warn!("Failed to set speed: {}", e),
        }

        link.replies = Some(tokio::spawn(drain_replies(link.socket.clone(), drone_addr)));

        Ok(link)
    }

    /// Address commands are sent to.
    pub fn drone_addr(&self) -> SocketAddr {
        self.drone_addr
    }

    /// Local address of the command socket.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Send a command and wait for its reply. Only used before the reply
    /// drain task owns the receive side.
    async fn request(&self, command: TelloCommand, wait: Duration) -> Result<Reply> {
        self.send(command).await?;

        let mut buf = [0u8; REPLY_BUFFER_SIZE];
        loop {
            let (len, from) = timeout(wait, self.socket.recv_from(&mut buf))
                .await
                .map_err(|_| {
                    TelloPadError::Transport(format!(
                        "No reply to '{}' within {} ms",
                        command,
                        wait.as_millis()
                    ))
                })??;

            if from.ip() != self.drone_addr.ip() {
                debug!("Ignoring datagram from unexpected peer {}", from);
                continue;
            }

            return Ok(Reply::parse(&buf[..len]));
        }
    }

    async fn send(&self, command: TelloCommand) -> Result<()> {
        let payload = command.encode();
        self.socket
            .send_to(&payload, self.drone_addr)
            .await
            .map_err(|e| TelloPadError::Transport(format!("Failed to send '{}': {}", command, e)))?;

        trace!("Sent '{}'", command);
        Ok(())
    }
}

impl Drop for TelloLink {
    fn drop(&mut self) {
        if let Some(task) = self.replies.take() {
            task.abort();
        }
    }
}

#[async_trait]
impl DroneTransport for TelloLink {
    async fn send_velocity(&mut self, command: VelocityCommand) -> Result<()> {
        self.send(TelloCommand::Rc(command)).await
    }

    async fn takeoff(&mut self) -> Result<()> {
        info!("Takeoff");
        self.send(TelloCommand::Takeoff).await
    }

    async fn land(&mut self) -> Result<()> {
        info!("Land");
        self.send(TelloCommand::Land).await
    }

    async fn flip(&mut self, direction: FlipDirection) -> Result<()> {
        info!("Flip {}", direction);
        self.send(TelloCommand::Flip(direction)).await
    }
}

/// Logs replies to fire-and-forget commands until the socket fails.
async fn drain_replies(socket: Arc<UdpSocket>, drone_addr: SocketAddr) {
    let mut buf = [0u8; REPLY_BUFFER_SIZE];
    loop {
        match socket.recv_from(&mut buf).await {
            Ok((len, from)) if from.ip() == drone_addr.ip() => match Reply::parse(&buf[..len]) {
                Reply::Ok => debug!("Drone: ok"),
                Reply::Error(msg) => warn!("Drone rejected command: {}", msg),
                Reply::Value(value) => debug!("Drone: {}", value),
            },
            Ok((_, from)) => debug!("Ignoring datagram from unexpected peer {}", from),
            Err(e) => {
                warn!("Reply listener stopped: {}", e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Config pointing at a fake drone on localhost.
    fn local_config(port: u16, response_timeout_ms: u64) -> DroneConfig {
        DroneConfig {
            host: "127.0.0.1".to_string(),
            command_port: port,
            local_port: 0,
            speed: 10,
            response_timeout_ms,
        }
    }

    /// Fake drone: answers `ok` to everything except `rc`, records `count` datagrams.
    async fn spawn_fake_drone(count: usize) -> (u16, JoinHandle<Vec<String>>) {
        let fake = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = fake.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            let mut buf = [0u8; 256];
            let mut seen = Vec::new();
            while seen.len() < count {
                let (len, from) = fake.recv_from(&mut buf).await.unwrap();
                let text = String::from_utf8_lossy(&buf[..len]).to_string();
                if !text.starts_with("rc ") {
                    fake.send_to(b"ok", from).await.unwrap();
                }
                seen.push(text);
            }
            seen
        });

        (port, handle)
    }

    #[tokio::test]
    async fn test_connect_handshake_and_takeoff() {
        let (port, fake) = spawn_fake_drone(3).await;

        let mut link = TelloLink::connect(&local_config(port, 1000)).await.unwrap();
        assert_eq!(link.drone_addr().port(), port);
        link.takeoff().await.unwrap();

        let seen = fake.await.unwrap();
        assert_eq!(seen, vec!["command", "speed 10", "takeoff"]);
    }

    #[tokio::test]
    async fn test_velocity_is_clamped_on_the_wire() {
        let (port, fake) = spawn_fake_drone(4).await;

        let mut link = TelloLink::connect(&local_config(port, 1000)).await.unwrap();
        link.send_velocity(VelocityCommand { lateral: 4800, longitudinal: -60, vertical: 800, yaw: -3000 })
            .await
            .unwrap();
        link.flip(FlipDirection::Backward).await.unwrap();

        let seen = fake.await.unwrap();
        assert_eq!(seen[2], "rc 100 -60 100 -100");
        assert_eq!(seen[3], "flip b");
    }

    #[tokio::test]
    async fn test_connect_times_out_without_reply() {
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = silent.local_addr().unwrap().port();

        let result = TelloLink::connect(&local_config(port, 50)).await;
        match result {
            Err(TelloPadError::Transport(msg)) => assert!(msg.contains("No reply to 'command'")),
            other => panic!("Expected Transport error, got: {:?}", other),
        }
        drop(silent);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let fake = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = fake.local_addr().unwrap().port();
        let responder = tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let (_, from) = fake.recv_from(&mut buf).await.unwrap();
            fake.send_to(b"error", from).await.unwrap();
        });

        let result = TelloLink::connect(&local_config(port, 1000)).await;
        assert!(matches!(result, Err(TelloPadError::Transport(_))));
        responder.await.unwrap();
    }

    // Integration test - only runs with a Tello in range
    #[tokio::test]
    #[ignore]
    async fn test_connect_with_real_drone() {
        let config = crate::config::Config::default();
        let link = TelloLink::connect(&config.drone).await;
        assert!(link.is_ok(), "Failed to connect: {:?}", link.err());
    }
}
