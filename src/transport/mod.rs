//! Interface to the vehicle transport.
//!
//! The race loop only needs a command channel (velocity setpoints plus two
//! lifecycle triggers) and a camera channel; handshake and QoS concerns of
//! the concrete transport stay behind [`CommandLink`].

pub mod sim;

use crate::control::{LifecycleCommand, VelocityCommand};
use crate::perception::CameraFrame;
use async_trait::async_trait;
use strum_macros::Display;
use tokio::sync::mpsc;

/// Inbound camera channel: frames arrive whenever the vehicle produces them.
pub type CameraFeed = mpsc::Receiver<CameraFrame>;

/// Outbound command channel of the vehicle.
#[async_trait]
pub trait CommandLink: Send + Sync {
    /// Number of consumers currently attached to the command channel.
    ///
    /// Zero means a setpoint published now may be silently lost by the
    /// transport handshake.
    fn consumer_count(&self) -> usize;

    async fn send_velocity(&self, cmd: VelocityCommand) -> Result<(), LinkError>;

    async fn send_lifecycle(&self, cmd: LifecycleCommand) -> Result<(), LinkError>;
}

/// Transport-level delivery failure. Fatal for the control loop; the caller
/// decides recovery.
#[derive(Debug, Display)]
pub enum LinkError {
    ChannelClosed,
}

impl std::error::Error for LinkError {}
