use super::{CommandLink, LinkError};
use crate::control::{LifecycleCommand, VelocityCommand};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// Everything a [`SimLink`] has delivered, in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SentCommand {
    Velocity(VelocityCommand),
    Lifecycle(LifecycleCommand),
}

/// In-process loopback command link.
///
/// Stands in for the real vehicle transport in the demo binary and in tests:
/// consumers attach explicitly, and every delivered command is observable on
/// the outbound channel.
pub struct SimLink {
    consumers: AtomicUsize,
    outbound: mpsc::UnboundedSender<SentCommand>,
}

impl SimLink {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<SentCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { consumers: AtomicUsize::new(0), outbound: tx }), rx)
    }

    /// Registers one consumer on the command channel.
    pub fn attach_consumer(&self) { self.consumers.fetch_add(1, Ordering::SeqCst); }

    pub fn detach_consumer(&self) { self.consumers.fetch_sub(1, Ordering::SeqCst); }
}

#[async_trait]
impl CommandLink for SimLink {
    fn consumer_count(&self) -> usize { self.consumers.load(Ordering::SeqCst) }

    async fn send_velocity(&self, cmd: VelocityCommand) -> Result<(), LinkError> {
        self.outbound.send(SentCommand::Velocity(cmd)).map_err(|_| LinkError::ChannelClosed)
    }

    async fn send_lifecycle(&self, cmd: LifecycleCommand) -> Result<(), LinkError> {
        self.outbound.send(SentCommand::Lifecycle(cmd)).map_err(|_| LinkError::ChannelClosed)
    }
}
