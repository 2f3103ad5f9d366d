use super::velocity_command::{LifecycleCommand, VelocityCommand};
use crate::config::{PublisherConfig, VelocityLimits};
use crate::info;
use crate::transport::{CommandLink, LinkError};
use std::sync::Arc;
use std::time::Duration;
use strum_macros::Display;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

/// Publishes setpoints and lifecycle triggers with delivery guarantees.
///
/// The first message after a subscription handshake is commonly lost by the
/// transport, and lifecycle commands are sent only a few times, so silent
/// loss is unacceptable. [`CommandPublisher::send_reliable`] therefore waits
/// for at least one attached consumer before delivering exactly once, and
/// lifecycle triggers use a repeat-N policy instead.
pub struct CommandPublisher {
    link: Arc<dyn CommandLink>,
    cfg: PublisherConfig,
    limits: VelocityLimits,
}

impl CommandPublisher {
    pub fn new(link: Arc<dyn CommandLink>, cfg: PublisherConfig, limits: VelocityLimits) -> Self {
        Self { link, cfg, limits }
    }

    /// Fire-and-forget periodic setpoint publish, the per-tick path.
    pub async fn publish(&self, cmd: VelocityCommand) -> Result<(), PublishError> {
        self.link.send_velocity(cmd.clamped(&self.limits)).await?;
        Ok(())
    }

    /// Delivers `cmd` exactly once, waiting for a consumer to attach first.
    ///
    /// Polls the connection state at the configured interval, yielding
    /// between attempts. With no `connect_timeout` configured the wait is
    /// unbounded; a timeout surfaces as [`PublishError::Timeout`] and the
    /// command is not delivered.
    pub async fn send_reliable(
        &self,
        cmd: VelocityCommand,
        cancel: &CancellationToken,
    ) -> Result<(), PublishError> {
        let deadline = self.cfg.connect_timeout().map(|t| Instant::now() + t);
        loop {
            if self.link.consumer_count() > 0 {
                self.link.send_velocity(cmd.clamped(&self.limits)).await?;
                return Ok(());
            }
            if let Some(d) = deadline {
                if Instant::now() >= d {
                    return Err(PublishError::Timeout);
                }
            }
            tokio::select! {
                () = cancel.cancelled() => return Err(PublishError::Cancelled),
                () = sleep(self.cfg.connect_poll_interval()) => {}
            }
        }
    }

    /// Repeat-N delivery of an idempotent lifecycle trigger.
    pub async fn send_lifecycle(
        &self,
        cmd: LifecycleCommand,
        cancel: &CancellationToken,
    ) -> Result<(), PublishError> {
        for _ in 0..self.cfg.lifecycle_repeats {
            self.link.send_lifecycle(cmd).await?;
            match cmd {
                LifecycleCommand::Takeoff => info!("Taking off..."),
                LifecycleCommand::Land => info!("Landing..."),
            }
            Self::sleep_or_cancel(self.cfg.lifecycle_delay(), cancel).await?;
        }
        Ok(())
    }

    /// Cooperative wait that unwinds promptly on an external interrupt.
    pub(super) async fn sleep_or_cancel(
        duration: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), PublishError> {
        tokio::select! {
            () = cancel.cancelled() => Err(PublishError::Cancelled),
            () = sleep(duration) => Ok(()),
        }
    }
}

#[derive(Debug, Display)]
pub enum PublishError {
    /// No consumer attached within the configured window.
    Timeout,
    /// An external interrupt unwound a blocking wait.
    Cancelled,
    /// The transport dropped the command channel.
    Link(LinkError),
}

impl std::error::Error for PublishError {}

impl From<LinkError> for PublishError {
    fn from(value: LinkError) -> Self { PublishError::Link(value) }
}
