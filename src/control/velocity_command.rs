use crate::config::VelocityLimits;
use strum_macros::Display;

/// The full velocity setpoint sent to the vehicle each tick.
///
/// Fully overwritten on every publish; no partial updates survive between
/// ticks beyond the `(x, y, z, yaw)` fields owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityCommand {
    /// Forward linear velocity.
    pub x: f64,
    /// Lateral linear velocity.
    pub y: f64,
    /// Vertical linear velocity.
    pub z: f64,
    /// Angular yaw rate.
    pub yaw: f64,
}

impl VelocityCommand {
    pub const ZERO: VelocityCommand = VelocityCommand { x: 0.0, y: 0.0, z: 0.0, yaw: 0.0 };

    /// Saturates every component into the configured operating envelope.
    pub fn clamped(self, limits: &VelocityLimits) -> Self {
        let lin = limits.max_linear.abs();
        let ang = limits.max_yaw_rate.abs();
        Self {
            x: self.x.clamp(-lin, lin),
            y: self.y.clamp(-lin, lin),
            z: self.z.clamp(-lin, lin),
            yaw: self.yaw.clamp(-ang, ang),
        }
    }
}

/// A one-shot idempotent trigger, distinct from continuous setpoints.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleCommand {
    Takeoff,
    Land,
}
