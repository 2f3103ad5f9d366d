use super::LineSegment;

/// The reduced scalar steering decision for one frame.
///
/// Positive values steer toward a track offset right of the frame center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringSignal {
    yaw_rate: f64,
}

impl SteeringSignal {
    /// Wraps a turn rate, saturating it into `[-1, 1]`.
    pub fn new(yaw_rate: f64) -> Self { Self { yaw_rate: yaw_rate.clamp(-1.0, 1.0) } }

    pub fn yaw_rate(&self) -> f64 { self.yaw_rate }
}

/// Reduces the detected segments of one frame to a steering decision.
///
/// Swappable policy seam: the frame pipeline only sees this trait, so
/// alternative reductions (longest segment, vote clustering) drop in without
/// touching the control loop. Absence of a signal is an expected outcome,
/// never an error.
pub trait SteeringPolicy: Send + Sync {
    fn reduce(&self, segments: &[LineSegment], frame_width: u32) -> Option<SteeringSignal>;
}

/// Length-weighted average of segment-midpoint offsets from the frame's
/// vertical centerline, normalized by the half-width.
pub struct MidpointOffsetPolicy;

impl SteeringPolicy for MidpointOffsetPolicy {
    fn reduce(&self, segments: &[LineSegment], frame_width: u32) -> Option<SteeringSignal> {
        if segments.is_empty() || frame_width == 0 {
            return None;
        }
        let center = f64::from(frame_width) / 2.0;
        let mut weighted_offset = 0.0;
        let mut total_length = 0.0;
        for seg in segments {
            let weight = f64::from(seg.length());
            weighted_offset += (f64::from(seg.midpoint().x()) - center) * weight;
            total_length += weight;
        }
        if total_length <= f64::EPSILON {
            return None;
        }
        let offset = weighted_offset / total_length;
        Some(SteeringSignal::new(offset / center))
    }
}
