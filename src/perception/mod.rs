//! Per-frame perception: decode the downward camera stream, extract track
//! line segments and reduce them to a single steering signal.

pub mod frame;
pub mod line_detector;
pub mod pipeline;
pub mod steering;

pub use frame::CameraFrame;
pub use line_detector::{LineDetector, LineSegment};
pub use pipeline::FramePipeline;
pub use steering::{MidpointOffsetPolicy, SteeringPolicy, SteeringSignal};

#[cfg(test)]
mod tests;
