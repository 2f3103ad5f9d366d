use super::{CameraFrame, LineDetector, SteeringPolicy, SteeringSignal};
use crate::control::FlightPhase;
use crate::transport::CameraFeed;
use crate::{event, warn};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Consumes the camera feed and keeps the latest steering result current.
///
/// Runs independently of the control tick: the newest `Option<SteeringSignal>`
/// is written into a watch slot (latest-value overwrite, no queueing), so the
/// tick never blocks on image work and a stale-but-present value wins over
/// waiting. Frames arriving outside `LineFollow` are discarded before any
/// pixel work happens.
pub struct FramePipeline {
    detector: LineDetector,
    policy: Box<dyn SteeringPolicy>,
    phase_rx: watch::Receiver<FlightPhase>,
    steering_tx: watch::Sender<Option<SteeringSignal>>,
}

impl FramePipeline {
    pub fn new(
        detector: LineDetector,
        policy: Box<dyn SteeringPolicy>,
        phase_rx: watch::Receiver<FlightPhase>,
        steering_tx: watch::Sender<Option<SteeringSignal>>,
    ) -> Self {
        Self { detector, policy, phase_rx, steering_tx }
    }

    /// Drains the camera channel until it closes or the token fires.
    pub async fn run(self, mut frames: CameraFeed, cancel: CancellationToken) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => return,
                frame = frames.recv() => match frame {
                    Some(f) => self.process(&f),
                    None => return,
                },
            }
        }
    }

    /// Runs detection and steering reduction for one frame.
    pub fn process(&self, frame: &CameraFrame) {
        if *self.phase_rx.borrow() != FlightPhase::LineFollow {
            return;
        }
        let img = match frame.decode() {
            Ok(img) => img,
            Err(e) => {
                warn!("Dropping undecodable frame from {}: {e}", frame.stamp().format("%H:%M:%S%.3f"));
                return;
            }
        };
        let segments = self.detector.detect(&img);
        for (i, seg) in segments.iter().enumerate() {
            event!("line {i}: length {:.1}, {} -> {}", seg.length(), seg.p0(), seg.p1());
        }
        let signal = self.policy.reduce(&segments, img.width());
        self.steering_tx.send_replace(signal);
    }
}
