use super::{CommandPublisher, FlightPhase, LifecycleCommand, PublishError, VelocityCommand};
use crate::config::{FallbackPolicy, RaceConfig};
use crate::perception::SteeringSignal;
use crate::{info, log};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Aggregate root of the race: owns the active flight phase and the last
/// commanded `(x, y, z, yaw)` setpoint, and drives both through the fixed
/// rate tick loop.
///
/// Every tick ends by re-publishing the current setpoint regardless of
/// whether a new decision was made; some transports trigger vehicle failsafe
/// behavior when the periodic command stream stops.
pub struct RaceController {
    phase: FlightPhase,
    setpoint: VelocityCommand,
    airborne: bool,
    publisher: Arc<CommandPublisher>,
    steering_rx: watch::Receiver<Option<SteeringSignal>>,
    phase_tx: watch::Sender<FlightPhase>,
    phase_req_rx: mpsc::Receiver<FlightPhase>,
    cfg: RaceConfig,
}

impl RaceController {
    /// Builds the controller and hands out the phase watch the frame
    /// pipeline uses to gate image work.
    pub fn new(
        publisher: Arc<CommandPublisher>,
        steering_rx: watch::Receiver<Option<SteeringSignal>>,
        phase_req_rx: mpsc::Receiver<FlightPhase>,
        cfg: RaceConfig,
    ) -> (Self, watch::Receiver<FlightPhase>) {
        let (phase_tx, phase_watch) = watch::channel(FlightPhase::Takeoff);
        (
            Self {
                phase: FlightPhase::Takeoff,
                setpoint: VelocityCommand::ZERO,
                airborne: false,
                publisher,
                steering_rx,
                phase_tx,
                phase_req_rx,
                cfg,
            },
            phase_watch,
        )
    }

    pub fn phase(&self) -> FlightPhase { self.phase }

    pub fn setpoint(&self) -> VelocityCommand { self.setpoint }

    /// Runs the fixed-rate control loop until the token fires.
    ///
    /// Cancellation is the sole intended termination path; if the vehicle is
    /// airborne when it arrives, a best-effort land trigger goes out before
    /// returning.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), PublishError> {
        let mut ticker = tokio::time::interval(self.cfg.tick_interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    if self.airborne {
                        log!("Interrupted while airborne, sending land trigger");
                        let grace = CancellationToken::new();
                        self.publisher.send_lifecycle(LifecycleCommand::Land, &grace).await.ok();
                    }
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }
            match self.tick(&cancel).await {
                Ok(()) | Err(PublishError::Cancelled) => {}
                Err(e) => return Err(e),
            }
        }
    }

    /// One pass of the state machine. Executes the active phase's behavior,
    /// applies any externally requested transition, and always ends with
    /// exactly one setpoint publish.
    pub(crate) async fn tick(&mut self, cancel: &CancellationToken) -> Result<(), PublishError> {
        while let Ok(requested) = self.phase_req_rx.try_recv() {
            self.transition(requested);
        }
        match self.phase {
            FlightPhase::Takeoff => {
                self.takeoff(cancel).await?;
                self.transition(FlightPhase::Hover);
            }
            FlightPhase::Hover => {
                self.stop(cancel).await?;
                self.transition(FlightPhase::LineFollow);
            }
            FlightPhase::LineFollow => self.line_follow(),
            FlightPhase::GateAlignment => self.gate_alignment(),
            FlightPhase::Land => {
                self.publisher.send_lifecycle(LifecycleCommand::Land, cancel).await?;
                self.airborne = false;
                self.transition(self.cfg.land_next_phase);
            }
        }
        self.publisher.publish(self.setpoint).await
    }

    fn transition(&mut self, next: FlightPhase) {
        if next == self.phase {
            return;
        }
        info!("Phase {} -> {next}", self.phase);
        self.phase = next;
        self.phase_tx.send_replace(next);
    }

    /// Fixed takeoff choreography: lifecycle trigger, ascend, settle, yaw
    /// onto the track heading, then a forward push to the start line.
    async fn takeoff(&mut self, cancel: &CancellationToken) -> Result<(), PublishError> {
        let chor = self.cfg.choreography.clone();
        self.publisher.send_lifecycle(LifecycleCommand::Takeoff, cancel).await?;
        // Airborne from the moment the vehicle accepts the trigger, not the
        // end of the choreography: an interrupt in between must still land.
        self.airborne = true;
        self.move_linear(0.0, 0.0, chor.ascend_speed, cancel).await?;
        CommandPublisher::sleep_or_cancel(chor.ascend(), cancel).await?;
        self.move_linear(0.0, 0.0, chor.settle_speed, cancel).await?;
        CommandPublisher::sleep_or_cancel(chor.settle(), cancel).await?;
        self.move_linear(0.0, 0.0, 0.0, cancel).await?;
        CommandPublisher::sleep_or_cancel(chor.pause(), cancel).await?;
        self.turn(chor.yaw_rate, cancel).await?;
        CommandPublisher::sleep_or_cancel(chor.yaw(), cancel).await?;
        self.turn(0.0, cancel).await?;
        CommandPublisher::sleep_or_cancel(chor.yaw_settle(), cancel).await?;
        self.forward(chor.forward_speed, cancel).await?;
        CommandPublisher::sleep_or_cancel(chor.forward(), cancel).await?;
        self.stop(cancel).await?;
        Ok(())
    }

    /// Applies the latest steering result, or the configured fallback when
    /// the track is not visible.
    fn line_follow(&mut self) {
        match *self.steering_rx.borrow() {
            Some(signal) => {
                self.setpoint.x = self.cfg.cruise_speed;
                self.setpoint.yaw = signal.yaw_rate();
            }
            None => match self.cfg.fallback {
                FallbackPolicy::HoldLast => {}
                FallbackPolicy::Stop => self.setpoint = VelocityCommand::ZERO,
            },
        }
    }

    /// Reserved for precision gate traversal; entered only through an
    /// external phase request.
    fn gate_alignment(&mut self) {}

    /// Zeroes every velocity and delivers the stop reliably.
    pub(crate) async fn stop(&mut self, cancel: &CancellationToken) -> Result<(), PublishError> {
        log!("Stopping...");
        self.setpoint = VelocityCommand::ZERO;
        self.publisher.send_reliable(self.setpoint, cancel).await
    }

    async fn move_linear(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
        cancel: &CancellationToken,
    ) -> Result<(), PublishError> {
        log!("Moving...");
        self.setpoint.x = x;
        self.setpoint.y = y;
        self.setpoint.z = z;
        self.publisher.send_reliable(self.setpoint, cancel).await
    }

    async fn turn(&mut self, rate: f64, cancel: &CancellationToken) -> Result<(), PublishError> {
        log!("Turning...");
        self.setpoint.x = 0.0;
        self.setpoint.yaw = rate;
        self.publisher.send_reliable(self.setpoint, cancel).await
    }

    async fn forward(&mut self, speed: f64, cancel: &CancellationToken) -> Result<(), PublishError> {
        log!("Moving forward...");
        self.setpoint.x = speed;
        self.setpoint.yaw = 0.0;
        self.publisher.send_reliable(self.setpoint, cancel).await
    }
}
