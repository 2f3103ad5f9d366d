#![allow(dead_code, clippy::similar_names)]
#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]
mod common;
mod config;
mod control;
mod logger;
mod perception;
mod transport;

use crate::config::RaceConfig;
use crate::control::{CommandPublisher, FlightPhase, RaceController};
use crate::perception::{FramePipeline, LineDetector, MidpointOffsetPolicy};
use crate::transport::CommandLink;
use crate::transport::sim::SimLink;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Capacity of the inbound camera channel; the pipeline keeps only the
/// latest steering result anyway, so a shallow buffer is enough.
const CAMERA_CHANNEL_DEPTH: usize = 8;
/// Capacity of the operator phase-request channel.
const PHASE_REQUEST_DEPTH: usize = 4;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    let cfg = RaceConfig::from_env().unwrap_or_else(|e| fatal!("Invalid race config: {e}"));
    let cancel = CancellationToken::new();

    let (link, mut outbound) = SimLink::new();
    link.attach_consumer();
    tokio::spawn(async move {
        while let Some(cmd) = outbound.recv().await {
            event!("link out: {cmd:?}");
        }
    });

    let publisher = Arc::new(CommandPublisher::new(
        Arc::clone(&link) as Arc<dyn CommandLink>,
        cfg.publisher.clone(),
        cfg.limits,
    ));
    let (_frame_tx, frame_rx) = mpsc::channel(CAMERA_CHANNEL_DEPTH);
    let (_phase_req_tx, phase_req_rx) = mpsc::channel::<FlightPhase>(PHASE_REQUEST_DEPTH);
    let (steering_tx, steering_rx) = watch::channel(None);

    let (mut controller, phase_rx) =
        RaceController::new(publisher, steering_rx, phase_req_rx, cfg.clone());
    let pipeline = FramePipeline::new(
        LineDetector::new(cfg.detector.clone()),
        Box::new(MidpointOffsetPolicy),
        phase_rx,
        steering_tx,
    );

    let pipeline_cancel = cancel.clone();
    tokio::spawn(async move {
        pipeline.run(frame_rx, pipeline_cancel).await;
    });

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log!("Interrupt received, shutting down");
            signal_cancel.cancel();
        }
    });

    info!("Starting race in phase {}", controller.phase());
    if let Err(e) = controller.run(cancel).await {
        error!("Control loop aborted: {e}");
    }
    info!("Race loop stopped");
}
