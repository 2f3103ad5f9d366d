use super::frame::{CameraFrame, DecodeError};
use super::line_detector::{LineDetector, LineSegment};
use super::pipeline::FramePipeline;
use super::steering::{MidpointOffsetPolicy, SteeringPolicy, SteeringSignal};
use crate::common::Vec2D;
use crate::config::DetectorConfig;
use crate::control::flight_phase::FlightPhase;
use image::{Rgb, RgbImage};
use tokio::sync::watch;

const TRACK: Rgb<u8> = Rgb([80, 80, 80]);
const TARMAC: Rgb<u8> = Rgb([24, 110, 36]);

fn blank_frame(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, TARMAC)
}

fn paint_stripe(img: &mut RgbImage, x_range: std::ops::RangeInclusive<u32>) {
    for y in 0..img.height() {
        for x in x_range.clone() {
            img.put_pixel(x, y, TRACK);
        }
    }
}

fn seg(x0: f32, y0: f32, x1: f32, y1: f32) -> LineSegment {
    LineSegment::new(Vec2D::new(x0, y0), Vec2D::new(x1, y1))
}

fn detector() -> LineDetector { LineDetector::new(DetectorConfig::default()) }

#[test]
fn pixel_coordinates_cast_between_numeric_types() {
    let p: Vec2D<f32> = Vec2D::from((3, 4)).cast();
    assert!((p.x() - 3.0).abs() < f32::EPSILON);
    assert!((p.y() - 4.0).abs() < f32::EPSILON);
    assert!((p.abs() - 5.0).abs() < 1e-6);
}

#[test]
fn blank_frame_yields_no_segments_and_no_signal() {
    let img = blank_frame(400, 300);
    let segments = detector().detect(&img);
    assert!(segments.is_empty());
    assert!(MidpointOffsetPolicy.reduce(&segments, img.width()).is_none());
}

#[test]
fn threshold_band_is_inclusive() {
    let mut img = blank_frame(4, 1);
    img.put_pixel(0, 0, Rgb([71, 80, 80]));
    img.put_pixel(1, 0, Rgb([72, 72, 72]));
    img.put_pixel(2, 0, Rgb([90, 90, 90]));
    img.put_pixel(3, 0, Rgb([80, 91, 80]));
    let mask = detector().threshold_mask(&img);
    assert_eq!(mask, vec![0, 255, 255, 0]);
}

#[test]
fn canny_marks_stripe_boundaries_once() {
    let d = detector();
    let (width, height) = (20usize, 20usize);
    let mut mask = vec![0u8; width * height];
    for y in 0..height {
        for x in 8..=12 {
            mask[y * width + x] = 255;
        }
    }
    let edges = d.canny(&mask, width, height);
    assert!(edges.at(7, 10), "left boundary missing");
    assert!(edges.at(12, 10), "right boundary missing");
    assert!(!edges.at(9, 10), "stripe interior must stay clean");
    assert!(!edges.at(8, 10), "tied ridge must collapse to one pixel");
}

#[test]
fn vertical_stripe_produces_vertical_segments() {
    let mut img = blank_frame(400, 300);
    paint_stripe(&mut img, 238..=242);
    let segments = detector().detect(&img);
    assert!(!segments.is_empty(), "stripe not detected");
    for s in &segments {
        assert!(
            (s.p0().x() - s.p1().x()).abs() < 5.0,
            "segment not vertical: {} -> {}",
            s.p0(),
            s.p1()
        );
        let mid = s.midpoint().x();
        assert!((235.0..=245.0).contains(&mid), "midpoint off stripe: {mid}");
    }
    let longest = segments.iter().map(LineSegment::length).fold(0.0, f32::max);
    assert!(longest > 100.0, "longest segment too short: {longest}");
}

#[test]
fn single_segment_offset_matches_ratio() {
    // Offset +40 px against a 200 px half-width.
    let signal = MidpointOffsetPolicy.reduce(&[seg(240.0, 0.0, 240.0, 300.0)], 400).unwrap();
    assert!((signal.yaw_rate() - 0.2).abs() < 1e-6);
}

#[test]
fn symmetric_segments_balance_out() {
    let segments = [seg(160.0, 0.0, 160.0, 300.0), seg(240.0, 0.0, 240.0, 300.0)];
    let signal = MidpointOffsetPolicy.reduce(&segments, 400).unwrap();
    assert!(signal.yaw_rate().abs() < 1e-6);
}

#[test]
fn weighting_favors_longer_segments() {
    let segments = [seg(240.0, 0.0, 240.0, 300.0), seg(160.0, 0.0, 160.0, 100.0)];
    let signal = MidpointOffsetPolicy.reduce(&segments, 400).unwrap();
    // (40 * 300 - 40 * 100) / 400 = 20 px offset.
    assert!((signal.yaw_rate() - 0.1).abs() < 1e-6);
}

#[test]
fn degenerate_segments_yield_no_signal() {
    let segments = [seg(100.0, 50.0, 100.0, 50.0)];
    assert!(MidpointOffsetPolicy.reduce(&segments, 400).is_none());
}

#[test]
fn signal_saturates_to_unit_range() {
    assert!((SteeringSignal::new(3.5).yaw_rate() - 1.0).abs() < f64::EPSILON);
    assert!((SteeringSignal::new(-3.5).yaw_rate() + 1.0).abs() < f64::EPSILON);
}

#[test]
fn rgb8_decode_rejects_truncated_buffers() {
    let frame = CameraFrame::rgb8(4, 4, vec![0u8; 10]);
    match frame.decode() {
        Err(DecodeError::TruncatedBuffer { expected, actual }) => {
            assert_eq!(expected, 48);
            assert_eq!(actual, 10);
        }
        other => panic!("expected TruncatedBuffer, got {other:?}"),
    }
}

#[test]
fn garbage_payload_is_malformed() {
    let frame = CameraFrame::compressed(vec![0xde, 0xad, 0xbe, 0xef]);
    assert!(matches!(frame.decode(), Err(DecodeError::Malformed(_))));
}

#[test]
fn rgb8_roundtrip_preserves_dimensions() {
    let img = blank_frame(16, 9);
    let frame = CameraFrame::rgb8(16, 9, img.into_raw());
    let decoded = frame.decode().unwrap();
    assert_eq!((decoded.width(), decoded.height()), (16, 9));
}

fn pipeline_with_phase(
    phase: FlightPhase,
) -> (FramePipeline, watch::Receiver<Option<SteeringSignal>>, watch::Sender<FlightPhase>) {
    let (phase_tx, phase_rx) = watch::channel(phase);
    let (steering_tx, steering_rx) = watch::channel(None);
    let pipeline = FramePipeline::new(
        detector(),
        Box::new(MidpointOffsetPolicy),
        phase_rx,
        steering_tx,
    );
    (pipeline, steering_rx, phase_tx)
}

#[test]
fn frames_outside_linefollow_are_skipped() {
    let (pipeline, steering_rx, _phase_tx) = pipeline_with_phase(FlightPhase::Takeoff);
    let mut img = blank_frame(400, 300);
    paint_stripe(&mut img, 238..=242);
    let (w, h) = (img.width(), img.height());
    pipeline.process(&CameraFrame::rgb8(w, h, img.into_raw()));
    assert!(steering_rx.borrow().is_none());
    assert!(!steering_rx.has_changed().unwrap());
}

#[test]
fn undecodable_frame_keeps_last_signal() {
    let (pipeline, steering_rx, _phase_tx) = pipeline_with_phase(FlightPhase::LineFollow);
    let mut img = blank_frame(400, 300);
    paint_stripe(&mut img, 238..=242);
    let (w, h) = (img.width(), img.height());
    pipeline.process(&CameraFrame::rgb8(w, h, img.into_raw()));
    let before = *steering_rx.borrow();
    assert!(before.is_some());

    pipeline.process(&CameraFrame::rgb8(4, 4, vec![0u8; 3]));
    assert_eq!(*steering_rx.borrow(), before);
}

#[test]
fn centered_stripe_steers_straight() {
    let (pipeline, steering_rx, _phase_tx) = pipeline_with_phase(FlightPhase::LineFollow);
    let mut img = blank_frame(400, 300);
    paint_stripe(&mut img, 198..=202);
    let (w, h) = (img.width(), img.height());
    pipeline.process(&CameraFrame::rgb8(w, h, img.into_raw()));
    let signal = steering_rx.borrow().expect("stripe not picked up");
    assert!(signal.yaw_rate().abs() < 0.05, "got {}", signal.yaw_rate());
}
