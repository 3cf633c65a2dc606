use std::time::Duration;

use arstroke_core::{
    build_segment, smooth, Admission, Camera, CapturedFrame, DetectionPipeline, DrawingSession,
    MaskTopPointDetector, Segment, StrokeColor, StrokeConfig, StrokeState, TrackingState, Viewport,
};
use nalgebra::{Point2, Point3};

fn centered_session() -> (DrawingSession, Camera) {
    let viewport = Viewport::from_size(1000.0, 1000.0);
    (
        DrawingSession::new(StrokeConfig::default(), viewport),
        Camera::new(1000, 1000),
    )
}

#[test]
fn test_reprojection_recovers_screen_point() {
    let viewport = Viewport::new(0.0, 0.0, 1280.0, 720.0);
    let poses = [
        (Point3::new(0.0, 0.0, 0.0), 0.0, 0.0),
        (Point3::new(1.0, 0.5, -2.0), 1.2, 0.3),
        (Point3::new(-3.0, 2.0, 4.0), -2.5, -0.7),
    ];

    for (position, yaw, pitch) in poses {
        let mut camera = Camera::new(1280, 720);
        camera.near = 0.01;
        camera.far = 100.0;
        camera.position = position;
        camera.orbit(yaw, pitch);
        let state = camera.state();

        for (x, y) in [(0.0, 0.0), (640.0, 360.0), (1000.0, 100.0), (17.0, 700.0)] {
            let world = state.unproject(&Point2::new(x, y), &viewport, 0.98).unwrap();
            let (screen, _) = state.project(&world, &viewport).unwrap();
            assert!((screen.x - x).abs() < 0.1, "x: {} vs {}", screen.x, x);
            assert!((screen.y - y).abs() < 0.1, "y: {} vs {}", screen.y, y);
        }
    }
}

#[test]
fn test_smoothing_fixed_point() {
    let p = Point3::new(-7.0, 0.125, 42.0);
    for factor in [0.01, 0.3, 0.99] {
        assert_eq!(smooth(&p, &p, factor), p);
    }
}

#[test]
fn test_segment_height_is_euclidean_distance() {
    let config = StrokeConfig::default();
    let pairs = [
        (Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, -0.01)),
        (Point3::new(0.1, 0.2, 0.3), Point3::new(0.4, -0.2, 0.0)),
        (Point3::new(-1.0, 5.0, 2.0), Point3::new(-1.0, 5.5, 2.0)),
    ];
    for (a, b) in pairs {
        let segment = build_segment(&a, &b, StrokeColor::WHITE, &config).unwrap();
        assert!((segment.cylinder.height - (b - a).norm()).abs() < 1e-6);
    }
}

#[test]
fn test_no_segment_without_previous_point() {
    let (mut session, camera) = centered_session();
    let state = camera.state();
    let mut scene: Vec<Segment> = Vec::new();

    session.begin(Viewport::from_size(1000.0, 1000.0));
    let touches = [(500.0, 500.0), (520.0, 500.0), (540.0, 510.0), (560.0, 530.0)];
    for (x, y) in touches {
        session.set_touch(Point2::new(x, y));
        session.render_frame(Some(&state), &mut scene);
    }
    // One segment per consecutive pair
    assert_eq!(scene.len(), touches.len() - 1);
}

#[test]
fn test_screen_center_lands_on_forward_axis() {
    let (mut session, camera) = centered_session();
    session.begin(Viewport::from_size(1000.0, 1000.0));
    session.set_touch(Point2::new(500.0, 500.0));
    session.frame(Some(&camera.state()));

    let seed = session.stroke().previous().unwrap();
    assert!(seed.x.abs() < 1e-6);
    assert!(seed.y.abs() < 1e-6);
    assert!(seed.z < 0.0);
}

#[test]
fn test_three_point_stroke_follows_recurrence() {
    let config = StrokeConfig::default();
    let mut stroke = StrokeState::new();
    let color = StrokeColor::WHITE;

    assert!(stroke.advance(Point3::new(0.0, 0.0, 0.0), color, &config).is_none());
    let first = stroke
        .advance(Point3::new(0.0, 0.0, -0.01), color, &config)
        .unwrap();
    let second = stroke
        .advance(Point3::new(0.0, 0.0, -0.02), color, &config)
        .unwrap();

    // 0.3 of the raw 0.01 gap
    assert!((first.length() - 0.003).abs() < 1e-6);
    // Smoothed against -0.003, not the raw -0.01: 0.3 * 0.017
    assert!((second.length() - 0.0051).abs() < 1e-6);
    assert!((second.end.z + 0.0081).abs() < 1e-6);
}

#[test]
fn test_new_stroke_does_not_connect_to_old_one() {
    let (mut session, camera) = centered_session();
    let state = camera.state();
    let mut scene: Vec<Segment> = Vec::new();

    session.begin(Viewport::from_size(1000.0, 1000.0));
    session.set_touch(Point2::new(200.0, 200.0));
    session.render_frame(Some(&state), &mut scene);
    session.set_touch(Point2::new(300.0, 300.0));
    session.render_frame(Some(&state), &mut scene);
    assert_eq!(scene.len(), 1);
    let old_end = scene[0].end;

    session.end();
    session.render_frame(Some(&state), &mut scene);
    session.begin(Viewport::from_size(1000.0, 1000.0));
    assert!(!session.render_frame(Some(&state), &mut scene));
    assert_eq!(scene.len(), 1);

    session.set_touch(Point2::new(800.0, 800.0));
    assert!(session.render_frame(Some(&state), &mut scene));
    assert_ne!(scene[1].start, old_end);
    let reseeded = state
        .unproject(&Point2::new(300.0, 300.0), session.viewport(), 0.98)
        .unwrap();
    assert!((scene[1].start - reseeded).norm() < 1e-6);
    assert_eq!(session.stats().strokes, 2);
}

#[test]
fn test_detected_fingertip_drives_next_segment() {
    let viewport = Viewport::from_size(1000.0, 1000.0);
    let (mut session, camera) = centered_session();
    let state = camera.state();
    let config = StrokeConfig::default();

    session.begin(viewport);
    session.set_touch(Point2::new(500.0, 500.0));
    assert!(session.frame(Some(&state)).is_none());
    let previous = *session.stroke().previous().unwrap();

    // Topmost lit pixel (2, 3) of a 10x10 mask: tip at (0.25, 0.35)
    let mut pixels = vec![0u8; 100];
    pixels[3 * 10 + 2] = 255;
    pixels[7 * 10 + 6] = 255;
    let mask = CapturedFrame::new(1, 10, 10, pixels);

    let mut pipeline = DetectionPipeline::spawn(MaskTopPointDetector::default()).unwrap();
    assert_eq!(pipeline.submit(mask.clone(), TrackingState::Normal), Admission::Accepted);
    // Nothing consumed yet, so the next camera frame is dropped
    let mut late = mask.clone();
    late.sequence = 2;
    assert_eq!(pipeline.submit(late, TrackingState::Normal), Admission::Busy);
    assert_eq!(session.touch(), &Point2::new(500.0, 500.0));

    let update = pipeline.wait(&viewport, Duration::from_secs(5)).unwrap();
    assert_eq!(update.sequence, 1);
    let touch = update.touch.unwrap();
    let expected_touch = viewport.denormalize(&Point2::new(0.25, 0.35));
    assert!((touch - expected_touch).norm() < 1e-3);

    session.set_touch(touch);
    let segment = session.frame(Some(&state)).unwrap();

    let raw = state.unproject(&touch, &viewport, config.depth_hint).unwrap();
    let expected = smooth(&previous, &raw, config.smoothing_factor);
    assert!((segment.start - previous).norm() < 1e-6);
    assert!((segment.end - expected).norm() < 1e-6);

    // The dropped frame never reaches the detector
    assert!(pipeline.poll(&viewport).is_none());
    assert!(!pipeline.is_busy());
    assert_eq!(pipeline.dropped_frames(), 1);
}
