/// Temporal smoothing and per-stroke state
use crate::config::StrokeConfig;
use crate::geometry::{build_segment, Segment, StrokeColor};
use crate::projection::WorldPoint;

/// Component-wise lerp from `previous` toward `current` by `factor`
pub fn smooth(previous: &WorldPoint, current: &WorldPoint, factor: f32) -> WorldPoint {
    previous + (current - previous) * factor
}

/// The point the next segment starts from, if any
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrokeState {
    previous: Option<WorldPoint>,
}

impl StrokeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> Option<&WorldPoint> {
        self.previous.as_ref()
    }

    /// Feed one raw point into the stroke.
    ///
    /// The first point only seeds the stroke. Later points are smoothed
    /// against the last stored point, and the smoothed point is stored for
    /// the next call whether or not a segment came out of it.
    pub fn advance(
        &mut self,
        raw: WorldPoint,
        color: StrokeColor,
        config: &StrokeConfig,
    ) -> Option<Segment> {
        let Some(previous) = self.previous else {
            self.previous = Some(raw);
            return None;
        };

        let current = smooth(&previous, &raw, config.smoothing_factor);
        self.previous = Some(current);

        match build_segment(&previous, &current, color, config) {
            Ok(segment) => Some(segment),
            Err(err) => {
                log::trace!("skipping segment: {}", err);
                None
            }
        }
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_smooth_without_motion_is_stable() {
        let p = Point3::new(0.4, -1.2, 3.3);
        for factor in [0.0, 0.3, 0.5, 1.0] {
            assert_eq!(smooth(&p, &p, factor), p);
        }
    }

    #[test]
    fn test_smooth_is_lerp() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, -2.0, 10.0);
        let s = smooth(&a, &b, 0.3);
        assert!((s - Point3::new(0.3, -0.6, 3.0)).norm() < 1e-6);
    }

    #[test]
    fn test_first_point_only_seeds() {
        let config = StrokeConfig::default();
        let mut stroke = StrokeState::new();
        let p = Point3::new(1.0, 2.0, 3.0);
        assert!(stroke.advance(p, StrokeColor::WHITE, &config).is_none());
        assert_eq!(stroke.previous(), Some(&p));
    }

    #[test]
    fn test_smoothed_point_feeds_forward() {
        let config = StrokeConfig::default();
        let mut stroke = StrokeState::new();
        stroke.advance(Point3::origin(), StrokeColor::WHITE, &config);

        let segment = stroke
            .advance(Point3::new(1.0, 0.0, 0.0), StrokeColor::WHITE, &config)
            .unwrap();
        assert!((segment.end.x - 0.3).abs() < 1e-6);
        assert!((stroke.previous().unwrap().x - 0.3).abs() < 1e-6);

        // Same raw input again: 0.3 + 0.3 * 0.7
        let segment = stroke
            .advance(Point3::new(1.0, 0.0, 0.0), StrokeColor::WHITE, &config)
            .unwrap();
        assert!((segment.start.x - 0.3).abs() < 1e-6);
        assert!((segment.end.x - 0.51).abs() < 1e-6);
    }

    #[test]
    fn test_stationary_input_emits_nothing() {
        let config = StrokeConfig::default();
        let mut stroke = StrokeState::new();
        let p = Point3::new(0.2, 0.2, -0.5);
        stroke.advance(p, StrokeColor::WHITE, &config);
        assert!(stroke.advance(p, StrokeColor::WHITE, &config).is_none());
        assert_eq!(stroke.previous(), Some(&p));
    }

    #[test]
    fn test_reset_clears_previous() {
        let config = StrokeConfig::default();
        let mut stroke = StrokeState::new();
        stroke.advance(Point3::origin(), StrokeColor::WHITE, &config);
        stroke.reset();
        assert!(stroke.previous().is_none());
        assert!(stroke
            .advance(Point3::new(5.0, 0.0, 0.0), StrokeColor::WHITE, &config)
            .is_none());
    }
}
