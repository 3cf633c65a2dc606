/// Renderable primitives that make up a stroke
use nalgebra::{Matrix4, Point3, Vector3};

use crate::config::StrokeConfig;
use crate::error::GeometryError;
use crate::projection::WorldPoint;
use crate::transform::{AxisAngle, Transform};

/// Surface colour applied to stroke primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrokeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl StrokeColor {
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Hue in degrees, saturation and value in [0, 1]
    pub fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let hue = hue.rem_euclid(360.0);
        let saturation = saturation.clamp(0.0, 1.0);
        let value = value.clamp(0.0, 1.0);

        let chroma = value * saturation;
        let x = chroma * (1.0 - ((hue / 60.0) % 2.0 - 1.0).abs());
        let m = value - chroma;
        let (r, g, b) = match (hue / 60.0) as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };

        let channel = |c: f32| ((c + m) * 255.0).round() as u8;
        Self::rgb(channel(r), channel(g), channel(b))
    }

    pub fn to_f32_array(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

impl Default for StrokeColor {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Cylinder centred on its local origin, extending along local Y
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cylinder {
    pub radius: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub radius: f32,
}

/// One piece of a stroke: a cylinder from `start` to `end` plus a sphere
/// rounding the joint at `end`
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start: WorldPoint,
    pub end: WorldPoint,
    pub cylinder: Cylinder,
    pub rotation: AxisAngle,
    pub pivot: Vector3<f32>,
    pub joint: Sphere,
    pub color: StrokeColor,
}

impl Segment {
    pub fn length(&self) -> f32 {
        self.cylinder.height
    }

    pub fn direction(&self) -> Vector3<f32> {
        self.end - self.start
    }

    /// Local-to-world matrix for the cylinder node
    pub fn cylinder_matrix(&self) -> Matrix4<f32> {
        Transform::node_matrix(&self.start, &self.rotation, &self.pivot)
    }

    /// Local-to-world matrix for the joint sphere node
    pub fn joint_matrix(&self) -> Matrix4<f32> {
        Transform::translation(&self.end.coords)
    }

    /// Cylinder base and tip in world space, as placed by `cylinder_matrix`
    pub fn cylinder_endpoints(&self) -> (Point3<f32>, Point3<f32>) {
        let matrix = self.cylinder_matrix();
        let half = self.cylinder.height / 2.0;
        (
            matrix.transform_point(&Point3::new(0.0, -half, 0.0)),
            matrix.transform_point(&Point3::new(0.0, half, 0.0)),
        )
    }
}

/// Build the segment joining two consecutive stroke points
pub fn build_segment(
    previous: &WorldPoint,
    current: &WorldPoint,
    color: StrokeColor,
    config: &StrokeConfig,
) -> Result<Segment, GeometryError> {
    let finite = |p: &WorldPoint| p.coords.iter().all(|c| c.is_finite());
    if !finite(previous) || !finite(current) {
        return Err(GeometryError::NonFinitePoint);
    }

    let direction = current - previous;
    let distance = direction.norm();
    if distance <= config.min_segment_length {
        return Err(GeometryError::DegenerateSegment {
            length: distance,
            min: config.min_segment_length,
        });
    }

    Ok(Segment {
        start: *previous,
        end: *current,
        cylinder: Cylinder {
            radius: config.line_radius,
            height: distance,
        },
        rotation: AxisAngle::aligning_up_to(&direction),
        pivot: Transform::pivot_offset(distance),
        joint: Sphere {
            radius: config.joint_radius,
        },
        color,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_matches_distance() {
        let config = StrokeConfig::default();
        let a = Point3::new(0.1, -0.2, 0.3);
        let b = Point3::new(-0.4, 0.25, -0.05);
        let segment = build_segment(&a, &b, StrokeColor::WHITE, &config).unwrap();
        assert!((segment.length() - (b - a).norm()).abs() < 1e-6);
        assert_eq!(segment.direction(), b - a);
        assert!((segment.cylinder.radius - 0.001).abs() < 1e-9);
        assert!((segment.joint.radius - 0.001).abs() < 1e-9);
    }

    #[test]
    fn test_cylinder_spans_previous_to_current() {
        let config = StrokeConfig::default();
        let a = Point3::new(1.0, 1.0, 1.0);
        let b = Point3::new(1.5, 0.2, 0.7);
        let segment = build_segment(&a, &b, StrokeColor::WHITE, &config).unwrap();

        let (base, tip) = segment.cylinder_endpoints();
        assert!((base - a).norm() < 1e-5);
        assert!((tip - b).norm() < 1e-5);

        let joint = segment.joint_matrix().transform_point(&Point3::origin());
        assert!((joint - b).norm() < 1e-6);
    }

    #[test]
    fn test_rotation_axis_is_negated_cross_product() {
        let config = StrokeConfig::default();
        let a = Point3::origin();
        let b = Point3::new(0.0, 0.0, -1.0);
        let segment = build_segment(&a, &b, StrokeColor::WHITE, &config).unwrap();
        // (0,0,-1) x (0,1,0) = (1,0,0), negated
        assert!((segment.rotation.axis - Vector3::new(-1.0, 0.0, 0.0)).norm() < 1e-6);
        assert!((segment.rotation.angle - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_identical_points_are_degenerate() {
        let config = StrokeConfig::default();
        let p = Point3::new(0.5, 0.5, 0.5);
        let result = build_segment(&p, &p, StrokeColor::WHITE, &config);
        assert!(matches!(result, Err(GeometryError::DegenerateSegment { .. })));
    }

    #[test]
    fn test_non_finite_points_are_rejected() {
        let config = StrokeConfig::default();
        let result = build_segment(
            &Point3::origin(),
            &Point3::new(f32::NAN, 0.0, 0.0),
            StrokeColor::WHITE,
            &config,
        );
        assert_eq!(result, Err(GeometryError::NonFinitePoint));
    }

    #[test]
    fn test_color_from_hsv() {
        assert_eq!(StrokeColor::from_hsv(0.0, 1.0, 1.0), StrokeColor::rgb(255, 0, 0));
        assert_eq!(StrokeColor::from_hsv(120.0, 1.0, 1.0), StrokeColor::rgb(0, 255, 0));
        assert_eq!(StrokeColor::from_hsv(240.0, 1.0, 1.0), StrokeColor::rgb(0, 0, 255));
        assert_eq!(StrokeColor::from_hsv(42.0, 0.0, 1.0), StrokeColor::WHITE);
        assert_eq!(StrokeColor::default(), StrokeColor::WHITE);
        assert_eq!(StrokeColor::WHITE.to_f32_array(), [1.0, 1.0, 1.0]);
    }
}
