/// Scene-node style transforms for stroke primitives
use nalgebra::{Matrix4, Point3, Rotation3, Unit, Vector3};

/// Below this length an axis is treated as having no direction
const AXIS_EPSILON: f32 = 1e-12;

/// A rotation stored as an (unnormalized) axis and an angle in radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisAngle {
    pub axis: Vector3<f32>,
    pub angle: f32,
}

impl AxisAngle {
    pub fn new(axis: Vector3<f32>, angle: f32) -> Self {
        Self { axis, angle }
    }

    pub fn identity() -> Self {
        Self::new(Vector3::y(), 0.0)
    }

    /// Rotation that turns local +Y onto `direction`.
    ///
    /// The axis is `-(direction x up)`. It vanishes for strokes running
    /// straight up or down; `to_rotation` resolves that case.
    pub fn aligning_up_to(direction: &Vector3<f32>) -> Self {
        let axis = direction.cross(&Vector3::y());
        let cosine = (direction.y / direction.norm()).clamp(-1.0, 1.0);
        Self::new(-axis, cosine.acos())
    }

    pub fn to_rotation(&self) -> Rotation3<f32> {
        match Unit::try_new(self.axis, AXIS_EPSILON) {
            Some(axis) => Rotation3::from_axis_angle(&axis, self.angle),
            // Parallel to up: either no turn or a half turn
            None if self.angle.abs() < std::f32::consts::FRAC_PI_2 => Rotation3::identity(),
            None => Rotation3::from_axis_angle(&Vector3::x_axis(), self.angle),
        }
    }
}

impl Default for AxisAngle {
    fn default() -> Self {
        Self::identity()
    }
}

/// Transform builder for scene nodes
pub struct Transform;

impl Transform {
    pub fn translation(offset: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new_translation(offset)
    }

    /// Pivot that moves a centred cylinder of height `distance` so its base sits at the node origin
    pub fn pivot_offset(distance: f32) -> Vector3<f32> {
        Vector3::new(0.0, -distance / 2.0, 0.0)
    }

    /// Local-to-world matrix of a node: `T(position) * R * T(pivot)^-1`
    pub fn node_matrix(
        position: &Point3<f32>,
        rotation: &AxisAngle,
        pivot: &Vector3<f32>,
    ) -> Matrix4<f32> {
        Self::translation(&position.coords)
            * rotation.to_rotation().to_homogeneous()
            * Self::translation(&-pivot)
    }
}
