/// Screen/world mapping and camera utilities
use nalgebra::{Isometry3, Matrix4, Point2, Point3, Translation3, UnitQuaternion, Vector3, Vector4};

use crate::error::ProjectionError;

/// A point in viewport pixel space
pub type ScreenPoint = Point2<f32>;

/// A point in world space
pub type WorldPoint = Point3<f32>;

/// Smallest |w| accepted for a perspective divide
const W_EPSILON: f32 = 1e-9;

/// The active render surface in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub origin: Point2<f32>,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point2::new(x, y),
            width,
            height,
        }
    }

    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn contains(&self, point: &ScreenPoint) -> bool {
        point.x >= self.origin.x
            && point.y >= self.origin.y
            && point.x <= self.origin.x + self.width
            && point.y <= self.origin.y + self.height
    }

    /// Map a normalized (0-1 on both axes) coordinate into pixel space
    pub fn denormalize(&self, normalized: &Point2<f32>) -> ScreenPoint {
        Point2::new(
            self.origin.x + normalized.x * self.width,
            self.origin.y + normalized.y * self.height,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::from_size(0.0, 0.0)
    }
}

/// Quality of the world tracking reported alongside each camera frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingState {
    #[default]
    Normal,
    Limited,
    NotAvailable,
}

impl TrackingState {
    pub fn is_normal(self) -> bool {
        self == TrackingState::Normal
    }
}

/// Per-frame camera pose and projection supplied by the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub camera_to_world: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub tracking: TrackingState,
}

impl CameraState {
    pub fn new(camera_to_world: Matrix4<f32>, projection: Matrix4<f32>) -> Self {
        Self {
            camera_to_world,
            projection,
            tracking: TrackingState::Normal,
        }
    }

    pub fn with_tracking(mut self, tracking: TrackingState) -> Self {
        self.tracking = tracking;
        self
    }

    /// World-to-camera matrix, the inverse of the camera pose
    pub fn view_matrix(&self) -> Result<Matrix4<f32>, ProjectionError> {
        self.camera_to_world
            .try_inverse()
            .ok_or(ProjectionError::SingularMatrix)
    }

    /// Unproject a screen point at the given NDC depth
    pub fn unproject(
        &self,
        screen: &ScreenPoint,
        viewport: &Viewport,
        depth_hint: f32,
    ) -> Result<WorldPoint, ProjectionError> {
        let view = self.view_matrix()?;
        unproject(screen, viewport, &view, &self.projection, depth_hint)
    }

    pub fn project(&self, world: &WorldPoint, viewport: &Viewport) -> Option<(ScreenPoint, f32)> {
        let view = self.view_matrix().ok()?;
        project(world, viewport, &view, &self.projection)
    }
}

/// Map a screen point back into world space.
///
/// The screen point is normalized into clip space, paired with the fixed
/// `depth_hint`, and pushed through `(projection * view)^-1`. Clip x and y
/// are swapped before the transform to follow the capture orientation of
/// the camera image.
pub fn unproject(
    screen: &ScreenPoint,
    viewport: &Viewport,
    view: &Matrix4<f32>,
    projection: &Matrix4<f32>,
    depth_hint: f32,
) -> Result<WorldPoint, ProjectionError> {
    if viewport.is_empty() {
        return Err(ProjectionError::EmptyViewport {
            width: viewport.width,
            height: viewport.height,
        });
    }

    let clip_x = (screen.x - viewport.origin.x) / viewport.width * 2.0 - 1.0;
    let clip_y = (screen.y - viewport.origin.y) / viewport.height * 2.0 - 1.0;

    let inverse = (projection * view)
        .try_inverse()
        .ok_or(ProjectionError::SingularMatrix)?;
    let result = inverse * Vector4::new(clip_y, clip_x, depth_hint, 1.0);

    if !result.w.is_finite() || result.w.abs() < W_EPSILON {
        return Err(ProjectionError::PointAtInfinity(result.w));
    }

    let point = Point3::new(result.x / result.w, result.y / result.w, result.z / result.w);
    if point.coords.iter().all(|c| c.is_finite()) {
        Ok(point)
    } else {
        Err(ProjectionError::NonFinite)
    }
}

/// Project a world point into viewport pixels, the inverse of [`unproject`].
///
/// Returns the screen point and its NDC depth, or `None` for points outside
/// the near/far depth range, including anything behind the camera.
pub fn project(
    world: &WorldPoint,
    viewport: &Viewport,
    view: &Matrix4<f32>,
    projection: &Matrix4<f32>,
) -> Option<(ScreenPoint, f32)> {
    let clip = projection * view * world.to_homogeneous();
    if !(clip.w > W_EPSILON) {
        return None;
    }

    let ndc = clip.xyz() / clip.w;
    if !(-1.0..=1.0).contains(&ndc.z) {
        return None;
    }
    // ndc.x carries screen y and ndc.y carries screen x
    let screen = Point2::new(
        viewport.origin.x + (ndc.y + 1.0) * 0.5 * viewport.width,
        viewport.origin.y + (ndc.x + 1.0) * 0.5 * viewport.height,
    );
    Some((screen, ndc.z))
}

/// A free-look camera rig used where no tracked device pose exists
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Point3<f32>,
    /// Rotation about world +Y in radians
    pub yaw: f32,
    /// Rotation about the camera's +X in radians
    pub pitch: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Point3::origin(),
            yaw: 0.0,
            pitch: 0.0,
            fov: std::f32::consts::PI / 3.0, // 60 degrees
            aspect: aspect_ratio(width, height),
            near: 0.001,
            far: 1000.0,
        }
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    /// Turn the camera in place, clamping pitch short of straight up/down
    pub fn orbit(&mut self, dyaw: f32, dpitch: f32) {
        let limit = std::f32::consts::FRAC_PI_2 - 0.01;
        self.yaw += dyaw;
        self.pitch = (self.pitch + dpitch).clamp(-limit, limit);
    }

    /// Camera pose; an unrotated camera looks down world -Z with +Y up
    pub fn pose(&self) -> Isometry3<f32> {
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), self.yaw)
            * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), self.pitch);
        Isometry3::from_parts(Translation3::from(self.position.coords), rotation)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    pub fn state(&self) -> CameraState {
        CameraState::new(self.pose().to_homogeneous(), self.projection_matrix())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}
