/// ARStroke Core Library - Stroke geometry for drawing in an AR scene
///
/// This library turns 2D input points into 3D line strokes: unprojection
/// through the camera, temporal smoothing, segment construction, the
/// drawing session state machine and the off-thread fingertip detection gate.

pub mod config;
pub mod detection;
pub mod error;
pub mod geometry;
pub mod projection;
pub mod session;
pub mod stroke;
pub mod transform;

// Re-export commonly used types
pub use config::StrokeConfig;
pub use detection::{
    Admission, CapturedFrame, Detection, DetectionPipeline, DetectionUpdate, FingertipDetector,
    FrameSlot, MaskTopPointDetector,
};
pub use error::{ConfigError, DetectionError, GeometryError, ProjectionError};
pub use geometry::{build_segment, Cylinder, Segment, Sphere, StrokeColor};
pub use projection::{
    project, unproject, Camera, CameraState, ScreenPoint, TrackingState, Viewport, WorldPoint,
};
pub use session::{DrawState, DrawingSession, SegmentSink, SessionStats};
pub use stroke::{smooth, StrokeState};
pub use transform::{AxisAngle, Transform};
