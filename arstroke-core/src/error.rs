/// Error types for stroke geometry
use thiserror::Error;

/// Errors raised while mapping between screen space and world space
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ProjectionError {
    /// Viewport has zero or negative width/height
    #[error("viewport {width}x{height} has no area")]
    EmptyViewport { width: f32, height: f32 },

    /// The combined projection * view matrix cannot be inverted
    #[error("projection * view matrix is not invertible")]
    SingularMatrix,

    /// Homogeneous w collapsed to zero during the perspective divide
    #[error("unprojected point lies at infinity (w = {0})")]
    PointAtInfinity(f32),

    /// The result contains NaN or infinite components
    #[error("unprojection produced a non-finite point")]
    NonFinite,
}

/// Errors raised while building stroke segments
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    /// Two consecutive points are closer than the minimum segment length
    #[error("segment length {length} is below the minimum of {min}")]
    DegenerateSegment { length: f32, min: f32 },

    #[error("segment endpoint is not finite")]
    NonFinitePoint,
}

/// Invalid stroke configuration values
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("smoothing factor {0} must be in (0, 1]")]
    SmoothingFactor(f32),

    #[error("depth hint {0} must be within [-1, 1]")]
    DepthHint(f32),

    #[error("{name} radius {value} must be positive")]
    Radius { name: &'static str, value: f32 },

    #[error("minimum segment length {0} must be non-negative")]
    MinSegmentLength(f32),
}

/// Errors raised by fingertip detection
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectionError {
    /// Pixel buffer length does not match the frame dimensions
    #[error("frame {sequence} has {actual} bytes, expected {expected}")]
    BufferSize {
        sequence: u64,
        expected: usize,
        actual: usize,
    },

    /// The detector backend failed
    #[error("detector failed: {0}")]
    Backend(String),

    #[error("failed to start detection worker: {0}")]
    WorkerSpawn(String),

    /// The worker thread is gone
    #[error("detection worker disconnected")]
    Disconnected,
}
