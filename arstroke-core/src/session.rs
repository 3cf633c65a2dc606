/// Drawing session: turns input events and camera frames into segments
use nalgebra::Point2;

use crate::config::StrokeConfig;
use crate::geometry::{Segment, StrokeColor};
use crate::projection::{CameraState, ScreenPoint, TrackingState, Viewport};
use crate::stroke::StrokeState;

/// Whether a stroke is in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawState {
    #[default]
    Idle,
    Drawing,
}

/// Receiver for segments produced by a session, typically a scene graph
pub trait SegmentSink {
    fn add_segment(&mut self, segment: Segment);
}

impl SegmentSink for Vec<Segment> {
    fn add_segment(&mut self, segment: Segment) {
        self.push(segment);
    }
}

/// Running totals for a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub strokes: u64,
    pub segments: u64,
    pub skipped_frames: u64,
}

/// State owned by the render context for one drawing surface
#[derive(Debug, Clone)]
pub struct DrawingSession {
    config: StrokeConfig,
    state: DrawState,
    stroke: StrokeState,
    viewport: Viewport,
    touch: ScreenPoint,
    color: StrokeColor,
    tracking: TrackingState,
    stats: SessionStats,
}

impl DrawingSession {
    pub fn new(config: StrokeConfig, viewport: Viewport) -> Self {
        Self {
            config,
            state: DrawState::Idle,
            stroke: StrokeState::new(),
            viewport,
            touch: Point2::origin(),
            color: StrokeColor::default(),
            tracking: TrackingState::Normal,
            stats: SessionStats::default(),
        }
    }

    pub fn config(&self) -> &StrokeConfig {
        &self.config
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        self.state == DrawState::Drawing
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn touch(&self) -> &ScreenPoint {
        &self.touch
    }

    pub fn color(&self) -> StrokeColor {
        self.color
    }

    pub fn tracking(&self) -> TrackingState {
        self.tracking
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn stroke(&self) -> &StrokeState {
        &self.stroke
    }

    /// Start a stroke, snapshotting the surface used for unprojection
    pub fn begin(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if self.state == DrawState::Idle {
            self.state = DrawState::Drawing;
            self.stats.strokes += 1;
            log::debug!("stroke {} started", self.stats.strokes);
        }
    }

    pub fn end(&mut self) {
        if self.state == DrawState::Drawing {
            log::debug!("stroke {} ended", self.stats.strokes);
        }
        self.state = DrawState::Idle;
        self.stroke.reset();
    }

    pub fn set_touch(&mut self, point: ScreenPoint) {
        self.touch = point;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Only affects segments created after this call
    pub fn set_color(&mut self, color: StrokeColor) {
        self.color = color;
    }

    /// Degraded tracking pauses emission and breaks the current stroke
    pub fn set_tracking(&mut self, tracking: TrackingState) {
        if tracking == self.tracking {
            return;
        }
        if tracking.is_normal() {
            log::info!("tracking recovered, resuming stroke emission");
        } else {
            log::warn!("tracking {:?}, pausing stroke emission", tracking);
            self.stroke.reset();
        }
        self.tracking = tracking;
    }

    /// Run one render tick.
    ///
    /// Returns the segment produced this frame, if any. Frames without a
    /// camera, or with a camera that cannot be unprojected through, are
    /// skipped and leave the stroke untouched.
    pub fn frame(&mut self, camera: Option<&CameraState>) -> Option<Segment> {
        if self.state == DrawState::Idle {
            self.stroke.reset();
            return None;
        }

        let Some(camera) = camera else {
            self.stats.skipped_frames += 1;
            return None;
        };

        self.set_tracking(camera.tracking);
        if !self.tracking.is_normal() {
            self.stats.skipped_frames += 1;
            return None;
        }

        let raw = match camera.unproject(&self.touch, &self.viewport, self.config.depth_hint) {
            Ok(point) => point,
            Err(err) => {
                log::warn!("skipping frame: {}", err);
                self.stats.skipped_frames += 1;
                return None;
            }
        };

        let segment = self.stroke.advance(raw, self.color, &self.config)?;
        self.stats.segments += 1;
        Some(segment)
    }

    /// Run one render tick and hand any new segment to `sink`
    pub fn render_frame<S: SegmentSink + ?Sized>(
        &mut self,
        camera: Option<&CameraState>,
        sink: &mut S,
    ) -> bool {
        match self.frame(camera) {
            Some(segment) => {
                sink.add_segment(segment);
                true
            }
            None => false,
        }
    }
}
