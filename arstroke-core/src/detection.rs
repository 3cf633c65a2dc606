/// Fingertip detection off the render context.
///
/// Frames are handed to a single worker thread through a one-slot gate: a
/// frame is only admitted once the previous result has been consumed on the
/// render context, so late frames are dropped instead of queued.
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use nalgebra::Point2;
use parking_lot::Mutex;

use crate::error::DetectionError;
use crate::projection::{ScreenPoint, TrackingState, Viewport};

/// A single-channel camera image, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    pub sequence: u64,
    pub width: usize,
    pub height: usize,
    pub pixels: Arc<[u8]>,
}

impl CapturedFrame {
    pub fn new(sequence: u64, width: usize, height: usize, pixels: impl Into<Arc<[u8]>>) -> Self {
        Self {
            sequence,
            width,
            height,
            pixels: pixels.into(),
        }
    }

    pub fn validate(&self) -> Result<(), DetectionError> {
        let expected = self.width * self.height;
        if self.pixels.len() == expected {
            Ok(())
        } else {
            Err(DetectionError::BufferSize {
                sequence: self.sequence,
                expected,
                actual: self.pixels.len(),
            })
        }
    }

    /// One row of pixels, `None` when it lies past the end of the buffer
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        let start = y.checked_mul(self.width)?;
        self.pixels.get(start..start.checked_add(self.width)?)
    }
}

/// Result of running a detector on one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    /// Fingertip position normalized to 0-1 on both axes
    pub fingertip: Option<Point2<f32>>,
    /// Annotated image for display
    pub preview: Option<CapturedFrame>,
}

/// Locates a fingertip in a captured frame
pub trait FingertipDetector: Send + 'static {
    fn detect(&mut self, frame: &CapturedFrame) -> Result<Detection, DetectionError>;
}

impl<F> FingertipDetector for F
where
    F: FnMut(&CapturedFrame) -> Result<Detection, DetectionError> + Send + 'static,
{
    fn detect(&mut self, frame: &CapturedFrame) -> Result<Detection, DetectionError> {
        self(frame)
    }
}

/// Finds the topmost foreground point of a hand segmentation mask
#[derive(Debug, Clone, Copy)]
pub struct MaskTopPointDetector {
    /// Pixels strictly above this value count as foreground
    pub threshold: u8,
}

impl MaskTopPointDetector {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    /// Normalized centre of the first row containing foreground.
    ///
    /// Frames whose buffer does not match their dimensions have no top point.
    pub fn top_point(&self, mask: &CapturedFrame) -> Option<Point2<f32>> {
        if let Err(err) = mask.validate() {
            log::debug!("skipping malformed mask: {}", err);
            return None;
        }
        (0..mask.height).find_map(|y| {
            let (sum, count) = mask
                .row(y)?
                .iter()
                .enumerate()
                .filter(|&(_, &value)| value > self.threshold)
                .fold((0usize, 0usize), |(sum, count), (x, _)| (sum + x, count + 1));
            (count > 0).then(|| {
                let x = sum as f32 / count as f32;
                Point2::new(
                    (x + 0.5) / mask.width as f32,
                    (y as f32 + 0.5) / mask.height as f32,
                )
            })
        })
    }
}

impl Default for MaskTopPointDetector {
    fn default() -> Self {
        Self::new(127)
    }
}

impl FingertipDetector for MaskTopPointDetector {
    fn detect(&mut self, frame: &CapturedFrame) -> Result<Detection, DetectionError> {
        frame.validate()?;
        Ok(Detection {
            fingertip: self.top_point(frame),
            preview: Some(frame.clone()),
        })
    }
}

/// A cell holding at most one value
#[derive(Debug, Default)]
pub struct FrameSlot<T> {
    inner: Mutex<Option<T>>,
}

impl<T> FrameSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Store `value` if the slot is empty, otherwise hand it back
    pub fn try_fill(&self, value: T) -> Result<(), T> {
        let mut inner = self.inner.lock();
        if inner.is_some() {
            return Err(value);
        }
        *inner = Some(value);
        Ok(())
    }

    pub fn take(&self) -> Option<T> {
        self.inner.lock().take()
    }

    /// Copy of the stored value, leaving the slot occupied
    pub fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        self.inner.lock().clone()
    }

    pub fn is_occupied(&self) -> bool {
        self.inner.lock().is_some()
    }
}

/// What happened to a submitted frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    /// A frame is still in flight; this one was dropped
    Busy,
    /// Tracking is not normal; frame dropped
    TrackingDegraded,
    /// The worker has stopped
    Disconnected,
}

/// A consumed detection result, mapped into viewport pixels
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionUpdate {
    pub sequence: u64,
    pub touch: Option<ScreenPoint>,
    pub preview: Option<CapturedFrame>,
}

struct Outcome {
    sequence: u64,
    result: Result<Detection, DetectionError>,
}

/// Owns the detection worker and the in-flight frame.
///
/// The slot is shared with the worker: the render context fills it, the
/// worker reads the frame out of it, and the render context empties it once
/// the result has been consumed.
pub struct DetectionPipeline {
    slot: Arc<FrameSlot<CapturedFrame>>,
    jobs: Option<Sender<()>>,
    results: Receiver<Outcome>,
    worker: Option<JoinHandle<()>>,
    dropped: u64,
}

impl DetectionPipeline {
    pub fn spawn<D: FingertipDetector>(detector: D) -> Result<Self, DetectionError> {
        let (job_tx, job_rx) = crossbeam_channel::bounded(1);
        let (result_tx, result_rx) = crossbeam_channel::bounded(1);
        let slot = Arc::new(FrameSlot::new());

        let worker_slot = Arc::clone(&slot);
        let worker = thread::Builder::new()
            .name("fingertip-detector".into())
            .spawn(move || run_worker(detector, worker_slot, job_rx, result_tx))
            .map_err(|e| DetectionError::WorkerSpawn(e.to_string()))?;

        Ok(Self {
            slot,
            jobs: Some(job_tx),
            results: result_rx,
            worker: Some(worker),
            dropped: 0,
        })
    }

    pub fn is_busy(&self) -> bool {
        self.slot.is_occupied()
    }

    /// Frames rejected because a detection was already in flight
    pub fn dropped_frames(&self) -> u64 {
        self.dropped
    }

    /// Offer a frame to the detector
    pub fn submit(&mut self, frame: CapturedFrame, tracking: TrackingState) -> Admission {
        if !tracking.is_normal() {
            return Admission::TrackingDegraded;
        }
        if self.slot.try_fill(frame).is_err() {
            self.dropped += 1;
            return Admission::Busy;
        }

        let sent = match &self.jobs {
            Some(jobs) => jobs.send(()).is_ok(),
            None => false,
        };
        if sent {
            Admission::Accepted
        } else {
            log::error!("detection worker is gone, releasing frame");
            self.slot.take();
            Admission::Disconnected
        }
    }

    /// Consume a finished detection without blocking.
    ///
    /// Must be called from the render context before it reads the touch
    /// location; consuming the result frees the slot for the next frame.
    pub fn poll(&mut self, viewport: &Viewport) -> Option<DetectionUpdate> {
        match self.results.try_recv() {
            Ok(outcome) => Some(self.complete(outcome, viewport)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.release_disconnected();
                None
            }
        }
    }

    /// Like [`poll`](Self::poll) but waits up to `timeout` for the result
    pub fn wait(&mut self, viewport: &Viewport, timeout: Duration) -> Option<DetectionUpdate> {
        if !self.is_busy() {
            return None;
        }
        match self.results.recv_timeout(timeout) {
            Ok(outcome) => Some(self.complete(outcome, viewport)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.release_disconnected();
                None
            }
        }
    }

    fn complete(&mut self, outcome: Outcome, viewport: &Viewport) -> DetectionUpdate {
        if let Some(frame) = self.slot.take() {
            if frame.sequence != outcome.sequence {
                log::warn!(
                    "result for frame {} released frame {}",
                    outcome.sequence,
                    frame.sequence
                );
            }
        }
        match outcome.result {
            Ok(detection) => DetectionUpdate {
                sequence: outcome.sequence,
                touch: detection.fingertip.map(|tip| viewport.denormalize(&tip)),
                preview: detection.preview,
            },
            Err(err) => {
                log::warn!("detection failed for frame {}: {}", outcome.sequence, err);
                DetectionUpdate {
                    sequence: outcome.sequence,
                    touch: None,
                    preview: None,
                }
            }
        }
    }

    fn release_disconnected(&mut self) {
        if self.slot.take().is_some() {
            log::error!("detection worker exited with a frame in flight");
        }
    }
}

impl Drop for DetectionPipeline {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("detection worker panicked");
            }
        }
    }
}

fn run_worker<D: FingertipDetector>(
    mut detector: D,
    slot: Arc<FrameSlot<CapturedFrame>>,
    jobs: Receiver<()>,
    results: Sender<Outcome>,
) {
    for () in jobs.iter() {
        // The render context only empties the slot after reading our result
        let Some(frame) = slot.peek() else {
            log::warn!("woken with an empty frame slot");
            continue;
        };
        let result = frame.validate().and_then(|_| detector.detect(&frame));
        let outcome = Outcome {
            sequence: frame.sequence,
            result,
        };
        if results.send(outcome).is_err() {
            break;
        }
    }
    log::debug!("detection worker exiting");
}
