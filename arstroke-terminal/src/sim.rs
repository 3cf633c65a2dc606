/// Synthetic hand masks for driving the fingertip detector without a camera
use arstroke_core::CapturedFrame;
use nalgebra::Point2;

/// Produces segmentation masks of a single raised finger moving on a
/// Lissajous path
pub struct SimulatedHand {
    width: usize,
    height: usize,
    sequence: u64,
    time: f32,
    step: f32,
    finger_half_width: usize,
}

impl SimulatedHand {
    /// Zero dimensions are raised to one pixel
    pub fn new(width: usize, height: usize) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            width,
            height,
            sequence: 0,
            time: 0.0,
            step: 1.0 / 30.0,
            finger_half_width: (width / 40).max(1),
        }
    }

    /// Normalized fingertip position at the current time
    pub fn fingertip(&self) -> Point2<f32> {
        Point2::new(
            0.5 + 0.3 * (1.3 * self.time).sin(),
            0.45 + 0.25 * (2.1 * self.time).sin(),
        )
    }

    /// Render the mask for the current time and advance the clock
    pub fn next_frame(&mut self) -> CapturedFrame {
        let tip = self.fingertip();
        let tip_x = (tip.x * self.width as f32) as usize;
        let tip_y = (tip.y * self.height as f32) as usize;
        let left = tip_x.saturating_sub(self.finger_half_width);
        let right = (tip_x + self.finger_half_width).min(self.width - 1);
        let left = left.min(right);

        let mut pixels = vec![0u8; self.width * self.height];
        for y in tip_y.min(self.height)..self.height {
            pixels[y * self.width + left..=y * self.width + right].fill(255);
        }

        self.sequence += 1;
        self.time += self.step;
        CapturedFrame::new(self.sequence, self.width, self.height, pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arstroke_core::MaskTopPointDetector;

    #[test]
    fn test_detector_finds_simulated_fingertip() {
        let mut hand = SimulatedHand::new(160, 120);
        let detector = MaskTopPointDetector::default();

        for _ in 0..20 {
            let expected = hand.fingertip();
            let frame = hand.next_frame();
            assert!(frame.validate().is_ok());

            let tip = detector.top_point(&frame).unwrap();
            assert!((tip.x - expected.x).abs() < 2.0 / 160.0);
            assert!((tip.y - expected.y).abs() < 2.0 / 120.0);
        }
    }

    #[test]
    fn test_frames_are_numbered() {
        let mut hand = SimulatedHand::new(8, 8);
        assert_eq!(hand.next_frame().sequence, 1);
        assert_eq!(hand.next_frame().sequence, 2);
    }

    #[test]
    fn test_zero_sized_hand_still_renders() {
        let mut hand = SimulatedHand::new(0, 0);
        for _ in 0..5 {
            let frame = hand.next_frame();
            assert_eq!((frame.width, frame.height), (1, 1));
            assert!(frame.validate().is_ok());
        }
        assert!(SimulatedHand::new(0, 12).next_frame().validate().is_ok());
    }
}
