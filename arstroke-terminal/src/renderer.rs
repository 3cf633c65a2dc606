/// ASCII rasterizer for terminal rendering of strokes
use arstroke_core::{CameraState, CapturedFrame, ScreenPoint, Segment, StrokeColor, Viewport};
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::Write;

/// Character ramp for depth shading (farthest to nearest)
const DEPTH_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%'];

/// Character used for the sphere at each joint
const JOINT_CHAR: char = '@';

/// NDC depth span mapped onto the ramp, measured back from the far plane
const DEPTH_SPAN: f32 = 0.05;

/// ASCII renderer that draws stroke segments as terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    color_buffer: Vec<Option<StrokeColor>>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            color_buffer: vec![None; size],
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
        self.color_buffer.fill(None);
    }

    /// Character at a cell, mainly for inspection in tests
    pub fn cell(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.char_buffer[y * self.width + x])
    }

    pub fn render_segments(&mut self, segments: &[Segment], camera: &CameraState, viewport: &Viewport) {
        for segment in segments {
            self.render_segment(segment, camera, viewport);
        }
    }

    fn render_segment(&mut self, segment: &Segment, camera: &CameraState, viewport: &Viewport) {
        let Some(start) = camera.project(&segment.start, viewport) else {
            return; // Behind the camera
        };
        let Some(end) = camera.project(&segment.end, viewport) else {
            return;
        };

        self.rasterize_line(start, end, segment.color);
        self.plot(end.0, end.1, JOINT_CHAR, segment.color);
    }

    fn rasterize_line(
        &mut self,
        (from, from_depth): (ScreenPoint, f32),
        (to, to_depth): (ScreenPoint, f32),
        color: StrokeColor,
    ) {
        let bounds = (self.width as f32, self.height as f32);
        let Some((t0, t1)) = clip_line(from, to, bounds) else {
            return; // Entirely off screen
        };
        let (from, to, from_depth, to_depth) = (
            from + (to - from) * t0,
            from + (to - from) * t1,
            from_depth + (to_depth - from_depth) * t0,
            from_depth + (to_depth - from_depth) * t1,
        );

        let steps = (to.x - from.x).abs().max((to.y - from.y).abs()).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let point = from + (to - from) * t;
            let depth = from_depth + (to_depth - from_depth) * t;
            self.plot(point, depth, shade(depth), color);
        }
    }

    fn plot(&mut self, point: ScreenPoint, depth: f32, character: char, color: StrokeColor) {
        if point.x < 0.0 || point.y < 0.0 {
            return;
        }
        let (x, y) = (point.x as usize, point.y as usize);
        if x >= self.width || y >= self.height {
            return;
        }

        let idx = y * self.width + x;
        if depth <= self.depth_buffer[idx] {
            self.depth_buffer[idx] = depth;
            self.char_buffer[idx] = character;
            self.color_buffer[idx] = Some(color);
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                let color = match self.color_buffer[idx] {
                    Some(StrokeColor { r, g, b }) => Color::Rgb { r, g, b },
                    None => Color::DarkGrey,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(self.char_buffer[idx]))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Liang-Barsky clip of `from -> to` against `[0, width] x [0, height]`.
///
/// Returns the parameter range of the visible part, if any.
fn clip_line(from: ScreenPoint, to: ScreenPoint, (width, height): (f32, f32)) -> Option<(f32, f32)> {
    let delta = to - from;
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;
    for (p, q) in [
        (-delta.x, from.x),
        (delta.x, width - from.x),
        (-delta.y, from.y),
        (delta.y, height - from.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((t0, t1))
}

/// Downsample a detector mask into `rows` lines of `cols` characters,
/// `#` for foreground and `.` for background
pub fn preview_rows(frame: &CapturedFrame, cols: usize, rows: usize) -> Vec<String> {
    if cols == 0 || rows == 0 || frame.validate().is_err() {
        return Vec::new();
    }
    (0..rows)
        .map(|r| {
            let row = frame.row(r * frame.height / rows).unwrap_or(&[]);
            (0..cols)
                .map(|c| match row.get(c * frame.width / cols) {
                    Some(&value) if value > 127 => '#',
                    _ => '.',
                })
                .collect()
        })
        .collect()
}

/// Nearer points get denser characters
fn shade(depth: f32) -> char {
    let nearness = ((1.0 - depth) / DEPTH_SPAN).clamp(0.0, 1.0);
    let index = (nearness * (DEPTH_RAMP.len() - 1) as f32).round() as usize;
    DEPTH_RAMP[index.min(DEPTH_RAMP.len() - 1)]
}
