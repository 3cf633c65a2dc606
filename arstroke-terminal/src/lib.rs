/// Terminal front-end for drawing 3D strokes with the mouse or a simulated hand
use arstroke_core::{
    Admission, Camera, CameraState, CapturedFrame, DetectionPipeline, DrawingSession, MaskTopPointDetector,
    Segment, StrokeColor, StrokeConfig, TrackingState, Viewport,
};
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use nalgebra::Point2;
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod renderer;
pub mod script;
pub mod sim;

pub use renderer::{preview_rows, AsciiRenderer};
pub use sim::SimulatedHand;

/// Resolution of the simulated camera image
const HAND_FRAME_SIZE: (usize, usize) = (160, 120);

/// Size in cells of the detector preview drawn in hand mode
const PREVIEW_SIZE: (usize, usize) = (24, 9);

/// Camera turn per key press, in radians
const ORBIT_STEP: f32 = 0.05;

/// Fingertip detection wired to a simulated camera
struct HandInput {
    pipeline: DetectionPipeline,
    hand: SimulatedHand,
    /// Latest mask returned by the detector
    preview: Option<CapturedFrame>,
}

impl HandInput {
    fn start() -> io::Result<Self> {
        let pipeline = DetectionPipeline::spawn(MaskTopPointDetector::default())
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        Ok(Self {
            pipeline,
            hand: SimulatedHand::new(HAND_FRAME_SIZE.0, HAND_FRAME_SIZE.1),
            preview: None,
        })
    }
}

/// Main application struct for terminal stroke drawing
pub struct TerminalApp {
    session: DrawingSession,
    camera: Camera,
    camera_state: CameraState,
    renderer: AsciiRenderer,
    scene: Vec<Segment>,
    hand: Option<HandInput>,
    tracking: TrackingState,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(config: StrokeConfig) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let viewport = Viewport::from_size(width as f32, height as f32);
        let camera = cell_camera(width, height);

        Ok(Self {
            session: DrawingSession::new(config, viewport),
            camera,
            camera_state: camera.state(),
            renderer: AsciiRenderer::new(width as usize, height as usize),
            scene: Vec::new(),
            hand: None,
            tracking: TrackingState::Normal,
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?)?;
            }

            self.update();
            self.render()?;

            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> io::Result<()> {
        match event {
            Event::Key(KeyEvent { code, .. }) => self.handle_key(code)?,
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => self.resize(width, height),
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> io::Result<()> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            // Screen x follows world y, so yaw moves the view vertically
            KeyCode::Char('w') | KeyCode::Up => self.camera.orbit(ORBIT_STEP, 0.0),
            KeyCode::Char('s') | KeyCode::Down => self.camera.orbit(-ORBIT_STEP, 0.0),
            KeyCode::Char('a') | KeyCode::Left => self.camera.orbit(0.0, ORBIT_STEP),
            KeyCode::Char('d') | KeyCode::Right => self.camera.orbit(0.0, -ORBIT_STEP),
            KeyCode::Char('0') => self.session.set_color(StrokeColor::WHITE),
            KeyCode::Char(c @ '1'..='9') => {
                let hue = (c as u32 - '1' as u32) as f32 * 40.0;
                self.session.set_color(StrokeColor::from_hsv(hue, 1.0, 1.0));
            }
            KeyCode::Char(' ') => {
                if self.session.is_drawing() {
                    self.session.end();
                } else {
                    self.session.begin(self.viewport());
                }
            }
            KeyCode::Char('h') => self.toggle_hand()?,
            KeyCode::Char('t') => {
                self.tracking = if self.tracking.is_normal() {
                    TrackingState::Limited
                } else {
                    TrackingState::Normal
                };
            }
            KeyCode::Char('c') => self.scene.clear(),
            _ => {}
        }
        Ok(())
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let point = Point2::new(mouse.column as f32 + 0.5, mouse.row as f32 + 0.5);
        let hand_mode = self.hand.is_some();
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if !hand_mode {
                    self.session.set_touch(point);
                }
                self.session.begin(self.viewport());
            }
            MouseEventKind::Drag(MouseButton::Left) if !hand_mode => {
                self.session.set_touch(point);
            }
            MouseEventKind::Up(MouseButton::Left) => self.session.end(),
            _ => {}
        }
    }

    fn toggle_hand(&mut self) -> io::Result<()> {
        if self.hand.take().is_some() {
            log::info!("hand mode off");
        } else {
            self.hand = Some(HandInput::start()?);
            log::info!("hand mode on");
        }
        Ok(())
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.session
            .set_viewport(Viewport::from_size(width as f32, height as f32));
        self.renderer.resize(width as usize, height as usize);
        self.camera.set_aspect(width as u32, height as u32 * 2);
    }

    fn viewport(&self) -> Viewport {
        *self.session.viewport()
    }

    fn update(&mut self) {
        let viewport = self.viewport();
        if let Some(input) = self.hand.as_mut() {
            // Consume the last result before the frame reads the touch point
            if let Some(update) = input.pipeline.poll(&viewport) {
                if let Some(touch) = update.touch {
                    self.session.set_touch(touch);
                }
                if update.preview.is_some() {
                    input.preview = update.preview;
                }
            }
            let frame = input.hand.next_frame();
            if input.pipeline.submit(frame, self.tracking) == Admission::Disconnected {
                self.hand = None;
            }
        }

        self.camera_state = self.camera.state().with_tracking(self.tracking);
        self.session
            .render_frame(Some(&self.camera_state), &mut self.scene);
    }

    fn render(&mut self) -> io::Result<()> {
        let viewport = self.viewport();

        self.renderer.clear();
        self.renderer
            .render_segments(&self.scene, &self.camera_state, &viewport);

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout)?;

        if let Some(preview) = self.hand.as_ref().and_then(|input| input.preview.as_ref()) {
            let (cols, rows) = PREVIEW_SIZE;
            let (width, height) = (viewport.width as usize, viewport.height as usize);
            // Leave the status line uncovered
            if width >= cols && height > rows {
                let (x, y) = ((width - cols) as u16, (height - rows) as u16);
                queue!(stdout, SetForegroundColor(Color::DarkCyan))?;
                for (i, line) in preview_rows(preview, cols, rows).into_iter().enumerate() {
                    queue!(stdout, cursor::MoveTo(x, y + i as u16), Print(line))?;
                }
                queue!(stdout, ResetColor)?;
            }
        }

        if self.hand.is_some() {
            let touch = self.session.touch();
            if viewport.contains(touch) {
                queue!(
                    stdout,
                    cursor::MoveTo(touch.x as u16, touch.y as u16),
                    SetForegroundColor(Color::Green),
                    Print('+'),
                    ResetColor
                )?;
            }
        }

        let color = self.session.color();
        let stats = self.session.stats();
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "ARStroke | FPS: {:.1} | Segments: {} | {} | {} | Tracking: {:?} | ",
                self.fps,
                self.scene.len(),
                if self.session.is_drawing() { "Drawing" } else { "Idle" },
                if self.hand.is_some() { "Hand" } else { "Mouse" },
                self.tracking,
            )),
            SetForegroundColor(Color::Rgb {
                r: color.r,
                g: color.g,
                b: color.b
            }),
            Print("###"),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                " | Strokes: {} | Drag=Draw Space=Pen H=Hand T=Tracking 0-9=Color WASD=Look C=Clear Q=Quit",
                stats.strokes
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

/// Camera whose aspect accounts for terminal cells being about twice as tall as wide
fn cell_camera(columns: u16, rows: u16) -> Camera {
    Camera::new(columns as u32, rows as u32 * 2)
}
