/// Gesture scripts: a plain-text stand-in for touch input
///
/// One command per line, `#` starts a comment:
///
/// ```text
/// viewport 1000 1000
/// color 255 0 0
/// begin
/// move 500 500
/// move 520 505
/// frame 3
/// tracking limited
/// end
/// ```
use arstroke_core::{
    Camera, DrawingSession, Segment, SessionStats, StrokeColor, StrokeConfig, TrackingState,
    Viewport,
};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{space0, space1, u32 as parse_u32, u8 as parse_u8},
    combinator::{all_consuming, map, opt, value},
    number::complete::float,
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};

/// A single scripted input event
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Begin,
    /// Move the touch point and render one frame
    Move(f32, f32),
    End,
    Color(u8, u8, u8),
    Viewport(f32, f32),
    Tracking(TrackingState),
    /// Render frames without moving
    Frame(u32),
}

/// Parse a whole script, reporting the first bad line
pub fn parse_script(input: &str) -> Result<Vec<Command>, String> {
    let mut commands = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        match all_consuming(terminated(parse_command, space0))(line) {
            Ok((_, command)) => commands.push(command),
            Err(e) => return Err(format!("line {}: cannot parse {:?}: {:?}", index + 1, line, e)),
        }
    }
    Ok(commands)
}

fn parse_command(input: &str) -> IResult<&str, Command> {
    alt((
        value(Command::Begin, tag("begin")),
        value(Command::End, tag("end")),
        map(preceded(pair(tag("move"), space1), parse_pair), |(x, y)| {
            Command::Move(x, y)
        }),
        map(preceded(pair(tag("viewport"), space1), parse_pair), |(w, h)| {
            Command::Viewport(w, h)
        }),
        map(
            preceded(
                pair(tag("color"), space1),
                tuple((
                    parse_u8,
                    preceded(space1, parse_u8),
                    preceded(space1, parse_u8),
                )),
            ),
            |(r, g, b)| Command::Color(r, g, b),
        ),
        map(
            preceded(pair(tag("tracking"), space1), parse_tracking),
            Command::Tracking,
        ),
        map(preceded(tag("frame"), opt(preceded(space1, parse_u32))), |n| {
            Command::Frame(n.unwrap_or(1))
        }),
    ))(input)
}

fn parse_pair(input: &str) -> IResult<&str, (f32, f32)> {
    pair(float, preceded(space1, float))(input)
}

fn parse_tracking(input: &str) -> IResult<&str, TrackingState> {
    alt((
        value(TrackingState::Normal, tag("normal")),
        value(TrackingState::Limited, tag("limited")),
        value(TrackingState::NotAvailable, tag("lost")),
    ))(input)
}

/// Everything a replay produced
#[derive(Debug, Clone)]
pub struct Replay {
    pub segments: Vec<Segment>,
    pub stats: SessionStats,
}

/// Run commands through a drawing session with a fixed camera at the origin
pub fn replay(commands: &[Command], config: StrokeConfig) -> Replay {
    let mut viewport = Viewport::from_size(1000.0, 1000.0);
    let mut camera = Camera::new(1000, 1000);
    let mut tracking = TrackingState::Normal;
    let mut session = DrawingSession::new(config, viewport);
    let mut segments = Vec::new();

    for command in commands {
        let state = camera.state().with_tracking(tracking);
        match *command {
            Command::Begin => session.begin(viewport),
            Command::End => session.end(),
            Command::Move(x, y) => {
                session.set_touch(nalgebra::Point2::new(x, y));
                session.render_frame(Some(&state), &mut segments);
            }
            Command::Frame(n) => {
                for _ in 0..n {
                    session.render_frame(Some(&state), &mut segments);
                }
            }
            Command::Color(r, g, b) => session.set_color(StrokeColor::rgb(r, g, b)),
            Command::Viewport(w, h) => {
                viewport = Viewport::from_size(w, h);
                camera.set_aspect(w as u32, h as u32);
                session.set_viewport(viewport);
            }
            Command::Tracking(next) => tracking = next,
        }
    }

    Replay {
        segments,
        stats: session.stats(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let script = "\
            # warm up\n\
            viewport 800 600\n\
            color 10 20 30\n\
            begin\n\
            move 400 300   # centre\n\
            move 410.5 300\n\
            frame\n\
            frame 4\n\
            tracking lost\n\
            end\n";
        let commands = parse_script(script).unwrap();
        assert_eq!(
            commands,
            vec![
                Command::Viewport(800.0, 600.0),
                Command::Color(10, 20, 30),
                Command::Begin,
                Command::Move(400.0, 300.0),
                Command::Move(410.5, 300.0),
                Command::Frame(1),
                Command::Frame(4),
                Command::Tracking(TrackingState::NotAvailable),
                Command::End,
            ]
        );
    }

    #[test]
    fn test_parse_reports_line_number() {
        let err = parse_script("begin\nmove 1\n").unwrap_err();
        assert!(err.starts_with("line 2"), "{}", err);

        assert!(parse_script("color 300 0 0").is_err());
        assert!(parse_script("beginx").is_err());
    }

    #[test]
    fn test_replay_draws_one_segment_per_move() {
        let commands = parse_script(
            "begin\nmove 500 500\nmove 540 500\nmove 580 520\nend\nmove 900 900\n",
        )
        .unwrap();
        let replay = replay(&commands, StrokeConfig::default());
        assert_eq!(replay.segments.len(), 2);
        assert_eq!(replay.stats.strokes, 1);
    }

    #[test]
    fn test_replay_respects_color_and_tracking() {
        let commands = parse_script(
            "color 255 0 0\nbegin\nmove 500 500\nmove 560 500\ntracking limited\nmove 600 500\ntracking normal\nmove 640 500\nmove 680 500\n",
        )
        .unwrap();
        let replay = replay(&commands, StrokeConfig::default());
        // Limited tracking breaks the stroke; the next normal frame only reseeds
        assert_eq!(replay.segments.len(), 2);
        assert_eq!(replay.stats.skipped_frames, 1);
        assert!(replay
            .segments
            .iter()
            .all(|s| s.color == StrokeColor::rgb(255, 0, 0)));
    }
}
