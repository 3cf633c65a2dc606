/// ARStroke Terminal - draw 3D strokes in the terminal
///
/// Usage:
///   arstroke-terminal [--smoothing <factor>]
///   arstroke-terminal --script <file> [--smoothing <factor>]
///
/// Without a script, runs interactively:
///   - Mouse drag: Draw a stroke
///   - Space: Toggle the pen (for hand mode)
///   - H: Toggle the simulated hand detector
///   - T: Toggle degraded tracking
///   - 0-9: Stroke colour
///   - WASD / Arrow Keys: Look around
///   - C: Clear, Q/ESC: Quit

use arstroke_core::StrokeConfig;
use arstroke_terminal::script;
use arstroke_terminal::TerminalApp;
use std::env;
use std::fs;
use std::io;

struct Options {
    script: Option<String>,
    config: StrokeConfig,
}

fn parse_args() -> io::Result<Options> {
    let invalid = |msg: String| io::Error::new(io::ErrorKind::InvalidInput, msg);
    let mut options = Options {
        script: None,
        config: StrokeConfig::default(),
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--script" => {
                let path = args.next().ok_or_else(|| invalid("--script needs a path".into()))?;
                options.script = Some(path);
            }
            "--smoothing" => {
                let value = args
                    .next()
                    .ok_or_else(|| invalid("--smoothing needs a value".into()))?;
                let factor = value
                    .parse::<f32>()
                    .map_err(|e| invalid(format!("bad smoothing factor {:?}: {}", value, e)))?;
                options.config = options.config.with_smoothing_factor(factor);
            }
            other => return Err(invalid(format!("unknown argument: {}", other))),
        }
    }

    options
        .config
        .validate()
        .map_err(|e| invalid(e.to_string()))?;
    Ok(options)
}

fn run_script(path: &str, config: StrokeConfig) -> io::Result<()> {
    let text = fs::read_to_string(path)
        .map_err(|e| io::Error::new(io::ErrorKind::NotFound, format!("Failed to read script: {}", e)))?;
    let commands = script::parse_script(&text)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("Failed to parse script: {}", e)))?;

    let replay = script::replay(&commands, config);
    for (i, segment) in replay.segments.iter().enumerate() {
        println!(
            "{:4}: ({:.4}, {:.4}, {:.4}) -> ({:.4}, {:.4}, {:.4}) len {:.5} rgb({}, {}, {})",
            i,
            segment.start.x,
            segment.start.y,
            segment.start.z,
            segment.end.x,
            segment.end.y,
            segment.end.z,
            segment.length(),
            segment.color.r,
            segment.color.g,
            segment.color.b,
        );
    }
    println!(
        "Replayed {} commands: {} segments in {} strokes, {} frames skipped",
        commands.len(),
        replay.segments.len(),
        replay.stats.strokes,
        replay.stats.skipped_frames,
    );
    Ok(())
}

fn main() -> io::Result<()> {
    let options = parse_args()?;

    if let Some(path) = options.script {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
        return run_script(&path, options.config);
    }

    // Anything below error would scribble over the alternate screen
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();

    println!("ARStroke Terminal - Starting (press Q to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));

    let mut app = TerminalApp::new(options.config)?;
    app.run()?;

    println!("Thank you for using ARStroke Terminal!");
    Ok(())
}
