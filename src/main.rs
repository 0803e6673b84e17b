use anyhow::{Context, Result, bail};
use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::env;
use std::fs::File;
use std::io::{BufWriter, Stdout, Write, stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use fusebomb::canvas::Canvas;
use fusebomb::config::{Config, parse_hex_color};
use fusebomb::countdown::{Command, Countdown, Frame};

fn print_usage() {
    eprintln!("fusebomb - Countdown timer with a burning fuse");
    eprintln!();
    eprintln!("Usage: fusebomb [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --duration SECS    Countdown length in seconds (10-300, default 60)");
    eprintln!("  --config PATH      Load settings from a TOML file");
    eprintln!("  --bg-color RRGGBB  Set background color as hex (e.g., --bg-color 1a1b26)");
    eprintln!("  --log PATH         Write logs to PATH (default: fusebomb.log in the temp dir)");
    eprintln!("  --dump-config      Print the effective config as TOML and exit");
    eprintln!();
    eprintln!("Keys:");
    eprintln!("  Space / s          Light the fuse (restarts a running countdown)");
    eprintln!("  x / Backspace      Stamp the fuse out");
    eprintln!("  q / Esc / Ctrl+C   Quit");
}

#[derive(Default)]
struct Args {
    duration: Option<u32>,
    config: Option<PathBuf>,
    bg_color: Option<(u8, u8, u8)>,
    log: Option<PathBuf>,
    dump_config: bool,
    help: bool,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match (args[i].as_str(), value) {
            ("--duration", Some(v)) => {
                let secs = v.parse::<u32>().with_context(|| format!("invalid duration: {v}"))?;
                parsed.duration = Some(secs);
                i += 2;
            }
            ("--config", Some(v)) => {
                parsed.config = Some(PathBuf::from(v));
                i += 2;
            }
            ("--bg-color", Some(v)) => {
                let Some(color) = parse_hex_color(v) else {
                    bail!("invalid hex color: {v} (expected RRGGBB, e.g. 1a1b26)");
                };
                parsed.bg_color = Some(color);
                i += 2;
            }
            ("--log", Some(v)) => {
                parsed.log = Some(PathBuf::from(v));
                i += 2;
            }
            ("--dump-config", _) => {
                parsed.dump_config = true;
                i += 1;
            }
            ("help" | "--help" | "-h", _) => {
                parsed.help = true;
                i += 1;
            }
            (flag @ ("--duration" | "--config" | "--bg-color" | "--log"), None) => {
                bail!("{flag} requires a value");
            }
            (arg, _) => bail!("unknown option: {arg}"),
        }
    }

    Ok(parsed)
}

fn init_logging(path: PathBuf) -> Result<()> {
    let file = File::create(&path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fusebomb=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(filter)
        .init();
    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::default(),
    };

    if let Some(secs) = args.duration {
        config.countdown.duration_secs = secs;
    }
    if let Some(color) = args.bg_color {
        config.canvas.background = color;
    }
    config.validate();
    Ok(config)
}

fn new_canvas(config: &Config, cols: u16, rows: u16) -> Canvas {
    Canvas::new(
        cols as usize,
        rows as usize * 2,
        config.canvas.width,
        config.canvas.height,
        config.canvas.background,
    )
}

fn run(config: Config) -> Result<()> {
    let mut stdout = BufWriter::with_capacity(1024 * 64, stdout());

    terminal::enable_raw_mode().context("failed to enter raw mode")?;
    execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))?;

    let result = frame_loop(&mut stdout, config);

    execute!(stdout, Show, LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;

    result
}

fn frame_loop(stdout: &mut BufWriter<Stdout>, config: Config) -> Result<()> {
    let (cols, rows) = terminal::size()?;
    let mut canvas = new_canvas(&config, cols, rows);
    let mut countdown = Countdown::new(config, fastrand::Rng::new());

    let clock = Instant::now();
    let mut last_frame = clock;
    let mut accumulator = 0.0f32;
    const FIXED_DT: f32 = 1.0 / 60.0;

    loop {
        let now_ms = clock.elapsed().as_millis() as u64;

        if event::poll(Duration::from_millis(1))? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                    KeyCode::Char(' ') | KeyCode::Char('s') | KeyCode::Enter => {
                        countdown.command(Command::Start, now_ms);
                    }
                    KeyCode::Char('x') | KeyCode::Backspace => {
                        countdown.command(Command::Stop, now_ms);
                    }
                    _ => {}
                },
                Event::Resize(cols, rows) => {
                    canvas = new_canvas(countdown.config(), cols, rows);
                    execute!(stdout, Clear(ClearType::All))?;
                }
                _ => {}
            }
        }

        let now = Instant::now();
        let frame_time = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        accumulator += frame_time;
        if accumulator > FIXED_DT * 3.0 {
            accumulator = FIXED_DT * 3.0;
        }

        while accumulator >= FIXED_DT {
            if let Frame::Finished = countdown.update(now_ms) {
                info!("ready for another run");
            }
            accumulator -= FIXED_DT;
        }

        countdown.render(now_ms, &mut canvas);
        canvas.present(stdout)?;
    }

    Ok(())
}

fn main() -> Result<()> {
    let argv: Vec<String> = env::args().collect();
    let args = match parse_args(&argv) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if args.help {
        print_usage();
        return Ok(());
    }

    let log_path = args
        .log
        .clone()
        .unwrap_or_else(|| env::temp_dir().join("fusebomb.log"));
    init_logging(log_path)?;
    info!("fusebomb {} starting", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args)?;
    if args.dump_config {
        print!("{}", config.to_toml_string()?);
        std::io::stdout().flush()?;
        return Ok(());
    }

    run(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(list: &[&str]) -> Vec<String> {
        std::iter::once("fusebomb").chain(list.iter().copied()).map(String::from).collect()
    }

    #[test]
    fn parses_all_flags() {
        let args = parse_args(&argv(&[
            "--duration",
            "90",
            "--bg-color",
            "1a1b26",
            "--config",
            "a.toml",
            "--log",
            "b.log",
            "--dump-config",
        ]))
        .expect("valid args");
        assert_eq!(args.duration, Some(90));
        assert_eq!(args.bg_color, Some((0x1a, 0x1b, 0x26)));
        assert_eq!(args.config, Some(PathBuf::from("a.toml")));
        assert_eq!(args.log, Some(PathBuf::from("b.log")));
        assert!(args.dump_config);
        assert!(!args.help);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(&argv(&["--duration"])).is_err());
        assert!(parse_args(&argv(&["--duration", "soon"])).is_err());
        assert!(parse_args(&argv(&["--bg-color", "red"])).is_err());
        assert!(parse_args(&argv(&["fireworks"])).is_err());
    }

    #[test]
    fn cli_overrides_are_clamped() {
        let args = Args {
            duration: Some(3600),
            ..Args::default()
        };
        let config = load_config(&args).expect("config");
        assert_eq!(config.countdown.duration_secs, fusebomb::config::MAX_DURATION_SECS);
    }
}
