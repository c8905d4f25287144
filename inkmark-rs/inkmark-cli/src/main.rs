use clap::Parser;
use inkmark_config::{Config, DEFAULT_LOG_FILTER, load_or_init};
use inkmark_image::{Color, OverlayStyle, TextStyle, parse_hex_color};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod prompt;
mod session;

use prompt::{PromptError, TerminalPrompter};
use session::{LibraryEditor, Session, SessionSettings, SessionSummary};

/// inkmark CLI entry point.
///
/// Walks the user through marking one image from the image directory with a
/// text or image watermark, optionally filtering it first.
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "inkmark",
    author,
    version,
    about = "Add text or image watermarks to your photos.",
    long_about = None
)]
struct Cli {
    /// Directory holding the images to mark (overrides the config file).
    #[arg(long, value_name = "DIR")]
    image_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let context = run(cli);

    init_tracing(&context.log_filter);
    for message in &context.infos {
        info!("{message}");
    }
    for warning in &context.warnings {
        warn!("{warning}");
    }
    info!(
        image_dir = %context.settings.image_dir.display(),
        config_ready = context.config_ready,
        "starting session"
    );

    let result = TerminalPrompter::stdio().and_then(|mut prompter| {
        let mut editor = LibraryEditor {
            text_style: context.text_style,
            overlay_style: OverlayStyle::default(),
        };
        Session::new(&mut prompter, &mut editor, &context.settings).run()
    });

    match &result {
        Ok(summary) => info!(
            completed = summary.completed.len(),
            failed = summary.failure.is_some(),
            "session finished"
        ),
        Err(error) => {
            error!(%error, "terminal interaction failed");
            eprintln!("inkmark: {error}");
        }
    }

    ExitCode::from(exit_status(&result))
}

/// `0` whenever the session ends, including after a reported failed attempt;
/// `1` when the terminal itself fails.
fn exit_status(result: &Result<SessionSummary, PromptError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Debug)]
struct RunContext {
    settings: SessionSettings,
    text_style: TextStyle,
    log_filter: String,
    infos: Vec<String>,
    warnings: Vec<String>,
    config_ready: bool,
}

/// Resolve the effective settings from the config file and the command line.
///
/// Messages are collected rather than logged because logging is configured
/// from the result.
fn run(cli: Cli) -> RunContext {
    let Cli { image_dir } = cli;

    let mut infos = Vec::new();
    let mut warnings = Vec::new();

    let (config, config_ready) = match load_or_init() {
        Ok(outcome) => {
            if outcome.created {
                infos.push(format!(
                    "Created inkmark configuration at {}",
                    outcome.path.display()
                ));
            }
            (outcome.config, true)
        }
        Err(error) => {
            warnings.push(format!(
                "Warning: failed to load inkmark configuration ({error}). Falling back to defaults."
            ));
            (Config::default(), false)
        }
    };

    let color = match parse_hex_color(&config.text_color) {
        Ok(color) => color,
        Err(error) => {
            warnings.push(format!(
                "Warning: ignoring text_color from configuration ({error}). Using black."
            ));
            Color::black()
        }
    };

    let text_style = TextStyle {
        font_size: if config.font_size.is_finite() && config.font_size > 0.0 {
            config.font_size
        } else {
            warnings.push(format!(
                "Warning: font_size must be a positive number, got {}. Using 32.",
                config.font_size
            ));
            TextStyle::default().font_size
        },
        color,
        font_path: config.font_path(),
    };

    let settings = SessionSettings {
        image_dir: image_dir.unwrap_or_else(|| config.image_dir()),
        default_input: config.default_input.clone(),
        default_watermark: config.default_watermark.clone(),
    };

    if !settings.image_dir.is_dir() {
        warnings.push(format!(
            "Warning: image directory {} does not exist yet. Create it and copy your images there.",
            settings.image_dir.display()
        ));
    }

    RunContext {
        settings,
        text_style,
        log_filter: config.log_filter,
        infos,
        warnings,
        config_ready,
    }
}

#[cfg(test)]
mod tests;
