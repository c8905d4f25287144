use super::*;
use crate::session::AttemptError;
use inkmark_config::test_support::with_isolated_home;
use inkmark_config::{Config, DEFAULT_IMAGE_DIR, DEFAULT_LOG_FILTER, save};
use inkmark_image::{Color, TextStyle};
use std::fs;
use std::path::{Path, PathBuf};

fn config_path(home: &Path) -> PathBuf {
    home.join(".inkmark").join("config.toml")
}

#[test]
fn first_run_creates_config_and_uses_defaults() {
    with_isolated_home(|home| {
        let context = run(Cli::default());

        assert!(context.config_ready);
        assert!(
            context
                .infos
                .iter()
                .any(|info| info.contains("Created inkmark configuration"))
        );
        assert_eq!(context.settings.image_dir, PathBuf::from(DEFAULT_IMAGE_DIR));
        assert_eq!(context.settings.default_input, "test.jpg");
        assert_eq!(context.settings.default_watermark, "logo.png");
        assert_eq!(context.text_style, TextStyle::default());
        assert_eq!(context.log_filter, DEFAULT_LOG_FILTER);

        let contents = fs::read_to_string(config_path(home)).expect("config written");
        assert!(contents.contains("default_input = \"test.jpg\""));

        let second = run(Cli::default());
        assert!(second.infos.is_empty());
    });
}

#[test]
fn image_dir_flag_overrides_config() {
    with_isolated_home(|home| {
        let pictures = home.join("pictures");
        fs::create_dir_all(&pictures).expect("create pictures dir");

        let context = run(Cli {
            image_dir: Some(pictures.clone()),
        });

        assert_eq!(context.settings.image_dir, pictures);
        assert!(
            !context
                .warnings
                .iter()
                .any(|warning| warning.contains("does not exist yet"))
        );
    });
}

#[test]
fn missing_image_dir_is_warned_about() {
    with_isolated_home(|home| {
        let context = run(Cli {
            image_dir: Some(home.join("nowhere")),
        });

        assert!(
            context
                .warnings
                .iter()
                .any(|warning| warning.contains("does not exist yet"))
        );
    });
}

#[test]
fn configured_style_flows_into_text_watermarks() {
    with_isolated_home(|home| {
        let config = Config {
            font_path: "/opt/fonts/Sans.ttf".to_string(),
            font_size: 48.0,
            text_color: "#F00".to_string(),
            default_input: "holiday.png".to_string(),
            ..Config::default()
        };
        save(&config, &config_path(home)).expect("save config");

        let context = run(Cli::default());

        assert!(context.config_ready);
        assert_eq!(context.settings.default_input, "holiday.png");
        assert_eq!(
            context.text_style,
            TextStyle {
                font_size: 48.0,
                color: Color::new(255, 0, 0),
                font_path: Some(PathBuf::from("/opt/fonts/Sans.ttf")),
            }
        );
    });
}

#[test]
fn invalid_style_values_fall_back_with_warnings() {
    with_isolated_home(|home| {
        let config = Config {
            font_size: 0.0,
            text_color: "red".to_string(),
            ..Config::default()
        };
        save(&config, &config_path(home)).expect("save config");

        let context = run(Cli::default());

        assert_eq!(context.text_style.color, Color::black());
        assert_eq!(context.text_style.font_size, 32.0);
        assert!(
            context
                .warnings
                .iter()
                .any(|warning| warning.contains("ignoring text_color"))
        );
        assert!(
            context
                .warnings
                .iter()
                .any(|warning| warning.contains("font_size must be a positive number"))
        );
    });
}

#[test]
fn infinite_font_size_is_rejected() {
    with_isolated_home(|home| {
        let config = Config {
            font_size: f32::INFINITY,
            ..Config::default()
        };
        save(&config, &config_path(home)).expect("save config");

        let context = run(Cli::default());

        assert!(context.config_ready);
        assert_eq!(context.text_style.font_size, 32.0);
        assert!(
            context
                .warnings
                .iter()
                .any(|warning| warning.contains("font_size must be a positive number"))
        );
    });
}

#[test]
fn unreadable_config_falls_back_to_defaults() {
    with_isolated_home(|home| {
        let path = config_path(home);
        fs::create_dir_all(path.parent().expect("config has parent")).expect("create config dir");
        fs::write(&path, "image_dir = [").expect("write broken config");

        let context = run(Cli::default());

        assert!(!context.config_ready);
        assert_eq!(context.settings.image_dir, PathBuf::from(DEFAULT_IMAGE_DIR));
        assert!(
            context
                .warnings
                .iter()
                .any(|warning| warning.contains("Falling back to defaults"))
        );
    });
}

#[test]
fn cli_accepts_image_dir_flag() {
    let cli = Cli::try_parse_from(["inkmark", "--image-dir", "/tmp/photos"]).expect("parse");
    assert_eq!(cli.image_dir, Some(PathBuf::from("/tmp/photos")));

    let bare = Cli::try_parse_from(["inkmark"]).expect("parse without flags");
    assert!(bare.image_dir.is_none());
}

#[test]
fn failed_attempt_still_exits_cleanly() {
    let declined = Ok(SessionSummary::default());
    assert_eq!(exit_status(&declined), 0);

    let failed = Ok(SessionSummary {
        completed: Vec::new(),
        failure: Some(AttemptError::MissingInputFile {
            path: PathBuf::from("./img/test.jpg"),
        }),
    });
    assert_eq!(exit_status(&failed), 0);

    let broken = Err(PromptError::Io(std::io::Error::other("terminal gone")));
    assert_eq!(exit_status(&broken), 1);
}
