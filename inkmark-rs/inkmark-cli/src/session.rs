//! The interactive watermarking session.
//!
//! One attempt walks through the questions in order, builds a
//! [`SessionChoices`] value once everything has been answered, checks that
//! every file it needs exists and only then touches the images. A completed
//! attempt loops back to the welcome question; a failed one ends the session.

use crate::prompt::{PromptError, Prompter};
use inkmark_image::{FilterKind, ImageError, OverlayStyle, TextStyle};
use inkmark_utils::{existing_image, image_path, prepare_output_filename};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const INPUT_PROMPT: &str = "What file do you want to mark?";
pub const FILTER_QUESTION: &str = "Do you want to filter the photo?";
pub const FILTER_PROMPT: &str = "Which filter do you want to apply?";
pub const WATERMARK_KIND_PROMPT: &str = "Which watermark do you want to add?";
pub const WATERMARK_TEXT_PROMPT: &str = "Type your watermark text:";
pub const WATERMARK_IMAGE_PROMPT: &str = "Type your watermark name:";
pub const SUCCESS_MESSAGE: &str = "Success! Congrats!";
pub const MISSING_FILE_MESSAGE: &str = "Something went wrong... Try again";
pub const FAILURE_MESSAGE: &str = "Something went wrong... Try again!";

pub fn welcome_message(image_dir: &Path) -> String {
    format!(
        "Hi! Welcome to \"Watermark manager\". Copy your image files to `{}` folder. \
         Then you'll be able to use them in the app. Are you ready?",
        image_dir.display()
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkKind {
    Text,
    Image,
}

impl WatermarkKind {
    pub const ALL: [WatermarkKind; 2] = [WatermarkKind::Text, WatermarkKind::Image];

    pub fn label(self) -> &'static str {
        match self {
            WatermarkKind::Text => "Text watermark",
            WatermarkKind::Image => "Image watermark",
        }
    }
}

/// The watermark as the user described it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatermarkChoice {
    Text(String),
    /// File name relative to the image directory.
    Image(String),
}

/// Everything one attempt asked for, gathered before any work starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionChoices {
    pub input: String,
    pub filter: Option<FilterKind>,
    pub watermark: WatermarkChoice,
}

/// A validated job: every path points at a file that existed when checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
    pub filter: Option<FilterKind>,
    pub watermark: JobWatermark,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobWatermark {
    Text(String),
    Image(PathBuf),
}

impl SessionChoices {
    pub fn resolve(&self, image_dir: &Path) -> Result<Job, AttemptError> {
        let input = require_file(image_dir, &self.input)?;
        let watermark = match &self.watermark {
            WatermarkChoice::Text(text) => JobWatermark::Text(text.clone()),
            WatermarkChoice::Image(name) => JobWatermark::Image(require_file(image_dir, name)?),
        };

        Ok(Job {
            output: image_path(image_dir, &prepare_output_filename(&self.input)),
            input,
            filter: self.filter,
            watermark,
        })
    }
}

fn require_file(image_dir: &Path, name: &str) -> Result<PathBuf, AttemptError> {
    existing_image(image_dir, name).ok_or_else(|| AttemptError::MissingInputFile {
        path: image_path(image_dir, name),
    })
}

#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("image {path} does not exist")]
    MissingInputFile { path: PathBuf },
    #[error("image operation failed: {0}")]
    OperationFailure(#[from] ImageError),
}

/// The image operations a session needs.
pub trait ImageEditor {
    fn apply_filter(&mut self, path: &Path, kind: FilterKind) -> Result<(), ImageError>;

    fn add_text_watermark(
        &mut self,
        input: &Path,
        output: &Path,
        text: &str,
    ) -> Result<(), ImageError>;

    fn add_image_watermark(
        &mut self,
        input: &Path,
        output: &Path,
        watermark: &Path,
    ) -> Result<(), ImageError>;
}

/// [`ImageEditor`] backed by `inkmark-image`.
#[derive(Debug, Clone, Default)]
pub struct LibraryEditor {
    pub text_style: TextStyle,
    pub overlay_style: OverlayStyle,
}

impl ImageEditor for LibraryEditor {
    fn apply_filter(&mut self, path: &Path, kind: FilterKind) -> Result<(), ImageError> {
        inkmark_image::apply_filter(path, kind)
    }

    fn add_text_watermark(
        &mut self,
        input: &Path,
        output: &Path,
        text: &str,
    ) -> Result<(), ImageError> {
        inkmark_image::add_text_watermark(input, output, text, &self.text_style)
    }

    fn add_image_watermark(
        &mut self,
        input: &Path,
        output: &Path,
        watermark: &Path,
    ) -> Result<(), ImageError> {
        inkmark_image::add_image_watermark(input, output, watermark, &self.overlay_style)
            .map(|_| ())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub image_dir: PathBuf,
    pub default_input: String,
    pub default_watermark: String,
}

#[derive(Debug)]
pub enum AttemptOutcome {
    Declined,
    Completed { output: PathBuf },
    Failed(AttemptError),
}

#[derive(Debug, Default)]
pub struct SessionSummary {
    /// Outputs written by completed attempts, in order.
    pub completed: Vec<PathBuf>,
    /// Set when the session ended because an attempt failed.
    pub failure: Option<AttemptError>,
}

pub struct Session<'a, P, E> {
    prompter: &'a mut P,
    editor: &'a mut E,
    settings: &'a SessionSettings,
}

impl<'a, P: Prompter, E: ImageEditor> Session<'a, P, E> {
    pub fn new(prompter: &'a mut P, editor: &'a mut E, settings: &'a SessionSettings) -> Self {
        Self {
            prompter,
            editor,
            settings,
        }
    }

    /// Run attempts until the user declines, input closes or an attempt fails.
    pub fn run(&mut self) -> Result<SessionSummary, PromptError> {
        let mut summary = SessionSummary::default();

        loop {
            let outcome = match self.attempt() {
                Ok(outcome) => outcome,
                Err(PromptError::Closed) => {
                    debug!("terminal input closed, ending session");
                    return Ok(summary);
                }
                Err(error) => return Err(error),
            };

            match outcome {
                AttemptOutcome::Declined => {
                    debug!("user declined to start");
                    return Ok(summary);
                }
                AttemptOutcome::Completed { output } => {
                    info!(output = %output.display(), "watermark written");
                    self.prompter.say(SUCCESS_MESSAGE)?;
                    summary.completed.push(output);
                }
                AttemptOutcome::Failed(failure) => {
                    self.report(&failure)?;
                    summary.failure = Some(failure);
                    return Ok(summary);
                }
            }
        }
    }

    fn attempt(&mut self) -> Result<AttemptOutcome, PromptError> {
        let settings = self.settings;

        if !self
            .prompter
            .confirm(&welcome_message(&settings.image_dir), true)?
        {
            return Ok(AttemptOutcome::Declined);
        }

        let input = self
            .prompter
            .input(INPUT_PROMPT, Some(settings.default_input.as_str()))?;
        if let Err(missing) = require_file(&settings.image_dir, &input) {
            return Ok(AttemptOutcome::Failed(missing));
        }

        let filter = if self.prompter.confirm(FILTER_QUESTION, true)? {
            let labels = FilterKind::ALL.map(FilterKind::label);
            let index = self.prompter.select(FILTER_PROMPT, &labels)?;
            Some(FilterKind::ALL[index])
        } else {
            None
        };

        let labels = WatermarkKind::ALL.map(WatermarkKind::label);
        let kind = WatermarkKind::ALL[self.prompter.select(WATERMARK_KIND_PROMPT, &labels)?];
        let watermark = match kind {
            WatermarkKind::Text => {
                WatermarkChoice::Text(self.prompter.input(WATERMARK_TEXT_PROMPT, None)?)
            }
            WatermarkKind::Image => WatermarkChoice::Image(
                self.prompter
                    .input(WATERMARK_IMAGE_PROMPT, Some(settings.default_watermark.as_str()))?,
            ),
        };

        let choices = SessionChoices {
            input,
            filter,
            watermark,
        };
        debug!(?choices, "collected session choices");

        Ok(match self.process(&choices) {
            Ok(output) => AttemptOutcome::Completed { output },
            Err(failure) => AttemptOutcome::Failed(failure),
        })
    }

    fn process(&mut self, choices: &SessionChoices) -> Result<PathBuf, AttemptError> {
        let job = choices.resolve(&self.settings.image_dir)?;

        if let Some(kind) = job.filter {
            debug!(input = %job.input.display(), filter = %kind, "applying filter");
            self.editor.apply_filter(&job.input, kind)?;
        }

        match &job.watermark {
            JobWatermark::Text(text) => {
                self.editor
                    .add_text_watermark(&job.input, &job.output, text)?
            }
            JobWatermark::Image(watermark) => {
                self.editor
                    .add_image_watermark(&job.input, &job.output, watermark)?
            }
        }

        Ok(job.output)
    }

    fn report(&mut self, failure: &AttemptError) -> Result<(), PromptError> {
        match failure {
            AttemptError::MissingInputFile { path } => {
                warn!(path = %path.display(), "requested image does not exist");
                // acknowledged like a question; the answer is ignored
                match self.prompter.input(MISSING_FILE_MESSAGE, None) {
                    Ok(_) | Err(PromptError::Closed) => Ok(()),
                    Err(error) => Err(error),
                }
            }
            AttemptError::OperationFailure(source) => {
                error!(error = %source, "image operation failed");
                self.prompter.say(FAILURE_MESSAGE)
            }
        }
    }
}
