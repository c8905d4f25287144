use colored::Colorize;
use inkmark_utils::trimmed_or_none;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Stdout, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("terminal input was closed")]
    Closed,
    #[error("line editor failed: {0}")]
    Readline(#[from] ReadlineError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// The questions the session asks, independent of how they are rendered.
pub trait Prompter {
    /// Yes/no question. An empty answer picks `default`.
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, PromptError>;

    /// Free-text question. With a default, a blank answer yields the default;
    /// without one the answer is returned as typed.
    fn input(&mut self, message: &str, default: Option<&str>) -> Result<String, PromptError>;

    /// Pick one of `choices`, returning its index.
    fn select(&mut self, message: &str, choices: &[&str]) -> Result<usize, PromptError>;

    /// Print a plain line.
    fn say(&mut self, message: &str) -> Result<(), PromptError>;
}

/// Reads one answer per call after showing `prompt`.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<String, PromptError>;
}

impl LineSource for DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> Result<String, PromptError> {
        match self.readline(prompt) {
            Ok(line) => Ok(line),
            // Ctrl-D and Ctrl-C both end the session
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => Err(PromptError::Closed),
            Err(error) => Err(error.into()),
        }
    }
}

/// Prompter that reads answers from a [`LineSource`] and prints hints and
/// messages to `writer`.
pub struct TerminalPrompter<L, W> {
    lines: L,
    writer: W,
}

impl TerminalPrompter<DefaultEditor, Stdout> {
    pub fn stdio() -> Result<Self, PromptError> {
        Ok(Self::new(DefaultEditor::new()?, io::stdout()))
    }
}

impl<L: LineSource, W: Write> TerminalPrompter<L, W> {
    pub fn new(lines: L, writer: W) -> Self {
        Self { lines, writer }
    }

    #[cfg(test)]
    pub fn into_parts(self) -> (L, W) {
        (self.lines, self.writer)
    }

    fn ask(&mut self, question: &str, hint: Option<&str>) -> Result<String, PromptError> {
        let prompt = match hint {
            Some(hint) => format!(
                "{} {} {} ",
                "?".green().bold(),
                question.bold(),
                hint.dimmed()
            ),
            None => format!("{} {} ", "?".green().bold(), question.bold()),
        };
        self.writer.flush()?;

        let line = self.lines.read_line(&prompt)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl<L: LineSource, W: Write> Prompter for TerminalPrompter<L, W> {
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, PromptError> {
        let hint = if default { "(Y/n)" } else { "(y/N)" };
        loop {
            let answer = self.ask(message, Some(hint))?;
            match answer.trim().to_ascii_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.writer, "{}", "Please answer y or n.".yellow())?,
            }
        }
    }

    fn input(&mut self, message: &str, default: Option<&str>) -> Result<String, PromptError> {
        let hint = default.map(|value| format!("({value})"));
        let answer = self.ask(message, hint.as_deref())?;

        Ok(match default {
            Some(value) => trimmed_or_none(Some(answer.as_str())).unwrap_or(value).to_string(),
            None => answer,
        })
    }

    fn select(&mut self, message: &str, choices: &[&str]) -> Result<usize, PromptError> {
        loop {
            writeln!(self.writer, "{} {}", "?".green().bold(), message.bold())?;
            for (index, choice) in choices.iter().enumerate() {
                writeln!(self.writer, "  {}) {choice}", index + 1)?;
            }

            let answer = self.ask("Answer:", None)?;
            if let Some(index) = parse_choice(answer.trim(), choices) {
                return Ok(index);
            }
            writeln!(
                self.writer,
                "{}",
                format!("Please enter a number between 1 and {}.", choices.len()).yellow()
            )?;
        }
    }

    fn say(&mut self, message: &str) -> Result<(), PromptError> {
        writeln!(self.writer, "{message}")?;
        Ok(())
    }
}

fn parse_choice(answer: &str, choices: &[&str]) -> Option<usize> {
    if let Ok(number) = answer.parse::<usize>() {
        return (1..=choices.len()).contains(&number).then(|| number - 1);
    }

    choices
        .iter()
        .position(|choice| choice.eq_ignore_ascii_case(answer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct ScriptedLines {
        answers: VecDeque<String>,
        prompts: Vec<String>,
    }

    impl LineSource for ScriptedLines {
        fn read_line(&mut self, prompt: &str) -> Result<String, PromptError> {
            self.prompts.push(prompt.to_string());
            self.answers.pop_front().ok_or(PromptError::Closed)
        }
    }

    fn prompter(answers: &[&str]) -> TerminalPrompter<ScriptedLines, Vec<u8>> {
        colored::control::set_override(false);
        let lines = ScriptedLines {
            answers: answers.iter().map(|answer| answer.to_string()).collect(),
            ..ScriptedLines::default()
        };
        TerminalPrompter::new(lines, Vec::new())
    }

    fn finish(prompter: TerminalPrompter<ScriptedLines, Vec<u8>>) -> (Vec<String>, String) {
        let (lines, writer) = prompter.into_parts();
        (
            lines.prompts,
            String::from_utf8(writer).expect("utf-8 output"),
        )
    }

    #[test]
    fn confirm_uses_default_on_empty_answer() {
        let mut p = prompter(&["", ""]);
        assert!(p.confirm("Ready?", true).unwrap());
        assert!(!p.confirm("Ready?", false).unwrap());
    }

    #[test]
    fn confirm_reprompts_on_garbage() {
        let mut p = prompter(&["maybe", "NO"]);
        assert!(!p.confirm("Ready?", true).unwrap());

        let (prompts, output) = finish(p);
        assert_eq!(prompts, vec!["? Ready? (Y/n) "; 2]);
        assert!(output.contains("Please answer y or n."));
    }

    #[test]
    fn input_falls_back_to_default() {
        let mut p = prompter(&["   ", "  photo.png  "]);
        assert_eq!(p.input("File?", Some("test.jpg")).unwrap(), "test.jpg");
        assert_eq!(p.input("File?", Some("test.jpg")).unwrap(), "photo.png");

        let (prompts, _) = finish(p);
        assert_eq!(prompts[0], "? File? (test.jpg) ");
    }

    #[test]
    fn input_without_default_keeps_text_verbatim() {
        let mut p = prompter(&["  Hello world \r"]);
        assert_eq!(p.input("Text?", None).unwrap(), "  Hello world ");
    }

    #[test]
    fn select_accepts_number_or_label() {
        let choices = ["Text watermark", "Image watermark"];
        let mut p = prompter(&["3", "2", "image watermark"]);
        assert_eq!(p.select("Kind?", &choices).unwrap(), 1);
        assert_eq!(p.select("Kind?", &choices).unwrap(), 1);

        let (prompts, output) = finish(p);
        assert_eq!(prompts.len(), 3);
        assert!(output.contains("1) Text watermark"));
        assert!(output.contains("Please enter a number between 1 and 2."));
    }

    #[test]
    fn closed_input_is_reported() {
        let mut p = prompter(&[]);
        assert!(matches!(p.confirm("Ready?", true), Err(PromptError::Closed)));
    }
}
