// ── User input ──
//
// The shell asks for input through `Prompter` so the dispatcher can run
// against scripted answers. On a terminal, dialoguer draws the prompts and
// keeps line history; otherwise answers are read line by line.

use std::fmt;
use std::io::{self, BufRead, IsTerminal};

use dialoguer::theme::{ColorfulTheme, Theme};
use dialoguer::{BasicHistory, Input, MultiSelect, Password, Select};
use thiserror::Error;

const HISTORY_SIZE: usize = 500;

#[derive(Debug, Error)]
pub enum PromptError {
    /// Ctrl-C, Esc, or input ended in the middle of a question.
    #[error("interrupted")]
    Interrupted,

    #[error(transparent)]
    Io(io::Error),
}

impl From<io::Error> for PromptError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::Interrupted {
            Self::Interrupted
        } else {
            Self::Io(err)
        }
    }
}

impl From<dialoguer::Error> for PromptError {
    fn from(err: dialoguer::Error) -> Self {
        let dialoguer::Error::IO(io) = err;
        io.into()
    }
}

pub trait Prompter {
    /// Next command line, `None` once input is exhausted.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, PromptError>;

    /// Free text. An empty answer yields `default` when one is given.
    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<String, PromptError>;

    /// Hidden text.
    fn secret(&mut self, prompt: &str) -> Result<String, PromptError>;

    /// Index of one of `items`.
    fn select(
        &mut self,
        prompt: &str,
        items: &[String],
        default: Option<usize>,
    ) -> Result<usize, PromptError>;

    /// Indices of any number of `items`.
    fn multi_select(
        &mut self,
        prompt: &str,
        items: &[String],
        defaults: &[bool],
    ) -> Result<Vec<usize>, PromptError>;

    /// Explicit `yes`/`y` (any case). Anything else declines.
    fn confirm(&mut self, prompt: &str) -> Result<bool, PromptError> {
        let answer = self.input(&format!("{prompt} [yes/no]"), None)?;
        Ok(is_affirmative(&answer))
    }
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "yes" | "y")
}

// ── Terminal ─────────────────────────────────────────────────────────

/// dialoguer on a terminal, line reads from stdin otherwise.
pub struct TerminalPrompter {
    history: BasicHistory,
    lines: Option<LinePrompter<io::StdinLock<'static>>>,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        let lines = (!io::stdin().is_terminal()).then(|| LinePrompter::new(io::stdin().lock()));
        Self {
            history: BasicHistory::new()
                .max_entries(HISTORY_SIZE)
                .no_duplicates(true),
            lines,
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, PromptError> {
        if let Some(ref mut lines) = self.lines {
            return lines.read_line(prompt);
        }
        let line: String = Input::with_theme(&ShellTheme)
            .with_prompt(prompt)
            .allow_empty(true)
            .history_with(&mut self.history)
            .interact_text()?;
        // Ctrl-D arrives as a literal EOT on an empty line.
        if line == "\u{4}" {
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<String, PromptError> {
        if let Some(ref mut lines) = self.lines {
            return lines.input(prompt, default);
        }
        let theme = ColorfulTheme::default();
        let mut input = Input::<String>::with_theme(&theme)
            .with_prompt(prompt)
            .allow_empty(true);
        if let Some(default) = default {
            input = input.default(default.to_owned());
        }
        Ok(input.interact_text()?)
    }

    fn secret(&mut self, prompt: &str) -> Result<String, PromptError> {
        if let Some(ref mut lines) = self.lines {
            return lines.secret(prompt);
        }
        Ok(Password::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()?)
    }

    fn select(
        &mut self,
        prompt: &str,
        items: &[String],
        default: Option<usize>,
    ) -> Result<usize, PromptError> {
        if let Some(ref mut lines) = self.lines {
            return lines.select(prompt, items, default);
        }
        Select::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .items(items)
            .default(default.unwrap_or(0))
            .interact_opt()?
            .ok_or(PromptError::Interrupted)
    }

    fn multi_select(
        &mut self,
        prompt: &str,
        items: &[String],
        defaults: &[bool],
    ) -> Result<Vec<usize>, PromptError> {
        if let Some(ref mut lines) = self.lines {
            return lines.multi_select(prompt, items, defaults);
        }
        MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .items(items)
            .defaults(defaults)
            .interact_opt()?
            .ok_or(PromptError::Interrupted)
    }
}

/// The shell prompt already carries its own decoration.
struct ShellTheme;

impl Theme for ShellTheme {
    fn format_input_prompt(
        &self,
        f: &mut dyn fmt::Write,
        prompt: &str,
        _default: Option<&str>,
    ) -> fmt::Result {
        write!(f, "{prompt}")
    }

    fn format_input_prompt_selection(
        &self,
        f: &mut dyn fmt::Write,
        prompt: &str,
        sel: &str,
    ) -> fmt::Result {
        write!(f, "{prompt}{sel}")
    }
}

// ── Line input ───────────────────────────────────────────────────────

/// Answers read one line at a time: piped stdin, or a script in tests.
///
/// Selections accept an item's text or its 1-based position; multi
/// selections take a comma-separated list. Unrecognised selections are
/// skipped and the next line is tried.
pub struct LinePrompter<R> {
    reader: R,
}

impl<R: BufRead> LinePrompter<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    fn next_line(&mut self) -> Result<Option<String>, PromptError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_owned()))
    }

    fn answer(&mut self) -> Result<String, PromptError> {
        self.next_line()?.ok_or(PromptError::Interrupted)
    }
}

impl<R: BufRead> Prompter for LinePrompter<R> {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>, PromptError> {
        self.next_line()
    }

    fn input(&mut self, _prompt: &str, default: Option<&str>) -> Result<String, PromptError> {
        let answer = self.answer()?;
        match default {
            Some(default) if answer.trim().is_empty() => Ok(default.to_owned()),
            _ => Ok(answer),
        }
    }

    fn secret(&mut self, _prompt: &str) -> Result<String, PromptError> {
        self.answer()
    }

    fn select(
        &mut self,
        _prompt: &str,
        items: &[String],
        default: Option<usize>,
    ) -> Result<usize, PromptError> {
        loop {
            let answer = self.answer()?;
            if answer.trim().is_empty() {
                if let Some(default) = default {
                    return Ok(default);
                }
            }
            if let Some(index) = position(items, &answer) {
                return Ok(index);
            }
        }
    }

    fn multi_select(
        &mut self,
        _prompt: &str,
        items: &[String],
        defaults: &[bool],
    ) -> Result<Vec<usize>, PromptError> {
        loop {
            let answer = self.answer()?;
            if answer.trim().is_empty() {
                return Ok(defaults
                    .iter()
                    .enumerate()
                    .filter_map(|(i, on)| on.then_some(i))
                    .collect());
            }
            let picked: Option<Vec<usize>> =
                answer.split(',').map(|part| position(items, part)).collect();
            if let Some(picked) = picked {
                return Ok(picked);
            }
        }
    }
}

fn position(items: &[String], answer: &str) -> Option<usize> {
    let answer = answer.trim();
    items.iter().position(|item| item == answer).or_else(|| {
        answer
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=items.len()).contains(n))
            .map(|n| n - 1)
    })
}
