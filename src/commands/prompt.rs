//! Line input for interactive commands

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::error::Result;

/// Source of single lines of operator input.
pub trait LinePrompt {
    /// Shows `prompt` and returns the trimmed reply.
    ///
    /// Returns `Ok(None)` when input ends (Ctrl-D) or is interrupted
    /// (Ctrl-C).
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Terminal prompt backed by rustyline.
pub struct ReadlinePrompt {
    editor: DefaultEditor,
}

impl ReadlinePrompt {
    /// Creates a prompt attached to the controlling terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be initialized.
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LinePrompt for ReadlinePrompt {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line.trim().to_string())),
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Replays canned answers; used by tests.
#[cfg(test)]
pub(crate) struct ScriptedPrompt {
    answers: std::collections::VecDeque<String>,
    pub(crate) asked: Vec<String>,
}

#[cfg(test)]
impl ScriptedPrompt {
    pub(crate) fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            asked: Vec::new(),
        }
    }
}

#[cfg(test)]
impl LinePrompt for ScriptedPrompt {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.asked.push(prompt.to_string());
        Ok(self.answers.pop_front().map(|a| a.trim().to_string()))
    }
}
