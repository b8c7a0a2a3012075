//! Terminal prompts
//!
//! Annotation text is composed in $EDITOR; book edits and confirmations
//! are read line by line from stdin.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::Command;
use std::{env, fs};

use anyhow::{bail, Context, Result};

/// Lines starting with this marker are stripped from composed text
const COMMENT_MARKER: &str = "<!--";

/// Compose text in the user's editor, starting from a comment header and `body`
///
/// Returns the text with comment lines removed and surrounding blanks trimmed.
pub fn compose(header: &str, body: &str) -> Result<String> {
    let editor = editor_command().context("No editor found. Set $EDITOR, e.g. export EDITOR=nano")?;
    let draft = ScratchFile::new();

    fs::write(&draft.0, format!("{} {} -->\n\n{}", COMMENT_MARKER, header, body))
        .with_context(|| format!("Failed to write scratch file: {:?}", draft.0))?;

    let status = Command::new(&editor)
        .arg(&draft.0)
        .status()
        .with_context(|| format!("Failed to run editor: {}", editor))?;
    if !status.success() {
        bail!("Editor '{}' exited with {}", editor, status);
    }

    let written = fs::read_to_string(&draft.0)
        .with_context(|| format!("Failed to read scratch file: {:?}", draft.0))?;
    Ok(strip_comments(&written))
}

fn strip_comments(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with(COMMENT_MARKER))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Removed on drop, whatever the editor did
struct ScratchFile(PathBuf);

impl ScratchFile {
    fn new() -> Self {
        Self(env::temp_dir().join(format!("shelf-note-{}.md", std::process::id())))
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}

/// $EDITOR, then $VISUAL, then the first common editor on PATH
fn editor_command() -> Option<String> {
    ["EDITOR", "VISUAL"]
        .iter()
        .filter_map(|var| env::var(var).ok())
        .find(|value| !value.trim().is_empty())
        .or_else(|| {
            ["nano", "vim", "vi"]
                .iter()
                .find(|cmd| on_path(cmd))
                .map(|cmd| cmd.to_string())
        })
}

fn on_path(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .is_ok_and(|o| o.status.success())
}

fn read_answer() -> Result<String> {
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Ask a yes/no question; anything but y/yes is no, as is a non-interactive stdin
pub fn confirm(question: &str) -> Result<bool> {
    if !io::stdin().is_terminal() {
        return Ok(false);
    }
    print!("{} [y/N] ", question);
    let answer = read_answer()?.to_lowercase();
    Ok(matches!(answer.as_str(), "y" | "yes"))
}

/// Ask for a field value showing the current one; `None` keeps it
pub fn ask(label: &str, current: &str) -> Result<Option<String>> {
    if current.is_empty() {
        print!("{}: ", label);
    } else {
        print!("{} [{}]: ", label, current);
    }
    let answer = read_answer()?;
    Ok((!answer.is_empty()).then_some(answer))
}
