//! Allow-listed script execution for `/run_script`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;

use crate::config::ScriptsConfig;

/// Telegram caps messages at 4096 UTF-16 code units; leave room for the marker.
const MAX_REPLY_UTF16: usize = 3900;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("unauthorized script: {0}")]
    Unauthorized(String),

    #[error("script timed out after {0} seconds")]
    Timeout(u64),

    #[error("failed to launch script: {0}")]
    Launch(#[from] std::io::Error),
}

/// Combined output of a finished script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl ScriptOutput {
    /// Text sent back to the chat.
    pub fn reply_text(&self) -> String {
        let combined = format!("{}{}", self.stdout, self.stderr);
        if combined.is_empty() {
            return "Script executed successfully.".to_string();
        }
        truncate_reply(format!("Script output:\n{}", combined))
    }
}

fn truncate_reply(mut text: String) -> String {
    if text.encode_utf16().count() <= MAX_REPLY_UTF16 {
        return text;
    }
    let mut units = 0;
    let mut cut = text.len();
    for (i, ch) in text.char_indices() {
        if units + ch.len_utf16() > MAX_REPLY_UTF16 {
            cut = i;
            break;
        }
        units += ch.len_utf16();
    }
    text.truncate(cut);
    text.push_str("\n...[truncated]");
    text
}

#[derive(Debug, Clone)]
pub struct ScriptRunner {
    directory: PathBuf,
    extension: String,
    interpreter: String,
    timeout_seconds: u64,
}

impl ScriptRunner {
    pub fn new(config: &ScriptsConfig) -> Self {
        Self {
            directory: config.directory.clone(),
            extension: config.extension.clone(),
            interpreter: config.interpreter.clone(),
            timeout_seconds: config.timeout_seconds,
        }
    }

    pub fn usage(&self) -> String {
        format!("Usage: /run_script <script_name{}>", self.extension)
    }

    /// Map a requested name onto a script file inside the scripts directory.
    ///
    /// The name must carry the configured extension, name an existing regular
    /// file, and still resolve inside the scripts directory once symlinks and
    /// `..` components are resolved.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, ScriptError> {
        let unauthorized = || ScriptError::Unauthorized(name.to_string());

        if name.is_empty() || !name.ends_with(&self.extension) {
            return Err(unauthorized());
        }

        let candidate = self.directory.join(name);
        if !candidate.is_file() {
            return Err(unauthorized());
        }

        let root = self.directory.canonicalize().map_err(|_| unauthorized())?;
        let resolved = candidate.canonicalize().map_err(|_| unauthorized())?;
        if !resolved.starts_with(&root) {
            tracing::warn!(
                "Rejected script {} resolving outside {}",
                name,
                root.display()
            );
            return Err(unauthorized());
        }

        Ok(resolved)
    }

    /// Run a resolved script, killing it once the timeout elapses.
    pub async fn run(&self, path: &Path) -> Result<ScriptOutput, ScriptError> {
        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::info!("Running script {} with {}", path.display(), self.interpreter);

        let timeout = Duration::from_secs(self.timeout_seconds);
        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    "Script {} exceeded timeout of {}s",
                    path.display(),
                    self.timeout_seconds
                );
                return Err(ScriptError::Timeout(self.timeout_seconds));
            }
        };

        if !output.status.success() {
            tracing::warn!("Script {} exited with {}", path.display(), output.status);
        }

        Ok(ScriptOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
        })
    }
}
