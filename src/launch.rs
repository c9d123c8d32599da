//! Starting a catalogue entry's launch command.
//!
//! The process is started detached and never waited on.

use log::info;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;

use crate::catalogue::CatalogueError;

/// Separator between the Steam executable and the app id
const APPLAUNCH: &str = " -applaunch ";

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Catalogue(#[from] CatalogueError),

    #[error("\"{0}\" has no launch command")]
    NoCommand(String),

    #[error("failed to start {program}")]
    Spawn { program: String, source: io::Error },
}

/// A launch command split into program and arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl LaunchCommand {
    /// Split a stored launch command.
    ///
    /// Steam commands split at `-applaunch`, so the launcher path may hold
    /// spaces. Other commands take a quoted program, or the whole text when
    /// it names an existing file, or else the first word. Returns `None` for
    /// blank commands.
    pub fn parse(command: &str) -> Option<Self> {
        let command = command.trim();
        if command.is_empty() {
            return None;
        }

        if let Some((launcher, app_id)) = command.rsplit_once(APPLAUNCH) {
            let program = unquote(launcher.trim());
            if !program.is_empty() {
                let mut args = vec!["-applaunch".to_string()];
                args.extend(app_id.split_whitespace().map(str::to_string));
                return Some(Self {
                    program: program.to_string(),
                    args,
                });
            }
        }

        if let Some(rest) = command.strip_prefix('"') {
            if let Some((program, args)) = rest.split_once('"') {
                return Some(Self {
                    program: program.to_string(),
                    args: args.split_whitespace().map(str::to_string).collect(),
                });
            }
        }

        if Path::new(command).is_file() {
            return Some(Self {
                program: command.to_string(),
                args: Vec::new(),
            });
        }

        let mut words = command.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Self {
            program,
            args: words.collect(),
        })
    }

    /// Start the process without waiting for it, returning its pid
    pub fn spawn_detached(&self) -> Result<u32, LaunchError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        info!("Started {} (pid {})", self.program, child.id());
        Ok(child.id())
    }
}

fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}
