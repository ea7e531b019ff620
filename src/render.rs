//! External document renderer.
//!
//! Rendering is delegated to a converter command on the operator's PATH
//! (pandoc by default). The call is synchronous and has no timeout; a
//! failure aborts the current job and is never retried.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use thiserror::Error;
use tracing::{debug, info};

/// Target output format for rendered artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFormat {
    Html,
    Pdf,
}

/// Raised when a configured format value is not one of the supported ones.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported render format '{0}' (expected 'html' or 'pdf')")]
pub struct UnknownFormatError(String);

impl RenderFormat {
    /// Parse a configured format value. Anything but the two supported
    /// formats is a configuration error.
    pub fn parse(value: &str) -> Result<Self, UnknownFormatError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "pdf" => Ok(Self::Pdf),
            _ => Err(UnknownFormatError(value.to_string())),
        }
    }

    /// File extension for artifacts in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Pdf => "pdf",
        }
    }
}

impl std::fmt::Display for RenderFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// A document converter that turns a source document into a rendered
/// artifact on disk. Tests substitute a recording implementation.
pub trait Renderer {
    /// Render `source` into `output_dir` as `{output_name}.{format ext}`.
    /// Returns the path of the artifact that was written.
    fn render(
        &self,
        source: &Path,
        output_dir: &Path,
        output_name: &str,
        format: RenderFormat,
    ) -> Result<PathBuf>;
}

/// Renderer that shells out to an external converter command.
pub struct CommandRenderer {
    command: String,
    extra_args: Vec<String>,
}

impl CommandRenderer {
    pub fn new(command: impl Into<String>, extra_args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            extra_args,
        }
    }
}

impl Renderer for CommandRenderer {
    fn render(
        &self,
        source: &Path,
        output_dir: &Path,
        output_name: &str,
        format: RenderFormat,
    ) -> Result<PathBuf> {
        let output_path = output_dir.join(format!("{}.{}", output_name, format.extension()));
        debug!(
            source = %source.display(),
            output = %output_path.display(),
            "render_started"
        );

        let status = Command::new(&self.command)
            .arg(source)
            .args(&self.extra_args)
            .arg("-o")
            .arg(&output_path)
            .status()
            .with_context(|| format!("failed to run renderer '{}'", self.command))?;

        if !status.success() {
            bail!(
                "renderer '{}' exited with {} for {}",
                self.command,
                status,
                source.display()
            );
        }
        if !output_path.is_file() {
            bail!(
                "renderer '{}' reported success but wrote no file at {}",
                self.command,
                output_path.display()
            );
        }

        info!(artifact = %output_path.display(), format = %format, "render_complete");
        Ok(output_path)
    }
}
