//! Report job lifecycle: template to source to rendered, archived artifact.
//!
//! A job runs strictly sequentially: resolve the derived name, settle the
//! source document against the overwrite policy, then optionally render and
//! archive, with at most one operator-confirmed recompile. Any filesystem
//! or renderer failure aborts the job; nothing is retried.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::ValueEnum;
use tracing::{debug, info};

use crate::archive::{archive_report, ensure_dir};
use crate::naming::NameSpec;
use crate::prompt::Confirm;
use crate::render::{RenderFormat, Renderer};
use crate::validators::{format_date, validate_today_folder};

/// Policy for handling an existing source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OverwritePolicy {
    /// Prompt; only the exact confirmation token overwrites.
    Ask,
    /// Always overwrite without prompting.
    Yes,
    /// Never overwrite.
    No,
}

/// How the source document was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOutcome {
    CreatedNew,
    ReusedExisting,
    Overwrote,
}

/// A rendered artifact together with the format it was rendered in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledReport {
    pub path: PathBuf,
    pub format: RenderFormat,
}

/// What a completed job actually did, so callers can assert on the path
/// taken instead of inferring it from the filesystem.
#[derive(Debug)]
pub struct JobOutcome {
    pub source_path: PathBuf,
    pub source: SourceOutcome,
    pub compiled: Option<CompiledReport>,
    pub recompiled: bool,
}

/// One report job, fully resolved. Every path is absolute by the time the
/// job is constructed; nothing below depends on the process working
/// directory.
#[derive(Debug)]
pub struct ReportJob {
    pub name_spec: NameSpec,
    pub template_path: PathBuf,
    pub source_dir: PathBuf,
    pub source_ext: String,
    pub output_folder: PathBuf,
    pub current_folder: PathBuf,
    pub date_format: String,
    pub format: RenderFormat,
    pub overwrite: OverwritePolicy,
    pub compile: bool,
    pub wait_for_recompile: bool,
    pub mirror_to_current: bool,
}

impl ReportJob {
    /// Run the job to completion.
    pub fn run(&self, renderer: &dyn Renderer, confirm: &mut dyn Confirm) -> Result<JobOutcome> {
        let base_name = self.name_spec.build_name()?;
        let source_path = self
            .source_dir
            .join(format!("{}.{}", base_name, self.source_ext));
        info!(
            base_name = %base_name,
            source = %source_path.display(),
            "job_started"
        );

        let source = self.prepare_source(&source_path, confirm)?;

        let mut compiled = None;
        let mut recompiled = false;
        if self.compile || self.wait_for_recompile {
            let report = self.compile_once(&base_name, &source_path, renderer)?;

            if self.wait_for_recompile {
                let artifact_name = report
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| base_name.clone());
                if confirm.confirm_recompile(&artifact_name)? {
                    compiled = Some(self.compile_once(&base_name, &source_path, renderer)?);
                    recompiled = true;
                } else {
                    debug!("recompile_declined");
                    compiled = Some(report);
                }
            } else {
                compiled = Some(report);
            }
        }

        info!(source_outcome = ?source, recompiled, "job_finished");
        Ok(JobOutcome {
            source_path,
            source,
            compiled,
            recompiled,
        })
    }

    /// Settle the source document: copy the template in, or keep an
    /// existing document the overwrite policy protects.
    fn prepare_source(&self, source_path: &Path, confirm: &mut dyn Confirm) -> Result<SourceOutcome> {
        ensure_dir(&self.source_dir)?;

        if source_path.is_file() {
            let source_name = source_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let overwrite = match self.overwrite {
                OverwritePolicy::Yes => true,
                OverwritePolicy::No => false,
                OverwritePolicy::Ask => confirm.confirm_overwrite(&source_name)?,
            };
            if !overwrite {
                info!(source = %source_path.display(), "source_reused");
                return Ok(SourceOutcome::ReusedExisting);
            }
            copy_template(&self.template_path, source_path)?;
            info!(source = %source_path.display(), "source_overwritten");
            return Ok(SourceOutcome::Overwrote);
        }

        copy_template(&self.template_path, source_path)?;
        info!(
            template = %self.template_path.display(),
            source = %source_path.display(),
            "source_created"
        );
        Ok(SourceOutcome::CreatedNew)
    }

    /// Validate the dated folder, render the source, and archive the
    /// artifact. The staleness check runs first so nothing is written under
    /// a folder named for the wrong day.
    fn compile_once(
        &self,
        base_name: &str,
        source_path: &Path,
        renderer: &dyn Renderer,
    ) -> Result<CompiledReport> {
        let today = Local::now().date_naive();
        validate_today_folder(&self.output_folder, &self.date_format, today)?;
        ensure_dir(&self.output_folder)?;

        let dated_name = format!("{}_{}", base_name, format_date(today, &self.date_format)?);
        let rendered = renderer.render(source_path, &self.output_folder, &dated_name, self.format)?;

        let path = archive_report(
            &rendered,
            &self.output_folder,
            base_name,
            self.mirror_to_current,
            &self.current_folder,
        )?;

        Ok(CompiledReport {
            path,
            format: self.format,
        })
    }
}

/// Copy a template into place. A copy that completes but leaves no file
/// behind counts as a failure, not a success.
fn copy_template(template: &Path, dest: &Path) -> Result<()> {
    fs::copy(template, dest).with_context(|| {
        format!(
            "failed to copy template {} to {}",
            template.display(),
            dest.display()
        )
    })?;
    if !dest.is_file() {
        bail!(
            "copying {} to {} had no effect",
            template.display(),
            dest.display()
        );
    }
    Ok(())
}
