mod archive;
mod config;
mod job;
mod logging;
mod naming;
mod prompt;
mod render;
mod templates;
mod validators;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::Parser;
use tracing::{debug, info};

use crate::config::Config;
use crate::job::{JobOutcome, OverwritePolicy, ReportJob, SourceOutcome};
use crate::naming::{NameSpec, parse_tag_argument};
use crate::prompt::ConsoleConfirm;
use crate::render::{CommandRenderer, RenderFormat};
use crate::validators::{format_date, validate_file_exists};

/// Produce and archive dated analysis reports from templates.
#[derive(Debug, Parser)]
#[command(name = "recap", version, about)]
struct Cli {
    /// Project the report belongs to.
    project: String,

    /// Optional data-type component inserted after the project name.
    #[arg(long)]
    data_type: Option<String>,

    /// Ordered name components; repeat for each one.
    #[arg(long = "tag", value_name = "TAG=VALUE", value_parser = parse_tag_argument)]
    tags: Vec<(String, String)>,

    /// Template to copy when the source document does not exist yet.
    #[arg(long, default_value = templates::DEFAULT_TEMPLATE_NAME)]
    template: String,

    /// What to do when the source document already exists.
    #[arg(long, value_enum, default_value_t = OverwritePolicy::Ask)]
    overwrite: OverwritePolicy,

    /// Render the source document after resolving it.
    #[arg(long)]
    compile: bool,

    /// After the first render, wait for an edit and offer one recompile.
    /// Implies --compile.
    #[arg(long)]
    wait: bool,

    /// Output format for rendered artifacts (defaults to the configured one).
    #[arg(long, value_parser = RenderFormat::parse)]
    format: Option<RenderFormat>,

    /// Dated output folder. Defaults to the output root joined with today's
    /// date; an explicit value is still checked against today at render time.
    #[arg(long)]
    output_folder: Option<PathBuf>,

    /// Skip mirroring the rendered artifact into the current folder.
    #[arg(long)]
    no_current: bool,

    /// Print the derived source filename and exit without touching anything.
    #[arg(long)]
    print_name: bool,
}

impl Cli {
    fn name_spec(&self, config: &Config) -> NameSpec {
        NameSpec {
            project: self.project.clone(),
            data_type: self.data_type.clone(),
            tags: self
                .tags
                .iter()
                .map(|(tag, _)| (tag.clone(), tag.clone()))
                .collect(),
            values: self.tags.clone(),
            tag_delimiter: config.naming.tag_delimiter.clone(),
            component_delimiter: config.naming.component_delimiter.clone(),
        }
    }
}

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();

    // Initialize logging before anything else
    let (session_id, _guard) = match logging::init() {
        Ok(ctx) => {
            logging::cleanup_old_logs(&ctx.log_directory);
            (Some(ctx.session_id), Some(ctx._guard))
        }
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {}", e);
            (None, None)
        }
    };

    let loaded_config = config::load_config();
    debug!(
        config_path = %loaded_config.config_path.display(),
        project_config = ?loaded_config.project_config_path,
        status = ?loaded_config.status,
        "config_loaded"
    );
    let config = loaded_config.config;

    let name_spec = cli.name_spec(&config);
    if cli.print_name {
        println!(
            "{}.{}",
            name_spec.build_name()?,
            config.naming.source_ext
        );
        return Ok(());
    }

    let job = build_job(&cli, &config, name_spec)?;
    let renderer = CommandRenderer::new(
        config.render.command.clone(),
        config.render.args.clone(),
    );
    let outcome = job.run(&renderer, &mut ConsoleConfirm)?;
    report_outcome(&outcome);

    if let Some(sid) = session_id {
        let duration = start_time.elapsed();
        info!(
            session_id = %sid,
            duration_secs = duration.as_secs_f64(),
            "session_end"
        );
    }

    Ok(())
}

/// Resolve configuration and arguments into a fully-specified job with
/// absolute paths throughout.
fn build_job(cli: &Cli, config: &Config, name_spec: NameSpec) -> Result<ReportJob> {
    let format = match cli.format {
        Some(format) => format,
        None => RenderFormat::parse(&config.render.format)
            .context("invalid render.format in configuration")?,
    };

    let date_format = config.render.date_format.clone();
    let today = Local::now().date_naive();
    let output_folder = match &cli.output_folder {
        Some(folder) => folder.clone(),
        None => config.output_root_path().join(format_date(today, &date_format)?),
    };

    let templates_dir = Config::absolutize(&config.templates_path())?;
    let template_path = if cli.template == templates::DEFAULT_TEMPLATE_NAME {
        templates::ensure_default_template(&templates_dir, &config.naming.source_ext)?
    } else {
        templates_dir.join(format!("{}.{}", cli.template, config.naming.source_ext))
    };
    if let Some(msg) = validate_file_exists(&template_path.to_string_lossy()) {
        bail!("template {}: {}", template_path.display(), msg);
    }

    Ok(ReportJob {
        name_spec,
        template_path,
        source_dir: Config::absolutize(&config.source_path())?,
        source_ext: config.naming.source_ext.clone(),
        output_folder: Config::absolutize(&output_folder)?,
        current_folder: Config::absolutize(&config.current_path())?,
        date_format,
        format,
        overwrite: cli.overwrite,
        compile: cli.compile || cli.wait,
        wait_for_recompile: cli.wait,
        mirror_to_current: !cli.no_current,
    })
}

/// Tell the operator which path the job took.
fn report_outcome(outcome: &JobOutcome) {
    match outcome.source {
        SourceOutcome::CreatedNew => {
            println!("Created {}", outcome.source_path.display());
        }
        SourceOutcome::Overwrote => {
            println!("Overwrote {}", outcome.source_path.display());
        }
        SourceOutcome::ReusedExisting => {
            println!("Kept existing {}", outcome.source_path.display());
        }
    }

    if let Some(compiled) = &outcome.compiled {
        if outcome.recompiled {
            println!("Recompiled {} ({})", compiled.path.display(), compiled.format);
        } else {
            println!("Rendered {} ({})", compiled.path.display(), compiled.format);
        }
    }
}
