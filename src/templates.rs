//! Built-in report template, seeded on first use.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::archive::ensure_dir;

/// Blank analysis report template written into the templates folder when it
/// is empty. Pandoc-style title block; the body is a skeleton the analyst
/// fills in after the source copy is made.
pub const DEFAULT_TEMPLATE: &str = r#"---
title: "Analysis Report"
author: ""
date: ""
---

# Objective

# Data

# Methods

# Results

# Conclusions
"#;

/// Name of the built-in template, without extension.
pub const DEFAULT_TEMPLATE_NAME: &str = "default";

/// Make sure the built-in template exists, creating the templates folder
/// and the file on first use. Returns the template's path. An existing file
/// is never touched, so operator edits to the default template survive.
pub fn ensure_default_template(templates_dir: &Path, source_ext: &str) -> Result<PathBuf> {
    ensure_dir(templates_dir)?;
    let path = templates_dir.join(format!("{}.{}", DEFAULT_TEMPLATE_NAME, source_ext));
    if !path.is_file() {
        fs::write(&path, DEFAULT_TEMPLATE)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(template = %path.display(), "default_template_created");
    }
    Ok(path)
}
