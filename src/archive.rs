//! Archival of rendered artifacts into dated and current folders.
//!
//! A rendered report lives in exactly one dated folder and is mirrored into
//! a "current" folder that holds at most one artifact per base name. The
//! mirror step deletes any prior dated variant before copying the new one
//! in, so "current" always points at the latest render.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

/// Create `dir` if it does not exist yet.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        info!(dir = %dir.display(), "creating_folder");
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create folder {}", dir.display()))?;
    }
    Ok(())
}

/// Delete every file in `current_folder` whose name contains `base_name`.
///
/// The substring match is deliberately loose so prior dated variants (and
/// variants in another format) are all caught. Zero matches is fine; a file
/// that vanishes between listing and deletion is fine too.
fn prune_current(current_folder: &Path, base_name: &str) -> Result<usize> {
    let entries = fs::read_dir(current_folder)
        .with_context(|| format!("failed to list {}", current_folder.display()))?;

    let mut deleted = 0usize;
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) if name.contains(base_name) => name.to_string(),
            _ => continue,
        };
        if !path.is_file() {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(file = %file_name, "stale_current_artifact_deleted");
                deleted += 1;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to delete stale {}", path.display()));
            }
        }
    }
    Ok(deleted)
}

/// File the rendered artifact at `rendered` (already inside `output_folder`
/// under its dated name) and mirror it into `current_folder`.
///
/// Returns the dated artifact path. There is no rollback: if pruning
/// succeeds and the copy fails, "current" is left without an artifact for
/// this base name until the next successful run.
pub fn archive_report(
    rendered: &Path,
    output_folder: &Path,
    output_base_name: &str,
    mirror_to_current: bool,
    current_folder: &Path,
) -> Result<PathBuf> {
    ensure_dir(output_folder)?;

    if !rendered.is_file() {
        bail!("rendered artifact {} does not exist", rendered.display());
    }
    let artifact_name = rendered
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("rendered artifact {} has no filename", rendered.display()))?;

    if mirror_to_current {
        ensure_dir(current_folder)?;

        let deleted = prune_current(current_folder, output_base_name)?;
        if deleted > 0 {
            info!(
                base_name = output_base_name,
                count = deleted,
                "current_folder_pruned"
            );
        }

        let mirror_path = current_folder.join(&artifact_name);
        fs::copy(rendered, &mirror_path).with_context(|| {
            format!(
                "failed to copy {} to {}",
                rendered.display(),
                mirror_path.display()
            )
        })?;
        info!(artifact = %mirror_path.display(), "current_artifact_updated");
    } else {
        debug!(artifact = %artifact_name, "current_folder_mirror_skipped");
    }

    Ok(output_folder.join(artifact_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn list_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_archive_report_mirrors_into_current() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("02Apr16");
        let current = tmp.path().join("current");
        fs::create_dir_all(&output).unwrap();
        let rendered = touch(&output, "report1_02Apr16.html", "html");

        let result = archive_report(&rendered, &output, "report1", true, &current).unwrap();

        assert_eq!(result, output.join("report1_02Apr16.html"));
        assert_eq!(list_names(&current), vec!["report1_02Apr16.html"]);
    }

    #[test]
    fn test_archive_report_replaces_prior_dated_variant() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("02Apr16");
        let current = tmp.path().join("current");
        fs::create_dir_all(&output).unwrap();
        fs::create_dir_all(&current).unwrap();
        touch(&current, "report1_01Apr16.html", "old");
        let rendered = touch(&output, "report1_02Apr16.html", "new");

        archive_report(&rendered, &output, "report1", true, &current).unwrap();

        assert_eq!(list_names(&current), vec!["report1_02Apr16.html"]);
        assert_eq!(
            fs::read_to_string(current.join("report1_02Apr16.html")).unwrap(),
            "new"
        );
    }

    #[test]
    fn test_archive_twice_leaves_single_current_artifact() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("out");
        let current = tmp.path().join("current");
        fs::create_dir_all(&output).unwrap();

        let first = touch(&output, "report1_01Apr16.html", "first");
        archive_report(&first, &output, "report1", true, &current).unwrap();
        let second = touch(&output, "report1_02Apr16.html", "second");
        archive_report(&second, &output, "report1", true, &current).unwrap();

        assert_eq!(list_names(&current), vec!["report1_02Apr16.html"]);
    }

    #[test]
    fn test_archive_report_leaves_unrelated_files_alone() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("out");
        let current = tmp.path().join("current");
        fs::create_dir_all(&output).unwrap();
        fs::create_dir_all(&current).unwrap();
        touch(&current, "other_01Apr16.html", "keep");
        let rendered = touch(&output, "report1_02Apr16.html", "new");

        archive_report(&rendered, &output, "report1", true, &current).unwrap();

        assert_eq!(
            list_names(&current),
            vec!["other_01Apr16.html", "report1_02Apr16.html"]
        );
    }

    #[test]
    fn test_archive_report_prunes_other_formats_of_same_base() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("out");
        let current = tmp.path().join("current");
        fs::create_dir_all(&output).unwrap();
        fs::create_dir_all(&current).unwrap();
        touch(&current, "report1_01Apr16.pdf", "old pdf");
        let rendered = touch(&output, "report1_02Apr16.html", "new");

        archive_report(&rendered, &output, "report1", true, &current).unwrap();

        assert_eq!(list_names(&current), vec!["report1_02Apr16.html"]);
    }

    #[test]
    fn test_archive_report_creates_missing_current_folder() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("out");
        fs::create_dir_all(&output).unwrap();
        let rendered = touch(&output, "report1_02Apr16.html", "html");
        let current = tmp.path().join("nested").join("current");

        archive_report(&rendered, &output, "report1", true, &current).unwrap();

        assert_eq!(list_names(&current), vec!["report1_02Apr16.html"]);
    }

    #[test]
    fn test_archive_report_without_mirror_touches_nothing() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("out");
        let current = tmp.path().join("current");
        fs::create_dir_all(&output).unwrap();
        fs::create_dir_all(&current).unwrap();
        touch(&current, "report1_01Apr16.html", "old");
        let rendered = touch(&output, "report1_02Apr16.html", "new");

        let result = archive_report(&rendered, &output, "report1", false, &current).unwrap();

        assert_eq!(result, output.join("report1_02Apr16.html"));
        assert_eq!(list_names(&current), vec!["report1_01Apr16.html"]);
    }

    #[test]
    fn test_archive_report_missing_artifact_fails() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("out");
        let current = tmp.path().join("current");
        fs::create_dir_all(&output).unwrap();

        let missing = output.join("report1_02Apr16.html");
        assert!(archive_report(&missing, &output, "report1", true, &current).is_err());
    }

    #[test]
    fn test_prune_current_ignores_subdirectories() {
        let tmp = TempDir::new().unwrap();
        let current = tmp.path().join("current");
        fs::create_dir_all(current.join("report1_backup")).unwrap();
        touch(&current, "report1_01Apr16.html", "old");

        let deleted = prune_current(&current, "report1").unwrap();

        assert_eq!(deleted, 1);
        assert!(current.join("report1_backup").is_dir());
    }

    #[test]
    fn test_ensure_dir_existing_is_noop() {
        let tmp = TempDir::new().unwrap();
        ensure_dir(tmp.path()).unwrap();
        assert!(tmp.path().is_dir());
    }
}
