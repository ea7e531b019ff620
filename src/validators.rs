//! Validation of dated output folders and configured paths.

use std::path::Path;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use chrono::format::{Item, StrftimeItems};
use thiserror::Error;

use crate::config::Config;

/// Raised when a dated output folder does not correspond to the current
/// date. Saving under a stale folder is never recoverable; the whole job
/// aborts before anything is written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StaleFolderError {
    #[error("output folder '{path}' has no name to read a date from")]
    NoFolderName { path: String },
    #[error("output folder name '{name}' does not parse as a date under '{format}'")]
    Unparseable { name: String, format: String },
    #[error("output folder '{name}' is dated {parsed}, but today is {today}")]
    WrongDay {
        name: String,
        parsed: NaiveDate,
        today: NaiveDate,
    },
}

/// Check that the final component of `folder` parses under `date_format`
/// and equals `today`.
///
/// Callers resolve `today` from the local clock at call time; a long
/// interactive session that crosses midnight, or a stale folder argument,
/// fails here instead of silently filing a report under the wrong day.
pub fn validate_today_folder(
    folder: &Path,
    date_format: &str,
    today: NaiveDate,
) -> Result<(), StaleFolderError> {
    let name = folder
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StaleFolderError::NoFolderName {
            path: folder.display().to_string(),
        })?;

    let parsed = NaiveDate::parse_from_str(name, date_format).map_err(|_| {
        StaleFolderError::Unparseable {
            name: name.to_string(),
            format: date_format.to_string(),
        }
    })?;

    if parsed != today {
        return Err(StaleFolderError::WrongDay {
            name: name.to_string(),
            parsed,
            today,
        });
    }
    Ok(())
}

/// Render `date` under a configured strftime format, rejecting malformed
/// format strings instead of panicking inside the formatter.
pub fn format_date(date: NaiveDate, date_format: &str) -> Result<String> {
    let items: Vec<Item> = StrftimeItems::new(date_format).collect();
    if items.contains(&Item::Error) {
        bail!("invalid date format '{}'", date_format);
    }
    Ok(date.format_with_items(items.into_iter()).to_string())
}

/// Check if metadata indicates a valid file (pure function).
/// Returns an error message if validation fails, None if valid.
fn check_file_metadata(is_file: bool) -> Option<String> {
    if !is_file {
        Some("Path is not a file".to_string())
    } else {
        None
    }
}

/// Convert an I/O error to an appropriate error message for file validation.
fn file_error_message(error: &std::io::Error) -> String {
    match error.kind() {
        std::io::ErrorKind::NotFound => "File not found".to_string(),
        std::io::ErrorKind::PermissionDenied => "Cannot access file".to_string(),
        _ => "Invalid path".to_string(),
    }
}

/// Validate that a path points to an existing file.
/// Returns an error message if validation fails, None if valid.
pub fn validate_file_exists(path: &str) -> Option<String> {
    if path.is_empty() {
        return Some("Path cannot be empty".to_string());
    }

    let expanded = Config::expand_tilde(path);

    match std::fs::metadata(&expanded) {
        Ok(metadata) => check_file_metadata(metadata.is_file()),
        Err(e) => Some(file_error_message(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_validate_today_folder_matching_date() {
        let folder = PathBuf::from("/reports/output/02Apr16");
        let result = validate_today_folder(&folder, "%d%b%y", date(2016, 4, 2));
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_today_folder_wrong_day() {
        let folder = PathBuf::from("/reports/output/02Apr16");
        let err = validate_today_folder(&folder, "%d%b%y", date(2016, 4, 3)).unwrap_err();
        assert_eq!(
            err,
            StaleFolderError::WrongDay {
                name: "02Apr16".to_string(),
                parsed: date(2016, 4, 2),
                today: date(2016, 4, 3),
            }
        );
    }

    #[test]
    fn test_validate_today_folder_unparseable_name() {
        let folder = PathBuf::from("/reports/output/latest");
        let err = validate_today_folder(&folder, "%d%b%y", date(2016, 4, 2)).unwrap_err();
        assert!(matches!(err, StaleFolderError::Unparseable { .. }));
    }

    #[test]
    fn test_validate_today_folder_wrong_format() {
        // A valid date string under a different format still fails
        let folder = PathBuf::from("/reports/output/2016-04-02");
        let err = validate_today_folder(&folder, "%d%b%y", date(2016, 4, 2)).unwrap_err();
        assert!(matches!(err, StaleFolderError::Unparseable { .. }));
    }

    #[test]
    fn test_validate_today_folder_iso_format() {
        let folder = PathBuf::from("/reports/output/2016-04-02");
        assert!(validate_today_folder(&folder, "%Y-%m-%d", date(2016, 4, 2)).is_ok());
    }

    #[test]
    fn test_validate_today_folder_no_name() {
        let folder = PathBuf::from("/");
        let err = validate_today_folder(&folder, "%d%b%y", date(2016, 4, 2)).unwrap_err();
        assert!(matches!(err, StaleFolderError::NoFolderName { .. }));
    }

    #[test]
    fn test_format_date_round_trips_with_validator() {
        let today = date(2016, 4, 2);
        let name = format_date(today, "%d%b%y").unwrap();
        assert_eq!(name, "02Apr16");
        let folder = PathBuf::from("/out").join(&name);
        assert!(validate_today_folder(&folder, "%d%b%y", today).is_ok());
    }

    #[test]
    fn test_format_date_rejects_bad_format() {
        assert!(format_date(date(2016, 4, 2), "%Q").is_err());
    }

    // Pure metadata checks

    #[test]
    fn test_check_file_metadata_valid_file() {
        assert_eq!(check_file_metadata(true), None);
    }

    #[test]
    fn test_check_file_metadata_not_a_file() {
        assert_eq!(
            check_file_metadata(false),
            Some("Path is not a file".to_string())
        );
    }

    #[test]
    fn test_file_error_message_not_found() {
        let error = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        assert_eq!(file_error_message(&error), "File not found");
    }

    #[test]
    fn test_file_error_message_permission_denied() {
        let error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(file_error_message(&error), "Cannot access file");
    }

    #[test]
    fn test_validate_file_exists_empty_path() {
        assert_eq!(
            validate_file_exists(""),
            Some("Path cannot be empty".to_string())
        );
    }

    #[test]
    fn test_validate_file_exists_on_real_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file = tmp.path().join("report.md");
        std::fs::write(&file, "x").unwrap();

        assert_eq!(validate_file_exists(&file.to_string_lossy()), None);
        assert_eq!(
            validate_file_exists(&tmp.path().to_string_lossy()),
            Some("Path is not a file".to_string())
        );
    }
}
