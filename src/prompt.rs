//! Operator confirmation prompts.
//!
//! Confirmation is a capability the job depends on rather than a direct
//! read of stdin, so tests can script answers. The console implementation
//! blocks until a line of input arrives; there is no timeout.

use std::io::{self, BufRead, Write};

/// Literal token required to confirm overwriting an existing source
/// document. Anything else, including near-misses, means "keep existing".
pub const OVERWRITE_TOKEN: &str = "overwrite";

/// Whether a free-text answer confirms an overwrite (pure function).
pub fn is_overwrite_confirmation(answer: &str) -> bool {
    answer.trim() == OVERWRITE_TOKEN
}

/// Whether a single-character answer confirms a recompile (pure function).
pub fn is_recompile_confirmation(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

/// Capability for asking the operator to confirm destructive or repeated
/// steps.
pub trait Confirm {
    /// Ask whether an existing source document may be replaced.
    /// Only the exact overwrite token confirms.
    fn confirm_overwrite(&mut self, source_name: &str) -> io::Result<bool>;

    /// Ask whether the report should be rendered again after an edit.
    /// A case-insensitive 'y' confirms.
    fn confirm_recompile(&mut self, artifact_name: &str) -> io::Result<bool>;
}

/// Console-backed confirmation provider.
pub struct ConsoleConfirm;

impl ConsoleConfirm {
    fn read_answer(prompt: &str) -> io::Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line)
    }
}

impl Confirm for ConsoleConfirm {
    fn confirm_overwrite(&mut self, source_name: &str) -> io::Result<bool> {
        let answer = Self::read_answer(&format!(
            "{source_name} already exists. Type '{OVERWRITE_TOKEN}' to replace it: "
        ))?;
        Ok(is_overwrite_confirmation(&answer))
    }

    fn confirm_recompile(&mut self, artifact_name: &str) -> io::Result<bool> {
        let answer = Self::read_answer(&format!("Recompile {artifact_name}? [y/N] "))?;
        Ok(is_recompile_confirmation(&answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_requires_exact_token() {
        assert!(is_overwrite_confirmation("overwrite"));
        assert!(is_overwrite_confirmation("  overwrite\n"));
    }

    #[test]
    fn test_overwrite_rejects_near_misses() {
        assert!(!is_overwrite_confirmation("Overwrite"));
        assert!(!is_overwrite_confirmation("overwrite!"));
        assert!(!is_overwrite_confirmation("yes"));
        assert!(!is_overwrite_confirmation("y"));
        assert!(!is_overwrite_confirmation(""));
    }

    #[test]
    fn test_recompile_accepts_y_any_case() {
        assert!(is_recompile_confirmation("y"));
        assert!(is_recompile_confirmation("Y"));
        assert!(is_recompile_confirmation(" y\n"));
    }

    #[test]
    fn test_recompile_rejects_everything_else() {
        assert!(!is_recompile_confirmation("n"));
        assert!(!is_recompile_confirmation("yes"));
        assert!(!is_recompile_confirmation(""));
        assert!(!is_recompile_confirmation("q"));
    }
}
