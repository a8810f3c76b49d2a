use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use regex::Regex;
use tempfile::TempDir;
use uuid::Uuid;

use crate::models::{DiagnosticSeverity, SolverDiagnostic};

/// Resolve the Code_Aster launcher command, preferring the environment
/// override set at startup.
pub fn resolve_launcher_path() -> String {
    std::env::var("ASTER_PATH").unwrap_or_else(|_| "as_run".to_string())
}

/// Outcome of one solver run: scraped diagnostics plus the overall verdict.
#[derive(Debug, Clone)]
pub struct SolverOutcome {
    pub diagnostics: Vec<SolverDiagnostic>,
    pub succeeded: bool,
}

/// Runs a generated study through the Code_Aster launcher in a throwaway
/// working directory and scrapes the .mess file for tagged diagnostics.
pub struct AsterExecutor;

impl AsterExecutor {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(&mut self, comm_content: &str) -> Result<SolverOutcome, ExecutorError> {
        // Unique temporary directory per study run
        let study_id = Uuid::new_v4();
        let temp_dir = TempDir::new().map_err(|e| ExecutorError::IoError(e.to_string()))?;
        let work_path = temp_dir.path();

        tracing::info!("Starting study {} in {:?}", study_id, work_path);

        // Write the .comm file
        let comm_path = work_path.join("study.comm");
        fs::write(&comm_path, comm_content)
            .map_err(|e| ExecutorError::IoError(format!("Failed to write .comm file: {}", e)))?;

        // Minimal .export profile pointing the launcher at the study
        let export_path = work_path.join("study.export");
        let export_content = Self::build_export(work_path);
        fs::write(&export_path, export_content)
            .map_err(|e| ExecutorError::IoError(format!("Failed to write .export file: {}", e)))?;

        Self::maybe_export_debug_file(&comm_path, &study_id, "comm");

        let launcher = resolve_launcher_path();
        tracing::info!("Running command: {} {:?}", launcher, export_path);

        let output = Command::new(&launcher)
            .arg(&export_path)
            .current_dir(work_path)
            .output()
            .map_err(|e| ExecutorError::ExecutionError(format!("Failed to execute launcher: {}", e)))?;

        let mess_path = work_path.join("study.mess");
        if mess_path.exists() {
            Self::maybe_export_debug_file(&mess_path, &study_id, "mess");
        }

        let diagnostics = self.parse_mess_diagnostics(&mess_path)?;
        let has_failure = diagnostics.iter().any(|d| {
            matches!(
                d.severity,
                DiagnosticSeverity::Error | DiagnosticSeverity::Fatal
            )
        });

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            tracing::error!("Launcher failed. Stderr: {}\nStdout: {}", stderr, stdout);
            return Ok(SolverOutcome {
                diagnostics,
                succeeded: false,
            });
        }

        Ok(SolverOutcome {
            diagnostics,
            succeeded: !has_failure,
        })
    }

    fn build_export(work_path: &Path) -> String {
        let mut export = String::new();
        export.push_str("P actions make_etude\n");
        export.push_str("P nomjob study\n");
        export.push_str("P version stable\n");
        export.push_str(&format!(
            "F comm {} D 1\n",
            work_path.join("study.comm").display()
        ));
        export.push_str(&format!(
            "F mess {} R 6\n",
            work_path.join("study.mess").display()
        ));
        export
    }

    fn maybe_export_debug_file(path: &Path, study_id: &Uuid, extension: &str) {
        if let Ok(dest_dir) = std::env::var("ASTER_DEBUG_EXPORT") {
            let dest_path = PathBuf::from(dest_dir);
            if let Err(err) = fs::create_dir_all(&dest_path) {
                tracing::warn!("Failed to create debug export directory {:?}: {}", dest_path, err);
                return;
            }

            let file_name = format!("study_{}.{}", study_id, extension);
            let dest_file = dest_path.join(file_name);
            if let Err(err) = fs::copy(path, &dest_file) {
                tracing::warn!("Failed to export debug file {:?}: {}", dest_file, err);
            } else {
                tracing::info!("Exported debug file to {:?}", dest_file);
            }
        }
    }

    /// Scrape `<A>/<E>/<F>`-tagged messages out of the launcher's .mess file.
    /// A missing file counts as a failed run rather than an IO error, since
    /// the launcher writes it only once the study actually starts.
    fn parse_mess_diagnostics(
        &self,
        mess_path: &Path,
    ) -> Result<Vec<SolverDiagnostic>, ExecutorError> {
        if !mess_path.exists() {
            tracing::warn!("No .mess file generated at {:?}", mess_path);
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(mess_path)
            .map_err(|e| ExecutorError::IoError(format!("Failed to read .mess file: {}", e)))?;

        let tag_line = Regex::new(r"^\s*<([AEF])>\s*<?([A-Z0-9_]+)>?\s*(.*)$")
            .map_err(|e| ExecutorError::ParsingError(e.to_string()))?;

        let mut diagnostics = Vec::new();
        for line in content.lines() {
            if let Some(captures) = tag_line.captures(line) {
                let severity = DiagnosticSeverity::from_tag(&captures[1]);
                if let Some(severity) = severity {
                    diagnostics.push(SolverDiagnostic {
                        severity,
                        code: captures[2].to_string(),
                        message: captures[3].trim().to_string(),
                    });
                }
            }
        }

        tracing::info!("Scraped {} diagnostics from .mess file", diagnostics.len());
        Ok(diagnostics)
    }
}

impl Default for AsterExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Execution error: {0}")]
    ExecutionError(String),
    #[error("Parsing error: {0}")]
    ParsingError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mess_diagnostic_scrape() {
        let dir = TempDir::new().unwrap();
        let mess_path = dir.path().join("study.mess");
        fs::write(
            &mess_path,
            "some banner\n  <A> <MODELISA8_13> group contains no element\n  <E> <CHARGES2_4> bad keyword\nplain line\n",
        )
        .unwrap();

        let executor = AsterExecutor::new();
        let diagnostics = executor.parse_mess_diagnostics(&mess_path).unwrap();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].severity, DiagnosticSeverity::Alarm);
        assert_eq!(diagnostics[0].code, "MODELISA8_13");
        assert_eq!(diagnostics[1].severity, DiagnosticSeverity::Error);
        assert_eq!(diagnostics[1].message, "bad keyword");
    }

    #[test]
    fn test_missing_mess_file_yields_no_diagnostics() {
        let dir = TempDir::new().unwrap();
        let executor = AsterExecutor::new();
        let diagnostics = executor
            .parse_mess_diagnostics(&dir.path().join("absent.mess"))
            .unwrap();
        assert!(diagnostics.is_empty());
    }
}
