use crate::core::csv_io::combine_summaries;
use crate::domain::model::RunReport;
use crate::domain::ports::FileProcessor;
use crate::utils::error::{DedupeError, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::Instrument;

/// Lists files in `dir` whose name matches `pattern`, ordered by their
/// `_part{n}` number first and name second.
pub fn discover_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = Regex::new(pattern).map_err(|e| DedupeError::InvalidConfigValueError {
        field: "file_pattern".to_string(),
        value: pattern.to_string(),
        reason: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if matcher.is_match(&name.to_string_lossy()) {
            files.push(entry.path());
        }
    }

    files.sort_by_cached_key(|path| {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        (part_number(&name), name)
    });
    Ok(files)
}

fn part_number(name: &str) -> Option<u64> {
    static PART: OnceLock<Regex> = OnceLock::new();
    let re = PART.get_or_init(|| Regex::new(r"_part(\d+)").expect("static regex"));
    re.captures(name)?.get(1)?.as_str().parse().ok()
}

/// Runs a [`FileProcessor`] over a list of files, one after another, and
/// combines the per-file summaries.
pub struct BatchRunner<P: FileProcessor> {
    processor: P,
}

impl<P: FileProcessor> BatchRunner<P> {
    pub fn new(processor: P) -> Self {
        Self { processor }
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// A file that fails as a whole is logged and recorded; the run moves on.
    pub async fn run(&self, files: &[PathBuf], combined_output: &Path) -> Result<RunReport> {
        let mut report = RunReport {
            started_at: Some(chrono::Utc::now()),
            ..Default::default()
        };

        tracing::info!(
            "=== START {} run over {} files ===",
            self.processor.name(),
            files.len()
        );

        for file in files {
            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let span = tracing::info_span!("file", name = %stem);

            tracing::info!("Processing: {}", file.display());
            match self.processor.process_file(file).instrument(span).await {
                Ok(summary) => {
                    tracing::info!(
                        "{}: {} rows ({} delivered, {} failed, {} skipped, {} simulated)",
                        stem,
                        summary.rows,
                        summary.delivered,
                        summary.failed,
                        summary.skipped,
                        summary.simulated
                    );
                    report.files.push(summary);
                }
                Err(e) => {
                    tracing::error!("Failed to process file {}: {}", file.display(), e);
                    report.failed_files.push((file.clone(), e.to_string()));
                }
            }
        }

        let summaries: Vec<PathBuf> = report
            .files
            .iter()
            .map(|f| f.summary_path.clone())
            .collect();
        report.combined_summary = combine_summaries(&summaries, combined_output)?;
        report.finished_at = Some(chrono::Utc::now());

        tracing::info!("=== {} run complete ===", self.processor.name());
        Ok(report)
    }

    /// Discovers input files then runs; an empty directory yields an empty report.
    pub async fn run_dir(
        &self,
        dir: &Path,
        pattern: &str,
        combined_output: &Path,
    ) -> Result<RunReport> {
        let files = discover_files(dir, pattern)?;
        if files.is_empty() {
            tracing::error!("No files found in {}", dir.display());
            return Ok(RunReport::default());
        }
        self.run(&files, combined_output).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::csv_io::write_records;
    use crate::domain::model::FileSummary;
    use tempfile::TempDir;

    /// Writes a one-row summary per file; files named `*bad*` fail.
    struct EchoProcessor {
        summary_dir: PathBuf,
    }

    #[async_trait::async_trait]
    impl FileProcessor for EchoProcessor {
        fn name(&self) -> &str {
            "echo"
        }

        fn summary_path(&self, source: &Path) -> PathBuf {
            self.summary_dir
                .join(source.file_name().unwrap_or_default())
        }

        async fn process_file(&self, source: &Path) -> Result<FileSummary> {
            let name = source.file_name().unwrap().to_string_lossy().into_owned();
            if name.contains("bad") {
                return Err(DedupeError::ProcessingError {
                    message: "unreadable".to_string(),
                });
            }
            let mut summary = FileSummary::new(source.to_path_buf(), self.summary_path(source));
            write_records(&summary.summary_path, &["file"], &[name])?;
            summary.record(crate::domain::model::RowOutcome::Delivered);
            Ok(summary)
        }
    }

    #[test]
    fn test_discover_files_orders_parts_numerically() {
        let dir = TempDir::new().unwrap();
        for name in ["chunk_part10.csv", "chunk_part2.csv", "chunk_part1.csv", "notes.txt"] {
            fs::write(dir.path().join(name), "id\n").unwrap();
        }
        fs::create_dir(dir.path().join("chunk_part3.csv")).unwrap();

        let files = discover_files(dir.path(), r"^chunk_part\d+\.csv$").unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["chunk_part1.csv", "chunk_part2.csv", "chunk_part10.csv"]);
    }

    #[test]
    fn test_discover_files_rejects_bad_pattern() {
        let dir = TempDir::new().unwrap();
        assert!(discover_files(dir.path(), "(").is_err());
    }

    #[tokio::test]
    async fn test_failed_file_does_not_stop_the_run() {
        let dir = TempDir::new().unwrap();
        let files: Vec<PathBuf> = ["a_part1.csv", "bad_part2.csv", "c_part3.csv"]
            .iter()
            .map(|n| dir.path().join(n))
            .collect();

        let runner = BatchRunner::new(EchoProcessor {
            summary_dir: dir.path().join("summaries"),
        });
        let combined = dir.path().join("combined.csv");
        let report = runner.run(&files, &combined).await.unwrap();

        assert_eq!(report.files.len(), 2);
        assert_eq!(report.failed_files.len(), 1);
        assert!(report.failed_files[0].0.ends_with("bad_part2.csv"));
        assert_eq!(report.total_delivered(), 2);
        assert_eq!(report.combined_summary, Some(combined.clone()));
        assert_eq!(
            fs::read_to_string(&combined).unwrap(),
            "file\na_part1.csv\nc_part3.csv\n"
        );
    }

    #[tokio::test]
    async fn test_run_dir_without_matches_is_empty() {
        let dir = TempDir::new().unwrap();
        let runner = BatchRunner::new(EchoProcessor {
            summary_dir: dir.path().join("summaries"),
        });

        let report = runner
            .run_dir(dir.path(), r"\.csv$", &dir.path().join("combined.csv"))
            .await
            .unwrap();

        assert!(report.files.is_empty());
        assert!(report.combined_summary.is_none());
    }
}
