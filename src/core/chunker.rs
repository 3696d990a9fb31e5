use crate::core::csv_io::ensure_parent;
use crate::domain::model::ChunkReport;
use crate::utils::error::{DedupeError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Trims whitespace, then surrounding single quotes, then surrounding double quotes.
pub fn clean_cell(value: &str) -> &str {
    value.trim().trim_matches('\'').trim_matches('"')
}

/// `{prefix}_part{n}.csv`
pub fn chunk_path(output_prefix: &str, part: usize) -> PathBuf {
    PathBuf::from(format!("{}_part{}.csv", output_prefix, part))
}

/// Splits `input` into files of at most `chunk_size` data rows, each
/// starting with the input's header row.
pub struct Chunker {
    chunk_size: usize,
    output_prefix: String,
}

impl Chunker {
    pub fn new(chunk_size: usize, output_prefix: impl Into<String>) -> Result<Self> {
        if chunk_size == 0 {
            return Err(DedupeError::InvalidConfigValueError {
                field: "chunk.size".to_string(),
                value: chunk_size.to_string(),
                reason: "Value must be at least 1".to_string(),
            });
        }
        Ok(Self {
            chunk_size,
            output_prefix: output_prefix.into(),
        })
    }

    pub fn split(&self, input: &Path) -> Result<ChunkReport> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(input)?;

        let mut records = reader.records();
        let header = match records.next() {
            Some(header) => header?,
            None => {
                tracing::warn!("{} is empty; nothing to split", input.display());
                return Ok(ChunkReport::default());
            }
        };

        let mut report = ChunkReport::default();
        let mut writer: Option<csv::Writer<File>> = None;
        let mut rows_in_chunk = 0;

        for record in records {
            let record = record?;

            if writer.is_none() || rows_in_chunk >= self.chunk_size {
                if let Some(mut finished) = writer.take() {
                    finished.flush()?;
                }
                let path = chunk_path(&self.output_prefix, report.files.len() + 1);
                writer = Some(self.open_chunk(&path, &header)?);
                tracing::debug!("Writing chunk {}", path.display());
                report.files.push(path);
                rows_in_chunk = 0;
            }

            if let Some(current) = writer.as_mut() {
                current.write_record(record.iter().map(clean_cell))?;
            }
            rows_in_chunk += 1;
            report.rows += 1;
        }

        if let Some(mut finished) = writer {
            finished.flush()?;
        }

        tracing::info!(
            "Finished splitting {}: {} rows into {} files",
            input.display(),
            report.rows,
            report.files.len()
        );
        Ok(report)
    }

    fn open_chunk(&self, path: &Path, header: &csv::StringRecord) -> Result<csv::Writer<File>> {
        ensure_parent(path)?;
        let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
        writer.write_record(header)?;
        Ok(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_clean_cell() {
        assert_eq!(clean_cell("  abc  "), "abc");
        assert_eq!(clean_cell(" 'abc' "), "abc");
        assert_eq!(clean_cell("\"abc\""), "abc");
        assert_eq!(clean_cell("'\"abc\"'"), "abc");
        assert_eq!(clean_cell("\"'abc'\""), "'abc'");
        assert_eq!(clean_cell("a'b"), "a'b");
        assert_eq!(clean_cell(""), "");
    }

    #[test]
    fn test_chunk_path() {
        assert_eq!(
            chunk_path("out/chunk", 3),
            PathBuf::from("out/chunk_part3.csv")
        );
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        assert!(Chunker::new(0, "out/chunk").is_err());
    }

    #[test]
    fn test_header_only_input_produces_no_files() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        fs::write(&input, "External_ID,Email_Address\n").unwrap();

        let prefix = dir.path().join("chunk").to_string_lossy().into_owned();
        let report = Chunker::new(2, prefix).unwrap().split(&input).unwrap();

        assert_eq!(report.rows, 0);
        assert!(report.files.is_empty());
    }

    #[test]
    fn test_exact_multiple_does_not_leave_empty_chunk() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        fs::write(&input, "id\n1\n2\n3\n4\n").unwrap();

        let prefix = dir.path().join("chunk").to_string_lossy().into_owned();
        let report = Chunker::new(2, prefix).unwrap().split(&input).unwrap();

        assert_eq!(report.files.len(), 2);
        assert_eq!(fs::read_to_string(&report.files[1]).unwrap(), "id\n3\n4\n");
    }
}
