use crate::domain::model::Row;
use crate::utils::error::Result;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Reads every data row of a headed CSV. A leading UTF-8 BOM is ignored.
pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        rows.push(Row::from_record(index + 1, &headers, &record?));
    }
    Ok(rows)
}

/// Writes `header` followed by one line per record, replacing any existing file.
pub fn write_records<T: Serialize>(path: &Path, header: &[&str], records: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(header)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Concatenates per-file summaries into `output`. Files whose header differs
/// from the first summary's are skipped. Returns `None` (and writes nothing)
/// when there are no data rows at all.
pub fn combine_summaries(files: &[PathBuf], output: &Path) -> Result<Option<PathBuf>> {
    let mut header: Option<csv::StringRecord> = None;
    let mut combined: Vec<csv::StringRecord> = Vec::new();

    for file in files {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(file)?;
        let file_header = reader.headers()?.clone();

        match &header {
            None => header = Some(file_header),
            Some(expected) if *expected != file_header => {
                tracing::warn!("Skipping {} while combining: header mismatch", file.display());
                continue;
            }
            Some(_) => {}
        }

        for record in reader.records() {
            combined.push(record?);
        }
    }

    let Some(header) = header.filter(|_| !combined.is_empty()) else {
        tracing::info!("No summary rows to combine.");
        return Ok(None);
    };

    ensure_parent(output)?;
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(output)?;
    writer.write_record(&header)?;
    for record in &combined {
        writer.write_record(record)?;
    }
    writer.flush()?;

    tracing::info!("Final summary written to {}", output.display());
    Ok(Some(output.to_path_buf()))
}
