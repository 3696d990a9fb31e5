mod common;

use common::{read_csv, write_csv};
use profile_dedupe::core::chunker::chunk_path;
use profile_dedupe::Chunker;
use std::collections::HashSet;
use tempfile::TempDir;
use tokio_test::assert_ok;

#[test]
fn test_file_count_is_rows_over_chunk_size_rounded_up() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("children.csv");

    for (rows, chunk_size, expected_files) in [(0, 3, 0), (1, 3, 1), (3, 3, 1), (7, 3, 3), (9, 3, 3)] {
        let mut lines = vec!["External_ID,Email_Address".to_string()];
        lines.extend((1..=rows).map(|i| format!("{},c{}@example.com", i, i)));
        let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        write_csv(&input, &line_refs);

        let prefix = temp_dir.path().join(format!("run{}x{}/chunk", rows, chunk_size));
        let chunker = Chunker::new(chunk_size, prefix.to_string_lossy()).unwrap();
        let report = assert_ok!(chunker.split(&input));

        assert_eq!(report.rows, rows, "rows for {} / {}", rows, chunk_size);
        assert_eq!(report.files.len(), expected_files, "files for {} / {}", rows, chunk_size);
    }
}

#[test]
fn test_every_row_lands_in_exactly_one_chunk() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("children.csv");

    let mut lines = vec!["External_ID,Email_Address,Phone_Number".to_string()];
    lines.extend((1..=23).map(|i| format!(" '{}' ,\"c{}@example.com\",555{:03}", i, i, i)));
    let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    write_csv(&input, &line_refs);

    let prefix = temp_dir.path().join("out/chunk");
    let chunker = Chunker::new(5, prefix.to_string_lossy()).unwrap();
    let report = chunker.split(&input).unwrap();

    assert_eq!(report.files.len(), 5);
    assert_eq!(report.files[4], chunk_path(&prefix.to_string_lossy(), 5));

    let mut seen = HashSet::new();
    for (index, file) in report.files.iter().enumerate() {
        let rows = read_csv(file);
        assert_eq!(rows[0], vec!["External_ID", "Email_Address", "Phone_Number"]);

        let data_rows = rows.len() - 1;
        if index < 4 {
            assert_eq!(data_rows, 5);
        } else {
            assert_eq!(data_rows, 3);
        }

        for row in &rows[1..] {
            assert!(seen.insert(row[0].clone()), "duplicate row {}", row[0]);
            assert!(!row[0].contains('\''));
            assert!(row[1].ends_with("@example.com"));
        }
    }

    assert_eq!(seen.len(), 23);
}

#[test]
fn test_chunks_feed_the_row_reader() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("children.csv");
    write_csv(
        &input,
        &[
            "\u{feff}External_ID,Email_Address",
            "1,a@example.com",
            "2,b@example.com",
        ],
    );

    let prefix = temp_dir.path().join("chunk");
    let report = Chunker::new(10, prefix.to_string_lossy())
        .unwrap()
        .split(&input)
        .unwrap();

    let rows = profile_dedupe::core::csv_io::read_rows(&report.files[0]).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].value("External_ID"), Some("2"));
    assert_eq!(rows[1].line, 2);
}
