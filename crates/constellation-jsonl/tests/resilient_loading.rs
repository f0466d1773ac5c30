//! Resilient loading of damaged JSONL files.

use constellation_jsonl::{read_jsonl_resilient, write_jsonl_atomic, JsonlReader, Warning};
use rstest::rstest;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Record {
    id: u32,
    name: String,
}

fn record(id: u32, name: &str) -> Record {
    Record {
        id,
        name: name.to_string(),
    }
}

async fn load(input: &str) -> (Vec<Record>, Vec<Warning>) {
    JsonlReader::new(Cursor::new(input.as_bytes().to_vec()))
        .read_resilient()
        .await
        .unwrap()
}

#[rstest]
#[case::all_valid("{\"id\":1,\"name\":\"a\"}\n{\"id\":2,\"name\":\"b\"}\n", 2, 0)]
#[case::all_invalid("{bad\n[1,2\nnot json\n", 0, 3)]
#[case::alternating("{\"id\":1,\"name\":\"a\"}\n{bad\n{\"id\":3,\"name\":\"c\"}\n{bad\n", 2, 2)]
#[case::wrong_shape("{\"id\":\"x\",\"name\":\"a\"}\n{\"id\":2,\"name\":\"b\"}\n", 1, 1)]
#[case::blank_lines_ignored("\n\n{\"id\":1,\"name\":\"a\"}\n  \n", 1, 0)]
#[case::empty("", 0, 0)]
#[tokio::test]
async fn counts_records_and_warnings(
    #[case] input: &str,
    #[case] records: usize,
    #[case] warnings: usize,
) {
    let (loaded, collected) = load(input).await;
    assert_eq!(loaded.len(), records);
    assert_eq!(collected.len(), warnings);
}

#[tokio::test]
async fn warnings_carry_source_line_numbers() {
    let input = "{\"id\":1,\"name\":\"a\"}\n\n{broken\n{\"id\":4,\"name\":\"d\"}\n{\"id\":\n";
    let (loaded, warnings) = load(input).await;

    assert_eq!(loaded, vec![record(1, "a"), record(4, "d")]);
    let lines: Vec<usize> = warnings.iter().map(Warning::line_number).collect();
    assert_eq!(lines, vec![3, 5]);
    assert!(warnings.iter().all(|w| w.kind() == "malformed_json"));
    assert!(warnings[0].to_string().starts_with("line 3: malformed JSON"));
}

#[tokio::test]
async fn reads_corrupted_file_from_disk() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{{\"id\":1,\"name\":\"kept\"}}").unwrap();
    writeln!(file, "garbage").unwrap();
    writeln!(file, "{{\"id\":2,\"name\":\"also kept\"}}").unwrap();
    file.flush().unwrap();

    let (loaded, warnings): (Vec<Record>, _) = read_jsonl_resilient(file.path()).await.unwrap();

    assert_eq!(loaded, vec![record(1, "kept"), record(2, "also kept")]);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].line_number(), 2);
}

#[tokio::test]
async fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = read_jsonl_resilient::<Record, _>(dir.path().join("absent.jsonl")).await;
    assert!(matches!(result, Err(constellation_jsonl::Error::Io(_))));
}

#[tokio::test]
async fn atomic_write_then_resilient_read_preserves_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.jsonl");
    let written: Vec<Record> = (0..50).map(|id| record(id, &format!("ci-{id}"))).collect();

    write_jsonl_atomic(&path, &written).await.unwrap();
    let (loaded, warnings): (Vec<Record>, _) = read_jsonl_resilient(&path).await.unwrap();

    assert!(warnings.is_empty());
    assert_eq!(loaded, written);
}
