//! Batch-level tests against the public API

use litmeta_extractor::{
    save_error_log, write_results_csv, BatchProcessor, ErrorCategory, Extractor, ExtractorConfig,
    ExtractorError, ERROR_LOG_COLUMNS,
};
use litmeta_llm::{LlmError, MockProvider};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn batch_with(provider: MockProvider) -> BatchProcessor<MockProvider> {
    let config = ExtractorConfig {
        request_delay_secs: 0.0,
        ..ExtractorConfig::default()
    };
    BatchProcessor::new(Extractor::new(provider, config).expect("valid config"))
}

fn fields(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn write_pdf(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"%PDF-1.4\n").unwrap();
    path
}

#[tokio::test]
async fn test_missing_file_skipped_and_logged() {
    let dir = TempDir::new().unwrap();
    let paths = vec![
        write_pdf(&dir, "one.pdf"),
        dir.path().join("two.pdf"),
        write_pdf(&dir, "three.pdf"),
    ];

    let provider = MockProvider::new(r#"{"title": "Found", "year": "2015"}"#);
    let batch = batch_with(provider.clone());

    let output = batch
        .process_batch(&paths, &fields(&["title", "year"]), Duration::ZERO)
        .await
        .unwrap();

    assert_eq!(output.results.len(), 2);
    let names: Vec<&str> = output
        .results
        .rows()
        .iter()
        .map(|r| r.filename.as_str())
        .collect();
    assert_eq!(names, vec!["one.pdf", "three.pdf"]);

    assert_eq!(output.error_log.len(), 1);
    let entry = &output.error_log[0];
    assert_eq!(entry.filename, "two.pdf");
    assert_eq!(entry.category, ErrorCategory::NotFound);
    assert_eq!(entry.category.label(), "not found");
    assert_eq!(entry.attempt, 0);

    assert_eq!(output.summary.total_files, 3);
    assert_eq!(output.summary.succeeded, 2);
    assert_eq!(output.summary.failed, 1);
    assert_eq!(output.summary.failures[0].filename, "two.pdf");

    // The missing file never reaches the provider
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn test_empty_batch_rejected() {
    let batch = batch_with(MockProvider::default());
    let result = batch
        .process_batch(&[], &fields(&["title"]), Duration::ZERO)
        .await;
    assert!(matches!(result, Err(ExtractorError::InvalidInput(_))));
}

#[tokio::test]
async fn test_all_failures_give_empty_table_with_columns() {
    let dir = TempDir::new().unwrap();
    let paths = vec![write_pdf(&dir, "a.pdf"), write_pdf(&dir, "b.pdf")];

    let provider = MockProvider::scripted([
        Err(LlmError::Status {
            status: 400,
            message: "Unsupported document".to_string(),
        }),
        Err(LlmError::Status {
            status: 400,
            message: "Unsupported document".to_string(),
        }),
    ]);
    let batch = batch_with(provider);

    let output = batch
        .process_batch(&paths, &fields(&["author", "state"]), Duration::ZERO)
        .await
        .unwrap();

    assert!(output.results.is_empty());
    assert_eq!(output.results.columns(), ["filename", "author", "state"]);
    assert_eq!(output.summary.succeeded, 0);
    assert_eq!(output.summary.failed, 2);
    assert_eq!(output.error_log.len(), 2);
    assert!(output
        .summary
        .failures
        .iter()
        .all(|f| f.category == ErrorCategory::Permanent && f.attempts == 1));

    let mut csv = Vec::new();
    write_results_csv(&mut csv, &output.results).unwrap();
    assert_eq!(String::from_utf8(csv).unwrap(), "filename,author,state\n");
}

#[tokio::test]
async fn test_retries_logged_then_success() {
    let dir = TempDir::new().unwrap();
    let paths = vec![write_pdf(&dir, "retry.pdf")];

    let provider = MockProvider::scripted([
        Err(LlmError::Timeout("request timed out".to_string())),
        Err(LlmError::Status {
            status: 429,
            message: "Too many requests".to_string(),
        }),
        Ok(r#"{"title": "Third Time"}"#.to_string()),
    ]);
    let batch = batch_with(provider);

    let output = batch
        .process_batch(&paths, &fields(&["title"]), Duration::ZERO)
        .await
        .unwrap();

    assert_eq!(output.summary.succeeded, 1);
    assert_eq!(output.summary.failed, 0);
    assert!(output.summary.failures.is_empty());
    let categories: Vec<ErrorCategory> = output.error_log.iter().map(|e| e.category).collect();
    assert_eq!(categories, vec![ErrorCategory::Timeout, ErrorCategory::RateLimit]);
}

#[tokio::test]
async fn test_error_log_saved_as_csv() {
    let dir = TempDir::new().unwrap();
    let paths = vec![dir.path().join("absent.pdf")];

    let batch = batch_with(MockProvider::default());
    let output = batch
        .process_batch(&paths, &fields(&["title"]), Duration::ZERO)
        .await
        .unwrap();

    let log_dir = dir.path().join("logs");
    let saved = save_error_log(&log_dir, &output.error_log)
        .unwrap()
        .expect("log written");

    let file_name = saved.file_name().unwrap().to_string_lossy().into_owned();
    assert!(file_name.starts_with("extraction_errors_"));
    assert!(file_name.ends_with(".csv"));

    let text = std::fs::read_to_string(&saved).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(ERROR_LOG_COLUMNS.join(",").as_str()));
    let row = lines.next().unwrap();
    assert!(row.contains(",absent.pdf,not found,"));
    assert!(row.ends_with(",0"));
    assert_eq!(lines.next(), None);
}
