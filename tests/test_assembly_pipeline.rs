//! Assembly pipeline tests
//!
//! End-to-end assembly of the reference documents into a file sink:
//! committed artifacts, decorator swaps, determinism, and concurrent
//! assemblies sharing one output path.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use chrono::{TimeZone, Utc};
use receipt_composer::actions::{ContentAction, ContentProvider};
use receipt_composer::aggregate::CurrencyFormat;
use receipt_composer::config::AssemblyConfig;
use receipt_composer::pipeline::{assemble, AssemblyPipeline, PipelineState};
use receipt_composer::samples::{CompactReceipt, PaymentReceipt, TransactionStatement};
use receipt_composer::worker::CancellationToken;

fn config(dir: &Path) -> AssemblyConfig {
    AssemblyConfig::default()
        .with_documents_dir(dir)
        .with_creation_date(Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap())
}

fn leftover_temp_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .count()
}

fn statement_rows(count: usize) -> Vec<Vec<String>> {
    (0..count)
        .map(|i| {
            vec![
                format!("{}", 1000 + i),
                format!("4021{:02}", i),
                "₹5000".to_string(),
                "₹50".to_string(),
                "Success".to_string(),
            ]
        })
        .collect()
}

#[test]
fn test_payment_receipt_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = assemble(
        &config(dir.path()),
        &PaymentReceipt::default(),
        &CancellationToken::new(),
    )
    .unwrap();

    assert_eq!(artifact.path, dir.path().join("OCEAN").join("Receipt.pdf"));
    assert_eq!(artifact.page_count, 1);
    assert_eq!(artifact.block_count, 13);
    // Closing decorator replaced the opening one before the only page ended.
    assert_eq!(artifact.decorations, 1);
    assert!(artifact.bytes.starts_with(b"%PDF-"));
    assert_eq!(fs::read(&artifact.path).unwrap(), artifact.bytes.to_vec());
    assert_eq!(leftover_temp_files(&dir.path().join("OCEAN")), 0);
}

#[test]
fn test_compact_receipt_embeds_images() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = assemble(
        &config(dir.path()).with_file_name("Compact.pdf"),
        &CompactReceipt::default(),
        &CancellationToken::new(),
    )
    .unwrap();

    let text = String::from_utf8_lossy(&artifact.bytes);
    assert!(text.contains("/Subtype /Image"));
    assert!(text.contains("/SMask"));
    assert_eq!(artifact.block_count, 11);
    assert!(artifact.path.ends_with("Compact.pdf"));
}

#[test]
fn test_statement_pages_and_decorations() {
    let dir = tempfile::tempdir().unwrap();
    let statement = TransactionStatement::new(statement_rows(80), CurrencyFormat::default());
    let artifact = assemble(&config(dir.path()), &statement, &CancellationToken::new()).unwrap();

    assert!(artifact.page_count > 1);
    assert_eq!(artifact.decorations, artifact.page_count);
    assert_eq!(artifact.block_count, 2 + 80 + 2);
    let text = String::from_utf8_lossy(&artifact.bytes);
    assert!(text.contains("(Rs.400000.0) Tj"));
    assert!(text.contains("(Rs.4000.0) Tj"));
}

#[test]
fn test_assembly_is_deterministic() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let a = assemble(&config(first.path()), &PaymentReceipt::default(), &CancellationToken::new()).unwrap();
    let b = assemble(&config(second.path()), &PaymentReceipt::default(), &CancellationToken::new()).unwrap();
    assert_eq!(a.len(), b.len());
    assert_eq!(a.bytes, b.bytes);
}

#[test]
fn test_payment_receipt_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = assemble(&config(dir.path()), &PaymentReceipt::default(), &CancellationToken::new()).unwrap();

    assert_eq!(artifact.len(), 2462);
    let text = String::from_utf8_lossy(&artifact.bytes);
    assert!(text.contains("1 0 0 1 38 779 Tm\n(Aadhaar Enabled Payment System) Tj"));
    assert!(text.contains("1 0 0 1 459.406 465.5 Tm\n(Thank You) Tj"));
    assert!(text.contains("1 0 0 1 281.655 37.5 Tm\n(Page 1) Tj"));
    assert!(text.contains("/CreationDate (D:20240305140709Z)"));
    assert!(text.ends_with("%%EOF"));
}

#[test]
fn test_manual_lifecycle_with_swap() {
    let dir = tempfile::tempdir().unwrap();
    let receipt = PaymentReceipt::default();
    let mut pipeline = AssemblyPipeline::new(config(dir.path()));

    pipeline.open(receipt.opening_decorator()).unwrap();
    let mut actions = receipt.actions();
    actions.push(None);
    pipeline.populate(actions, &CancellationToken::new()).unwrap();
    assert_eq!(pipeline.state(), PipelineState::Populating);

    pipeline
        .swap_decorator(receipt.closing_decorator().unwrap())
        .unwrap();
    let artifact = pipeline.close().unwrap();
    assert_eq!(pipeline.state(), PipelineState::Closed);
    assert_eq!(artifact.block_count, 13);
}

#[test]
fn test_cancelled_assembly_leaves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = assemble(&config(dir.path()), &PaymentReceipt::default(), &cancel);
    assert!(matches!(result, Err(receipt_composer::Error::Cancelled)));

    let out_dir = dir.path().join("OCEAN");
    assert!(!out_dir.join("Receipt.pdf").exists());
    assert_eq!(leftover_temp_files(&out_dir), 0);
}

#[test]
fn test_empty_provider_produces_one_page() {
    struct Empty;
    impl ContentProvider for Empty {
        fn actions(&self) -> Vec<Option<ContentAction>> {
            vec![None, None]
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let artifact = assemble(&config(dir.path()), &Empty, &CancellationToken::new()).unwrap();
    assert_eq!(artifact.page_count, 1);
    assert_eq!(artifact.block_count, 0);
    assert_eq!(artifact.decorations, 0);
}

#[test]
fn test_concurrent_assemblies_to_same_path() {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(config(dir.path()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let config = Arc::clone(&config);
            thread::spawn(move || {
                assemble(&config, &PaymentReceipt::default(), &CancellationToken::new())
            })
        })
        .collect();

    let artifacts: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();

    let on_disk = fs::read(config.output_path()).unwrap();
    assert!(artifacts.iter().all(|a| a.bytes.to_vec() == on_disk));
    assert_eq!(leftover_temp_files(&dir.path().join("OCEAN")), 0);
}
