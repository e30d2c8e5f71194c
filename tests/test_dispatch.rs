//! Dispatch tests
//!
//! The create-then-dispatch flow: artifacts stay valid when dispatch fails,
//! failures become user notices, and dispatch is attempted exactly once.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use receipt_composer::config::AssemblyConfig;
use receipt_composer::dispatch::{
    create_and_dispatch, ArtifactDispatcher, ArtifactRef, CommandDispatcher, DispatchError,
    DispatchMode,
};
use receipt_composer::error::Error;
use receipt_composer::samples::PaymentReceipt;
use receipt_composer::worker::AssemblyPool;

#[derive(Default)]
struct RecordingDispatcher {
    calls: Mutex<Vec<(PathBuf, String, DispatchMode)>>,
    fail: bool,
}

impl ArtifactDispatcher for RecordingDispatcher {
    fn dispatch(&self, artifact: &ArtifactRef, mode: DispatchMode) -> Result<(), DispatchError> {
        self.calls
            .lock()
            .unwrap()
            .push((artifact.path.clone(), artifact.media_type.clone(), mode));
        if self.fail {
            Err(match mode {
                DispatchMode::Present => DispatchError::NoViewer,
                DispatchMode::Share => DispatchError::NoShareTarget,
            })
        } else {
            Ok(())
        }
    }
}

fn setup() -> (tempfile::TempDir, AssemblyPool, AssemblyConfig) {
    let dir = tempfile::tempdir().unwrap();
    let config = AssemblyConfig::default().with_documents_dir(dir.path());
    let pool = AssemblyPool::from_config(&config).unwrap();
    (dir, pool, config)
}

#[test]
fn test_present_after_assembly() {
    let (_dir, pool, config) = setup();
    let dispatcher = RecordingDispatcher::default();

    let outcome = create_and_dispatch(
        &pool,
        config,
        Arc::new(PaymentReceipt::default()),
        &dispatcher,
        DispatchMode::Present,
    )
    .unwrap();

    assert!(outcome.notice.is_none());
    let calls = dispatcher.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, outcome.artifact.path);
    assert_eq!(calls[0].1, "application/pdf");
    assert_eq!(calls[0].2, DispatchMode::Present);
}

#[test]
fn test_failed_share_keeps_artifact() {
    let (_dir, pool, config) = setup();
    let dispatcher = RecordingDispatcher {
        fail: true,
        ..Default::default()
    };

    let outcome = create_and_dispatch(
        &pool,
        config,
        Arc::new(PaymentReceipt::default()),
        &dispatcher,
        DispatchMode::Share,
    )
    .unwrap();

    let notice = outcome.notice.expect("notice for failed dispatch");
    assert_eq!(notice.message, "No application has been found to share PDF files.");
    assert!(outcome.artifact.path.exists());
    // Never retried.
    assert_eq!(dispatcher.calls.lock().unwrap().len(), 1);
}

#[test]
fn test_unconfigured_command_dispatcher() {
    let (_dir, pool, config) = setup();
    let outcome = create_and_dispatch(
        &pool,
        config,
        Arc::new(PaymentReceipt::default()),
        &CommandDispatcher::new(),
        DispatchMode::Present,
    )
    .unwrap();
    assert_eq!(
        outcome.notice.map(|n| n.message),
        Some("No application has been found to open PDF files.".to_string())
    );
}

#[test]
fn test_assembly_failure_skips_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"file").unwrap();
    let config = AssemblyConfig::default().with_documents_dir(&blocker);
    let pool = AssemblyPool::from_config(&config).unwrap();
    let dispatcher = RecordingDispatcher::default();

    let result = create_and_dispatch(
        &pool,
        config,
        Arc::new(PaymentReceipt::default()),
        &dispatcher,
        DispatchMode::Present,
    );
    assert!(matches!(result, Err(Error::Sink { .. })));
    assert!(dispatcher.calls.lock().unwrap().is_empty());
}
