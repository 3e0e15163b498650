use std::sync::{Arc, Mutex};

use fiscal_ingest::IngestionError;
use fiscal_ingest::ingestion::{
    CompositeObserver, IngestionContext, IngestionObserver, IngestionOptions, IngestionSeverity, WorkbookFormat,
    ingest_from_path, ingest_upload,
};
use fiscal_ingest::store::InMemoryDocumentStore;

#[derive(Default)]
struct RecordingObserver {
    failures: Mutex<Vec<IngestionSeverity>>,
    alerts: Mutex<Vec<IngestionSeverity>>,
    formats: Mutex<Vec<Option<WorkbookFormat>>>,
}

impl IngestionObserver for RecordingObserver {
    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, _error: &IngestionError) {
        self.failures.lock().unwrap().push(severity);
        self.formats.lock().unwrap().push(ctx.format);
    }

    fn on_alert(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _error: &IngestionError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn options_with(obs: Arc<RecordingObserver>) -> IngestionOptions {
    IngestionOptions {
        observer: Some(obs),
        alert_at_or_above: IngestionSeverity::Critical,
        ..Default::default()
    }
}

#[test]
fn observer_receives_failure_and_alert_on_critical_io_error() {
    let obs = Arc::new(RecordingObserver::default());
    let store = InMemoryDocumentStore::new();

    // Missing file -> Io error -> Critical
    let err = ingest_from_path("tests/fixtures/does_not_exist.xlsx", &store, &options_with(obs.clone())).unwrap_err();
    assert!(matches!(err, IngestionError::Io(_)));

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![IngestionSeverity::Critical]);
    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![IngestionSeverity::Critical]);
    assert_eq!(obs.formats.lock().unwrap().clone(), vec![Some(WorkbookFormat::Xlsx)]);
}

#[test]
fn rejected_format_is_reported_without_alert() {
    let obs = Arc::new(RecordingObserver::default());
    let store = InMemoryDocumentStore::new();

    let _ = ingest_upload("report.csv", b"a;b;c", &store, &options_with(obs.clone())).unwrap_err();

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![IngestionSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
    assert_eq!(obs.formats.lock().unwrap().clone(), vec![None]);
}

#[test]
fn unreadable_workbook_is_an_error_not_critical() {
    let obs = Arc::new(RecordingObserver::default());
    let store = InMemoryDocumentStore::new();

    let err = ingest_upload("broken.xlsx", b"PK not really a zip", &store, &options_with(obs.clone())).unwrap_err();
    assert!(matches!(err, IngestionError::Excel(_)));

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![IngestionSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn lower_threshold_alerts_on_rejected_input() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        alert_at_or_above: IngestionSeverity::Error,
        ..options_with(obs.clone())
    };
    let store = InMemoryDocumentStore::new();

    let _ = ingest_upload("empty.xls", b"", &store, &opts).unwrap_err();

    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![IngestionSeverity::Error]);
}

#[test]
fn composite_observer_fans_out() {
    let a = Arc::new(RecordingObserver::default());
    let b = Arc::new(RecordingObserver::default());
    let observers: Vec<Arc<dyn IngestionObserver>> = vec![a.clone(), b.clone()];
    let composite = Arc::new(CompositeObserver::new(observers));
    let opts = IngestionOptions {
        observer: Some(composite),
        ..Default::default()
    };
    let store = InMemoryDocumentStore::new();

    let _ = ingest_upload("notes.txt", b"hello", &store, &opts).unwrap_err();

    assert_eq!(a.failures.lock().unwrap().len(), 1);
    assert_eq!(b.failures.lock().unwrap().len(), 1);
}
