//! Upload widget selection and simulated progress

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sahayata_core::upload::DEFAULT_TICK;
use sahayata_core::{FileMeta, UploadConfig, UploadError, UploadPhase, UploadWidget};

const MB: u64 = 1024 * 1024;

fn widget(accept: &str, max_mb: u64) -> (UploadWidget, Arc<AtomicUsize>) {
    let completed = Arc::new(AtomicUsize::new(0));
    let counter = completed.clone();
    let widget = UploadWidget::new(UploadConfig::new(accept, max_mb), move |_file| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (widget, completed)
}

#[test]
fn test_oversized_file_rejected() {
    let (mut widget, _) = widget(".pdf,.jpg", 5);

    let err = widget
        .select(FileMeta::new("scan.pdf", 6 * MB, "application/pdf"))
        .unwrap_err();
    assert_eq!(err, UploadError::TooLarge { max_mb: 5 });
    assert_eq!(widget.error(), Some("File size exceeds 5MB limit"));
    assert_eq!(widget.phase(), UploadPhase::Empty);
    assert!(widget.file().is_none());
}

#[test]
fn test_unsupported_type_rejected() {
    let (mut widget, _) = widget(".pdf,.jpg", 5);

    widget
        .select(FileMeta::new("photo.png", MB, "image/png"))
        .unwrap_err();
    assert_eq!(
        widget.error(),
        Some("File type not supported. Please upload .pdf,.jpg files")
    );
    assert_eq!(widget.phase(), UploadPhase::Empty);
}

#[test]
fn test_rejection_keeps_previous_selection() {
    let (mut widget, _) = widget(".pdf", 5);
    widget
        .select(FileMeta::new("aadhar.pdf", MB, "application/pdf"))
        .unwrap();
    widget
        .select(FileMeta::new("huge.pdf", 10 * MB, "application/pdf"))
        .unwrap_err();

    assert_eq!(widget.phase(), UploadPhase::Selected);
    assert_eq!(widget.file().map(|f| f.name.as_str()), Some("aadhar.pdf"));
}

#[test]
fn test_mime_wildcard_accepts_images() {
    let (mut widget, _) = widget("image/*", 5);
    assert!(widget.select(FileMeta::new("photo", MB, "image/png")).is_ok());
}

#[test]
fn test_progress_ticks_complete_once() {
    let (mut widget, completed) = widget(".pdf", 5);
    widget
        .select(FileMeta::new("income.pdf", MB, "application/pdf"))
        .unwrap();
    assert!(widget.start_upload());
    assert!(!widget.start_upload());

    for expected in (10..=100).step_by(10) {
        assert_eq!(widget.tick(), UploadPhase::Uploading(expected as u8));
    }
    assert_eq!(completed.load(Ordering::SeqCst), 0);

    assert_eq!(widget.tick(), UploadPhase::Uploaded);
    assert_eq!(widget.tick(), UploadPhase::Uploaded);
    assert_eq!(completed.load(Ordering::SeqCst), 1);
    assert_eq!(widget.progress(), 100);
}

#[tokio::test(start_paused = true)]
async fn test_run_drives_upload_to_completion() {
    let (mut widget, completed) = widget(".pdf,.jpg", 5);
    widget
        .select(FileMeta::new("scan.jpg", 2 * MB, "image/jpeg"))
        .unwrap();

    assert!(widget.run(DEFAULT_TICK).await);
    assert_eq!(widget.phase(), UploadPhase::Uploaded);
    assert_eq!(completed.load(Ordering::SeqCst), 1);

    // Already uploaded; nothing to start.
    assert!(!widget.run(DEFAULT_TICK).await);
    assert_eq!(completed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_run_without_selection_does_nothing() {
    let (mut widget, completed) = widget(".pdf", 5);
    assert!(!widget.run(DEFAULT_TICK).await);
    assert_eq!(widget.phase(), UploadPhase::Empty);
    assert_eq!(completed.load(Ordering::SeqCst), 0);
}

#[test]
fn test_remove_clears_state() {
    let (mut widget, _) = widget(".pdf", 5);
    widget
        .select(FileMeta::new("income.pdf", MB, "application/pdf"))
        .unwrap();
    widget.start_upload();
    widget.tick();

    widget.remove();
    assert_eq!(widget.phase(), UploadPhase::Empty);
    assert!(widget.file().is_none());
    assert!(widget.error().is_none());
    assert_eq!(widget.progress(), 0);
}
