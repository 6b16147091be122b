use super::*;

fn png(name: &str) -> ImageFile {
    ImageFile::new(name, "image/png", vec![0x89, b'P', b'N', b'G'])
}

fn cat_response(image_id: i64) -> DetectResponse {
    DetectResponse {
        image_id,
        detections: vec![Detection { class_name: "cat".to_owned(), confidence: 0.92, bbox: [10.0, 20.0, 30.0, 40.0] }],
        annotated_image: "data:image/jpeg;base64,aGVsbG8=".to_owned(),
    }
}

fn detected_workspace(image_id: i64) -> Workspace {
    let mut ws = Workspace::default();
    let ticket = ws.begin_upload(png("a.png"));
    assert!(ws.apply_detection(ticket, cat_response(image_id)));
    ws
}

// =============================================================
// ImageFile / handles
// =============================================================

#[test]
fn content_type_inferred_from_extension() {
    assert_eq!(content_type_for(Path::new("photo.JPG")), "image/jpeg");
    assert_eq!(content_type_for(Path::new("scan.png")), "image/png");
    assert_eq!(content_type_for(Path::new("notes.txt")), "application/octet-stream");
    assert_eq!(content_type_for(Path::new("no_extension")), "application/octet-stream");
}

#[test]
fn image_file_from_path_reads_bytes_and_type() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cat.jpeg");
    std::fs::write(&path, b"jpegbytes").unwrap();

    let file = ImageFile::from_path(&path).unwrap();
    assert_eq!(file.name, "cat.jpeg");
    assert_eq!(file.content_type, "image/jpeg");
    assert_eq!(&*file.bytes, b"jpegbytes");
    assert!(file.is_image());
}

#[test]
fn non_image_content_type_is_not_image() {
    assert!(!ImageFile::new("a.pdf", "application/pdf", Vec::new()).is_image());
}

#[test]
fn preview_handles_are_unique() {
    assert_ne!(PreviewHandle::new(), PreviewHandle::new());
    assert!(PreviewHandle::new().as_str().starts_with("blob:"));
}

#[test]
fn annotated_image_decodes_data_url() {
    let image = AnnotatedImage::new("data:image/jpeg;base64,aGVsbG8=");
    assert_eq!(image.mime(), Some("image/jpeg"));
    assert_eq!(image.decode().unwrap(), b"hello");
}

#[test]
fn annotated_image_rejects_non_data_url() {
    assert!(matches!(AnnotatedImage::new("https://x/y.jpg").decode(), Err(AnnotatedImageError::NotDataUrl)));
    assert!(matches!(AnnotatedImage::new("data:image/jpeg,raw").decode(), Err(AnnotatedImageError::NotDataUrl)));
    assert!(matches!(AnnotatedImage::new("data:image/jpeg;base64,@@@").decode(), Err(AnnotatedImageError::Base64(_))));
}

// =============================================================
// Upload lifecycle
// =============================================================

#[test]
fn workspace_default_is_empty_intake() {
    let ws = Workspace::default();
    assert!(ws.analysis().is_none());
    assert!(ws.detections().is_empty());
    assert!(!ws.can_ask());
    assert_eq!(ws.generation(), 0);
}

#[test]
fn begin_upload_resets_downstream_state_and_marks_in_flight() {
    let mut ws = detected_workspace(1);
    ws.begin_question("what is this?").unwrap();

    ws.begin_upload(png("b.png"));

    let analysis = ws.analysis().unwrap();
    assert_eq!(analysis.source.name, "b.png");
    assert!(analysis.image_id.is_none());
    assert!(analysis.detections.is_empty());
    assert!(analysis.annotated_image.is_none());
    assert!(analysis.in_flight);
    assert!(ws.thread().messages().is_empty());
    assert!(ws.thread().bound_image_id().is_none());
    assert!(!ws.thread().is_pending());
}

#[test]
fn begin_upload_bumps_generation_each_time() {
    let mut ws = Workspace::default();
    let a = ws.begin_upload(png("a.png"));
    let b = ws.begin_upload(png("b.png"));
    assert!(b.generation > a.generation);
}

#[test]
fn apply_detection_stores_result_and_binds_thread() {
    let ws = detected_workspace(1);
    let analysis = ws.analysis().unwrap();
    assert_eq!(analysis.image_id, Some(1));
    assert_eq!(analysis.detections.len(), 1);
    assert!(analysis.annotated_image.is_some());
    assert!(!analysis.in_flight);
    assert_eq!(ws.thread().bound_image_id(), Some(1));
    assert!(ws.can_ask());
}

#[test]
fn stale_detection_is_not_applied() {
    let mut ws = Workspace::default();
    let first = ws.begin_upload(png("a.png"));
    let second = ws.begin_upload(png("b.png"));

    assert!(!ws.apply_detection(first, cat_response(1)));
    assert!(ws.image_id().is_none());
    assert!(ws.is_detecting());

    assert!(ws.apply_detection(second, cat_response(2)));
    assert_eq!(ws.image_id(), Some(2));
}

#[test]
fn fail_detection_keeps_reset_values_and_sets_notice() {
    let mut ws = Workspace::default();
    let ticket = ws.begin_upload(png("a.png"));
    assert!(ws.fail_detection(ticket));

    let analysis = ws.analysis().unwrap();
    assert!(analysis.detections.is_empty());
    assert!(analysis.image_id.is_none());
    assert!(!analysis.in_flight);
    assert_eq!(analysis.notice.as_deref(), Some(DETECTION_FAILED_NOTICE));
    assert!(!ws.can_ask());
}

#[test]
fn stale_failure_does_not_touch_new_upload() {
    let mut ws = Workspace::default();
    let first = ws.begin_upload(png("a.png"));
    ws.begin_upload(png("b.png"));

    assert!(!ws.fail_detection(first));
    let analysis = ws.analysis().unwrap();
    assert!(analysis.in_flight);
    assert!(analysis.notice.is_none());
}

#[test]
fn clear_returns_to_empty_intake_and_invalidates_tickets() {
    let mut ws = Workspace::default();
    let ticket = ws.begin_upload(png("a.png"));
    ws.clear();

    assert!(ws.analysis().is_none());
    assert!(!ws.apply_detection(ticket, cat_response(1)));
    assert!(ws.analysis().is_none());
}

// =============================================================
// Questions
// =============================================================

#[test]
fn empty_or_whitespace_question_is_rejected_without_change() {
    let mut ws = detected_workspace(1);
    assert_eq!(ws.begin_question(""), Err(AskRejection::EmptyQuestion));
    assert_eq!(ws.begin_question("   "), Err(AskRejection::EmptyQuestion));
    assert!(ws.thread().messages().is_empty());
}

#[test]
fn question_without_detections_is_rejected() {
    let mut ws = Workspace::default();
    let ticket = ws.begin_upload(png("a.png"));
    let mut empty = cat_response(5);
    empty.detections.clear();
    ws.apply_detection(ticket, empty);

    assert_eq!(ws.image_id(), Some(5));
    assert_eq!(ws.begin_question("anything?"), Err(AskRejection::NoDetections));
    assert!(ws.thread().messages().is_empty());
}

#[test]
fn question_before_any_upload_is_rejected() {
    let mut ws = Workspace::default();
    assert_eq!(ws.begin_question("hello?"), Err(AskRejection::NoDetections));
}

#[test]
fn question_is_optimistic_and_serialized() {
    let mut ws = detected_workspace(1);
    ws.thread_mut().draft = "what is this?".to_owned();

    let (ticket, image_id) = ws.begin_question("what is this?").unwrap();
    assert_eq!(image_id, 1);
    assert_eq!(ticket.image_id, Some(1));
    assert_eq!(ws.thread().messages().len(), 1);
    assert!(ws.thread().draft.is_empty());
    assert!(ws.thread().is_pending());
    assert!(!ws.can_ask());

    assert_eq!(ws.begin_question("and this?"), Err(AskRejection::Busy));
    assert_eq!(ws.thread().messages().len(), 1);
}

#[test]
fn finish_question_appends_reply() {
    let mut ws = detected_workspace(1);
    let (ticket, _) = ws.begin_question("what is this?").unwrap();
    assert!(ws.finish_question(ticket, ChatMessage::assistant("A cat.")));

    assert_eq!(
        ws.thread().messages(),
        &[ChatMessage::user("what is this?"), ChatMessage::assistant("A cat.")]
    );
    assert!(!ws.thread().is_pending());
}

#[test]
fn finish_question_after_reupload_is_discarded() {
    let mut ws = detected_workspace(1);
    let (ticket, _) = ws.begin_question("what is this?").unwrap();

    let upload = ws.begin_upload(png("b.png"));
    ws.apply_detection(upload, cat_response(2));
    let (pending_b, _) = ws.begin_question("and here?").unwrap();

    assert!(!ws.finish_question(ticket, ChatMessage::assistant("A cat.")));
    assert_eq!(ws.thread().messages(), &[ChatMessage::user("and here?")]);
    assert!(ws.thread().is_pending());

    assert!(ws.finish_question(pending_b, ChatMessage::assistant("A dog.")));
}

// =============================================================
// Sort state
// =============================================================

#[test]
fn select_sort_toggles_and_projects() {
    let mut ws = detected_workspace(1);
    assert_eq!(ws.select_sort(SortKey::Confidence), SortSpec::ascending(SortKey::Confidence));
    assert_eq!(ws.select_sort(SortKey::Confidence), SortSpec::descending(SortKey::Confidence));
    assert_eq!(ws.sorted_detections(), ws.detections());
}
