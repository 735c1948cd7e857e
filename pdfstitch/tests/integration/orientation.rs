//! Integration tests for the orientation toggle.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use pdfstitch::model::{Orientation, Rotation, ViewMode};
use pdfstitch::session::{OrientationOutcome, Session, Target};

use crate::common::{
    FakeConverter, LETTER_LANDSCAPE, letter_pdf, session_with_converter, session_with_files,
};

fn write_notes(dir: &Path) -> PathBuf {
    let notes = dir.join("notes.txt");
    std::fs::write(&notes, "first line\nsecond line\n").unwrap();
    notes
}

async fn converted_session(converter: FakeConverter) -> (Session, Arc<FakeConverter>, PathBuf) {
    let notes = write_notes(&converter.output_dir);
    let converter = Arc::new(converter);
    let mut session = session_with_converter(converter.clone());
    let report = session.add_files(&[notes.clone()]).await.unwrap();
    assert!(report.is_complete());
    (session, converter, notes)
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_group_reconverts_to_landscape() {
    let temp_dir = TempDir::new().unwrap();
    let (mut session, converter, notes) =
        converted_session(FakeConverter::new(temp_dir.path(), 2)).await;
    session.rotate(Target::Group(0)).unwrap();

    let outcome = session.toggle_orientation(Target::Group(0)).unwrap();
    assert_eq!(outcome, OrientationOutcome::Reconverted);

    assert_eq!(session.page_count(), 2);
    for page in session.pages() {
        assert_eq!(file_name(&page.path), "fake_notes.txt_L.pdf");
        assert_eq!(page.original_source_path, notes);
        assert!(page.is_landscape_generated);
        assert_eq!(page.rotation, Rotation::None);
        assert_eq!(page.orientation(), Orientation::Landscape);
    }
    assert_eq!(
        *converter.calls.lock().unwrap(),
        vec![(notes.clone(), false), (notes, true)]
    );
}

#[tokio::test]
async fn test_second_toggle_returns_to_portrait() {
    let temp_dir = TempDir::new().unwrap();
    let (mut session, _, _) = converted_session(FakeConverter::new(temp_dir.path(), 1)).await;

    session.toggle_orientation(Target::Group(0)).unwrap();
    let outcome = session.toggle_orientation(Target::Group(0)).unwrap();

    assert_eq!(outcome, OrientationOutcome::Reconverted);
    let page = &session.pages()[0];
    assert_eq!(file_name(&page.path), "fake_notes.txt_P.pdf");
    assert!(!page.is_landscape_generated);
    assert_eq!(page.orientation(), Orientation::Portrait);
}

#[tokio::test]
async fn test_missing_source_falls_back_to_rotation() {
    let temp_dir = TempDir::new().unwrap();
    let (mut session, converter, notes) =
        converted_session(FakeConverter::new(temp_dir.path(), 2)).await;
    std::fs::remove_file(&notes).unwrap();

    let outcome = session.toggle_orientation(Target::Group(0)).unwrap();

    assert_eq!(outcome, OrientationOutcome::Rotated);
    assert_eq!(converter.call_count(), 1);
    for page in session.pages() {
        assert_eq!(page.rotation, Rotation::Clockwise90);
        assert!(!page.is_landscape_generated);
    }
}

#[tokio::test]
async fn test_failed_conversion_falls_back_to_rotation() {
    let temp_dir = TempDir::new().unwrap();
    let converter = FakeConverter {
        fail_landscape: true,
        ..FakeConverter::new(temp_dir.path(), 1)
    };
    let (mut session, converter, _) = converted_session(converter).await;

    let outcome = session.toggle_orientation(Target::Page(0)).unwrap();

    assert_eq!(outcome, OrientationOutcome::Rotated);
    assert_eq!(converter.call_count(), 2);
    assert_eq!(session.pages()[0].rotation, Rotation::Clockwise90);
    assert_eq!(file_name(&session.pages()[0].path), "fake_notes.txt_P.pdf");
}

#[tokio::test]
async fn test_group_shrinks_with_shorter_conversion() {
    let temp_dir = TempDir::new().unwrap();
    let converter = FakeConverter {
        landscape_pages: 2,
        ..FakeConverter::new(temp_dir.path(), 3)
    };
    let (mut session, _, _) = converted_session(converter).await;
    assert_eq!(session.page_count(), 3);

    session.toggle_orientation(Target::Group(0)).unwrap();

    let indices: Vec<_> = session.pages().iter().map(|p| p.page_index).collect();
    assert_eq!(indices, vec![0, 1]);
}

#[tokio::test]
async fn test_group_grows_without_restoring_deleted_pages() {
    let temp_dir = TempDir::new().unwrap();
    let converter = FakeConverter {
        landscape_pages: 4,
        ..FakeConverter::new(temp_dir.path(), 2)
    };
    let (mut session, _, _) = converted_session(converter).await;
    session.delete(Target::Page(1)).unwrap();

    session.toggle_orientation(Target::Group(0)).unwrap();

    let indices: Vec<_> = session.pages().iter().map(|p| p.page_index).collect();
    assert_eq!(indices, vec![0, 2, 3]);
    assert!(session.pages().iter().all(|p| p.is_landscape_generated));
    assert_eq!(session.groups().len(), 1);
}

#[tokio::test]
async fn test_page_target_reconverts_only_that_page() {
    let temp_dir = TempDir::new().unwrap();
    let (mut session, _, _) = converted_session(FakeConverter::new(temp_dir.path(), 2)).await;
    let untouched = session.pages()[0].clone();

    let outcome = session.toggle_orientation(Target::Page(1)).unwrap();

    assert_eq!(outcome, OrientationOutcome::Reconverted);
    assert_eq!(session.pages()[0], untouched);
    assert!(session.pages()[1].is_landscape_generated);
    assert_eq!(session.groups().len(), 2);
}

#[tokio::test]
async fn test_page_missing_from_conversion_is_rotated() {
    let temp_dir = TempDir::new().unwrap();
    let converter = FakeConverter {
        landscape_pages: 1,
        ..FakeConverter::new(temp_dir.path(), 2)
    };
    let (mut session, _, _) = converted_session(converter).await;

    let outcome = session.toggle_orientation(Target::Page(1)).unwrap();

    assert_eq!(outcome, OrientationOutcome::Rotated);
    let page = &session.pages()[1];
    assert_eq!(page.rotation, Rotation::Clockwise90);
    assert!(!page.is_landscape_generated);
}

#[tokio::test]
async fn test_native_pdf_rotates() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = session_with_files(temp_dir.path(), &[("a.pdf", 2)]).await;

    let outcome = session.toggle_orientation(Target::Group(0)).unwrap();

    assert_eq!(outcome, OrientationOutcome::Rotated);
    assert!(
        session
            .pages()
            .iter()
            .all(|page| page.rotation == Rotation::Clockwise90)
    );
    assert_eq!(session.pages()[0].orientation(), Orientation::Landscape);
}

#[tokio::test]
async fn test_toggle_is_one_undo_step() {
    let temp_dir = TempDir::new().unwrap();
    let (mut session, _, _) = converted_session(FakeConverter::new(temp_dir.path(), 2)).await;
    let before = session.pages().to_vec();
    let undo_len = session.history().undo_len();

    session.toggle_orientation(Target::Group(0)).unwrap();
    assert_eq!(session.history().undo_len(), undo_len + 1);

    assert!(session.undo().unwrap());
    assert_eq!(session.pages(), before.as_slice());
}

#[tokio::test]
async fn test_reconverted_pages_merge_as_landscape() {
    let temp_dir = TempDir::new().unwrap();
    let (mut session, _, _) = converted_session(FakeConverter::new(temp_dir.path(), 1)).await;
    session.toggle_orientation(Target::Group(0)).unwrap();

    let out = temp_dir.path().join("out.pdf");
    session.merge_to_path(&out).await.unwrap();

    let doc = lopdf::Document::load(&out).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    let media_box = doc.get_dictionary(page_id).unwrap().get(b"MediaBox").unwrap();
    let width = media_box.as_array().unwrap()[2].as_i64().unwrap();
    assert_eq!(width, LETTER_LANDSCAPE.0);
}

#[tokio::test]
async fn test_split_run_is_only_repointed() {
    let temp_dir = TempDir::new().unwrap();
    let converter = FakeConverter {
        landscape_pages: 3,
        ..FakeConverter::new(temp_dir.path(), 2)
    };
    let notes = write_notes(&converter.output_dir);
    let other = letter_pdf(temp_dir.path(), "other.pdf", 1);
    let mut session = session_with_converter(Arc::new(converter));
    session.add_files(&[notes, other]).await.unwrap();
    session.set_view_mode(ViewMode::Page).unwrap();
    session.move_item(2, 1).unwrap();

    let outcome = session.toggle_orientation(Target::Group(0)).unwrap();

    assert_eq!(outcome, OrientationOutcome::Reconverted);
    let layout: Vec<_> = session
        .pages()
        .iter()
        .map(|p| (p.filename.as_str(), p.page_index, p.is_landscape_generated))
        .collect();
    assert_eq!(
        layout,
        vec![
            ("notes.txt", 0, true),
            ("other.pdf", 0, false),
            ("notes.txt", 1, false),
        ]
    );
}

#[tokio::test]
async fn test_reconversion_refreshes_page_shape() {
    let temp_dir = TempDir::new().unwrap();
    let (mut session, _, _) = converted_session(FakeConverter::new(temp_dir.path(), 1)).await;
    assert!(session.pages()[0].is_portrait_original);

    session.toggle_orientation(Target::Page(0)).unwrap();
    assert!(!session.pages()[0].is_portrait_original);

    session.toggle_orientation(Target::Page(0)).unwrap();
    assert!(session.pages()[0].is_portrait_original);
}
