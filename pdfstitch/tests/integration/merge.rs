//! Integration tests for writing the merged document.

use lopdf::Document;
use rstest::rstest;
use tempfile::TempDir;

use pdfstitch::config::{CompressionLevel, DocumentInfo};
use pdfstitch::error::StitchError;
use pdfstitch::merge::Merger;
use pdfstitch::model::{PageRef, ViewMode};
use pdfstitch::session::Target;

use std::sync::Arc;

use crate::common::{
    FakeConverter, LETTER, LETTER_LANDSCAPE, create_pdf, create_pdf_with_rotation, info_entry,
    letter_pdf, page_labels, page_rotations, session_with_converter, session_with_files,
};

#[tokio::test]
async fn test_output_follows_list_order() {
    let temp_dir = TempDir::new().unwrap();
    let mut session =
        session_with_files(temp_dir.path(), &[("a.pdf", 2), ("b.pdf", 1)]).await;
    session.set_view_mode(ViewMode::Page).unwrap();
    session.move_item(2, 0).unwrap();
    session.move_item(2, 1).unwrap();

    let out = temp_dir.path().join("out.pdf");
    let stats = session.merge_to_path(&out).await.unwrap();

    assert_eq!(stats.total_pages, 3);
    assert_eq!(stats.files_opened, 2);
    assert_eq!(stats.pages_skipped, 0);
    assert!(stats.output_size.unwrap() > 0);
    assert_eq!(page_labels(&out), vec!["b 1", "a 2", "a 1"]);
}

#[tokio::test]
async fn test_merge_is_deterministic() {
    let temp_dir = TempDir::new().unwrap();
    let mut session =
        session_with_files(temp_dir.path(), &[("a.pdf", 2), ("b.pdf", 2)]).await;
    session.rotate(Target::Group(1)).unwrap();

    let first = temp_dir.path().join("first.pdf");
    let second = temp_dir.path().join("second.pdf");
    session.merge_to_path(&first).await.unwrap();
    session.merge_to_path(&second).await.unwrap();

    assert_eq!(page_labels(&first), page_labels(&second));
    assert_eq!(page_rotations(&first), page_rotations(&second));
    assert_eq!(page_rotations(&first), vec![0, 0, 90, 90]);
}

#[tokio::test]
async fn test_same_page_twice() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = session_with_files(temp_dir.path(), &[("a.pdf", 1)]).await;
    let a = temp_dir.path().join("a.pdf");
    session.add_files(&[a]).await.unwrap();
    session.rotate(Target::Page(1)).unwrap();

    let out = temp_dir.path().join("out.pdf");
    let stats = session.merge_to_path(&out).await.unwrap();

    assert_eq!(stats.files_opened, 1);
    assert_eq!(page_labels(&out), vec!["a 1", "a 1"]);
    assert_eq!(page_rotations(&out), vec![0, 90]);
}

#[rstest]
#[case(None, 1, 90)]
#[case(Some(90), 1, 180)]
#[case(Some(270), 1, 0)]
#[case(Some(180), 3, 90)]
#[tokio::test]
async fn test_rotation_composes_with_stored_rotate(
    #[case] stored: Option<i64>,
    #[case] turns: usize,
    #[case] expected: i64,
) {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("turned.pdf");
    create_pdf_with_rotation(&source, &[LETTER], stored);

    let mut session = session_with_converter(Arc::new(FakeConverter::new(temp_dir.path(), 1)));
    session.add_files(&[source]).await.unwrap();
    for _ in 0..turns {
        session.rotate(Target::Page(0)).unwrap();
    }

    let out = temp_dir.path().join("out.pdf");
    session.merge_to_path(&out).await.unwrap();
    assert_eq!(page_rotations(&out), vec![expected]);
}

#[test]
fn test_out_of_range_pages_are_omitted() {
    let temp_dir = TempDir::new().unwrap();
    let a = letter_pdf(temp_dir.path(), "a.pdf", 2);
    let pages = vec![
        PageRef::new(&a, &a, 0, true),
        PageRef::new(&a, &a, 5, true),
        PageRef::new(&a, &a, 1, true),
    ];

    let result = Merger::new().merge_document(&pages).unwrap();
    assert_eq!(result.statistics.total_pages, 2);
    assert_eq!(result.statistics.pages_skipped, 1);
}

#[test]
fn test_only_out_of_range_pages_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let a = letter_pdf(temp_dir.path(), "a.pdf", 1);
    let pages = vec![PageRef::new(&a, &a, 3, true)];

    let result = Merger::new().merge_document(&pages);
    assert!(matches!(result, Err(StitchError::NoPagesToMerge)));
}

#[test]
fn test_page_size_is_preserved() {
    let temp_dir = TempDir::new().unwrap();
    let mixed = temp_dir.path().join("mixed.pdf");
    create_pdf(&mixed, &[LETTER, LETTER_LANDSCAPE]);
    let pages = vec![
        PageRef::new(&mixed, &mixed, 1, false),
        PageRef::new(&mixed, &mixed, 0, true),
    ];

    let doc = Merger::new().merge_document(&pages).unwrap().document;
    let widths: Vec<i64> = doc
        .get_pages()
        .values()
        .map(|&id| {
            let media_box = doc.get_dictionary(id).unwrap().get(b"MediaBox").unwrap();
            media_box.as_array().unwrap()[2].as_i64().unwrap()
        })
        .collect();
    assert_eq!(widths, vec![LETTER_LANDSCAPE.0, LETTER.0]);
}

#[tokio::test]
async fn test_failed_merge_leaves_target_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let session = session_with_files(temp_dir.path(), &[("a.pdf", 1), ("b.pdf", 1)]).await;
    std::fs::remove_file(temp_dir.path().join("b.pdf")).unwrap();

    let out = temp_dir.path().join("out.pdf");
    std::fs::write(&out, b"previous contents").unwrap();

    let result = session.merge_to_path(&out).await;
    assert!(result.is_err());
    assert_eq!(std::fs::read(&out).unwrap(), b"previous contents");

    let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_unwritable_target_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let session = session_with_files(temp_dir.path(), &[("a.pdf", 1)]).await;

    let out = temp_dir.path().join("missing").join("out.pdf");
    let result = session.merge_to_path(&out).await;
    assert!(result.is_err());
    assert!(!out.exists());
}

#[tokio::test]
async fn test_preview_matches_saved_output() {
    let temp_dir = TempDir::new().unwrap();
    let mut session =
        session_with_files(temp_dir.path(), &[("a.pdf", 1), ("b.pdf", 2)]).await;
    session.rotate(Target::Page(2)).unwrap();

    let bytes = session.preview().unwrap();
    let preview = Document::load_mem(&bytes).unwrap();
    assert_eq!(preview.get_pages().len(), 3);

    session.delete(Target::Group(0)).unwrap();
    session.delete(Target::Group(0)).unwrap();
    assert!(session.preview().is_none());
}

#[rstest]
#[case(CompressionLevel::None)]
#[case(CompressionLevel::Maximum)]
#[tokio::test]
async fn test_metadata_is_written(#[case] compression: CompressionLevel) {
    let temp_dir = TempDir::new().unwrap();
    let a = letter_pdf(temp_dir.path(), "a.pdf", 1);
    let pages = vec![PageRef::new(&a, &a, 0, true)];
    let merger = Merger::new()
        .with_compression(compression)
        .with_info(DocumentInfo::new(
            Some("Bundle".to_string()),
            Some("Editor".to_string()),
        ));

    let out = temp_dir.path().join("out.pdf");
    merger.merge_to_path(&pages, &out).await.unwrap();

    assert_eq!(info_entry(&out, "Title").as_deref(), Some("Bundle"));
    assert_eq!(info_entry(&out, "Author").as_deref(), Some("Editor"));
    assert!(info_entry(&out, "Producer").unwrap().starts_with("pdfstitch"));
}
