//! Integration tests for adding files to a session.

use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use pdfstitch::config::Config;
use pdfstitch::session::Session;

use crate::common::{
    FakeConverter, LETTER, LETTER_LANDSCAPE, create_pdf, letter_pdf, session_with_converter,
};

#[tokio::test]
async fn test_import_keeps_input_order() {
    let temp_dir = TempDir::new().unwrap();
    let paths: Vec<PathBuf> = (0..12)
        .map(|i| letter_pdf(temp_dir.path(), &format!("doc{i:02}.pdf"), 1 + i % 3))
        .collect();
    let mut session = session_with_converter(Arc::new(FakeConverter::new(temp_dir.path(), 1)));

    let report = session.add_files(&paths).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.imported_files, 12);
    let groups: Vec<_> = session
        .groups()
        .iter()
        .map(|group| (group.first().filename.clone(), group.members.len()))
        .collect();
    let expected: Vec<_> = (0..12)
        .map(|i| (format!("doc{i:02}.pdf"), 1 + i % 3))
        .collect();
    assert_eq!(groups, expected);
}

#[tokio::test]
async fn test_page_orientation_is_recorded() {
    let temp_dir = TempDir::new().unwrap();
    let mixed = temp_dir.path().join("mixed.pdf");
    create_pdf(&mixed, &[LETTER, LETTER_LANDSCAPE]);
    let mut session = session_with_converter(Arc::new(FakeConverter::new(temp_dir.path(), 1)));

    session.add_files(&[mixed]).await.unwrap();

    let portrait: Vec<_> = session
        .pages()
        .iter()
        .map(|page| page.is_portrait_original)
        .collect();
    assert_eq!(portrait, vec![true, false]);
}

#[tokio::test]
async fn test_bad_files_are_skipped_with_reasons() {
    let temp_dir = TempDir::new().unwrap();
    let good = letter_pdf(temp_dir.path(), "good.pdf", 2);
    let missing = temp_dir.path().join("missing.pdf");
    let garbage = temp_dir.path().join("garbage.pdf");
    std::fs::write(&garbage, b"definitely not a pdf").unwrap();
    let empty = temp_dir.path().join("empty.pdf");
    create_pdf(&empty, &[]);
    let mut session = session_with_converter(Arc::new(FakeConverter::new(temp_dir.path(), 1)));

    let report = session
        .add_files(&[missing.clone(), good, garbage.clone(), empty.clone()])
        .await
        .unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.imported_files, 1);
    assert_eq!(session.page_count(), 2);

    let skipped: Vec<_> = report.skipped.iter().map(|s| s.path.clone()).collect();
    assert_eq!(skipped, vec![missing, garbage, empty]);
    assert!(report.skipped[0].reason.contains("not found"));
    assert!(report.skipped[2].reason.contains("no pages"));
}

#[tokio::test]
async fn test_nothing_imported_leaves_history_alone() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = session_with_converter(Arc::new(FakeConverter::new(temp_dir.path(), 1)));

    let report = session
        .add_files(&[temp_dir.path().join("nope.pdf")])
        .await
        .unwrap();

    assert_eq!(report.skipped.len(), 1);
    assert!(session.is_empty());
    assert!(!session.can_undo());
}

#[tokio::test]
async fn test_import_is_one_undo_step() {
    let temp_dir = TempDir::new().unwrap();
    let a = letter_pdf(temp_dir.path(), "a.pdf", 2);
    let b = letter_pdf(temp_dir.path(), "b.pdf", 3);
    let mut session = session_with_converter(Arc::new(FakeConverter::new(temp_dir.path(), 1)));

    session.add_files(&[a]).await.unwrap();
    session.add_files(&[b]).await.unwrap();
    assert_eq!(session.page_count(), 5);

    assert!(session.undo().unwrap());
    assert_eq!(session.page_count(), 2);
    assert!(session.redo().unwrap());
    assert_eq!(session.page_count(), 5);
}

#[tokio::test]
async fn test_converted_files_keep_their_source() {
    let temp_dir = TempDir::new().unwrap();
    let notes = temp_dir.path().join("notes.txt");
    std::fs::write(&notes, "hello").unwrap();
    let converter = Arc::new(FakeConverter::new(temp_dir.path(), 3));
    let mut session = session_with_converter(converter.clone());

    session.add_files(&[notes.clone()]).await.unwrap();

    assert_eq!(session.page_count(), 3);
    assert_eq!(session.groups().len(), 1);
    for (index, page) in session.pages().iter().enumerate() {
        assert!(page.is_generated);
        assert!(!page.is_landscape_generated);
        assert_eq!(page.filename, "notes.txt");
        assert_eq!(page.original_source_path, notes);
        assert_eq!(page.page_index, index);
    }
    assert_eq!(*converter.calls.lock().unwrap(), vec![(notes, false)]);
}

#[tokio::test]
async fn test_builtin_conversion_of_text_and_images() {
    let temp_dir = TempDir::new().unwrap();
    let notes = temp_dir.path().join("notes.txt");
    std::fs::write(&notes, "line one\nline two\n").unwrap();
    let photo = temp_dir.path().join("photo.png");
    image::RgbImage::from_pixel(40, 20, image::Rgb([200, 30, 30]))
        .save(&photo)
        .unwrap();
    let unknown = temp_dir.path().join("archive.xyz");
    std::fs::write(&unknown, b"??").unwrap();

    let config = Config {
        temp_dir: Some(temp_dir.path().to_path_buf()),
        ..Config::default()
    };
    let mut session = Session::from_config(&config);
    let report = session
        .add_files(&[notes, photo, unknown.clone()])
        .await
        .unwrap();

    assert_eq!(report.imported_files, 2);
    assert_eq!(session.page_count(), 2);
    assert!(session.pages().iter().all(|page| page.is_generated));
    assert!(!session.pages()[1].is_portrait_original);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path, unknown);

    let out = temp_dir.path().join("out.pdf");
    let stats = session.merge_to_path(&out).await.unwrap();
    assert_eq!(stats.total_pages, 2);
}

#[tokio::test]
async fn test_same_named_sources_stay_separate() {
    let temp_dir = TempDir::new().unwrap();
    let mut sources = Vec::new();
    for (folder, text) in [("one", "alpha".to_string()), ("two", "beta\n".repeat(200))] {
        let dir = temp_dir.path().join(folder);
        std::fs::create_dir(&dir).unwrap();
        let source = dir.join("notes.txt");
        std::fs::write(&source, text).unwrap();
        sources.push(source);
    }
    let scratch = temp_dir.path().join("scratch");
    std::fs::create_dir(&scratch).unwrap();

    let config = Config {
        temp_dir: Some(scratch),
        ..Config::default()
    };
    let mut session = Session::from_config(&config);
    let report = session.add_files(&sources).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(session.groups().len(), 2);
    let first = &session.pages()[0];
    let second = &session.pages()[1];
    assert_eq!(first.original_source_path, sources[0]);
    assert_eq!(second.original_source_path, sources[1]);
    assert_ne!(first.path, second.path);
    assert_eq!(session.page_count(), 1 + 4);

    let out = temp_dir.path().join("out.pdf");
    let stats = session.merge_to_path(&out).await.unwrap();
    assert_eq!(stats.total_pages, 5);
    assert_eq!(stats.files_opened, 2);
}
