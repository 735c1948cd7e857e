//! Integration tests for moves and drags through a session.

use rstest::rstest;
use tempfile::TempDir;

use pdfstitch::error::StitchError;
use pdfstitch::model::{PageRef, ViewMode};
use pdfstitch::session::{Session, Target};

use crate::common::session_with_files;

fn names(pages: &[PageRef]) -> String {
    pages
        .iter()
        .map(|page| page.filename.trim_end_matches(".pdf").to_uppercase())
        .collect()
}

async fn abcd(dir: &std::path::Path, mode: ViewMode) -> Session {
    let mut session = session_with_files(
        dir,
        &[("a.pdf", 1), ("b.pdf", 1), ("c.pdf", 1), ("d.pdf", 1)],
    )
    .await;
    session.set_view_mode(mode).unwrap();
    session
}

#[rstest]
#[case(0, 2, "BCAD")]
#[case(3, 1, "ADBC")]
#[case(1, 1, "ABCD")]
#[case(0, 10, "BCDA")]
#[tokio::test]
async fn test_move_single_page_items(
    #[values(ViewMode::Page, ViewMode::File)] mode: ViewMode,
    #[case] from: usize,
    #[case] to: usize,
    #[case] expected: &str,
) {
    // With one page per file both views move the same thing.
    let temp_dir = TempDir::new().unwrap();
    let mut session = abcd(temp_dir.path(), mode).await;

    session.move_item(from, to).unwrap();
    assert_eq!(names(session.pages()), expected);
}

#[tokio::test]
async fn test_move_group_keeps_member_order() {
    let temp_dir = TempDir::new().unwrap();
    let mut session =
        session_with_files(temp_dir.path(), &[("a.pdf", 3), ("b.pdf", 1)]).await;

    session.move_item(0, 1).unwrap();
    let indices: Vec<_> = session
        .pages()
        .iter()
        .map(|page| (page.filename.as_str(), page.page_index))
        .collect();
    assert_eq!(
        indices,
        vec![("b.pdf", 0), ("a.pdf", 0), ("a.pdf", 1), ("a.pdf", 2)]
    );
}

#[tokio::test]
async fn test_move_out_of_range_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = abcd(temp_dir.path(), ViewMode::Page).await;
    let undo_len = session.history().undo_len();

    let result = session.move_item(4, 0);
    assert!(matches!(
        result,
        Err(StitchError::IndexOutOfRange { index: 4, len: 4 })
    ));
    assert_eq!(names(session.pages()), "ABCD");
    assert_eq!(session.history().undo_len(), undo_len);
}

#[tokio::test]
async fn test_drag_is_one_undo_step() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = abcd(temp_dir.path(), ViewMode::Page).await;
    let undo_len = session.history().undo_len();

    session.begin_drag(0).unwrap();
    assert!(session.drag_over(Some(1)).unwrap());
    assert_eq!(names(session.pages()), "BACD");
    assert!(session.drag_over(Some(3)).unwrap());
    assert_eq!(names(session.pages()), "BCDA");
    assert!(!session.drag_over(None).unwrap());
    assert!(session.end_drag());

    assert_eq!(session.history().undo_len(), undo_len + 1);
    assert!(session.undo().unwrap());
    assert_eq!(names(session.pages()), "ABCD");
}

#[tokio::test]
async fn test_drag_back_to_start_leaves_no_history() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = abcd(temp_dir.path(), ViewMode::Page).await;
    let undo_len = session.history().undo_len();

    session.begin_drag(1).unwrap();
    session.drag_over(Some(2)).unwrap();
    session.drag_over(Some(1)).unwrap();
    assert!(!session.end_drag());

    assert_eq!(names(session.pages()), "ABCD");
    assert_eq!(session.history().undo_len(), undo_len);
}

#[tokio::test]
async fn test_cancel_drag_restores_list() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = abcd(temp_dir.path(), ViewMode::File).await;

    session.begin_drag(3).unwrap();
    session.drag_over(Some(0)).unwrap();
    assert_eq!(names(session.pages()), "DABC");
    session.cancel_drag();

    assert_eq!(names(session.pages()), "ABCD");
    assert!(!session.is_dragging());
}

#[tokio::test]
async fn test_mutations_wait_for_drag() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = abcd(temp_dir.path(), ViewMode::Page).await;

    session.begin_drag(0).unwrap();
    assert!(matches!(
        session.rotate(Target::Page(1)),
        Err(StitchError::DragInProgress)
    ));
    assert!(matches!(session.undo(), Err(StitchError::DragInProgress)));
    assert!(matches!(
        session.set_view_mode(ViewMode::File),
        Err(StitchError::DragInProgress)
    ));

    session.cancel_drag();
    session.rotate(Target::Page(1)).unwrap();
}

#[tokio::test]
async fn test_drag_follows_item_when_runs_merge() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = session_with_files(temp_dir.path(), &[("a.pdf", 1), ("b.pdf", 1)]).await;
    let a = temp_dir.path().join("a.pdf");
    session.add_files(&[a]).await.unwrap();
    assert_eq!(session.groups().len(), 3);

    // Dragging b past the second run of a joins the two a runs.
    session.begin_drag(1).unwrap();
    assert!(session.drag_over(Some(2)).unwrap());
    assert_eq!(names(session.pages()), "AAB");
    assert_eq!(session.groups().len(), 2);

    assert!(session.drag_over(Some(0)).unwrap());
    assert_eq!(names(session.pages()), "BAA");
    assert!(session.end_drag());
}
