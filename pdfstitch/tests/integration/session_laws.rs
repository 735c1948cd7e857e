//! Integration tests for the history laws of an editing session.

use rstest::rstest;
use tempfile::TempDir;

use pdfstitch::config::{Config, EditorSettings};
use pdfstitch::merge::Merger;
use pdfstitch::model::{Rotation, ViewMode};
use pdfstitch::session::{Session, Target};

use crate::common::{FakeConverter, ids, letter_pdf, session_with_files};

#[derive(Debug, Clone, Copy)]
enum Op {
    DeletePage,
    DeleteGroup,
    RotatePage,
    RotateGroup,
    RotateAll,
    MovePage,
    MoveGroup,
    Orient,
}

fn apply(session: &mut Session, op: Op) {
    let result = match op {
        Op::DeletePage => session.delete(Target::Page(1)).map(|_| ()),
        Op::DeleteGroup => session.delete(Target::Group(0)).map(|_| ()),
        Op::RotatePage => session.rotate(Target::Page(2)),
        Op::RotateGroup => session.rotate(Target::Group(1)),
        Op::RotateAll => session.rotate_all(),
        Op::MovePage => {
            session.set_view_mode(ViewMode::Page).unwrap();
            session.move_item(0, 3)
        }
        Op::MoveGroup => session.move_item(2, 0),
        Op::Orient => session.toggle_orientation(Target::Group(1)).map(|_| ()),
    };
    result.unwrap();
}

#[rstest]
#[case(Op::DeletePage)]
#[case(Op::DeleteGroup)]
#[case(Op::RotatePage)]
#[case(Op::RotateGroup)]
#[case(Op::RotateAll)]
#[case(Op::MovePage)]
#[case(Op::MoveGroup)]
#[case(Op::Orient)]
#[tokio::test]
async fn test_undo_redo_inverse(#[case] op: Op) {
    let temp_dir = TempDir::new().unwrap();
    let mut session =
        session_with_files(temp_dir.path(), &[("a.pdf", 2), ("b.pdf", 2), ("c.pdf", 1)]).await;

    let before = session.pages().to_vec();
    apply(&mut session, op);
    let after = session.pages().to_vec();
    assert_ne!(before, after, "{op:?} changed nothing");

    assert!(session.undo().unwrap());
    assert_eq!(session.pages(), before.as_slice());

    assert!(session.redo().unwrap());
    assert_eq!(session.pages(), after.as_slice());
}

#[rstest]
#[case(Op::RotatePage)]
#[case(Op::DeleteGroup)]
#[case(Op::MoveGroup)]
#[tokio::test]
async fn test_mutation_clears_redo(#[case] op: Op) {
    let temp_dir = TempDir::new().unwrap();
    let mut session =
        session_with_files(temp_dir.path(), &[("a.pdf", 2), ("b.pdf", 2), ("c.pdf", 1)]).await;

    session.rotate_all().unwrap();
    session.undo().unwrap();
    assert!(session.can_redo());

    apply(&mut session, op);
    assert!(!session.can_redo());
}

#[tokio::test]
async fn test_undo_and_redo_on_empty_stacks_are_noops() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = session_with_files(temp_dir.path(), &[("a.pdf", 1)]).await;

    assert!(!session.redo().unwrap());
    assert!(session.undo().unwrap());
    assert!(session.is_empty());
    assert!(!session.undo().unwrap());
    assert!(session.is_empty());
}

#[tokio::test]
async fn test_identity_survives_edits() {
    let temp_dir = TempDir::new().unwrap();
    let mut session =
        session_with_files(temp_dir.path(), &[("a.pdf", 2), ("b.pdf", 2), ("c.pdf", 1)]).await;
    let kept = session.pages()[4].id.clone();

    session.rotate(Target::Group(2)).unwrap();
    session.move_item(2, 0).unwrap();
    session.delete(Target::Group(1)).unwrap();
    session.set_view_mode(ViewMode::Page).unwrap();
    session.move_item(0, 2).unwrap();
    session.rotate_all().unwrap();
    session.undo().unwrap();
    session.redo().unwrap();

    let page = session.pages().iter().find(|p| p.id == kept).unwrap();
    assert_eq!(page.filename, "c.pdf");
    assert_eq!(page.rotation, Rotation::Rotate180);
}

#[tokio::test]
async fn test_four_rotations_return_to_zero() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = session_with_files(temp_dir.path(), &[("a.pdf", 1)]).await;

    for _ in 0..4 {
        session.rotate(Target::Page(0)).unwrap();
    }
    assert_eq!(session.pages()[0].rotation, Rotation::None);
    assert_eq!(session.history().undo_len(), 5);
}

#[tokio::test]
async fn test_group_delete_leaves_other_runs_of_same_file() {
    let temp_dir = TempDir::new().unwrap();
    let mut session =
        session_with_files(temp_dir.path(), &[("a.pdf", 2), ("b.pdf", 1)]).await;

    // Append a second, separate run of a.pdf: [a a b a a]
    let a = temp_dir.path().join("a.pdf");
    session.add_files(&[a]).await.unwrap();
    assert_eq!(session.groups().len(), 3);
    let second_run = ids(session.groups()[2].members);

    let removed = session.delete(Target::Group(0)).unwrap();
    assert_eq!(removed, 2);
    assert_eq!(session.page_count(), 3);
    assert_eq!(ids(&session.pages()[1..]), second_run);
}

#[tokio::test]
async fn test_history_limit_keeps_newest_steps() {
    let temp_dir = TempDir::new().unwrap();
    let a = letter_pdf(temp_dir.path(), "a.pdf", 1);
    let config = Config {
        editor: EditorSettings {
            history_limit: Some(2),
            ..EditorSettings::default()
        },
        ..Config::default()
    };
    let converter = std::sync::Arc::new(FakeConverter::new(temp_dir.path(), 1));
    let mut session = Session::with_converter(&config, converter);
    session.add_files(&[a]).await.unwrap();

    for _ in 0..3 {
        session.rotate(Target::Group(0)).unwrap();
    }
    assert_eq!(session.history().undo_len(), 2);
    assert!(session.undo().unwrap());
    assert!(session.undo().unwrap());
    assert!(!session.undo().unwrap());
    assert_eq!(session.pages()[0].rotation, Rotation::Clockwise90);
}

#[tokio::test]
async fn test_editing_never_leaves_dangling_page_indices() {
    let temp_dir = TempDir::new().unwrap();
    let converter = FakeConverter {
        landscape_pages: 2,
        ..FakeConverter::new(temp_dir.path(), 3)
    };
    let notes = temp_dir.path().join("notes.txt");
    std::fs::write(&notes, "text").unwrap();
    let a = letter_pdf(temp_dir.path(), "a.pdf", 3);
    let mut session = Session::new(std::sync::Arc::new(converter));
    session.add_files(&[a, notes]).await.unwrap();

    let merger = Merger::new();
    let assert_all_pages_resolve = |session: &Session, step: &str| {
        let merged = merger.merge_document(session.pages()).unwrap();
        assert_eq!(merged.statistics.pages_skipped, 0, "after {step}");
        assert_eq!(merged.statistics.total_pages, session.page_count(), "after {step}");
    };
    assert_all_pages_resolve(&session, "import");

    session.rotate(Target::Group(1)).unwrap();
    assert_all_pages_resolve(&session, "rotate");

    session.toggle_orientation(Target::Group(1)).unwrap();
    assert_eq!(session.page_count(), 5);
    assert_all_pages_resolve(&session, "shrinking toggle");

    session.set_view_mode(ViewMode::Page).unwrap();
    session.move_item(4, 0).unwrap();
    session.delete(Target::Page(2)).unwrap();
    assert_all_pages_resolve(&session, "move and delete");

    session.toggle_orientation(Target::Page(0)).unwrap();
    assert_all_pages_resolve(&session, "page toggle");

    while session.undo().unwrap() {
        if !session.is_empty() {
            assert_all_pages_resolve(&session, "undo");
        }
    }
    while session.redo().unwrap() {
        assert_all_pages_resolve(&session, "redo");
    }
}
