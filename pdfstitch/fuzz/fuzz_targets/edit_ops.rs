#![no_main]

use libfuzzer_sys::fuzz_target;
use pdfstitch::grouping::derive_groups;
use pdfstitch::history::History;
use pdfstitch::model::{PageId, PageRef, ViewMode};
use pdfstitch::reorder::move_item;
use std::path::PathBuf;

// Byte pairs drive moves, rotations, deletions and undo/redo on a page list
// built without touching the filesystem.
fuzz_target!(|data: &[u8]| {
    let Some((&seed, ops)) = data.split_first() else {
        return;
    };

    let mut pages: Vec<PageRef> = (0..usize::from(seed % 16) + 1)
        .map(|i| {
            let path = PathBuf::from(format!("/fuzz/{}.pdf", i % 3));
            PageRef::new(&path, &path, i, i % 2 == 0)
        })
        .collect();
    let mut history = History::with_limit(Some(8));

    for pair in ops.chunks_exact(2) {
        let (op, arg) = (pair[0], usize::from(pair[1]));
        let mode = if op & 1 == 0 { ViewMode::Page } else { ViewMode::File };
        let mut ids: Vec<PageId> = pages.iter().map(|p| p.id.clone()).collect();

        match op % 5 {
            0 | 1 => {
                let before = pages.len();
                history.save(&pages);
                let _ = move_item(&mut pages, mode, arg % 8, arg / 8);
                assert_eq!(pages.len(), before);

                let mut moved: Vec<PageId> = pages.iter().map(|p| p.id.clone()).collect();
                ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
                moved.sort_by(|a, b| a.as_str().cmp(b.as_str()));
                assert_eq!(ids, moved);
            }
            2 => {
                let index = arg % 16;
                if index < pages.len() {
                    history.save(&pages);
                    pages[index].rotate_clockwise();
                }
            }
            3 => {
                let groups = derive_groups(&pages);
                if let Some(group) = groups.get(arg % 4) {
                    let doomed = group.ids();
                    history.save(&pages);
                    pages.retain(|p| !doomed.contains(&p.id));
                }
            }
            _ => {
                let before = pages.clone();
                if arg % 2 == 0 {
                    if history.undo(&mut pages) {
                        assert!(history.redo(&mut pages));
                        assert_eq!(pages, before);
                    }
                } else if history.redo(&mut pages) {
                    assert!(history.undo(&mut pages));
                    assert_eq!(pages, before);
                }
            }
        }

        let covered: usize = derive_groups(&pages).iter().map(|g| g.page_count()).sum();
        assert_eq!(covered, pages.len());
    }
});
