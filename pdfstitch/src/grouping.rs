//! File-view grouping.
//!
//! A group is a maximal run of consecutive pages backed by the same PDF path.
//! Groups are never stored; they are recomputed from the page list whenever a
//! file-view operation needs them.

use std::ops::Range;
use std::path::Path;

use crate::model::{Orientation, PageId, PageRef, Rotation};

/// A run of consecutive pages sharing one backing path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group<'a> {
    /// Position of the group in the file view.
    pub index: usize,
    /// Positions of the members in the page list.
    pub range: Range<usize>,
    /// The members, in list order. Never empty.
    pub members: &'a [PageRef],
}

impl<'a> Group<'a> {
    /// The first member, which represents the group in the file view.
    pub fn first(&self) -> &'a PageRef {
        &self.members[0]
    }

    pub fn path(&self) -> &'a Path {
        &self.first().path
    }

    pub fn filename(&self) -> &'a str {
        &self.first().filename
    }

    pub fn page_count(&self) -> usize {
        self.members.len()
    }

    /// Rotation of the first member.
    pub fn rotation(&self) -> Rotation {
        self.first().rotation
    }

    /// Orientation of the first member.
    pub fn orientation(&self) -> Orientation {
        self.first().orientation()
    }

    /// Ids of every member, in list order.
    pub fn ids(&self) -> Vec<PageId> {
        self.members.iter().map(|page| page.id.clone()).collect()
    }
}

/// Split the page list into maximal same-path runs.
///
/// Non-adjacent runs of the same path are separate groups.
pub fn derive_groups(pages: &[PageRef]) -> Vec<Group<'_>> {
    let mut groups = Vec::new();
    let mut start = 0;

    while start < pages.len() {
        let path = &pages[start].path;
        let len = pages[start..]
            .iter()
            .take_while(|page| &page.path == path)
            .count();
        let end = start + len;

        groups.push(Group {
            index: groups.len(),
            range: start..end,
            members: &pages[start..end],
        });
        start = end;
    }

    groups
}

/// Number of groups without materialising them.
pub fn group_count(pages: &[PageRef]) -> usize {
    match pages.first() {
        None => 0,
        Some(_) => 1 + pages.windows(2).filter(|w| w[0].path != w[1].path).count(),
    }
}
