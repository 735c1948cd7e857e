//! Reordering: index moves, drop-target hit testing and drag auto-scroll.
//!
//! Moves use pop-then-insert semantics: the item is removed first and then
//! inserted at `min(to, len)` of the shortened list. Moving an item forward
//! therefore lands it one slot earlier than a naive "insert before `to`"
//! would, which is the behaviour users of the page grid are used to.

use std::time::{Duration, Instant};

use crate::config::AutoScrollSettings;
use crate::error::{Result, StitchError};
use crate::grouping::derive_groups;
use crate::history::Snapshot;
use crate::model::{PageId, PageRef, ViewMode};

/// Move one page from `from` to `to`.
///
/// # Errors
///
/// Returns [`StitchError::IndexOutOfRange`] if `from` is not a valid index.
pub fn move_page(list: &mut Vec<PageRef>, from: usize, to: usize) -> Result<()> {
    move_entry(list, from, to)
}

/// Move the group at file-view position `from` to position `to`.
///
/// The group's members keep their relative order.
///
/// # Errors
///
/// Returns [`StitchError::IndexOutOfRange`] if `from` is not a valid group.
pub fn move_group(list: &mut Vec<PageRef>, from: usize, to: usize) -> Result<()> {
    let ranges: Vec<_> = derive_groups(list).into_iter().map(|g| g.range).collect();
    if from >= ranges.len() {
        return Err(StitchError::index_out_of_range(from, ranges.len()));
    }

    let mut rest = std::mem::take(list);
    let mut chunks = Vec::with_capacity(ranges.len());
    for range in ranges.iter().rev() {
        chunks.push(rest.split_off(range.start));
    }
    chunks.reverse();

    move_entry(&mut chunks, from, to)?;
    *list = chunks.into_iter().flatten().collect();
    Ok(())
}

/// Move an item in the given view mode.
pub fn move_item(list: &mut Vec<PageRef>, mode: ViewMode, from: usize, to: usize) -> Result<()> {
    match mode {
        ViewMode::Page => move_page(list, from, to),
        ViewMode::File => move_group(list, from, to),
    }
}

/// Pop-then-insert move on any vector.
///
/// # Examples
///
/// ```
/// # use pdfstitch::reorder::move_entry;
/// let mut list = vec!['A', 'B', 'C', 'D'];
/// move_entry(&mut list, 0, 2).unwrap();
/// assert_eq!(list, vec!['B', 'C', 'A', 'D']);
///
/// move_entry(&mut list, 3, 0).unwrap();
/// assert_eq!(list, vec!['D', 'B', 'C', 'A']);
/// ```
pub fn move_entry<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<()> {
    if from >= items.len() {
        return Err(StitchError::index_out_of_range(from, items.len()));
    }
    let item = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, item);
    Ok(())
}

/// Number of items in the given view mode.
pub fn item_count(list: &[PageRef], mode: ViewMode) -> usize {
    match mode {
        ViewMode::Page => list.len(),
        ViewMode::File => crate::grouping::group_count(list),
    }
}

/// Screen rectangle of an item in the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Strict interior test; points on an edge are outside.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x > self.x && x < self.x + self.width && y > self.y && y < self.y + self.height
    }
}

/// Index of the first rectangle strictly containing `point`.
pub fn hit_test(rects: &[Rect], point: (f32, f32)) -> Option<usize> {
    rects.iter().position(|rect| rect.contains(point.0, point.1))
}

/// An in-progress drag.
///
/// The dragged item is tracked by the id of its first page, so it can be
/// found again after each intermediate move even if groups merge.
#[derive(Debug, Clone)]
pub struct DragState {
    dragged: PageId,
    mode: ViewMode,
    snapshot: Snapshot,
}

impl DragState {
    /// Start dragging item `index` of `list` in `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::IndexOutOfRange`] if `index` is not a valid item.
    pub fn begin(list: &[PageRef], mode: ViewMode, index: usize) -> Result<Self> {
        let dragged = match mode {
            ViewMode::Page => list.get(index).map(|page| page.id.clone()),
            ViewMode::File => derive_groups(list)
                .get(index)
                .map(|group| group.first().id.clone()),
        };
        let dragged =
            dragged.ok_or_else(|| StitchError::index_out_of_range(index, item_count(list, mode)))?;

        Ok(Self {
            dragged,
            mode,
            snapshot: list.to_vec(),
        })
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// The list as it was when the drag began.
    pub fn snapshot(&self) -> &[PageRef] {
        &self.snapshot
    }

    /// Give back the pre-drag list.
    pub fn into_snapshot(self) -> Snapshot {
        self.snapshot
    }

    /// Current position of the dragged item in `list`.
    pub fn current_index(&self, list: &[PageRef]) -> Option<usize> {
        match self.mode {
            ViewMode::Page => list.iter().position(|page| page.id == self.dragged),
            ViewMode::File => derive_groups(list)
                .iter()
                .position(|group| group.members.iter().any(|page| page.id == self.dragged)),
        }
    }

    /// Move the dragged item over `target`.
    ///
    /// Returns whether the list changed. Hovering the item's own slot, or a
    /// target past the end of the view, is a no-op.
    pub fn drag_over(&self, list: &mut Vec<PageRef>, target: usize) -> Result<bool> {
        let Some(current) = self.current_index(list) else {
            return Ok(false);
        };
        if current == target || target >= item_count(list, self.mode) {
            return Ok(false);
        }
        move_item(list, self.mode, current, target)?;
        Ok(true)
    }
}

/// Direction of an edge auto-scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrollDirection {
    Up,
    Down,
}

/// Self-rescheduling edge scroll timer for drags.
///
/// The timer arms when the pointer enters the top or bottom margin of the
/// viewport and fires once per interval while it stays there. It only
/// produces scroll deltas; it never touches the page list.
#[derive(Debug, Clone)]
pub struct AutoScrollTimer {
    settings: AutoScrollSettings,
    armed: Option<(ScrollDirection, Instant)>,
}

impl AutoScrollTimer {
    pub fn new(settings: AutoScrollSettings) -> Self {
        Self {
            settings,
            armed: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Feed the pointer position at time `now`.
    ///
    /// Returns the scroll delta when the timer fires: negative scrolls up,
    /// positive scrolls down. Leaving the margins disarms the timer.
    pub fn poll(
        &mut self,
        now: Instant,
        pointer_y: f32,
        viewport_top: f32,
        viewport_height: f32,
    ) -> Option<f32> {
        let margin = self.settings.margin;
        let direction = if pointer_y < viewport_top + margin {
            ScrollDirection::Up
        } else if pointer_y > viewport_top + viewport_height - margin {
            ScrollDirection::Down
        } else {
            self.armed = None;
            return None;
        };

        match self.armed {
            Some((armed_direction, due)) if armed_direction == direction => {
                if now < due {
                    return None;
                }
                self.armed = Some((direction, now + self.settings.interval));
                Some(match direction {
                    ScrollDirection::Up => -self.settings.step,
                    ScrollDirection::Down => self.settings.step,
                })
            }
            _ => {
                self.armed = Some((direction, now + self.settings.interval));
                None
            }
        }
    }

    /// Disarm, e.g. when the drag ends.
    pub fn cancel(&mut self) {
        self.armed = None;
    }

    pub fn interval(&self) -> Duration {
        self.settings.interval
    }
}

impl Default for AutoScrollTimer {
    fn default() -> Self {
        Self::new(AutoScrollSettings::default())
    }
}
