//! The editing session.
//!
//! A [`Session`] is the single owner of the document list. Every mutating
//! operation takes `&mut self`, validates its arguments, records one history
//! snapshot and then mutates, so a failed call leaves both the list and the
//! history untouched.
//!
//! # Examples
//!
//! ```no_run
//! use pdfstitch::config::Config;
//! use pdfstitch::session::Session;
//! use std::path::{Path, PathBuf};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::from_config(&Config::default());
//! session.add_files(&[PathBuf::from("a.pdf"), PathBuf::from("b.png")]).await?;
//! session.rotate(session.target(0))?;
//! session.merge_to_path(Path::new("out.pdf")).await?;
//! # Ok(())
//! # }
//! ```

use image::RgbaImage;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::{Config, EditorSettings};
use crate::convert::{BuiltinConverter, Converter};
use crate::error::{Result, StitchError};
use crate::grouping::{Group, derive_groups};
use crate::history::History;
use crate::import::{ImportReport, Importer};
use crate::io::{PdfReader, PdfWriter};
use crate::merge::{MergeStatistics, Merger};
use crate::model::{PageId, PageRef, Rotation, ViewMode};
use crate::render::{PageRenderer, ThumbnailCache, ThumbnailKey, fit_thumbnail};
use crate::reorder::{self, AutoScrollTimer, DragState, Rect};

/// What an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A single page, by position in the page view.
    Page(usize),
    /// A whole group, by position in the file view.
    Group(usize),
}

/// Which path [`Session::toggle_orientation`] took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrientationOutcome {
    /// The source was converted again with the opposite layout.
    Reconverted,
    /// The target was turned 90 degrees clockwise.
    Rotated,
}

/// Owner of the document list, its history and the view state.
pub struct Session {
    pages: Vec<PageRef>,
    history: History,
    view_mode: ViewMode,
    drag: Option<DragState>,
    scroll: AutoScrollTimer,
    zoom: f32,
    importer: Importer,
    merger: Merger,
    reader: PdfReader,
    thumbnails: ThumbnailCache,
    settings: EditorSettings,
}

impl Session {
    /// Session with default settings using `converter` for non-PDF sources.
    pub fn new(converter: Arc<dyn Converter>) -> Self {
        Self::with_converter(&Config::default(), converter)
    }

    /// Session configured from `config` with the built-in converter.
    pub fn from_config(config: &Config) -> Self {
        Self::with_converter(config, Arc::new(BuiltinConverter::from_config(config)))
    }

    /// Session configured from `config` with a custom converter.
    pub fn with_converter(config: &Config, converter: Arc<dyn Converter>) -> Self {
        let settings = config.editor.clone();
        Self {
            pages: Vec::new(),
            history: History::with_limit(settings.history_limit),
            view_mode: config.view_mode,
            drag: None,
            scroll: AutoScrollTimer::new(settings.auto_scroll),
            zoom: 1.0,
            importer: Importer::new(converter, config.effective_jobs()),
            merger: Merger::new()
                .with_info(config.info.clone())
                .with_compression(config.compression),
            reader: PdfReader::new(),
            thumbnails: ThumbnailCache::new(settings.thumbnail_cache_capacity),
            settings,
        }
    }

    // Accessors

    pub fn pages(&self) -> &[PageRef] {
        &self.pages
    }

    /// Groups of the current list, recomputed on every call.
    pub fn groups(&self) -> Vec<Group<'_>> {
        derive_groups(&self.pages)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of items in the current view.
    pub fn item_count(&self) -> usize {
        reorder::item_count(&self.pages, self.view_mode)
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Target for item `index` of the current view.
    pub fn target(&self, index: usize) -> Target {
        match self.view_mode {
            ViewMode::Page => Target::Page(index),
            ViewMode::File => Target::Group(index),
        }
    }

    // View state

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Set the grid zoom, clamped to the configured range.
    pub fn set_zoom(&mut self, zoom: f32) -> f32 {
        self.zoom = self.settings.zoom.clamp(zoom);
        self.zoom
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.set_zoom(self.settings.zoom.zoom_in(self.zoom))
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.set_zoom(self.settings.zoom.zoom_out(self.zoom))
    }

    /// Thumbnail cell width at the current zoom.
    pub fn thumbnail_width(&self) -> u32 {
        self.settings.thumb_width(self.zoom)
    }

    /// # Errors
    ///
    /// Returns [`StitchError::DragInProgress`] while a drag is active.
    pub fn set_view_mode(&mut self, mode: ViewMode) -> Result<()> {
        self.ensure_idle()?;
        self.view_mode = mode;
        Ok(())
    }

    /// Switch between page and file view, returning the new mode.
    pub fn toggle_view_mode(&mut self) -> Result<ViewMode> {
        self.set_view_mode(self.view_mode.toggled())?;
        Ok(self.view_mode)
    }

    // Mutations

    /// Import `paths` and append their pages as one undoable step.
    ///
    /// Files that fail to import are reported in [`ImportReport::skipped`].
    /// When nothing was imported the list and history are unchanged. The
    /// returned report's pages are the entries as appended.
    pub async fn add_files(&mut self, paths: &[PathBuf]) -> Result<ImportReport> {
        self.ensure_idle()?;
        let mut report = self.importer.import_all(paths).await;
        if report.pages.is_empty() {
            return Ok(report);
        }

        let mut seen: HashSet<PageId> = self.pages.iter().map(|page| page.id.clone()).collect();
        for page in &mut report.pages {
            while seen.contains(&page.id) {
                debug!(id = %page.id, "regenerating colliding page id");
                page.id = PageId::generate(&page.filename, page.page_index);
            }
            seen.insert(page.id.clone());
        }

        self.history.save(&self.pages);
        self.pages.extend(report.pages.iter().cloned());
        Ok(report)
    }

    /// Delete a page or a whole group, returning the number of pages removed.
    pub fn delete(&mut self, target: Target) -> Result<usize> {
        self.ensure_idle()?;
        let ids = self.resolve(target)?;

        self.history.save(&self.pages);
        let before = self.pages.len();
        self.pages.retain(|page| !ids.contains(&page.id));
        Ok(before - self.pages.len())
    }

    /// Turn a page, or every member of a group, 90 degrees clockwise.
    pub fn rotate(&mut self, target: Target) -> Result<()> {
        self.ensure_idle()?;
        let ids = self.resolve(target)?;

        self.history.save(&self.pages);
        self.rotate_ids(&ids);
        Ok(())
    }

    /// Turn every page 90 degrees clockwise. A no-op on an empty list.
    pub fn rotate_all(&mut self) -> Result<()> {
        self.ensure_idle()?;
        if self.pages.is_empty() {
            return Ok(());
        }

        self.history.save(&self.pages);
        for page in &mut self.pages {
            page.rotate_clockwise();
        }
        Ok(())
    }

    /// Switch a page or group between portrait and landscape.
    ///
    /// Converted sources whose original file still exists are converted
    /// again with the opposite layout. Everything else, including a failed
    /// reconversion, is turned 90 degrees instead. Either way this is one
    /// undoable step.
    pub fn toggle_orientation(&mut self, target: Target) -> Result<OrientationOutcome> {
        self.ensure_idle()?;
        let ids = self.resolve(target)?;
        let Some(start) = self.position(&ids[0]) else {
            return Err(StitchError::other("target vanished from the list"));
        };
        let representative = self.pages[start].clone();

        self.history.save(&self.pages);

        if representative.is_generated && representative.original_source_path.exists() {
            match self.reconvert(&representative, start, ids.len(), target) {
                Ok(true) => return Ok(OrientationOutcome::Reconverted),
                Ok(false) => warn!(
                    source = %representative.original_source_path.display(),
                    page_index = representative.page_index,
                    "reconverted file lacks the page, rotating instead"
                ),
                Err(e) => warn!(
                    source = %representative.original_source_path.display(),
                    error = %e,
                    "reconversion failed, rotating instead"
                ),
            }
        }

        self.rotate_ids(&ids);
        Ok(OrientationOutcome::Rotated)
    }

    /// Replace the run `start..start + len` with pages from a fresh
    /// conversion. Returns false when a page target has no counterpart in
    /// the new file.
    ///
    /// Members past the end of the new file are dropped. Pages the new file
    /// adds are appended only when no page outside the run still shows the
    /// old file, since their content would repeat what those pages show.
    fn reconvert(
        &mut self,
        representative: &PageRef,
        start: usize,
        len: usize,
        target: Target,
    ) -> Result<bool> {
        let landscape = !representative.is_landscape_generated;
        let source = &representative.original_source_path;
        let new_path = self.importer.converter().convert(source, landscape)?;
        let info = self.reader.pdf_info(&new_path)?;

        let repoint = |page: &mut PageRef| {
            page.path = new_path.clone();
            page.is_landscape_generated = landscape;
            page.rotation = Rotation::None;
            if let Some(geometry) = info.pages.get(page.page_index) {
                page.is_portrait_original = geometry.is_portrait;
            }
        };

        match target {
            Target::Page(_) => {
                if representative.page_index >= info.page_count {
                    return Ok(false);
                }
                repoint(&mut self.pages[start]);
            }
            Target::Group(_) => {
                let run_range = start..start + len;
                let old_path = &representative.path;
                let shared = self
                    .pages
                    .iter()
                    .enumerate()
                    .any(|(i, page)| !run_range.contains(&i) && &page.path == old_path);

                let mut run: Vec<PageRef> = self.pages[run_range.clone()]
                    .iter()
                    .filter(|page| page.page_index < info.page_count)
                    .cloned()
                    .collect();
                run.iter_mut().for_each(repoint);

                if !shared {
                    let old_count = self
                        .reader
                        .pdf_info(old_path)
                        .map(|old| old.page_count)
                        .unwrap_or_else(|_| {
                            self.pages[run_range.clone()]
                                .iter()
                                .map(|page| page.page_index + 1)
                                .max()
                                .unwrap_or(0)
                        });

                    for (index, page_info) in info.pages.iter().enumerate().skip(old_count) {
                        let mut page =
                            PageRef::new(source, &new_path, index, page_info.is_portrait);
                        page.is_landscape_generated = landscape;
                        run.push(page);
                    }
                }

                debug!(
                    source = %source.display(),
                    old_pages = len,
                    new_pages = run.len(),
                    shared,
                    "reconciled reconverted group"
                );
                self.pages.splice(run_range, run);
            }
        }
        Ok(true)
    }

    /// Move item `from` to `to` in the current view.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        self.ensure_idle()?;
        let count = self.item_count();
        if from >= count {
            return Err(StitchError::index_out_of_range(from, count));
        }

        self.history.save(&self.pages);
        reorder::move_item(&mut self.pages, self.view_mode, from, to)
    }

    /// Start dragging item `index` of the current view.
    pub fn begin_drag(&mut self, index: usize) -> Result<()> {
        self.ensure_idle()?;
        self.drag = Some(DragState::begin(&self.pages, self.view_mode, index)?);
        Ok(())
    }

    /// Pointer moved over item `target`, or over nothing.
    ///
    /// Returns whether the list changed.
    pub fn drag_over(&mut self, target: Option<usize>) -> Result<bool> {
        match (&self.drag, target) {
            (Some(drag), Some(target)) => drag.drag_over(&mut self.pages, target),
            _ => Ok(false),
        }
    }

    /// Pointer moved to `point`; the item under it is found in `rects`, the
    /// on-screen cells of the current view in item order.
    ///
    /// Returns whether the list changed.
    pub fn drag_at(&mut self, point: (f32, f32), rects: &[Rect]) -> Result<bool> {
        self.drag_over(reorder::hit_test(rects, point))
    }

    /// Edge auto-scroll while dragging.
    ///
    /// Returns the scroll delta when the timer fires. Always `None` when no
    /// drag is active.
    pub fn drag_scroll(
        &mut self,
        now: Instant,
        pointer_y: f32,
        viewport_top: f32,
        viewport_height: f32,
    ) -> Option<f32> {
        self.drag.as_ref()?;
        self.scroll.poll(now, pointer_y, viewport_top, viewport_height)
    }

    /// Finish the drag, committing it as one undoable step.
    ///
    /// Returns whether anything moved. A drag that moved nothing leaves no
    /// history entry.
    pub fn end_drag(&mut self) -> bool {
        self.scroll.cancel();
        let Some(drag) = self.drag.take() else {
            return false;
        };
        if drag.snapshot() == self.pages.as_slice() {
            return false;
        }
        self.history.save_snapshot(drag.into_snapshot());
        true
    }

    /// Abandon the drag and restore the list as it was when it began.
    pub fn cancel_drag(&mut self) {
        self.scroll.cancel();
        if let Some(drag) = self.drag.take() {
            self.pages = drag.into_snapshot();
        }
    }

    /// Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool> {
        self.ensure_idle()?;
        Ok(self.history.undo(&mut self.pages))
    }

    /// Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool> {
        self.ensure_idle()?;
        Ok(self.history.redo(&mut self.pages))
    }

    // Output

    /// Merge the list and write it atomically to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::NoPagesToMerge`] for an empty list, or any
    /// load or write error. The target is never left half-written.
    pub async fn merge_to_path(&self, path: &Path) -> Result<MergeStatistics> {
        self.merger.merge_to_path(&self.pages, path).await
    }

    /// In-memory merge of the current list, `None` when it cannot be built.
    pub fn preview(&self) -> Option<Vec<u8>> {
        if self.pages.is_empty() {
            return None;
        }
        self.merger.merge_to_bytes(&self.pages)
    }

    /// Render every page of the merged list at the preview resolution.
    ///
    /// The merged document is written to `scratch` for the renderer to open.
    /// Rotations are already baked into the merged pages.
    ///
    /// # Errors
    ///
    /// Returns any merge, write or render error.
    pub fn render_preview(
        &self,
        renderer: &dyn PageRenderer,
        scratch: &Path,
    ) -> Result<Vec<RgbaImage>> {
        let merged = self.merger.merge_document(&self.pages)?;
        let count = merged.statistics.total_pages;
        PdfWriter::new().save_blocking(merged.document, scratch)?;

        debug!(pages = count, dpi = self.settings.preview_dpi, "rendering preview");
        (0..count)
            .map(|index| {
                renderer.render_page(scratch, index, Rotation::None, self.settings.preview_dpi)
            })
            .collect()
    }

    /// Thumbnail of item `index` of the current view at `width` pixels.
    ///
    /// Groups show their first member. Render failures yield `None`.
    pub fn thumbnail(
        &mut self,
        index: usize,
        width: u32,
        renderer: &dyn PageRenderer,
    ) -> Option<Arc<RgbaImage>> {
        let id = self.resolve(self.target(index)).ok()?.into_iter().next()?;
        let page = self.pages.iter().find(|page| page.id == id)?;

        let key = ThumbnailKey {
            id,
            path: page.path.clone(),
            rotation: page.rotation,
            width,
        };
        let settings = &self.settings;
        self.thumbnails.get_or_insert_with(key, || {
            match renderer.render_page(
                &page.path,
                page.page_index,
                page.rotation,
                settings.thumbnail_dpi,
            ) {
                Ok(image) => Some(fit_thumbnail(
                    &image,
                    width,
                    settings.thumb_height(width),
                    settings.thumb_inset,
                )),
                Err(e) => {
                    warn!(path = %page.path.display(), page_index = page.page_index, error = %e, "thumbnail render failed");
                    None
                }
            }
        })
    }

    // Helpers

    fn ensure_idle(&self) -> Result<()> {
        if self.drag.is_some() {
            return Err(StitchError::DragInProgress);
        }
        Ok(())
    }

    /// Ids of the pages a target covers, in list order.
    fn resolve(&self, target: Target) -> Result<Vec<PageId>> {
        match target {
            Target::Page(index) => self
                .pages
                .get(index)
                .map(|page| vec![page.id.clone()])
                .ok_or_else(|| StitchError::index_out_of_range(index, self.pages.len())),
            Target::Group(index) => {
                let groups = derive_groups(&self.pages);
                groups
                    .get(index)
                    .map(Group::ids)
                    .ok_or_else(|| StitchError::index_out_of_range(index, groups.len()))
            }
        }
    }

    fn position(&self, id: &PageId) -> Option<usize> {
        self.pages.iter().position(|page| &page.id == id)
    }

    fn rotate_ids(&mut self, ids: &[PageId]) {
        for page in self.pages.iter_mut().filter(|page| ids.contains(&page.id)) {
            page.rotate_clockwise();
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("pages", &self.pages.len())
            .field("view_mode", &self.view_mode)
            .field("undo", &self.history.undo_len())
            .field("redo", &self.history.redo_len())
            .field("dragging", &self.drag.is_some())
            .finish_non_exhaustive()
    }
}
