//! Page copying between documents.
//!
//! This module builds the output document page by page:
//! - Inherited page attributes are resolved onto each copied page
//! - Referenced objects are deep-copied once per source document
//! - Page rotation is composed with the source page's own `/Rotate`

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{Result, StitchError};
use crate::io::LoadedPdf;
use crate::io::reader::inherited_attribute;
use crate::model::Rotation;

/// Page attributes a page may inherit from the pages tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Object id mapping from one source document into the output.
type CopyCache = HashMap<ObjectId, ObjectId>;

/// Output rotation for a page stored at `stored` degrees with `rotation`
/// applied on top.
pub fn compose_rotation(stored: i64, rotation: Rotation) -> i64 {
    (stored + i64::from(rotation.degrees())).rem_euclid(360)
}

/// Copies pages from loaded source documents into a fresh output document.
///
/// Objects shared between pages of the same source (fonts, images) are
/// copied once and stay shared in the output.
pub struct PageCopier {
    output: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    caches: HashMap<PathBuf, CopyCache>,
}

impl PageCopier {
    /// Create a copier with an empty output document.
    pub fn new() -> Self {
        let mut output = Document::with_version("1.5");
        let pages_id = output.new_object_id();
        Self {
            output,
            pages_id,
            kids: Vec::new(),
            caches: HashMap::new(),
        }
    }

    /// Number of pages copied so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append page `page_index` of `source`, rotated by `rotation`.
    ///
    /// Returns `Ok(false)` without touching the output when the index is
    /// past the end of the source.
    ///
    /// # Errors
    ///
    /// Returns an error if the source page object is not a dictionary.
    pub fn copy_page(
        &mut self,
        source: &LoadedPdf,
        page_index: usize,
        rotation: Rotation,
    ) -> Result<bool> {
        let Some(page_id) = source.page_id(page_index) else {
            return Ok(false);
        };

        let doc = &source.document;
        let page = doc.get_dictionary(page_id).map_err(|e| {
            StitchError::corrupted_pdf(
                source.path.clone(),
                format!("page {} is not a dictionary: {e}", page_index + 1),
            )
        })?;

        let new_page_id = self.output.new_object_id();
        let cache = self.caches.entry(source.path.clone()).or_default();
        // Back-references to the page itself (annotation /P) resolve to the copy.
        cache.insert(page_id, new_page_id);

        let mut new_page = Dictionary::new();
        for (key, value) in page.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            new_page.set(key.clone(), copy_object_deep(&mut self.output, doc, value, cache));
        }

        for key in INHERITABLE_KEYS {
            if new_page.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(doc, page_id, key) {
                new_page.set(key.to_vec(), copy_object_deep(&mut self.output, doc, &value, cache));
            }
        }

        let stored = new_page
            .get(b"Rotate")
            .ok()
            .map(|r| resolve_integer(&self.output, r))
            .unwrap_or(0);
        new_page.set("Rotate", compose_rotation(stored, rotation));
        new_page.set("Parent", self.pages_id);

        self.output.objects.insert(new_page_id, Object::Dictionary(new_page));
        self.kids.push(new_page_id.into());
        Ok(true)
    }

    /// Close the pages tree and return the output document.
    pub fn finish(mut self) -> Document {
        let count = self.kids.len() as i64;
        self.output.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.output.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.output.trailer.set("Root", catalog_id);
        self.output
    }
}

impl Default for PageCopier {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_integer(doc: &Document, object: &Object) -> i64 {
    let object = match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    };
    match object {
        Object::Integer(i) => *i,
        Object::Real(r) => *r as i64,
        _ => 0,
    }
}

/// Deep copy `obj` from `source` into `output`.
///
/// Each referenced object is copied once; the id is reserved before
/// recursing so reference cycles terminate. Dangling references and
/// references into the source pages tree become `null`.
pub fn copy_object_deep(
    output: &mut Document,
    source: &Document,
    obj: &Object,
    cache: &mut CopyCache,
) -> Object {
    match obj {
        Object::Reference(id) => {
            if let Some(&new_id) = cache.get(id) {
                return Object::Reference(new_id);
            }

            let Ok(referenced) = source.get_object(*id) else {
                return Object::Null;
            };
            if is_pages_node(referenced) {
                return Object::Null;
            }

            let new_id = output.new_object_id();
            cache.insert(*id, new_id);
            let copied = copy_object_deep(output, source, referenced, cache);
            output.objects.insert(new_id, copied);

            Object::Reference(new_id)
        }
        Object::Dictionary(dict) => Object::Dictionary(copy_dictionary(output, source, dict, cache)),
        Object::Array(arr) => Object::Array(
            arr.iter()
                .map(|item| copy_object_deep(output, source, item, cache))
                .collect(),
        ),
        Object::Stream(stream) => {
            let dict = copy_dictionary(output, source, &stream.dict, cache);
            let mut copy = Stream::new(dict, stream.content.clone());
            copy.allows_compression = stream.allows_compression;
            Object::Stream(copy)
        }
        _ => obj.clone(),
    }
}

fn copy_dictionary(
    output: &mut Document,
    source: &Document,
    dict: &Dictionary,
    cache: &mut CopyCache,
) -> Dictionary {
    let is_page = dict
        .get(b"Type")
        .and_then(Object::as_name)
        .is_ok_and(|name| name == b"Page");

    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        // Pages reached indirectly are detached from the source tree.
        if is_page && key.as_slice() == b"Parent" {
            continue;
        }
        new_dict.set(key.clone(), copy_object_deep(output, source, value, cache));
    }
    new_dict
}

fn is_pages_node(object: &Object) -> bool {
    object
        .as_dict()
        .and_then(|dict| dict.get(b"Type"))
        .and_then(Object::as_name)
        .is_ok_and(|name| name == b"Pages")
}
