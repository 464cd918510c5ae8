// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF editor — load, merge, rotate, delete, reorder and read existing PDF
// documents using the `lopdf` crate.

use std::collections::HashSet;

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use toolghor_core::error::{Result, ToolghorError};
use tracing::{debug, info, instrument, warn};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic /Parent chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// Edits an in-memory PDF document.
///
/// Wraps `lopdf::Document`. Page numbers handed to callers are 0-based
/// indices; lopdf's own page numbers are 1-based and stay internal.
pub struct PdfEditor {
    /// The underlying lopdf document.
    document: Document,
}

impl PdfEditor {
    // -- Construction ---------------------------------------------------------

    /// Load a PDF from raw bytes.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|err| ToolghorError::Pdf(format!("failed to load PDF: {err}")))?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document })
    }

    /// Concatenate several documents, keeping every page of each in order.
    #[instrument(skip_all, fields(documents = documents.len()))]
    pub fn merge(documents: Vec<PdfEditor>) -> Result<Self> {
        if documents.is_empty() {
            return Err(ToolghorError::Pdf("nothing to merge".into()));
        }
        let sources = documents
            .into_iter()
            .map(|editor| {
                let count = editor.page_count();
                (editor.document, (0..count).collect())
            })
            .collect();
        let merged = assemble(sources)?;
        info!(pages = merged.get_pages().len(), "Merge complete");
        Ok(Self { document: merged })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Borrow the underlying lopdf document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Text layer of every page, in page order. Pages whose content cannot
    /// be decoded contribute an empty string.
    pub fn page_text(&self) -> Vec<String> {
        self.document
            .get_pages()
            .into_keys()
            .map(|page_number| {
                self.document
                    .extract_text(&[page_number])
                    .unwrap_or_else(|err| {
                        warn!(page_number, %err, "Text extraction failed for page");
                        String::new()
                    })
                    .trim_end()
                    .to_string()
            })
            .collect()
    }

    // -- Mutation -------------------------------------------------------------

    /// Set the absolute `/Rotate` of every page. `degrees` must be a
    /// multiple of 90.
    #[instrument(skip(self))]
    pub fn set_rotation(&mut self, degrees: u16) -> Result<()> {
        if degrees % 90 != 0 {
            return Err(ToolghorError::Pdf(format!(
                "rotation must be a multiple of 90, got {degrees}"
            )));
        }
        let rotation = i64::from(degrees % 360);

        for page_id in self.document.get_pages().into_values() {
            let page = self
                .document
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(|err| {
                    ToolghorError::Pdf(format!("cannot edit page object {page_id:?}: {err}"))
                })?;
            page.set("Rotate", rotation);
        }

        debug!(rotation, pages = self.page_count(), "Pages rotated");
        Ok(())
    }

    /// Remove a single page by 0-based index. Later pages shift down by one.
    pub fn remove_page(&mut self, index: usize) -> Result<()> {
        let total = self.page_count();
        if index >= total {
            return Err(ToolghorError::Pdf(format!(
                "page index {index} out of range (document has {total} pages)"
            )));
        }
        self.document.delete_pages(&[index as u32 + 1]);
        debug!(index, remaining = self.page_count(), "Page removed");
        Ok(())
    }

    /// Build a new document from the given 0-based page indices, in order.
    #[instrument(skip(self), fields(count = indices.len()))]
    pub fn copy_pages(self, indices: &[usize]) -> Result<Self> {
        let document = assemble(vec![(self.document, indices.to_vec())])?;
        Ok(Self { document })
    }

    // -- Output ---------------------------------------------------------------

    /// Serialise the document.
    pub fn to_bytes(mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.document
            .save_to(&mut output)
            .map_err(|err| ToolghorError::Pdf(format!("failed to serialise PDF: {err}")))?;
        Ok(output)
    }
}

// -- Page tree assembly -------------------------------------------------------

/// Build a fresh document whose page tree holds the selected pages of each
/// source, in order.
///
/// Sources are renumbered into disjoint object id ranges, their catalogs and
/// page tree nodes are dropped, and the selected pages are re-parented under
/// one new /Pages node. Objects left unreachable are pruned.
fn assemble(sources: Vec<(Document, Vec<usize>)>) -> Result<Document> {
    let mut output = Document::with_version("1.5");
    let pages_id = output.new_object_id();
    let mut next_id = pages_id.0 + 1;
    let mut kids: Vec<ObjectId> = Vec::new();

    for (mut source, indices) in sources {
        flatten_inherited(&mut source);
        source.renumber_objects_with(next_id);
        next_id = source.max_id + 1;

        let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
        for &index in &indices {
            let page_id = *page_ids.get(index).ok_or_else(|| {
                ToolghorError::Pdf(format!(
                    "page index {index} out of range (document has {} pages)",
                    page_ids.len()
                ))
            })?;
            kids.push(page_id);
        }

        for (id, object) in source.objects {
            if matches!(type_name(&object), Some(b"Catalog" | b"Pages")) {
                continue;
            }
            output.objects.insert(id, object);
        }
    }
    output.max_id = next_id - 1;

    // A page selected twice needs its own object: one node, one parent.
    let mut seen = HashSet::new();
    for kid in kids.iter_mut() {
        if !seen.insert(*kid) {
            let copy = output
                .get_object(*kid)
                .map_err(|err| ToolghorError::Pdf(format!("missing page {kid:?}: {err}")))?
                .clone();
            *kid = output.add_object(copy);
        }
    }

    for kid in &kids {
        let page = output
            .get_object_mut(*kid)
            .and_then(Object::as_dict_mut)
            .map_err(|err| ToolghorError::Pdf(format!("page {kid:?} is not a dictionary: {err}")))?;
        page.set("Parent", pages_id);
    }

    output.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
        }),
    );
    let catalog_id = output.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    output.trailer.set("Root", catalog_id);
    output.prune_objects();

    Ok(output)
}

/// Copy attributes a page inherits from its ancestors onto the page itself,
/// so the page survives being moved under a different parent.
fn flatten_inherited(doc: &mut Document) {
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

    for page_id in page_ids {
        let mut inherited: Vec<(&[u8], Object)> = Vec::new();
        if let Ok(page) = doc.get_dictionary(page_id) {
            let mut parent = parent_of(page);
            let mut depth = 0;
            while let Some(parent_id) = parent {
                let Ok(node) = doc.get_dictionary(parent_id) else {
                    break;
                };
                for key in INHERITABLE {
                    if page.has(key) || inherited.iter().any(|(k, _)| *k == key) {
                        continue;
                    }
                    if let Ok(value) = node.get(key) {
                        inherited.push((key, value.clone()));
                    }
                }
                depth += 1;
                if depth >= MAX_TREE_DEPTH {
                    warn!(?page_id, "Page tree too deep, stopping inheritance walk");
                    break;
                }
                parent = parent_of(node);
            }
        }

        if inherited.is_empty() {
            continue;
        }
        if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
            for (key, value) in inherited {
                page.set(key, value);
            }
        }
    }
}

fn parent_of(node: &Dictionary) -> Option<ObjectId> {
    node.get(b"Parent").and_then(Object::as_reference).ok()
}

/// The `/Type` name of a dictionary object, if any.
fn type_name(object: &Object) -> Option<&[u8]> {
    match object {
        Object::Dictionary(dict) => match dict.get(b"Type") {
            Ok(Object::Name(name)) => Some(name.as_slice()),
            _ => None,
        },
        _ => None,
    }
}
