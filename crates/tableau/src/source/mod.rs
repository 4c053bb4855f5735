//! Data sources: what rows and sections exist and how selection mutates state.
//!
//! Every source of a presentation session lives in one [`SourceArena`]. A
//! [`ViewSource`] presents the members of an object in sections; a
//! [`ListSource`] presents a collection and owns the selection state for it.
//! Nested sources refer to their parents by [`SourceId`], never by reference.

mod arena;
mod list;
mod section;
mod view;

use std::collections::HashMap;

pub use arena::{RowTarget, Source, SourceArena, SourceId, SourceNode};
pub(crate) use list::Mirror;
pub use list::{ListSource, Reload, RowEditing, SelectResult, SelectionOutcome};
pub use section::{MemberRow, Section, SectionRows};
pub use view::ViewSource;

use crate::template::{Cell, CellKey, CellTemplate};

/// Cells handed out by a source, keyed by reuse key.
///
/// Asking twice for the same logical row returns the same cached cell,
/// refreshed with the row's current contents.
#[derive(Debug, Default)]
pub struct CellCache {
    cells: HashMap<CellKey, Cell>,
    created: usize,
}

impl CellCache {
    /// The cell for `key`, created on first use. Contents are reset to the
    /// defaults so the caller can fill them in.
    pub(crate) fn checkout(&mut self, key: CellKey, template: &CellTemplate) -> &mut Cell {
        let created = &mut self.created;
        let cell = self.cells.entry(key).or_insert_with(|| {
            *created += 1;
            Cell::new(key, template.clone(), "")
        });
        *cell = Cell::new(key, template.clone(), "");
        cell
    }

    /// Number of cached cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no cell has been handed out.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of cells constructed so far. Stays constant while rows are
    /// re-rendered.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Drop every cached cell.
    pub fn clear(&mut self) {
        self.cells.clear();
    }
}
