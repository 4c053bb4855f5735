use crate::object::ObjectRef;

use super::{CellCache, Section};

/// Presents the members of one object, grouped into sections.
#[derive(Debug)]
pub struct ViewSource {
    /// Screen caption.
    pub caption: String,
    /// The object whose members are shown.
    pub object: ObjectRef,
    /// Sections in display order.
    pub sections: Vec<Section>,
    pub(crate) cells: CellCache,
}

impl ViewSource {
    /// A source over `object` with no sections yet.
    pub fn new(caption: impl Into<String>, object: ObjectRef) -> Self {
        Self {
            caption: caption.into(),
            object,
            sections: Vec::new(),
            cells: CellCache::default(),
        }
    }

    /// Cached cells.
    pub fn cells(&self) -> &CellCache {
        &self.cells
    }
}
