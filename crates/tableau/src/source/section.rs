use std::collections::HashMap;

use crate::command::Command;
use crate::member::MemberDescriptor;
use crate::registry::ViewType;
use crate::template::CellTemplate;
use crate::value::ValueList;

use super::SourceId;

/// One section of a source.
#[derive(Debug, Clone)]
pub struct Section {
    /// Header text.
    pub header: Option<String>,
    /// Footer text.
    pub footer: Option<String>,
    /// The rows: object members or collection elements, never both.
    pub rows: SectionRows,
    /// Candidate views per cell key (member name or element type name).
    pub view_types: HashMap<String, Vec<ViewType>>,
}

impl Section {
    /// An empty member section.
    pub fn members(header: Option<String>, footer: Option<String>) -> Self {
        Self {
            header,
            footer,
            rows: SectionRows::Members(Vec::new()),
            view_types: HashMap::new(),
        }
    }

    /// A section over `collection`.
    pub fn collection(collection: ValueList) -> Self {
        Self {
            header: None,
            footer: None,
            rows: SectionRows::Collection(collection),
            view_types: HashMap::new(),
        }
    }

    /// Add candidate views for `key`, skipping ones already present.
    pub fn add_view_types(&mut self, key: impl Into<String>, views: &[ViewType]) {
        let list = self.view_types.entry(key.into()).or_default();
        for view in views {
            if !list.contains(view) {
                list.push(view.clone());
            }
        }
    }

    /// Member rows, if this is an object section.
    pub fn member_rows(&self) -> Option<&[MemberRow]> {
        match &self.rows {
            SectionRows::Members(rows) => Some(rows),
            SectionRows::Collection(_) => None,
        }
    }

    /// Mutable member rows, if this is an object section.
    pub fn member_rows_mut(&mut self) -> Option<&mut Vec<MemberRow>> {
        match &mut self.rows {
            SectionRows::Members(rows) => Some(rows),
            SectionRows::Collection(_) => None,
        }
    }

    /// The bound collection, if this is a collection section.
    pub fn collection_rows(&self) -> Option<&ValueList> {
        match &self.rows {
            SectionRows::Collection(list) => Some(list),
            SectionRows::Members(_) => None,
        }
    }
}

/// Row content of a [`Section`].
#[derive(Debug, Clone)]
pub enum SectionRows {
    /// Members of an object, in display order.
    Members(Vec<MemberRow>),
    /// Elements of a bound collection.
    Collection(ValueList),
}

/// One member placed in a section.
#[derive(Debug, Clone)]
pub struct MemberRow {
    /// The member.
    pub member: MemberDescriptor,
    /// Template used when the member occupies a single row.
    pub template: CellTemplate,
    /// Nested list source for collection and enum members.
    pub list: Option<SourceId>,
    /// Command for method members.
    pub command: Option<Command>,
    /// A background command started from this row is running.
    pub busy: bool,
}
