//! Ownership of every source in a session.
//!
//! Sources form a tree: a view source owns the list sources of its collection
//! members, a list source owns the nested lists and detail screens it pushed.
//! Destroying a source destroys its subtree.

use slotmap::{SlotMap, new_key_type};
use tableau_core::logging::targets;

use crate::error::{BindError, BindResult};
use crate::member::MemberKind;
use crate::template::{Accessory, Cell, CellKey, CellTemplate, SelectionStyle};

use super::{ListSource, MemberRow, Section, ViewSource};

new_key_type! {
    /// Handle to a source in a [`SourceArena`].
    ///
    /// Ids stay valid until the source is destroyed.
    pub struct SourceId;
}

/// Either kind of source.
#[derive(Debug)]
pub enum Source {
    /// Members of an object.
    View(ViewSource),
    /// A collection.
    List(ListSource),
}

impl Source {
    /// Screen caption.
    pub fn caption(&self) -> &str {
        match self {
            Self::View(view) => &view.caption,
            Self::List(list) => list.caption(),
        }
    }

    /// The view source, if this is one.
    pub fn as_view(&self) -> Option<&ViewSource> {
        match self {
            Self::View(view) => Some(view),
            Self::List(_) => None,
        }
    }

    /// The list source, if this is one.
    pub fn as_list(&self) -> Option<&ListSource> {
        match self {
            Self::List(list) => Some(list),
            Self::View(_) => None,
        }
    }

    /// Short kind name for logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::View(_) => "view",
            Self::List(_) => "list",
        }
    }
}

impl From<ViewSource> for Source {
    fn from(view: ViewSource) -> Self {
        Self::View(view)
    }
}

impl From<ListSource> for Source {
    fn from(list: ListSource) -> Self {
        Self::List(list)
    }
}

/// A source and its place in the tree.
#[derive(Debug)]
pub struct SourceNode {
    /// The source.
    pub source: Source,
    parent: Option<SourceId>,
    children: Vec<SourceId>,
}

impl SourceNode {
    /// Parent source.
    pub fn parent(&self) -> Option<SourceId> {
        self.parent
    }

    /// Child sources in creation order.
    pub fn children(&self) -> &[SourceId] {
        &self.children
    }
}

/// What a row of a source refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowTarget {
    /// A single-row member of a view source.
    Member {
        /// Section index.
        section: usize,
        /// Index into the section's member rows.
        index: usize,
    },
    /// A row of a list source, possibly nested inside a view section.
    List {
        /// The list.
        id: SourceId,
        /// Row within the list.
        row: usize,
    },
}

/// Every live source of a session.
#[derive(Debug, Default)]
pub struct SourceArena {
    nodes: SlotMap<SourceId, SourceNode>,
}

impl SourceArena {
    /// An empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `source` under `parent`.
    pub fn insert(&mut self, source: impl Into<Source>, parent: Option<SourceId>) -> SourceId {
        let source = source.into();
        let kind = source.kind_name();
        let parent = parent.filter(|p| self.nodes.contains_key(*p));
        let id = self.nodes.insert(SourceNode {
            source,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.push(id);
        }
        tracing::trace!(target: targets::SOURCE, ?id, ?parent, kind, "source created");
        id
    }

    /// Whether `id` is live.
    pub fn contains(&self, id: SourceId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live sources.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether there are no sources.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node for `id`.
    pub fn node(&self, id: SourceId) -> Option<&SourceNode> {
        self.nodes.get(id)
    }

    /// The source for `id`.
    pub fn get(&self, id: SourceId) -> Option<&Source> {
        self.nodes.get(id).map(|n| &n.source)
    }

    /// Mutable source for `id`.
    pub fn get_mut(&mut self, id: SourceId) -> Option<&mut Source> {
        self.nodes.get_mut(id).map(|n| &mut n.source)
    }

    /// The view source for `id`.
    pub fn view(&self, id: SourceId) -> Option<&ViewSource> {
        self.get(id).and_then(Source::as_view)
    }

    /// Mutable view source for `id`.
    pub fn view_mut(&mut self, id: SourceId) -> Option<&mut ViewSource> {
        match self.get_mut(id) {
            Some(Source::View(view)) => Some(view),
            _ => None,
        }
    }

    /// The list source for `id`.
    pub fn list(&self, id: SourceId) -> Option<&ListSource> {
        self.get(id).and_then(Source::as_list)
    }

    /// Mutable list source for `id`.
    pub fn list_mut(&mut self, id: SourceId) -> Option<&mut ListSource> {
        match self.get_mut(id) {
            Some(Source::List(list)) => Some(list),
            _ => None,
        }
    }

    /// Parent of `id`.
    pub fn parent(&self, id: SourceId) -> Option<SourceId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Sources without a parent.
    pub fn roots(&self) -> Vec<SourceId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    /// Move `id` under `parent`. `None` makes it a root.
    pub fn set_parent(&mut self, id: SourceId, parent: Option<SourceId>) -> BindResult<()> {
        if !self.nodes.contains_key(id) {
            return Err(unknown(id));
        }
        if let Some(parent) = parent {
            if !self.nodes.contains_key(parent) {
                return Err(unknown(parent));
            }
            if self.is_ancestor_of(id, parent) {
                return Err(BindError::CircularSource(format!("{id:?} -> {parent:?}")));
            }
        }

        if let Some(old) = self.nodes.get(id).and_then(|n| n.parent) {
            if let Some(old) = self.nodes.get_mut(old) {
                old.children.retain(|&child| child != id);
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = parent;
        }
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.push(id);
        }
        Ok(())
    }

    fn is_ancestor_of(&self, ancestor: SourceId, id: SourceId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Remove `id` and its subtree. Returns the number of sources removed.
    #[tracing::instrument(skip(self), target = "tableau::source", level = "trace")]
    pub fn destroy(&mut self, id: SourceId) -> BindResult<usize> {
        let descendants = self.collect_descendants(id)?;
        tracing::trace!(target: targets::SOURCE, ?id, descendant_count = descendants.len(), "destroying source tree");

        if let Some(parent) = self.parent(id) {
            if let Some(node) = self.nodes.get_mut(parent) {
                node.children.retain(|&child| child != id);
                if let Source::List(list) = &mut node.source {
                    list.forget_child(id);
                }
            }
        }

        let removed = descendants.len() + 1;
        for child in descendants {
            self.nodes.remove(child);
        }
        self.nodes.remove(id);
        Ok(removed)
    }

    fn collect_descendants(&self, id: SourceId) -> BindResult<Vec<SourceId>> {
        let mut result = Vec::new();
        self.collect_descendants_recursive(id, &mut result)?;
        Ok(result)
    }

    fn collect_descendants_recursive(&self, id: SourceId, result: &mut Vec<SourceId>) -> BindResult<()> {
        let node = self.nodes.get(id).ok_or_else(|| unknown(id))?;
        for &child in &node.children {
            self.collect_descendants_recursive(child, result)?;
            result.push(child);
        }
        Ok(())
    }

    /// Drop every source.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Iterate over live sources.
    pub fn iter(&self) -> impl Iterator<Item = (SourceId, &SourceNode)> {
        self.nodes.iter()
    }

    /// Number of sections of `id`.
    pub fn section_count(&self, id: SourceId) -> usize {
        match self.get(id) {
            Some(Source::View(view)) => view.sections.len(),
            Some(Source::List(_)) => 1,
            None => 0,
        }
    }

    fn section(&self, id: SourceId, section: usize) -> Option<&Section> {
        match self.get(id)? {
            Source::View(view) => view.sections.get(section),
            Source::List(list) => (section == 0).then(|| list.section()),
        }
    }

    /// Header text of a section.
    pub fn header(&self, id: SourceId, section: usize) -> Option<&str> {
        self.section(id, section)?.header.as_deref()
    }

    /// Footer text of a section.
    pub fn footer(&self, id: SourceId, section: usize) -> Option<&str> {
        self.section(id, section)?.footer.as_deref()
    }

    /// Rows a member occupies: a list member shows the list's rows, anything
    /// else one row.
    fn member_span(&self, row: &MemberRow) -> usize {
        match row.list.and_then(|id| self.list(id)) {
            Some(list) => list.row_count(),
            None => 1,
        }
    }

    /// Number of rows in a section of `id`.
    pub fn row_count(&self, id: SourceId, section: usize) -> usize {
        match self.get(id) {
            Some(Source::View(view)) => view
                .sections
                .get(section)
                .and_then(Section::member_rows)
                .map_or(0, |rows| rows.iter().map(|r| self.member_span(r)).sum()),
            Some(Source::List(list)) if section == 0 => list.row_count(),
            _ => 0,
        }
    }

    /// What `row` of `section` refers to.
    pub fn resolve_row(&self, id: SourceId, section: usize, row: usize) -> Option<RowTarget> {
        match self.get(id)? {
            Source::List(list) => {
                (section == 0 && row < list.row_count()).then_some(RowTarget::List { id, row })
            }
            Source::View(view) => {
                let rows = view.sections.get(section)?.member_rows()?;
                let mut start = 0;
                for (index, member) in rows.iter().enumerate() {
                    let span = self.member_span(member);
                    if row < start + span {
                        return Some(match member.list {
                            Some(list) if self.contains(list) => RowTarget::List {
                                id: list,
                                row: row - start,
                            },
                            _ => RowTarget::Member { section, index },
                        });
                    }
                    start += span;
                }
                None
            }
        }
    }

    /// Height of a row, falling back to `default`.
    pub fn row_height(&self, id: SourceId, section: usize, row: usize, default: f32) -> f32 {
        let height = match self.resolve_row(id, section, row) {
            Some(RowTarget::List { id: list, .. }) => self.list(list).and_then(ListSource::row_height),
            Some(RowTarget::Member { section, index }) => self
                .view(id)
                .and_then(|v| v.sections.get(section))
                .and_then(Section::member_rows)
                .and_then(|rows| rows.get(index))
                .and_then(|row| {
                    row.member
                        .row_height
                        .or_else(|| row.member.view_types.iter().find_map(|v| v.row_height()))
                }),
            None => None,
        };
        height.unwrap_or(default)
    }

    /// Render a row.
    pub fn cell(&mut self, id: SourceId, section: usize, row: usize) -> Option<Cell> {
        match self.resolve_row(id, section, row)? {
            RowTarget::List { id: list, row: local } => {
                self.list_mut(list)?.render_cell(local, section, row)
            }
            RowTarget::Member { section, index } => {
                let view = self.view_mut(id)?;
                let ViewSource { sections, cells, .. } = view;
                let member_row = sections.get(section)?.member_rows()?.get(index)?;
                Some(render_member(member_row, cells, section, row))
            }
        }
    }
}

fn unknown(id: SourceId) -> BindError {
    BindError::UnknownSource(format!("{id:?}"))
}

fn render_member(row: &MemberRow, cells: &mut super::CellCache, section: usize, key_row: usize) -> Cell {
    let member = &row.member;
    let key = CellKey {
        template: row.template.id(),
        section,
        row: key_row,
    };
    let cell = cells.checkout(key, &row.template);
    cell.text = member.caption.clone();
    cell.busy = row.busy;

    match &row.template {
        CellTemplate::LoadMore(options) => {
            cell.text = if row.busy {
                options.loading_caption.clone()
            } else {
                options.normal_caption.clone()
            };
            cell.selection_style = if row.busy {
                SelectionStyle::None
            } else {
                SelectionStyle::Highlight
            };
        }
        CellTemplate::Entry(_) => {
            cell.detail = Some(member.value().to_string());
            cell.editable = member.editable;
        }
        CellTemplate::Toggle => {
            cell.detail = Some(member.value().to_string());
            cell.editable = member.editable;
            cell.selection_style = SelectionStyle::Highlight;
        }
        CellTemplate::Button => cell.selection_style = SelectionStyle::Highlight,
        _ => {
            if !member.kind().is_method() {
                let value = member.value();
                if !value.is_none() {
                    cell.detail = Some(value.to_string());
                }
            }
            if matches!(member.kind(), MemberKind::Object) {
                cell.accessory = Accessory::Disclosure;
                cell.selection_style = SelectionStyle::Highlight;
            }
        }
    }

    if let Some(command) = &row.command {
        cell.enabled = command.is_enabled() && !row.busy;
        cell.visible = command.is_visible();
        cell.selection_style = SelectionStyle::Highlight;
    }
    cell.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Value, ValueList};

    fn list(caption: &str) -> ListSource {
        ListSource::new(caption, ["a", "b"].into_iter().collect::<ValueList>())
    }

    #[test]
    fn test_destroy_cascades() {
        let mut arena = SourceArena::new();
        let root = arena.insert(list("root"), None);
        let child = arena.insert(list("child"), Some(root));
        let grandchild = arena.insert(list("grandchild"), Some(child));
        let sibling = arena.insert(list("sibling"), Some(root));

        assert_eq!(arena.destroy(child), Ok(2));
        assert!(!arena.contains(grandchild));
        assert_eq!(arena.node(root).unwrap().children(), &[sibling]);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_destroy_unknown() {
        let mut arena = SourceArena::new();
        let id = arena.insert(list("gone"), None);
        arena.destroy(id).unwrap();
        assert!(matches!(arena.destroy(id), Err(BindError::UnknownSource(_))));
    }

    #[test]
    fn test_set_parent_rejects_cycles() {
        let mut arena = SourceArena::new();
        let a = arena.insert(list("a"), None);
        let b = arena.insert(list("b"), Some(a));
        assert!(matches!(arena.set_parent(a, Some(b)), Err(BindError::CircularSource(_))));
        arena.set_parent(b, None).unwrap();
        assert_eq!(arena.roots().len(), 2);
    }

    #[test]
    fn test_destroy_forgets_memoized_child() {
        let mut arena = SourceArena::new();
        let parent = arena.insert(list("parent"), None);
        let items = arena.list(parent).unwrap().items();
        let child_source = arena.list(parent).unwrap().navigation_child(items.clone(), None);
        let child = arena.insert(child_source, Some(parent));
        arena.list_mut(parent).unwrap().remember_child(items.clone(), child);

        arena.destroy(child).unwrap();
        assert_eq!(arena.list(parent).unwrap().child_for(&items), None);
    }

    #[test]
    fn test_list_root_rows() {
        let mut arena = SourceArena::new();
        let id = arena.insert(list("letters"), None);
        assert_eq!(arena.section_count(id), 1);
        assert_eq!(arena.row_count(id, 0), 2);
        assert_eq!(arena.row_count(id, 1), 0);
        assert_eq!(arena.resolve_row(id, 0, 1), Some(RowTarget::List { id, row: 1 }));
        assert_eq!(arena.resolve_row(id, 0, 2), None);
        assert_eq!(arena.cell(id, 0, 0).map(|c| c.text), Some("a".to_string()));
        assert_eq!(arena.row_height(id, 0, 0, 44.0), 44.0);
        assert!(arena.list(id).unwrap().selected_item() == &Value::None);
    }
}
