use std::sync::Arc;

use tableau_core::logging::targets;

use crate::command::{Command, CommandOption, check_bool};
use crate::error::{BindError, BindResult};
use crate::member::{
    CellEditing, DisplayMode, EditingStyle, ListOptions, MemberDef, MemberDescriptor,
    SelectionAction, UnselectionBehavior,
};
use crate::object::ObjectRef;
use crate::registry::ViewType;
use crate::template::{Accessory, Cell, CellKey, CellTemplate, SelectionStyle};
use crate::value::{Value, ValueList};

use super::{CellCache, Section, SourceId};

/// What a selection did.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    /// Nothing happened: the row does not exist, or it is busy or inert.
    Ignored,
    /// The selection changed. `item` is the selected item afterwards.
    Selected {
        /// Selected item after the change.
        item: Value,
    },
    /// A collapsible list was collapsed or expanded.
    Toggled {
        /// Whether the list is collapsed now.
        collapsed: bool,
    },
    /// The owning controller should handle the selection.
    Custom {
        /// Selected element.
        item: Value,
        /// Row tapped.
        row: usize,
    },
    /// Drill down into a nested collection.
    NavigateToList {
        /// The collection to present.
        collection: ValueList,
        /// Caption for the new screen.
        caption: String,
    },
    /// Present a detail view over an element.
    NavigateToView {
        /// The element.
        item: Value,
        /// Configured detail view. `None` resolves through the registry.
        view: Option<ViewType>,
    },
    /// A new screen was pushed.
    Navigated {
        /// Root source of the new screen.
        source: SourceId,
    },
    /// A bool member was flipped.
    Changed {
        /// New value.
        value: Value,
    },
    /// A command ran.
    Executed,
    /// A background command started.
    LoadStarted,
}

/// When the surface should reload after a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reload {
    /// No reload.
    None,
    /// Reload right away.
    Now,
    /// Reload once the current interaction completes.
    Deferred,
}

/// Result of [`ListSource::select_row`].
#[derive(Debug, Clone, PartialEq)]
pub struct SelectResult {
    /// What happened.
    pub outcome: SelectionOutcome,
    /// The screen showing this list should be popped after the interaction.
    pub pop: bool,
    /// Reload scheduling.
    pub reload: Reload,
}

impl SelectResult {
    fn ignored() -> Self {
        Self {
            outcome: SelectionOutcome::Ignored,
            pop: false,
            reload: Reload::None,
        }
    }
}

/// A member of the root object that mirrors part of the selection.
#[derive(Clone)]
pub(crate) struct Mirror {
    owner: ObjectRef,
    def: Arc<MemberDef>,
}

impl Mirror {
    pub(crate) fn new(owner: ObjectRef, def: Arc<MemberDef>) -> Self {
        Self { owner, def }
    }

    /// Find `name` on `root` or its data context.
    pub(crate) fn locate(root: &ObjectRef, name: &str) -> BindResult<Self> {
        root.locate(name)
            .map(|(owner, def)| Self { owner, def })
            .ok_or_else(|| BindError::MissingSelectionTarget {
                type_name: root.type_name().to_string(),
                member: name.to_string(),
            })
    }

    fn read(&self) -> Option<Value> {
        self.owner.read_member(&self.def)
    }

    fn write(&self, value: Value) {
        if let Err(err) = self.owner.write_member(&self.def, value) {
            tracing::warn!(target: targets::LIST, %err, "could not mirror selection");
        }
    }
}

impl std::fmt::Debug for Mirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.owner.type_name(), self.def.name())
    }
}

/// Row edit affordance of a list, bound to its gate and command.
#[derive(Debug, Clone)]
pub struct RowEditing {
    style: EditingStyle,
    can_edit: Option<(ObjectRef, Arc<MemberDef>)>,
    command: Option<Command>,
}

impl RowEditing {
    /// Bind `editing` against `target` (or its data context).
    pub fn bind(target: &ObjectRef, editing: &CellEditing) -> BindResult<Self> {
        let can_edit = match &editing.can_edit {
            Some(name) => {
                let (owner, def) = target.locate(name).ok_or_else(|| BindError::MissingMember {
                    type_name: target.type_name().to_string(),
                    member: name.clone(),
                })?;
                check_bool(&owner, &def)?;
                Some((owner, def))
            }
            None => None,
        };
        let command = editing
            .command
            .as_deref()
            .map(|name| Command::bind(target, name, None, CommandOption::Disable))
            .transpose()?;
        Ok(Self {
            style: editing.style,
            can_edit,
            command,
        })
    }

    /// Edit affordance.
    pub fn style(&self) -> EditingStyle {
        self.style
    }

    /// Whether rows can be edited now.
    pub fn can_edit(&self) -> bool {
        if self.style == EditingStyle::None {
            return false;
        }
        match &self.can_edit {
            Some((owner, def)) => owner
                .read_member(def)
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            None => true,
        }
    }
}

/// A navigable source over one homogeneous collection.
///
/// The collection is the live [`ValueList`] of the bound member, not a copy.
/// In multi-select mode `selected_items` is authoritative; otherwise
/// `selected_item` is, and `selected_items` holds at most that one value.
#[derive(Debug)]
pub struct ListSource {
    caption: String,
    section: Section,
    collapsed: Vec<Value>,
    is_collapsed: bool,
    selected_item: Value,
    selected_items: ValueList,
    display: DisplayMode,
    action: SelectionAction,
    unselection: UnselectionBehavior,
    is_multiselect: bool,
    is_selectable: bool,
    is_navigable: bool,
    pop_on_selection: bool,
    replace_caption_with_selection: bool,
    navigation_view: Option<ViewType>,
    element_template: CellTemplate,
    member: Option<MemberDescriptor>,
    item_mirror: Option<Mirror>,
    items_mirror: Option<Mirror>,
    editing: Option<RowEditing>,
    children: Vec<(ValueList, SourceId)>,
    detail: Option<SourceId>,
    row_height: Option<f32>,
    pub(crate) cells: CellCache,
}

impl ListSource {
    /// A flat, single-select list over `items`.
    pub fn new(caption: impl Into<String>, items: ValueList) -> Self {
        Self {
            caption: caption.into(),
            section: Section::collection(items),
            collapsed: Vec::new(),
            is_collapsed: false,
            selected_item: Value::None,
            selected_items: ValueList::new(),
            display: DisplayMode::List,
            action: SelectionAction::Selection,
            unselection: UnselectionBehavior::KeepCurrent,
            is_multiselect: false,
            is_selectable: true,
            is_navigable: true,
            pop_on_selection: false,
            replace_caption_with_selection: false,
            navigation_view: None,
            element_template: CellTemplate::Caption,
            member: None,
            item_mirror: None,
            items_mirror: None,
            editing: None,
            children: Vec::new(),
            detail: None,
            row_height: None,
            cells: CellCache::default(),
        }
    }

    /// Apply list directives.
    pub fn with_options(mut self, options: &ListOptions) -> Self {
        self.display = options.display;
        self.action = options.action;
        self.unselection = options.unselection;
        self.is_multiselect = options.action == SelectionAction::Multiselection;
        self.is_selectable = options.action != SelectionAction::NavigateToView;
        self.is_navigable = options.display != DisplayMode::Collapsible
            || options.action == SelectionAction::NavigateToView;
        self.pop_on_selection = options.action == SelectionAction::PopOnSelection;
        self.replace_caption_with_selection = options.replace_caption_with_selection;
        self
    }

    /// Present `view` over selected elements. Elements stop being selectable.
    pub fn with_navigation_view(mut self, view: ViewType) -> Self {
        self.is_selectable = false;
        self.navigation_view = Some(view);
        self
    }

    /// Template for expanded rows.
    pub fn with_element_template(mut self, template: CellTemplate) -> Self {
        self.element_template = template;
        self
    }

    pub(crate) fn set_member(&mut self, member: MemberDescriptor) {
        self.row_height = member.row_height.or(self.row_height);
        self.member = Some(member);
    }

    pub(crate) fn set_row_height(&mut self, height: Option<f32>) {
        if self.row_height.is_none() {
            self.row_height = height;
        }
    }

    pub(crate) fn set_mirrors(&mut self, item: Option<Mirror>, items: Option<Mirror>) {
        self.item_mirror = item;
        self.items_mirror = items;
        self.pull_selection();
    }

    pub(crate) fn set_editing(&mut self, editing: Option<RowEditing>) {
        self.editing = editing;
    }

    pub(crate) fn section_mut(&mut self) -> &mut Section {
        &mut self.section
    }

    /// Caption of the summary row and of screens pushed from it.
    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// The single section of the list.
    pub fn section(&self) -> &Section {
        &self.section
    }

    /// The bound collection.
    pub fn items(&self) -> ValueList {
        match self.section.collection_rows() {
            Some(list) => list.clone(),
            None => ValueList::new(),
        }
    }

    /// The selected item.
    pub fn selected_item(&self) -> &Value {
        &self.selected_item
    }

    /// The selected items.
    pub fn selected_items(&self) -> &ValueList {
        &self.selected_items
    }

    /// Presentation mode.
    pub fn display_mode(&self) -> DisplayMode {
        self.display
    }

    /// Selection action.
    pub fn selection_action(&self) -> SelectionAction {
        self.action
    }

    /// Multi-select mode.
    pub fn is_multiselect(&self) -> bool {
        self.is_multiselect
    }

    /// Whether rows show selection state.
    pub fn is_selectable(&self) -> bool {
        self.is_selectable
    }

    /// Whether selecting a nested collection drills into it.
    pub fn is_navigable(&self) -> bool {
        self.is_navigable
    }

    /// Whether selection pops the screen.
    pub fn pops_on_selection(&self) -> bool {
        self.pop_on_selection
    }

    /// Whether a collapsible list is currently collapsed.
    pub fn is_collapsed(&self) -> bool {
        self.is_collapsed
    }

    /// Elements parked while collapsed.
    pub fn collapsed_items(&self) -> &[Value] {
        &self.collapsed
    }

    /// Whether the list shows a single summary row.
    pub fn is_root_cell(&self) -> bool {
        match self.display {
            DisplayMode::List => false,
            DisplayMode::RootCell => true,
            DisplayMode::Collapsible => self.is_collapsed,
        }
    }

    /// Configured detail view.
    pub fn navigation_view(&self) -> Option<&ViewType> {
        self.navigation_view.as_ref()
    }

    /// The member this list was built from.
    pub fn member(&self) -> Option<&MemberDescriptor> {
        self.member.as_ref()
    }

    /// Row editing, if configured.
    pub fn editing(&self) -> Option<&RowEditing> {
        self.editing.as_ref()
    }

    /// Cached cells.
    pub fn cells(&self) -> &CellCache {
        &self.cells
    }

    /// Number of rows: one in summary mode, else one per element.
    pub fn row_count(&self) -> usize {
        if self.is_root_cell() {
            1
        } else {
            self.section.collection_rows().map_or(0, ValueList::len)
        }
    }

    /// Row height override.
    pub fn row_height(&self) -> Option<f32> {
        self.row_height
            .or_else(|| self.navigation_view.as_ref().and_then(ViewType::row_height))
            .or_else(|| {
                self.section
                    .view_types
                    .values()
                    .flatten()
                    .find_map(ViewType::row_height)
            })
    }

    /// Whether `element` is part of the selection.
    pub fn is_selected(&self, element: &Value) -> bool {
        if self.is_multiselect {
            self.selected_items.contains(element)
        } else {
            !element.is_none() && self.selected_item == *element
        }
    }

    /// Handle a tap on `row`.
    ///
    /// Out-of-range rows are ignored. Mirrors on the root object are updated
    /// before any navigation is requested.
    pub fn select_row(&mut self, row: usize) -> SelectResult {
        if self.display == DisplayMode::Collapsible {
            if row >= self.row_count() {
                return SelectResult::ignored();
            }
            let collapsed = self.toggle_collapsed();
            return SelectResult {
                outcome: SelectionOutcome::Toggled { collapsed },
                pop: false,
                reload: Reload::Now,
            };
        }

        let mut pop = false;
        let mut reload = Reload::None;
        let data = if self.is_root_cell() {
            Value::List(self.items())
        } else {
            let Some(element) = self.items().get(row) else {
                tracing::trace!(target: targets::LIST, row, len = self.row_count(), "selection past end ignored");
                return SelectResult::ignored();
            };
            let kept = self.apply_selection(element.clone());
            self.push_selection();

            pop = self.pop_on_selection
                && self.is_selectable
                && !self.is_navigable
                && !self.is_multiselect;
            reload = if self.is_selectable || self.is_multiselect || !self.is_navigable {
                Reload::Now
            } else {
                Reload::Deferred
            };
            if kept { element } else { Value::None }
        };

        let outcome = match self.action {
            SelectionAction::None => SelectionOutcome::Selected {
                item: self.selected_item.clone(),
            },
            SelectionAction::Custom => SelectionOutcome::Custom {
                item: self.selected_item.clone(),
                row,
            },
            _ => self.navigation_for(data),
        };

        tracing::debug!(target: targets::LIST, caption = %self.caption, row, ?outcome, pop, "row selected");
        SelectResult {
            outcome,
            pop,
            reload,
        }
    }

    /// Update the selection for a tap on `element`. Returns whether the
    /// element is selected afterwards.
    fn apply_selection(&mut self, element: Value) -> bool {
        if !self.is_multiselect {
            self.selected_items.replace_all(vec![element.clone()]);
            self.selected_item = element;
            return true;
        }

        if self.selected_items.remove_item(&element) {
            self.selected_item = match self.unselection {
                UnselectionBehavior::KeepCurrent => element,
                UnselectionBehavior::ClearToNull => Value::None,
                UnselectionBehavior::PreviousOrNull => self.selected_items.last().unwrap_or_default(),
            };
            false
        } else {
            self.selected_items.push(element.clone());
            self.selected_item = element;
            true
        }
    }

    fn navigation_for(&mut self, data: Value) -> SelectionOutcome {
        if self.action == SelectionAction::NavigateToView && data.is_scalar() {
            self.action = SelectionAction::Selection;
            self.is_selectable = true;
        }

        if self.is_navigable {
            if let Value::List(collection) = &data {
                let caption = if self.caption.is_empty() {
                    data.to_string()
                } else {
                    self.caption.clone()
                };
                return SelectionOutcome::NavigateToList {
                    collection: collection.clone(),
                    caption,
                };
            }
        }

        if self.action == SelectionAction::NavigateToView && !self.selected_item.is_none() {
            return SelectionOutcome::NavigateToView {
                item: self.selected_item.clone(),
                view: self.navigation_view.clone(),
            };
        }

        SelectionOutcome::Selected {
            item: self.selected_item.clone(),
        }
    }

    fn toggle_collapsed(&mut self) -> bool {
        let items = self.items();
        if self.is_collapsed {
            let mut restored = std::mem::take(&mut self.collapsed);
            restored.extend(items.take_all());
            items.replace_all(restored);
            self.is_collapsed = false;
        } else {
            self.collapsed = items.take_all();
            self.is_collapsed = true;
        }
        tracing::trace!(target: targets::LIST, caption = %self.caption, collapsed = self.is_collapsed, "collapsible list toggled");
        self.is_collapsed
    }

    /// Read the selection back from the mirror members.
    pub(crate) fn pull_selection(&mut self) {
        if let Some(value) = self.item_mirror.as_ref().and_then(Mirror::read) {
            self.selected_item = value;
        }
        if self.is_multiselect {
            if let Some(Value::List(list)) = self.items_mirror.as_ref().and_then(Mirror::read) {
                self.selected_items = list;
            }
        } else if !self.selected_item.is_none() {
            self.selected_items.replace_all(vec![self.selected_item.clone()]);
        }
    }

    /// Write the selection to the mirror members.
    pub(crate) fn push_selection(&self) {
        if let Some(mirror) = &self.item_mirror {
            mirror.write(self.selected_item.clone());
        }
        if self.is_multiselect {
            if let Some(mirror) = &self.items_mirror {
                mirror.write(Value::List(self.selected_items.clone()));
            }
        }
    }

    /// Take over the selection made in a nested screen over the same
    /// collection, then mirror it.
    pub(crate) fn absorb_selection(&mut self, item: Value, items: ValueList) {
        if !item.is_none() {
            self.selected_item = item;
        }
        self.selected_items = items;
        self.push_selection();
    }

    /// Configuration for a nested list over `collection`.
    ///
    /// When `collection` is this list's own collection, the nested list shares
    /// the selection and mirrors; for an element's sub-collection it starts
    /// with a fresh selection.
    pub(crate) fn navigation_child(&self, collection: ValueList, view: Option<ViewType>) -> ListSource {
        let caption = if self.caption.is_empty() {
            Value::List(collection.clone()).to_string()
        } else {
            self.caption.clone()
        };
        let first = collection.get(0);
        let shares_selection = collection.ptr_eq(&self.items());

        let mut child = ListSource::new(caption, collection);
        child.action = self.action;
        child.unselection = self.unselection;
        child.is_multiselect = self.is_multiselect;
        child.pop_on_selection = self.pop_on_selection;
        child.is_selectable = matches!(
            self.action,
            SelectionAction::PopOnSelection | SelectionAction::Selection | SelectionAction::Multiselection
        ) || first.as_ref().is_some_and(Value::is_scalar);
        child.is_navigable = !self.pop_on_selection
            && self.action != SelectionAction::Custom
            && first.as_ref().is_some_and(Value::is_enumerable);
        child.navigation_view = view.or_else(|| self.navigation_view.clone());
        child.element_template = self.element_template.clone();
        child.section.view_types = self.section.view_types.clone();
        child.row_height = self.row_height;
        child.editing = self.editing.clone();

        if shares_selection {
            child.selected_item = self.selected_item.clone();
            child.selected_items = self.selected_items.clone();
            child.item_mirror = self.item_mirror.clone();
            child.items_mirror = self.items_mirror.clone();
            child.member = self.member.clone();
        }
        child
    }

    /// Nested list previously created for `collection`.
    pub fn child_for(&self, collection: &ValueList) -> Option<SourceId> {
        self.children
            .iter()
            .find(|(list, _)| list.ptr_eq(collection))
            .map(|(_, id)| *id)
    }

    pub(crate) fn remember_child(&mut self, collection: ValueList, id: SourceId) {
        self.children.push((collection, id));
    }

    pub(crate) fn forget_child(&mut self, id: SourceId) {
        self.children.retain(|(_, child)| *child != id);
        if self.detail == Some(id) {
            self.detail = None;
        }
    }

    /// Record the detail screen presented from this list, returning the one it
    /// replaces.
    pub(crate) fn replace_detail(&mut self, id: SourceId) -> Option<SourceId> {
        self.detail.replace(id)
    }

    /// Whether rows can be edited now.
    pub fn can_edit_row(&self, row: usize) -> bool {
        row < self.row_count() && !self.is_root_cell() && self.editing.as_ref().is_some_and(RowEditing::can_edit)
    }

    /// Edit affordance for rows.
    pub fn editing_style(&self) -> EditingStyle {
        self.editing.as_ref().map_or(EditingStyle::None, RowEditing::style)
    }

    /// Commit an edit on `row`: runs the edit command with the row index.
    /// Returns whether a command ran.
    pub fn commit_edit(&self, row: usize, style: EditingStyle) -> BindResult<bool> {
        if style == EditingStyle::None {
            return Ok(false);
        }
        match self.editing.as_ref().and_then(|e| e.command.as_ref()) {
            Some(command) => {
                command.execute(Some(&Value::Int(row as i64)))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Render `row`. `section` and `key_row` place the cell in its surface.
    pub(crate) fn render_cell(&mut self, row: usize, section: usize, key_row: usize) -> Option<Cell> {
        if self.is_root_cell() {
            return Some(self.render_summary(section, key_row));
        }

        let element = self.items().get(row)?;
        let template = self.element_template.clone();
        let checked = self.is_selectable
            && !matches!(self.action, SelectionAction::None | SelectionAction::Custom)
            && self.is_selected(&element);
        let drills = (self.is_navigable && element.is_enumerable())
            || (self.action == SelectionAction::NavigateToView && !element.is_scalar());
        let highlight =
            self.is_navigable || self.is_selectable || self.action == SelectionAction::Custom;
        let editable = self.can_edit_row(row);

        let key = CellKey {
            template: template.id(),
            section,
            row: key_row,
        };
        let cell = self.cells.checkout(key, &template);
        cell.text = element.to_string();
        cell.accessory = if checked {
            Accessory::Checkmark
        } else if drills {
            Accessory::Disclosure
        } else {
            Accessory::None
        };
        cell.selection_style = if highlight {
            SelectionStyle::Highlight
        } else {
            SelectionStyle::None
        };
        cell.editable = editable;
        Some(cell.clone())
    }

    fn render_summary(&mut self, section: usize, key_row: usize) -> Cell {
        let template = CellTemplate::Disclosure;
        let key = CellKey {
            template: template.id(),
            section,
            row: key_row,
        };
        let mut text = self.caption.clone();
        let detail = if self.display == DisplayMode::Collapsible {
            Some(self.collapsed.len().to_string())
        } else if self.is_multiselect {
            Some(self.selected_items.len().to_string())
        } else if self.selected_item.is_none() {
            None
        } else if self.replace_caption_with_selection {
            text = self.selected_item.to_string();
            None
        } else {
            Some(self.selected_item.to_string())
        };

        let cell = self.cells.checkout(key, &template);
        cell.text = text;
        cell.detail = detail;
        cell.accessory = Accessory::Disclosure;
        cell.selection_style = SelectionStyle::Highlight;
        cell.clone()
    }
}
