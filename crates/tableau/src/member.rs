//! Member metadata.
//!
//! A [`MemberDef`] is the static description of one bindable member of a type,
//! built once from its [`Schema`](crate::schema::Schema). A [`MemberDescriptor`]
//! is the per-parse view of that member on a concrete object: its normalized
//! order, section, resolved caption and candidate views.

use std::fmt;
use std::sync::Arc;

use crate::bar::ButtonOptions;
use crate::error::BindResult;
use crate::object::ObjectRef;
use crate::registry::ViewType;
use crate::schema::{BindableEnum, Getter, Invoker, Setter, Starter};
use crate::command::Command;
use crate::template::{EntryOptions, LoadMoreOptions};
use crate::types::{TypeInfo, TypeKey};
use crate::value::{EnumValue, Value, ValueList};

/// Order key sentinels.
pub mod order {
    /// Pins a member before every other member of its section.
    pub const FIRST: i32 = i32::MIN;
    /// Pins a member after every other member of its section.
    pub const LAST: i32 = i32::MAX;

    /// Order key for an author-supplied order value. Explicit keys are even so
    /// they fall between the odd default keys. Values whose double does not fit
    /// pin to the matching sentinel.
    pub(crate) fn explicit(value: i32) -> i32 {
        value.checked_mul(2).unwrap_or(if value < 0 { FIRST } else { LAST })
    }

    /// Next odd default key after `previous`. Saturates below [`LAST`].
    pub(crate) fn next_default(previous: i32) -> i32 {
        previous
            .saturating_add(previous.rem_euclid(2) + 1)
            .min(LAST - 2)
    }
}

/// Semantic type of a member.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberKind {
    /// Boolean field.
    Bool,
    /// Integer field.
    Int,
    /// Floating point field.
    Float,
    /// Text field.
    Text,
    /// Untyped [`Value`] field, usually a selection mirror.
    Value,
    /// Bindable enum field.
    Enum(EnumInfo),
    /// Collection field.
    List,
    /// Nested view-model field.
    Object,
    /// Invocable method.
    Method {
        /// Whether the method takes a parameter.
        takes_param: bool,
    },
}

/// The variants of an enum member.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumInfo {
    /// The enum type.
    pub key: TypeKey,
    /// Every variant in declaration order.
    pub variants: Vec<EnumValue>,
}

impl MemberKind {
    /// Kind for a bindable enum type.
    pub fn enumeration<E: BindableEnum>() -> Self {
        Self::Enum(EnumInfo {
            key: TypeKey::of::<E>(),
            variants: EnumValue::all::<E>(),
        })
    }

    /// Lists and enums are bound through a list source.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::List | Self::Enum(_))
    }

    /// Whether the member is invocable.
    pub fn is_method(&self) -> bool {
        matches!(self, Self::Method { .. })
    }

    /// The declared type used for view lookup when no runtime value refines it.
    pub fn static_type(&self) -> TypeInfo {
        match self {
            Self::Bool => TypeInfo::of::<bool>(),
            Self::Int => TypeInfo::of::<i64>(),
            Self::Float => TypeInfo::of::<f64>(),
            Self::Text => TypeInfo::of::<String>(),
            Self::Value => TypeInfo::of::<Value>(),
            Self::Enum(info) => TypeInfo::from_key(info.key),
            Self::List => TypeInfo::of::<ValueList>(),
            Self::Object => TypeInfo::of::<ObjectRef>(),
            Self::Method { .. } => TypeInfo::of::<Command>(),
        }
    }

    /// Short name for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::Value => "value",
            Self::Enum(_) => "enum",
            Self::List => "list",
            Self::Object => "object",
            Self::Method { .. } => "method",
        }
    }
}

/// Header and footer of a section started by a member.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionOptions {
    /// Header text.
    pub header: Option<String>,
    /// Footer text.
    pub footer: Option<String>,
}

/// How a list source presents its collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayMode {
    /// One row per element.
    #[default]
    List,
    /// A single summary row that navigates into the collection.
    RootCell,
    /// A summary row that expands the elements in place.
    Collapsible,
}

/// What happens after a row of a list is selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionAction {
    /// Nothing beyond updating the selection.
    None,
    /// Single selection.
    #[default]
    Selection,
    /// Toggled multiple selection.
    Multiselection,
    /// Single selection, then pop the screen.
    PopOnSelection,
    /// Present the detail view registered for the element.
    NavigateToView,
    /// Report the selection to the owning controller only.
    Custom,
}

/// How the selected item is updated when a multi-select row is deselected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnselectionBehavior {
    /// Keep the deselected element as the selected item.
    #[default]
    KeepCurrent,
    /// Clear the selected item.
    ClearToNull,
    /// Fall back to the most recently selected remaining element.
    PreviousOrNull,
}

/// List directives for a collection or enum member.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    /// Presentation mode.
    pub display: DisplayMode,
    /// Selection action.
    pub action: SelectionAction,
    /// Deselection policy for multi-select lists.
    pub unselection: UnselectionBehavior,
    /// Member on the root object that mirrors the selected item.
    pub selected_item: Option<String>,
    /// Member on the root object that mirrors the selected items.
    pub selected_items: Option<String>,
    /// Show the selection instead of the caption in the summary row.
    pub replace_caption_with_selection: bool,
}

impl ListOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the display mode.
    pub fn display(mut self, display: DisplayMode) -> Self {
        self.display = display;
        self
    }

    /// Set the selection action.
    pub fn action(mut self, action: SelectionAction) -> Self {
        self.action = action;
        self
    }

    /// Set the deselection policy.
    pub fn unselection(mut self, unselection: UnselectionBehavior) -> Self {
        self.unselection = unselection;
        self
    }

    /// Mirror the selected item into `member`.
    pub fn selected_item(mut self, member: impl Into<String>) -> Self {
        self.selected_item = Some(member.into());
        self
    }

    /// Mirror the selected items into `member`.
    pub fn selected_items(mut self, member: impl Into<String>) -> Self {
        self.selected_items = Some(member.into());
        self
    }

    /// Show the selection in place of the caption.
    pub fn replace_caption_with_selection(mut self) -> Self {
        self.replace_caption_with_selection = true;
        self
    }
}

/// Row edit affordance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditingStyle {
    /// Not editable.
    #[default]
    None,
    /// Swipe to delete.
    Delete,
    /// Insert control.
    Insert,
}

/// Row editing directive for a list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellEditing {
    /// Edit affordance.
    pub style: EditingStyle,
    /// Bool member gating whether rows can be edited.
    pub can_edit: Option<String>,
    /// Method invoked with the row index when an edit is committed.
    pub command: Option<String>,
}

impl CellEditing {
    /// Editing with `style` and no gate or command.
    pub fn new(style: EditingStyle) -> Self {
        Self {
            style,
            ..Default::default()
        }
    }

    /// Gate editing on a bool member.
    pub fn can_edit(mut self, member: impl Into<String>) -> Self {
        self.can_edit = Some(member.into());
        self
    }

    /// Invoke `member` with the row index on commit.
    pub fn command(mut self, member: impl Into<String>) -> Self {
        self.command = Some(member.into());
        self
    }
}

/// Every directive attached to a member.
#[derive(Debug, Clone, Default)]
pub struct MemberAttrs {
    /// Author-supplied order value, before key normalization.
    pub order: Option<i32>,
    /// Starts a new section.
    pub section: Option<SectionOptions>,
    /// Caption override.
    pub caption: Option<String>,
    /// Row height override.
    pub row_height: Option<f32>,
    /// Excluded from binding.
    pub skip: bool,
    /// Writes are rejected.
    pub read_only: bool,
    /// List directives.
    pub list: Option<ListOptions>,
    /// Element type of a collection.
    pub element: Option<TypeInfo>,
    /// Detail view presented for selected elements.
    pub navigate_to: Option<ViewType>,
    /// Explicit view.
    pub view: Option<ViewType>,
    /// Marker keys looked up in the registry before the member's type.
    pub markers: Vec<TypeKey>,
    /// Text entry hints.
    pub entry: Option<EntryOptions>,
    /// Row button directive.
    pub button: Option<ButtonOptions>,
    /// Toolbar button directive.
    pub toolbar: Option<ButtonOptions>,
    /// Navigation bar button directive.
    pub navbar: Option<ButtonOptions>,
    /// Pull-to-refresh settings key.
    pub pull_to_refresh: Option<String>,
    /// Load-more captions.
    pub load_more: Option<LoadMoreOptions>,
    /// Row editing directive.
    pub cell_editing: Option<CellEditing>,
}

impl MemberAttrs {
    /// Whether no directive at all was attached.
    pub fn is_empty(&self) -> bool {
        self.order.is_none()
            && self.section.is_none()
            && self.caption.is_none()
            && self.row_height.is_none()
            && !self.skip
            && !self.read_only
            && self.list.is_none()
            && self.element.is_none()
            && self.navigate_to.is_none()
            && self.view.is_none()
            && self.markers.is_empty()
            && self.entry.is_none()
            && self.button.is_none()
            && self.toolbar.is_none()
            && self.navbar.is_none()
            && self.pull_to_refresh.is_none()
            && self.load_more.is_none()
            && self.cell_editing.is_none()
    }

    /// Routed to the toolbar, navbar or refresh control instead of a row.
    pub fn is_routed(&self) -> bool {
        self.toolbar.is_some() || self.navbar.is_some() || self.pull_to_refresh.is_some()
    }
}

/// Static description of one member of a bindable type.
pub struct MemberDef {
    pub(crate) name: &'static str,
    pub(crate) kind: MemberKind,
    pub(crate) attrs: MemberAttrs,
    pub(crate) getter: Option<Getter>,
    pub(crate) setter: Option<Setter>,
    pub(crate) invoker: Option<Invoker>,
    pub(crate) starter: Option<Starter>,
}

impl MemberDef {
    /// Member name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Semantic type.
    pub fn kind(&self) -> &MemberKind {
        &self.kind
    }

    /// Attached directives.
    pub fn attrs(&self) -> &MemberAttrs {
        &self.attrs
    }

    /// Whether the member can be read.
    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }

    /// Whether the member accepts writes.
    pub fn is_writable(&self) -> bool {
        self.setter.is_some() && !self.attrs.read_only
    }

    /// Whether the method splits its work off the UI thread.
    pub fn runs_in_background(&self) -> bool {
        self.starter.is_some()
    }

    /// Caption from the directive, else derived from the name.
    pub fn caption(&self) -> String {
        self.attrs
            .caption
            .clone()
            .unwrap_or_else(|| derive_caption(self.name))
    }
}

impl fmt::Debug for MemberDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDef")
            .field("name", &self.name)
            .field("kind", &self.kind.name())
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// One member of a concrete object, as placed by a parse pass.
#[derive(Clone)]
pub struct MemberDescriptor {
    /// Object the member is read from. Shared, not owned.
    pub owner: ObjectRef,
    pub(crate) def: Arc<MemberDef>,
    /// Dense order within the section once parsing finishes.
    pub order: i32,
    /// Section index.
    pub section: usize,
    /// Row height override.
    pub row_height: Option<f32>,
    /// Display caption.
    pub caption: String,
    /// Whether the row accepts edits.
    pub editable: bool,
    /// Candidate views, most preferred first.
    pub view_types: Vec<ViewType>,
}

impl MemberDescriptor {
    pub(crate) fn new(owner: ObjectRef, def: Arc<MemberDef>) -> Self {
        let caption = if def.name == "data_context" && def.attrs.caption.is_none() {
            owner
                .read_member(&def)
                .and_then(|v| v.as_object().map(|o| derive_caption(o.type_name())))
                .unwrap_or_else(|| def.caption())
        } else {
            def.caption()
        };
        Self {
            editable: def.is_writable(),
            row_height: def.attrs.row_height,
            owner,
            def,
            order: 0,
            section: 0,
            caption,
            view_types: Vec::new(),
        }
    }

    /// Member name.
    pub fn name(&self) -> &'static str {
        self.def.name
    }

    /// Semantic type.
    pub fn kind(&self) -> &MemberKind {
        &self.def.kind
    }

    /// Attached directives.
    pub fn attrs(&self) -> &MemberAttrs {
        &self.def.attrs
    }

    /// Current value, or [`Value::None`] for methods.
    pub fn value(&self) -> Value {
        self.owner.read_member(&self.def).unwrap_or_default()
    }

    /// Write a new value through the member's accessor.
    pub fn set_value(&self, value: Value) -> BindResult<()> {
        self.owner.write_member(&self.def, value)
    }

    /// Type used to resolve the member's view: the runtime type of an object
    /// value, the element type of a list, else the declared kind.
    pub fn data_type(&self) -> TypeInfo {
        match &self.def.kind {
            MemberKind::Object | MemberKind::Value => match self.value() {
                Value::None => self.def.kind.static_type(),
                value => value.type_info(),
            },
            MemberKind::List => self
                .def
                .attrs
                .element
                .clone()
                .unwrap_or_else(|| self.def.kind.static_type()),
            kind => kind.static_type(),
        }
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("owner", &self.owner.type_name())
            .field("name", &self.def.name)
            .field("order", &self.order)
            .field("section", &self.section)
            .field("caption", &self.caption)
            .finish()
    }
}

/// Turn a member or type name into display text: `first_name` and `firstName`
/// both become `First Name`.
pub fn derive_caption(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut previous: Option<char> = None;

    for ch in name.chars() {
        if ch == '_' || ch == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous = None;
            continue;
        }
        let boundary = ch.is_uppercase()
            && previous.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit());
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(ch);
        previous = Some(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
