//! Schema inference: turning a view model into sources.
//!
//! [`MemberParser::parse`] walks the members of an object's schema in declaration
//! order and decides, per member:
//!
//! - whether it is a row at all (skipped members, bar buttons and the refresh
//!   command are routed elsewhere; methods need an explicit directive),
//! - its order key and section,
//! - its candidate views and cell template,
//! - for lists and enums, the nested [`ListSource`] bound to it.
//!
//! Order keys are normalized per section after the walk: members are sorted by
//! key, ties keep declaration order, and keys are renumbered `0, 1, 2, ...`.

use std::sync::Arc;

use tableau_core::PerfSpan;
use tableau_core::logging::{span_names, targets};

use crate::bar::{BarButton, BarItem, NavbarButtons, PullToRefresh, layout_toolbar};
use crate::command::{Command, CommandOption};
use crate::error::{BindError, BindResult};
use crate::member::{
    DisplayMode, ListOptions, MemberDef, MemberDescriptor, MemberKind, SelectionAction, derive_caption, order,
};
use crate::object::ObjectRef;
use crate::registry::{ViewRegistry, ViewType};
use crate::source::{ListSource, MemberRow, Mirror, RowEditing, Section, SourceArena, SourceId, ViewSource};
use crate::template::CellTemplate;
use crate::value::{Value, ValueList};

/// Everything a parse pass produced for one screen.
#[derive(Debug)]
pub struct ParsedScreen {
    /// Root source of the screen.
    pub source: SourceId,
    /// The object that was parsed. Differs from the input when a type-level view
    /// replaced it.
    pub object: ObjectRef,
    /// Screen caption.
    pub caption: String,
    /// Toolbar layout.
    pub toolbar: Vec<BarItem>,
    /// Navigation bar buttons.
    pub navbar: NavbarButtons,
    /// Refresh command.
    pub refresh: Option<PullToRefresh>,
}

/// Builds sources from view models.
#[derive(Debug, Clone)]
pub struct MemberParser {
    registry: Arc<ViewRegistry>,
}

struct Placed {
    row: MemberRow,
    key: i32,
}

impl MemberParser {
    /// A parser resolving views through `registry`.
    pub fn new(registry: Arc<ViewRegistry>) -> Self {
        Self { registry }
    }

    /// The view registry.
    pub fn registry(&self) -> &Arc<ViewRegistry> {
        &self.registry
    }

    /// Parse `root` into sources owned by `arena`, under `parent`.
    ///
    /// Fails on configuration errors: a command or gate that cannot be bound, a
    /// missing selection target.
    pub fn parse(
        &self,
        arena: &mut SourceArena,
        root: &ObjectRef,
        parent: Option<SourceId>,
    ) -> BindResult<ParsedScreen> {
        let _span = PerfSpan::new(span_names::PARSE);
        let object = self.replace_with_view(root);
        let schema = object.schema().clone();
        let caption = schema
            .caption()
            .map(str::to_string)
            .unwrap_or_else(|| derive_caption(object.type_name()));

        let mut sections: Vec<Section> = Vec::new();
        let mut placed: Vec<Vec<Placed>> = Vec::new();
        let mut toolbar = Vec::new();
        let mut navbar = Vec::new();
        let mut refresh = None;
        let mut default_key = 0;
        let mut section = 0;
        let mut seen_any = false;

        for def in schema.members() {
            let attrs = def.attrs();
            if attrs.skip {
                continue;
            }
            if let Some(options) = &attrs.toolbar {
                toolbar.push(BarButton::bind(&object, def, options)?);
                continue;
            }
            if let Some(options) = &attrs.navbar {
                navbar.push(BarButton::bind(&object, def, options)?);
                continue;
            }
            if let Some(key) = &attrs.pull_to_refresh {
                refresh = Some(PullToRefresh {
                    settings_key: key.clone(),
                    command: Command::bind(&object, def.name(), None, CommandOption::Disable)?,
                });
                continue;
            }
            if def.kind().is_method() && attrs.is_empty() {
                continue;
            }

            let key = match attrs.order {
                Some(value) => order::explicit(value),
                None => {
                    default_key = order::next_default(default_key);
                    default_key
                }
            };

            let list_display = def.kind().is_collection() && list_options(def).display == DisplayMode::List;
            if attrs.section.is_some() || list_display {
                if seen_any {
                    section += 1;
                }
                let options = attrs.section.clone().unwrap_or_default();
                let header = options.header.or_else(|| list_display.then(|| def.caption()));
                while sections.len() <= section {
                    sections.push(Section::members(None, None));
                    placed.push(Vec::new());
                }
                sections[section].header = header;
                sections[section].footer = options.footer;
            }
            while sections.len() <= section {
                sections.push(Section::members(None, None));
                placed.push(Vec::new());
            }
            seen_any = true;

            let mut member = MemberDescriptor::new(object.clone(), def.clone());
            member.section = section;
            member.view_types = self.candidate_views(&member);
            let template = self.resolve_template(&member);
            if attrs.load_more.is_some() && !def.runs_in_background() {
                return Err(BindError::NotBackground {
                    type_name: object.type_name().to_string(),
                    member: def.name().to_string(),
                });
            }
            let command = if def.kind().is_method() {
                Some(match &attrs.button {
                    Some(options) => Command::from_button(&object, def.name(), options)?,
                    None => Command::bind(&object, def.name(), None, CommandOption::Disable)?,
                })
            } else {
                None
            };
            sections[section].add_view_types(member.data_type().name(), &member.view_types);

            placed[section].push(Placed {
                row: MemberRow {
                    member,
                    template,
                    list: None,
                    command,
                    busy: false,
                },
                key,
            });
        }

        for (section, mut rows) in sections.iter_mut().zip(placed) {
            rows.sort_by_key(|p| p.key);
            let rows = rows
                .into_iter()
                .enumerate()
                .map(|(index, mut p)| {
                    p.row.member.order = index as i32;
                    p.row
                })
                .collect();
            section.rows = crate::source::SectionRows::Members(rows);
        }

        tracing::debug!(
            target: targets::PARSER,
            type_name = object.type_name(),
            sections = sections.len(),
            toolbar = toolbar.len(),
            navbar = navbar.len(),
            "parsed view model"
        );

        let source = match single_list_member(&sections) {
            Some(member) => {
                let list = self.build_list(&object, member)?;
                arena.insert(list, parent)
            }
            None => self.insert_view(arena, &object, &caption, sections, parent)?,
        };

        Ok(ParsedScreen {
            source,
            object,
            caption,
            toolbar: layout_toolbar(toolbar),
            navbar: NavbarButtons::from_buttons(navbar),
            refresh,
        })
    }

    /// Build the list source for member `name` of `root` on its own. Returns
    /// `None` when the member is not a list or enum.
    pub fn parse_member(
        &self,
        arena: &mut SourceArena,
        root: &ObjectRef,
        name: &str,
        parent: Option<SourceId>,
    ) -> BindResult<Option<SourceId>> {
        let def = root.schema().member(name).ok_or_else(|| BindError::MissingMember {
            type_name: root.type_name().to_string(),
            member: name.to_string(),
        })?;
        if !def.kind().is_collection() {
            tracing::trace!(target: targets::PARSER, member = name, "member is not a collection");
            return Ok(None);
        }
        let mut member = MemberDescriptor::new(root.clone(), def.clone());
        member.view_types = self.candidate_views(&member);
        let list = self.build_list(root, &member)?;
        Ok(Some(arena.insert(list, parent)))
    }

    fn insert_view(
        &self,
        arena: &mut SourceArena,
        object: &ObjectRef,
        caption: &str,
        sections: Vec<Section>,
        parent: Option<SourceId>,
    ) -> BindResult<SourceId> {
        let mut view = ViewSource::new(caption, object.clone());
        view.sections = sections;
        let id = arena.insert(view, parent);

        let mut pending = Vec::new();
        if let Some(view) = arena.view(id) {
            for (s, section) in view.sections.iter().enumerate() {
                for (index, row) in section.member_rows().unwrap_or_default().iter().enumerate() {
                    if row.member.kind().is_collection() {
                        pending.push((s, index, self.build_list(object, &row.member)?));
                    }
                }
            }
        }
        for (s, index, list) in pending {
            let list_id = arena.insert(list, Some(id));
            if let Some(row) = arena
                .view_mut(id)
                .and_then(|v| v.sections.get_mut(s))
                .and_then(Section::member_rows_mut)
                .and_then(|rows| rows.get_mut(index))
            {
                row.list = Some(list_id);
            }
        }
        Ok(id)
    }

    /// Instantiate the screen view registered for the root's type, if any.
    fn replace_with_view(&self, root: &ObjectRef) -> ObjectRef {
        let schema = root.schema();
        let view = schema
            .view()
            .filter(|v| v.is_screen())
            .or_else(|| self.registry.exact(&schema.type_info().key()).filter(|v| v.is_screen()));
        match view.and_then(|v| v.instantiate(root)) {
            Some(screen) => {
                tracing::debug!(
                    target: targets::PARSER,
                    model = root.type_name(),
                    view = screen.type_name(),
                    "replaced view model with its screen view"
                );
                screen
            }
            None => root.clone(),
        }
    }

    /// Views for a member, most preferred first: explicit directive, marker
    /// registration, then type-based lookup.
    fn candidate_views(&self, member: &MemberDescriptor) -> Vec<ViewType> {
        let attrs = member.attrs();
        let mut views = Vec::new();
        if let Some(view) = &attrs.view {
            views.push(view.clone());
        }
        if let Some(view) = self.registry.resolve_by_markers(&attrs.markers) {
            views.push(view.clone());
        }
        if let Some(view) = self.registry.resolve(&member.data_type()) {
            if !views.contains(view) {
                views.push(view.clone());
            }
        }
        views
    }

    fn resolve_template(&self, member: &MemberDescriptor) -> CellTemplate {
        let attrs = member.attrs();
        if let Some(template) = attrs.view.as_ref().and_then(ViewType::cell_template) {
            return template.clone();
        }
        if let Some(options) = &attrs.load_more {
            return CellTemplate::LoadMore(options.clone());
        }
        if let Some(options) = &attrs.entry {
            return CellTemplate::Entry(options.clone());
        }
        if member.kind().is_collection() {
            return CellTemplate::Disclosure;
        }
        if let Some(template) = member.view_types.iter().find_map(ViewType::cell_template) {
            return template.clone();
        }
        if attrs.button.is_some() {
            return CellTemplate::Button;
        }
        if matches!(member.kind(), MemberKind::Object) {
            return CellTemplate::Disclosure;
        }
        tracing::debug!(
            target: targets::PARSER,
            member = member.name(),
            data_type = member.data_type().name(),
            "no view registered, using caption cell"
        );
        CellTemplate::Caption
    }

    fn build_list(&self, object: &ObjectRef, member: &MemberDescriptor) -> BindResult<ListSource> {
        let def = &member.def;
        let attrs = def.attrs();
        let options = list_options(def);

        let (items, item_mirror) = match def.kind() {
            MemberKind::Enum(info) => {
                let items: ValueList = info.variants.iter().map(|v| Value::Enum(*v)).collect();
                let mirror = match &options.selected_item {
                    Some(name) => Mirror::locate(object, name)?,
                    None => Mirror::new(member.owner.clone(), def.clone()),
                };
                (items, Some(mirror))
            }
            _ => {
                let items = member.value().as_list().cloned().unwrap_or_default();
                let mirror = options
                    .selected_item
                    .as_deref()
                    .map(|name| Mirror::locate(object, name))
                    .transpose()?;
                (items, mirror)
            }
        };
        let items_mirror = options
            .selected_items
            .as_deref()
            .map(|name| Mirror::locate(object, name))
            .transpose()?;

        let element_template = member
            .view_types
            .iter()
            .find_map(ViewType::cell_template)
            .cloned()
            .unwrap_or(CellTemplate::Caption);

        let mut list = ListSource::new(member.caption.clone(), items)
            .with_options(&options)
            .with_element_template(element_template);
        if let Some(view) = &attrs.navigate_to {
            list = list.with_navigation_view(view.clone());
        }

        let editing = object
            .schema()
            .cell_editing()
            .or(attrs.cell_editing.as_ref())
            .map(|editing| RowEditing::bind(object, editing))
            .transpose()?;
        list.set_editing(editing);
        list.section_mut()
            .add_view_types(member.data_type().name(), &member.view_types);
        list.set_member(member.clone());
        list.set_mirrors(item_mirror, items_mirror);

        tracing::trace!(
            target: targets::PARSER,
            member = member.name(),
            display = ?options.display,
            action = ?options.action,
            "built list source"
        );
        Ok(list)
    }
}

/// Effective list options: explicit directive, else the defaults for the kind.
/// Enums default to a summary row that pops once a variant is picked.
fn list_options(def: &MemberDef) -> ListOptions {
    match (&def.attrs().list, def.kind()) {
        (Some(options), _) => options.clone(),
        (None, MemberKind::Enum(_)) => ListOptions::new()
            .display(DisplayMode::RootCell)
            .action(SelectionAction::PopOnSelection),
        (None, _) => ListOptions::new(),
    }
}

/// The lone collection member of a screen that is nothing but one expanded list.
fn single_list_member(sections: &[Section]) -> Option<&MemberDescriptor> {
    let [section] = sections else {
        return None;
    };
    let [row] = section.member_rows()? else {
        return None;
    };
    let member = &row.member;
    (member.kind().is_collection() && list_options(&member.def).display == DisplayMode::List).then_some(member)
}
