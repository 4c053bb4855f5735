//! The presentation session: the surface-facing API.
//!
//! A [`Session`] owns the [`SourceArena`] for one navigation stack and answers
//! the questions a table surface asks (section and row counts, row heights,
//! cells) and the interactions it reports (selection, edits). It lives on the UI
//! thread. The only concurrent work is the load-more command, which runs on a
//! [`Worker`] and completes through the session's [`UiDispatcher`].
//!
//! Actions that must not happen while the surface is still inside its tap
//! handler (popping a screen, deferred reloads) are queued as [`PostAction`]s.
//! The surface calls [`Session::drain_post_actions`] once the interaction is
//! done.
//!
//! ```
//! use std::sync::Arc;
//! use tableau::prelude::*;
//!
//! struct Inbox {
//!     folders: ValueList,
//! }
//!
//! impl Bindable for Inbox {
//!     fn describe(schema: &mut Schema<Self>) {
//!         schema.field("folders", |i: &Self| &i.folders, |i: &mut Self| &mut i.folders);
//!     }
//! }
//!
//! let inbox = ObjectRef::new(Inbox {
//!     folders: ["Inbox", "Sent", "Archive"].into_iter().collect(),
//! });
//! let mut session = Session::new(Arc::new(ViewRegistry::with_defaults()), SessionConfig::default());
//! let root = session.present(&inbox).unwrap();
//! assert_eq!(session.section_count(root), 1);
//! assert_eq!(session.row_count(root, 0), 3);
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tableau_core::logging::{span_names, targets};
use tableau_core::{CoreError, PerfSpan, Signal, ThreadAffinity, UiDispatcher, UiHandle, Worker};

use crate::bar::{BarItem, NavbarButtons, PullToRefresh};
use crate::command::Command;
use crate::config::SessionConfig;
use crate::debug::SourceTreeDebug;
use crate::error::BindResult;
use crate::member::{EditingStyle, MemberKind};
use crate::object::ObjectRef;
use crate::parser::{MemberParser, ParsedScreen};
use crate::registry::{ViewRegistry, ViewType};
use crate::schema::Apply;
use crate::source::{MemberRow, Reload, RowTarget, Section, SelectionOutcome, SourceArena, SourceId};
use crate::template::{Cell, CellTemplate};
use crate::value::{Value, ValueList};

/// Work deferred until the current interaction completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction {
    /// Pop the screen rooted at `screen`, if it is still on top.
    Pop {
        /// Root source of the screen to pop.
        screen: SourceId,
    },
    /// Ask the surface to reload `source`.
    Reload {
        /// Source to reload.
        source: SourceId,
    },
}

/// A change of the navigation stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// A screen was pushed.
    Pushed {
        /// Root source of the new screen.
        source: SourceId,
        /// Its caption.
        caption: String,
    },
    /// A screen was popped.
    Popped {
        /// Root source of the popped screen.
        source: SourceId,
    },
}

/// One entry of the navigation stack.
#[derive(Debug)]
pub struct Screen {
    root: SourceId,
    caption: String,
    toolbar: Vec<BarItem>,
    navbar: NavbarButtons,
    refresh: Option<PullToRefresh>,
    transient: bool,
}

impl Screen {
    fn list(root: SourceId, caption: String) -> Self {
        Self {
            root,
            caption,
            toolbar: Vec::new(),
            navbar: NavbarButtons::default(),
            refresh: None,
            transient: false,
        }
    }

    fn parsed(parsed: ParsedScreen, transient: bool) -> Self {
        Self {
            root: parsed.source,
            caption: parsed.caption,
            toolbar: parsed.toolbar,
            navbar: parsed.navbar,
            refresh: parsed.refresh,
            transient,
        }
    }

    /// Root source.
    pub fn root(&self) -> SourceId {
        self.root
    }

    /// Title.
    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// Toolbar layout.
    pub fn toolbar(&self) -> &[BarItem] {
        &self.toolbar
    }

    /// Navigation bar buttons.
    pub fn navbar(&self) -> &NavbarButtons {
        &self.navbar
    }

    /// Refresh command.
    pub fn refresh(&self) -> Option<&PullToRefresh> {
        self.refresh.as_ref()
    }
}

/// Binds view models to a navigation stack of table screens.
pub struct Session {
    parser: MemberParser,
    config: SessionConfig,
    arena: SourceArena,
    stack: Vec<Screen>,
    post_actions: Arc<Mutex<VecDeque<PostAction>>>,
    dispatcher: UiDispatcher<Session>,
    worker: Option<Worker>,
    affinity: ThreadAffinity,
    closed: bool,
    custom_selected: Signal<(Value, usize)>,
    reload_requested: Signal<SourceId>,
    navigated: Signal<Navigation>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("sources", &self.arena.len())
            .field("depth", &self.stack.len())
            .field("post_actions", &self.post_actions.lock().len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl Session {
    /// A session resolving views through `registry`. Must be created on the UI
    /// thread.
    pub fn new(registry: Arc<ViewRegistry>, config: SessionConfig) -> Self {
        Self {
            parser: MemberParser::new(registry),
            config,
            arena: SourceArena::new(),
            stack: Vec::new(),
            post_actions: Arc::new(Mutex::new(VecDeque::new())),
            dispatcher: UiDispatcher::new(),
            worker: None,
            affinity: ThreadAffinity::current(),
            closed: false,
            custom_selected: Signal::new(),
            reload_requested: Signal::new(),
            navigated: Signal::new(),
        }
    }

    /// The view registry.
    pub fn registry(&self) -> &Arc<ViewRegistry> {
        self.parser.registry()
    }

    /// Settings.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Every live source.
    pub fn arena(&self) -> &SourceArena {
        &self.arena
    }

    /// The navigation stack, bottom first.
    pub fn screens(&self) -> &[Screen] {
        &self.stack
    }

    /// The visible screen.
    pub fn top(&self) -> Option<&Screen> {
        self.stack.last()
    }

    /// Emitted with the element and row when a list with a custom selection
    /// action is tapped.
    pub fn custom_selected(&self) -> &Signal<(Value, usize)> {
        &self.custom_selected
    }

    /// Emitted when the surface should reload a source.
    pub fn reload_requested(&self) -> &Signal<SourceId> {
        &self.reload_requested
    }

    /// Emitted when a screen is pushed or popped.
    pub fn navigated(&self) -> &Signal<Navigation> {
        &self.navigated
    }

    /// Handle for posting work to this session from other threads.
    pub fn ui_handle(&self) -> UiHandle<Session> {
        self.dispatcher.handle()
    }

    /// Tree dump of the live sources.
    pub fn debug_tree(&self) -> SourceTreeDebug<'_> {
        SourceTreeDebug::new(&self.arena)
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> BindResult<()> {
        if self.closed {
            return Err(CoreError::DispatcherClosed.into());
        }
        Ok(())
    }

    /// Replace the stack with a screen for `root`. Returns its root source.
    pub fn present(&mut self, root: &ObjectRef) -> BindResult<SourceId> {
        self.affinity.debug_assert_same_thread();
        self.ensure_open()?;
        self.reset();
        let parsed = self.parser.parse(&mut self.arena, root, None)?;
        let source = parsed.source;
        self.push(Screen::parsed(parsed, false));
        Ok(source)
    }

    /// Replace the stack with a screen showing only member `name` of `root`.
    /// Returns `None` when the member is not a list or enum.
    pub fn present_member(&mut self, root: &ObjectRef, name: &str) -> BindResult<Option<SourceId>> {
        self.affinity.debug_assert_same_thread();
        self.ensure_open()?;
        self.reset();
        let Some(source) = self.parser.parse_member(&mut self.arena, root, name, None)? else {
            return Ok(None);
        };
        let caption = self
            .arena
            .get(source)
            .map(|s| s.caption().to_string())
            .unwrap_or_default();
        self.push(Screen::list(source, caption));
        Ok(Some(source))
    }

    fn reset(&mut self) {
        self.stack.clear();
        self.arena.clear();
        self.post_actions.lock().clear();
    }

    fn push(&mut self, screen: Screen) {
        let source = screen.root;
        let caption = screen.caption.clone();
        tracing::debug!(target: targets::SESSION, ?source, %caption, depth = self.stack.len() + 1, "screen pushed");
        self.stack.push(screen);
        self.navigated.emit(Navigation::Pushed { source, caption });
    }

    fn top_root(&self) -> Option<SourceId> {
        self.stack.last().map(|s| s.root)
    }

    /// Number of sections of `source`.
    pub fn section_count(&self, source: SourceId) -> usize {
        self.arena.section_count(source)
    }

    /// Number of rows in a section.
    pub fn row_count(&self, source: SourceId, section: usize) -> usize {
        self.arena.row_count(source, section)
    }

    /// Height of a row.
    pub fn row_height(&self, source: SourceId, section: usize, row: usize) -> f32 {
        self.arena
            .row_height(source, section, row, self.config.default_row_height)
    }

    /// Section header.
    pub fn header(&self, source: SourceId, section: usize) -> Option<&str> {
        self.arena.header(source, section)
    }

    /// Section footer.
    pub fn footer(&self, source: SourceId, section: usize) -> Option<&str> {
        self.arena.footer(source, section)
    }

    /// The cell for a row, reusing the cached cell for the same row.
    pub fn cell(&mut self, source: SourceId, section: usize, row: usize) -> Option<Cell> {
        self.affinity.debug_assert_same_thread();
        self.arena.cell(source, section, row)
    }

    /// Handle a tap.
    ///
    /// Unknown rows, busy rows and commands that cannot execute are ignored.
    /// Errors are configuration errors found while building a pushed screen, or
    /// a failed write through a member accessor.
    #[tracing::instrument(skip(self), target = "tableau::session", level = "debug")]
    pub fn select(&mut self, source: SourceId, section: usize, row: usize) -> BindResult<SelectionOutcome> {
        self.affinity.debug_assert_same_thread();
        if self.closed {
            return Ok(SelectionOutcome::Ignored);
        }
        let _span = PerfSpan::new(span_names::SELECT);
        match self.arena.resolve_row(source, section, row) {
            Some(RowTarget::List { id, row }) => self.select_list(id, row),
            Some(RowTarget::Member { section, index }) => self.select_member(source, section, index),
            None => {
                tracing::trace!(target: targets::SESSION, ?source, section, row, "selection on missing row ignored");
                Ok(SelectionOutcome::Ignored)
            }
        }
    }

    fn select_list(&mut self, id: SourceId, row: usize) -> BindResult<SelectionOutcome> {
        let Some(list) = self.arena.list_mut(id) else {
            return Ok(SelectionOutcome::Ignored);
        };
        let result = list.select_row(row);
        let screen = self.top_root().unwrap_or(id);

        match result.reload {
            Reload::Now => self.reload_requested.emit(screen),
            Reload::Deferred => self.post(PostAction::Reload { source: screen }),
            Reload::None => {}
        }
        if result.pop {
            self.post(PostAction::Pop { screen });
        }

        match result.outcome {
            SelectionOutcome::Custom { item, row } => {
                self.custom_selected.emit((item.clone(), row));
                Ok(SelectionOutcome::Custom { item, row })
            }
            SelectionOutcome::NavigateToList { collection, caption } => {
                let source = self.navigate_list(id, collection, caption);
                Ok(SelectionOutcome::Navigated { source })
            }
            SelectionOutcome::NavigateToView { item, view } => self.navigate_view(id, item, view),
            outcome => Ok(outcome),
        }
    }

    fn navigate_list(&mut self, parent: SourceId, collection: ValueList, caption: String) -> SourceId {
        let existing = self
            .arena
            .list(parent)
            .and_then(|list| list.child_for(&collection))
            .filter(|id| self.arena.contains(*id));

        let child = match existing {
            Some(child) => {
                tracing::trace!(target: targets::SESSION, ?child, "reusing nested list");
                child
            }
            None => {
                let config = match self.arena.list(parent) {
                    Some(list) => list.navigation_child(collection.clone(), None),
                    None => crate::source::ListSource::new(caption.clone(), collection.clone()),
                };
                let child = self.arena.insert(config, Some(parent));
                if let Some(list) = self.arena.list_mut(parent) {
                    list.remember_child(collection, child);
                }
                child
            }
        };
        self.push(Screen::list(child, caption));
        child
    }

    fn navigate_view(
        &mut self,
        list: SourceId,
        item: Value,
        view: Option<ViewType>,
    ) -> BindResult<SelectionOutcome> {
        let view = view.or_else(|| self.registry().resolve(&item.type_info()).cloned());
        let object = match (&item, view.as_ref().filter(|v| v.is_screen())) {
            (Value::Object(model), Some(view)) => view.instantiate(model),
            (Value::Object(model), None) => Some(model.clone()),
            _ => None,
        };
        let Some(object) = object else {
            tracing::debug!(target: targets::SESSION, item = ?item, "no detail view for selection");
            return Ok(SelectionOutcome::Ignored);
        };

        let parsed = self.parser.parse(&mut self.arena, &object, Some(list))?;
        let source = parsed.source;
        let previous = self.arena.list_mut(list).and_then(|l| l.replace_detail(source));
        if let Some(previous) = previous.filter(|p| *p != source && self.arena.contains(*p)) {
            self.arena.destroy(previous)?;
        }
        self.push(Screen::parsed(parsed, false));
        Ok(SelectionOutcome::Navigated { source })
    }

    fn member_row(&self, source: SourceId, section: usize, index: usize) -> Option<&MemberRow> {
        self.arena
            .view(source)?
            .sections
            .get(section)?
            .member_rows()?
            .get(index)
    }

    fn member_row_mut(&mut self, source: SourceId, section: usize, index: usize) -> Option<&mut MemberRow> {
        self.arena
            .view_mut(source)?
            .sections
            .get_mut(section)
            .and_then(Section::member_rows_mut)?
            .get_mut(index)
    }

    fn select_member(&mut self, source: SourceId, section: usize, index: usize) -> BindResult<SelectionOutcome> {
        let Some(row) = self.member_row(source, section, index) else {
            return Ok(SelectionOutcome::Ignored);
        };
        if row.busy {
            tracing::trace!(target: targets::SESSION, member = row.member.name(), "row busy, selection ignored");
            return Ok(SelectionOutcome::Ignored);
        }
        let member = row.member.clone();
        let command = row.command.clone();
        let loads_more = matches!(row.template, CellTemplate::LoadMore(_));

        if let Some(command) = command {
            if !command.can_execute() {
                tracing::trace!(target: targets::SESSION, member = member.name(), "command cannot execute");
                return Ok(SelectionOutcome::Ignored);
            }
            if loads_more {
                return self.start_load_more(source, section, index, command);
            }
            command.execute(None)?;
            return Ok(SelectionOutcome::Executed);
        }

        match (member.kind(), member.value()) {
            (MemberKind::Bool, Value::Bool(current)) if member.editable => {
                let value = Value::Bool(!current);
                member.set_value(value.clone())?;
                self.reload_requested.emit(source);
                Ok(SelectionOutcome::Changed { value })
            }
            (MemberKind::Object | MemberKind::Value, Value::Object(object)) => {
                let parsed = self.parser.parse(&mut self.arena, &object, Some(source))?;
                let source = parsed.source;
                self.push(Screen::parsed(parsed, true));
                Ok(SelectionOutcome::Navigated { source })
            }
            _ => Ok(SelectionOutcome::Ignored),
        }
    }

    fn start_load_more(
        &mut self,
        source: SourceId,
        section: usize,
        index: usize,
        command: Command,
    ) -> BindResult<SelectionOutcome> {
        if self.worker.is_none() {
            self.worker = Some(Worker::with_config(self.config.worker_config())?);
        }
        let Some(worker) = self.worker.as_ref() else {
            return Ok(SelectionOutcome::Ignored);
        };
        let Some(work) = command.begin_background() else {
            return Ok(SelectionOutcome::Ignored);
        };

        let owner = command.owner().clone();
        let sent = worker.send_to_ui(
            work,
            &self.dispatcher.handle(),
            move |session: &mut Session, apply: Apply| {
                owner.apply_background(apply);
                session.finish_load_more(source, section, index);
            },
        );
        if let Err(err) = sent {
            tracing::warn!(target: targets::SESSION, %err, "could not start load more");
            return Err(err.into());
        }

        if let Some(row) = self.member_row_mut(source, section, index) {
            row.busy = true;
        }
        tracing::debug!(target: targets::SESSION, ?source, section, index, "load more started");
        self.reload_requested.emit(source);
        Ok(SelectionOutcome::LoadStarted)
    }

    fn finish_load_more(&mut self, source: SourceId, section: usize, index: usize) {
        match self.member_row_mut(source, section, index) {
            Some(row) => row.busy = false,
            None => {
                tracing::trace!(target: targets::SESSION, ?source, "load more finished after source was torn down");
                return;
            }
        }
        tracing::debug!(target: targets::SESSION, ?source, "load more finished");
        self.reload_requested.emit(source);
    }

    /// Whether a row can be edited now.
    pub fn can_edit_row(&self, source: SourceId, section: usize, row: usize) -> bool {
        match self.arena.resolve_row(source, section, row) {
            Some(RowTarget::List { id, row }) => self.arena.list(id).is_some_and(|l| l.can_edit_row(row)),
            _ => false,
        }
    }

    /// Edit affordance of a row.
    pub fn editing_style(&self, source: SourceId, section: usize, row: usize) -> EditingStyle {
        match self.arena.resolve_row(source, section, row) {
            Some(RowTarget::List { id, .. }) => self
                .arena
                .list(id)
                .map_or(EditingStyle::None, |l| l.editing_style()),
            _ => EditingStyle::None,
        }
    }

    /// Commit an edit: runs the list's edit command with the row index. Returns
    /// whether a command ran.
    pub fn commit_edit(
        &mut self,
        source: SourceId,
        section: usize,
        row: usize,
        style: EditingStyle,
    ) -> BindResult<bool> {
        self.affinity.debug_assert_same_thread();
        let Some(RowTarget::List { id, row: local }) = self.arena.resolve_row(source, section, row) else {
            return Ok(false);
        };
        let ran = match self.arena.list(id) {
            Some(list) if list.can_edit_row(local) => list.commit_edit(local, style)?,
            _ => false,
        };
        if ran {
            self.reload_requested.emit(source);
        }
        Ok(ran)
    }

    /// Write an edited value back through the member of a row. Entry cells apply
    /// their capitalization first.
    pub fn commit_value(&mut self, source: SourceId, section: usize, row: usize, value: Value) -> BindResult<()> {
        self.affinity.debug_assert_same_thread();
        let Some(RowTarget::Member { section, index }) = self.arena.resolve_row(source, section, row) else {
            tracing::trace!(target: targets::SESSION, ?source, section, row, "commit on non-member row ignored");
            return Ok(());
        };
        let Some(member_row) = self.member_row(source, section, index) else {
            return Ok(());
        };
        let value = match (&member_row.template, value) {
            (CellTemplate::Entry(options), Value::Text(text)) => Value::Text(options.commit_text(&text)),
            (_, value) => value,
        };
        member_row.member.set_value(value)
    }

    /// Pop the top screen. The root screen is never popped.
    ///
    /// A nested list over its parent's own collection hands its selection back
    /// to the parent, which mirrors it to the view model.
    pub fn pop(&mut self) -> Option<SourceId> {
        self.affinity.debug_assert_same_thread();
        if self.stack.len() <= 1 {
            tracing::trace!(target: targets::SESSION, "pop on root screen ignored");
            return None;
        }
        let screen = self.stack.pop()?;
        let root = screen.root;

        if let (Some(parent), Some(child)) = (self.arena.parent(root), self.arena.list(root)) {
            let handback = (child.selected_item().clone(), child.selected_items().clone(), child.items());
            if let Some(list) = self.arena.list_mut(parent) {
                if list.items().ptr_eq(&handback.2) {
                    list.absorb_selection(handback.0, handback.1);
                }
            }
        }
        if screen.transient && self.arena.contains(root) {
            if let Err(err) = self.arena.destroy(root) {
                tracing::warn!(target: targets::SESSION, %err, "could not tear down popped screen");
            }
        }

        tracing::debug!(target: targets::SESSION, source = ?root, depth = self.stack.len(), "screen popped");
        self.navigated.emit(Navigation::Popped { source: root });
        if let Some(top) = self.top_root() {
            self.reload_requested.emit(top);
        }
        Some(root)
    }

    fn post(&self, action: PostAction) {
        tracing::trace!(target: targets::SESSION, ?action, "post action queued");
        self.post_actions.lock().push_back(action);
    }

    /// Actions waiting for [`drain_post_actions`](Self::drain_post_actions).
    pub fn pending_post_actions(&self) -> Vec<PostAction> {
        self.post_actions.lock().iter().copied().collect()
    }

    /// Run queued post actions. A pop whose screen is no longer on top is
    /// dropped. Returns how many actions took effect.
    pub fn drain_post_actions(&mut self) -> usize {
        self.affinity.debug_assert_same_thread();
        let _span = PerfSpan::new(span_names::POST_ACTIONS);
        let actions: Vec<PostAction> = self.post_actions.lock().drain(..).collect();
        let mut applied = 0;
        for action in actions {
            match action {
                PostAction::Pop { screen } if self.top_root() == Some(screen) => {
                    if self.pop().is_some() {
                        applied += 1;
                    }
                }
                PostAction::Reload { source } if self.arena.contains(source) => {
                    self.reload_requested.emit(source);
                    applied += 1;
                }
                action => {
                    tracing::trace!(target: targets::SESSION, ?action, "stale post action dropped");
                }
            }
        }
        applied
    }

    /// Run completions posted by the worker. Returns how many ran. A closed
    /// session runs nothing.
    pub fn process_pending(&mut self) -> usize {
        self.affinity.debug_assert_same_thread();
        if self.closed {
            return 0;
        }
        let jobs = self.dispatcher.take_pending();
        let count = jobs.len();
        for job in jobs {
            job(self);
        }
        count
    }

    /// Tasks queued on or running in the load-more worker.
    pub fn background_tasks(&self) -> usize {
        self.worker.as_ref().map_or(0, Worker::pending_tasks)
    }

    /// Tear the session down: queued actions and completions are discarded, the
    /// worker stops and every source is dropped.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.post_actions.lock().clear();
        self.dispatcher.close();
        if let Some(worker) = self.worker.take() {
            worker.stop();
        }
        self.stack.clear();
        self.arena.clear();
        tracing::debug!(target: targets::SESSION, "session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
