//! Integration tests for the presentation session: commands, editing, load
//! more, screens and teardown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tableau::bar::BarItem;
use tableau::prelude::*;
use tableau::template::Capitalization;
use tableau::{BindError, PostAction};

fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("tableau=trace,tableau_core=debug")
        .try_init();
}

fn session() -> Session {
    Session::new(Arc::new(ViewRegistry::with_defaults()), SessionConfig::default())
}

struct Inbox {
    messages: ValueList,
    pages: usize,
    gate: Arc<AtomicBool>,
}

impl Inbox {
    fn new() -> Self {
        Self {
            messages: ["welcome"].into_iter().collect(),
            pages: 0,
            gate: Arc::new(AtomicBool::new(true)),
        }
    }

    fn next_page(&self) -> (usize, Arc<AtomicBool>) {
        (self.pages + 1, self.gate.clone())
    }

    fn fetch_page((page, gate): (usize, Arc<AtomicBool>)) -> (usize, String) {
        while !gate.load(Ordering::Acquire) {
            thread::sleep(Duration::from_millis(1));
        }
        (page, format!("page {page}"))
    }

    fn append_page(&mut self, (page, message): (usize, String)) {
        self.pages = page;
        self.messages.push(message);
    }
}

impl Bindable for Inbox {
    fn describe(schema: &mut Schema<Self>) {
        schema
            .field("messages", |i: &Self| &i.messages, |i: &mut Self| &mut i.messages)
            .section("Messages");
        schema
            .field("pages", |i: &Self| &i.pages, |i: &mut Self| &mut i.pages)
            .skip();
        schema
            .background_method("fetch_page", Inbox::next_page, Inbox::fetch_page, Inbox::append_page)
            .section("More")
            .load_more(LoadMoreOptions::new("Load more", "Loading..."));
    }
}

fn wait_for_completion(session: &mut Session) -> usize {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let ran = session.process_pending();
        if ran > 0 || Instant::now() > deadline {
            return ran;
        }
        thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn test_load_more_runs_on_worker() {
    setup();
    let inbox = Inbox::new();
    let gate = inbox.gate.clone();
    gate.store(false, Ordering::Release);
    let inbox = ObjectRef::new(inbox);
    let mut session = session();
    let root = session.present(&inbox).unwrap();

    assert_eq!(session.section_count(root), 2);
    assert_eq!(session.cell(root, 1, 0).unwrap().text, "Load more");

    assert_eq!(session.select(root, 1, 0).unwrap(), SelectionOutcome::LoadStarted);
    let busy = session.cell(root, 1, 0).unwrap();
    assert!(busy.busy);
    assert_eq!(busy.text, "Loading...");
    assert_eq!(session.select(root, 1, 0).unwrap(), SelectionOutcome::Ignored);
    assert_eq!(session.background_tasks(), 1);

    gate.store(true, Ordering::Release);
    assert_eq!(wait_for_completion(&mut session), 1);

    let idle = session.cell(root, 1, 0).unwrap();
    assert!(!idle.busy);
    assert_eq!(idle.text, "Load more");
    assert_eq!(session.row_count(root, 0), 2);
    assert_eq!(session.cell(root, 0, 1).unwrap().text, "page 1");
}

#[test]
fn test_ui_reads_do_not_wait_for_load_more() {
    setup();
    let inbox = Inbox::new();
    let gate = inbox.gate.clone();
    gate.store(false, Ordering::Release);
    let inbox = ObjectRef::new(inbox);
    let mut session = session();
    let root = session.present(&inbox).unwrap();
    session.select(root, 1, 0).unwrap();

    let release = gate.clone();
    let opener = thread::spawn(move || {
        thread::sleep(Duration::from_secs(2));
        release.store(true, Ordering::Release);
    });

    let started = Instant::now();
    assert_eq!(session.cell(root, 0, 0).unwrap().text, "welcome");
    assert_eq!(session.row_count(root, 0), 1);
    assert_eq!(inbox.get("pages"), Some(Value::Int(0)));
    inbox.set("pages", Value::Int(4)).unwrap();
    assert!(
        started.elapsed() < Duration::from_secs(1),
        "UI thread waited {:?} on background work",
        started.elapsed()
    );
    assert!(session.cell(root, 1, 0).unwrap().busy);

    opener.join().unwrap();
    assert_eq!(wait_for_completion(&mut session), 1);
    assert_eq!(inbox.get("pages"), Some(Value::Int(1)));
    assert_eq!(session.cell(root, 0, 1).unwrap().text, "page 1");
}

#[test]
fn test_load_more_needs_background_method() {
    setup();

    struct Feed {
        loaded: usize,
    }

    impl Bindable for Feed {
        fn describe(schema: &mut Schema<Self>) {
            schema
                .method("load", |f: &mut Self| f.loaded += 1)
                .load_more(LoadMoreOptions::default());
        }
    }

    let feed = ObjectRef::new(Feed { loaded: 0 });
    let err = session().present(&feed).unwrap_err();
    assert!(matches!(err, BindError::NotBackground { ref member, .. } if member == "load"));
}

#[test]
fn test_load_more_reloads_on_completion() {
    setup();
    let inbox = ObjectRef::new(Inbox::new());
    let mut session = session();
    let root = session.present(&inbox).unwrap();

    let reloads = Arc::new(AtomicUsize::new(0));
    let counter = reloads.clone();
    session.reload_requested().connect(move |_: &SourceId| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    session.select(root, 1, 0).unwrap();
    assert_eq!(reloads.load(Ordering::SeqCst), 1);
    assert_eq!(wait_for_completion(&mut session), 1);
    assert_eq!(reloads.load(Ordering::SeqCst), 2);
}

#[test]
fn test_close_discards_pending_work() {
    setup();
    let inbox = ObjectRef::new(Inbox::new());
    let mut session = session();
    let root = session.present(&inbox).unwrap();
    session.select(root, 1, 0).unwrap();

    session.close();
    assert!(session.is_closed());
    assert_eq!(session.process_pending(), 0);
    assert_eq!(session.drain_post_actions(), 0);
    assert_eq!(session.select(root, 1, 0).unwrap(), SelectionOutcome::Ignored);
    assert!(session.arena().is_empty());
    assert!(session.present(&inbox).is_err());
}

struct Preferences {
    nickname: String,
    sync: bool,
    can_save: bool,
    saved: usize,
}

impl Preferences {
    fn new() -> Self {
        Self {
            nickname: String::new(),
            sync: false,
            can_save: false,
            saved: 0,
        }
    }
}

impl Bindable for Preferences {
    fn describe(schema: &mut Schema<Self>) {
        schema
            .field("nickname", |p: &Self| &p.nickname, |p: &mut Self| &mut p.nickname)
            .entry(EntryOptions::new().capitalization(Capitalization::AllCharacters));
        schema.field("sync", |p: &Self| &p.sync, |p: &mut Self| &mut p.sync);
        schema
            .field("can_save", |p: &Self| &p.can_save, |p: &mut Self| &mut p.can_save)
            .skip();
        schema
            .method("save", |p: &mut Self| p.saved += 1)
            .button(ButtonOptions::new().can_execute("can_save"));
        schema
            .method("discard", |p: &mut Self| p.saved = 0)
            .toolbar(ButtonOptions::new().caption("Discard").placement(BarPlacement::Center));
        schema
            .method("close", |_: &mut Self| {})
            .navbar(ButtonOptions::new().placement(BarPlacement::Left));
        schema.method("refresh", |_: &mut Self| {}).pull_to_refresh("preferences.refreshed");
    }
}

#[test]
fn test_bool_row_toggles() {
    setup();
    let prefs = ObjectRef::new(Preferences::new());
    let mut session = session();
    let root = session.present(&prefs).unwrap();

    assert_eq!(session.cell(root, 0, 1).unwrap().template, CellTemplate::Toggle);
    assert_eq!(
        session.select(root, 0, 1).unwrap(),
        SelectionOutcome::Changed { value: Value::Bool(true) }
    );
    assert_eq!(prefs.read(|p: &Preferences| p.sync), Some(true));
}

#[test]
fn test_button_honors_gate() {
    setup();
    let prefs = ObjectRef::new(Preferences::new());
    let mut session = session();
    let root = session.present(&prefs).unwrap();

    let cell = session.cell(root, 0, 2).unwrap();
    assert_eq!(cell.template, CellTemplate::Button);
    assert!(!cell.enabled);
    assert_eq!(session.select(root, 0, 2).unwrap(), SelectionOutcome::Ignored);

    prefs.set("can_save", true).unwrap();
    assert!(session.cell(root, 0, 2).unwrap().enabled);
    assert_eq!(session.select(root, 0, 2).unwrap(), SelectionOutcome::Executed);
    assert_eq!(prefs.read(|p: &Preferences| p.saved), Some(1));
}

#[test]
fn test_bars_and_refresh() {
    setup();
    let prefs = ObjectRef::new(Preferences::new());
    let mut session = session();
    session.present(&prefs).unwrap();

    let screen = session.top().unwrap();
    assert_eq!(screen.caption(), "Preferences");
    let toolbar: Vec<Option<&str>> = screen
        .toolbar()
        .iter()
        .map(|item| item.as_button().map(|b| b.caption.as_str()))
        .collect();
    assert_eq!(toolbar, vec![None, Some("Discard"), None]);
    assert!(matches!(screen.toolbar()[0], BarItem::FlexibleSpace));
    assert_eq!(screen.navbar().left.len(), 1);
    assert_eq!(screen.navbar().left[0].caption, "Close");
    assert_eq!(
        screen.refresh().map(|r| r.settings_key.as_str()),
        Some("preferences.refreshed")
    );

    // bar members are not rows
    assert_eq!(session.row_count(screen.root(), 0), 3);
}

#[test]
fn test_commit_value_applies_entry_options() {
    setup();
    let prefs = ObjectRef::new(Preferences::new());
    let mut session = session();
    let root = session.present(&prefs).unwrap();

    session.commit_value(root, 0, 0, Value::from("ada")).unwrap();
    assert_eq!(prefs.get("nickname"), Some(Value::from("ADA")));
    assert_eq!(session.cell(root, 0, 0).unwrap().detail.as_deref(), Some("ADA"));

    let err = session.commit_value(root, 0, 1, Value::from("yes")).unwrap_err();
    assert!(matches!(err, BindError::ValueMismatch { .. }));
}

struct Playlist {
    tracks: ValueList,
    locked: bool,
    removed: Arc<Mutex<Vec<i64>>>,
}

impl Bindable for Playlist {
    fn describe(schema: &mut Schema<Self>) {
        schema.cell_editing(
            CellEditing::new(EditingStyle::Delete)
                .can_edit("unlocked")
                .command("remove_track"),
        );
        schema.field("tracks", |p: &Self| &p.tracks, |p: &mut Self| &mut p.tracks);
        schema.computed("unlocked", |p: &Self| !p.locked).skip();
        schema.method_with_param("remove_track", |p: &mut Self, row: &Value| {
            if let Some(index) = row.as_int() {
                p.removed.lock().push(index);
                p.tracks.remove(index as usize);
            }
        });
    }
}

#[test]
fn test_row_editing() {
    setup();
    let removed = Arc::new(Mutex::new(Vec::new()));
    let playlist = ObjectRef::new(Playlist {
        tracks: ["intro", "verse", "outro"].into_iter().collect(),
        locked: false,
        removed: removed.clone(),
    });
    let mut session = session();
    let list = session.present(&playlist).unwrap();

    assert!(session.can_edit_row(list, 0, 1));
    assert_eq!(session.editing_style(list, 0, 1), EditingStyle::Delete);
    assert!(!session.commit_edit(list, 0, 1, EditingStyle::None).unwrap());
    assert!(session.commit_edit(list, 0, 1, EditingStyle::Delete).unwrap());
    assert_eq!(*removed.lock(), vec![1]);
    assert_eq!(session.row_count(list, 0), 2);

    playlist.write(|p: &mut Playlist| p.locked = true);
    assert!(!session.can_edit_row(list, 0, 0));
    assert!(!session.commit_edit(list, 0, 0, EditingStyle::Delete).unwrap());
}

#[test]
fn test_edit_gate_must_be_bool() {
    setup();

    struct Odd {
        rows: ValueList,
        flag: i64,
    }

    impl Bindable for Odd {
        fn describe(schema: &mut Schema<Self>) {
            schema
                .field("rows", |o: &Self| &o.rows, |o: &mut Self| &mut o.rows)
                .cell_editing(CellEditing::new(EditingStyle::Delete).can_edit("flag"));
            schema.field("flag", |o: &Self| &o.flag, |o: &mut Self| &mut o.flag).skip();
        }
    }

    let odd = ObjectRef::new(Odd {
        rows: ValueList::new(),
        flag: 1,
    });
    let err = session().present(&odd).unwrap_err();
    assert!(matches!(err, BindError::GateNotBool { .. }));
}

struct Address {
    city: String,
}

impl Bindable for Address {
    fn describe(schema: &mut Schema<Self>) {
        schema.field("city", |a: &Self| &a.city, |a: &mut Self| &mut a.city);
    }
}

struct Person {
    name: String,
    home: ObjectRef,
}

impl Bindable for Person {
    fn describe(schema: &mut Schema<Self>) {
        schema.field("name", |p: &Self| &p.name, |p: &mut Self| &mut p.name);
        schema.field("home", |p: &Self| &p.home, |p: &mut Self| &mut p.home);
    }
}

#[test]
fn test_object_member_pushes_transient_screen() {
    setup();
    let person = ObjectRef::new(Person {
        name: "Ada".into(),
        home: ObjectRef::new(Address { city: "London".into() }),
    });
    let mut session = session();
    let root = session.present(&person).unwrap();

    let pushed = Arc::new(Mutex::new(Vec::new()));
    let capture = pushed.clone();
    session.navigated().connect(move |nav: &Navigation| capture.lock().push(nav.clone()));

    let SelectionOutcome::Navigated { source: detail } = session.select(root, 0, 1).unwrap() else {
        panic!("expected the address screen");
    };
    assert_eq!(session.top().unwrap().caption(), "Address");
    assert_eq!(session.cell(detail, 0, 0).unwrap().detail.as_deref(), Some("London"));

    session.pop();
    assert!(!session.arena().contains(detail));
    assert_eq!(
        *pushed.lock(),
        vec![
            Navigation::Pushed {
                source: detail,
                caption: "Address".into()
            },
            Navigation::Popped { source: detail },
        ]
    );
}

struct Track {
    title: String,
}

impl Bindable for Track {
    fn describe(schema: &mut Schema<Self>) {
        schema.field("title", |t: &Self| &t.title, |t: &mut Self| &mut t.title);
    }

    fn display(&self) -> String {
        self.title.clone()
    }
}

struct Album {
    tracks: ValueList,
}

impl Bindable for Album {
    fn describe(schema: &mut Schema<Self>) {
        schema
            .field("tracks", |a: &Self| &a.tracks, |a: &mut Self| &mut a.tracks)
            .list(ListOptions::new().action(SelectionAction::NavigateToView));
    }
}

#[test]
fn test_detail_view_replaces_previous_detail() {
    setup();
    let album = ObjectRef::new(Album {
        tracks: ["One", "Two"]
            .into_iter()
            .map(|title| ObjectRef::new(Track { title: title.into() }))
            .collect(),
    });
    let mut session = session();
    let list = session.present(&album).unwrap();

    let SelectionOutcome::Navigated { source: first } = session.select(list, 0, 0).unwrap() else {
        panic!("expected a detail screen");
    };
    assert_eq!(session.cell(first, 0, 0).unwrap().detail.as_deref(), Some("One"));
    session.pop();
    assert!(session.arena().contains(first));

    let SelectionOutcome::Navigated { source: second } = session.select(list, 0, 1).unwrap() else {
        panic!("expected a detail screen");
    };
    assert_ne!(first, second);
    assert!(!session.arena().contains(first));
    assert_eq!(session.cell(second, 0, 0).unwrap().detail.as_deref(), Some("Two"));
}

struct Summary {
    total: i64,
}

impl Bindable for Summary {
    fn describe(schema: &mut Schema<Self>) {
        schema.field("total", |s: &Self| &s.total, |s: &mut Self| &mut s.total);
    }
}

struct SummaryScreen {
    heading: String,
}

impl Bindable for SummaryScreen {
    fn describe(schema: &mut Schema<Self>) {
        schema.caption("Overview");
        schema.field("heading", |s: &Self| &s.heading, |s: &mut Self| &mut s.heading);
    }
}

#[test]
fn test_registered_screen_replaces_root() {
    setup();
    let mut registry = ViewRegistry::with_defaults();
    registry
        .register::<Summary>(ViewType::screen(|model: &ObjectRef| SummaryScreen {
            heading: format!("Total: {}", model.get("total").unwrap_or_default()),
        }))
        .unwrap();
    let mut session = Session::new(Arc::new(registry), SessionConfig::default());

    let summary = ObjectRef::new(Summary { total: 12 });
    let root = session.present(&summary).unwrap();
    assert_eq!(session.top().unwrap().caption(), "Overview");
    assert_eq!(session.cell(root, 0, 0).unwrap().detail.as_deref(), Some("Total: 12"));
}

#[test]
fn test_post_actions_are_queued_until_drained() {
    setup();

    #[derive(Debug, Clone, Copy, PartialEq, Eq, BindableEnum)]
    enum Size {
        Small,
        Large,
    }

    struct Order {
        size: Size,
    }

    impl Bindable for Order {
        fn describe(schema: &mut Schema<Self>) {
            schema.field("size", |o: &Self| &o.size, |o: &mut Self| &mut o.size);
        }
    }

    let order = ObjectRef::new(Order { size: Size::Small });
    let mut session = session();
    let root = session.present(&order).unwrap();
    let SelectionOutcome::Navigated { source: picker } = session.select(root, 0, 0).unwrap() else {
        panic!("expected the variant picker");
    };
    session.select(picker, 0, 1).unwrap();

    assert_eq!(session.pending_post_actions(), vec![PostAction::Pop { screen: picker }]);
    assert_eq!(order.read(|o: &Order| o.size), Some(Size::Large));
    assert_eq!(session.drain_post_actions(), 1);
    assert!(session.pending_post_actions().is_empty());
    assert_eq!(session.top().unwrap().root(), root);
}

#[test]
fn test_debug_tree_lists_screens() {
    setup();
    let person = ObjectRef::new(Person {
        name: "Ada".into(),
        home: ObjectRef::new(Address { city: "London".into() }),
    });
    let mut session = session();
    let root = session.present(&person).unwrap();
    session.select(root, 0, 1).unwrap();

    let dump = session.debug_tree().hide_ids().to_string();
    assert!(dump.starts_with("Source tree (2 sources):"));
    assert!(dump.contains("Person (view: 1 sections)"));
    assert!(dump.contains("Address (view: 1 sections)"));
}
