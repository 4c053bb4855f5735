//! Integration tests for schema parsing and the view registry.

use std::sync::Arc;

use tableau::member::order;
use tableau::prelude::*;
use tableau::template::CellTemplate;

fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("tableau=trace")
        .try_init();
}

fn session() -> Session {
    Session::new(Arc::new(ViewRegistry::with_defaults()), SessionConfig::default())
}

struct Account {
    login: String,
    display_name: String,
    email: String,
    verified: bool,
    age: i64,
    pinned: String,
}

impl Account {
    fn sample() -> Self {
        Self {
            login: "ada".into(),
            display_name: "Ada Lovelace".into(),
            email: "ada@example.org".into(),
            verified: true,
            age: 36,
            pinned: "top".into(),
        }
    }
}

impl Bindable for Account {
    fn describe(schema: &mut Schema<Self>) {
        schema.field("login", |a: &Self| &a.login, |a: &mut Self| &mut a.login);
        schema
            .field("display_name", |a: &Self| &a.display_name, |a: &mut Self| &mut a.display_name)
            .order(2);
        schema.field("email", |a: &Self| &a.email, |a: &mut Self| &mut a.email);
        schema
            .field("verified", |a: &Self| &a.verified, |a: &mut Self| &mut a.verified)
            .order(0);
        schema.field("age", |a: &Self| &a.age, |a: &mut Self| &mut a.age);
        schema
            .field("pinned", |a: &Self| &a.pinned, |a: &mut Self| &mut a.pinned)
            .order(order::FIRST);
    }
}

fn row_texts(session: &mut Session, source: SourceId) -> Vec<Vec<String>> {
    (0..session.section_count(source))
        .map(|section| {
            (0..session.row_count(source, section))
                .map(|row| session.cell(source, section, row).map(|c| c.text).unwrap_or_default())
                .collect()
        })
        .collect()
}

#[test]
fn test_reparse_is_stable() {
    setup();
    let account = ObjectRef::new(Account::sample());

    let mut first = session();
    let a = first.present(&account).unwrap();
    let mut second = session();
    let b = second.present(&account).unwrap();

    let rows = row_texts(&mut first, a);
    assert_eq!(rows, row_texts(&mut second, b));

    let again = first.present(&account).unwrap();
    assert_eq!(row_texts(&mut first, again), rows);
}

#[test]
fn test_first_sentinel_sorts_before_defaults() {
    setup();
    let account = ObjectRef::new(Account::sample());
    let mut session = session();
    let root = session.present(&account).unwrap();

    let rows = row_texts(&mut session, root);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "Pinned");
    assert_eq!(rows[0].len(), 6);
}

#[test]
fn test_explicit_and_default_order_keys_interleave() {
    setup();
    let account = ObjectRef::new(Account::sample());
    let mut session = session();
    let root = session.present(&account).unwrap();

    // login=1, display_name=4, email=3, verified=0, age=5, pinned=FIRST
    assert_eq!(
        row_texts(&mut session, root)[0],
        vec!["Pinned", "Verified", "Login", "Email", "Display Name", "Age"]
    );
}

struct Steps {
    alpha: i64,
    bravo: i64,
    charlie: i64,
    delta: i64,
}

impl Steps {
    fn new() -> Self {
        Self {
            alpha: 1,
            bravo: 2,
            charlie: 3,
            delta: 4,
        }
    }
}

struct SparseOrder(Steps);

impl Bindable for SparseOrder {
    fn describe(schema: &mut Schema<Self>) {
        schema.field("alpha", |s: &Self| &s.0.alpha, |s: &mut Self| &mut s.0.alpha);
        schema
            .field("bravo", |s: &Self| &s.0.bravo, |s: &mut Self| &mut s.0.bravo)
            .order(10);
        schema.field("charlie", |s: &Self| &s.0.charlie, |s: &mut Self| &mut s.0.charlie);
        schema
            .field("delta", |s: &Self| &s.0.delta, |s: &mut Self| &mut s.0.delta)
            .order(1);
    }
}

#[test]
fn test_defaults_follow_discovery_order_not_explicit_keys() {
    setup();
    let steps = ObjectRef::new(SparseOrder(Steps::new()));
    let mut session = session();
    let root = session.present(&steps).unwrap();

    // alpha=1, bravo=20, charlie=3, delta=2
    assert_eq!(
        row_texts(&mut session, root)[0],
        vec!["Alpha", "Delta", "Charlie", "Bravo"]
    );
}

struct HugeOrder(Steps);

impl Bindable for HugeOrder {
    fn describe(schema: &mut Schema<Self>) {
        schema
            .field("alpha", |s: &Self| &s.0.alpha, |s: &mut Self| &mut s.0.alpha)
            .order(1_500_000_000);
        schema.field("bravo", |s: &Self| &s.0.bravo, |s: &mut Self| &mut s.0.bravo);
        schema.field("charlie", |s: &Self| &s.0.charlie, |s: &mut Self| &mut s.0.charlie);
        schema
            .field("delta", |s: &Self| &s.0.delta, |s: &mut Self| &mut s.0.delta)
            .order(i32::MIN / 2 - 1);
    }
}

#[test]
fn test_out_of_range_orders_pin_to_the_ends() {
    setup();
    let steps = ObjectRef::new(HugeOrder(Steps::new()));
    let mut session = session();
    let root = session.present(&steps).unwrap();

    assert_eq!(
        row_texts(&mut session, root)[0],
        vec!["Delta", "Bravo", "Charlie", "Alpha"]
    );
}

struct Pinned(Steps);

impl Bindable for Pinned {
    fn describe(schema: &mut Schema<Self>) {
        schema
            .field("alpha", |s: &Self| &s.0.alpha, |s: &mut Self| &mut s.0.alpha)
            .last();
        schema.field("bravo", |s: &Self| &s.0.bravo, |s: &mut Self| &mut s.0.bravo);
        schema
            .field("charlie", |s: &Self| &s.0.charlie, |s: &mut Self| &mut s.0.charlie)
            .order(i32::MAX / 2);
        schema
            .field("delta", |s: &Self| &s.0.delta, |s: &mut Self| &mut s.0.delta)
            .first();
    }
}

#[test]
fn test_last_sentinel_sorts_after_defaults_and_explicit_keys() {
    setup();
    let steps = ObjectRef::new(Pinned(Steps::new()));
    let mut session = session();
    let root = session.present(&steps).unwrap();

    assert_eq!(
        row_texts(&mut session, root)[0],
        vec!["Delta", "Bravo", "Charlie", "Alpha"]
    );
}

struct Library {
    shelves: ValueList,
    wishlist: ValueList,
}

impl Bindable for Library {
    fn describe(schema: &mut Schema<Self>) {
        schema
            .field("shelves", |l: &Self| &l.shelves, |l: &mut Self| &mut l.shelves)
            .section("Shelves");
        schema
            .field("wishlist", |l: &Self| &l.wishlist, |l: &mut Self| &mut l.wishlist)
            .section("Wishlist");
    }
}

#[test]
fn test_two_lists_in_own_sections() {
    setup();
    let library = ObjectRef::new(Library {
        shelves: ["Fiction", "Poetry", "History"].into_iter().collect(),
        wishlist: ValueList::new(),
    });
    let mut session = session();
    let root = session.present(&library).unwrap();

    assert_eq!(session.section_count(root), 2);
    assert_eq!(session.row_count(root, 0), 3);
    assert_eq!(session.row_count(root, 1), 0);
    assert_eq!(session.header(root, 0), Some("Shelves"));
    assert_eq!(session.header(root, 1), Some("Wishlist"));
    assert_eq!(session.cell(root, 0, 2).unwrap().text, "History");
    assert!(session.cell(root, 1, 0).is_none());
}

#[test]
fn test_list_rows_track_live_collection() {
    setup();
    let shelves: ValueList = ["Fiction"].into_iter().collect();
    let library = ObjectRef::new(Library {
        shelves: shelves.clone(),
        wishlist: ValueList::new(),
    });
    let mut session = session();
    let root = session.present(&library).unwrap();
    assert_eq!(session.row_count(root, 0), 1);

    shelves.push("Poetry");
    assert_eq!(session.row_count(root, 0), 2);
    assert_eq!(session.cell(root, 0, 1).unwrap().text, "Poetry");
}

struct ExpandedCatalog {
    items: ValueList,
}

struct SummaryCatalog {
    items: ValueList,
}

impl Bindable for ExpandedCatalog {
    fn describe(schema: &mut Schema<Self>) {
        schema.field("items", |c: &Self| &c.items, |c: &mut Self| &mut c.items);
    }
}

impl Bindable for SummaryCatalog {
    fn describe(schema: &mut Schema<Self>) {
        schema
            .field("items", |c: &Self| &c.items, |c: &mut Self| &mut c.items)
            .list(ListOptions::new().display(DisplayMode::RootCell));
    }
}

#[test]
fn test_row_count_in_expanded_and_summary_mode() {
    setup();
    for len in [0usize, 1, 2, 7] {
        let items: ValueList = (0..len as i64).collect();

        let expanded = ObjectRef::new(ExpandedCatalog { items: items.clone() });
        let mut session = session();
        let list = session.present_member(&expanded, "items").unwrap().unwrap();
        assert_eq!(session.row_count(list, 0), len);

        let summary = ObjectRef::new(SummaryCatalog { items });
        let list = session.present_member(&summary, "items").unwrap().unwrap();
        assert_eq!(session.row_count(list, 0), 1);
    }
}

#[test]
fn test_present_member_rejects_scalars() {
    setup();
    let account = ObjectRef::new(Account::sample());
    let mut session = session();
    assert_eq!(session.present_member(&account, "login").unwrap(), None);

    let err = session.present_member(&account, "missing").unwrap_err();
    assert!(matches!(err, BindError::MissingMember { .. }));
}

struct Marker;

#[test]
fn test_registering_non_displayable_view_fails() {
    setup();
    let mut registry = ViewRegistry::new();
    let err = registry.register::<Marker>(ViewType::named("blank")).unwrap_err();
    assert!(matches!(err, BindError::NotDisplayable(ref name) if name == "blank"));
    assert!(registry.is_empty());

    registry
        .register::<Marker>(ViewType::cell("badge", CellTemplate::Caption))
        .unwrap();
    assert_eq!(registry.len(), 1);
}

struct Tagged {
    rating: i64,
}

impl Bindable for Tagged {
    fn describe(schema: &mut Schema<Self>) {
        schema
            .field("rating", |t: &Self| &t.rating, |t: &mut Self| &mut t.rating)
            .marker::<Marker>()
            .row_height(60.0);
    }
}

#[test]
fn test_marker_view_and_row_height() {
    setup();
    let mut registry = ViewRegistry::with_defaults();
    registry
        .register::<Marker>(ViewType::cell("stars", CellTemplate::Toggle))
        .unwrap();
    let mut session = Session::new(Arc::new(registry), SessionConfig::default());

    let tagged = ObjectRef::new(Tagged { rating: 4 });
    let root = session.present(&tagged).unwrap();
    let cell = session.cell(root, 0, 0).unwrap();
    assert_eq!(cell.template, CellTemplate::Toggle);
    assert_eq!(cell.detail.as_deref(), Some("4"));
    assert_eq!(session.row_height(root, 0, 0), 60.0);
}

#[test]
fn test_default_row_height_from_config() {
    setup();
    let account = ObjectRef::new(Account::sample());
    let mut session = Session::new(
        Arc::new(ViewRegistry::with_defaults()),
        SessionConfig::default().with_default_row_height(50.0),
    );
    let root = session.present(&account).unwrap();
    assert_eq!(session.row_height(root, 0, 0), 50.0);
}
