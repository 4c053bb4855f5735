//! Integration tests for `#[derive(Bindable)]` and `#[derive(BindableEnum)]`.

use std::sync::Arc;

use tableau::member::{MemberKind, order};
use tableau::prelude::*;
use tableau::{FieldValue, TypeSchema};

fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("tableau=debug")
        .try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, BindableEnum)]
enum Priority {
    Low,
    Normal,
    Urgent,
}

#[derive(Bindable)]
struct Device {
    name: String,
}

#[derive(Bindable)]
#[bindable(caption = "Task", with = Task::commands)]
struct Task {
    #[bind(first, caption = "Summary")]
    title: String,

    #[bind(order = 2, read_only)]
    created: String,

    done: bool,

    priority: Priority,

    archived: usize,

    #[bind(section = "Devices", footer = "Synced hourly", element = Device)]
    devices: ValueList,

    #[bind(section = "Labels", row_height = 30.0, list = ListOptions::new().action(SelectionAction::Multiselection).selected_items("chosen"))]
    labels: ValueList,

    #[bind(skip)]
    chosen: Value,

    #[bind(ignore)]
    cache: Vec<u8>,

    _scratch: u32,
}

impl Task {
    fn commands(schema: &mut Schema<Self>) {
        schema
            .method("archive", |t: &mut Self| t.archived += 1)
            .toolbar(ButtonOptions::new());
    }

    fn sample() -> Self {
        Self {
            title: "Write docs".into(),
            created: "today".into(),
            done: false,
            priority: Priority::Normal,
            archived: 0,
            devices: ValueList::new(),
            labels: ["home", "work"].into_iter().collect(),
            chosen: Value::None,
            cache: Vec::new(),
            _scratch: 0,
        }
    }
}

#[test]
fn test_derived_schema_members() {
    setup();
    let schema = TypeSchema::of::<Task>();
    assert_eq!(schema.caption(), Some("Task"));

    let names: Vec<&str> = schema.members().iter().map(|m| m.name()).collect();
    assert_eq!(
        names,
        vec!["title", "created", "done", "priority", "archived", "devices", "labels", "chosen", "archive"]
    );

    let title = schema.member("title").unwrap();
    assert_eq!(title.attrs().order, Some(order::FIRST));
    assert_eq!(title.caption(), "Summary");
    assert!(!schema.member("created").unwrap().is_writable());
    assert!(schema.member("priority").unwrap().kind().is_collection());
    assert_eq!(schema.member("devices").unwrap().attrs().row_height, None);
    assert_eq!(schema.member("labels").unwrap().attrs().row_height, Some(30.0));
    assert!(schema.member("chosen").unwrap().attrs().skip);
    assert!(schema.member("cache").is_none());
}

#[test]
fn test_derived_type_presents() {
    setup();
    let task = ObjectRef::new(Task::sample());
    let mut session = Session::new(Arc::new(ViewRegistry::with_defaults()), SessionConfig::default());
    let root = session.present(&task).unwrap();

    assert_eq!(session.section_count(root), 3);
    assert_eq!(session.row_count(root, 0), 5);
    assert_eq!(session.cell(root, 0, 0).unwrap().text, "Summary");
    assert_eq!(session.header(root, 1), Some("Devices"));
    assert_eq!(session.footer(root, 1), Some("Synced hourly"));
    assert_eq!(session.row_count(root, 1), 0);
    assert_eq!(session.row_count(root, 2), 2);
    assert_eq!(session.row_height(root, 2, 0), 30.0);

    session.select(root, 2, 1).unwrap();
    let Some(Value::List(chosen)) = task.get("chosen") else {
        panic!("labels selection was not mirrored");
    };
    assert_eq!(chosen.snapshot(), vec![Value::from("work")]);

    let toolbar = session.top().unwrap().toolbar();
    let archive = toolbar.last().and_then(|item| item.as_button()).unwrap();
    assert_eq!(archive.caption, "Archive");
    archive.command.execute(None).unwrap();
    assert_eq!(task.read(|t: &Task| t.archived), Some(1));
}

#[test]
fn test_read_only_field_rejects_writes() {
    setup();
    let task = ObjectRef::new(Task::sample());
    let err = task.set("created", "yesterday").unwrap_err();
    assert!(matches!(err, BindError::ReadOnly { .. }));
    assert_eq!(task.get("created"), Some(Value::from("today")));
}

#[test]
fn test_derived_enum() {
    assert_eq!(Priority::VARIANTS, &[Priority::Low, Priority::Normal, Priority::Urgent]);
    assert_eq!(Priority::NAMES, &["Low", "Normal", "Urgent"]);
    assert_eq!(Priority::Urgent.index(), 2);

    let value = Priority::Urgent.to_value();
    assert_eq!(value.to_string(), "Urgent");
    assert_eq!(Priority::from_value(value), Some(Priority::Urgent));
    assert_eq!(Priority::from_value(Value::Int(2)), None);
    assert!(matches!(Priority::kind(), MemberKind::Enum(_)));
}

#[test]
fn test_enum_field_round_trips_through_object() {
    setup();
    let task = ObjectRef::new(Task::sample());
    task.set("priority", EnumValue::of(Priority::Low)).unwrap();
    assert_eq!(task.read(|t: &Task| t.priority), Some(Priority::Low));
}

trait Archivable {}

#[derive(Bindable)]
#[bindable(extend = Device, implements = dyn Archivable, display = Phone::label)]
struct Phone {
    name: String,
    number: String,
}

impl Phone {
    fn label(&self) -> String {
        format!("{} ({})", self.name, self.number)
    }
}

#[test]
fn test_type_level_attributes() {
    setup();
    let info = <Phone as Bindable>::type_info();
    assert_eq!(info.base().map(|b| b.name()), Some("Device"));
    assert_eq!(info.interfaces().len(), 1);

    let phone = ObjectRef::new(Phone {
        name: "Work".into(),
        number: "555".into(),
    });
    assert_eq!(phone.display(), "Work (555)");
    assert_eq!(Value::from(phone).to_string(), "Work (555)");
}
