//! Tableau - a declarative MVVM binder for table views.
//!
//! Tableau turns plain view-model objects into navigable table screens. Each
//! bindable type describes its members once (order, section, caption, list and
//! button directives); the [`MemberParser`] turns an object into sections and
//! rows, [`ListSource`]s handle selection and drill-down over collections, and
//! a [`Session`] drives the whole navigation stack for a presentation surface.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tableau::prelude::*;
//!
//! #[derive(Bindable)]
//! struct Settings {
//!     #[bind(order = 1)]
//!     user_name: String,
//!     #[bind(order = 0)]
//!     notifications: bool,
//!     #[bind(section = "Devices")]
//!     devices: ValueList,
//! }
//!
//! let settings = ObjectRef::new(Settings {
//!     user_name: "ada".into(),
//!     notifications: true,
//!     devices: ["Phone", "Tablet"].into_iter().collect(),
//! });
//!
//! let mut session = Session::new(Arc::new(ViewRegistry::with_defaults()), SessionConfig::default());
//! let root = session.present(&settings).unwrap();
//! assert_eq!(session.section_count(root), 2);
//! assert_eq!(session.cell(root, 0, 0).unwrap().text, "Notifications");
//! assert_eq!(session.header(root, 1), Some("Devices"));
//! assert_eq!(session.row_count(root, 1), 2);
//! ```

extern crate self as tableau;

pub mod bar;
pub mod command;
pub mod config;
pub mod debug;
pub mod error;
pub mod member;
pub mod object;
pub mod parser;
pub mod prelude;
pub mod registry;
pub mod schema;
pub mod session;
pub mod source;
pub mod template;
pub mod types;
pub mod value;

pub use bar::{BarButton, BarItem, BarPlacement, ButtonOptions, NavbarButtons, PullToRefresh};
pub use command::{Command, CommandOption};
pub use config::SessionConfig;
pub use error::{BindError, BindResult, ConfigError};
pub use member::{
    CellEditing, DisplayMode, EditingStyle, ListOptions, MemberDescriptor, MemberKind, SelectionAction,
    UnselectionBehavior,
};
pub use object::ObjectRef;
pub use parser::{MemberParser, ParsedScreen};
pub use registry::{ViewRegistry, ViewType};
pub use schema::{Bindable, BindableEnum, FieldValue, MemberBuilder, Schema, TypeSchema};
pub use session::{Navigation, PostAction, Screen, Session};
pub use source::{ListSource, SelectionOutcome, SourceArena, SourceId};
pub use template::{Cell, CellTemplate, EntryOptions, LoadMoreOptions};
pub use types::{TypeInfo, TypeKey};
pub use value::{EnumValue, Value, ValueList};

pub use tableau_core::{CoreError, Signal};
pub use tableau_macros::{Bindable, BindableEnum};
