//! Commonly used types.
//!
//! ```
//! use tableau::prelude::*;
//! ```

pub use crate::bar::{BarPlacement, ButtonOptions};
pub use crate::command::CommandOption;
pub use crate::config::SessionConfig;
pub use crate::error::{BindError, BindResult};
pub use crate::member::{
    CellEditing, DisplayMode, EditingStyle, ListOptions, SelectionAction, UnselectionBehavior, order,
};
pub use crate::object::ObjectRef;
pub use crate::registry::{ViewRegistry, ViewType};
pub use crate::schema::{Bindable, BindableEnum, Schema};
pub use crate::session::{Navigation, Session};
pub use crate::source::{SelectionOutcome, SourceId};
pub use crate::template::{CellTemplate, EntryOptions, LoadMoreOptions};
pub use crate::types::TypeInfo;
pub use crate::value::{EnumValue, Value, ValueList};

pub use tableau_macros::{Bindable, BindableEnum};
