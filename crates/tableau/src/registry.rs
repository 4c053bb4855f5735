//! Mapping from data types to the views that render them.
//!
//! A [`ViewRegistry`] is plain configuration: build it at startup, wrap it in an
//! `Arc` and hand it to every [`Session`](crate::Session) that should use it.
//! Registration overwrites, so the last registration for a key wins.
//!
//! Lookup for a type tries, in order: the exact type, each declared interface
//! in declaration order, then the base type (recursively).
//!
//! ```
//! use tableau::prelude::*;
//!
//! trait Person {}
//! struct Employee;
//!
//! let mut registry = ViewRegistry::new();
//! registry
//!     .register::<dyn Person>(ViewType::cell("person", CellTemplate::Custom("person")))
//!     .unwrap();
//!
//! let employee = TypeInfo::of::<Employee>().implements::<dyn Person>();
//! assert_eq!(registry.resolve(&employee).map(ViewType::name), Some("person"));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tableau_core::logging::targets;

use crate::command::Command;
use crate::error::{BindError, BindResult};
use crate::object::ObjectRef;
use crate::schema::Bindable;
use crate::template::CellTemplate;
use crate::types::{TypeInfo, TypeKey};

/// Builds a screen object over a model. The model becomes the screen's data
/// context.
pub type ScreenFactory = Arc<dyn Fn(ObjectRef) -> ObjectRef + Send + Sync>;

/// A concrete view: a cell template, a screen, or both.
#[derive(Clone)]
pub struct ViewType {
    name: &'static str,
    cell: Option<CellTemplate>,
    screen: Option<ScreenFactory>,
    row_height: Option<f32>,
}

impl ViewType {
    /// A view with neither a cell nor a screen. Such a view cannot be
    /// registered.
    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            cell: None,
            screen: None,
            row_height: None,
        }
    }

    /// A view rendered as a cell.
    pub fn cell(name: &'static str, template: CellTemplate) -> Self {
        Self {
            cell: Some(template),
            ..Self::named(name)
        }
    }

    /// A screen view of type `V`, built from the model by `build`.
    pub fn screen<V, F>(build: F) -> Self
    where
        V: Bindable,
        F: Fn(&ObjectRef) -> V + Send + Sync + 'static,
    {
        let factory: ScreenFactory =
            Arc::new(move |model: ObjectRef| ObjectRef::with_data_context(build(&model), model));
        Self {
            screen: Some(factory),
            ..Self::named(crate::types::short_type_name(std::any::type_name::<V>()))
        }
    }

    /// Set the cell template shown where this view appears as a row.
    pub fn with_cell(mut self, template: CellTemplate) -> Self {
        self.cell = Some(template);
        self
    }

    /// Set a row height for rows rendered with this view.
    pub fn with_row_height(mut self, height: f32) -> Self {
        self.row_height = Some(height);
        self
    }

    /// View name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Cell template, if the view renders as a cell.
    pub fn cell_template(&self) -> Option<&CellTemplate> {
        self.cell.as_ref()
    }

    /// Whether the view can be presented as a screen.
    pub fn is_screen(&self) -> bool {
        self.screen.is_some()
    }

    /// Row height override.
    pub fn row_height(&self) -> Option<f32> {
        self.row_height
    }

    /// Whether the view can render anything.
    pub fn is_displayable(&self) -> bool {
        self.cell.is_some() || self.screen.is_some()
    }

    /// Build the screen over `model`.
    pub fn instantiate(&self, model: &ObjectRef) -> Option<ObjectRef> {
        self.screen.as_ref().map(|factory| factory(model.clone()))
    }
}

impl PartialEq for ViewType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.cell == other.cell && self.is_screen() == other.is_screen()
    }
}

impl fmt::Debug for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewType")
            .field("name", &self.name)
            .field("cell", &self.cell)
            .field("screen", &self.is_screen())
            .finish()
    }
}

/// Type-to-view configuration.
#[derive(Debug, Clone, Default)]
pub struct ViewRegistry {
    views: HashMap<TypeKey, ViewType>,
}

impl ViewRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the stock templates: bool members render as toggles,
    /// commands as buttons.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.insert(
            TypeKey::of::<bool>(),
            ViewType::cell("toggle", CellTemplate::Toggle),
        );
        registry.insert(
            TypeKey::of::<Command>(),
            ViewType::cell("button", CellTemplate::Button),
        );
        registry
    }

    /// Map data type (or interface, or marker) `D` to `view`.
    ///
    /// Returns the view previously registered for `D`. Fails if `view` cannot
    /// display anything.
    pub fn register<D: ?Sized + 'static>(&mut self, view: ViewType) -> BindResult<Option<ViewType>> {
        self.register_key(TypeKey::of::<D>(), view)
    }

    /// [`register`](Self::register) with an explicit key.
    pub fn register_key(&mut self, key: TypeKey, view: ViewType) -> BindResult<Option<ViewType>> {
        if !view.is_displayable() {
            tracing::warn!(target: targets::REGISTRY, key = %key, view = view.name(), "rejected non-displayable view");
            return Err(BindError::NotDisplayable(view.name().to_string()));
        }
        Ok(self.insert(key, view))
    }

    fn insert(&mut self, key: TypeKey, view: ViewType) -> Option<ViewType> {
        tracing::debug!(target: targets::REGISTRY, key = %key, view = view.name(), "registered view");
        self.views.insert(key, view)
    }

    /// View registered for exactly `key`.
    pub fn exact(&self, key: &TypeKey) -> Option<&ViewType> {
        self.views.get(key)
    }

    /// Resolve with interface and base-type fallback.
    pub fn resolve(&self, info: &TypeInfo) -> Option<&ViewType> {
        if let Some(view) = self.views.get(&info.key()) {
            return Some(view);
        }
        if let Some(view) = info.interfaces().iter().find_map(|i| self.views.get(i)) {
            return Some(view);
        }
        info.base().and_then(|base| self.resolve(base))
    }

    /// The view of the first attached marker that is registered.
    pub fn resolve_by_markers(&self, markers: &[TypeKey]) -> Option<&ViewType> {
        markers.iter().find_map(|m| self.views.get(m))
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

static_assertions::assert_impl_all!(ViewRegistry: Send, Sync);
