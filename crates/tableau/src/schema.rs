//! Declarative schemas for bindable types.
//!
//! Instead of reflecting over a type at runtime, each view-model type describes
//! its bindable members once through a [`Schema`] builder (by hand, or with
//! `#[derive(Bindable)]`). The result is cached per type as a [`TypeSchema`].
//!
//! # Example
//!
//! ```
//! use tableau::prelude::*;
//!
//! struct Profile {
//!     name: String,
//!     notify: bool,
//!     saved: u32,
//! }
//!
//! impl Bindable for Profile {
//!     fn describe(schema: &mut Schema<Self>) {
//!         schema.caption("Profile");
//!         schema.field("name", |p: &Self| &p.name, |p: &mut Self| &mut p.name).first();
//!         schema.field("notify", |p: &Self| &p.notify, |p: &mut Self| &mut p.notify);
//!         schema
//!             .method("save", |p: &mut Self| p.saved += 1)
//!             .button(ButtonOptions::new());
//!     }
//! }
//!
//! let profile = ObjectRef::new(Profile { name: "Ada".into(), notify: false, saved: 0 });
//! assert_eq!(profile.get("name"), Some(Value::from("Ada")));
//! profile.invoke("save", None).unwrap();
//! assert_eq!(profile.read(|p: &Profile| p.saved), Some(1));
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tableau_core::logging::targets;

use crate::bar::ButtonOptions;
use crate::member::{
    CellEditing, ListOptions, MemberAttrs, MemberDef, MemberKind, SectionOptions, order,
};
use crate::object::ObjectRef;
use crate::registry::ViewType;
use crate::template::{EntryOptions, LoadMoreOptions};
use crate::types::{TypeInfo, TypeKey};
use crate::value::{Value, ValueList};

pub(crate) type AnyValue = dyn Any + Send + Sync;
pub(crate) type Getter = Arc<dyn Fn(&AnyValue) -> Option<Value> + Send + Sync>;
/// Returns the rejected value's kind on mismatch.
pub(crate) type Setter = Arc<dyn Fn(&mut AnyValue, Value) -> Result<(), &'static str> + Send + Sync>;
pub(crate) type Invoker = Arc<dyn Fn(&mut AnyValue, Option<&Value>) + Send + Sync>;
/// Writes the result of background work back into the object.
pub(crate) type Apply = Box<dyn FnOnce(&mut AnyValue) + Send>;
/// Work that runs without access to the object and yields its [`Apply`] step.
pub(crate) type BackgroundWork = Box<dyn FnOnce() -> Apply + Send>;
/// Reads what a background method needs and packages the work.
pub(crate) type Starter = Arc<dyn Fn(&AnyValue) -> Option<BackgroundWork> + Send + Sync>;
type Display = Arc<dyn Fn(&AnyValue) -> String + Send + Sync>;

/// A view-model type that can be bound to a table.
pub trait Bindable: Send + Sync + 'static {
    /// Describe the bindable members.
    fn describe(schema: &mut Schema<Self>)
    where
        Self: Sized;

    /// Runtime type identity, with declared interfaces and base type.
    fn type_info() -> TypeInfo
    where
        Self: Sized,
    {
        TypeInfo::of::<Self>()
    }

    /// Text shown when the object itself is displayed in a row.
    fn display(&self) -> String
    where
        Self: Sized,
    {
        crate::member::derive_caption(crate::types::short_type_name(std::any::type_name::<Self>()))
    }
}

/// A fieldless enum bound as a list of its variants.
pub trait BindableEnum: Copy + Send + Sync + 'static {
    /// Every variant in declaration order.
    const VARIANTS: &'static [Self];
    /// Variant identifiers, parallel to [`VARIANTS`](Self::VARIANTS).
    const NAMES: &'static [&'static str];

    /// Position of `self` in [`VARIANTS`](Self::VARIANTS).
    fn index(self) -> usize;
}

/// Conversion between a Rust field type and a [`Value`].
pub trait FieldValue: Sized + Send + Sync + 'static {
    /// Semantic type of fields of this type.
    fn kind() -> MemberKind;
    /// Read.
    fn to_value(&self) -> Value;
    /// Write. `None` if `value` has the wrong kind.
    fn from_value(value: Value) -> Option<Self>;
}

impl FieldValue for bool {
    fn kind() -> MemberKind {
        MemberKind::Bool
    }
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

macro_rules! int_field_value {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                fn kind() -> MemberKind {
                    MemberKind::Int
                }
                fn to_value(&self) -> Value {
                    Value::Int(i64::try_from(*self).unwrap_or(i64::MAX))
                }
                fn from_value(value: Value) -> Option<Self> {
                    value.as_int().and_then(|n| <$ty>::try_from(n).ok())
                }
            }
        )*
    };
}

int_field_value!(i32, i64, u32, u64, usize);

impl FieldValue for f32 {
    fn kind() -> MemberKind {
        MemberKind::Float
    }
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
    fn from_value(value: Value) -> Option<Self> {
        value.as_float().map(|n| n as f32)
    }
}

impl FieldValue for f64 {
    fn kind() -> MemberKind {
        MemberKind::Float
    }
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
    fn from_value(value: Value) -> Option<Self> {
        value.as_float()
    }
}

impl FieldValue for String {
    fn kind() -> MemberKind {
        MemberKind::Text
    }
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl FieldValue for Value {
    fn kind() -> MemberKind {
        MemberKind::Value
    }
    fn to_value(&self) -> Value {
        self.clone()
    }
    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl FieldValue for ValueList {
    fn kind() -> MemberKind {
        MemberKind::List
    }
    fn to_value(&self) -> Value {
        Value::List(self.clone())
    }
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::List(list) => Some(list),
            _ => None,
        }
    }
}

impl FieldValue for ObjectRef {
    fn kind() -> MemberKind {
        MemberKind::Object
    }
    fn to_value(&self) -> Value {
        Value::Object(self.clone())
    }
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl FieldValue for Option<ObjectRef> {
    fn kind() -> MemberKind {
        MemberKind::Object
    }
    fn to_value(&self) -> Value {
        self.clone().map_or(Value::None, Value::Object)
    }
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(object) => Some(Some(object)),
            Value::None => Some(None),
            _ => None,
        }
    }
}

/// Builder used by [`Bindable::describe`].
pub struct Schema<T> {
    caption: Option<String>,
    view: Option<ViewType>,
    cell_editing: Option<CellEditing>,
    members: Vec<MemberDef>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Bindable> Schema<T> {
    fn new() -> Self {
        Self {
            caption: None,
            view: None,
            cell_editing: None,
            members: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Screen caption for the type.
    pub fn caption(&mut self, caption: impl Into<String>) -> &mut Self {
        self.caption = Some(caption.into());
        self
    }

    /// View that replaces the type when it is presented as a screen.
    pub fn view(&mut self, view: ViewType) -> &mut Self {
        self.view = Some(view);
        self
    }

    /// Row editing for every list on the type's screen.
    pub fn cell_editing(&mut self, editing: CellEditing) -> &mut Self {
        self.cell_editing = Some(editing);
        self
    }

    /// A readable and writable field.
    pub fn field<F, G, M>(&mut self, name: &'static str, get: G, get_mut: M) -> MemberBuilder<'_>
    where
        F: FieldValue,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        let getter: Getter =
            Arc::new(move |any: &AnyValue| any.downcast_ref::<T>().map(|t| get(t).to_value()));
        let setter: Setter = Arc::new(move |any: &mut AnyValue, value: Value| {
            let target = any.downcast_mut::<T>().ok_or("object")?;
            let found = value.kind_name();
            *get_mut(target) = F::from_value(value).ok_or(found)?;
            Ok(())
        });
        self.push(MemberDef {
            name,
            kind: F::kind(),
            attrs: MemberAttrs::default(),
            getter: Some(getter),
            setter: Some(setter),
            invoker: None,
            starter: None,
        })
    }

    /// A field that is displayed but never written.
    pub fn read_only_field<F, G>(&mut self, name: &'static str, get: G) -> MemberBuilder<'_>
    where
        F: FieldValue,
        G: Fn(&T) -> &F + Send + Sync + 'static,
    {
        self.computed(name, move |t: &T| get(t).to_value())
            .with_kind(F::kind())
    }

    /// A read-only value computed from the object.
    pub fn computed<V, G>(&mut self, name: &'static str, get: G) -> MemberBuilder<'_>
    where
        V: Into<Value>,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        let getter: Getter =
            Arc::new(move |any: &AnyValue| any.downcast_ref::<T>().map(|t| get(t).into()));
        let builder = self.push(MemberDef {
            name,
            kind: MemberKind::Value,
            attrs: MemberAttrs::default(),
            getter: Some(getter),
            setter: None,
            invoker: None,
            starter: None,
        });
        builder.def.attrs.read_only = true;
        builder
    }

    /// A method taking no parameter.
    pub fn method<F>(&mut self, name: &'static str, f: F) -> MemberBuilder<'_>
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        let invoker: Invoker = Arc::new(move |any: &mut AnyValue, _param: Option<&Value>| {
            if let Some(target) = any.downcast_mut::<T>() {
                f(target);
            }
        });
        self.push(MemberDef {
            name,
            kind: MemberKind::Method { takes_param: false },
            attrs: MemberAttrs::default(),
            getter: None,
            setter: None,
            invoker: Some(invoker),
            starter: None,
        })
    }

    /// A method taking one parameter. Invoked without one, it receives
    /// [`Value::None`].
    pub fn method_with_param<F>(&mut self, name: &'static str, f: F) -> MemberBuilder<'_>
    where
        F: Fn(&mut T, &Value) + Send + Sync + 'static,
    {
        let invoker: Invoker = Arc::new(move |any: &mut AnyValue, param: Option<&Value>| {
            if let Some(target) = any.downcast_mut::<T>() {
                f(target, param.unwrap_or(&Value::None));
            }
        });
        self.push(MemberDef {
            name,
            kind: MemberKind::Method { takes_param: true },
            attrs: MemberAttrs::default(),
            getter: None,
            setter: None,
            invoker: Some(invoker),
            starter: None,
        })
    }

    /// A method whose work leaves the UI thread.
    ///
    /// `prepare` reads what the work needs from the object, `work` runs on
    /// the session worker without access to the object, and `apply` writes
    /// the result back on the UI thread. The object is only locked while
    /// `prepare` and `apply` run. Invoked directly, the three steps run in
    /// sequence on the calling thread.
    pub fn background_method<I, R, P, W, A>(
        &mut self,
        name: &'static str,
        prepare: P,
        work: W,
        apply: A,
    ) -> MemberBuilder<'_>
    where
        I: Send + 'static,
        R: Send + 'static,
        P: Fn(&T) -> I + Send + Sync + 'static,
        W: Fn(I) -> R + Send + Sync + 'static,
        A: Fn(&mut T, R) + Send + Sync + 'static,
    {
        let work = Arc::new(work);
        let apply = Arc::new(apply);
        let starter: Starter = Arc::new(move |any: &AnyValue| {
            let input = prepare(any.downcast_ref::<T>()?);
            let work = work.clone();
            let apply = apply.clone();
            let job: BackgroundWork = Box::new(move || {
                let output = work(input);
                let step: Apply = Box::new(move |any: &mut AnyValue| {
                    if let Some(target) = any.downcast_mut::<T>() {
                        apply(target, output);
                    }
                });
                step
            });
            Some(job)
        });
        self.push(MemberDef {
            name,
            kind: MemberKind::Method { takes_param: false },
            attrs: MemberAttrs::default(),
            getter: None,
            setter: None,
            invoker: None,
            starter: Some(starter),
        })
    }

    fn push(&mut self, def: MemberDef) -> MemberBuilder<'_> {
        if self.members.iter().any(|m| m.name == def.name) {
            tracing::warn!(
                target: targets::PARSER,
                type_name = std::any::type_name::<T>(),
                member = def.name,
                "member described twice, later description wins"
            );
            self.members.retain(|m| m.name != def.name);
        }
        self.members.push(def);
        let index = self.members.len() - 1;
        MemberBuilder {
            def: &mut self.members[index],
        }
    }
}

/// Directives for one member.
pub struct MemberBuilder<'a> {
    def: &'a mut MemberDef,
}

impl MemberBuilder<'_> {
    fn with_kind(self, kind: MemberKind) -> Self {
        self.def.kind = kind;
        self
    }

    /// Relative position within the section.
    pub fn order(self, order: i32) -> Self {
        self.def.attrs.order = Some(order);
        self
    }

    /// Pin before every other member of the section.
    pub fn first(self) -> Self {
        self.order(order::FIRST)
    }

    /// Pin after every other member of the section.
    pub fn last(self) -> Self {
        self.order(order::LAST)
    }

    /// Start a new section with `header`.
    pub fn section(self, header: impl Into<String>) -> Self {
        let header = header.into();
        let section = self.def.attrs.section.get_or_insert_with(SectionOptions::default);
        section.header = (!header.is_empty()).then_some(header);
        self
    }

    /// Footer of the section this member starts.
    pub fn footer(self, footer: impl Into<String>) -> Self {
        let section = self.def.attrs.section.get_or_insert_with(SectionOptions::default);
        section.footer = Some(footer.into());
        self
    }

    /// Caption override.
    pub fn caption(self, caption: impl Into<String>) -> Self {
        self.def.attrs.caption = Some(caption.into());
        self
    }

    /// Row height override.
    pub fn row_height(self, height: f32) -> Self {
        self.def.attrs.row_height = Some(height);
        self
    }

    /// Exclude from binding.
    pub fn skip(self) -> Self {
        self.def.attrs.skip = true;
        self
    }

    /// Reject writes.
    pub fn read_only(self) -> Self {
        self.def.attrs.read_only = true;
        self
    }

    /// List directives.
    pub fn list(self, options: ListOptions) -> Self {
        self.def.attrs.list = Some(options);
        self
    }

    /// Element type of a collection, for view resolution.
    pub fn element<U: Bindable>(self) -> Self {
        self.def.attrs.element = Some(U::type_info());
        self
    }

    /// Element type given as a [`TypeInfo`].
    pub fn element_info(self, info: TypeInfo) -> Self {
        self.def.attrs.element = Some(info);
        self
    }

    /// Present `view` over a selected element.
    pub fn navigate_to(self, view: ViewType) -> Self {
        self.def.attrs.navigate_to = Some(view);
        self
    }

    /// Render the member with `view`.
    pub fn view(self, view: ViewType) -> Self {
        self.def.attrs.view = Some(view);
        self
    }

    /// Attach a marker type, looked up in the registry before the member's type.
    pub fn marker<M: ?Sized + 'static>(self) -> Self {
        self.def.attrs.markers.push(TypeKey::of::<M>());
        self
    }

    /// Text entry hints.
    pub fn entry(self, options: EntryOptions) -> Self {
        self.def.attrs.entry = Some(options);
        self
    }

    /// Render a method as a button row.
    pub fn button(self, options: ButtonOptions) -> Self {
        self.def.attrs.button = Some(options);
        self
    }

    /// Route a method to the toolbar.
    pub fn toolbar(self, options: ButtonOptions) -> Self {
        self.def.attrs.toolbar = Some(options);
        self
    }

    /// Route a method to the navigation bar.
    pub fn navbar(self, options: ButtonOptions) -> Self {
        self.def.attrs.navbar = Some(options);
        self
    }

    /// Use a method as the screen's refresh command.
    pub fn pull_to_refresh(self, settings_key: impl Into<String>) -> Self {
        self.def.attrs.pull_to_refresh = Some(settings_key.into());
        self
    }

    /// Render a method as a load-more row.
    pub fn load_more(self, options: LoadMoreOptions) -> Self {
        self.def.attrs.load_more = Some(options);
        self
    }

    /// Row editing for this list.
    pub fn cell_editing(self, editing: CellEditing) -> Self {
        self.def.attrs.cell_editing = Some(editing);
        self
    }
}

/// The resolved schema of one bindable type.
pub struct TypeSchema {
    type_info: TypeInfo,
    caption: Option<String>,
    view: Option<ViewType>,
    cell_editing: Option<CellEditing>,
    members: Vec<Arc<MemberDef>>,
    display: Display,
}

fn schema_cache() -> &'static RwLock<HashMap<TypeId, Arc<TypeSchema>>> {
    static CACHE: OnceLock<RwLock<HashMap<TypeId, Arc<TypeSchema>>>> = OnceLock::new();
    CACHE.get_or_init(Default::default)
}

impl TypeSchema {
    /// The schema of `T`, described on first use and cached afterwards.
    pub fn of<T: Bindable>() -> Arc<TypeSchema> {
        let id = TypeId::of::<T>();
        if let Some(schema) = schema_cache().read().get(&id) {
            return schema.clone();
        }

        let mut builder = Schema::<T>::new();
        T::describe(&mut builder);
        let display: Display = Arc::new(|any: &AnyValue| {
            any.downcast_ref::<T>().map(T::display).unwrap_or_default()
        });
        let schema = Arc::new(TypeSchema {
            type_info: T::type_info(),
            caption: builder.caption,
            view: builder.view,
            cell_editing: builder.cell_editing,
            members: builder.members.into_iter().map(Arc::new).collect(),
            display,
        });
        tracing::trace!(
            target: targets::PARSER,
            type_name = schema.type_info.name(),
            members = schema.members.len(),
            "described bindable type"
        );

        schema_cache().write().entry(id).or_insert(schema).clone()
    }

    /// Runtime type identity.
    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// Type-level caption.
    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    /// Type-level view replacement.
    pub fn view(&self) -> Option<&ViewType> {
        self.view.as_ref()
    }

    /// Type-level row editing.
    pub fn cell_editing(&self) -> Option<&CellEditing> {
        self.cell_editing.as_ref()
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[Arc<MemberDef>] {
        &self.members
    }

    /// Member by name.
    pub fn member(&self, name: &str) -> Option<&Arc<MemberDef>> {
        self.members.iter().find(|m| m.name == name)
    }

    pub(crate) fn display_value(&self, value: &AnyValue) -> String {
        (self.display)(value)
    }
}

impl fmt::Debug for TypeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSchema")
            .field("type", &self.type_info.name())
            .field("members", &self.members)
            .finish()
    }
}

static_assertions::assert_impl_all!(TypeSchema: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::SelectionAction;

    struct Sample {
        title: String,
        count: u32,
        tags: ValueList,
        pressed: u32,
        last_param: Value,
    }

    impl Bindable for Sample {
        fn describe(schema: &mut Schema<Self>) {
            schema.caption("Sample");
            schema
                .field("title", |s: &Self| &s.title, |s: &mut Self| &mut s.title)
                .caption("Heading")
                .first();
            schema.field("count", |s: &Self| &s.count, |s: &mut Self| &mut s.count);
            schema
                .field("tags", |s: &Self| &s.tags, |s: &mut Self| &mut s.tags)
                .list(ListOptions::new().action(SelectionAction::Multiselection));
            schema.computed("summary", |s: &Self| format!("{} ({})", s.title, s.count));
            schema.method("press", |s: &mut Self| s.pressed += 1);
            schema.method_with_param("remember", |s: &mut Self, v: &Value| {
                s.last_param = v.clone()
            });
        }
    }

    fn sample() -> Sample {
        Sample {
            title: "t".into(),
            count: 2,
            tags: ValueList::new(),
            pressed: 0,
            last_param: Value::None,
        }
    }

    #[test]
    fn test_schema_is_cached() {
        let a = TypeSchema::of::<Sample>();
        let b = TypeSchema::of::<Sample>();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.caption(), Some("Sample"));
        assert_eq!(a.members().len(), 6);
    }

    #[test]
    fn test_member_kinds_and_attrs() {
        let schema = TypeSchema::of::<Sample>();
        let title = schema.member("title").unwrap();
        assert_eq!(title.kind(), &MemberKind::Text);
        assert_eq!(title.attrs().order, Some(order::FIRST));
        assert_eq!(title.caption(), "Heading");
        assert_eq!(schema.member("count").unwrap().kind(), &MemberKind::Int);
        assert!(schema.member("tags").unwrap().kind().is_collection());
        assert!(!schema.member("summary").unwrap().is_writable());
        assert_eq!(
            schema.member("remember").unwrap().kind(),
            &MemberKind::Method { takes_param: true }
        );
    }

    #[test]
    fn test_accessors_round_trip() {
        let object = ObjectRef::new(sample());
        object.set("count", Value::Int(7)).unwrap();
        assert_eq!(object.get("count"), Some(Value::Int(7)));
        assert_eq!(object.get("summary"), Some(Value::from("t (7)")));

        object.invoke("press", None).unwrap();
        object.invoke("remember", Some(&Value::Int(4))).unwrap();
        assert_eq!(object.read(|s: &Sample| s.pressed), Some(1));
        assert_eq!(object.read(|s: &Sample| s.last_param.clone()), Some(Value::Int(4)));
    }

    #[test]
    fn test_int_conversion_rejects_out_of_range() {
        assert_eq!(u32::from_value(Value::Int(-1)), None);
        assert_eq!(i32::from_value(Value::Int(5)), Some(5));
        assert_eq!(bool::from_value(Value::Int(1)), None);
    }

    #[test]
    fn test_wide_unsigned_values_saturate() {
        assert_eq!(u64::MAX.to_value(), Value::Int(i64::MAX));
        assert_eq!(usize::MAX.to_value(), Value::Int(i64::MAX));
        assert_eq!((i64::MAX as u64).to_value(), Value::Int(i64::MAX));
        assert_eq!(7u64.to_value(), Value::Int(7));
        assert_eq!(u64::from_value(Value::Int(-3)), None);
    }
}
