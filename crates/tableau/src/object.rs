//! Shared handles to bindable objects.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{BindError, BindResult};
use crate::member::MemberDef;
use crate::schema::{AnyValue, Apply, BackgroundWork, Bindable, TypeSchema};
use crate::types::TypeInfo;
use crate::value::Value;

struct ObjectCell {
    value: RwLock<Box<AnyValue>>,
    schema: Arc<TypeSchema>,
    data_context: Option<ObjectRef>,
}

/// A shared handle to a view-model object.
///
/// Cloning shares the object. Sources and commands hold `ObjectRef`s to the
/// objects they read and write, never copies, so every mutation made through the
/// binder is visible to the application.
///
/// An object created with [`with_data_context`](Self::with_data_context) wraps
/// another: member lookups for selection mirrors and command gates fall back to
/// the data context when the wrapper itself lacks the member.
#[derive(Clone)]
pub struct ObjectRef(Arc<ObjectCell>);

impl ObjectRef {
    /// Wrap `value`.
    pub fn new<T: Bindable>(value: T) -> Self {
        Self::build(value, None)
    }

    /// Wrap `value` as a view over `data_context`.
    pub fn with_data_context<T: Bindable>(value: T, data_context: ObjectRef) -> Self {
        Self::build(value, Some(data_context))
    }

    fn build<T: Bindable>(value: T, data_context: Option<ObjectRef>) -> Self {
        let value: Box<AnyValue> = Box::new(value);
        Self(Arc::new(ObjectCell {
            value: RwLock::new(value),
            schema: TypeSchema::of::<T>(),
            data_context,
        }))
    }

    /// The object's schema.
    pub fn schema(&self) -> &Arc<TypeSchema> {
        &self.0.schema
    }

    /// Runtime type identity.
    pub fn type_info(&self) -> &TypeInfo {
        self.0.schema.type_info()
    }

    /// Short type name.
    pub fn type_name(&self) -> &'static str {
        self.type_info().name()
    }

    /// The wrapped model, if this object is a view over one.
    pub fn data_context(&self) -> Option<&ObjectRef> {
        self.0.data_context.as_ref()
    }

    /// Whether both handles share the same object.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Read member `name`. `None` if it does not exist or is a method.
    pub fn get(&self, name: &str) -> Option<Value> {
        let def = self.0.schema.member(name)?;
        self.read_member(def)
    }

    /// Write member `name`.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> BindResult<()> {
        let def = self.require(name)?.clone();
        self.write_member(&def, value.into())
    }

    /// Invoke method `name`.
    pub fn invoke(&self, name: &str, param: Option<&Value>) -> BindResult<()> {
        let def = self.require(name)?.clone();
        self.invoke_member(&def, param)
    }

    /// Borrow the object as `T`. `None` if it is not a `T`.
    pub fn read<T: 'static, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.0.value.read();
        (**guard).downcast_ref::<T>().map(f)
    }

    /// Mutably borrow the object as `T`. `None` if it is not a `T`.
    pub fn write<T: 'static, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut guard = self.0.value.write();
        (**guard).downcast_mut::<T>().map(f)
    }

    /// Display text of the object.
    pub fn display(&self) -> String {
        let guard = self.0.value.read();
        self.0.schema.display_value(&**guard)
    }

    fn require(&self, name: &str) -> BindResult<&Arc<MemberDef>> {
        self.0.schema.member(name).ok_or_else(|| BindError::MissingMember {
            type_name: self.type_name().to_string(),
            member: name.to_string(),
        })
    }

    /// Find `name` on this object, then on its data context.
    pub(crate) fn locate(&self, name: &str) -> Option<(ObjectRef, Arc<MemberDef>)> {
        if let Some(def) = self.0.schema.member(name) {
            return Some((self.clone(), def.clone()));
        }
        let context = self.data_context()?;
        context
            .0
            .schema
            .member(name)
            .map(|def| (context.clone(), def.clone()))
    }

    pub(crate) fn read_member(&self, def: &MemberDef) -> Option<Value> {
        let getter = def.getter.as_ref()?;
        let guard = self.0.value.read();
        getter(&**guard)
    }

    pub(crate) fn write_member(&self, def: &MemberDef, value: Value) -> BindResult<()> {
        let setter = match &def.setter {
            Some(setter) if !def.attrs.read_only => setter,
            _ => {
                return Err(BindError::ReadOnly {
                    type_name: self.type_name().to_string(),
                    member: def.name.to_string(),
                });
            }
        };
        let mut guard = self.0.value.write();
        setter(&mut **guard, value).map_err(|found| BindError::ValueMismatch {
            type_name: self.type_name().to_string(),
            member: def.name.to_string(),
            found,
        })
    }

    pub(crate) fn invoke_member(&self, def: &MemberDef, param: Option<&Value>) -> BindResult<()> {
        if let Some(work) = self.begin_background(def) {
            self.apply_background(work());
            return Ok(());
        }
        let invoker = def.invoker.as_ref().ok_or_else(|| BindError::NotInvocable {
            type_name: self.type_name().to_string(),
            member: def.name.to_string(),
        })?;
        let mut guard = self.0.value.write();
        invoker(&mut **guard, param);
        Ok(())
    }

    /// Run the prepare step of a background method under a read lock.
    pub(crate) fn begin_background(&self, def: &MemberDef) -> Option<BackgroundWork> {
        let starter = def.starter.as_ref()?;
        let guard = self.0.value.read();
        starter(&**guard)
    }

    /// Apply the result of background work under a write lock.
    pub(crate) fn apply_background(&self, apply: Apply) {
        let mut guard = self.0.value.write();
        apply(&mut **guard);
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ObjectRef");
        s.field("type", &self.type_name());
        if let Some(context) = self.data_context() {
            s.field("data_context", &context.type_name());
        }
        s.finish()
    }
}

static_assertions::assert_impl_all!(ObjectRef: Send, Sync, Clone);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    struct Account {
        owner: String,
        active: bool,
    }

    impl Bindable for Account {
        fn describe(schema: &mut Schema<Self>) {
            schema.field("owner", |a: &Self| &a.owner, |a: &mut Self| &mut a.owner);
            schema
                .field("active", |a: &Self| &a.active, |a: &mut Self| &mut a.active)
                .read_only();
        }

        fn display(&self) -> String {
            self.owner.clone()
        }
    }

    struct AccountView;

    impl Bindable for AccountView {
        fn describe(_schema: &mut Schema<Self>) {}
    }

    fn account() -> ObjectRef {
        ObjectRef::new(Account {
            owner: "grace".into(),
            active: true,
        })
    }

    #[test]
    fn test_get_and_set() {
        let object = account();
        object.set("owner", "ada").unwrap();
        assert_eq!(object.get("owner"), Some(Value::from("ada")));
        assert_eq!(object.get("missing"), None);
        assert_eq!(object.display(), "ada");
    }

    #[test]
    fn test_read_only_and_mismatch() {
        let object = account();
        assert!(matches!(
            object.set("active", false),
            Err(BindError::ReadOnly { .. })
        ));
        assert!(matches!(
            object.set("owner", 3),
            Err(BindError::ValueMismatch { found: "int", .. })
        ));
        assert!(matches!(
            object.set("nope", 3),
            Err(BindError::MissingMember { .. })
        ));
    }

    #[test]
    fn test_invoke_field_is_not_invocable() {
        let object = account();
        assert!(matches!(
            object.invoke("owner", None),
            Err(BindError::NotInvocable { .. })
        ));
    }

    #[test]
    fn test_locate_falls_back_to_data_context() {
        let model = account();
        let view = ObjectRef::with_data_context(AccountView, model.clone());
        let (owner, def) = view.locate("owner").unwrap();
        assert!(owner.ptr_eq(&model));
        assert_eq!(def.name(), "owner");
        assert!(view.locate("balance").is_none());
    }

    struct Counter {
        count: u32,
    }

    impl Bindable for Counter {
        fn describe(schema: &mut Schema<Self>) {
            schema.field("count", |c: &Self| &c.count, |c: &mut Self| &mut c.count);
            schema.background_method(
                "bump",
                |c: &Self| c.count,
                |n: u32| n + 10,
                |c: &mut Self, n: u32| c.count = n,
            );
        }
    }

    #[test]
    fn test_background_method_splits_around_the_lock() {
        let counter = ObjectRef::new(Counter { count: 1 });
        let def = counter.schema().member("bump").unwrap().clone();
        assert!(def.runs_in_background());

        let work = counter.begin_background(&def).unwrap();
        // No lock is held between prepare and apply.
        counter.set("count", Value::Int(5)).unwrap();
        let apply = work();
        assert_eq!(counter.get("count"), Some(Value::Int(5)));
        counter.apply_background(apply);
        assert_eq!(counter.get("count"), Some(Value::Int(11)));

        counter.invoke("bump", None).unwrap();
        assert_eq!(counter.get("count"), Some(Value::Int(21)));
    }

    #[test]
    fn test_handles_share_state() {
        let object = account();
        let alias = object.clone();
        alias.write(|a: &mut Account| a.owner.push('!'));
        assert_eq!(object.read(|a: &Account| a.owner.clone()), Some("grace!".into()));
        assert_eq!(Value::Object(object), Value::Object(alias));
    }
}
