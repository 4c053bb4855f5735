//! Dynamic values flowing between view models and sources.
//!
//! Members are read and written through [`Value`]. Scalars compare by value;
//! lists and objects compare by reference, so "the same element" always means the
//! same shared handle, never an equal-looking copy.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::object::ObjectRef;
use crate::schema::BindableEnum;
use crate::types::{TypeInfo, TypeKey};

/// A member value.
#[derive(Clone, Default)]
pub enum Value {
    /// No value.
    #[default]
    None,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Text(String),
    /// One variant of a bindable enum.
    Enum(EnumValue),
    /// A shared collection.
    List(ValueList),
    /// A shared view-model object.
    Object(ObjectRef),
}

impl Value {
    /// Whether this is [`Value::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Primitive or enum value. Text is not a scalar in this sense.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Enum(_))
    }

    /// Whether the value can be drilled into as a collection.
    pub fn is_enumerable(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as float. Integers widen.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Get as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get as enum value.
    pub fn as_enum(&self) -> Option<EnumValue> {
        match self {
            Self::Enum(e) => Some(*e),
            _ => None,
        }
    }

    /// Get as list handle.
    pub fn as_list(&self) -> Option<&ValueList> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// Get as object handle.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Enum(_) => "enum",
            Self::List(_) => "list",
            Self::Object(_) => "object",
        }
    }

    /// Runtime type of the value, for view resolution.
    pub fn type_info(&self) -> TypeInfo {
        match self {
            Self::None => TypeInfo::of::<()>(),
            Self::Bool(_) => TypeInfo::of::<bool>(),
            Self::Int(_) => TypeInfo::of::<i64>(),
            Self::Float(_) => TypeInfo::of::<f64>(),
            Self::Text(_) => TypeInfo::of::<String>(),
            Self::Enum(e) => TypeInfo::from_key(e.type_key()),
            Self::List(_) => TypeInfo::of::<ValueList>(),
            Self::Object(o) => o.type_info().clone(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::List(a), Self::List(b)) => a.ptr_eq(b),
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Enum(e) => f.write_str(&e.caption()),
            Self::List(l) => write!(f, "{} items", l.len()),
            Self::Object(o) => f.write_str(&o.display()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Int(n) => write!(f, "Int({n})"),
            Self::Float(n) => write!(f, "Float({n})"),
            Self::Text(s) => write!(f, "Text({s:?})"),
            Self::Enum(e) => write!(f, "Enum({}::{})", e.type_key().short_name(), e.name()),
            Self::List(l) => write!(f, "List(len={})", l.len()),
            Self::Object(o) => write!(f, "Object({})", o.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<EnumValue> for Value {
    fn from(value: EnumValue) -> Self {
        Self::Enum(value)
    }
}

impl From<ValueList> for Value {
    fn from(value: ValueList) -> Self {
        Self::List(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Self::Object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Into::into)
    }
}

/// One variant of a [`BindableEnum`], erased to its type key and index.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumValue {
    key: TypeKey,
    index: usize,
    names: &'static [&'static str],
}

impl EnumValue {
    /// Erase `variant`.
    pub fn of<E: BindableEnum>(variant: E) -> Self {
        Self {
            key: TypeKey::of::<E>(),
            index: variant.index(),
            names: E::NAMES,
        }
    }

    /// Every variant of `E`, in declaration order.
    pub fn all<E: BindableEnum>() -> Vec<Self> {
        E::VARIANTS.iter().map(|v| Self::of(*v)).collect()
    }

    /// Recover the typed variant, if `value` holds an `E`.
    pub fn to_variant<E: BindableEnum>(value: &Value) -> Option<E> {
        match value {
            Value::Enum(e) if e.key == TypeKey::of::<E>() => E::VARIANTS.get(e.index).copied(),
            _ => None,
        }
    }

    /// The enum's type key.
    pub fn type_key(&self) -> TypeKey {
        self.key
    }

    /// Variant index in declaration order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Variant identifier.
    pub fn name(&self) -> &'static str {
        self.names.get(self.index).copied().unwrap_or("")
    }

    /// Variant identifier split into words for display.
    pub fn caption(&self) -> String {
        crate::member::derive_caption(self.name())
    }
}

impl fmt::Debug for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.key.short_name(), self.name())
    }
}

/// A shared, mutable collection of values.
///
/// Cloning the handle shares the collection. Sources bind the handle a view model
/// exposes, so edits made through the source are visible to the model and the
/// other way around.
#[derive(Clone, Default)]
pub struct ValueList {
    inner: Arc<RwLock<Vec<Value>>>,
}

impl ValueList {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// A list holding `values`.
    pub fn from_values(values: Vec<Value>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(values)),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.inner.read().get(index).cloned()
    }

    /// Last element.
    pub fn last(&self) -> Option<Value> {
        self.inner.read().last().cloned()
    }

    /// Append an element.
    pub fn push(&self, value: impl Into<Value>) {
        self.inner.write().push(value.into());
    }

    /// Insert at `index`, clamped to the length.
    pub fn insert(&self, index: usize, value: impl Into<Value>) {
        let mut values = self.inner.write();
        let index = index.min(values.len());
        values.insert(index, value.into());
    }

    /// Remove the element at `index`.
    pub fn remove(&self, index: usize) -> Option<Value> {
        let mut values = self.inner.write();
        (index < values.len()).then(|| values.remove(index))
    }

    /// Remove the first element equal to `value`. Returns whether one was removed.
    pub fn remove_item(&self, value: &Value) -> bool {
        let mut values = self.inner.write();
        match values.iter().position(|v| v == value) {
            Some(index) => {
                values.remove(index);
                true
            }
            None => false,
        }
    }

    /// Whether an element equal to `value` is present.
    pub fn contains(&self, value: &Value) -> bool {
        self.inner.read().iter().any(|v| v == value)
    }

    /// Position of the first element equal to `value`.
    pub fn position(&self, value: &Value) -> Option<usize> {
        self.inner.read().iter().position(|v| v == value)
    }

    /// Remove every element.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Replace the contents.
    pub fn replace_all(&self, values: Vec<Value>) {
        *self.inner.write() = values;
    }

    /// Move every element out, leaving the list empty.
    pub fn take_all(&self) -> Vec<Value> {
        std::mem::take(&mut *self.inner.write())
    }

    /// Append many elements.
    pub fn extend(&self, values: impl IntoIterator<Item = Value>) {
        self.inner.write().extend(values);
    }

    /// Copy of the current elements.
    pub fn snapshot(&self) -> Vec<Value> {
        self.inner.read().clone()
    }

    /// Whether both handles share the same collection.
    pub fn ptr_eq(&self, other: &ValueList) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for ValueList {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ValueList {}

impl<V: Into<Value>> FromIterator<V> for ValueList {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::from_values(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Debug for ValueList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.snapshot()).finish()
    }
}

static_assertions::assert_impl_all!(Value: Send, Sync);
static_assertions::assert_impl_all!(ValueList: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_equality_is_by_value() {
        assert_eq!(Value::from("a"), Value::Text("a".into()));
        assert_eq!(Value::from(3), Value::Int(3));
        assert_ne!(Value::from(3), Value::Float(3.0));
    }

    #[test]
    fn test_list_equality_is_by_reference() {
        let a: ValueList = [1, 2].into_iter().collect();
        let b: ValueList = [1, 2].into_iter().collect();
        assert_eq!(Value::List(a.clone()), Value::List(a.clone()));
        assert_ne!(Value::List(a.clone()), Value::List(b.clone()));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_classification() {
        assert!(Value::Bool(true).is_scalar());
        assert!(!Value::from("text").is_scalar());
        assert!(!Value::from("text").is_enumerable());
        assert!(Value::List(ValueList::new()).is_enumerable());
    }

    #[test]
    fn test_list_shares_storage() {
        let list = ValueList::new();
        let alias = list.clone();
        alias.push("x");
        assert_eq!(list.len(), 1);
        assert!(list.ptr_eq(&alias));
    }

    #[test]
    fn test_list_mutation() {
        let list: ValueList = ["a", "b", "c"].into_iter().collect();
        assert!(list.remove_item(&Value::from("b")));
        assert!(!list.remove_item(&Value::from("b")));
        assert_eq!(list.position(&Value::from("c")), Some(1));
        assert_eq!(list.remove(5), None);
        list.insert(99, "d");
        assert_eq!(list.last(), Some(Value::from("d")));
        let taken = list.take_all();
        assert_eq!(taken.len(), 3);
        assert!(list.is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::None.to_string(), "");
        assert_eq!(Value::from(42).to_string(), "42");
        assert_eq!(Value::from("hi").to_string(), "hi");
        let list: ValueList = [1, 2, 3].into_iter().collect();
        assert_eq!(Value::List(list).to_string(), "3 items");
    }

    #[test]
    fn test_option_conversion() {
        assert!(Value::from(None::<i64>).is_none());
        assert_eq!(Value::from(Some("x")), Value::from("x"));
    }
}
