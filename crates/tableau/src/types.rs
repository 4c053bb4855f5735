//! Runtime type identities used for view resolution.
//!
//! A [`TypeKey`] names a Rust type (or trait object type, or marker type). A
//! [`TypeInfo`] adds what the view registry needs for fallback lookup: the
//! interfaces a type declares, in declaration order, and an optional base type.
//!
//! ```
//! use tableau::types::{TypeInfo, TypeKey};
//!
//! trait Person {}
//! struct Contact;
//! struct Employee;
//!
//! let contact = TypeInfo::of::<Contact>().implements::<dyn Person>();
//! let employee = TypeInfo::of::<Employee>().extends(contact.clone());
//!
//! assert_eq!(employee.base().map(TypeInfo::key), Some(TypeKey::of::<Contact>()));
//! assert_eq!(contact.interfaces(), &[TypeKey::of::<dyn Person>()]);
//! ```

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of a Rust type, usable as a registry key.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for `T`. Trait object types (`dyn Trait`) serve as interface keys and
    /// zero-sized structs as attribute markers.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path or generic arguments.
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.name)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.short_name())
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

pub(crate) fn short_type_name(name: &'static str) -> &'static str {
    let base = name.split('<').next().unwrap_or(name);
    let base = base.trim_start_matches("dyn ");
    base.rsplit("::").next().unwrap_or(base)
}

/// A type together with its declared interfaces and base type.
#[derive(Clone)]
pub struct TypeInfo {
    key: TypeKey,
    interfaces: Vec<TypeKey>,
    base: Option<Arc<TypeInfo>>,
}

impl TypeInfo {
    /// Info for `T` with no interfaces and no base.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::from_key(TypeKey::of::<T>())
    }

    /// Info for an existing key.
    pub fn from_key(key: TypeKey) -> Self {
        Self {
            key,
            interfaces: Vec::new(),
            base: None,
        }
    }

    /// Declare that the type implements interface `I` (usually `dyn Trait`).
    pub fn implements<I: ?Sized + 'static>(mut self) -> Self {
        self.interfaces.push(TypeKey::of::<I>());
        self
    }

    /// Declare the base type.
    pub fn extends(mut self, base: TypeInfo) -> Self {
        self.base = Some(Arc::new(base));
        self
    }

    /// The type's key.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Short type name.
    pub fn name(&self) -> &'static str {
        self.key.short_name()
    }

    /// Declared interfaces, in declaration order.
    pub fn interfaces(&self) -> &[TypeKey] {
        &self.interfaces
    }

    /// The base type, if any.
    pub fn base(&self) -> Option<&TypeInfo> {
        self.base.as_deref()
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("TypeInfo");
        s.field("type", &self.key.short_name());
        if !self.interfaces.is_empty() {
            s.field("interfaces", &self.interfaces);
        }
        if let Some(base) = &self.base {
            s.field("base", &base.name());
        }
        s.finish()
    }
}
