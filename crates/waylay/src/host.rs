//! Hook hosts.
//!
//! A [`Host`] names where a hook is installed. The choice is made once, when
//! the host is created:
//!
//! - [`Host::SharedBehavior`]: a class. Hooks replace slots in the class's own
//!   behavior table, so every instance sees the wrapper.
//! - [`Host::Instance`]: a single object. Hooks replace the object's own slots.
//!
//! Hosts compare by identity: two `Host`s are equal when they refer to the
//! same class or the same object.

use std::fmt;
use std::rc::Rc;

use crate::error::HookError;
use crate::object::{Class, MethodTable, Object};
use crate::value::Value;

/// The entity whose method slots a registry mutates.
#[derive(Clone)]
pub enum Host {
    /// A class; hooks apply to its shared behavior table.
    SharedBehavior(Rc<Class>),
    /// An object; hooks apply to its own slots.
    Instance(Rc<Object>),
}

impl Host {
    /// The table whose slots get wrapped.
    pub fn table(&self) -> &MethodTable {
        match self {
            Host::SharedBehavior(class) => class.behavior(),
            Host::Instance(obj) => obj.own(),
        }
    }

    /// Returns true if the host itself defines `method_entry` (inherited
    /// methods do not count).
    pub fn defines(&self, method_entry: &str) -> bool {
        self.table().contains(method_entry)
    }

    /// Returns true if hooks on this host apply to a class's behavior table.
    pub fn is_shared_behavior(&self) -> bool {
        matches!(self, Host::SharedBehavior(_))
    }

    /// Returns true if both hosts refer to the same class or object.
    pub fn same_as(&self, other: &Host) -> bool {
        match (self, other) {
            (Host::SharedBehavior(a), Host::SharedBehavior(b)) => Rc::ptr_eq(a, b),
            (Host::Instance(a), Host::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for Host {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for Host {}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::SharedBehavior(class) => write!(f, "class {}", class.name()),
            Host::Instance(obj) => match obj.class() {
                Some(class) => write!(f, "instance of {}", class.name()),
                None => write!(f, "object"),
            },
        }
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Host({})", self)
    }
}

impl From<Rc<Class>> for Host {
    fn from(class: Rc<Class>) -> Self {
        Host::SharedBehavior(class)
    }
}

impl From<&Rc<Class>> for Host {
    fn from(class: &Rc<Class>) -> Self {
        Host::SharedBehavior(Rc::clone(class))
    }
}

impl From<Rc<Object>> for Host {
    fn from(obj: Rc<Object>) -> Self {
        Host::Instance(obj)
    }
}

impl From<&Rc<Object>> for Host {
    fn from(obj: &Rc<Object>) -> Self {
        Host::Instance(Rc::clone(obj))
    }
}

impl TryFrom<Value> for Host {
    type Error = HookError;

    /// Accepts classes and objects; anything else is not a valid host.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Class(class) => Ok(Host::SharedBehavior(class)),
            Value::Object(obj) => Ok(Host::Instance(obj)),
            other => Err(HookError::InvalidHost {
                found: other.type_name(),
            }),
        }
    }
}
