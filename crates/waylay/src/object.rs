//! A small dynamic object model with mutable method slots.
//!
//! This is the live object system that hooks operate on. It has two kinds of
//! method owners:
//!
//! - [`Class`]: owns a shared behavior table used by every instance, and may
//!   extend a parent class whose table is consulted after its own.
//! - [`Object`]: owns its own slots and optionally links to a class.
//!
//! Both store their methods in a [`MethodTable`], an ordered list of named
//! [`Slot`]s. Tables use interior mutability so a slot can be redefined while
//! the owner is shared through `Rc`.
//!
//! # Lookup
//!
//! ```text
//! Object::call("greet")
//!   → object's own slots
//!   → class behavior table
//!   → parent class behavior table
//!   → ...
//! ```
//!
//! # Slot attributes
//!
//! | Attribute | Effect when `false` |
//! |-----------|---------------------|
//! | `enumerable` | Hidden from [`MethodTable::method_names`] |
//! | `writable` | [`MethodTable::assign`] fails with `ReadOnly` |
//! | `configurable` | [`MethodTable::define`] and [`MethodTable::remove`] fail with `NotConfigurable` |
//!
//! # Example
//!
//! ```rust
//! use waylay::{Class, Value};
//!
//! let greeter = Class::builder("Greeter")
//!     .method("greet", |_this, args| {
//!         let name = args.first().and_then(Value::as_str).unwrap_or("");
//!         Value::from(format!("hi {}", name))
//!     })
//!     .build();
//!
//! let obj = Class::instantiate(&greeter);
//! assert_eq!(obj.call("greet", &["a".into()])?, Value::from("hi a"));
//! # Ok::<(), waylay::ObjectError>(())
//! ```

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use crate::error::ObjectError;
use crate::value::Value;

/// A callable method implementation.
///
/// Receives the object the method was called on and the call arguments.
/// Cloning a `Method` shares the same implementation; [`Method::ptr_eq`]
/// tells whether two handles refer to the same one.
#[derive(Clone)]
pub struct Method(Rc<dyn Fn(&Object, &[Value]) -> Value>);

impl Method {
    /// Wraps a closure as a method.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Object, &[Value]) -> Value + 'static,
    {
        Self(Rc::new(f))
    }

    /// Invokes the method with `this` as the receiver.
    pub fn call(&self, this: &Object, args: &[Value]) -> Value {
        (self.0)(this, args)
    }

    /// Returns true if both handles share one implementation.
    pub fn ptr_eq(&self, other: &Method) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Method({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// Property attributes of a method slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAttributes {
    pub enumerable: bool,
    pub writable: bool,
    pub configurable: bool,
}

impl SlotAttributes {
    /// All attributes on. The default for methods defined through builders.
    pub const OPEN: SlotAttributes = SlotAttributes {
        enumerable: true,
        writable: true,
        configurable: true,
    };

    /// Enumerable but neither writable nor configurable.
    pub const SEALED: SlotAttributes = SlotAttributes {
        enumerable: true,
        writable: false,
        configurable: false,
    };

    /// Sets `enumerable`.
    pub fn enumerable(mut self, on: bool) -> Self {
        self.enumerable = on;
        self
    }

    /// Sets `writable`.
    pub fn writable(mut self, on: bool) -> Self {
        self.writable = on;
        self
    }

    /// Sets `configurable`.
    pub fn configurable(mut self, on: bool) -> Self {
        self.configurable = on;
        self
    }
}

impl Default for SlotAttributes {
    fn default() -> Self {
        Self::OPEN
    }
}

/// Whether a slot holds an ordinary method or a hook wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotKind {
    /// An ordinary method.
    #[default]
    Defined,
    /// A wrapper installed by a hook.
    Hooked,
}

/// A named method entry: the implementation plus its attributes.
#[derive(Debug, Clone)]
pub struct Slot {
    method: Method,
    attributes: SlotAttributes,
    kind: SlotKind,
}

impl Slot {
    /// Creates an ordinary slot with open attributes.
    pub fn new(method: Method) -> Self {
        Self {
            method,
            attributes: SlotAttributes::OPEN,
            kind: SlotKind::Defined,
        }
    }

    /// Sets the slot attributes.
    pub fn with_attributes(mut self, attributes: SlotAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Creates a slot occupied by a hook wrapper.
    pub(crate) fn hooked(method: Method, attributes: SlotAttributes) -> Self {
        Self {
            method,
            attributes,
            kind: SlotKind::Hooked,
        }
    }

    /// Returns the slot's method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the slot's attributes.
    pub fn attributes(&self) -> SlotAttributes {
        self.attributes
    }

    /// Returns whether the slot holds an ordinary method or a hook wrapper.
    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    /// Returns true if a hook wrapper currently occupies this slot.
    pub fn is_hooked(&self) -> bool {
        self.kind == SlotKind::Hooked
    }
}

/// Ordered, named method slots.
///
/// Every accessor returns owned clones; no borrow of the table outlives the
/// call, so methods running on the same object may freely read or redefine
/// slots.
///
/// The table also tracks which names are claimed by a hook. A claim lives
/// apart from the slot, so redefining or assigning over a hooked slot does
/// not release it.
#[derive(Debug, Default)]
pub struct MethodTable {
    slots: RefCell<Vec<(String, Slot)>>,
    claims: RefCell<BTreeSet<String>>,
}

impl MethodTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot defined directly in this table.
    pub fn get(&self, name: &str) -> Option<Slot> {
        self.slots
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, slot)| slot.clone())
    }

    /// Returns true if this table directly defines `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.slots.borrow().iter().any(|(n, _)| n == name)
    }

    /// Defines or redefines a slot, replacing its method and attributes.
    ///
    /// An existing slot keeps its position. Fails if the existing slot is not
    /// configurable.
    pub fn define(&self, name: &str, slot: Slot) -> Result<(), ObjectError> {
        let mut slots = self.slots.borrow_mut();
        match slots.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => {
                if !existing.attributes.configurable {
                    return Err(ObjectError::NotConfigurable { name: name.into() });
                }
                *existing = slot;
            }
            None => slots.push((name.to_string(), slot)),
        }
        Ok(())
    }

    /// Assigns a new method, the way plain assignment would.
    ///
    /// An existing slot keeps its attributes and becomes an ordinary slot;
    /// a new slot gets open attributes. Fails if the existing slot is not
    /// writable.
    pub fn assign(&self, name: &str, method: Method) -> Result<(), ObjectError> {
        let mut slots = self.slots.borrow_mut();
        match slots.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => {
                if !existing.attributes.writable {
                    return Err(ObjectError::ReadOnly { name: name.into() });
                }
                existing.method = method;
                existing.kind = SlotKind::Defined;
            }
            None => slots.push((name.to_string(), Slot::new(method))),
        }
        Ok(())
    }

    /// Removes a slot, returning it. Fails if the slot is not configurable.
    pub fn remove(&self, name: &str) -> Result<Option<Slot>, ObjectError> {
        let mut slots = self.slots.borrow_mut();
        let Some(index) = slots.iter().position(|(n, _)| n == name) else {
            return Ok(None);
        };
        if !slots[index].1.attributes.configurable {
            return Err(ObjectError::NotConfigurable { name: name.into() });
        }
        Ok(Some(slots.remove(index).1))
    }

    /// Inserts or replaces a slot regardless of attributes.
    fn put(&self, name: &str, slot: Slot) {
        let mut slots = self.slots.borrow_mut();
        match slots.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = slot,
            None => slots.push((name.to_string(), slot)),
        }
    }

    /// Names of enumerable slots, in definition order.
    pub fn method_names(&self) -> Vec<String> {
        self.slots
            .borrow()
            .iter()
            .filter(|(_, slot)| slot.attributes.enumerable)
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Names of all slots, in definition order.
    pub fn all_method_names(&self) -> Vec<String> {
        self.slots.borrow().iter().map(|(n, _)| n.clone()).collect()
    }

    /// Returns true if a hook currently claims `name`.
    pub fn is_claimed(&self, name: &str) -> bool {
        self.claims.borrow().contains(name)
    }

    /// Claims `name` for a hook. Returns false if it was already claimed.
    pub(crate) fn claim(&self, name: &str) -> bool {
        self.claims.borrow_mut().insert(name.to_string())
    }

    /// Releases a hook's claim on `name`.
    pub(crate) fn release(&self, name: &str) {
        self.claims.borrow_mut().remove(name);
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    /// Returns true if the table has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }
}

/// A class: a name, a shared behavior table, and an optional parent.
pub struct Class {
    name: String,
    behavior: MethodTable,
    parent: Option<Rc<Class>>,
}

impl Class {
    /// Creates a class with an empty behavior table.
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Self::builder(name).build()
    }

    /// Starts building a class.
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder {
            name: name.into(),
            behavior: MethodTable::new(),
            parent: None,
        }
    }

    /// Returns the class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parent class, if any.
    pub fn parent(&self) -> Option<&Rc<Class>> {
        self.parent.as_ref()
    }

    /// The shared behavior table. Only methods defined directly on this
    /// class live here; inherited ones stay in the parent's table.
    pub fn behavior(&self) -> &MethodTable {
        &self.behavior
    }

    /// Finds a slot in this class or, failing that, up the parent chain.
    pub fn lookup(&self, name: &str) -> Option<Slot> {
        let mut class = Some(self);
        while let Some(current) = class {
            if let Some(slot) = current.behavior.get(name) {
                return Some(slot);
            }
            class = current.parent.as_deref();
        }
        None
    }

    /// Assigns a method on the behavior table.
    pub fn define_method<F>(&self, name: &str, f: F) -> Result<(), ObjectError>
    where
        F: Fn(&Object, &[Value]) -> Value + 'static,
    {
        self.behavior.assign(name, Method::new(f))
    }

    /// Creates an instance with no own slots.
    pub fn instantiate(this: &Rc<Self>) -> Rc<Object> {
        Rc::new(Object {
            class: Some(Rc::clone(this)),
            own: MethodTable::new(),
        })
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("methods", &self.behavior.all_method_names())
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .finish()
    }
}

/// Builder for [`Class`].
pub struct ClassBuilder {
    name: String,
    behavior: MethodTable,
    parent: Option<Rc<Class>>,
}

impl ClassBuilder {
    /// Adds a method with open attributes.
    pub fn method<F>(self, name: &str, f: F) -> Self
    where
        F: Fn(&Object, &[Value]) -> Value + 'static,
    {
        self.slot(name, Slot::new(Method::new(f)))
    }

    /// Adds a slot with explicit attributes.
    pub fn slot(self, name: &str, slot: Slot) -> Self {
        self.behavior.put(name, slot);
        self
    }

    /// Sets the parent class.
    pub fn extends(mut self, parent: &Rc<Class>) -> Self {
        self.parent = Some(Rc::clone(parent));
        self
    }

    /// Finishes the class.
    pub fn build(self) -> Rc<Class> {
        Rc::new(Class {
            name: self.name,
            behavior: self.behavior,
            parent: self.parent,
        })
    }
}

/// An object instance: its own slots plus an optional class link.
#[derive(Default)]
pub struct Object {
    class: Option<Rc<Class>>,
    own: MethodTable,
}

impl Object {
    /// Creates a plain object with no class and no methods.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts building a plain object.
    pub fn builder() -> ObjectBuilder {
        ObjectBuilder {
            object: Object::new(),
        }
    }

    /// Returns the class this object is linked to, if any.
    pub fn class(&self) -> Option<&Rc<Class>> {
        self.class.as_ref()
    }

    /// The object's own slots.
    pub fn own(&self) -> &MethodTable {
        &self.own
    }

    /// Returns true if the object itself defines `name`.
    pub fn has_own_method(&self, name: &str) -> bool {
        self.own.contains(name)
    }

    /// Finds a slot on the object, then on its class chain.
    pub fn lookup(&self, name: &str) -> Option<Slot> {
        self.own
            .get(name)
            .or_else(|| self.class.as_ref().and_then(|class| class.lookup(name)))
    }

    /// Assigns a method on the object's own slots.
    pub fn define_method<F>(&self, name: &str, f: F) -> Result<(), ObjectError>
    where
        F: Fn(&Object, &[Value]) -> Value + 'static,
    {
        self.own.assign(name, Method::new(f))
    }

    /// Calls a method with this object as the receiver.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, ObjectError> {
        let slot = self
            .lookup(name)
            .ok_or_else(|| ObjectError::MethodNotFound { name: name.into() })?;
        Ok(slot.method().call(self, args))
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", &self.class.as_ref().map(|c| c.name()))
            .field("own", &self.own.all_method_names())
            .finish()
    }
}

/// Builder for plain [`Object`]s.
pub struct ObjectBuilder {
    object: Object,
}

impl ObjectBuilder {
    /// Adds an own method with open attributes.
    pub fn method<F>(self, name: &str, f: F) -> Self
    where
        F: Fn(&Object, &[Value]) -> Value + 'static,
    {
        self.slot(name, Slot::new(Method::new(f)))
    }

    /// Adds an own slot with explicit attributes.
    pub fn slot(self, name: &str, slot: Slot) -> Self {
        self.object.own.put(name, slot);
        self
    }

    /// Links the object to a class.
    pub fn class(mut self, class: &Rc<Class>) -> Self {
        self.object.class = Some(Rc::clone(class));
        self
    }

    /// Finishes the object.
    pub fn build(self) -> Rc<Object> {
        Rc::new(self.object)
    }
}
