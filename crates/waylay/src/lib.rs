//! Runtime method interception with before/after hooks.
//!
//! `waylay` wraps a single named method of a live object or class so that
//! caller-supplied callbacks run around the original implementation, and
//! later puts the original back.
//!
//! # Features
//!
//! - **Object model**: classes with shared behavior tables, objects with own
//!   slots, and per-slot attributes (enumerable, writable, configurable)
//! - **Hooks**: optional `before` and `after` callbacks around one method
//! - **Restoration**: uninstalling restores the exact original method and its
//!   slot attributes
//! - **Single hook per method**: a method cannot be wrapped twice, by the same
//!   registry or by another one
//!
//! # Hosts
//!
//! A registry is bound to one [`Host`]:
//!
//! | Host | Slot that gets wrapped | Who sees the hook |
//! |------|------------------------|-------------------|
//! | [`Host::SharedBehavior`] | the class's own behavior table | every instance |
//! | [`Host::Instance`] | the object's own slots | that object only |
//!
//! # Usage
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use waylay::{HookOperations, HookRegistry, Object, Value};
//!
//! let obj = Object::builder().method("ping", |_this, _args| Value::from(1)).build();
//! let original = obj.own().get("ping").unwrap().method().clone();
//!
//! let calls = Rc::new(Cell::new(0));
//! let counter = calls.clone();
//!
//! let mut hooks = HookRegistry::new(&obj);
//! hooks.install_hook(
//!     "ping",
//!     HookOperations::new().before(move |_this, _args| counter.set(counter.get() + 1)),
//! )?;
//!
//! for _ in 0..3 {
//!     assert_eq!(obj.call("ping", &[])?, Value::from(1));
//! }
//! assert_eq!(calls.get(), 3);
//! assert!(hooks.get_method_instance("ping").unwrap().ptr_eq(&original));
//!
//! hooks.uninstall_hook("ping")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Threading
//!
//! Objects, classes and registries are single-threaded (`Rc` and `RefCell`
//! inside) and are not `Send`. No table borrow is held while a method or a
//! callback runs, so methods may call other methods on the same object.

mod error;
mod host;
mod object;
mod operations;
mod registry;
mod value;

pub use error::{HookError, ObjectError, Result};
pub use host::Host;
pub use object::{
    Class, ClassBuilder, Method, MethodTable, Object, ObjectBuilder, Slot, SlotAttributes,
    SlotKind,
};
pub use operations::{AfterFn, BeforeFn, HookOperations};
pub use registry::{HookRecord, HookRegistry};
pub use value::Value;
