//! Installing and removing method hooks.
//!
//! A [`HookRegistry`] is bound to one [`Host`] and keeps a record of every
//! method it has wrapped. Each `(host, method)` pair moves through two states:
//!
//! ```text
//! Unhooked ──install_hook──▶ Hooked ──uninstall_hook──▶ Unhooked
//! ```
//!
//! Installing on a hooked pair, or uninstalling an unhooked one, fails.
//!
//! # Records
//!
//! Records are owned by the registry that created them. A method wrapped by
//! one registry is still protected from a second registry on the same host:
//! installing claims the name in the host's [`MethodTable`](crate::MethodTable),
//! and installing over a claimed name fails with [`HookError::AlreadyHooked`].
//! The claim outlives any reassignment of the slot and is released only by
//! uninstalling. Wrappers therefore never nest, and the saved original is
//! always the implementation that was live before hooking.
//!
//! # Slot attributes
//!
//! The wrapper takes over the original slot's attributes, and uninstalling
//! puts back both the original method and those attributes. Slots that are
//! not configurable cannot be hooked.
//!
//! Dropping a registry leaves its hooks installed; call
//! [`HookRegistry::uninstall_all`] to restore everything.
//!
//! # Example
//!
//! ```rust
//! use waylay::{Class, HookOperations, HookRegistry, Value};
//!
//! let greeter = Class::builder("Greeter")
//!     .method("greet", |_this, args| {
//!         let name = args.first().and_then(Value::as_str).unwrap_or("");
//!         Value::from(format!("hi {}", name))
//!     })
//!     .build();
//! let obj = Class::instantiate(&greeter);
//!
//! let mut hooks = HookRegistry::new(&greeter);
//! hooks.install_hook(
//!     "greet",
//!     HookOperations::new().after(|_this, _args, result| {
//!         Value::from(result.as_str().unwrap_or_default().to_uppercase())
//!     }),
//! )?;
//! assert_eq!(obj.call("greet", &["a".into()])?, Value::from("HI A"));
//!
//! hooks.uninstall_hook("greet")?;
//! assert_eq!(obj.call("greet", &["a".into()])?, Value::from("hi a"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::error::{HookError, Result};
use crate::host::Host;
use crate::object::{Method, Slot, SlotAttributes};
use crate::operations::HookOperations;
use crate::value::Value;

/// One hooked method: where it lives and what it was before hooking.
#[derive(Debug, Clone)]
pub struct HookRecord {
    host: Host,
    method_entry: String,
    method_instance: Method,
    attributes: SlotAttributes,
}

impl HookRecord {
    /// Returns the host the hooked method lives on.
    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Returns the name of the hooked method.
    pub fn method_entry(&self) -> &str {
        &self.method_entry
    }

    /// The implementation that was live before the hook was installed.
    pub fn method_instance(&self) -> &Method {
        &self.method_instance
    }

    /// The attributes of the slot before the hook was installed.
    pub fn attributes(&self) -> SlotAttributes {
        self.attributes
    }
}

/// Tracks, installs, and removes method hooks for one host.
#[derive(Debug, Default)]
pub struct HookRegistry {
    host: Option<Host>,
    records: Vec<HookRecord>,
}

impl HookRegistry {
    /// Creates a registry bound to `host`.
    pub fn new(host: impl Into<Host>) -> Self {
        Self {
            host: Some(host.into()),
            records: Vec::new(),
        }
    }

    /// Creates a registry from a dynamic value.
    ///
    /// Fails with [`HookError::InvalidHost`] unless the value is an object or
    /// a class.
    pub fn try_from_value(value: Value) -> Result<Self> {
        Host::try_from(value).map(Self::new)
    }

    /// Creates a registry with no host. Every install or uninstall fails with
    /// [`HookError::Unbound`] and every lookup finds nothing.
    pub fn unbound() -> Self {
        Self::default()
    }

    /// Returns the bound host, if any.
    pub fn host(&self) -> Option<&Host> {
        self.host.as_ref()
    }

    /// Active records, in install order.
    pub fn records(&self) -> &[HookRecord] {
        &self.records
    }

    /// Number of active hooks.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no hooks are active.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of the record for `method_entry` on the bound host.
    ///
    /// At most one record can match, so the first match is the only one.
    pub fn index_of_method_entry(&self, method_entry: &str) -> Option<usize> {
        let host = self.host.as_ref()?;
        self.records
            .iter()
            .position(|r| r.host.same_as(host) && r.method_entry == method_entry)
    }

    /// The original implementation saved for a hooked method, if any.
    pub fn get_method_instance(&self, method_entry: &str) -> Option<Method> {
        self.index_of_method_entry(method_entry)
            .map(|index| self.records[index].method_instance.clone())
    }

    /// Returns true if `method_entry` is hooked by this registry.
    pub fn is_hooked(&self, method_entry: &str) -> bool {
        self.index_of_method_entry(method_entry).is_some()
    }

    /// Names of hooked methods, in install order.
    pub fn hooked_entries(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.method_entry.clone())
            .collect()
    }

    /// Appends a record. Callers guarantee the entry is not already recorded.
    pub(crate) fn insert_method(
        &mut self,
        method_entry: &str,
        method_instance: Method,
        attributes: SlotAttributes,
    ) -> Result<()> {
        let host = self.bound_host()?.clone();
        self.records.push(HookRecord {
            host,
            method_entry: method_entry.to_string(),
            method_instance,
            attributes,
        });
        Ok(())
    }

    /// Removes the record for `method_entry`.
    pub(crate) fn remove_method(&mut self, method_entry: &str) -> Result<HookRecord> {
        let index = self
            .index_of_method_entry(method_entry)
            .ok_or_else(|| HookError::NotHooked {
                method: method_entry.to_string(),
            })?;
        Ok(self.records.remove(index))
    }

    /// Wraps `method_entry` on the bound host with `operations`.
    ///
    /// The host must define the method itself: a class host needs it in its
    /// own behavior table, an instance host in its own slots. Inherited
    /// methods are rejected with [`HookError::MissingMethod`].
    pub fn install_hook(&mut self, method_entry: &str, operations: HookOperations) -> Result<()> {
        let host = self.bound_host()?.clone();
        let table = host.table();

        if !host.defines(method_entry) {
            return Err(HookError::MissingMethod {
                host: host.to_string(),
                method: method_entry.to_string(),
            });
        }
        if self.is_hooked(method_entry) || table.is_claimed(method_entry) {
            return Err(HookError::AlreadyHooked {
                host: host.to_string(),
                method: method_entry.to_string(),
            });
        }

        let slot = table
            .get(method_entry)
            .ok_or_else(|| HookError::MissingMethod {
                host: host.to_string(),
                method: method_entry.to_string(),
            })?;
        if !slot.attributes().configurable {
            return Err(HookError::NotConfigurable {
                host: host.to_string(),
                method: method_entry.to_string(),
            });
        }

        let original = slot.method().clone();
        let attributes = slot.attributes();
        let wrapper = operations.wrap(method_entry, original.clone());

        table.define(method_entry, Slot::hooked(wrapper, attributes))?;
        table.claim(method_entry);
        self.insert_method(method_entry, original, attributes)?;

        tracing::debug!(method = method_entry, host = %host, "installed hook");
        Ok(())
    }

    /// Restores the original implementation of `method_entry` and forgets
    /// its record.
    pub fn uninstall_hook(&mut self, method_entry: &str) -> Result<()> {
        let host = self.bound_host()?.clone();
        let index = self
            .index_of_method_entry(method_entry)
            .ok_or_else(|| HookError::NotHooked {
                method: method_entry.to_string(),
            })?;

        let record = &self.records[index];
        let restored = Slot::new(record.method_instance.clone()).with_attributes(record.attributes);
        host.table().define(method_entry, restored)?;
        host.table().release(method_entry);
        self.remove_method(method_entry)?;

        tracing::debug!(method = method_entry, host = %host, "uninstalled hook");
        Ok(())
    }

    /// Uninstalls every hook, most recent first.
    ///
    /// Stops at the first failure, leaving the remaining hooks installed.
    pub fn uninstall_all(&mut self) -> Result<()> {
        while let Some(record) = self.records.last() {
            let method_entry = record.method_entry.clone();
            self.uninstall_hook(&method_entry)?;
        }
        Ok(())
    }

    fn bound_host(&self) -> Result<&Host> {
        self.host.as_ref().ok_or(HookError::Unbound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ObjectError;
    use crate::object::{Class, Object, SlotKind};
    use std::cell::Cell;
    use std::rc::Rc;

    fn ping_object() -> Rc<Object> {
        Object::builder().method("ping", |_, _| Value::from(1)).build()
    }

    #[test]
    fn test_index_of_unhooked_is_none() {
        let hooks = HookRegistry::new(ping_object());
        assert_eq!(hooks.index_of_method_entry("ping"), None);
        assert!(hooks.get_method_instance("ping").is_none());
    }

    #[test]
    fn test_insert_and_remove_method() {
        let obj = ping_object();
        let mut hooks = HookRegistry::new(&obj);
        let method = obj.own().get("ping").unwrap().method().clone();

        hooks
            .insert_method("ping", method.clone(), SlotAttributes::OPEN)
            .unwrap();
        assert_eq!(hooks.index_of_method_entry("ping"), Some(0));
        assert!(hooks.get_method_instance("ping").unwrap().ptr_eq(&method));

        let record = hooks.remove_method("ping").unwrap();
        assert_eq!(record.method_entry(), "ping");
        assert!(hooks.is_empty());
    }

    #[test]
    fn test_remove_method_not_hooked() {
        let mut hooks = HookRegistry::new(ping_object());
        assert_eq!(
            hooks.remove_method("ping").unwrap_err(),
            HookError::NotHooked {
                method: "ping".into()
            }
        );
    }

    #[test]
    fn test_install_marks_slot_and_keeps_attributes() {
        let hidden = SlotAttributes::OPEN.enumerable(false).writable(false);
        let obj = Object::builder()
            .slot(
                "ping",
                Slot::new(Method::new(|_, _| Value::from(1))).with_attributes(hidden),
            )
            .build();
        let original = obj.own().get("ping").unwrap().method().clone();

        let mut hooks = HookRegistry::new(&obj);
        hooks.install_hook("ping", HookOperations::new()).unwrap();

        let slot = obj.own().get("ping").unwrap();
        assert_eq!(slot.kind(), SlotKind::Hooked);
        assert_eq!(slot.attributes(), hidden);
        assert!(!slot.method().ptr_eq(&original));
        assert_eq!(hooks.records()[0].attributes(), hidden);
        assert!(obj.own().is_claimed("ping"));

        hooks.uninstall_hook("ping").unwrap();
        let slot = obj.own().get("ping").unwrap();
        assert_eq!(slot.kind(), SlotKind::Defined);
        assert_eq!(slot.attributes(), hidden);
        assert!(slot.method().ptr_eq(&original));
        assert!(!obj.own().is_claimed("ping"));
    }

    #[test]
    fn test_install_refuses_non_configurable() {
        let obj = Object::builder()
            .slot(
                "ping",
                Slot::new(Method::new(|_, _| Value::from(1)))
                    .with_attributes(SlotAttributes::SEALED),
            )
            .build();

        let mut hooks = HookRegistry::new(&obj);
        let err = hooks.install_hook("ping", HookOperations::new()).unwrap_err();
        assert!(matches!(err, HookError::NotConfigurable { .. }));
        assert!(hooks.is_empty());
        assert!(!obj.own().get("ping").unwrap().is_hooked());
    }

    #[test]
    fn test_unbound_registry() {
        let mut hooks = HookRegistry::unbound();
        assert!(hooks.host().is_none());
        assert_eq!(hooks.index_of_method_entry("ping"), None);
        assert_eq!(
            hooks.install_hook("ping", HookOperations::new()),
            Err(HookError::Unbound)
        );
        assert_eq!(hooks.uninstall_hook("ping"), Err(HookError::Unbound));
    }

    #[test]
    fn test_try_from_value() {
        assert!(HookRegistry::try_from_value(Value::from(ping_object())).is_ok());
        assert_eq!(
            HookRegistry::try_from_value(Value::from("host")).unwrap_err(),
            HookError::InvalidHost { found: "string" }
        );
    }

    #[test]
    fn test_uninstall_all_restores_in_reverse() {
        let obj = Object::builder()
            .method("a", |_, _| Value::from("a"))
            .method("b", |_, _| Value::from("b"))
            .build();
        let counter = Rc::new(Cell::new(0));

        let mut hooks = HookRegistry::new(&obj);
        for name in ["a", "b"] {
            let counter = counter.clone();
            hooks
                .install_hook(
                    name,
                    HookOperations::new().before(move |_, _| counter.set(counter.get() + 1)),
                )
                .unwrap();
        }
        assert_eq!(hooks.hooked_entries(), vec!["a".to_string(), "b".to_string()]);

        hooks.uninstall_all().unwrap();
        assert!(hooks.is_empty());

        obj.call("a", &[]).unwrap();
        obj.call("b", &[]).unwrap();
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn test_uninstall_fails_when_slot_sealed_while_hooked() {
        let obj = ping_object();
        let mut hooks = HookRegistry::new(&obj);
        hooks.install_hook("ping", HookOperations::new()).unwrap();

        let sealed = Slot::new(Method::new(|_, _| Value::from(2)))
            .with_attributes(SlotAttributes::SEALED);
        obj.own().define("ping", sealed).unwrap();

        assert_eq!(
            hooks.uninstall_hook("ping"),
            Err(HookError::Object(ObjectError::NotConfigurable {
                name: "ping".into()
            }))
        );
        assert!(hooks.is_hooked("ping"));
        assert!(obj.own().is_claimed("ping"));
    }

    #[test]
    fn test_class_host_wraps_behavior_table() {
        let class = Class::builder("Counter")
            .method("value", |_, _| Value::from(10))
            .build();
        let first = Class::instantiate(&class);
        let second = Class::instantiate(&class);

        let mut hooks = HookRegistry::new(&class);
        hooks
            .install_hook(
                "value",
                HookOperations::new().after(|_, _, result| {
                    Value::from(result.as_f64().unwrap_or_default() * 2.0)
                }),
            )
            .unwrap();

        assert_eq!(first.call("value", &[]).unwrap(), Value::from(20));
        assert_eq!(second.call("value", &[]).unwrap(), Value::from(20));
        assert!(!first.has_own_method("value"));
    }
}
