//! Before and after callbacks run around a hooked method.
//!
//! ```text
//! caller
//!   → BEFORE ← (inspect receiver and arguments; return value ignored)
//!   → original method
//!   → AFTER  ← (receives the original result; its return replaces it)
//!   → caller
//! ```
//!
//! Both callbacks are optional. With neither set, the wrapper passes calls
//! straight through to the original.

use std::fmt;
use std::rc::Rc;

use crate::object::{Method, Object};
use crate::value::Value;

/// Callback run before the original method.
pub type BeforeFn = Rc<dyn Fn(&Object, &[Value])>;

/// Callback run after the original method. Its return value becomes the
/// call's result.
pub type AfterFn = Rc<dyn Fn(&Object, &[Value], Value) -> Value>;

/// The callbacks a hook runs around a method.
#[derive(Clone, Default)]
pub struct HookOperations {
    before: Option<BeforeFn>,
    after: Option<AfterFn>,
}

impl HookOperations {
    /// Creates operations with no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the before callback.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    /// use waylay::HookOperations;
    ///
    /// let calls = Rc::new(Cell::new(0));
    /// let counter = calls.clone();
    /// let ops = HookOperations::new().before(move |_this, _args| {
    ///     counter.set(counter.get() + 1);
    /// });
    /// assert!(ops.has_before());
    /// ```
    pub fn before<F>(mut self, f: F) -> Self
    where
        F: Fn(&Object, &[Value]) + 'static,
    {
        self.before = Some(Rc::new(f));
        self
    }

    /// Sets the after callback.
    pub fn after<F>(mut self, f: F) -> Self
    where
        F: Fn(&Object, &[Value], Value) -> Value + 'static,
    {
        self.after = Some(Rc::new(f));
        self
    }

    /// Returns true if a before callback is set.
    pub fn has_before(&self) -> bool {
        self.before.is_some()
    }

    /// Returns true if an after callback is set.
    pub fn has_after(&self) -> bool {
        self.after.is_some()
    }

    /// Returns true if no callbacks are set.
    pub fn is_empty(&self) -> bool {
        self.before.is_none() && self.after.is_none()
    }

    /// Runs one wrapped call: before, original, after.
    pub fn run(&self, original: &Method, this: &Object, args: &[Value]) -> Value {
        if let Some(before) = &self.before {
            before(this, args);
        }
        let result = original.call(this, args);
        match &self.after {
            Some(after) => after(this, args, result),
            None => result,
        }
    }

    /// Builds the method that replaces `original` in its slot.
    pub(crate) fn wrap(self, method_entry: &str, original: Method) -> Method {
        let method_entry = method_entry.to_string();
        Method::new(move |this, args| {
            tracing::trace!(method = %method_entry, args = args.len(), "hooked call");
            self.run(&original, this, args)
        })
    }
}

impl fmt::Debug for HookOperations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookOperations")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn add_one() -> Method {
        Method::new(|_, args| {
            let n = args.first().and_then(Value::as_f64).unwrap_or(0.0);
            Value::from(n + 1.0)
        })
    }

    #[test]
    fn test_empty_passes_through() {
        let ops = HookOperations::new();
        assert!(ops.is_empty());
        let obj = Object::new();
        assert_eq!(ops.run(&add_one(), &obj, &[Value::from(1)]), Value::from(2));
    }

    #[test]
    fn test_order_of_calls() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let before_log = log.clone();
        let after_log = log.clone();
        let original_log = log.clone();

        let original = Method::new(move |_, _| {
            original_log.borrow_mut().push("original");
            Value::from(1)
        });
        let ops = HookOperations::new()
            .before(move |_, _| before_log.borrow_mut().push("before"))
            .after(move |_, _, result| {
                after_log.borrow_mut().push("after");
                result
            });

        let obj = Object::new();
        ops.run(&original, &obj, &[]);
        assert_eq!(*log.borrow(), vec!["before", "original", "after"]);
    }

    #[test]
    fn test_after_replaces_result() {
        let seen = Rc::new(RefCell::new(None));
        let seen_clone = seen.clone();
        let ops = HookOperations::new().after(move |_, _, result| {
            *seen_clone.borrow_mut() = Some(result);
            Value::from("replaced")
        });

        let obj = Object::new();
        let result = ops.run(&add_one(), &obj, &[Value::from(41)]);
        assert_eq!(result, Value::from("replaced"));
        assert_eq!(*seen.borrow(), Some(Value::from(42)));
    }

    #[test]
    fn test_before_sees_arguments() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let ops = HookOperations::new().before(move |_, args| {
            seen_clone.borrow_mut().extend(args.iter().cloned());
        });

        let obj = Object::new();
        let result = ops.run(&add_one(), &obj, &[Value::from(1), Value::from("x")]);
        assert_eq!(result, Value::from(2));
        assert_eq!(*seen.borrow(), vec![Value::from(1), Value::from("x")]);
    }

    #[test]
    fn test_presence_flags() {
        let ops = HookOperations::new().after(|_, _, result| result);
        assert!(ops.has_after());
        assert!(!ops.has_before());
        assert!(!ops.is_empty());
    }

    #[test]
    fn test_debug_shows_presence() {
        let ops = HookOperations::new().before(|_, _| {});
        assert_eq!(
            format!("{:?}", ops),
            "HookOperations { before: true, after: false }"
        );
    }
}
