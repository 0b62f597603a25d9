//! Scoped name → value storage with lazy resolution.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::{ErrorCode, Operator, Value, VisError, VisResult};

/// A single scope level.
#[derive(Debug)]
struct Scope {
    /// Shown when the namespace is printed (`math`, a file name, ...).
    label: Option<String>,
    bindings: BTreeMap<String, Value>,
    /// Read-only fallback for lookups that miss locally.
    parent: Option<Namespace>,
    /// Structure instances: only existing fields may be assigned.
    fixed: bool,
}

/// Shared handle to a mutable scope.
///
/// Cloning the handle shares the scope. Lookups fall through to the parent
/// when the local scope misses; `declare` and `change_by` always write into
/// the local scope.
#[derive(Clone)]
pub struct Namespace(Rc<RefCell<Scope>>);

impl Namespace {
    /// Create an empty root namespace.
    pub fn new() -> Self {
        Self::from_scope(Scope {
            label: None,
            bindings: BTreeMap::new(),
            parent: None,
            fixed: false,
        })
    }

    /// Create an empty root namespace with a display label.
    pub fn labeled(label: impl Into<String>) -> Self {
        let ns = Self::new();
        ns.0.borrow_mut().label = Some(label.into());
        ns
    }

    /// Create an empty namespace layered over `parent`.
    pub fn with_parent(parent: &Namespace) -> Self {
        Self::from_scope(Scope {
            label: None,
            bindings: BTreeMap::new(),
            parent: Some(parent.clone()),
            fixed: false,
        })
    }

    /// Create a structure instance whose field set is fixed.
    pub fn structure(fields: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self::from_scope(Scope {
            label: None,
            bindings: fields.into_iter().collect(),
            parent: None,
            fixed: true,
        })
    }

    fn from_scope(scope: Scope) -> Self {
        Self(Rc::new(RefCell::new(scope)))
    }

    pub fn label(&self) -> Option<String> {
        self.0.borrow().label.clone()
    }

    pub fn is_structure(&self) -> bool {
        self.0.borrow().fixed
    }

    /// Bind `name` to `value`, creating or overwriting the local slot.
    ///
    /// Fails only on structure instances when `name` is not one of their fields.
    pub fn declare(&self, name: &str, value: Value) -> VisResult<()> {
        {
            let scope = self.0.borrow();
            if scope.fixed && !scope.bindings.contains_key(name) {
                return Err(VisError::new(
                    ErrorCode::FIELD_MISSING,
                    format!("can not access {name}, field missing"),
                ));
            }
        }
        trace!(name, value = %value, "declare");
        self.0.borrow_mut().bindings.insert(name.to_string(), value);
        Ok(())
    }

    /// Replace the value of an already declared `name` with `present op value`.
    ///
    /// Returns the new value.
    pub fn change_by(&self, name: &str, value: Value, op: Operator) -> VisResult<Value> {
        let present = self.lookup(name).ok_or_else(|| {
            VisError::new(
                ErrorCode::UNDECLARED_CHANGE,
                format!("can not change {name}, it was never declared"),
            )
        })?;
        let next = op.apply(&present, &value)?;
        self.declare(name, next.clone())?;
        Ok(next)
    }

    /// A lazy reference to `name` in this namespace.
    pub fn get(&self, name: &str) -> Unresolved {
        Unresolved::new(self.clone(), name)
    }

    /// Look up `name` here, then in the parent chain.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let scope = self.0.borrow();
        match scope.bindings.get(name) {
            Some(value) => Some(value.clone()),
            None => scope.parent.as_ref().and_then(|p| p.lookup(name)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Names bound in the local scope, sorted.
    pub fn names(&self) -> Vec<String> {
        self.0.borrow().bindings.keys().cloned().collect()
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Namespace) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = self.0.borrow();
        f.debug_struct("Namespace")
            .field("label", &scope.label)
            .field("names", &scope.bindings.keys().collect::<Vec<_>>())
            .field("fixed", &scope.fixed)
            .finish()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = self.0.borrow();
        if !scope.fixed {
            return match &scope.label {
                Some(label) => write!(f, "<namespace {label}>"),
                None => write!(f, "<namespace>"),
            };
        }
        write!(f, "{{")?;
        for (i, (name, value)) in scope.bindings.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: ")?;
            write_field(f, value)?;
        }
        write!(f, "}}")
    }
}

/// Fields may reach back to their own instance, directly or through arrays,
/// so any namespace inside a field prints as a placeholder.
fn write_field(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Namespace(_) => write!(f, "<namespace>"),
        Value::Array(items) => {
            write!(f, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_field(f, item)?;
            }
            write!(f, "]")
        }
        other => write!(f, "{other}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Unresolved
// ─────────────────────────────────────────────────────────────────────

/// A deferred reference to a namespace slot, resolved on demand.
#[derive(Clone)]
pub struct Unresolved {
    scope: Namespace,
    name: String,
}

impl Unresolved {
    pub fn new(scope: Namespace, name: impl Into<String>) -> Self {
        Self {
            scope,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace this reference reads from and writes into.
    pub fn scope(&self) -> &Namespace {
        &self.scope
    }

    /// Read the current value of the slot.
    pub fn resolve(&self) -> VisResult<Value> {
        self.scope.lookup(&self.name).ok_or_else(|| {
            VisError::new(ErrorCode::NO_VALUE, format!("no value for {}", self.name))
        })
    }
}

impl PartialEq for Unresolved {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.scope.ptr_eq(&other.scope)
    }
}

impl fmt::Debug for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unresolved({})", self.name)
    }
}
