//! Runtime values.
//!
//! [`Value`] is the closed set of things a statement can reduce to. Built-in
//! functions are [`Callable`]s; scopes and structure instances are
//! [`Namespace`] handles, so dotted access (`math.pi`, `p.x`) is just a walk
//! over namespace values.

use std::fmt;
use std::rc::Rc;

use crate::{Namespace, VisError, VisResult};

// ─────────────────────────────────────────────────────────────────────
// Value
// ─────────────────────────────────────────────────────────────────────

/// A fully resolved value.
#[derive(Debug, Clone)]
pub enum Value {
    /// All numbers are double precision.
    Number(f64),
    /// Result of `==` / `!=` and gate of `if`.
    Bool(bool),
    /// String literal contents (no escape processing).
    String(String),
    /// Result of an `[...]` sub-statement or of `list(...)`.
    Array(Vec<Value>),
    /// Lazy integer sequence produced by `range`.
    Range(Range),
    /// Built-in function, constructor or introducer.
    Function(Callable),
    /// Imported library, structure instance or any other scope.
    Namespace(Namespace),
}

impl Value {
    /// Name reported by the `type` builtin and in type errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Bool(_) => "bool",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Range(_) => "range",
            Self::Function(_) => "function",
            Self::Namespace(_) => "namespace",
        }
    }

    pub fn as_number(&self) -> VisResult<f64> {
        match self {
            Self::Number(n) => Ok(*n),
            other => Err(VisError::type_mismatch("number", other.type_name())),
        }
    }

    /// Truncate a number towards zero.
    pub fn as_int(&self) -> VisResult<i64> {
        self.as_number().map(|n| n as i64)
    }

    pub fn as_bool(&self) -> VisResult<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            other => Err(VisError::type_mismatch("bool", other.type_name())),
        }
    }

    pub fn as_str(&self) -> VisResult<&str> {
        match self {
            Self::String(s) => Ok(s),
            other => Err(VisError::type_mismatch("string", other.type_name())),
        }
    }

    pub fn as_array(&self) -> VisResult<&[Value]> {
        match self {
            Self::Array(items) => Ok(items),
            other => Err(VisError::type_mismatch("array", other.type_name())),
        }
    }

    pub fn as_namespace(&self) -> VisResult<&Namespace> {
        match self {
            Self::Namespace(ns) => Ok(ns),
            other => Err(VisError::type_mismatch("namespace", other.type_name())),
        }
    }

    pub fn as_callable(&self) -> VisResult<&Callable> {
        match self {
            Self::Function(f) => Ok(f),
            other => Err(VisError::type_mismatch("function", other.type_name())),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Range(a), Self::Range(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => a.ptr_eq(b),
            (Self::Namespace(a), Self::Namespace(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Range(range) => write!(f, "{range}"),
            Self::Function(callable) => write!(f, "<function {}>", callable.name()),
            Self::Namespace(ns) => write!(f, "{ns}"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Range
// ─────────────────────────────────────────────────────────────────────

/// A finite-or-not integer sequence advancing by `step` while `current < stop`.
///
/// The direction is not checked: a negative `step` with `start < stop`
/// never terminates. Every call to [`Range::iter`] restarts at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: i64,
    pub step: i64,
    pub stop: i64,
}

impl Range {
    pub fn new(start: i64, step: i64, stop: i64) -> Self {
        Self { start, step, stop }
    }

    pub fn iter(&self) -> RangeIter {
        RangeIter {
            current: Some(self.start),
            step: self.step,
            stop: self.stop,
        }
    }
}

impl IntoIterator for &Range {
    type Item = i64;
    type IntoIter = RangeIter;

    fn into_iter(self) -> RangeIter {
        self.iter()
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "range({}, {}, {})", self.start, self.step, self.stop)
    }
}

/// Iterator over a [`Range`].
#[derive(Debug, Clone)]
pub struct RangeIter {
    /// `None` once stepping past `i64` bounds.
    current: Option<i64>,
    step: i64,
    stop: i64,
}

impl Iterator for RangeIter {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        let current = self.current.filter(|c| *c < self.stop)?;
        self.current = current.checked_add(self.step);
        Some(current)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Callable
// ─────────────────────────────────────────────────────────────────────

/// Signature of every native function: the calling namespace plus the
/// already evaluated argument list.
pub type NativeFn = dyn Fn(&Namespace, Vec<Value>) -> VisResult<Value>;

/// How the tokenizer treats a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Plain function: the call is replaced by its result.
    Function,
    /// Control construct: the result is a gate deciding whether a
    /// following `{ ... }` block runs.
    Introducer,
}

struct CallableInner {
    name: String,
    kind: CallKind,
    func: Box<NativeFn>,
}

/// A value invocable with an evaluated argument list.
#[derive(Clone)]
pub struct Callable {
    inner: Rc<CallableInner>,
}

impl Callable {
    /// Wrap a native function.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Namespace, Vec<Value>) -> VisResult<Value> + 'static,
    {
        Self::with_kind(name, CallKind::Function, func)
    }

    /// Wrap a gate function that may introduce a block.
    pub fn introducer<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Namespace, Vec<Value>) -> VisResult<Value> + 'static,
    {
        Self::with_kind(name, CallKind::Introducer, func)
    }

    fn with_kind<F>(name: impl Into<String>, kind: CallKind, func: F) -> Self
    where
        F: Fn(&Namespace, Vec<Value>) -> VisResult<Value> + 'static,
    {
        Self {
            inner: Rc::new(CallableInner {
                name: name.into(),
                kind,
                func: Box::new(func),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn kind(&self) -> CallKind {
        self.inner.kind
    }

    pub fn is_introducer(&self) -> bool {
        self.inner.kind == CallKind::Introducer
    }

    /// Invoke with the namespace of the call site.
    pub fn call(&self, scope: &Namespace, args: Vec<Value>) -> VisResult<Value> {
        (self.inner.func)(scope, args)
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.inner.name)
            .field("kind", &self.inner.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;

    #[test]
    fn test_range_is_restartable() {
        let range = Range::new(0, 1, 5);
        let first: Vec<i64> = range.iter().collect();
        let second: Vec<i64> = range.iter().collect();
        assert_eq!(first, vec![0, 1, 2, 3, 4]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_range_with_step() {
        let range = Range::new(1, 3, 10);
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![1, 4, 7]);
    }

    #[test]
    fn test_range_empty_when_start_reaches_stop() {
        assert_eq!(Range::new(5, 1, 5).iter().count(), 0);
    }

    #[test]
    fn test_range_stops_at_i64_overflow() {
        let range = Range::new(i64::MAX - 1, 1, i64::MAX);
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![i64::MAX - 1]);
    }

    #[test]
    fn test_negative_step_runs_on() {
        // Caller responsibility: nothing stops this sequence early.
        let taken: Vec<i64> = Range::new(0, -1, 5).iter().take(3).collect();
        assert_eq!(taken, vec![0, -1, -2]);
    }

    #[test]
    fn test_typed_accessors() {
        assert_eq!(Value::Number(2.5).as_number(), Ok(2.5));
        assert_eq!(Value::Number(-2.9).as_int(), Ok(-2));
        assert_eq!(Value::from("x").as_str(), Ok("x"));
        let err = Value::from("x").as_number().unwrap_err();
        assert_eq!(err.code, ErrorCode::TYPE_MISMATCH);
        assert_eq!(err.message, "expected number, got string");
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::Number(2.0), Value::Number(2.0));
        assert_ne!(Value::Number(1.0), Value::Bool(true));
        assert_eq!(
            Value::Array(vec![1.0.into(), "a".into()]),
            Value::Array(vec![1.0.into(), "a".into()])
        );
        let f = Callable::new("f", |_, _| Ok(Value::Bool(true)));
        let g = Callable::new("f", |_, _| Ok(Value::Bool(true)));
        assert_eq!(Value::Function(f.clone()), Value::Function(f.clone()));
        assert_ne!(Value::Function(f), Value::Function(g));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(23.0).to_string(), "23");
        assert_eq!(Value::Number(3.14).to_string(), "3.14");
        assert_eq!(
            Value::Array(vec![1.0.into(), Value::Bool(false)]).to_string(),
            "[1, false]"
        );
        assert_eq!(Value::Range(Range::new(0, 1, 5)).to_string(), "range(0, 1, 5)");
        let f = Callable::new("sin", |_, _| Ok(Value::Number(0.0)));
        assert_eq!(Value::Function(f).to_string(), "<function sin>");
    }

    #[test]
    fn test_callable_invocation() {
        let double = Callable::new("double", |_, args: Vec<Value>| {
            Ok(Value::Number(args[0].as_number()? * 2.0))
        });
        let ns = Namespace::new();
        assert_eq!(double.call(&ns, vec![4.0.into()]), Ok(Value::Number(8.0)));
        assert!(!double.is_introducer());
        let gate = Callable::introducer("if", |_, _| Ok(Value::Bool(true)));
        assert_eq!(gate.kind(), CallKind::Introducer);
    }
}
