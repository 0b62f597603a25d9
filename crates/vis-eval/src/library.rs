//! The built-in library.
//!
//! A [`Library`] builds a fresh built-in namespace per execution context.
//! User code runs in a child scope over it ([`Library::scope`]), so a
//! declaration can shadow a builtin without touching other contexts.

use std::cell::RefCell;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, warn};
use vis_types::{
    Callable, ErrorCode, Namespace, Range, Value, VisError, VisResult,
};

use crate::math::{self, MAX_FACTORIAL};

/// Names accepted by `import`.
const LIBRARIES: &[&str] = &["math"];

/// Shared sink for `print`.
type Output = Rc<RefCell<dyn Write>>;

/// Factory for built-in namespaces.
#[derive(Clone)]
pub struct Library {
    output: Output,
    file: Option<PathBuf>,
}

impl Library {
    /// A library whose `print` writes to stdout.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }

    /// A library whose `print` writes to `sink`.
    pub fn with_output<W: Write + 'static>(sink: W) -> Self {
        Self {
            output: Rc::new(RefCell::new(sink)),
            file: None,
        }
    }

    /// Bind `__file__` to the absolute form of `path` in every scope built.
    pub fn file_scope(mut self, path: &Path) -> Self {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        self.file = Some(absolute);
        self
    }

    /// Names `import` can load.
    pub fn libraries() -> &'static [&'static str] {
        LIBRARIES
    }

    /// Build a fresh instance of the library called `name`.
    pub fn load(name: &str) -> VisResult<Namespace> {
        match name {
            "math" => Ok(math::library()),
            _ => Err(VisError::new(
                ErrorCode::UNKNOWN_LIBRARY,
                format!(
                    "no library named {name}, expected one of: {}",
                    LIBRARIES.join(", ")
                ),
            )),
        }
    }

    /// A fresh namespace holding every builtin and the math set.
    pub fn builtins(&self) -> Namespace {
        let ns = Namespace::labeled("builtins");
        for callable in [
            range(),
            type_of(),
            str_of(),
            int(),
            float(),
            self.print(),
            import(),
            if_gate(),
            structure(),
            list(),
            len(),
        ] {
            bind(&ns, callable);
        }
        math::install(&ns);
        ns
    }

    /// A mutable user scope layered over fresh builtins.
    pub fn scope(&self) -> Namespace {
        let ns = Namespace::with_parent(&self.builtins());
        if let Some(file) = &self.file {
            define(&ns, "__file__", Value::String(file.display().to_string()));
        }
        ns
    }

    fn print(&self) -> Callable {
        let output = Rc::clone(&self.output);
        Callable::new("print", move |_, args: Vec<Value>| {
            let line: Vec<String> = args.iter().map(ToString::to_string).collect();
            let mut sink = output.borrow_mut();
            if let Err(err) = writeln!(sink, "{}", line.join(" ")) {
                warn!(%err, "print could not write");
            }
            Ok(Value::Array(args))
        })
    }
}

impl Default for Library {
    fn default() -> Self {
        Self::new()
    }
}

/// Declare `name` in a scope built here. Only structure instances reject
/// declarations, and the library never defines into one.
pub(crate) fn define(ns: &Namespace, name: &str, value: Value) {
    debug_assert!(!ns.is_structure(), "library scopes are plain");
    let declared = ns.declare(name, value);
    debug_assert!(declared.is_ok(), "plain scopes accept declarations");
}

/// Declare `callable` under its own name.
pub(crate) fn bind(ns: &Namespace, callable: Callable) {
    let name = callable.name().to_string();
    define(ns, &name, Value::Function(callable));
}

// ══════════════════════════════════════════════════════════════════════
// Argument helpers
// ══════════════════════════════════════════════════════════════════════

/// Require exactly `expected` arguments: a missing one is out of range,
/// surplus ones are a wrong count.
pub(crate) fn expect_args(name: &str, args: &[Value], expected: usize) -> VisResult<()> {
    match args.len() {
        n if n == expected => Ok(()),
        n if n < expected => Err(VisError::new(
            ErrorCode::INDEX_OUT_OF_RANGE,
            format!("{name} is missing argument {} of {expected}", n + 1),
        )),
        n => Err(VisError::new(
            ErrorCode::WRONG_ARG_COUNT,
            format!("{name} takes {expected} argument(s), got {n}"),
        )),
    }
}

/// A whole number in `0..=170`.
pub(crate) fn natural(name: &str, value: &Value) -> VisResult<u32> {
    let n = value.as_number()?;
    if n.fract() != 0.0 || !(0.0..=f64::from(MAX_FACTORIAL)).contains(&n) {
        return Err(VisError::new(
            ErrorCode::TYPE_MISMATCH,
            format!("{name} expects a natural number up to {MAX_FACTORIAL}, got {n}"),
        ));
    }
    Ok(n as u32)
}

// ══════════════════════════════════════════════════════════════════════
// Builtins
// ══════════════════════════════════════════════════════════════════════

fn range() -> Callable {
    Callable::new("range", |_, args: Vec<Value>| {
        let range = match args.as_slice() {
            [stop] => Range::new(0, 1, stop.as_int()?),
            [start, step, stop] => Range::new(start.as_int()?, step.as_int()?, stop.as_int()?),
            _ => {
                return Err(VisError::new(
                    ErrorCode::WRONG_ARG_COUNT,
                    format!("range takes 1 or 3 arguments, got {}", args.len()),
                ))
            }
        };
        Ok(Value::Range(range))
    })
}

fn type_of() -> Callable {
    Callable::new("type", |_, args: Vec<Value>| {
        expect_args("type", &args, 1)?;
        Ok(Value::from(args[0].type_name()))
    })
}

fn str_of() -> Callable {
    Callable::new("str", |_, args: Vec<Value>| {
        expect_args("str", &args, 1)?;
        Ok(Value::String(args[0].to_string()))
    })
}

fn int() -> Callable {
    Callable::new("int", |_, args: Vec<Value>| {
        expect_args("int", &args, 1)?;
        let n = match &args[0] {
            Value::String(s) => s.trim().parse::<i64>().map_err(|_| {
                VisError::new(ErrorCode::TYPE_MISMATCH, format!("can not read {s:?} as int"))
            })?,
            other => other.as_int()?,
        };
        Ok(Value::Number(n as f64))
    })
}

fn float() -> Callable {
    Callable::new("float", |_, args: Vec<Value>| {
        expect_args("float", &args, 1)?;
        let n = match &args[0] {
            Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
                VisError::new(ErrorCode::TYPE_MISMATCH, format!("can not read {s:?} as float"))
            })?,
            other => other.as_number()?,
        };
        Ok(Value::Number(n))
    })
}

/// `import("math")` binds the library into the calling namespace.
fn import() -> Callable {
    Callable::new("import", |scope, args: Vec<Value>| {
        expect_args("import", &args, 1)?;
        let name = args[0].as_str()?;
        let library = Library::load(name)?;
        scope.declare(name, Value::Namespace(library.clone()))?;
        debug!(library = name, "import");
        Ok(Value::Namespace(library))
    })
}

/// The gate is open when every argument is `true`.
fn if_gate() -> Callable {
    Callable::introducer("if", |_, args: Vec<Value>| {
        let mut open = true;
        for arg in &args {
            open &= arg.as_bool()?;
        }
        Ok(Value::Bool(open))
    })
}

/// `struct("x", "y")` returns a constructor for instances with those fields.
fn structure() -> Callable {
    Callable::new("struct", |_, args: Vec<Value>| {
        let fields = args
            .iter()
            .map(|arg| arg.as_str().map(str::to_string))
            .collect::<VisResult<Vec<String>>>()?;
        let name = format!("struct({})", fields.join(", "));
        let constructor = Callable::new(name.clone(), move |_, values: Vec<Value>| {
            if values.len() != fields.len() {
                return Err(VisError::new(
                    ErrorCode::WRONG_ARG_COUNT,
                    format!("{name} takes {} value(s), got {}", fields.len(), values.len()),
                ));
            }
            Ok(Value::Namespace(Namespace::structure(
                fields.iter().cloned().zip(values),
            )))
        });
        Ok(Value::Function(constructor))
    })
}

fn list() -> Callable {
    Callable::new("list", |_, args: Vec<Value>| {
        expect_args("list", &args, 1)?;
        let items = match &args[0] {
            Value::Range(range) => range.iter().map(|i| Value::Number(i as f64)).collect(),
            Value::Array(items) => items.clone(),
            Value::String(s) => s.chars().map(|c| Value::String(c.to_string())).collect(),
            other => return Err(VisError::type_mismatch("range or array", other.type_name())),
        };
        Ok(Value::Array(items))
    })
}

fn len() -> Callable {
    Callable::new("len", |_, args: Vec<Value>| {
        expect_args("len", &args, 1)?;
        let n = match &args[0] {
            Value::Array(items) => items.len(),
            Value::String(s) => s.chars().count(),
            other => return Err(VisError::type_mismatch("array or string", other.type_name())),
        };
        Ok(Value::Number(n as f64))
    })
}
