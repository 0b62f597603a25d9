//! The `math` library: trigonometry, roots, constants and the stochastic
//! helpers `fac` and `binom`.

use std::f64::consts;

use vis_types::{Callable, Namespace, Value, VisResult};

use crate::library::{bind, define, expect_args, natural};

/// Largest `n` whose factorial is finite in double precision.
pub const MAX_FACTORIAL: u32 = 170;

/// Build a fresh `math` namespace.
pub fn library() -> Namespace {
    let ns = Namespace::labeled("math");
    install(&ns);
    ns
}

/// Bind every math function and constant into `ns`.
pub(crate) fn install(ns: &Namespace) {
    let unary: [(&str, fn(f64) -> f64); 9] = [
        ("sin", f64::sin),
        ("cos", f64::cos),
        ("tan", f64::tan),
        ("asin", f64::asin),
        ("acos", f64::acos),
        ("atan", f64::atan),
        ("sqrt", f64::sqrt),
        ("abs", f64::abs),
        ("signum", signum),
    ];
    for (name, f) in unary {
        bind(ns, Callable::new(name, move |_, args: Vec<Value>| {
            expect_args(name, &args, 1)?;
            Ok(Value::Number(f(args[0].as_number()?)))
        }));
    }

    bind(ns, Callable::new("hypot", |_, args: Vec<Value>| {
        expect_args("hypot", &args, 2)?;
        Ok(Value::Number(args[0].as_number()?.hypot(args[1].as_number()?)))
    }));
    bind(ns, Callable::new("fac", |_, args: Vec<Value>| {
        expect_args("fac", &args, 1)?;
        Ok(Value::Number(factorial(natural("fac", &args[0])?)))
    }));
    bind(ns, Callable::new("binom", |_, args: Vec<Value>| {
        expect_args("binom", &args, 2)?;
        let n = natural("binom", &args[0])?;
        let k = natural("binom", &args[1])?;
        Ok(Value::Number(binom(n, k)))
    }));

    for (name, value) in [("pi", consts::PI), ("e", consts::E), ("tau", consts::TAU)] {
        define(ns, name, Value::Number(value));
    }
}

/// Sign of `n`, with zero and NaN mapping to themselves.
fn signum(n: f64) -> f64 {
    if n == 0.0 || n.is_nan() {
        n
    } else {
        n.signum()
    }
}

/// `n!` in double precision. Callers bound `n` by [`MAX_FACTORIAL`].
pub fn factorial(n: u32) -> f64 {
    (2..=n).fold(1.0, |acc, i| acc * f64::from(i))
}

/// Binomial coefficient; zero when `k > n`.
pub fn binom(n: u32, k: u32) -> f64 {
    if k > n {
        return 0.0;
    }
    factorial(n) / (factorial(k) * factorial(n - k))
}
