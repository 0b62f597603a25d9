//! Character-level scanning.
//!
//! A [`Scanner`] walks one bracket level of the source. Brackets, arrays,
//! call arguments and blocks each get a fresh sub-scanner over the same
//! character slice; it hands back its statement and the index of its
//! closing character, and the parent resumes right after that index.
//! Sub-expressions are evaluated as soon as they close.

use tracing::trace;
use vis_eval::math::{factorial, MAX_FACTORIAL};
use vis_types::{
    Callable, ErrorCode, Namespace, Operator, Statement, Token, Value, VisError, VisResult,
};

pub(crate) struct Scanner<'a> {
    chars: &'a [char],
    pos: usize,
    namespace: &'a Namespace,
    /// Current bracket nesting, 0 at the top level.
    depth: usize,
    max_depth: usize,
    /// The character that ends this level; `None` at the top level.
    closer: Option<char>,
    statement: Statement,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(
        chars: &'a [char],
        start: usize,
        namespace: &'a Namespace,
        max_depth: usize,
    ) -> Self {
        Self {
            chars,
            pos: start,
            namespace,
            depth: 0,
            max_depth,
            closer: None,
            statement: Statement::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Scan until the closing character of this level (or the end of input
    /// at the top level). Returns the statement and the closing index.
    pub(crate) fn scan(mut self) -> VisResult<(Statement, usize)> {
        loop {
            self.skip_whitespace();
            let Some(c) = self.peek() else {
                return match self.closer {
                    None => Ok((self.statement, self.pos)),
                    Some(closer) => Err(VisError::new(
                        ErrorCode::BRACKET_NOT_CLOSED,
                        format!("bracket was never closed, expected '{closer}'"),
                    )),
                };
            };
            match c {
                c if c.is_ascii_digit() || c == '.' => self.scan_number()?,
                c if c.is_alphabetic() || c == '_' => self.scan_identifier()?,
                '"' | '\'' => self.scan_string()?,
                '(' => self.scan_bracket()?,
                '[' => self.scan_array()?,
                '{' => {
                    return Err(VisError::new(
                        ErrorCode::BLOCK_WITHOUT_INTRODUCER,
                        format!("block at {} does not follow an introducer", self.pos),
                    ))
                }
                ',' | ';' => {
                    self.statement.push_operator(Operator::Separator);
                    self.pos += 1;
                }
                '=' | '+' | '-' | '*' | '/' | '^' | '%' => self.scan_operator(c),
                '!' => self.scan_bang()?,
                ')' | ']' | '}' => return self.close(c),
                other => {
                    return Err(VisError::new(
                        ErrorCode::UNEXPECTED_CHAR,
                        format!("could not parse char '{other}' at {}", self.pos),
                    ))
                }
            }
        }
    }

    fn close(self, c: char) -> VisResult<(Statement, usize)> {
        match self.closer {
            Some(closer) if closer == c => Ok((self.statement, self.pos)),
            Some(closer) => Err(VisError::new(
                ErrorCode::BRACKET_MISMATCH,
                format!("closing '{c}' at {} does not match, expected '{closer}'", self.pos),
            )),
            None => Err(VisError::new(
                ErrorCode::UNEXPECTED_CLOSING,
                format!("'{c}' at {} closes nothing", self.pos),
            )),
        }
    }

    // ══════════════════════════════════════════════════════════════════
    // Sub-scanners
    // ══════════════════════════════════════════════════════════════════

    /// Scan the level opened at `self.pos` and continue after its closer.
    fn sub_scan(&mut self, closer: char) -> VisResult<Statement> {
        let depth = self.depth + 1;
        if depth > self.max_depth {
            return Err(VisError::new(
                ErrorCode::NESTING_TOO_DEEP,
                format!("nesting deeper than {} levels", self.max_depth),
            ));
        }
        trace!(depth, start = self.pos, closer = %closer, "sub-scan");
        let sub = Scanner {
            chars: self.chars,
            pos: self.pos + 1,
            namespace: self.namespace,
            depth,
            max_depth: self.max_depth,
            closer: Some(closer),
            statement: Statement::new(),
        };
        let (statement, close) = sub.scan()?;
        self.pos = close + 1;
        Ok(statement)
    }

    /// `( ... )` must reduce to exactly one value.
    fn scan_bracket(&mut self) -> VisResult<()> {
        let start = self.pos;
        let inner = self.sub_scan(')')?;
        let mut values = vis_eval::evaluate(&inner)?;
        if values.len() != 1 {
            return Err(VisError::new(
                ErrorCode::BRACKETS_NOT_SINGLE,
                format!(
                    "brackets at {start} wrap {} values, expected one",
                    values.len()
                ),
            ));
        }
        if let Some(value) = values.pop() {
            self.statement.push_value(value);
        }
        Ok(())
    }

    /// `[ ... ]` keeps every value as an array.
    fn scan_array(&mut self) -> VisResult<()> {
        let inner = self.sub_scan(']')?;
        let values = vis_eval::evaluate(&inner)?;
        self.statement.push_value(Value::Array(values));
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════
    // Literals
    // ══════════════════════════════════════════════════════════════════

    /// Digits fold into an integer; a dot divides it by `10^(digits after the dot)`.
    ///
    /// The fold runs in `f64`, so only about 15 significant digits survive
    /// exactly; longer literals may differ from `str::parse` in the last place.
    fn scan_number(&mut self) -> VisResult<()> {
        let start = self.pos;
        let mut build = 0.0_f64;
        let mut digits = 0usize;
        let mut dot: Option<usize> = None;
        while let Some(c) = self.peek() {
            if let Some(d) = c.to_digit(10) {
                build = build * 10.0 + f64::from(d);
                digits += 1;
            } else if c == '.' {
                if dot.is_some() {
                    return Err(VisError::new(
                        ErrorCode::NUMBER_TWO_DOTS,
                        format!("number at {start} can not have two dots"),
                    ));
                }
                dot = Some(self.pos);
            } else {
                break;
            }
            self.pos += 1;
        }
        if digits == 0 {
            return Err(VisError::new(
                ErrorCode::NUMBER_WITHOUT_DIGITS,
                format!("number at {start} has no digits"),
            ));
        }
        if let Some(dot) = dot {
            let fraction = (self.pos - dot - 1) as i32;
            build /= 10f64.powi(fraction);
        }
        self.statement.push_value(Value::Number(build));
        Ok(())
    }

    /// Everything up to the matching quote, without escapes.
    fn scan_string(&mut self) -> VisResult<()> {
        let start = self.pos;
        let quote = self.chars[start];
        let rest = &self.chars[start + 1..];
        let Some(len) = rest.iter().position(|c| *c == quote) else {
            return Err(VisError::new(
                ErrorCode::STRING_NOT_CLOSED,
                format!("string at {start} is never closed, expected {quote}"),
            ));
        };
        let text: String = rest[..len].iter().collect();
        self.pos = start + len + 2;
        self.statement.push_value(Value::String(text));
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════
    // Identifiers, calls and blocks
    // ══════════════════════════════════════════════════════════════════

    /// A dotted name. Each `.` switches the working namespace to the value
    /// bound to the segment before it.
    fn scan_identifier(&mut self) -> VisResult<()> {
        let mut working = self.namespace.clone();
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
            } else if c == '.' {
                working = step_into(&working, &name)?;
                name.clear();
            } else {
                break;
            }
            self.pos += 1;
        }

        // A call needs the bracket right after the name; `f (1)` is a label and a bracket.
        if self.peek() == Some('(') {
            return self.scan_call(&working, &name);
        }
        self.statement.push(Token::Label(working.get(&name)));
        Ok(())
    }

    fn scan_call(&mut self, working: &Namespace, name: &str) -> VisResult<()> {
        let target = working.get(name).resolve()?;
        let Value::Function(callable) = target else {
            return Err(VisError::new(
                ErrorCode::NOT_CALLABLE,
                format!("{name} is a {}, not a function", target.type_name()),
            ));
        };
        let arguments = self.sub_scan(')')?;
        let args = vis_eval::evaluate(&arguments)?;
        trace!(function = name, args = args.len(), "call");
        let result = callable.call(self.namespace, args)?;

        if !callable.is_introducer() {
            self.statement.push_value(result);
            return Ok(());
        }
        self.skip_whitespace();
        if self.peek() == Some('{') {
            let value = self.scan_block(&callable, result.as_bool()?)?;
            self.statement.push_value(value);
        } else {
            self.statement.push_value(result);
        }
        Ok(())
    }

    /// Run the block at `self.pos` when `open`, otherwise skip it.
    fn scan_block(&mut self, introducer: &Callable, open: bool) -> VisResult<Value> {
        trace!(introducer = introducer.name(), open, "block");
        if !open {
            self.pos = self.matching_brace()? + 1;
            return Ok(Value::Array(Vec::new()));
        }
        let body = self.sub_scan('}')?;
        Ok(Value::Array(vis_eval::evaluate(&body)?))
    }

    /// Index of the `}` closing the block that opens at `self.pos`.
    fn matching_brace(&self) -> VisResult<usize> {
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        for (i, &c) in self.chars.iter().enumerate().skip(self.pos) {
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(c),
                (None, '{') => depth += 1,
                (None, '}') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(i);
                    }
                }
                _ => {}
            }
        }
        Err(VisError::new(
            ErrorCode::BRACKET_NOT_CLOSED,
            format!("block at {} was never closed, expected '}}'", self.pos),
        ))
    }

    // ══════════════════════════════════════════════════════════════════
    // Operators
    // ══════════════════════════════════════════════════════════════════

    fn next_is_equals(&self) -> bool {
        self.peek_at(1) == Some('=')
    }

    fn scan_operator(&mut self, c: char) {
        let compound = self.next_is_equals();
        let op = match (c, compound) {
            ('=', true) => Operator::IsEquals,
            ('=', false) => Operator::Declare,
            ('+', true) => Operator::AddTo,
            ('+', false) => Operator::Add,
            ('-', true) => Operator::SubTo,
            ('-', false) => Operator::Sub,
            ('*', true) => Operator::MulTo,
            ('*', false) => Operator::Mul,
            ('/', true) => Operator::DivTo,
            ('/', false) => Operator::Div,
            ('^', _) => Operator::Pow,
            _ => Operator::Mod,
        };
        let width = if compound && !matches!(op, Operator::Pow | Operator::Mod) {
            2
        } else {
            1
        };
        self.pos += width;
        self.statement.push_operator(op);
    }

    /// `!=` or the postfix factorial of the preceding value.
    fn scan_bang(&mut self) -> VisResult<()> {
        if self.next_is_equals() {
            self.pos += 2;
            self.statement.push_operator(Operator::NotEquals);
            return Ok(());
        }
        let at = self.pos;
        self.pos += 1;
        let Some(last) = self.statement.last_mut() else {
            return Err(factorial_without_value(at));
        };
        let n = match &*last {
            Token::Operator(_) => return Err(factorial_without_value(at)),
            token => token
                .resolved()?
                .as_number()
                .map_err(|_| factorial_without_value(at))?,
        };
        if n.fract() != 0.0 || !(0.0..=f64::from(MAX_FACTORIAL)).contains(&n) {
            return Err(VisError::new(
                ErrorCode::FACTORIAL_DOMAIN,
                format!("factorial needs a natural number up to {MAX_FACTORIAL}, got {n}"),
            ));
        }
        *last = Token::Value(Value::Number(factorial(n as u32)));
        Ok(())
    }
}

fn factorial_without_value(at: usize) -> VisError {
    VisError::new(
        ErrorCode::FACTORIAL_WITHOUT_VALUE,
        format!("factorial at {at} has no numeric value before it"),
    )
}

/// The namespace bound to `name` in `working`.
fn step_into(working: &Namespace, name: &str) -> VisResult<Namespace> {
    match working.get(name).resolve()? {
        Value::Namespace(next) => Ok(next),
        other => Err(VisError::new(
            ErrorCode::NOT_A_NAMESPACE,
            format!("{name} is a {}, not a namespace", other.type_name()),
        )),
    }
}
