//! Priority reduction of a flat token stream.
//!
//! Operators are taken in descending priority (ties in encounter order).
//! Each one is located in the working stream, applied to its neighbours and
//! spliced out together with them until only values and separators remain.

use std::cmp::Reverse;

use tracing::{debug, trace};
use vis_types::{
    ErrorCode, Operator, Outcome, Statement, Token, Value, VisError, VisResult,
};

/// Reduce `statement` to its values.
///
/// The statement itself is left untouched; reduction runs on a copy of its
/// token stream. Declaration operators write into the namespace their
/// target label is bound to.
pub fn evaluate(statement: &Statement) -> VisResult<Vec<Value>> {
    let mut order = statement.operators().to_vec();
    order.sort_by_key(|op| Reverse(op.priority()));

    let mut tokens = statement.tokens().to_vec();
    for op in order {
        if op == Operator::Separator {
            break;
        }
        eliminate(&mut tokens, op)?;
    }

    let values = collect(tokens)?;
    debug!(results = values.len(), "evaluated statement");
    Ok(values)
}

// ══════════════════════════════════════════════════════════════════════
// Reduction step
// ══════════════════════════════════════════════════════════════════════

fn eliminate(tokens: &mut Vec<Token>, op: Operator) -> VisResult<()> {
    let index = tokens
        .iter()
        .position(|token| token.as_operator() == Some(op))
        .ok_or_else(|| {
            VisError::new(
                ErrorCode::OPERATOR_MISSING,
                format!("operator '{op}' must be present in tokens"),
            )
        })?;
    if index + 1 == tokens.len() {
        return Err(VisError::new(
            ErrorCode::MISSING_RIGHT_VALUE,
            format!("a right value must exist for '{op}'"),
        ));
    }
    trace!(operator = %op, index, "reduce");

    let sign_position = index == 0 || tokens[index - 1].is_operator();
    if sign_position {
        if !op.is_sign() {
            return Err(VisError::new(
                ErrorCode::NOT_A_SIGN,
                format!("operator '{op}' is not a sign and requires a left and right value"),
            ));
        }
        let zero = Token::Value(Value::Number(0.0));
        let result = splice_value(op.evaluate(&zero, &tokens[index + 1])?);
        tokens.splice(index..=index + 1, [result]);
        return Ok(());
    }

    let result = match op.evaluate(&tokens[index - 1], &tokens[index + 1])? {
        Outcome::Value(value) => Token::Value(value),
        Outcome::Mutation(mutation) => {
            mutation.apply()?;
            Token::Label(mutation.target)
        }
    };
    tokens.splice(index - 1..=index + 1, [result]);
    Ok(())
}

/// Signs never declare, so their outcome is always a plain value.
fn splice_value(outcome: Outcome) -> Token {
    match outcome {
        Outcome::Value(value) => Token::Value(value),
        Outcome::Mutation(mutation) => Token::Label(mutation.target),
    }
}

/// Check the reduced stream is `V (SEP V)*` and resolve every value.
fn collect(tokens: Vec<Token>) -> VisResult<Vec<Value>> {
    if tokens.len() % 2 == 0 && !tokens.is_empty() {
        return Err(malformed(&tokens));
    }
    let mut values = Vec::with_capacity(tokens.len() / 2 + 1);
    for (i, token) in tokens.iter().enumerate() {
        let expect_value = i % 2 == 0;
        match (expect_value, token) {
            (true, Token::Operator(_)) => return Err(malformed(&tokens)),
            (true, value) => values.push(value.resolved()?),
            (false, Token::Operator(Operator::Separator)) => {}
            (false, _) => return Err(malformed(&tokens)),
        }
    }
    Ok(values)
}

fn malformed(tokens: &[Token]) -> VisError {
    let shown: Vec<String> = tokens.iter().map(ToString::to_string).collect();
    VisError::new(
        ErrorCode::MALFORMED_STATEMENT,
        format!("statement did not reduce to values: {}", shown.join(" ")),
    )
}
