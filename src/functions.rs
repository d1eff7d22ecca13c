// Built-in function implementations and the operation registry

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use once_cell::sync::Lazy;
use tracing::trace;

use crate::evaluator::{Context, EvalError, EvaluationResult, ExpressionEvaluator};
use crate::expression::Expression;
use crate::expression_type;
use crate::function_utils::{self, ValidationError};
use crate::return_type::ReturnType;
use crate::value::Value;

/// Registry of operation descriptors, keyed by operation tag.
///
/// The parser (or any other tree builder) resolves tags against a table when
/// constructing nodes; every node of one kind shares the same `Arc`'d
/// descriptor, so registration happens once per operation, not per node.
pub struct FunctionTable {
    entries: HashMap<String, Arc<ExpressionEvaluator>>,
}

impl FunctionTable {
    /// An empty table, for callers assembling a custom operation set.
    pub fn new() -> Self {
        FunctionTable {
            entries: HashMap::new(),
        }
    }

    /// Register an operation descriptor under its own tag, replacing any
    /// previous registration.
    pub fn register(&mut self, descriptor: ExpressionEvaluator) {
        self.insert(Arc::new(descriptor));
    }

    fn insert(&mut self, descriptor: Arc<ExpressionEvaluator>) {
        trace!(expr_type = descriptor.expr_type(), "registering function");
        self.entries
            .insert(descriptor.expr_type().to_string(), descriptor);
    }

    pub fn lookup(&self, expr_type: &str) -> Option<&Arc<ExpressionEvaluator>> {
        self.entries.get(expr_type)
    }

    /// The process-wide table of built-in operations.
    pub fn standard() -> &'static FunctionTable {
        static STANDARD: Lazy<FunctionTable> = Lazy::new(|| {
            let mut table = FunctionTable::new();
            table.insert(constant_descriptor());
            table.insert(accessor_descriptor());
            table.register(skip());
            table.register(take());
            table
        });
        &STANDARD
    }
}

impl Default for FunctionTable {
    fn default() -> Self {
        Self::new()
    }
}

// ── Leaf operations ──────────────────────────────────────────────────────────

/// Shared descriptor for constant nodes. Constants declare `OBJECT` (the
/// dynamic marker): their runtime shape is re-checked by whichever parent
/// consumes them.
pub(crate) fn constant_descriptor() -> Arc<ExpressionEvaluator> {
    static DESCRIPTOR: Lazy<Arc<ExpressionEvaluator>> = Lazy::new(|| {
        Arc::new(ExpressionEvaluator::new(
            expression_type::CONSTANT,
            ReturnType::OBJECT,
            eval_constant,
            validate_constant,
        ))
    });
    DESCRIPTOR.clone()
}

/// Shared descriptor for accessor nodes.
pub(crate) fn accessor_descriptor() -> Arc<ExpressionEvaluator> {
    static DESCRIPTOR: Lazy<Arc<ExpressionEvaluator>> = Lazy::new(|| {
        Arc::new(ExpressionEvaluator::new(
            expression_type::ACCESSOR,
            ReturnType::OBJECT,
            eval_accessor,
            validate_accessor,
        ))
    });
    DESCRIPTOR.clone()
}

fn validate_constant(expression: &Expression) -> Result<(), ValidationError> {
    if !expression.children().is_empty() {
        return Err(ValidationError::TooManyChildren {
            expression: expression.to_string(),
            expected: 0,
            found: expression.children().len(),
        });
    }
    if expression.constant_value().is_none() {
        return Err(ValidationError::MissingValue {
            expression: expression.to_string(),
        });
    }
    Ok(())
}

fn eval_constant<'a>(
    expression: &'a Expression,
    _context: &'a Context,
) -> BoxFuture<'a, EvaluationResult> {
    Box::pin(async move {
        match expression.constant_value() {
            Some(value) => Ok(value.clone()),
            None => Err(EvalError::new(format!(
                "{} is a constant without a stored value.",
                expression
            ))),
        }
    })
}

fn validate_accessor(expression: &Expression) -> Result<(), ValidationError> {
    function_utils::validate_order(expression, &[], &[ReturnType::STRING])?;
    match expression
        .children()
        .first()
        .and_then(Expression::constant_value)
    {
        Some(Value::String(_)) => Ok(()),
        _ => Err(ValidationError::InvalidAccessor {
            expression: expression.to_string(),
        }),
    }
}

fn eval_accessor<'a>(
    expression: &'a Expression,
    context: &'a Context,
) -> BoxFuture<'a, EvaluationResult> {
    Box::pin(async move {
        let name = expression
            .children()
            .first()
            .and_then(Expression::constant_value)
            .and_then(Value::as_str)
            .ok_or_else(|| EvalError::new(format!("{} is not a valid accessor.", expression)))?;
        match context.lookup(name) {
            Some(value) => Ok(value.clone()),
            None if context.options().null_on_missing => Ok(Value::Null),
            None => Err(EvalError::new(format!(
                "'{}' cannot be found in the context.",
                name
            ))),
        }
    })
}

// ── Slicing operations ───────────────────────────────────────────────────────

/// `skip(subject, count)` — remove items from the front of a sequence and
/// return all the other items.
pub(crate) fn skip() -> ExpressionEvaluator {
    ExpressionEvaluator::new(
        expression_type::SKIP,
        ReturnType::ARRAY,
        eval_skip,
        validate_skip,
    )
}

/// `take(subject, count)` — return items from the front of a sequence, or
/// the prefix of a string.
pub(crate) fn take() -> ExpressionEvaluator {
    ExpressionEvaluator::new(
        expression_type::TAKE,
        ReturnType::ARRAY | ReturnType::STRING,
        eval_take,
        validate_take,
    )
}

fn validate_skip(expression: &Expression) -> Result<(), ValidationError> {
    function_utils::validate_order(expression, &[], &[ReturnType::ARRAY, ReturnType::NUMBER])
}

fn validate_take(expression: &Expression) -> Result<(), ValidationError> {
    function_utils::validate_order(
        expression,
        &[],
        &[ReturnType::ARRAY | ReturnType::STRING, ReturnType::NUMBER],
    )
}

fn eval_skip<'a>(
    expression: &'a Expression,
    context: &'a Context,
) -> BoxFuture<'a, EvaluationResult> {
    Box::pin(async move {
        let [subject, count] = expression.children() else {
            return Err(EvalError::new(format!(
                "{} should have 2 children.",
                expression
            )));
        };

        // The count child is only evaluated once the subject has resolved
        // to the right shape; a subject error or shape mismatch is the
        // node's outcome and the count's effects never happen.
        let resolved = subject.try_evaluate(context).await?;
        let Some(items) = resolved.as_array() else {
            return Err(EvalError::new(format!("{} is not array.", subject)));
        };

        let start = resolve_count(count, context).await?;
        // Negative counts clamp to zero, oversized counts to the length;
        // the saturating float→usize cast absorbs astronomically large ones.
        let start = (start.max(0.0) as usize).min(items.len());
        Ok(Value::array(items[start..].to_vec()))
    })
}

fn eval_take<'a>(
    expression: &'a Expression,
    context: &'a Context,
) -> BoxFuture<'a, EvaluationResult> {
    Box::pin(async move {
        let [subject, count] = expression.children() else {
            return Err(EvalError::new(format!(
                "{} should have 2 children.",
                expression
            )));
        };

        let resolved = subject.try_evaluate(context).await?;
        match &resolved {
            Value::Array(items) => {
                let end = resolve_count(count, context).await?;
                let end = (end.max(0.0) as usize).min(items.len());
                Ok(Value::array(items[..end].to_vec()))
            }
            Value::String(s) => {
                let end = resolve_count(count, context).await?;
                // Count by chars so the prefix never splits a code point.
                let prefix: String = s.chars().take(end.max(0.0) as usize).collect();
                Ok(Value::string(prefix))
            }
            _ => Err(EvalError::new(format!(
                "{} is not array or string.",
                subject
            ))),
        }
    })
}

/// Resolve a count argument to an exact integer, erroring with the child's
/// source rendering when it resolves to anything else.
async fn resolve_count(count: &Expression, context: &Context) -> Result<f64, EvalError> {
    let resolved = count.try_evaluate(context).await?;
    match resolved.as_integer() {
        Some(n) => Ok(n),
        None => Err(EvalError::new(format!("{} is not an integer.", count))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;

    fn eval(expression: &Expression) -> EvaluationResult {
        block_on(expression.try_evaluate(&Context::new()))
    }

    fn slice(expr_type: &str, subject: impl Into<Value>, count: impl Into<Value>) -> Expression {
        Expression::new(
            expr_type,
            vec![
                Expression::constant(subject),
                Expression::constant(count),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_skip_drops_a_prefix() {
        let expr = slice(expression_type::SKIP, json!([1, 2, 3, 4]), 2);
        assert_eq!(eval(&expr), Ok(Value::from(json!([3, 4]))));
    }

    #[test]
    fn test_skip_negative_count_clamps_to_zero() {
        let expr = slice(expression_type::SKIP, json!([1, 2, 3]), -5);
        assert_eq!(eval(&expr), Ok(Value::from(json!([1, 2, 3]))));
    }

    #[test]
    fn test_skip_past_the_end_yields_empty() {
        let expr = slice(expression_type::SKIP, json!([1, 2, 3]), 10);
        assert_eq!(eval(&expr), Ok(Value::from(json!([]))));
    }

    #[test]
    fn test_take_prefix_of_string_counts_chars() {
        let expr = slice(expression_type::TAKE, "héllo", 3);
        assert_eq!(eval(&expr), Ok(Value::from("hél")));
    }

    #[test]
    fn test_take_zero_yields_empty_array() {
        let expr = slice(expression_type::TAKE, json!([1, 2, 3]), 0);
        assert_eq!(eval(&expr), Ok(Value::from(json!([]))));
    }

    #[test]
    fn test_take_preserves_subject_shape() {
        let arr = slice(expression_type::TAKE, json!([1, 2, 3]), 5);
        assert_eq!(eval(&arr), Ok(Value::from(json!([1, 2, 3]))));
        let s = slice(expression_type::TAKE, "ab", 5);
        assert_eq!(eval(&s), Ok(Value::from("ab")));
    }

    #[test]
    fn test_fractional_count_is_an_error() {
        let expr = slice(expression_type::SKIP, json!([1, 2, 3]), 1.5);
        assert_eq!(
            eval(&expr),
            Err(EvalError::new("1.5 is not an integer."))
        );
    }

    #[test]
    fn test_boolean_subject_is_an_error_for_take() {
        let expr = slice(expression_type::TAKE, true, 1);
        assert_eq!(
            eval(&expr),
            Err(EvalError::new("true is not array or string."))
        );
    }

    #[test]
    fn test_huge_count_clamps_instead_of_overflowing() {
        let expr = slice(expression_type::SKIP, json!([1, 2]), 1e300);
        assert_eq!(eval(&expr), Ok(Value::from(json!([]))));
        let expr = slice(expression_type::TAKE, "abc", 1e300);
        assert_eq!(eval(&expr), Ok(Value::from("abc")));
    }

    #[test]
    fn test_accessor_missing_binding_follows_options() {
        let expr = Expression::accessor("ghost");
        assert_eq!(eval(&expr), Ok(Value::Null));

        let strict = Context::with_options(crate::evaluator::Options {
            null_on_missing: false,
        });
        assert_eq!(
            block_on(expr.try_evaluate(&strict)),
            Err(EvalError::new("'ghost' cannot be found in the context."))
        );
    }
}
