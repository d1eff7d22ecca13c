// Expression nodes: an operation tag, ordered children, and a shared
// descriptor, validated once at construction and evaluated on demand

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::evaluator::{Context, EvaluationResult, ExpressionEvaluator};
use crate::expression_type;
use crate::function_utils::ValidationError;
use crate::functions::{self, FunctionTable};
use crate::return_type::ReturnType;
use crate::value::Value;

/// One node of a parsed expression tree.
///
/// Children order is semantically significant: the first child is always the
/// subject, subsequent children are operation-specific arguments. A node is
/// immutable after construction, its descriptor is validated exactly once,
/// and it may be evaluated any number of times against different contexts —
/// concurrently, since it carries no evaluation-time state.
#[derive(Debug, Clone)]
pub struct Expression {
    children: Vec<Expression>,
    value: Option<Value>,
    evaluator: Arc<ExpressionEvaluator>,
}

impl Expression {
    /// Build a literal leaf holding `value`.
    pub fn constant(value: impl Into<Value>) -> Expression {
        Expression {
            children: Vec::new(),
            value: Some(value.into()),
            evaluator: functions::constant_descriptor(),
        }
    }

    /// Build a leaf that reads the named binding from the context.
    ///
    /// Sugar for an `Accessor` node with a single string-constant child, the
    /// shape the validator expects.
    pub fn accessor(name: impl Into<String>) -> Expression {
        let expression = Expression {
            children: vec![Expression::constant(name.into())],
            value: None,
            evaluator: functions::accessor_descriptor(),
        };
        debug_assert!(expression.validate().is_ok());
        expression
    }

    /// Build an operation node from the standard function table.
    ///
    /// Looks up the descriptor for `expr_type` and runs its validator before
    /// the node is handed back; a structural defect fails here, synchronously,
    /// and the node never exists.
    pub fn new(expr_type: &str, children: Vec<Expression>) -> Result<Expression, ValidationError> {
        Self::new_in(FunctionTable::standard(), expr_type, children)
    }

    /// Build an operation node against a caller-supplied function table.
    pub fn new_in(
        table: &FunctionTable,
        expr_type: &str,
        children: Vec<Expression>,
    ) -> Result<Expression, ValidationError> {
        let evaluator = table
            .lookup(expr_type)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownFunction(expr_type.to_string()))?;
        let expression = Expression {
            children,
            value: None,
            evaluator,
        };
        expression.validate()?;
        Ok(expression)
    }

    /// Run the bind-time validator for this node.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.evaluator.validate(self)
    }

    /// Evaluate this node against `context`.
    ///
    /// The sole evaluation entry point: dispatches through the node's
    /// descriptor, which resolves children strictly left to right and
    /// short-circuits on the first error. The returned outcome carries either
    /// a value or the first error produced anywhere below this node,
    /// verbatim.
    pub async fn try_evaluate(&self, context: &Context) -> EvaluationResult {
        let result = self.evaluator.evaluate(self, context).await;
        if let Err(error) = &result {
            trace!(expression = %self, %error, "evaluation produced an error");
        }
        result
    }

    pub fn children(&self) -> &[Expression] {
        &self.children
    }

    /// The operation tag this node is bound to.
    pub fn expr_type(&self) -> &str {
        self.evaluator.expr_type()
    }

    /// The declared result shape of this node's operation.
    pub fn return_type(&self) -> ReturnType {
        self.evaluator.return_type()
    }

    /// The stored literal, for constant nodes.
    pub fn constant_value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

/// Source-like rendering: literals as JSON, accessors as bare names,
/// operations as `tag(child, ...)`. Evaluation error messages embed this
/// rendering to name the offending subexpression.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.expr_type() == expression_type::CONSTANT {
            if let Some(value) = &self.value {
                return write!(f, "{}", value);
            }
        }
        if self.expr_type() == expression_type::ACCESSOR {
            if let Some(name) = self
                .children
                .first()
                .and_then(Expression::constant_value)
                .and_then(Value::as_str)
            {
                return write!(f, "{}", name);
            }
        }
        write!(f, "{}(", self.expr_type())?;
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", child)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;

    #[test]
    fn test_display_rendering() {
        assert_eq!(Expression::constant(42).to_string(), "42");
        assert_eq!(Expression::constant("x").to_string(), "\"x\"");
        assert_eq!(Expression::accessor("items").to_string(), "items");

        let expr = Expression::new(
            expression_type::SKIP,
            vec![Expression::accessor("items"), Expression::constant(2)],
        )
        .unwrap();
        assert_eq!(expr.to_string(), "skip(items, 2)");

        let nested = Expression::new(
            expression_type::TAKE,
            vec![expr, Expression::constant(1)],
        )
        .unwrap();
        assert_eq!(nested.to_string(), "take(skip(items, 2), 1)");
    }

    #[test]
    fn test_unknown_operation_is_a_validation_error() {
        let err = Expression::new("reverse", vec![Expression::constant(1)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "reverse does not have an evaluator, it's not a built-in function or a custom function."
        );
    }

    #[test]
    fn test_constant_evaluates_to_its_value() {
        let expr = Expression::constant(json!([1, 2]));
        let result = block_on(expr.try_evaluate(&Context::new()));
        assert_eq!(result, Ok(Value::from(json!([1, 2]))));
    }

    #[test]
    fn test_same_tree_evaluates_against_different_contexts() {
        let expr = Expression::accessor("who");

        let mut first = Context::new();
        first.bind("who", "alice");
        let mut second = Context::new();
        second.bind("who", "bob");

        assert_eq!(
            block_on(expr.try_evaluate(&first)),
            Ok(Value::from("alice"))
        );
        assert_eq!(
            block_on(expr.try_evaluate(&second)),
            Ok(Value::from("bob"))
        );
    }

    #[test]
    fn test_descriptor_is_shared_between_nodes_of_one_kind() {
        let a = Expression::constant(1);
        let b = Expression::constant(2);
        assert!(Arc::ptr_eq(&a.evaluator, &b.evaluator));
    }
}
