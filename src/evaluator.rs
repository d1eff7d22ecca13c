// Operation descriptors, evaluation outcomes, and the runtime context

use std::collections::HashMap;
use std::fmt;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::expression::Expression;
use crate::function_utils::ValidationError;
use crate::return_type::ReturnType;
use crate::value::Value;

/// A run-time evaluation error: a descriptive message carried as a value.
///
/// Produced when a resolved child has the wrong shape or a count is not an
/// integer, and propagated verbatim by every ancestor node the moment it is
/// first produced. This is a separate failure class from [`ValidationError`],
/// which fires synchronously at node construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct EvalError(String);

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        EvalError(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// The outcome of evaluating a node: a produced value or a propagated error,
/// mutually exclusive by construction.
pub type EvaluationResult = Result<Value, EvalError>;

/// Operation-specific evaluation logic.
///
/// Returns a boxed future so children backed by external lookups can suspend
/// without blocking; the evaluator contract requires children to be resolved
/// strictly left to right, never starting child *i+1* before child *i* has
/// fully resolved.
pub type EvaluateFn = for<'a> fn(&'a Expression, &'a Context) -> BoxFuture<'a, EvaluationResult>;

/// Bind-time structural check, run once when the node is constructed.
pub type ValidateFn = fn(&Expression) -> Result<(), ValidationError>;

/// Static metadata for one operation kind: tag, declared result shape,
/// validator, and evaluator.
///
/// Immutable once constructed and shared (via `Arc`, see
/// [`FunctionTable`](crate::functions::FunctionTable)) across all nodes of
/// the same kind; a node carries no evaluation-time state of its own.
pub struct ExpressionEvaluator {
    expr_type: String,
    return_type: ReturnType,
    evaluator: EvaluateFn,
    validator: ValidateFn,
}

impl ExpressionEvaluator {
    pub fn new(
        expr_type: impl Into<String>,
        return_type: ReturnType,
        evaluator: EvaluateFn,
        validator: ValidateFn,
    ) -> Self {
        ExpressionEvaluator {
            expr_type: expr_type.into(),
            return_type,
            evaluator,
            validator,
        }
    }

    /// The operation tag this descriptor is registered under.
    pub fn expr_type(&self) -> &str {
        &self.expr_type
    }

    /// The declared result shape, possibly a union.
    pub fn return_type(&self) -> ReturnType {
        self.return_type
    }

    /// Run the bind-time validator against a freshly constructed node.
    pub fn validate(&self, expression: &Expression) -> Result<(), ValidationError> {
        (self.validator)(expression)
    }

    /// Dispatch to the operation's evaluation logic.
    pub fn evaluate<'a>(
        &self,
        expression: &'a Expression,
        context: &'a Context,
    ) -> BoxFuture<'a, EvaluationResult> {
        (self.evaluator)(expression, context)
    }
}

impl fmt::Debug for ExpressionEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionEvaluator")
            .field("expr_type", &self.expr_type)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

/// Execution options carried by the context.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Whether a missing binding resolves to `Null` instead of producing an
    /// evaluation error.
    pub null_on_missing: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            null_on_missing: true,
        }
    }
}

/// Evaluation context
///
/// Holds named value bindings and execution options. Read-only from the
/// perspective of the built-in operations; bindings are set up before
/// evaluation begins.
#[derive(Debug, Default)]
pub struct Context {
    bindings: HashMap<String, Value>,
    options: Options,
}

impl Context {
    pub fn new() -> Self {
        Context {
            bindings: HashMap::new(),
            options: Options::default(),
        }
    }

    pub fn with_options(options: Options) -> Self {
        Context {
            bindings: HashMap::new(),
            options,
        }
    }

    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.bindings.insert(name.into(), value.into());
    }

    pub fn unbind(&mut self, name: &str) {
        self.bindings.remove(name);
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn options(&self) -> &Options {
        &self.options
    }
}
