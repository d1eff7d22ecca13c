// adaptive-expr - Expression-tree evaluation engine
// Licensed under the MIT License

//! # adaptive-expr
//!
//! An evaluation core for expression trees. Each node is bound to an
//! immutable operation descriptor that is validated once, at construction,
//! and evaluated on demand against a [`Context`] — producing either a value
//! or a descriptive error, never both and never a panic.
//!
//! - `value` - Tagged runtime values with O(1) clone semantics
//! - `return_type` - Shape masks used for static and dynamic type checks
//! - `expression` - The node tree, its constructors and source rendering
//! - `evaluator` - Operation descriptors, outcomes, context and options
//! - `function_utils` - Bind-time validation helpers
//! - `functions` - The operation registry and built-ins (`Constant`,
//!   `Accessor`, `skip`, `take`)
//!
//! Evaluation is a suspending computation per node: children resolve
//! strictly left to right and the first error short-circuits the remainder,
//! so a tree of heterogeneous operations composes without exceptions.
//!
//! ```
//! use adaptive_expr::{Context, Expression, Value};
//! use serde_json::json;
//!
//! let expr = Expression::new(
//!     "skip",
//!     vec![Expression::accessor("items"), Expression::constant(2)],
//! )?;
//!
//! let mut context = Context::new();
//! context.bind("items", Value::from(json!([1, 2, 3, 4])));
//!
//! let result = futures::executor::block_on(expr.try_evaluate(&context))?;
//! assert_eq!(result, Value::from(json!([3, 4])));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod evaluator;
pub mod expression;
pub mod expression_type;
pub mod function_utils;
pub mod functions;
pub mod return_type;
pub mod value;

pub use evaluator::{Context, EvalError, EvaluationResult, ExpressionEvaluator, Options};
pub use expression::Expression;
pub use function_utils::ValidationError;
pub use functions::FunctionTable;
pub use return_type::ReturnType;
pub use value::Value;
