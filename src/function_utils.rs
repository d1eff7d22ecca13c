// Bind-time validation helpers shared by the built-in operations

use thiserror::Error;

use crate::expression::Expression;
use crate::return_type::ReturnType;

/// Structural defects detected when a node is constructed.
///
/// These indicate a malformed expression (wrong arity, statically
/// incompatible child) and abort construction immediately; they never travel
/// through the run-time error channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{expression} should have at least {expected} children, found {found}.")]
    TooFewChildren {
        expression: String,
        expected: usize,
        found: usize,
    },

    #[error("{expression} can't have more than {expected} children, found {found}.")]
    TooManyChildren {
        expression: String,
        expected: usize,
        found: usize,
    },

    #[error("{child} in {expression} is not a {expected}.")]
    ChildType {
        child: String,
        expression: String,
        expected: ReturnType,
    },

    #[error("{0} does not have an evaluator, it's not a built-in function or a custom function.")]
    UnknownFunction(String),

    #[error("{expression} is not a valid accessor: the name must be a string constant.")]
    InvalidAccessor { expression: String },

    #[error("{expression} is a constant without a stored value.")]
    MissingValue { expression: String },
}

/// Validate arity and statically known child types for an ordered argument
/// list: `required` positions must be filled, `optional` positions may be.
///
/// A child's declared type is checked only when it is statically known: if
/// either the expected mask or the child's declared mask contains `OBJECT`
/// (the dynamic marker carried by constants and accessors), the check is
/// deferred to the runtime evaluator.
pub fn validate_order(
    expression: &Expression,
    optional: &[ReturnType],
    required: &[ReturnType],
) -> Result<(), ValidationError> {
    let found = expression.children().len();
    if found < required.len() {
        return Err(ValidationError::TooFewChildren {
            expression: expression.to_string(),
            expected: required.len(),
            found,
        });
    }
    if found > required.len() + optional.len() {
        return Err(ValidationError::TooManyChildren {
            expression: expression.to_string(),
            expected: required.len() + optional.len(),
            found,
        });
    }

    for (child, &expected) in expression
        .children()
        .iter()
        .zip(required.iter().chain(optional))
    {
        let declared = child.return_type();
        if !expected.includes(ReturnType::OBJECT)
            && !declared.includes(ReturnType::OBJECT)
            && !expected.intersects(declared)
        {
            return Err(ValidationError::ChildType {
                child: child.to_string(),
                expression: expression.to_string(),
                expected,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression_type;

    fn skip_pair() -> Vec<Expression> {
        vec![
            Expression::constant(Vec::<crate::value::Value>::new()),
            Expression::constant(1),
        ]
    }

    #[test]
    fn test_arity_too_few() {
        let err = Expression::new(expression_type::SKIP, vec![Expression::constant(1)])
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TooFewChildren {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_arity_too_many() {
        let mut children = skip_pair();
        children.push(Expression::constant(3));
        let err = Expression::new(expression_type::SKIP, children).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TooManyChildren {
                expected: 2,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_dynamic_children_skip_the_static_check() {
        // Constants declare OBJECT, so a string constant in a number slot
        // passes bind-time validation and fails at evaluation instead.
        let expr = Expression::new(
            expression_type::SKIP,
            vec![Expression::constant("oops"), Expression::constant("x")],
        );
        assert!(expr.is_ok());
    }

    #[test]
    fn test_statically_known_child_type_is_enforced() {
        // A `take` node declares Array|String, which does not intersect the
        // Number mask expected in skip's count position.
        let inner = Expression::new(expression_type::TAKE, skip_pair()).unwrap();
        let err = Expression::new(
            expression_type::SKIP,
            vec![Expression::constant(Vec::<crate::value::Value>::new()), inner],
        )
        .unwrap_err();
        match err {
            ValidationError::ChildType { expected, .. } => {
                assert_eq!(expected, ReturnType::NUMBER);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
