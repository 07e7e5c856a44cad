//! Gamebook Expression — the small language story authors write inside
//! attributes.
//!
//! Expressions can read and write story variables (`Variables.name`) and
//! nothing else. Bare names fail with `EvalError::UnknownIdentifier`, which
//! callers use to treat unquoted words as text.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

use gamebook_core::evaluator::Evaluator;
use gamebook_core::{EvalError, Value, Variables};
use tracing::trace;

/// `Evaluator` backed by this crate's parser and interpreter.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptEvaluator;

impl Evaluator for ScriptEvaluator {
    fn evaluate(&self, source: &str, variables: &mut Variables) -> Result<Value, EvalError> {
        let statements = parser::parse(source)?;
        let value = eval::run(&statements, variables)?;
        trace!(source, %value, "evaluated expression");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str, variables: &mut Variables) -> Result<Value, EvalError> {
        ScriptEvaluator.evaluate(source, variables)
    }

    #[test]
    fn test_reads_missing_variable_as_null() {
        let mut variables = Variables::new();
        assert_eq!(eval("Variables.gold", &mut variables), Ok(Value::Null));
    }

    #[test]
    fn test_assignment_writes_variable() {
        // Arrange
        let mut variables = Variables::new();

        // Act
        let result = eval("Variables.gold = 3; Variables.gold += 2", &mut variables);

        // Assert
        assert_eq!(result, Ok(Value::from(5.0)));
        assert_eq!(variables.get("gold"), Some(&Value::from(5.0)));
    }

    #[test]
    fn test_postfix_increment_returns_previous() {
        let mut variables = Variables::new();
        variables.set("turns", Value::from(1.0));

        let result = eval("Variables.turns++", &mut variables);

        assert_eq!(result, Ok(Value::from(1.0)));
        assert_eq!(variables.get("turns"), Some(&Value::from(2.0)));
    }

    #[test]
    fn test_string_concatenation() {
        let mut variables = Variables::new();
        variables.set("name", Value::from("Ada"));

        let result = eval("'Hello, ' + Variables.name + '!'", &mut variables);

        assert_eq!(result, Ok(Value::from("Hello, Ada!")));
    }

    #[test]
    fn test_logical_operators_return_operands() {
        let mut variables = Variables::new();
        assert_eq!(eval("0 || 'fallback'", &mut variables), Ok(Value::from("fallback")));
        assert_eq!(eval("'a' && 'b'", &mut variables), Ok(Value::from("b")));
        assert_eq!(eval("null && 'b'", &mut variables), Ok(Value::Null));
    }

    #[test]
    fn test_loose_and_strict_equality() {
        let mut variables = Variables::new();
        assert_eq!(eval("'3' == 3", &mut variables), Ok(Value::Bool(true)));
        assert_eq!(eval("'3' === 3", &mut variables), Ok(Value::Bool(false)));
        assert_eq!(eval("null == undefined", &mut variables), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_ternary_and_comparison() {
        let mut variables = Variables::new();
        variables.set("hp", Value::from(4.0));

        let result = eval("Variables.hp > 5 ? 'healthy' : 'hurt'", &mut variables);

        assert_eq!(result, Ok(Value::from("hurt")));
    }

    #[test]
    fn test_list_helpers() {
        let mut variables = Variables::new();
        eval("Variables.bag = ['rope', 'lamp']", &mut variables).unwrap();

        assert_eq!(
            eval("Variables.bag.includes('lamp')", &mut variables),
            Ok(Value::Bool(true))
        );
        assert_eq!(eval("Variables.bag.length", &mut variables), Ok(Value::from(2.0)));
        assert_eq!(eval("Variables.bag[1]", &mut variables), Ok(Value::from("lamp")));
    }

    #[test]
    fn test_bare_identifier_is_unknown() {
        let mut variables = Variables::new();
        assert_eq!(
            eval("Bob", &mut variables),
            Err(EvalError::UnknownIdentifier("Bob".into()))
        );
    }

    #[test]
    fn test_member_of_missing_value_is_type_error() {
        let mut variables = Variables::new();
        assert!(matches!(
            eval("Variables.nothing.length", &mut variables),
            Err(EvalError::Type(_))
        ));
    }

    #[test]
    fn test_division_by_zero_is_infinite() {
        let mut variables = Variables::new();
        assert_eq!(
            eval("1 / 0", &mut variables),
            Ok(Value::Number(f64::INFINITY))
        );
    }
}
