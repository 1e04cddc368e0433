use async_trait::async_trait;
use serde_json::{json, Value};

use super::{error_payload, Tool};
use crate::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};

/// Tool name for the local calculator.
pub const TOOL_CALCULATOR: &str = "calculator";

/// Basic arithmetic on two numbers: `add`, `sub`, `mul`, `div`, `mod`.
///
/// Domain errors are results, not failures: division by zero answers
/// `{"error": "Division by zero"}` and an unknown operation answers
/// `{"error": "Unsupported operation '<op>'"}`. Successful calls answer `{"result": n}`.
///
/// `mod` is floored: the result takes the sign of the divisor.
///
/// **Interaction**: Registered by [`build_agent_context`](crate::agent_builder::build_agent_context).
#[derive(Debug, Default, Clone, Copy)]
pub struct CalculatorTool;

impl CalculatorTool {
    pub fn new() -> Self {
        Self
    }
}

/// Computes `first op second`, or the message of a domain error.
pub fn evaluate(first: f64, second: f64, operation: &str) -> Result<f64, String> {
    match operation {
        "add" => Ok(first + second),
        "sub" => Ok(first - second),
        "mul" => Ok(first * second),
        "div" => {
            if second == 0.0 {
                Err("Division by zero".to_string())
            } else {
                Ok(first / second)
            }
        }
        "mod" => {
            if second == 0.0 {
                return Err("Modulo by zero is not allowed".to_string());
            }
            let r = first % second;
            if r != 0.0 && (r < 0.0) != (second < 0.0) {
                Ok(r + second)
            } else {
                Ok(r)
            }
        }
        other => Err(format!("Unsupported operation '{}'", other)),
    }
}

/// Integral results print without a fractional part (`12`, not `12.0`).
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        json!(n as i64)
    } else {
        json!(n)
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        TOOL_CALCULATOR
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_CALCULATOR.to_string(),
            description: Some(
                "Perform a basic arithmetic operation on two numbers. \
                 Supported operations: add, sub, mul, div, mod."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "first_num": { "type": "number", "description": "Left operand." },
                    "second_num": { "type": "number", "description": "Right operand." },
                    "operation": {
                        "type": "string",
                        "description": "One of add, sub, mul, div, mod."
                    }
                },
                "required": ["first_num", "second_num", "operation"]
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<ToolCallContent, ToolSourceError> {
        let first = args
            .get("first_num")
            .and_then(Value::as_f64)
            .ok_or_else(|| ToolSourceError::InvalidInput("first_num must be a number".into()))?;
        let second = args
            .get("second_num")
            .and_then(Value::as_f64)
            .ok_or_else(|| ToolSourceError::InvalidInput("second_num must be a number".into()))?;
        let operation = args
            .get("operation")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolSourceError::InvalidInput("operation must be a string".into()))?;

        let text = match evaluate(first, second, operation) {
            Ok(n) => json!({ "result": number_value(n) }).to_string(),
            Err(message) => error_payload(message),
        };
        Ok(ToolCallContent { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(args: Value) -> Value {
        let out = CalculatorTool::new().call(args).await.unwrap();
        serde_json::from_str(&out.text).unwrap()
    }

    /// **Scenario**: The four basic operations produce {"result": n}.
    #[tokio::test]
    async fn basic_operations() {
        for (op, expected) in [("add", json!(10)), ("sub", json!(4)), ("mul", json!(21))] {
            let v = run(json!({"first_num": 7, "second_num": 3, "operation": op})).await;
            assert_eq!(v, json!({ "result": expected }), "{}", op);
        }
        let v = run(json!({"first_num": 7, "second_num": 2, "operation": "div"})).await;
        assert_eq!(v, json!({"result": 3.5}));
    }

    /// **Scenario**: Division by zero is a result, not a failure.
    #[tokio::test]
    async fn division_by_zero() {
        let v = run(json!({"first_num": 5, "second_num": 0, "operation": "div"})).await;
        assert_eq!(v, json!({"error": "Division by zero"}));
        let v = run(json!({"first_num": 5, "second_num": 0, "operation": "mod"})).await;
        assert_eq!(v, json!({"error": "Modulo by zero is not allowed"}));
    }

    /// **Scenario**: Unknown operations name the offending operation.
    #[tokio::test]
    async fn unsupported_operation() {
        let v = run(json!({"first_num": 2, "second_num": 3, "operation": "pow"})).await;
        assert_eq!(v, json!({"error": "Unsupported operation 'pow'"}));
    }

    /// **Scenario**: mod takes the sign of the divisor.
    #[test]
    fn floored_modulo() {
        assert_eq!(evaluate(132354.0, 23.0, "mod"), Ok(12.0));
        assert_eq!(evaluate(-7.0, 3.0, "mod"), Ok(2.0));
        assert_eq!(evaluate(7.0, -3.0, "mod"), Ok(-2.0));
        assert_eq!(evaluate(6.0, 3.0, "mod"), Ok(0.0));
    }

    /// **Scenario**: Non-numeric operands are rejected as invalid input.
    #[tokio::test]
    async fn invalid_operands() {
        let err = CalculatorTool::new()
            .call(json!({"first_num": "x", "second_num": 1, "operation": "add"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolSourceError::InvalidInput(_)));
    }
}
