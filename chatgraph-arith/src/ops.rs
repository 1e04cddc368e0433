//! Integer arithmetic with floored division and modulus.

use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArithError {
    #[error("Division by zero is not allowed")]
    DivisionByZero,
    #[error("Modulo by zero is not allowed")]
    ModuloByZero,
    #[error("Integer overflow")]
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ArithOp {
    pub const ALL: [ArithOp; 5] = [Self::Add, Self::Sub, Self::Mul, Self::Div, Self::Mod];

    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Mod => "mod",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Add => "Add two numbers",
            Self::Sub => "Subtract b from a",
            Self::Mul => "Multiply two numbers",
            Self::Div => "Integer division of a by b",
            Self::Mod => "Modulus of a by b",
        }
    }

    /// Tool descriptor as listed by `tools/list`.
    pub fn tool_spec(self) -> Value {
        json!({
            "name": self.name(),
            "description": self.description(),
            "inputSchema": {
                "type": "object",
                "properties": {
                    "a": {"type": "integer"},
                    "b": {"type": "integer"}
                },
                "required": ["a", "b"]
            }
        })
    }

    /// Division rounds toward negative infinity; the remainder takes the sign of `b`.
    pub fn apply(self, a: i64, b: i64) -> Result<i64, ArithError> {
        match self {
            Self::Add => a.checked_add(b).ok_or(ArithError::Overflow),
            Self::Sub => a.checked_sub(b).ok_or(ArithError::Overflow),
            Self::Mul => a.checked_mul(b).ok_or(ArithError::Overflow),
            Self::Div => {
                if b == 0 {
                    return Err(ArithError::DivisionByZero);
                }
                let q = a.checked_div(b).ok_or(ArithError::Overflow)?;
                if a % b != 0 && ((a < 0) != (b < 0)) {
                    Ok(q - 1)
                } else {
                    Ok(q)
                }
            }
            Self::Mod => {
                if b == 0 {
                    return Err(ArithError::ModuloByZero);
                }
                let r = a.checked_rem(b).ok_or(ArithError::Overflow)?;
                if r != 0 && ((r < 0) != (b < 0)) {
                    Ok(r + b)
                } else {
                    Ok(r)
                }
            }
        }
    }
}
