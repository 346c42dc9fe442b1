//! Calculator tool — evaluates mathematical expressions.
//!
//! Supports `+`, `-`, `*`, `/`, `%`, `^`, parentheses, and unary
//! negation. Uses a shunting-yard evaluator over two stacks. No
//! dependencies beyond std.

use async_trait::async_trait;
use toolrun_core::Tool;
use toolrun_core::error::ToolError;

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate a mathematical expression. Supports +, -, *, /, %, ^, parentheses, and decimal numbers."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "The mathematical expression to evaluate, e.g. '(2 + 3) * 4'"
                }
            },
            "required": ["expression"]
        })
    }

    async fn call(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let expr = arguments["expression"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'expression' argument".into()))?;

        let value = evaluate(expr).map_err(|reason| ToolError::ExecutionFailed {
            tool_name: "calculator".into(),
            reason,
        })?;

        // Integers print without a trailing .0
        if value.fract() == 0.0 && value.abs() < 1e15 {
            Ok(format!("{}", value as i64))
        } else {
            Ok(format!("{value}"))
        }
    }
}

// ── Shunting-yard expression evaluator ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    /// Unary minus. Binds tighter than any binary operator.
    Neg,
    LParen,
}

impl Op {
    fn precedence(self) -> u8 {
        match self {
            Op::Add | Op::Sub => 1,
            Op::Mul | Op::Div | Op::Rem => 2,
            Op::Pow => 3,
            Op::Neg => 4,
            Op::LParen => 0,
        }
    }

    fn right_associative(self) -> bool {
        matches!(self, Op::Pow | Op::Neg)
    }
}

/// Evaluate a mathematical expression string.
pub fn evaluate(expr: &str) -> Result<f64, String> {
    let mut values: Vec<f64> = Vec::new();
    let mut ops: Vec<Op> = Vec::new();
    // True when the next token may legally be an operand (so a '-' here
    // is unary negation rather than subtraction).
    let mut expect_operand = true;

    let chars: Vec<char> = expr.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                i += 1;
            }
            '(' => {
                if !expect_operand {
                    return Err("Unexpected '('".into());
                }
                ops.push(Op::LParen);
                i += 1;
            }
            ')' => {
                if expect_operand {
                    return Err("Unexpected ')'".into());
                }
                loop {
                    match ops.pop() {
                        Some(Op::LParen) => break,
                        Some(op) => apply(op, &mut values)?,
                        None => return Err("Unbalanced parentheses".into()),
                    }
                }
                i += 1;
            }
            '+' | '-' | '*' | '/' | '%' | '^' => {
                let op = match c {
                    '-' if expect_operand => Op::Neg,
                    '+' => Op::Add,
                    '-' => Op::Sub,
                    '*' => Op::Mul,
                    '/' => Op::Div,
                    '%' => Op::Rem,
                    '^' => Op::Pow,
                    _ => unreachable!(),
                };
                if expect_operand && op != Op::Neg {
                    return Err(format!("Unexpected operator: '{c}'"));
                }

                while let Some(&top) = ops.last() {
                    let binds_tighter = top.precedence() > op.precedence()
                        || (top.precedence() == op.precedence() && !op.right_associative());
                    if top == Op::LParen || !binds_tighter {
                        break;
                    }
                    apply(ops.pop().unwrap(), &mut values)?;
                }
                ops.push(op);
                expect_operand = true;
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                if !expect_operand {
                    return Err("Expected an operator before number".into());
                }
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let num_str: String = chars[start..i].iter().collect();
                let num: f64 = num_str
                    .parse()
                    .map_err(|_| format!("Invalid number: {num_str}"))?;
                values.push(num);
                expect_operand = false;
            }
            c => return Err(format!("Unexpected character: '{c}'")),
        }
    }

    while let Some(op) = ops.pop() {
        if op == Op::LParen {
            return Err("Unbalanced parentheses".into());
        }
        apply(op, &mut values)?;
    }

    match (values.pop(), values.is_empty()) {
        (Some(v), true) => Ok(v),
        _ => Err("Malformed expression".into()),
    }
}

fn apply(op: Op, values: &mut Vec<f64>) -> Result<(), String> {
    if op == Op::Neg {
        let v = values.pop().ok_or("Missing operand")?;
        values.push(-v);
        return Ok(());
    }

    let right = values.pop().ok_or("Missing operand")?;
    let left = values.pop().ok_or("Missing operand")?;
    let result = match op {
        Op::Add => left + right,
        Op::Sub => left - right,
        Op::Mul => left * right,
        Op::Div => {
            if right == 0.0 {
                return Err("Division by zero".into());
            }
            left / right
        }
        Op::Rem => {
            if right == 0.0 {
                return Err("Division by zero".into());
            }
            left % right
        }
        Op::Pow => left.powf(right),
        Op::Neg | Op::LParen => unreachable!(),
    };
    values.push(result);
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_addition() {
        assert_eq!(evaluate("2 + 3").unwrap(), 5.0);
    }

    #[test]
    fn operator_precedence() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
    }

    #[test]
    fn parentheses() {
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
    }

    #[test]
    fn nested_parentheses() {
        assert_eq!(evaluate("((1 + 2) * (3 + 4))").unwrap(), 21.0);
    }

    #[test]
    fn division() {
        assert_eq!(evaluate("10 / 4").unwrap(), 2.5);
    }

    #[test]
    fn division_by_zero() {
        assert!(evaluate("1 / 0").is_err());
    }

    #[test]
    fn remainder() {
        assert_eq!(evaluate("10 % 3").unwrap(), 1.0);
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(evaluate("2 ^ 3 ^ 2").unwrap(), 512.0);
    }

    #[test]
    fn unary_negation() {
        assert_eq!(evaluate("-5 + 3").unwrap(), -2.0);
        assert_eq!(evaluate("2 * -3").unwrap(), -6.0);
    }

    #[test]
    fn decimals() {
        assert_eq!(evaluate("3.14 * 2").unwrap(), 6.28);
    }

    #[test]
    fn complex_expression() {
        let result = evaluate("(10 + 5) / 3 - 2 * (1 + 1)").unwrap();
        assert!((result - 1.0).abs() < 1e-10);
    }

    #[test]
    fn invalid_expression() {
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("* 2").is_err());
        assert!(evaluate("(2 + 3").is_err());
    }

    #[test]
    fn empty_expression() {
        assert!(evaluate("").is_err());
    }

    #[tokio::test]
    async fn tool_call_formats_integers() {
        let tool = CalculatorTool;
        let out = tool
            .call(serde_json::json!({"expression": "10 / 2"}))
            .await
            .unwrap();
        assert_eq!(out, "5");
    }

    #[tokio::test]
    async fn tool_call_formats_decimals() {
        let tool = CalculatorTool;
        let out = tool
            .call(serde_json::json!({"expression": "10 / 3"}))
            .await
            .unwrap();
        assert!(out.starts_with("3.333"));
    }

    #[tokio::test]
    async fn tool_missing_expression() {
        let tool = CalculatorTool;
        let result = tool.call(serde_json::json!({})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[tokio::test]
    async fn tool_bad_expression_is_execution_failure() {
        let tool = CalculatorTool;
        let result = tool.call(serde_json::json!({"expression": "1 / 0"})).await;
        assert!(matches!(result, Err(ToolError::ExecutionFailed { .. })));
    }

    #[test]
    fn tool_spec() {
        let tool = CalculatorTool;
        assert_eq!(tool.spec().name, "calculator");
    }
}
