//! Arithmetic labels for collectibles on hard difficulty
//!
//! A collectible worth `v` shows a three-token expression `a OP b` whose
//! result is `v`. Multiplication and addition operands stay within 1..=9.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Largest operand for `+` and `*`
const MAX_DIGIT: u32 = 9;
/// Largest left operand for `-` and `/`
const MAX_OPERAND: u32 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    pub fn symbol(&self) -> char {
        match self {
            Operation::Add => '+',
            Operation::Subtract => '-',
            Operation::Multiply => 'x',
            Operation::Divide => '/',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operation::Add),
            '-' => Some(Operation::Subtract),
            'x' | '*' => Some(Operation::Multiply),
            '/' => Some(Operation::Divide),
            _ => None,
        }
    }

    pub fn apply(&self, a: u32, b: u32) -> Option<u32> {
        match self {
            Operation::Add => a.checked_add(b),
            Operation::Subtract => a.checked_sub(b),
            Operation::Multiply => a.checked_mul(b),
            Operation::Divide => (b != 0 && a % b == 0).then(|| a / b),
        }
    }
}

/// Every `(a, op, b)` that yields `value` under the operand limits
fn candidates(value: u32) -> Vec<(u32, Operation, u32)> {
    let mut out = Vec::new();
    for a in 1..=MAX_DIGIT {
        for b in 1..=MAX_DIGIT {
            if a + b == value {
                out.push((a, Operation::Add, b));
            }
            if a * b == value {
                out.push((a, Operation::Multiply, b));
            }
        }
    }
    for b in 1..=MAX_DIGIT {
        let a = value + b;
        if a <= MAX_OPERAND {
            out.push((a, Operation::Subtract, b));
        }
    }
    for b in 2..=MAX_DIGIT {
        let a = value * b;
        if a <= MAX_OPERAND {
            out.push((a, Operation::Divide, b));
        }
    }
    out
}

/// Pick a random expression evaluating to `value`; falls back to the plain
/// number when no expression fits the operand limits.
pub fn expression_for<R: Rng>(value: u32, rng: &mut R) -> String {
    let options = candidates(value);
    if options.is_empty() {
        return value.to_string();
    }
    let (a, op, b) = options[rng.random_range(0..options.len())];
    format!("{} {} {}", a, op.symbol(), b)
}

/// Evaluate a label produced by [`expression_for`] (or a plain number)
pub fn evaluate(text: &str) -> Option<u32> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    match tokens.as_slice() {
        [n] => n.parse().ok(),
        [a, op, b] => {
            let mut chars = op.chars();
            let op = Operation::from_symbol(chars.next()?)?;
            if chars.next().is_some() {
                return None;
            }
            op.apply(a.parse().ok()?, b.parse().ok()?)
        }
        _ => None,
    }
}
