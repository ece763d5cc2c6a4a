//! Runtime values and the operators defined over them.
//!
//! Every expression reduces to a [`Value`]. Arithmetic between two integers
//! stays integral (promoting to float on overflow); any float operand
//! promotes the result to float. `+` doubles as string concatenation when
//! either side is a string; the remaining arithmetic operators reject
//! strings with a type mismatch.

use crate::error::{Result, RuntimeError};
use std::cmp::Ordering;
use std::fmt;

/// A BASIC runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i32),
    Float(f64),
    Str(String),
}

impl Value {
    /// Numeric view of the value; strings are a type mismatch.
    pub fn as_number(&self) -> Result<f64> {
        match self {
            Value::Integer(n) => Ok(*n as f64),
            Value::Float(f) => Ok(*f),
            Value::Str(_) => Err(RuntimeError::TypeMismatch),
        }
    }

    /// Truthiness for IF/WHILE and the logical operators: nonzero numbers
    /// and non-empty strings are true.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Integer(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
        }
    }

    /// Addition, or string concatenation when either operand is a string.
    pub fn add(self, rhs: Value) -> Result<Value> {
        match (self, rhs) {
            (Value::Str(a), b) => Ok(Value::Str(format!("{}{}", a, b))),
            (a, Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
            (Value::Integer(a), Value::Integer(b)) => Ok(match a.checked_add(b) {
                Some(n) => Value::Integer(n),
                None => Value::Float(a as f64 + b as f64),
            }),
            (a, b) => Ok(Value::Float(a.as_number()? + b.as_number()?)),
        }
    }

    pub fn sub(self, rhs: Value) -> Result<Value> {
        match (self, rhs) {
            (Value::Integer(a), Value::Integer(b)) => Ok(match a.checked_sub(b) {
                Some(n) => Value::Integer(n),
                None => Value::Float(a as f64 - b as f64),
            }),
            (a, b) => Ok(Value::Float(a.as_number()? - b.as_number()?)),
        }
    }

    pub fn mul(self, rhs: Value) -> Result<Value> {
        match (self, rhs) {
            (Value::Integer(a), Value::Integer(b)) => Ok(match a.checked_mul(b) {
                Some(n) => Value::Integer(n),
                None => Value::Float(a as f64 * b as f64),
            }),
            (a, b) => Ok(Value::Float(a.as_number()? * b.as_number()?)),
        }
    }

    /// Division always yields a float; a zero divisor is an error.
    pub fn div(self, rhs: Value) -> Result<Value> {
        let a = self.as_number()?;
        let b = rhs.as_number()?;
        if b == 0.0 {
            return Err(RuntimeError::DivisionByZero);
        }
        Ok(Value::Float(a / b))
    }

    /// Exponentiation always yields a float.
    pub fn pow(self, rhs: Value) -> Result<Value> {
        let a = self.as_number()?;
        let b = rhs.as_number()?;
        Ok(Value::Float(a.powf(b)))
    }

    pub fn neg(self) -> Result<Value> {
        match self {
            Value::Integer(n) => Ok(Value::Integer(n.wrapping_neg())),
            Value::Float(f) => Ok(Value::Float(-f)),
            Value::Str(_) => Err(RuntimeError::TypeMismatch),
        }
    }

    /// Ordering for the relational operators: numbers compare numerically,
    /// strings lexicographically; mixing the two is a type mismatch.
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::Str(_), _) | (_, Value::Str(_)) => Err(RuntimeError::TypeMismatch),
            (a, b) => Ok(a.as_number()?.total_cmp(&b.as_number()?)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}
