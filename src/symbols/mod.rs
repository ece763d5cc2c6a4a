//! Symbol table: name-to-binding resolution for scalars and arrays.
//!
//! Names are typed by suffix: `%` holds integers, `$` holds strings, and an
//! unsuffixed name holds a float. Reading an unset scalar auto-declares it
//! with the zero value of its type. Arrays must be declared with DIM and
//! store their cells flat in row-major order.

use crate::error::{Result, RuntimeError};
use crate::value::Value;
use std::collections::HashMap;

/// Variable type implied by a name's suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Integer,
    Float,
    Str,
}

/// The type a name's suffix assigns to it.
pub fn var_type(name: &str) -> VarType {
    if name.ends_with('%') {
        VarType::Integer
    } else if name.ends_with('$') {
        VarType::Str
    } else {
        VarType::Float
    }
}

fn default_value(ty: VarType) -> Value {
    match ty {
        VarType::Integer => Value::Integer(0),
        VarType::Float => Value::Float(0.0),
        VarType::Str => Value::Str(String::new()),
    }
}

/// Convert a value to the type a name requires. Floats assigned to `%`
/// names truncate toward zero; integers assigned to unsuffixed names
/// promote to float; strings never convert to numbers or back.
pub fn coerce_to(name: &str, value: Value) -> Result<Value> {
    match (var_type(name), value) {
        (VarType::Integer, Value::Integer(n)) => Ok(Value::Integer(n)),
        (VarType::Integer, Value::Float(f)) => Ok(Value::Integer(f as i32)),
        (VarType::Float, Value::Integer(n)) => Ok(Value::Float(n as f64)),
        (VarType::Float, Value::Float(f)) => Ok(Value::Float(f)),
        (VarType::Str, Value::Str(s)) => Ok(Value::Str(s)),
        _ => Err(RuntimeError::TypeMismatch),
    }
}

/// A named binding: one scalar value, or a DIMed array.
/// Array `dims` hold the cell count per dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Scalar(Value),
    Array { dims: Vec<usize>, cells: Vec<Value> },
}

/// All variable state of a running program.
#[derive(Debug, Default)]
pub struct SymbolTable {
    bindings: HashMap<String, Binding>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a scalar, auto-declaring it with the type's zero value.
    pub fn get(&mut self, name: &str) -> Result<Value> {
        let ty = var_type(name);
        match self
            .bindings
            .entry(name.to_string())
            .or_insert_with(|| Binding::Scalar(default_value(ty)))
        {
            Binding::Scalar(value) => Ok(value.clone()),
            Binding::Array { .. } => Err(RuntimeError::TypeMismatch),
        }
    }

    /// Assign a scalar, coercing the value to the name's type.
    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        let value = coerce_to(name, value)?;
        match self.bindings.get_mut(name) {
            Some(Binding::Array { .. }) => Err(RuntimeError::TypeMismatch),
            Some(Binding::Scalar(slot)) => {
                *slot = value;
                Ok(())
            }
            None => {
                self.bindings.insert(name.to_string(), Binding::Scalar(value));
                Ok(())
            }
        }
    }

    /// Declare an array. `sizes` are cell counts per dimension; declaring a
    /// name twice is an error.
    pub fn declare_array(&mut self, name: &str, sizes: Vec<usize>) -> Result<()> {
        if self.bindings.contains_key(name) {
            return Err(RuntimeError::Redimension);
        }
        let total: usize = sizes.iter().product();
        let cells = vec![default_value(var_type(name)); total];
        self.bindings
            .insert(name.to_string(), Binding::Array { dims: sizes, cells });
        Ok(())
    }

    /// True when `name` is bound to a declared array.
    pub fn has_array(&self, name: &str) -> bool {
        matches!(self.bindings.get(name), Some(Binding::Array { .. }))
    }

    /// Read one array cell; every subscript is bounds-checked.
    pub fn array_get(&self, name: &str, indices: &[i32]) -> Result<Value> {
        match self.bindings.get(name) {
            Some(Binding::Array { dims, cells }) => {
                let flat = flat_index(dims, indices)?;
                Ok(cells[flat].clone())
            }
            _ => Err(RuntimeError::Subscript),
        }
    }

    /// Write one array cell, coercing the value to the name's type.
    pub fn array_set(&mut self, name: &str, indices: &[i32], value: Value) -> Result<()> {
        let value = coerce_to(name, value)?;
        match self.bindings.get_mut(name) {
            Some(Binding::Array { dims, cells }) => {
                let flat = flat_index(dims, indices)?;
                cells[flat] = value;
                Ok(())
            }
            _ => Err(RuntimeError::Subscript),
        }
    }

    /// Remove a binding, returning it for later restore. Used to scope a
    /// user-defined function's parameter over its body.
    pub fn take(&mut self, name: &str) -> Option<Binding> {
        self.bindings.remove(name)
    }

    /// Undo a [`SymbolTable::take`].
    pub fn restore(&mut self, name: &str, binding: Option<Binding>) {
        match binding {
            Some(binding) => {
                self.bindings.insert(name.to_string(), binding);
            }
            None => {
                self.bindings.remove(name);
            }
        }
    }
}

/// Row-major flattening with full bounds checking.
fn flat_index(dims: &[usize], indices: &[i32]) -> Result<usize> {
    if indices.len() != dims.len() {
        return Err(RuntimeError::Subscript);
    }
    let mut flat = 0;
    for (&size, &index) in dims.iter().zip(indices) {
        if index < 0 || index as usize >= size {
            return Err(RuntimeError::Subscript);
        }
        flat = flat * size + index as usize;
    }
    Ok(flat)
}
