//! DATA pool: literals collected in source order before execution starts,
//! consumed by READ and rewound by RESTORE.

use crate::error::{Result, RuntimeError};
use crate::value::Value;

#[derive(Debug, Default)]
pub struct DataPool {
    values: Vec<Value>,
    cursor: usize,
}

impl DataPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one DATA statement's literals.
    pub fn add(&mut self, values: &[Value]) {
        self.values.extend_from_slice(values);
    }

    /// The next unread literal; reading past the end is an error.
    pub fn next_value(&mut self) -> Result<Value> {
        match self.values.get(self.cursor) {
            Some(value) => {
                self.cursor += 1;
                Ok(value.clone())
            }
            None => Err(RuntimeError::OutOfData),
        }
    }

    /// Rewind the read cursor to the first literal.
    pub fn restore(&mut self) {
        self.cursor = 0;
    }
}
