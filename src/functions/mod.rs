//! Built-in function library and command registry.
//!
//! Functions are dispatched by upper-cased name and validate their own
//! arity and argument types. Commands only validate name and shape here;
//! their display-side effects belong to the host, not the core.

use crate::error::{Result, RuntimeError};
use crate::value::Value;
use rand::rngs::ThreadRng;
use rand::Rng;

/// Commands that take no argument.
pub const SIMPLE_COMMANDS: &[&str] = &["CLS", "BEEP", "INVERSE", "NORMAL", "TEXT", "GRAPH"];

/// Commands that take one numeric argument.
pub const PARAM_COMMANDS: &[&str] = &["SLEEP", "CURSOR"];

pub fn is_simple_command(name: &str) -> bool {
    SIMPLE_COMMANDS.contains(&name)
}

pub fn is_param_command(name: &str) -> bool {
    PARAM_COMMANDS.contains(&name)
}

/// The intrinsic function set, plus the random source RND draws from.
#[derive(Debug)]
pub struct Builtins {
    rng: ThreadRng,
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

impl Builtins {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// True when `name` is an intrinsic function (as opposed to an array).
    pub fn is_function(name: &str) -> bool {
        matches!(
            name,
            "ABS" | "SGN" | "INT" | "SQR" | "SIN" | "COS" | "TAN" | "ATN" | "EXP" | "LOG"
                | "RND" | "LEN" | "ASC" | "VAL" | "CHR$" | "STR$" | "LEFT$" | "RIGHT$" | "MID$"
        )
    }

    /// Apply an intrinsic function to already-evaluated arguments.
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Value> {
        match name {
            "ABS" => match *one(args)? {
                Value::Integer(n) => Ok(Value::Integer(n.wrapping_abs())),
                Value::Float(f) => Ok(Value::Float(f.abs())),
                Value::Str(_) => Err(RuntimeError::TypeMismatch),
            },
            "SGN" => {
                let n = one(args)?.as_number()?;
                Ok(Value::Integer(if n > 0.0 {
                    1
                } else if n < 0.0 {
                    -1
                } else {
                    0
                }))
            }
            "INT" => {
                let n = one(args)?.as_number()?;
                Ok(Value::Integer(n.floor() as i32))
            }
            "SQR" => {
                let n = one(args)?.as_number()?;
                if n < 0.0 {
                    return Err(RuntimeError::IllegalQuantity);
                }
                Ok(Value::Float(n.sqrt()))
            }
            "SIN" => Ok(Value::Float(one(args)?.as_number()?.sin())),
            "COS" => Ok(Value::Float(one(args)?.as_number()?.cos())),
            "TAN" => Ok(Value::Float(one(args)?.as_number()?.tan())),
            "ATN" => Ok(Value::Float(one(args)?.as_number()?.atan())),
            "EXP" => Ok(Value::Float(one(args)?.as_number()?.exp())),
            "LOG" => {
                let n = one(args)?.as_number()?;
                if n <= 0.0 {
                    return Err(RuntimeError::IllegalQuantity);
                }
                Ok(Value::Float(n.ln()))
            }
            "RND" => {
                // classic form: the argument is required but only the
                // generator's next draw matters
                one(args)?.as_number()?;
                Ok(Value::Float(self.rng.gen::<f64>()))
            }
            "LEN" => Ok(Value::Integer(one_str(args)?.chars().count() as i32)),
            "ASC" => match one_str(args)?.chars().next() {
                Some(c) => Ok(Value::Integer(c as i32)),
                None => Err(RuntimeError::IllegalQuantity),
            },
            "VAL" => {
                let text = one_str(args)?;
                let text = text.trim();
                if let Ok(n) = text.parse::<i32>() {
                    Ok(Value::Integer(n))
                } else if let Ok(f) = text.parse::<f64>() {
                    Ok(Value::Float(f))
                } else {
                    Ok(Value::Integer(0))
                }
            }
            "CHR$" => {
                let code = one(args)?.as_number()? as i64;
                match u8::try_from(code) {
                    Ok(byte) => Ok(Value::Str((byte as char).to_string())),
                    Err(_) => Err(RuntimeError::IllegalQuantity),
                }
            }
            "STR$" => {
                let n = one(args)?;
                n.as_number()?;
                Ok(Value::Str(n.to_string()))
            }
            "LEFT$" => {
                let (text, count) = str_and_count(args)?;
                Ok(Value::Str(text.chars().take(count).collect()))
            }
            "RIGHT$" => {
                let (text, count) = str_and_count(args)?;
                let skip = text.chars().count().saturating_sub(count);
                Ok(Value::Str(text.chars().skip(skip).collect()))
            }
            "MID$" => {
                if args.len() != 2 && args.len() != 3 {
                    return Err(RuntimeError::Arity);
                }
                let text = match &args[0] {
                    Value::Str(s) => s,
                    _ => return Err(RuntimeError::TypeMismatch),
                };
                let start = args[1].as_number()? as i64;
                if start < 1 {
                    return Err(RuntimeError::IllegalQuantity);
                }
                let rest = text.chars().skip(start as usize - 1);
                let result: String = match args.get(2) {
                    Some(len) => {
                        let len = len.as_number()? as i64;
                        if len < 0 {
                            return Err(RuntimeError::IllegalQuantity);
                        }
                        rest.take(len as usize).collect()
                    }
                    None => rest.collect(),
                };
                Ok(Value::Str(result))
            }
            _ => Err(RuntimeError::UnknownFunction(name.to_string())),
        }
    }

    /// Validate a command invocation. The shape is checked here; rendering
    /// is the host's business, so a valid command completes immediately.
    pub fn command(&mut self, name: &str, arg: Option<&Value>) -> Result<()> {
        if is_simple_command(name) {
            return match arg {
                None => Ok(()),
                Some(_) => Err(RuntimeError::Arity),
            };
        }
        if is_param_command(name) {
            return match arg {
                Some(value) => {
                    if value.as_number()? < 0.0 {
                        return Err(RuntimeError::IllegalQuantity);
                    }
                    Ok(())
                }
                None => Err(RuntimeError::Arity),
            };
        }
        Err(RuntimeError::UnknownFunction(name.to_string()))
    }
}

fn one(args: &[Value]) -> Result<&Value> {
    match args {
        [value] => Ok(value),
        _ => Err(RuntimeError::Arity),
    }
}

fn one_str(args: &[Value]) -> Result<&str> {
    match one(args)? {
        Value::Str(s) => Ok(s),
        _ => Err(RuntimeError::TypeMismatch),
    }
}

fn str_and_count(args: &[Value]) -> Result<(&str, usize)> {
    match args {
        [Value::Str(text), count] => {
            let count = count.as_number()? as i64;
            if count < 0 {
                return Err(RuntimeError::IllegalQuantity);
            }
            Ok((text, count as usize))
        }
        [_, _] => Err(RuntimeError::TypeMismatch),
        _ => Err(RuntimeError::Arity),
    }
}
