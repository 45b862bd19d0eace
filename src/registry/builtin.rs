//! Demonstration units shipped with the server binary.

use crate::payload::{TypeTag, Value};

use super::error::RegistryError;
use super::unit::Unit;

fn mismatch(unit: &str) -> RegistryError {
    RegistryError::Execution {
        unit: unit.to_string(),
        message: "unexpected argument layout".to_string(),
    }
}

/// `sum(int, int) -> int`
pub fn sum() -> Unit {
    Unit::new("sum", vec![TypeTag::Int, TypeTag::Int], |args| match args {
        [Value::Int(a), Value::Int(b)] => a
            .checked_add(*b)
            .map(|v| vec![Value::Int(v)])
            .ok_or_else(|| RegistryError::Execution {
                unit: "sum".to_string(),
                message: "integer overflow".to_string(),
            }),
        _ => Err(mismatch("sum")),
    })
}

/// `concat(string, string) -> string`
pub fn concat() -> Unit {
    Unit::new("concat", vec![TypeTag::Str, TypeTag::Str], |args| match args {
        [Value::Str(a), Value::Str(b)] => Ok(vec![Value::Str(format!("{}{}", a, b))]),
        _ => Err(mismatch("concat")),
    })
}

/// `repeat(int, string) -> string`
pub fn repeat() -> Unit {
    Unit::new("repeat", vec![TypeTag::Int, TypeTag::Str], |args| match args {
        [Value::Int(n), Value::Str(s)] => {
            let n = usize::try_from(*n).map_err(|_| RegistryError::Execution {
                unit: "repeat".to_string(),
                message: format!("negative count {}", n),
            })?;
            Ok(vec![Value::Str(s.repeat(n))])
        }
        _ => Err(mismatch("repeat")),
    })
}

pub fn all() -> Vec<Unit> {
    vec![sum(), concat(), repeat()]
}
