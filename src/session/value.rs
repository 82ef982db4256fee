//! Runtime values

use std::fmt;
use std::sync::Arc;

use crate::frontend::check::Ty;

/// Longest string, in bytes, a snippet may build
pub const MAX_STRING_LEN: usize = 1 << 24;

/// Runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Double(f64),
    Bool(bool),
    Str(Arc<str>),
    Null,
    /// Result of a `void` call
    Void,
}

impl Value {
    /// Value a variable of type `ty` holds before assignment
    pub fn default_for(ty: Ty) -> Value {
        match ty {
            Ty::Int => Value::Int(0),
            Ty::Double => Value::Double(0.0),
            Ty::Boolean => Value::Bool(false),
            Ty::Str | Ty::Null => Value::Null,
            Ty::Void => Value::Void,
        }
    }

    /// Static type of a value, used to infer `var` declarations
    pub fn ty(&self) -> Ty {
        match self {
            Value::Int(_) => Ty::Int,
            Value::Double(_) => Ty::Double,
            Value::Bool(_) => Ty::Boolean,
            Value::Str(_) => Ty::Str,
            Value::Null => Ty::Null,
            Value::Void => Ty::Void,
        }
    }

    pub fn string(text: impl Into<Arc<str>>) -> Value {
        Value::Str(text.into())
    }

    /// Convert for storage in a slot of type `ty`
    ///
    /// Widens `int` to `double`; narrowing only happens for compound
    /// assignment into an `int`, which truncates like a cast.
    pub fn coerce(
        self,
        ty: Ty,
    ) -> Value {
        match (self, ty) {
            (Value::Int(n), Ty::Double) => Value::Double(n as f64),
            (Value::Double(f), Ty::Int) => Value::Int(f as i64),
            (value, _) => value,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Double(f) => Some(*f),
            _ => None,
        }
    }

    /// REPL style rendering: strings are quoted and escaped
    pub fn echo(&self) -> String {
        match self {
            Value::Str(text) => {
                let mut quoted = String::with_capacity(text.len() + 2);
                quoted.push('"');
                for c in text.chars() {
                    match c {
                        '"' => quoted.push_str("\\\""),
                        '\\' => quoted.push_str("\\\\"),
                        '\n' => quoted.push_str("\\n"),
                        '\t' => quoted.push_str("\\t"),
                        '\r' => quoted.push_str("\\r"),
                        c => quoted.push(c),
                    }
                }
                quoted.push('"');
                quoted
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Double(d) => f.write_str(&format_double(*d)),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => f.write_str(s),
            Value::Null => f.write_str("null"),
            Value::Void => Ok(()),
        }
    }
}

/// Render a double the way the console shows it: `2.0`, `0.5`, `1.0E10`
pub fn format_double(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        let text = value.to_string();
        if text.contains('.') {
            text
        } else {
            format!("{}.0", text)
        }
    } else {
        let text = format!("{:e}", value);
        match text.split_once('e') {
            Some((mantissa, exponent)) if !mantissa.contains('.') => {
                format!("{}.0E{}", mantissa, exponent)
            }
            Some((mantissa, exponent)) => format!("{}E{}", mantissa, exponent),
            None => text,
        }
    }
}
