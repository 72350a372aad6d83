//! Response envelope and the type resolver.
//!
//! The terminal replies with exactly one payload shape per command. Callers
//! ask for a static Rust type; the resolver converts the received shape into
//! that type where a natural conversion exists and otherwise yields the
//! type's default value. Shape mismatches never raise in the lenient path;
//! `resolve_strict` reports them as `MtApiError::ResponseMismatch`.
use serde::{Deserialize, Serialize};

use crate::error::MtApiError;
use crate::result::Result;
use crate::value::Value;

/// Tagged union over every reply shape the terminal can produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponseEnvelope {
    /// Floating-point scalar.
    Double(f64),
    /// Integer scalar.
    Int(i32),
    /// Boolean scalar.
    Bool(bool),
    /// String scalar.
    String(String),
    /// Floating-point array.
    DoubleArray(Vec<f64>),
    /// Integer array.
    IntArray(Vec<i32>),
    /// Heterogeneous ordered list.
    List(Vec<Value>),
}

impl ResponseEnvelope {
    /// Name of the populated shape, used in diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            ResponseEnvelope::Double(_) => "double",
            ResponseEnvelope::Int(_) => "int",
            ResponseEnvelope::Bool(_) => "bool",
            ResponseEnvelope::String(_) => "string",
            ResponseEnvelope::DoubleArray(_) => "double[]",
            ResponseEnvelope::IntArray(_) => "int[]",
            ResponseEnvelope::List(_) => "list",
        }
    }
}

/// Conversion from a reply envelope into a caller-requested type.
pub trait FromResponse: Default + Sized {
    /// Human-readable name of the target type.
    const TYPE_NAME: &'static str;

    /// Converts the envelope, or `None` when the shape does not fit.
    fn from_response(response: &ResponseEnvelope) -> Option<Self>;

    /// Value for a command that produced no reply payload at all.
    fn from_empty() -> Option<Self> {
        None
    }
}

/// Lenient resolution: any mismatch (or a missing payload) yields `T::default()`.
pub fn resolve<T: FromResponse>(response: Option<&ResponseEnvelope>) -> T {
    match response {
        Some(envelope) => T::from_response(envelope),
        None => T::from_empty(),
    }
    .unwrap_or_default()
}

/// Strict resolution: a mismatch is reported instead of defaulted.
pub fn resolve_strict<T: FromResponse>(response: Option<&ResponseEnvelope>) -> Result<T> {
    match response {
        Some(envelope) => T::from_response(envelope).ok_or(MtApiError::ResponseMismatch {
            expected: T::TYPE_NAME,
            found: envelope.shape(),
        }),
        None => T::from_empty().ok_or(MtApiError::ResponseMismatch {
            expected: T::TYPE_NAME,
            found: "nothing",
        }),
    }
}

fn f64_to_i32(v: f64) -> Option<i32> {
    let rounded = v.round();
    if rounded.is_finite() && rounded >= i32::MIN as f64 && rounded <= i32::MAX as f64 {
        Some(rounded as i32)
    } else {
        None
    }
}

impl FromResponse for f64 {
    const TYPE_NAME: &'static str = "f64";

    fn from_response(response: &ResponseEnvelope) -> Option<Self> {
        match response {
            ResponseEnvelope::Double(v) => Some(*v),
            ResponseEnvelope::Int(v) => Some(*v as f64),
            ResponseEnvelope::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            ResponseEnvelope::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromResponse for i32 {
    const TYPE_NAME: &'static str = "i32";

    fn from_response(response: &ResponseEnvelope) -> Option<Self> {
        match response {
            ResponseEnvelope::Int(v) => Some(*v),
            ResponseEnvelope::Double(v) => f64_to_i32(*v),
            ResponseEnvelope::Bool(v) => Some(i32::from(*v)),
            ResponseEnvelope::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromResponse for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_response(response: &ResponseEnvelope) -> Option<Self> {
        match response {
            ResponseEnvelope::Bool(v) => Some(*v),
            ResponseEnvelope::Int(v) => Some(*v != 0),
            ResponseEnvelope::Double(v) => Some(*v != 0.0),
            ResponseEnvelope::String(s) => s.trim().to_ascii_lowercase().parse().ok(),
            _ => None,
        }
    }
}

impl FromResponse for String {
    const TYPE_NAME: &'static str = "String";

    fn from_response(response: &ResponseEnvelope) -> Option<Self> {
        match response {
            ResponseEnvelope::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromResponse for Vec<f64> {
    const TYPE_NAME: &'static str = "Vec<f64>";

    fn from_response(response: &ResponseEnvelope) -> Option<Self> {
        match response {
            ResponseEnvelope::DoubleArray(v) => Some(v.clone()),
            ResponseEnvelope::IntArray(v) => Some(v.iter().map(|x| *x as f64).collect()),
            _ => None,
        }
    }
}

impl FromResponse for Vec<i32> {
    const TYPE_NAME: &'static str = "Vec<i32>";

    fn from_response(response: &ResponseEnvelope) -> Option<Self> {
        match response {
            ResponseEnvelope::IntArray(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromResponse for Vec<Value> {
    const TYPE_NAME: &'static str = "Vec<Value>";

    fn from_response(response: &ResponseEnvelope) -> Option<Self> {
        match response {
            ResponseEnvelope::List(v) => Some(v.clone()),
            ResponseEnvelope::DoubleArray(v) => Some(v.iter().map(|x| Value::Double(*x)).collect()),
            ResponseEnvelope::IntArray(v) => Some(v.iter().map(|x| Value::Int(*x)).collect()),
            _ => None,
        }
    }
}

/// Operations executed only for their side effect accept any reply.
impl FromResponse for () {
    const TYPE_NAME: &'static str = "()";

    fn from_response(_response: &ResponseEnvelope) -> Option<Self> {
        Some(())
    }

    fn from_empty() -> Option<Self> {
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_passthrough() {
        let envelope = ResponseEnvelope::Double(1.2345);
        assert_eq!(resolve::<f64>(Some(&envelope)), 1.2345);
        assert_eq!(resolve_strict::<f64>(Some(&envelope)).unwrap(), 1.2345);
    }

    #[test]
    fn double_requested_as_string_defaults() {
        let envelope = ResponseEnvelope::Double(1.5);
        assert_eq!(resolve::<String>(Some(&envelope)), "");
        assert!(matches!(
            resolve_strict::<String>(Some(&envelope)),
            Err(MtApiError::ResponseMismatch { expected: "String", found: "double" })
        ));
        assert_eq!(resolve::<String>(Some(&ResponseEnvelope::Int(42))), "");
        assert_eq!(resolve::<String>(Some(&ResponseEnvelope::Bool(true))), "");
    }

    #[test]
    fn double_requested_as_int_array_defaults() {
        let envelope = ResponseEnvelope::Double(1.5);
        assert_eq!(resolve::<Vec<i32>>(Some(&envelope)), Vec::<i32>::new());
        assert!(matches!(
            resolve_strict::<Vec<i32>>(Some(&envelope)),
            Err(MtApiError::ResponseMismatch { expected: "Vec<i32>", found: "double" })
        ));
    }

    #[test]
    fn list_requested_as_string_defaults() {
        let envelope = ResponseEnvelope::List(vec![Value::Int(1)]);
        assert_eq!(resolve::<String>(Some(&envelope)), "");
        assert!(resolve_strict::<String>(Some(&envelope)).is_err());
    }

    #[test]
    fn scalar_coercions() {
        assert!(resolve::<bool>(Some(&ResponseEnvelope::Int(1))));
        assert!(!resolve::<bool>(Some(&ResponseEnvelope::Int(0))));
        assert_eq!(resolve::<i32>(Some(&ResponseEnvelope::Bool(true))), 1);
        assert_eq!(resolve::<i32>(Some(&ResponseEnvelope::Double(2.6))), 3);
        assert_eq!(resolve::<f64>(Some(&ResponseEnvelope::Int(7))), 7.0);
        assert_eq!(resolve::<i32>(Some(&ResponseEnvelope::String("17".into()))), 17);
        assert_eq!(resolve::<i32>(Some(&ResponseEnvelope::String("x".into()))), 0);
        assert_eq!(resolve::<i32>(Some(&ResponseEnvelope::Double(f64::NAN))), 0);
    }

    #[test]
    fn missing_payload() {
        assert_eq!(resolve::<f64>(None), 0.0);
        assert!(resolve_strict::<f64>(None).is_err());
        assert!(resolve_strict::<()>(None).is_ok());
    }

    #[test]
    fn arrays() {
        let ints = ResponseEnvelope::IntArray(vec![1, 2]);
        assert_eq!(resolve::<Vec<i32>>(Some(&ints)), vec![1, 2]);
        assert_eq!(resolve::<Vec<f64>>(Some(&ints)), vec![1.0, 2.0]);
        assert_eq!(
            resolve::<Vec<Value>>(Some(&ints)),
            vec![Value::Int(1), Value::Int(2)]
        );
        let doubles = ResponseEnvelope::DoubleArray(vec![0.5]);
        assert!(resolve::<Vec<i32>>(Some(&doubles)).is_empty());
    }
}
