use serde::{Deserialize, Serialize};

/// A value crossing the boundary to the embedded runtime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Pass-by-reference cell: a method or routine may overwrite its value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IrisRef {
    value: Value,
}

impl IrisRef {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn set(&mut self, value: impl Into<Value>) {
        self.value = value.into();
    }

    pub fn into_inner(self) -> Value {
        self.value
    }
}

/// Argument to a class method or routine call.
#[derive(Debug)]
pub enum Arg<'a> {
    Val(Value),
    /// Output or in/out parameter.
    Ref(&'a mut IrisRef),
}

impl<'a> Arg<'a> {
    pub fn val(v: impl Into<Value>) -> Self {
        Arg::Val(v.into())
    }

    pub fn by_ref(r: &'a mut IrisRef) -> Self {
        Arg::Ref(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(Value::from(3), Value::Int(3));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert!(Value::from(None::<i64>).is_null());
        assert_eq!(Value::from(true).as_i64(), Some(1));
    }

    #[test]
    fn test_iris_ref_is_writable() {
        let mut r = IrisRef::new(0);
        {
            let arg = Arg::by_ref(&mut r);
            if let Arg::Ref(cell) = arg {
                cell.set("out");
            }
        }
        assert_eq!(r.into_inner(), Value::Str("out".into()));
    }
}
