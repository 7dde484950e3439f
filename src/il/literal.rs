use std::fmt::{self, Display, Formatter};

use thiserror::Error;

use crate::types::{BuiltinTypes, Modifiers, Primitive, TypeId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("cannot compare a {0} with a {1}")]
    Incomparable(&'static str, &'static str),
}

/// An immutable constant.
#[derive(Debug, Clone)]
pub enum Value {
    Boolean(bool),
    Code(char),
    Byte(i8),
    UByte(u8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Long(i64),
    ULong(u64),
    Float(f32),
    Double(f64),
    String(String),
    Null,
}
impl Value {
    pub fn primitive(&self) -> Option<Primitive> {
        Some(match self {
            Value::Boolean(_) => Primitive::Boolean,
            Value::Code(_) => Primitive::Code,
            Value::Byte(_) => Primitive::Byte,
            Value::UByte(_) => Primitive::UByte,
            Value::Short(_) => Primitive::Short,
            Value::UShort(_) => Primitive::UShort,
            Value::Int(_) => Primitive::Int,
            Value::UInt(_) => Primitive::UInt,
            Value::Long(_) => Primitive::Long,
            Value::ULong(_) => Primitive::ULong,
            Value::Float(_) => Primitive::Float,
            Value::Double(_) => Primitive::Double,
            Value::String(_) | Value::Null => return None,
        })
    }

    /// The type a value of this kind has when it appears without an explicit type.
    pub fn natural_type(&self, builtins: &BuiltinTypes) -> TypeId {
        match (self.primitive(), self) {
            (Some(primitive), _) => builtins.primitive(primitive),
            (None, Value::String(_)) => builtins.string(),
            (None, _) => builtins.object(),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Value::String(_) => "String",
            Value::Null => "null",
            other => other.primitive().map(Primitive::name).unwrap_or("value"),
        }
    }

    /// Compare two values. Values of different kinds cannot be compared, except that `null`
    /// compares (unequal) with strings.
    pub fn try_equals(&self, other: &Value) -> Result<bool, ValueError> {
        use Value::*;
        Ok(match (self, other) {
            (Boolean(a), Boolean(b)) => a == b,
            (Code(a), Code(b)) => a == b,
            (Byte(a), Byte(b)) => a == b,
            (UByte(a), UByte(b)) => a == b,
            (Short(a), Short(b)) => a == b,
            (UShort(a), UShort(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (UInt(a), UInt(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (ULong(a), ULong(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Double(a), Double(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Null, Null) => true,
            (Null, String(_)) | (String(_), Null) => false,
            (a, b) => return Err(ValueError::Incomparable(a.kind_name(), b.kind_name())),
        })
    }
}
impl Display for Value {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Code(c) => write!(f, "{:?}", c),
            Value::Byte(v) => write!(f, "{}y", v),
            Value::UByte(v) => write!(f, "{}uy", v),
            Value::Short(v) => write!(f, "{}s", v),
            Value::UShort(v) => write!(f, "{}us", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}u", v),
            Value::Long(v) => write!(f, "{}L", v),
            Value::ULong(v) => write!(f, "{}uL", v),
            Value::Float(v) => write!(f, "{}f", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Null => f.write_str("null"),
        }
    }
}

/// A constant value together with its resolved type and modifiers.
#[derive(Debug, Clone)]
pub struct Literal {
    pub value: Value,
    pub ty: TypeId,
    pub modifiers: Modifiers,
}
/// Literals are equal when their values are. Values that cannot be compared are unequal.
impl PartialEq for Literal {
    fn eq(&self, other: &Literal) -> bool {
        self.value.try_equals(&other.value).unwrap_or(false)
    }
}
impl Display for Literal {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}{}", self.modifiers, self.value)
    }
}
