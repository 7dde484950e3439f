use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

/// A built-in scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    /// A character code point.
    Code,
    Byte,
    UByte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
}
impl Primitive {
    pub const ALL: [Primitive; 12] = [
        Primitive::Boolean,
        Primitive::Code,
        Primitive::Byte,
        Primitive::UByte,
        Primitive::Short,
        Primitive::UShort,
        Primitive::Int,
        Primitive::UInt,
        Primitive::Long,
        Primitive::ULong,
        Primitive::Float,
        Primitive::Double,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Code => "code",
            Primitive::Byte => "byte",
            Primitive::UByte => "ubyte",
            Primitive::Short => "short",
            Primitive::UShort => "ushort",
            Primitive::Int => "int",
            Primitive::UInt => "uint",
            Primitive::Long => "long",
            Primitive::ULong => "ulong",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    /// Width in bits.
    pub fn width(self) -> u32 {
        match self {
            Primitive::Boolean => 1,
            Primitive::Byte | Primitive::UByte => 8,
            Primitive::Short | Primitive::UShort => 16,
            Primitive::Code | Primitive::Int | Primitive::UInt | Primitive::Float => 32,
            Primitive::Long | Primitive::ULong | Primitive::Double => 64,
        }
    }
}
impl Display for Primitive {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
impl FromStr for Primitive {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Primitive::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for primitive in Primitive::ALL {
            assert_eq!(Ok(primitive), primitive.name().parse());
        }
        assert_eq!(Err(()), "integer".parse::<Primitive>());
    }

    #[test]
    fn widths_match_the_scalar_sizes() {
        assert_eq!(1, Primitive::Boolean.width());
        assert_eq!(16, Primitive::UShort.width());
        assert_eq!(32, Primitive::Code.width());
        assert_eq!(64, Primitive::Double.width());
        assert!(Primitive::ALL.iter().all(|p| p.width() <= 64));
    }
}
