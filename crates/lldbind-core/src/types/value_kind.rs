//! Value and type classifications reported by the engine.

use std::fmt;

/// Where a value lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ValueType
{
    Invalid = 0,
    VariableGlobal = 1,
    VariableStatic = 2,
    VariableArgument = 3,
    VariableLocal = 4,
    Register = 5,
    RegisterSet = 6,
    ConstantResult = 7,
}

impl ValueType
{
    #[must_use]
    pub fn from_raw(raw: i32) -> Self
    {
        match raw {
            1 => ValueType::VariableGlobal,
            2 => ValueType::VariableStatic,
            3 => ValueType::VariableArgument,
            4 => ValueType::VariableLocal,
            5 => ValueType::Register,
            6 => ValueType::RegisterSet,
            7 => ValueType::ConstantResult,
            _ => ValueType::Invalid,
        }
    }

    #[must_use]
    pub fn raw(self) -> i32
    {
        self as i32
    }

    #[must_use]
    pub fn name(self) -> &'static str
    {
        match self {
            ValueType::Invalid => "invalid",
            ValueType::VariableGlobal => "global",
            ValueType::VariableStatic => "static",
            ValueType::VariableArgument => "argument",
            ValueType::VariableLocal => "local",
            ValueType::Register => "register",
            ValueType::RegisterSet => "register set",
            ValueType::ConstantResult => "constant result",
        }
    }
}

impl fmt::Display for ValueType
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.name())
    }
}

/// Builtin scalar type classification
///
/// Values follow the engine's `BasicType` enumeration (0 through 31).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum BasicType
{
    Invalid = 0,
    Void = 1,
    Char = 2,
    SignedChar = 3,
    UnsignedChar = 4,
    WChar = 5,
    SignedWChar = 6,
    UnsignedWChar = 7,
    Char16 = 8,
    Char32 = 9,
    Short = 10,
    UnsignedShort = 11,
    Int = 12,
    UnsignedInt = 13,
    Long = 14,
    UnsignedLong = 15,
    LongLong = 16,
    UnsignedLongLong = 17,
    Int128 = 18,
    UnsignedInt128 = 19,
    Bool = 20,
    Half = 21,
    Float = 22,
    Double = 23,
    LongDouble = 24,
    FloatComplex = 25,
    DoubleComplex = 26,
    LongDoubleComplex = 27,
    ObjCId = 28,
    ObjCClass = 29,
    ObjCSel = 30,
    NullPtr = 31,
}

impl BasicType
{
    const ORDERED: [BasicType; 32] = [
        BasicType::Invalid,
        BasicType::Void,
        BasicType::Char,
        BasicType::SignedChar,
        BasicType::UnsignedChar,
        BasicType::WChar,
        BasicType::SignedWChar,
        BasicType::UnsignedWChar,
        BasicType::Char16,
        BasicType::Char32,
        BasicType::Short,
        BasicType::UnsignedShort,
        BasicType::Int,
        BasicType::UnsignedInt,
        BasicType::Long,
        BasicType::UnsignedLong,
        BasicType::LongLong,
        BasicType::UnsignedLongLong,
        BasicType::Int128,
        BasicType::UnsignedInt128,
        BasicType::Bool,
        BasicType::Half,
        BasicType::Float,
        BasicType::Double,
        BasicType::LongDouble,
        BasicType::FloatComplex,
        BasicType::DoubleComplex,
        BasicType::LongDoubleComplex,
        BasicType::ObjCId,
        BasicType::ObjCClass,
        BasicType::ObjCSel,
        BasicType::NullPtr,
    ];

    #[must_use]
    pub fn from_raw(raw: i32) -> Self
    {
        usize::try_from(raw)
            .ok()
            .and_then(|idx| Self::ORDERED.get(idx).copied())
            .unwrap_or(BasicType::Invalid)
    }

    #[must_use]
    pub fn raw(self) -> i32
    {
        self as i32
    }

    /// The C spelling of the type, e.g. `"unsigned long long"`.
    #[must_use]
    pub fn name(self) -> &'static str
    {
        match self {
            BasicType::Invalid => "invalid",
            BasicType::Void => "void",
            BasicType::Char => "char",
            BasicType::SignedChar => "signed char",
            BasicType::UnsignedChar => "unsigned char",
            BasicType::WChar => "wchar_t",
            BasicType::SignedWChar => "signed wchar_t",
            BasicType::UnsignedWChar => "unsigned wchar_t",
            BasicType::Char16 => "char16_t",
            BasicType::Char32 => "char32_t",
            BasicType::Short => "short",
            BasicType::UnsignedShort => "unsigned short",
            BasicType::Int => "int",
            BasicType::UnsignedInt => "unsigned int",
            BasicType::Long => "long",
            BasicType::UnsignedLong => "unsigned long",
            BasicType::LongLong => "long long",
            BasicType::UnsignedLongLong => "unsigned long long",
            BasicType::Int128 => "__int128",
            BasicType::UnsignedInt128 => "unsigned __int128",
            BasicType::Bool => "bool",
            BasicType::Half => "half",
            BasicType::Float => "float",
            BasicType::Double => "double",
            BasicType::LongDouble => "long double",
            BasicType::FloatComplex => "float complex",
            BasicType::DoubleComplex => "double complex",
            BasicType::LongDoubleComplex => "long double complex",
            BasicType::ObjCId => "id",
            BasicType::ObjCClass => "Class",
            BasicType::ObjCSel => "SEL",
            BasicType::NullPtr => "nullptr_t",
        }
    }

    /// Reverse of [`BasicType::name`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self>
    {
        Self::ORDERED.into_iter().find(|basic| basic.name() == name)
    }
}

impl fmt::Display for BasicType
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_basic_type_table_is_dense()
    {
        for raw in 0..32 {
            assert_eq!(BasicType::from_raw(raw).raw(), raw);
        }
        assert_eq!(BasicType::from_raw(32), BasicType::Invalid);
        assert_eq!(BasicType::from_raw(-1), BasicType::Invalid);
    }

    #[test]
    fn test_basic_type_names()
    {
        assert_eq!(BasicType::from_name("int"), Some(BasicType::Int));
        assert_eq!(BasicType::NullPtr.to_string(), "nullptr_t");
        assert_eq!(BasicType::from_name("struct point"), None);
    }

    #[test]
    fn test_value_type_names()
    {
        assert_eq!(ValueType::from_raw(4).name(), "local");
        assert_eq!(ValueType::from_raw(42), ValueType::Invalid);
    }
}
