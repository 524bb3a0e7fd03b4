//! Numeric element kinds of attribute arrays.

use std::fmt;

/// Element kind of a [`DataArray`](crate::dataset::DataArray).
///
/// Mirrors the typed-array kinds understood by the web viewer, plus the
/// 64-bit integer kinds (narrowed on export) and bit-packed booleans
/// (not exportable).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ArrayKind {
    /// Packed booleans, 8 per byte
    Bit = 0,
    /// Signed 8-bit integer
    Int8 = 1,
    /// Unsigned 8-bit integer
    Uint8 = 2,
    /// Signed 16-bit integer
    Int16 = 3,
    /// Unsigned 16-bit integer
    Uint16 = 4,
    /// Signed 32-bit integer
    Int32 = 5,
    /// Unsigned 32-bit integer
    Uint32 = 6,
    /// Signed 64-bit integer
    Int64 = 7,
    /// Unsigned 64-bit integer
    Uint64 = 8,
    /// 32-bit floating point
    Float32 = 9,
    /// 64-bit floating point
    Float64 = 10,
}

impl ArrayKind {
    /// Size in bytes of one element. Bit arrays report 0.
    #[inline]
    pub const fn num_bytes(self) -> usize {
        match self {
            Self::Bit => 0,
            Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
            Self::Int64 | Self::Uint64 | Self::Float64 => 8,
        }
    }

    /// Kind actually stored in an exported blob.
    ///
    /// 64-bit integers become 32-bit; `None` for bit arrays.
    #[inline]
    pub const fn stored(self) -> Option<Self> {
        match self {
            Self::Bit => None,
            Self::Int64 => Some(Self::Int32),
            Self::Uint64 => Some(Self::Uint32),
            other => Some(other),
        }
    }

    /// True when export narrows this kind.
    #[inline]
    pub const fn needs_narrowing(self) -> bool {
        matches!(self, Self::Int64 | Self::Uint64)
    }

    /// Short name used in blob identifiers and `dataType` fields.
    ///
    /// Reports the name of the stored kind, so `Int64` yields `"Int32"`.
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Bit => "Bit",
            Self::Int8 => "Int8",
            Self::Uint8 => "Uint8",
            Self::Int16 => "Int16",
            Self::Uint16 => "Uint16",
            Self::Int32 | Self::Int64 => "Int32",
            Self::Uint32 | Self::Uint64 => "Uint32",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
        }
    }

    /// JavaScript typed-array name, e.g. `Float32Array`.
    pub fn js_array_name(self) -> String {
        format!("{}Array", self.short_name())
    }

    /// Returns true if this is an integer type.
    #[inline]
    pub const fn is_integer(self) -> bool {
        !matches!(self, Self::Bit | Self::Float32 | Self::Float64)
    }
}

impl fmt::Display for ArrayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int64 => "Int64",
            Self::Uint64 => "Uint64",
            other => other.short_name(),
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_kind() {
        assert_eq!(ArrayKind::Int64.stored(), Some(ArrayKind::Int32));
        assert_eq!(ArrayKind::Uint64.stored(), Some(ArrayKind::Uint32));
        assert_eq!(ArrayKind::Float64.stored(), Some(ArrayKind::Float64));
        assert_eq!(ArrayKind::Bit.stored(), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(ArrayKind::Float32.js_array_name(), "Float32Array");
        assert_eq!(ArrayKind::Int64.short_name(), "Int32");
        assert_eq!(ArrayKind::Int64.to_string(), "Int64");
        assert_eq!(ArrayKind::Uint8.num_bytes(), 1);
    }
}
