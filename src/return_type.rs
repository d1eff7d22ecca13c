// Return type masks for static and dynamic shape checks

use std::fmt;
use std::ops::BitOr;

/// A bitmask over the value shapes an operation may produce.
///
/// Declared once per operation and used two ways: the bind-time validator
/// intersects a child's declared mask with the expected mask for its
/// argument position, and error messages render the mask for the reader.
///
/// `OBJECT` doubles as the dynamic marker: constants and accessors only
/// know their shape at runtime, so they declare `OBJECT` and the static
/// check is skipped in favor of a runtime re-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReturnType(u8);

impl ReturnType {
    pub const BOOLEAN: ReturnType = ReturnType(1);
    pub const NUMBER: ReturnType = ReturnType(1 << 1);
    pub const OBJECT: ReturnType = ReturnType(1 << 2);
    pub const STRING: ReturnType = ReturnType(1 << 3);
    pub const ARRAY: ReturnType = ReturnType(1 << 4);

    /// True when the two masks share at least one shape.
    #[inline]
    pub fn intersects(self, other: ReturnType) -> bool {
        self.0 & other.0 != 0
    }

    /// True when every shape in `other` is also in `self`.
    #[inline]
    pub fn includes(self, other: ReturnType) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ReturnType {
    type Output = ReturnType;

    #[inline]
    fn bitor(self, rhs: ReturnType) -> ReturnType {
        ReturnType(self.0 | rhs.0)
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(ReturnType, &str); 5] = [
            (ReturnType::ARRAY, "array"),
            (ReturnType::STRING, "string"),
            (ReturnType::OBJECT, "object"),
            (ReturnType::NUMBER, "number"),
            (ReturnType::BOOLEAN, "boolean"),
        ];
        let mut first = true;
        for (mask, name) in NAMES {
            if self.intersects(mask) {
                if !first {
                    write!(f, " or ")?;
                }
                write!(f, "{}", name)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_and_intersection() {
        let mask = ReturnType::ARRAY | ReturnType::STRING;
        assert!(mask.intersects(ReturnType::ARRAY));
        assert!(mask.intersects(ReturnType::STRING));
        assert!(!mask.intersects(ReturnType::NUMBER));
        assert!(mask.includes(ReturnType::ARRAY));
        assert!(!mask.includes(ReturnType::ARRAY | ReturnType::NUMBER));
    }

    #[test]
    fn test_display() {
        assert_eq!(ReturnType::NUMBER.to_string(), "number");
        assert_eq!(
            (ReturnType::ARRAY | ReturnType::STRING).to_string(),
            "array or string"
        );
    }
}
