//! Type tags passed alongside every conversion.

use std::fmt;

/// Describes what a converter is being asked to encode or decode.
///
/// Tags are built from Rust types at compile time, so callers never spell
/// type names by hand.
///
/// ```
/// use stowage_convert::TypeTag;
///
/// let tag = TypeTag::list_of::<u32>();
/// assert!(tag.is_list());
/// assert_eq!(tag.type_name(), "u32");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// A single value of the named type.
    Value { type_name: &'static str },
    /// An ordered list whose elements are of the named type.
    ListOf { element: &'static str },
}

impl TypeTag {
    /// Tag for a single `T`.
    pub fn value<T: ?Sized>() -> Self {
        Self::Value {
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Tag for a list of `T`.
    pub fn list_of<T: ?Sized>() -> Self {
        Self::ListOf {
            element: std::any::type_name::<T>(),
        }
    }

    /// Returns `true` for [`TypeTag::ListOf`].
    pub fn is_list(&self) -> bool {
        matches!(self, Self::ListOf { .. })
    }

    /// The scalar type name, or the element type name for lists.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Value { type_name } => type_name,
            Self::ListOf { element } => element,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value { type_name } => write!(f, "{type_name}"),
            Self::ListOf { element } => write!(f, "list of {element}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_and_list_tags_differ() {
        assert_ne!(TypeTag::value::<String>(), TypeTag::list_of::<String>());
        assert!(!TypeTag::value::<String>().is_list());
        assert!(TypeTag::list_of::<String>().is_list());
    }

    #[test]
    fn display() {
        assert_eq!(TypeTag::value::<u8>().to_string(), "u8");
        assert_eq!(TypeTag::list_of::<u8>().to_string(), "list of u8");
    }
}
