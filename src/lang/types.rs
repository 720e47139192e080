use std::fmt;

/// Semantic type of a declaration or expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Boolean,
    IntArray,
    String,
    StringArray,
    Void,
    /// A user-declared class, by name.
    Class(String),
}

impl Type {
    /// Parse a type name as written in declarations.
    ///
    /// Anything that is not a built-in spelling names a class.
    pub fn from_name(name: &str) -> Self {
        match name {
            "int" => Type::Int,
            "boolean" => Type::Boolean,
            "int[]" => Type::IntArray,
            "String" => Type::String,
            "String[]" => Type::StringArray,
            "void" => Type::Void,
            other => Type::Class(other.to_string()),
        }
    }

    /// Built-in types need no class declaration to be valid.
    pub fn is_literal(&self) -> bool {
        !matches!(self, Type::Class(_))
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            Type::Class(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Boolean => write!(f, "boolean"),
            Type::IntArray => write!(f, "int[]"),
            Type::String => write!(f, "String"),
            Type::StringArray => write!(f, "String[]"),
            Type::Void => write!(f, "void"),
            Type::Class(name) => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for name in ["int", "boolean", "int[]", "String", "String[]", "void", "Fac"] {
            assert_eq!(Type::from_name(name).to_string(), name);
        }
    }

    #[test]
    fn test_literal_types() {
        assert!(Type::Int.is_literal());
        assert!(Type::IntArray.is_literal());
        assert!(!Type::Class("Fac".to_string()).is_literal());
    }
}
