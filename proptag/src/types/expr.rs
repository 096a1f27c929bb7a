//! Declared type expressions
//!
//! A [`TypeExpr`] is the type of a field, property or supertype exactly as it
//! was declared, before any placeholder has been substituted. Placeholders
//! ([`TypeExpr::Param`]) are bound by the [`TypeParam`]s of the declaring type.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::EnumIs;

/// A type expression as written at the declaration site.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TypeExpr {
    /// A named type, possibly parameterized: `Map<String, List<T>>`.
    Named { name: String, args: Vec<TypeExpr> },

    /// A placeholder bound by a type parameter of the declaring type (or of
    /// one of its ancestors, through the supertype chain).
    Param(String),

    /// An array whose element type is itself an expression: `T[]`.
    Array(Box<TypeExpr>),

    /// A use-site wildcard: `? extends A` (upper) or `? super B` (lower).
    Wildcard {
        upper: Vec<TypeExpr>,
        lower: Vec<TypeExpr>,
    },
}

impl TypeExpr {
    /// A non-generic named type.
    pub fn simple(name: impl Into<String>) -> Self {
        TypeExpr::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A named type applied to the given arguments.
    pub fn named(name: impl Into<String>, args: impl IntoIterator<Item = TypeExpr>) -> Self {
        TypeExpr::Named {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }

    /// A placeholder reference.
    pub fn param(name: impl Into<String>) -> Self {
        TypeExpr::Param(name.into())
    }

    /// An array of `elem`.
    pub fn array(elem: TypeExpr) -> Self {
        TypeExpr::Array(Box::new(elem))
    }

    /// The unbounded wildcard `?`.
    pub fn wildcard() -> Self {
        TypeExpr::Wildcard {
            upper: Vec::new(),
            lower: Vec::new(),
        }
    }

    /// The wildcard `? extends bound`.
    pub fn extends(bound: TypeExpr) -> Self {
        TypeExpr::Wildcard {
            upper: vec![bound],
            lower: Vec::new(),
        }
    }

    /// The wildcard `? super bound`.
    pub fn super_of(bound: TypeExpr) -> Self {
        TypeExpr::Wildcard {
            upper: Vec::new(),
            lower: vec![bound],
        }
    }

    /// Returns the raw (erased) name of a named type.
    pub fn raw_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns the type arguments of a named type, or an empty slice.
    pub fn args(&self) -> &[TypeExpr] {
        match self {
            TypeExpr::Named { args, .. } => args,
            _ => &[],
        }
    }
}

impl std::fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeExpr::Named { name, args } => {
                write!(f, "{}", name)?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeExpr::Param(name) => write!(f, "{}", name),
            TypeExpr::Array(elem) => write!(f, "{}[]", elem),
            TypeExpr::Wildcard { upper, lower } => {
                if let Some(lower) = lower.first() {
                    write!(f, "? super {}", lower)
                } else if let Some(upper) = upper.first() {
                    write!(f, "? extends {}", upper)
                } else {
                    write!(f, "?")
                }
            }
        }
    }
}

/// A type parameter declared by a generic type: `T : Comparable<T>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TypeParam {
    pub name: String,
    pub bounds: Vec<TypeExpr>,
}

impl TypeParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bounds: Vec::new(),
        }
    }

    /// Adds an upper bound to this parameter.
    pub fn bounded_by(mut self, bound: TypeExpr) -> Self {
        self.bounds.push(bound);
        self
    }
}

impl From<&str> for TypeParam {
    fn from(value: &str) -> Self {
        TypeParam::new(value)
    }
}

impl From<String> for TypeParam {
    fn from(value: String) -> Self {
        TypeParam::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_nested_generics() {
        let expr = TypeExpr::named(
            "Map",
            [
                TypeExpr::simple("String"),
                TypeExpr::named("List", [TypeExpr::param("T")]),
            ],
        );
        assert_eq!(expr.to_string(), "Map<String, List<T>>");
        assert_eq!(TypeExpr::array(TypeExpr::param("T")).to_string(), "T[]");
        assert_eq!(
            TypeExpr::super_of(TypeExpr::simple("Int")).to_string(),
            "? super Int"
        );
    }

    #[test]
    fn raw_name_only_for_named() {
        assert_eq!(TypeExpr::simple("Int").raw_name(), Some("Int"));
        assert_eq!(TypeExpr::param("T").raw_name(), None);
        assert!(TypeExpr::param("T").args().is_empty());
    }
}
