//! Resolved type descriptors
//!
//! A [`TypeTag`] is the resolved counterpart of a [`crate::TypeExpr`]: every
//! placeholder has been substituted with a concrete argument, except where
//! resolution hit a cycle or an unbound placeholder, in which case the
//! placeholder survives as a clearly marked [`TagHead::Unresolved`] leaf.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::EnumIs;

/// The node of a [`TypeTag`] tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TagHead {
    /// A concrete named type. Children are its type arguments.
    Named(String),
    /// An array. The only child is the element type.
    Array,
    /// A placeholder that could not be substituted.
    Unresolved(String),
}

/// A concrete type together with its resolved type arguments.
///
/// Equality is structural: two tags are equal iff their heads and all their
/// children are recursively equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TypeTag {
    pub head: TagHead,
    pub args: Vec<TypeTag>,
}

impl TypeTag {
    /// A non-generic concrete type.
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            head: TagHead::Named(name.into()),
            args: Vec::new(),
        }
    }

    /// A concrete type applied to resolved arguments.
    ///
    /// ```rust
    /// # use proptag::TypeTag;
    /// let tag = TypeTag::new("List", [TypeTag::simple("Int")]);
    /// assert_eq!(tag.to_string(), "List<Int>");
    /// ```
    pub fn new(name: impl Into<String>, args: impl IntoIterator<Item = TypeTag>) -> Self {
        Self {
            head: TagHead::Named(name.into()),
            args: args.into_iter().collect(),
        }
    }

    pub fn array(elem: TypeTag) -> Self {
        Self {
            head: TagHead::Array,
            args: vec![elem],
        }
    }

    pub fn unresolved(placeholder: impl Into<String>) -> Self {
        Self {
            head: TagHead::Unresolved(placeholder.into()),
            args: Vec::new(),
        }
    }

    /// Returns the concrete type name, `None` for arrays and unresolved leaves.
    pub fn name(&self) -> Option<&str> {
        match &self.head {
            TagHead::Named(name) => Some(name),
            _ => None,
        }
    }

    /// Returns `true` if no [`TagHead::Unresolved`] leaf occurs anywhere in the tree.
    pub fn is_fully_resolved(&self) -> bool {
        !self.head.is_unresolved() && self.args.iter().all(TypeTag::is_fully_resolved)
    }

    /// Collects the names of every unresolved placeholder, in tree order.
    pub fn unresolved_placeholders(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_unresolved(&mut out);
        out
    }

    fn collect_unresolved<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let TagHead::Unresolved(name) = &self.head {
            out.push(name);
        }
        for arg in &self.args {
            arg.collect_unresolved(out);
        }
    }

    /// Depth of the deepest path from this node to a leaf (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        1 + self.args.iter().map(TypeTag::depth).max().unwrap_or(0)
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.head {
            TagHead::Array => match self.args.first() {
                Some(elem) => write!(f, "{}[]", elem),
                None => write!(f, "[]"),
            },
            TagHead::Unresolved(name) => write!(f, "?{}", name),
            TagHead::Named(name) => {
                write!(f, "{}", name)?;
                if let Some((first, rest)) = self.args.split_first() {
                    write!(f, "<{}", first)?;
                    for arg in rest {
                        write!(f, ", {}", arg)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
        }
    }
}
