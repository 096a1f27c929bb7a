//! Static description of type shapes.
//!
//! `proptag` holds the immutable, declarative view of a type that the
//! introspection engine works on: the physical storage locations a type
//! declares, the logical properties exposed by the delegate metadata
//! facility, markers, and the parameterized supertype chain. Types are
//! registered once in a [`types::ShapeRegistry`] and referred to through
//! stable [`types::ShapeRef`] handles afterwards.

pub mod tag;
pub mod types;

pub use tag::{TagHead, TypeTag};
pub use types::{
    MarkerSetRef, ShapeRef, ShapeRegistry,
    expr::{TypeExpr, TypeParam},
    shape::{FieldFlags, FieldShape, Marker, PropertyShape, TypeShape},
};
