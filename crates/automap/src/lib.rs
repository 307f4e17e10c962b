#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # automap
//!
//! Structural, name-based mapping between independently defined types.
//!
//! Given a source value and a destination type, the mapper copies data
//! field by field, matching fields by name and recursing into nested
//! structs, sequences and optionals. It is meant for converting between
//! type families that share field names but not identity, such as
//! external DTOs and internal domain types.
//!
//! ```
//! use automap::Mappable;
//!
//! #[derive(Mappable, Debug, Default)]
//! pub struct OrderDto {
//!     pub number: String,
//!     pub quantity: u32,
//! }
//!
//! #[derive(Mappable, Debug, Default)]
//! pub struct Order {
//!     pub number: String,
//!     pub quantity: u32,
//! }
//!
//! let dto = OrderDto { number: "PO-1".into(), quantity: 3 };
//! let order: Order = automap::map(&dto).unwrap();
//! assert_eq!(order.number, "PO-1");
//! assert_eq!(order.quantity, 3);
//! ```
//!
//! The default mode is strict: a destination field that has no
//! counterpart in the source is an error, so that renaming a field on
//! either side cannot silently drop data. Loose mapping leaves such fields
//! at their zero value instead.

// Derived impls name this crate as `::automap`, including inside it.
#[allow(unused_extern_crates)]
extern crate self as automap;

/// The `Mappable` capability and std/chrono implementations.
pub mod mappable;
/// Mapping options and their YAML loading.
pub mod options;
/// Field correspondence plans and the plan cache.
pub mod plan;
/// Recursive mapping runtime.
pub mod runtime;
/// Type descriptors.
pub mod shape;
/// Dynamic value trees.
pub mod value;

pub use automap_derive::Mappable;
pub use mappable::Mappable;
pub use options::{MapOptions, MatchMode};
pub use runtime::Mapper;
pub use shape::{FieldDef, Shape, ShapeKind};
pub use value::Value;

use std::fmt::Write as _;
use std::sync::LazyLock;
use thiserror::Error;

/// Errors that can occur during mapping
#[derive(Error, Debug)]
pub enum Error {
    #[error("Destination must be a non-null optional slot, found {found}")]
    InvalidDestination { found: &'static str },

    #[error("Source type {source_type} has no field `{field}` required by {dest_type}")]
    MissingSourceField {
        field: &'static str,
        dest_type: &'static str,
        source_type: &'static str,
    },

    #[error("Type mismatch: cannot map {source_type} into {dest_type}")]
    TypeMismatch {
        dest_type: &'static str,
        source_type: &'static str,
    },

    #[error("Incompatible element types: cannot map {source_element} into {dest_element}: {source}")]
    IncompatibleElementType {
        dest_element: &'static str,
        source_element: &'static str,
        source: Box<Error>,
    },

    #[error("Unsupported shape: cannot map {source_type} into {dest_type}")]
    UnsupportedShape {
        dest_type: &'static str,
        source_type: &'static str,
    },

    #[error("Recursion limit of {limit} exceeded")]
    DepthExceeded { limit: usize },

    #[error("Error mapping field `{field}` (destination {dest_type}, source {source_type}): {source}")]
    Field {
        field: &'static str,
        dest_type: &'static str,
        source_type: &'static str,
        source: Box<Error>,
    },

    #[error("Error mapping element {index}: {source}")]
    Element { index: usize, source: Box<Error> },

    #[error("Cannot rebuild {type_name}: {reason}")]
    Reconstruct {
        type_name: &'static str,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a type mismatch error between two shapes
    pub fn type_mismatch(dest: &Shape, source: &Shape) -> Self {
        Self::TypeMismatch {
            dest_type: dest.name(),
            source_type: source.name(),
        }
    }

    /// Build a reconstruct error for target type `T`
    pub fn reconstruct<T: ?Sized>(reason: impl Into<String>) -> Self {
        Self::Reconstruct {
            type_name: std::any::type_name::<T>(),
            reason: reason.into(),
        }
    }

    /// The innermost error below the field and element context wrappers
    pub fn root_cause(&self) -> &Error {
        let mut current = self;
        while let Self::Field { source, .. } | Self::Element { source, .. } = current {
            current = &**source;
        }
        current
    }

    /// Path from the mapping root to the failure, e.g. `parents[1].children[0].foo`.
    ///
    /// Empty when the failure happened at the root.
    #[must_use]
    pub fn path(&self) -> String {
        let mut path = String::new();
        let mut current = self;
        loop {
            match current {
                Self::Field { field, source, .. } => {
                    if !path.is_empty() {
                        path.push('.');
                    }
                    path.push_str(field);
                    current = &**source;
                }
                Self::Element { index, source } => {
                    let _ = write!(path, "[{index}]");
                    current = &**source;
                }
                _ => return path,
            }
        }
    }
}

/// Crate-local result type for mapping operations.
pub type Result<T> = std::result::Result<T, Error>;

static STRICT: LazyLock<Mapper> = LazyLock::new(Mapper::new);
static LOOSE: LazyLock<Mapper> = LazyLock::new(|| Mapper::with_options(MapOptions::loose()));

/// Map `source` into a new `D` in strict mode
pub fn map<D: Mappable, S: Mappable>(source: &S) -> Result<D> {
    STRICT.map(source)
}

/// Map `source` into an existing `D` in strict mode, keeping fields the
/// mapper does not see
pub fn map_into<S: Mappable, D: Mappable>(source: &S, dest: &mut D) -> Result<()> {
    STRICT.map_into(source, dest)
}

/// Map `source` into a new `D`, leaving unmatched fields at their zero value
pub fn map_loose<D: Mappable, S: Mappable>(source: &S) -> Result<D> {
    LOOSE.map(source)
}

/// Map `source` into an existing `D`, leaving unmatched fields at their zero value
pub fn map_loose_into<S: Mappable, D: Mappable>(source: &S, dest: &mut D) -> Result<()> {
    LOOSE.map_into(source, dest)
}

/// Map `source` into a new `D` in strict mode.
///
/// # Panics
///
/// Panics with the rendered error if mapping fails. Meant for callers
/// that treat a mapping failure as a programming error.
#[track_caller]
pub fn must_map<D: Mappable, S: Mappable>(source: &S) -> D {
    match map(source) {
        Ok(dest) => dest,
        Err(err) => panic!("{err}"),
    }
}

/// Map `source` into an existing `D` in strict mode.
///
/// # Panics
///
/// Panics with the rendered error if mapping fails.
#[track_caller]
pub fn must_map_into<S: Mappable, D: Mappable>(source: &S, dest: &mut D) {
    if let Err(err) = map_into(source, dest) {
        panic!("{err}");
    }
}
