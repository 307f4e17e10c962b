//! Type descriptors used to drive structural mapping
#![allow(clippy::must_use_candidate)] // Descriptor accessors are clear at call sites without #[must_use].

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use crate::mappable::Mappable;
use crate::value::Value;

/// Runtime descriptor of a mappable type.
///
/// A `Shape` records the identity of a type, its name for diagnostics, and
/// its structural kind. Cloning is cheap.
#[derive(Clone)]
pub struct Shape(Arc<ShapeDef>);

struct ShapeDef {
    id: TypeId,
    name: &'static str,
    kind: ShapeKind,
}

/// Structural classification of a type
#[derive(Clone)]
pub enum ShapeKind {
    /// Copied as a whole, only between identical types
    Atomic {
        /// Builds the zero value of the type
        zero: fn() -> Value,
    },

    /// Record with named, exported fields
    Struct {
        /// Exported fields in declaration order
        fields: Vec<FieldDef>,
    },

    /// Nullable indirection (`Option<T>`)
    Optional {
        /// Shape of the pointee
        element: fn() -> Shape,
    },

    /// Ordered sequence (`Vec<T>`)
    Sequence {
        /// Shape of every element
        element: fn() -> Shape,
    },

    /// Never decomposed; only identical types can be copied
    Unsupported {
        /// Builds the zero value of the type
        zero: fn() -> Value,
    },
}

/// Descriptor of one exported struct field
#[derive(Clone)]
pub struct FieldDef {
    name: &'static str,
    embedded: bool,
    shape: fn() -> Shape,
}

impl FieldDef {
    /// Describe a field. The field shape is resolved lazily so that
    /// self-referential types can be described.
    pub const fn new(name: &'static str, embedded: bool, shape: fn() -> Shape) -> Self {
        Self {
            name,
            embedded,
            shape,
        }
    }

    /// Field name used for matching
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the field's own fields are promoted into the parent
    pub fn is_embedded(&self) -> bool {
        self.embedded
    }

    /// Resolve the field's shape
    pub fn shape(&self) -> Shape {
        (self.shape)()
    }
}

impl fmt::Debug for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("embedded", &self.embedded)
            .finish()
    }
}

fn zero_of<T: Mappable + Default>() -> Value {
    T::default().to_value()
}

impl Shape {
    fn new<T: 'static>(kind: ShapeKind) -> Self {
        Self(Arc::new(ShapeDef {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind,
        }))
    }

    /// Describe an atomic type whose zero value is `T::default()`
    pub fn atomic<T: Mappable + Default>() -> Self {
        Self::new::<T>(ShapeKind::Atomic { zero: zero_of::<T> })
    }

    /// Describe a type that is only ever copied between identical types
    pub fn unsupported<T: Mappable + Default>() -> Self {
        Self::new::<T>(ShapeKind::Unsupported { zero: zero_of::<T> })
    }

    /// Describe a struct by its exported fields
    pub fn structure<T: 'static>(fields: Vec<FieldDef>) -> Self {
        Self::new::<T>(ShapeKind::Struct { fields })
    }

    /// Describe an optional whose pointee has the given shape
    pub fn optional<T: 'static>(element: fn() -> Shape) -> Self {
        Self::new::<T>(ShapeKind::Optional { element })
    }

    /// Describe a sequence whose elements have the given shape
    pub fn sequence<T: 'static>(element: fn() -> Shape) -> Self {
        Self::new::<T>(ShapeKind::Sequence { element })
    }

    /// Identity of the described type
    pub fn id(&self) -> TypeId {
        self.0.id
    }

    /// Fully qualified type name
    pub fn name(&self) -> &'static str {
        self.0.name
    }

    /// Structural kind
    pub fn kind(&self) -> &ShapeKind {
        &self.0.kind
    }

    /// Whether both shapes describe the very same type
    pub fn is_identical(&self, other: &Shape) -> bool {
        self.0.id == other.0.id
    }

    /// Struct fields, if this is a struct shape
    pub fn fields(&self) -> Option<&[FieldDef]> {
        match &self.0.kind {
            ShapeKind::Struct { fields } => Some(fields),
            _ => None,
        }
    }

    /// Position of the named field, if this is a struct shape
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields()?.iter().position(|field| field.name == name)
    }

    /// Pointee shape of an optional or element shape of a sequence
    pub fn element(&self) -> Option<Shape> {
        match &self.0.kind {
            ShapeKind::Optional { element } | ShapeKind::Sequence { element } => Some(element()),
            _ => None,
        }
    }

    /// Whether this is a struct shape
    pub fn is_struct(&self) -> bool {
        matches!(self.0.kind, ShapeKind::Struct { .. })
    }

    /// Whether this is an optional shape
    pub fn is_optional(&self) -> bool {
        matches!(self.0.kind, ShapeKind::Optional { .. })
    }

    /// The struct shape reached through at most one optional, if any.
    ///
    /// Used to look through embedded `Option<T>` members.
    pub fn struct_target(&self) -> Option<Shape> {
        match &self.0.kind {
            ShapeKind::Struct { .. } => Some(self.clone()),
            ShapeKind::Optional { element } => {
                let inner = element();
                inner.is_struct().then_some(inner)
            }
            _ => None,
        }
    }

    /// Build the zero value of the described type.
    ///
    /// Structs get the zero value of every field, optionals are null and
    /// sequences are empty.
    pub fn zero(&self) -> Value {
        match &self.0.kind {
            ShapeKind::Atomic { zero } | ShapeKind::Unsupported { zero } => zero(),
            ShapeKind::Struct { fields } => Value::structure(
                self.clone(),
                fields.iter().map(|field| field.shape().zero()).collect(),
            ),
            ShapeKind::Optional { .. } => Value::optional(self.clone(), None),
            ShapeKind::Sequence { .. } => Value::sequence(self.clone(), Vec::new()),
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.0.kind {
            ShapeKind::Atomic { .. } => "atomic",
            ShapeKind::Struct { .. } => "struct",
            ShapeKind::Optional { .. } => "optional",
            ShapeKind::Sequence { .. } => "sequence",
            ShapeKind::Unsupported { .. } => "unsupported",
        };
        write!(f, "Shape({kind} {})", self.0.name)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name)
    }
}
