//! Dynamic value trees
#![allow(clippy::must_use_candidate)] // Accessors are clear at call sites without #[must_use].

use std::any::Any;
use std::fmt;

use crate::shape::Shape;
use crate::{Error, Result};

/// An owned, dynamically shaped value.
///
/// Every value carries the [`Shape`] of the type it was read from (or is
/// meant to become), so the mapper can reason about identity and structure
/// without knowing the concrete type.
#[derive(Debug, Clone)]
pub struct Value {
    shape: Shape,
    data: Data,
}

/// Payload of a [`Value`]
#[derive(Debug, Clone)]
pub enum Data {
    /// Type-erased scalar (or unsupported) value
    Atom(Atom),

    /// Field values, parallel to the shape's fields
    Struct(Vec<Value>),

    /// Present or null pointee
    Optional(Option<Box<Value>>),

    /// Elements in order
    Sequence(Vec<Value>),
}

/// Type-erased, clonable payload of an atomic value
pub struct Atom(Box<dyn AtomData>);

/// Object-safe view of a clonable `'static` value
trait AtomData: Any + fmt::Debug + Send + Sync {
    fn clone_data(&self) -> Box<dyn AtomData>;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T> AtomData for T
where
    T: Any + fmt::Debug + Clone + Send + Sync,
{
    fn clone_data(&self) -> Box<dyn AtomData> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Atom {
    /// Wrap a concrete value
    pub fn new<T>(value: T) -> Self
    where
        T: Any + fmt::Debug + Clone + Send + Sync,
    {
        Self(Box::new(value))
    }

    /// Borrow the payload as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_ref().as_any().downcast_ref::<T>()
    }

    /// Take the payload as `T`
    pub fn downcast<T: Any>(self) -> Option<T> {
        self.0.into_any().downcast::<T>().ok().map(|boxed| *boxed)
    }
}

impl Clone for Atom {
    fn clone(&self) -> Self {
        Self(self.0.as_ref().clone_data())
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0.as_ref(), f)
    }
}

impl Value {
    /// Build an atomic value
    pub fn atom<T>(shape: Shape, value: T) -> Self
    where
        T: Any + fmt::Debug + Clone + Send + Sync,
    {
        Self {
            shape,
            data: Data::Atom(Atom::new(value)),
        }
    }

    /// Build a struct value from field values in shape order
    pub fn structure(shape: Shape, fields: Vec<Value>) -> Self {
        Self {
            shape,
            data: Data::Struct(fields),
        }
    }

    /// Build an optional value
    pub fn optional(shape: Shape, value: Option<Value>) -> Self {
        Self {
            shape,
            data: Data::Optional(value.map(Box::new)),
        }
    }

    /// Build a sequence value
    pub fn sequence(shape: Shape, items: Vec<Value>) -> Self {
        Self {
            shape,
            data: Data::Sequence(items),
        }
    }

    /// Shape of the type this value belongs to
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Payload
    pub fn data(&self) -> &Data {
        &self.data
    }

    /// Field values, if this is a struct value
    pub fn fields(&self) -> Option<&[Value]> {
        match &self.data {
            Data::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Value of the named field, if this is a struct value that has it
    pub fn field(&self, name: &str) -> Option<&Value> {
        let index = self.shape.field_index(name)?;
        self.fields()?.get(index)
    }

    /// Pointee of an optional value; `Some(None)` for a null optional
    pub fn as_optional(&self) -> Option<Option<&Value>> {
        match &self.data {
            Data::Optional(inner) => Some(inner.as_deref()),
            _ => None,
        }
    }

    /// Elements, if this is a sequence value
    pub fn items(&self) -> Option<&[Value]> {
        match &self.data {
            Data::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this is a null optional
    pub fn is_null(&self) -> bool {
        matches!(self.data, Data::Optional(None))
    }

    /// Borrow an atomic payload as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match &self.data {
            Data::Atom(atom) => atom.downcast_ref(),
            _ => None,
        }
    }

    /// Take an atomic payload as `T`
    pub fn into_atom<T: Any>(self) -> Result<T> {
        let name = self.shape.name();
        match self.data {
            Data::Atom(atom) => atom
                .downcast::<T>()
                .ok_or_else(|| Error::reconstruct::<T>(format!("atom holds a {name}"))),
            other => Err(Error::reconstruct::<T>(format!(
                "expected an atom, found {}",
                other.kind_name()
            ))),
        }
    }

    /// Take the field values of a struct value built for `T`
    pub fn into_fields<T: 'static>(self) -> Result<std::vec::IntoIter<Value>> {
        self.expect_type::<T>()?;
        match self.data {
            Data::Struct(fields) => Ok(fields.into_iter()),
            other => Err(Error::reconstruct::<T>(format!(
                "expected struct fields, found {}",
                other.kind_name()
            ))),
        }
    }

    /// Take the pointee of an optional value built for `T`
    pub fn into_optional<T: 'static>(self) -> Result<Option<Value>> {
        self.expect_type::<T>()?;
        match self.data {
            Data::Optional(inner) => Ok(inner.map(|boxed| *boxed)),
            other => Err(Error::reconstruct::<T>(format!(
                "expected an optional, found {}",
                other.kind_name()
            ))),
        }
    }

    /// Take the elements of a sequence value built for `T`
    pub fn into_items<T: 'static>(self) -> Result<Vec<Value>> {
        self.expect_type::<T>()?;
        match self.data {
            Data::Sequence(items) => Ok(items),
            other => Err(Error::reconstruct::<T>(format!(
                "expected a sequence, found {}",
                other.kind_name()
            ))),
        }
    }

    fn expect_type<T: 'static>(&self) -> Result<()> {
        if self.shape.id() == std::any::TypeId::of::<T>() {
            Ok(())
        } else {
            Err(Error::reconstruct::<T>(format!(
                "value belongs to {}",
                self.shape.name()
            )))
        }
    }
}

impl Data {
    fn kind_name(&self) -> &'static str {
        match self {
            Data::Atom(_) => "an atom",
            Data::Struct(_) => "struct fields",
            Data::Optional(_) => "an optional",
            Data::Sequence(_) => "a sequence",
        }
    }
}

/// Pull the next field value while rebuilding a struct.
///
/// Used by `#[derive(Mappable)]`.
#[doc(hidden)]
pub fn next_field<T: 'static>(
    fields: &mut std::vec::IntoIter<Value>,
    name: &'static str,
) -> Result<Value> {
    fields
        .next()
        .ok_or_else(|| Error::reconstruct::<T>(format!("missing value for field `{name}`")))
}
