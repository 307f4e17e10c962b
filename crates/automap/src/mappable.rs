//! The `Mappable` capability and its implementations for std and chrono types

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;

use crate::shape::Shape;
use crate::value::Value;
use crate::Result;

/// Types that can take part in structural mapping.
///
/// Implementations describe the type ([`Mappable::shape`]), read an
/// instance into a dynamic [`Value`], and rebuild an instance from one.
/// User structs get an implementation from `#[derive(Mappable)]`; only
/// `pub` fields are described.
///
/// ```
/// use automap::Mappable;
///
/// #[derive(Mappable, Debug, Default)]
/// pub struct Customer {
///     pub name: String,
///     pub tags: Vec<String>,
/// }
///
/// let shape = Customer::shape();
/// assert_eq!(shape.fields().map(<[_]>::len), Some(2));
/// ```
pub trait Mappable: Sized + 'static {
    /// Descriptor of the type
    fn shape() -> Shape;

    /// Read this instance into a value tree
    fn to_value(&self) -> Value;

    /// Rebuild an instance from a value tree of this type's shape
    fn from_value(value: Value) -> Result<Self>;

    /// Write a value tree of this type's shape into an existing instance.
    ///
    /// The default replaces the whole instance. Derived structs assign
    /// only their exported fields, recursively, and keep everything else.
    fn assign_value(&mut self, value: Value) -> Result<()> {
        *self = Self::from_value(value)?;
        Ok(())
    }
}

macro_rules! atomic_mappable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Mappable for $ty {
                fn shape() -> Shape {
                    Shape::atomic::<$ty>()
                }

                fn to_value(&self) -> Value {
                    Value::atom(Self::shape(), self.clone())
                }

                fn from_value(value: Value) -> Result<Self> {
                    value.into_atom::<$ty>()
                }
            }
        )*
    };
}

atomic_mappable!(
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    (),
    String,
    std::time::Duration,
    chrono::NaiveDate,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::Utc>,
);

impl<T: Mappable> Mappable for Option<T> {
    fn shape() -> Shape {
        Shape::optional::<Self>(T::shape)
    }

    fn to_value(&self) -> Value {
        Value::optional(Self::shape(), self.as_ref().map(T::to_value))
    }

    fn from_value(value: Value) -> Result<Self> {
        value.into_optional::<Self>()?.map(T::from_value).transpose()
    }
}

impl<T: Mappable> Mappable for Vec<T> {
    fn shape() -> Shape {
        Shape::sequence::<Self>(T::shape)
    }

    fn to_value(&self) -> Value {
        Value::sequence(Self::shape(), self.iter().map(T::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        value
            .into_items::<Self>()?
            .into_iter()
            .map(T::from_value)
            .collect()
    }
}

/// Boxes are transparent: a `Box<T>` has the shape of `T`.
impl<T: Mappable> Mappable for Box<T> {
    fn shape() -> Shape {
        T::shape()
    }

    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn from_value(value: Value) -> Result<Self> {
        T::from_value(value).map(Box::new)
    }

    fn assign_value(&mut self, value: Value) -> Result<()> {
        (**self).assign_value(value)
    }
}

// Maps are never decomposed; they only copy between identical types.
impl<K, V> Mappable for HashMap<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + fmt::Debug + Send + Sync + 'static,
{
    fn shape() -> Shape {
        Shape::unsupported::<Self>()
    }

    fn to_value(&self) -> Value {
        Value::atom(Self::shape(), self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        value.into_atom::<Self>()
    }
}

impl<K, V> Mappable for BTreeMap<K, V>
where
    K: Ord + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + fmt::Debug + Send + Sync + 'static,
{
    fn shape() -> Shape {
        Shape::unsupported::<Self>()
    }

    fn to_value(&self) -> Value {
        Value::atom(Self::shape(), self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        value.into_atom::<Self>()
    }
}
