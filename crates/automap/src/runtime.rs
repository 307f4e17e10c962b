//! Mapping runtime
//!
//! The [`Mapper`] walks a destination shape and a source value side by side.
//! Dispatch is decided by the destination shape first: a struct
//! destination is always decomposed field by field, identical types are
//! copied whole, and only then are optionals, sequences and scalars
//! considered.

use std::any::TypeId;
use std::borrow::Cow;
use std::collections::HashSet;
use tracing::{debug, trace};

use crate::mappable::Mappable;
use crate::options::MapOptions;
use crate::plan::{FieldStep, PlanCache};
use crate::shape::{FieldDef, Shape, ShapeKind};
use crate::value::Value;
use crate::{Error, Result};

/// Structural mapper.
///
/// A mapper holds its [`MapOptions`] and a cache of field correspondence
/// plans. It is `Send + Sync` and can be shared between threads.
#[derive(Debug, Default)]
pub struct Mapper {
    options: MapOptions,
    plans: PlanCache,
}

/// Per-call traversal state
#[derive(Debug, Default)]
struct Walk {
    /// Current recursion depth
    depth: usize,

    /// Element pairs whose empty-sequence compatibility is being checked
    verifying: HashSet<(TypeId, TypeId)>,
}

impl Mapper {
    /// Create a strict mapper with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mapper with the given options
    pub fn with_options(options: MapOptions) -> Self {
        Self {
            options,
            plans: PlanCache::new(),
        }
    }

    /// Options in effect
    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    /// Number of struct plans cached so far
    pub fn cached_plans(&self) -> usize {
        self.plans.len()
    }

    /// Map `source` into a newly built `D`
    pub fn map<D: Mappable, S: Mappable>(&self, source: &S) -> Result<D> {
        debug!(
            source = std::any::type_name::<S>(),
            dest = std::any::type_name::<D>(),
            mode = ?self.options.mode,
            "Mapping value"
        );
        let value = self.map_to_shape(&source.to_value(), &D::shape())?;
        D::from_value(value)
    }

    /// Map `source` into an existing destination.
    ///
    /// Every exported field is overwritten; private and skipped fields keep
    /// their current values. The mapped tree is built in full before the
    /// first field is written, so a mapping error leaves `dest` untouched.
    pub fn map_into<S: Mappable, D: Mappable>(&self, source: &S, dest: &mut D) -> Result<()> {
        debug!(
            source = std::any::type_name::<S>(),
            dest = std::any::type_name::<D>(),
            mode = ?self.options.mode,
            "Mapping value in place"
        );
        let value = self.map_to_shape(&source.to_value(), &D::shape())?;
        dest.assign_value(value)
    }

    /// Map a value tree into a destination slot.
    ///
    /// `dest` must be a non-null optional; its pointee is replaced by the
    /// mapped value. Any other destination fails with
    /// [`Error::InvalidDestination`] before anything is traversed.
    pub fn map_value(&self, source: &Value, dest: &mut Value) -> Result<()> {
        let slot = match (dest.as_optional(), dest.shape().element()) {
            (Some(Some(_)), Some(element)) => element,
            _ => {
                return Err(Error::InvalidDestination {
                    found: dest.shape().name(),
                });
            }
        };

        debug!(
            source = source.shape().name(),
            dest = slot.name(),
            "Mapping value tree"
        );
        let mapped = self.map_to_shape(source, &slot)?;
        *dest = Value::optional(dest.shape().clone(), Some(mapped));
        Ok(())
    }

    /// Map a value tree into a fresh value of the given shape
    pub fn map_to_shape(&self, source: &Value, dest: &Shape) -> Result<Value> {
        let mut walk = Walk::default();
        self.map_values(source, dest, &mut walk)
    }

    fn map_values(&self, source: &Value, dest: &Shape, walk: &mut Walk) -> Result<Value> {
        if let Some(limit) = self.options.max_depth.filter(|&limit| walk.depth >= limit) {
            return Err(Error::DepthExceeded { limit });
        }

        walk.depth += 1;
        let result = self.dispatch(source, dest, walk);
        walk.depth -= 1;
        result
    }

    fn dispatch(&self, source: &Value, dest: &Shape, walk: &mut Walk) -> Result<Value> {
        if let ShapeKind::Struct { fields } = dest.kind() {
            return self.map_struct(source, dest, fields, walk);
        }

        if source.shape().is_identical(dest) {
            return Ok(source.clone());
        }

        match (dest.kind(), source.as_optional()) {
            (ShapeKind::Optional { element }, _) => {
                self.map_optional(source, dest, &element(), walk)
            }
            (_, Some(None)) => Ok(dest.zero()),
            (_, Some(Some(pointee))) => self.map_values(pointee, dest, walk),
            (ShapeKind::Sequence { element }, None) => {
                self.map_sequence(source, dest, &element(), walk)
            }
            (ShapeKind::Unsupported { .. }, None) => Err(Error::UnsupportedShape {
                dest_type: dest.name(),
                source_type: source.shape().name(),
            }),
            (ShapeKind::Atomic { .. } | ShapeKind::Struct { .. }, None) => {
                Err(Error::type_mismatch(dest, source.shape()))
            }
        }
    }

    fn map_struct(
        &self,
        source: &Value,
        dest: &Shape,
        dest_fields: &[FieldDef],
        walk: &mut Walk,
    ) -> Result<Value> {
        let source = deref_source(source);
        let source_shape = source.shape();
        let Some(source_fields) = source.fields() else {
            return Err(Error::type_mismatch(dest, source_shape));
        };

        let plan = self.plans.get_or_build(dest, source_shape, &self.options);
        let mut fields = Vec::with_capacity(dest_fields.len());

        for (field, step) in dest_fields.iter().zip(plan.steps()) {
            trace!(field = field.name(), ?step, "Mapping field");
            let mapped = self
                .map_field(dest, field, *step, &source, source_fields, walk)
                .map_err(|err| Error::Field {
                    field: field.name(),
                    dest_type: dest.name(),
                    source_type: source_shape.name(),
                    source: Box::new(err),
                })?;
            fields.push(mapped);
        }

        Ok(Value::structure(dest.clone(), fields))
    }

    fn map_field(
        &self,
        dest: &Shape,
        field: &FieldDef,
        step: FieldStep,
        source: &Value,
        source_fields: &[Value],
        walk: &mut Walk,
    ) -> Result<Value> {
        let shape = field.shape();
        match step {
            FieldStep::Embedded | FieldStep::Descend => self.map_values(source, &shape, walk),
            FieldStep::Direct { source: index } => {
                let value = member(source, source_fields, index)?;
                self.map_values(value, &shape, walk)
            }
            FieldStep::Promoted { via, field: index } => {
                let holder = member(source, source_fields, via)?;
                let holder = match holder.as_optional() {
                    Some(None) => {
                        debug!(
                            field = field.name(),
                            via = holder.shape().name(),
                            "Embedded source member is null, leaving field at zero value"
                        );
                        return Ok(shape.zero());
                    }
                    Some(Some(inner)) => inner,
                    None => holder,
                };
                let holder_fields = holder
                    .fields()
                    .ok_or_else(|| Error::type_mismatch(&shape, holder.shape()))?;
                let value = member(holder, holder_fields, index)?;
                self.map_values(value, &shape, walk)
            }
            FieldStep::Missing if self.options.is_loose() => {
                debug!(
                    field = field.name(),
                    source = source.shape().name(),
                    "No source field, leaving zero value"
                );
                Ok(shape.zero())
            }
            FieldStep::Missing => Err(Error::MissingSourceField {
                field: field.name(),
                dest_type: dest.name(),
                source_type: source.shape().name(),
            }),
        }
    }

    fn map_optional(
        &self,
        source: &Value,
        dest: &Shape,
        element: &Shape,
        walk: &mut Walk,
    ) -> Result<Value> {
        let pointee = match source.as_optional() {
            Some(None) => return Ok(Value::optional(dest.clone(), None)),
            Some(Some(inner)) => inner,
            None => source,
        };

        let mapped = self.map_values(pointee, element, walk)?;
        Ok(Value::optional(dest.clone(), Some(mapped)))
    }

    fn map_sequence(
        &self,
        source: &Value,
        dest: &Shape,
        element: &Shape,
        walk: &mut Walk,
    ) -> Result<Value> {
        let Some(items) = source.items() else {
            return Err(Error::type_mismatch(dest, source.shape()));
        };

        if items.is_empty() && self.options.verify_empty_sequences {
            if let Some(source_element) = source.shape().element() {
                self.verify_elements(element, &source_element, walk)?;
            }
        }

        let mapped = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                self.map_values(item, element, walk)
                    .map_err(|err| Error::Element {
                        index,
                        source: Box::new(err),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Value::sequence(dest.clone(), mapped))
    }

    /// Dry-run a zero source element into the destination element shape.
    ///
    /// A pair already under verification further up is assumed compatible,
    /// which keeps recursive element types finite.
    fn verify_elements(&self, dest: &Shape, source: &Shape, walk: &mut Walk) -> Result<()> {
        let key = (dest.id(), source.id());
        if !walk.verifying.insert(key) {
            return Ok(());
        }

        trace!(
            dest = dest.name(),
            source = source.name(),
            "Verifying empty sequence element types"
        );
        let result = self.map_values(&source.zero(), dest, walk);
        walk.verifying.remove(&key);

        result
            .map(|_| ())
            .map_err(|err| Error::IncompatibleElementType {
                dest_element: dest.name(),
                source_element: source.name(),
                source: Box::new(err),
            })
    }
}

/// Look through optionals: a null source stands for the zero value of its
/// innermost pointee.
fn deref_source(source: &Value) -> Cow<'_, Value> {
    let mut current = source;
    loop {
        match current.as_optional() {
            None => return Cow::Borrowed(current),
            Some(Some(inner)) => current = inner,
            Some(None) => {
                let mut shape = current.shape().clone();
                while shape.is_optional() {
                    match shape.element() {
                        Some(element) => shape = element,
                        None => break,
                    }
                }
                return Cow::Owned(shape.zero());
            }
        }
    }
}

fn member<'a>(holder: &Value, fields: &'a [Value], index: usize) -> Result<&'a Value> {
    fields.get(index).ok_or_else(|| Error::Reconstruct {
        type_name: holder.shape().name(),
        reason: format!("value has no field at position {index}"),
    })
}
