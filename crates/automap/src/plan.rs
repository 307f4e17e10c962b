//! Field correspondence plans and their cache
//!
//! A plan records, for every exported field of a destination struct, where
//! its data comes from in a given source struct. Plans depend only on the
//! pair of shapes and on the mapper's options, so they are computed once
//! per type pair and reused.

use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;
use tracing::trace;

use crate::options::MapOptions;
use crate::shape::Shape;

/// Where one destination field gets its data from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStep {
    /// Embedded destination field; filled from the same source struct
    Embedded,

    /// Same-named field of the source struct
    Direct {
        /// Source field index
        source: usize,
    },

    /// Field promoted from a struct-valued source member
    Promoted {
        /// Index of the source member holding the field
        via: usize,
        /// Index of the field within that member's struct shape
        field: usize,
    },

    /// Filled by mapping the whole source struct into the field
    Descend,

    /// No counterpart in the source
    Missing,
}

/// Correspondence between a destination struct and a source struct
#[derive(Debug, Clone)]
pub struct StructPlan {
    steps: Vec<FieldStep>,
}

impl StructPlan {
    /// Compute the plan for mapping `source` into `dest`.
    ///
    /// Both shapes must be struct shapes; otherwise the plan is empty.
    /// A direct match always wins over a promoted one.
    pub fn build(dest: &Shape, source: &Shape, options: &MapOptions) -> Self {
        let Some(dest_fields) = dest.fields() else {
            return Self { steps: Vec::new() };
        };

        let steps = dest_fields
            .iter()
            .map(|field| {
                if field.is_embedded() {
                    return FieldStep::Embedded;
                }
                if let Some(index) = source.field_index(field.name()) {
                    return FieldStep::Direct { source: index };
                }
                if let Some((via, index)) = find_promoted(source, field.name(), options) {
                    return FieldStep::Promoted { via, field: index };
                }
                if options.descend_into_unmatched_structs && field.shape().is_struct() {
                    return FieldStep::Descend;
                }
                FieldStep::Missing
            })
            .collect();

        Self { steps }
    }

    /// One step per destination field, in declaration order
    pub fn steps(&self) -> &[FieldStep] {
        &self.steps
    }
}

/// Search one level into the source's struct members for `name`
fn find_promoted(source: &Shape, name: &str, options: &MapOptions) -> Option<(usize, usize)> {
    source
        .fields()?
        .iter()
        .enumerate()
        .filter(|(_, member)| member.is_embedded() || options.promote_from_named_fields)
        .find_map(|(via, member)| {
            let target = member.shape().struct_target()?;
            target.field_index(name).map(|index| (via, index))
        })
}

/// Concurrent cache of struct plans keyed by (destination, source) type
#[derive(Debug, Default)]
pub struct PlanCache {
    plans: DashMap<(TypeId, TypeId), Arc<StructPlan>>,
}

impl PlanCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the plan for a type pair, building it on first use
    pub fn get_or_build(
        &self,
        dest: &Shape,
        source: &Shape,
        options: &MapOptions,
    ) -> Arc<StructPlan> {
        let key = (dest.id(), source.id());
        if let Some(plan) = self.plans.get(&key) {
            trace!(dest = dest.name(), source = source.name(), "Plan cache hit");
            return Arc::clone(plan.value());
        }

        trace!(dest = dest.name(), source = source.name(), "Plan cache miss");
        let plan = Arc::new(StructPlan::build(dest, source, options));
        self.plans.insert(key, Arc::clone(&plan));
        plan
    }

    /// Number of cached plans
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// Whether no plan has been cached yet
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Drop all cached plans
    pub fn clear(&self) {
        self.plans.clear();
    }
}
