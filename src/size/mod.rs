//! Size Module
//!
//! Estimates the deep retained footprint of object graphs.
//!
//! The cost model is a reproducible approximation of a managed heap with
//! compressed pointers: every object pays a fixed header, every array pays a
//! larger header plus its slots, and every reference slot costs four bytes.
//! Each distinct shared object is charged once per estimate.

mod estimator;
mod impls;

pub use estimator::SizeEstimator;

// == Cost Model ==
/// Fixed cost of a plain object header.
pub const OBJECT_HEADER: u64 = 8;

/// Fixed cost of an array header (object header plus length word).
pub const ARRAY_HEADER: u64 = 16;

/// Cost of one reference slot.
pub const REFERENCE_SIZE: u64 = 4;

// == Heap Size ==
/// A value that can stand on the heap as an object: a root handed to
/// [`SizeEstimator::estimate`] or the referent of a pointer.
///
/// Implementations return the object's own footprint (header plus the cost of
/// each slot) and pass any referents to the estimator through
/// [`FieldSize::field_size`] or one of the estimator's visit methods
/// ([`SizeEstimator::visit_pointer`], [`SizeEstimator::visit_shared`],
/// [`SizeEstimator::visit_owned`]). Referents are measured later, so an
/// implementation never recurses by itself.
///
/// Plain structs can use [`heap_size_struct!`](crate::heap_size_struct):
///
/// ```
/// use std::sync::Arc;
/// use sizecache::heap_size_struct;
/// use sizecache::size::SizeEstimator;
///
/// struct Point {
///     x: i32,
///     y: i32,
///     label: Option<Arc<String>>,
/// }
/// heap_size_struct!(Point { x, y, label });
///
/// let point = Point { x: 1, y: 2, label: None };
/// assert_eq!(SizeEstimator::estimate(&point), 8 + 4 + 4 + 4);
/// ```
pub trait HeapSize {
    /// Returns the footprint of this object alone, excluding referents.
    fn heap_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64;
}

// == Field Size ==
/// A value that can occupy a field or array slot.
///
/// Primitives cost their natural width. Pointer-like slots cost
/// [`REFERENCE_SIZE`] and schedule their referent with the estimator.
pub trait FieldSize {
    /// Returns the cost of the slot itself.
    fn field_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64;

    /// Slot width shared by every value of the type, when it does not depend
    /// on the value. Arrays of such types are priced without walking elements.
    fn fixed_field_size() -> Option<u64> {
        None
    }
}

// == Struct Helper ==
/// Implements [`HeapSize`] for a struct from its list of fields.
///
/// The struct is charged [`OBJECT_HEADER`] plus the [`FieldSize`] of each
/// listed field. Every field type must implement [`FieldSize`].
#[macro_export]
macro_rules! heap_size_struct {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::size::HeapSize for $ty {
            #[allow(unused_variables)]
            fn heap_size<'a>(
                &'a self,
                estimator: &mut $crate::size::SizeEstimator<'a>,
            ) -> u64 {
                $crate::size::OBJECT_HEADER
                    $(+ $crate::size::FieldSize::field_size(&self.$field, estimator))*
            }
        }
    };
}
