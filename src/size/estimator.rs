//! Size Estimator Module
//!
//! Walks object graphs and sums their footprint, charging each distinct
//! shared object once per call.

use std::collections::HashSet;
use std::ops::Deref;

use crate::size::HeapSize;

// == Size Estimator ==
/// Deep size estimator with identity-based deduplication.
///
/// An estimator lives for one call to [`estimate`](Self::estimate) or
/// [`estimate_all`](Self::estimate_all); separate calls never share
/// deduplication state. Traversal uses an explicit pending stack, so deep
/// pointer chains do not grow the call stack.
///
/// Identity is the referent's address. Shared referents (behind `Arc` or
/// `Rc`) and roots are recorded in the visited set before they are measured,
/// which is what makes cyclic graphs terminate. Uniquely owned referents
/// (behind `Box`, `Vec` or `String` slots) cannot be aliased and skip the
/// visited set.
///
/// Shared pointers reached through a lock guard are cloned and deferred until
/// the guard is released, so chains of `Rc<RefCell<_>>` or `Arc<Mutex<_>>`
/// are walked one link at a time from the top-level loop.
pub struct SizeEstimator<'a> {
    /// Addresses of objects already charged in this call
    visited: HashSet<usize>,
    /// Objects scheduled but not yet measured
    pending: Vec<&'a dyn HeapSize>,
    /// Shared referents found behind a lock guard
    deferred: Vec<Box<dyn HeapSize>>,
    /// Set while measuring borrowed lock contents
    detached: bool,
}

impl<'a> SizeEstimator<'a> {
    fn new() -> Self {
        Self {
            visited: HashSet::new(),
            pending: Vec::new(),
            deferred: Vec::new(),
            detached: false,
        }
    }

    // == Estimate ==
    /// Returns the retained size of the graph reachable from `root`.
    pub fn estimate<T: HeapSize>(root: &T) -> u64 {
        SizeEstimator::estimate_all(&[root as &dyn HeapSize])
    }

    // == Estimate All ==
    /// Returns the retained size of the graphs reachable from every root.
    ///
    /// Objects reachable from several roots are charged once, so for disjoint
    /// graphs the result equals the sum of the individual estimates.
    /// Zero-sized roots have no distinct address and are charged per root.
    pub fn estimate_all(roots: &[&dyn HeapSize]) -> u64 {
        let mut estimator = SizeEstimator::new();
        for root in roots {
            if std::mem::size_of_val(*root) == 0 {
                estimator.pending.push(*root);
            } else {
                estimator.schedule_shared(address_of(*root), *root);
            }
        }

        let mut total = estimator.drain();
        while let Some(referent) = estimator.deferred.pop() {
            total = total.saturating_add(estimator.measure_detached(&*referent));
        }
        total
    }

    // == Visit Shared ==
    /// Schedules a referent that other pointers may also reach.
    ///
    /// The referent is charged only if its address has not been seen in this
    /// call.
    pub fn visit_shared<T: HeapSize + 'a>(&mut self, referent: &'a T) {
        self.schedule_shared(address_of(referent), referent);
    }

    // == Visit Pointer ==
    /// Schedules the referent of a reference-counted pointer.
    ///
    /// Behaves like [`visit_shared`](Self::visit_shared), except inside lock
    /// contents, where the pointer is cloned and its referent measured after
    /// the lock is released.
    pub fn visit_pointer<P>(&mut self, pointer: &'a P)
    where
        P: Clone + Deref + 'static,
        P::Target: HeapSize + Sized + 'static,
    {
        if !self.detached {
            self.visit_shared(&**pointer);
        } else if self.visited.insert(address_of(&**pointer)) {
            self.deferred.push(Box::new(Deferred(pointer.clone())));
        }
    }

    // == Visit Owned ==
    /// Schedules a referent that only this slot can reach.
    pub fn visit_owned<T: HeapSize + 'a>(&mut self, referent: &'a T) {
        self.pending.push(referent);
    }

    // == Measure Detached ==
    /// Measures a value whose borrow ends before this estimator finishes,
    /// such as the contents of a lock guard.
    ///
    /// Uniquely owned parts of the value are measured immediately, sharing
    /// this estimator's visited set. Shared pointers inside it are deferred
    /// to the top-level loop.
    pub fn measure_detached<T: HeapSize + ?Sized>(&mut self, value: &T) -> u64 {
        let mut inner = SizeEstimator {
            visited: std::mem::take(&mut self.visited),
            pending: Vec::new(),
            deferred: std::mem::take(&mut self.deferred),
            detached: true,
        };
        let size = value.heap_size(&mut inner).saturating_add(inner.drain());
        self.visited = inner.visited;
        self.deferred = inner.deferred;
        size
    }

    fn schedule_shared(&mut self, address: usize, referent: &'a dyn HeapSize) {
        // Marked before measuring so cycles terminate.
        if self.visited.insert(address) {
            self.pending.push(referent);
        }
    }

    fn drain(&mut self) -> u64 {
        let mut total = 0u64;
        while let Some(object) = self.pending.pop() {
            total = total.saturating_add(object.heap_size(self));
        }
        total
    }
}

/// Owned handle to a shared referent that was already marked visited.
struct Deferred<P>(P);

impl<P> HeapSize for Deferred<P>
where
    P: Deref,
    P::Target: HeapSize + Sized,
{
    fn heap_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        (*self.0).heap_size(estimator)
    }
}

fn address_of<T: ?Sized>(value: &T) -> usize {
    value as *const T as *const () as usize
}
