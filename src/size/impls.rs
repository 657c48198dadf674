//! Footprints of standard library types.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::mem::size_of;
use std::rc::{self, Rc};
use std::sync::{self, Arc, Mutex, RwLock, TryLockError};

use crate::size::{FieldSize, HeapSize, SizeEstimator, ARRAY_HEADER, OBJECT_HEADER, REFERENCE_SIZE};

// == Primitives ==
// As fields they cost their width; as standalone objects they are boxed.
macro_rules! primitive_sizes {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldSize for $ty {
                fn field_size<'a>(&'a self, _: &mut SizeEstimator<'a>) -> u64 {
                    size_of::<$ty>() as u64
                }

                fn fixed_field_size() -> Option<u64> {
                    Some(size_of::<$ty>() as u64)
                }
            }

            impl HeapSize for $ty {
                fn heap_size<'a>(&'a self, _: &mut SizeEstimator<'a>) -> u64 {
                    OBJECT_HEADER + size_of::<$ty>() as u64
                }
            }
        )*
    };
}

primitive_sizes!(
    bool, u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, usize, isize, f32, f64, char,
);

impl HeapSize for () {
    fn heap_size<'a>(&'a self, _: &mut SizeEstimator<'a>) -> u64 {
        OBJECT_HEADER
    }
}

// == Arrays ==
fn array_size<'a, T: FieldSize>(elements: &'a [T], estimator: &mut SizeEstimator<'a>) -> u64 {
    let slots = match T::fixed_field_size() {
        Some(width) => width.saturating_mul(elements.len() as u64),
        None => elements
            .iter()
            .map(|element| element.field_size(estimator))
            .sum(),
    };
    ARRAY_HEADER + slots
}

impl<T: FieldSize> HeapSize for [T] {
    fn heap_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        array_size(self, estimator)
    }
}

impl<T: FieldSize, const N: usize> HeapSize for [T; N] {
    fn heap_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        array_size(self, estimator)
    }
}

impl<T: FieldSize> HeapSize for Vec<T> {
    fn heap_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        array_size(self, estimator)
    }
}

impl<T: FieldSize> FieldSize for Vec<T> {
    fn field_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        estimator.visit_owned(self);
        REFERENCE_SIZE
    }
}

impl<T: FieldSize> HeapSize for VecDeque<T> {
    fn heap_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        let (front, back) = self.as_slices();
        // One array, so one header.
        array_size(front, estimator) + array_size(back, estimator) - ARRAY_HEADER
    }
}

impl<T: FieldSize> FieldSize for VecDeque<T> {
    fn field_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        estimator.visit_owned(self);
        REFERENCE_SIZE
    }
}

// == Strings ==
// A string object holds one reference to its backing byte array.
fn string_size(text: &str) -> u64 {
    OBJECT_HEADER + REFERENCE_SIZE + ARRAY_HEADER + text.len() as u64
}

impl HeapSize for str {
    fn heap_size<'a>(&'a self, _: &mut SizeEstimator<'a>) -> u64 {
        string_size(self)
    }
}

impl HeapSize for String {
    fn heap_size<'a>(&'a self, _: &mut SizeEstimator<'a>) -> u64 {
        string_size(self)
    }
}

impl FieldSize for String {
    fn field_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        estimator.visit_owned(self);
        REFERENCE_SIZE
    }
}

// == Pointers ==
impl<T: HeapSize> HeapSize for Box<T> {
    fn heap_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        (**self).heap_size(estimator)
    }
}

impl<T: HeapSize> FieldSize for Box<T> {
    fn field_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        estimator.visit_owned(&**self);
        REFERENCE_SIZE
    }
}

impl<T: HeapSize + 'static> HeapSize for Arc<T> {
    fn heap_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        estimator.visit_pointer(self);
        0
    }
}

impl<T: HeapSize + 'static> FieldSize for Arc<T> {
    fn field_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        estimator.visit_pointer(self);
        REFERENCE_SIZE
    }
}

impl<T: HeapSize + 'static> HeapSize for Rc<T> {
    fn heap_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        estimator.visit_pointer(self);
        0
    }
}

impl<T: HeapSize + 'static> FieldSize for Rc<T> {
    fn field_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        estimator.visit_pointer(self);
        REFERENCE_SIZE
    }
}

// Weakly reachable objects are not retained.
impl<T> FieldSize for sync::Weak<T> {
    fn field_size<'a>(&'a self, _: &mut SizeEstimator<'a>) -> u64 {
        REFERENCE_SIZE
    }
}

impl<T> FieldSize for rc::Weak<T> {
    fn field_size<'a>(&'a self, _: &mut SizeEstimator<'a>) -> u64 {
        REFERENCE_SIZE
    }
}

/// An optional field is a nullable reference. `None` occupies the reference
/// slot alone; an optional primitive is a reference to a boxed object.
impl<T: FieldSize> FieldSize for Option<T> {
    fn field_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        match (self, T::fixed_field_size()) {
            (None, _) => REFERENCE_SIZE,
            (Some(_), Some(width)) => REFERENCE_SIZE + OBJECT_HEADER + width,
            (Some(value), None) => value.field_size(estimator),
        }
    }
}

// == Interior Mutability ==
// Cells are transparent: they cost what their contents cost. Contents that
// are locked elsewhere are charged a bare header instead of blocking.
impl<T: HeapSize> HeapSize for RefCell<T> {
    fn heap_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        match self.try_borrow() {
            Ok(value) => estimator.measure_detached(&*value),
            Err(_) => OBJECT_HEADER,
        }
    }
}

impl<T: HeapSize> HeapSize for Mutex<T> {
    fn heap_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        match self.try_lock() {
            Ok(value) => estimator.measure_detached(&*value),
            Err(TryLockError::Poisoned(poisoned)) => {
                estimator.measure_detached(&*poisoned.into_inner())
            }
            Err(TryLockError::WouldBlock) => OBJECT_HEADER,
        }
    }
}

impl<T: HeapSize> HeapSize for RwLock<T> {
    fn heap_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        match self.try_read() {
            Ok(value) => estimator.measure_detached(&*value),
            Err(TryLockError::Poisoned(poisoned)) => {
                estimator.measure_detached(&*poisoned.into_inner())
            }
            Err(TryLockError::WouldBlock) => OBJECT_HEADER,
        }
    }
}

// == Collections ==
// Keyed collections are an object pointing at a table array of entry
// objects, one per mapping.
fn table_size(len: usize) -> u64 {
    OBJECT_HEADER + REFERENCE_SIZE + ARRAY_HEADER + REFERENCE_SIZE * len as u64
}

impl<K: FieldSize, V: FieldSize, S> HeapSize for HashMap<K, V, S> {
    fn heap_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        let entries: u64 = self
            .iter()
            .map(|(key, value)| {
                OBJECT_HEADER + key.field_size(estimator) + value.field_size(estimator)
            })
            .sum();
        table_size(self.len()) + entries
    }
}

impl<K: FieldSize, V: FieldSize, S> FieldSize for HashMap<K, V, S> {
    fn field_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        estimator.visit_owned(self);
        REFERENCE_SIZE
    }
}

impl<K: FieldSize, V: FieldSize> HeapSize for BTreeMap<K, V> {
    fn heap_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        let entries: u64 = self
            .iter()
            .map(|(key, value)| {
                OBJECT_HEADER + key.field_size(estimator) + value.field_size(estimator)
            })
            .sum();
        table_size(self.len()) + entries
    }
}

impl<K: FieldSize, V: FieldSize> FieldSize for BTreeMap<K, V> {
    fn field_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        estimator.visit_owned(self);
        REFERENCE_SIZE
    }
}

impl<T: FieldSize, S> HeapSize for HashSet<T, S> {
    fn heap_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        let entries: u64 = self
            .iter()
            .map(|item| OBJECT_HEADER + item.field_size(estimator))
            .sum();
        table_size(self.len()) + entries
    }
}

impl<T: FieldSize, S> FieldSize for HashSet<T, S> {
    fn field_size<'a>(&'a self, estimator: &mut SizeEstimator<'a>) -> u64 {
        estimator.visit_owned(self);
        REFERENCE_SIZE
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_widths() {
        assert_eq!(SizeEstimator::estimate(&1u8), 9);
        assert_eq!(SizeEstimator::estimate(&1u16), 10);
        assert_eq!(SizeEstimator::estimate(&1i32), 12);
        assert_eq!(SizeEstimator::estimate(&1.0f64), 16);
    }

    #[test]
    fn test_primitive_arrays_scale_with_length() {
        assert_eq!(SizeEstimator::estimate(&Vec::<u8>::new()), ARRAY_HEADER);
        assert_eq!(SizeEstimator::estimate(&vec![0u32; 10]), ARRAY_HEADER + 40);
        assert_eq!(SizeEstimator::estimate(&vec![false; 3]), ARRAY_HEADER + 3);
    }

    #[test]
    fn test_capacity_does_not_count() {
        let mut bytes = Vec::with_capacity(1024);
        bytes.extend_from_slice(&[1u8, 2, 3]);
        assert_eq!(SizeEstimator::estimate(&bytes), ARRAY_HEADER + 3);
    }

    #[test]
    fn test_string() {
        assert_eq!(SizeEstimator::estimate(&String::new()), 28);
        assert_eq!(SizeEstimator::estimate(&"bar".to_string()), 31);
    }

    #[test]
    fn test_array_of_strings() {
        let words = vec!["a".to_string(), "bc".to_string()];
        let expected = ARRAY_HEADER + 2 * REFERENCE_SIZE + 29 + 30;
        assert_eq!(SizeEstimator::estimate(&words), expected);
    }

    #[test]
    fn test_box_root_is_transparent() {
        assert_eq!(
            SizeEstimator::estimate(&Box::new(vec![0u8; 4])),
            SizeEstimator::estimate(&vec![0u8; 4])
        );
    }

    #[test]
    fn test_arc_root_handles_share_referent() {
        let payload = Arc::new(vec![0u8; 100]);
        let alias = payload.clone();
        assert_eq!(
            SizeEstimator::estimate_all(&[&payload, &alias]),
            ARRAY_HEADER + 100
        );
    }

    #[test]
    fn test_vec_deque_single_header() {
        let mut deque = VecDeque::new();
        deque.push_back(1u64);
        deque.push_front(2u64);
        assert_eq!(SizeEstimator::estimate(&deque), ARRAY_HEADER + 16);
    }

    #[test]
    fn test_hash_map() {
        let mut map = HashMap::new();
        map.insert(1u32, 10u64);
        map.insert(2u32, 20u64);

        let entry = OBJECT_HEADER + 4 + 8;
        assert_eq!(SizeEstimator::estimate(&map), table_size(2) + 2 * entry);
    }

    #[test]
    fn test_btree_map_with_shared_values() {
        let shared = Arc::new(5u64);
        let mut map = BTreeMap::new();
        map.insert(1u8, shared.clone());
        map.insert(2u8, shared);

        let entry = OBJECT_HEADER + 1 + REFERENCE_SIZE;
        assert_eq!(
            SizeEstimator::estimate(&map),
            table_size(2) + 2 * entry + OBJECT_HEADER + 8
        );
    }

    #[test]
    fn test_weak_is_not_retained() {
        let strong = Arc::new(vec![0u8; 64]);
        let weak = vec![Arc::downgrade(&strong)];
        assert_eq!(
            SizeEstimator::estimate(&weak),
            ARRAY_HEADER + REFERENCE_SIZE
        );
    }

    #[test]
    fn test_optional_primitive_is_boxed() {
        let present = vec![Some(7u32)];
        let absent: Vec<Option<u32>> = vec![None];
        assert_eq!(
            SizeEstimator::estimate(&present),
            ARRAY_HEADER + REFERENCE_SIZE + OBJECT_HEADER + 4
        );
        assert_eq!(
            SizeEstimator::estimate(&absent),
            ARRAY_HEADER + REFERENCE_SIZE
        );
        // Agrees with an explicitly boxed value.
        assert_eq!(
            SizeEstimator::estimate(&present),
            SizeEstimator::estimate(&vec![Box::new(7u32)])
        );
    }

    #[test]
    fn test_optional_pointer_costs_pointer() {
        let shared = Arc::new(3u16);
        let slots = vec![Some(shared.clone()), None];
        assert_eq!(
            SizeEstimator::estimate(&slots),
            ARRAY_HEADER + 2 * REFERENCE_SIZE + OBJECT_HEADER + 2
        );
    }

    #[test]
    fn test_shared_referent_behind_lock_charged_once() {
        let payload = Arc::new(vec![0u8; 10]);
        let cell = Mutex::new(vec![payload.clone(), payload.clone()]);

        let together = SizeEstimator::estimate_all(&[&payload, &cell]);
        assert_eq!(together, (ARRAY_HEADER + 10) + (ARRAY_HEADER + 2 * REFERENCE_SIZE));
        assert_eq!(Arc::strong_count(&payload), 3);
    }

    #[test]
    fn test_deep_arc_mutex_chain() {
        struct Step {
            next: Option<Arc<Mutex<Step>>>,
        }
        crate::heap_size_struct!(Step { next });

        let mut head = Arc::new(Mutex::new(Step { next: None }));
        for _ in 1..50_000 {
            head = Arc::new(Mutex::new(Step { next: Some(head) }));
        }

        let step_size = OBJECT_HEADER + REFERENCE_SIZE;
        assert_eq!(SizeEstimator::estimate(&head), 50_000 * step_size);

        let mut cursor = Some(head);
        while let Some(step) = cursor {
            cursor = step.lock().unwrap().next.take();
        }
    }

    #[test]
    fn test_locked_mutex_charges_header() {
        let cell = Mutex::new(vec![0u8; 64]);
        assert_eq!(SizeEstimator::estimate(&cell), ARRAY_HEADER + 64);

        let _guard = cell.lock().unwrap();
        assert_eq!(SizeEstimator::estimate(&cell), OBJECT_HEADER);
    }

    #[test]
    fn test_borrowed_ref_cell_charges_header() {
        let cell = RefCell::new(vec![0u8; 16]);
        assert_eq!(SizeEstimator::estimate(&cell), ARRAY_HEADER + 16);

        let _guard = cell.borrow_mut();
        assert_eq!(SizeEstimator::estimate(&cell), OBJECT_HEADER);
    }

    #[test]
    fn test_rw_lock_readable_while_read_locked() {
        let lock = RwLock::new(7u32);
        let _reader = lock.read().unwrap();
        assert_eq!(SizeEstimator::estimate(&lock), OBJECT_HEADER + 4);
    }
}
