//! Process-wide constant pool.
//!
//! Quoted literals that cannot be emitted inline are registered here at
//! analysis time; `LoadConstant` carries the returned slot id. Registration
//! takes `&self` so analysis threads can share one pool.

use std::sync::Mutex;

use hostinterop_core::{ConstantRegistry, Value};

/// Append-only constant table.
///
/// Ids are assigned under the lock, so they are unique and increase
/// monotonically. Identical values are not deduplicated: every quoted
/// occurrence owns its slot.
#[derive(Debug, Default)]
pub struct ConstantPool {
    constants: Mutex<Vec<Value>>,
}

impl ConstantPool {
    /// Create a new empty constant pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// The value stored at `id`.
    pub fn get(&self, id: u32) -> Option<Value> {
        let constants = self.constants.lock().ok()?;
        constants.get(usize::try_from(id).ok()?).cloned()
    }

    /// Number of registered constants.
    pub fn len(&self) -> usize {
        self.constants.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConstantRegistry for ConstantPool {
    fn register(&self, value: Value) -> u32 {
        // A poisoned lock still guards a consistent Vec: pushes never panic
        // halfway through.
        let mut constants = match self.constants.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let id = constants.len() as u32;
        constants.push(value);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn register_and_get() {
        let pool = ConstantPool::new();
        assert!(pool.is_empty());
        let a = pool.register(Value::I64(42));
        let b = pool.register(Value::string("hello"));
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(pool.get(a), Some(Value::I64(42)));
        assert_eq!(pool.get(b), Some(Value::string("hello")));
        assert_eq!(pool.get(2), None);
    }

    #[test]
    fn identical_values_get_fresh_ids() {
        let pool = ConstantPool::new();
        let a = pool.register(Value::I64(7));
        let b = pool.register(Value::I64(7));
        assert_ne!(a, b);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn concurrent_registration_yields_unique_ids() {
        let pool = Arc::new(ConstantPool::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    (0..50)
                        .map(|i| pool.register(Value::I64(t * 100 + i)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<u32> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 200);
        assert_eq!(pool.len(), 200);
    }
}
