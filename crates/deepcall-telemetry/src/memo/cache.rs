// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Per-function memoization tables.
//!
//! Each function identity owns one typed table. Tables are stored type-erased
//! and recovered by downcasting, so callers keep their own key and value types
//! instead of round-tripping through text. Entries are never evicted.

use deepcall_core::{FunctionId, MonitorError, MonitorResult};
use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A type-erased view of one function's memo table.
trait ErasedTable: Send {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn len(&self) -> usize;
}

/// The concrete table for one key/value type pair.
struct MemoTable<K, V> {
    entries: HashMap<K, V>,
}

impl<K, V> ErasedTable for MemoTable<K, V>
where
    K: Hash + Eq + Send + 'static,
    V: Send + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Thread-safe store of memoized results, keyed by function identity.
#[derive(Default)]
pub struct MemoCache {
    tables: Mutex<HashMap<FunctionId, Box<dyn ErasedTable>>>,
}

impl MemoCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<FunctionId, Box<dyn ErasedTable>>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Looks up a memoized value.
    ///
    /// Returns `None` if the key is absent, or if `function`'s table was
    /// created with different key/value types.
    pub fn get<K, V>(&self, function: &FunctionId, key: &K) -> Option<V>
    where
        K: Hash + Eq + Send + 'static,
        V: Clone + Send + 'static,
    {
        let tables = self.lock();
        tables
            .get(function)?
            .as_any()
            .downcast_ref::<MemoTable<K, V>>()?
            .entries
            .get(key)
            .cloned()
    }

    /// Stores a value, replacing any previous value for the same key.
    pub fn put<K, V>(&self, function: &FunctionId, key: K, value: V) -> MonitorResult<()>
    where
        K: Hash + Eq + Send + 'static,
        V: Send + 'static,
    {
        let mut tables = self.lock();
        let table = tables.entry(function.clone()).or_insert_with(|| -> Box<dyn ErasedTable> {
            Box::new(MemoTable::<K, V> {
                entries: HashMap::new(),
            })
        });

        match table.as_any_mut().downcast_mut::<MemoTable<K, V>>() {
            Some(table) => {
                table.entries.insert(key, value);
                Ok(())
            }
            None => {
                log::warn!("Memo table for {function} holds different key/value types");
                Err(MonitorError::MemoTypeMismatch {
                    function: function.clone(),
                })
            }
        }
    }

    /// Number of entries memoized for `function`.
    pub fn len(&self, function: &FunctionId) -> usize {
        self.lock().get(function).map_or(0, |table| table.len())
    }

    /// Number of functions with a memo table.
    pub fn table_count(&self) -> usize {
        self.lock().len()
    }
}

impl Debug for MemoCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoCache")
            .field("tables", &self.table_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_then_get() {
        let cache = MemoCache::new();
        let id = FunctionId::new("fib", 1);

        cache.put(&id, 10u64, 55u64).unwrap();
        assert_eq!(cache.get::<u64, u64>(&id, &10), Some(55));
        assert_eq!(cache.len(&id), 1);
    }

    #[test]
    fn test_get_missing_key() {
        let cache = MemoCache::new();
        let id = FunctionId::new("fib", 1);
        assert_eq!(cache.get::<u64, u64>(&id, &3), None);

        cache.put(&id, 1u64, 1u64).unwrap();
        assert_eq!(cache.get::<u64, u64>(&id, &3), None);
    }

    #[test]
    fn test_last_write_wins() {
        let cache = MemoCache::new();
        let id = FunctionId::new("lookup", 1);

        cache.put(&id, "k".to_string(), 1i32).unwrap();
        cache.put(&id, "k".to_string(), 2i32).unwrap();

        assert_eq!(cache.get::<String, i32>(&id, &"k".to_string()), Some(2));
        assert_eq!(cache.len(&id), 1);
    }

    #[test]
    fn test_type_mismatch_is_rejected() {
        let cache = MemoCache::new();
        let id = FunctionId::new("fib", 1);
        cache.put(&id, 1u64, 1u64).unwrap();

        let result = cache.put(&id, "one".to_string(), 1u64);
        assert!(matches!(
            result,
            Err(MonitorError::MemoTypeMismatch { ref function }) if *function == id
        ));
        assert_eq!(cache.get::<String, u64>(&id, &"one".to_string()), None);
        assert_eq!(cache.get::<u64, u64>(&id, &1), Some(1));
    }

    #[test]
    fn test_tables_are_per_function() {
        let cache = MemoCache::new();
        let a = FunctionId::new("fib", 1);
        let b = FunctionId::new("fib", 2);

        cache.put(&a, 5u32, 5u64).unwrap();
        assert_eq!(cache.get::<u32, u64>(&b, &5), None);
        assert_eq!(cache.table_count(), 1);
    }
}
