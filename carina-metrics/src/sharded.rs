// SPDX-FileCopyrightText: © 2025 Huawei Cloud Computing Technologies Co., Ltd
// SPDX-License-Identifier: Apache-2.0
//
// Copyright 2025 Huawei Cloud Computing Technologies Co., Ltd
//
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
//

use std::{
    collections::HashMap,
    fmt,
    hash::{BuildHasherDefault, Hash},
    sync::atomic::{AtomicU64, Ordering},
};

use ahash::AHasher;
use dashmap::DashMap;
use opentelemetry::KeyValue;

/// A counter sharded by writer (typically `ThreadId`) so additions
/// stay uncontended. Reads aggregate across shards.
pub struct ShardedU64<S> {
    data: DashMap<S, HashMap<Vec<KeyValue>, AtomicU64>, BuildHasherDefault<AHasher>>,
}

impl<S: Eq + Hash> ShardedU64<S> {
    pub fn new() -> Self {
        ShardedU64 { data: DashMap::default() }
    }

    pub fn add(&self, value: u64, shard_id: S, key: &[KeyValue]) {
        let mut shard = self.data.entry(shard_id).or_default();
        if let Some(counter) = shard.get(key) {
            counter.fetch_add(value, Ordering::Relaxed);
        } else {
            shard.entry(key.to_vec()).or_insert(AtomicU64::new(value));
        }
    }

    /// Sum across shards for one key, `None` if never written.
    pub fn load(&self, key: &[KeyValue]) -> Option<u64> {
        let mut total = None;
        for shard in self.data.iter() {
            if let Some(counter) = shard.value().get(key) {
                let value = counter.load(Ordering::Relaxed);
                total = Some(total.unwrap_or(0) + value);
            }
        }
        total
    }

    pub fn load_all(&self) -> HashMap<Vec<KeyValue>, u64> {
        let mut result = HashMap::new();
        for shard in self.data.iter() {
            for (key, counter) in shard.value().iter() {
                let value = counter.load(Ordering::Relaxed);
                *result.entry(key.clone()).or_insert(0) += value;
            }
        }
        result
    }
}

impl<S: Eq + Hash> Default for ShardedU64<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Eq + Hash> fmt::Debug for ShardedU64<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.load_all()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread::ThreadId};

    #[test]
    fn add_and_load() {
        let s = ShardedU64::new();
        let tid = std::thread::current().id();
        let key = [KeyValue::new("cluster", "anna")];

        assert_eq!(s.load(&key), None);

        s.add(10, tid, &key);
        assert_eq!(s.load(&key), Some(10));

        s.add(5, tid, &key);
        assert_eq!(s.load(&key), Some(15));
        assert_eq!(s.load(&[KeyValue::new("cluster", "cat")]), None);
    }

    #[test]
    fn multi_shard_aggregation() {
        let s = Arc::new(ShardedU64::<ThreadId>::new());
        let key = vec![KeyValue::new("cluster", "anna")];
        let num_threads = 8;
        let increments = 1000;

        let handles: Vec<_> = (0..num_threads)
            .map(|_| {
                let s = Arc::clone(&s);
                let key = key.clone();
                std::thread::spawn(move || {
                    let tid = std::thread::current().id();
                    for _ in 0..increments {
                        s.add(1, tid, &key);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(s.load(&key), Some(num_threads * increments));
        let all = s.load_all();
        assert_eq!(all.get(&key), Some(&(num_threads * increments)));
        assert_eq!(all.len(), 1);
    }
}
