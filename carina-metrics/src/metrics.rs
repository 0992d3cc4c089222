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

use crate::sharded::ShardedU64;
use opentelemetry::KeyValue;
use std::{sync::OnceLock, thread::ThreadId};
use tracing::info;

pub mod clusters;
pub mod hds;

pub struct Metric<T> {
    pub prefix: &'static str,
    pub name: &'static str,
    pub descr: &'static str,
    pub value: T,
}

impl<T> Metric<T> {
    fn new(prefix: &'static str, name: &'static str, descr: &'static str, value: T) -> Self {
        Metric { prefix, name, descr, value }
    }
}

/// Aggregated value of a counter, 0 if it was never written (or
/// metrics were never initialized).
pub fn counter_value(counter: &OnceLock<Metric<ShardedU64<ThreadId>>>, key: &[KeyValue]) -> u64 {
    counter.get().and_then(|metric| metric.value.load(key)).unwrap_or(0)
}

// Initializes all counter statics. Must be called once at startup,
// after the meter provider is set when the exporter is in use.
pub fn init_global_metrics() {
    info!("Initializing global metrics...");
    hds::init_hds_metrics();
    clusters::init_clusters_metrics();
}
