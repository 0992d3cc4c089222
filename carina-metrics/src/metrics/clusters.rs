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

use crate::{metrics::Metric, sharded::ShardedU64};
use opentelemetry::KeyValue;
#[cfg(feature = "metrics")]
use opentelemetry::global;
use std::{sync::OnceLock, thread::ThreadId};

// Per-cluster counters, keyed by a `cluster` attribute.

pub static HEALTH_CHECK_SUCCESS: OnceLock<Metric<ShardedU64<ThreadId>>> = OnceLock::new();
pub static HEALTH_CHECK_FAILURE: OnceLock<Metric<ShardedU64<ThreadId>>> = OnceLock::new();

pub fn cluster_key(cluster_name: &str) -> [KeyValue; 1] {
    [KeyValue::new("cluster", cluster_name.to_owned())]
}

pub(crate) fn init_clusters_metrics() {
    init_observable_counter!(
        HEALTH_CHECK_SUCCESS,
        "cluster",
        "health_check.success",
        "Total successful health check probes"
    );
    init_observable_counter!(
        HEALTH_CHECK_FAILURE,
        "cluster",
        "health_check.failure",
        "Total failed health check probes (including timeouts)"
    );
}
