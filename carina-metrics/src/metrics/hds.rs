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
#[cfg(feature = "metrics")]
use opentelemetry::global;
use std::{sync::OnceLock, thread::ThreadId};

/// Specifiers accepted and applied.
pub static HDS_REQUESTS: OnceLock<Metric<ShardedU64<ThreadId>>> = OnceLock::new();
/// Health reports sent to the management server.
pub static HDS_RESPONSES: OnceLock<Metric<ShardedU64<ThreadId>>> = OnceLock::new();

pub(crate) fn init_hds_metrics() {
    init_observable_counter!(
        HDS_REQUESTS,
        "hds_delegate",
        "requests",
        "Total health check specifiers accepted from the management server"
    );
    init_observable_counter!(
        HDS_RESPONSES,
        "hds_delegate",
        "responses",
        "Total endpoint health responses sent to the management server"
    );
}
