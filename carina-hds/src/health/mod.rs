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

pub mod checkers;
pub mod counter;

pub use counter::HealthStatusCounter;

use crate::cluster::HostKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Result of a single probe attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckOutcome {
    Success,
    Failure,
    Timeout,
}

impl CheckOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, CheckOutcome::Success)
    }
}

/// One probe result, sent from a checker task to the delegate loop.
/// The generation pins the outcome to the specifier it was spawned
/// for, so results racing a specifier update can be discarded.
#[derive(Clone, Copy, Debug)]
pub struct ProbeOutcome {
    pub key: HostKey,
    pub generation: u64,
    pub outcome: CheckOutcome,
}
