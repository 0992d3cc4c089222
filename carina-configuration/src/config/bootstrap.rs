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

use compact_str::CompactString;
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct Bootstrap {
    pub hds: HdsConfig,
    #[serde(default)]
    pub node: Option<Node>,
}

/// Where to reach the health discovery management server.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HdsConfig {
    /// Full URI of the management server, e.g. `http://127.0.0.1:18000`.
    pub server_address: CompactString,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Node {
    pub id: CompactString,
    #[serde(default)]
    pub cluster: CompactString,
}

impl Node {
    pub fn to_wire(&self) -> carina_api::Node {
        carina_api::Node {
            id: self.id.to_string(),
            cluster: self.cluster.to_string(),
            user_agent_name: "carina".to_owned(),
        }
    }
}
