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

pub mod bootstrap;
pub use bootstrap::{Bootstrap, Node};
pub mod health;
pub use health::{CheckConfig, ClusterCheckGroup, HealthCheckProtocol, HealthCheckSpec};
pub mod log;
pub use log::Log;

use crate::{options::Options, Result};
use carina_metrics::MetricsConfig;
use serde::{de::DeserializeOwned, Deserialize};
use std::{fs::File, path::Path};

#[derive(Debug, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub logging: Log,
    #[serde(default)]
    pub metrics: Option<MetricsConfig>,
    pub bootstrap: Bootstrap,
}

impl Config {
    pub fn new(opt: &Options) -> Result<Self> {
        deserialize_yaml(&opt.config)
    }
}

pub fn deserialize_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    serde_path_to_error::deserialize(serde_yaml::Deserializer::from_reader(&file)).map_err(crate::Error::from)
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn minimal_config() {
        let yaml = r#"
bootstrap:
  hds:
    server_address: "http://127.0.0.1:18000"
  node:
    id: "delegate-0"
"#;
        let conf: Config = serde_yaml::from_str(yaml).expect("failed to parse config");
        assert_eq!(conf.bootstrap.hds.server_address, "http://127.0.0.1:18000");
        assert_eq!(conf.bootstrap.node.as_ref().map(|n| n.id.as_str()), Some("delegate-0"));
        assert!(conf.logging.log_level.is_none());
    }

    #[test]
    fn config_with_logging() {
        let yaml = r#"
logging:
  log_level: "debug,hyper=info"
  log_directory: "/var/log/carina"
  log_file: "delegate.log"
bootstrap:
  hds:
    server_address: "https://hds.example.com:443"
"#;
        let conf: Config = serde_yaml::from_str(yaml).expect("failed to parse config");
        assert!(conf.logging.log_level.is_some());
        assert_eq!(conf.logging.log_file.as_deref(), Some("delegate.log"));
        assert!(conf.bootstrap.node.is_none());
        assert!(conf.metrics.is_none());
    }

    #[test]
    fn config_with_metrics() {
        let yaml = r#"
metrics:
  endpoint: "http://127.0.0.1:4317"
  export_period: "10s"
bootstrap:
  hds:
    server_address: "http://127.0.0.1:18000"
"#;
        let conf: Config = serde_yaml::from_str(yaml).expect("failed to parse config");
        let metrics = conf.metrics.expect("metrics config missing");
        assert_eq!(metrics.endpoint, "http://127.0.0.1:4317");
        assert_eq!(metrics.export_period, Some(std::time::Duration::from_secs(10)));
    }
}
