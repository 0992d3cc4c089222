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

use crate::{cluster::ClusterModel, health::HealthStatus};
use carina_api as api;
use carina_configuration::config::health::EndpointAddress;

/// Builds the wire report for the current model state: one entry per
/// host, clusters and hosts in the order the specifier declared them.
pub fn build_report(model: &ClusterModel) -> api::EndpointHealthResponse {
    let endpoints_health = model
        .clusters()
        .flat_map(|cluster| {
            cluster.hosts.iter().map(|host| api::EndpointHealth {
                endpoint: Some(wire_endpoint(&host.endpoint)),
                health_status: wire_status(host.aggregated_status()) as i32,
            })
        })
        .collect();
    api::EndpointHealthResponse { endpoints_health }
}

fn wire_endpoint(address: &EndpointAddress) -> api::Endpoint {
    api::Endpoint {
        address: Some(api::Address {
            socket_address: Some(api::SocketAddress {
                address: address.address.to_string(),
                port_value: u32::from(address.port),
            }),
        }),
    }
}

fn wire_status(status: HealthStatus) -> api::HealthStatus {
    match status {
        HealthStatus::Healthy => api::HealthStatus::Healthy,
        HealthStatus::Unhealthy => api::HealthStatus::Unhealthy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::HostKey;
    use crate::health::CheckOutcome;
    use carina_configuration::config::health::{
        CheckConfig, ClusterCheckGroup, HealthCheckProtocol, HealthCheckSpec, HttpHealthCheck, Locality,
        LocalityEndpoints,
    };
    use std::time::Duration;

    fn spec() -> HealthCheckSpec {
        let check = CheckConfig {
            timeout: Duration::from_secs(1),
            interval: Duration::from_secs(1),
            unhealthy_threshold: 1,
            healthy_threshold: 1,
            unhealthy_interval: None,
            protocol: HealthCheckProtocol::Http(HttpHealthCheck::default()),
        };
        HealthCheckSpec {
            interval: Duration::from_secs(1),
            clusters: vec![
                ClusterCheckGroup {
                    name: "anna".into(),
                    checks: vec![check.clone()],
                    localities: vec![LocalityEndpoints {
                        locality: Locality::default(),
                        endpoints: vec![
                            EndpointAddress { address: "10.0.0.1".into(), port: 80 },
                            EndpointAddress { address: "10.0.0.2".into(), port: 81 },
                        ],
                    }],
                },
                ClusterCheckGroup {
                    name: "cat".into(),
                    checks: vec![check],
                    localities: vec![LocalityEndpoints {
                        locality: Locality::default(),
                        endpoints: vec![EndpointAddress { address: "10.0.1.1".into(), port: 443 }],
                    }],
                },
            ],
        }
    }

    fn statuses(report: &api::EndpointHealthResponse) -> Vec<api::HealthStatus> {
        report.endpoints_health.iter().map(|entry| entry.health_status()).collect()
    }

    #[test]
    fn unprobed_hosts_are_reported_unhealthy() {
        let model = ClusterModel::new(&spec(), 1);
        let report = build_report(&model);
        assert_eq!(report.endpoints_health.len(), 3);
        assert_eq!(
            statuses(&report),
            vec![api::HealthStatus::Unhealthy, api::HealthStatus::Unhealthy, api::HealthStatus::Unhealthy]
        );
    }

    #[test]
    fn report_keeps_declaration_order() {
        let mut model = ClusterModel::new(&spec(), 1);
        model.apply(HostKey { cluster: 0, host: 1, check: 0 }, CheckOutcome::Success);
        model.apply(HostKey { cluster: 1, host: 0, check: 0 }, CheckOutcome::Success);

        let report = build_report(&model);
        assert_eq!(
            statuses(&report),
            vec![api::HealthStatus::Unhealthy, api::HealthStatus::Healthy, api::HealthStatus::Healthy]
        );

        let addresses: Vec<_> = report
            .endpoints_health
            .iter()
            .map(|entry| {
                let socket = entry
                    .endpoint
                    .as_ref()
                    .and_then(|e| e.address.as_ref())
                    .and_then(|a| a.socket_address.as_ref())
                    .expect("endpoint address");
                format!("{}:{}", socket.address, socket.port_value)
            })
            .collect();
        assert_eq!(addresses, vec!["10.0.0.1:80", "10.0.0.2:81", "10.0.1.1:443"]);
    }

    #[test]
    fn empty_model_builds_an_empty_report() {
        let report = build_report(&ClusterModel::empty());
        assert!(report.endpoints_health.is_empty());
    }
}
