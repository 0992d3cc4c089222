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

use crate::health::{CheckOutcome, HealthStatus, HealthStatusCounter};
use carina_configuration::config::health::{CheckConfig, EndpointAddress, HealthCheckSpec, Locality};
use compact_str::CompactString;

/// Index of one (cluster, host, check) state inside a [`ClusterModel`].
/// Valid only for the model generation it was built against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HostKey {
    pub cluster: usize,
    pub host: usize,
    pub check: usize,
}

/// The delegate's view of the current health check assignment: every
/// cluster of the active specifier, with one status counter per
/// (host, check) pair. Clusters and hosts keep the order the specifier
/// declared them in, which is also the order reports are built in.
#[derive(Debug)]
pub struct ClusterModel {
    generation: u64,
    clusters: Vec<ClusterEntry>,
}

#[derive(Debug)]
pub struct ClusterEntry {
    pub name: CompactString,
    pub checks: Vec<CheckConfig>,
    pub hosts: Vec<HostEntry>,
}

#[derive(Debug)]
pub struct HostEntry {
    pub endpoint: EndpointAddress,
    pub locality: Locality,
    states: Vec<HealthStatusCounter>,
}

/// Result of feeding one probe outcome into the model.
#[derive(Debug)]
pub struct AppliedOutcome {
    pub cluster: CompactString,
    pub transition: Option<HealthStatus>,
}

impl ClusterModel {
    pub fn empty() -> Self {
        Self { generation: 0, clusters: Vec::new() }
    }

    pub fn new(spec: &HealthCheckSpec, generation: u64) -> Self {
        let clusters = spec
            .clusters
            .iter()
            .map(|group| {
                // duplicate endpoints are tracked independently
                let hosts = group
                    .localities
                    .iter()
                    .flat_map(|locality| {
                        locality.endpoints.iter().map(|endpoint| HostEntry {
                            endpoint: endpoint.clone(),
                            locality: locality.locality.clone(),
                            states: group
                                .checks
                                .iter()
                                .map(|check| {
                                    HealthStatusCounter::new(check.healthy_threshold, check.unhealthy_threshold)
                                })
                                .collect(),
                        })
                    })
                    .collect();
                ClusterEntry { name: group.name.clone(), checks: group.checks.clone(), hosts }
            })
            .collect();
        Self { generation, clusters }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn clusters(&self) -> impl Iterator<Item = &ClusterEntry> {
        self.clusters.iter()
    }

    /// Every (host, check) pair a probe task has to be spawned for.
    pub fn probe_targets(&self) -> impl Iterator<Item = (HostKey, &ClusterEntry, &HostEntry, &CheckConfig)> {
        self.clusters.iter().enumerate().flat_map(|(cluster_idx, cluster)| {
            cluster.hosts.iter().enumerate().flat_map(move |(host_idx, host)| {
                cluster.checks.iter().enumerate().map(move |(check_idx, check)| {
                    (HostKey { cluster: cluster_idx, host: host_idx, check: check_idx }, cluster, host, check)
                })
            })
        })
    }

    /// Feeds one probe outcome into the matching status counter.
    /// Returns `None` when the key no longer resolves.
    pub fn apply(&mut self, key: HostKey, outcome: CheckOutcome) -> Option<AppliedOutcome> {
        let cluster = self.clusters.get_mut(key.cluster)?;
        let state = cluster.hosts.get_mut(key.host)?.states.get_mut(key.check)?;
        let transition = match outcome {
            CheckOutcome::Success => state.add_success(),
            CheckOutcome::Failure | CheckOutcome::Timeout => state.add_failure(),
        };
        Some(AppliedOutcome { cluster: cluster.name.clone(), transition })
    }
}

impl HostEntry {
    /// The status reported for this host: healthy only when every
    /// check has completed at least once and none of them is failing.
    pub fn aggregated_status(&self) -> HealthStatus {
        let all_healthy =
            !self.states.is_empty() && self.states.iter().all(|s| s.status() == Some(HealthStatus::Healthy));
        if all_healthy {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carina_configuration::config::health::{
        ClusterCheckGroup, HealthCheckProtocol, HttpHealthCheck, LocalityEndpoints, TcpHealthCheck,
    };
    use std::time::Duration;

    fn check(unhealthy_threshold: u16, healthy_threshold: u16) -> CheckConfig {
        CheckConfig {
            timeout: Duration::from_secs(1),
            interval: Duration::from_secs(1),
            unhealthy_threshold,
            healthy_threshold,
            unhealthy_interval: None,
            protocol: HealthCheckProtocol::Http(HttpHealthCheck::default()),
        }
    }

    fn endpoint(address: &str, port: u16) -> EndpointAddress {
        EndpointAddress { address: address.into(), port }
    }

    fn spec() -> HealthCheckSpec {
        HealthCheckSpec {
            interval: Duration::from_secs(1),
            clusters: vec![
                ClusterCheckGroup {
                    name: "anna".into(),
                    checks: vec![check(2, 2)],
                    localities: vec![
                        LocalityEndpoints {
                            locality: Locality { region: "eu".into(), ..Default::default() },
                            endpoints: vec![endpoint("10.0.0.1", 80), endpoint("10.0.0.2", 80)],
                        },
                        LocalityEndpoints {
                            locality: Locality { region: "us".into(), ..Default::default() },
                            endpoints: vec![endpoint("10.0.1.1", 80)],
                        },
                    ],
                },
                ClusterCheckGroup {
                    name: "cat".into(),
                    checks: vec![
                        check(1, 1),
                        CheckConfig {
                            protocol: HealthCheckProtocol::Tcp(TcpHealthCheck::default()),
                            ..check(1, 1)
                        },
                    ],
                    localities: vec![LocalityEndpoints {
                        locality: Locality::default(),
                        endpoints: vec![endpoint("10.0.2.1", 443)],
                    }],
                },
            ],
        }
    }

    #[test]
    fn model_preserves_declaration_order() {
        let model = ClusterModel::new(&spec(), 1);
        assert_eq!(model.generation(), 1);
        let clusters: Vec<_> = model.clusters().collect();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].name, "anna");
        assert_eq!(clusters[1].name, "cat");
        let hosts: Vec<_> = clusters[0].hosts.iter().map(|h| h.endpoint.authority()).collect();
        assert_eq!(hosts, vec!["10.0.0.1:80", "10.0.0.2:80", "10.0.1.1:80"]);
        assert_eq!(clusters[0].hosts[2].locality.region, "us");
    }

    #[test]
    fn one_probe_target_per_host_and_check() {
        let model = ClusterModel::new(&spec(), 1);
        // anna: 3 hosts x 1 check, cat: 1 host x 2 checks
        assert_eq!(model.probe_targets().count(), 5);
        let keys: Vec<_> = model.probe_targets().map(|(key, ..)| key).collect();
        assert!(keys.contains(&HostKey { cluster: 1, host: 0, check: 1 }));
    }

    #[test]
    fn apply_updates_the_matching_counter() {
        let mut model = ClusterModel::new(&spec(), 1);
        let key = HostKey { cluster: 0, host: 1, check: 0 };

        let applied = model.apply(key, CheckOutcome::Success).expect("valid key");
        assert_eq!(applied.cluster, "anna");
        assert_eq!(applied.transition, Some(HealthStatus::Healthy));

        let clusters: Vec<_> = model.clusters().collect();
        assert_eq!(clusters[0].hosts[1].aggregated_status(), HealthStatus::Healthy);
        // the other hosts are still unprobed
        assert_eq!(clusters[0].hosts[0].aggregated_status(), HealthStatus::Unhealthy);
    }

    #[test]
    fn apply_rejects_dangling_keys() {
        let mut model = ClusterModel::new(&spec(), 1);
        assert!(model.apply(HostKey { cluster: 7, host: 0, check: 0 }, CheckOutcome::Success).is_none());
        assert!(model.apply(HostKey { cluster: 0, host: 9, check: 0 }, CheckOutcome::Success).is_none());
        assert!(model.apply(HostKey { cluster: 0, host: 0, check: 3 }, CheckOutcome::Success).is_none());
    }

    #[test]
    fn host_is_unhealthy_when_any_check_fails() {
        let mut model = ClusterModel::new(&spec(), 1);
        let tcp_check = HostKey { cluster: 1, host: 0, check: 1 };
        let http_check = HostKey { cluster: 1, host: 0, check: 0 };

        model.apply(http_check, CheckOutcome::Success);
        model.apply(tcp_check, CheckOutcome::Timeout);
        let cat = model.clusters().nth(1).expect("cluster cat");
        assert_eq!(cat.hosts[0].aggregated_status(), HealthStatus::Unhealthy);

        model.apply(tcp_check, CheckOutcome::Success);
        let cat = model.clusters().nth(1).expect("cluster cat");
        assert_eq!(cat.hosts[0].aggregated_status(), HealthStatus::Healthy);
    }

    #[test]
    fn duplicate_endpoints_are_tracked_independently() {
        let mut spec = spec();
        spec.clusters[0].localities[1].endpoints.push(endpoint("10.0.0.1", 80));
        let mut model = ClusterModel::new(&spec, 1);

        model.apply(HostKey { cluster: 0, host: 0, check: 0 }, CheckOutcome::Failure);
        let anna = model.clusters().next().expect("cluster anna");
        assert_eq!(anna.hosts[0].endpoint, anna.hosts[3].endpoint);
        assert_eq!(anna.hosts[0].aggregated_status(), HealthStatus::Unhealthy);
        assert_eq!(anna.hosts[3].aggregated_status(), HealthStatus::Unhealthy); // unprobed
    }
}
