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

mod checker;
mod grpc;
mod http;
mod tcp;

pub use checker::{HealthCheckerLoop, IntervalWaiter, ProtocolChecker, WaitInterval};

use super::ProbeOutcome;
use crate::cluster::{ClusterModel, HostKey};
use carina_configuration::config::health::{CheckConfig, HealthCheckProtocol};
use compact_str::CompactString;
use std::sync::Arc;
use tokio::{
    sync::{mpsc, Notify},
    task::JoinHandle,
};
use tracing::warn;

/// Identity of one probe task: which counter its outcomes feed and
/// where to connect.
#[derive(Clone, Debug)]
pub struct ProbeTarget {
    pub key: HostKey,
    pub generation: u64,
    pub cluster: CompactString,
    pub authority: String,
}

/// A running probe task for one (host, check) pair.
#[derive(Debug)]
pub struct EndpointProbe {
    probe_task: JoinHandle<crate::Result<()>>,
    stop_signal: Arc<Notify>,
}

impl EndpointProbe {
    pub fn try_new(
        target: ProbeTarget,
        config: &CheckConfig,
        sender: mpsc::Sender<ProbeOutcome>,
    ) -> crate::Result<Self> {
        let stop_signal = Arc::new(Notify::new());
        let probe_task = match &config.protocol {
            HealthCheckProtocol::Http(settings) => http::try_spawn_http_health_checker(
                target,
                config.clone(),
                settings.clone(),
                sender,
                Arc::clone(&stop_signal),
            )?,
            HealthCheckProtocol::Tcp(settings) => {
                tcp::spawn_tcp_health_checker(target, config.clone(), settings.clone(), sender, Arc::clone(&stop_signal))
            },
            HealthCheckProtocol::Grpc(settings) => grpc::try_spawn_grpc_health_checker(
                target,
                config.clone(),
                settings.clone(),
                sender,
                Arc::clone(&stop_signal),
            )?,
        };
        Ok(Self { probe_task, stop_signal })
    }

    pub async fn stop(self) {
        // each probe task is the sole consumer of its signal; notify_one
        // stores a permit, so a task caught between two waits still sees
        // the stop at its next wait point
        self.stop_signal.notify_one();
        match self.probe_task.await {
            Ok(Ok(())) => {},
            Ok(Err(error)) => warn!("health check probe stopped with an error: {error}"),
            Err(error) => warn!("health check probe task failed to stop cleanly: {error}"),
        }
    }
}

/// Owns the probe tasks of the active specifier. Probes report through
/// the shared outcome channel and are all stopped before a new
/// specifier is applied.
#[derive(Debug)]
pub struct ProbeScheduler {
    sender: mpsc::Sender<ProbeOutcome>,
    probes: Vec<EndpointProbe>,
}

impl ProbeScheduler {
    pub fn new(sender: mpsc::Sender<ProbeOutcome>) -> Self {
        Self { sender, probes: Vec::new() }
    }

    /// Spawns one probe per (host, check) pair of the model. A probe
    /// that fails to start is logged and skipped; its host then simply
    /// never turns healthy.
    pub fn start(&mut self, model: &ClusterModel) {
        for (key, cluster, host, check) in model.probe_targets() {
            let target = ProbeTarget {
                key,
                generation: model.generation(),
                cluster: cluster.name.clone(),
                authority: host.endpoint.authority(),
            };
            match EndpointProbe::try_new(target, check, self.sender.clone()) {
                Ok(probe) => self.probes.push(probe),
                Err(error) => {
                    warn!(cluster = %cluster.name, endpoint = %host.endpoint, "failed to start health check probe: {error}");
                },
            }
        }
    }

    pub async fn stop_all(&mut self) {
        for probe in self.probes.drain(..) {
            probe.stop().await;
        }
    }
}
