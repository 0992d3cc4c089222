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

use super::{
    checker::{HealthCheckerLoop, IntervalWaiter, ProtocolChecker},
    ProbeTarget,
};
use crate::health::{CheckOutcome, ProbeOutcome};
use carina_configuration::config::health::{CheckConfig, GrpcHealthCheck};
use compact_str::CompactString;
use std::sync::Arc;
use tokio::{
    sync::{mpsc, Notify},
    task::JoinHandle,
};
use tonic::transport::{Channel, Endpoint};
use tonic_health::pb::{health_check_response::ServingStatus, health_client::HealthClient, HealthCheckRequest};
use tracing::debug;

pub(super) fn try_spawn_grpc_health_checker(
    target: ProbeTarget,
    config: CheckConfig,
    settings: GrpcHealthCheck,
    sender: mpsc::Sender<ProbeOutcome>,
    stop_signal: Arc<Notify>,
) -> crate::Result<JoinHandle<crate::Result<()>>> {
    let endpoint = Endpoint::from_shared(format!("http://{}", target.authority))?;
    let checker = GrpcChecker { client: HealthClient::new(endpoint.connect_lazy()), service_name: settings.service_name };
    Ok(tokio::spawn(HealthCheckerLoop::new(target, config, sender, stop_signal, IntervalWaiter, checker).run()))
}

struct GrpcChecker {
    client: HealthClient<Channel>,
    service_name: CompactString,
}

impl ProtocolChecker for GrpcChecker {
    async fn check(&mut self) -> crate::Result<CheckOutcome> {
        let request = HealthCheckRequest { service: self.service_name.to_string() };
        match self.client.check(request).await {
            Ok(response) => match response.into_inner().status() {
                ServingStatus::Serving => Ok(CheckOutcome::Success),
                status => {
                    debug!("health check rpc answered with {}", status.as_str_name());
                    Ok(CheckOutcome::Failure)
                },
            },
            Err(status) => {
                debug!("health check rpc failed: {status}");
                Ok(CheckOutcome::Failure)
            },
        }
    }
}
