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

use crate::{
    cluster::ClusterModel,
    health::{checkers::ProbeScheduler, ProbeOutcome},
    report,
};
use carina_api::{
    hds::health_check_request_or_endpoint_health_response::RequestType,
    health_discovery_service_client::HealthDiscoveryServiceClient, EndpointHealthResponse, HealthCheckRequest,
    HealthCheckRequestOrEndpointHealthResponse, HealthCheckSpecifier,
};
use carina_configuration::config::{health::HealthCheckSpec, Node};
use carina_metrics::{
    metrics::{
        clusters::{cluster_key, HEALTH_CHECK_FAILURE, HEALTH_CHECK_SUCCESS},
        hds::{HDS_REQUESTS, HDS_RESPONSES},
    },
    with_metric,
};
use std::time::Duration;
use tokio::{
    sync::mpsc,
    time::{Instant, Interval, MissedTickBehavior},
};
use tonic::{transport::Endpoint, Code, Streaming};
use tracing::{debug, info, warn};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(20);
const BACKOFF_INTERVAL: Duration = Duration::from_secs(2);
const RETRY_INTERVAL: Duration = Duration::from_secs(5);

const OUTBOUND_CHANNEL_SIZE: usize = 100;
const PROBE_CHANNEL_SIZE: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum HdsError {
    #[error("gRPC status error: {0}")]
    GrpcStatus(#[from] tonic::Status),
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
    #[error("internal processing error: {0}")]
    InternalProcessingError(&'static str),
}

struct Backoff {
    delay: Duration,
}

impl Backoff {
    fn new() -> Self {
        Self { delay: INITIAL_BACKOFF }
    }

    fn delay(&self) -> Duration {
        self.delay
    }

    fn reset(&mut self) {
        self.delay = INITIAL_BACKOFF;
    }

    async fn wait(&mut self) {
        tokio::time::sleep(self.delay).await;
        self.delay = (self.delay * 2).min(MAX_BACKOFF);
    }
}

/// Maintains the `StreamHealthCheck` session with the management
/// server: registers the node, turns incoming specifiers into running
/// probes and streams periodic endpoint health reports back. Redials
/// with exponential backoff whenever the stream breaks.
pub struct DelegateBackgroundWorker {
    endpoint: Endpoint,
    node: Option<Node>,
    generation: u64,
}

impl DelegateBackgroundWorker {
    pub fn try_new(server_address: &str, node: Option<Node>) -> Result<Self, HdsError> {
        let endpoint = Endpoint::from_shared(server_address.to_owned())?;
        Ok(Self { endpoint, node, generation: 0 })
    }

    pub async fn run(mut self) {
        let mut backoff = Backoff::new();
        loop {
            match self.stream_health_checks(&mut backoff).await {
                Err(HdsError::GrpcStatus(status)) => match status.code() {
                    Code::Unknown | Code::Cancelled | Code::DeadlineExceeded | Code::Unavailable => {
                        info!("HDS stream failed ({}), reconnecting in {:?}", status.code(), backoff.delay());
                        backoff.wait().await;
                    },
                    code => {
                        warn!("HDS stream rejected by the management server ({code}): {}", status.message());
                        tokio::time::sleep(RETRY_INTERVAL).await;
                    },
                },
                Err(error) => {
                    info!("HDS connection failed ({error}), reconnecting in {:?}", backoff.delay());
                    backoff.wait().await;
                },
                Ok(()) => {
                    warn!("HDS stream closed by the management server, reconnecting");
                    tokio::time::sleep(BACKOFF_INTERVAL).await;
                },
            }
        }
    }

    async fn stream_health_checks(&mut self, backoff: &mut Backoff) -> Result<(), HdsError> {
        let channel = self.endpoint.connect().await?;
        let mut client = HealthDiscoveryServiceClient::new(channel);

        let (outbound_tx, mut outbound_rx) =
            mpsc::channel::<HealthCheckRequestOrEndpointHealthResponse>(OUTBOUND_CHANNEL_SIZE);
        let initial = wrap_request(HealthCheckRequest { node: self.node.as_ref().map(Node::to_wire) });
        let outbound = async_stream::stream! {
            debug!("sending the initial health check request");
            yield initial;
            while let Some(message) = outbound_rx.recv().await {
                yield message;
            }
        };

        let mut specifiers = client.stream_health_check(outbound).await?.into_inner();
        info!("HDS stream established");
        backoff.reset();

        let (probe_tx, mut probe_rx) = mpsc::channel::<ProbeOutcome>(PROBE_CHANNEL_SIZE);
        let mut session = DelegateSession::new(ProbeScheduler::new(probe_tx));
        let result = self.drive_session(&mut session, &mut specifiers, &outbound_tx, &mut probe_rx).await;
        // never leave probes of a dead session running
        session.scheduler.stop_all().await;
        result
    }

    async fn drive_session(
        &mut self,
        session: &mut DelegateSession,
        specifiers: &mut Streaming<HealthCheckSpecifier>,
        outbound: &mpsc::Sender<HealthCheckRequestOrEndpointHealthResponse>,
        probe_outcomes: &mut mpsc::Receiver<ProbeOutcome>,
    ) -> Result<(), HdsError> {
        let mut report_timer: Option<Interval> = None;
        loop {
            tokio::select! {
                message = specifiers.message() => {
                    let Some(specifier) = message? else {
                        info!("management server finished the HDS stream");
                        return Ok(());
                    };
                    self.generation += 1;
                    let interval = session.apply_specifier(specifier, self.generation).await;
                    // no report before the first full interval has passed
                    let mut timer = tokio::time::interval_at(Instant::now() + interval, interval);
                    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    report_timer = Some(timer);
                },
                Some(outcome) = probe_outcomes.recv() => {
                    session.apply_outcome(outcome);
                },
                () = next_report_tick(&mut report_timer) => {
                    let response = report::build_report(&session.model);
                    debug!(endpoints = response.endpoints_health.len(), "sending an endpoint health report");
                    if outbound.send(wrap_response(response)).await.is_err() {
                        return Err(HdsError::InternalProcessingError("the outbound health check stream is closed"));
                    }
                    with_metric!(HDS_RESPONSES, add, 1, std::thread::current().id(), &[]);
                },
            }
        }
    }
}

async fn next_report_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        },
        // reports only start once a specifier armed the timer
        None => std::future::pending().await,
    }
}

/// State scoped to one established stream: the active model and the
/// probes feeding it.
struct DelegateSession {
    model: ClusterModel,
    scheduler: ProbeScheduler,
}

impl DelegateSession {
    fn new(scheduler: ProbeScheduler) -> Self {
        Self { model: ClusterModel::empty(), scheduler }
    }

    /// Replaces the current assignment: stops every running probe,
    /// rebuilds the model with fresh (unknown) health states and
    /// spawns the new probes. Returns the report interval to use.
    async fn apply_specifier(&mut self, specifier: HealthCheckSpecifier, generation: u64) -> Duration {
        let (spec, rejected) = HealthCheckSpec::from_specifier(specifier);
        for (cluster, error) in rejected {
            warn!("dropping health checks for cluster {cluster}: {error}");
        }
        self.scheduler.stop_all().await;
        self.model = ClusterModel::new(&spec, generation);
        self.scheduler.start(&self.model);
        with_metric!(HDS_REQUESTS, add, 1, std::thread::current().id(), &[]);
        info!(clusters = spec.clusters.len(), interval = ?spec.interval, "applied health check specifier");
        spec.interval
    }

    fn apply_outcome(&mut self, outcome: ProbeOutcome) {
        if outcome.generation != self.model.generation() {
            debug!("discarding a probe outcome of a previous specifier");
            return;
        }
        let Some(applied) = self.model.apply(outcome.key, outcome.outcome) else {
            return;
        };
        let thread_id = std::thread::current().id();
        if outcome.outcome.is_success() {
            with_metric!(HEALTH_CHECK_SUCCESS, add, 1, thread_id, &cluster_key(&applied.cluster));
        } else {
            with_metric!(HEALTH_CHECK_FAILURE, add, 1, thread_id, &cluster_key(&applied.cluster));
        }
        if let Some(status) = applied.transition {
            debug!(cluster = %applied.cluster, "endpoint health changed to {status:?}");
        }
    }
}

fn wrap_request(request: HealthCheckRequest) -> HealthCheckRequestOrEndpointHealthResponse {
    HealthCheckRequestOrEndpointHealthResponse { request_type: Some(RequestType::HealthCheckRequest(request)) }
}

fn wrap_response(response: EndpointHealthResponse) -> HealthCheckRequestOrEndpointHealthResponse {
    HealthCheckRequestOrEndpointHealthResponse { request_type: Some(RequestType::EndpointHealthResponse(response)) }
}
