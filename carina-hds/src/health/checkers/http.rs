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
use bytes::Bytes;
use carina_configuration::config::health::{CheckConfig, HttpHealthCheck};
use http::uri::{Authority, PathAndQuery, Uri};
use http_body_util::Full;
use hyper::client::conn::{http1, http2};
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::{future::Future, ops::Range, sync::Arc};
use tokio::{
    net::TcpStream,
    sync::{mpsc, Notify},
    task::JoinHandle,
};
use tracing::debug;

pub(super) fn try_spawn_http_health_checker(
    target: ProbeTarget,
    config: CheckConfig,
    settings: HttpHealthCheck,
    sender: mpsc::Sender<ProbeOutcome>,
    stop_signal: Arc<Notify>,
) -> crate::Result<JoinHandle<crate::Result<()>>> {
    let host = settings.host(&target.cluster)?;
    let path = settings.path.clone().unwrap_or_else(|| PathAndQuery::from_static("/"));
    // the connection goes to the endpoint address; the request carries
    // the configured host authority, not the address
    let uri = if settings.use_http2 {
        Uri::builder().scheme("http").authority(host.clone()).path_and_query(path).build()?
    } else {
        Uri::builder().path_and_query(path).build()?
    };

    let checker = HttpChecker {
        address: target.authority.clone(),
        uri,
        host,
        use_http2: settings.use_http2,
        expected_statuses: settings.expected_statuses,
    };
    Ok(tokio::spawn(HealthCheckerLoop::new(target, config, sender, stop_signal, IntervalWaiter, checker).run()))
}

struct HttpChecker {
    address: String,
    uri: Uri,
    host: Authority,
    use_http2: bool,
    expected_statuses: Vec<Range<u16>>,
}

impl ProtocolChecker for HttpChecker {
    async fn check(&mut self) -> crate::Result<CheckOutcome> {
        let stream = TcpStream::connect(self.address.as_str()).await?;
        let io = TokioIo::new(stream);
        let request = http::Request::builder()
            .method(http::Method::GET)
            .uri(self.uri.clone())
            .header(http::header::USER_AGENT, "carina-health-check");
        let response = if self.use_http2 {
            // the :authority pseudo header is taken from the URI
            let (mut sender, connection) = http2::handshake(TokioExecutor::new(), io).await?;
            tokio::spawn(watch_connection(connection));
            sender.send_request(request.body(Full::<Bytes>::default())?).await?
        } else {
            let request = request.header(http::header::HOST, self.host.as_str());
            let (mut sender, connection) = http1::handshake(io).await?;
            tokio::spawn(watch_connection(connection));
            sender.send_request(request.body(Full::<Bytes>::default())?).await?
        };
        let status = response.status().as_u16();
        if self.expected_statuses.iter().any(|range| range.contains(&status)) {
            Ok(CheckOutcome::Success)
        } else {
            Ok(CheckOutcome::Failure)
        }
    }
}

async fn watch_connection(connection: impl Future<Output = hyper::Result<()>>) {
    if let Err(error) = connection.await {
        debug!("health check connection ended with an error: {error}");
    }
}
