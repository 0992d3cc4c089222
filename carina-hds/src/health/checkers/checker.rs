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

use super::ProbeTarget;
use crate::health::{CheckOutcome, ProbeOutcome};
use carina_configuration::config::health::CheckConfig;
use pingora_timeout::fast_timeout::fast_timeout;
use std::{future::Future, sync::Arc, time::Duration};
use tokio::sync::{mpsc, Notify};
use tracing::debug;

/// One protocol-specific probe attempt. The timeout around it is
/// enforced by the loop, implementations only have to report whether
/// the endpoint answered as expected.
pub trait ProtocolChecker {
    fn check(&mut self) -> impl Future<Output = crate::Result<CheckOutcome>> + Send;
}

/// Waits between two probes of the same endpoint. Factored out of the
/// loop so tests can drive it without waiting wall-clock intervals.
pub trait WaitInterval {
    fn wait_interval_was_cancelled(
        &self,
        config: &CheckConfig,
        last_outcome: CheckOutcome,
        stop_signal: &Notify,
    ) -> impl Future<Output = bool> + Send;
}

pub struct IntervalWaiter;

impl WaitInterval for IntervalWaiter {
    async fn wait_interval_was_cancelled(
        &self,
        config: &CheckConfig,
        last_outcome: CheckOutcome,
        stop_signal: &Notify,
    ) -> bool {
        let interval = match last_outcome {
            CheckOutcome::Success => config.interval,
            // probe failing endpoints at the tighter interval, if one is set
            CheckOutcome::Failure | CheckOutcome::Timeout => config.unhealthy_interval.unwrap_or(config.interval),
        };
        wait_was_cancelled(interval, stop_signal).await
    }
}

async fn wait_was_cancelled(interval: Duration, stop_signal: &Notify) -> bool {
    tokio::select! {
        () = stop_signal.notified() => true,
        () = tokio::time::sleep(interval) => false,
    }
}

enum CheckResult<T> {
    Response(T),
    Timeout,
    Cancelled,
}

/// Probes one endpoint until cancelled: check, report the outcome,
/// wait the interval, repeat. The first probe runs immediately.
pub struct HealthCheckerLoop<W, C> {
    target: ProbeTarget,
    config: CheckConfig,
    sender: mpsc::Sender<ProbeOutcome>,
    stop_signal: Arc<Notify>,
    interval_waiter: W,
    checker: C,
}

impl<W: WaitInterval, C: ProtocolChecker> HealthCheckerLoop<W, C> {
    pub fn new(
        target: ProbeTarget,
        config: CheckConfig,
        sender: mpsc::Sender<ProbeOutcome>,
        stop_signal: Arc<Notify>,
        interval_waiter: W,
        checker: C,
    ) -> Self {
        Self { target, config, sender, stop_signal, interval_waiter, checker }
    }

    pub async fn run(mut self) -> crate::Result<()> {
        loop {
            let result = tokio::select! {
                () = self.stop_signal.notified() => CheckResult::Cancelled,
                response = fast_timeout(self.config.timeout, self.checker.check()) => match response {
                    Ok(response) => CheckResult::Response(response),
                    Err(_) => CheckResult::Timeout,
                },
            };
            let outcome = match result {
                CheckResult::Cancelled => return Ok(()),
                CheckResult::Timeout => {
                    debug!(cluster = %self.target.cluster, endpoint = %self.target.authority, "health check probe timed out");
                    CheckOutcome::Timeout
                },
                CheckResult::Response(Err(error)) => {
                    debug!(cluster = %self.target.cluster, endpoint = %self.target.authority, "health check probe failed: {error}");
                    CheckOutcome::Failure
                },
                CheckResult::Response(Ok(outcome)) => outcome,
            };
            let probe_outcome =
                ProbeOutcome { key: self.target.key, generation: self.target.generation, outcome };
            // the outcome channel can be full while the session is busy
            // swapping specifiers, so the send must stay cancellable
            let cancelled = tokio::select! {
                () = self.stop_signal.notified() => true,
                sent = self.sender.send(probe_outcome) => sent.is_err(),
            };
            if cancelled {
                return Ok(());
            }
            if self.interval_waiter.wait_interval_was_cancelled(&self.config, outcome, &self.stop_signal).await {
                return Ok(());
            }
        }
    }
}
