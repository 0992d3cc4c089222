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

#[macro_use]
pub mod macros;
pub mod metrics;
pub mod sharded;

use serde::Deserialize;

#[cfg(feature = "metrics")]
use {
    opentelemetry::global,
    opentelemetry_otlp::{Protocol, WithExportConfig},
    opentelemetry_sdk::metrics::PeriodicReader,
    std::time::Duration,
    tracing::info,
};

#[cfg(feature = "metrics")]
const DEFAULT_EXPORT_PERIOD: std::time::Duration = std::time::Duration::from_secs(5);

/// OTLP metrics sink configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MetricsConfig {
    pub endpoint: String,
    #[serde(with = "humantime_serde", default)]
    pub export_period: Option<std::time::Duration>,
}

// Launches the OpenTelemetry metrics exporter. Called once at startup;
// the counters themselves work whether or not an exporter is running.
#[cfg(feature = "metrics")]
pub async fn launch_metrics_exporter(
    config: &MetricsConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    info!("Building gRPC exporter with endpoint {}...", config.endpoint);
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(&config.endpoint)
        .with_protocol(Protocol::Grpc)
        .with_timeout(Duration::from_secs(5))
        .build()?;

    let export_period = config.export_period.unwrap_or(DEFAULT_EXPORT_PERIOD);
    let periodic_reader = PeriodicReader::builder(exporter).with_interval(export_period).build();

    let provider = opentelemetry_sdk::metrics::SdkMeterProvider::builder().with_reader(periodic_reader).build();
    global::set_meter_provider(provider);

    info!("OpenTelemetry exporter launched successfully.");
    Ok(())
}

#[cfg(not(feature = "metrics"))]
pub async fn launch_metrics_exporter(
    _config: &MetricsConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    Ok(())
}
