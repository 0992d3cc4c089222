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

use compact_str::{CompactString, ToCompactString};
use http::uri::{Authority, PathAndQuery};
use serde::Deserialize;
use std::{fmt::Display, ops::Range, str::FromStr, time::Duration};

/// Interval between delegate reports when the specifier leaves it unset.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// A validated health checking assignment: everything a single
/// `HealthCheckSpecifier` asked the delegate to do.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HealthCheckSpec {
    /// Interval between `EndpointHealthResponse` reports.
    #[serde(with = "humantime_serde", default = "default_report_interval")]
    pub interval: Duration,
    #[serde(default)]
    pub clusters: Vec<ClusterCheckGroup>,
}

fn default_report_interval() -> Duration {
    DEFAULT_REPORT_INTERVAL
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ClusterCheckGroup {
    pub name: CompactString,
    pub checks: Vec<CheckConfig>,
    #[serde(default)]
    pub localities: Vec<LocalityEndpoints>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LocalityEndpoints {
    #[serde(default)]
    pub locality: Locality,
    pub endpoints: Vec<EndpointAddress>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq, Hash)]
pub struct Locality {
    #[serde(default)]
    pub region: CompactString,
    #[serde(default)]
    pub zone: CompactString,
    #[serde(default)]
    pub sub_zone: CompactString,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Hash)]
pub struct EndpointAddress {
    pub address: CompactString,
    pub port: u16,
}

impl EndpointAddress {
    /// `host:port` form suitable for connecting and for the probe URI.
    pub fn authority(&self) -> String {
        if self.address.contains(':') {
            format!("[{}]:{}", self.address, self.port)
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }
}

impl Display for EndpointAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.authority())
    }
}

/// Common fields shared by every check protocol.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CheckConfig {
    /// Timeout to wait for a probe response.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// The interval between probes of one endpoint.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Consecutive failures required before a host is marked unhealthy.
    pub unhealthy_threshold: u16,
    /// Consecutive successes required before a host is marked healthy.
    pub healthy_threshold: u16,
    /// Probe interval used while the host is unhealthy. Falls back to
    /// `interval` when unset.
    #[serde(with = "humantime_serde", default)]
    pub unhealthy_interval: Option<Duration>,
    #[serde(flatten)]
    pub protocol: HealthCheckProtocol,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "protocol", content = "protocol_settings", rename_all = "UPPERCASE")]
pub enum HealthCheckProtocol {
    Http(HttpHealthCheck),
    Tcp(TcpHealthCheck),
    Grpc(GrpcHealthCheck),
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HttpHealthCheck {
    #[serde(with = "http_serde_ext::authority::option", default)]
    pub host: Option<Authority>,
    #[serde(with = "http_serde_ext::path_and_query::option", default)]
    pub path: Option<PathAndQuery>,
    #[serde(default)]
    pub use_http2: bool,
    #[serde(default = "default_expected_statuses")]
    pub expected_statuses: Vec<Range<u16>>,
}

fn default_expected_statuses() -> Vec<Range<u16>> {
    vec![200..300]
}

impl Default for HttpHealthCheck {
    fn default() -> Self {
        Self { host: None, path: None, use_http2: false, expected_statuses: default_expected_statuses() }
    }
}

#[derive(thiserror::Error, Debug)]
#[error("cluster name is not a valid host name")]
pub struct ClusterHostnameError;

impl HttpHealthCheck {
    /// The authority of the probe request (`Host` header on HTTP/1.1,
    /// `:authority` on HTTP/2): the configured host if set, otherwise
    /// the name of the cluster the check belongs to.
    pub fn host(&self, cluster_name: &str) -> Result<Authority, ClusterHostnameError> {
        if let Some(host) = &self.host {
            Ok(host.to_owned())
        } else {
            Authority::from_str(cluster_name).map_err(|_| ClusterHostnameError)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct TcpHealthCheck {
    pub send: Option<Vec<u8>>,
    pub receive: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct GrpcHealthCheck {
    pub service_name: CompactString,
}

/// Conversion failure for a single wire message, with a breadcrumb of
/// the field it originated at.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(String);

impl ValidationError {
    pub fn from_msg(msg: impl Display) -> Self {
        Self(msg.to_string())
    }

    pub fn missing(field: &'static str) -> Self {
        Self(format!("missing required field `{field}`"))
    }

    pub fn with_field(self, field: &'static str) -> Self {
        Self(format!("{field}: {}", self.0))
    }
}

fn duration_from_wire(value: prost_types::Duration) -> Result<Duration, ValidationError> {
    let prost_types::Duration { seconds, nanos } = value;
    if seconds < 0 || nanos < 0 {
        return Err(ValidationError::from_msg("duration may not be negative"));
    }
    Ok(Duration::new(seconds as u64, nanos as u32))
}

fn threshold_from_wire(value: Option<u32>, field: &'static str) -> Result<u16, ValidationError> {
    let value = value.ok_or_else(|| ValidationError::missing(field))?;
    if value == 0 {
        return Err(ValidationError::from_msg("threshold must be at least 1").with_field(field));
    }
    u16::try_from(value)
        .map_err(|_| ValidationError::from_msg(format!("invalid value {value}, must be less than 65536")).with_field(field))
}

impl HealthCheckSpec {
    /// Builds a validated spec from a wire specifier. Invalid cluster
    /// entries are dropped and returned as errors; valid entries still
    /// apply.
    pub fn from_specifier(
        specifier: carina_api::HealthCheckSpecifier,
    ) -> (Self, Vec<(CompactString, ValidationError)>) {
        let interval = match specifier.interval.map(duration_from_wire).transpose() {
            Ok(interval) => interval.unwrap_or(DEFAULT_REPORT_INTERVAL),
            Err(_) => DEFAULT_REPORT_INTERVAL,
        };
        let mut clusters = Vec::with_capacity(specifier.cluster_health_checks.len());
        let mut rejected = Vec::new();
        for entry in specifier.cluster_health_checks {
            let name = entry.cluster_name.to_compact_string();
            match ClusterCheckGroup::try_from(entry) {
                Ok(group) => clusters.push(group),
                Err(e) => rejected.push((name, e)),
            }
        }
        (Self { interval, clusters }, rejected)
    }
}

impl TryFrom<carina_api::ClusterHealthCheck> for ClusterCheckGroup {
    type Error = ValidationError;
    fn try_from(value: carina_api::ClusterHealthCheck) -> Result<Self, Self::Error> {
        let carina_api::ClusterHealthCheck { cluster_name, health_checks, locality_endpoints } = value;
        if cluster_name.is_empty() {
            return Err(ValidationError::missing("cluster_name"));
        }
        if health_checks.is_empty() {
            return Err(ValidationError::missing("health_checks"));
        }
        let checks = health_checks
            .into_iter()
            .map(CheckConfig::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.with_field("health_checks"))?;
        let localities = locality_endpoints
            .into_iter()
            .map(LocalityEndpoints::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.with_field("locality_endpoints"))?;
        Ok(Self { name: cluster_name.into(), checks, localities })
    }
}

impl TryFrom<carina_api::LocalityEndpoints> for LocalityEndpoints {
    type Error = ValidationError;
    fn try_from(value: carina_api::LocalityEndpoints) -> Result<Self, Self::Error> {
        let carina_api::LocalityEndpoints { locality, endpoints } = value;
        let locality = locality.map(Locality::from).unwrap_or_default();
        let endpoints =
            endpoints.into_iter().map(EndpointAddress::try_from).collect::<Result<Vec<_>, _>>().map_err(|e| e.with_field("endpoints"))?;
        Ok(Self { locality, endpoints })
    }
}

impl From<carina_api::Locality> for Locality {
    fn from(value: carina_api::Locality) -> Self {
        let carina_api::Locality { region, zone, sub_zone } = value;
        Self { region: region.into(), zone: zone.into(), sub_zone: sub_zone.into() }
    }
}

impl TryFrom<carina_api::Endpoint> for EndpointAddress {
    type Error = ValidationError;
    fn try_from(value: carina_api::Endpoint) -> Result<Self, Self::Error> {
        let socket = value
            .address
            .and_then(|addr| addr.socket_address)
            .ok_or_else(|| ValidationError::missing("socket_address"))?;
        if socket.address.is_empty() {
            return Err(ValidationError::missing("address"));
        }
        let port = u16::try_from(socket.port_value)
            .map_err(|_| ValidationError::from_msg(format!("invalid port {}", socket.port_value)).with_field("port_value"))?;
        Ok(Self { address: socket.address.into(), port })
    }
}

impl TryFrom<carina_api::HealthCheck> for CheckConfig {
    type Error = ValidationError;
    fn try_from(value: carina_api::HealthCheck) -> Result<Self, Self::Error> {
        let carina_api::HealthCheck {
            timeout,
            interval,
            unhealthy_threshold,
            healthy_threshold,
            no_traffic_interval: _,
            unhealthy_interval,
            health_checker,
        } = value;
        let timeout = duration_from_wire(timeout.ok_or_else(|| ValidationError::missing("timeout"))?)
            .map_err(|e| e.with_field("timeout"))?;
        let interval = duration_from_wire(interval.ok_or_else(|| ValidationError::missing("interval"))?)
            .map_err(|e| e.with_field("interval"))?;
        let unhealthy_threshold = threshold_from_wire(unhealthy_threshold, "unhealthy_threshold")?;
        let healthy_threshold = threshold_from_wire(healthy_threshold, "healthy_threshold")?;
        let unhealthy_interval = unhealthy_interval
            .map(duration_from_wire)
            .transpose()
            .map_err(|e| e.with_field("unhealthy_interval"))?;
        let protocol = health_checker.ok_or_else(|| ValidationError::missing("health_checker"))?.try_into()?;
        Ok(Self { timeout, interval, unhealthy_threshold, healthy_threshold, unhealthy_interval, protocol })
    }
}

impl TryFrom<carina_api::hds::health_check::HealthChecker> for HealthCheckProtocol {
    type Error = ValidationError;
    fn try_from(value: carina_api::hds::health_check::HealthChecker) -> Result<Self, Self::Error> {
        use carina_api::hds::health_check::HealthChecker;
        match value {
            HealthChecker::HttpHealthCheck(http) => http.try_into().map(Self::Http),
            HealthChecker::TcpHealthCheck(tcp) => tcp.try_into().map(Self::Tcp),
            HealthChecker::GrpcHealthCheck(grpc) => grpc.try_into().map(Self::Grpc),
        }
    }
}

impl TryFrom<carina_api::HttpHealthCheck> for HttpHealthCheck {
    type Error = ValidationError;
    fn try_from(value: carina_api::HttpHealthCheck) -> Result<Self, Self::Error> {
        let carina_api::HttpHealthCheck { host, path, use_http2 } = value;
        let host = (!host.is_empty())
            .then(|| Authority::from_str(&host))
            .transpose()
            .map_err(|e| ValidationError::from_msg(format!("failed to parse \"{host}\" as an authority: {e}")))
            .map_err(|e| e.with_field("host"))?;
        let path = (!path.is_empty())
            .then(|| {
                let path_and_query = PathAndQuery::from_str(&path)
                    .map_err(|e| ValidationError::from_msg(format!("failed to parse \"{path}\" as a path: {e}")))?;
                if path_and_query.query().is_some() {
                    Err(ValidationError::from_msg("path can't contain a query"))
                } else {
                    Ok(path_and_query)
                }
            })
            .transpose()
            .map_err(|e| e.with_field("path"))?;
        Ok(Self { host, path, use_http2, expected_statuses: default_expected_statuses() })
    }
}

impl TryFrom<carina_api::TcpHealthCheck> for TcpHealthCheck {
    type Error = ValidationError;
    fn try_from(value: carina_api::TcpHealthCheck) -> Result<Self, Self::Error> {
        let carina_api::TcpHealthCheck { send, receive } = value;
        Ok(Self {
            send: send.and_then(payload_from_wire).transpose().map_err(|e| e.with_field("send"))?,
            receive: receive
                .into_iter()
                .filter_map(payload_from_wire)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| e.with_field("receive"))?,
        })
    }
}

impl TryFrom<carina_api::GrpcHealthCheck> for GrpcHealthCheck {
    type Error = ValidationError;
    fn try_from(value: carina_api::GrpcHealthCheck) -> Result<Self, Self::Error> {
        let carina_api::GrpcHealthCheck { service_name, authority } = value;
        if !authority.is_empty() {
            return Err(ValidationError::from_msg("unsupported field").with_field("authority"));
        }
        Ok(Self { service_name: service_name.into() })
    }
}

fn payload_from_wire(payload: carina_api::Payload) -> Option<Result<Vec<u8>, ValidationError>> {
    use carina_api::hds::payload::Payload;
    payload.payload.map(|payload| match payload {
        Payload::Text(text) => bytes_from_hex_text(&text),
        Payload::Binary(binary) => Ok(binary),
    })
}

// Text payloads are hex encoded, two characters per byte.
fn bytes_from_hex_text(text: &str) -> Result<Vec<u8>, ValidationError> {
    if text.len() % 2 != 0 {
        return Err(ValidationError::from_msg("invalid text payload with odd number of characters"));
    }
    let mut bytes = Vec::with_capacity(text.len() / 2);
    let mut chars = text.chars();
    while let (Some(msb), Some(lsb)) = (chars.next(), chars.next()) {
        // char::to_digit(16) rather than from_str_radix, which accepts a leading '+'
        match (msb.to_digit(16), lsb.to_digit(16)) {
            (Some(msb), Some(lsb)) => bytes.push(((msb << 4) + lsb) as u8),
            _ => return Err(ValidationError::from_msg("invalid text payload")),
        }
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use carina_api as api;
    use carina_api::hds::health_check::HealthChecker;

    fn wire_duration(secs: i64) -> prost_types::Duration {
        prost_types::Duration { seconds: secs, nanos: 0 }
    }

    fn http_check() -> api::HealthCheck {
        api::HealthCheck {
            timeout: Some(wire_duration(1)),
            interval: Some(wire_duration(1)),
            unhealthy_threshold: Some(2),
            healthy_threshold: Some(2),
            no_traffic_interval: None,
            unhealthy_interval: None,
            health_checker: Some(HealthChecker::HttpHealthCheck(api::HttpHealthCheck {
                host: String::new(),
                path: "/healthcheck".to_owned(),
                use_http2: false,
            })),
        }
    }

    fn endpoint(address: &str, port: u32) -> api::Endpoint {
        api::Endpoint {
            address: Some(api::Address {
                socket_address: Some(api::SocketAddress { address: address.to_owned(), port_value: port }),
            }),
        }
    }

    #[test]
    fn specifier_conversion() {
        let specifier = api::HealthCheckSpecifier {
            cluster_health_checks: vec![api::ClusterHealthCheck {
                cluster_name: "anna".to_owned(),
                health_checks: vec![http_check()],
                locality_endpoints: vec![api::LocalityEndpoints {
                    locality: Some(api::Locality {
                        region: "middle_earth".to_owned(),
                        zone: "shire".to_owned(),
                        sub_zone: "hobbiton".to_owned(),
                    }),
                    endpoints: vec![endpoint("127.0.0.1", 8080)],
                }],
            }],
            interval: Some(wire_duration(2)),
        };
        let (spec, rejected) = HealthCheckSpec::from_specifier(specifier);
        assert!(rejected.is_empty(), "expected no rejected clusters: {rejected:?}");
        assert_eq!(spec.interval, Duration::from_secs(2));
        assert_eq!(spec.clusters.len(), 1);
        let cluster = &spec.clusters[0];
        assert_eq!(cluster.name, "anna");
        assert_eq!(cluster.checks.len(), 1);
        assert_eq!(cluster.localities[0].locality.zone, "shire");
        assert_eq!(cluster.localities[0].endpoints[0].authority(), "127.0.0.1:8080");
        let HealthCheckProtocol::Http(http) = &cluster.checks[0].protocol else {
            panic!("expected an HTTP check");
        };
        assert_eq!(http.path.as_ref().map(PathAndQuery::as_str), Some("/healthcheck"));
        assert_eq!(http.host(&cluster.name).expect("valid host").as_str(), "anna");
    }

    #[test]
    fn zero_threshold_rejected() {
        let mut check = http_check();
        check.unhealthy_threshold = Some(0);
        let specifier = api::HealthCheckSpecifier {
            cluster_health_checks: vec![api::ClusterHealthCheck {
                cluster_name: "cat".to_owned(),
                health_checks: vec![check],
                locality_endpoints: Vec::new(),
            }],
            interval: None,
        };
        let (spec, rejected) = HealthCheckSpec::from_specifier(specifier);
        assert!(spec.clusters.is_empty());
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].0, "cat");
        assert_eq!(spec.interval, DEFAULT_REPORT_INTERVAL);
    }

    #[test]
    fn missing_checker_rejected() {
        let mut check = http_check();
        check.health_checker = None;
        let entry = api::ClusterHealthCheck {
            cluster_name: "cat".to_owned(),
            health_checks: vec![check],
            locality_endpoints: Vec::new(),
        };
        assert!(ClusterCheckGroup::try_from(entry).is_err());
    }

    #[test]
    fn ipv6_endpoint_authority() {
        let ep = EndpointAddress::try_from(endpoint("::1", 9000)).expect("valid endpoint");
        assert_eq!(ep.authority(), "[::1]:9000");
    }

    #[test]
    fn invalid_port_rejected() {
        assert!(EndpointAddress::try_from(endpoint("127.0.0.1", 70000)).is_err());
    }

    #[test]
    fn text_payload_parsing() {
        assert_eq!(bytes_from_hex_text("").expect("empty payload"), Vec::<u8>::new());
        assert_eq!(bytes_from_hex_text("abba").expect("valid payload"), vec![0xab, 0xba]);
        assert_eq!(bytes_from_hex_text("0001").expect("valid payload"), vec![0x0, 0x1]);
        assert!(bytes_from_hex_text("0").is_err());
        assert!(bytes_from_hex_text("+000").is_err());
        assert!(bytes_from_hex_text("zz").is_err());
    }
}
