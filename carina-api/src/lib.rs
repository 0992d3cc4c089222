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

//! Wire types for `envoy.service.health.v3.HealthDiscoveryService`.
//!
//! These are explicit prost/tonic definitions for the HDS slice of the
//! Envoy data-plane API, field tags matching the v3 protos, so the
//! delegate stays wire compatible with Envoy management servers.

pub mod hds;

pub use hds::{
    health_discovery_service_client, health_discovery_service_server, Address, ClusterHealthCheck, Endpoint,
    EndpointHealth, EndpointHealthResponse, GrpcHealthCheck, HealthCheck, HealthCheckRequest,
    HealthCheckRequestOrEndpointHealthResponse, HealthCheckSpecifier, HealthStatus, HttpHealthCheck, Locality,
    LocalityEndpoints, Node, Payload, SocketAddress, TcpHealthCheck,
};
