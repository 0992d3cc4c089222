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

/// Identifies a node reporting health to the management server.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Node {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub cluster: String,
    #[prost(string, tag = "6")]
    pub user_agent_name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Locality {
    #[prost(string, tag = "1")]
    pub region: String,
    #[prost(string, tag = "2")]
    pub zone: String,
    #[prost(string, tag = "3")]
    pub sub_zone: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SocketAddress {
    #[prost(string, tag = "2")]
    pub address: String,
    #[prost(uint32, tag = "3")]
    pub port_value: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Address {
    #[prost(message, optional, tag = "1")]
    pub socket_address: Option<SocketAddress>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Endpoint {
    #[prost(message, optional, tag = "1")]
    pub address: Option<Address>,
}

/// Health check payload for TCP checks, either text (hex encoded) or
/// raw bytes.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Payload {
    #[prost(oneof = "payload::Payload", tags = "1, 2")]
    pub payload: Option<payload::Payload>,
}

pub mod payload {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Payload {
        #[prost(string, tag = "1")]
        Text(String),
        #[prost(bytes, tag = "2")]
        Binary(Vec<u8>),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HttpHealthCheck {
    /// Value of the Host header in the probe request. Defaults to the
    /// name of the cluster the check belongs to.
    #[prost(string, tag = "1")]
    pub host: String,
    #[prost(string, tag = "2")]
    pub path: String,
    #[prost(bool, tag = "5")]
    pub use_http2: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TcpHealthCheck {
    #[prost(message, optional, tag = "1")]
    pub send: Option<Payload>,
    #[prost(message, repeated, tag = "2")]
    pub receive: Vec<Payload>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GrpcHealthCheck {
    #[prost(string, tag = "1")]
    pub service_name: String,
    #[prost(string, tag = "2")]
    pub authority: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HealthCheck {
    #[prost(message, optional, tag = "1")]
    pub timeout: Option<::prost_types::Duration>,
    #[prost(message, optional, tag = "2")]
    pub interval: Option<::prost_types::Duration>,
    #[prost(message, optional, tag = "4")]
    pub unhealthy_threshold: Option<u32>,
    #[prost(message, optional, tag = "5")]
    pub healthy_threshold: Option<u32>,
    #[prost(message, optional, tag = "12")]
    pub no_traffic_interval: Option<::prost_types::Duration>,
    #[prost(message, optional, tag = "14")]
    pub unhealthy_interval: Option<::prost_types::Duration>,
    #[prost(oneof = "health_check::HealthChecker", tags = "8, 9, 11")]
    pub health_checker: Option<health_check::HealthChecker>,
}

pub mod health_check {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum HealthChecker {
        #[prost(message, tag = "8")]
        HttpHealthCheck(super::HttpHealthCheck),
        #[prost(message, tag = "9")]
        TcpHealthCheck(super::TcpHealthCheck),
        #[prost(message, tag = "11")]
        GrpcHealthCheck(super::GrpcHealthCheck),
    }
}

/// Endpoint health status as reported on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum HealthStatus {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
    Draining = 3,
    Timeout = 4,
    Degraded = 5,
}

impl HealthStatus {
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Healthy => "HEALTHY",
            Self::Unhealthy => "UNHEALTHY",
            Self::Draining => "DRAINING",
            Self::Timeout => "TIMEOUT",
            Self::Degraded => "DEGRADED",
        }
    }
}

/// First message sent by the delegate on a fresh stream.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HealthCheckRequest {
    #[prost(message, optional, tag = "1")]
    pub node: Option<Node>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EndpointHealth {
    #[prost(message, optional, tag = "1")]
    pub endpoint: Option<Endpoint>,
    #[prost(enumeration = "HealthStatus", tag = "2")]
    pub health_status: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EndpointHealthResponse {
    #[prost(message, repeated, tag = "1")]
    pub endpoints_health: Vec<EndpointHealth>,
}

/// Every message the delegate sends on the stream: the initial
/// registration request or a periodic health report.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HealthCheckRequestOrEndpointHealthResponse {
    #[prost(oneof = "health_check_request_or_endpoint_health_response::RequestType", tags = "1, 2")]
    pub request_type: Option<health_check_request_or_endpoint_health_response::RequestType>,
}

pub mod health_check_request_or_endpoint_health_response {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum RequestType {
        #[prost(message, tag = "1")]
        HealthCheckRequest(super::HealthCheckRequest),
        #[prost(message, tag = "2")]
        EndpointHealthResponse(super::EndpointHealthResponse),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LocalityEndpoints {
    #[prost(message, optional, tag = "1")]
    pub locality: Option<Locality>,
    #[prost(message, repeated, tag = "2")]
    pub endpoints: Vec<Endpoint>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ClusterHealthCheck {
    #[prost(string, tag = "1")]
    pub cluster_name: String,
    #[prost(message, repeated, tag = "2")]
    pub health_checks: Vec<HealthCheck>,
    #[prost(message, repeated, tag = "3")]
    pub locality_endpoints: Vec<LocalityEndpoints>,
}

/// Server to delegate: the full set of clusters/endpoints to check and
/// the interval between delegate reports.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HealthCheckSpecifier {
    #[prost(message, repeated, tag = "1")]
    pub cluster_health_checks: Vec<ClusterHealthCheck>,
    #[prost(message, optional, tag = "2")]
    pub interval: Option<::prost_types::Duration>,
}

pub mod health_discovery_service_client {
    use super::{HealthCheckRequestOrEndpointHealthResponse, HealthCheckSpecifier};
    use tonic::codegen::*;

    #[derive(Debug, Clone)]
    pub struct HealthDiscoveryServiceClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl HealthDiscoveryServiceClient<tonic::transport::Channel> {
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }

    impl<T> HealthDiscoveryServiceClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }

        pub async fn stream_health_check(
            &mut self,
            request: impl tonic::IntoStreamingRequest<Message = HealthCheckRequestOrEndpointHealthResponse>,
        ) -> Result<tonic::Response<tonic::codec::Streaming<HealthCheckSpecifier>>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::unknown(format!("Service was not ready: {}", e.into())))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/envoy.service.health.v3.HealthDiscoveryService/StreamHealthCheck",
            );
            self.inner.streaming(request.into_streaming_request(), path, codec).await
        }
    }
}

pub mod health_discovery_service_server {
    use super::{HealthCheckRequestOrEndpointHealthResponse, HealthCheckSpecifier};
    use tonic::codegen::*;

    #[async_trait]
    pub trait HealthDiscoveryService: Send + Sync + 'static {
        type StreamHealthCheckStream: tonic::codegen::tokio_stream::Stream<Item = Result<HealthCheckSpecifier, tonic::Status>>
            + Send
            + 'static;

        async fn stream_health_check(
            &self,
            request: tonic::Request<tonic::Streaming<HealthCheckRequestOrEndpointHealthResponse>>,
        ) -> Result<tonic::Response<Self::StreamHealthCheckStream>, tonic::Status>;
    }

    #[derive(Debug)]
    pub struct HealthDiscoveryServiceServer<T> {
        inner: Arc<T>,
    }

    impl<T> HealthDiscoveryServiceServer<T> {
        pub fn new(inner: T) -> Self {
            Self { inner: Arc::new(inner) }
        }
    }

    impl<T, B> tonic::codegen::Service<http::Request<B>> for HealthDiscoveryServiceServer<T>
    where
        T: HealthDiscoveryService,
        B: Body + Send + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = std::convert::Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            match req.uri().path() {
                "/envoy.service.health.v3.HealthDiscoveryService/StreamHealthCheck" => {
                    struct StreamHealthCheckSvc<T>(Arc<T>);
                    impl<T: HealthDiscoveryService>
                        tonic::server::StreamingService<HealthCheckRequestOrEndpointHealthResponse>
                        for StreamHealthCheckSvc<T>
                    {
                        type Response = HealthCheckSpecifier;
                        type ResponseStream = T::StreamHealthCheckStream;
                        type Future = BoxFuture<tonic::Response<Self::ResponseStream>, tonic::Status>;

                        fn call(
                            &mut self,
                            request: tonic::Request<tonic::Streaming<HealthCheckRequestOrEndpointHealthResponse>>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            Box::pin(async move { inner.stream_health_check(request).await })
                        }
                    }
                    let inner = Arc::clone(&self.inner);
                    Box::pin(async move {
                        let method = StreamHealthCheckSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        Ok(grpc.streaming(method, req).await)
                    })
                },
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(http::StatusCode::OK)
                        .header("grpc-status", tonic::Code::Unimplemented as i32)
                        .header(http::header::CONTENT_TYPE, "application/grpc")
                        .body(empty_body())
                        .unwrap())
                }),
            }
        }
    }

    impl<T> Clone for HealthDiscoveryServiceServer<T> {
        fn clone(&self) -> Self {
            Self { inner: Arc::clone(&self.inner) }
        }
    }

    impl<T> tonic::server::NamedService for HealthDiscoveryServiceServer<T> {
        const NAME: &'static str = "envoy.service.health.v3.HealthDiscoveryService";
    }
}
