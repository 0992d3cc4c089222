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
use carina_configuration::config::health::{CheckConfig, TcpHealthCheck};
use std::sync::Arc;
use tokio::{
    io::AsyncReadExt,
    io::AsyncWriteExt,
    net::TcpStream,
    sync::{mpsc, Notify},
    task::JoinHandle,
};

// Received bytes are buffered until the expected payloads match; an
// endpoint streaming garbage must not grow the buffer unboundedly.
const MAX_RECEIVE_BUFFER_SIZE: usize = 0x10000;

pub(super) fn spawn_tcp_health_checker(
    target: ProbeTarget,
    config: CheckConfig,
    settings: TcpHealthCheck,
    sender: mpsc::Sender<ProbeOutcome>,
    stop_signal: Arc<Notify>,
) -> JoinHandle<crate::Result<()>> {
    let checker = TcpChecker { authority: target.authority.clone(), settings };
    tokio::spawn(HealthCheckerLoop::new(target, config, sender, stop_signal, IntervalWaiter, checker).run())
}

struct TcpChecker {
    authority: String,
    settings: TcpHealthCheck,
}

impl ProtocolChecker for TcpChecker {
    async fn check(&mut self) -> crate::Result<CheckOutcome> {
        let mut stream = TcpStream::connect(self.authority.as_str()).await?;
        if let Some(payload) = &self.settings.send {
            stream.write_all(payload).await?;
        }
        if !self.settings.receive.is_empty() {
            match_payloads(&mut stream, &self.settings.receive).await?;
        }
        Ok(CheckOutcome::Success)
    }
}

async fn match_payloads(stream: &mut TcpStream, expected: &[Vec<u8>]) -> crate::Result<()> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        if payloads_found(&buffer, expected) {
            return Ok(());
        }
        if buffer.len() >= MAX_RECEIVE_BUFFER_SIZE {
            return Err("receive buffer limit reached without matching the expected payloads".into());
        }
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Err("connection closed before the expected payloads arrived".into());
        }
        buffer.extend_from_slice(&chunk[..read]);
    }
}

// Payloads have to appear in order, each match starting after the end
// of the previous one.
fn payloads_found(buffer: &[u8], expected: &[Vec<u8>]) -> bool {
    let mut rest = buffer;
    for payload in expected {
        match find(rest, payload) {
            Some(position) => rest = &rest[position + payload.len()..],
            None => return false,
        }
    }
    true
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payloads_match_in_order() {
        assert!(payloads_found(b"hello world", &[b"hello".to_vec(), b"world".to_vec()]));
        assert!(payloads_found(b"xxhelloxxworldxx", &[b"hello".to_vec(), b"world".to_vec()]));
        assert!(!payloads_found(b"world hello", &[b"hello".to_vec(), b"world".to_vec()]));
    }

    #[test]
    fn matches_may_not_overlap() {
        assert!(!payloads_found(b"abcabc", &[b"abcab".to_vec(), b"cabc".to_vec()]));
        assert!(payloads_found(b"abcabc", &[b"abc".to_vec(), b"abc".to_vec()]));
    }

    #[test]
    fn empty_expectations_always_match() {
        assert!(payloads_found(b"", &[]));
        assert!(payloads_found(b"anything", &[b"".to_vec()]));
    }

    #[test]
    fn partial_data_does_not_match() {
        assert!(!payloads_found(b"hel", &[b"hello".to_vec()]));
    }
}
