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

use super::HealthStatus;

/// Tracks the health status of one (host, check) pair from a stream of
/// probe outcomes. The status starts unknown and the first completed
/// probe decides it immediately; after that a transition requires the
/// configured number of consecutive outcomes in the other direction.
#[derive(Debug, Clone)]
pub struct HealthStatusCounter {
    status: Option<HealthStatus>,
    successes: u16,
    failures: u16,
    healthy_threshold: u16,
    unhealthy_threshold: u16,
}

impl HealthStatusCounter {
    pub fn new(healthy_threshold: u16, unhealthy_threshold: u16) -> Self {
        Self { status: None, successes: 0, failures: 0, healthy_threshold, unhealthy_threshold }
    }

    /// `None` until the first probe completes.
    pub fn status(&self) -> Option<HealthStatus> {
        self.status
    }

    /// Records a successful probe. Returns the new status if it changed.
    pub fn add_success(&mut self) -> Option<HealthStatus> {
        self.failures = 0;
        self.successes = self.successes.saturating_add(1);
        match self.status {
            None => self.update(HealthStatus::Healthy),
            Some(HealthStatus::Healthy) => None,
            Some(HealthStatus::Unhealthy) if self.successes >= self.healthy_threshold => {
                self.update(HealthStatus::Healthy)
            },
            Some(HealthStatus::Unhealthy) => None,
        }
    }

    /// Records a failed probe. Returns the new status if it changed.
    pub fn add_failure(&mut self) -> Option<HealthStatus> {
        self.successes = 0;
        self.failures = self.failures.saturating_add(1);
        match self.status {
            None => self.update(HealthStatus::Unhealthy),
            Some(HealthStatus::Unhealthy) => None,
            Some(HealthStatus::Healthy) if self.failures >= self.unhealthy_threshold => {
                self.update(HealthStatus::Unhealthy)
            },
            Some(HealthStatus::Healthy) => None,
        }
    }

    fn update(&mut self, new_status: HealthStatus) -> Option<HealthStatus> {
        self.status = Some(new_status);
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_success_decides_immediately() {
        let mut counter = HealthStatusCounter::new(3, 3);
        assert_eq!(counter.status(), None);
        assert_eq!(counter.add_success(), Some(HealthStatus::Healthy));
        assert_eq!(counter.status(), Some(HealthStatus::Healthy));
    }

    #[test]
    fn first_failure_decides_immediately() {
        let mut counter = HealthStatusCounter::new(3, 3);
        assert_eq!(counter.add_failure(), Some(HealthStatus::Unhealthy));
        assert_eq!(counter.status(), Some(HealthStatus::Unhealthy));
    }

    #[test]
    fn transitions_require_consecutive_outcomes() {
        let mut counter = HealthStatusCounter::new(2, 2);
        assert_eq!(counter.add_success(), Some(HealthStatus::Healthy));

        assert_eq!(counter.add_failure(), None);
        assert_eq!(counter.status(), Some(HealthStatus::Healthy));
        assert_eq!(counter.add_failure(), Some(HealthStatus::Unhealthy));

        assert_eq!(counter.add_success(), None);
        assert_eq!(counter.status(), Some(HealthStatus::Unhealthy));
        assert_eq!(counter.add_success(), Some(HealthStatus::Healthy));
    }

    #[test]
    fn opposite_outcome_resets_the_streak() {
        let mut counter = HealthStatusCounter::new(2, 3);
        counter.add_success();

        assert_eq!(counter.add_failure(), None);
        assert_eq!(counter.add_failure(), None);
        // a single success resets the failure count
        assert_eq!(counter.add_success(), None);
        assert_eq!(counter.add_failure(), None);
        assert_eq!(counter.add_failure(), None);
        assert_eq!(counter.add_failure(), Some(HealthStatus::Unhealthy));
    }

    #[test]
    fn steady_state_reports_no_change() {
        let mut counter = HealthStatusCounter::new(1, 1);
        assert_eq!(counter.add_success(), Some(HealthStatus::Healthy));
        assert_eq!(counter.add_success(), None);
        assert_eq!(counter.add_success(), None);
        assert_eq!(counter.add_failure(), Some(HealthStatus::Unhealthy));
        assert_eq!(counter.add_failure(), None);
    }
}
