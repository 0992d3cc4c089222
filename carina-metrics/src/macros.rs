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

// Sets the counter static and, when the `metrics` feature is on,
// registers it with the global meter so the exporter can observe it.
// The static is set unconditionally: the delegate's counters are part
// of its observable protocol behavior, not just an export concern.
macro_rules! init_observable_counter {
    ($counter: ident, $prefix: literal, $name: literal, $descr: literal) => {
        _ = $counter.set(Metric::new($prefix, $name, $descr, ShardedU64::new()));
        #[cfg(feature = "metrics")]
        {
            _ = global::meter(concat!("carina.", $prefix))
                .u64_observable_counter($name)
                .with_description($descr)
                .with_callback(move |observer| {
                    if let Some(metric) = $counter.get() {
                        for (key, value) in metric.value.load_all() {
                            observer.observe(value, &key);
                        }
                    }
                })
                .build();
        }
    };
}

#[macro_export]
macro_rules! with_metric {
    ($counter: expr, $method: ident, $($args: expr),*) => {
        $counter.get().inspect(|c| c.value.$method($($args),*));
    };
}
