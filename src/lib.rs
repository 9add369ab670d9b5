// Copyright 2024 the ota-receiver authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
extern crate arrayref;

use crate::env::Env;
use crate::update::packet::Reply;
use crate::update::UpdateState;

/// Well-known UDP port the update sender transmits to.
pub const UPDATE_PORT: u16 = 54322;

// Diagnostics are routed through the environment so the core stays free of
// platform assumptions. The macro compiles to nothing without the feature.
#[cfg(feature = "debug_update")]
macro_rules! debug_update {
    ($env: expr, $($rest:tt)*) => {{
        use core::fmt::Write;
        writeln!($env.write(), $($rest)*).unwrap();
    }};
}
#[cfg(not(feature = "debug_update"))]
macro_rules! debug_update {
    ($env: expr, $($rest:tt)*) => {
        // To avoid unused variable warnings.
        let _ = (&$env, $($rest)*);
    };
}

pub mod api;
pub mod env;
pub mod update;

/// Update receiver parameterized by its environment.
///
/// Owns the session controller state and the environment for the lifetime of
/// the process. The transport adapter feeds it one datagram at a time and
/// sends the returned reply back to the originating address and port.
pub struct UpdateReceiver<E: Env> {
    env: E,
    state: UpdateState<E>,
}

impl<E: Env> UpdateReceiver<E> {
    /// Instantiates an update receiver given its environment.
    pub fn new(env: E) -> Self {
        UpdateReceiver {
            env,
            state: UpdateState::new(),
        }
    }

    pub fn state(&mut self) -> &mut UpdateState<E> {
        &mut self.state
    }

    pub fn env(&mut self) -> &mut E {
        &mut self.env
    }

    /// Processes one inbound datagram and returns the reply to unicast back.
    pub fn process_datagram(&mut self, datagram: &[u8]) -> Reply {
        self.state.process_datagram(&mut self.env, datagram)
    }
}
