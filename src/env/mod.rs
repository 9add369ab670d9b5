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

use crate::api::partition::PartitionDirectory;
use crate::api::restart::Restart;
use crate::api::writer::PartitionWriter;

#[cfg(feature = "std")]
pub mod host;
#[cfg(feature = "std")]
pub mod test;

/// Describes what the update receiver needs to function.
///
/// Network transport is deliberately not part of the environment: the
/// receiver consumes raw datagram payloads and returns replies, and a thin
/// adapter bridges those to whatever transport delivers them.
pub trait Env {
    type Directory: PartitionDirectory;
    type Writer: PartitionWriter;
    type Restart: Restart;
    type Write: core::fmt::Write;

    fn directory(&mut self) -> &mut Self::Directory;

    fn writer(&mut self) -> &mut Self::Writer;

    fn restarter(&mut self) -> &mut Self::Restart;

    /// Creates a write instance for debugging.
    ///
    /// This API doesn't return a reference such that drop may flush.
    fn write(&mut self) -> Self::Write;
}
