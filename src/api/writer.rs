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

use crate::api::partition::{Partition, StorageResult};

/// Streaming writes of a firmware image into a partition.
///
/// The flash erase/program mechanics are behind this trait; the session
/// controller only sequences begin, write and finalize calls.
pub trait PartitionWriter {
    /// Token for one open write session.
    ///
    /// Owned exclusively by the caller between [`begin`](Self::begin) and
    /// [`finalize`](Self::finalize); at most one should be open at a time.
    type Handle;

    /// Opens a write session on the target partition, starting at offset 0.
    fn begin(&mut self, target: &Partition) -> StorageResult<Self::Handle>;

    /// Appends a chunk of image bytes to the open write session.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::OutOfBounds`] if the chunk does not fit the
    /// remaining partition space.
    ///
    /// [`StorageError::OutOfBounds`]: crate::api::partition::StorageError::OutOfBounds
    fn write(&mut self, handle: &mut Self::Handle, data: &[u8]) -> StorageResult<()>;

    /// Closes a write session.
    ///
    /// An incomplete image is discarded; a complete one becomes eligible for
    /// [`commit_boot_target`].
    ///
    /// [`commit_boot_target`]: crate::api::partition::PartitionDirectory::commit_boot_target
    fn finalize(&mut self, handle: Self::Handle) -> StorageResult<()>;
}
