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

/// Errors reported by the partition subsystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageError {
    /// No partition is currently marked as active.
    NoActivePartition,

    /// Arguments are out of bounds of the target partition.
    OutOfBounds,

    /// Implementation-specific error.
    CustomError,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// One of the two fixed firmware slots.
///
/// Exactly two exist system-wide. At any time exactly one is active (the
/// currently booted one); updates are always written to the other.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Ota0,
    Ota1,
}

impl Slot {
    /// Returns the other slot.
    pub fn other(self) -> Slot {
        match self {
            Slot::Ota0 => Slot::Ota1,
            Slot::Ota1 => Slot::Ota0,
        }
    }

    /// Returns the partition table label of this slot.
    pub fn label(self) -> &'static str {
        match self {
            Slot::Ota0 => "ota_0",
            Slot::Ota1 => "ota_1",
        }
    }
}

/// Metadata of one flash partition.
///
/// This is a description of a storage region, not the storage itself. Writes
/// go through [`PartitionWriter`](crate::api::writer::PartitionWriter).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Partition {
    pub slot: Slot,
    pub address: u32,
    pub size: u32,
}

/// Maps slot roles to partition metadata and tracks the boot selection.
pub trait PartitionDirectory {
    /// Returns the partition the device is currently running from.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoActivePartition`] if the directory cannot
    /// tell which partition is active.
    fn active_partition(&self) -> StorageResult<Partition>;

    /// Returns the partition metadata for the given slot.
    fn partition(&self, slot: Slot) -> Partition;

    /// Marks the given partition as the one to boot from next.
    fn commit_boot_target(&mut self, partition: &Partition) -> StorageResult<()>;
}
