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

//! In-memory environment for tests: buffer-backed partitions, injectable
//! failures and a restart counter instead of an actual reboot.

use crate::api::partition::{Partition, PartitionDirectory, Slot, StorageError, StorageResult};
use crate::api::restart::Restart;
use crate::api::writer::PartitionWriter;
use crate::env::Env;

// Small partitions keep the bounds tests cheap.
const PARTITION_SIZE: u32 = 0x1000;
const OTA_0_ADDRESS: u32 = 0x0001_0000;
const OTA_1_ADDRESS: u32 = 0x0001_1000;

fn partition_for(slot: Slot) -> Partition {
    Partition {
        slot,
        address: match slot {
            Slot::Ota0 => OTA_0_ADDRESS,
            Slot::Ota1 => OTA_1_ADDRESS,
        },
        size: PARTITION_SIZE,
    }
}

pub struct TestEnv {
    directory: TestDirectory,
    writer: BufferPartitionWriter,
    restart: TestRestart,
}

pub struct TestWrite;

impl core::fmt::Write for TestWrite {
    fn write_str(&mut self, _: &str) -> core::fmt::Result {
        Ok(())
    }
}

impl TestEnv {
    pub fn new() -> Self {
        TestEnv {
            directory: TestDirectory::new(),
            writer: BufferPartitionWriter::new(),
            restart: TestRestart { count: 0 },
        }
    }

    /// How often the restart capability was invoked.
    pub fn restart_count(&self) -> usize {
        self.restart.count
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        TestEnv::new()
    }
}

impl Env for TestEnv {
    type Directory = TestDirectory;
    type Writer = BufferPartitionWriter;
    type Restart = TestRestart;
    type Write = TestWrite;

    fn directory(&mut self) -> &mut TestDirectory {
        &mut self.directory
    }

    fn writer(&mut self) -> &mut BufferPartitionWriter {
        &mut self.writer
    }

    fn restarter(&mut self) -> &mut TestRestart {
        &mut self.restart
    }

    fn write(&mut self) -> TestWrite {
        TestWrite
    }
}

pub struct TestDirectory {
    active: Option<Slot>,
    boot_target: Option<Slot>,
    commit_fails: bool,
}

impl TestDirectory {
    fn new() -> Self {
        TestDirectory {
            active: Some(Slot::Ota0),
            boot_target: None,
            commit_fails: false,
        }
    }

    /// Overrides which slot reports as active; `None` makes the lookup fail.
    pub fn set_active(&mut self, active: Option<Slot>) {
        self.active = active;
    }

    pub fn set_commit_fails(&mut self, fails: bool) {
        self.commit_fails = fails;
    }

    /// The slot committed as next boot target, if any.
    pub fn boot_target(&self) -> Option<Slot> {
        self.boot_target
    }
}

impl PartitionDirectory for TestDirectory {
    fn active_partition(&self) -> StorageResult<Partition> {
        self.active
            .map(partition_for)
            .ok_or(StorageError::NoActivePartition)
    }

    fn partition(&self, slot: Slot) -> Partition {
        partition_for(slot)
    }

    fn commit_boot_target(&mut self, partition: &Partition) -> StorageResult<()> {
        if self.commit_fails {
            return Err(StorageError::CustomError);
        }
        self.boot_target = Some(partition.slot);
        Ok(())
    }
}

/// Write session token handed out by [`BufferPartitionWriter`].
pub struct BufferWriteHandle {
    slot: Slot,
    offset: usize,
}

pub struct BufferPartitionWriter {
    ota_0: Box<[u8]>,
    ota_1: Box<[u8]>,
    open_handles: usize,
    bytes_written: usize,
    begin_fails: bool,
    write_fails: bool,
    finalize_fails: bool,
}

impl BufferPartitionWriter {
    fn new() -> Self {
        BufferPartitionWriter {
            ota_0: vec![0xFF; PARTITION_SIZE as usize].into_boxed_slice(),
            ota_1: vec![0xFF; PARTITION_SIZE as usize].into_boxed_slice(),
            open_handles: 0,
            bytes_written: 0,
            begin_fails: false,
            write_fails: false,
            finalize_fails: false,
        }
    }

    pub fn set_begin_fails(&mut self, fails: bool) {
        self.begin_fails = fails;
    }

    pub fn set_write_fails(&mut self, fails: bool) {
        self.write_fails = fails;
    }

    pub fn set_finalize_fails(&mut self, fails: bool) {
        self.finalize_fails = fails;
    }

    /// Number of write sessions that were begun but not yet finalized.
    pub fn open_handles(&self) -> usize {
        self.open_handles
    }

    pub fn total_bytes_written(&self) -> usize {
        self.bytes_written
    }

    pub fn partition_contents(&self, slot: Slot) -> &[u8] {
        match slot {
            Slot::Ota0 => &self.ota_0,
            Slot::Ota1 => &self.ota_1,
        }
    }
}

impl PartitionWriter for BufferPartitionWriter {
    type Handle = BufferWriteHandle;

    fn begin(&mut self, target: &Partition) -> StorageResult<BufferWriteHandle> {
        if self.begin_fails {
            return Err(StorageError::CustomError);
        }
        self.open_handles += 1;
        Ok(BufferWriteHandle {
            slot: target.slot,
            offset: 0,
        })
    }

    fn write(&mut self, handle: &mut BufferWriteHandle, data: &[u8]) -> StorageResult<()> {
        if self.write_fails {
            return Err(StorageError::CustomError);
        }
        let partition = match handle.slot {
            Slot::Ota0 => &mut self.ota_0,
            Slot::Ota1 => &mut self.ota_1,
        };
        if handle.offset + data.len() > partition.len() {
            return Err(StorageError::OutOfBounds);
        }
        partition[handle.offset..][..data.len()].copy_from_slice(data);
        handle.offset += data.len();
        self.bytes_written += data.len();
        Ok(())
    }

    fn finalize(&mut self, _handle: BufferWriteHandle) -> StorageResult<()> {
        // The handle is consumed either way, so it no longer counts as open.
        self.open_handles = self.open_handles.saturating_sub(1);
        if self.finalize_fails {
            return Err(StorageError::CustomError);
        }
        Ok(())
    }
}

pub struct TestRestart {
    count: usize,
}

impl Restart for TestRestart {
    fn restart(&mut self) {
        self.count += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_buffer_writer_appends() {
        let mut writer = BufferPartitionWriter::new();
        let mut handle = writer.begin(&partition_for(Slot::Ota1)).unwrap();
        assert_eq!(writer.open_handles(), 1);

        assert!(writer.write(&mut handle, &[0x01, 0x02]).is_ok());
        assert!(writer.write(&mut handle, &[0x03]).is_ok());
        assert_eq!(&writer.partition_contents(Slot::Ota1)[..3], &[0x01, 0x02, 0x03]);
        assert_eq!(&writer.partition_contents(Slot::Ota0)[..3], &[0xFF, 0xFF, 0xFF]);
        assert_eq!(writer.total_bytes_written(), 3);

        assert!(writer.finalize(handle).is_ok());
        assert_eq!(writer.open_handles(), 0);
    }

    #[test]
    fn test_buffer_writer_bounds() {
        let mut writer = BufferPartitionWriter::new();
        let mut handle = writer.begin(&partition_for(Slot::Ota0)).unwrap();

        let full = vec![0x00; PARTITION_SIZE as usize];
        assert_eq!(writer.write(&mut handle, &full), Ok(()));
        assert_eq!(
            writer.write(&mut handle, &[0x00]),
            Err(StorageError::OutOfBounds)
        );
    }

    #[test]
    fn test_directory_reports_active() {
        let mut directory = TestDirectory::new();
        assert_eq!(directory.active_partition().unwrap().slot, Slot::Ota0);

        directory.set_active(Some(Slot::Ota1));
        assert_eq!(directory.active_partition().unwrap().slot, Slot::Ota1);

        directory.set_active(None);
        assert_eq!(
            directory.active_partition(),
            Err(StorageError::NoActivePartition)
        );
    }

    #[test]
    fn test_directory_commit() {
        let mut directory = TestDirectory::new();
        assert_eq!(directory.boot_target(), None);
        assert!(directory
            .commit_boot_target(&partition_for(Slot::Ota1))
            .is_ok());
        assert_eq!(directory.boot_target(), Some(Slot::Ota1));
    }
}
