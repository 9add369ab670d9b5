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

//! File-backed environment for running the receiver on a host.
//!
//! Partitions are plain files under a state directory (`ota_0.bin`,
//! `ota_1.bin`), the boot selection is a `boot` file holding the active
//! label, and "restart" exits the process. Useful for exercising the
//! protocol end to end without a device.

use crate::api::partition::{Partition, PartitionDirectory, Slot, StorageError, StorageResult};
use crate::api::restart::Restart;
use crate::api::writer::PartitionWriter;
use crate::env::Env;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Capacity of each emulated partition file.
pub const HOST_PARTITION_SIZE: u32 = 0x0010_0000;

const OTA_0_ADDRESS: u32 = 0x0011_0000;
const OTA_1_ADDRESS: u32 = 0x0021_0000;

fn partition_for(slot: Slot) -> Partition {
    Partition {
        slot,
        address: match slot {
            Slot::Ota0 => OTA_0_ADDRESS,
            Slot::Ota1 => OTA_1_ADDRESS,
        },
        size: HOST_PARTITION_SIZE,
    }
}

pub struct HostEnv {
    directory: HostDirectory,
    writer: HostWriter,
    restart: HostRestart,
}

impl HostEnv {
    /// Creates the state directory if needed and sets up the environment.
    pub fn new(root: impl AsRef<Path>) -> io::Result<HostEnv> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(HostEnv {
            directory: HostDirectory { root: root.clone() },
            writer: HostWriter { root },
            restart: HostRestart,
        })
    }
}

impl Env for HostEnv {
    type Directory = HostDirectory;
    type Writer = HostWriter;
    type Restart = HostRestart;
    type Write = HostWrite;

    fn directory(&mut self) -> &mut HostDirectory {
        &mut self.directory
    }

    fn writer(&mut self) -> &mut HostWriter {
        &mut self.writer
    }

    fn restarter(&mut self) -> &mut HostRestart {
        &mut self.restart
    }

    fn write(&mut self) -> HostWrite {
        HostWrite
    }
}

pub struct HostDirectory {
    root: PathBuf,
}

impl HostDirectory {
    fn boot_file(&self) -> PathBuf {
        self.root.join("boot")
    }
}

impl PartitionDirectory for HostDirectory {
    fn active_partition(&self) -> StorageResult<Partition> {
        // A fresh state directory boots from ota_0.
        let slot = match fs::read_to_string(self.boot_file()) {
            Ok(label) if label.trim() == Slot::Ota1.label() => Slot::Ota1,
            _ => Slot::Ota0,
        };
        Ok(partition_for(slot))
    }

    fn partition(&self, slot: Slot) -> Partition {
        partition_for(slot)
    }

    fn commit_boot_target(&mut self, partition: &Partition) -> StorageResult<()> {
        fs::write(self.boot_file(), partition.slot.label())
            .map_err(|_| StorageError::CustomError)
    }
}

pub struct HostWriteHandle {
    file: File,
    written: u32,
    size: u32,
}

pub struct HostWriter {
    root: PathBuf,
}

impl PartitionWriter for HostWriter {
    type Handle = HostWriteHandle;

    fn begin(&mut self, target: &Partition) -> StorageResult<HostWriteHandle> {
        let path = self.root.join(format!("{}.bin", target.slot.label()));
        let file = File::create(path).map_err(|_| StorageError::CustomError)?;
        Ok(HostWriteHandle {
            file,
            written: 0,
            size: target.size,
        })
    }

    fn write(&mut self, handle: &mut HostWriteHandle, data: &[u8]) -> StorageResult<()> {
        let len = data.len() as u32;
        if handle.written + len > handle.size {
            return Err(StorageError::OutOfBounds);
        }
        handle
            .file
            .write_all(data)
            .map_err(|_| StorageError::CustomError)?;
        handle.written += len;
        Ok(())
    }

    fn finalize(&mut self, handle: HostWriteHandle) -> StorageResult<()> {
        handle.file.sync_all().map_err(|_| StorageError::CustomError)
    }
}

pub struct HostRestart;

impl Restart for HostRestart {
    fn restart(&mut self) {
        println!("boot target committed, restarting");
        std::process::exit(0);
    }
}

pub struct HostWrite;

impl core::fmt::Write for HostWrite {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        print!("{}", s);
        Ok(())
    }
}
