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

//! The update session protocol.
//!
//! [`UpdateState`] is the session controller: it classifies each inbound
//! datagram, advances at most one [`UpdateSession`], drives the partition
//! writer and directory, and produces exactly one reply per datagram.

pub mod packet;
pub mod status;

use self::packet::{DataPacket, MetadataPacket, Packet, Reply};
use self::status::UpdateError;
use crate::api::partition::{Partition, PartitionDirectory};
use crate::api::restart::Restart;
use crate::api::writer::PartitionWriter;
use crate::env::Env;

type WriteHandle<E> = <<E as Env>::Writer as PartitionWriter>::Handle;

/// State of one in-progress image transfer.
///
/// Created by the first valid metadata message, mutated by each accepted
/// data message, destroyed on completion or when a new metadata message
/// supersedes it. At most one is alive at a time, and it exclusively owns
/// the open write handle.
pub struct UpdateSession<E: Env> {
    target: Partition,
    handle: WriteHandle<E>,
    expected_image_size: u32,
    expected_packet_count: u32,
    image_checksum: u32,
    last_accepted_sequence: u32,
}

impl<E: Env> UpdateSession<E> {
    /// The inactive partition this transfer is written into.
    pub fn target(&self) -> &Partition {
        &self.target
    }

    pub fn expected_image_size(&self) -> u32 {
        self.expected_image_size
    }

    pub fn expected_packet_count(&self) -> u32 {
        self.expected_packet_count
    }

    /// The checksum the sender declared for the finished image. Recorded
    /// only; validating the written image is the flash subsystem's job.
    pub fn declared_checksum(&self) -> u32 {
        self.image_checksum
    }

    /// Sequence number of the last chunk that was durably written. Starts at
    /// 0 and only ever advances by exactly 1.
    pub fn last_accepted_sequence(&self) -> u32 {
        self.last_accepted_sequence
    }
}

/// The session controller state machine.
///
/// `Idle` is a `None` session, `Receiving` is a `Some` session, and the
/// terminal `Complete` state is reached when a finished transfer has been
/// committed as next boot target (the session itself is already torn down
/// by then, and the device is restarting).
pub struct UpdateState<E: Env> {
    session: Option<UpdateSession<E>>,
    complete: bool,
    committed: Option<Partition>,
}

impl<E: Env> UpdateState<E> {
    pub fn new() -> Self {
        UpdateState {
            session: None,
            complete: false,
            committed: None,
        }
    }

    /// The in-progress transfer, if any.
    pub fn session(&self) -> Option<&UpdateSession<E>> {
        self.session.as_ref()
    }

    /// Whether a transfer ran to completion, including the boot-target
    /// commit. Sticky until the next metadata message (on hardware the
    /// device restarts first).
    pub fn update_complete(&self) -> bool {
        self.complete
    }

    /// The partition committed as next boot target by a completed transfer.
    pub fn new_partition(&self) -> Option<&Partition> {
        self.committed.as_ref()
    }

    /// Processes one inbound datagram and returns the reply for the sender.
    ///
    /// This is the single entry point of the controller. The caller must
    /// serialize invocations; one datagram is fully processed, including any
    /// blocking flash write, before the next is considered.
    pub fn process_datagram(&mut self, env: &mut E, datagram: &[u8]) -> Reply {
        match self.handle_datagram(env, datagram) {
            Ok(()) => Reply::Ok,
            Err(error) => {
                debug_update!(env, "replying ERROR: {:?}", error);
                Reply::Error
            }
        }
    }

    fn handle_datagram(&mut self, env: &mut E, datagram: &[u8]) -> Result<(), UpdateError> {
        // Unrecognized and malformed datagrams also get an ERROR reply, so a
        // sender never hangs waiting for a dropped message.
        let packet = Packet::decode(datagram).map_err(|_| UpdateError::MalformedPacket)?;
        match packet {
            Packet::Metadata(metadata) => self.process_metadata(env, metadata),
            Packet::Data(data) => self.process_data(env, data),
        }
    }

    /// Starts a fresh session targeting the partition that is not active.
    fn process_metadata(
        &mut self,
        env: &mut E,
        metadata: MetadataPacket,
    ) -> Result<(), UpdateError> {
        if self.session.is_some() {
            // A fresh metadata message supersedes the running transfer. This
            // is the documented way for a sender to restart after losing
            // track, not an error.
            debug_update!(env, "metadata mid-session, dropping current transfer");
            self.abort_session(env);
        }
        let active = env
            .directory()
            .active_partition()
            .map_err(|_| UpdateError::NoActivePartition)?;
        let target = env.directory().partition(active.slot.other());
        let handle = env
            .writer()
            .begin(&target)
            .map_err(|_| UpdateError::WriteSessionBegin)?;
        debug_update!(
            env,
            "session started: {} packets, {} bytes into {}",
            metadata.packet_count,
            metadata.image_size,
            target.slot.label()
        );
        self.complete = false;
        self.committed = None;
        self.session = Some(UpdateSession {
            target,
            handle,
            expected_image_size: metadata.image_size,
            expected_packet_count: metadata.packet_count,
            image_checksum: metadata.image_checksum,
            last_accepted_sequence: 0,
        });
        Ok(())
    }

    /// Appends one chunk to the open session, in strict sequence order.
    fn process_data(&mut self, env: &mut E, data: DataPacket) -> Result<(), UpdateError> {
        let session = match self.session.as_mut() {
            Some(session) => session,
            None => return Err(UpdateError::NoSession),
        };
        let expected = session.last_accepted_sequence + 1;
        if data.sequence_number != expected {
            // Out of order, duplicate or ahead. Never ack a chunk that was
            // not durably written: the ERROR reply is what makes the sender
            // retransmit instead of stalling the transfer forever.
            return Err(UpdateError::SequenceMismatch);
        }
        if env.writer().write(&mut session.handle, data.chunk).is_err() {
            self.abort_session(env);
            return Err(UpdateError::ChunkWrite);
        }
        session.last_accepted_sequence = expected;
        // Exact equality, not ordering: a session declaring zero packets can
        // never complete and stays open until superseded.
        if session.last_accepted_sequence != session.expected_packet_count {
            return Ok(());
        }
        self.finish_session(env)
    }

    /// Closes out a fully received transfer: finalize, commit, restart.
    fn finish_session(&mut self, env: &mut E) -> Result<(), UpdateError> {
        let session = match self.session.take() {
            Some(session) => session,
            None => return Ok(()),
        };
        env.writer()
            .finalize(session.handle)
            .map_err(|_| UpdateError::Finalize)?;
        env.directory()
            .commit_boot_target(&session.target)
            .map_err(|_| UpdateError::BootCommit)?;
        debug_update!(
            env,
            "update complete: {} is next boot target, declared checksum {:08x}",
            session.target.slot.label(),
            session.image_checksum
        );
        self.committed = Some(session.target);
        self.complete = true;
        env.restarter().restart();
        Ok(())
    }

    /// Drops the current session, if any, releasing its write handle. The
    /// partially written image is discarded by the writer.
    fn abort_session(&mut self, env: &mut E) {
        if let Some(session) = self.session.take() {
            let _ = env.writer().finalize(session.handle);
        }
    }
}
