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

/// Session controller error conditions.
///
/// All of these are handled inside the controller; the only thing that
/// crosses the wire is the `OK`/`ERROR` reply they map to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateError {
    /// The datagram could not be decoded into a known message.
    MalformedPacket,

    /// The partition directory cannot tell which partition is active, so no
    /// write target can be selected.
    NoActivePartition,

    /// Opening the write session on the target partition failed.
    WriteSessionBegin,

    /// A data message arrived with no session to append to.
    NoSession,

    /// A data message arrived out of order, duplicated or ahead. The session
    /// is kept unchanged; the sender is expected to retransmit.
    SequenceMismatch,

    /// Appending a chunk failed; the session is aborted.
    ChunkWrite,

    /// Closing the completed write failed; the session is torn down without
    /// switching the boot partition.
    Finalize,

    /// Marking the freshly written partition as next boot target failed.
    BootCommit,
}
