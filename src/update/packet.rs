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

use byteorder::{ByteOrder, LittleEndian};

/// Marker identifying a metadata message on the wire.
pub const METADATA_MARKER: &[u8; 4] = b"UPDM";
/// Marker identifying a data message on the wire.
pub const DATA_MARKER: &[u8; 4] = b"UPDD";

/// Fixed size of a metadata message: marker plus four u32 fields.
pub const METADATA_LENGTH: usize = 20;
/// Fixed size of the data message header preceding the chunk bytes.
pub const DATA_HEADER_LENGTH: usize = 12;

const REPLY_OK: &[u8] = b"OK";
const REPLY_ERROR: &[u8] = b"ERROR";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer is shorter than the fixed layout of its message type.
    TooShort,
    /// The 4-byte marker at offset 0 matches no known message type.
    UnknownMarker,
    /// A metadata message declared a non-zero sequence number, or a data
    /// message declared sequence number zero.
    InvalidSequence,
    /// A data message declared more chunk bytes than the datagram carries.
    LengthMismatch,
}

/// Announces a transfer: wire layout `"UPDM" seq=0 image_size num_packets checksum`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetadataPacket {
    /// Total image size in bytes, informational.
    pub image_size: u32,
    /// Number of data chunks the sender will transmit, 1-indexed.
    pub packet_count: u32,
    /// Checksum the sender declares for the finished image.
    pub image_checksum: u32,
}

/// Carries one image chunk: wire layout `"UPDD" seq chunk_size chunk...`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataPacket<'a> {
    /// 1-indexed position of this chunk in the transfer, never zero.
    pub sequence_number: u32,
    /// The raw image bytes, exactly as many as the header declared.
    pub chunk: &'a [u8],
}

/// A classified inbound datagram. The chunk borrows the receive buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Packet<'a> {
    Metadata(MetadataPacket),
    Data(DataPacket<'a>),
}

impl<'a> Packet<'a> {
    /// Classifies and decodes a raw datagram payload.
    ///
    /// Pure parsing with no side effects. Bytes past the declared layout are
    /// ignored as datagram padding.
    pub fn decode(bytes: &'a [u8]) -> Result<Packet<'a>, DecodeError> {
        if bytes.len() < METADATA_MARKER.len() {
            return Err(DecodeError::TooShort);
        }
        let marker = array_ref!(bytes, 0, 4);
        if marker == METADATA_MARKER {
            if bytes.len() < METADATA_LENGTH {
                return Err(DecodeError::TooShort);
            }
            if LittleEndian::read_u32(&bytes[4..8]) != 0 {
                return Err(DecodeError::InvalidSequence);
            }
            Ok(Packet::Metadata(MetadataPacket {
                image_size: LittleEndian::read_u32(&bytes[8..12]),
                packet_count: LittleEndian::read_u32(&bytes[12..16]),
                image_checksum: LittleEndian::read_u32(&bytes[16..20]),
            }))
        } else if marker == DATA_MARKER {
            if bytes.len() < DATA_HEADER_LENGTH {
                return Err(DecodeError::TooShort);
            }
            let sequence_number = LittleEndian::read_u32(&bytes[4..8]);
            if sequence_number == 0 {
                return Err(DecodeError::InvalidSequence);
            }
            let chunk_size = LittleEndian::read_u32(&bytes[8..12]) as usize;
            if chunk_size > bytes.len() - DATA_HEADER_LENGTH {
                return Err(DecodeError::LengthMismatch);
            }
            Ok(Packet::Data(DataPacket {
                sequence_number,
                chunk: &bytes[DATA_HEADER_LENGTH..][..chunk_size],
            }))
        } else {
            Err(DecodeError::UnknownMarker)
        }
    }
}

/// The per-datagram wire reply, unicast back to the sender.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Error,
}

impl Reply {
    /// Encodes the reply. A fresh value is built per inbound datagram, so
    /// there is no shared reply buffer to race on.
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Reply::Ok => REPLY_OK,
            Reply::Error => REPLY_ERROR,
        }
    }
}
