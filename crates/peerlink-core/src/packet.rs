//! Outbound packet construction, payload kinds and flag policy.
//!
//! An [`OutboundPacket`] is built immediately before a send call from one
//! of several payload kinds. Its storage is always independently allocated
//! and copied from the input, never aliased, so the caller's buffer may be
//! freed or mutated the moment the builder returns. The no-copy transport
//! flag is cleared unconditionally to preserve that guarantee.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{ErrorKind, Result};

/// Delivery-guarantee flags applied to an outbound packet.
///
/// The bit values match the transport's wire-level flag word; unknown bits
/// pass through untouched so future transport flags keep working.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PacketFlags(u32);

impl PacketFlags {
    /// Packet must arrive, retransmitted until acknowledged.
    pub const RELIABLE: PacketFlags = PacketFlags(1 << 0);
    /// Packet bypasses sequencing; duplicates are dropped.
    pub const UNSEQUENCED: PacketFlags = PacketFlags(1 << 1);
    /// Transport should alias caller memory instead of copying. Never
    /// forwarded: buffers handed across a foreign boundary cannot be safely
    /// aliased, so `sanitized` strips this bit before every send.
    pub const NO_COPY: PacketFlags = PacketFlags(1 << 2);
    /// Unreliable packet may be fragmented across datagrams.
    pub const UNRELIABLE_FRAGMENT: PacketFlags = PacketFlags(1 << 3);

    /// No flags set.
    pub const fn empty() -> Self {
        PacketFlags(0)
    }

    /// Reinterprets a raw flag word.
    pub const fn from_bits(bits: u32) -> Self {
        PacketFlags(bits)
    }

    /// Returns the raw flag word.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit of `other` is set.
    pub const fn contains(self, other: PacketFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns these flags with the no-copy bit cleared.
    pub const fn sanitized(self) -> Self {
        PacketFlags(self.0 & !Self::NO_COPY.0)
    }
}

impl Default for PacketFlags {
    /// Sends default to reliable delivery.
    fn default() -> Self {
        Self::RELIABLE
    }
}

impl std::ops::BitOr for PacketFlags {
    type Output = PacketFlags;
    fn bitor(self, rhs: PacketFlags) -> PacketFlags {
        PacketFlags(self.0 | rhs.0)
    }
}

/// A borrowed numeric slice to be serialized element-wise, little-endian.
#[derive(Copy, Clone, Debug)]
pub enum TypedSlice<'a> {
    /// Unsigned bytes.
    U8(&'a [u8]),
    /// Signed bytes.
    I8(&'a [i8]),
    /// Unsigned 16-bit values.
    U16(&'a [u16]),
    /// Signed 16-bit values.
    I16(&'a [i16]),
    /// Unsigned 32-bit values.
    U32(&'a [u32]),
    /// Signed 32-bit values.
    I32(&'a [i32]),
    /// 32-bit floats.
    F32(&'a [f32]),
    /// 64-bit floats.
    F64(&'a [f64]),
}

impl TypedSlice<'_> {
    /// Number of bytes this slice serializes to.
    pub fn byte_len(&self) -> usize {
        match self {
            TypedSlice::U8(s) => s.len(),
            TypedSlice::I8(s) => s.len(),
            TypedSlice::U16(s) => s.len() * 2,
            TypedSlice::I16(s) => s.len() * 2,
            TypedSlice::U32(s) => s.len() * 4,
            TypedSlice::I32(s) => s.len() * 4,
            TypedSlice::F32(s) => s.len() * 4,
            TypedSlice::F64(s) => s.len() * 8,
        }
    }

    fn write_to(&self, buffer: &mut Vec<u8>) -> std::io::Result<()> {
        match *self {
            TypedSlice::U8(s) => buffer.write_all(s)?,
            TypedSlice::I8(s) => {
                for &v in s {
                    buffer.write_i8(v)?;
                }
            }
            TypedSlice::U16(s) => {
                for &v in s {
                    buffer.write_u16::<LittleEndian>(v)?;
                }
            }
            TypedSlice::I16(s) => {
                for &v in s {
                    buffer.write_i16::<LittleEndian>(v)?;
                }
            }
            TypedSlice::U32(s) => {
                for &v in s {
                    buffer.write_u32::<LittleEndian>(v)?;
                }
            }
            TypedSlice::I32(s) => {
                for &v in s {
                    buffer.write_i32::<LittleEndian>(v)?;
                }
            }
            TypedSlice::F32(s) => {
                for &v in s {
                    buffer.write_f32::<LittleEndian>(v)?;
                }
            }
            TypedSlice::F64(s) => {
                for &v in s {
                    buffer.write_f64::<LittleEndian>(v)?;
                }
            }
        }
        Ok(())
    }
}

/// Payload input accepted by the send operations.
///
/// [`crate::transport::Transport`] never sees these kinds: the builder
/// copies each of them into owned storage first. `send` accepts
/// `Bytes`/`Text`; `send_raw` accepts `Bytes`/`Typed`/`Region`.
#[derive(Copy, Clone, Debug)]
pub enum SendData<'a> {
    /// A contiguous byte buffer.
    Bytes(&'a [u8]),
    /// UTF-8 text, sent as its byte representation.
    Text(&'a str),
    /// A typed numeric array, serialized little-endian.
    Typed(TypedSlice<'a>),
    /// A raw memory region viewed as bytes (e.g. a mapped buffer).
    Region(&'a [u8]),
}

/// A transient outbound packet, ready for the transport.
///
/// Owns its payload; dropping it releases the storage, which is how a
/// failed enqueue is cleaned up without transport involvement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundPacket {
    payload: Vec<u8>,
    flags: PacketFlags,
}

impl OutboundPacket {
    /// Builds a packet for the standard send path. Accepts `Bytes` and
    /// `Text`; other kinds are `UnsupportedInput`.
    pub fn from_data(data: SendData<'_>, flags: PacketFlags) -> Result<Self> {
        match data {
            SendData::Bytes(bytes) => Self::copied(bytes, flags),
            SendData::Text(text) => Self::copied(text.as_bytes(), flags),
            SendData::Typed(_) | SendData::Region(_) => Err(ErrorKind::UnsupportedInput),
        }
    }

    /// Builds a packet for the raw send path. Accepts `Bytes`, `Typed`
    /// and `Region` without an intermediate retype step; `Text` is
    /// `UnsupportedInput` here.
    pub fn from_raw(data: SendData<'_>, flags: PacketFlags) -> Result<Self> {
        match data {
            SendData::Bytes(bytes) | SendData::Region(bytes) => Self::copied(bytes, flags),
            SendData::Typed(slice) => {
                let mut payload = Vec::with_capacity(slice.byte_len());
                slice.write_to(&mut payload).map_err(|_| ErrorKind::PacketBuildFailed)?;
                Ok(Self { payload, flags: flags.sanitized() })
            }
            SendData::Text(_) => Err(ErrorKind::UnsupportedInput),
        }
    }

    fn copied(bytes: &[u8], flags: PacketFlags) -> Result<Self> {
        Ok(Self { payload: bytes.to_vec(), flags: flags.sanitized() })
    }

    /// The packet's payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The sanitized flag set; the no-copy bit is guaranteed clear.
    pub fn flags(&self) -> PacketFlags {
        self.flags
    }

    /// Consumes the packet, returning its payload.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}
