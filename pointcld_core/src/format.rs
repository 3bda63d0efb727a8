use crate::error::{Error, Result};

/// Magic bytes identifying a PointCld container: 8 ASCII bytes, no padding.
pub const MAGIC: &[u8; 8] = b"PointCld";

/// Current format revision, stored in the header.
pub const VERSION: u32 = 1;

/// Fixed size of the container header in bytes.
///   magic[8] + version:u32 + frame_count:u32 + start_time:f64 + end_time:f64
///   = 8 + 4 + 4 + 8 + 8 = 32
pub const HEADER_SIZE: u64 = 32;

/// Byte offset of the `frame_count` field inside the header. The writer
/// seeks back here after every append and again on close.
pub const FRAME_COUNT_OFFSET: u64 = 12;

/// Fixed overhead of one frame record in bytes:
///   leading size:u32 + index:u32 + time:u64
///   + three field length prefixes (u32 each) + trailing size:u32
///   = 6 × 4 + 8 = 32
///
/// A record's on-disk size is `info.len() + point_count * 8 + RECORD_OVERHEAD`
/// and that total — both size markers included — is what the size markers
/// themselves carry. Keeping the markers at the full record length is what
/// makes forward skips and backward hops symmetric.
pub const RECORD_OVERHEAD: u32 = 32;

/// Bytes consumed before a skip decision can be made: leading size, index,
/// and timestamp. A skipping read seeks forward `size - RECORD_HEAD_SIZE`.
pub const RECORD_HEAD_SIZE: u32 = 16;

/// Upper bound on the info field accepted by the reader.
pub const MAX_INFO_LEN: usize = 8192;

/// Decoded representation of the 32-byte container header.
///
/// All integers travel in network byte order. The two timestamps are raw
/// `f64` bit patterns written big-endian, never numerically converted.
#[derive(Debug, Clone)]
pub struct Header {
    pub version: u32,
    /// Number of frame records successfully appended.
    pub frame_count: u32,
    /// Timestamp of the first record; fixed once the first append happens.
    pub start_time: f64,
    /// Timestamp of the most recently appended record.
    pub end_time: f64,
}

impl Header {
    /// Serialize to exactly `HEADER_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE as usize] {
        let mut buf = [0u8; HEADER_SIZE as usize];
        buf[..8].copy_from_slice(MAGIC);
        buf[8..12].copy_from_slice(&self.version.to_be_bytes());
        buf[12..16].copy_from_slice(&self.frame_count.to_be_bytes());
        buf[16..24].copy_from_slice(&self.start_time.to_bits().to_be_bytes());
        buf[24..32].copy_from_slice(&self.end_time.to_bits().to_be_bytes());
        buf
    }

    /// Deserialize from `HEADER_SIZE` bytes, byte-comparing the magic.
    pub fn from_bytes(buf: &[u8; HEADER_SIZE as usize]) -> Result<Self> {
        if &buf[..8] != MAGIC {
            return Err(Error::Format("bad magic — not a PointCld container".into()));
        }
        Ok(Self {
            version: u32::from_be_bytes(buf[8..12].try_into().unwrap()),
            frame_count: u32::from_be_bytes(buf[12..16].try_into().unwrap()),
            start_time: f64::from_bits(u64::from_be_bytes(buf[16..24].try_into().unwrap())),
            end_time: f64::from_bits(u64::from_be_bytes(buf[24..32].try_into().unwrap())),
        })
    }
}
