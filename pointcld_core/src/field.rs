//! Length-prefixed field codec.
//!
//! Every variable-length piece of a frame record (info string, depth buffer,
//! color buffer) is written as a u32 network-order byte length followed by
//! the payload. The reader owns its buffers; there is no caller-supplied
//! scratch space.

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};

/// Read one length-prefixed field and return the owned payload.
///
/// The length prefix is interpreted as a signed 32-bit value; zero or
/// negative lengths fail with [`Error::Format`]. When `max_len` is given,
/// lengths above it fail the same way (used to bound the info field).
/// A short payload read fails with [`Error::Io`].
pub fn read_field<R: Read>(r: &mut R, max_len: Option<usize>) -> Result<Vec<u8>> {
    let len = r.read_i32::<BigEndian>()?;
    if len <= 0 {
        return Err(Error::Format(format!("field length {len} is not positive")));
    }
    let len = len as usize;
    if let Some(max) = max_len {
        if len > max {
            return Err(Error::Format(format!("field length {len} exceeds limit {max}")));
        }
    }
    let mut payload = vec![0u8; len];
    r.read_exact(&mut payload)?;
    Ok(payload)
}

/// Write one length-prefixed field: u32 network-order length, then payload.
pub fn write_field<W: Write>(w: &mut W, payload: &[u8]) -> Result<()> {
    w.write_u32::<BigEndian>(payload.len() as u32)?;
    w.write_all(payload)?;
    Ok(())
}

/// Encode a depth buffer for the wire: each sample as its big-endian
/// `f32` bit pattern.
pub fn depths_to_bytes(depths: &[f32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(depths.len() * 4);
    for d in depths {
        buf.extend_from_slice(&d.to_bits().to_be_bytes());
    }
    buf
}

/// Decode a wire depth buffer. Fails with [`Error::Format`] when the byte
/// length is not a multiple of the sample width.
pub fn depths_from_bytes(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(Error::Format(format!(
            "depth buffer length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_bits(u32::from_be_bytes(c.try_into().unwrap())))
        .collect())
}
