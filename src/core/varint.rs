//! # Variable-Length Integers
//!
//! VarUint32 / VarUint64: 7-bit groups, least significant group first, the
//! high bit of each byte flags a continuation.
//!
//! Readers return `Ok(None)` when the buffer is empty at a field boundary so
//! callers can tell "no more data" apart from a value cut short, which is
//! [`ProtocolError::UnexpectedEof`].
//!
//! ```rust
//! use server_list_ping::core::varint::{read_var_u32, write_var_u32};
//!
//! let mut buf = Vec::new();
//! write_var_u32(&mut buf, 300);
//! assert_eq!(buf, [0xAC, 0x02]);
//! assert_eq!(read_var_u32(&mut &buf[..]).unwrap(), Some(300));
//! ```

use bytes::{Buf, BufMut};

use crate::error::{ProtocolError, Result};

/// Maximum encoded size of a VarUint32
pub const MAX_VARINT32_BYTES: usize = 5;

/// Maximum encoded size of a VarUint64
pub const MAX_VARINT64_BYTES: usize = 10;

const SEGMENT_BITS: u8 = 0x7F;
const CONTINUE_BIT: u8 = 0x80;

fn read_groups<B: Buf>(buf: &mut B, max_bytes: usize) -> Result<Option<u64>> {
    let mut result = 0u64;
    let mut len = 0usize;
    loop {
        if !buf.has_remaining() {
            if len > 0 {
                return Err(ProtocolError::UnexpectedEof);
            }
            return Ok(None);
        }
        let byte = buf.get_u8();
        result |= u64::from(byte & SEGMENT_BITS) << (7 * len);
        if byte & CONTINUE_BIT == 0 {
            return Ok(Some(result));
        }
        len += 1;
        if len == max_bytes {
            return Err(ProtocolError::VarIntTooLong { max_bytes });
        }
    }
}

/// Read a VarUint32. Bits beyond the 32nd are discarded.
#[inline]
pub fn read_var_u32<B: Buf>(buf: &mut B) -> Result<Option<u32>> {
    Ok(read_groups(buf, MAX_VARINT32_BYTES)?.map(|v| v as u32))
}

/// Read a VarUint64.
#[inline]
pub fn read_var_u64<B: Buf>(buf: &mut B) -> Result<Option<u64>> {
    read_groups(buf, MAX_VARINT64_BYTES)
}

/// Read a VarInt, the two's complement view of a VarUint32.
#[inline]
pub fn read_var_i32<B: Buf>(buf: &mut B) -> Result<Option<i32>> {
    Ok(read_var_u32(buf)?.map(|v| v as i32))
}

/// Write a VarUint64 in its canonical (shortest) form.
pub fn write_var_u64<B: BufMut>(buf: &mut B, mut value: u64) {
    loop {
        let byte = (value as u8) & SEGMENT_BITS;
        value >>= 7;
        if value == 0 {
            buf.put_u8(byte);
            return;
        }
        buf.put_u8(byte | CONTINUE_BIT);
    }
}

/// Write a VarUint32 in its canonical (shortest) form.
#[inline]
pub fn write_var_u32<B: BufMut>(buf: &mut B, value: u32) {
    write_var_u64(buf, u64::from(value));
}

/// Write a VarInt. Negative values always take five bytes.
#[inline]
pub fn write_var_i32<B: BufMut>(buf: &mut B, value: i32) {
    write_var_u32(buf, value as u32);
}

/// Number of bytes [`write_var_u64`] emits for `value`.
pub fn var_u64_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.max(1).div_ceil(7)
}

/// Number of bytes [`write_var_u32`] emits for `value`.
#[inline]
pub fn var_u32_len(value: u32) -> usize {
    var_u64_len(u64::from(value))
}
