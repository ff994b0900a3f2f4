//! # Fixed-Width Fields and Length-Prefixed Data
//!
//! Byte-exact readers and writers for 8/16/32/64-bit integers in both
//! endiannesses, plus VarUint32-length-prefixed byte strings and UTF-8 text.
//!
//! Like the VarInt readers, every reader here distinguishes an empty buffer at
//! the field boundary (`Ok(None)`) from a field that starts but does not
//! finish ([`ProtocolError::UnexpectedEof`]). A short field is never consumed.

use bytes::{Buf, BufMut, Bytes};

use crate::core::varint::{read_var_u32, write_var_u32};
use crate::error::{constants, ProtocolError, Result};

/// Check that a `width`-byte field can be read. `false` means clean end.
#[inline]
fn has_field<B: Buf>(buf: &B, width: usize) -> Result<bool> {
    match buf.remaining() {
        0 => Ok(false),
        n if n < width => Err(ProtocolError::UnexpectedEof),
        _ => Ok(true),
    }
}

macro_rules! fixed_width {
    ($($read:ident / $write:ident: $ty:ty => $get:ident / $put:ident;)+) => {
        $(
            #[doc = concat!("Read a `", stringify!($ty), "` (`", stringify!($get), "`).")]
            #[inline]
            pub fn $read<B: Buf>(buf: &mut B) -> Result<Option<$ty>> {
                if !has_field(buf, std::mem::size_of::<$ty>())? {
                    return Ok(None);
                }
                Ok(Some(buf.$get()))
            }

            #[doc = concat!("Write a `", stringify!($ty), "` (`", stringify!($put), "`).")]
            #[inline]
            pub fn $write<B: BufMut>(buf: &mut B, value: $ty) {
                buf.$put(value);
            }
        )+
    };
}

fixed_width! {
    read_u8 / write_u8: u8 => get_u8 / put_u8;
    read_i8 / write_i8: i8 => get_i8 / put_i8;

    read_u16_le / write_u16_le: u16 => get_u16_le / put_u16_le;
    read_u16_be / write_u16_be: u16 => get_u16 / put_u16;
    read_i16_le / write_i16_le: i16 => get_i16_le / put_i16_le;
    read_i16_be / write_i16_be: i16 => get_i16 / put_i16;

    read_u32_le / write_u32_le: u32 => get_u32_le / put_u32_le;
    read_u32_be / write_u32_be: u32 => get_u32 / put_u32;
    read_i32_le / write_i32_le: i32 => get_i32_le / put_i32_le;
    read_i32_be / write_i32_be: i32 => get_i32 / put_i32;

    read_u64_le / write_u64_le: u64 => get_u64_le / put_u64_le;
    read_u64_be / write_u64_be: u64 => get_u64 / put_u64;
    read_i64_le / write_i64_le: i64 => get_i64_le / put_i64_le;
    read_i64_be / write_i64_be: i64 => get_i64 / put_i64;
}

/// Read a VarUint32-length-prefixed byte string.
pub fn read_buffer<B: Buf>(buf: &mut B) -> Result<Option<Bytes>> {
    let Some(len) = read_var_u32(buf)? else {
        return Ok(None);
    };
    let len = len as usize;
    if buf.remaining() < len {
        return Err(ProtocolError::UnexpectedEof);
    }
    Ok(Some(buf.copy_to_bytes(len)))
}

/// Write a VarUint32-length-prefixed byte string.
pub fn write_buffer<B: BufMut>(buf: &mut B, bytes: &[u8]) -> Result<()> {
    let len = u32::try_from(bytes.len()).map_err(|_| ProtocolError::OversizedPacket(bytes.len()))?;
    write_var_u32(buf, len);
    buf.put_slice(bytes);
    Ok(())
}

/// Read a VarUint32-length-prefixed UTF-8 string.
pub fn read_string<B: Buf>(buf: &mut B) -> Result<Option<String>> {
    let Some(bytes) = read_buffer(buf)? else {
        return Ok(None);
    };
    String::from_utf8(bytes.to_vec())
        .map(Some)
        .map_err(|e| ProtocolError::InvalidText(format!("{}: {e}", constants::ERR_INVALID_UTF8)))
}

/// Write a VarUint32-length-prefixed UTF-8 string.
#[inline]
pub fn write_string<B: BufMut>(buf: &mut B, value: &str) -> Result<()> {
    write_buffer(buf, value.as_bytes())
}
