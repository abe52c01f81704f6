//! Pixel types and raw-buffer word conversion.
//!
//! A raster band always externalizes one of seven numeric pixel types. The
//! windowed read path converts between the server's pixel type and the
//! caller's requested buffer type one word at a time; `copy_words` is that
//! conversion primitive.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The numeric element types a raster band can externalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelType {
    /// Unsigned 8-bit integer
    Byte,
    /// Signed 16-bit integer
    Int16,
    /// Unsigned 16-bit integer
    UInt16,
    /// Signed 32-bit integer
    Int32,
    /// Unsigned 32-bit integer
    UInt32,
    /// 32-bit floating point
    Float32,
    /// 64-bit floating point
    Float64,
}

impl PixelType {
    /// Width of one pixel of this type, in bytes.
    pub fn size_bytes(&self) -> usize {
        match self {
            PixelType::Byte => 1,
            PixelType::Int16 | PixelType::UInt16 => 2,
            PixelType::Int32 | PixelType::UInt32 | PixelType::Float32 => 4,
            PixelType::Float64 => 8,
        }
    }

    /// Stable name used in messages and serialized metadata.
    pub fn name(&self) -> &'static str {
        match self {
            PixelType::Byte => "Byte",
            PixelType::Int16 => "Int16",
            PixelType::UInt16 => "UInt16",
            PixelType::Int32 => "Int32",
            PixelType::UInt32 => "UInt32",
            PixelType::Float32 => "Float32",
            PixelType::Float64 => "Float64",
        }
    }
}

/// Decode one word at the start of `bytes` as an f64.
fn read_word(bytes: &[u8], ty: PixelType) -> f64 {
    match ty {
        PixelType::Byte => bytes[0] as f64,
        PixelType::Int16 => i16::from_ne_bytes([bytes[0], bytes[1]]) as f64,
        PixelType::UInt16 => u16::from_ne_bytes([bytes[0], bytes[1]]) as f64,
        PixelType::Int32 => i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
        PixelType::UInt32 => u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
        PixelType::Float32 => f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
        PixelType::Float64 => f64::from_ne_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]),
    }
}

/// Encode `value` into `out` as one word of `ty`. Integer targets round to
/// nearest; `as` casts saturate at the target's bounds.
fn write_word(value: f64, ty: PixelType, out: &mut [u8]) {
    match ty {
        PixelType::Byte => out[0] = value.round() as u8,
        PixelType::Int16 => out[..2].copy_from_slice(&(value.round() as i16).to_ne_bytes()),
        PixelType::UInt16 => out[..2].copy_from_slice(&(value.round() as u16).to_ne_bytes()),
        PixelType::Int32 => out[..4].copy_from_slice(&(value.round() as i32).to_ne_bytes()),
        PixelType::UInt32 => out[..4].copy_from_slice(&(value.round() as u32).to_ne_bytes()),
        PixelType::Float32 => out[..4].copy_from_slice(&(value as f32).to_ne_bytes()),
        PixelType::Float64 => out[..8].copy_from_slice(&value.to_ne_bytes()),
    }
}

/// Convert `count` pixels from `src` (typed `src_type`) into `dst` (typed
/// `dst_type`). Same-type copies degenerate to a single memcpy.
pub fn copy_words(
    src: &[u8],
    src_type: PixelType,
    dst: &mut [u8],
    dst_type: PixelType,
    count: usize,
) -> Result<()> {
    let src_width = src_type.size_bytes();
    let dst_width = dst_type.size_bytes();
    if src.len() < count * src_width || dst.len() < count * dst_width {
        return Err(Error::Internal {
            message: format!(
                "copy_words buffer too small for {} pixels ({} -> {})",
                count,
                src_type.name(),
                dst_type.name()
            ),
        });
    }

    if src_type == dst_type {
        dst[..count * dst_width].copy_from_slice(&src[..count * src_width]);
        return Ok(());
    }

    for i in 0..count {
        let value = read_word(&src[i * src_width..], src_type);
        write_word(value, dst_type, &mut dst[i * dst_width..(i + 1) * dst_width]);
    }

    Ok(())
}
