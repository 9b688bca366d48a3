use crate::{Error, Result};
use std::io::{Cursor, Read};

#[inline(always)]
pub fn any_as_u8_slice<T: Sized>(p: &T) -> &[u8] {
    typed_to_bytes(std::slice::from_ref(p))
}

#[inline(always)]
pub fn typed_to_bytes<T: Sized>(typed: &[T]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(typed.as_ptr().cast(), std::mem::size_of_val(typed)) }
}

pub fn convert_indices_32_to_16(indices: &[u32]) -> Result<Vec<u16>> {
    let mut result: Vec<u16> = Vec::with_capacity(indices.len());
    for index in indices {
        if *index > u16::MAX as u32 {
            return Err(Error::memory(
                "index value must be <= 65535 when converting to 16-bit",
            ));
        }
        result.push(*index as u16);
    }
    Ok(result)
}

pub fn convert_indices_16_to_32(indices: &[u16]) -> Result<Vec<u32>> {
    let mut result: Vec<u32> = Vec::with_capacity(indices.len());
    for index in indices {
        result.push(u32::from(*index));
    }
    Ok(result)
}

/// A byte-stride view over a caller-owned vertex buffer, giving optimizers
/// and analyzers access to the position channel without needing to know
/// the rest of the caller's vertex layout.
///
/// The first 12 bytes at `position_offset` within each `vertex_stride`-sized
/// record are interpreted as three little-endian IEEE-754 floats (x, y, z).
pub struct VertexDataAdapter<'a> {
    pub reader: Cursor<&'a [u8]>,
    pub vertex_count: usize,
    pub vertex_stride: usize,
    pub position_offset: usize,
}

impl<'a> VertexDataAdapter<'a> {
    pub fn new(
        data: &'a [u8],
        vertex_stride: usize,
        position_offset: usize,
    ) -> Result<VertexDataAdapter<'a>> {
        let vertex_count = data.len() / vertex_stride;
        if data.len() % vertex_stride != 0 {
            Err(Error::memory_dynamic(format!(
                "vertex data length ({}) must be evenly divisible by vertex_stride ({})",
                data.len(),
                vertex_stride
            )))
        } else if position_offset + 12 > vertex_stride {
            Err(Error::memory_dynamic(format!(
                "position_offset ({position_offset}) + 12 must be <= vertex_stride ({vertex_stride})"
            )))
        } else {
            Ok(VertexDataAdapter {
                reader: Cursor::new(data),
                vertex_count,
                vertex_stride,
                position_offset,
            })
        }
    }

    pub fn xyz_f32_at(&mut self, vertex: usize) -> Result<[f32; 3]> {
        if vertex >= self.vertex_count {
            return Err(Error::memory_dynamic(format!(
                "vertex index ({}) must be less than total vertex count ({})",
                vertex, self.vertex_count
            )));
        }
        let reader_pos = self.reader.position();
        let vertex_offset = vertex * self.vertex_stride;
        self.reader
            .set_position((vertex_offset + self.position_offset) as u64);
        let mut scratch = [0u8; 12];
        self.reader.read_exact(&mut scratch)?;

        let x = f32::from_le_bytes(scratch[0..4].try_into().unwrap());
        let y = f32::from_le_bytes(scratch[4..8].try_into().unwrap());
        let z = f32::from_le_bytes(scratch[8..12].try_into().unwrap());

        self.reader.set_position(reader_pos);
        Ok([x, y, z])
    }

}

impl Read for VertexDataAdapter<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::result::Result<usize, std::io::Error> {
        self.reader.read(buf)
    }
}
