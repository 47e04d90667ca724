/// Byte-stream codec for cached stage artifacts
///
/// One stage serializes as a little-endian length-prefixed record:
///
/// ```text
/// [u32 block_len]                      0 = stage absent/invalid, nothing follows
/// [u32 src_len][src bytes]             translated source
/// [u16 n][(u8 len, bytes) * n]         used parameter names
/// [u16 n][(u8 len, bytes) * n]         resource names
/// [u16 n][(u8,bytes u8,bytes) * n]     texture/sampler pairs
/// <stage-specific trailer>             vertex only: usages, usage indices,
///                                      attribute names
/// ```
///
/// Decoding a block reproduces every field in order; truncated input is
/// an [`Error::InvalidResource`].

use nova_3d_engine::nova3d::{Error, Result};
use nova_3d_engine::nova3d::shader::{DeviceCaps, ShaderStage, VertexElementUsage};
use crate::gles_shader_stage::{ShaderStageObject, StageExt};

// ===== PRIMITIVES =====

/// Little-endian byte sink
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// String with a u8 length prefix (name tables)
    pub fn write_str8(&mut self, s: &str) {
        debug_assert!(s.len() <= u8::MAX as usize);
        self.write_u8(s.len() as u8);
        self.write_bytes(s.as_bytes());
    }

    /// String with a u32 length prefix (source text)
    pub fn write_str32(&mut self, s: &str) {
        self.write_u32(s.len() as u32);
        self.write_bytes(s.as_bytes());
    }
}

/// Little-endian cursor over a byte slice
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn truncated() -> Error {
        Error::InvalidResource("truncated shader cache stream".to_string())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Self::truncated());
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_string(&mut self, len: usize) -> Result<String> {
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| Error::InvalidResource("non-UTF-8 string in shader cache stream".to_string()))
    }

    pub fn read_str8(&mut self) -> Result<String> {
        let len = self.read_u8()? as usize;
        self.read_string(len)
    }

    pub fn read_str32(&mut self) -> Result<String> {
        let len = self.read_u32()? as usize;
        self.read_string(len)
    }
}

// ===== STAGE BLOCKS =====

/// Append one stage's cache block. An invalid or missing stage writes a
/// zero block length and nothing else.
pub(crate) fn encode_stage_block(stage_obj: Option<&ShaderStageObject>, out: &mut ByteWriter) {
    let stage_obj = match stage_obj {
        Some(s) if s.valid => s,
        _ => {
            out.write_u32(0);
            return;
        }
    };

    let mut block = ByteWriter::new();
    block.write_str32(&stage_obj.glsl_src);

    block.write_u16(stage_obj.param_names.len() as u16);
    for name in &stage_obj.param_names {
        block.write_str8(name);
    }

    block.write_u16(stage_obj.res_names.len() as u16);
    for name in &stage_obj.res_names {
        block.write_str8(name);
    }

    block.write_u16(stage_obj.tex_sampler_pairs.len() as u16);
    for (tex, sampler) in &stage_obj.tex_sampler_pairs {
        block.write_str8(tex);
        block.write_str8(sampler);
    }

    if let StageExt::Vertex {
        usages,
        usage_indices,
        attrib_names,
        ..
    } = &stage_obj.ext
    {
        block.write_u8(usages.len() as u8);
        for usage in usages {
            block.write_u8(usage.to_u8());
        }

        block.write_u8(usage_indices.len() as u8);
        block.write_bytes(usage_indices);

        block.write_u8(attrib_names.len() as u8);
        for name in attrib_names {
            block.write_str8(name);
        }
    }

    let block = block.into_bytes();
    out.write_u32(block.len() as u32);
    out.write_bytes(&block);
}

/// Decode one stage's cache block. `Ok(None)` for an absent stage
/// (zero block length).
pub(crate) fn decode_stage_block<'a>(
    stage: ShaderStage,
    caps: &DeviceCaps,
    r: &mut ByteReader<'a>,
) -> Result<Option<ShaderStageObject>> {
    let block_len = r.read_u32()? as usize;
    if block_len == 0 {
        return Ok(None);
    }

    // Parse inside the declared block so a malformed block cannot
    // desynchronize the following stages
    let block = r.read_bytes(block_len)?;
    let mut r = ByteReader::new(block);

    let mut stage_obj = ShaderStageObject::new(stage, caps);
    stage_obj.glsl_src = r.read_str32()?;

    let n = r.read_u16()? as usize;
    stage_obj.param_names = (0..n).map(|_| r.read_str8()).collect::<Result<_>>()?;

    let n = r.read_u16()? as usize;
    stage_obj.res_names = (0..n).map(|_| r.read_str8()).collect::<Result<_>>()?;

    let n = r.read_u16()? as usize;
    stage_obj.tex_sampler_pairs = (0..n)
        .map(|_| Ok((r.read_str8()?, r.read_str8()?)))
        .collect::<Result<_>>()?;

    if let StageExt::Vertex {
        usages,
        usage_indices,
        attrib_names,
        ..
    } = &mut stage_obj.ext
    {
        let n = r.read_u8()? as usize;
        *usages = (0..n)
            .map(|_| {
                let v = r.read_u8()?;
                VertexElementUsage::from_u8(v).ok_or_else(|| {
                    Error::InvalidResource(format!("unknown vertex element usage {}", v))
                })
            })
            .collect::<Result<_>>()?;

        let n = r.read_u8()? as usize;
        *usage_indices = r.read_bytes(n)?.to_vec();

        let n = r.read_u8()? as usize;
        *attrib_names = (0..n).map(|_| r.read_str8()).collect::<Result<_>>()?;
    }

    stage_obj.valid = true;
    Ok(Some(stage_obj))
}

#[cfg(test)]
#[path = "gles_shader_stream_tests.rs"]
mod tests;
