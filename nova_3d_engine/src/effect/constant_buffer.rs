/// CPU-side constant buffer backing store
///
/// Parameter values are packed into this shadow copy; the backend
/// uploads it to the native buffer object when the dirty flag is set
/// and a program that references the buffer is bound.

#[derive(Debug, Clone)]
pub struct ConstantBuffer {
    name: String,
    data: Vec<u8>,
    dirty: bool,
}

impl ConstantBuffer {
    /// Create a buffer of `size` zeroed bytes
    pub fn new(name: &str, size: usize) -> Self {
        Self {
            name: name.to_string(),
            data: vec![0u8; size],
            dirty: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Grow the backing store to the size the linked program reports.
    /// Reflection may report a larger block than the effect declared
    /// (std140 padding); existing content is preserved.
    pub fn resize(&mut self, size: usize) {
        if size > self.data.len() {
            self.data.resize(size, 0);
            self.dirty = true;
        }
    }

    /// Copy `bytes` into the store at `offset` and mark the buffer
    /// dirty. Writes that would run past the end are ignored.
    pub fn write(&mut self, offset: usize, bytes: &[u8]) {
        let Some(end) = offset.checked_add(bytes.len()) else {
            return;
        };
        if end > self.data.len() {
            return;
        }
        self.data[offset..end].copy_from_slice(bytes);
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Called by the backend after uploading the shadow copy
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
#[path = "constant_buffer_tests.rs"]
mod tests;
