use alloc::vec::Vec;

/// Growable, append-only byte storage used to accumulate encoded output.
///
/// Multi-byte scalars are always written little-endian regardless of the host.
/// Borrowed slices from [`ByteBuffer::as_slice`] stay valid only until the
/// next mutation, which the borrow checker enforces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    data: Vec<u8>,
}

impl ByteBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            data: Vec::with_capacity(bytes),
        }
    }

    pub fn reserve(&mut self, additional: usize) {
        self.data.reserve(additional);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn push_u8(&mut self, byte: u8) {
        self.data.push(byte);
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn push_i32(&mut self, v: i32) {
        self.push_bytes(&v.to_le_bytes());
    }

    pub fn push_u32(&mut self, v: u32) {
        self.push_bytes(&v.to_le_bytes());
    }

    pub fn push_i64(&mut self, v: i64) {
        self.push_bytes(&v.to_le_bytes());
    }

    pub fn push_u64(&mut self, v: u64) {
        self.push_bytes(&v.to_le_bytes());
    }

    pub fn push_f64(&mut self, v: f64) {
        self.push_bytes(&v.to_le_bytes());
    }

    /// Appends `bytes` followed by a NUL terminator. The caller guarantees
    /// there is no interior NUL.
    pub fn push_cstring_bytes(&mut self, bytes: &[u8]) {
        debug_assert!(!bytes.contains(&0), "cstring contains an interior NUL");
        self.data.reserve(bytes.len() + 1);
        self.data.extend_from_slice(bytes);
        self.data.push(0);
    }

    /// Reserves a four byte slot (zeroed) and returns its offset so the
    /// value can be filled in later with [`ByteBuffer::patch_i32`].
    pub fn push_length_slot(&mut self) -> usize {
        let at = self.data.len();
        self.data.extend_from_slice(&[0; 4]);
        at
    }

    /// Overwrites four bytes at `offset` with `v`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + 4` is past the end of the buffer.
    pub fn patch_i32(&mut self, offset: usize, v: i32) {
        self.data[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
    }

    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    pub(crate) fn pop(&mut self) -> Option<u8> {
        self.data.pop()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_are_little_endian() {
        let mut buf = ByteBuffer::new();
        buf.push_i32(1);
        buf.push_i64(-2);
        buf.push_f64(1.0);
        assert_eq!(&buf.as_slice()[..4], &[1, 0, 0, 0]);
        assert_eq!(&buf.as_slice()[4..12], &[0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&buf.as_slice()[12..], &[0, 0, 0, 0, 0, 0, 0xF0, 0x3F]);
    }

    #[test]
    fn length_slot_is_patched_in_place() {
        let mut buf = ByteBuffer::with_capacity(16);
        buf.push_u8(0xAA);
        let slot = buf.push_length_slot();
        buf.push_cstring_bytes(b"key");
        buf.patch_i32(slot, 0x0102_0304);
        assert_eq!(buf.as_slice(), &[0xAA, 4, 3, 2, 1, b'k', b'e', b'y', 0]);
        assert_eq!(buf.len(), 9);
    }
}
