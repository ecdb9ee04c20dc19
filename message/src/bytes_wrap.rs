use std::fmt::{
    Display,
    Formatter,
};

use bytes::{
    Bytes,
    BytesMut,
};
use packed_struct::{
    PackedStructSlice,
    PackingError,
    PackingResult,
};

/// An opaque payload, used when a frame's contents are not interpreted.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Into, derive_more::AsRef,
)]
pub struct BytesWrap(Bytes);

impl BytesWrap {
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PackedStructSlice for BytesWrap {
    fn pack_to_slice(&self, output: &mut [u8]) -> PackingResult<()> {
        if output.len() != self.0.len() {
            return Err(PackingError::BufferSizeMismatch {
                expected: self.0.len(),
                actual:   output.len(),
            });
        }

        output.copy_from_slice(self.0.as_ref());
        Ok(())
    }

    fn unpack_from_slice(src: &[u8]) -> PackingResult<Self> {
        Ok(Self(Bytes::copy_from_slice(src)))
    }

    fn packed_bytes_size(opt_self: Option<&Self>) -> PackingResult<usize> {
        let slf = opt_self.ok_or(PackingError::InstanceRequiredForSize)?;

        Ok(slf.0.len())
    }
}

impl<T> From<T> for BytesWrap
where
    T: AsRef<[u8]>,
{
    fn from(t: T) -> Self {
        let mut m = BytesMut::new();
        m.extend_from_slice(t.as_ref());

        BytesWrap(m.freeze())
    }
}

impl Display for BytesWrap {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}
