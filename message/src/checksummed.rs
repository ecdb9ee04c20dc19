use std::{
    fmt::{
        Debug,
        Display,
        Formatter,
    },
    marker::PhantomData,
};

use once_cell::sync::OnceCell;
use packed_struct::{
    prelude::*,
    PackingResult,
};

use crate::{
    checksum,
    Checksum,
};

/// Packs `T` followed by a `CK` checksum over `T`'s packed bytes.
#[derive(Clone)]
pub struct WithChecksum<T, CK> {
    val:            T,
    cache_bytes:    OnceCell<PackingResult<Vec<u8>>>,
    cache_checksum: OnceCell<PackingResult<checksum::Array>>,
    _phantom:       PhantomData<CK>,
}

impl<T, CK> WithChecksum<T, CK> {
    #[inline]
    pub fn new(data: T) -> Self {
        Self {
            val:            data,
            cache_bytes:    OnceCell::new(),
            cache_checksum: OnceCell::new(),
            _phantom:       PhantomData,
        }
    }

    #[inline]
    pub fn take(self) -> T {
        self.val
    }
}

impl<T, CK> WithChecksum<T, CK>
where
    CK: Checksum,
{
    pub const CHECKSUM_SIZE: usize = checksum::size::<CK>();

    #[inline]
    pub fn payload_bytes(&self) -> PackingResult<&[u8]>
    where
        T: PackedStructSlice,
    {
        self.cache_bytes
            .get_or_init(|| self.val.pack_to_vec())
            .as_ref()
            .map_err(|e| *e)
            .map(|v| v.as_slice())
    }

    #[inline]
    pub fn checksum(&self) -> PackingResult<&[u8]>
    where
        T: PackedStructSlice,
    {
        self.cache_checksum
            .get_or_init(|| {
                let payload = self.payload_bytes()?;

                Ok(CK::checksum_array(payload))
            })
            .as_ref()
            .map(|array| array.as_slice())
            .map_err(|&e| e)
    }

    #[inline]
    fn split_point(buf: &[u8]) -> usize {
        buf.len().saturating_sub(Self::CHECKSUM_SIZE)
    }
}

impl<T, CK> AsRef<T> for WithChecksum<T, CK> {
    fn as_ref(&self) -> &T {
        &self.val
    }
}

impl<T, CK> PackedStructSlice for WithChecksum<T, CK>
where
    T: PackedStructSlice,
    CK: Checksum,
{
    fn pack_to_slice(&self, output: &mut [u8]) -> PackingResult<()> {
        let size = Self::packed_bytes_size(Some(self))?;
        if output.len() < size {
            return Err(PackingError::BufferTooSmall);
        }

        let output = &mut output[..size];
        let split_point = Self::split_point(output);
        let (payload, checksum) = output.split_at_mut(split_point);

        payload.copy_from_slice(self.payload_bytes()?);
        checksum.copy_from_slice(self.checksum()?);

        Ok(())
    }

    fn unpack_from_slice(src: &[u8]) -> PackingResult<Self> {
        if src.len() < Self::CHECKSUM_SIZE {
            return Err(PackingError::BufferTooSmall);
        }

        let (payload, src_checksum) = src.split_at(Self::split_point(src));
        let computed_checksum = CK::checksum_array(payload);

        if src_checksum != computed_checksum.as_slice() {
            tracing::warn!(
                src_checksum = %hex::encode(src_checksum),
                computed_checksum = %hex::encode(&computed_checksum),
                "frame with invalid checksum"
            );

            return Err(PackingError::InvalidValue);
        }

        let result = Self::new(T::unpack_from_slice(payload)?);
        Ok(result)
    }

    fn packed_bytes_size(opt_self: Option<&Self>) -> PackingResult<usize> {
        let slf = opt_self.ok_or(PackingError::InstanceRequiredForSize)?;

        let count = T::packed_bytes_size(Some(&slf.val))? + Self::CHECKSUM_SIZE;
        Ok(count)
    }
}

impl<T, U, CK> PartialEq<WithChecksum<U, CK>> for WithChecksum<T, CK>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &WithChecksum<U, CK>) -> bool {
        self.val == other.val
    }
}

impl<T, CK> Eq for WithChecksum<T, CK> where Self: PartialEq {}

impl<T, CK> Debug for WithChecksum<T, CK>
where
    T: Debug + PackedStructSlice,
    CK: Checksum,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let ck = match self.checksum() {
            Ok(ck) => hex::encode(ck),
            Err(_) => "<failed checksum>".to_string(),
        };

        write!(f, "CK({:?}, 0x{})", self.val, ck)
    }
}

impl<T, CK> Display for WithChecksum<T, CK>
where
    T: Display + PackedStructSlice,
    CK: Checksum,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let ck = match self.checksum() {
            Ok(ck) => hex::encode(ck),
            Err(_) => "<failed checksum>".to_string(),
        };

        write!(f, "{} (ck: 0x{})", self.val, ck)
    }
}
