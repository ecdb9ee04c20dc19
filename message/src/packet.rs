use std::fmt::{
    Debug,
    Display,
    Formatter,
};

use packed_struct::{
    prelude::*,
    PackingResult,
};

use crate::{
    header,
    BytesWrap,
    Error,
    Fletcher8,
    Header,
    HeaderPacket,
    SyncChars,
    WithChecksum,
};

/// A payload type with a fixed UBX class and id.
pub trait UbxMessage: PackedStructSlice {
    const CLASS: u8;
    const ID: u8;
}

type Body<T> = WithChecksum<HeaderPacket<Header, T>, Fletcher8>;

/// A complete UBX frame: `b5 62 class id len_lo len_hi payload… ck_a ck_b`.
///
/// The length field is derived from the payload when the packet is built, so a
/// constructed packet is always well-formed.
#[derive(Clone, PartialEq, Eq)]
pub struct Packet<T = BytesWrap> {
    body: Body<T>,
}

impl<T> Packet<T>
where
    T: PackedStructSlice,
{
    pub const OVERHEAD: usize = SyncChars::SIZE + header::SIZE_BYTES + Body::<T>::CHECKSUM_SIZE;

    pub fn new(class: u8, id: u8, payload: T) -> Result<Self, Error> {
        let len = T::packed_bytes_size(Some(&payload))?;
        let length = u16::try_from(len).map_err(|_| Error::PayloadTooLong {
            len,
        })?;

        Ok(Self {
            body: WithChecksum::new(HeaderPacket {
                header: Header::new(class, id, length),
                payload,
            }),
        })
    }

    #[inline]
    pub fn header(&self) -> &Header {
        &self.body.as_ref().header
    }

    #[inline]
    pub fn payload(&self) -> &T {
        &self.body.as_ref().payload
    }

    #[inline]
    pub fn take_payload(self) -> T {
        self.body.take().payload
    }

    /// `[ck_a, ck_b]` for this frame.
    pub fn checksum(&self) -> Result<[u8; 2], Error> {
        let ck = self.body.checksum()?;
        Ok([ck[0], ck[1]])
    }

    #[inline]
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(self.pack_to_vec()?)
    }

    /// Reinterpret the payload as another type, keeping class and id.
    pub fn payload_into<U>(&self) -> Result<Packet<U>, Error>
    where
        U: PackedStructSlice,
    {
        let inner = self.body.as_ref().payload_into::<U>()?;
        Packet::new(inner.header.class, inner.header.id, inner.payload)
    }
}

impl<T> Packet<T>
where
    T: UbxMessage,
{
    #[inline]
    pub fn message(payload: T) -> Result<Self, Error> {
        Self::new(T::CLASS, T::ID, payload)
    }
}

/// Whether `bytes` is exactly one frame whose length field and checksum agree with its
/// contents.
pub fn is_well_formed(bytes: &[u8]) -> bool {
    Packet::<BytesWrap>::unpack_from_slice(bytes).is_ok()
}

impl<T> PackedStructSlice for Packet<T>
where
    T: PackedStructSlice,
{
    fn pack_to_slice(&self, output: &mut [u8]) -> PackingResult<()> {
        let size = Self::packed_bytes_size(Some(self))?;
        if output.len() < size {
            return Err(PackingError::BufferTooSmall);
        }

        let (sync, body) = output[..size].split_at_mut(SyncChars::SIZE);

        sync.copy_from_slice(&SyncChars::default().pack()?);
        self.body.pack_to_slice(body)
    }

    fn unpack_from_slice(src: &[u8]) -> PackingResult<Self> {
        if src.len() < Self::OVERHEAD {
            return Err(PackingError::BufferTooSmall);
        }

        let (sync, body) = src.split_at(SyncChars::SIZE);
        SyncChars::unpack_from_slice(sync)?;

        let declared = u16::from_le_bytes([body[2], body[3]]) as usize;
        let actual = src.len() - Self::OVERHEAD;

        if declared != actual {
            tracing::debug!(declared, actual, "frame length does not match length field");
            return Err(PackingError::InvalidValue);
        }

        Ok(Self {
            body: Body::<T>::unpack_from_slice(body)?,
        })
    }

    fn packed_bytes_size(opt_self: Option<&Self>) -> PackingResult<usize> {
        let slf = opt_self.ok_or(PackingError::InstanceRequiredForSize)?;

        Ok(SyncChars::SIZE + Body::<T>::packed_bytes_size(Some(&slf.body))?)
    }
}

impl<T> Debug for Packet<T>
where
    T: Debug + PackedStructSlice,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Packet({:?})", self.body)
    }
}

impl<T> Display for Packet<T>
where
    T: Display + PackedStructSlice,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.body, f)
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    fn hex_bytes(s: &str) -> Vec<u8> {
        hex::decode(s.replace(' ', "")).unwrap()
    }

    #[test]
    fn enable_nav_pvt_literal() {
        let packet = Packet::new(0x06, 0x01, BytesWrap::from([0x01, 0x07, 0x01])).unwrap();

        assert_eq!(packet.to_bytes().unwrap(), hex_bytes("b5 62 06 01 03 00 01 07 01 13 51"));
    }

    #[test]
    fn restore_defaults_checksum() {
        let payload = hex_bytes("ff ff 00 00 00 00 00 00 ff ff 00 00 17");
        let packet = Packet::new(0x06, 0x09, BytesWrap::from(payload)).unwrap();

        assert_eq!(packet.checksum().unwrap(), [0x2f, 0xae]);
        assert_eq!(packet.header().length, 13);
    }

    #[test]
    fn empty_payload() {
        let packet = Packet::new(0x06, 0x3e, BytesWrap::from(Vec::<u8>::new())).unwrap();
        let bytes = packet.to_bytes().unwrap();

        assert_eq!(bytes.len(), Packet::<BytesWrap>::OVERHEAD);
        assert!(is_well_formed(&bytes));
    }

    #[test]
    fn oversize_payload_rejected() {
        let payload = BytesWrap::from(vec![0u8; u16::MAX as usize + 1]);

        assert_eq!(Packet::new(0x06, 0x01, payload).unwrap_err(), Error::PayloadTooLong {
            len: u16::MAX as usize + 1,
        });
    }

    #[test]
    fn length_field_must_match() {
        let mut bytes = hex_bytes("b5 62 06 01 03 00 01 07 01 13 51");
        assert!(is_well_formed(&bytes));

        bytes[4] = 0x04;
        assert!(!is_well_formed(&bytes));
    }

    proptest! {
        #[test]
        fn checksum_covers_class_through_payload(
            class in any::<u8>(),
            id in any::<u8>(),
            payload in proptest::collection::vec(any::<u8>(), 0..=250),
        ) {
            let bytes = Packet::new(class, id, BytesWrap::from(&payload)).unwrap().to_bytes().unwrap();

            assert_eq!(&bytes[..2], &SyncChars::BYTES);
            assert_eq!(bytes.len(), payload.len() + Packet::<BytesWrap>::OVERHEAD);
            assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]) as usize, payload.len());

            let (covered, trailer) = bytes[2..].split_at(bytes.len() - 4);
            let (a, b) = Fletcher8::pair(covered);
            assert_eq!(trailer, &[a, b]);

            assert!(is_well_formed(&bytes));
        }

        #[test]
        fn any_flipped_byte_is_detected(
            payload in proptest::collection::vec(any::<u8>(), 1..=64),
            idx in any::<proptest::sample::Index>(),
            flip in 1u8..=255,
        ) {
            let mut bytes = Packet::new(0x06, 0x01, BytesWrap::from(&payload)).unwrap().to_bytes().unwrap();

            let i = idx.index(bytes.len());
            bytes[i] ^= flip;

            assert!(!is_well_formed(&bytes));
        }
    }
}
