use bytes::{
    Buf,
    BytesMut,
};
use packed_struct::PackedStructSlice;
use tokio_util::codec::{
    Decoder,
    Encoder,
};

use message::{
    BytesWrap,
    Packet,
    SyncChars,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Message(#[from] message::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Frames UBX packets on a byte stream that may also carry NMEA text.
///
/// Decoding hunts for the sync characters and drops anything that does not form a
/// complete, checksummed frame. Declared payloads longer than `max_payload` are treated
/// as a false sync.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct UbxCodec {
    max_payload: usize,
}

impl UbxCodec {
    pub const DEFAULT_MAX_PAYLOAD: usize = 1024;

    #[inline]
    pub fn new(max_payload: usize) -> Self {
        Self {
            max_payload,
        }
    }

    fn seek_sync(src: &mut BytesMut) -> bool {
        match src.windows(SyncChars::SIZE).position(|w| w == SyncChars::BYTES) {
            Some(pos) => {
                if pos > 0 {
                    tracing::trace!(discarded = pos, "skipping to sync");
                    src.advance(pos);
                }

                true
            },
            None => {
                // a trailing first sync char may be completed by the next read
                let keep = usize::from(src.last() == Some(&SyncChars::BYTES[0]));
                src.advance(src.len() - keep);

                false
            },
        }
    }
}

impl Default for UbxCodec {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_PAYLOAD)
    }
}

impl<T> Encoder<Packet<T>> for UbxCodec
where
    T: PackedStructSlice,
{
    type Error = Error;

    fn encode(&mut self, item: Packet<T>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let bytes = item.to_bytes()?;
        dst.extend_from_slice(&bytes);

        Ok(())
    }
}

impl Decoder for UbxCodec {
    type Error = Error;
    type Item = Packet<BytesWrap>;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        const HEADER_LEN: usize = SyncChars::SIZE + message::header::SIZE_BYTES;

        loop {
            if !Self::seek_sync(src) || src.len() < HEADER_LEN {
                return Ok(None);
            }

            let len = u16::from_le_bytes([src[4], src[5]]) as usize;
            if len > self.max_payload {
                tracing::debug!(len, max = self.max_payload, "implausible frame length");
                src.advance(1);
                continue;
            }

            let total = len + Packet::<BytesWrap>::OVERHEAD;
            if src.len() < total {
                src.reserve(total - src.len());
                return Ok(None);
            }

            match Packet::<BytesWrap>::unpack_from_slice(&src[..total]) {
                Ok(packet) => {
                    src.advance(total);
                    return Ok(Some(packet));
                },
                Err(e) => {
                    tracing::warn!(error = %e, frame = %hex::encode(&src[..total]), "dropping corrupt frame");
                    src.advance(1);
                },
            }
        }
    }
}
