mod bytes_wrap;
pub mod cfg;
pub mod checksum;
mod checksummed;
pub mod header;
mod header_packet;
pub mod nav;
mod packet;
mod sync;

pub use bytes_wrap::BytesWrap;
pub use checksum::{
    Checksum,
    Fletcher8,
};
pub use checksummed::WithChecksum;
pub use header::Header;
pub use header_packet::HeaderPacket;
pub use nav::Fix;
pub use packet::{
    is_well_formed,
    Packet,
    UbxMessage,
};
pub use sync::{
    MagicValue,
    SyncChars,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("payload of {len} bytes does not fit the 16-bit length field")]
    PayloadTooLong { len: usize },

    #[error(transparent)]
    Packing(#[from] packed_struct::PackingError),
}
