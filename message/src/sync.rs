use packed_struct::{
    prelude::*,
    PackedStructInfo,
    PackingResult,
};

pub const SYNC_1: u8 = 0xb5;
pub const SYNC_2: u8 = 0x62;

/// A byte that must always hold the value `C`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct MagicValue<const C: u8>;

impl<const C: u8> MagicValue<C> {
    pub const INSTANCE: Self = Self;
    pub const VALUE: u8 = C;
}

impl<const C: u8> PackedStruct for MagicValue<C> {
    type ByteArray = [u8; 1];

    #[inline]
    fn pack(&self) -> PackingResult<Self::ByteArray> {
        Ok([C])
    }

    fn unpack(src: &Self::ByteArray) -> PackingResult<Self> {
        if src[0] == C {
            Ok(Self)
        } else {
            tracing::trace!(expected = C, got = src[0], "invalid sync byte");
            Err(PackingError::InvalidValue)
        }
    }
}

impl<const C: u8> PackedStructInfo for MagicValue<C> {
    #[inline]
    fn packed_bits() -> usize {
        8
    }
}

/// The two sync characters that open every UBX frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, PackedStruct)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "2")]
pub struct SyncChars {
    #[packed_field(size_bytes = "1")]
    pub first:  MagicValue<SYNC_1>,
    #[packed_field(size_bytes = "1")]
    pub second: MagicValue<SYNC_2>,
}

impl SyncChars {
    pub const BYTES: [u8; 2] = [SYNC_1, SYNC_2];
    pub const SIZE: usize = 2;
}
