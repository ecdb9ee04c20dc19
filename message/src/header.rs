use packed_struct::prelude::*;

pub const SIZE_BYTES: usize = 4;

/// Message classes the tracker sends or understands.
pub mod class {
    pub const NAV: u8 = 0x01;
    pub const ACK: u8 = 0x05;
    pub const CFG: u8 = 0x06;

    /// Standard NMEA sentences, configured through UBX as pseudo-messages.
    pub const NMEA_STANDARD: u8 = 0xf0;
    /// u-blox proprietary NMEA (`PUBX`) sentences.
    pub const NMEA_PUBX: u8 = 0xf1;
}

/// Class, id and little-endian payload length. Everything covered by the checksum
/// except the payload itself.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PackedStruct, serde::Serialize, serde::Deserialize,
)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "4", endian = "lsb")]
pub struct Header {
    pub class:  u8,
    pub id:     u8,
    pub length: u16,
}

impl Header {
    #[inline]
    pub fn new(class: u8, id: u8, length: u16) -> Self {
        Self {
            class,
            id,
            length,
        }
    }

    #[inline]
    pub fn is(&self, class: u8, id: u8) -> bool {
        self.class == class && self.id == id
    }

    #[inline]
    pub fn display(&self) -> String {
        format!("{:02x}:{:02x} [{}B]", self.class, self.id, self.length)
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn length_is_little_endian() {
        let header = Header::new(class::CFG, 0x3e, 0x0124);
        assert_eq!(header.pack(), Ok([0x06, 0x3e, 0x24, 0x01]));
    }

    proptest! {
        #[test]
        fn unpack_pack_equivalence(data in any::<[u8; 4]>()) {
            let hdr = Header::unpack(&data).unwrap();
            assert_eq!(Ok(data), hdr.pack());
        }
    }
}
