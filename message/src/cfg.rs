//! `CFG` class payloads used to bring the receiver into its operating mode.

use packed_struct::{
    prelude::*,
    PackingResult,
};

use crate::{
    header::class,
    UbxMessage,
};

pub mod id {
    pub const PRT: u8 = 0x00;
    pub const MSG: u8 = 0x01;
    pub const RATE: u8 = 0x08;
    pub const CFG: u8 = 0x09;
    pub const GNSS: u8 = 0x3e;
}

/// Set the output rate of one message on the port the command arrives on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PackedStruct)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "3", endian = "lsb")]
pub struct CfgMsg {
    pub msg_class: u8,
    pub msg_id:    u8,
    pub rate:      u8,
}

impl CfgMsg {
    #[inline]
    pub fn enable(msg_class: u8, msg_id: u8) -> Self {
        Self {
            msg_class,
            msg_id,
            rate: 1,
        }
    }

    #[inline]
    pub fn disable(msg_class: u8, msg_id: u8) -> Self {
        Self {
            msg_class,
            msg_id,
            rate: 0,
        }
    }
}

impl UbxMessage for CfgMsg {
    const CLASS: u8 = class::CFG;
    const ID: u8 = id::MSG;
}

/// A text-protocol sentence the receiver emits by default.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LegacyMessage {
    pub class: u8,
    pub id:    u8,
    pub name:  &'static str,
}

impl LegacyMessage {
    const fn nmea(id: u8, name: &'static str) -> Self {
        Self {
            class: class::NMEA_STANDARD,
            id,
            name,
        }
    }

    const fn pubx(id: u8, name: &'static str) -> Self {
        Self {
            class: class::NMEA_PUBX,
            id,
            name,
        }
    }

    #[inline]
    pub fn disable(&self) -> CfgMsg {
        CfgMsg::disable(self.class, self.id)
    }
}

pub const LEGACY_MESSAGES: [LegacyMessage; 20] = [
    LegacyMessage::nmea(0x0a, "DTM"),
    LegacyMessage::nmea(0x09, "GBS"),
    LegacyMessage::nmea(0x00, "GGA"),
    LegacyMessage::nmea(0x01, "GLL"),
    LegacyMessage::nmea(0x0d, "GNS"),
    LegacyMessage::nmea(0x06, "GRS"),
    LegacyMessage::nmea(0x02, "GSA"),
    LegacyMessage::nmea(0x07, "GST"),
    LegacyMessage::nmea(0x03, "GSV"),
    LegacyMessage::nmea(0x04, "RMC"),
    LegacyMessage::nmea(0x0e, "THS"),
    LegacyMessage::nmea(0x0f, "VLW"),
    LegacyMessage::nmea(0x05, "VTG"),
    LegacyMessage::nmea(0x08, "ZDA"),
    LegacyMessage::pubx(0x00, "PUBX,00"),
    LegacyMessage::pubx(0x01, "PUBX,01"),
    LegacyMessage::pubx(0x03, "PUBX,03"),
    LegacyMessage::pubx(0x04, "PUBX,04"),
    LegacyMessage::pubx(0x05, "PUBX,05"),
    LegacyMessage::pubx(0x06, "PUBX,06"),
];

/// Measurement and navigation-solution cadence.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PackedStruct)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "6", endian = "lsb")]
pub struct CfgRate {
    /// Milliseconds between measurements.
    pub meas_rate: u16,
    /// Measurements per navigation solution.
    pub nav_rate:  u16,
    pub time_ref:  u16,
}

impl CfgRate {
    pub const TIME_REF_GPS: u16 = 1;

    #[inline]
    pub fn every(meas_rate_ms: u16) -> Self {
        Self {
            meas_rate: meas_rate_ms,
            nav_rate:  1,
            time_ref:  Self::TIME_REF_GPS,
        }
    }
}

impl UbxMessage for CfgRate {
    const CLASS: u8 = class::CFG;
    const ID: u8 = id::RATE;
}

/// UART port configuration. The baud rate sits at payload offset 8.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PackedStruct)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "20", endian = "lsb")]
pub struct CfgPrt {
    pub port_id:        u8,
    #[doc(hidden)]
    pub _r0:            u8,
    pub tx_ready:       u16,
    pub mode:           u32,
    pub baud_rate:      u32,
    pub in_proto_mask:  u16,
    pub out_proto_mask: u16,
    pub flags:          u16,
    #[doc(hidden)]
    pub _r1:            u16,
}

impl CfgPrt {
    pub const UART1: u8 = 1;
    /// 8 data bits, no parity, 1 stop bit.
    pub const MODE_8N1: u32 = 0x08d0;
    /// UBX, NMEA and RTCM in.
    pub const IN_PROTO: u16 = 0x0007;
    /// UBX and NMEA out.
    pub const OUT_PROTO: u16 = 0x0003;

    pub fn uart1(baud_rate: u32) -> Self {
        Self {
            port_id: Self::UART1,
            _r0: 0,
            tx_ready: 0,
            mode: Self::MODE_8N1,
            baud_rate,
            in_proto_mask: Self::IN_PROTO,
            out_proto_mask: Self::OUT_PROTO,
            flags: 0,
            _r1: 0,
        }
    }
}

impl UbxMessage for CfgPrt {
    const CLASS: u8 = class::CFG;
    const ID: u8 = id::PRT;
}

/// Clear, save and load configuration sections.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PackedStruct)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "13", endian = "lsb")]
pub struct CfgCfg {
    pub clear_mask:  u32,
    pub save_mask:   u32,
    pub load_mask:   u32,
    pub device_mask: u8,
}

impl CfgCfg {
    pub const ALL_SECTIONS: u32 = 0xffff;
    /// Battery-backed RAM, flash, EEPROM and SPI flash.
    pub const ALL_DEVICES: u8 = 0x17;

    /// Clear every stored section and reload, reverting the receiver to factory state
    /// (including its default baud rate).
    pub fn restore_defaults() -> Self {
        Self {
            clear_mask:  Self::ALL_SECTIONS,
            save_mask:   0,
            load_mask:   Self::ALL_SECTIONS,
            device_mask: Self::ALL_DEVICES,
        }
    }
}

impl UbxMessage for CfgCfg {
    const CLASS: u8 = class::CFG;
    const ID: u8 = id::CFG;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PrimitiveEnum_u8)]
#[repr(u8)]
pub enum GnssId {
    Gps     = 0,
    Sbas    = 1,
    Galileo = 2,
    BeiDou  = 3,
    Imes    = 4,
    Qzss    = 5,
    Glonass = 6,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PackedStruct)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "4", endian = "lsb")]
pub struct GnssHeader {
    pub msg_ver:           u8,
    pub num_trk_ch_hw:     u8,
    pub num_trk_ch_use:    u8,
    pub num_config_blocks: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PackedStruct)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "8", endian = "lsb")]
pub struct GnssBlock {
    #[packed_field(size_bytes = "1", ty = "enum")]
    pub gnss_id:    GnssId,
    pub res_trk_ch: u8,
    pub max_trk_ch: u8,
    #[doc(hidden)]
    pub _r0:        u8,
    pub flags:      u32,
}

impl GnssBlock {
    pub const ENABLE: u32 = 0x0000_0001;
    pub const SIG_CFG_L1: u32 = 0x0100_0000;

    pub fn new(gnss_id: GnssId, res_trk_ch: u8, max_trk_ch: u8, enabled: bool) -> Self {
        let enable = if enabled {
            Self::ENABLE
        } else {
            0
        };

        Self {
            gnss_id,
            res_trk_ch,
            max_trk_ch,
            _r0: 0,
            flags: Self::SIG_CFG_L1 | enable,
        }
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.flags & Self::ENABLE != 0
    }
}

/// Constellation enable table. The block count in the header is derived from `blocks`
/// when packing.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CfgGnss {
    pub num_trk_ch_use: u8,
    pub blocks:         Vec<GnssBlock>,
}

impl CfgGnss {
    const BLOCK_SIZE: usize = 8;
    const HEADER_SIZE: usize = 4;

    /// Track GPS only; augmentation and auxiliary systems are switched off to free
    /// channels and save power.
    pub fn primary_only() -> Self {
        Self {
            num_trk_ch_use: 0x16,
            blocks:         vec![
                GnssBlock::new(GnssId::Gps, 4, 0xff, true),
                GnssBlock::new(GnssId::Sbas, 1, 3, false),
                GnssBlock::new(GnssId::Qzss, 0, 3, false),
                GnssBlock::new(GnssId::Glonass, 8, 0xff, false),
            ],
        }
    }
}

impl PackedStructSlice for CfgGnss {
    fn pack_to_slice(&self, output: &mut [u8]) -> PackingResult<()> {
        let size = Self::packed_bytes_size(Some(self))?;
        if output.len() != size {
            return Err(PackingError::BufferSizeMismatch {
                expected: size,
                actual:   output.len(),
            });
        }

        let num_config_blocks =
            u8::try_from(self.blocks.len()).map_err(|_| PackingError::InvalidValue)?;

        let header = GnssHeader {
            msg_ver: 0,
            num_trk_ch_hw: 0,
            num_trk_ch_use: self.num_trk_ch_use,
            num_config_blocks,
        };

        let (header_bytes, block_bytes) = output.split_at_mut(Self::HEADER_SIZE);
        header_bytes.copy_from_slice(&header.pack()?);

        for (block, out) in self.blocks.iter().zip(block_bytes.chunks_exact_mut(Self::BLOCK_SIZE)) {
            out.copy_from_slice(&block.pack()?);
        }

        Ok(())
    }

    fn unpack_from_slice(src: &[u8]) -> PackingResult<Self> {
        if src.len() < Self::HEADER_SIZE {
            return Err(PackingError::BufferTooSmall);
        }

        let (header_bytes, block_bytes) = src.split_at(Self::HEADER_SIZE);
        let header = GnssHeader::unpack_from_slice(header_bytes)?;

        if block_bytes.len() != header.num_config_blocks as usize * Self::BLOCK_SIZE {
            return Err(PackingError::BufferSizeMismatch {
                expected: header.num_config_blocks as usize * Self::BLOCK_SIZE,
                actual:   block_bytes.len(),
            });
        }

        let blocks = block_bytes
            .chunks_exact(Self::BLOCK_SIZE)
            .map(GnssBlock::unpack_from_slice)
            .collect::<PackingResult<Vec<_>>>()?;

        Ok(Self {
            num_trk_ch_use: header.num_trk_ch_use,
            blocks,
        })
    }

    fn packed_bytes_size(opt_self: Option<&Self>) -> PackingResult<usize> {
        let slf = opt_self.ok_or(PackingError::InstanceRequiredForSize)?;

        Ok(Self::HEADER_SIZE + slf.blocks.len() * Self::BLOCK_SIZE)
    }
}

impl UbxMessage for CfgGnss {
    const CLASS: u8 = class::CFG;
    const ID: u8 = id::GNSS;
}
