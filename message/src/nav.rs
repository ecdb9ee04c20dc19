//! Navigation solutions reported by the receiver.

use packed_struct::prelude::*;

use crate::{
    header::class,
    BytesWrap,
    Error,
    Packet,
    UbxMessage,
};

pub mod id {
    pub const PVT: u8 = 0x07;
}

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PrimitiveEnum_u8, serde::Serialize, serde::Deserialize,
)]
#[repr(u8)]
pub enum FixType {
    NoFix              = 0x00,
    DeadReckoning      = 0x01,
    Fix2D              = 0x02,
    Fix3D              = 0x03,
    GnssDeadReckoning  = 0x04,
    TimeOnly           = 0x05,
}

impl FixType {
    /// Whether the solution carries a usable position.
    #[inline]
    pub fn has_position(self) -> bool {
        matches!(self, FixType::Fix2D | FixType::Fix3D)
    }
}

/// `NAV-PVT`: position, velocity and time solution.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PackedStruct)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "92", endian = "lsb")]
pub struct NavPvt {
    pub i_tow:     u32,
    pub year:      u16,
    pub month:     u8,
    pub day:       u8,
    pub hour:      u8,
    pub min:       u8,
    pub sec:       u8,
    pub valid:     u8,
    pub t_acc:     u32,
    pub nano:      i32,
    #[packed_field(size_bytes = "1", ty = "enum")]
    pub fix_type:  FixType,
    pub flags:     u8,
    pub flags2:    u8,
    pub num_sv:    u8,
    /// 1e-7 degrees.
    pub lon:       i32,
    /// 1e-7 degrees.
    pub lat:       i32,
    /// Millimeters above the ellipsoid.
    pub height:    i32,
    pub h_msl:     i32,
    pub h_acc:     u32,
    pub v_acc:     u32,
    pub vel_n:     i32,
    pub vel_e:     i32,
    pub vel_d:     i32,
    /// Millimeters per second.
    pub g_speed:   i32,
    /// 1e-5 degrees.
    pub head_mot:  i32,
    pub s_acc:     u32,
    pub head_acc:  u32,
    /// 0.01 units.
    pub p_dop:     u16,
    #[doc(hidden)]
    pub _r0:       u32,
    #[doc(hidden)]
    pub _r1:       u16,
    pub head_veh:  i32,
    pub mag_dec:   i16,
    pub mag_acc:   u16,
}

impl UbxMessage for NavPvt {
    const CLASS: u8 = class::NAV;
    const ID: u8 = id::PVT;
}

/// The subset of a navigation solution the track logger records. Integer fields keep
/// the receiver's scaling.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Fix {
    pub year:           u16,
    pub month:          u8,
    pub day:            u8,
    pub hour:           u8,
    pub minute:         u8,
    pub second:         u8,
    pub fix_type:       FixType,
    /// 1e-7 degrees.
    pub latitude:       i32,
    /// 1e-7 degrees.
    pub longitude:      i32,
    /// Millimeters above the ellipsoid.
    pub height:         i32,
    /// Millimeters per second.
    pub ground_speed:   i32,
    /// 1e-5 degrees.
    pub heading:        i32,
    pub num_satellites: u8,
    /// Position dilution of precision, 0.01 units.
    pub pdop:           u16,
}

impl From<&NavPvt> for Fix {
    fn from(pvt: &NavPvt) -> Self {
        Self {
            year:           pvt.year,
            month:          pvt.month,
            day:            pvt.day,
            hour:           pvt.hour,
            minute:         pvt.min,
            second:         pvt.sec,
            fix_type:       pvt.fix_type,
            latitude:       pvt.lat,
            longitude:      pvt.lon,
            height:         pvt.height,
            ground_speed:   pvt.g_speed,
            heading:        pvt.head_mot,
            num_satellites: pvt.num_sv,
            pdop:           pvt.p_dop,
        }
    }
}

/// Extract a fix from a received frame. Frames of any other class/id yield `None`.
pub fn decode_fix(packet: &Packet<BytesWrap>) -> Result<Option<Fix>, Error> {
    if !packet.header().is(NavPvt::CLASS, NavPvt::ID) {
        return Ok(None);
    }

    let pvt = packet.payload_into::<NavPvt>()?;
    Ok(Some(Fix::from(pvt.payload())))
}
