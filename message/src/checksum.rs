pub type Array = smallvec::SmallVec<[u8; 8]>;

pub trait Checksum {
    type Output: num_traits::PrimInt;

    fn checksum(vals: &[u8]) -> Self::Output;
    fn checksum_array(vals: &[u8]) -> Array;
}

#[inline]
pub const fn size<T>() -> usize
where
    T: Checksum,
{
    std::mem::size_of::<T::Output>()
}

/// The 8-bit Fletcher checksum used by UBX framing.
///
/// `ck_a` is the running sum of every byte, `ck_b` the running sum of `ck_a`, both
/// truncated to 8 bits. On the wire `ck_a` precedes `ck_b`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Fletcher8;

impl Fletcher8 {
    #[inline]
    pub fn pair(vals: &[u8]) -> (u8, u8) {
        vals.iter().fold((0u8, 0u8), |(a, b), &x| {
            let a = a.wrapping_add(x);
            (a, b.wrapping_add(a))
        })
    }
}

impl Checksum for Fletcher8 {
    type Output = u16;

    fn checksum(vals: &[u8]) -> Self::Output {
        let (a, b) = Self::pair(vals);
        u16::from_be_bytes([a, b])
    }

    fn checksum_array(vals: &[u8]) -> Array {
        let (a, b) = Self::pair(vals);
        smallvec::smallvec![a, b]
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn known_values() {
        assert_eq!(Fletcher8::pair(&[]), (0, 0));
        assert_eq!(Fletcher8::pair(&[0x06, 0x01, 0x03, 0x00, 0x01, 0x07, 0x01]), (0x13, 0x51));
        assert_eq!(Fletcher8::pair(&[0x06, 0x08, 0x06, 0x00, 0x64, 0x00, 0x01, 0x00, 0x01, 0x00]), (
            0x7a, 0x12
        ));
    }

    proptest! {
        #[test]
        fn array_matches_int(to_checksum in any::<Vec<u8>>()) {
            let int = Fletcher8::checksum(&to_checksum);
            let array = Fletcher8::checksum_array(&to_checksum);

            assert_eq!(array.len(), size::<Fletcher8>());
            assert_eq!(int, u16::from_be_bytes([array[0], array[1]]));
        }

        #[test]
        fn append_is_incremental(head in any::<Vec<u8>>(), tail in any::<u8>()) {
            let (a, b) = Fletcher8::pair(&head);

            let mut extended = head.clone();
            extended.push(tail);

            let a2 = a.wrapping_add(tail);
            assert_eq!(Fletcher8::pair(&extended), (a2, b.wrapping_add(a2)));
        }
    }
}
