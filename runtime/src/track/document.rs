use std::fmt::{
    Display,
    Formatter,
};

use message::Fix;

pub const HEADER: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
    "<gpx version=\"1.1\" creator=\"gpstrack ",
    env!("CARGO_PKG_VERSION"),
    "\" xmlns=\"http://www.topografix.com/GPX/1/1\" ",
    "xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" ",
    "xsi:schemaLocation=\"http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd\">\n",
    "<trk>\n<trkseg>\n",
);

/// Closing tags. Always the last bytes of a track file.
pub const TRAILER: &str = "</trkseg>\n</trk>\n</gpx>\n";

pub const TRAILER_LEN: u64 = TRAILER.len() as u64;

const _: () = assert!(TRAILER.len() == 24);

/// Contents of a freshly created track file.
pub fn empty() -> String {
    [HEADER, TRAILER].concat()
}

/// A `<trkpt>` element for `fix`, newline terminated.
pub fn record(fix: &Fix) -> String {
    format!(
        concat!(
            "<trkpt lat=\"{lat}\" lon=\"{lon}\">\n",
            "<time>{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}Z</time>\n",
            "<pdop>{pdop}</pdop>\n",
            "<ele>{ele}</ele>\n",
            "<speed>{speed}</speed>\n",
            "<course>{course}</course>\n",
            "<sat>{sat}</sat>\n",
            "</trkpt>\n",
        ),
        lat = Decimal::new(fix.latitude, 7, 7),
        lon = Decimal::new(fix.longitude, 7, 7),
        year = fix.year,
        month = fix.month,
        day = fix.day,
        hour = fix.hour,
        minute = fix.minute,
        second = fix.second,
        pdop = Decimal::new(fix.pdop, 2, 2),
        ele = Decimal::new(fix.height, 3, 3),
        speed = Decimal::new(fix.ground_speed, 3, 5),
        course = Decimal::new(fix.heading, 5, 5),
        sat = fix.num_satellites,
    )
}

/// A fixed-point integer printed with a given number of decimal places.
///
/// `value` carries `scale` implied fractional digits. Extra places are zero-filled and
/// missing ones are truncated, so no rounding ever takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Decimal {
    value:  i64,
    scale:  u32,
    places: u32,
}

impl Decimal {
    fn new(value: impl Into<i64>, scale: u32, places: u32) -> Self {
        Self {
            value: value.into(),
            scale,
            places,
        }
    }
}

impl Display for Decimal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sign = if self.value < 0 { "-" } else { "" };

        let magnitude = self.value.unsigned_abs();
        let magnitude = if self.places >= self.scale {
            magnitude * 10u64.pow(self.places - self.scale)
        } else {
            magnitude / 10u64.pow(self.scale - self.places)
        };

        if self.places == 0 {
            return write!(f, "{}{}", sign, magnitude);
        }

        let unit = 10u64.pow(self.places);
        write!(
            f,
            "{}{}.{:0width$}",
            sign,
            magnitude / unit,
            magnitude % unit,
            width = self.places as usize
        )
    }
}

#[cfg(test)]
mod test {
    use message::nav::FixType;
    use proptest::prelude::*;

    use super::*;

    fn fix() -> Fix {
        Fix {
            year:           2019,
            month:          7,
            day:            14,
            hour:           9,
            minute:         5,
            second:         59,
            fix_type:       FixType::Fix3D,
            latitude:       373_456_789,
            longitude:      -1_221_234_567,
            height:         -12_345,
            ground_speed:   1_500,
            heading:        27_012_345,
            num_satellites: 11,
            pdop:           142,
        }
    }

    #[test]
    fn trailer_is_24_bytes() {
        assert_eq!(TRAILER.len(), 24);
        assert!(empty().ends_with(TRAILER));
        assert_eq!(empty().len(), HEADER.len() + 24);
    }

    #[test]
    fn header_opens_segment() {
        assert!(HEADER.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<gpx version=\"1.1\""));
        assert!(HEADER.ends_with("<trk>\n<trkseg>\n"));
    }

    #[test]
    fn record_fields() {
        assert_eq!(
            record(&fix()),
            "<trkpt lat=\"37.3456789\" lon=\"-122.1234567\">\n\
             <time>2019-07-14T09:05:59Z</time>\n\
             <pdop>1.42</pdop>\n\
             <ele>-12.345</ele>\n\
             <speed>1.50000</speed>\n\
             <course>270.12345</course>\n\
             <sat>11</sat>\n\
             </trkpt>\n"
        );
    }

    #[test]
    fn small_negative_keeps_sign() {
        assert_eq!(Decimal::new(-5, 7, 7).to_string(), "-0.0000005");
        assert_eq!(Decimal::new(0, 3, 3).to_string(), "0.000");
        assert_eq!(Decimal::new(12, 0, 0).to_string(), "12");
        assert_eq!(Decimal::new(12_345, 3, 1).to_string(), "12.3");
    }

    proptest! {
        #[test]
        fn decimal_matches_integer_value(value in any::<i32>(), scale in 0u32..8) {
            let rendered = Decimal::new(value, scale, scale).to_string();
            let digits = rendered.replace('.', "");

            prop_assert_eq!(digits.parse::<i64>().unwrap(), i64::from(value));
            if scale > 0 {
                let frac = rendered.rsplit('.').next().unwrap();
                prop_assert_eq!(frac.len(), scale as usize);
            }
        }
    }
}
