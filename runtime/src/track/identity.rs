use message::Fix;

/// Where a track lives: a directory per day and a file per starting minute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
#[display(fmt = "{}", file)]
pub struct TrackIdentity {
    dir:  String,
    file: String,
}

impl TrackIdentity {
    pub fn from_fix(fix: &Fix) -> Self {
        let dir = format!("/{:04}{:02}{:02}", fix.year, fix.month, fix.day);
        let file = format!("{}/{:02}{:02}.GPX", dir, fix.hour, fix.minute);

        Self {
            dir,
            file,
        }
    }

    /// `/YYYYMMDD`
    #[inline]
    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// `/YYYYMMDD/hhmm.GPX`
    #[inline]
    pub fn file(&self) -> &str {
        &self.file
    }
}

#[cfg(test)]
mod test {
    use message::nav::FixType;

    use super::*;

    #[test]
    fn zero_padded_paths() {
        let fix = Fix {
            year:           2021,
            month:          3,
            day:            7,
            hour:           0,
            minute:         4,
            second:         0,
            fix_type:       FixType::Fix2D,
            latitude:       0,
            longitude:      0,
            height:         0,
            ground_speed:   0,
            heading:        0,
            num_satellites: 4,
            pdop:           100,
        };

        let identity = TrackIdentity::from_fix(&fix);
        assert_eq!(identity.dir(), "/20210307");
        assert_eq!(identity.file(), "/20210307/0004.GPX");
        assert_eq!(identity.to_string(), "/20210307/0004.GPX");
    }
}
