use std::{
    path::PathBuf,
    time::Duration,
};

use runtime::{
    configurator::{
        self,
        BaudCandidates,
    },
    track,
};

#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
pub struct Options {
    #[structopt(short, long)]
    pub serial_port: String,

    /// Rates to try while the receiver's rate is unknown, highest first.
    #[structopt(long, default_value = "115200,9600")]
    pub baud_candidates: BaudCandidates,

    /// Rate the receiver falls back to after restoring defaults.
    #[structopt(long, default_value = "9600")]
    pub default_baud: u32,

    #[structopt(long, default_value = "115200")]
    pub target_baud: u32,

    #[structopt(long, default_value = "100")]
    pub measurement_period_ms: u64,

    /// Delay before each flush of the serial link.
    #[structopt(long, default_value = "100")]
    pub settle_ms: u64,

    /// Minimum time between appended track points.
    #[structopt(long, default_value = "1000")]
    pub write_interval_ms: u64,

    /// Mount point of the removable volume.
    #[structopt(long, parse(from_os_str))]
    pub storage_root: PathBuf,

    #[structopt(long)]
    pub pretty: bool,
}

impl Options {
    pub fn configurator_settings(&self) -> runtime::Result<configurator::Settings> {
        let settings = configurator::Settings {
            candidates:         self.baud_candidates.clone(),
            default_baud:       self.default_baud,
            target_baud:        self.target_baud,
            measurement_period: Duration::from_millis(self.measurement_period_ms),
            settle:             Duration::from_millis(self.settle_ms),
        };

        settings.measurement_period_ms()?;
        Ok(settings)
    }

    pub fn track_settings(&self) -> track::Settings {
        track::Settings {
            write_interval: Duration::from_millis(self.write_interval_ms),
        }
    }
}

#[cfg(test)]
mod test {
    use structopt::StructOpt;

    use super::*;

    #[test]
    fn defaults() {
        let options =
            Options::from_iter_safe(["gpstrack", "--serial-port", "/dev/ttyS0", "--storage-root", "/mnt/sd"])
                .unwrap();

        assert_eq!(options.configurator_settings().unwrap(), configurator::Settings::default());
        assert_eq!(options.track_settings(), track::Settings::default());
        assert!(!options.pretty);
    }

    #[test]
    fn rejects_ascending_candidates() {
        let res = Options::from_iter_safe([
            "gpstrack",
            "--serial-port",
            "/dev/ttyS0",
            "--storage-root",
            "/mnt/sd",
            "--baud-candidates",
            "9600,115200",
        ]);

        assert!(res.is_err());
    }

    #[test]
    fn measurement_period_fits_cfg_rate() {
        let with_period = |ms: &str| {
            Options::from_iter_safe([
                "gpstrack",
                "--serial-port",
                "/dev/ttyS0",
                "--storage-root",
                "/mnt/sd",
                "--measurement-period-ms",
                ms,
            ])
            .unwrap()
            .configurator_settings()
        };

        assert_eq!(
            with_period("65535").unwrap().measurement_period,
            Duration::from_millis(65_535)
        );
        assert!(with_period("0").is_err());
        assert!(with_period("70000").is_err());
    }
}
