//! Bring a receiver at an unknown bit rate into the operating mode the track logger
//! expects.
//!
//! Commands are fire-and-forget: nothing is read back from the receiver and a failed
//! write is logged and skipped. Only failures to flush or re-initialise the local end
//! abort the sequence.

use std::{
    str::FromStr,
    time::Duration,
};

use async_trait::async_trait;
use nonempty::NonEmpty;

use message::{
    cfg::{
        CfgCfg,
        CfgGnss,
        CfgMsg,
        CfgPrt,
        CfgRate,
        LEGACY_MESSAGES,
    },
    header::class,
    nav,
    Header,
    Packet,
    UbxMessage,
};
use util::trace_catch;

use crate::{
    clock::Clock,
    link::Link,
    Error,
    Result,
};

/// Bit rates to try when the receiver's rate is unknown. Non-empty and strictly
/// descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaudCandidates(NonEmpty<u32>);

impl BaudCandidates {
    pub fn new(rates: Vec<u32>) -> Result<Self> {
        let descending = rates.windows(2).all(|w| w[0] > w[1]);

        match NonEmpty::from_vec(rates.clone()) {
            Some(rates) if descending => Ok(Self(rates)),
            _ => Err(Error::InvalidCandidates(rates)),
        }
    }

    #[inline]
    pub fn first(&self) -> u32 {
        *self.0.first()
    }

    #[inline]
    pub fn last(&self) -> u32 {
        *self.0.last()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

impl Default for BaudCandidates {
    fn default() -> Self {
        Self(NonEmpty {
            head: 115_200,
            tail: vec![9_600],
        })
    }
}

impl FromStr for BaudCandidates {
    type Err = Error;

    /// Comma-separated rates, e.g. `115200,9600`.
    fn from_str(s: &str) -> Result<Self> {
        let rates = s
            .split(',')
            .map(|r| r.trim().parse::<u32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| Error::UnparsableCandidates(s.to_owned()))?;

        Self::new(rates)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub candidates:         BaudCandidates,
    /// Rate the receiver uses after restoring its defaults.
    pub default_baud:       u32,
    /// Rate to run at once configured.
    pub target_baud:        u32,
    pub measurement_period: Duration,
    /// Pause before every flush.
    pub settle:             Duration,
}

impl Settings {
    /// The measurement period as carried by CFG-RATE.
    pub fn measurement_period_ms(&self) -> Result<u16> {
        match u16::try_from(self.measurement_period.as_millis()) {
            Ok(ms) if ms > 0 => Ok(ms),
            _ => Err(Error::InvalidMeasurementPeriod(self.measurement_period)),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            candidates:         BaudCandidates::default(),
            default_baud:       9_600,
            target_baud:        115_200,
            measurement_period: Duration::from_millis(100),
            settle:             Duration::from_millis(100),
        }
    }
}

/// Called after each command is written. Acknowledgement checks hook in here.
#[async_trait]
pub trait SendHook: Send {
    async fn sent(&mut self, header: &Header);
}

/// Assume every command was accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FireAndForget;

#[async_trait]
impl SendHook for FireAndForget {
    async fn sent(&mut self, _header: &Header) {}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Report {
    /// Local rate at the end of the sequence.
    pub baud:   u32,
    pub sent:   usize,
    pub failed: usize,
}

/// Owns the link for the duration of configuration; the link's rate is the receiver
/// session state.
pub struct Configurator<L, C, H = FireAndForget> {
    link:     L,
    clock:    C,
    hook:     H,
    settings: Settings,
    report:   Report,
}

impl<L, C> Configurator<L, C>
where
    L: Link,
    C: Clock,
{
    pub fn new(link: L, clock: C, settings: Settings) -> Self {
        Self {
            link,
            clock,
            hook: FireAndForget,
            settings,
            report: Report::default(),
        }
    }
}

impl<L, C, H> Configurator<L, C, H>
where
    L: Link,
    C: Clock,
    H: SendHook,
{
    pub fn with_hook<H2: SendHook>(self, hook: H2) -> Configurator<L, C, H2> {
        Configurator {
            link: self.link,
            clock: self.clock,
            hook,
            settings: self.settings,
            report: self.report,
        }
    }

    #[inline]
    pub fn link(&self) -> &L {
        &self.link
    }

    #[inline]
    pub fn into_link(self) -> L {
        self.link
    }

    #[tracing::instrument(skip_all, fields(initial_baud = self.link.baud()))]
    pub async fn run(&mut self) -> Result<Report> {
        self.report = Report::default();
        let period = self.settings.measurement_period_ms()?;

        self.recover_baud().await?;
        self.silence_legacy().await;
        self.switch_baud().await?;
        self.select_mode(period).await;

        self.send(CfgMsg::enable(class::NAV, nav::id::PVT)).await;
        self.settle_and_flush().await?;

        self.report.baud = self.link.baud();
        tracing::info!(
            baud = self.report.baud,
            sent = self.report.sent,
            failed = self.report.failed,
            "receiver configured"
        );

        Ok(self.report)
    }

    /// Restore defaults at every candidate rate, then settle at the default rate.
    #[tracing::instrument(skip_all)]
    async fn recover_baud(&mut self) -> Result<()> {
        let candidates = self.settings.candidates.clone();

        // nothing written yet, no flush needed
        if self.link.baud() != candidates.first() {
            self.link.reopen(candidates.first()).await?;
        }

        for (i, baud) in candidates.iter().enumerate() {
            if i > 0 {
                self.change_baud(baud).await?;
            }

            tracing::debug!(baud, "restoring defaults");
            self.send(CfgCfg::restore_defaults()).await;
        }

        if candidates.last() != self.settings.default_baud {
            self.change_baud(self.settings.default_baud).await?;
        }

        Ok(())
    }

    #[tracing::instrument(skip_all)]
    async fn silence_legacy(&mut self) {
        for msg in LEGACY_MESSAGES.iter() {
            tracing::trace!(name = msg.name, "disabling");
            self.send(msg.disable()).await;
        }
    }

    /// Tell the receiver to change rate, then follow it.
    #[tracing::instrument(skip_all, fields(target = self.settings.target_baud))]
    async fn switch_baud(&mut self) -> Result<()> {
        let target = self.settings.target_baud;

        if target == self.settings.default_baud {
            return Ok(());
        }

        self.send(CfgPrt::uart1(target)).await;
        self.change_baud(target).await
    }

    #[tracing::instrument(skip_all)]
    async fn select_mode(&mut self, period: u16) {
        self.send(CfgRate::every(period)).await;
        self.send(CfgGnss::primary_only()).await;
    }

    async fn change_baud(&mut self, baud: u32) -> Result<()> {
        self.settle_and_flush().await?;

        tracing::debug!(from = self.link.baud(), to = baud, "changing local baud");
        self.link.reopen(baud).await
    }

    async fn settle_and_flush(&mut self) -> Result<()> {
        self.clock.sleep(self.settings.settle).await;
        self.link.flush().await?;

        Ok(())
    }

    async fn send<T>(&mut self, payload: T)
    where
        T: UbxMessage,
    {
        let result = self.try_send(payload).await;
        trace_catch!(result, "sending command");

        match result {
            Ok(_) => self.report.sent += 1,
            Err(_) => self.report.failed += 1,
        }
    }

    async fn try_send<T>(&mut self, payload: T) -> Result<()>
    where
        T: UbxMessage,
    {
        let packet = Packet::message(payload)?;
        let bytes = packet.to_bytes()?;

        tracing::debug!(command = %packet.header().display(), bytes = %hex::encode(&bytes), "sending");

        self.link.write_all(&bytes).await?;
        self.hook.sent(packet.header()).await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn candidates_must_descend() {
        assert!(BaudCandidates::new(vec![115_200, 9_600]).is_ok());
        assert!(BaudCandidates::new(vec![9_600]).is_ok());

        assert!(BaudCandidates::new(vec![]).is_err());
        assert!(BaudCandidates::new(vec![9_600, 115_200]).is_err());
        assert!(BaudCandidates::new(vec![9_600, 9_600]).is_err());
    }

    #[test]
    fn candidates_parse() {
        let parsed = "230400, 115200,9600".parse::<BaudCandidates>().unwrap();

        assert_eq!(parsed.iter().collect::<Vec<_>>(), vec![230_400, 115_200, 9_600]);
        assert_eq!(parsed.first(), 230_400);
        assert_eq!(parsed.last(), 9_600);

        let err = "fast,slow".parse::<BaudCandidates>().unwrap_err();
        assert!(matches!(&err, Error::UnparsableCandidates(s) if s == "fast,slow"));
        assert!(err.to_string().contains("fast,slow"));

        assert!("9600,115200".parse::<BaudCandidates>().is_err());
    }

    #[test]
    fn default_settings() {
        let settings = Settings::default();

        assert_eq!(settings.candidates.iter().collect::<Vec<_>>(), vec![115_200, 9_600]);
        assert_eq!(settings.default_baud, 9_600);
        assert_eq!(settings.target_baud, 115_200);
        assert_eq!(settings.measurement_period_ms().unwrap(), 100);
    }

    #[test]
    fn measurement_period_must_fit_cfg_rate() {
        let with_period = |ms| Settings {
            measurement_period: Duration::from_millis(ms),
            ..Settings::default()
        };

        assert_eq!(with_period(65_535).measurement_period_ms().unwrap(), 65_535);
        assert!(matches!(
            with_period(0).measurement_period_ms(),
            Err(Error::InvalidMeasurementPeriod(_))
        ));
        assert!(with_period(65_536).measurement_period_ms().is_err());
    }
}
