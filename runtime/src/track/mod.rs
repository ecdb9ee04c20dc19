use std::time::Duration;

use message::Fix;

use crate::{
    clock::Clock,
    storage::{
        Storage,
        TrackFile,
    },
    Error,
    Result,
};

pub mod document;
mod identity;

pub use identity::TrackIdentity;

/// Fixes from before this year come from a receiver that has not yet resolved the date.
pub const MIN_PLAUSIBLE_YEAR: u16 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Minimum time between two appended track points.
    pub write_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            write_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum State {
    #[display(fmt = "idle")]
    Idle,
    #[display(fmt = "recording to {}", _0)]
    Recording(TrackIdentity),
}

/// What a single fix did to the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The fix type carries no position.
    NoPosition,
    /// Idle, and the fix date is not yet plausible.
    NoDate,
    /// Position dilution of precision was zero; the other fields are not trustworthy.
    Untrusted,
    /// A point was appended less than `write_interval` ago.
    Throttled,
    Appended { offset: u64, len: usize },
    /// Storage rejected an operation. Already logged.
    StorageFailed,
}

/// Appends fixes to a GPX file, keeping the closing tags at the end of the file so that
/// every append is one positioned write.
pub struct TrackLogger<S, C> {
    storage:    S,
    clock:      C,
    settings:   Settings,
    state:      State,
    last_write: Option<Duration>,
}

impl<S, C> TrackLogger<S, C>
where
    S: Storage,
    C: Clock,
{
    pub fn new(storage: S, clock: C, settings: Settings) -> Self {
        Self {
            storage,
            clock,
            settings,
            state: State::Idle,
            last_write: None,
        }
    }

    #[inline]
    pub fn state(&self) -> &State {
        &self.state
    }

    #[inline]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    #[tracing::instrument(level = "debug", skip_all, fields(state = %self.state, fix_type = ?fix.fix_type))]
    pub async fn handle(&mut self, fix: &Fix) -> Outcome {
        if !fix.fix_type.has_position() {
            return Outcome::NoPosition;
        }

        let identity = match &self.state {
            State::Recording(identity) => identity.clone(),
            State::Idle => {
                if fix.year <= MIN_PLAUSIBLE_YEAR {
                    tracing::trace!(year = fix.year, "waiting for a plausible date");
                    return Outcome::NoDate;
                }

                match self.start(fix).await {
                    Ok(identity) => {
                        tracing::info!(track = %identity, "recording started");
                        self.state = State::Recording(identity.clone());

                        identity
                    },
                    Err(e) => {
                        tracing::error!(error = %e, "starting track");
                        return Outcome::StorageFailed;
                    },
                }
            },
        };

        if fix.pdop == 0 {
            tracing::debug!("skipping fix with zero pdop");
            return Outcome::Untrusted;
        }

        let now = self.clock.now();
        if let Some(last) = self.last_write {
            if now.saturating_sub(last) < self.settings.write_interval {
                return Outcome::Throttled;
            }
        }

        match self.append(&identity, fix).await {
            Ok((offset, len)) => {
                self.last_write = Some(now);
                tracing::debug!(offset, len, "track point appended");
                Outcome::Appended {
                    offset,
                    len,
                }
            },
            Err(e) => {
                tracing::error!(error = %e, track = %identity, "appending track point");
                Outcome::StorageFailed
            },
        }
    }

    async fn start(&mut self, fix: &Fix) -> Result<TrackIdentity> {
        let identity = TrackIdentity::from_fix(fix);

        self.storage.mkdir(identity.dir()).await?;

        if self.storage.exists(identity.file()).await? {
            tracing::info!(track = %identity, "continuing existing track");
            return Ok(identity);
        }

        let mut file = self.storage.create(identity.file()).await?;
        file.write_at(0, document::empty().as_bytes()).await?;
        file.close().await?;

        Ok(identity)
    }

    async fn append(&mut self, identity: &TrackIdentity, fix: &Fix) -> Result<(u64, usize)> {
        let record = document::record(fix);

        let mut file = self.storage.open(identity.file()).await?;
        let size = file.size().await?;

        let offset = size.checked_sub(document::TRAILER_LEN).ok_or_else(|| Error::TruncatedTrack {
            path: identity.file().to_owned(),
            size,
        })?;

        let mut bytes = record.into_bytes();
        let len = bytes.len();
        bytes.extend_from_slice(document::TRAILER.as_bytes());

        file.write_at(offset, &bytes).await?;
        file.close().await?;

        Ok((offset, len))
    }
}
