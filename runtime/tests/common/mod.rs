#![allow(dead_code)]

use std::{
    collections::{
        BTreeMap,
        BTreeSet,
        HashSet,
    },
    io,
    str::FromStr,
    sync::{
        Arc,
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use tracing_subscriber::{
    fmt::format::FmtSpan,
    EnvFilter,
};

use gpstrack_runtime::{
    Clock,
    Link,
    Storage,
    TrackFile,
};

pub fn trace_init() {
    let level_filter = EnvFilter::from_str("debug").unwrap();

    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(level_filter)
        .pretty()
        .try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Write { baud: u32, bytes: Vec<u8> },
    Flush,
    Reopen(u32),
    Sleep(Duration),
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

/// Serial link that records everything done to it.
pub struct SimLink {
    baud:        u32,
    log:         EventLog,
    writes:      usize,
    fail_writes: HashSet<usize>,
}

impl SimLink {
    pub fn new(baud: u32, log: EventLog) -> Self {
        Self {
            baud,
            log,
            writes: 0,
            fail_writes: HashSet::new(),
        }
    }

    /// Make the nth write (zero-based) fail.
    pub fn failing(mut self, nth: usize) -> Self {
        self.fail_writes.insert(nth);
        self
    }
}

#[async_trait]
impl Link for SimLink {
    fn baud(&self) -> u32 {
        self.baud
    }

    async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let nth = self.writes;
        self.writes += 1;

        if self.fail_writes.contains(&nth) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "simulated write failure"));
        }

        self.log.lock().unwrap().push(Event::Write {
            baud:  self.baud,
            bytes: bytes.to_vec(),
        });

        Ok(())
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.log.lock().unwrap().push(Event::Flush);
        Ok(())
    }

    async fn reopen(&mut self, baud: u32) -> gpstrack_runtime::Result<()> {
        self.log.lock().unwrap().push(Event::Reopen(baud));
        self.baud = baud;

        Ok(())
    }
}

/// Virtual time. Sleeping advances it instantly.
#[derive(Clone, Default)]
pub struct SimClock {
    now: Arc<Mutex<Duration>>,
    log: Option<EventLog>,
}

impl SimClock {
    pub fn logging(log: EventLog) -> Self {
        Self {
            now: Default::default(),
            log: Some(log),
        }
    }

    pub fn advance(&self, dur: Duration) {
        *self.now.lock().unwrap() += dur;
    }
}

#[async_trait]
impl Clock for SimClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, dur: Duration) {
        self.advance(dur);

        if let Some(log) = &self.log {
            log.lock().unwrap().push(Event::Sleep(dur));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Mkdir(String),
    Create(String),
    Open(String),
    WriteAt { path: String, offset: u64, len: usize },
    Close(String),
}

#[derive(Debug, Default)]
pub struct Volume {
    pub dirs:        BTreeSet<String>,
    pub files:       BTreeMap<String, Vec<u8>>,
    pub ops:         Vec<Op>,
    pub unavailable: bool,
}

/// In-memory volume shared between the logger under test and the test body.
#[derive(Debug, Clone, Default)]
pub struct SimStorage(pub Arc<Mutex<Volume>>);

impl SimStorage {
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.0.lock().unwrap().files.get(path).cloned()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.0.lock().unwrap().ops.clone()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.0.lock().unwrap().unavailable = unavailable;
    }

    fn volume(&self) -> io::Result<std::sync::MutexGuard<'_, Volume>> {
        let vol = self.0.lock().unwrap();

        if vol.unavailable {
            return Err(io::Error::new(io::ErrorKind::Other, "volume unavailable"));
        }

        Ok(vol)
    }
}

fn parent(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

#[async_trait]
impl Storage for SimStorage {
    type File = SimFile;

    async fn mkdir(&mut self, path: &str) -> io::Result<()> {
        let mut vol = self.volume()?;
        vol.ops.push(Op::Mkdir(path.to_owned()));
        vol.dirs.insert(path.to_owned());

        Ok(())
    }

    async fn exists(&mut self, path: &str) -> io::Result<bool> {
        let vol = self.volume()?;
        Ok(vol.files.contains_key(path) || vol.dirs.contains(path))
    }

    async fn create(&mut self, path: &str) -> io::Result<SimFile> {
        let mut vol = self.volume()?;

        if !vol.dirs.contains(parent(path)) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such directory"));
        }

        vol.ops.push(Op::Create(path.to_owned()));
        vol.files.insert(path.to_owned(), vec![]);

        Ok(SimFile {
            path:   path.to_owned(),
            volume: self.clone(),
        })
    }

    async fn open(&mut self, path: &str) -> io::Result<SimFile> {
        let mut vol = self.volume()?;

        if !vol.files.contains_key(path) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such file"));
        }

        vol.ops.push(Op::Open(path.to_owned()));

        Ok(SimFile {
            path:   path.to_owned(),
            volume: self.clone(),
        })
    }
}

pub struct SimFile {
    path:   String,
    volume: SimStorage,
}

#[async_trait]
impl TrackFile for SimFile {
    async fn size(&mut self) -> io::Result<u64> {
        let vol = self.volume.volume()?;
        Ok(vol.files.get(&self.path).map_or(0, |f| f.len() as u64))
    }

    async fn write_at(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        let mut vol = self.volume.volume()?;

        vol.ops.push(Op::WriteAt {
            path: self.path.clone(),
            offset,
            len: bytes.len(),
        });

        let data = vol
            .files
            .get_mut(&self.path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "file vanished"))?;

        let offset = offset as usize;
        if offset > data.len() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "seek past end"));
        }

        let end = offset + bytes.len();
        if end > data.len() {
            data.resize(end, 0);
        }
        data[offset..end].copy_from_slice(bytes);

        Ok(())
    }

    async fn close(self) -> io::Result<()> {
        let mut vol = self.volume.volume()?;
        vol.ops.push(Op::Close(self.path.clone()));

        Ok(())
    }
}
