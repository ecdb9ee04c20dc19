use std::{
    io,
    io::SeekFrom,
    path::{
        Path,
        PathBuf,
    },
};

use async_trait::async_trait;
use tokio::{
    fs,
    io::{
        AsyncSeekExt,
        AsyncWriteExt,
    },
};

/// Removable volume holding track files. Paths are absolute within the volume, e.g.
/// `/20190714/0905.GPX`.
#[async_trait]
pub trait Storage: Send {
    type File: TrackFile;

    /// Create a directory. Succeeds if it already exists.
    async fn mkdir(&mut self, path: &str) -> io::Result<()>;

    async fn exists(&mut self, path: &str) -> io::Result<bool>;

    /// Create an empty file, replacing any existing one.
    async fn create(&mut self, path: &str) -> io::Result<Self::File>;

    /// Open an existing file for positioned writes.
    async fn open(&mut self, path: &str) -> io::Result<Self::File>;
}

#[async_trait]
pub trait TrackFile: Send + Sized {
    async fn size(&mut self) -> io::Result<u64>;

    async fn write_at(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()>;

    async fn close(self) -> io::Result<()>;
}

/// [`Storage`] on a mounted filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check that the volume is mounted and is a directory.
    #[tracing::instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn probe(&self) -> io::Result<()> {
        let meta = fs::metadata(&self.root).await?;

        if !meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", self.root.display()),
            ));
        }

        tracing::debug!("storage available");
        Ok(())
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Storage for FsStorage {
    type File = FsFile;

    async fn mkdir(&mut self, path: &str) -> io::Result<()> {
        fs::create_dir_all(self.resolve(path)).await
    }

    async fn exists(&mut self, path: &str) -> io::Result<bool> {
        match fs::metadata(self.resolve(path)).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create(&mut self, path: &str) -> io::Result<FsFile> {
        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.resolve(path))
            .await?;

        Ok(FsFile(file))
    }

    async fn open(&mut self, path: &str) -> io::Result<FsFile> {
        let file = fs::OpenOptions::new().write(true).open(self.resolve(path)).await?;

        Ok(FsFile(file))
    }
}

#[derive(Debug)]
pub struct FsFile(fs::File);

#[async_trait]
impl TrackFile for FsFile {
    async fn size(&mut self) -> io::Result<u64> {
        Ok(self.0.metadata().await?.len())
    }

    async fn write_at(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        self.0.seek(SeekFrom::Start(offset)).await?;
        self.0.write_all(bytes).await
    }

    async fn close(mut self) -> io::Result<()> {
        self.0.flush().await?;
        self.0.sync_all().await
    }
}
