use std::io;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio_serial::{
    SerialPort,
    SerialPortBuilderExt,
    SerialStream,
};

use crate::Result;

/// The host side of the serial connection to the receiver.
#[async_trait]
pub trait Link: Send {
    /// Current bit rate of the local end.
    fn baud(&self) -> u32;

    async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Block until everything written so far has left the transmit buffer.
    async fn flush(&mut self) -> io::Result<()>;

    /// Re-initialise the local end at `baud`.
    async fn reopen(&mut self, baud: u32) -> Result<()>;
}

pub struct SerialLink {
    port:   String,
    baud:   u32,
    stream: SerialStream,
}

impl SerialLink {
    #[tracing::instrument(level = "debug", skip(port), fields(port = %port.as_ref()))]
    pub fn open(port: impl AsRef<str>, baud: u32) -> Result<Self> {
        let port = port.as_ref().to_owned();
        let stream = tokio_serial::new(&port, baud).open_native_async()?;

        tracing::info!("serial port opened");

        Ok(Self {
            port,
            baud,
            stream,
        })
    }

    #[inline]
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Hand over the underlying stream for reading.
    #[inline]
    pub fn into_stream(self) -> SerialStream {
        self.stream
    }
}

#[async_trait]
impl Link for SerialLink {
    #[inline]
    fn baud(&self) -> u32 {
        self.baud
    }

    async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.stream.flush().await
    }

    #[tracing::instrument(skip(self), fields(port = %self.port))]
    async fn reopen(&mut self, baud: u32) -> Result<()> {
        self.stream.set_baud_rate(baud)?;
        self.baud = baud;
        tracing::debug!("serial link reconfigured");

        Ok(())
    }
}
