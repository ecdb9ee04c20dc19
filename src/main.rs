use std::{
    io,
    time::Duration,
};

use eyre::{
    Result,
    WrapErr,
};
use futures::StreamExt;
use structopt::StructOpt as _;
use tokio_util::codec::FramedRead;

use codec::UbxCodec;
use runtime::{
    Clock,
    Configurator,
    FsStorage,
    SerialLink,
    TokioClock,
    TrackLogger,
};
use util::build;

pub use crate::options::Options;

mod options;
mod trace;

const ALARM_PERIOD: Duration = Duration::from_secs(1);

fn main() -> Result<()> {
    util::bootstrap!(
        "starting {} {} ({}, built at {} with rustc {})",
        build::PACKAGE,
        build::VERSION,
        build::COMMIT_HASH,
        build::BUILD_TIMESTAMP,
        build::RUSTC_COMMIT_HASH,
    );

    let options: Options = Options::from_args();

    trace::init(options.pretty);

    tracing::info!(
        application = build::PACKAGE,
        version = build::VERSION,
        build_commit = build::COMMIT_HASH,
        built_at = build::BUILD_TIMESTAMP,
        using_rustc = build::RUSTC_COMMIT_HASH,
        "tracing subsystem initialized"
    );

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("building runtime")?
        .block_on(run(options))
}

async fn run(options: Options) -> Result<()> {
    let clock = TokioClock::new();
    let settings = options.configurator_settings().wrap_err("invalid receiver settings")?;

    let link = SerialLink::open(&options.serial_port, settings.candidates.first())
        .wrap_err_with(|| format!("opening {}", options.serial_port))?;

    let mut configurator = Configurator::new(link, clock, settings);
    configurator.run().await.wrap_err("configuring receiver")?;

    let serial = configurator.into_link().into_stream();

    let storage = FsStorage::new(&options.storage_root);
    if let Err(e) = storage.probe().await {
        alarm(&e, &clock).await;
        return Ok(());
    }

    let mut logger = TrackLogger::new(storage, clock, options.track_settings());
    let mut packets = FramedRead::new(serial, UbxCodec::default());

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let packet = tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("interrupted, stopping");
                return Ok(());
            },
            packet = packets.next() => packet,
        };

        let packet = match packet {
            Some(Ok(packet)) => packet,
            Some(Err(e)) => return Err(e).wrap_err("reading from receiver"),
            None => {
                tracing::warn!("serial stream ended");
                return Ok(());
            },
        };

        match message::nav::decode_fix(&packet) {
            Ok(Some(fix)) => {
                let outcome = logger.handle(&fix).await;
                tracing::trace!(?outcome, "fix handled");
            },
            Ok(None) => tracing::trace!(packet = %packet, "ignoring packet"),
            Err(e) => tracing::warn!(error = %e, packet = %packet, "undecodable fix"),
        }
    }
}

/// Storage is required for anything useful to happen. Complain until stopped.
async fn alarm(error: &io::Error, clock: &TokioClock) {
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tracing::error!(error = %error, "storage unavailable");

        tokio::select! {
            _ = &mut shutdown => return,
            _ = clock.sleep(ALARM_PERIOD) => {},
        }
    }
}
