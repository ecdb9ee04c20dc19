pub mod clock;
pub mod configurator;
mod error;
pub mod link;
pub mod storage;
pub mod track;

pub use clock::{
    Clock,
    TokioClock,
};
pub use configurator::Configurator;
pub use error::{
    Error,
    Result,
};
pub use link::{
    Link,
    SerialLink,
};
pub use storage::{
    FsStorage,
    Storage,
    TrackFile,
};
pub use track::TrackLogger;
