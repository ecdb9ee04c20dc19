pub use ::tokio_util::codec as tokio_codec;

mod ubx;

pub use self::ubx::*;
