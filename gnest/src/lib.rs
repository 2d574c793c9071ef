use std::sync::LazyLock;
use std::time::Instant;

pub mod config;
pub mod dispatch;
pub mod ga;
pub mod io;
pub mod placement;
pub mod session;

pub static EPOCH: LazyLock<Instant> = LazyLock::new(Instant::now);
