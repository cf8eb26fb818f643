pub mod code;
pub mod signal;

pub use code::{CodeRepository, SqlCodeRepository};
pub use signal::{SignalRepository, SqlSignalRepository};
