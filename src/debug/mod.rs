#[cfg(feature = "debug")]
pub mod stats;
