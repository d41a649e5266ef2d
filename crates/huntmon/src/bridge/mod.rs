//! Control channel between the hub and the monitor worker.
//!
//! Commands travel hub -> worker as newline-delimited text lines; responses
//! travel worker -> hub as length-prefixed JSON frames, so response
//! boundaries never depend on how many bytes a single read returns.

pub mod codec;
pub mod protocol;
pub mod transport;
