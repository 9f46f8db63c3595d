//! Decoding engine for bit-packed architectural state captured from a
//! simulated out-of-order RISC-V core. Snapshots arrive as JSON signal
//! trees whose leaf values are flat MSB-first bit-strings; the modules
//! here slice those strings into typed packet records using widths
//! derived from a mutable constant store.

pub mod autodetect;
pub mod bits;
pub mod constants;
pub mod error;
pub mod packets;
pub mod report;
pub mod signal;
