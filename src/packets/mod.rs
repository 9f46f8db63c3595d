pub mod branch;
pub mod cache;
pub mod fu;
pub mod isa;
pub mod lsq;
pub mod pipeline;
pub mod rename;
pub mod rob;
pub mod rs;

use crate::bits;
use crate::constants::Constants;
use crate::error::{DecodeError, Result};

// Fixed field widths shared by every schema.
pub const ADDR_WIDTH: usize = 32;
pub const DATA_WIDTH: usize = 32;
pub const INST_WIDTH: usize = 32;

/// A fixed-layout wire record: width computed live from the constants,
/// decode of exactly that many bits.
pub trait Packet: Sized {
    /// Schema name used in structural error reports.
    const NAME: &'static str;

    fn width(cfg: &Constants) -> Result<usize>;

    /// Decodes `bits`, whose length must equal `width(cfg)`.
    fn decode(bits: &str, cfg: &Constants) -> Result<Self>;
}

pub(crate) fn check_width(what: &'static str, bits: &str, expected: usize) -> Result<()> {
    if bits.len() != expected {
        return Err(DecodeError::WidthMismatch {
            what,
            expected,
            got: bits.len(),
        });
    }
    Ok(())
}

/// Decodes `count` concatenated packets. Arrays are stored in reversed
/// wire order: entry `count-1` occupies the first slice, entry 0 the
/// last, so the walk runs back to front and output index i is entry i.
pub fn decode_array<T: Packet>(bits: &str, count: usize, cfg: &Constants) -> Result<Vec<T>> {
    let entry = T::width(cfg)?;
    check_width(T::NAME, bits, entry * count)?;
    let mut out = Vec::with_capacity(count);
    for i in (0..count).rev() {
        out.push(T::decode(bits::slice(bits, i * entry, entry)?, cfg)?);
    }
    Ok(out)
}

/// Same as `decode_array` with the count derived from the input length.
pub fn decode_list<T: Packet>(bits: &str, cfg: &Constants) -> Result<Vec<T>> {
    let entry = T::width(cfg)?;
    if entry == 0 || bits.len() % entry != 0 {
        return Err(DecodeError::RaggedArray {
            what: T::NAME,
            entry,
            got: bits.len(),
        });
    }
    decode_array(bits, bits.len() / entry, cfg)
}

/// Reversed array of plain unsigned fields (tags, addresses, indexes).
pub fn decode_uint_array(
    what: &'static str,
    bits: &str,
    width: usize,
    count: usize,
) -> Result<Vec<u64>> {
    check_width(what, bits, width * count)?;
    let mut out = Vec::with_capacity(count);
    for i in (0..count).rev() {
        out.push(bits::extract_uint(bits, i * width, width)?);
    }
    Ok(out)
}

/// Reversed unsigned array with the count derived from the length.
pub fn decode_uint_list(what: &'static str, bits: &str, width: usize) -> Result<Vec<u64>> {
    if width == 0 || bits.len() % width != 0 {
        return Err(DecodeError::RaggedArray {
            what,
            entry: width,
            got: bits.len(),
        });
    }
    decode_uint_array(what, bits, width, bits.len() / width)
}

// Store-driven width lookups the schemas share.

pub(crate) fn tag_width(cfg: &Constants) -> Result<usize> {
    Ok(cfg.need("PHYS_REG_TAG_WIDTH")? as usize)
}

pub(crate) fn reg_idx_width(cfg: &Constants) -> Result<usize> {
    Ok(cfg.need("REG_IDX_WIDTH")? as usize)
}

pub(crate) fn checkpoint_count(cfg: &Constants) -> Result<usize> {
    Ok(cfg.need("NUM_CHECKPOINTS")? as usize)
}

pub(crate) fn sq_idx_width(cfg: &Constants) -> Result<usize> {
    Ok(cfg.need("SQ_IDX_WIDTH")? as usize)
}
