use serde::Serialize;

use crate::bits::BitCursor;
use crate::constants::Constants;
use crate::error::Result;
use crate::packets::isa::{MemCommand, MEM_COMMAND_WIDTH, MEM_TAG_WIDTH};
use crate::packets::{check_width, decode_uint_array, Packet, ADDR_WIDTH, DATA_WIDTH};

// Memory is 64KiB of 8-byte lines: 16 address bits, 3 offset bits, so
// tag plus index always split the remaining 13.
const ADDR_TAG_INDEX_BITS: usize = 13;

fn cache_tag_width(cfg: &Constants, line_bits_name: &str) -> Result<usize> {
    let line_bits = cfg.need(line_bits_name)? as usize;
    Ok(ADDR_TAG_INDEX_BITS.saturating_sub(line_bits))
}

/// Tag array entry of the instruction cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IcacheTag {
    pub tag: u64,
    pub valid: bool,
}

impl Packet for IcacheTag {
    const NAME: &'static str = "icache tag";

    fn width(cfg: &Constants) -> Result<usize> {
        Ok(cache_tag_width(cfg, "ICACHE_LINE_BITS")? + 1)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let mut cur = BitCursor::new(bits);
        Ok(IcacheTag {
            tag: cur.take_uint(cache_tag_width(cfg, "ICACHE_LINE_BITS")?)?,
            valid: cur.take_bool()?,
        })
    }
}

/// Tag array entry of the data cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DcacheTag {
    pub tag: u64,
    pub valid: bool,
}

impl Packet for DcacheTag {
    const NAME: &'static str = "dcache tag";

    fn width(cfg: &Constants) -> Result<usize> {
        Ok(cache_tag_width(cfg, "DCACHE_LINE_BITS")? + 1)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let mut cur = BitCursor::new(bits);
        Ok(DcacheTag {
            tag: cur.take_uint(cache_tag_width(cfg, "DCACHE_LINE_BITS")?)?,
            valid: cur.take_bool()?,
        })
    }
}

/// One 8-byte memory line, split into its two data words. `words[0]` is
/// the low word, decoded from the last 32 wire bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemBlock {
    pub words: [u64; 2],
}

impl Packet for MemBlock {
    const NAME: &'static str = "memory block";

    fn width(_cfg: &Constants) -> Result<usize> {
        Ok(2 * DATA_WIDTH)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let words = decode_uint_array(Self::NAME, bits, DATA_WIDTH, 2)?;
        Ok(MemBlock {
            words: [words[0], words[1]],
        })
    }
}

/// Miss status holding register: one outstanding memory transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MshrEntry {
    pub transaction_tag: u64,
    pub command: MemCommand,
    pub address: u64,
    pub data: MemBlock,
    pub valid: bool,
}

impl Packet for MshrEntry {
    const NAME: &'static str = "MSHR entry";

    fn width(cfg: &Constants) -> Result<usize> {
        Ok(MEM_TAG_WIDTH + MEM_COMMAND_WIDTH + ADDR_WIDTH + MemBlock::width(cfg)? + 1)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let mut cur = BitCursor::new(bits);
        Ok(MshrEntry {
            transaction_tag: cur.take_uint(MEM_TAG_WIDTH)?,
            command: MemCommand::from(cur.take_uint(MEM_COMMAND_WIDTH)?),
            address: cur.take_uint(ADDR_WIDTH)?,
            data: MemBlock::decode(cur.take_bits(MemBlock::width(cfg)?)?, cfg)?,
            valid: cur.take_bool()?,
        })
    }
}
