use serde::Serialize;

use crate::bits::BitCursor;
use crate::constants::Constants;
use crate::error::Result;
use crate::packets::pipeline::IdEx;
use crate::packets::{check_width, reg_idx_width, tag_width, Packet};

/// One reorder buffer slot: the rename pair, the architectural
/// destination, retirement flags, and the issued instruction itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RobEntry {
    pub t_old: u64,
    pub t_new: u64,
    pub r_dest: u64,
    pub valid: bool,
    pub retireable: bool,
    pub packet: IdEx,
}

impl Packet for RobEntry {
    const NAME: &'static str = "ROB entry";

    fn width(cfg: &Constants) -> Result<usize> {
        Ok(2 * tag_width(cfg)? + reg_idx_width(cfg)? + 2 + IdEx::width(cfg)?)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let tag = tag_width(cfg)?;
        let mut cur = BitCursor::new(bits);
        Ok(RobEntry {
            t_old: cur.take_uint(tag)?,
            t_new: cur.take_uint(tag)?,
            r_dest: cur.take_uint(reg_idx_width(cfg)?)?,
            valid: cur.take_bool()?,
            retireable: cur.take_bool()?,
            packet: IdEx::decode(cur.take_bits(IdEx::width(cfg)?)?, cfg)?,
        })
    }
}
