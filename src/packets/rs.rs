use serde::Serialize;

use crate::bits::BitCursor;
use crate::constants::Constants;
use crate::error::Result;
use crate::packets::isa::{fu_func_name, FuType, FU_FUNC_WIDTH, FU_TYPE_WIDTH};
use crate::packets::pipeline::IdEx;
use crate::packets::{check_width, checkpoint_count, tag_width, Packet, DATA_WIDTH};

/// One reservation station slot. The function code stays raw: its
/// meaning depends on `fu`, see `func_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RsEntry {
    pub occupied: bool,
    pub fu: FuType,
    pub fu_func: u64,
    pub t_new: u64,
    pub t_a: u64,
    pub ready_ta: bool,
    pub t_b: u64,
    pub ready_tb: bool,
    pub has_imm: bool,
    pub imm_value: u64,
    pub b_mask: Vec<bool>,
    pub predicted: bool,
    pub packet: IdEx,
}

impl RsEntry {
    pub fn func_name(&self) -> &'static str {
        fu_func_name(self.fu, self.fu_func)
    }

    /// Ready to issue: both operands resolved.
    pub fn ready(&self) -> bool {
        self.occupied && self.ready_ta && self.ready_tb
    }
}

impl Packet for RsEntry {
    const NAME: &'static str = "RS entry";

    fn width(cfg: &Constants) -> Result<usize> {
        Ok(1 + FU_TYPE_WIDTH
            + FU_FUNC_WIDTH
            + 3 * tag_width(cfg)?
            + 2
            + 1
            + DATA_WIDTH
            + checkpoint_count(cfg)?
            + 1
            + IdEx::width(cfg)?)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let tag = tag_width(cfg)?;
        let mut cur = BitCursor::new(bits);
        Ok(RsEntry {
            occupied: cur.take_bool()?,
            fu: FuType::from(cur.take_uint(FU_TYPE_WIDTH)?),
            fu_func: cur.take_uint(FU_FUNC_WIDTH)?,
            t_new: cur.take_uint(tag)?,
            t_a: cur.take_uint(tag)?,
            ready_ta: cur.take_bool()?,
            t_b: cur.take_uint(tag)?,
            ready_tb: cur.take_bool()?,
            has_imm: cur.take_bool()?,
            imm_value: cur.take_uint(DATA_WIDTH)?,
            b_mask: cur.take_mask(checkpoint_count(cfg)?)?,
            predicted: cur.take_bool()?,
            packet: IdEx::decode(cur.take_bits(IdEx::width(cfg)?)?, cfg)?,
        })
    }
}

/// Issue payload handed from the reservation stations to a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RsIssue {
    pub t_new: u64,
    pub t_a: u64,
    pub t_b: u64,
    pub valid: bool,
    pub fu_func: u64,
    pub has_imm: bool,
    pub imm_value: u64,
    pub b_mask: Vec<bool>,
    pub predicted: bool,
    pub packet: IdEx,
}

impl RsIssue {
    pub fn func_name(&self, fu: FuType) -> &'static str {
        fu_func_name(fu, self.fu_func)
    }
}

impl Packet for RsIssue {
    const NAME: &'static str = "RS issue packet";

    fn width(cfg: &Constants) -> Result<usize> {
        Ok(3 * tag_width(cfg)? + 1 + FU_FUNC_WIDTH + 1 + DATA_WIDTH
            + checkpoint_count(cfg)?
            + 1
            + IdEx::width(cfg)?)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let tag = tag_width(cfg)?;
        let mut cur = BitCursor::new(bits);
        Ok(RsIssue {
            t_new: cur.take_uint(tag)?,
            t_a: cur.take_uint(tag)?,
            t_b: cur.take_uint(tag)?,
            valid: cur.take_bool()?,
            fu_func: cur.take_uint(FU_FUNC_WIDTH)?,
            has_imm: cur.take_bool()?,
            imm_value: cur.take_uint(DATA_WIDTH)?,
            b_mask: cur.take_mask(checkpoint_count(cfg)?)?,
            predicted: cur.take_bool()?,
            packet: IdEx::decode(cur.take_bits(IdEx::width(cfg)?)?, cfg)?,
        })
    }
}
