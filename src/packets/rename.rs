use serde::Serialize;

use crate::bits::BitCursor;
use crate::constants::Constants;
use crate::error::Result;
use crate::packets::{check_width, reg_idx_width, tag_width, Packet};

/// Architectural registers one dispatch slot asks the rename stage for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameReq {
    pub r_dest: u64,
    pub r_a: u64,
    pub r_b: u64,
}

impl Packet for RenameReq {
    const NAME: &'static str = "rename request";

    fn width(cfg: &Constants) -> Result<usize> {
        Ok(3 * reg_idx_width(cfg)?)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let reg = reg_idx_width(cfg)?;
        let mut cur = BitCursor::new(bits);
        Ok(RenameReq {
            r_dest: cur.take_uint(reg)?,
            r_a: cur.take_uint(reg)?,
            r_b: cur.take_uint(reg)?,
        })
    }
}

/// Physical tags the rename stage answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameResp {
    pub t_new: u64,
    pub t_old: u64,
    pub t_a: u64,
    pub ready_ta: bool,
    pub t_b: u64,
    pub ready_tb: bool,
}

impl Packet for RenameResp {
    const NAME: &'static str = "rename response";

    fn width(cfg: &Constants) -> Result<usize> {
        Ok(4 * tag_width(cfg)? + 2)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let tag = tag_width(cfg)?;
        let mut cur = BitCursor::new(bits);
        Ok(RenameResp {
            t_new: cur.take_uint(tag)?,
            t_old: cur.take_uint(tag)?,
            t_a: cur.take_uint(tag)?,
            ready_ta: cur.take_bool()?,
            t_b: cur.take_uint(tag)?,
            ready_tb: cur.take_bool()?,
        })
    }
}

/// Combined free-list and ready-bit state of the physical register
/// file. Index i is physical register i after the reversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frizzy {
    pub ready: Vec<bool>,
    pub free: Vec<bool>,
}

impl Packet for Frizzy {
    const NAME: &'static str = "free/ready state";

    fn width(cfg: &Constants) -> Result<usize> {
        Ok(2 * cfg.need("PHYS_REG_SZ_R10K")? as usize)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let regs = cfg.need("PHYS_REG_SZ_R10K")? as usize;
        let mut cur = BitCursor::new(bits);
        Ok(Frizzy {
            ready: cur.take_mask(regs)?,
            free: cur.take_mask(regs)?,
        })
    }
}
