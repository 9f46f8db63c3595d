use serde::Serialize;

use crate::bits::BitCursor;
use crate::constants::Constants;
use crate::error::Result;
use crate::packets::isa::{fu_func_name, FuType, LoadState, FU_FUNC_WIDTH, LOAD_STATE_WIDTH};
use crate::packets::{
    check_width, checkpoint_count, decode_uint_list, sq_idx_width, tag_width, Packet, ADDR_WIDTH,
    DATA_WIDTH,
};

/// In-flight payload of one functional unit. All five unit types share
/// the layout; `func` is read against the unit's own encoding and
/// `saved_tail` only means something to the memory units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FuData {
    pub t_new: u64,
    pub rs1: u64,
    pub rs2: u64,
    pub valid: bool,
    pub func: u64,
    pub b_mask: Vec<bool>,
    pub predicted: bool,
    pub saved_tail: u64,
}

impl FuData {
    pub fn func_name(&self, fu: FuType) -> &'static str {
        fu_func_name(fu, self.func)
    }
}

impl Packet for FuData {
    const NAME: &'static str = "FU data";

    fn width(cfg: &Constants) -> Result<usize> {
        Ok(tag_width(cfg)? + 2 * DATA_WIDTH + 1 + FU_FUNC_WIDTH
            + checkpoint_count(cfg)?
            + 1
            + sq_idx_width(cfg)?)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let mut cur = BitCursor::new(bits);
        Ok(FuData {
            t_new: cur.take_uint(tag_width(cfg)?)?,
            rs1: cur.take_uint(DATA_WIDTH)?,
            rs2: cur.take_uint(DATA_WIDTH)?,
            valid: cur.take_bool()?,
            func: cur.take_uint(FU_FUNC_WIDTH)?,
            b_mask: cur.take_mask(checkpoint_count(cfg)?)?,
            predicted: cur.take_bool()?,
            saved_tail: cur.take_uint(sq_idx_width(cfg)?)?,
        })
    }
}

/// What a resolving branch unit reports to the branch stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchResolve {
    pub b_mask: Vec<bool>,
    pub taken: bool,
    pub is_jalr: bool,
    pub target: u64,
}

impl Packet for BranchResolve {
    const NAME: &'static str = "branch resolve packet";

    fn width(cfg: &Constants) -> Result<usize> {
        Ok(checkpoint_count(cfg)? + 2 + ADDR_WIDTH)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let mut cur = BitCursor::new(bits);
        Ok(BranchResolve {
            b_mask: cur.take_mask(checkpoint_count(cfg)?)?,
            taken: cur.take_bool()?,
            is_jalr: cur.take_bool()?,
            target: cur.take_uint(ADDR_WIDTH)?,
        })
    }
}

/// Load unit state machines, one two-bit field per unit, unit 0 from
/// the last slice like every other array.
pub fn decode_load_states(bits: &str) -> Result<Vec<LoadState>> {
    Ok(decode_uint_list("load unit states", bits, LOAD_STATE_WIDTH)?
        .into_iter()
        .map(LoadState::from)
        .collect())
}
