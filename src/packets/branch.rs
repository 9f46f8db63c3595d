use serde::Serialize;

use crate::bits::BitCursor;
use crate::constants::{clog2, Constants};
use crate::error::Result;
use crate::packets::isa::{PredictorState, PREDICTOR_STATE_WIDTH};
use crate::packets::rename::Frizzy;
use crate::packets::{
    check_width, decode_uint_array, decode_uint_list, tag_width, Packet, ADDR_WIDTH,
};

/// Recovery state snapshotted when a branch dispatches. The ROB tail
/// pointer is widened so a full buffer is distinguishable from an empty
/// one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checkpoint {
    pub pc: u64,
    pub bhr: Vec<bool>,
    pub rob_tail: u64,
    pub frizzy: Frizzy,
    pub map: Vec<u64>,
}

fn rob_tail_width(cfg: &Constants) -> Result<usize> {
    Ok(clog2(cfg.need("ROB_SZ")? + cfg.need("N")?) as usize)
}

impl Packet for Checkpoint {
    const NAME: &'static str = "branch checkpoint";

    fn width(cfg: &Constants) -> Result<usize> {
        Ok(ADDR_WIDTH
            + cfg.need("BRANCH_PRED_SZ")? as usize
            + rob_tail_width(cfg)?
            + Frizzy::width(cfg)?
            + cfg.need("AR_NUM")? as usize * tag_width(cfg)?)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let tag = tag_width(cfg)?;
        let ar_num = cfg.need("AR_NUM")? as usize;
        let mut cur = BitCursor::new(bits);
        Ok(Checkpoint {
            pc: cur.take_uint(ADDR_WIDTH)?,
            bhr: cur.take_mask(cfg.need("BRANCH_PRED_SZ")? as usize)?,
            rob_tail: cur.take_uint(rob_tail_width(cfg)?)?,
            frizzy: Frizzy::decode(cur.take_bits(Frizzy::width(cfg)?)?, cfg)?,
            // map entry i is the tag physical-mapped to architectural
            // register i
            map: decode_uint_array("map checkpoint", cur.take_bits(ar_num * tag)?, tag, ar_num)?,
        })
    }
}

/// Pattern history table read: one two-bit counter per entry, index 0
/// from the last slice like every other array.
pub fn decode_predictor_states(bits: &str) -> Result<Vec<PredictorState>> {
    Ok(decode_uint_list("pattern history table", bits, PREDICTOR_STATE_WIDTH)?
        .into_iter()
        .map(PredictorState::from)
        .collect())
}
