use serde::Serialize;

use crate::bits::BitCursor;
use crate::constants::Constants;
use crate::error::Result;
use crate::packets::isa::{LoadFunc, StoreFunc, LOAD_FUNC_WIDTH, STORE_FUNC_WIDTH};
use crate::packets::{check_width, sq_idx_width, tag_width, Packet, ADDR_WIDTH, DATA_WIDTH};

/// One store queue slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqEntry {
    pub t_new: u64,
    pub store_type: StoreFunc,
    pub store_address: u64,
    pub address_valid: bool,
    pub store_data: u64,
    pub ready_mem: bool,
    pub valid: bool,
}

impl Packet for SqEntry {
    const NAME: &'static str = "SQ entry";

    fn width(cfg: &Constants) -> Result<usize> {
        Ok(tag_width(cfg)? + STORE_FUNC_WIDTH + ADDR_WIDTH + 1 + DATA_WIDTH + 2)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let mut cur = BitCursor::new(bits);
        Ok(SqEntry {
            t_new: cur.take_uint(tag_width(cfg)?)?,
            store_type: StoreFunc::from(cur.take_uint(STORE_FUNC_WIDTH)?),
            store_address: cur.take_uint(ADDR_WIDTH)?,
            address_valid: cur.take_bool()?,
            store_data: cur.take_uint(DATA_WIDTH)?,
            ready_mem: cur.take_bool()?,
            valid: cur.take_bool()?,
        })
    }
}

/// Completion report for a store whose address and data both arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreComplete {
    pub index: u64,
    pub store_address: u64,
    pub store_data: u64,
    pub address_valid: bool,
}

impl Packet for StoreComplete {
    const NAME: &'static str = "store completion";

    fn width(cfg: &Constants) -> Result<usize> {
        Ok(sq_idx_width(cfg)? + ADDR_WIDTH + DATA_WIDTH + 1)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let mut cur = BitCursor::new(bits);
        Ok(StoreComplete {
            index: cur.take_uint(sq_idx_width(cfg)?)?,
            store_address: cur.take_uint(ADDR_WIDTH)?,
            store_data: cur.take_uint(DATA_WIDTH)?,
            address_valid: cur.take_bool()?,
        })
    }
}

/// Store leaving the queue for memory at retire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqRetire {
    pub store_address: u64,
    pub store_data: u64,
    pub valid: bool,
}

impl Packet for SqRetire {
    const NAME: &'static str = "SQ retire packet";

    fn width(_cfg: &Constants) -> Result<usize> {
        Ok(ADDR_WIDTH + DATA_WIDTH + 1)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let mut cur = BitCursor::new(bits);
        Ok(SqRetire {
            store_address: cur.take_uint(ADDR_WIDTH)?,
            store_data: cur.take_uint(DATA_WIDTH)?,
            valid: cur.take_bool()?,
        })
    }
}

/// A load unit asking the queue for younger-store forwarding. The tail
/// snapshot bounds which stores are older than the load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadFwdReq {
    pub forwarding_address: u64,
    pub load_type: LoadFunc,
    pub sq_tail: u64,
    pub load_data_req: bool,
}

impl Packet for LoadFwdReq {
    const NAME: &'static str = "load forward request";

    fn width(cfg: &Constants) -> Result<usize> {
        Ok(ADDR_WIDTH + LOAD_FUNC_WIDTH + sq_idx_width(cfg)? + 1)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let mut cur = BitCursor::new(bits);
        Ok(LoadFwdReq {
            forwarding_address: cur.take_uint(ADDR_WIDTH)?,
            load_type: LoadFunc::from(cur.take_uint(LOAD_FUNC_WIDTH)?),
            sq_tail: cur.take_uint(sq_idx_width(cfg)?)?,
            load_data_req: cur.take_bool()?,
        })
    }
}

/// The queue's answer to a forwarding request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadFwdResult {
    pub forwarding_data: u64,
    pub forwarded_valid: bool,
    pub stall_load: bool,
}

impl Packet for LoadFwdResult {
    const NAME: &'static str = "load forward result";

    fn width(_cfg: &Constants) -> Result<usize> {
        Ok(DATA_WIDTH + 2)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let mut cur = BitCursor::new(bits);
        Ok(LoadFwdResult {
            forwarding_data: cur.take_uint(DATA_WIDTH)?,
            forwarded_valid: cur.take_bool()?,
            stall_load: cur.take_bool()?,
        })
    }
}
