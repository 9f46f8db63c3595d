use serde::Serialize;

use crate::bits::BitCursor;
use crate::constants::Constants;
use crate::error::Result;
use crate::packets::isa::{
    AluFunc, AluOpaSelect, AluOpbSelect, Inst, MemSize, ALU_FUNC_WIDTH, ALU_OPA_SELECT_WIDTH,
    ALU_OPB_SELECT_WIDTH, MEM_SIZE_WIDTH,
};
use crate::packets::{check_width, reg_idx_width, Packet, ADDR_WIDTH, DATA_WIDTH, INST_WIDTH};

/// Fetch to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IfId {
    pub inst: Inst,
    pub pc: u64,
    pub npc: u64,
    pub valid: bool,
}

impl Packet for IfId {
    const NAME: &'static str = "IF/ID packet";

    fn width(_cfg: &Constants) -> Result<usize> {
        Ok(INST_WIDTH + 2 * ADDR_WIDTH + 1)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let mut cur = BitCursor::new(bits);
        Ok(IfId {
            inst: Inst(cur.take_uint(INST_WIDTH)? as u32),
            pc: cur.take_uint(ADDR_WIDTH)?,
            npc: cur.take_uint(ADDR_WIDTH)?,
            valid: cur.take_bool()?,
        })
    }
}

/// Decode to issue. Rides along inside ROB and RS entries, so most of
/// the per-instruction state lives here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdEx {
    pub inst: Inst,
    pub pc: u64,
    pub npc: u64,
    pub rs1_value: u64,
    pub rs2_value: u64,
    pub opa_select: AluOpaSelect,
    pub opb_select: AluOpbSelect,
    pub dest_reg_idx: u64,
    pub alu_func: AluFunc,
    pub mult: bool,
    pub rd_mem: bool,
    pub wr_mem: bool,
    pub cond_branch: bool,
    pub uncond_branch: bool,
    pub halt: bool,
    pub illegal: bool,
    pub csr_op: bool,
    pub valid: bool,
}

impl Packet for IdEx {
    const NAME: &'static str = "ID/EX packet";

    fn width(cfg: &Constants) -> Result<usize> {
        // trailing 9: mult, rd_mem, wr_mem, cond_branch, uncond_branch,
        // halt, illegal, csr_op, valid
        Ok(INST_WIDTH
            + 2 * ADDR_WIDTH
            + 2 * DATA_WIDTH
            + ALU_OPA_SELECT_WIDTH
            + ALU_OPB_SELECT_WIDTH
            + reg_idx_width(cfg)?
            + ALU_FUNC_WIDTH
            + 9)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let mut cur = BitCursor::new(bits);
        Ok(IdEx {
            inst: Inst(cur.take_uint(INST_WIDTH)? as u32),
            pc: cur.take_uint(ADDR_WIDTH)?,
            npc: cur.take_uint(ADDR_WIDTH)?,
            rs1_value: cur.take_uint(DATA_WIDTH)?,
            rs2_value: cur.take_uint(DATA_WIDTH)?,
            opa_select: AluOpaSelect::from(cur.take_uint(ALU_OPA_SELECT_WIDTH)?),
            opb_select: AluOpbSelect::from(cur.take_uint(ALU_OPB_SELECT_WIDTH)?),
            dest_reg_idx: cur.take_uint(reg_idx_width(cfg)?)?,
            alu_func: AluFunc::from(cur.take_uint(ALU_FUNC_WIDTH)?),
            mult: cur.take_bool()?,
            rd_mem: cur.take_bool()?,
            wr_mem: cur.take_bool()?,
            cond_branch: cur.take_bool()?,
            uncond_branch: cur.take_bool()?,
            halt: cur.take_bool()?,
            illegal: cur.take_bool()?,
            csr_op: cur.take_bool()?,
            valid: cur.take_bool()?,
        })
    }
}

/// Execute to memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExMem {
    pub alu_result: u64,
    pub npc: u64,
    pub take_branch: bool,
    pub rs2_value: u64,
    pub rd_mem: bool,
    pub wr_mem: bool,
    pub dest_reg_idx: u64,
    pub halt: bool,
    pub illegal: bool,
    pub csr_op: bool,
    pub rd_unsigned: bool,
    pub mem_size: MemSize,
    pub valid: bool,
}

impl Packet for ExMem {
    const NAME: &'static str = "EX/MEM packet";

    fn width(cfg: &Constants) -> Result<usize> {
        // 1 take_branch, 2 rd_mem/wr_mem, 4 halt/illegal/csr_op/rd_unsigned
        Ok(DATA_WIDTH + ADDR_WIDTH + 1 + DATA_WIDTH + 2 + reg_idx_width(cfg)? + 4
            + MEM_SIZE_WIDTH
            + 1)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let mut cur = BitCursor::new(bits);
        Ok(ExMem {
            alu_result: cur.take_uint(DATA_WIDTH)?,
            npc: cur.take_uint(ADDR_WIDTH)?,
            take_branch: cur.take_bool()?,
            rs2_value: cur.take_uint(DATA_WIDTH)?,
            rd_mem: cur.take_bool()?,
            wr_mem: cur.take_bool()?,
            dest_reg_idx: cur.take_uint(reg_idx_width(cfg)?)?,
            halt: cur.take_bool()?,
            illegal: cur.take_bool()?,
            csr_op: cur.take_bool()?,
            rd_unsigned: cur.take_bool()?,
            mem_size: MemSize::from(cur.take_uint(MEM_SIZE_WIDTH)?),
            valid: cur.take_bool()?,
        })
    }
}

/// Memory to writeback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemWb {
    pub result: u64,
    pub npc: u64,
    pub dest_reg_idx: u64,
    pub take_branch: bool,
    pub halt: bool,
    pub illegal: bool,
    pub valid: bool,
}

impl Packet for MemWb {
    const NAME: &'static str = "MEM/WB packet";

    fn width(cfg: &Constants) -> Result<usize> {
        Ok(DATA_WIDTH + ADDR_WIDTH + reg_idx_width(cfg)? + 4)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let mut cur = BitCursor::new(bits);
        Ok(MemWb {
            result: cur.take_uint(DATA_WIDTH)?,
            npc: cur.take_uint(ADDR_WIDTH)?,
            dest_reg_idx: cur.take_uint(reg_idx_width(cfg)?)?,
            take_branch: cur.take_bool()?,
            halt: cur.take_bool()?,
            illegal: cur.take_bool()?,
            valid: cur.take_bool()?,
        })
    }
}

/// Retire-side view the testbench prints its final state from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub npc: u64,
    pub data: u64,
    pub reg_idx: u64,
    pub halt: bool,
    pub illegal: bool,
    pub valid: bool,
}

impl Packet for Commit {
    const NAME: &'static str = "commit packet";

    fn width(cfg: &Constants) -> Result<usize> {
        Ok(ADDR_WIDTH + DATA_WIDTH + reg_idx_width(cfg)? + 3)
    }

    fn decode(bits: &str, cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, Self::width(cfg)?)?;
        let mut cur = BitCursor::new(bits);
        Ok(Commit {
            npc: cur.take_uint(ADDR_WIDTH)?,
            data: cur.take_uint(DATA_WIDTH)?,
            reg_idx: cur.take_uint(reg_idx_width(cfg)?)?,
            halt: cur.take_bool()?,
            illegal: cur.take_bool()?,
            valid: cur.take_bool()?,
        })
    }
}
