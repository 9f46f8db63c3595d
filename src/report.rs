use std::io::Write;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::bits;
use crate::constants::Constants;
use crate::error::Result;
use crate::packets::branch::{decode_predictor_states, Checkpoint};
use crate::packets::cache::{DcacheTag, IcacheTag, MemBlock, MshrEntry};
use crate::packets::fu::{decode_load_states, BranchResolve, FuData};
use crate::packets::isa::{BranchOutcome, FuType, LoadState, MemCommand, PredictorState};
use crate::packets::lsq::{LoadFwdReq, LoadFwdResult, SqEntry, SqRetire, StoreComplete};
use crate::packets::pipeline::IfId;
use crate::packets::rename::Frizzy;
use crate::packets::rob::RobEntry;
use crate::packets::rs::RsEntry;
use crate::packets::{
    check_width, decode_array, decode_list, decode_uint_list, tag_width, DATA_WIDTH,
};
use crate::signal::Scope;

/// External disassembler collaborator. The engine only carries raw
/// instruction words; turning one into a mnemonic happens elsewhere.
pub trait Disassemble {
    fn decode32(&self, word: u32) -> String;
}

/// Fallback when no disassembler is wired in: hex words.
pub struct RawWords;

impl Disassemble for RawWords {
    fn decode32(&self, word: u32) -> String {
        format!("{:#010x}", word)
    }
}

/// Scope paths of the core's modules inside the captured tree. Loaded
/// from a JSON file so a renamed hierarchy needs no rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub rob: String,
    pub rs: String,
    pub fu: String,
    pub sq: String,
    pub branch_stack: String,
    pub branch_pred: String,
    pub rename: String,
    pub inst_buffer: String,
    pub icache: String,
    pub dcache: String,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            rob: "testbench.cpu.ooo_core.rob".to_string(),
            rs: "testbench.cpu.ooo_core.rs".to_string(),
            fu: "testbench.cpu.ooo_core.fu".to_string(),
            sq: "testbench.cpu.ooo_core.sq".to_string(),
            branch_stack: "testbench.cpu.ooo_core.branch_stack".to_string(),
            branch_pred: "testbench.cpu.front_end.branch_pred".to_string(),
            rename: "testbench.cpu.ooo_core.rename".to_string(),
            inst_buffer: "testbench.cpu.front_end.inst_buffer".to_string(),
            icache: "testbench.cpu.front_end.icache".to_string(),
            dcache: "testbench.cpu.mem.dcache".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RobReport {
    pub head: u64,
    pub tail: u64,
    pub entries: Vec<RobEntry>,
}

impl RobReport {
    pub fn decode(scope: &Scope, cfg: &Constants) -> Result<Self> {
        let count = cfg.need("ROB_SZ")? as usize;
        Ok(RobReport {
            head: scope.signal("head")?.to_u64()?,
            tail: scope.signal("tail")?.to_u64()?,
            entries: decode_array(scope.signal("entries")?.bits(), count, cfg)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RsReport {
    pub entries: Vec<RsEntry>,
    pub early_cdb: Vec<u64>,
    pub alu_avail: Vec<bool>,
    pub mult_avail: Vec<bool>,
    pub load_avail: Vec<bool>,
    pub store_avail: Vec<bool>,
    pub branch_avail: Vec<bool>,
}

impl RsReport {
    pub fn decode(scope: &Scope, cfg: &Constants) -> Result<Self> {
        let count = cfg.need("RS_SZ")? as usize;
        Ok(RsReport {
            entries: decode_array(scope.signal("entries")?.bits(), count, cfg)?,
            early_cdb: decode_uint_list(
                "early CDB tags",
                scope.signal("early_cdb")?.bits(),
                tag_width(cfg)?,
            )?,
            alu_avail: bits::to_mask(scope.signal("alu_avail")?.bits()),
            mult_avail: bits::to_mask(scope.signal("mult_avail")?.bits()),
            load_avail: bits::to_mask(scope.signal("load_avail")?.bits()),
            store_avail: bits::to_mask(scope.signal("store_avail")?.bits()),
            branch_avail: bits::to_mask(scope.signal("branch_avail")?.bits()),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FuReport {
    pub alu: Vec<FuData>,
    pub mult: Vec<FuData>,
    pub load: Vec<FuData>,
    pub store: Vec<FuData>,
    pub branch: Vec<FuData>,
    pub load_states: Vec<LoadState>,
    pub branch_results: Vec<BranchResolve>,
    pub cdb_tags: Vec<u64>,
    pub cdb_values: Vec<u64>,
}

impl FuReport {
    pub fn decode(scope: &Scope, cfg: &Constants) -> Result<Self> {
        Ok(FuReport {
            alu: decode_list(scope.signal("alu_data")?.bits(), cfg)?,
            mult: decode_list(scope.signal("mult_data")?.bits(), cfg)?,
            load: decode_list(scope.signal("load_data")?.bits(), cfg)?,
            store: decode_list(scope.signal("store_data")?.bits(), cfg)?,
            branch: decode_list(scope.signal("branch_data")?.bits(), cfg)?,
            load_states: decode_load_states(scope.signal("load_state")?.bits())?,
            branch_results: decode_list(scope.signal("branch_results")?.bits(), cfg)?,
            cdb_tags: decode_uint_list(
                "CDB tags",
                scope.signal("cdb_tags")?.bits(),
                tag_width(cfg)?,
            )?,
            cdb_values: decode_uint_list(
                "CDB values",
                scope.signal("cdb_values")?.bits(),
                DATA_WIDTH,
            )?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SqReport {
    pub head: u64,
    pub tail: u64,
    pub entries: Vec<SqEntry>,
    pub complete: Vec<StoreComplete>,
    pub retire: Vec<SqRetire>,
    pub forward_req: Vec<LoadFwdReq>,
    pub forward_result: Vec<LoadFwdResult>,
}

impl SqReport {
    pub fn decode(scope: &Scope, cfg: &Constants) -> Result<Self> {
        Ok(SqReport {
            head: scope.signal("head")?.to_u64()?,
            tail: scope.signal("tail")?.to_u64()?,
            entries: decode_list(scope.signal("entries")?.bits(), cfg)?,
            complete: decode_list(scope.signal("complete_stores")?.bits(), cfg)?,
            retire: decode_list(scope.signal("retire_stores")?.bits(), cfg)?,
            forward_req: decode_list(scope.signal("forward_req")?.bits(), cfg)?,
            forward_result: decode_list(scope.signal("forward_result")?.bits(), cfg)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BranchStackReport {
    pub checkpoints: Vec<Checkpoint>,
    pub current_mask: Vec<bool>,
    pub full: Vec<bool>,
    pub prediction: BranchOutcome,
}

impl BranchStackReport {
    pub fn decode(scope: &Scope, cfg: &Constants) -> Result<Self> {
        let count = cfg.need("NUM_CHECKPOINTS")? as usize;
        Ok(BranchStackReport {
            checkpoints: decode_array(scope.signal("checkpoints")?.bits(), count, cfg)?,
            current_mask: bits::to_mask(scope.signal("current_mask")?.bits()),
            full: bits::to_mask(scope.signal("full")?.bits()),
            prediction: BranchOutcome::from(scope.signal("prediction")?.to_u64()?),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BranchPredReport {
    pub bhr: Vec<bool>,
    pub pht: Vec<PredictorState>,
}

impl BranchPredReport {
    pub fn decode(scope: &Scope, _cfg: &Constants) -> Result<Self> {
        Ok(BranchPredReport {
            bhr: bits::to_mask(scope.signal("bhr")?.bits()),
            pht: decode_predictor_states(scope.signal("pht")?.bits())?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RenameReport {
    pub frizzy: Frizzy,
    pub map_table: Vec<u64>,
}

impl RenameReport {
    pub fn decode(scope: &Scope, cfg: &Constants) -> Result<Self> {
        let regs = cfg.need("PHYS_REG_SZ_R10K")? as usize;
        let ready = scope.signal("ready_bits")?.bits();
        let free = scope.signal("free_list")?.bits();
        check_width("ready bits", ready, regs)?;
        check_width("free list", free, regs)?;
        Ok(RenameReport {
            frizzy: Frizzy {
                ready: bits::to_mask(ready),
                free: bits::to_mask(free),
            },
            map_table: decode_uint_list(
                "map table",
                scope.signal("map_table")?.bits(),
                tag_width(cfg)?,
            )?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InstBufReport {
    pub head: u64,
    pub tail: u64,
    pub entries: Vec<IfId>,
}

impl InstBufReport {
    pub fn decode(scope: &Scope, cfg: &Constants) -> Result<Self> {
        Ok(InstBufReport {
            head: scope.signal("head")?.to_u64()?,
            tail: scope.signal("tail")?.to_u64()?,
            entries: decode_list(scope.signal("entries")?.bits(), cfg)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IcacheReport {
    pub tags: Vec<IcacheTag>,
    pub data: Vec<MemBlock>,
    pub mem_command: MemCommand,
    pub mem_addr: u64,
}

impl IcacheReport {
    pub fn decode(scope: &Scope, cfg: &Constants) -> Result<Self> {
        Ok(IcacheReport {
            tags: decode_list(scope.signal("tags")?.bits(), cfg)?,
            data: decode_list(scope.signal("data")?.bits(), cfg)?,
            mem_command: MemCommand::from(scope.signal("mem_command")?.to_u64()?),
            mem_addr: scope.signal("mem_addr")?.to_u64()?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DcacheReport {
    pub tags: Vec<DcacheTag>,
    pub data: Vec<MemBlock>,
    pub mshrs: Vec<MshrEntry>,
}

impl DcacheReport {
    pub fn decode(scope: &Scope, cfg: &Constants) -> Result<Self> {
        Ok(DcacheReport {
            tags: decode_list(scope.signal("tags")?.bits(), cfg)?,
            data: decode_list(scope.signal("data")?.bits(), cfg)?,
            mshrs: decode_list(scope.signal("mshrs")?.bits(), cfg)?,
        })
    }
}

/// Everything decodable from one snapshot. Modules whose scope is not
/// in the tree are skipped with a warning; a module that is present but
/// malformed fails the whole decode.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle: Option<String>,
    pub rob: Option<RobReport>,
    pub rs: Option<RsReport>,
    pub fu: Option<FuReport>,
    pub sq: Option<SqReport>,
    pub branch_stack: Option<BranchStackReport>,
    pub branch_pred: Option<BranchPredReport>,
    pub rename: Option<RenameReport>,
    pub inst_buffer: Option<InstBufReport>,
    pub icache: Option<IcacheReport>,
    pub dcache: Option<DcacheReport>,
}

macro_rules! decode_module {
    ($root:expr, $cfg:expr, $path:expr, $report:ty) => {
        match $root.scope_at($path) {
            Ok(scope) => Some(<$report>::decode(scope, $cfg)?),
            Err(err) => {
                warn!("skipping module at `{}`: {}", $path, err);
                None
            }
        }
    };
}

pub fn decode_cycle(
    root: &Scope,
    layout: &Layout,
    cfg: &Constants,
    cycle: Option<String>,
) -> Result<CycleReport> {
    Ok(CycleReport {
        cycle,
        rob: decode_module!(root, cfg, &layout.rob, RobReport),
        rs: decode_module!(root, cfg, &layout.rs, RsReport),
        fu: decode_module!(root, cfg, &layout.fu, FuReport),
        sq: decode_module!(root, cfg, &layout.sq, SqReport),
        branch_stack: decode_module!(root, cfg, &layout.branch_stack, BranchStackReport),
        branch_pred: decode_module!(root, cfg, &layout.branch_pred, BranchPredReport),
        rename: decode_module!(root, cfg, &layout.rename, RenameReport),
        inst_buffer: decode_module!(root, cfg, &layout.inst_buffer, InstBufReport),
        icache: decode_module!(root, cfg, &layout.icache, IcacheReport),
        dcache: decode_module!(root, cfg, &layout.dcache, DcacheReport),
    })
}

fn flag(value: bool) -> char {
    if value {
        '+'
    } else {
        ' '
    }
}

fn mask_string(mask: &[bool]) -> String {
    // printed most-significant first, like the waveform shows it
    mask.iter().rev().map(|&b| if b { '1' } else { '0' }).collect()
}

/// Plain-text rendering of a cycle report.
pub fn render_text(
    out: &mut dyn Write,
    report: &CycleReport,
    disasm: &dyn Disassemble,
) -> std::io::Result<()> {
    if let Some(cycle) = &report.cycle {
        writeln!(out, "cycle {}", cycle)?;
    }
    if let Some(rob) = &report.rob {
        writeln!(out, "=== ROB (head {}, tail {}) ===", rob.head, rob.tail)?;
        for (i, e) in rob.entries.iter().enumerate() {
            writeln!(
                out,
                "{:3} | {}{} | T_old {:3} T_new {:3} dest x{:<2} | {}",
                i,
                flag(e.valid),
                flag(e.retireable),
                e.t_old,
                e.t_new,
                e.r_dest,
                disasm.decode32(e.packet.inst.0),
            )?;
        }
    }
    if let Some(rs) = &report.rs {
        writeln!(out, "=== RS ===")?;
        for (i, e) in rs.entries.iter().enumerate() {
            writeln!(
                out,
                "{:3} | {} | {:6} {:6} | T_new {:3} T_a {:3}{} T_b {:3}{} | imm {:#010x} | bmask {}",
                i,
                flag(e.occupied),
                e.fu.name(),
                e.func_name(),
                e.t_new,
                e.t_a,
                flag(e.ready_ta),
                e.t_b,
                flag(e.ready_tb),
                e.imm_value,
                mask_string(&e.b_mask),
            )?;
        }
        writeln!(out, "early CDB: {:?}", rs.early_cdb)?;
    }
    if let Some(fu) = &report.fu {
        writeln!(out, "=== FU ===")?;
        for (kind, list) in [
            (FuType::Alu, &fu.alu),
            (FuType::Mult, &fu.mult),
            (FuType::Load, &fu.load),
            (FuType::Store, &fu.store),
            (FuType::Branch, &fu.branch),
        ] {
            for (i, d) in list.iter().enumerate() {
                writeln!(
                    out,
                    "{:6}[{}] | {} {:6} | T_new {:3} | rs1 {:#010x} rs2 {:#010x} | bmask {}",
                    kind.name(),
                    i,
                    flag(d.valid),
                    d.func_name(kind),
                    d.t_new,
                    d.rs1,
                    d.rs2,
                    mask_string(&d.b_mask),
                )?;
            }
        }
        let states: Vec<&str> = fu.load_states.iter().map(|s| s.name()).collect();
        writeln!(out, "load states: {}", states.join(" "))?;
        writeln!(out, "CDB tags: {:?} values: {:x?}", fu.cdb_tags, fu.cdb_values)?;
    }
    if let Some(sq) = &report.sq {
        writeln!(out, "=== SQ (head {}, tail {}) ===", sq.head, sq.tail)?;
        for (i, e) in sq.entries.iter().enumerate() {
            writeln!(
                out,
                "{:3} | {}{}{} | {:3} | T_new {:3} | addr {:#010x} data {:#010x}",
                i,
                flag(e.valid),
                flag(e.address_valid),
                flag(e.ready_mem),
                e.store_type.name(),
                e.t_new,
                e.store_address,
                e.store_data,
            )?;
        }
    }
    if let Some(bs) = &report.branch_stack {
        writeln!(out, "=== branch stack (mask {}) ===", mask_string(&bs.current_mask))?;
        writeln!(out, "prediction: {}", bs.prediction.name())?;
        for (i, c) in bs.checkpoints.iter().enumerate() {
            writeln!(
                out,
                "{:3} | {} | pc {:#010x} | bhr {} | rob_tail {}",
                i,
                flag(bs.full.get(i).copied().unwrap_or(false)),
                c.pc,
                mask_string(&c.bhr),
                c.rob_tail,
            )?;
        }
    }
    if let Some(bp) = &report.branch_pred {
        writeln!(out, "=== branch predictor (bhr {}) ===", mask_string(&bp.bhr))?;
        let states: Vec<&str> = bp.pht.iter().map(|s| s.name()).collect();
        writeln!(out, "pht: {}", states.join(" "))?;
    }
    if let Some(rename) = &report.rename {
        writeln!(out, "=== rename ===")?;
        for (ar, tag) in rename.map_table.iter().enumerate() {
            let ready = rename
                .frizzy
                .ready
                .get(*tag as usize)
                .copied()
                .unwrap_or(false);
            writeln!(out, "x{:<2} -> PR {:3}{}", ar, tag, flag(ready))?;
        }
        let free: Vec<usize> = rename
            .frizzy
            .free
            .iter()
            .enumerate()
            .filter_map(|(i, &f)| f.then_some(i))
            .collect();
        writeln!(out, "free: {:?}", free)?;
    }
    if let Some(ib) = &report.inst_buffer {
        writeln!(out, "=== inst buffer (head {}, tail {}) ===", ib.head, ib.tail)?;
        for (i, e) in ib.entries.iter().enumerate() {
            writeln!(
                out,
                "{:3} | {} | pc {:#010x} | {}",
                i,
                flag(e.valid),
                e.pc,
                disasm.decode32(e.inst.0),
            )?;
        }
    }
    if let Some(ic) = &report.icache {
        writeln!(out, "=== icache ({}) ===", ic.mem_command.name())?;
        for (i, t) in ic.tags.iter().enumerate() {
            if t.valid {
                writeln!(out, "line {:3} | tag {:#x}", i, t.tag)?;
            }
        }
    }
    if let Some(dc) = &report.dcache {
        writeln!(out, "=== dcache ===")?;
        for (i, t) in dc.tags.iter().enumerate() {
            if t.valid {
                writeln!(out, "line {:3} | tag {:#x}", i, t.tag)?;
            }
        }
        for m in dc.mshrs.iter().filter(|m| m.valid) {
            writeln!(
                out,
                "mshr tag {:2} | {} | addr {:#010x}",
                m.transaction_tag,
                m.command.name(),
                m.address,
            )?;
        }
    }
    Ok(())
}
