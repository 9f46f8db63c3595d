use serde::Serialize;

use crate::bits;
use crate::constants::Constants;
use crate::error::Result;
use crate::packets::{check_width, Packet, INST_WIDTH};

pub const ALU_OPA_SELECT_WIDTH: usize = 2;
pub const ALU_OPB_SELECT_WIDTH: usize = 4;
pub const ALU_FUNC_WIDTH: usize = 4;
pub const LOAD_FUNC_WIDTH: usize = 3;
pub const STORE_FUNC_WIDTH: usize = 2;
pub const FU_TYPE_WIDTH: usize = 3;
// FU payloads carry their function code in a field wide enough for any
// of the per-type encodings.
pub const FU_FUNC_WIDTH: usize = 4;
pub const MEM_SIZE_WIDTH: usize = 2;
pub const MEM_COMMAND_WIDTH: usize = 2;
pub const PREDICTOR_STATE_WIDTH: usize = 2;
pub const LOAD_STATE_WIDTH: usize = 2;
pub const MEM_TAG_WIDTH: usize = 4;

// Invalid or unoccupied entries legitimately carry garbage in their
// function fields, so the partial enums fold unknown encodings into an
// Invalid carrier instead of failing the decode.

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum AluFunc {
    Add,
    Sub,
    Slt,
    Sltu,
    And,
    Or,
    Xor,
    Sll,
    Srl,
    Sra,
    Invalid(u8),
}

impl From<u64> for AluFunc {
    fn from(value: u64) -> Self {
        match value {
            0b0000 => AluFunc::Add,
            0b0001 => AluFunc::Sub,
            0b0010 => AluFunc::Slt,
            0b0011 => AluFunc::Sltu,
            0b0100 => AluFunc::And,
            0b0101 => AluFunc::Or,
            0b0110 => AluFunc::Xor,
            0b0111 => AluFunc::Sll,
            0b1000 => AluFunc::Srl,
            0b1001 => AluFunc::Sra,
            other => AluFunc::Invalid(other as u8),
        }
    }
}

impl AluFunc {
    pub fn name(&self) -> &'static str {
        match self {
            AluFunc::Add => "ADD",
            AluFunc::Sub => "SUB",
            AluFunc::Slt => "SLT",
            AluFunc::Sltu => "SLTU",
            AluFunc::And => "AND",
            AluFunc::Or => "OR",
            AluFunc::Xor => "XOR",
            AluFunc::Sll => "SLL",
            AluFunc::Srl => "SRL",
            AluFunc::Sra => "SRA",
            AluFunc::Invalid(_) => "XXX",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum MultFunc {
    Mul,
    Mulh,
    Mulhsu,
    Mulhu,
    Invalid(u8),
}

impl From<u64> for MultFunc {
    fn from(value: u64) -> Self {
        match value {
            0b00 => MultFunc::Mul,
            0b01 => MultFunc::Mulh,
            0b10 => MultFunc::Mulhsu,
            0b11 => MultFunc::Mulhu,
            other => MultFunc::Invalid(other as u8),
        }
    }
}

impl MultFunc {
    pub fn name(&self) -> &'static str {
        match self {
            MultFunc::Mul => "MUL",
            MultFunc::Mulh => "MULH",
            MultFunc::Mulhsu => "MULHSU",
            MultFunc::Mulhu => "MULHU",
            MultFunc::Invalid(_) => "XXX",
        }
    }
}

// funct3 encodings from the branch instructions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum BranchFunc {
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,
    Invalid(u8),
}

impl From<u64> for BranchFunc {
    fn from(value: u64) -> Self {
        match value {
            0b000 => BranchFunc::Beq,
            0b001 => BranchFunc::Bne,
            0b100 => BranchFunc::Blt,
            0b101 => BranchFunc::Bge,
            0b110 => BranchFunc::Bltu,
            0b111 => BranchFunc::Bgeu,
            other => BranchFunc::Invalid(other as u8),
        }
    }
}

impl BranchFunc {
    pub fn name(&self) -> &'static str {
        match self {
            BranchFunc::Beq => "BEQ",
            BranchFunc::Bne => "BNE",
            BranchFunc::Blt => "BLT",
            BranchFunc::Bge => "BGE",
            BranchFunc::Bltu => "BLTU",
            BranchFunc::Bgeu => "BGEU",
            BranchFunc::Invalid(_) => "XXX",
        }
    }
}

// funct3 encodings from the load instructions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum LoadFunc {
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
    Invalid(u8),
}

impl From<u64> for LoadFunc {
    fn from(value: u64) -> Self {
        match value {
            0b000 => LoadFunc::Lb,
            0b001 => LoadFunc::Lh,
            0b010 => LoadFunc::Lw,
            0b100 => LoadFunc::Lbu,
            0b101 => LoadFunc::Lhu,
            other => LoadFunc::Invalid(other as u8),
        }
    }
}

impl LoadFunc {
    pub fn name(&self) -> &'static str {
        match self {
            LoadFunc::Lb => "LB",
            LoadFunc::Lh => "LH",
            LoadFunc::Lw => "LW",
            LoadFunc::Lbu => "LBU",
            LoadFunc::Lhu => "LHU",
            LoadFunc::Invalid(_) => "XXX",
        }
    }
}

// funct3 encodings from the store instructions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum StoreFunc {
    Sb,
    Sh,
    Sw,
    Invalid(u8),
}

impl From<u64> for StoreFunc {
    fn from(value: u64) -> Self {
        match value {
            0b00 => StoreFunc::Sb,
            0b01 => StoreFunc::Sh,
            0b10 => StoreFunc::Sw,
            other => StoreFunc::Invalid(other as u8),
        }
    }
}

impl StoreFunc {
    pub fn name(&self) -> &'static str {
        match self {
            StoreFunc::Sb => "SB",
            StoreFunc::Sh => "SH",
            StoreFunc::Sw => "SW",
            StoreFunc::Invalid(_) => "XXX",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum FuType {
    Alu,
    Mult,
    Load,
    Store,
    Branch,
    Invalid(u8),
}

impl From<u64> for FuType {
    fn from(value: u64) -> Self {
        match value {
            0b000 => FuType::Alu,
            0b001 => FuType::Mult,
            0b010 => FuType::Load,
            0b011 => FuType::Store,
            0b100 => FuType::Branch,
            other => FuType::Invalid(other as u8),
        }
    }
}

impl FuType {
    pub fn name(&self) -> &'static str {
        match self {
            FuType::Alu => "ALU",
            FuType::Mult => "MULT",
            FuType::Load => "LOAD",
            FuType::Store => "STORE",
            FuType::Branch => "BRANCH",
            FuType::Invalid(_) => "XXX",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum MemSize {
    Byte = 0b00,
    Half = 0b01,
    Word = 0b10,
    Double = 0b11,
}

impl From<u64> for MemSize {
    fn from(value: u64) -> Self {
        match value {
            0b00 => MemSize::Byte,
            0b01 => MemSize::Half,
            0b10 => MemSize::Word,
            0b11 => MemSize::Double,
            _ => panic!("mem size field wider than 2 bits"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum MemCommand {
    None,
    Load,
    Store,
    Invalid(u8),
}

impl From<u64> for MemCommand {
    fn from(value: u64) -> Self {
        match value {
            0b00 => MemCommand::None,
            0b01 => MemCommand::Load,
            0b10 => MemCommand::Store,
            other => MemCommand::Invalid(other as u8),
        }
    }
}

impl MemCommand {
    pub fn name(&self) -> &'static str {
        match self {
            MemCommand::None => "MEM_NONE",
            MemCommand::Load => "MEM_LOAD",
            MemCommand::Store => "MEM_STORE",
            MemCommand::Invalid(_) => "XXX",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum AluOpaSelect {
    Rs1 = 0b00,
    Npc = 0b01,
    Pc = 0b10,
    Zero = 0b11,
}

impl From<u64> for AluOpaSelect {
    fn from(value: u64) -> Self {
        match value {
            0b00 => AluOpaSelect::Rs1,
            0b01 => AluOpaSelect::Npc,
            0b10 => AluOpaSelect::Pc,
            0b11 => AluOpaSelect::Zero,
            _ => panic!("opa select field wider than 2 bits"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum AluOpbSelect {
    Rs2,
    IImm,
    SImm,
    BImm,
    UImm,
    JImm,
    Invalid(u8),
}

impl From<u64> for AluOpbSelect {
    fn from(value: u64) -> Self {
        match value {
            0b0000 => AluOpbSelect::Rs2,
            0b0001 => AluOpbSelect::IImm,
            0b0010 => AluOpbSelect::SImm,
            0b0011 => AluOpbSelect::BImm,
            0b0100 => AluOpbSelect::UImm,
            0b0101 => AluOpbSelect::JImm,
            other => AluOpbSelect::Invalid(other as u8),
        }
    }
}

/// Outcome a resolving branch reports to the branch stack.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum BranchOutcome {
    NotResolving,
    CorrectPred,
    Mispredict,
    Invalid(u8),
}

impl From<u64> for BranchOutcome {
    fn from(value: u64) -> Self {
        match value {
            0b00 => BranchOutcome::NotResolving,
            0b01 => BranchOutcome::CorrectPred,
            0b10 => BranchOutcome::Mispredict,
            other => BranchOutcome::Invalid(other as u8),
        }
    }
}

impl BranchOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            BranchOutcome::NotResolving => "NOT_RESOLVING",
            BranchOutcome::CorrectPred => "CORRECT_PRED",
            BranchOutcome::Mispredict => "MISPREDICT",
            BranchOutcome::Invalid(_) => "XXX",
        }
    }
}

/// Two-bit saturating counter state in the pattern history table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum PredictorState {
    Snt = 0b00,
    Wnt = 0b01,
    Wt = 0b10,
    St = 0b11,
}

impl From<u64> for PredictorState {
    fn from(value: u64) -> Self {
        match value {
            0b00 => PredictorState::Snt,
            0b01 => PredictorState::Wnt,
            0b10 => PredictorState::Wt,
            0b11 => PredictorState::St,
            _ => panic!("predictor state field wider than 2 bits"),
        }
    }
}

impl PredictorState {
    pub fn name(&self) -> &'static str {
        match self {
            PredictorState::Snt => "SNT",
            PredictorState::Wnt => "WNT",
            PredictorState::Wt => "WT",
            PredictorState::St => "ST",
        }
    }

    pub fn predicts_taken(&self) -> bool {
        matches!(self, PredictorState::Wt | PredictorState::St)
    }
}

/// Load unit state machine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum LoadState {
    Idle = 0b00,
    Fwd = 0b01,
    Mem = 0b10,
    Done = 0b11,
}

impl From<u64> for LoadState {
    fn from(value: u64) -> Self {
        match value {
            0b00 => LoadState::Idle,
            0b01 => LoadState::Fwd,
            0b10 => LoadState::Mem,
            0b11 => LoadState::Done,
            _ => panic!("load state field wider than 2 bits"),
        }
    }
}

impl LoadState {
    pub fn name(&self) -> &'static str {
        match self {
            LoadState::Idle => "IDLE",
            LoadState::Fwd => "FWD",
            LoadState::Mem => "MEM",
            LoadState::Done => "DONE",
        }
    }
}

/// Renders a raw function code for a unit of the given type.
pub fn fu_func_name(fu: FuType, func: u64) -> &'static str {
    match fu {
        FuType::Alu => AluFunc::from(func).name(),
        FuType::Mult => MultFunc::from(func).name(),
        FuType::Load => LoadFunc::from(func).name(),
        FuType::Store => StoreFunc::from(func).name(),
        FuType::Branch => BranchFunc::from(func).name(),
        FuType::Invalid(_) => "XXX",
    }
}

/// Raw 32-bit instruction word with accessors for the base formats.
/// Turning it into a mnemonic is the disassembler collaborator's job.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Inst(pub u32);

impl Inst {
    pub const NOP: Inst = Inst(0x13);

    pub fn opcode(self) -> u32 {
        self.0 & 0x7f
    }

    pub fn rd(self) -> u32 {
        (self.0 >> 7) & 0x1f
    }

    pub fn funct3(self) -> u32 {
        (self.0 >> 12) & 0x7
    }

    pub fn rs1(self) -> u32 {
        (self.0 >> 15) & 0x1f
    }

    pub fn rs2(self) -> u32 {
        (self.0 >> 20) & 0x1f
    }

    pub fn funct7(self) -> u32 {
        (self.0 >> 25) & 0x7f
    }

    pub fn imm_i(self) -> i32 {
        (self.0 as i32) >> 20
    }

    pub fn imm_s(self) -> i32 {
        let imm = ((self.0 >> 25) & 0x7f) << 5 | ((self.0 >> 7) & 0x1f);
        ((imm as i32) << 20) >> 20
    }

    pub fn imm_b(self) -> i32 {
        let imm = ((self.0 >> 31) & 0x1) << 12
            | ((self.0 >> 7) & 0x1) << 11
            | ((self.0 >> 25) & 0x3f) << 5
            | ((self.0 >> 8) & 0xf) << 1;
        ((imm as i32) << 19) >> 19
    }

    pub fn imm_u(self) -> i32 {
        (self.0 & 0xffff_f000) as i32
    }

    pub fn imm_j(self) -> i32 {
        let imm = ((self.0 >> 31) & 0x1) << 20
            | ((self.0 >> 12) & 0xff) << 12
            | ((self.0 >> 20) & 0x1) << 11
            | ((self.0 >> 21) & 0x3ff) << 1;
        ((imm as i32) << 11) >> 11
    }
}

impl Packet for Inst {
    const NAME: &'static str = "instruction word";

    fn width(_cfg: &Constants) -> Result<usize> {
        Ok(INST_WIDTH)
    }

    fn decode(bits: &str, _cfg: &Constants) -> Result<Self> {
        check_width(Self::NAME, bits, INST_WIDTH)?;
        Ok(Inst(bits::extract_uint(bits, 0, INST_WIDTH)? as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_enums_carry_unknown_encodings() {
        assert_eq!(AluFunc::from(0b1001), AluFunc::Sra);
        assert_eq!(AluFunc::from(0b1111), AluFunc::Invalid(0b1111));
        assert_eq!(AluFunc::Invalid(0b1111).name(), "XXX");
        assert_eq!(BranchFunc::from(0b011), BranchFunc::Invalid(0b011));
    }

    #[test]
    fn inst_field_views() {
        // addi x1, x2, -5
        let inst = Inst(0xffb1_0093);
        assert_eq!(inst.opcode(), 0x13);
        assert_eq!(inst.rd(), 1);
        assert_eq!(inst.rs1(), 2);
        assert_eq!(inst.funct3(), 0);
        assert_eq!(inst.imm_i(), -5);
    }

    #[test]
    fn branch_immediate_assembles_and_sign_extends() {
        // beq x0, x0, -8
        let inst = Inst(0xfe00_0ce3);
        assert_eq!(inst.opcode(), 0x63);
        assert_eq!(inst.imm_b(), -8);
    }

    #[test]
    fn jal_immediate_assembles() {
        // jal x0, 2048
        let inst = Inst(0x0010_006f);
        assert_eq!(inst.imm_j(), 2048);
    }
}
