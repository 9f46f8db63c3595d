//! Schema widths computed live from the constant store.

use pipescope::constants::Constants;
use pipescope::error::DecodeError;
use pipescope::packets::branch::Checkpoint;
use pipescope::packets::cache::{DcacheTag, IcacheTag, MemBlock, MshrEntry};
use pipescope::packets::fu::{BranchResolve, FuData};
use pipescope::packets::lsq::{LoadFwdReq, LoadFwdResult, SqEntry, SqRetire, StoreComplete};
use pipescope::packets::pipeline::{Commit, ExMem, IdEx, IfId, MemWb};
use pipescope::packets::rename::{Frizzy, RenameReq, RenameResp};
use pipescope::packets::rob::RobEntry;
use pipescope::packets::rs::{RsEntry, RsIssue};
use pipescope::packets::Packet;

/// Tests every schema width under the default build parameters.
#[test]
fn test_default_widths() {
    let cfg = Constants::new();
    assert_eq!(IfId::width(&cfg).unwrap(), 97);
    assert_eq!(IdEx::width(&cfg).unwrap(), 184);
    assert_eq!(ExMem::width(&cfg).unwrap(), 111);
    assert_eq!(MemWb::width(&cfg).unwrap(), 73);
    assert_eq!(Commit::width(&cfg).unwrap(), 72);
    assert_eq!(RobEntry::width(&cfg).unwrap(), 203);
    assert_eq!(RsEntry::width(&cfg).unwrap(), 250);
    assert_eq!(RsIssue::width(&cfg).unwrap(), 245);
    assert_eq!(FuData::width(&cfg).unwrap(), 84);
    assert_eq!(BranchResolve::width(&cfg).unwrap(), 38);
    assert_eq!(RenameReq::width(&cfg).unwrap(), 15);
    assert_eq!(RenameResp::width(&cfg).unwrap(), 26);
    assert_eq!(Frizzy::width(&cfg).unwrap(), 128);
    assert_eq!(Checkpoint::width(&cfg).unwrap(), 361);
    assert_eq!(SqEntry::width(&cfg).unwrap(), 75);
    assert_eq!(StoreComplete::width(&cfg).unwrap(), 69);
    assert_eq!(SqRetire::width(&cfg).unwrap(), 65);
    assert_eq!(LoadFwdReq::width(&cfg).unwrap(), 40);
    assert_eq!(LoadFwdResult::width(&cfg).unwrap(), 34);
    assert_eq!(IcacheTag::width(&cfg).unwrap(), 9);
    assert_eq!(DcacheTag::width(&cfg).unwrap(), 9);
    assert_eq!(MemBlock::width(&cfg).unwrap(), 64);
    assert_eq!(MshrEntry::width(&cfg).unwrap(), 103);
}

/// Tests that widths follow the store: growing the ROB widens the
/// physical register file, which widens every tag-carrying schema.
#[test]
fn test_widths_track_the_store() {
    let mut cfg = Constants::new();
    cfg.set("ROB_SZ", 96).unwrap();
    assert_eq!(cfg.get("PHYS_REG_SZ_R10K").unwrap(), 128);
    assert_eq!(cfg.get("PHYS_REG_TAG_WIDTH").unwrap(), 7);

    assert_eq!(RobEntry::width(&cfg).unwrap(), 205);
    assert_eq!(RsEntry::width(&cfg).unwrap(), 253);
    assert_eq!(RsIssue::width(&cfg).unwrap(), 248);
    assert_eq!(FuData::width(&cfg).unwrap(), 85);
    assert_eq!(RenameResp::width(&cfg).unwrap(), 30);
    assert_eq!(Frizzy::width(&cfg).unwrap(), 256);
    assert_eq!(Checkpoint::width(&cfg).unwrap(), 522);
    // no tag fields, unchanged
    assert_eq!(IdEx::width(&cfg).unwrap(), 184);
}

/// Tests the functional-unit sum cascade: per-type counts feed NUM_FU,
/// which feeds the register file port count, in one `set` call.
#[test]
fn test_fu_count_cascade() {
    let mut cfg = Constants::new();
    cfg.set("NUM_FU_ALU", 2).unwrap();
    cfg.set("NUM_FU_MULT", 1).unwrap();
    cfg.set("NUM_FU_LOAD", 0).unwrap();
    cfg.set("NUM_FU_STORE", 0).unwrap();
    cfg.set("NUM_FU_BRANCH", 1).unwrap();
    assert_eq!(cfg.get("NUM_FU").unwrap(), 4);
    assert_eq!(cfg.get("READ_PORTS").unwrap(), 8);

    cfg.set("NUM_FU_LOAD", 3).unwrap();
    assert_eq!(cfg.get("NUM_FU").unwrap(), 7);
    assert_eq!(cfg.get("READ_PORTS").unwrap(), 14);
}

/// Tests that a derivation cycle fails the whole `set` and leaves the
/// store exactly as it was before the call.
#[test]
fn test_dependency_cycle_rolls_back() {
    let mut cfg = Constants::new();
    cfg.set("CYC_A", 0).unwrap();
    cfg.set("CYC_B", 0).unwrap();
    cfg.register_derived("CYC_A", |c| Ok(c.need("CYC_B")? + 1));
    cfg.register_derived("CYC_B", |c| Ok(c.need("CYC_A")? + 1));

    let err = cfg.set("N", 4).unwrap_err();
    assert!(matches!(err, DecodeError::DependencyCycle { .. }));
    assert_eq!(cfg.get("N").unwrap(), 8);
    assert_eq!(cfg.get("CYC_A").unwrap(), 0);
    assert_eq!(cfg.get("CYC_B").unwrap(), 0);
    assert_eq!(cfg.get("CDB_SZ").unwrap(), 8);
}

/// Tests that snapshots are detached copies and reset restores the
/// defaults.
#[test]
fn test_snapshot_and_reset() {
    let mut cfg = Constants::new();
    cfg.set("ROB_SZ", 64).unwrap();
    let frozen = cfg.snapshot();

    cfg.set("ROB_SZ", 16).unwrap();
    assert_eq!(frozen.get("ROB_SZ").unwrap(), 64);
    assert_eq!(frozen.get("PHYS_REG_SZ_R10K").unwrap(), 96);
    assert_eq!(cfg.get("PHYS_REG_SZ_R10K").unwrap(), 48);

    cfg.reset();
    assert_eq!(cfg.get("ROB_SZ").unwrap(), 32);
    assert_eq!(cfg.get("PHYS_REG_TAG_WIDTH").unwrap(), 6);
}

/// Tests that a width formula over a constant nobody defined fails with
/// the missing-constant error instead of guessing.
#[test]
fn test_missing_constant_fails_width() {
    let cfg = Constants::new();
    assert_eq!(
        cfg.need("IMAGINARY_WIDTH").unwrap_err(),
        DecodeError::MissingConstant {
            name: "IMAGINARY_WIDTH".to_string()
        }
    );
}
