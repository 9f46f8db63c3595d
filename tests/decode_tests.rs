//! Packet decoding from flat MSB-first bit-strings.

use pipescope::constants::Constants;
use pipescope::error::DecodeError;
use pipescope::packets::branch::decode_predictor_states;
use pipescope::packets::fu::decode_load_states;
use pipescope::packets::isa::{FuType, Inst, LoadState, PredictorState};
use pipescope::packets::pipeline::IdEx;
use pipescope::packets::rename::Frizzy;
use pipescope::packets::rob::RobEntry;
use pipescope::packets::rs::RsEntry;
use pipescope::packets::{decode_array, decode_list, decode_uint_list, Packet};

fn bitstr(value: u64, width: usize) -> String {
    format!("{:0width$b}", value, width = width)
}

/// ROB entry header followed by an all-zero embedded instruction packet.
/// Widths assume the default constants: 6-bit tags, 184-bit ID/EX.
fn rob_entry_bits(t_old: u64, t_new: u64, r_dest: u64, valid: bool, retireable: bool) -> String {
    format!(
        "{}{}{}{}{}{}",
        bitstr(t_old, 6),
        bitstr(t_new, 6),
        bitstr(r_dest, 5),
        if valid { '1' } else { '0' },
        if retireable { '1' } else { '0' },
        "0".repeat(184),
    )
}

/// Tests that array entries come back index 0 first even though the
/// wire stores entry 0 in the last slice.
#[test]
fn test_array_order_is_reversed_from_the_wire() {
    let cfg = Constants::new();
    let zero = rob_entry_bits(0, 0, 0, false, false);
    let oldest = rob_entry_bits(11, 45, 5, true, true);
    let youngest = rob_entry_bits(0, 7, 0, true, false);
    // wire order: entry 3 first, entry 0 last
    let bits = format!("{}{}{}{}", youngest, zero, zero, oldest);

    let entries: Vec<RobEntry> = decode_array(&bits, 4, &cfg).unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0].t_old, 11);
    assert_eq!(entries[0].t_new, 45);
    assert_eq!(entries[0].r_dest, 5);
    assert!(entries[0].valid && entries[0].retireable);
    assert!(!entries[1].valid && !entries[2].valid);
    assert_eq!(entries[3].t_new, 7);
    assert!(entries[3].valid && !entries[3].retireable);
}

/// Tests a nested instruction packet decoded from inside a ROB entry.
#[test]
fn test_nested_packet_decodes_in_place() {
    let cfg = Constants::new();
    // addi x1, x2, -5
    let inst: u32 = 0xffb1_0093;
    let idex = format!(
        "{}{}{}{}{}{}{}{}{}{}",
        bitstr(inst as u64, 32),
        bitstr(0x8000_0000, 32),
        bitstr(0x8000_0004, 32),
        bitstr(0, 32),
        bitstr(0, 32),
        bitstr(0, 2),
        bitstr(0, 4),
        bitstr(1, 5),
        bitstr(0, 4),
        "000000001",
    );
    let bits = format!("{}{}{}10{}", bitstr(1, 6), bitstr(2, 6), bitstr(1, 5), idex);

    let entry = RobEntry::decode(&bits, &cfg).unwrap();
    assert_eq!(entry.t_old, 1);
    assert_eq!(entry.t_new, 2);
    assert!(entry.valid && !entry.retireable);
    assert_eq!(entry.packet.inst, Inst(inst));
    assert_eq!(entry.packet.inst.imm_i(), -5);
    assert_eq!(entry.packet.pc, 0x8000_0000);
    assert_eq!(entry.packet.dest_reg_idx, 1);
    assert!(entry.packet.valid);
}

/// Tests that an input whose length disagrees with the schema is a
/// structural error, both too long and too short.
#[test]
fn test_length_mismatch_is_structural() {
    let cfg = Constants::new();
    assert_eq!(
        RobEntry::decode(&"0".repeat(204), &cfg).unwrap_err(),
        DecodeError::WidthMismatch {
            what: "ROB entry",
            expected: 203,
            got: 204,
        }
    );
    assert_eq!(
        RobEntry::decode(&"0".repeat(202), &cfg).unwrap_err(),
        DecodeError::WidthMismatch {
            what: "ROB entry",
            expected: 203,
            got: 202,
        }
    );
}

/// Tests that a list whose length is not a whole number of entries is
/// rejected instead of truncated.
#[test]
fn test_ragged_list_is_rejected() {
    let cfg = Constants::new();
    let err = decode_list::<RobEntry>(&"0".repeat(205), &cfg).unwrap_err();
    assert_eq!(
        err,
        DecodeError::RaggedArray {
            what: "ROB entry",
            entry: 203,
            got: 205,
        }
    );
}

/// Tests that an array slice cutting into a multi-byte character
/// reports the character as a bad bit instead of panicking.
#[test]
fn test_wide_char_in_array_is_an_invalid_bit() {
    let cfg = Constants::new();
    let bits = format!("{}Σ{}", "0".repeat(31), "0".repeat(31));
    let err = decode_array::<Inst>(&bits, 2, &cfg).unwrap_err();
    assert_eq!(
        err,
        DecodeError::InvalidBit {
            found: 'Σ',
            offset: 31,
        }
    );
}

/// Tests mask fields landing LSB-first: wire bit 0 is the last
/// character, vector index 0.
#[test]
fn test_masks_are_read_lsb_first() {
    let cfg = Constants::new();
    let ready = format!("{}1", "0".repeat(63));
    let free = format!("{}10", "0".repeat(62));
    let frizzy = Frizzy::decode(&format!("{}{}", ready, free), &cfg).unwrap();

    assert!(frizzy.ready[0]);
    assert!(!frizzy.ready[1]);
    assert!(frizzy.ready[1..].iter().all(|&b| !b));
    assert!(frizzy.free[1]);
    assert!(!frizzy.free[0]);
}

/// Tests the pattern history table read: two-bit counters, entry 0 from
/// the last slice.
#[test]
fn test_predictor_states_come_from_the_tail() {
    let pht = decode_predictor_states("0111").unwrap();
    assert_eq!(pht, vec![PredictorState::St, PredictorState::Wnt]);
    assert!(pht[0].predicts_taken());
    assert!(!pht[1].predicts_taken());
}

/// Tests the per-load-unit state read, same reversed layout.
#[test]
fn test_load_states_come_from_the_tail() {
    let states = decode_load_states("0111").unwrap();
    assert_eq!(states, vec![LoadState::Done, LoadState::Fwd]);
}

/// Tests reversed plain-integer arrays, the CDB tag layout.
#[test]
fn test_uint_list_is_reversed() {
    let tags = decode_uint_list("CDB tags", "000001000010", 6).unwrap();
    assert_eq!(tags, vec![2, 1]);
}

/// Tests that an unoccupied reservation station slot with garbage in
/// its kind field still decodes, rendering the function as unknown.
#[test]
fn test_unoccupied_entry_tolerates_garbage() {
    let cfg = Constants::new();
    let mut bits = String::from("0");
    bits.push_str("111");
    bits.push_str("1111");
    bits.push_str(&"0".repeat(RsEntry::width(&cfg).unwrap() - 8));

    let entry = RsEntry::decode(&bits, &cfg).unwrap();
    assert_eq!(entry.fu, FuType::Invalid(7));
    assert_eq!(entry.func_name(), "XXX");
    assert!(!entry.ready());
}

/// Tests that decoding is pure: same input and store give identical
/// records and the store is untouched.
#[test]
fn test_decode_is_pure() {
    let cfg = Constants::new();
    let bits = rob_entry_bits(3, 4, 5, true, false);
    let first = RobEntry::decode(&bits, &cfg).unwrap();
    let second = RobEntry::decode(&bits, &cfg).unwrap();
    assert_eq!(first, second);
    assert_eq!(cfg.get("PHYS_REG_TAG_WIDTH").unwrap(), 6);
    assert_eq!(IdEx::width(&cfg).unwrap(), 184);
}
