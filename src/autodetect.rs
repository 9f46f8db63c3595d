use log::{debug, warn};

use crate::constants::Constants;
use crate::error::Result;
use crate::packets::fu::FuData;
use crate::packets::lsq::SqEntry;
use crate::packets::{tag_width, Packet};
use crate::report::Layout;
use crate::signal::Scope;

/// Recovers structural sizes from signal lengths before the first real
/// decode, so a dump from a differently-sized core decodes without a
/// hand-written config. Order matters: the store queue size is measured
/// before the FU lists, whose entry width depends on it.
pub fn autodetect(root: &Scope, layout: &Layout, cfg: &mut Constants) -> Result<()> {
    detect_cdb_lanes(root, layout, cfg)?;
    detect_sq_size(root, layout, cfg)?;
    detect_fu_counts(root, layout, cfg)?;
    detect_bhr_size(root, layout, cfg)?;
    Ok(())
}

fn count_entries(what: &str, len: usize, width: usize) -> Option<u64> {
    if width == 0 || len % width != 0 {
        warn!(
            "autodetect: {} is {} bits, not a multiple of the {}-bit entry width",
            what, len, width
        );
        return None;
    }
    Some((len / width) as u64)
}

fn detect_cdb_lanes(root: &Scope, layout: &Layout, cfg: &mut Constants) -> Result<()> {
    let scope = match root.scope_at(&layout.rs) {
        Ok(scope) => scope,
        Err(err) => {
            warn!("autodetect: skipping CDB width: {}", err);
            return Ok(());
        }
    };
    let len = scope.signal("early_cdb")?.bits().len();
    if let Some(n) = count_entries("early_cdb", len, tag_width(cfg)?) {
        debug!("detected N = {} CDB lanes", n);
        cfg.set("N", n)?;
    }
    Ok(())
}

fn detect_sq_size(root: &Scope, layout: &Layout, cfg: &mut Constants) -> Result<()> {
    let scope = match root.scope_at(&layout.sq) {
        Ok(scope) => scope,
        Err(err) => {
            warn!("autodetect: skipping store queue size: {}", err);
            return Ok(());
        }
    };
    let len = scope.signal("entries")?.bits().len();
    if let Some(sq_sz) = count_entries("sq entries", len, SqEntry::width(cfg)?) {
        debug!("detected SQ_SZ = {}", sq_sz);
        cfg.set("SQ_SZ", sq_sz)?;
    }
    Ok(())
}

const FU_COUNTS: &[(&str, &str)] = &[
    ("alu_data", "NUM_FU_ALU"),
    ("mult_data", "NUM_FU_MULT"),
    ("load_data", "NUM_FU_LOAD"),
    ("store_data", "NUM_FU_STORE"),
    ("branch_data", "NUM_FU_BRANCH"),
];

fn detect_fu_counts(root: &Scope, layout: &Layout, cfg: &mut Constants) -> Result<()> {
    let scope = match root.scope_at(&layout.fu) {
        Ok(scope) => scope,
        Err(err) => {
            warn!("autodetect: skipping FU counts: {}", err);
            return Ok(());
        }
    };
    for &(signal, constant) in FU_COUNTS {
        let len = scope.signal(signal)?.bits().len();
        if let Some(count) = count_entries(signal, len, FuData::width(cfg)?) {
            debug!("detected {} = {}", constant, count);
            cfg.set(constant, count)?;
        }
    }
    Ok(())
}

fn detect_bhr_size(root: &Scope, layout: &Layout, cfg: &mut Constants) -> Result<()> {
    let scope = match root.scope_at(&layout.branch_pred) {
        Ok(scope) => scope,
        Err(err) => {
            warn!("autodetect: skipping branch history size: {}", err);
            return Ok(());
        }
    };
    let len = scope.signal("bhr")?.bits().len();
    if len == 0 {
        warn!("autodetect: empty bhr value, keeping BRANCH_PRED_SZ");
        return Ok(());
    }
    debug!("detected BRANCH_PRED_SZ = {}", len);
    cfg.set("BRANCH_PRED_SZ", len as u64)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalNode;

    fn leaf(name: &str, bits: &str) -> String {
        format!(
            r#""{}": {{"name": "{}", "type": {{"sigType": "logic", "width": {}}}, "value": "b{}"}}"#,
            name,
            name,
            bits.len(),
            bits
        )
    }

    fn scope(name: &str, body: &str) -> String {
        format!(r#""{}": {{"name": "{}", "children": {{{}}}}}"#, name, name, body)
    }

    fn short_layout() -> Layout {
        Layout {
            rs: "rs".to_string(),
            sq: "sq".to_string(),
            fu: "fu".to_string(),
            branch_pred: "bp".to_string(),
            ..Layout::default()
        }
    }

    #[test]
    fn detects_sizes_from_signal_lengths() {
        let mut cfg = Constants::new();
        // defaults: tag width 6, SqEntry 75 bits. after SQ_SZ drops to 2
        // the index width is 2, making FuData 82 bits.
        let json = format!(
            r#"{{"name": "root", "children": {{{}, {}, {}, {}}}}}"#,
            scope("rs", &leaf("early_cdb", &"0".repeat(12))),
            scope("sq", &leaf("entries", &"0".repeat(150))),
            scope("fu", &leaf("alu_data", &"0".repeat(164))),
            scope("bp", &leaf("bhr", "0101")),
        );
        let node: SignalNode = serde_json::from_str(&json).unwrap();
        let root = match node {
            SignalNode::Scope(s) => s,
            _ => panic!("expected scope"),
        };

        let layout = short_layout();
        detect_cdb_lanes(&root, &layout, &mut cfg).unwrap();
        detect_sq_size(&root, &layout, &mut cfg).unwrap();
        assert_eq!(cfg.get("N").unwrap(), 2);
        assert_eq!(cfg.get("SQ_SZ").unwrap(), 2);
        assert_eq!(cfg.get("SQ_IDX_WIDTH").unwrap(), 2);

        detect_fu_counts(&root, &layout, &mut cfg).unwrap();
        assert_eq!(cfg.get("NUM_FU_ALU").unwrap(), 2);

        detect_bhr_size(&root, &layout, &mut cfg).unwrap();
        assert_eq!(cfg.get("BRANCH_PRED_SZ").unwrap(), 4);
    }

    #[test]
    fn missing_scopes_keep_defaults() {
        let mut cfg = Constants::new();
        let json = r#"{"name": "root", "children": {}}"#;
        let node: SignalNode = serde_json::from_str(json).unwrap();
        let root = match node {
            SignalNode::Scope(s) => s,
            _ => panic!("expected scope"),
        };
        autodetect(&root, &short_layout(), &mut cfg).unwrap();
        assert_eq!(cfg.get("N").unwrap(), 8);
        assert_eq!(cfg.get("SQ_SZ").unwrap(), 8);
    }
}
