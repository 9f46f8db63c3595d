use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::error::{DecodeError, Result};

/// Ceiling log2. Zero for 0 and 1, so a one-entry structure gets a
/// zero-width index field.
pub fn clog2(x: u64) -> u64 {
    if x <= 1 {
        0
    } else {
        64 - (x - 1).leading_zeros() as u64
    }
}

// Initial store, matching the simulated core's build parameters. The
// derived entries (NUM_FU, READ_PORTS...) are pre-filled at their fixed
// point so a fresh store is consistent without a recompute.
const DEFAULTS: &[(&str, u64)] = &[
    ("AR_NUM", 32),
    ("N", 8),
    ("CDB_SZ", 8),
    ("ROB_SZ", 32),
    ("RS_SZ", 16),
    ("PHYS_REG_SZ_P6", 32),
    ("PHYS_REG_SZ_R10K", 64),
    ("PHYS_REG_TAG_WIDTH", 6),
    ("REG_IDX_WIDTH", 5),
    ("BRANCH_PRED_SZ", 3),
    ("SQ_SZ", 8),
    ("SQ_IDX_WIDTH", 4),
    ("NUM_FU_ALU", 3),
    ("NUM_FU_MULT", 2),
    ("NUM_FU_LOAD", 3),
    ("NUM_FU_STORE", 3),
    ("NUM_FU_BRANCH", 1),
    ("NUM_FU", 12),
    ("MULT_STAGES", 4),
    ("FALSE", 0),
    ("TRUE", 1),
    ("ZERO_REG", 0),
    ("NOP", 0x13),
    ("NUM_MEM_TAGS", 15),
    ("ICACHE_LINES", 32),
    ("ICACHE_LINE_BITS", 5),
    ("DCACHE_LINES", 32),
    ("DCACHE_LINE_BITS", 5),
    ("MEM_SIZE_IN_BYTES", 65536),
    ("MEM_64BIT_LINES", 8192),
    ("READ_PORTS", 24),
    ("WRITE_PORTS", 8),
    ("NUM_CHECKPOINTS", 4),
];

/// Read-only view handed to derivation closures during recompute.
pub struct CfgView<'a>(&'a IndexMap<String, u64>);

impl CfgView<'_> {
    pub fn need(&self, name: &str) -> Result<u64> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| DecodeError::missing_constant(name))
    }
}

pub type DeriveFn = Arc<dyn Fn(&CfgView) -> Result<u64> + Send + Sync>;

fn derivation(
    name: &str,
    f: impl Fn(&CfgView) -> Result<u64> + Send + Sync + 'static,
) -> (String, DeriveFn) {
    (name.to_string(), Arc::new(f))
}

fn builtin_derivations() -> Vec<(String, DeriveFn)> {
    vec![
        derivation("CDB_SZ", |c| c.need("N")),
        derivation("WRITE_PORTS", |c| c.need("N")),
        derivation("PHYS_REG_SZ_R10K", |c| Ok(32 + c.need("ROB_SZ")?)),
        derivation("PHYS_REG_TAG_WIDTH", |c| {
            Ok(clog2(c.need("PHYS_REG_SZ_R10K")?))
        }),
        derivation("NUM_FU", |c| {
            Ok(c.need("NUM_FU_ALU")?
                + c.need("NUM_FU_MULT")?
                + c.need("NUM_FU_LOAD")?
                + c.need("NUM_FU_STORE")?
                + c.need("NUM_FU_BRANCH")?)
        }),
        derivation("READ_PORTS", |c| Ok(2 * c.need("NUM_FU")?)),
        derivation("MEM_64BIT_LINES", |c| Ok(c.need("MEM_SIZE_IN_BYTES")? / 8)),
        derivation("ICACHE_LINE_BITS", |c| Ok(clog2(c.need("ICACHE_LINES")?))),
        derivation("DCACHE_LINE_BITS", |c| Ok(clog2(c.need("DCACHE_LINES")?))),
        derivation("SQ_IDX_WIDTH", |c| Ok(clog2(c.need("SQ_SZ")?) + 1)),
    ]
}

pub type SubscriberId = u64;

/// Mutable store of the hardware build constants. Widths are computed
/// against it live at decode time; decoders take it by shared reference,
/// so the borrow checker rules out mutation mid-decode. A threaded host
/// keeps one store behind its own lock and hands decoders `snapshot()`s.
pub struct Constants {
    values: IndexMap<String, u64>,
    derived: Vec<(String, DeriveFn)>,
    subscribers: Vec<(SubscriberId, Box<dyn FnMut() + Send>)>,
    next_subscriber: SubscriberId,
}

impl Default for Constants {
    fn default() -> Self {
        Self::new()
    }
}

impl Constants {
    pub fn new() -> Self {
        Constants {
            values: DEFAULTS.iter().map(|&(k, v)| (k.to_string(), v)).collect(),
            derived: builtin_derivations(),
            subscribers: Vec::new(),
            next_subscriber: 0,
        }
    }

    pub fn get(&self, name: &str) -> Result<u64> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| DecodeError::unknown_constant(name))
    }

    /// Same lookup as `get`, but failing with the width-formula error.
    pub fn need(&self, name: &str) -> Result<u64> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| DecodeError::missing_constant(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.values.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Inserts or updates a constant, then recomputes every derived
    /// constant to a fixed point. On failure the store keeps its
    /// pre-call values; there is no partial apply.
    pub fn set(&mut self, name: &str, value: u64) -> Result<()> {
        let saved = self.values.clone();
        self.values.insert(name.to_string(), value);
        if let Err(err) = recompute(&mut self.values, &self.derived) {
            self.values = saved;
            return Err(err);
        }
        debug!("constant {} set to {}", name, value);
        self.notify();
        Ok(())
    }

    /// Registers a derivation evaluated on every subsequent mutation.
    /// Registering a second derivation for the same name replaces it.
    pub fn register_derived(
        &mut self,
        name: &str,
        f: impl Fn(&CfgView) -> Result<u64> + Send + Sync + 'static,
    ) {
        self.derived.retain(|(existing, _)| existing != name);
        self.derived.push(derivation(name, f));
    }

    pub fn subscribe(&mut self, f: impl FnMut() + Send + 'static) -> SubscriberId {
        let id = self.next_subscriber;
        self.next_subscriber += 1;
        self.subscribers.push((id, Box::new(f)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.subscribers.retain(|(sub, _)| *sub != id);
    }

    /// Back to the built-in defaults and derivations. Subscribers stay.
    pub fn reset(&mut self) {
        self.values = DEFAULTS.iter().map(|&(k, v)| (k.to_string(), v)).collect();
        self.derived = builtin_derivations();
        self.notify();
    }

    /// Detached copy for another thread: same values and derivations,
    /// no subscribers.
    pub fn snapshot(&self) -> Constants {
        Constants {
            values: self.values.clone(),
            derived: self.derived.clone(),
            subscribers: Vec::new(),
            next_subscriber: 0,
        }
    }

    fn notify(&mut self) {
        for (_, f) in &mut self.subscribers {
            f();
        }
    }
}

// Full sweeps over the derivation list until nothing changes. A cycle
// never settles, so give up once the pass count exceeds what a
// dependency chain over every derivation could need.
fn recompute(values: &mut IndexMap<String, u64>, derived: &[(String, DeriveFn)]) -> Result<()> {
    let limit = derived.len() + 1;
    let mut passes = 0usize;
    loop {
        let mut changed = false;
        for (name, f) in derived {
            let next = f(&CfgView(values))?;
            if values.get(name.as_str()) != Some(&next) {
                values.insert(name.clone(), next);
                changed = true;
            }
        }
        passes += 1;
        if !changed {
            trace!("constants converged after {} passes", passes);
            return Ok(());
        }
        if passes > limit {
            return Err(DecodeError::DependencyCycle { passes });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn clog2_values() {
        assert_eq!(clog2(0), 0);
        assert_eq!(clog2(1), 0);
        assert_eq!(clog2(2), 1);
        assert_eq!(clog2(5), 3);
        assert_eq!(clog2(32), 5);
        assert_eq!(clog2(33), 6);
    }

    #[test]
    fn defaults_are_consistent() {
        let cfg = Constants::new();
        assert_eq!(cfg.get("NUM_FU").unwrap(), 12);
        assert_eq!(cfg.get("READ_PORTS").unwrap(), 24);
        assert_eq!(cfg.get("PHYS_REG_TAG_WIDTH").unwrap(), 6);
        assert_eq!(cfg.get("SQ_IDX_WIDTH").unwrap(), 4);
    }

    #[test]
    fn rob_resize_ripples_to_tag_width() {
        let mut cfg = Constants::new();
        cfg.set("ROB_SZ", 96).unwrap();
        assert_eq!(cfg.get("PHYS_REG_SZ_R10K").unwrap(), 128);
        assert_eq!(cfg.get("PHYS_REG_TAG_WIDTH").unwrap(), 7);
    }

    #[test]
    fn unknown_name_is_an_error() {
        let cfg = Constants::new();
        assert_eq!(
            cfg.get("NOT_A_CONSTANT"),
            Err(DecodeError::unknown_constant("NOT_A_CONSTANT"))
        );
        assert_eq!(
            cfg.need("NOT_A_CONSTANT"),
            Err(DecodeError::missing_constant("NOT_A_CONSTANT"))
        );
    }

    #[test]
    fn derivation_with_missing_input_rolls_back() {
        let mut cfg = Constants::new();
        cfg.register_derived("BROKEN", |c| c.need("NO_SUCH_INPUT"));
        let before = cfg.get("NUM_FU").unwrap();
        assert_eq!(
            cfg.set("N", 4),
            Err(DecodeError::missing_constant("NO_SUCH_INPUT"))
        );
        assert_eq!(cfg.get("N").unwrap(), 8);
        assert_eq!(cfg.get("NUM_FU").unwrap(), before);
    }

    #[test]
    fn subscribers_fire_per_successful_set() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let mut cfg = Constants::new();
        let id = cfg.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        cfg.set("N", 4).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        cfg.unsubscribe(id);
        cfg.set("N", 2).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
