use indexmap::IndexMap;
use serde::Deserialize;

use crate::bits;
use crate::error::{DecodeError, Result};

/// One node of the captured signal hierarchy: either a named scope with
/// ordered children, or a value-carrying leaf.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignalNode {
    Leaf(Signal),
    Scope(Scope),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Signal {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: SignalType,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalType {
    #[serde(rename = "sigType")]
    pub sig_type: String,
    pub width: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scope {
    #[serde(default)]
    pub name: String,
    pub children: IndexMap<String, SignalNode>,
}

/// Per-cycle capture as produced upstream: a cycle label and the signal
/// tree rooted at the testbench.
#[derive(Debug, Clone, Deserialize)]
pub struct CycleSnapshot {
    #[serde(default)]
    pub cycle: Option<String>,
    pub signals: SignalNode,
}

impl CycleSnapshot {
    /// Parses a snapshot file. A bare scope object (no `signals`
    /// wrapper) is accepted too.
    pub fn parse(json: &str) -> serde_json::Result<Self> {
        match serde_json::from_str::<CycleSnapshot>(json) {
            Ok(snapshot) => Ok(snapshot),
            Err(_) => Ok(CycleSnapshot {
                cycle: None,
                signals: serde_json::from_str::<SignalNode>(json)?,
            }),
        }
    }

    pub fn root(&self) -> Result<&Scope> {
        self.signals.as_scope().ok_or(DecodeError::ExpectedScope {
            path: String::new(),
        })
    }
}

impl SignalNode {
    pub fn as_scope(&self) -> Option<&Scope> {
        match self {
            SignalNode::Scope(scope) => Some(scope),
            SignalNode::Leaf(_) => None,
        }
    }

    pub fn as_signal(&self) -> Option<&Signal> {
        match self {
            SignalNode::Leaf(signal) => Some(signal),
            SignalNode::Scope(_) => None,
        }
    }
}

impl Signal {
    /// Value with the capture marker stripped, ready for slicing.
    pub fn bits(&self) -> &str {
        bits::strip_marker(&self.value)
    }

    /// Scalar read: binary when the `b` marker is present, decimal
    /// otherwise.
    pub fn to_u64(&self) -> Result<u64> {
        match self.value.strip_prefix('b') {
            Some(stripped) => bits::extract_uint(stripped, 0, stripped.len()),
            None => self.value.parse::<u64>().map_err(|_| DecodeError::InvalidBit {
                found: self.value.chars().next().unwrap_or(' '),
                offset: 0,
            }),
        }
    }

    pub fn to_bool(&self) -> Result<bool> {
        Ok(self.to_u64()? != 0)
    }
}

impl Scope {
    pub fn child(&self, name: &str) -> Result<&SignalNode> {
        self.children
            .get(name)
            .ok_or_else(|| DecodeError::signal_not_found(name))
    }

    pub fn signal(&self, name: &str) -> Result<&Signal> {
        self.child(name)?
            .as_signal()
            .ok_or_else(|| DecodeError::ExpectedLeaf {
                path: name.to_string(),
            })
    }

    pub fn scope(&self, name: &str) -> Result<&Scope> {
        self.child(name)?
            .as_scope()
            .ok_or_else(|| DecodeError::ExpectedScope {
                path: name.to_string(),
            })
    }

    /// Walks a dotted path. Errors carry the prefix that failed.
    pub fn lookup(&self, path: &str) -> Result<&SignalNode> {
        let parts: Vec<&str> = path.split('.').collect();
        let mut scope = self;
        for (i, name) in parts.iter().enumerate() {
            let node = scope
                .children
                .get(*name)
                .ok_or_else(|| DecodeError::SignalNotFound {
                    path: parts[..=i].join("."),
                })?;
            if i + 1 == parts.len() {
                return Ok(node);
            }
            scope = node.as_scope().ok_or_else(|| DecodeError::ExpectedScope {
                path: parts[..=i].join("."),
            })?;
        }
        Err(DecodeError::signal_not_found(path))
    }

    pub fn scope_at(&self, path: &str) -> Result<&Scope> {
        self.lookup(path)?
            .as_scope()
            .ok_or_else(|| DecodeError::ExpectedScope {
                path: path.to_string(),
            })
    }

    pub fn signal_at(&self, path: &str) -> Result<&Signal> {
        self.lookup(path)?
            .as_signal()
            .ok_or_else(|| DecodeError::ExpectedLeaf {
                path: path.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREE: &str = r#"{
        "name": "testbench",
        "children": {
            "clock": {
                "name": "clock",
                "type": { "sigType": "reg", "width": 1 },
                "value": "b1"
            },
            "core": {
                "name": "core",
                "children": {
                    "rob_head": {
                        "name": "rob_head",
                        "type": { "sigType": "wire", "width": 5 },
                        "value": "b00110"
                    },
                    "cycle_count": {
                        "name": "cycle_count",
                        "type": { "sigType": "integer", "width": 32 },
                        "value": "42"
                    }
                }
            }
        }
    }"#;

    fn tree() -> Scope {
        match serde_json::from_str::<SignalNode>(TREE).unwrap() {
            SignalNode::Scope(scope) => scope,
            SignalNode::Leaf(_) => panic!("root should be a scope"),
        }
    }

    #[test]
    fn leaves_and_scopes_deserialize() {
        let root = tree();
        assert!(root.signal("clock").unwrap().to_bool().unwrap());
        assert_eq!(root.scope("core").unwrap().children.len(), 2);
    }

    #[test]
    fn dotted_lookup_reads_values() {
        let root = tree();
        assert_eq!(root.signal_at("core.rob_head").unwrap().to_u64().unwrap(), 6);
        assert_eq!(
            root.signal_at("core.cycle_count").unwrap().to_u64().unwrap(),
            42
        );
    }

    #[test]
    fn lookup_failure_names_the_failing_prefix() {
        let root = tree();
        assert_eq!(
            root.lookup("core.nope.deeper").unwrap_err(),
            DecodeError::SignalNotFound {
                path: "core.nope".to_string()
            }
        );
        assert_eq!(
            root.lookup("clock.below").unwrap_err(),
            DecodeError::ExpectedScope {
                path: "clock".to_string()
            }
        );
    }
}
