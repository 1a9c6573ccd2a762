//! Port resolution.
//!
//! Ports are never stored. They are derived from a node's configuration
//! every time they are needed, and edges refer to them by id. Port ids are
//! taken verbatim from the configuration entry that produced them (case id,
//! label, slot id), so editing one entry never renames the ports of the
//! others.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::config::{
    CategorisationConfig, ConditionalSwitchConfig, NodeConfig, ReconciliationConfig,
};

/// Id of the single unnamed port most node types expose.
pub const DEFAULT_PORT: &str = "default";

/// Id of the `true` branch of a two-way conditional.
pub const TRUE_PORT: &str = "true";

/// Id of the `false` branch of a two-way conditional.
pub const FALSE_PORT: &str = "false";

/// Id of the catch-all branch of a switch.
pub const FALLBACK_PORT: &str = "fallback";

/// A named attachment point on a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Port {
    /// Identifier referenced by edges.
    pub id: String,
    /// Display label; empty for the unnamed default port.
    pub label: String,
}

impl Port {
    /// Creates a port with the given id and label.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    /// Creates the unnamed default port.
    pub fn unnamed() -> Self {
        Self::new(DEFAULT_PORT, "")
    }

    /// Returns whether this is the unnamed default port.
    pub fn is_unnamed(&self) -> bool {
        self.id == DEFAULT_PORT
    }
}

/// Which side of an edge a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PortRole {
    /// An output port; edges leave from it.
    Source,
    /// An input port; edges arrive at it.
    Target,
}

impl PortRole {
    /// Returns the role on the other end of an edge.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Source => Self::Target,
            Self::Target => Self::Source,
        }
    }
}

/// Ordered input and output ports of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePorts {
    /// Input ports in display order.
    pub inputs: Vec<Port>,
    /// Output ports in display order.
    pub outputs: Vec<Port>,
}

impl NodePorts {
    /// Returns the input port with the given id.
    pub fn input(&self, id: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.id == id)
    }

    /// Returns the output port with the given id.
    pub fn output(&self, id: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.id == id)
    }

    /// Returns the ports on the given side.
    pub fn side(&self, role: PortRole) -> &[Port] {
        match role {
            PortRole::Source => &self.outputs,
            PortRole::Target => &self.inputs,
        }
    }

    /// Returns the first port on the given side, used when auto-wiring.
    pub fn default_port(&self, role: PortRole) -> Option<&Port> {
        self.side(role).first()
    }

    /// Returns the input port ids in order.
    pub fn input_ids(&self) -> Vec<&str> {
        self.inputs.iter().map(|p| p.id.as_str()).collect()
    }

    /// Returns the output port ids in order.
    pub fn output_ids(&self) -> Vec<&str> {
        self.outputs.iter().map(|p| p.id.as_str()).collect()
    }
}

/// Derives a node's ports from its configuration.
///
/// Pure and deterministic: equal configurations always produce equal,
/// identically ordered port lists.
pub fn resolve_ports(config: &NodeConfig) -> NodePorts {
    match config {
        NodeConfig::ConditionalIf(_) => NodePorts {
            inputs: vec![Port::unnamed()],
            outputs: vec![Port::new(TRUE_PORT, "True"), Port::new(FALSE_PORT, "False")],
        },
        NodeConfig::ConditionalSwitch(switch) => NodePorts {
            inputs: vec![Port::unnamed()],
            outputs: switch_outputs(switch),
        },
        NodeConfig::Categorisation(categorisation) => NodePorts {
            inputs: vec![Port::unnamed()],
            outputs: categorisation_outputs(categorisation),
        },
        NodeConfig::Reconciliation(reconciliation) => {
            let slots = reconciliation_slots(reconciliation);
            NodePorts {
                inputs: slots.clone(),
                outputs: slots,
            }
        }
        NodeConfig::ManualUpload(_)
        | NodeConfig::Webhook(_)
        | NodeConfig::Splitting(_)
        | NodeConfig::SetValue(_)
        | NodeConfig::Extractor(_)
        | NodeConfig::DataMapper(_)
        | NodeConfig::DocumentFolder(_)
        | NodeConfig::HttpOutput(_) => NodePorts {
            inputs: vec![Port::unnamed()],
            outputs: vec![Port::unnamed()],
        },
    }
}

fn switch_outputs(config: &ConditionalSwitchConfig) -> Vec<Port> {
    let mut seen = HashSet::new();
    let mut outputs: Vec<Port> = config
        .cases
        .iter()
        .filter(|case| case.id != FALLBACK_PORT && seen.insert(case.id.as_str()))
        .map(|case| {
            let label = case.label.clone().unwrap_or_else(|| case.id.clone());
            Port::new(case.id.clone(), label)
        })
        .collect();

    outputs.push(Port::new(FALLBACK_PORT, "Fallback"));
    outputs
}

fn categorisation_outputs(config: &CategorisationConfig) -> Vec<Port> {
    if !config.is_configured() {
        return vec![Port::unnamed()];
    }

    let mut seen = HashSet::new();
    config
        .labels
        .iter()
        .filter(|label| seen.insert(label.as_str()))
        .map(|label| Port::new(label.clone(), label.clone()))
        .collect()
}

fn reconciliation_slots(config: &ReconciliationConfig) -> Vec<Port> {
    if config.slots.is_empty() {
        return vec![Port::unnamed()];
    }

    let mut seen = HashSet::new();
    config
        .slots
        .iter()
        .filter(|slot| seen.insert(slot.id.as_str()))
        .map(|slot| {
            let label = slot.label.clone().unwrap_or_else(|| slot.id.clone());
            Port::new(slot.id.clone(), label)
        })
        .collect()
}
