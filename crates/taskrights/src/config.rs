//! Configuration for [`Rights`](crate::Rights).

use std::collections::HashMap;

use taskrights_core::ResourceKind;
use taskrights_perms::{CapabilityPolicy, EvaluatorConfig, GateConfig, DEFAULT_MAX_HIERARCHY_DEPTH};

/// Configuration for the rights facade.
#[derive(Debug, Clone)]
pub struct RightsConfig {
    /// Parent hops one evaluation may take before failing closed.
    pub max_hierarchy_depth: usize,

    /// Entries per page in share listings.
    pub page_size: usize,

    /// Replacements for the built-in per-kind policy.
    pub policy_overrides: HashMap<ResourceKind, CapabilityPolicy>,
}

impl Default for RightsConfig {
    fn default() -> Self {
        Self {
            max_hierarchy_depth: DEFAULT_MAX_HIERARCHY_DEPTH,
            page_size: 50,
            policy_overrides: HashMap::new(),
        }
    }
}

impl RightsConfig {
    /// The part of the configuration the gate needs.
    pub fn gate(&self) -> GateConfig {
        GateConfig {
            evaluator: EvaluatorConfig {
                max_hierarchy_depth: self.max_hierarchy_depth,
            },
            policy_overrides: self.policy_overrides.clone(),
        }
    }
}
