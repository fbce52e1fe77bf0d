// SPDX-License-Identifier: MIT OR Apache-2.0
//! Builtin node library.
//!
//! Ships the standard constant and math nodes and a pre-populated registry
//! for embeddings that do not need custom node sets.

pub mod constants;
pub mod math;

use crate::registry::{NodeRegistry, RegistryError};

/// Create a registry pre-populated with every builtin node type
pub fn standard_registry() -> Result<NodeRegistry, RegistryError> {
    let mut registry = NodeRegistry::new();
    constants::register(&mut registry)?;
    math::register(&mut registry)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_contents() {
        let registry = standard_registry().unwrap();
        assert!(registry.contains(constants::FLOAT));
        assert!(registry.contains(math::ADD));
        assert!(registry.contains(math::LERP));
        assert!(!registry.contains("no_such_node"));
    }
}
