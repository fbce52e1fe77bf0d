// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link (edge) bookkeeping for the graph.
//!
//! The authoritative wiring lives in the ports themselves; the graph's flat
//! link list exists for enumeration and serialization.

use crate::port::PortId;
use serde::{Deserialize, Serialize};

/// A wired input/output pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// The receiving input port
    pub input: PortId,
    /// The feeding output port
    pub output: PortId,
}

impl Link {
    /// Create a link record
    pub fn new(input: PortId, output: PortId) -> Self {
        Self { input, output }
    }

    /// Check if this link involves a specific port
    pub fn involves_port(&self, port: PortId) -> bool {
        self.input == port || self.output == port
    }
}
