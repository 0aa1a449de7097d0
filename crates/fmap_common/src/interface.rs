//! Interface-type tags for component sub-interfaces ("cores").

use serde::{Deserialize, Serialize};

/// How a component sub-interface faces the rest of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceKind {
    /// Talks only to other components of the design.
    #[default]
    Internal,
    /// Receives data from outside the design (a host link, a sensor, ...).
    ExternalInput,
    /// Sends data outside the design.
    ExternalOutput,
    /// Both receives and sends data outside the design.
    ExternalBidirectional,
}

impl InterfaceKind {
    /// Returns whether data can enter the design through this interface.
    pub fn is_external_input(self) -> bool {
        matches!(
            self,
            InterfaceKind::ExternalInput | InterfaceKind::ExternalBidirectional
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_inputs() {
        assert!(InterfaceKind::ExternalInput.is_external_input());
        assert!(InterfaceKind::ExternalBidirectional.is_external_input());
        assert!(!InterfaceKind::ExternalOutput.is_external_input());
        assert!(!InterfaceKind::Internal.is_external_input());
    }

    #[test]
    fn serde_snake_case() {
        let k: InterfaceKind = serde_json::from_str("\"external_input\"").unwrap();
        assert_eq!(k, InterfaceKind::ExternalInput);
    }
}
