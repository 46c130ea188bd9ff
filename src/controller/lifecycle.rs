//! Controller load states
//!
//! ```text
//! Discovered ──resolve──▶ Resolved ──new/init/collect──▶ Initialized ──register──▶ Registered
//! ```
//!
//! A failure is reported with the last state the module reached.

use std::fmt;

/// Where a controller module got to in the load pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Module found by discovery
    Discovered,
    /// Export resolved to a controller class
    Resolved,
    /// Constructed, `init()` done and routes collected
    Initialized,
    /// Routes installed on the router
    Registered,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerState::Discovered => write!(f, "discovered"),
            ControllerState::Resolved => write!(f, "resolved"),
            ControllerState::Initialized => write!(f, "initialized"),
            ControllerState::Registered => write!(f, "registered"),
        }
    }
}

impl ControllerState {
    /// Whether the controller serves requests
    pub fn is_serving(&self) -> bool {
        matches!(self, ControllerState::Registered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ControllerState::Initialized.to_string(), "initialized");
        assert_eq!(ControllerState::Discovered.to_string(), "discovered");
    }

    #[test]
    fn test_only_registered_serves() {
        assert!(ControllerState::Registered.is_serving());
        assert!(!ControllerState::Initialized.is_serving());
        assert!(!ControllerState::Resolved.is_serving());
    }
}
