//! Capability probe
//!
//! Whether the delegate metadata facility (logical property declarations
//! alongside physical storage) is available is decided once per process and
//! then passed explicitly to every classification through
//! [`crate::context::ProbeContext`].
use log::info;
use once_cell::sync::Lazy;

use crate::magic::{CAPABILITY_OFF_VALUES, ENV_DELEGATE_METADATA};

/// Message shown when a delegated property cannot be inspected without the
/// delegate metadata facility.
pub const REMEDIATION_MESSAGE: &str = "Delegated properties can only be inspected when delegate \
     metadata is available. Capture the type shapes with property declarations \
     (for Kotlin types, add kotlin-reflect to the classpath) and unset \
     PROPSCOPE_DELEGATE_METADATA, or refer to the field by its storage identifier.";

static DETECTED: Lazy<Capabilities> = Lazy::new(|| {
    let value = std::env::var(ENV_DELEGATE_METADATA).ok();
    let caps = Capabilities::from_env_value(value.as_deref());
    info!(
        "Delegate metadata facility {} ({}={:?}).",
        if caps.delegate_metadata {
            "available"
        } else {
            "unavailable"
        },
        ENV_DELEGATE_METADATA,
        value
    );
    caps
});

/// Optional facilities offered by the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capabilities {
    /// Logical property declarations can be read alongside physical storage.
    pub delegate_metadata: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            delegate_metadata: true,
        }
    }
}

impl Capabilities {
    /// Returns the capabilities of the current process. The environment is
    /// only read on the first call.
    pub fn detect() -> Self {
        *DETECTED
    }

    pub const fn with_delegate_metadata(delegate_metadata: bool) -> Self {
        Self { delegate_metadata }
    }

    /// Interprets the value of [`ENV_DELEGATE_METADATA`]; any value other than
    /// an explicit "off" keeps the facility enabled.
    pub fn from_env_value(value: Option<&str>) -> Self {
        let disabled = value
            .map(|v| v.trim().to_ascii_lowercase())
            .is_some_and(|v| CAPABILITY_OFF_VALUES.contains(&v.as_str()));
        Self::with_delegate_metadata(!disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_values() {
        assert!(Capabilities::from_env_value(None).delegate_metadata);
        assert!(Capabilities::from_env_value(Some("1")).delegate_metadata);
        assert!(!Capabilities::from_env_value(Some("0")).delegate_metadata);
        assert!(!Capabilities::from_env_value(Some(" OFF ")).delegate_metadata);
        assert!(!Capabilities::from_env_value(Some("false")).delegate_metadata);
    }

    #[test]
    fn detection_is_stable() {
        assert_eq!(Capabilities::detect(), Capabilities::detect());
    }
}
