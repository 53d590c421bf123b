use serde::{
    Deserialize,
    Serialize,
};

use crate::models::{
    HotkeyError,
    HotkeyResult,
};

pub const DEFAULT_RELAY_CAPACITY: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Commands that may wait in the relay before submitters block.
    pub relay_capacity: usize,
    /// Ask the OS to drop auto-repeat notifications while a key is held.
    pub no_repeat: bool,
    pub owner_thread_name: String,
    pub listener_thread_name: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            relay_capacity: DEFAULT_RELAY_CAPACITY,
            no_repeat: false,
            owner_thread_name: "hotkey-owner".to_string(),
            listener_thread_name: "hotkey-listener".to_string(),
        }
    }
}

impl ManagerConfig {
    pub fn from_json_str(json: &str) -> HotkeyResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| HotkeyError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_relay_capacity(mut self, relay_capacity: usize) -> Self {
        self.relay_capacity = relay_capacity;
        self
    }

    pub fn with_no_repeat(mut self, no_repeat: bool) -> Self {
        self.no_repeat = no_repeat;
        self
    }

    pub fn validate(&self) -> HotkeyResult<()> {
        if self.relay_capacity == 0 {
            return Err(HotkeyError::InvalidConfig(
                "relay_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ManagerConfig::default();
        assert_eq!(config.relay_capacity, 20);
        assert!(!config.no_repeat);
        assert_eq!(config.owner_thread_name, "hotkey-owner");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let config = ManagerConfig::from_json_str(r#"{ "no_repeat": true }"#).unwrap();
        assert!(config.no_repeat);
        assert_eq!(config.relay_capacity, DEFAULT_RELAY_CAPACITY);
        assert_eq!(config.listener_thread_name, "hotkey-listener");
    }

    #[test]
    fn test_config_rejects_zero_capacity() {
        let err = ManagerConfig::from_json_str(r#"{ "relay_capacity": 0 }"#).unwrap_err();
        assert!(matches!(err, HotkeyError::InvalidConfig(_)));

        let config = ManagerConfig::default().with_relay_capacity(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_malformed_json() {
        let err = ManagerConfig::from_json_str("{ relay_capacity").unwrap_err();
        assert!(matches!(err, HotkeyError::InvalidConfig(_)));
    }
}
