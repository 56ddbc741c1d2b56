use crate::error::HostError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// First id handed out for keyed nodes. Lower ids are left to caller-assigned nodes.
    pub keyed_id_base: u32,
    /// A layout read during a tick turns that tick's commit into a rollback.
    pub rollback_on_layout_read: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            keyed_id_base: 10_000,
            rollback_on_layout_read: true,
        }
    }
}

impl HostConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, HostError> {
        let config: HostConfig =
            toml::from_str(input).map_err(|err| HostError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), HostError> {
        if self.keyed_id_base == 0 {
            return Err(HostError::Config("keyed_id_base must be positive".into()));
        }
        Ok(())
    }
}
