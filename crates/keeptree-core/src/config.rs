//! Model configuration types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::icon::{BUILTIN_ICON_COUNT, DEFAULT_ENTRY_ICON, DEFAULT_GROUP_ICON};

/// Configuration shared by every node of a forest.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ModelConfig {
    /// Value an `Inherit` auto-type flag resolves to at the root.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub autotype_default: bool,

    /// Value an `Inherit` searching flag resolves to at the root.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub searching_default: bool,

    /// Whether newly created nodes touch their timestamps on change.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub update_timeinfo: bool,

    /// Whether a modification also counts as an access.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub touch_access_on_modify: bool,

    /// Built-in icon for new groups.
    #[builder(default = "DEFAULT_GROUP_ICON")]
    #[serde(default = "default_group_icon")]
    pub default_group_icon: u32,

    /// Built-in icon for new entries.
    #[builder(default = "DEFAULT_ENTRY_ICON")]
    #[serde(default)]
    pub default_entry_icon: u32,
}

fn default_true() -> bool {
    true
}

fn default_group_icon() -> u32 {
    DEFAULT_GROUP_ICON
}

impl ModelConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        for (name, icon) in [
            ("default_group_icon", self.default_group_icon),
            ("default_entry_icon", self.default_entry_icon),
        ] {
            if let Some(icon) = icon.filter(|icon| *icon >= BUILTIN_ICON_COUNT) {
                return Err(format!(
                    "{name} must be below {BUILTIN_ICON_COUNT}, got {icon}"
                ));
            }
        }
        Ok(())
    }
}

impl ModelConfig {
    /// Create a new model config builder.
    pub fn builder() -> ModelConfigBuilder {
        ModelConfigBuilder::default()
    }

    /// Configuration for bulk loading: no timestamp updates on change.
    pub fn loading() -> Self {
        Self {
            update_timeinfo: false,
            ..Self::default()
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            autotype_default: true,
            searching_default: true,
            update_timeinfo: true,
            touch_access_on_modify: true,
            default_group_icon: DEFAULT_GROUP_ICON,
            default_entry_icon: DEFAULT_ENTRY_ICON,
        }
    }
}
