//! Template context: serializable rendering payload built from settings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use shipyard_core::types::Setting;

use crate::error::RenderError;

/// Rendering payload.
///
/// Templates address settings either by key (`{{ settings.replicas }}`,
/// last duplicate wins) or in order (`{% for s in settings_list %}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateContext {
    pub settings: BTreeMap<String, String>,
    pub settings_list: Vec<SettingCtx>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingCtx {
    pub key: String,
    pub value: String,
}

impl TemplateContext {
    /// Build a [`TemplateContext`] from an ordered list of settings.
    pub fn from_settings(settings: &[Setting]) -> Self {
        let settings_list: Vec<SettingCtx> = settings
            .iter()
            .map(|s| SettingCtx {
                key: s.key.clone(),
                value: s.value.clone(),
            })
            .collect();
        let settings = settings
            .iter()
            .map(|s| (s.key.clone(), s.value.clone()))
            .collect();
        TemplateContext {
            settings,
            settings_list,
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_duplicate_wins_but_order_is_kept() {
        let ctx = TemplateContext::from_settings(&[
            Setting::new("size", "small"),
            Setting::new("region", "br"),
            Setting::new("size", "large"),
        ]);
        assert_eq!(ctx.settings.get("size").map(String::as_str), Some("large"));
        let keys: Vec<_> = ctx.settings_list.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, ["size", "region", "size"]);
    }

    #[test]
    fn to_tera_context_succeeds() {
        let ctx = TemplateContext::from_settings(&[Setting::new("a", "1")]);
        ctx.to_tera_context().expect("context conversion");
    }
}
