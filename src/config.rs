use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::classifier::is_supported_pixel_codename;

pub const PROP_SPOOF_MASTER: &str = "persist.sys.pihooks.enable";
pub const PROP_SPOOF_PIXEL_PROPS: &str = "persist.sys.pphooks.enable";
pub const PROP_DEBUG: &str = "persist.sys.pihooks.debug";
pub const PROP_DEVICE_CODENAME: &str = "ro.clown.device";
pub const PROP_PRODUCT_MODEL: &str = "ro.product.model";
pub const PROP_PRODUCT_FINGERPRINT: &str = "ro.product.fingerprint";
pub const PROP_BUILD_DATE_UTC: &str = "ro.build.date.utc";

/// Read access to the host's system properties.
pub trait SystemProperties {
    fn get(&self, key: &str) -> Option<String>;

    fn get_or(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(value) if !value.is_empty() => value,
            _ => default.to_string(),
        }
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .and_then(|value| parse_bool(&value))
            .unwrap_or(default)
    }
}

/// Boolean spelling accepted by the platform property service.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "y" | "yes" | "on" | "true" => Some(true),
        "0" | "n" | "no" | "off" | "false" => Some(false),
        _ => None,
    }
}

/// Property source backed by a map, loadable from a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertySnapshot {
    values: HashMap<String, String>,
}

impl PropertySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

impl SystemProperties for PropertySnapshot {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Static knobs of the engine. `stock()` matches the shipped platform build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpoofConfig {
    /// Package that ships the randomized device profiles.
    pub provider_package: String,
    /// Build-time switch for Pixel props spoofing of consumer apps.
    pub enable_pixel_props: bool,
    /// Settings key receiving the name of the last drawn profile.
    pub selected_profile_key: String,
}

impl SpoofConfig {
    pub fn stock() -> Self {
        Self {
            provider_package: "com.goolag.pif".to_string(),
            enable_pixel_props: true,
            selected_profile_key: "ppu_spoof_build_gms_array".to_string(),
        }
    }
}

impl Default for SpoofConfig {
    fn default() -> Self {
        Self::stock()
    }
}

/// Process-wide switches read once per decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    pub spoof_master: bool,
    pub pixel_props_enabled: bool,
    pub pixel_props_configured: bool,
    /// The host already is a supported Pixel, so impersonation is pointless.
    pub native_pixel: bool,
    pub debug: bool,
}

impl FeatureFlags {
    pub fn resolve(props: &dyn SystemProperties, config: &SpoofConfig, device: &DeviceInfo) -> Self {
        Self {
            spoof_master: props.get_bool(PROP_SPOOF_MASTER, true),
            pixel_props_enabled: props.get_bool(PROP_SPOOF_PIXEL_PROPS, true),
            pixel_props_configured: config.enable_pixel_props,
            native_pixel: device.is_native_pixel(),
            debug: props.get_bool(PROP_DEBUG, false),
        }
    }

    pub fn pixel_spoofing_allowed(&self) -> bool {
        !self.native_pixel && self.pixel_props_configured && self.pixel_props_enabled
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            spoof_master: true,
            pixel_props_enabled: true,
            pixel_props_configured: true,
            native_pixel: false,
            debug: false,
        }
    }
}

/// The host's real identity, used by the corrections that undo spoofing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub model: String,
    pub fingerprint: String,
    /// Build timestamp in milliseconds.
    pub build_time_ms: i64,
    pub codename: String,
}

impl DeviceInfo {
    /// `fallback` supplies the compiled-in values for properties that are unset.
    pub fn from_properties(props: &dyn SystemProperties, fallback: &DeviceInfo) -> Self {
        let build_time_ms = props
            .get(PROP_BUILD_DATE_UTC)
            .and_then(|secs| secs.trim().parse::<i64>().ok())
            .map(|secs| secs.saturating_mul(1000))
            .unwrap_or(fallback.build_time_ms);
        Self {
            model: props.get_or(PROP_PRODUCT_MODEL, &fallback.model),
            fingerprint: props.get_or(PROP_PRODUCT_FINGERPRINT, &fallback.fingerprint),
            build_time_ms,
            codename: props.get_or(PROP_DEVICE_CODENAME, &fallback.codename),
        }
    }

    pub fn is_native_pixel(&self) -> bool {
        is_supported_pixel_codename(&self.codename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback() -> DeviceInfo {
        DeviceInfo {
            model: "unknown".into(),
            fingerprint: "fp".into(),
            build_time_ms: 0,
            codename: "generic".into(),
        }
    }

    fn resolve(props: &PropertySnapshot) -> FeatureFlags {
        let device = DeviceInfo::from_properties(props, &fallback());
        FeatureFlags::resolve(props, &SpoofConfig::stock(), &device)
    }

    #[test]
    fn flags_default_to_enabled() {
        let flags = resolve(&PropertySnapshot::new());
        assert!(flags.spoof_master);
        assert!(flags.pixel_props_enabled);
        assert!(!flags.native_pixel);
        assert!(!flags.debug);
        assert!(flags.pixel_spoofing_allowed());
    }

    #[test]
    fn native_pixel_disables_pixel_spoofing() {
        let props = PropertySnapshot::new().with(PROP_DEVICE_CODENAME, "husky");
        let flags = resolve(&props);
        assert!(flags.native_pixel);
        assert!(!flags.pixel_spoofing_allowed());
    }

    #[test]
    fn property_booleans_follow_platform_spelling() {
        let props = PropertySnapshot::new()
            .with(PROP_SPOOF_MASTER, "0")
            .with(PROP_SPOOF_PIXEL_PROPS, "garbage")
            .with(PROP_DEBUG, "on");
        let flags = resolve(&props);
        assert!(!flags.spoof_master);
        assert!(flags.pixel_props_enabled);
        assert!(flags.debug);
    }

    #[test]
    fn snapshot_loads_from_json() {
        let props = PropertySnapshot::from_json(r#"{"ro.product.model": "Phone 2", "ro.build.date.utc": "1700000000"}"#)
            .expect("valid json");
        let info = DeviceInfo::from_properties(&props, &fallback());
        assert_eq!(info.model, "Phone 2");
        assert_eq!(info.fingerprint, "fp");
        assert_eq!(info.build_time_ms, 1_700_000_000_000);
        assert_eq!(info.codename, "generic");
        assert!(!info.is_native_pixel());
    }

    #[test]
    fn config_fills_missing_keys() {
        let config: SpoofConfig = serde_json::from_str(r#"{"enable_pixel_props": false}"#).expect("valid json");
        assert!(!config.enable_pixel_props);
        assert_eq!(config.provider_package, "com.goolag.pif");
    }
}
