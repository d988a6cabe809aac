//! Randomized device profiles supplied by an external provider package.
//!
//! The provider exposes a `device_arrays` string list naming candidate
//! profiles. Each name resolves to a 13-entry string tuple in
//! [`PROFILE_FIELD_ORDER`]. Empty DEVICE, ID, TYPE and TAGS entries are
//! derived or defaulted; every other entry is taken verbatim.

#[cfg(feature = "async")]
pub mod async_provider;
pub mod json;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use regex::Regex;

use crate::attributes::{Field, FieldValue};
use crate::config::SpoofConfig;
use crate::error::SpoofError;
use crate::observability::{self, ErrorClass};
use crate::profiles::SubstitutionProfile;
use crate::{dlog, elog};

pub const PROFILE_LIST_RESOURCE: &str = "device_arrays";

pub const PROFILE_FIELD_ORDER: [Field; 13] = [
    Field::MANUFACTURER,
    Field::MODEL,
    Field::FINGERPRINT,
    Field::BRAND,
    Field::PRODUCT,
    Field::DEVICE,
    Field::RELEASE,
    Field::ID,
    Field::INCREMENTAL,
    Field::TYPE,
    Field::TAGS,
    Field::SECURITY_PATCH,
    Field::DEVICE_INITIAL_SDK_INT,
];

const FINGERPRINT_INDEX: usize = 2;

lazy_static! {
    static ref BUILD_ID_PATTERN: Regex =
        Regex::new(r"([A-Za-z0-9]+\.\d+\.\d+(?:\.\w+)?)").expect("build id regex is valid");
}

/// Resource access into another installed package.
pub trait ProfileProvider {
    fn is_package_installed(&self, package: &str) -> bool;

    /// `None` when the package has no string array of that name.
    fn string_array(&self, package: &str, name: &str) -> Option<Vec<String>>;
}

/// Process-wide settings sink used to publish the last drawn profile.
pub trait SettingsStore: Send + Sync {
    fn put_string(&self, key: &str, value: &str);
}

#[derive(Debug, Default)]
pub struct InMemorySettings {
    values: Mutex<HashMap<String, String>>,
}

impl InMemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }
}

impl SettingsStore for InMemorySettings {
    fn put_string(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
    }
}

/// Second `/`-separated segment of a build fingerprint.
pub fn device_name_from_fingerprint(fingerprint: &str) -> String {
    fingerprint.split('/').nth(1).unwrap_or_default().to_string()
}

/// First build id found in a fingerprint, three-part (`AP4A.241205.013`) or
/// with a suffix (`UP1A.231005.007.A1`).
pub fn build_id_from_fingerprint(fingerprint: &str) -> String {
    BUILD_ID_PATTERN
        .captures(fingerprint)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn or_else(value: &str, fallback: impl FnOnce() -> String) -> String {
    if value.is_empty() {
        fallback()
    } else {
        value.to_string()
    }
}

/// Turns a provider tuple into a profile, rejecting short or unparsable ones.
pub fn resolve_profile(name: &str, props: &[String]) -> Result<SubstitutionProfile, SpoofError> {
    if props.len() < PROFILE_FIELD_ORDER.len() {
        return Err(SpoofError::malformed(
            name,
            format!(
                "expected {} entries, found {}",
                PROFILE_FIELD_ORDER.len(),
                props.len()
            ),
        ));
    }
    let fingerprint = &props[FINGERPRINT_INDEX];
    let sdk_int = props[12].parse::<i32>().map_err(|_| {
        SpoofError::malformed(name, format!("DEVICE_INITIAL_SDK_INT '{}' is not an integer", props[12]))
    })?;

    let mut entries = Vec::with_capacity(PROFILE_FIELD_ORDER.len());
    for (field, raw) in PROFILE_FIELD_ORDER.iter().zip(props.iter()) {
        let value = match field {
            Field::DEVICE => FieldValue::Str(or_else(raw, || device_name_from_fingerprint(fingerprint))),
            Field::ID => FieldValue::Str(or_else(raw, || build_id_from_fingerprint(fingerprint))),
            Field::TYPE => FieldValue::Str(or_else(raw, || "user".to_string())),
            Field::TAGS => FieldValue::Str(or_else(raw, || "release-keys".to_string())),
            Field::DEVICE_INITIAL_SDK_INT => FieldValue::Int(sdk_int),
            _ => FieldValue::Str(raw.clone()),
        };
        entries.push((*field, value));
    }
    Ok(SubstitutionProfile::new(Some(name.to_string()), entries))
}

pub(crate) fn pick_index(rng: &mut dyn RngCore, len: usize) -> usize {
    rng.gen_range(0..len)
}

pub(crate) fn record_selection(settings: &dyn SettingsStore, key: &str, name: &str) {
    dlog!("Selected device profile {}", name);
    settings.put_string(key, name);
    observability::record_profile_selected();
}

pub(crate) fn record_failure(err: &SpoofError) {
    let class = match err {
        SpoofError::ProfileMalformed { .. } => ErrorClass::PROFILE_MALFORMED,
        _ => ErrorClass::PROFILE_UNAVAILABLE,
    };
    observability::record_error(class);
    elog!("{}", err);
}

pub struct ProfileCatalog<P: ProfileProvider, R: RngCore = OsRng> {
    provider: P,
    settings: Arc<dyn SettingsStore>,
    settings_key: String,
    rng: R,
}

impl<P: ProfileProvider> ProfileCatalog<P, OsRng> {
    pub fn new(provider: P, settings: Arc<dyn SettingsStore>, config: &SpoofConfig) -> Self {
        Self::with_rng(provider, settings, config, OsRng)
    }
}

impl<P: ProfileProvider, R: RngCore> ProfileCatalog<P, R> {
    pub fn with_rng(provider: P, settings: Arc<dyn SettingsStore>, config: &SpoofConfig, rng: R) -> Self {
        Self {
            provider,
            settings,
            settings_key: config.selected_profile_key.clone(),
            rng,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Draws one profile uniformly from the provider's list and publishes its
    /// name to the settings store.
    pub fn select_random_profile(&mut self, provider_package: &str) -> Result<SubstitutionProfile, SpoofError> {
        let result = self.draw(provider_package);
        match &result {
            Ok(profile) => {
                if let Some(name) = &profile.name {
                    record_selection(self.settings.as_ref(), &self.settings_key, name);
                }
            }
            Err(err) => record_failure(err),
        }
        result
    }

    fn draw(&mut self, provider_package: &str) -> Result<SubstitutionProfile, SpoofError> {
        if !self.provider.is_package_installed(provider_package) {
            return Err(SpoofError::unavailable(format!("'{}' is not installed", provider_package)));
        }
        let names = self
            .provider
            .string_array(provider_package, PROFILE_LIST_RESOURCE)
            .ok_or_else(|| SpoofError::unavailable(format!("resource '{}' not found", PROFILE_LIST_RESOURCE)))?;
        if names.is_empty() {
            return Err(SpoofError::unavailable("no device arrays found"));
        }
        let name = &names[pick_index(&mut self.rng, names.len())];
        let props = self
            .provider
            .string_array(provider_package, name)
            .ok_or_else(|| SpoofError::unavailable(format!("device array '{}' not found", name)))?;
        resolve_profile(name, &props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    const PKG: &str = "com.goolag.pif";
    const KOMODO_FP: &str = "google/komodo/komodo:15/AP4A.241205.013/12621605:user/release-keys";

    #[derive(Default)]
    struct FakeProvider {
        installed: bool,
        arrays: HashMap<String, Vec<String>>,
    }

    impl FakeProvider {
        fn installed() -> Self {
            Self {
                installed: true,
                arrays: HashMap::new(),
            }
        }

        fn with_array(mut self, name: &str, values: &[&str]) -> Self {
            self.arrays
                .insert(name.to_string(), values.iter().map(|v| v.to_string()).collect());
            self
        }
    }

    impl ProfileProvider for FakeProvider {
        fn is_package_installed(&self, package: &str) -> bool {
            self.installed && package == PKG
        }

        fn string_array(&self, _package: &str, name: &str) -> Option<Vec<String>> {
            self.arrays.get(name).cloned()
        }
    }

    fn komodo_tuple() -> Vec<&'static str> {
        vec![
            "Google",
            "Pixel 9 Pro XL",
            KOMODO_FP,
            "google",
            "komodo_beta",
            "",
            "15",
            "",
            "12621605",
            "",
            "",
            "2024-12-05",
            "32",
        ]
    }

    fn catalog(provider: FakeProvider, settings: Arc<InMemorySettings>) -> ProfileCatalog<FakeProvider, StdRng> {
        ProfileCatalog::with_rng(provider, settings, &SpoofConfig::stock(), StdRng::seed_from_u64(7))
    }

    #[test]
    fn derivations_from_fingerprint() {
        assert_eq!(device_name_from_fingerprint(KOMODO_FP), "komodo");
        assert_eq!(build_id_from_fingerprint(KOMODO_FP), "AP4A.241205.013");
        assert_eq!(
            build_id_from_fingerprint("google/husky/husky:14/UP1A.231005.007.A1/10754064:user/release-keys"),
            "UP1A.231005.007.A1"
        );
        assert_eq!(device_name_from_fingerprint("no-slashes"), "");
        assert_eq!(build_id_from_fingerprint("no-build-id"), "");
    }

    #[test]
    fn missing_package_is_unavailable() {
        let mut catalog = catalog(FakeProvider::default(), Arc::new(InMemorySettings::new()));
        let err = catalog.select_random_profile(PKG).unwrap_err();
        assert!(matches!(err, SpoofError::ProfileUnavailable { .. }));
    }

    #[test]
    fn missing_list_resource_is_unavailable() {
        let mut catalog = catalog(FakeProvider::installed(), Arc::new(InMemorySettings::new()));
        assert!(matches!(
            catalog.select_random_profile(PKG),
            Err(SpoofError::ProfileUnavailable { .. })
        ));
    }

    #[test]
    fn empty_list_is_unavailable() {
        let provider = FakeProvider::installed().with_array(PROFILE_LIST_RESOURCE, &[]);
        let mut catalog = catalog(provider, Arc::new(InMemorySettings::new()));
        assert!(matches!(
            catalog.select_random_profile(PKG),
            Err(SpoofError::ProfileUnavailable { .. })
        ));
    }

    #[test]
    fn short_tuple_is_malformed() {
        let provider = FakeProvider::installed()
            .with_array(PROFILE_LIST_RESOURCE, &["short"])
            .with_array("short", &["Google", "Pixel", KOMODO_FP]);
        let settings = Arc::new(InMemorySettings::new());
        let mut catalog = catalog(provider, Arc::clone(&settings));
        assert!(matches!(
            catalog.select_random_profile(PKG),
            Err(SpoofError::ProfileMalformed { ref name, .. }) if name == "short"
        ));
        assert_eq!(settings.get("ppu_spoof_build_gms_array"), None);
    }

    #[test]
    fn non_numeric_sdk_is_malformed() {
        let mut tuple = komodo_tuple();
        tuple[12] = "thirty-two";
        let err = resolve_profile("komodo", &tuple.iter().map(|s| s.to_string()).collect::<Vec<_>>())
            .unwrap_err();
        assert!(matches!(err, SpoofError::ProfileMalformed { .. }));
    }

    #[test]
    fn empty_entries_fall_back() {
        let provider = FakeProvider::installed()
            .with_array(PROFILE_LIST_RESOURCE, &["komodo"])
            .with_array("komodo", &komodo_tuple());
        let settings = Arc::new(InMemorySettings::new());
        let mut catalog = catalog(provider, Arc::clone(&settings));

        let profile = catalog.select_random_profile(PKG).expect("well-formed profile");

        assert_eq!(profile.get(Field::DEVICE), Some(&FieldValue::from("komodo")));
        assert_eq!(profile.get(Field::ID), Some(&FieldValue::from("AP4A.241205.013")));
        assert_eq!(profile.get(Field::TYPE), Some(&FieldValue::from("user")));
        assert_eq!(profile.get(Field::TAGS), Some(&FieldValue::from("release-keys")));
        assert_eq!(profile.get(Field::PRODUCT), Some(&FieldValue::from("komodo_beta")));
        assert_eq!(profile.get(Field::DEVICE_INITIAL_SDK_INT), Some(&FieldValue::Int(32)));
        assert_eq!(settings.get("ppu_spoof_build_gms_array").as_deref(), Some("komodo"));
    }

    #[test]
    fn writes_follow_positional_order() {
        let props: Vec<String> = komodo_tuple().iter().map(|s| s.to_string()).collect();
        let profile = resolve_profile("komodo", &props).expect("well-formed profile");
        let order: Vec<Field> = profile.entries().iter().map(|(f, _)| *f).collect();
        assert_eq!(order, PROFILE_FIELD_ORDER.to_vec());
    }

    #[test]
    fn draws_stay_within_the_list() {
        let names = ["a", "b", "c"];
        let mut provider = FakeProvider::installed().with_array(PROFILE_LIST_RESOURCE, &names);
        for name in names {
            provider = provider.with_array(name, &komodo_tuple());
        }
        let mut catalog = catalog(provider, Arc::new(InMemorySettings::new()));

        let mut seen = HashSet::new();
        for _ in 0..200 {
            let profile = catalog.select_random_profile(PKG).expect("well-formed profile");
            let name = profile.name.expect("dynamic profiles are named");
            assert!(names.contains(&name.as_str()));
            seen.insert(name);
        }
        assert_eq!(seen.len(), names.len());
    }
}
