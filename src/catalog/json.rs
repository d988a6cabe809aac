use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ProfileProvider;

/// Provider whose installed packages and string arrays come from a JSON
/// document:
///
/// ```json
/// { "com.goolag.pif": { "device_arrays": ["komodo"], "komodo": ["Google", "..."] } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonProfileProvider {
    packages: HashMap<String, HashMap<String, Vec<String>>>,
}

impl JsonProfileProvider {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

impl ProfileProvider for JsonProfileProvider {
    fn is_package_installed(&self, package: &str) -> bool {
        self.packages.contains_key(package)
    }

    fn string_array(&self, package: &str, name: &str) -> Option<Vec<String>> {
        self.packages.get(package)?.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{InMemorySettings, ProfileCatalog};
    use crate::config::SpoofConfig;
    use crate::error::SpoofError;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn json_document_drives_the_catalog() {
        let provider = JsonProfileProvider::from_value(json!({
            "com.goolag.pif": {
                "device_arrays": ["tokay"],
                "tokay": [
                    "Google", "Pixel 9", "google/tokay/tokay:15/AP4A.250105.002/12701944:user/release-keys",
                    "google", "tokay", "", "15", "", "12701944", "user", "release-keys", "2025-01-05", "34"
                ]
            }
        }))
        .expect("valid provider document");
        let mut catalog = ProfileCatalog::new(provider, Arc::new(InMemorySettings::new()), &SpoofConfig::stock());

        let profile = catalog
            .select_random_profile("com.goolag.pif")
            .expect("profile resolves");
        assert_eq!(profile.name.as_deref(), Some("tokay"));
    }

    #[test]
    fn absent_package_is_not_installed() {
        let provider = JsonProfileProvider::from_json("{}").expect("valid provider document");
        assert!(!provider.is_package_installed("com.goolag.pif"));
        let mut catalog = ProfileCatalog::new(provider, Arc::new(InMemorySettings::new()), &SpoofConfig::stock());
        assert!(matches!(
            catalog.select_random_profile("com.goolag.pif"),
            Err(SpoofError::ProfileUnavailable { .. })
        ));
    }
}
