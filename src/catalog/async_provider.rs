use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::RngCore;

use super::{pick_index, record_failure, record_selection, resolve_profile, SettingsStore, PROFILE_LIST_RESOURCE};
use crate::config::SpoofConfig;
use crate::error::SpoofError;
use crate::profiles::SubstitutionProfile;

/// Provider whose resource lookups may block on another process.
#[async_trait]
pub trait AsyncProfileProvider: Send + Sync {
    async fn is_package_installed(&self, package: &str) -> bool;
    async fn string_array(&self, package: &str, name: &str) -> Option<Vec<String>>;
}

/// Catalog variant whose lookup is abandoned once `deadline` passes.
pub struct AsyncProfileCatalog<A: AsyncProfileProvider, R: RngCore + Send = OsRng> {
    provider: A,
    settings: Arc<dyn SettingsStore>,
    settings_key: String,
    rng: R,
    deadline: Duration,
}

impl<A: AsyncProfileProvider> AsyncProfileCatalog<A, OsRng> {
    pub fn new(provider: A, settings: Arc<dyn SettingsStore>, config: &SpoofConfig, deadline: Duration) -> Self {
        Self::with_rng(provider, settings, config, deadline, OsRng)
    }
}

impl<A: AsyncProfileProvider, R: RngCore + Send> AsyncProfileCatalog<A, R> {
    pub fn with_rng(
        provider: A,
        settings: Arc<dyn SettingsStore>,
        config: &SpoofConfig,
        deadline: Duration,
        rng: R,
    ) -> Self {
        Self {
            provider,
            settings,
            settings_key: config.selected_profile_key.clone(),
            rng,
            deadline,
        }
    }

    pub async fn select_random_profile(&mut self, provider_package: &str) -> Result<SubstitutionProfile, SpoofError> {
        let provider = &self.provider;
        let rng = &mut self.rng;
        let lookup = async move {
            if !provider.is_package_installed(provider_package).await {
                return Err(SpoofError::unavailable(format!("'{}' is not installed", provider_package)));
            }
            let names = provider
                .string_array(provider_package, PROFILE_LIST_RESOURCE)
                .await
                .ok_or_else(|| SpoofError::unavailable(format!("resource '{}' not found", PROFILE_LIST_RESOURCE)))?;
            if names.is_empty() {
                return Err(SpoofError::unavailable("no device arrays found"));
            }
            let name = names[pick_index(rng, names.len())].clone();
            let props = provider
                .string_array(provider_package, &name)
                .await
                .ok_or_else(|| SpoofError::unavailable(format!("device array '{}' not found", name)))?;
            resolve_profile(&name, &props)
        };

        let result = match tokio::time::timeout(self.deadline, lookup).await {
            Ok(result) => result,
            Err(_) => Err(SpoofError::unavailable(format!(
                "lookup in '{}' exceeded {:?}",
                provider_package, self.deadline
            ))),
        };
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
}
