//! Decides which identity attributes a process sees.
//!
//! Every decision starts from the generic baseline, adds the category's
//! profile and finishes with per-package corrections. Writes are applied in
//! emitted order, so a correction always overrides an earlier profile write
//! for the same field.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::attributes::{apply_writes, AttributeStore, Field, FieldWrite, WriteReport};
use crate::catalog::{ProfileCatalog, ProfileProvider};
use crate::certification::CertificationGate;
use crate::classifier::{
    CallerCategory, CallerIdentity, PACKAGE_ARCORE, PACKAGE_GMS, PACKAGE_SETTINGS_INTELLIGENCE,
};
use crate::config::{DeviceInfo, FeatureFlags, SpoofConfig};
use crate::dlog;
use crate::error::SpoofError;
use crate::observability;
use crate::process_state::ProcessContext;
use crate::profiles::{BuiltinProfile, ExclusionTable, SubstitutionProfile};

/// Result of one decision, with the details `decide` drops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpoofPlan {
    pub writes: Vec<FieldWrite>,
    /// Name of the dynamic profile drawn for the privileged worker.
    pub dynamic_profile: Option<String>,
    /// Catalog failure that cancelled the certification attempt.
    pub profile_error: Option<SpoofError>,
}

pub struct SpoofPolicyEngine<P: ProfileProvider, G: CertificationGate, R: RngCore = OsRng> {
    device: DeviceInfo,
    exclusions: ExclusionTable,
    catalog: ProfileCatalog<P, R>,
    gate: G,
    provider_package: String,
}

impl<P: ProfileProvider, G: CertificationGate, R: RngCore> SpoofPolicyEngine<P, G, R> {
    pub fn new(device: DeviceInfo, catalog: ProfileCatalog<P, R>, gate: G, config: &SpoofConfig) -> Self {
        Self {
            device,
            exclusions: ExclusionTable::default(),
            catalog,
            gate,
            provider_package: config.provider_package.clone(),
        }
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionTable) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    /// Ordered attribute writes for `caller`. Identical inputs give identical
    /// writes unless a dynamic profile is drawn for the privileged worker.
    pub fn decide(
        &mut self,
        caller: &CallerIdentity,
        category: CallerCategory,
        is_tablet: bool,
        flags: &FeatureFlags,
    ) -> Vec<FieldWrite> {
        self.plan(caller, category, is_tablet, flags).writes
    }

    pub fn plan(
        &mut self,
        caller: &CallerIdentity,
        category: CallerCategory,
        is_tablet: bool,
        flags: &FeatureFlags,
    ) -> SpoofPlan {
        observability::record_decision();
        let mut plan = SpoofPlan::default();
        if category == CallerCategory::ExcludedCameraApp {
            return plan;
        }

        plan.writes.extend(SubstitutionProfile::generic().to_writes());
        if caller.package_name.is_empty() {
            return plan;
        }

        match category {
            CallerCategory::PrivilegedServiceProcess => self.certify(caller, category, flags, &mut plan),
            CallerCategory::PixelAppPackage => self.spoof_pixel(caller, is_tablet, flags, &mut plan),
            CallerCategory::ExcludedCameraApp | CallerCategory::Other => {}
        }

        if let Some(correction) = self.correction_for(caller) {
            plan.writes.push(correction);
        }
        plan
    }

    /// Decides for an attached process and applies the writes to `store`.
    pub fn set_props(
        &mut self,
        ctx: &ProcessContext,
        is_tablet: bool,
        flags: &FeatureFlags,
        store: &mut dyn AttributeStore,
    ) -> WriteReport {
        let plan = self.plan(ctx.caller(), ctx.category(), is_tablet, flags);
        apply_writes(store, &plan.writes)
    }

    fn certify(
        &mut self,
        caller: &CallerIdentity,
        category: CallerCategory,
        flags: &FeatureFlags,
        plan: &mut SpoofPlan,
    ) {
        if !self.gate.should_try_to_certify(caller, category) || !flags.spoof_master {
            return;
        }
        match self.catalog.select_random_profile(&self.provider_package) {
            Ok(profile) => {
                plan.writes.extend(profile.to_writes());
                plan.dynamic_profile = profile.name;
            }
            Err(err) => plan.profile_error = Some(err),
        }
    }

    fn spoof_pixel(&self, caller: &CallerIdentity, is_tablet: bool, flags: &FeatureFlags, plan: &mut SpoofPlan) {
        if !flags.pixel_spoofing_allowed() {
            return;
        }
        let package = caller.package_name.as_str();
        dlog!("Defining props for: {}", package);
        for (field, value) in BuiltinProfile::for_form_factor(is_tablet).profile().entries() {
            if self.exclusions.is_kept(package, *field) {
                dlog!("Not defining {} prop for: {}", field.as_str(), package);
                continue;
            }
            plan.writes.push(FieldWrite::new(*field, value.clone()));
        }
    }

    fn correction_for(&self, caller: &CallerIdentity) -> Option<FieldWrite> {
        let package = caller.package_name.as_str();
        if package == PACKAGE_SETTINGS_INTELLIGENCE {
            return Some(FieldWrite::new(Field::FINGERPRINT, self.device.build_time_ms.to_string()));
        }
        if package == PACKAGE_ARCORE {
            return Some(FieldWrite::new(Field::FINGERPRINT, self.device.fingerprint.clone()));
        }
        if package.to_lowercase().contains(PACKAGE_GMS) && caller.process_name.to_lowercase().contains("ui") {
            return Some(FieldWrite::new(Field::MODEL, self.device.model.clone()));
        }
        None
    }
}
