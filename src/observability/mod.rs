#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservabilityLevel {
    OBS_NONE,
    OBS_SAFE,
}

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    PROFILE_UNAVAILABLE,
    PROFILE_MALFORMED,
    FIELD_WRITE,
    LISTENER_REGISTRATION,
}

const ERROR_CLASSES: usize = 4;

#[cfg(feature = "obs_none")]
pub const OBS_LEVEL: ObservabilityLevel = ObservabilityLevel::OBS_NONE;

#[cfg(not(feature = "obs_none"))]
pub const OBS_LEVEL: ObservabilityLevel = ObservabilityLevel::OBS_SAFE;

pub const OBS_NONE: bool = matches!(OBS_LEVEL, ObservabilityLevel::OBS_NONE);

use std::sync::atomic::{AtomicU64, Ordering};

static ERROR_COUNTS: [AtomicU64; ERROR_CLASSES] = [const { AtomicU64::new(0) }; ERROR_CLASSES];
static DECISIONS: AtomicU64 = AtomicU64::new(0);
static WRITES_APPLIED: AtomicU64 = AtomicU64::new(0);
static PROFILES_SELECTED: AtomicU64 = AtomicU64::new(0);
static ATTESTATION_BLOCKS: AtomicU64 = AtomicU64::new(0);
static SELF_TERMINATIONS: AtomicU64 = AtomicU64::new(0);

#[inline]
fn bump(counter: &AtomicU64) {
    if !OBS_NONE {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[inline]
pub fn record_error(class: ErrorClass) {
    bump(&ERROR_COUNTS[class as usize]);
}

#[inline]
pub fn record_decision() {
    bump(&DECISIONS);
}

#[inline]
pub fn record_write_applied() {
    bump(&WRITES_APPLIED);
}

#[inline]
pub fn record_profile_selected() {
    bump(&PROFILES_SELECTED);
}

#[inline]
pub fn record_attestation_block() {
    bump(&ATTESTATION_BLOCKS);
}

#[inline]
pub fn record_self_termination() {
    bump(&SELF_TERMINATIONS);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservabilitySnapshot {
    pub decisions: u64,
    pub writes_applied: u64,
    pub profiles_selected: u64,
    pub attestation_blocks: u64,
    pub self_terminations: u64,
    pub errors_by_class: [u64; ERROR_CLASSES],
}

impl ObservabilitySnapshot {
    pub fn errors(&self, class: ErrorClass) -> u64 {
        self.errors_by_class[class as usize]
    }

    pub fn error_total(&self) -> u64 {
        self.errors_by_class.iter().sum()
    }
}

pub fn snapshot() -> ObservabilitySnapshot {
    ObservabilitySnapshot {
        decisions: DECISIONS.load(Ordering::Relaxed),
        writes_applied: WRITES_APPLIED.load(Ordering::Relaxed),
        profiles_selected: PROFILES_SELECTED.load(Ordering::Relaxed),
        attestation_blocks: ATTESTATION_BLOCKS.load(Ordering::Relaxed),
        self_terminations: SELF_TERMINATIONS.load(Ordering::Relaxed),
        errors_by_class: ERROR_COUNTS.each_ref().map(|c| c.load(Ordering::Relaxed)),
    }
}
