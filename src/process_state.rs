use std::sync::atomic::{AtomicBool, Ordering};

use crate::classifier::{classify_identity, CallerCategory, CallerIdentity};
use crate::config::FeatureFlags;
use crate::logging;

/// Per-process state built once when the host attaches to a process.
///
/// Identity and category never change afterwards. The exclusion flag is
/// sticky: once set it stays set for the process lifetime. The spoofing flag
/// is written by attach and by the host's property-change hook and read from
/// any thread, including the foreground watcher and key-attestation calls.
#[derive(Debug)]
pub struct ProcessContext {
    caller: CallerIdentity,
    category: CallerCategory,
    excluded: AtomicBool,
    spoofing_active: AtomicBool,
}

impl ProcessContext {
    pub fn attach(caller: CallerIdentity, flags: &FeatureFlags) -> Self {
        logging::set_debug(flags.debug);
        logging::set_process_tag(&caller.process_name);
        let category = classify_identity(&caller);
        Self {
            excluded: AtomicBool::new(category.is_excluded()),
            spoofing_active: AtomicBool::new(flags.spoof_master),
            caller,
            category,
        }
    }

    pub fn caller(&self) -> &CallerIdentity {
        &self.caller
    }

    pub fn package_name(&self) -> &str {
        &self.caller.package_name
    }

    pub fn process_name(&self) -> &str {
        &self.caller.process_name
    }

    /// Category as seen now; a sticky exclusion overrides the attach-time label.
    pub fn category(&self) -> CallerCategory {
        if self.is_excluded() {
            CallerCategory::ExcludedCameraApp
        } else {
            self.category
        }
    }

    pub fn is_privileged_worker(&self) -> bool {
        self.category() == CallerCategory::PrivilegedServiceProcess
    }

    pub fn is_excluded(&self) -> bool {
        self.excluded.load(Ordering::Acquire)
    }

    pub fn mark_excluded(&self) {
        self.excluded.store(true, Ordering::Release);
    }

    pub fn is_spoofing_active(&self) -> bool {
        self.spoofing_active.load(Ordering::Acquire)
    }

    pub fn set_spoofing_active(&self, active: bool) {
        self.spoofing_active.store(active, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{PACKAGE_GMS, PROCESS_GMS_UNSTABLE};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn camera_apps_attach_excluded() {
        let ctx = ProcessContext::attach(
            CallerIdentity::new("com.google.android.GoogleCamera", "com.google.android.GoogleCamera"),
            &FeatureFlags::default(),
        );
        assert!(ctx.is_excluded());
        assert_eq!(ctx.category(), CallerCategory::ExcludedCameraApp);
    }

    #[test]
    fn exclusion_is_sticky() {
        let ctx = ProcessContext::attach(
            CallerIdentity::new(PACKAGE_GMS, PROCESS_GMS_UNSTABLE),
            &FeatureFlags::default(),
        );
        assert!(ctx.is_privileged_worker());
        ctx.mark_excluded();
        assert_eq!(ctx.category(), CallerCategory::ExcludedCameraApp);
        assert!(!ctx.is_privileged_worker());
    }

    #[test]
    fn spoofing_flag_follows_master_switch() {
        let flags = FeatureFlags {
            spoof_master: false,
            ..FeatureFlags::default()
        };
        let ctx = ProcessContext::attach(CallerIdentity::new("a.b", "a.b"), &flags);
        assert!(!ctx.is_spoofing_active());
    }

    #[test]
    fn spoofing_flag_is_visible_across_threads() {
        let ctx = Arc::new(ProcessContext::attach(
            CallerIdentity::new("a.b", "a.b"),
            &FeatureFlags::default(),
        ));
        let writer = Arc::clone(&ctx);
        thread::spawn(move || writer.set_spoofing_active(false))
            .join()
            .expect("writer thread panicked");
        assert!(!ctx.is_spoofing_active());
    }
}
