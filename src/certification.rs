//! Gate deciding whether the privileged worker should receive a certified
//! device profile.
//!
//! While the account-setup screen is in front, spoofing is skipped. The skip
//! is only valid as long as that screen stays in the same state, so a
//! listener watches the foreground task and asks the host to terminate the
//! process as soon as the state flips. The supervisor restarts the process,
//! which then decides again from a clean state.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::classifier::{CallerCategory, CallerIdentity, PACKAGE_GMS};
use crate::observability::{self, ErrorClass};
use crate::{dlog, elog};

const ADD_ACCOUNT_REASON: &str = "GmsAddAccountActivityOnTop";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentName {
    pub package: String,
    pub class: String,
}

impl ComponentName {
    /// Parses `pkg/cls` and the `pkg/.cls` shorthand.
    pub fn unflatten(flat: &str) -> Option<Self> {
        let (package, class) = flat.split_once('/')?;
        if package.is_empty() || class.is_empty() {
            return None;
        }
        let class = if class.starts_with('.') {
            format!("{}{}", package, class)
        } else {
            class.to_string()
        };
        Some(Self {
            package: package.to_string(),
            class,
        })
    }

    pub fn gms_add_account_activity() -> Self {
        Self {
            package: PACKAGE_GMS.to_string(),
            class: "com.google.android.gms.auth.uiflows.minutemaid.MinuteMaidActivity".to_string(),
        }
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package, self.class)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("task stack watch failed: {0}")]
pub struct WatchError(pub String);

pub type TaskStackCallback = Box<dyn Fn() + Send + Sync>;

/// Foreground task introspection provided by the host.
pub trait ForegroundTaskWatcher: Send + Sync {
    fn is_activity_on_top(&self, component: &ComponentName) -> bool;

    /// Registers `callback` to run on a host thread on every task-stack change.
    fn register_listener(&self, callback: TaskStackCallback) -> Result<(), WatchError>;
}

/// Terminates the current process so the supervisor can restart it.
pub trait SelfTerminator: Send + Sync {
    fn terminate(&self, reason: &str);
}

pub trait CertificationGate {
    fn should_try_to_certify(&self, caller: &CallerIdentity, category: CallerCategory) -> bool;
}

/// Trigger condition of the foreground watch.
pub fn snapshot_flipped(was: bool, is_now: bool) -> bool {
    was ^ is_now
}

/// Compares each new foreground state with the snapshot taken at decision time.
/// Termination is requested at most once.
pub struct ForegroundFlipMonitor {
    was: bool,
    fired: AtomicBool,
    terminator: Arc<dyn SelfTerminator>,
}

impl ForegroundFlipMonitor {
    pub fn new(was: bool, terminator: Arc<dyn SelfTerminator>) -> Self {
        Self {
            was,
            fired: AtomicBool::new(false),
            terminator,
        }
    }

    /// Returns whether this event requested termination.
    pub fn on_task_stack_changed(&self, is_now: bool) -> bool {
        if !snapshot_flipped(self.was, is_now) {
            return false;
        }
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        dlog!(
            "{} changed: isNow={}, was={}, killing myself!",
            ADD_ACCOUNT_REASON,
            is_now,
            self.was
        );
        observability::record_self_termination();
        self.terminator.terminate(ADD_ACCOUNT_REASON);
        true
    }
}

pub struct ForegroundCertificationGate<W: ForegroundTaskWatcher + 'static> {
    watcher: Arc<W>,
    terminator: Arc<dyn SelfTerminator>,
    watched: ComponentName,
    listening: AtomicBool,
}

impl<W: ForegroundTaskWatcher + 'static> ForegroundCertificationGate<W> {
    pub fn new(watcher: Arc<W>, terminator: Arc<dyn SelfTerminator>) -> Self {
        Self {
            watcher,
            terminator,
            watched: ComponentName::gms_add_account_activity(),
            listening: AtomicBool::new(false),
        }
    }
}

impl<W: ForegroundTaskWatcher + 'static> CertificationGate for ForegroundCertificationGate<W> {
    fn should_try_to_certify(&self, caller: &CallerIdentity, category: CallerCategory) -> bool {
        if category != CallerCategory::PrivilegedServiceProcess {
            return false;
        }
        if !caller.process_name.to_lowercase().contains("unstable") {
            return false;
        }

        let was = self.watcher.is_activity_on_top(&self.watched);
        if !was {
            return true;
        }
        dlog!("Skip spoofing build for GMS, because {}!", ADD_ACCOUNT_REASON);
        if self.listening.swap(true, Ordering::AcqRel) {
            return false;
        }

        let monitor = ForegroundFlipMonitor::new(was, Arc::clone(&self.terminator));
        let watcher = Arc::clone(&self.watcher);
        let watched = self.watched.clone();
        let callback: TaskStackCallback = Box::new(move || {
            monitor.on_task_stack_changed(watcher.is_activity_on_top(&watched));
        });
        match self.watcher.register_listener(callback) {
            Ok(()) => false,
            Err(err) => {
                self.listening.store(false, Ordering::Release);
                elog!("Failed to register task stack listener: {}", err);
                observability::record_error(ErrorClass::LISTENER_REGISTRATION);
                true
            }
        }
    }
}

/// Gate that always answers the same; for hosts without task introspection.
#[derive(Debug, Clone, Copy)]
pub struct FixedGate(pub bool);

impl CertificationGate for FixedGate {
    fn should_try_to_certify(&self, _caller: &CallerIdentity, category: CallerCategory) -> bool {
        self.0 && category == CallerCategory::PrivilegedServiceProcess
    }
}

/// Looks up the uid owning a package.
pub trait PackageUidResolver {
    fn package_uid(&self, package: &str) -> Option<u32>;
}

/// The trusted services package lacks the task-management permission, so
/// its binder calls bypass that check.
pub fn should_bypass_task_permission(calling_uid: u32, resolver: &dyn PackageUidResolver) -> bool {
    match resolver.package_uid(PACKAGE_GMS) {
        Some(gms_uid) => {
            dlog!("shouldBypassTaskPermission: gmsUid:{} callingUid:{}", gms_uid, calling_uid);
            gms_uid == calling_uid
        }
        None => {
            elog!("shouldBypassTaskPermission: unable to get gms uid");
            false
        }
    }
}
