use crate::dlog;
use crate::error::SpoofError;
use crate::observability;
use crate::process_state::ProcessContext;

/// Component name fragment identifying the attestation subsystem.
pub const ATTESTATION_MARKER: &str = "droidguard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub component: String,
    pub method: String,
}

impl StackFrame {
    pub fn new(component: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            method: method.into(),
        }
    }
}

/// Source of the current thread's call stack.
pub trait StackInspector {
    fn frames(&self) -> Vec<StackFrame>;
}

/// A stack captured by the host before calling into the guard.
#[derive(Debug, Clone, Default)]
pub struct CapturedStack(pub Vec<StackFrame>);

impl StackInspector for CapturedStack {
    fn frames(&self) -> Vec<StackFrame> {
        self.0.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Block,
}

pub struct AttestationGuard<S: StackInspector> {
    inspector: S,
}

impl<S: StackInspector> AttestationGuard<S> {
    pub fn new(inspector: S) -> Self {
        Self { inspector }
    }

    pub fn caller_is_attestation(&self) -> bool {
        self.inspector
            .frames()
            .iter()
            .any(|frame| frame.component.to_lowercase().contains(ATTESTATION_MARKER))
    }

    pub fn guard(&self, is_spoofing_active: bool, is_caller_excluded: bool) -> GuardDecision {
        if !is_spoofing_active || is_caller_excluded {
            return GuardDecision::Allow;
        }
        if self.caller_is_attestation() {
            GuardDecision::Block
        } else {
            GuardDecision::Allow
        }
    }

    /// Hook for the keystore certificate-chain request.
    pub fn on_engine_get_certificate_chain(&self, ctx: &ProcessContext) -> Result<(), SpoofError> {
        match self.guard(ctx.is_spoofing_active(), ctx.is_excluded()) {
            GuardDecision::Allow => Ok(()),
            GuardDecision::Block => {
                dlog!("Blocked key attestation");
                observability::record_attestation_block();
                Err(SpoofError::UnsupportedOperation)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::CallerIdentity;
    use crate::config::FeatureFlags;

    fn attestation_stack() -> CapturedStack {
        CapturedStack(vec![
            StackFrame::new("android.security.keystore2.AndroidKeyStoreSpi", "engineGetCertificateChain"),
            StackFrame::new("com.google.ccc.abuse.DroidGuard.Runtime", "run"),
        ])
    }

    fn plain_stack() -> CapturedStack {
        CapturedStack(vec![StackFrame::new("com.example.Wallet", "sign")])
    }

    #[test]
    fn blocks_only_when_all_conditions_hold() {
        let guard = AttestationGuard::new(attestation_stack());
        assert_eq!(guard.guard(true, false), GuardDecision::Block);
        assert_eq!(guard.guard(false, false), GuardDecision::Allow);
        assert_eq!(guard.guard(true, true), GuardDecision::Allow);

        let plain = AttestationGuard::new(plain_stack());
        assert_eq!(plain.guard(true, false), GuardDecision::Allow);
    }

    #[test]
    fn marker_match_ignores_case() {
        let guard = AttestationGuard::new(CapturedStack(vec![StackFrame::new("X.DROIDGUARD.y", "m")]));
        assert!(guard.caller_is_attestation());
    }

    #[test]
    fn block_surfaces_as_unsupported_operation() {
        let ctx = ProcessContext::attach(
            CallerIdentity::new("com.google.android.gms", "com.google.android.gms.unstable"),
            &FeatureFlags::default(),
        );
        let guard = AttestationGuard::new(attestation_stack());
        let err = guard.on_engine_get_certificate_chain(&ctx).unwrap_err();
        assert_eq!(err, SpoofError::UnsupportedOperation);
        assert!(err.is_fatal());

        ctx.set_spoofing_active(false);
        assert!(guard.on_engine_get_certificate_chain(&ctx).is_ok());
    }

    #[test]
    fn excluded_process_is_never_blocked() {
        let ctx = ProcessContext::attach(
            CallerIdentity::new("com.google.android.GoogleCamera", "com.google.android.GoogleCamera"),
            &FeatureFlags::default(),
        );
        let guard = AttestationGuard::new(attestation_stack());
        assert!(guard.on_engine_get_certificate_chain(&ctx).is_ok());
    }
}
