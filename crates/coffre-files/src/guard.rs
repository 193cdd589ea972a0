//! Secret-buffer guard capability
//!
//! Platform memory protection for long-lived secrets (page locking on one
//! OS, sealed-storage reseal on another) is selected once at startup and
//! plugged in here. The core codec does not depend on any of it; short-lived
//! keys rely on zeroize-on-drop alone.

/// Guards a secret buffer while it is resident in memory.
pub trait SecretGuard {
    /// Apply protection to a buffer that now holds a secret.
    fn guard(&self, secret: &mut [u8]);

    /// Release protection before the buffer is zeroized and freed.
    fn release(&self, secret: &mut [u8]);
}

/// No-op guard for platforms without a protection backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGuard;

impl SecretGuard for NoopGuard {
    fn guard(&self, _secret: &mut [u8]) {}

    fn release(&self, _secret: &mut [u8]) {}
}
