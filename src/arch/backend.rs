/// Trap backend selection
use super::traits::HypercallTrap;
use crate::command::Command;
#[cfg(any(target_arch = "mips", target_arch = "mips64"))]
use super::mips;
#[cfg(target_arch = "x86_64")]
use super::x86;

/// Trap backend of the running architecture, resolved once at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// `vmmcall`, AMD-V hosts
    #[cfg(target_arch = "x86_64")]
    Svm,
    /// `vmcall`, VT-x hosts (also the default when the vendor is unknown)
    #[cfg(target_arch = "x86_64")]
    Vmx,
    /// `hypcall`, MIPS VZ
    #[cfg(any(target_arch = "mips", target_arch = "mips64"))]
    Vz,
}

impl Backend {
    /// Probe the CPU and pick the trap flavour.
    ///
    /// Pure given the CPU identification result: calling it again
    /// yields the same backend.
    #[cfg(target_arch = "x86_64")]
    pub fn resolve() -> Self {
        Self::from_vendor(&x86::probe_vendor())
    }

    #[cfg(any(target_arch = "mips", target_arch = "mips64"))]
    pub fn resolve() -> Self {
        Backend::Vz
    }

    /// Vendor match on x86: SVM signatures select `Svm`, anything else
    /// falls back to `Vmx`.
    #[cfg(target_arch = "x86_64")]
    pub fn from_vendor(sig: &x86::VendorSignature) -> Self {
        if sig.is_svm() {
            Backend::Svm
        } else {
            Backend::Vmx
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            #[cfg(target_arch = "x86_64")]
            Backend::Svm => "svm",
            #[cfg(target_arch = "x86_64")]
            Backend::Vmx => "vmx",
            #[cfg(any(target_arch = "mips", target_arch = "mips64"))]
            Backend::Vz => "vz",
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $trap:ident ( $($arg:expr),* )) => {
        match $self {
            #[cfg(target_arch = "x86_64")]
            Backend::Svm => x86::Svm.$trap($($arg),*),
            #[cfg(target_arch = "x86_64")]
            Backend::Vmx => x86::Vmx.$trap($($arg),*),
            #[cfg(any(target_arch = "mips", target_arch = "mips64"))]
            Backend::Vz => mips::Vz.$trap($($arg),*),
        }
    };
}

impl HypercallTrap for Backend {
    #[inline]
    fn trap0(&self, cmd: Command) {
        dispatch!(self, trap0(cmd))
    }

    #[inline]
    fn trap1(&self, cmd: Command, r1: &mut usize) {
        dispatch!(self, trap1(cmd, r1))
    }

    #[inline]
    fn trap2(&self, cmd: Command, r1: &mut usize, r2: &mut usize) {
        dispatch!(self, trap2(cmd, r1, r2))
    }

    #[inline]
    fn trap3(&self, cmd: Command, r1: &mut usize, r2: &mut usize, r3: &mut usize) {
        dispatch!(self, trap3(cmd, r1, r2, r3))
    }

    #[inline]
    fn trap4(
        &self,
        cmd: Command,
        r1: &mut usize,
        r2: &mut usize,
        r3: &mut usize,
        r4: &mut usize,
    ) {
        dispatch!(self, trap4(cmd, r1, r2, r3, r4))
    }
}
