/// CPUID vendor probe
///
/// Karma runs on Fiasco, which reports its own vendor signature through
/// CPUID leaf 0. The signature tells the guest which virtualization
/// extension the host uses, and with it which trap instruction exits
/// to the VMM.
use crate::platform::{CPUID_VENDOR_LEAF, SIG_AUTHENTIC_AMD, SIG_WICKED_FIASCO};

/// Vendor signature words in string order (EBX, EDX, ECX).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorSignature(pub [u32; 3]);

impl VendorSignature {
    pub const fn new(ebx: u32, edx: u32, ecx: u32) -> Self {
        Self([ebx, edx, ecx])
    }

    /// True for the signatures of SVM (AMD-V) hosts.
    pub fn is_svm(&self) -> bool {
        self.0 == SIG_WICKED_FIASCO || self.0 == SIG_AUTHENTIC_AMD
    }

    /// The 12 vendor bytes, as CPUID spells them.
    pub fn bytes(&self) -> [u8; 12] {
        let mut out = [0u8; 12];
        for (i, word) in self.0.iter().enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
        }
        out
    }
}

/// Execute CPUID on the vendor leaf.
pub fn probe_vendor() -> VendorSignature {
    let (ebx, ecx, edx) = cpuid(CPUID_VENDOR_LEAF);
    VendorSignature::new(ebx, edx, ecx)
}

/// Run CPUID, returning (EBX, ECX, EDX).
///
/// RBX is reserved by LLVM, so it is saved through a scratch register.
#[inline]
fn cpuid(leaf: u32) -> (u32, u32, u32) {
    let rbx: u64;
    let ecx: u32;
    let edx: u32;
    // SAFETY: CPUID has no side effects beyond its output registers.
    unsafe {
        core::arch::asm!(
            "mov {rbx_save}, rbx",
            "cpuid",
            "xchg {rbx_save}, rbx",
            rbx_save = out(reg) rbx,
            inout("eax") leaf => _,
            inout("ecx") 0u32 => ecx,
            out("edx") edx,
            options(nostack, nomem),
        );
    }
    (rbx as u32, ecx, edx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wicked_fiasco_is_svm() {
        let sig = VendorSignature::new(0x6B63_6957, 0x6946_6564, 0x6F63_7361);
        assert_eq!(&sig.bytes(), b"WickedFiasco");
        assert!(sig.is_svm());
    }

    #[test]
    fn test_authentic_amd_is_svm() {
        let sig = VendorSignature(SIG_AUTHENTIC_AMD);
        assert_eq!(&sig.bytes(), b"AuthenticAMD");
        assert!(sig.is_svm());
    }

    #[test]
    fn test_other_vendors_are_vmx() {
        // "FiascoWicked" is what Fiasco reports on VT-x
        let mut words = [0u32; 3];
        for (i, chunk) in b"FiascoWicked".chunks(4).enumerate() {
            words[i] = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        assert!(!VendorSignature(words).is_svm());
        assert!(!VendorSignature([0; 3]).is_svm());
    }

    #[test]
    fn test_probe_is_stable() {
        assert_eq!(probe_vendor(), probe_vendor());
    }
}
