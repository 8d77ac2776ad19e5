//! Memory device: DMA window and address translation
//!
//! Two ways of asking for the DMA base are in use:
//! - register: the host answers in slot 1 (MIPS)
//! - published: slot 1 carries the physical address of a guest word the
//!   host fills in (x86)
//!
//! Either answer is a host value and is treated as untrusted; the window
//! arithmetic below is checked.

use crate::arch::traits::HypercallTrap;
use crate::command::make_command;
use crate::device::{mem, DeviceId};
use crate::error::{Error, Result};
use crate::hypercall::Hypercall;
use crate::platform::{DMA_MIN_MASK_BITS, HOST_FAILURE};
use crate::shared::{GuestPlatform, Published};

/// Whether a device with DMA mask `mask` can be served.
///
/// Allocations fall back to the low zone, so nothing tighter than a
/// 24-bit mask is honoured.
pub fn dma_supported(mask: u64) -> bool {
    cfg!(feature = "l4_dma") && mask >= (1u64 << DMA_MIN_MASK_BITS) - 1
}

/// Query the DMA base, register strategy.
pub fn dma_base<T: HypercallTrap>(hc: &Hypercall<T>) -> Result<usize> {
    let mut base = HOST_FAILURE;
    hc.call1(make_command(DeviceId::Mem, mem::DMA_BASE), &mut base);
    if base == HOST_FAILURE {
        log::warn!("[DMA] host has no dma base");
        return Err(Error::HostRejected);
    }
    log::info!("[DMA] base {:#x}", base);
    Ok(base)
}

/// Query the DMA base, published strategy.
///
/// The host writes a 32-bit base into a guest word addressed by slot 1.
pub fn dma_base_published<T, P>(hc: &Hypercall<T>, platform: &P) -> Result<usize>
where
    T: HypercallTrap,
    P: GuestPlatform + ?Sized,
{
    let mut word = Published::new(u32::MAX);
    let mut arg = word.publish(platform);
    hc.call1(make_command(DeviceId::Mem, mem::DMA_BASE), &mut arg);
    let base = word.read_back();
    if base == u32::MAX {
        log::warn!("[DMA] host left dma base unset");
        return Err(Error::HostRejected);
    }
    log::info!("[DMA] base {:#x}", base);
    Ok(base as usize)
}

/// Host-physical address backing guest-physical `gpa`.
pub fn guest_phys_to_host_phys<T: HypercallTrap>(hc: &Hypercall<T>, gpa: usize) -> Result<usize> {
    let mut guest = gpa;
    let mut host = 0;
    hc.call2(
        make_command(DeviceId::Mem, mem::GUEST_PHYS_TO_HOST_PHYS),
        &mut guest,
        &mut host,
    );
    if host == HOST_FAILURE {
        log::warn!("[DMA] no host mapping for {:#x}", gpa);
        return Err(Error::HostRejected);
    }
    Ok(host)
}

/// Guest RAM as seen by bus masters: a constant offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaWindow {
    base: usize,
}

impl DmaWindow {
    pub const fn new(base: usize) -> Self {
        Self { base }
    }

    /// Ask the host for the window (register strategy).
    pub fn probe<T: HypercallTrap>(hc: &Hypercall<T>) -> Result<Self> {
        dma_base(hc).map(Self::new)
    }

    pub fn base(&self) -> usize {
        self.base
    }

    /// Bus address of guest-physical `phys`.
    pub fn map_page(&self, phys: usize) -> Result<usize> {
        self.base.checked_add(phys).ok_or(Error::AddressOverflow)
    }

    /// Guest-physical address of bus address `dma`.
    pub fn to_phys(&self, dma: usize) -> Result<usize> {
        dma.checked_sub(self.base).ok_or(Error::AddressOverflow)
    }
}
