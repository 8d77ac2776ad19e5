//! Karma Virtual Interrupt Controller
//!
//! The host multiplexes every virtual device interrupt onto one guest
//! interrupt line. Which source fired, which sources the guest accepts
//! and which are level-triggered all live in a page shared with the host
//! ([`GicSharedState`]).
//!
//! ## Per-line state machine
//! Lines start `Disabled`.
//! - `mask`: clear the `enabled` bit locally, no hypercall
//! - `mask_ack`: `mask`, then an ack hypercall when the [`AckPolicy`]
//!   asks for one
//! - `unmask`:
//!   - level-triggered line: `ENABLE` hypercall; the host re-asserts the
//!     line and sets `enabled` itself
//!   - edge-triggered line: set the `enabled` bit locally, no hypercall
//!
//! Edge traffic therefore never re-enters the host on the mask/unmask
//! path, only on the original event delivery.
//!
//! ## Dispatch
//! On the multiplexed interrupt, the lowest pending line is translated
//! through the controller's IRQ offset and handed to the guest's generic
//! dispatch. An empty `pending` set is a spurious interrupt: counted,
//! logged, not fatal.

use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use crate::arch::traits::{HypercallTrap, InterruptChip};
use crate::device::{gic, DeviceId};
use crate::error::{Error, Result};
use crate::hypercall::Hypercall;
use crate::platform::{GIC_SHARED_SIZE, HOST_FAILURE, MACHVIRT_INT_BASE, MAX_GIC_NR};
use crate::shared::{split, GicSharedState, GuestPlatform};

/// What `mask_ack` does after masking.
///
/// The MIPS port acknowledges every line to the host; the x86 port left
/// acknowledge as an empty stub. Both are kept as explicit strategies.
/// Either way the line is masked first: `NoOp` still clears `enabled`,
/// unlike the x86 stub, which touched nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckPolicy {
    /// Write `gic::ACK` with the line
    Hypercall,
    /// Mask only, no hypercall
    NoOp,
}

impl AckPolicy {
    /// Policy of the architecture this crate is built for.
    pub const fn native() -> Self {
        if cfg!(any(target_arch = "mips", target_arch = "mips64")) {
            AckPolicy::Hypercall
        } else {
            AckPolicy::NoOp
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    Disabled,
    Enabled,
}

/// Which path an `unmask` took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unmask {
    /// Edge line: `enabled` bit set locally
    Local,
    /// Level line: host told through `gic::ENABLE`
    Hypercall,
}

/// Outcome of one multiplexed interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Guest IRQ handed to the generic dispatch
    Handled(u32),
    Spurious,
}

/// Karma GIC instance.
pub struct KarmaGic<'a, T, const W: usize = 1> {
    hc: &'a Hypercall<T>,
    shared: &'a GicSharedState<W>,
    gic_nr: u32,
    irq_offset: u32,
    ack: AckPolicy,
    /// Guest-side line state; `shared.enabled` lags it on level lines
    /// until the host re-arms them.
    unmasked: [AtomicU32; W],
    spurious: AtomicUsize,
}

impl<'a, T: HypercallTrap, const W: usize> KarmaGic<'a, T, W> {
    /// Bring up controller `gic_nr` with its first line at guest IRQ
    /// `irq_start`.
    ///
    /// One hypercall fetches the physical base of the shared block, which
    /// is then mapped through `platform`.
    pub fn init<P: GuestPlatform + ?Sized>(
        hc: &'a Hypercall<T>,
        platform: &P,
        gic_nr: u32,
        irq_start: u32,
        ack: AckPolicy,
    ) -> Result<Self> {
        if gic_nr >= MAX_GIC_NR {
            log::error!("[KARMA_GIC] gic_nr {} out of range", gic_nr);
            return Err(Error::ControllerOutOfRange(gic_nr));
        }
        Self::check_offset(irq_start)?;
        let needed = core::mem::size_of::<GicSharedState<W>>();
        if needed > GIC_SHARED_SIZE {
            return Err(Error::SharedBlockTooSmall {
                needed,
                window: GIC_SHARED_SIZE,
            });
        }

        log::info!("[KARMA_GIC] gic_nr {} irq_start {}", gic_nr, irq_start);

        let phys = hc.read(DeviceId::Gic, gic::GET_BASE_REG);
        if phys == HOST_FAILURE {
            log::error!("[KARMA_GIC] host refused shared base");
            return Err(Error::HostRejected);
        }
        log::info!("[KARMA_GIC] base {:#x}", phys);

        let base = platform
            .ioremap(phys, GIC_SHARED_SIZE)
            .ok_or(Error::MapFailed {
                phys,
                size: GIC_SHARED_SIZE,
            })?;
        if base.as_ptr() as usize % core::mem::align_of::<GicSharedState<W>>() != 0 {
            return Err(Error::Misaligned(base.as_ptr() as usize));
        }
        log::info!("[KARMA_GIC] mapped at {:p}", base.as_ptr());

        // SAFETY: GuestPlatform guarantees the mapping outlives the guest;
        // size and alignment were checked above.
        let shared = unsafe { &*(base.as_ptr() as *const GicSharedState<W>) };
        Self::from_shared(hc, shared, gic_nr, irq_start, ack)
    }

    /// Controller 0 at the mach-virt interrupt base, with the
    /// architecture's own ack policy.
    pub fn init_native<P: GuestPlatform + ?Sized>(
        hc: &'a Hypercall<T>,
        platform: &P,
    ) -> Result<Self> {
        Self::init(hc, platform, 0, MACHVIRT_INT_BASE, AckPolicy::native())
    }

    /// Wrap an already mapped shared block.
    pub fn from_shared(
        hc: &'a Hypercall<T>,
        shared: &'a GicSharedState<W>,
        gic_nr: u32,
        irq_offset: u32,
        ack: AckPolicy,
    ) -> Result<Self> {
        Self::check_offset(irq_offset)?;
        Ok(Self {
            hc,
            shared,
            gic_nr,
            irq_offset,
            ack,
            unmasked: [const { AtomicU32::new(0) }; W],
            spurious: AtomicUsize::new(0),
        })
    }

    /// Every guest IRQ of the controller must fit in a `u32`.
    fn check_offset(irq_offset: u32) -> Result<()> {
        match irq_offset.checked_add(GicSharedState::<W>::LINES) {
            Some(_) => Ok(()),
            None => {
                log::error!("[KARMA_GIC] irq_start {} overflows", irq_offset);
                Err(Error::LineOutOfRange(irq_offset))
            }
        }
    }

    pub fn gic_nr(&self) -> u32 {
        self.gic_nr
    }

    pub fn irq_offset(&self) -> u32 {
        self.irq_offset
    }

    pub fn ack_policy(&self) -> AckPolicy {
        self.ack
    }

    pub fn shared(&self) -> &GicSharedState<W> {
        self.shared
    }

    /// Guest IRQ numbers served by this controller.
    pub fn irqs(&self) -> core::ops::Range<u32> {
        self.irq_offset..self.irq_offset + GicSharedState::<W>::LINES
    }

    /// Controller line of guest IRQ `irq`.
    fn line(&self, irq: u32) -> Result<u32> {
        match irq.checked_sub(self.irq_offset) {
            Some(line) if line < GicSharedState::<W>::LINES => Ok(line),
            _ => Err(Error::LineOutOfRange(irq)),
        }
    }

    pub fn mask(&self, irq: u32) -> Result<()> {
        let (w, mask) = split(self.line(irq)?);
        self.unmasked[w].fetch_and(!mask, Ordering::Relaxed);
        self.shared.disable(w, mask);
        log::trace!("[KARMA_GIC] mask {}", irq);
        Ok(())
    }

    pub fn mask_ack(&self, irq: u32) -> Result<()> {
        let line = self.line(irq)?;
        let (w, mask) = split(line);
        self.unmasked[w].fetch_and(!mask, Ordering::Relaxed);
        self.shared.disable(w, mask);
        if self.ack == AckPolicy::Hypercall {
            self.hc.write(DeviceId::Gic, gic::ACK, line as usize);
        }
        log::trace!("[KARMA_GIC] mask_ack {}", irq);
        Ok(())
    }

    pub fn unmask(&self, irq: u32) -> Result<Unmask> {
        let line = self.line(irq)?;
        let (w, mask) = split(line);
        self.unmasked[w].fetch_or(mask, Ordering::Relaxed);
        // Level sources must be re-armed by the host
        if self.shared.level_triggered(w) & mask != 0 {
            self.hc.write(DeviceId::Gic, gic::ENABLE, line as usize);
            log::trace!("[KARMA_GIC] unmask {} (level)", irq);
            Ok(Unmask::Hypercall)
        } else {
            self.shared.enable(w, mask);
            log::trace!("[KARMA_GIC] unmask {}", irq);
            Ok(Unmask::Local)
        }
    }

    /// Unmask every line, as the x86 bring-up does right after init.
    pub fn enable_all(&self) {
        for irq in self.irqs() {
            // every irq in range, cannot fail
            let _ = self.unmask(irq);
        }
    }

    /// Line state as the guest left it. A level line reads `Enabled`
    /// right after `unmask`, before the host has set its `enabled` bit.
    pub fn state(&self, irq: u32) -> Result<LineState> {
        Ok(if self.is_enabled(irq)? {
            LineState::Enabled
        } else {
            LineState::Disabled
        })
    }

    pub fn is_enabled(&self, irq: u32) -> Result<bool> {
        let (w, mask) = split(self.line(irq)?);
        Ok(self.unmasked[w].load(Ordering::Relaxed) & mask != 0)
    }

    /// Handle the multiplexed interrupt `parent_irq`.
    ///
    /// `handle` is the guest's generic dispatch; it runs at most once,
    /// with the guest IRQ of the lowest pending line.
    pub fn dispatch<F: FnMut(u32)>(&self, parent_irq: u32, mut handle: F) -> Dispatch {
        match self.shared.first_pending() {
            Some(line) => {
                let irq = self.irq_offset + line;
                log::trace!("[KARMA_GIC] parent {} -> irq {}", parent_irq, irq);
                handle(irq);
                Dispatch::Handled(irq)
            }
            None => {
                self.spurious.fetch_add(1, Ordering::Relaxed);
                log::warn!("[KARMA_GIC] spurious interrupt on {}", parent_irq);
                Dispatch::Spurious
            }
        }
    }

    pub fn spurious_count(&self) -> usize {
        self.spurious.load(Ordering::Relaxed)
    }

    /// Route the controller to the first CPU in `cpu_mask`.
    #[cfg(feature = "smp")]
    pub fn set_affinity(&self, cpu_mask: u64) -> Result<usize> {
        if cpu_mask == 0 {
            return Err(Error::EmptyCpuMask);
        }
        let cpu = cpu_mask.trailing_zeros();
        let bit = 1usize.checked_shl(cpu).ok_or(Error::EmptyCpuMask)?;
        self.hc.write(DeviceId::Gic, gic::SET_CPU, bit);
        let cpu = cpu as usize;
        log::debug!("[KARMA_GIC] affinity -> cpu {}", cpu);
        Ok(cpu)
    }
}

impl<T: HypercallTrap, const W: usize> InterruptChip for KarmaGic<'_, T, W> {
    fn mask(&self, irq: u32) -> Result<()> {
        KarmaGic::mask(self, irq)
    }

    fn unmask(&self, irq: u32) -> Result<()> {
        KarmaGic::unmask(self, irq).map(|_| ())
    }

    fn mask_ack(&self, irq: u32) -> Result<()> {
        KarmaGic::mask_ack(self, irq)
    }
}
