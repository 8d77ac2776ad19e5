//! Guest/host shared memory
//!
//! Memory in this module is foreign-owned: the host maps the same pages
//! and writes them while the guest runs. No lock protects it. Instead:
//!
//! - every field has exactly one writer (see [`GicSharedState`])
//! - multi-field requests handed to the host by address go through
//!   [`Published`], which fences before the address is produced
//!
//! The guest kernel supplies address translation and mapping through
//! [`GuestPlatform`].

use core::ptr::NonNull;
use core::sync::atomic::{fence, AtomicU32, Ordering};

use crate::platform::LINES_PER_WORD;

/// Kernel services this crate consumes.
///
/// # Safety
/// `ioremap` must return a mapping that stays valid, readable and
/// writable for the rest of the guest's lifetime, and `virt_to_phys`
/// must return the guest-physical address the host will dereference.
pub unsafe trait GuestPlatform {
    /// Guest-physical address of the byte at `ptr`.
    fn virt_to_phys(&self, ptr: *const u8) -> usize;

    /// Map a host-described physical range; `None` if it can't be mapped.
    fn ioremap(&self, phys: usize, size: usize) -> Option<NonNull<u8>>;
}

/// Karma GIC shared state, `W` words per bitmask.
///
/// Layout is fixed by the host: `enabled`, `level_triggered`, `pending`,
/// each `W` little 32-bit words, bit `i % 32` of word `i / 32` = line `i`.
///
/// Writers:
/// - `enabled`: guest only
/// - `level_triggered`, `pending`: host only
#[repr(C)]
pub struct GicSharedState<const W: usize = 1> {
    enabled: [AtomicU32; W],
    level_triggered: [AtomicU32; W],
    pending: [AtomicU32; W],
}

impl<const W: usize> GicSharedState<W> {
    /// Lines covered by this layout.
    pub const LINES: u32 = W as u32 * LINES_PER_WORD;

    /// All lines disabled, edge-triggered, nothing pending.
    pub const fn new() -> Self {
        Self {
            enabled: [const { AtomicU32::new(0) }; W],
            level_triggered: [const { AtomicU32::new(0) }; W],
            pending: [const { AtomicU32::new(0) }; W],
        }
    }

    // ── Guest side ──────────────────────────────────────────────────

    pub fn enabled(&self, word: usize) -> u32 {
        self.enabled[word].load(Ordering::Relaxed)
    }

    pub fn level_triggered(&self, word: usize) -> u32 {
        self.level_triggered[word].load(Ordering::Relaxed)
    }

    pub fn pending(&self, word: usize) -> u32 {
        self.pending[word].load(Ordering::Acquire)
    }

    /// Set `mask` in `enabled[word]`; the host sees it on its next
    /// delivery decision.
    pub fn enable(&self, word: usize, mask: u32) {
        self.enabled[word].fetch_or(mask, Ordering::Release);
    }

    pub fn disable(&self, word: usize, mask: u32) {
        self.enabled[word].fetch_and(!mask, Ordering::Release);
    }

    /// Lowest line with its pending bit set.
    pub fn first_pending(&self) -> Option<u32> {
        (0..W).find_map(|w| {
            let bits = self.pending(w);
            (bits != 0).then(|| w as u32 * LINES_PER_WORD + bits.trailing_zeros())
        })
    }

    // ── Host side ───────────────────────────────────────────────────
    // Used by host emulations (and tests) that own the other end.

    pub fn host_raise(&self, line: u32) {
        let (w, mask) = split(line);
        self.pending[w].fetch_or(mask, Ordering::Release);
    }

    pub fn host_clear(&self, line: u32) {
        let (w, mask) = split(line);
        self.pending[w].fetch_and(!mask, Ordering::Release);
    }

    pub fn host_set_level(&self, line: u32, level: bool) {
        let (w, mask) = split(line);
        if level {
            self.level_triggered[w].fetch_or(mask, Ordering::Relaxed);
        } else {
            self.level_triggered[w].fetch_and(!mask, Ordering::Relaxed);
        }
    }
}

impl<const W: usize> Default for GicSharedState<W> {
    fn default() -> Self {
        Self::new()
    }
}

/// Word index and bit mask of `line`.
#[inline]
pub const fn split(line: u32) -> (usize, u32) {
    (
        (line / LINES_PER_WORD) as usize,
        1 << (line % LINES_PER_WORD),
    )
}

/// A request the host reads and answers in place, by physical address.
///
/// Fill every field first, then [`publish`](Self::publish). It issues a
/// full fence before producing the address, so the host never observes a
/// partially written request. Read the answer with
/// [`read_back`](Self::read_back) after the hypercall returns.
#[repr(transparent)]
pub struct Published<T> {
    req: T,
}

impl<T: Copy> Published<T> {
    pub const fn new(req: T) -> Self {
        Self { req }
    }

    /// Fence, then return the guest-physical address of the request.
    pub fn publish<P: GuestPlatform + ?Sized>(&mut self, platform: &P) -> usize {
        let ptr = core::ptr::addr_of_mut!(self.req) as *const u8;
        fence(Ordering::SeqCst);
        platform.virt_to_phys(ptr)
    }

    /// The request as the host left it.
    pub fn read_back(&self) -> T {
        fence(Ordering::Acquire);
        // SAFETY: `req` is a valid, aligned T; volatile keeps the compiler
        // from reusing values cached before the host wrote it.
        unsafe { core::ptr::read_volatile(&self.req) }
    }
}
