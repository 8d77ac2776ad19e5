//! Shared fixtures: a recording host and a heap-backed guest platform.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::ptr::NonNull;

use karma_guest::arch::traits::HypercallTrap;
use karma_guest::device::{gic, DeviceId};
use karma_guest::{Command, GicSharedState, GuestPlatform};

/// Guest-physical address the host hands out for the shared block.
pub const SHARED_PHYS: usize = 0x1F00_0000;

/// One trap as the host saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trap {
    pub cmd: Command,
    /// Slot values on entry
    pub args: Vec<usize>,
}

/// Records every trap; answers `gic::GET_BASE_REG` with `gic_base` and
/// any other read with `reply`.
pub struct MockHost {
    pub traps: RefCell<Vec<Trap>>,
    pub gic_base: Cell<usize>,
    pub reply: Cell<usize>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            traps: RefCell::new(Vec::new()),
            gic_base: Cell::new(SHARED_PHYS),
            reply: Cell::new(0),
        }
    }

    pub fn traps(&self) -> Vec<Trap> {
        self.traps.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.traps.borrow().len()
    }

    fn record(&self, cmd: Command, args: &[usize]) {
        self.traps.borrow_mut().push(Trap {
            cmd,
            args: args.to_vec(),
        });
    }

    fn answer(&self, cmd: Command) -> Option<usize> {
        if cmd.is_write() {
            return None;
        }
        if cmd.device() == Some(DeviceId::Gic) && cmd.opcode() == gic::GET_BASE_REG {
            return Some(self.gic_base.get());
        }
        Some(self.reply.get())
    }
}

impl HypercallTrap for MockHost {
    fn trap0(&self, cmd: Command) {
        self.record(cmd, &[]);
    }

    fn trap1(&self, cmd: Command, r1: &mut usize) {
        self.record(cmd, &[*r1]);
        if let Some(v) = self.answer(cmd) {
            *r1 = v;
        }
    }

    fn trap2(&self, cmd: Command, r1: &mut usize, r2: &mut usize) {
        self.record(cmd, &[*r1, *r2]);
        if let Some(v) = self.answer(cmd) {
            *r2 = v;
        }
    }

    fn trap3(&self, cmd: Command, r1: &mut usize, r2: &mut usize, r3: &mut usize) {
        self.record(cmd, &[*r1, *r2, *r3]);
    }

    fn trap4(&self, cmd: Command, r1: &mut usize, r2: &mut usize, r3: &mut usize, r4: &mut usize) {
        self.record(cmd, &[*r1, *r2, *r3, *r4]);
    }
}

/// Guest kernel stand-in: identity `virt_to_phys`, and `ioremap` of
/// [`SHARED_PHYS`] yields a leaked heap block.
pub struct HeapPlatform {
    shared: &'static GicSharedState<1>,
    pub mapped: Cell<Option<(usize, usize)>>,
}

impl HeapPlatform {
    pub fn new() -> Self {
        Self {
            shared: Box::leak(Box::new(GicSharedState::new())),
            mapped: Cell::new(None),
        }
    }

    /// The host's view of the block.
    pub fn host(&self) -> &'static GicSharedState<1> {
        self.shared
    }
}

unsafe impl GuestPlatform for HeapPlatform {
    fn virt_to_phys(&self, ptr: *const u8) -> usize {
        ptr as usize
    }

    fn ioremap(&self, phys: usize, size: usize) -> Option<NonNull<u8>> {
        if phys != SHARED_PHYS {
            return None;
        }
        self.mapped.set(Some((phys, size)));
        NonNull::new(self.shared as *const _ as *mut u8)
    }
}
