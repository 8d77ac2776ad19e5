//! Karma Hypercall Transport
//!
//! Five entry points differing only in how many in/out register slots
//! travel with the command word. The 1-4 argument paths stamp the slot
//! count into the command word before trapping; the zero-argument path
//! sends the word unchanged.
//!
//! ## Call flow
//! 1. Adapter builds a command with [`make_command`]
//! 2. `callN` sets the register count to N (N >= 1)
//! 3. The backend traps into the VMM with the word and the N slots
//! 4. The host writes results back into the slots and resumes the guest
//!
//! The transport checks nothing: a rejected command comes back as
//! whatever the host left in the slots (usually the all-ones sentinel),
//! and only the adapter knows how to read it.

use crate::arch::traits::HypercallTrap;
use crate::command::{make_command, set_register_count, Command};
use crate::device::DeviceId;

/// Hypercall transport over a trap backend.
#[derive(Debug, Clone, Copy)]
pub struct Hypercall<T> {
    trap: T,
}

impl<T: HypercallTrap> Hypercall<T> {
    pub const fn new(trap: T) -> Self {
        Self { trap }
    }

    pub fn trap(&self) -> &T {
        &self.trap
    }

    #[inline]
    pub fn call0(&self, cmd: Command) {
        log::trace!("[HYPERCALL] {:?}", cmd);
        self.trap.trap0(cmd);
    }

    #[inline]
    pub fn call1(&self, cmd: Command, r1: &mut usize) {
        let cmd = set_register_count(cmd, 1);
        log::trace!("[HYPERCALL] {:?} r1={:#x}", cmd, *r1);
        self.trap.trap1(cmd, r1);
    }

    #[inline]
    pub fn call2(&self, cmd: Command, r1: &mut usize, r2: &mut usize) {
        let cmd = set_register_count(cmd, 2);
        log::trace!("[HYPERCALL] {:?} r1={:#x} r2={:#x}", cmd, *r1, *r2);
        self.trap.trap2(cmd, r1, r2);
    }

    #[inline]
    pub fn call3(&self, cmd: Command, r1: &mut usize, r2: &mut usize, r3: &mut usize) {
        let cmd = set_register_count(cmd, 3);
        log::trace!("[HYPERCALL] {:?}", cmd);
        self.trap.trap3(cmd, r1, r2, r3);
    }

    #[inline]
    pub fn call4(
        &self,
        cmd: Command,
        r1: &mut usize,
        r2: &mut usize,
        r3: &mut usize,
        r4: &mut usize,
    ) {
        let cmd = set_register_count(cmd, 4);
        log::trace!("[HYPERCALL] {:?}", cmd);
        self.trap.trap4(cmd, r1, r2, r3, r4);
    }

    /// Register-style read: the host produces a value in slot 1.
    pub fn read(&self, device: DeviceId, opcode: u16) -> usize {
        let mut ret = 0;
        self.call1(make_command(device, opcode), &mut ret);
        ret
    }

    /// Register-style write: the host consumes `value` from slot 1.
    ///
    /// Returns whatever the host left in the slot afterwards.
    pub fn write(&self, device: DeviceId, opcode: u16, value: usize) -> usize {
        let mut val = value;
        self.call1(make_command(device, opcode).with_write(), &mut val);
        val
    }
}
