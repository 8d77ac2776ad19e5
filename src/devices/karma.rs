//! Generic VMM services

use crate::arch::traits::HypercallTrap;
use crate::command::make_command;
use crate::device::{karma, DeviceId};
use crate::hypercall::Hypercall;

/// Host CPU clock in kHz.
pub fn cpu_khz<T: HypercallTrap>(hc: &Hypercall<T>) -> usize {
    let khz = hc.read(DeviceId::Karma, karma::GET_KHZ_CPU);
    log::debug!("[HYPERCALL] cpu {} kHz", khz);
    khz
}

/// Ask the VMM to tear the guest down.
///
/// Normally does not return; if the host ignores the request the caller
/// gets control back.
pub fn exit<T: HypercallTrap>(hc: &Hypercall<T>) {
    log::info!("[HYPERCALL] guest exit");
    hc.call0(make_command(DeviceId::Karma, karma::EXIT));
}
