//! Early console over the serial device
//!
//! Before the paravirtual serial driver is up, characters go to the host
//! one per hypercall. This is also where `log` output ends up when the
//! crate's logger is installed.

use core::fmt::{self, Write};
use core::sync::atomic::{AtomicBool, Ordering};

use log::{Log, Metadata, Record};

use crate::arch::traits::HypercallTrap;
use crate::command::make_command;
use crate::device::{serial, DeviceId};
use crate::global::GlobalTransport;
use crate::hypercall::Hypercall;

/// Emit one byte on the host console.
pub fn early_putchar<T: HypercallTrap>(hc: &Hypercall<T>, byte: u8) {
    let mut val = byte as usize;
    // No write flag: the host has always taken this one as a plain op.
    hc.call1(make_command(DeviceId::Serial, serial::EARLY_PUTCHAR), &mut val);
}

/// `fmt::Write` sink over [`early_putchar`].
pub struct EarlyConsole<'a, T> {
    hc: &'a Hypercall<T>,
}

impl<'a, T: HypercallTrap> EarlyConsole<'a, T> {
    pub const fn new(hc: &'a Hypercall<T>) -> Self {
        Self { hc }
    }

    pub fn puts(&self, s: &str) {
        for byte in s.bytes() {
            early_putchar(self.hc, byte);
        }
    }
}

impl<T: HypercallTrap> fmt::Write for EarlyConsole<'_, T> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.puts(s);
        Ok(())
    }
}

/// `log` backend printing through a write-once transport.
///
/// Records emitted before the transport is installed are dropped, and so
/// is any record raised while a line is being written: the console's own
/// hypercalls are traced, and a second writer would interleave bytes.
pub struct KarmaLogger<'a, T> {
    transport: &'a GlobalTransport<T>,
    busy: AtomicBool,
}

impl<'a, T: HypercallTrap> KarmaLogger<'a, T> {
    pub const fn new(transport: &'a GlobalTransport<T>) -> Self {
        Self {
            transport,
            busy: AtomicBool::new(false),
        }
    }
}

impl<T: HypercallTrap + Send + Sync> Log for KarmaLogger<'_, T> {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if self.busy.swap(true, Ordering::Acquire) {
            return;
        }
        if let Ok(hc) = self.transport.get() {
            let mut out = EarlyConsole::new(hc);
            let _ = writeln!(out, "[{:<5}] {}", record.level(), record.args());
        }
        self.busy.store(false, Ordering::Release);
    }

    fn flush(&self) {}
}

#[cfg(any(target_arch = "x86_64", target_arch = "mips", target_arch = "mips64"))]
mod boot {
    use log::{LevelFilter, SetLoggerError};

    use super::KarmaLogger;
    use crate::arch::Backend;
    use crate::global;

    static LOGGER: KarmaLogger<'static, Backend> = KarmaLogger::new(&global::TRANSPORT);

    /// Install the boot transport's logger as the `log` backend.
    pub fn init_logger(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_logger(&LOGGER)?;
        log::set_max_level(level);
        Ok(())
    }
}

#[cfg(any(target_arch = "x86_64", target_arch = "mips", target_arch = "mips64"))]
pub use boot::init_logger;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use core::cell::RefCell;

    /// Collects what the host console would print.
    #[derive(Default)]
    struct Console {
        out: RefCell<Vec<u8>>,
        cmds: RefCell<Vec<Command>>,
    }

    impl HypercallTrap for Console {
        fn trap0(&self, _: Command) {}
        fn trap1(&self, cmd: Command, r1: &mut usize) {
            self.cmds.borrow_mut().push(cmd);
            self.out.borrow_mut().push(*r1 as u8);
        }
        fn trap2(&self, _: Command, _: &mut usize, _: &mut usize) {}
        fn trap3(&self, _: Command, _: &mut usize, _: &mut usize, _: &mut usize) {}
        fn trap4(&self, _: Command, _: &mut usize, _: &mut usize, _: &mut usize, _: &mut usize) {}
    }

    #[test]
    fn test_putchar_command() {
        let hc = Hypercall::new(Console::default());
        early_putchar(&hc, b'K');
        let cmds = hc.trap().cmds.borrow();
        assert_eq!(cmds[0].device(), Some(DeviceId::Serial));
        assert_eq!(cmds[0].opcode(), serial::EARLY_PUTCHAR);
        assert!(!cmds[0].is_write());
        assert_eq!(cmds[0].register_count(), 1);
        assert_eq!(*hc.trap().out.borrow(), b"K");
    }

    #[test]
    fn test_console_write_fmt() {
        let hc = Hypercall::new(Console::default());
        let mut con = EarlyConsole::new(&hc);
        write!(con, "irq {}", 21).unwrap();
        assert_eq!(*hc.trap().out.borrow(), b"irq 21");
        assert_eq!(hc.trap().cmds.borrow().len(), 6);
    }
}
