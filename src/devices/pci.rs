//! Virtual PCI host bridge
//!
//! Configuration-space accesses and IRQ routing are requests the host
//! answers in place: the guest fills a `#[repr(C)]` block, publishes its
//! physical address through slot 1 of a write command and reads the
//! result fields back after the hypercall.

use crate::arch::traits::HypercallTrap;
use crate::device::{pci, DeviceId};
use crate::error::{Error, Result};
use crate::hypercall::Hypercall;
use crate::platform::HOST_FAILURE;
use crate::shared::{GuestPlatform, Published};

/// Type-1 configuration access request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct PciConf {
    pub bus: u32,
    /// `slot << 16 | function`
    pub df: u32,
    pub value: u32,
    pub reg: i32,
    /// Access width in bits
    pub len: i32,
    /// Host status, 0 on success
    pub ret: u32,
}

/// Interrupt routing request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct PciIrq {
    pub bus: u32,
    /// `slot << 16`
    pub devfn: u32,
    /// Zero-based INTx pin
    pub pin: i32,
    /// Set by host: non-zero = edge
    pub trigger: u8,
    /// Set by host: non-zero = active low
    pub polarity: u8,
    /// Set by host: GSI, negative if unrouted
    pub ret: i32,
}

/// Port I/O window request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct IoMap {
    pub addr: usize,
    pub size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    LevelHigh,
    EdgeRising,
    LevelLow,
    EdgeFalling,
}

impl Trigger {
    pub fn from_host(trigger: u8, polarity: u8) -> Self {
        match (trigger != 0, polarity != 0) {
            (false, false) => Trigger::LevelHigh,
            (true, false) => Trigger::EdgeRising,
            (false, true) => Trigger::LevelLow,
            (true, true) => Trigger::EdgeFalling,
        }
    }

    pub fn is_edge(self) -> bool {
        matches!(self, Trigger::EdgeRising | Trigger::EdgeFalling)
    }
}

/// Where a device's INTx pin ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqRoute {
    pub gsi: u32,
    pub trigger: Trigger,
}

#[inline]
const fn slot(devfn: u32) -> u32 {
    (devfn >> 3) & 0x1F
}

#[inline]
const fn func(devfn: u32) -> u32 {
    devfn & 0x7
}

/// Whether the host exposes a PCI bus at all.
pub fn probe<T: HypercallTrap>(hc: &Hypercall<T>) -> Result<()> {
    if hc.read(DeviceId::Pci, pci::PROBE) == HOST_FAILURE {
        log::info!("[PCI] no virtual pci bus");
        return Err(Error::NoDevice);
    }
    Ok(())
}

fn conf1<T, P>(hc: &Hypercall<T>, platform: &P, opcode: u16, conf: PciConf) -> PciConf
where
    T: HypercallTrap,
    P: GuestPlatform + ?Sized,
{
    let mut req = Published::new(conf);
    let phys = req.publish(platform);
    hc.write(DeviceId::Pci, opcode, phys);
    req.read_back()
}

/// Read `len` bytes of config space at `reg`.
pub fn conf1_read<T, P>(
    hc: &Hypercall<T>,
    platform: &P,
    bus: u32,
    devfn: u32,
    reg: i32,
    len: u8,
) -> Result<u32>
where
    T: HypercallTrap,
    P: GuestPlatform + ?Sized,
{
    let conf = PciConf {
        bus,
        df: slot(devfn) << 16 | func(devfn),
        value: 0,
        reg,
        len: len as i32 * 8,
        ret: 0,
    };
    let done = conf1(hc, platform, pci::CONF1_READ, conf);
    if done.ret != 0 {
        log::debug!("[PCI] read {:02x}:{:02x} reg {:#x} failed", bus, devfn, reg);
        return Err(Error::HostRejected);
    }
    Ok(done.value)
}

/// Write `len` bytes of `value` to config space at `reg`.
pub fn conf1_write<T, P>(
    hc: &Hypercall<T>,
    platform: &P,
    bus: u32,
    devfn: u32,
    reg: i32,
    len: u8,
    value: u32,
) -> Result<()>
where
    T: HypercallTrap,
    P: GuestPlatform + ?Sized,
{
    let conf = PciConf {
        bus,
        df: slot(devfn) << 16 | func(devfn),
        value,
        reg,
        len: len as i32 * 8,
        ret: 0,
    };
    let done = conf1(hc, platform, pci::CONF1_WRITE, conf);
    if done.ret != 0 {
        log::debug!("[PCI] write {:02x}:{:02x} reg {:#x} failed", bus, devfn, reg);
        return Err(Error::HostRejected);
    }
    Ok(())
}

/// Route INTx `pin` (1 = INTA, 0 = none) of `bus:devfn`.
///
/// `Ok(None)` when the device has no pin or the host has no GSI for it;
/// the device then runs without an interrupt.
pub fn irq_enable<T, P>(
    hc: &Hypercall<T>,
    platform: &P,
    bus: u32,
    devfn: u32,
    pin: u8,
) -> Result<Option<IrqRoute>>
where
    T: HypercallTrap,
    P: GuestPlatform + ?Sized,
{
    if pin == 0 {
        log::warn!("[PCI] {:02x}:{:02x} has no interrupt pin", bus, devfn);
        return Ok(None);
    }
    let pin = pin - 1;

    let mut req = Published::new(PciIrq {
        bus,
        devfn: slot(devfn) << 16,
        pin: pin as i32,
        ..PciIrq::default()
    });
    let phys = req.publish(platform);
    hc.write(DeviceId::Pci, pci::ENABLE_IRQ, phys);
    let done = req.read_back();

    let pin_name = b'A'.wrapping_add(pin) as char;
    if done.ret < 0 {
        log::warn!("[PCI] INT {}: no GSI", pin_name);
        return Ok(None);
    }
    let route = IrqRoute {
        gsi: done.ret as u32,
        trigger: Trigger::from_host(done.trigger, done.polarity),
    };
    log::info!("[PCI] INT {} -> GSI {} ({:?})", pin_name, route.gsi, route.trigger);
    Ok(Some(route))
}

/// Tell the host where the port I/O window `io_start..=io_end` is mapped.
pub fn iomap<T, P>(
    hc: &Hypercall<T>,
    platform: &P,
    io_map_base: usize,
    io_start: usize,
    io_end: usize,
) -> Result<()>
where
    T: HypercallTrap,
    P: GuestPlatform + ?Sized,
{
    let addr = io_map_base
        .checked_add(io_start)
        .ok_or(Error::AddressOverflow)?;
    let size = io_end
        .checked_sub(io_start)
        .and_then(|s| s.checked_add(1))
        .ok_or(Error::AddressOverflow)?;
    let mut req = Published::new(IoMap { addr, size });
    let phys = req.publish(platform);
    hc.write(DeviceId::Pci, pci::IOMAP, phys);
    log::info!("[PCI] io window {:#x} (+{:#x})", addr, size);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use core::cell::RefCell;
    use core::ptr::NonNull;

    /// Host bridge with one device at 00:02.1 whose config dword 0 reads
    /// 0x1AF4_1000 and whose INTA is routed to an edge-low GSI 9.
    #[derive(Default)]
    struct Bridge {
        absent: bool,
        seen: RefCell<Vec<Command>>,
        last_iomap: RefCell<Option<IoMap>>,
    }

    impl HypercallTrap for Bridge {
        fn trap0(&self, _: Command) {}
        fn trap1(&self, cmd: Command, r1: &mut usize) {
            self.seen.borrow_mut().push(cmd);
            match cmd.opcode() & !1 {
                pci::PROBE => *r1 = if self.absent { HOST_FAILURE } else { 0 },
                pci::CONF1_READ | pci::CONF1_WRITE => {
                    let conf = unsafe { &mut *(*r1 as *mut PciConf) };
                    if conf.df == (2 << 16 | 1) {
                        conf.value = 0x1AF4_1000;
                    } else {
                        conf.ret = 1;
                    }
                }
                pci::ENABLE_IRQ => {
                    let irq = unsafe { &mut *(*r1 as *mut PciIrq) };
                    if irq.pin == 0 {
                        irq.ret = 9;
                        irq.trigger = 1;
                        irq.polarity = 1;
                    } else {
                        irq.ret = -1;
                    }
                }
                pci::IOMAP => {
                    *self.last_iomap.borrow_mut() = Some(unsafe { *(*r1 as *const IoMap) });
                }
                _ => {}
            }
        }
        fn trap2(&self, _: Command, _: &mut usize, _: &mut usize) {}
        fn trap3(&self, _: Command, _: &mut usize, _: &mut usize, _: &mut usize) {}
        fn trap4(&self, _: Command, _: &mut usize, _: &mut usize, _: &mut usize, _: &mut usize) {}
    }

    struct Identity;

    unsafe impl GuestPlatform for Identity {
        fn virt_to_phys(&self, ptr: *const u8) -> usize {
            ptr as usize
        }
        fn ioremap(&self, phys: usize, _: usize) -> Option<NonNull<u8>> {
            NonNull::new(phys as *mut u8)
        }
    }

    const DEVFN: u32 = 2 << 3 | 1;

    #[test]
    fn test_probe() {
        assert!(probe(&Hypercall::new(Bridge::default())).is_ok());
        let absent = Bridge { absent: true, ..Bridge::default() };
        assert_eq!(probe(&Hypercall::new(absent)), Err(Error::NoDevice));
    }

    #[test]
    fn test_conf1_read() {
        let hc = Hypercall::new(Bridge::default());
        assert_eq!(conf1_read(&hc, &Identity, 0, DEVFN, 0, 4), Ok(0x1AF4_1000));
        assert_eq!(conf1_read(&hc, &Identity, 0, 0, 0, 4), Err(Error::HostRejected));

        let seen = hc.trap().seen.borrow();
        assert_eq!(seen[0].device(), Some(DeviceId::Pci));
        assert_eq!(seen[0].opcode(), pci::CONF1_READ | 1);
    }

    #[test]
    fn test_conf1_write() {
        let hc = Hypercall::new(Bridge::default());
        assert!(conf1_write(&hc, &Identity, 0, DEVFN, 4, 2, 0x7).is_ok());
        assert_eq!(hc.trap().seen.borrow()[0].opcode(), pci::CONF1_WRITE | 1);
    }

    #[test]
    fn test_irq_enable() {
        let hc = Hypercall::new(Bridge::default());
        let route = irq_enable(&hc, &Identity, 0, DEVFN, 1).unwrap().unwrap();
        assert_eq!(route.gsi, 9);
        assert_eq!(route.trigger, Trigger::EdgeFalling);
        assert!(route.trigger.is_edge());

        // INTB unrouted, no pin at all
        assert_eq!(irq_enable(&hc, &Identity, 0, DEVFN, 2), Ok(None));
        assert_eq!(irq_enable(&hc, &Identity, 0, DEVFN, 0), Ok(None));
        assert_eq!(hc.trap().seen.borrow().len(), 2);
    }

    #[test]
    fn test_trigger_mapping() {
        assert_eq!(Trigger::from_host(0, 0), Trigger::LevelHigh);
        assert_eq!(Trigger::from_host(1, 0), Trigger::EdgeRising);
        assert_eq!(Trigger::from_host(0, 1), Trigger::LevelLow);
        assert_eq!(Trigger::from_host(3, 7), Trigger::EdgeFalling);
    }

    #[test]
    fn test_iomap() {
        let hc = Hypercall::new(Bridge::default());
        iomap(&hc, &Identity, 0x1800_0000, 0x1000, 0x1FFF).unwrap();
        assert_eq!(
            *hc.trap().last_iomap.borrow(),
            Some(IoMap { addr: 0x1800_1000, size: 0x1000 })
        );
        assert_eq!(
            iomap(&hc, &Identity, 0, 0x2000, 0x1000),
            Err(Error::AddressOverflow)
        );
    }
}
