/// Global hypercall transport
///
/// The backend is resolved once during single-threaded early boot and
/// is read-only afterwards. Any use before [`init`] is reported as
/// [`Error::TransportUninitialized`] instead of trapping through an
/// unset backend.
use spin::Once;

use crate::arch::traits::HypercallTrap;
use crate::error::{Error, Result};
use crate::hypercall::Hypercall;

/// Write-once transport slot.
pub struct GlobalTransport<T> {
    cell: Once<Hypercall<T>>,
}

impl<T: HypercallTrap> GlobalTransport<T> {
    pub const fn new() -> Self {
        Self { cell: Once::new() }
    }

    /// Install the transport built by `resolve`, unless one is already
    /// installed. Either way the installed transport is returned.
    pub fn install_with(&self, resolve: impl FnOnce() -> T) -> &Hypercall<T> {
        self.cell.call_once(|| Hypercall::new(resolve()))
    }

    pub fn get(&self) -> Result<&Hypercall<T>> {
        self.cell.get().ok_or(Error::TransportUninitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.is_completed()
    }
}

#[cfg(any(target_arch = "x86_64", target_arch = "mips", target_arch = "mips64"))]
mod boot {
    use super::*;
    use crate::arch::Backend;

    pub(crate) static TRANSPORT: GlobalTransport<Backend> = GlobalTransport::new();

    /// Resolve the backend and install the process-wide transport.
    ///
    /// Later calls return the transport installed by the first one.
    pub fn init() -> &'static Hypercall<Backend> {
        TRANSPORT.install_with(|| {
            let backend = Backend::resolve();
            log::info!("[HYPERCALL] backend: {}", backend.name());
            backend
        })
    }

    /// The installed transport.
    pub fn hypercall() -> Result<&'static Hypercall<Backend>> {
        TRANSPORT.get()
    }

    pub fn is_initialized() -> bool {
        TRANSPORT.is_initialized()
    }
}

#[cfg(any(target_arch = "x86_64", target_arch = "mips", target_arch = "mips64"))]
pub use boot::{hypercall, init, is_initialized};

#[cfg(any(target_arch = "x86_64", target_arch = "mips", target_arch = "mips64"))]
pub(crate) use boot::TRANSPORT;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq, Eq)]
    struct Tagged(usize);

    impl HypercallTrap for Tagged {
        fn trap0(&self, _: Command) {}
        fn trap1(&self, _: Command, _: &mut usize) {}
        fn trap2(&self, _: Command, _: &mut usize, _: &mut usize) {}
        fn trap3(&self, _: Command, _: &mut usize, _: &mut usize, _: &mut usize) {}
        fn trap4(&self, _: Command, _: &mut usize, _: &mut usize, _: &mut usize, _: &mut usize) {}
    }

    #[test]
    fn test_use_before_init() {
        let slot: GlobalTransport<Tagged> = GlobalTransport::new();
        assert!(!slot.is_initialized());
        assert_eq!(slot.get().err(), Some(Error::TransportUninitialized));
    }

    #[test]
    fn test_install_once() {
        let slot: GlobalTransport<Tagged> = GlobalTransport::new();
        let probes = AtomicUsize::new(0);
        let resolve = || Tagged(probes.fetch_add(1, Ordering::Relaxed));

        let first = slot.install_with(resolve) as *const _;
        let second = slot.install_with(|| Tagged(99)) as *const _;
        assert_eq!(first, second);
        assert_eq!(probes.load(Ordering::Relaxed), 1);
        assert_eq!(*slot.get().unwrap().trap(), Tagged(0));
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_boot_transport() {
        let first = init();
        let second = init();
        assert!(core::ptr::eq(first, second));
        assert_eq!(*first.trap(), crate::arch::Backend::resolve());
        assert!(is_initialized());
        assert!(hypercall().is_ok());
    }
}
