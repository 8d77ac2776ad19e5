//! Hypercall transport tests

mod common;

use common::MockHost;
use karma_guest::device::{timer, DeviceId};
use karma_guest::{make_command, Hypercall};

#[test]
fn test_timer_base_round_trip() {
    let hc = Hypercall::new(MockHost::new());
    hc.trap().reply.set(0x1F01_0000);

    let cmd = make_command(DeviceId::Timer, timer::GET_BASE_REG);
    let mut base = 0;
    hc.call1(cmd, &mut base);
    assert_eq!(base, 0x1F01_0000);

    let traps = hc.trap().traps();
    assert_eq!(traps.len(), 1);
    // exactly one register travelled with the word
    assert_eq!(traps[0].args.len(), 1);
    assert_eq!((traps[0].cmd.raw() >> 24) & 0x7, 1);
    assert_eq!(traps[0].cmd.raw() & 0x00FF_FFFF, cmd.raw());
}

#[test]
fn test_slot_counts() {
    let hc = Hypercall::new(MockHost::new());
    let cmd = make_command(DeviceId::Block, 0x10);
    let (mut a, mut b, mut c, mut d) = (1, 2, 3, 4);

    hc.call0(cmd);
    hc.call2(cmd, &mut a, &mut b);
    hc.call3(cmd, &mut a, &mut b, &mut c);
    hc.call4(cmd, &mut a, &mut b, &mut c, &mut d);

    let traps = hc.trap().traps();
    assert_eq!(traps[0].cmd, cmd);
    assert_eq!(traps[0].args.len(), 0);
    assert_eq!(traps[1].cmd.register_count(), 2);
    assert_eq!(traps[2].cmd.register_count(), 3);
    assert_eq!(traps[3].cmd.register_count(), 4);
    assert_eq!(traps[3].args, [1, 0, 3, 4]);
}

#[test]
fn test_write_keeps_value() {
    let hc = Hypercall::new(MockHost::new());
    let left = hc.write(DeviceId::Timer, timer::ENABLE, 2);
    assert_eq!(left, 2);

    let traps = hc.trap().traps();
    assert!(traps[0].cmd.is_write());
    assert_eq!(traps[0].args, [2]);
}

#[cfg(target_arch = "x86_64")]
mod boot {
    use karma_guest::arch::Backend;
    use karma_guest::global;

    #[test]
    fn test_backend_resolution_idempotent() {
        assert_eq!(Backend::resolve(), Backend::resolve());
    }

    #[test]
    fn test_global_init_once() {
        let first = global::init();
        let second = global::init();
        assert!(core::ptr::eq(first, second));
        assert!(global::is_initialized());
        assert_eq!(*global::hypercall().unwrap().trap(), Backend::resolve());
    }
}
