//! Karma GIC device-tree discovery
//!
//! On mach-virt the karma GIC is described by a `karma,karma-gic-intc`
//! node whose `interrupts` property names the parent line the host
//! multiplexes all virtual sources onto. This module locates that node
//! so bring-up code can hook [`crate::vchip::KarmaGic::dispatch`] to it.
//!
//! The `fdt` crate does zero-copy parsing; no heap allocation needed.

use crate::error::{Error, Result};
use crate::platform::KARMA_GIC_COMPATIBLE;

const FDT_MAGIC: u32 = 0xD00D_FEED;

/// What the device tree says about the karma GIC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GicNode {
    /// Parent (physical) interrupt carrying the multiplexed line
    pub parent_irq: u32,
    /// First `reg` entry, if the node has one
    pub reg_base: Option<u64>,
}

/// Find the karma GIC in a flattened device tree blob.
pub fn find_karma_gic(blob: &[u8]) -> Result<GicNode> {
    let fdt = fdt::Fdt::new(blob).map_err(|_| Error::InvalidDeviceTree)?;
    parse(&fdt)
}

/// Find the karma GIC in the blob at `addr`.
///
/// # Safety
/// `addr` must point to readable memory holding at least an FDT header,
/// and the whole blob if the magic matches.
pub unsafe fn find_karma_gic_at(addr: usize) -> Result<GicNode> {
    if addr == 0 || addr % 4 != 0 {
        return Err(Error::InvalidDeviceTree);
    }
    let magic = core::ptr::read_volatile(addr as *const u32);
    if u32::from_be(magic) != FDT_MAGIC {
        return Err(Error::InvalidDeviceTree);
    }
    let fdt = fdt::Fdt::from_ptr(addr as *const u8).map_err(|_| Error::InvalidDeviceTree)?;
    parse(&fdt)
}

fn parse(fdt: &fdt::Fdt<'_>) -> Result<GicNode> {
    let node = fdt
        .find_compatible(&[KARMA_GIC_COMPATIBLE])
        .ok_or(Error::NoDevice)?;

    // Prefer the resolved specifier; fall back to the first raw cell when
    // the tree has no usable interrupt-parent chain.
    let parent_irq = node
        .interrupts()
        .and_then(|mut irqs| irqs.next())
        .map(|irq| irq as u32)
        .or_else(|| node.property("interrupts").and_then(|p| first_cell(p.value)))
        .ok_or(Error::NoDevice)?;

    let reg_base = node
        .reg()
        .and_then(|mut regs| regs.next())
        .map(|reg| reg.starting_address as u64);

    log::info!(
        "[KARMA_GIC] dt node {} parent irq {}",
        node.name,
        parent_irq
    );
    Ok(GicNode {
        parent_irq,
        reg_base,
    })
}

/// First big-endian cell of a property value.
fn first_cell(value: &[u8]) -> Option<u32> {
    let cell: [u8; 4] = value.get(..4)?.try_into().ok()?;
    Some(u32::from_be_bytes(cell))
}
