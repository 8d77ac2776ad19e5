//! Platform/Board Constants (Karma VMM guest)
//!
//! All host-contract numbers live here so they can be changed in one
//! place when the VMM side changes.

// ── Interrupt controller ─────────────────────────────────────────────
/// Number of karma GIC instances a guest may bring up.
pub const MAX_GIC_NR: u32 = 1;
/// Lines per shared bitmask word.
pub const LINES_PER_WORD: u32 = 32;
/// Size of the shared-state window mapped at controller init.
pub const GIC_SHARED_SIZE: usize = 0x1000;
/// First guest IRQ of the karma GIC domain on MIPS mach-virt.
pub const MACHVIRT_INT_BASE: u32 = 0;
/// Device-tree compatible string of the karma GIC node.
pub const KARMA_GIC_COMPATIBLE: &str = "karma,karma-gic-intc";

// ── Command word ─────────────────────────────────────────────────────
pub const OPCODE_MASK: usize = 0xFFFF;
pub const DEVICE_SHIFT: u32 = 16;
pub const DEVICE_MASK: usize = 0xFF << DEVICE_SHIFT;
pub const REG_COUNT_SHIFT: u32 = 24;
pub const REG_COUNT_MASK: usize = 0x7;

// ── Backend probe (x86) ──────────────────────────────────────────────
/// CPUID leaf carrying the vendor signature.
pub const CPUID_VENDOR_LEAF: u32 = 0;
/// Fiasco running on AMD-V ("WickedFiasco" as EBX, EDX, ECX).
pub const SIG_WICKED_FIASCO: [u32; 3] = [0x6B63_6957, 0x6946_6564, 0x6F63_7361];
/// Bare AMD vendor string ("AuthenticAMD" as EBX, EDX, ECX).
pub const SIG_AUTHENTIC_AMD: [u32; 3] = [0x6874_7541, 0x6974_6E65, 0x444D_4163];

// ── Backend encoding (MIPS VZ) ───────────────────────────────────────
/// `hypcall` base opcode; the code field sits at bits 11..21.
pub const HYPCALL_OPCODE: u32 = 0x4200_0028;
pub const HYPCALL_CODE_MASK: u32 = 0x3FF;
pub const HYPCALL_CODE_SHIFT: u32 = 11;
/// Code used for every Karma device operation.
pub const HYPCALL_KARMA_DEV_OP: u32 = 0x000;

// ── Host sentinels ───────────────────────────────────────────────────
/// All-ones result word: "operation failed/unsupported".
pub const HOST_FAILURE: usize = usize::MAX;
/// Lowest DMA mask the memory device can honour.
pub const DMA_MIN_MASK_BITS: u32 = 24;
