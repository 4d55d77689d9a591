//! vm-tlb: 软件 TLB 与平面页表
//!
//! 在页表（[`AddressSpace`]）前放置一个容量固定、按 FIFO 替换的翻译缓存
//! （[`TranslationCache`]），由 [`SoftMmu`] 把虚拟地址翻译成物理地址。
//!
//! ```
//! use vm_tlb::{CacheOutcome, SoftMmu, TlbConfig};
//!
//! let mut mmu = SoftMmu::from_config(&TlbConfig::default()).unwrap();
//! let first = mmu.translate(0x10).unwrap();
//! assert!(matches!(first.outcome, CacheOutcome::Miss { .. }));
//! assert_eq!(first.frame_number, 0x12345);
//! assert!(mmu.translate(0x20).unwrap().outcome.is_hit());
//! ```

pub mod address;
pub mod config;
pub mod error;
pub mod mmu;
pub mod page_table;
pub mod report;
pub mod tlb;

/// 虚拟地址
pub type VirtAddr = u64;
/// 物理地址
pub type PhysAddr = u64;
/// 虚拟页号 (VPN)
pub type Vpn = u64;
/// 物理页框号 (PPN)
pub type Ppn = u64;

// ============================================================================
// 默认参数（32 位地址空间，4KB 页，5 项 TLB）
// ============================================================================

/// 页大小：4KB
pub const DEFAULT_PAGE_SIZE: u64 = 4096;
/// TLB 条目数
pub const DEFAULT_TLB_ENTRIES: usize = 5;
/// 虚拟地址位宽
pub const DEFAULT_ADDRESS_BITS: u32 = 32;

pub use address::{DecodedAddress, PageGeometry};
pub use config::{PageMapping, TlbConfig};
pub use error::{TlbError, TlbResult};
pub use mmu::{SharedMmu, SoftMmu, TranslationRecord};
pub use page_table::{AddressSpace, PageTableEntry};
pub use report::{CacheDump, InvalidPageReport, TranslationReport};
pub use tlb::{CacheEntry, CacheOutcome, FifoPolicy, ReplacementPolicy, TlbStats, TranslationCache};
