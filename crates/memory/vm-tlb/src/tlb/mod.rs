//! TLB (Translation Lookaside Buffer) 模块
//!
//! - `cache`：容量固定的翻译缓存，按槽位顺序存放条目
//! - `policy`：替换策略接口与 FIFO 实现

pub mod cache;
pub mod policy;

// 重新导出主要类型
pub use cache::{CacheEntry, CacheOutcome, TlbStats, TranslationCache};
pub use policy::{FifoPolicy, ReplacementPolicy};
