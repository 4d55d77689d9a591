//! 翻译缓存
//!
//! 以虚拟页号为键缓存页框号。条目按槽位顺序存放在 `Vec` 中，
//! 未满时追加，已满时由替换策略选出槽位整体覆盖。

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use super::policy::{FifoPolicy, ReplacementPolicy};
use crate::error::{TlbError, TlbResult};
use crate::page_table::AddressSpace;
use crate::{Ppn, Vpn};

/// TLB 条目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// 虚拟页号
    pub virtual_page: Vpn,
    /// 物理页框号
    pub frame_number: Ppn,
}

/// 单次翻译的缓存结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum CacheOutcome {
    /// 命中，未访问页表
    Hit,
    /// 未命中，已从页表填充；缓存满时带出被替换的条目
    Miss { evicted: Option<CacheEntry> },
}

impl CacheOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit)
    }

    pub fn evicted(&self) -> Option<&CacheEntry> {
        match self {
            Self::Hit => None,
            Self::Miss { evicted } => evicted.as_ref(),
        }
    }
}

/// TLB 统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TlbStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
    pub flushes: u64,
    /// 页表中无有效映射的翻译请求
    pub invalid_pages: u64,
}

impl TlbStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// 容量固定的翻译缓存
#[derive(Debug)]
pub struct TranslationCache<P: ReplacementPolicy = FifoPolicy> {
    /// 按槽位顺序排列的条目，长度不超过容量
    entries: Vec<CacheEntry>,
    capacity: usize,
    policy: P,
    stats: TlbStats,
}

impl TranslationCache<FifoPolicy> {
    /// 创建 FIFO 翻译缓存
    ///
    /// # 错误
    ///
    /// 容量为 0 时返回 `InvalidCapacity`
    pub fn new(capacity: usize) -> TlbResult<Self> {
        Self::with_policy(capacity, FifoPolicy::new())
    }
}

impl<P: ReplacementPolicy> TranslationCache<P> {
    /// 使用指定替换策略创建翻译缓存
    pub fn with_policy(capacity: usize, policy: P) -> TlbResult<Self> {
        if capacity == 0 {
            return Err(TlbError::InvalidCapacity(capacity));
        }
        debug!(
            "Creating TLB with capacity: {} entries, policy: {}",
            capacity,
            policy.name()
        );
        Ok(Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            policy,
            stats: TlbStats::default(),
        })
    }

    /// 查找虚拟页
    ///
    /// 只读：不改变替换顺序，也不计入统计。
    pub fn lookup(&self, page: Vpn) -> Option<Ppn> {
        self.entries
            .iter()
            .find(|entry| entry.virtual_page == page)
            .map(|entry| entry.frame_number)
    }

    pub fn contains(&self, page: Vpn) -> bool {
        self.lookup(page).is_some()
    }

    /// 插入新条目
    ///
    /// 缓存已满时替换策略选中的条目被覆盖并返回。
    ///
    /// # 错误
    ///
    /// 页已在缓存中时返回 `DuplicateEntry`，缓存保持不变。
    /// 调用方应只在确认未命中后插入。
    pub fn insert(&mut self, page: Vpn, frame: Ppn) -> TlbResult<Option<CacheEntry>> {
        if self.contains(page) {
            warn!("Rejected duplicate TLB insert for page {:#x}", page);
            return Err(TlbError::DuplicateEntry { page });
        }

        let entry = CacheEntry {
            virtual_page: page,
            frame_number: frame,
        };
        self.stats.inserts += 1;

        if self.entries.len() < self.capacity {
            self.entries.push(entry);
            debug!(
                "TLB fill: page {:#x} -> frame {:#x} (slot {})",
                page,
                frame,
                self.entries.len() - 1
            );
            return Ok(None);
        }

        let slot = self.policy.choose_victim(&self.entries) % self.entries.len();
        let evicted = std::mem::replace(&mut self.entries[slot], entry);
        self.stats.evictions += 1;
        debug!(
            "TLB evict: slot {} page {:#x} -> page {:#x} ({})",
            slot,
            evicted.virtual_page,
            page,
            self.policy.name()
        );
        Ok(Some(evicted))
    }

    /// 翻译虚拟页：先查缓存，未命中再查页表并填充
    ///
    /// 页表无有效映射时返回 `InvalidPage`，缓存条目不变。
    pub fn translate(&mut self, page: Vpn, address_space: &AddressSpace) -> TlbResult<(Ppn, CacheOutcome)> {
        if let Some(frame) = self.lookup(page) {
            self.stats.hits += 1;
            trace!("TLB hit: page {:#x} -> frame {:#x}", page, frame);
            return Ok((frame, CacheOutcome::Hit));
        }

        self.stats.misses += 1;
        let frame = match address_space.lookup(page) {
            Ok(frame) => frame,
            Err(err) => {
                self.stats.invalid_pages += 1;
                return Err(err);
            }
        };
        let evicted = self.insert(page, frame)?;
        Ok((frame, CacheOutcome::Miss { evicted }))
    }

    /// 下一次满载插入将替换的条目；缓存未满时为 `None`
    pub fn next_victim(&self) -> Option<&CacheEntry> {
        if !self.is_full() {
            return None;
        }
        self.policy
            .peek_victim(&self.entries)
            .and_then(|slot| self.entries.get(slot))
    }

    /// 清空所有条目并复位替换策略
    pub fn reset(&mut self) {
        self.entries.clear();
        self.policy.reset();
        self.stats.flushes += 1;
    }

    /// 按槽位顺序返回条目
    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn stats(&self) -> &TlbStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = TlbStats::default();
    }
}
