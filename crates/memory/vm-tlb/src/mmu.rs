//! 软件 MMU
//!
//! 组合页几何、页表与翻译缓存，把虚拟地址翻译成 [`TranslationRecord`]。

use std::sync::Arc;

use log::{debug, info};
use parking_lot::Mutex;
use serde::Serialize;

use crate::address::{DecodedAddress, PageGeometry};
use crate::config::TlbConfig;
use crate::error::TlbResult;
use crate::page_table::AddressSpace;
use crate::tlb::{CacheOutcome, TlbStats, TranslationCache};
use crate::{PhysAddr, Ppn, VirtAddr, Vpn};

/// 一次成功翻译的完整结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TranslationRecord {
    pub virtual_address: VirtAddr,
    pub virtual_page: Vpn,
    pub offset: u64,
    pub frame_number: Ppn,
    pub physical_address: PhysAddr,
    pub outcome: CacheOutcome,
}

/// 软件 MMU
#[derive(Debug)]
pub struct SoftMmu {
    geometry: PageGeometry,
    address_space: AddressSpace,
    tlb: TranslationCache,
}

impl SoftMmu {
    pub fn new(geometry: PageGeometry, address_space: AddressSpace, tlb: TranslationCache) -> Self {
        Self {
            geometry,
            address_space,
            tlb,
        }
    }

    /// 按配置创建 MMU
    ///
    /// # 错误
    ///
    /// 配置无效时返回对应的配置错误
    pub fn from_config(config: &TlbConfig) -> TlbResult<Self> {
        config.validate()?;
        let geometry = config.geometry()?;
        let address_space = config.build_address_space()?;
        let tlb = TranslationCache::new(config.capacity)?;
        info!(
            "MMU ready: {} TLB entries, {} byte pages, {} valid mappings",
            config.capacity,
            geometry.page_size(),
            address_space.valid_pages()
        );
        Ok(Self::new(geometry, address_space, tlb))
    }

    /// 拆分虚拟地址
    pub fn decode(&self, address: VirtAddr) -> DecodedAddress {
        self.geometry.split(address)
    }

    /// 翻译虚拟地址
    ///
    /// # 错误
    ///
    /// 页表中没有有效映射时返回 `InvalidPage`，TLB 不变
    pub fn translate(&mut self, address: VirtAddr) -> TlbResult<TranslationRecord> {
        let decoded = self.geometry.split(address);
        let (frame, outcome) = self.tlb.translate(decoded.page, &self.address_space)?;
        let record = TranslationRecord {
            virtual_address: address,
            virtual_page: decoded.page,
            offset: decoded.offset,
            frame_number: frame,
            physical_address: self.geometry.compose(frame, decoded.offset),
            outcome,
        };
        debug!(
            "translate {:#x} -> {:#x} ({})",
            address,
            record.physical_address,
            if outcome.is_hit() { "hit" } else { "miss" }
        );
        Ok(record)
    }

    /// 清空 TLB
    pub fn reset_cache(&mut self) {
        self.tlb.reset();
    }

    /// 清零命中/未命中统计，TLB 内容不变
    pub fn reset_stats(&mut self) {
        self.tlb.reset_stats();
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn address_space(&self) -> &AddressSpace {
        &self.address_space
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.tlb
    }

    pub fn stats(&self) -> &TlbStats {
        self.tlb.stats()
    }
}

/// 多调用方共享的 MMU
///
/// FIFO 游标与条目替换不是原子的，所有翻译在同一把锁下串行执行。
#[derive(Debug, Clone)]
pub struct SharedMmu {
    inner: Arc<Mutex<SoftMmu>>,
}

impl SharedMmu {
    pub fn new(mmu: SoftMmu) -> Self {
        Self {
            inner: Arc::new(Mutex::new(mmu)),
        }
    }

    pub fn translate(&self, address: VirtAddr) -> TlbResult<TranslationRecord> {
        self.inner.lock().translate(address)
    }

    pub fn stats(&self) -> TlbStats {
        self.inner.lock().stats().clone()
    }

    /// 在锁内访问 MMU
    pub fn with<R>(&self, f: impl FnOnce(&SoftMmu) -> R) -> R {
        f(&self.inner.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TlbError;
    use std::thread;

    #[test]
    fn test_translate_record() {
        let mut mmu = SoftMmu::from_config(&TlbConfig::default()).unwrap();
        let record = mmu.translate(0xABC).unwrap();
        assert_eq!(record.virtual_page, 0);
        assert_eq!(record.offset, 0xABC);
        assert_eq!(record.frame_number, 0x12345);
        assert_eq!(record.physical_address, 0x1234_5ABC);
        assert_eq!(record.outcome, CacheOutcome::Miss { evicted: None });
    }

    #[test]
    fn test_address_past_width_is_invalid() {
        let config = TlbConfig::default().with_address_bits(16);
        let mut mmu = SoftMmu::from_config(&config).unwrap();
        assert_eq!(
            mmu.translate(0x1_0000),
            Err(TlbError::InvalidPage { page: 0x10 })
        );
        assert!(mmu.cache().is_empty());
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let config = TlbConfig::default().with_capacity(0);
        assert!(matches!(
            SoftMmu::from_config(&config),
            Err(TlbError::InvalidCapacity(0))
        ));
    }

    #[test]
    fn test_reset_cache() {
        let mut mmu = SoftMmu::from_config(&TlbConfig::default()).unwrap();
        mmu.translate(0).unwrap();
        assert!(mmu.translate(0).unwrap().outcome.is_hit());
        mmu.reset_cache();
        assert!(!mmu.translate(0).unwrap().outcome.is_hit());
    }

    #[test]
    fn test_reset_stats_keeps_entries() {
        let mut mmu = SoftMmu::from_config(&TlbConfig::default()).unwrap();
        mmu.translate(0).unwrap();
        mmu.translate(0).unwrap();
        assert_eq!((mmu.stats().hits, mmu.stats().misses), (1, 1));

        mmu.reset_stats();
        assert_eq!(mmu.stats(), &TlbStats::default());
        assert!(mmu.translate(0).unwrap().outcome.is_hit());
        assert_eq!((mmu.stats().hits, mmu.stats().misses), (1, 0));
    }

    #[test]
    fn test_shared_mmu_serializes_access() {
        let config = TlbConfig::default().with_mapping(1, 0x10).with_mapping(2, 0x20);
        let shared = SharedMmu::new(SoftMmu::from_config(&config).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let mmu = shared.clone();
                thread::spawn(move || {
                    for n in 0..100u64 {
                        let page = (n + i) % 3;
                        mmu.translate(page << 12).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = shared.stats();
        assert_eq!(stats.hits + stats.misses, 400);
        assert_eq!(stats.misses, 3);
        assert_eq!(shared.with(|mmu| mmu.cache().len()), 3);
    }
}
