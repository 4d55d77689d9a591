//! 平面页表
//!
//! 页号 → (页框号, 有效位)。只存放配置过的页，其余页一律视为无效。

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::address::PageGeometry;
use crate::error::{TlbError, TlbResult};
use crate::{Ppn, Vpn};

/// 页表项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTableEntry {
    /// 物理页框号
    pub frame_number: Ppn,
    /// 有效位
    pub valid: bool,
}

/// 地址空间（页表）
#[derive(Debug, Clone)]
pub struct AddressSpace {
    entries: FxHashMap<Vpn, PageTableEntry>,
    num_pages: u64,
    max_frame: Ppn,
}

impl AddressSpace {
    /// 创建包含 `num_pages` 个页的空地址空间，页框号不设上限
    pub fn new(num_pages: u64) -> Self {
        Self {
            entries: FxHashMap::default(),
            num_pages,
            max_frame: Ppn::MAX,
        }
    }

    /// 按页几何创建空地址空间
    ///
    /// 页数取自地址位宽，页框号上限保证 `compose` 不溢出。
    pub fn for_geometry(geometry: &PageGeometry) -> Self {
        Self {
            entries: FxHashMap::default(),
            num_pages: geometry.num_pages(),
            max_frame: geometry.max_frame(),
        }
    }

    /// 由 (页号, 页框号) 列表构建，全部标记为有效
    pub fn from_mappings<I>(num_pages: u64, mappings: I) -> TlbResult<Self>
    where
        I: IntoIterator<Item = (Vpn, Ppn)>,
    {
        let mut space = Self::new(num_pages);
        for (page, frame) in mappings {
            space.map(page, frame)?;
        }
        Ok(space)
    }

    /// 建立有效映射，覆盖旧的页表项
    pub fn map(&mut self, page: Vpn, frame: Ppn) -> TlbResult<()> {
        self.check_range(page)?;
        if frame > self.max_frame {
            return Err(TlbError::FrameOutOfRange {
                page,
                frame,
                max_frame: self.max_frame,
            });
        }
        self.entries.insert(
            page,
            PageTableEntry {
                frame_number: frame,
                valid: true,
            },
        );
        Ok(())
    }

    /// 清除有效位，保留页框号
    pub fn mark_invalid(&mut self, page: Vpn) -> TlbResult<()> {
        self.check_range(page)?;
        self.entries
            .entry(page)
            .and_modify(|entry| entry.valid = false)
            .or_insert(PageTableEntry {
                frame_number: 0,
                valid: false,
            });
        Ok(())
    }

    /// 查询页框号
    ///
    /// 未映射、无效以及超出地址空间的页都返回 `InvalidPage`。
    pub fn lookup(&self, page: Vpn) -> TlbResult<Ppn> {
        match self.entries.get(&page) {
            Some(entry) if entry.valid && page < self.num_pages => Ok(entry.frame_number),
            _ => Err(TlbError::InvalidPage { page }),
        }
    }

    pub fn entry(&self, page: Vpn) -> Option<&PageTableEntry> {
        self.entries.get(&page)
    }

    pub fn num_pages(&self) -> u64 {
        self.num_pages
    }

    pub fn max_frame(&self) -> Ppn {
        self.max_frame
    }

    /// 有效映射数
    pub fn valid_pages(&self) -> usize {
        self.entries.values().filter(|entry| entry.valid).count()
    }

    fn check_range(&self, page: Vpn) -> TlbResult<()> {
        if page >= self.num_pages {
            return Err(TlbError::PageOutOfRange {
                page,
                num_pages: self.num_pages,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_valid_page() {
        let space = AddressSpace::from_mappings(1 << 20, [(0, 0x12345), (7, 0x42)]).unwrap();
        assert_eq!(space.lookup(0), Ok(0x12345));
        assert_eq!(space.lookup(7), Ok(0x42));
        assert_eq!(space.valid_pages(), 2);
    }

    #[test]
    fn test_lookup_unmapped_page() {
        let space = AddressSpace::new(16);
        assert_eq!(space.lookup(3), Err(TlbError::InvalidPage { page: 3 }));
    }

    #[test]
    fn test_lookup_out_of_range_page() {
        let space = AddressSpace::from_mappings(16, [(15, 1)]).unwrap();
        assert_eq!(space.lookup(16), Err(TlbError::InvalidPage { page: 16 }));
        assert_eq!(space.lookup(u64::MAX), Err(TlbError::InvalidPage { page: u64::MAX }));
    }

    #[test]
    fn test_map_out_of_range_rejected() {
        let mut space = AddressSpace::new(16);
        assert_eq!(
            space.map(16, 1),
            Err(TlbError::PageOutOfRange { page: 16, num_pages: 16 })
        );
        assert!(AddressSpace::from_mappings(4, [(1, 1), (9, 2)]).is_err());
    }

    #[test]
    fn test_map_frame_too_wide_rejected() {
        let geometry = PageGeometry::default();
        let mut space = AddressSpace::for_geometry(&geometry);
        assert_eq!(space.num_pages(), 1 << 20);
        assert_eq!(
            space.map(0, 1 << 60),
            Err(TlbError::FrameOutOfRange {
                page: 0,
                frame: 1 << 60,
                max_frame: (1 << 52) - 1
            })
        );
        assert_eq!(space.lookup(0), Err(TlbError::InvalidPage { page: 0 }));

        space.map(0, geometry.max_frame()).unwrap();
        assert_eq!(space.lookup(0), Ok(geometry.max_frame()));
    }

    #[test]
    fn test_mark_invalid() {
        let mut space = AddressSpace::from_mappings(16, [(2, 0x99)]).unwrap();
        space.mark_invalid(2).unwrap();
        assert_eq!(space.lookup(2), Err(TlbError::InvalidPage { page: 2 }));
        assert_eq!(
            space.entry(2),
            Some(&PageTableEntry {
                frame_number: 0x99,
                valid: false
            })
        );

        space.mark_invalid(5).unwrap();
        assert_eq!(space.lookup(5), Err(TlbError::InvalidPage { page: 5 }));
        assert_eq!(space.valid_pages(), 0);
    }

    #[test]
    fn test_lookup_is_deterministic() {
        let space = AddressSpace::from_mappings(16, [(1, 11)]).unwrap();
        assert_eq!(space.lookup(1), space.lookup(1));
        assert_eq!(space.lookup(2), space.lookup(2));
    }
}
