//! 页几何：虚拟地址的页号/页内偏移拆分

use serde::Serialize;

use crate::error::{TlbError, TlbResult};
use crate::{PhysAddr, Ppn, VirtAddr, Vpn};

/// 页大小与地址位宽
///
/// 页大小必须是 2 的幂，因此拆分只需移位与掩码。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageGeometry {
    page_size: u64,
    page_shift: u32,
    address_bits: u32,
}

/// 拆分后的虚拟地址
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecodedAddress {
    pub address: VirtAddr,
    pub page: Vpn,
    pub offset: u64,
}

impl PageGeometry {
    /// 创建页几何
    ///
    /// # 错误
    ///
    /// - 页大小为 0 或不是 2 的幂时返回 `InvalidPageSize`
    /// - 地址位宽不足以容纳至少一位页号，或超过 64 位时返回 `InvalidAddressBits`
    pub fn new(page_size: u64, address_bits: u32) -> TlbResult<Self> {
        if !page_size.is_power_of_two() {
            return Err(TlbError::InvalidPageSize(page_size));
        }
        let page_shift = page_size.trailing_zeros();

        // 页号位数限制在 63 以内，num_pages 才能用 u64 表示
        if address_bits > 64 || address_bits <= page_shift || address_bits - page_shift > 63 {
            return Err(TlbError::InvalidAddressBits {
                bits: address_bits,
                page_shift,
            });
        }

        Ok(Self {
            page_size,
            page_shift,
            address_bits,
        })
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// log2(page_size)
    pub fn page_shift(&self) -> u32 {
        self.page_shift
    }

    pub fn address_bits(&self) -> u32 {
        self.address_bits
    }

    /// 页号位数（32 位地址、4KB 页时为 20）
    pub fn page_bits(&self) -> u32 {
        self.address_bits - self.page_shift
    }

    /// 页内偏移位数（4KB 页时为 12）
    pub fn offset_bits(&self) -> u32 {
        self.page_shift
    }

    pub fn offset_mask(&self) -> u64 {
        self.page_size - 1
    }

    /// 地址空间中的页数
    pub fn num_pages(&self) -> u64 {
        1u64 << self.page_bits()
    }

    /// 拆分虚拟地址
    ///
    /// 超出地址位宽的地址会得到 `>= num_pages()` 的页号，由页表判为无效。
    #[inline]
    pub fn split(&self, address: VirtAddr) -> DecodedAddress {
        DecodedAddress {
            address,
            page: address >> self.page_shift,
            offset: address & self.offset_mask(),
        }
    }

    /// 由页框号与页内偏移组合物理地址
    #[inline]
    pub fn compose(&self, frame: Ppn, offset: u64) -> PhysAddr {
        (frame << self.page_shift) | (offset & self.offset_mask())
    }

    /// 不会在 `compose` 中丢失高位的最大页框号
    pub fn max_frame(&self) -> Ppn {
        u64::MAX >> self.page_shift
    }

    /// 页的基地址
    pub fn page_base(&self, page: Vpn) -> VirtAddr {
        page << self.page_shift
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            page_size: crate::DEFAULT_PAGE_SIZE,
            page_shift: crate::DEFAULT_PAGE_SIZE.trailing_zeros(),
            address_bits: crate::DEFAULT_ADDRESS_BITS,
        }
    }
}
