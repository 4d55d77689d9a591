//! 翻译结果的文本呈现
//!
//! 二进制串只用于展示，页号与偏移的规范表示始终是数值。

use std::fmt;

use crate::address::PageGeometry;
use crate::mmu::TranslationRecord;
use crate::tlb::{CacheEntry, CacheOutcome, ReplacementPolicy, TranslationCache};
use crate::{VirtAddr, Vpn};

/// 定宽二进制串，高位在前
pub fn to_binary(value: u64, bits: u32) -> String {
    (0..bits.min(64))
        .rev()
        .map(|i| if (value >> i) & 1 == 1 { '1' } else { '0' })
        .collect()
}

/// 每 4 位以空格分组的二进制串
pub fn to_grouped_binary(value: u64, bits: u32) -> String {
    let digits = to_binary(value, bits);
    let lead = digits.len() % 4;
    let mut out = String::with_capacity(digits.len() + digits.len() / 4);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (i + 4 - lead) % 4 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// 解析二进制串，忽略空白
pub fn parse_binary(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(&digits, 2).ok()
}

/// 单次翻译报告
pub struct TranslationReport<'a> {
    record: &'a TranslationRecord,
    geometry: &'a PageGeometry,
}

impl<'a> TranslationReport<'a> {
    pub fn new(record: &'a TranslationRecord, geometry: &'a PageGeometry) -> Self {
        Self { record, geometry }
    }
}

impl fmt::Display for TranslationReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record;
        let geometry = self.geometry;
        match record.outcome {
            CacheOutcome::Hit => writeln!(f, "TLB Hit")?,
            CacheOutcome::Miss { .. } => writeln!(f, "TLB Miss")?,
        }
        writeln!(f, "Page: {}", record.virtual_page)?;
        writeln!(f, "Offset: {}", record.offset)?;
        writeln!(
            f,
            "Page (binary): {}",
            to_binary(record.virtual_page, geometry.page_bits())
        )?;
        writeln!(
            f,
            "Offset (binary): {}",
            to_binary(record.offset, geometry.offset_bits())
        )?;
        writeln!(f, "Frame: {:#x}", record.frame_number)?;
        writeln!(
            f,
            "Virtual address: {} -> Physical address: 0x{:08X}",
            record.virtual_address, record.physical_address
        )?;
        match record.outcome.evicted() {
            Some(evicted) => write!(
                f,
                "Replacement policy: 0x{:08X} (page {})",
                geometry.page_base(evicted.virtual_page),
                evicted.virtual_page
            ),
            None => write!(f, "Replacement policy: 0x0"),
        }
    }
}

/// 无效页报告
pub struct InvalidPageReport<'a> {
    address: VirtAddr,
    page: Vpn,
    geometry: &'a PageGeometry,
}

impl<'a> InvalidPageReport<'a> {
    pub fn new(address: VirtAddr, geometry: &'a PageGeometry) -> Self {
        Self {
            address,
            page: geometry.split(address).page,
            geometry,
        }
    }
}

impl fmt::Display for InvalidPageReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 超出地址空间的页号需要更多位才能完整显示
        let bits = self
            .geometry
            .page_bits()
            .max(u64::BITS - self.page.leading_zeros());
        write!(
            f,
            "Error: invalid virtual address {} (page dec: {}, bin: {})",
            self.address,
            self.page,
            to_grouped_binary(self.page, bits)
        )
    }
}

/// TLB 内容转储，按槽位列出
pub struct CacheDump<'a> {
    entries: &'a [CacheEntry],
    capacity: usize,
    next_victim: Option<Vpn>,
}

impl<'a> CacheDump<'a> {
    pub fn new<P: ReplacementPolicy>(cache: &'a TranslationCache<P>) -> Self {
        Self {
            entries: cache.entries(),
            capacity: cache.capacity(),
            next_victim: cache.next_victim().map(|entry| entry.virtual_page),
        }
    }
}

impl fmt::Display for CacheDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TLB contents ({}/{}):", self.entries.len(), self.capacity)?;
        for slot in 0..self.capacity {
            match self.entries.get(slot) {
                Some(entry) => {
                    write!(
                        f,
                        "\nEntry {}: page {:#x} -> frame {:#x}",
                        slot, entry.virtual_page, entry.frame_number
                    )?;
                    if self.next_victim == Some(entry.virtual_page) {
                        write!(f, " <- next victim")?;
                    }
                }
                None => write!(f, "\nEntry {}: empty", slot)?,
            }
        }
        Ok(())
    }
}
