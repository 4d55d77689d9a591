//! TLB 错误类型
//!
//! 地址翻译错误（可恢复）与配置错误（构造时即失败）共用一个错误枚举。

use thiserror::Error;

use crate::{Ppn, Vpn};

/// TLB 统一错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TlbError {
    /// 页表中没有该页的有效映射
    #[error("Invalid page: no valid mapping for page {page:#x}")]
    InvalidPage { page: Vpn },

    /// 插入了缓存中已存在的页
    #[error("Duplicate TLB entry for page {page:#x}")]
    DuplicateEntry { page: Vpn },

    #[error("Invalid TLB capacity: {0} (must be at least 1)")]
    InvalidCapacity(usize),

    #[error("Invalid page size: {0} (must be a non-zero power of two)")]
    InvalidPageSize(u64),

    #[error("Invalid address width: {bits} bits (page shift is {page_shift})")]
    InvalidAddressBits { bits: u32, page_shift: u32 },

    /// 页号超出地址空间
    #[error("Page {page:#x} is outside the address space of {num_pages} pages")]
    PageOutOfRange { page: Vpn, num_pages: u64 },

    /// 页框号左移页偏移位后会溢出物理地址
    #[error("Frame {frame:#x} for page {page:#x} exceeds the largest frame {max_frame:#x}")]
    FrameOutOfRange { page: Vpn, frame: Ppn, max_frame: Ppn },

    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("Config I/O error: {0}")]
    Io(String),
}

impl TlbError {
    /// 是否为配置错误（对会话是致命的）
    pub fn is_config_error(&self) -> bool {
        !matches!(self, Self::InvalidPage { .. } | Self::DuplicateEntry { .. })
    }
}

/// TLB 结果类型
pub type TlbResult<T> = Result<T, TlbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(!TlbError::InvalidPage { page: 3 }.is_config_error());
        assert!(!TlbError::DuplicateEntry { page: 3 }.is_config_error());
        assert!(TlbError::InvalidCapacity(0).is_config_error());
        assert!(TlbError::InvalidPageSize(3000).is_config_error());
        assert!(TlbError::Parse("bad".to_string()).is_config_error());
        let wide_frame = TlbError::FrameOutOfRange {
            page: 0,
            frame: 1 << 60,
            max_frame: (1 << 52) - 1,
        };
        assert!(wide_frame.is_config_error());
    }

    #[test]
    fn test_error_display() {
        let err = TlbError::InvalidPage { page: 0x2a };
        assert_eq!(err.to_string(), "Invalid page: no valid mapping for page 0x2a");

        let err = TlbError::PageOutOfRange { page: 0x100, num_pages: 16 };
        assert!(err.to_string().contains("16 pages"));
    }
}
