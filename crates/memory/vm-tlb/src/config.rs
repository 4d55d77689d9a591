//! TLB 配置
//!
//! 容量、页大小、地址位宽与初始页表映射。支持从 TOML / JSON 加载，
//! 构造 [`SoftMmu`](crate::SoftMmu) 前统一验证。
//!
//! ```toml
//! capacity = 5
//! page_size = 4096
//! address_bits = 32
//!
//! [[mappings]]
//! page = 0
//! frame = 0x12345
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::address::PageGeometry;
use crate::error::{TlbError, TlbResult};
use crate::page_table::AddressSpace;
use crate::{Ppn, Vpn};

/// 初始页表映射
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMapping {
    pub page: Vpn,
    pub frame: Ppn,
    #[serde(default = "default_valid")]
    pub valid: bool,
}

fn default_valid() -> bool {
    true
}

impl PageMapping {
    pub fn new(page: Vpn, frame: Ppn) -> Self {
        Self {
            page,
            frame,
            valid: true,
        }
    }
}

/// TLB 配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlbConfig {
    /// TLB 条目数
    pub capacity: usize,
    /// 页大小（2 的幂）
    pub page_size: u64,
    /// 虚拟地址位宽
    pub address_bits: u32,
    /// 初始页表映射
    pub mappings: Vec<PageMapping>,
}

impl Default for TlbConfig {
    fn default() -> Self {
        Self {
            capacity: crate::DEFAULT_TLB_ENTRIES,
            page_size: crate::DEFAULT_PAGE_SIZE,
            address_bits: crate::DEFAULT_ADDRESS_BITS,
            mappings: vec![PageMapping::new(0, 0x12345)],
        }
    }
}

impl TlbConfig {
    /// 从 TOML 字符串加载配置
    pub fn from_toml(toml: &str) -> TlbResult<Self> {
        toml::from_str(toml).map_err(|e| TlbError::Parse(format!("TOML parse error: {}", e)))
    }

    /// 从 JSON 字符串加载配置
    pub fn from_json(json: &str) -> TlbResult<Self> {
        serde_json::from_str(json).map_err(|e| TlbError::Parse(format!("JSON parse error: {}", e)))
    }

    /// 从文件加载配置，`.json` 按 JSON 解析，其余按 TOML 解析
    pub fn from_file<P: AsRef<Path>>(path: P) -> TlbResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| TlbError::Io(format!("Failed to read {}: {}", path.display(), e)))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        }
    }

    /// 将配置序列化为 TOML
    pub fn to_toml(&self) -> TlbResult<String> {
        toml::to_string_pretty(self).map_err(|e| TlbError::Parse(format!("TOML serialize error: {}", e)))
    }

    /// 将配置序列化为 JSON
    pub fn to_json(&self) -> TlbResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TlbError::Parse(format!("JSON serialize error: {}", e)))
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_address_bits(mut self, address_bits: u32) -> Self {
        self.address_bits = address_bits;
        self
    }

    /// 追加一条有效映射
    pub fn with_mapping(mut self, page: Vpn, frame: Ppn) -> Self {
        self.mappings.push(PageMapping::new(page, frame));
        self
    }

    /// 验证配置的有效性
    ///
    /// # 错误
    ///
    /// 容量为 0、页大小不是 2 的幂、地址位宽不合法、映射超出地址空间
    /// 或页框号过大时返回对应错误
    pub fn validate(&self) -> TlbResult<()> {
        if self.capacity == 0 {
            return Err(TlbError::InvalidCapacity(self.capacity));
        }
        let geometry = self.geometry()?;
        let num_pages = geometry.num_pages();
        if let Some(mapping) = self.mappings.iter().find(|m| m.page >= num_pages) {
            return Err(TlbError::PageOutOfRange {
                page: mapping.page,
                num_pages,
            });
        }
        let max_frame = geometry.max_frame();
        if let Some(mapping) = self.mappings.iter().find(|m| m.frame > max_frame) {
            return Err(TlbError::FrameOutOfRange {
                page: mapping.page,
                frame: mapping.frame,
                max_frame,
            });
        }
        Ok(())
    }

    /// 页几何
    pub fn geometry(&self) -> TlbResult<PageGeometry> {
        PageGeometry::new(self.page_size, self.address_bits)
    }

    /// 按映射列表构建页表，同一页的后续映射覆盖先前的
    pub fn build_address_space(&self) -> TlbResult<AddressSpace> {
        let mut space = AddressSpace::for_geometry(&self.geometry()?);
        for mapping in &self.mappings {
            if mapping.valid {
                space.map(mapping.page, mapping.frame)?;
            } else {
                space.mark_invalid(mapping.page)?;
            }
        }
        Ok(space)
    }
}
