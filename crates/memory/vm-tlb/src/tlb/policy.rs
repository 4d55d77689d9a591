//! TLB 替换策略
//!
//! 缓存已满时由策略选出被替换的槽位，查找与插入逻辑不关心具体策略。

use std::fmt;

use super::cache::CacheEntry;

/// 替换策略接口
pub trait ReplacementPolicy: fmt::Debug {
    /// 策略名称
    fn name(&self) -> &'static str;

    /// 缓存已满时选出被替换的槽位，并推进内部状态
    ///
    /// 调用时 `entries` 非空；返回值应小于 `entries.len()`。
    fn choose_victim(&mut self, entries: &[CacheEntry]) -> usize;

    /// 下一次将被替换的槽位，不推进内部状态
    fn peek_victim(&self, entries: &[CacheEntry]) -> Option<usize>;

    /// 缓存清空时复位
    fn reset(&mut self);
}

/// 先进先出 (FIFO)
///
/// 槽位按插入顺序填满，之后用一个环形游标依次替换，
/// 游标所指的槽位总是驻留最久的条目。查找不会影响替换顺序。
#[derive(Debug, Clone, Default)]
pub struct FifoPolicy {
    cursor: usize,
}

impl FifoPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前游标
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl ReplacementPolicy for FifoPolicy {
    fn name(&self) -> &'static str {
        "fifo"
    }

    fn choose_victim(&mut self, entries: &[CacheEntry]) -> usize {
        debug_assert!(!entries.is_empty());
        let len = entries.len().max(1);
        let victim = self.cursor % len;
        self.cursor = (victim + 1) % len;
        victim
    }

    fn peek_victim(&self, entries: &[CacheEntry]) -> Option<usize> {
        if entries.is_empty() {
            None
        } else {
            Some(self.cursor % entries.len())
        }
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }
}
