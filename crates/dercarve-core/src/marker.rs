//! 候选偏移扫描（Aho-Corasick 标记定位）
//!
//! - 标记默认为长格式 SEQUENCE 头 `0x30 0x82`（两字节长度字段）。
//! - 逐字节重扫：命中位置 p 之后从 p+1 继续查找，而不是 p+标记长度，
//!   这样相邻或嵌套的结构仍然会成为候选。
//! - 不对标记之后的内容做任何语义校验。
use aho_corasick::{AhoCorasick, AhoCorasickBuilder, Input, MatchKind};
use anyhow::{bail, Context, Result};

/// 长格式 SEQUENCE 标记：SEQUENCE 标签 + 两字节长度前缀
pub const LONG_FORM_SEQUENCE: [u8; 2] = [0x30, 0x82];

/// 逐字节重扫（byte-granular rescanning）的步长
pub const RESCAN_STRIDE: usize = 1;

/// 标记扫描器（线程安全，可跨线程共享）
#[derive(Debug, Clone)]
pub struct MarkerScanner {
    ac: AhoCorasick,
}

impl MarkerScanner {
    /// 以任意非空字节序列为标记构建扫描器
    pub fn new(pattern: &[u8]) -> Result<Self> {
        if pattern.is_empty() {
            bail!("marker pattern must not be empty");
        }
        let ac = AhoCorasickBuilder::new()
            .match_kind(MatchKind::LeftmostFirst)
            .build([pattern])
            .context("build marker automaton")?;
        Ok(Self { ac })
    }

    /// 默认的长格式 SEQUENCE 标记扫描器
    pub fn long_form_sequence() -> Result<Self> {
        Self::new(&LONG_FORM_SEQUENCE)
    }

    /// 惰性、有限、可重新开始的偏移序列（升序）
    pub fn scan<'b>(&'b self, buf: &'b [u8]) -> Offsets<'b> {
        Offsets { ac: &self.ac, buf, pos: 0 }
    }
}

/// 候选偏移迭代器
#[derive(Debug, Clone)]
pub struct Offsets<'b> {
    ac: &'b AhoCorasick,
    buf: &'b [u8],
    pos: usize,
}

impl Iterator for Offsets<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.pos >= self.buf.len() { return None; }
        let input = Input::new(self.buf).span(self.pos..self.buf.len());
        let m = self.ac.find(input)?;
        self.pos = m.start() + RESCAN_STRIDE;
        Some(m.start())
    }
}
