//! 解码探测：在一个候选偏移上逐长度尝试解码
//!
//! 长度从 1 开始严格递增，直到首次成功或到达缓冲区末尾。
//! 不预先解析 DER 长度前缀，所有长度都暴力尝试；这是整个扫描中最主要的开销。
use crate::decoders::Decoder;
use crate::types::CarvedObject;

/// 探测成功的结果
#[derive(Debug, Clone)]
pub struct Probed {
    /// 首个成功的长度
    pub len: usize,
    pub object: CarvedObject,
}

/// 从 `offset` 起尝试所有可能的长度，返回首个成功的解码结果
pub fn probe(buf: &[u8], offset: usize, decoder: &dyn Decoder) -> Option<Probed> {
    let rest = buf.get(offset..)?;
    // 失败的尝试直接丢弃，不记录；归一化在此处强制执行
    (1..=rest.len()).find_map(|len| {
        decoder
            .decode_raw(&rest[..len])
            .normalize()
            .ok()
            .map(|object| Probed { len, object })
    })
}
