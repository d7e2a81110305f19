//! 命中项与排序
use crate::types::{CarvedObject, ObjectKind};

/// 单次成功解码的结果（创建后不可变）
#[derive(Debug, Clone)]
pub struct Finding {
    /// 对象起始偏移
    pub offset: usize,
    /// 成功解码时使用的长度
    pub len: usize,
    pub object: CarvedObject,
}

impl Finding {
    pub fn kind(&self) -> ObjectKind { self.object.kind() }
}

/// 稳定排序：偏移升序 → 种类（注册表顺序）→ 长度升序
pub(crate) fn sort_findings_stable(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        a.offset
            .cmp(&b.offset)
            .then_with(|| a.kind().cmp(&b.kind()))
            .then_with(|| a.len.cmp(&b.len))
    });
}
