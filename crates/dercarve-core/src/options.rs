//! 扫描选项与统计信息（模块）

/// 扫描选项
#[derive(Debug, Clone, Default)]
pub struct CarveOptions {
    /// 线程数：None 表示自动（等于 CPU 核数）；Some(1) 为单线程
    pub threads: Option<usize>,
}

impl CarveOptions {
    /// 实际使用的工作线程数（至少为 1）
    pub fn worker_threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get).max(1)
    }
}

/// 扫描统计信息（便于 CLI 打印）
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    /// 标记命中的候选偏移数
    pub candidates: usize,
    /// 偏移 × 解码器 的工作项数
    pub work_items: usize,
    pub findings: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_threads_never_zero() {
        assert_eq!(CarveOptions { threads: Some(0), ..Default::default() }.worker_threads(), 1);
        assert_eq!(CarveOptions { threads: Some(3), ..Default::default() }.worker_threads(), 3);
        assert!(CarveOptions::default().worker_threads() >= 1);
    }
}
