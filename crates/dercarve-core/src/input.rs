//! 输入加载：整个文件一次性读入内存（不做流式处理）
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// 读取整个文件；失败时应在扫描开始前终止
pub fn load_buffer(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).with_context(|| format!("read {}", path.display()))?;
    Ok(buf)
}
