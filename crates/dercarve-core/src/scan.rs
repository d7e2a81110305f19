//! 扫描主流程与并行调度
//!
//! 协调策略：先一次性枚举所有候选偏移，再对 偏移 × 解码器 的全组合逐项探测。
//! - 每个组合独立探测，同一偏移可以在多个种类下命中，互不去重、不分优先级；
//! - 工作项投入固定大小的 Rayon 线程池，全部完成后扫描才结束（不提前终止）；
//! - 缓冲区只读共享，无锁；结果经通道汇总到单一 Writer。
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::Write;
use tracing::debug;

use crate::decoders::DecoderRegistry;
use crate::findings::{sort_findings_stable, Finding};
use crate::marker::MarkerScanner;
use crate::options::{CarveOptions, ScanStats};
use crate::probe::probe;
use crate::report::write_finding;
use crate::types::CarvedObject;

/// 工作项：一个 (偏移, 解码器) 组合；idx 用于 Writer 端按序输出
#[derive(Debug, Clone, Copy)]
struct WorkItem {
    idx: usize,
    offset: usize,
    decoder: usize,
}

/// 枚举候选偏移并展开为工作项；返回 (工作项, 候选偏移数)
fn plan_work(buf: &[u8], registry: &DecoderRegistry, scanner: &MarkerScanner) -> (Vec<WorkItem>, usize) {
    let offsets: Vec<usize> = scanner.scan(buf).collect();
    let n = registry.len();
    let mut items = Vec::with_capacity(offsets.len() * n);
    for (i, &offset) in offsets.iter().enumerate() {
        for decoder in 0..n {
            items.push(WorkItem { idx: i * n + decoder, offset, decoder });
        }
    }
    (items, offsets.len())
}

/// 执行单个工作项（探测失败即返回 None，不记录日志）
fn run_item(buf: &[u8], registry: &DecoderRegistry, item: &WorkItem) -> Option<Finding> {
    let decoder = registry.get(item.decoder)?;
    let probed = probe(buf, item.offset, decoder)?;
    Some(Finding { offset: item.offset, len: probed.len, object: probed.object })
}

fn build_pool(threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("dercarve-worker-{i}"))
        .build()
        .context("build rayon pool")
}

fn prepare(buf: &[u8], registry: &DecoderRegistry, opts: &CarveOptions) -> Result<(Vec<WorkItem>, ScanStats, rayon::ThreadPool)> {
    let scanner = MarkerScanner::long_form_sequence()?;
    let (items, candidates) = plan_work(buf, registry, &scanner);
    let threads = opts.worker_threads();
    debug!(buf_len = buf.len(), candidates, work_items = items.len(), threads, "scan planned");
    let stats = ScanStats { candidates, work_items: items.len(), findings: 0 };
    Ok((items, stats, build_pool(threads)?))
}

/// 扫描缓冲区并返回全部命中项（按偏移、种类排序）
pub fn scan_buffer(buf: &[u8], registry: &DecoderRegistry, opts: &CarveOptions) -> Result<Vec<Finding>> {
    use rayon::prelude::*;

    let (items, _stats, pool) = prepare(buf, registry, opts)?;
    let mut findings: Vec<Finding> = pool.install(|| {
        items
            .par_iter()
            .filter_map(|item| run_item(buf, registry, item))
            .collect()
    });
    sort_findings_stable(&mut findings);
    Ok(findings)
}

/// 扫描缓冲区并将结果逐行流式写入 `out`
/// - Rayon 线程池执行探测，结果经有界通道送往当前线程
/// - Writer 按工作项序号重排，输出顺序稳定：偏移升序，同偏移按注册表顺序
pub fn scan_and_write(buf: &[u8], registry: &DecoderRegistry, out: &mut dyn Write, opts: &CarveOptions) -> Result<ScanStats> {
    use crossbeam_channel as channel;
    use rayon::prelude::*;

    let (items, mut stats, pool) = prepare(buf, registry, opts)?;

    std::thread::scope(|s| -> Result<()> {
        // 通道在作用域内创建：Writer 出错返回时 Receiver 随之释放
        let (tx, rx) = channel::bounded::<Msg>(256);
        let items = &items;
        let pool = &pool;
        s.spawn(move || {
            pool.install(|| {
                // 发送失败说明 Writer 已退出，剩余工作项不再探测
                let _ = items
                    .par_iter()
                    .try_for_each(|item| tx.send((item.idx, run_item(buf, registry, item))).map_err(|_| ()));
            });
            // 结束后 Sender 被丢弃，Receiver 将收到关闭信号
        });
        let written = write_in_order(&rx, out, &mut stats);
        drop(rx);
        written
    })?;

    Ok(stats)
}

type Msg = (usize /*idx*/, Option<Finding>);

/// Writer：维护 next_idx 与缓存，按序输出
fn write_in_order(rx: &crossbeam_channel::Receiver<Msg>, out: &mut dyn Write, stats: &mut ScanStats) -> Result<()> {
    let mut next_idx: usize = 0;
    let mut pending: BTreeMap<usize, Option<Finding>> = BTreeMap::new();

    while let Ok((idx, found)) = rx.recv() {
        pending.insert(idx, found);
        while let Some(found) = pending.remove(&next_idx) {
            if let Some(f) = found {
                let algorithm = match &f.object {
                    CarvedObject::Pkcs8PrivateKey(k) | CarvedObject::PkixPublicKey(k) => k.algorithm_name(),
                    _ => None,
                };
                debug!(offset = f.offset, len = f.len, kind = %f.kind(), ?algorithm, "carved object");
                write_finding(out, &f)?;
                stats.findings += 1;
            }
            next_idx += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoders::{DecodeError, Decoder, RawOutcome};
    use crate::types::{ObjectKind, RsaKeyInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// 任意以 0x30 0x82 开头、长度为 4 的输入都视为成功
    struct FourByteRsa;

    impl Decoder for FourByteRsa {
        fn kind(&self) -> ObjectKind { ObjectKind::Pkcs1PrivateKey }

        fn decode_raw(&self, bytes: &[u8]) -> RawOutcome {
            if bytes.len() == 4 && bytes.starts_with(&[0x30, 0x82]) {
                let value = CarvedObject::Pkcs1PrivateKey(RsaKeyInfo { modulus_bits: 16, multi_prime: false });
                RawOutcome { value: Some(value), error: None }
            } else {
                RawOutcome { value: None, error: Some(DecodeError::Rejected("shape")) }
            }
        }
    }

    fn stub_registry() -> DecoderRegistry {
        DecoderRegistry::from_decoders(vec![Box::new(FourByteRsa)])
    }

    #[test]
    fn plan_is_cross_product_of_offsets_and_decoders() {
        let scanner = MarkerScanner::long_form_sequence().unwrap();
        let buf = [0x30, 0x82, 0x00, 0x30, 0x82];
        let (items, candidates) = plan_work(&buf, &DecoderRegistry::standard(), &scanner);
        assert_eq!(candidates, 2);
        assert_eq!(items.len(), 8);
        assert!(items.iter().enumerate().all(|(i, it)| it.idx == i));
        assert_eq!(items[4].offset, 3);
        assert_eq!(items[4].decoder, 0);
    }

    #[test]
    fn stub_findings_at_every_marker_including_nested() {
        // 偏移 2 处的标记位于偏移 0 的 4 字节对象内部，仍会被探测
        let buf = [0x30, 0x82, 0x30, 0x82, 0xAA, 0xBB];
        let findings = scan_buffer(&buf, &stub_registry(), &CarveOptions::default()).unwrap();
        let offsets: Vec<usize> = findings.iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![0, 2]);
        assert!(findings.iter().all(|f| f.len == 4));
    }

    #[test]
    fn writer_output_is_ordered_and_counted() {
        let mut buf = vec![0u8; 64];
        for at in [40, 3, 17] {
            buf[at] = 0x30;
            buf[at + 1] = 0x82;
        }
        let mut out = Vec::new();
        let opts = CarveOptions { threads: Some(4), ..Default::default() };
        let stats = scan_and_write(&buf, &stub_registry(), &mut out, &opts).unwrap();
        assert_eq!(stats, ScanStats { candidates: 3, work_items: 3, findings: 3 });
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "found PKCS1PrivateKey at index: 3\nfound PKCS1PrivateKey at index: 17\nfound PKCS1PrivateKey at index: 40\n"
        );
    }

    /// 同 FourByteRsa，另外统计开始探测的工作项数（每项的首次调用长度为 1）
    struct CountingRsa {
        started: Arc<AtomicUsize>,
    }

    impl Decoder for CountingRsa {
        fn kind(&self) -> ObjectKind { ObjectKind::Pkcs1PrivateKey }

        fn decode_raw(&self, bytes: &[u8]) -> RawOutcome {
            if bytes.len() == 1 {
                self.started.fetch_add(1, Ordering::SeqCst);
            }
            FourByteRsa.decode_raw(bytes)
        }
    }

    /// 任何写入都以 BrokenPipe 失败
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
    }

    #[test]
    fn writer_failure_stops_remaining_work() {
        const MARKERS: usize = 4000;
        let buf: Vec<u8> = [0x30, 0x82, 0x00, 0x00].repeat(MARKERS);
        let started = Arc::new(AtomicUsize::new(0));
        let reg = DecoderRegistry::from_decoders(vec![Box::new(CountingRsa { started: Arc::clone(&started) })]);
        let opts = CarveOptions { threads: Some(1) };

        let err = scan_and_write(&buf, &reg, &mut BrokenPipe, &opts).unwrap_err();
        assert!(format!("{err:#}").contains("closed"), "{err:#}");
        // 首个命中即写失败；此后只有通道容量量级的工作项还会被执行
        let started = started.load(Ordering::SeqCst);
        assert!(started < MARKERS / 2, "started {started} of {MARKERS}");
    }

    #[test]
    fn empty_registry_scans_nothing() {
        let buf = [0x30, 0x82, 0x01, 0x02];
        let mut out = Vec::new();
        let reg = DecoderRegistry::from_decoders(Vec::new());
        let stats = scan_and_write(&buf, &reg, &mut out, &CarveOptions::default()).unwrap();
        assert_eq!(stats, ScanStats { candidates: 1, work_items: 0, findings: 0 });
        assert!(out.is_empty());
    }
}
