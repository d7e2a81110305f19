//! 核心雕刻库：从无结构的二进制缓冲区中恢复 DER 编码的证书与密钥
//!
//! 设计要点：
//! - 以长格式 SEQUENCE 头（0x30 0x82）作为候选起点，逐字节重扫，不做语义预判。
//! - 每个候选偏移对每种对象（证书 / PKCS#1 / PKCS#8 / PKIX 公钥）独立暴力探测长度。
//! - 偏移 × 解码器 的组合在固定大小的线程池上并行执行，结果全部保留、不跨种类去重。
//! - 解码失败是常态，静默丢弃；“有值但带错误”的结果一律视为失败。

mod decoders;
mod findings;
mod input;
mod marker;
mod options;
mod probe;
mod report;
mod scan;
mod types;

pub use decoders::{
    CertificateDecoder, DecodeError, DecodeExt, Decoder, DecoderRegistry, Pkcs1Decoder, Pkcs8Decoder, PkixPublicKeyDecoder,
    RawOutcome,
};
pub use findings::Finding;
pub use input::load_buffer;
pub use marker::{MarkerScanner, Offsets, LONG_FORM_SEQUENCE, RESCAN_STRIDE};
pub use options::{CarveOptions, ScanStats};
pub use probe::{probe, Probed};
pub use report::{render_line, write_finding};
pub use scan::{scan_and_write, scan_buffer};
pub use types::{CarvedObject, KeyInfo, ObjectKind, RsaKeyInfo};
