//! 解码器注册表：每种对象一个解码器
//!
//! 底层解码结果统一归一化为 `Result`：
//! - 有值且无错误 → 成功
//! - 只要带有错误（即使同时有值）→ 失败
//! - 既无值也无错误 → 失败
use der::Decode;
use thiserror::Error;
use x509_cert::Certificate;

use crate::types::{CarvedObject, KeyInfo, ObjectKind, RsaKeyInfo, RSA_ENCRYPTION};

/// 单次解码失败的原因（调用方不区分，仅用于调试）
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("DER decode failed: {0}")]
    Der(#[from] der::Error),
    #[error("decoder returned neither value nor error")]
    Empty,
    #[error("rejected: {0}")]
    Rejected(&'static str),
}

/// 底层解码器的原始返回：值与错误可能同时存在
#[derive(Debug, Default)]
pub struct RawOutcome {
    pub value: Option<CarvedObject>,
    pub error: Option<DecodeError>,
}

impl RawOutcome {
    /// 归一化：只有“有值且无错误”才算成功
    pub fn normalize(self) -> Result<CarvedObject, DecodeError> {
        match (self.value, self.error) {
            (_, Some(err)) => Err(err),
            (Some(value), None) => Ok(value),
            (None, None) => Err(DecodeError::Empty),
        }
    }
}

impl From<Result<CarvedObject, DecodeError>> for RawOutcome {
    fn from(res: Result<CarvedObject, DecodeError>) -> Self {
        match res {
            Ok(value) => Self { value: Some(value), error: None },
            Err(err) => Self { value: None, error: Some(err) },
        }
    }
}

/// 解码能力：无状态、可重入，可被多个线程同时调用
pub trait Decoder: Send + Sync {
    fn kind(&self) -> ObjectKind;

    /// 调用底层解码库，返回未归一化的结果
    fn decode_raw(&self, bytes: &[u8]) -> RawOutcome;
}

/// 归一化解码：对所有 `Decoder` 统一实现，具体解码器无法绕过
pub trait DecodeExt {
    fn decode(&self, bytes: &[u8]) -> Result<CarvedObject, DecodeError>;
}

impl<T: Decoder + ?Sized> DecodeExt for T {
    fn decode(&self, bytes: &[u8]) -> Result<CarvedObject, DecodeError> {
        self.decode_raw(bytes).normalize()
    }
}

/// X.509 证书
pub struct CertificateDecoder;

impl Decoder for CertificateDecoder {
    fn kind(&self) -> ObjectKind { ObjectKind::Certificate }

    fn decode_raw(&self, bytes: &[u8]) -> RawOutcome {
        Certificate::from_der(bytes)
            .map(|cert| CarvedObject::Certificate(Box::new(cert)))
            .map_err(DecodeError::from)
            .into()
    }
}

/// PKCS#1 RSA 私钥
pub struct Pkcs1Decoder;

impl Decoder for Pkcs1Decoder {
    fn kind(&self) -> ObjectKind { ObjectKind::Pkcs1PrivateKey }

    fn decode_raw(&self, bytes: &[u8]) -> RawOutcome {
        pkcs1::RsaPrivateKey::from_der(bytes)
            .map(|key| {
                CarvedObject::Pkcs1PrivateKey(RsaKeyInfo {
                    modulus_bits: bit_len(key.modulus.as_bytes()),
                    multi_prime: key.other_prime_infos.is_some(),
                })
            })
            .map_err(DecodeError::from)
            .into()
    }
}

/// PKCS#8 私钥（仅未加密的 PrivateKeyInfo）
pub struct Pkcs8Decoder;

impl Decoder for Pkcs8Decoder {
    fn kind(&self) -> ObjectKind { ObjectKind::Pkcs8PrivateKey }

    fn decode_raw(&self, bytes: &[u8]) -> RawOutcome {
        pkcs8::PrivateKeyInfo::from_der(bytes)
            .map(|info| CarvedObject::Pkcs8PrivateKey(KeyInfo { algorithm: info.algorithm.oid, key_bits: None }))
            .map_err(DecodeError::from)
            .into()
    }
}

/// PKIX 公钥（SubjectPublicKeyInfo）
pub struct PkixPublicKeyDecoder;

impl Decoder for PkixPublicKeyDecoder {
    fn kind(&self) -> ObjectKind { ObjectKind::PkixPublicKey }

    fn decode_raw(&self, bytes: &[u8]) -> RawOutcome {
        spki::SubjectPublicKeyInfoRef::from_der(bytes)
            .map(|info| {
                // 仅 RSA 可从位串中解出模数；其他算法不给位数
                let key_bits = if info.algorithm.oid == RSA_ENCRYPTION {
                    info.subject_public_key
                        .as_bytes()
                        .and_then(|raw| pkcs1::RsaPublicKey::from_der(raw).ok())
                        .map(|key| bit_len(key.modulus.as_bytes()))
                } else {
                    None
                };
                CarvedObject::PkixPublicKey(KeyInfo { algorithm: info.algorithm.oid, key_bits })
            })
            .map_err(DecodeError::from)
            .into()
    }
}

/// 大端无符号整数的有效位数
fn bit_len(bytes: &[u8]) -> usize {
    match bytes.iter().position(|&b| b != 0) {
        Some(i) => (bytes.len() - i) * 8 - bytes[i].leading_zeros() as usize,
        None => 0,
    }
}

/// 解码器注册表：构造一次，显式传入扫描与探测流程
pub struct DecoderRegistry {
    pub(crate) decoders: Vec<Box<dyn Decoder>>,
}

impl DecoderRegistry {
    /// 标准注册表：证书、PKCS#1、PKCS#8、PKIX 公钥
    pub fn standard() -> Self {
        Self::from_decoders(vec![
            Box::new(CertificateDecoder),
            Box::new(Pkcs1Decoder),
            Box::new(Pkcs8Decoder),
            Box::new(PkixPublicKeyDecoder),
        ])
    }

    /// 使用自定义解码器构建（测试替身等）
    pub fn from_decoders(decoders: Vec<Box<dyn Decoder>>) -> Self {
        Self { decoders }
    }

    pub fn len(&self) -> usize { self.decoders.len() }

    pub fn is_empty(&self) -> bool { self.decoders.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Decoder> {
        self.decoders.iter().map(|d| d.as_ref())
    }

    pub(crate) fn get(&self, idx: usize) -> Option<&dyn Decoder> {
        self.decoders.get(idx).map(|d| d.as_ref())
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self { Self::standard() }
}
