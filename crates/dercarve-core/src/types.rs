//! 公共类型（对外暴露）：对象种类与解码结果
use std::fmt;

use const_oid::db::rfc4519;
use der::asn1::ObjectIdentifier;
use der::{Any, Tag, Tagged};
use x509_cert::Certificate;

/// 可恢复的对象种类（固定四种）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectKind {
    Certificate,
    Pkcs1PrivateKey,
    Pkcs8PrivateKey,
    PkixPublicKey,
}

impl ObjectKind {
    /// 标准注册表中的顺序
    pub const ALL: [ObjectKind; 4] = [
        ObjectKind::Certificate,
        ObjectKind::Pkcs1PrivateKey,
        ObjectKind::Pkcs8PrivateKey,
        ObjectKind::PkixPublicKey,
    ];

    /// 输出行中使用的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Certificate => "Certificate",
            ObjectKind::Pkcs1PrivateKey => "PKCS1PrivateKey",
            ObjectKind::Pkcs8PrivateKey => "PKCS8PrivateKey",
            ObjectKind::PkixPublicKey => "PKIXPublicKey",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PKCS#1 RSA 私钥摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaKeyInfo {
    /// 模数位数
    pub modulus_bits: usize,
    /// 是否为多素数密钥（version = multi）
    pub multi_prime: bool,
}

/// PKCS#8 / PKIX 的算法摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    pub algorithm: ObjectIdentifier,
    /// RSA 公钥的模数位数（仅 PKIX 的 RSA 公钥填写，其余为 None）
    pub key_bits: Option<usize>,
}

impl KeyInfo {
    /// 常见算法的友好名称；未知 OID 返回 None
    pub fn algorithm_name(&self) -> Option<&'static str> {
        algorithm_name(&self.algorithm)
    }
}

/// 解码成功的对象：按种类打标签，各自携带自己的载荷
#[derive(Debug, Clone)]
pub enum CarvedObject {
    Certificate(Box<Certificate>),
    Pkcs1PrivateKey(RsaKeyInfo),
    Pkcs8PrivateKey(KeyInfo),
    PkixPublicKey(KeyInfo),
}

impl CarvedObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            CarvedObject::Certificate(_) => ObjectKind::Certificate,
            CarvedObject::Pkcs1PrivateKey(_) => ObjectKind::Pkcs1PrivateKey,
            CarvedObject::Pkcs8PrivateKey(_) => ObjectKind::Pkcs8PrivateKey,
            CarvedObject::PkixPublicKey(_) => ObjectKind::PkixPublicKey,
        }
    }

    /// 证书主体的 CN；非证书或无 CN 时返回 None
    pub fn common_name(&self) -> Option<String> {
        match self {
            CarvedObject::Certificate(cert) => subject_common_name(cert),
            _ => None,
        }
    }
}

/// 提取主体 CN（存在多个 CN 时取最后一个）
pub(crate) fn subject_common_name(cert: &Certificate) -> Option<String> {
    cert.tbs_certificate
        .subject
        .0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .filter(|atv| atv.oid == rfc4519::CN)
        .last()
        .map(|atv| attribute_text(&atv.value))
}

/// 将目录字符串属性转换为文本（BMPString 为 UTF-16BE，其余按 UTF-8 有损转换）
fn attribute_text(value: &Any) -> String {
    match value.tag() {
        Tag::BmpString => {
            let units: Vec<u16> = value
                .value()
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => String::from_utf8_lossy(value.value()).into_owned(),
    }
}

pub(crate) const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const ID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const ID_DSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10040.4.1");
const ID_X25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.110");
const ID_X448: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.111");
const ID_ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");
const ID_ED448: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.113");

fn algorithm_name(oid: &ObjectIdentifier) -> Option<&'static str> {
    let name = match *oid {
        RSA_ENCRYPTION => "RSA",
        ID_EC_PUBLIC_KEY => "EC",
        ID_DSA => "DSA",
        ID_X25519 => "X25519",
        ID_X448 => "X448",
        ID_ED25519 => "Ed25519",
        ID_ED448 => "Ed448",
        _ => return None,
    };
    Some(name)
}
