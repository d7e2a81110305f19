//! 结果输出：每个命中项一行纯文本
use std::io::Write;

use anyhow::Result;

use crate::findings::Finding;
use crate::types::CarvedObject;

/// 渲染单行：`found <Kind> at index: <offset>`，证书额外附加 CN
pub fn render_line(finding: &Finding) -> String {
    match &finding.object {
        CarvedObject::Certificate(_) => {
            let cn = finding.object.common_name().unwrap_or_default();
            format!("found {} at index: {}, CN={:?}", finding.kind(), finding.offset, cn)
        }
        CarvedObject::Pkcs1PrivateKey(_) | CarvedObject::Pkcs8PrivateKey(_) | CarvedObject::PkixPublicKey(_) => {
            format!("found {} at index: {}", finding.kind(), finding.offset)
        }
    }
}

pub fn write_finding(out: &mut dyn Write, finding: &Finding) -> Result<()> {
    writeln!(out, "{}", render_line(finding))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{KeyInfo, RsaKeyInfo};
    use der::asn1::ObjectIdentifier;
    use der::Decode;
    use x509_cert::Certificate;

    const CERT_BETA: &[u8] = include_bytes!("../tests/fixtures/cert_beta.der");

    #[test]
    fn certificate_line_carries_common_name() {
        let cert = Certificate::from_der(CERT_BETA).unwrap();
        let f = Finding { offset: 42, len: CERT_BETA.len(), object: CarvedObject::Certificate(Box::new(cert)) };
        assert_eq!(render_line(&f), r#"found Certificate at index: 42, CN="beta.example""#);
    }

    #[test]
    fn key_lines_have_no_identity() {
        let f = Finding {
            offset: 7,
            len: 3,
            object: CarvedObject::Pkcs1PrivateKey(RsaKeyInfo { modulus_bits: 8, multi_prime: false }),
        };
        assert_eq!(render_line(&f), "found PKCS1PrivateKey at index: 7");

        let algorithm = ObjectIdentifier::new_unwrap("1.3.101.112");
        let f = Finding { offset: 0, len: 3, object: CarvedObject::PkixPublicKey(KeyInfo { algorithm, key_bits: None }) };
        let mut out = Vec::new();
        write_finding(&mut out, &f).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "found PKIXPublicKey at index: 0\n");
    }
}
