// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Twilio request signature (`X-Twilio-Signature`) validation.
//!
//! The signature is `base64(HMAC-SHA1(auth_token, url + k1 + v1 + k2 + v2 ...))`
//! with the form parameters sorted by key.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

fn mac_over(auth_token: &str, url: &str, params: &[(String, String)]) -> Option<HmacSha1> {
    let mut mac = HmacSha1::new_from_slice(auth_token.as_bytes()).ok()?;

    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();

    mac.update(url.as_bytes());
    for (key, value) in sorted {
        mac.update(key.as_bytes());
        mac.update(value.as_bytes());
    }
    Some(mac)
}

/// Computes the signature Twilio would send for this request.
///
/// `None` only if the key is rejected, which HMAC never does.
pub fn compute_signature(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
) -> Option<String> {
    let mac = mac_over(auth_token, url, params)?;
    Some(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Checks `signature` in constant time. Undecodable signatures never verify.
pub fn verify_signature(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
    signature: &str,
) -> bool {
    let Ok(expected) = STANDARD.decode(signature.trim()) else {
        return false;
    };
    mac_over(auth_token, url, params)
        .is_some_and(|mac| mac.verify_slice(&expected).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn documented_params() -> Vec<(String, String)> {
        pairs(&[
            ("CallSid", "CA1234567890ABCDE"),
            ("Caller", "+12349013030"),
            ("Digits", "1234"),
            ("From", "+12349013030"),
            ("To", "+18005551212"),
        ])
    }

    const DOC_URL: &str = "https://mycompany.com/myapp.php?foo=1&bar=2";

    #[test]
    fn matches_twilio_documentation_vector() {
        assert_eq!(
            compute_signature("12345", DOC_URL, &documented_params()).unwrap(),
            "0/KCTR6DLpKmkAf8muzZqo1nDgQ="
        );
        assert!(verify_signature(
            "12345",
            DOC_URL,
            &documented_params(),
            "0/KCTR6DLpKmkAf8muzZqo1nDgQ="
        ));
    }

    #[test]
    fn parameter_order_does_not_matter() {
        let mut shuffled = documented_params();
        shuffled.reverse();
        assert!(verify_signature(
            "12345",
            DOC_URL,
            &shuffled,
            "0/KCTR6DLpKmkAf8muzZqo1nDgQ="
        ));
    }

    #[test]
    fn whatsapp_payload_signature() {
        let params = pairs(&[
            ("From", "whatsapp:+5215512345678"),
            ("To", "whatsapp:+14155238886"),
            ("Body", "Hola"),
            ("MessageSid", "SM123"),
        ]);
        let url = "https://denuncia.example.mx/webhooks/whatsapp";
        assert_eq!(
            compute_signature("test-token", url, &params).unwrap(),
            "HWZ/wu1GtUnzYlWFo3/jjxDKVoA="
        );
    }

    #[test]
    fn tampered_inputs_fail() {
        let good = "0/KCTR6DLpKmkAf8muzZqo1nDgQ=";

        let mut tampered = documented_params();
        tampered[2].1 = "9999".into();
        assert!(!verify_signature("12345", DOC_URL, &tampered, good));

        assert!(!verify_signature(
            "12345",
            "https://mycompany.com/myapp.php",
            &documented_params(),
            good
        ));
        assert!(!verify_signature("54321", DOC_URL, &documented_params(), good));
        assert!(!verify_signature("12345", DOC_URL, &documented_params(), "not base64!"));
        assert!(!verify_signature("12345", DOC_URL, &documented_params(), ""));
    }

    #[test]
    fn identical_input_always_verifies() {
        let params = documented_params();
        let signature = compute_signature("secret", DOC_URL, &params).unwrap();
        for _ in 0..3 {
            assert!(verify_signature("secret", DOC_URL, &params, &signature));
        }
    }
}
