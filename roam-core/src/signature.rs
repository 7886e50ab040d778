use hmac::{Hmac, Mac};
use roam_shared::Masked;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::{CoreError, CoreResult};

type HmacSha256 = Hmac<Sha256>;

/// Hex HMAC-SHA256 of `order_id|payment_id` keyed by `secret`.
pub fn compute_signature(order_id: &str, payment_id: &str, secret: &str) -> CoreResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| CoreError::InternalError(format!("HMAC key rejected: {}", e)))?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Pure check of a gateway-supplied signature.
///
/// The comparison runs over the hex text in constant time; any difference in
/// length or content yields `false`.
pub fn verify_signature(order_id: &str, payment_id: &str, signature: &str, secret: &str) -> bool {
    match compute_signature(order_id, payment_id, secret) {
        Ok(expected) => expected.as_bytes().ct_eq(signature.as_bytes()).into(),
        Err(_) => false,
    }
}

/// Verifies payment confirmations against the shared gateway secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Masked<String>,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: Masked::new(secret.into()) }
    }

    /// Fails with a validation error when any input is blank; otherwise
    /// reports whether the signature matches.
    pub fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> CoreResult<bool> {
        for (name, value) in [("orderId", order_id), ("paymentId", payment_id), ("signature", signature)] {
            if value.trim().is_empty() {
                return Err(CoreError::ValidationError(format!("{} is required", name)));
            }
        }
        let matches = verify_signature(order_id, payment_id, signature, self.secret.expose());
        if !matches {
            tracing::debug!(order_id, "Payment signature mismatch");
        }
        Ok(matches)
    }

    /// Produces the signature the gateway would send; used by test doubles and tooling.
    pub fn sign(&self, order_id: &str, payment_id: &str) -> CoreResult<String> {
        compute_signature(order_id, payment_id, self.secret.expose())
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier").field("secret", &self.secret).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_key_secret";

    #[test]
    fn test_known_vector() {
        // echo -n "o1|p1" | openssl dgst -sha256 -hmac "test_key_secret"
        let sig = compute_signature("o1", "p1", SECRET).unwrap();
        assert_eq!(sig, "ea87fb13c3ca3e249b611198bc118a94df05a19a63e9fd3f27ef2415a519b74e");
        assert!(verify_signature("o1", "p1", &sig, SECRET));
    }

    #[test]
    fn test_any_single_char_mutation_fails() {
        let sig = compute_signature("order_abc", "pay_xyz", SECRET).unwrap();

        for i in 0..sig.len() {
            let mut bytes = sig.clone().into_bytes();
            bytes[i] = if bytes[i] == b'0' { b'1' } else { b'0' };
            let tampered = String::from_utf8(bytes).unwrap();
            assert!(!verify_signature("order_abc", "pay_xyz", &tampered, SECRET), "position {}", i);
        }

        assert!(!verify_signature("order_abd", "pay_xyz", &sig, SECRET));
        assert!(!verify_signature("order_abc", "pay_xyy", &sig, SECRET));
        assert!(!verify_signature("order_abc", "pay_xyz", &sig.to_uppercase(), SECRET));
        assert!(!verify_signature("order_abc", "pay_xyz", &sig[..63], SECRET));
        assert!(!verify_signature("order_abc", "pay_xyz", &sig, "other_secret"));
    }

    #[test]
    fn test_separator_is_part_of_message() {
        // "a|bc" and "ab|c" must not collide.
        let left = compute_signature("a", "bc", SECRET).unwrap();
        let right = compute_signature("ab", "c", SECRET).unwrap();
        assert_ne!(left, right);
    }

    #[test]
    fn test_verifier_rejects_missing_fields() {
        let verifier = SignatureVerifier::new(SECRET);
        assert!(matches!(verifier.verify("", "p1", "sig"), Err(CoreError::ValidationError(_))));
        assert!(matches!(verifier.verify("o1", " ", "sig"), Err(CoreError::ValidationError(_))));
        assert!(matches!(verifier.verify("o1", "p1", ""), Err(CoreError::ValidationError(_))));

        let sig = verifier.sign("o1", "p1").unwrap();
        assert!(verifier.verify("o1", "p1", &sig).unwrap());
        assert!(!verifier.verify("o1", "p2", &sig).unwrap());
    }

    #[test]
    fn test_debug_hides_secret() {
        let verifier = SignatureVerifier::new(SECRET);
        assert!(!format!("{:?}", verifier).contains(SECRET));
    }
}
