//! Shared secret generation.

use rand::RngCore;
use rodcall_protocol::Secret;

/// Length of generated secrets in bytes.
pub const SECRET_LEN: usize = 32;

/// Random secret from the OS-seeded thread RNG.
pub fn generate() -> Secret {
    let mut bytes = vec![0u8; SECRET_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    Secret::new(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_secrets_differ() {
        let a = generate();
        let b = generate();
        assert_eq!(a.as_bytes().len(), SECRET_LEN);
        assert_ne!(a, b);
        assert_eq!(Secret::from_base64(&a.to_base64()).unwrap(), a);
    }
}
