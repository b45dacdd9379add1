//! `lens-cli keygen` — operator key generation, in the spirit of
//! `generate_keys.py`'s `generate_secure_key`: a cryptographically random
//! byte string, base64-encoded, suitable for `MASTER_ENCRYPTION_KEY`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::Args;
use rand::RngCore;

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Key length in bytes before base64 encoding.
    #[arg(long, default_value_t = 32)]
    pub length: usize,

    /// How many independent keys to print, one per line.
    #[arg(long, default_value_t = 1)]
    pub count: usize,
}

pub fn execute(args: KeygenArgs) -> anyhow::Result<()> {
    for _ in 0..args.count {
        println!("{}", generate_key(args.length));
    }
    Ok(())
}

fn generate_key(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    rand::thread_rng().fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_decodes_back_to_the_requested_length() {
        let key = generate_key(32);
        let decoded = STANDARD.decode(key).unwrap();
        assert_eq!(decoded.len(), 32);
    }

    #[test]
    fn two_generated_keys_are_not_equal() {
        assert_ne!(generate_key(32), generate_key(32));
    }
}
