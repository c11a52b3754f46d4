use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;

/// Generates a random 64-byte signing secret, base64 encoded, ready to paste
/// into the `auth` section of a config file.
pub fn generate_secret() -> String {
    let mut secret = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut secret);
    general_purpose::STANDARD.encode(secret)
}

pub fn handle_generate_secret_command() {
    println!("🔐 Generated JWT signing secret:");
    println!();
    println!("auth:");
    println!("  secret: \"{}\"", generate_secret());
    println!();
    println!("Add this to your config/{{environment}}.yaml file or set APP_AUTH__SECRET.");
}
