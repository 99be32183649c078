use std::env;

/// Settings that may be supplied through the environment or a `.env` file.
/// Anything missing falls back to the defaults in `src/config.rs`.
const FORWARDED_VARS: [&str; 7] = [
    "NOBU_WIFI_SSID",
    "NOBU_WIFI_PASSWORD",
    "NOBU_WS_HOST",
    "NOBU_WS_PORT",
    "NOBU_WS_PATH",
    "NOBU_DEVICE_ID",
    "NOBU_DEVICE_LOCATION",
];

/// Load `.env` (if present) and forward the known settings to rustc
fn forward_settings() {
    println!("cargo:rerun-if-changed=.env");

    match dotenvy::dotenv() {
        Ok(path) => println!("cargo:warning=Loaded settings from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => println!("cargo:warning=Failed to read .env: {}", e),
    }

    for name in FORWARDED_VARS {
        println!("cargo:rerun-if-env-changed={}", name);
        if let Ok(value) = env::var(name) {
            println!("cargo:rustc-env={}={}", name, value);
        }
    }
}

fn main() {
    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }

    forward_settings();
}
