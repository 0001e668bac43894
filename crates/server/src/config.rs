use shared_types::{AppConfig, FeatureFlags};
use std::sync::OnceLock;
use std::time::Duration;

static FLAGS: OnceLock<FeatureFlags> = OnceLock::new();

/// Path to the config file, relative to the project root.
const CONFIG_PATH: &str = "config.toml";

/// Read `config.toml`, parse feature flags, and store them in the global
/// `OnceLock`. Only the first call has effect.
///
/// If the file is missing or unparseable, all flags default to `false`.
pub fn load_feature_flags() {
    FLAGS.get_or_init(|| match std::fs::read_to_string(CONFIG_PATH) {
        Ok(contents) => parse_feature_flags(&contents),
        Err(e) => {
            eprintln!("[config] {CONFIG_PATH} not found ({e}), all flags off");
            FeatureFlags::default()
        }
    });
}

fn parse_feature_flags(contents: &str) -> FeatureFlags {
    match toml::from_str::<AppConfig>(contents) {
        Ok(config) => {
            eprintln!("[config] Feature flags: {:?}", config.features);
            config.features
        }
        Err(e) => {
            eprintln!("[config] Failed to parse {CONFIG_PATH}: {e}, all flags off");
            FeatureFlags::default()
        }
    }
}

/// Get the loaded feature flags. Returns all-false defaults if
/// `load_feature_flags()` hasn't been called yet.
pub fn feature_flags() -> &'static FeatureFlags {
    static DEFAULT: FeatureFlags = FeatureFlags {
        telemetry: false,
        json_logs: false,
        staff_self_registration: false,
    };
    FLAGS.get().unwrap_or(&DEFAULT)
}

/// Read an environment variable and parse it, falling back to `default`
/// when it is unset or malformed.
pub fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

pub fn bind_addr() -> String {
    std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
}

/// Request body cap for every route (default 1 MiB).
pub fn max_body_bytes() -> usize {
    env_or("MAX_BODY_BYTES", 1024 * 1024)
}

/// Auth endpoint budget per client address.
pub fn auth_rate_limit() -> (u32, Duration) {
    (env_or("AUTH_RATE_LIMIT", 20), Duration::from_secs(60))
}
