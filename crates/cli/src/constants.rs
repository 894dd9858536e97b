pub const DECRYPT_URL_ENV: &str = "STREAMLINKS_DECRYPT_URL";
pub const DECRYPT_PASSPHRASE_ENV: &str = "STREAMLINKS_DECRYPT_PASSPHRASE";
pub const TIMEOUT_ENV: &str = "STREAMLINKS_TIMEOUT_SECS";
pub const HOST_TOKEN_ENV: &str = "STREAMLINKS_HOST_TOKEN";
pub const TORRENT_INDEX_ENV: &str = "STREAMLINKS_TORRENT_INDEX";

pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// tracing targets forwarded to the terminal logger.
pub const TRACED_TARGETS: [&str; 2] = ["streamlinks", "streamlinks_core"];

pub const MEDIA_KINDS: [&str; 2] = ["movie", "series"];
