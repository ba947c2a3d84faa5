use std::env;
use std::fmt;
use std::str::FromStr;

use tracing::warn;

pub const DEFAULT_SLOT_DURATION_MINUTES: i64 = 30;
pub const DEFAULT_SERVER_PORT: u16 = 3000;
const MINUTES_PER_DAY: i64 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Supabase,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "in_memory" | "in-memory" => Ok(StorageBackend::Memory),
            "supabase" | "postgrest" => Ok(StorageBackend::Supabase),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Supabase => write!(f, "supabase"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_api_key: String,
    pub storage_backend: StorageBackend,
    pub slot_duration_minutes: i64,
    pub server_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_api_key: String::new(),
            storage_backend: StorageBackend::Memory,
            slot_duration_minutes: DEFAULT_SLOT_DURATION_MINUTES,
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_api_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
                    String::new()
                }),
            storage_backend: env::var("STORAGE_BACKEND")
                .ok()
                .and_then(|raw| {
                    raw.parse()
                        .map_err(|e| warn!("Ignoring STORAGE_BACKEND: {}", e))
                        .ok()
                })
                .unwrap_or_else(|| {
                    warn!("STORAGE_BACKEND not set, using in-memory stores");
                    StorageBackend::Memory
                }),
            slot_duration_minutes: env::var("SLOT_DURATION_MINUTES")
                .ok()
                .and_then(|raw| parse_slot_duration(&raw))
                .unwrap_or_else(|| {
                    warn!("SLOT_DURATION_MINUTES not set or invalid, using default");
                    DEFAULT_SLOT_DURATION_MINUTES
                }),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|raw| raw.parse::<u16>().ok())
                .unwrap_or_else(|| {
                    warn!("SERVER_PORT not set or invalid, using default");
                    DEFAULT_SERVER_PORT
                }),
        };

        if config.storage_backend == StorageBackend::Supabase && !config.is_configured() {
            warn!("Supabase backend requested but SUPABASE_URL/SUPABASE_SERVICE_ROLE_KEY are missing");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_api_key.is_empty()
    }

    /// Backend the server should actually run on.
    pub fn effective_backend(&self) -> StorageBackend {
        match self.storage_backend {
            StorageBackend::Supabase if self.is_configured() => StorageBackend::Supabase,
            _ => StorageBackend::Memory,
        }
    }
}

/// Slot length in minutes; a slot must fit inside one day.
fn parse_slot_duration(raw: &str) -> Option<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|minutes| (1..MINUTES_PER_DAY).contains(minutes))
}
