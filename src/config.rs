use dotenvy::dotenv;

pub const DEFAULT_MEMORY_LIMIT_MB: u64 = 2000;
pub const DEFAULT_DEBUG_ROW_LIMIT: usize = 100;

const MEMORY_ENV: &str = "SHEET_INSPECT_MEMORY_MB";
const DEBUG_ROWS_ENV: &str = "SHEET_INSPECT_DEBUG_ROWS";

/// Runtime settings. Built once at startup and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Ceiling for materialized sheet data, in MiB.
    pub memory_limit_mb: u64,
    /// Rows scanned per target sheet in debug mode.
    pub debug_row_limit: usize,
    /// Columns with at most this many distinct values list all of them.
    pub max_listed_distinct: usize,
    /// Number of values kept once a column exceeds `max_listed_distinct`.
    pub top_values: usize,
    pub display_truncate: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            memory_limit_mb: DEFAULT_MEMORY_LIMIT_MB,
            debug_row_limit: DEFAULT_DEBUG_ROW_LIMIT,
            max_listed_distinct: 20,
            top_values: 10,
            display_truncate: 100,
        }
    }
}

impl Config {
    /// Reads `.env` and the process environment. Values that do not parse are
    /// ignored with a warning and the default is kept.
    pub fn from_env() -> Self {
        dotenv().ok();

        let mut config = Config::default();
        if let Ok(raw) = std::env::var(MEMORY_ENV) {
            config.apply_memory_limit(&raw);
        }
        if let Ok(raw) = std::env::var(DEBUG_ROWS_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(rows) if rows > 0 => config.debug_row_limit = rows,
                _ => tracing::warn!("Invalid {} value '{}', using {}", DEBUG_ROWS_ENV, raw, config.debug_row_limit),
            }
        }
        config
    }

    /// Applies a memory ceiling given in MiB. Returns false (and keeps the
    /// current ceiling) when the value is not a positive number.
    pub fn apply_memory_limit(&mut self, raw: &str) -> bool {
        match raw.trim().parse::<u64>() {
            Ok(mb) if mb > 0 => {
                self.memory_limit_mb = mb;
                true
            }
            _ => {
                tracing::warn!("Invalid memory value provided. Skipping memory limit change.");
                false
            }
        }
    }

    pub fn memory_limit_bytes(&self) -> u64 {
        self.memory_limit_mb.saturating_mul(1024 * 1024)
    }
}
