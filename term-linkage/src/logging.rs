//! Logging configuration for blocking analysis.
//!
//! The analyzer always warns when it skips a rule. Everything else it can say
//! (per-rule estimates, each statistics query) is gated by [`LogConfig`] so a
//! large rule set does not flood production logs.

use tracing::Level;

/// Controls how chatty the analyzer is.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base log level for analysis components
    pub base_level: Level,
    /// Whether to log the estimate computed for every rule
    pub log_rule_details: bool,
    /// Whether to log each statistics query
    pub log_statistics_queries: bool,
    /// Maximum length for logged rule text
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: Level::INFO,
            log_rule_details: false,
            log_statistics_queries: true,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// Logs every estimate and query, with long rule text kept.
    pub fn verbose() -> Self {
        Self {
            base_level: Level::DEBUG,
            log_rule_details: true,
            log_statistics_queries: true,
            max_field_length: 1024,
        }
    }

    /// Only warnings; rule text is cut short.
    pub fn production() -> Self {
        Self {
            base_level: Level::WARN,
            log_rule_details: false,
            log_statistics_queries: false,
            max_field_length: 128,
        }
    }

    pub fn balanced() -> Self {
        Self::default()
    }
}

/// Debug logging that skips argument evaluation below the configured level.
#[macro_export]
macro_rules! perf_debug {
    ($config:expr, $($arg:tt)*) => {
        if $config.base_level >= tracing::Level::DEBUG {
            tracing::debug!($($arg)*);
        }
    };
}

/// Logs a per-rule estimate when rule details are enabled.
#[macro_export]
macro_rules! log_rule {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_rule_details {
            tracing::debug!($($arg)*);
        }
    };
}

/// Logs a statistics query when query logging is enabled.
#[macro_export]
macro_rules! log_stats_query {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_statistics_queries {
            tracing::info!($($arg)*);
        }
    };
}

/// Cuts `value` to at most `max_length` bytes on a character boundary.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Subscriber setup for binaries and tests.
pub mod setup {
    use tracing::Level;

    /// Configuration for installing a global subscriber.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for everything else
        pub level: Level,
        /// Log level for this crate
        pub linkage_level: Level,
        /// Whether to emit JSON lines
        pub json_format: bool,
        /// Explicit filter directive, overriding the two levels
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                linkage_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                linkage_level: Level::INFO,
                json_format: true,
                env_filter: None,
            }
        }

        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                linkage_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        pub fn with_linkage_level(mut self, level: Level) -> Self {
            self.linkage_level = level;
            self
        }

        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the filter directive string.
        pub fn env_filter(&self) -> String {
            match &self.env_filter {
                Some(filter) => filter.clone(),
                None => format!(
                    "{},term_linkage={}",
                    self.level.as_str().to_lowercase(),
                    self.linkage_level.as_str().to_lowercase()
                ),
            }
        }
    }

    /// Installs a global `tracing` subscriber. `RUST_LOG` wins over the
    /// configured levels when set.
    ///
    /// ```rust,no_run
    /// use term_linkage::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}
