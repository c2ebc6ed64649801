use crate::logger::{error::LoggerError, format::LoggerFormat};

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` directives, e.g. `info` or `pasta_core=debug,warn`.
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
}

impl LoggerConfig {
    /// Overlay optional `level` / `format` strings (usually read from the
    /// environment) on the defaults. Empty values are ignored.
    pub fn with_overrides(level: Option<&str>, format: Option<&str>) -> Result<Self, LoggerError> {
        let mut cfg = Self::default();
        if let Some(level) = level.map(str::trim).filter(|s| !s.is_empty()) {
            cfg.level = level.to_string();
        }
        if let Some(format) = format.map(str::trim).filter(|s| !s.is_empty()) {
            cfg.format = format.parse()?;
        }
        if cfg.format == LoggerFormat::Json {
            cfg.use_color = false;
        }
        Ok(cfg)
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        let use_color = cfg!(test) || atty::is(atty::Stream::Stdout);
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: true,
            use_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_apply_and_skip_blanks() {
        let cfg = LoggerConfig::with_overrides(Some("debug"), Some(" JSON ")).unwrap();
        assert_eq!(cfg.level, "debug");
        assert_eq!(cfg.format, LoggerFormat::Json);
        assert!(!cfg.use_color);

        let cfg = LoggerConfig::with_overrides(Some(""), None).unwrap();
        assert_eq!(cfg.level, "info");
        assert_eq!(cfg.format, LoggerFormat::Text);
    }

    #[test]
    fn bad_format_is_an_error() {
        assert!(matches!(
            LoggerConfig::with_overrides(None, Some("yaml")),
            Err(LoggerError::InvalidFormat(_))
        ));
    }
}
