//! Settings validation errors and range checks.

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting: {key} ({reason})")]
    Missing { key: String, reason: String },

    #[error("Unknown setting: {key} is not accepted by the schema")]
    UnknownKey { key: String },

    #[error("Type mismatch for {key}: expected {expected}, got {got}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version} (latest is {latest})")]
    UnsupportedVersion { version: u64, latest: u32 },

    #[error("Parse error: {message}")]
    Parse { message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Prefix the offending key with the section it was found in.
    pub fn in_section(self, section: &str) -> Self {
        let scoped = |key: String| format!("{section}.{key}");
        match self {
            ConfigError::Missing { key, reason } => ConfigError::Missing {
                key: scoped(key),
                reason,
            },
            ConfigError::UnknownKey { key } => ConfigError::UnknownKey { key: scoped(key) },
            ConfigError::TypeMismatch { key, expected, got } => ConfigError::TypeMismatch {
                key: scoped(key),
                expected,
                got,
            },
            ConfigError::InvalidValue {
                field,
                value,
                reason,
            } => ConfigError::InvalidValue {
                field: scoped(field),
                value,
                reason,
            },
            other => other,
        }
    }
}

pub(crate) fn require_non_empty(field: &str, value: &str, reason: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing {
            key: field.to_string(),
            reason: reason.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn require_non_negative_int(field: &str, value: i64) -> ConfigResult<()> {
    if value < 0 {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be >= 0".to_string(),
        });
    }
    Ok(())
}

pub(crate) fn require_positive_finite(field: &str, value: f64) -> ConfigResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be positive and finite".to_string(),
        });
    }
    Ok(())
}

pub(crate) fn require_finite(field: &str, value: f64) -> ConfigResult<()> {
    if !value.is_finite() {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be finite".to_string(),
        });
    }
    Ok(())
}
