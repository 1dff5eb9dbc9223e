use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub annotation: AnnotationConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

/// Квота аннотаций по тарифу
#[derive(Debug, Deserialize, Clone)]
pub struct AnnotationConfig {
    /// Ограничивать ли количество аннотаций
    pub billing_enabled: bool,
    /// Лимит аннотаций на приложение
    pub quota_total: u64,
}

const DEFAULT_JOB_RETENTION_SECS: u64 = 3600;

fn default_job_retention_secs() -> u64 {
    DEFAULT_JOB_RETENTION_SECS
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    /// Искусственная пауза на каждом шаге задачи, чтобы статусы
    /// waiting/processing были видны в UI
    #[serde(default)]
    pub processing_delay_ms: u64,
    /// Сколько секунд завершенная задача доступна для опроса статуса
    #[serde(default = "default_job_retention_secs")]
    pub job_retention_secs: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            processing_delay_ms: 0,
            job_retention_secs: DEFAULT_JOB_RETENTION_SECS,
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
port = 3000

[annotation]
billing_enabled = true
quota_total = 1000

[import]
processing_delay_ms = 1000
job_retention_secs = 3600
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                return parse_config(&contents);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    parse_config(DEFAULT_CONFIG)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.annotation.billing_enabled);
        assert_eq!(config.annotation.quota_total, 1000);
        assert_eq!(config.import.processing_delay_ms, 1000);
        assert_eq!(config.import.job_retention_secs, 3600);
    }

    #[test]
    fn test_optional_sections() {
        let config = parse_config(
            r#"
[annotation]
billing_enabled = false
quota_total = 0
"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.import.processing_delay_ms, 0);
        assert_eq!(config.import.job_retention_secs, DEFAULT_JOB_RETENTION_SECS);
        assert!(!config.annotation.billing_enabled);
    }

    #[test]
    fn test_missing_annotation_section_fails() {
        assert!(parse_config("[server]\nport = 8080\n").is_err());
    }
}
