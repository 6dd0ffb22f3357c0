use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::types::{
    Config, SmtpConfig, DEFAULT_CRASH_LOOP_THRESHOLD, DEFAULT_LOG_TAIL_LINES,
    DEFAULT_SEND_DELAY_MS, DEFAULT_SMTP_PORT,
};

/// Trait for abstracting environment variable access
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation using std::env
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Mock implementation for testing
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set_var<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_var(key, value);
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    smtp: FileSmtpConfig,
    #[serde(default)]
    excluded_namespaces: Vec<String>,
    #[serde(default)]
    log_tail_lines: i64,
    #[serde(default = "default_crash_loop_threshold")]
    crash_loop_restart_threshold: i32,
    #[serde(default = "default_send_delay_ms")]
    send_delay_ms: u64,
    #[serde(default)]
    sweep_timeout_secs: Option<u64>,
    #[serde(default)]
    cluster_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileSmtpConfig {
    #[serde(default)]
    host: String,
    #[serde(default = "default_smtp_port")]
    port: u16,
    #[serde(default)]
    from: String,
    #[serde(default)]
    no_auth: bool,
    username: Option<String>,
    password: Option<String>,
    #[serde(default)]
    operations_mailbox: String,
}

fn default_crash_loop_threshold() -> i32 {
    DEFAULT_CRASH_LOOP_THRESHOLD
}

fn default_send_delay_ms() -> u64 {
    DEFAULT_SEND_DELAY_MS
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

pub fn load_config(path: &Path) -> Result<Config> {
    load_config_with_env(path, &SystemEnvironment)
}

pub fn load_config_with_env<E: EnvironmentProvider>(path: &Path, env: &E) -> Result<Config> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse_config_with_env(&raw, env)
}

/// Parse YAML config text and apply environment overrides.
pub fn parse_config_with_env<E: EnvironmentProvider>(raw: &str, env: &E) -> Result<Config> {
    let file: FileConfig = serde_yaml::from_str(raw).context("Failed to parse config")?;

    let mut excluded_namespaces = normalize_namespaces(file.excluded_namespaces.iter().map(String::as_str));
    if let Some(list) = env.get_var("EXCLUDED_NAMESPACES") {
        excluded_namespaces = normalize_namespaces(list.split(','));
    }

    let mut log_tail_lines = file.log_tail_lines;
    if let Some(v) = env.get_var("LOG_TAIL_LINES") {
        log_tail_lines = v.trim().parse().context("Invalid LOG_TAIL_LINES")?;
    }
    if log_tail_lines <= 0 {
        log_tail_lines = DEFAULT_LOG_TAIL_LINES;
    }

    if file.crash_loop_restart_threshold < 0 {
        return Err(anyhow!("crash_loop_restart_threshold must not be negative"));
    }

    let username = env.get_var("SMTP_USERNAME").or(file.smtp.username);
    let password = env.get_var("SMTP_PASSWORD").or(file.smtp.password);
    let smtp = SmtpConfig {
        host: file.smtp.host.trim().to_string(),
        port: file.smtp.port,
        from: file.smtp.from.trim().to_string(),
        no_auth: file.smtp.no_auth,
        username,
        password,
        operations_mailbox: file.smtp.operations_mailbox.trim().to_string(),
    };
    if smtp.host.is_empty() {
        return Err(anyhow!("smtp.host must be set"));
    }
    if smtp.from.is_empty() {
        return Err(anyhow!("smtp.from must be set"));
    }
    if smtp.operations_mailbox.is_empty() {
        return Err(anyhow!("smtp.operations_mailbox must be set"));
    }
    if !smtp.no_auth && smtp.username.is_none() {
        return Err(anyhow!(
            "SMTP_USERNAME (or smtp.username) is required unless smtp.no_auth is true"
        ));
    }

    let cluster_name = env
        .get_var("CLUSTER_NAME")
        .or(file.cluster_name)
        .filter(|s| !s.trim().is_empty());

    Ok(Config {
        smtp,
        excluded_namespaces,
        log_tail_lines,
        crash_loop_restart_threshold: file.crash_loop_restart_threshold,
        send_delay: Duration::from_millis(file.send_delay_ms),
        sweep_timeout: file.sweep_timeout_secs.map(Duration::from_secs),
        cluster_name,
    })
}

fn normalize_namespaces<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    items
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
smtp:
  host: smtp.internal
  from: k8s-health@corp.example
  no_auth: true
  operations_mailbox: platform-ops@corp.example
"#;

    #[test]
    fn test_config_loading_defaults() {
        let config = parse_config_with_env(MINIMAL, &MockEnvironment::new()).unwrap();

        assert_eq!(config.smtp.host, "smtp.internal");
        assert_eq!(config.smtp.port, 25); // default
        assert!(config.smtp.no_auth);
        assert!(config.excluded_namespaces.is_empty());
        assert_eq!(config.log_tail_lines, 50); // default
        assert_eq!(config.crash_loop_restart_threshold, 3); // default
        assert_eq!(config.send_delay, Duration::from_millis(100)); // default
        assert_eq!(config.sweep_timeout, None);
        assert_eq!(config.cluster_name, None);
    }

    #[test]
    fn test_config_loading_full_file() {
        let raw = r#"
smtp:
  host: mail.corp.example
  port: 587
  from: alerts@corp.example
  username: alerts
  password: hunter2
  operations_mailbox: ops@corp.example
excluded_namespaces: [kube-system, " monitoring ", ""]
log_tail_lines: 120
crash_loop_restart_threshold: 5
send_delay_ms: 250
sweep_timeout_secs: 300
cluster_name: prod-eks
"#;
        let config = parse_config_with_env(raw, &MockEnvironment::new()).unwrap();

        assert_eq!(config.smtp.port, 587);
        assert!(!config.smtp.no_auth);
        assert_eq!(config.smtp.username.as_deref(), Some("alerts"));
        assert_eq!(config.excluded_namespaces, vec!["kube-system", "monitoring"]);
        assert_eq!(config.log_tail_lines, 120);
        assert_eq!(config.crash_loop_restart_threshold, 5);
        assert_eq!(config.send_delay, Duration::from_millis(250));
        assert_eq!(config.sweep_timeout, Some(Duration::from_secs(300)));
        assert_eq!(config.cluster_name.as_deref(), Some("prod-eks"));
    }

    #[test]
    fn test_zero_tail_lines_falls_back_to_default() {
        let raw = format!("{}log_tail_lines: 0\n", MINIMAL);
        let config = parse_config_with_env(&raw, &MockEnvironment::new()).unwrap();
        assert_eq!(config.log_tail_lines, 50);
    }

    #[test]
    fn test_environment_overrides() {
        let env = MockEnvironment::new()
            .with_var("EXCLUDED_NAMESPACES", " kube-system , kube-public ,  ,")
            .with_var("LOG_TAIL_LINES", "20")
            .with_var("CLUSTER_NAME", "staging");

        let config = parse_config_with_env(MINIMAL, &env).unwrap();
        assert_eq!(config.excluded_namespaces, vec!["kube-system", "kube-public"]);
        assert_eq!(config.log_tail_lines, 20);
        assert_eq!(config.cluster_name.as_deref(), Some("staging"));
    }

    #[test]
    fn test_invalid_tail_lines_override() {
        let env = MockEnvironment::new().with_var("LOG_TAIL_LINES", "lots");

        let result = parse_config_with_env(MINIMAL, &env);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("LOG_TAIL_LINES"));
    }

    #[test]
    fn test_config_loading_missing_required() {
        let raw = r#"
smtp:
  from: a@corp.example
  no_auth: true
  operations_mailbox: ops@corp.example
"#;
        let result = parse_config_with_env(raw, &MockEnvironment::new());
        assert!(result.unwrap_err().to_string().contains("smtp.host"));

        let raw = r#"
smtp:
  host: smtp.internal
  from: a@corp.example
  no_auth: true
"#;
        let result = parse_config_with_env(raw, &MockEnvironment::new());
        assert!(result.unwrap_err().to_string().contains("operations_mailbox"));
    }

    #[test]
    fn test_credentials_required_with_auth() {
        let raw = r#"
smtp:
  host: smtp.internal
  from: a@corp.example
  operations_mailbox: ops@corp.example
"#;
        let result = parse_config_with_env(raw, &MockEnvironment::new());
        assert!(result.unwrap_err().to_string().contains("SMTP_USERNAME"));

        let env = MockEnvironment::new()
            .with_var("SMTP_USERNAME", "alerts")
            .with_var("SMTP_PASSWORD", "secret");
        let config = parse_config_with_env(raw, &env).unwrap();
        assert_eq!(config.smtp.username.as_deref(), Some("alerts"));
        assert_eq!(config.smtp.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_malformed_yaml() {
        let result = parse_config_with_env("smtp: [not, a, map", &MockEnvironment::new());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = load_config_with_env(file.path(), &MockEnvironment::new()).unwrap();
        assert_eq!(config.smtp.from, "k8s-health@corp.example");

        let missing = load_config_with_env(Path::new("/nonexistent/config.yaml"), &MockEnvironment::new());
        assert!(missing.unwrap_err().to_string().contains("Failed to read config file"));
    }
}
