use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use url::Url;

use crate::adf::DescriptionMode;
use crate::client::{Auth, JiraConfig};
use crate::query::DEFAULT_MAX_RESULTS;
use crate::Error;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_URL: &str = "JIRA_URL";
pub const ENV_USER: &str = "JIRA_USER";
pub const ENV_API_TOKEN: &str = "JIRA_API_TOKEN";
pub const ENV_PROJECT: &str = "JIRA_PROJECT";
pub const ENV_MAX_RESULTS: &str = "JIRA_MAX_RESULTS";
pub const ENV_TIMEOUT_SECS: &str = "JIRA_TIMEOUT_SECS";
pub const ENV_EXPORT_DIR: &str = "JIRA_EXPORT_DIR";
pub const ENV_DESCRIPTION_MODE: &str = "JIRA_DESCRIPTION_MODE";

/// エクスポート実行に必要な設定
#[derive(Clone)]
pub struct ExportConfig {
    pub base_url: String,
    pub identity: String,
    pub secret_token: String,
    pub project_key: String,
    pub max_results: u32,
    pub timeout_secs: u64,
    pub output_dir: Option<PathBuf>,
    pub description_mode: DescriptionMode,
}

impl std::fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportConfig")
            .field("base_url", &self.base_url)
            .field("identity", &self.identity)
            .field("secret_token", &"<redacted>")
            .field("project_key", &self.project_key)
            .field("max_results", &self.max_results)
            .field("timeout_secs", &self.timeout_secs)
            .field("output_dir", &self.output_dir)
            .field("description_mode", &self.description_mode)
            .finish()
    }
}

/// 設定ファイルの内容。環境変数で上書きされる前の値
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_mode: Option<DescriptionMode>,
}

impl ExportConfig {
    pub fn new(
        base_url: impl Into<String>,
        identity: impl Into<String>,
        secret_token: impl Into<String>,
        project_key: impl Into<String>,
    ) -> Result<Self, Error> {
        let config = Self {
            base_url: base_url.into(),
            identity: identity.into(),
            secret_token: secret_token.into(),
            project_key: project_key.into(),
            max_results: DEFAULT_MAX_RESULTS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            output_dir: None,
            description_mode: DescriptionMode::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// 設定ファイル（任意）と環境変数から設定を作成
    ///
    /// `path`が`None`の場合はデフォルトの設定ディレクトリを探し、なければ環境変数のみを使う。
    pub async fn load(path: Option<&Path>) -> Result<Self, Error> {
        let file = match path {
            Some(path) => read_config_file(path).await?.ok_or_else(|| {
                Error::ConfigurationMissing(format!("Config file not found: {}", path.display()))
            })?,
            None => match default_config_path() {
                Some(path) => read_config_file(&path).await?.unwrap_or_default(),
                None => ConfigFile::default(),
            },
        };

        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// ファイルの値を環境変数で上書きして設定を組み立てる
    pub fn from_sources<F>(file: ConfigFile, env: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let required = |key: &str, file_value: Option<String>| {
            env(key)
                .or(file_value)
                .ok_or_else(|| Error::ConfigurationMissing(format!("{} not found in environment or config file", key)))
        };

        let base_url = required(ENV_URL, file.base_url)?;
        let identity = required(ENV_USER, file.identity)?;
        let secret_token = required(ENV_API_TOKEN, file.secret_token)?;
        let project_key = required(ENV_PROJECT, file.project_key)?;

        let max_results = match env(ENV_MAX_RESULTS) {
            Some(v) => parse_number(ENV_MAX_RESULTS, &v)?,
            None => file.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
        };
        let timeout_secs = match env(ENV_TIMEOUT_SECS) {
            Some(v) => parse_number(ENV_TIMEOUT_SECS, &v)?,
            None => file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        let description_mode = match env(ENV_DESCRIPTION_MODE) {
            Some(v) => v.parse()?,
            None => file.description_mode.unwrap_or_default(),
        };
        let output_dir = env(ENV_EXPORT_DIR).map(PathBuf::from).or(file.output_dir);

        let config = Self {
            base_url,
            identity,
            secret_token,
            project_key,
            max_results,
            timeout_secs,
            output_dir,
            description_mode,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        for (name, value) in [
            ("base_url", &self.base_url),
            ("identity", &self.identity),
            ("secret_token", &self.secret_token),
            ("project_key", &self.project_key),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidConfiguration(format!("{} must not be empty", name)));
            }
        }

        Url::parse(&self.base_url)
            .map_err(|_| Error::InvalidConfiguration("Invalid base URL".to_string()))?;

        if self.max_results == 0 {
            return Err(Error::InvalidConfiguration("max_results must be greater than 0".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::InvalidConfiguration("timeout_secs must be greater than 0".to_string()));
        }
        Ok(())
    }

    /// HTTPクライアント用の接続設定
    pub fn jira_config(&self) -> Result<JiraConfig, Error> {
        let auth = Auth::Basic {
            username: self.identity.clone(),
            api_token: self.secret_token.clone(),
        };
        Ok(JiraConfig::new(self.base_url.clone(), auth)?
            .with_timeout(Duration::from_secs(self.timeout_secs)))
    }
}

/// `<config dir>/jira-export/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("jira-export").join("config.json"))
}

/// JSON設定ファイルを読み込む。ファイルがなければ`None`
pub async fn read_config_file(path: &Path) -> Result<Option<ConfigFile>, Error> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).await?;
    if contents.trim().is_empty() {
        return Ok(None);
    }

    let file: ConfigFile = serde_json::from_str(&contents).map_err(|e| {
        Error::InvalidConfiguration(format!("{}: {}", path.display(), e))
    })?;
    Ok(Some(file))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, Error> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidConfiguration(format!("{} must be a positive number, got {:?}", key, value)))
}
