use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use reqwest::Url;
use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::FaceError;

/// 服务端配置（对应一代 API）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FaceConfig {
    /// 上传端点前缀（带版本号），滤镜请求在其后拼接 `/{code}/filters/{name}`
    #[serde(default = "FaceConfig::default_base_url")]
    pub base_url: String,
    /// 客户端标识（服务据此协商能力）
    #[serde(default = "FaceConfig::default_user_agent")]
    pub user_agent: String,
    /// 携带设备标识的请求头
    #[serde(default = "FaceConfig::default_device_id_header")]
    pub device_id_header: String,
    /// 服务返回错误码的响应头
    #[serde(default = "FaceConfig::default_error_code_header")]
    pub error_code_header: String,
    /// 单次请求超时（秒），仅作用于默认 reqwest 传输；不设置则不限制
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl FaceConfig {
    fn default_base_url() -> String {
        "https://node-03.faceapp.io/api/v2.9/photos".to_string()
    }

    fn default_user_agent() -> String {
        "FaceApp/3.2.1 (Linux; Android 8.1)".to_string()
    }

    fn default_device_id_header() -> String {
        "X-FaceApp-DeviceID".to_string()
    }

    fn default_error_code_header() -> String {
        "X-FaceApp-ErrorCode".to_string()
    }

    /// 分层加载配置：内置默认值 -> 可选 TOML 文件 -> `FACES_` 前缀环境变量
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder =
            ConfigBuilder::builder().add_source(ConfigBuilder::try_from(&Self::default())?);

        if let Some(path) = path {
            tracing::info!("正在从 {:?} 加载配置文件", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        // 支持环境变量覆盖，例如：FACES_BASE_URL
        let config: Self = builder
            .add_source(Environment::with_prefix("FACES").try_parsing(true))
            .build()?
            .try_deserialize()?;

        tracing::debug!(
            "配置加载完成: base_url = {}, user_agent = {}",
            config.base_url,
            config.user_agent
        );

        Ok(config)
    }

    /// 校验端点与请求头，返回解析后的端点 URL
    pub fn validate(&self) -> Result<Url, FaceError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| FaceError::Config(format!("base_url `{}` 无法解析: {}", self.base_url, e)))?;
        if url.cannot_be_a_base() {
            return Err(FaceError::Config(format!(
                "base_url `{}` 不是层级 URL",
                self.base_url
            )));
        }
        if url.query().is_some() {
            return Err(FaceError::Config(format!(
                "base_url `{}` 不应包含查询参数",
                self.base_url
            )));
        }

        for name in [&self.device_id_header, &self.error_code_header] {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| FaceError::Config(format!("无效的请求头名称: {name}")))?;
        }
        HeaderValue::from_str(&self.user_agent)
            .map_err(|_| FaceError::Config(format!("无效的 user_agent: {}", self.user_agent)))?;

        Ok(url)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            user_agent: Self::default_user_agent(),
            device_id_header: Self::default_device_id_header(),
            error_code_header: Self::default_error_code_header(),
            timeout_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FaceConfig;
    use crate::error::FaceError;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let url = FaceConfig::default().validate().expect("default config");
        assert_eq!(url.path(), "/api/v2.9/photos");
    }

    #[test]
    fn validate_rejects_non_hierarchical_base_url() {
        let cfg = FaceConfig {
            base_url: "mailto:someone@example.com".to_string(),
            ..FaceConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(FaceError::Config(_))));
    }

    #[test]
    fn validate_rejects_base_url_with_query() {
        let cfg = FaceConfig {
            base_url: "http://127.0.0.1:9/api/photos?x=1".to_string(),
            ..FaceConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(FaceError::Config(_))));
    }

    #[test]
    fn validate_rejects_bad_header_name() {
        let cfg = FaceConfig {
            device_id_header: "X Device Id".to_string(),
            ..FaceConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(FaceError::Config(_))));
    }

    #[test]
    fn load_merges_toml_file_over_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("create temp file");
        writeln!(
            file,
            "base_url = \"http://127.0.0.1:9/api/v3/photos\"\ntimeout_secs = 15"
        )
        .expect("write temp file");

        let cfg = FaceConfig::load(Some(file.path())).expect("load config");
        assert_eq!(cfg.base_url, "http://127.0.0.1:9/api/v3/photos");
        assert_eq!(cfg.timeout_secs, Some(15));
        assert_eq!(cfg.user_agent, FaceConfig::default().user_agent);
        assert_eq!(cfg.error_code_header, "X-FaceApp-ErrorCode");
    }
}
