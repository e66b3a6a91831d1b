//! 宿主配置
//!
//! 配置文件加`PORTAL_`环境变量两层叠加，环境变量优先。

use config::{Config, Environment, File};
use portal_integration::BackendApiConfig;
use serde::Deserialize;
use std::time::Duration;

/// 宿主完整配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    /// 后端配置
    pub backend: BackendSettings,
    /// 当前患者ID
    pub patient_id: String,
    /// 刷新间隔（秒）
    pub poll_interval_secs: u64,
    /// 延迟跳转时长（毫秒）
    pub review_navigate_delay_ms: u64,
    /// 防抖静默期（毫秒）
    pub advisor_debounce_ms: u64,
    /// 账号是否已认证
    pub verified: bool,
}

/// 后端连接配置
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl AppSettings {
    /// 加载配置：默认值 < 配置文件 < 环境变量
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let mut builder = Config::builder()
            .set_default("backend.base_url", "http://localhost:8080/api")?
            .set_default("backend.timeout_secs", 10)?
            .set_default("patient_id", "")?
            .set_default("poll_interval_secs", 30)?
            .set_default("review_navigate_delay_ms", 5000)?
            .set_default("advisor_debounce_ms", 1000)?
            .set_default("verified", true)?;

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }

        let settings = builder
            .add_source(Environment::with_prefix("PORTAL").separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// 折算成集成层的API配置
    pub fn backend_api_config(&self) -> BackendApiConfig {
        BackendApiConfig {
            base_url: self.backend.base_url.clone(),
            api_key: self.backend.api_key.clone(),
            timeout: Duration::from_secs(self.backend.timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let settings = AppSettings::load(None).unwrap();
        assert_eq!(settings.poll_interval_secs, 30);
        assert_eq!(settings.review_navigate_delay_ms, 5000);
        assert!(settings.verified);
    }
}
