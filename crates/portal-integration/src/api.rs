//! 后端API客户端
//!
//! 预约、病史与评价登记三个外部数据源的HTTP客户端。
//! 所有响应都经过解码边界，绝不把松散的JSON直接交给核心。

use crate::decode::{decode_appointments, decode_history};
use async_trait::async_trait;
use portal_core::{AppointmentRecord, MedicalHistoryRecord, PortalError, Result};
use portal_engine::ReviewRegistry;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 后端API配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for BackendApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

fn build_client(config: &BackendApiConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| PortalError::Http(e.to_string()))
}

fn with_auth(
    request: reqwest::RequestBuilder,
    config: &BackendApiConfig,
) -> reqwest::RequestBuilder {
    match &config.api_key {
        Some(key) => request.header("x-api-key", key),
        None => request,
    }
}

async fn get_json(
    client: &reqwest::Client,
    config: &BackendApiConfig,
    path: &str,
    query: &[(&str, &str)],
) -> Result<serde_json::Value> {
    let url = format!("{}{}", config.base_url, path);
    let request = with_auth(client.get(&url).query(query), config);

    let response = request
        .send()
        .await
        .map_err(|e| PortalError::Http(e.to_string()))?;

    if !response.status().is_success() {
        return Err(PortalError::Http(format!(
            "GET {} returned {}",
            path,
            response.status()
        )));
    }

    response
        .json()
        .await
        .map_err(|e| PortalError::Decode(e.to_string()))
}

/// 预约数据源客户端
pub struct AppointmentApi {
    client: reqwest::Client,
    config: BackendApiConfig,
}

impl AppointmentApi {
    /// 创建新的预约客户端
    pub fn new(config: BackendApiConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(&config)?,
            config,
        })
    }

    /// 按患者列出预约，可选状态过滤
    pub async fn list_for_patient(
        &self,
        patient_id: &str,
        status_filter: Option<&str>,
    ) -> Result<Vec<AppointmentRecord>> {
        self.list("patientId", patient_id, status_filter).await
    }

    /// 按医生列出预约，可选状态过滤
    pub async fn list_for_doctor(
        &self,
        doctor_id: &str,
        status_filter: Option<&str>,
    ) -> Result<Vec<AppointmentRecord>> {
        self.list("doctorId", doctor_id, status_filter).await
    }

    async fn list(
        &self,
        role_key: &str,
        role_id: &str,
        status_filter: Option<&str>,
    ) -> Result<Vec<AppointmentRecord>> {
        let mut query = vec![(role_key, role_id)];
        if let Some(status) = status_filter {
            query.push(("status", status));
        }

        let payload = get_json(&self.client, &self.config, "/appointments", &query).await?;
        let records = decode_appointments(&payload);
        tracing::debug!("Fetched {} appointments for {}={}", records.len(), role_key, role_id);
        Ok(records)
    }
}

/// 病史数据源客户端
pub struct MedicalHistoryApi {
    client: reqwest::Client,
    config: BackendApiConfig,
}

impl MedicalHistoryApi {
    /// 创建新的病史客户端
    pub fn new(config: BackendApiConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(&config)?,
            config,
        })
    }

    /// 按患者列出病史记录
    pub async fn list_for_patient(&self, patient_id: &str) -> Result<Vec<MedicalHistoryRecord>> {
        let payload = get_json(
            &self.client,
            &self.config,
            "/medical-history",
            &[("patientId", patient_id)],
        )
        .await?;
        Ok(decode_history(&payload))
    }
}

/// 评价登记响应
#[derive(Debug, Deserialize)]
struct ReviewLookupResponse {
    exists: bool,
}

/// 评价登记客户端，核心只读
pub struct ReviewApi {
    client: reqwest::Client,
    config: BackendApiConfig,
}

impl ReviewApi {
    /// 创建新的评价登记客户端
    pub fn new(config: BackendApiConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(&config)?,
            config,
        })
    }
}

#[async_trait]
impl ReviewRegistry for ReviewApi {
    async fn has_review(&self, appointment_id: &str) -> Result<bool> {
        let url = format!(
            "{}/reviews/appointment/{}",
            self.config.base_url, appointment_id
        );
        let request = with_auth(self.client.get(&url), &self.config);

        // 查询失败上抛为PromptLookup，调用方会在下一轮重试
        let response = request
            .send()
            .await
            .map_err(|e| PortalError::PromptLookup(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PortalError::PromptLookup(format!(
                "review lookup returned {}",
                response.status()
            )));
        }

        let body: ReviewLookupResponse = response
            .json()
            .await
            .map_err(|e| PortalError::PromptLookup(e.to_string()))?;
        Ok(body.exists)
    }
}
