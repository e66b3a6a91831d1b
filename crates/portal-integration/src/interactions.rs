//! 药物相互作用服务客户端

use crate::api::BackendApiConfig;
use async_trait::async_trait;
use portal_core::{PortalError, Result};
use portal_engine::InteractionChecker;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct InteractionRequest<'a> {
    medications: &'a [String],
}

#[derive(Debug, Deserialize)]
struct InteractionResponse {
    interactions: Vec<String>,
}

/// 相互作用服务的HTTP实现
///
/// 服务被视为不透明分类器，这里只负责传输；失败统一映射为
/// `AdvisoryService`，由顾问按降级路径处理。
pub struct HttpInteractionChecker {
    client: reqwest::Client,
    config: BackendApiConfig,
}

impl HttpInteractionChecker {
    /// 创建新的检查客户端
    pub fn new(config: BackendApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PortalError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl InteractionChecker for HttpInteractionChecker {
    async fn check(&self, medications: &[String]) -> Result<Vec<String>> {
        let url = format!("{}/interactions/check", self.config.base_url);
        let mut request = self
            .client
            .post(&url)
            .json(&InteractionRequest { medications });
        if let Some(key) = &self.config.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PortalError::AdvisoryService(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PortalError::AdvisoryService(format!(
                "interaction check returned {}",
                response.status()
            )));
        }

        let body: InteractionResponse = response
            .json()
            .await
            .map_err(|e| PortalError::AdvisoryService(e.to_string()))?;

        tracing::debug!(
            "Interaction check returned {} warnings for {} medications",
            body.interactions.len(),
            medications.len()
        );
        Ok(body.interactions)
    }
}
