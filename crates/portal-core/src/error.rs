//! 错误定义模块

use thiserror::Error;

/// 门户系统统一错误类型
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("无法识别的预约状态: {status}")]
    Mapping { status: String },

    #[error("投影输入错误: {0}")]
    ProjectionInput(String),

    #[error("评价记录查询失败: {0}")]
    PromptLookup(String),

    #[error("药物相互作用服务错误: {0}")]
    AdvisoryService(String),

    #[error("数据解码错误: {0}")]
    Decode(String),

    #[error("网络错误: {0}")]
    Network(#[from] std::io::Error),

    #[error("HTTP请求错误: {0}")]
    Http(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("系统内部错误: {0}")]
    Internal(String),
}

/// 门户系统统一结果类型
pub type Result<T> = std::result::Result<T, PortalError>;
