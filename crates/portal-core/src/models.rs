//! 核心数据模型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 预约记录（由外部后端拥有，本地只读）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub id: String,                        // 后端不透明ID
    pub patient_id: String,
    pub doctor_id: String,
    pub scheduled_at: DateTime<Utc>,       // 就诊时间
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: String,                    // 后端原始状态码，由分类器统一解释
    pub reason: String,                    // 就诊原因
    pub notes: Option<String>,
    pub modality: AppointmentModality,     // 就诊方式
    pub counterpart_name: String,          // 对端显示名（患者视角为医生，反之亦然）
    pub clinic_ref: Option<String>,        // 诊所引用
    pub join_url: Option<String>,          // 线上就诊入口，仅在确认类状态下有意义
}

/// 就诊方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentModality {
    Online,
    Onsite,
}

/// 病史记录（只读）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalHistoryRecord {
    pub id: String,
    pub condition: String,                 // 病症名称
    pub status: HistoryStatus,
    pub doctor_name: String,
    pub updated_at: DateTime<Utc>,
}

/// 病史状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryStatus {
    Active,
    Resolved,
    Chronic,
    UnderTreatment,
}

/// 通知条目（本地派生，短暂存在，从不持久化）
///
/// 每次数据刷新都会整体重算；ID由来源记录ID加语义后缀确定性派生，
/// 相同输入必然产生相同的条目集合。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub variant: NotificationVariant,
    pub action: Option<NotificationAction>,
}

/// 通知条目样式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationVariant {
    Success,
    Info,
    Warning,
    Danger,
}

/// 通知附带的可选动作
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub label: String,
    pub target: String, // 路由或外部链接
}

impl NotificationItem {
    /// 派生确定性的通知ID
    pub fn derive_id(source_id: &str, suffix: &str) -> String {
        format!("{}-{}", source_id, suffix)
    }
}
