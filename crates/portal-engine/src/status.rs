//! 预约状态分类器
//!
//! 将后端原始状态码映射为本地语义类别与展示元数据

use portal_core::{NotificationVariant, PortalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 语义类别
///
/// 后端的CANCELLED与REJECTED在展示层合并为同一类别。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StatusClass {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
    Unknown,
}

impl StatusClass {
    /// 确认类状态：提醒窗口与线上入口仅对这些状态有意义
    pub fn is_confirmed_like(&self) -> bool {
        matches!(self, StatusClass::Confirmed | StatusClass::InProgress)
    }

    /// 终态：后端状态偏序下不再前进的状态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StatusClass::Completed | StatusClass::Cancelled | StatusClass::NoShow
        )
    }
}

/// 状态徽标：类别加展示元数据
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusBadge {
    pub class: StatusClass,
    pub label: String,
    pub color_token: NotificationVariant,
}

/// 对已记录的后端状态枚举做全映射
///
/// 未识别的状态码直接报错，不做任何静默兜底——新增的后端状态
/// 必须在这个边界被发现，而不是被错误渲染。
pub fn classify(raw_status: &str) -> Result<StatusBadge> {
    let badge = match raw_status {
        "PENDING_PAYMENT" => StatusBadge {
            class: StatusClass::Pending,
            label: "待确认".to_string(),
            color_token: NotificationVariant::Warning,
        },
        "CONFIRMED" => StatusBadge {
            class: StatusClass::Confirmed,
            label: "已确认".to_string(),
            color_token: NotificationVariant::Success,
        },
        "IN_PROGRESS" => StatusBadge {
            class: StatusClass::InProgress,
            label: "就诊中".to_string(),
            color_token: NotificationVariant::Info,
        },
        "COMPLETED" => StatusBadge {
            class: StatusClass::Completed,
            label: "已完成".to_string(),
            color_token: NotificationVariant::Info,
        },
        "CANCELLED" | "REJECTED" => StatusBadge {
            class: StatusClass::Cancelled,
            label: "已取消".to_string(),
            color_token: NotificationVariant::Danger,
        },
        "NO_SHOW" => StatusBadge {
            class: StatusClass::NoShow,
            label: "未到诊".to_string(),
            color_token: NotificationVariant::Warning,
        },
        other => {
            return Err(PortalError::Mapping {
                status: other.to_string(),
            })
        }
    };
    Ok(badge)
}

/// 状态分类器
///
/// 在`classify`之上增加未知状态的拦截：每个不同的未知值只告警一次，
/// 之后按`Unknown`类别降级处理，避免日志被重复刷新淹没。
#[derive(Debug, Default)]
pub struct StatusClassifier {
    reported_unknown: HashSet<String>,
}

impl StatusClassifier {
    /// 创建新的状态分类器
    pub fn new() -> Self {
        Self {
            reported_unknown: HashSet::new(),
        }
    }

    /// 分类，未知状态降级为`Unknown`徽标
    pub fn classify_or_unknown(&mut self, raw_status: &str) -> StatusBadge {
        match classify(raw_status) {
            Ok(badge) => badge,
            Err(_) => {
                if self.reported_unknown.insert(raw_status.to_string()) {
                    tracing::warn!("Unrecognized appointment status from backend: {}", raw_status);
                }
                StatusBadge {
                    class: StatusClass::Unknown,
                    label: "未知状态".to_string(),
                    color_token: NotificationVariant::Warning,
                }
            }
        }
    }
}
