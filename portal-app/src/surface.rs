//! 日志界面
//!
//! 宿主的界面能力实现：提示与跳转都落到结构化日志。

use async_trait::async_trait;
use portal_core::{NotificationAction, NotificationVariant};
use portal_engine::UiSurface;
use tracing::info;

/// 把界面副作用写进日志的实现
pub struct TracingSurface;

#[async_trait]
impl UiSurface for TracingSurface {
    async fn notify(
        &self,
        message: &str,
        variant: NotificationVariant,
        action: Option<NotificationAction>,
    ) {
        match action {
            Some(action) => info!("提示[{:?}]: {} ({} -> {})", variant, message, action.label, action.target),
            None => info!("提示[{:?}]: {}", variant, message),
        }
    }

    async fn navigate(&self, target: &str) {
        info!("跳转 -> {}", target);
    }
}
