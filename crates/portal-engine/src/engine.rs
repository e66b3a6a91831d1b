//! 门户引擎
//!
//! 协调状态分类、通知投影、转换侦测与评价引导的核心引擎。
//! 一次刷新周期内数据单向流动：原始记录 → 分类 → 投影/侦测 → 副作用。

use crate::advisor::{AdvisorConfig, InteractionAdvisor, InteractionChecker};
use crate::projector::project;
use crate::review_prompt::{ReviewPromptConfig, ReviewPromptController, ReviewRegistry, UiSurface};
use crate::status::StatusClassifier;
use crate::transitions::{StatusClassBatch, TransitionWatcher};
use chrono::{DateTime, Utc};
use portal_core::{AppointmentRecord, MedicalHistoryRecord, NotificationItem};
use std::sync::Arc;

/// 引擎配置
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub review_prompt: ReviewPromptConfig,
    pub advisor: AdvisorConfig,
}

/// 门户引擎
///
/// 刷新周期内的任何失败都按降级路径处理，`refresh`本身从不中断渲染。
pub struct PortalEngine {
    classifier: StatusClassifier,
    watcher: TransitionWatcher,
    prompt_controller: ReviewPromptController,
    advisor: Arc<InteractionAdvisor>,
}

impl PortalEngine {
    /// 创建新的门户引擎
    pub fn new(
        registry: Arc<dyn ReviewRegistry>,
        surface: Arc<dyn UiSurface>,
        checker: Arc<dyn InteractionChecker>,
        config: EngineConfig,
    ) -> Self {
        Self {
            classifier: StatusClassifier::new(),
            watcher: TransitionWatcher::new(),
            prompt_controller: ReviewPromptController::new(
                registry,
                surface.clone(),
                config.review_prompt,
            ),
            advisor: Arc::new(InteractionAdvisor::new(checker, surface, config.advisor)),
        }
    }

    /// 执行一次刷新周期
    ///
    /// 调用方负责串行化：同一时刻至多一个刷新在途，观察顺序即数据
    /// 到达顺序。返回投影后的通知流供渲染。
    pub async fn refresh(
        &mut self,
        appointments: &[AppointmentRecord],
        history: &[MedicalHistoryRecord],
        verified: bool,
        now: DateTime<Utc>,
    ) -> Vec<NotificationItem> {
        let feed = project(&mut self.classifier, appointments, history, verified, now);

        // 按输入顺序观察，保证批内事件顺序与合并顺序一致
        let batch: StatusClassBatch = appointments
            .iter()
            .map(|a| {
                (
                    a.id.clone(),
                    self.classifier.classify_or_unknown(&a.status).class,
                )
            })
            .collect();
        let events = self.watcher.observe_batch(&batch);

        if !events.is_empty() {
            tracing::info!("Observed {} status transitions this cycle", events.len());
        }

        self.prompt_controller.handle_batch(&events).await;

        feed
    }

    /// 药物相互作用顾问
    pub fn advisor(&self) -> &Arc<InteractionAdvisor> {
        &self.advisor
    }

    /// 评价引导控制器
    pub fn prompt_controller(&self) -> &ReviewPromptController {
        &self.prompt_controller
    }

    /// 可变的评价引导控制器
    pub fn prompt_controller_mut(&mut self) -> &mut ReviewPromptController {
        &mut self.prompt_controller
    }

    /// 转换侦测器
    pub fn watcher(&self) -> &TransitionWatcher {
        &self.watcher
    }

    /// 宿主销毁时调用，清理所有在途计时器
    pub fn shutdown(&mut self) {
        self.prompt_controller.shutdown();
        self.advisor.shutdown();
    }
}
