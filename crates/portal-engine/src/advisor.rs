//! 药物相互作用顾问
//!
//! 对处方表单中的用药列表做防抖的异步检查。编辑会使在途请求失效：
//! 以请求签发顺序为准的后写优先——晚签发的请求即使先返回也是权威结果，
//! 早签发请求的迟到响应一律丢弃。

use crate::review_prompt::UiSurface;
use async_trait::async_trait;
use portal_core::{NotificationVariant, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// 外部相互作用检查服务（不透明分类器，内部准确性不在范围内）
#[async_trait]
pub trait InteractionChecker: Send + Sync {
    /// 提交用药名称列表，返回自由文本告警
    async fn check(&self, medications: &[String]) -> Result<Vec<String>>;
}

/// 顾问所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisorPhase {
    Idle,
    Pending,
    Resolved,
    Errored,
}

/// 顾问配置
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    /// 防抖静默期，每次编辑重置
    pub debounce: Duration,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug)]
struct AdvisorState {
    phase: AdvisorPhase,
    warnings: Vec<String>,
}

/// 防抖任务与顾问本体共享的内核
struct AdvisorShared {
    checker: Arc<dyn InteractionChecker>,
    surface: Arc<dyn UiSurface>,
    state: Mutex<AdvisorState>,
    latest_token: AtomicU64,
}

impl AdvisorShared {
    /// 签发一次检查
    ///
    /// 不到两条有效用药不访问远端，直接回到Idle并清空告警。
    async fn issue_check(&self, medications: Vec<String>) {
        let medications: Vec<String> = medications
            .into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();

        if medications.len() < 2 {
            let mut state = self.state.lock().unwrap();
            state.phase = AdvisorPhase::Idle;
            state.warnings.clear();
            return;
        }

        // 签发令牌：单调递增，决议时与最新值比较
        let token = self.latest_token.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.lock().unwrap().phase = AdvisorPhase::Pending;
        tracing::debug!(
            "Interaction check {} issued for {} medications",
            token,
            medications.len()
        );

        match self.checker.check(&medications).await {
            Ok(warnings) => {
                if self.latest_token.load(Ordering::SeqCst) != token {
                    tracing::debug!("Discarding stale interaction response for request {}", token);
                    return;
                }
                let mut state = self.state.lock().unwrap();
                state.warnings = warnings;
                state.phase = AdvisorPhase::Resolved;
            }
            Err(e) => {
                if self.latest_token.load(Ordering::SeqCst) != token {
                    return;
                }
                // 瞬时故障时保留旧告警：过期的提示好过没有提示
                tracing::warn!("Interaction check {} failed: {}", token, e);
                self.state.lock().unwrap().phase = AdvisorPhase::Errored;
                self.surface
                    .notify(
                        "药物相互作用检查暂时不可用",
                        NotificationVariant::Warning,
                        None,
                    )
                    .await;
            }
        }
    }
}

/// 药物相互作用顾问
pub struct InteractionAdvisor {
    shared: Arc<AdvisorShared>,
    config: AdvisorConfig,
    debounce_task: Mutex<Option<JoinHandle<()>>>,
}

impl InteractionAdvisor {
    /// 创建新的顾问
    pub fn new(
        checker: Arc<dyn InteractionChecker>,
        surface: Arc<dyn UiSurface>,
        config: AdvisorConfig,
    ) -> Self {
        Self {
            shared: Arc::new(AdvisorShared {
                checker,
                surface,
                state: Mutex::new(AdvisorState {
                    phase: AdvisorPhase::Idle,
                    warnings: Vec::new(),
                }),
                latest_token: AtomicU64::new(0),
            }),
            config,
            debounce_task: Mutex::new(None),
        }
    }

    /// 用药列表被编辑
    ///
    /// 重置防抖计时；静默期过后才真正签发检查请求。上一次还没到期的
    /// 编辑任务被直接废弃。
    pub fn medications_edited(&self, medications: Vec<String>) {
        let shared = self.shared.clone();
        let quiet_period = self.config.debounce;
        let task = tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            shared.issue_check(medications).await;
        });

        let mut guard = self
            .debounce_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = guard.replace(task) {
            previous.abort();
        }
    }

    /// 跳过防抖立即签发一次检查
    pub async fn check_now(&self, medications: Vec<String>) {
        self.shared.issue_check(medications).await;
    }

    /// 当前阶段
    pub fn phase(&self) -> AdvisorPhase {
        self.shared.state.lock().unwrap().phase
    }

    /// 当前告警集合
    pub fn warnings(&self) -> Vec<String> {
        self.shared.state.lock().unwrap().warnings.clone()
    }

    /// 宿主销毁时调用，废弃在途的防抖任务
    pub fn shutdown(&self) {
        let mut guard = self
            .debounce_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(task) = guard.take() {
            task.abort();
        }
    }
}

impl Drop for InteractionAdvisor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
