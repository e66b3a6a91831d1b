//! 评价引导控制器
//!
//! 消费进入COMPLETED类别的转换事件：对尚未评价的预约弹出一次性提示，
//! 并装配一个可取消的延迟跳转计时器。每个实体至多提示一次。

use crate::status::StatusClass;
use crate::transitions::TransitionEvent;
use async_trait::async_trait;
use portal_core::{NotificationAction, NotificationVariant, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// 评价记录查询接口（外部协作方）
#[async_trait]
pub trait ReviewRegistry: Send + Sync {
    /// 当前用户是否已评价该预约
    async fn has_review(&self, appointment_id: &str) -> Result<bool>;
}

/// 宿主提供的界面能力：弹出提示与路由跳转
#[async_trait]
pub trait UiSurface: Send + Sync {
    async fn notify(
        &self,
        message: &str,
        variant: NotificationVariant,
        action: Option<NotificationAction>,
    );

    async fn navigate(&self, target: &str);
}

/// 每个实体的提示状态，只进不退
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptState {
    Prompted,
    Dismissed,
}

/// 控制器配置
#[derive(Debug, Clone)]
pub struct ReviewPromptConfig {
    /// 延迟跳转时长
    pub navigate_delay: Duration,
}

impl Default for ReviewPromptConfig {
    fn default() -> Self {
        Self {
            navigate_delay: Duration::from_millis(5000),
        }
    }
}

/// 延迟跳转计时器
///
/// 计时器触发与手动跳转都必须先赢得原子认领标记，二者至多一个生效；
/// 取消只是兜底，互斥不依赖取消的先后顺序。
pub struct NavigationTimer {
    claim: Arc<AtomicBool>,
    handle: JoinHandle<()>,
    surface: Arc<dyn UiSurface>,
    target: String,
}

impl NavigationTimer {
    /// 装配计时器，到期后跳转到目标路由
    pub fn arm(surface: Arc<dyn UiSurface>, target: String, delay: Duration) -> Self {
        let claim = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn({
            let claim = claim.clone();
            let surface = surface.clone();
            let target = target.clone();
            async move {
                tokio::time::sleep(delay).await;
                if claim
                    .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok()
                {
                    surface.navigate(&target).await;
                }
            }
        });

        Self {
            claim,
            handle,
            surface,
            target,
        }
    }

    /// 立即执行跳转，计时器随之作废
    pub async fn navigate_now(self) {
        if self
            .claim
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.handle.abort();
            self.surface.navigate(&self.target).await;
        }
    }

    /// 取消计时器，不再产生任何副作用
    pub fn cancel(self) {
        self.claim.store(true, Ordering::SeqCst);
        self.handle.abort();
    }
}

impl Drop for NavigationTimer {
    fn drop(&mut self) {
        // 宿主视图销毁时计时器必须一并消失，绝不对已脱离的上下文触发
        self.handle.abort();
    }
}

/// 评价引导控制器
pub struct ReviewPromptController {
    registry: Arc<dyn ReviewRegistry>,
    surface: Arc<dyn UiSurface>,
    config: ReviewPromptConfig,
    states: HashMap<String, PromptState>,
    active_timer: Option<NavigationTimer>,
}

impl ReviewPromptController {
    /// 创建新的控制器
    pub fn new(
        registry: Arc<dyn ReviewRegistry>,
        surface: Arc<dyn UiSurface>,
        config: ReviewPromptConfig,
    ) -> Self {
        Self {
            registry,
            surface,
            config,
            states: HashMap::new(),
            active_timer: None,
        }
    }

    /// 处理一批转换事件
    ///
    /// 同一批内多个实体进入COMPLETED时全部弹提示，但只为合并顺序中的
    /// 第一个装配自动跳转，避免相互竞争的跳转。
    pub async fn handle_batch(&mut self, events: &[TransitionEvent]) {
        let mut armed_this_batch = false;

        for event in events.iter().filter(|e| e.to == StatusClass::Completed) {
            if self.states.contains_key(&event.entity_id) {
                continue;
            }

            match self.registry.has_review(&event.entity_id).await {
                Ok(true) => {
                    self.states
                        .insert(event.entity_id.clone(), PromptState::Dismissed);
                }
                Ok(false) => {
                    self.states
                        .insert(event.entity_id.clone(), PromptState::Prompted);
                    self.prompt(&event.entity_id, !armed_this_batch).await;
                    armed_this_batch = true;
                }
                Err(e) => {
                    // 查询失败只抑制本轮，状态不落盘，下一轮观察重试
                    tracing::warn!(
                        "Review lookup failed for appointment {}, prompt deferred: {}",
                        event.entity_id,
                        e
                    );
                }
            }
        }
    }

    async fn prompt(&mut self, appointment_id: &str, arm_timer: bool) {
        let target = format!("/appointments/{}/review", appointment_id);

        self.surface
            .notify(
                "就诊已完成，邀请您评价本次就诊",
                NotificationVariant::Success,
                Some(NotificationAction {
                    label: "去评价".to_string(),
                    target: target.clone(),
                }),
            )
            .await;

        tracing::info!("Review prompt fired for appointment {}", appointment_id);

        if arm_timer {
            if let Some(previous) = self.active_timer.take() {
                previous.cancel();
            }
            self.active_timer = Some(NavigationTimer::arm(
                self.surface.clone(),
                target,
                self.config.navigate_delay,
            ));
        }
    }

    /// 用户点击了提示上的立即跳转
    pub async fn navigate_now(&mut self) {
        if let Some(timer) = self.active_timer.take() {
            timer.navigate_now().await;
        }
    }

    /// 用户关闭了提示，对应实体不再引导
    pub fn dismiss(&mut self, appointment_id: &str) {
        self.states
            .insert(appointment_id.to_string(), PromptState::Dismissed);
        if let Some(timer) = self.active_timer.take() {
            timer.cancel();
        }
    }

    /// 宿主视图销毁时调用，清掉在途计时器
    pub fn shutdown(&mut self) {
        if let Some(timer) = self.active_timer.take() {
            timer.cancel();
        }
    }

    /// 当前是否有在途的延迟跳转
    pub fn has_armed_timer(&self) -> bool {
        self.active_timer.is_some()
    }

    /// 查询实体的提示状态
    pub fn prompt_state(&self, appointment_id: &str) -> Option<PromptState> {
        self.states.get(appointment_id).copied()
    }
}

impl Drop for ReviewPromptController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::PortalError;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    struct MockRegistry {
        reviewed: HashSet<String>,
        fail_times: AtomicUsize,
    }

    impl MockRegistry {
        fn new(reviewed: &[&str]) -> Self {
            Self {
                reviewed: reviewed.iter().map(|s| s.to_string()).collect(),
                fail_times: AtomicUsize::new(0),
            }
        }

        fn failing_once(reviewed: &[&str]) -> Self {
            let registry = Self::new(reviewed);
            registry.fail_times.store(1, Ordering::SeqCst);
            registry
        }
    }

    #[async_trait]
    impl ReviewRegistry for MockRegistry {
        async fn has_review(&self, appointment_id: &str) -> Result<bool> {
            let remaining = self.fail_times.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fail_times.store(remaining - 1, Ordering::SeqCst);
                return Err(PortalError::PromptLookup("registry unavailable".to_string()));
            }
            Ok(self.reviewed.contains(appointment_id))
        }
    }

    #[derive(Default)]
    struct MockSurface {
        notices: Mutex<Vec<String>>,
        navigations: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl UiSurface for MockSurface {
        async fn notify(
            &self,
            message: &str,
            _variant: NotificationVariant,
            _action: Option<NotificationAction>,
        ) {
            self.notices.lock().unwrap().push(message.to_string());
        }

        async fn navigate(&self, target: &str) {
            self.navigations.lock().unwrap().push(target.to_string());
        }
    }

    fn completed_event(id: &str) -> TransitionEvent {
        TransitionEvent {
            entity_id: id.to_string(),
            from: StatusClass::Confirmed,
            to: StatusClass::Completed,
        }
    }

    fn controller(
        registry: MockRegistry,
        delay_ms: u64,
    ) -> (ReviewPromptController, Arc<MockSurface>) {
        let surface = Arc::new(MockSurface::default());
        let controller = ReviewPromptController::new(
            Arc::new(registry),
            surface.clone(),
            ReviewPromptConfig {
                navigate_delay: Duration::from_millis(delay_ms),
            },
        );
        (controller, surface)
    }

    #[tokio::test]
    async fn test_completed_transition_fires_one_toast_and_one_timer() {
        let (mut controller, surface) = controller(MockRegistry::new(&[]), 5000);

        controller.handle_batch(&[completed_event("a1")]).await;

        assert_eq!(surface.notices.lock().unwrap().len(), 1);
        assert!(controller.has_armed_timer());
        assert_eq!(controller.prompt_state("a1"), Some(PromptState::Prompted));
    }

    #[tokio::test]
    async fn test_already_reviewed_entity_is_never_prompted() {
        let (mut controller, surface) = controller(MockRegistry::new(&["a1"]), 5000);

        controller.handle_batch(&[completed_event("a1")]).await;
        controller.handle_batch(&[completed_event("a1")]).await;

        assert!(surface.notices.lock().unwrap().is_empty());
        assert!(!controller.has_armed_timer());
        assert_eq!(controller.prompt_state("a1"), Some(PromptState::Dismissed));
    }

    #[tokio::test]
    async fn test_repeated_event_prompts_once() {
        let (mut controller, surface) = controller(MockRegistry::new(&[]), 5000);

        controller.handle_batch(&[completed_event("a1")]).await;
        controller.handle_batch(&[completed_event("a1")]).await;

        assert_eq!(surface.notices.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_retried_next_cycle() {
        let (mut controller, surface) = controller(MockRegistry::failing_once(&[]), 5000);

        // 第一轮查询失败，提示被抑制但状态未固化
        controller.handle_batch(&[completed_event("a1")]).await;
        assert!(surface.notices.lock().unwrap().is_empty());
        assert_eq!(controller.prompt_state("a1"), None);

        // 下一轮重试成功
        controller.handle_batch(&[completed_event("a1")]).await;
        assert_eq!(surface.notices.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_batch_toasts_all_but_arms_single_timer() {
        let (mut controller, surface) = controller(MockRegistry::new(&[]), 5000);

        controller
            .handle_batch(&[completed_event("a1"), completed_event("a2"), completed_event("a3")])
            .await;

        assert_eq!(surface.notices.lock().unwrap().len(), 3);
        assert!(controller.has_armed_timer());
        // 自动跳转属于合并顺序中的第一个实体
        if let Some(timer) = controller.active_timer.take() {
            timer.navigate_now().await;
        }
        let navigations = surface.navigations.lock().unwrap();
        assert_eq!(navigations.as_slice(), ["/appointments/a1/review"]);
    }

    #[tokio::test]
    async fn test_timer_fires_after_delay() {
        let (mut controller, surface) = controller(MockRegistry::new(&[]), 20);

        controller.handle_batch(&[completed_event("a1")]).await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        let navigations = surface.navigations.lock().unwrap();
        assert_eq!(navigations.as_slice(), ["/appointments/a1/review"]);
    }

    #[tokio::test]
    async fn test_manual_navigation_claims_before_timer() {
        let (mut controller, surface) = controller(MockRegistry::new(&[]), 50);

        controller.handle_batch(&[completed_event("a1")]).await;
        controller.navigate_now().await;
        tokio::time::sleep(Duration::from_millis(120)).await;

        // 手动点击赢得认领，计时器到期后不再跳转
        assert_eq!(surface.navigations.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_pending_timer() {
        let (mut controller, surface) = controller(MockRegistry::new(&[]), 20);

        controller.handle_batch(&[completed_event("a1")]).await;
        controller.shutdown();
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(surface.navigations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_completed_transitions_are_ignored() {
        let (mut controller, surface) = controller(MockRegistry::new(&[]), 5000);

        controller
            .handle_batch(&[TransitionEvent {
                entity_id: "a1".to_string(),
                from: StatusClass::Pending,
                to: StatusClass::Confirmed,
            }])
            .await;

        assert!(surface.notices.lock().unwrap().is_empty());
        assert!(!controller.has_armed_timer());
    }
}
