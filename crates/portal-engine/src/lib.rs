//! # 门户引擎模块
//!
//! 预约生命周期投影与响应式通知引擎，包括：
//! - 状态分类器：把后端原始状态码映射为本地语义类别
//! - 通知投影：把多个独立记录流合并为一条按时间排序的通知流
//! - 转换侦测：每个实体进入新类别时恰好发出一次事件
//! - 评价引导：完成就诊后的一次性提示与可取消的延迟跳转
//! - 相互作用顾问：防抖且竞态安全的用药检查管线

pub mod advisor;
pub mod engine;
pub mod projector;
pub mod review_prompt;
pub mod status;
pub mod transitions;

// 重新导出主要类型
pub use advisor::{AdvisorConfig, AdvisorPhase, InteractionAdvisor, InteractionChecker};
pub use engine::{EngineConfig, PortalEngine};
pub use projector::project;
pub use review_prompt::{
    NavigationTimer, PromptState, ReviewPromptConfig, ReviewPromptController, ReviewRegistry,
    UiSurface,
};
pub use status::{classify, StatusBadge, StatusClass, StatusClassifier};
pub use transitions::{StatusClassBatch, TransitionEvent, TransitionWatcher};
