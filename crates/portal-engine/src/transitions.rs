//! 状态转换侦测
//!
//! 记住每个实体上一次观察到的语义类别，在类别发生变化时恰好发出一次
//! 转换事件。第一次观察只建立基线：会话开始前就已处于终态的记录
//! 不会触发任何事件。

use crate::status::StatusClass;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 一批待观察的(实体ID, 语义类别)对，顺序即数据到达顺序
pub type StatusClassBatch = Vec<(String, StatusClass)>;

/// 转换事件
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransitionEvent {
    pub entity_id: String,
    pub from: StatusClass,
    pub to: StatusClass,
}

/// 状态转换侦测器
///
/// 仅保存每个实体最后一次的类别（不保存完整历史），每次观察O(1)，
/// 重复渲染产生的重复观察不会重复发事件。内存随会话存在，
/// 整页重载后重新建立基线。
#[derive(Debug, Default)]
pub struct TransitionWatcher {
    memory: HashMap<String, StatusClass>,
}

impl TransitionWatcher {
    /// 创建新的侦测器，基线为空
    pub fn new() -> Self {
        Self {
            memory: HashMap::new(),
        }
    }

    /// 观察一个实体的当前类别
    ///
    /// 调用方必须按数据到达顺序串行调用；同一实体不允许来自两个
    /// 并发刷新的交错观察。
    pub fn observe(&mut self, entity_id: &str, current: StatusClass) -> Option<TransitionEvent> {
        match self.memory.get(entity_id) {
            None => {
                self.memory.insert(entity_id.to_string(), current);
                None
            }
            Some(previous) if *previous == current => None,
            Some(previous) => {
                let event = TransitionEvent {
                    entity_id: entity_id.to_string(),
                    from: *previous,
                    to: current,
                };
                tracing::debug!(
                    "Entity {} transitioned {:?} -> {:?}",
                    entity_id,
                    event.from,
                    event.to
                );
                self.memory.insert(entity_id.to_string(), current);
                Some(event)
            }
        }
    }

    /// 按输入顺序观察一批实体
    pub fn observe_batch(&mut self, batch: &[(String, StatusClass)]) -> Vec<TransitionEvent> {
        batch
            .iter()
            .filter_map(|(id, class)| self.observe(id, *class))
            .collect()
    }

    /// 已建立基线的实体数
    pub fn tracked_count(&self) -> usize {
        self.memory.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observation_is_baseline_only() {
        let mut watcher = TransitionWatcher::new();
        // 会话开始时已是终态，不得触发事件
        assert!(watcher.observe("a1", StatusClass::Completed).is_none());
        assert_eq!(watcher.tracked_count(), 1);
    }

    #[test]
    fn test_change_emits_exactly_once() {
        let mut watcher = TransitionWatcher::new();
        assert!(watcher.observe("a1", StatusClass::Pending).is_none());

        let event = watcher.observe("a1", StatusClass::Confirmed).unwrap();
        assert_eq!(event.from, StatusClass::Pending);
        assert_eq!(event.to, StatusClass::Confirmed);

        // 不变的重复观察不再发事件
        assert!(watcher.observe("a1", StatusClass::Confirmed).is_none());
        assert!(watcher.observe("a1", StatusClass::Confirmed).is_none());
    }

    #[test]
    fn test_single_completed_event_over_full_lifecycle() {
        let mut watcher = TransitionWatcher::new();
        let sequence = [
            StatusClass::Pending,
            StatusClass::Confirmed,
            StatusClass::Completed,
            StatusClass::Completed,
            StatusClass::Completed,
        ];

        let completed_events: usize = sequence
            .iter()
            .filter_map(|class| watcher.observe("a1", *class))
            .filter(|e| e.to == StatusClass::Completed)
            .count();
        assert_eq!(completed_events, 1);
    }

    #[test]
    fn test_batch_preserves_input_order() {
        let mut watcher = TransitionWatcher::new();
        watcher.observe("a1", StatusClass::Confirmed);
        watcher.observe("a2", StatusClass::Confirmed);

        let events = watcher.observe_batch(&[
            ("a1".to_string(), StatusClass::Completed),
            ("a2".to_string(), StatusClass::Completed),
        ]);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].entity_id, "a1");
        assert_eq!(events[1].entity_id, "a2");
    }
}
