//! 通知投影
//!
//! 把多个独立的记录流（预约、病史、认证标记）合并为一条按时间排序的通知流。
//! 纯函数：不访问网络与时钟，相同输入必然产生相同且顺序一致的输出。

use crate::status::{StatusClass, StatusClassifier};
use chrono::{DateTime, Duration, Utc};
use portal_core::{
    AppointmentModality, AppointmentRecord, MedicalHistoryRecord, NotificationAction,
    NotificationItem, NotificationVariant,
};

/// 提醒窗口：确认类预约在就诊前48小时内额外产生提醒条目
const REMINDER_WINDOW_HOURS: i64 = 48;

/// 病史通知条数上限
const HISTORY_FEED_CAP: usize = 5;

/// 投影通知流
///
/// `now`由调用方注入，投影本身不取时钟。分类器仅用于未知状态的
/// 一次性告警，不影响输出内容。
pub fn project(
    classifier: &mut StatusClassifier,
    appointments: &[AppointmentRecord],
    history: &[MedicalHistoryRecord],
    verified: bool,
    now: DateTime<Utc>,
) -> Vec<NotificationItem> {
    let mut items = Vec::new();

    for appointment in appointments {
        let badge = classifier.classify_or_unknown(&appointment.status);
        if let Some(item) = appointment_item(appointment, badge.class) {
            items.push(item);
        }

        // 提醒条目是附加的，不替代确认条目
        if badge.class.is_confirmed_like() && within_reminder_window(appointment, now) {
            items.push(NotificationItem {
                id: NotificationItem::derive_id(&appointment.id, "reminder"),
                title: "就诊提醒".to_string(),
                description: format!(
                    "您与{}的预约将于{}开始",
                    appointment.counterpart_name,
                    appointment.scheduled_at.format("%Y-%m-%d %H:%M")
                ),
                timestamp: appointment.scheduled_at,
                variant: NotificationVariant::Info,
                action: Some(view_action(&appointment.id)),
            });
        }
    }

    for record in recent_history(history) {
        items.push(NotificationItem {
            id: NotificationItem::derive_id(&record.id, "history"),
            title: "病史已更新".to_string(),
            description: format!("{}（{}医生）", record.condition, record.doctor_name),
            timestamp: record.updated_at,
            variant: NotificationVariant::Success,
            action: None,
        });
    }

    if !verified {
        // 静态提示，无来源记录ID
        items.push(NotificationItem {
            id: "account-unverified".to_string(),
            title: "账号待认证".to_string(),
            description: "完成身份认证后才能预约就诊".to_string(),
            timestamp: now,
            variant: NotificationVariant::Warning,
            action: Some(NotificationAction {
                label: "去认证".to_string(),
                target: "/settings/verification".to_string(),
            }),
        });
    }

    // 稳定排序：时间戳相同的条目保持输入顺序，确定性由此保证
    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    items
}

/// 按语义类别生成预约条目，未知类别不产生条目
fn appointment_item(appointment: &AppointmentRecord, class: StatusClass) -> Option<NotificationItem> {
    let (suffix, title, variant, action) = match class {
        StatusClass::Pending => (
            "pending",
            "预约待确认",
            NotificationVariant::Warning,
            None,
        ),
        StatusClass::Confirmed => (
            "confirmed",
            "预约已确认",
            NotificationVariant::Success,
            Some(join_or_view_action(appointment)),
        ),
        StatusClass::InProgress => (
            "inprogress",
            "就诊进行中",
            NotificationVariant::Info,
            Some(join_or_view_action(appointment)),
        ),
        StatusClass::Completed => ("completed", "就诊已完成", NotificationVariant::Info, None),
        StatusClass::Cancelled => (
            "cancelled",
            "预约已取消",
            NotificationVariant::Danger,
            Some(NotificationAction {
                label: "重新预约".to_string(),
                target: format!("/doctors/{}/book", appointment.doctor_id),
            }),
        ),
        StatusClass::NoShow => ("noshow", "未到诊", NotificationVariant::Warning, None),
        StatusClass::Unknown => return None,
    };

    Some(NotificationItem {
        id: NotificationItem::derive_id(&appointment.id, suffix),
        title: title.to_string(),
        description: format!("{}：{}", appointment.counterpart_name, appointment.reason),
        timestamp: appointment.updated_at,
        variant,
        action,
    })
}

/// 线上预约且有入口链接时给入口，否则给详情页
fn join_or_view_action(appointment: &AppointmentRecord) -> NotificationAction {
    match (appointment.modality, &appointment.join_url) {
        (AppointmentModality::Online, Some(url)) => NotificationAction {
            label: "进入诊室".to_string(),
            target: url.clone(),
        },
        _ => view_action(&appointment.id),
    }
}

fn view_action(appointment_id: &str) -> NotificationAction {
    NotificationAction {
        label: "查看详情".to_string(),
        target: format!("/appointments/{}", appointment_id),
    }
}

fn within_reminder_window(appointment: &AppointmentRecord, now: DateTime<Utc>) -> bool {
    let window_end = now + Duration::hours(REMINDER_WINDOW_HOURS);
    appointment.scheduled_at >= now && appointment.scheduled_at <= window_end
}

/// 最近更新的病史记录，上限5条，时间相同者保持输入顺序
fn recent_history(history: &[MedicalHistoryRecord]) -> Vec<&MedicalHistoryRecord> {
    let mut sorted: Vec<&MedicalHistoryRecord> = history.iter().collect();
    sorted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    sorted.truncate(HISTORY_FEED_CAP);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use portal_core::HistoryStatus;

    fn sample_appointment(id: &str, status: &str, scheduled_at: DateTime<Utc>) -> AppointmentRecord {
        AppointmentRecord {
            id: id.to_string(),
            patient_id: "p-1".to_string(),
            doctor_id: "d-1".to_string(),
            scheduled_at,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            status: status.to_string(),
            reason: "复诊".to_string(),
            notes: None,
            modality: AppointmentModality::Onsite,
            counterpart_name: "王医生".to_string(),
            clinic_ref: None,
            join_url: None,
        }
    }

    fn sample_history(id: &str, updated_at: DateTime<Utc>) -> MedicalHistoryRecord {
        MedicalHistoryRecord {
            id: id.to_string(),
            condition: "高血压".to_string(),
            status: HistoryStatus::Chronic,
            doctor_name: "王".to_string(),
            updated_at,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_projection_is_deterministic() {
        let appointments = vec![
            sample_appointment("a1", "CONFIRMED", now() + Duration::hours(2)),
            sample_appointment("a2", "CANCELLED", now() - Duration::hours(5)),
        ];
        let history = vec![sample_history("h1", now() - Duration::days(1))];

        let mut c1 = StatusClassifier::new();
        let mut c2 = StatusClassifier::new();
        let first = project(&mut c1, &appointments, &history, true, now());
        let second = project(&mut c2, &appointments, &history, true, now());
        assert_eq!(first, second);
    }

    #[test]
    fn test_confirmed_within_window_emits_both_items() {
        let appointments = vec![sample_appointment("1", "CONFIRMED", now() + Duration::hours(2))];
        let mut classifier = StatusClassifier::new();
        let items = project(&mut classifier, &appointments, &[], true, now());

        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert!(ids.contains(&"1-confirmed"));
        assert!(ids.contains(&"1-reminder"));
    }

    #[test]
    fn test_confirmed_outside_window_has_no_reminder() {
        let appointments = vec![sample_appointment("1", "CONFIRMED", now() + Duration::hours(72))];
        let mut classifier = StatusClassifier::new();
        let items = project(&mut classifier, &appointments, &[], true, now());

        assert!(items.iter().any(|i| i.id == "1-confirmed"));
        assert!(!items.iter().any(|i| i.id == "1-reminder"));
    }

    #[test]
    fn test_online_confirmed_uses_join_url() {
        let mut appointment = sample_appointment("1", "CONFIRMED", now() + Duration::hours(2));
        appointment.modality = AppointmentModality::Online;
        appointment.join_url = Some("https://meet.example/abc".to_string());

        let mut classifier = StatusClassifier::new();
        let items = project(&mut classifier, &[appointment], &[], true, now());
        let confirmed = items.iter().find(|i| i.id == "1-confirmed").unwrap();
        assert_eq!(
            confirmed.action.as_ref().unwrap().target,
            "https://meet.example/abc"
        );
    }

    #[test]
    fn test_cancelled_and_rejected_offer_rebook() {
        let appointments = vec![
            sample_appointment("1", "CANCELLED", now()),
            sample_appointment("2", "REJECTED", now()),
        ];
        let mut classifier = StatusClassifier::new();
        let items = project(&mut classifier, &appointments, &[], true, now());

        for id in ["1-cancelled", "2-cancelled"] {
            let item = items.iter().find(|i| i.id == id).unwrap();
            assert_eq!(item.variant, NotificationVariant::Danger);
            assert_eq!(item.action.as_ref().unwrap().label, "重新预约");
        }
    }

    #[test]
    fn test_history_feed_is_capped() {
        let history: Vec<MedicalHistoryRecord> = (0..8)
            .map(|i| sample_history(&format!("h{}", i), now() - Duration::days(i)))
            .collect();
        let mut classifier = StatusClassifier::new();
        let items = project(&mut classifier, &[], &history, true, now());

        assert_eq!(items.len(), 5);
        // 最近的在前
        assert_eq!(items[0].id, "h0-history");
    }

    #[test]
    fn test_unverified_emits_single_static_advisory() {
        let mut classifier = StatusClassifier::new();
        let items = project(&mut classifier, &[], &[], false, now());

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "account-unverified");
        assert_eq!(items[0].variant, NotificationVariant::Warning);
    }

    #[test]
    fn test_unknown_status_emits_nothing() {
        let appointments = vec![sample_appointment("1", "TELEPORTED", now())];
        let mut classifier = StatusClassifier::new();
        let items = project(&mut classifier, &appointments, &[], true, now());
        assert!(items.is_empty());
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        let mut early = sample_appointment("early", "COMPLETED", now());
        early.updated_at = now() - Duration::hours(3);
        let mut tie_a = sample_appointment("tie-a", "COMPLETED", now());
        tie_a.updated_at = now() - Duration::hours(1);
        let mut tie_b = sample_appointment("tie-b", "COMPLETED", now());
        tie_b.updated_at = now() - Duration::hours(1);

        let appointments = vec![early, tie_a, tie_b];
        let mut classifier = StatusClassifier::new();
        let items = project(&mut classifier, &appointments, &[], true, now());

        assert_eq!(items[0].id, "tie-a-completed");
        assert_eq!(items[1].id, "tie-b-completed");
        assert_eq!(items[2].id, "early-completed");
    }
}
