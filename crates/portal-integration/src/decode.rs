//! 数据解码边界
//!
//! 后端返回的原始JSON在这里完成校验解码：要么得到完整类型化的记录，
//! 要么得到声明式的解码错误——半类型化的对象绝不流入核心。
//! 缺少必要字段的单条记录被跳过并告警，整批解码从不中断：
//! 部分结果永远好过没有结果。

use portal_core::utils::parse_instant;
use portal_core::{
    AppointmentModality, AppointmentRecord, HistoryStatus, MedicalHistoryRecord, PortalError,
    Result,
};
use serde_json::Value;

/// 解码一批预约记录，畸形记录跳过不中断
pub fn decode_appointments(payload: &Value) -> Vec<AppointmentRecord> {
    decode_batch(payload, "appointment", decode_appointment)
}

/// 解码一批病史记录，畸形记录跳过不中断
pub fn decode_history(payload: &Value) -> Vec<MedicalHistoryRecord> {
    decode_batch(payload, "history record", decode_history_record)
}

fn decode_batch<T>(
    payload: &Value,
    kind: &str,
    decode_one: fn(&Value) -> Result<T>,
) -> Vec<T> {
    let Some(entries) = payload.as_array() else {
        tracing::warn!("Expected a JSON array of {}s, got something else", kind);
        return Vec::new();
    };

    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        match decode_one(entry) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Skipping malformed {}: {}", kind, e);
            }
        }
    }
    records
}

/// 解码单条预约记录
pub fn decode_appointment(value: &Value) -> Result<AppointmentRecord> {
    let id = opaque_id(value, "id")?;
    let scheduled_at = required_instant(value, "scheduledAt")?;
    let updated_at = required_instant(value, "updatedAt")?;
    // 个别旧接口缺createdAt，回退到updatedAt
    let created_at = optional_instant(value, "createdAt").unwrap_or(updated_at);

    let status = required_str(value, "status")?.to_string();

    let modality = match value.get("modality").and_then(Value::as_str) {
        Some("ONLINE") => AppointmentModality::Online,
        _ => AppointmentModality::Onsite,
    };

    Ok(AppointmentRecord {
        id,
        patient_id: opaque_id(value, "patientId").unwrap_or_default(),
        doctor_id: opaque_id(value, "doctorId").unwrap_or_default(),
        scheduled_at,
        created_at,
        updated_at,
        status,
        reason: optional_str(value, "reason").unwrap_or_default(),
        notes: optional_str(value, "notes"),
        modality,
        counterpart_name: optional_str(value, "counterpartName").unwrap_or_default(),
        clinic_ref: optional_str(value, "clinicRef"),
        join_url: optional_str(value, "joinUrl"),
    })
}

/// 解码单条病史记录
pub fn decode_history_record(value: &Value) -> Result<MedicalHistoryRecord> {
    let id = opaque_id(value, "id")?;
    let updated_at = required_instant(value, "updatedAt")?;

    let status = match required_str(value, "status")? {
        "ACTIVE" => HistoryStatus::Active,
        "RESOLVED" => HistoryStatus::Resolved,
        "CHRONIC" => HistoryStatus::Chronic,
        "UNDER_TREATMENT" => HistoryStatus::UnderTreatment,
        other => {
            return Err(PortalError::Decode(format!(
                "unknown history status: {}",
                other
            )))
        }
    };

    Ok(MedicalHistoryRecord {
        id,
        condition: required_str(value, "condition")?.to_string(),
        status,
        doctor_name: optional_str(value, "doctorName").unwrap_or_default(),
        updated_at,
    })
}

/// 后端ID可能是字符串也可能是数字，统一规整为字符串
fn opaque_id(value: &Value, key: &str) -> Result<String> {
    match value.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(PortalError::Decode(format!("missing id field: {}", key))),
    }
}

fn required_str<'a>(value: &'a Value, key: &str) -> Result<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| PortalError::Decode(format!("missing required field: {}", key)))
}

fn optional_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn required_instant(value: &Value, key: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    optional_instant(value, key)
        .ok_or_else(|| PortalError::ProjectionInput(format!("missing required timestamp: {}", key)))
}

fn optional_instant(value: &Value, key: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    value.get(key).and_then(Value::as_str).and_then(parse_instant)
}
