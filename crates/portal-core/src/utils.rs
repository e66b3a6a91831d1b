//! 通用工具函数

use chrono::{DateTime, Utc};

/// 宽容地解析后端时间戳
///
/// 后端返回RFC3339格式，个别旧接口省略时区后缀，按UTC补齐。
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    raw.parse::<chrono::NaiveDateTime>()
        .ok()
        .map(|naive| naive.and_utc())
}
