//! 门户引擎演示程序
//!
//! 展示引擎的核心功能：通知投影、状态转换侦测与评价引导。

use async_trait::async_trait;
use chrono::{Duration, Utc};
use portal_core::{AppointmentRecord, NotificationAction, NotificationVariant, Result};
use portal_engine::{
    AdvisorConfig, EngineConfig, InteractionChecker, PortalEngine, ReviewPromptConfig,
    ReviewRegistry, UiSurface,
};
use portal_integration::decode_appointments;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// 演示用的评价登记：什么都没评价过
struct DemoRegistry;

#[async_trait]
impl ReviewRegistry for DemoRegistry {
    async fn has_review(&self, _appointment_id: &str) -> Result<bool> {
        Ok(false)
    }
}

/// 演示用的界面：直接打印
struct ConsoleSurface;

#[async_trait]
impl UiSurface for ConsoleSurface {
    async fn notify(
        &self,
        message: &str,
        variant: NotificationVariant,
        action: Option<NotificationAction>,
    ) {
        match action {
            Some(action) => println!("🔔 [{:?}] {} （{}）", variant, message, action.label),
            None => println!("🔔 [{:?}] {}", variant, message),
        }
    }

    async fn navigate(&self, target: &str) {
        println!("➡️  跳转到 {}", target);
    }
}

struct DemoChecker;

#[async_trait]
impl InteractionChecker for DemoChecker {
    async fn check(&self, medications: &[String]) -> Result<Vec<String>> {
        Ok(vec![format!("{}与{}同服需监测肝功能", medications[0], medications[1])])
    }
}

/// 像后端一样产出原始JSON，再经解码边界得到类型化记录
fn sample_appointments(first_status: &str) -> Vec<AppointmentRecord> {
    let now = Utc::now();
    let payload = json!([
        {
            "id": "apt-1",
            "patientId": Uuid::new_v4().to_string(),
            "doctorId": Uuid::new_v4().to_string(),
            "scheduledAt": (now + Duration::hours(2)).to_rfc3339(),
            "createdAt": (now - Duration::days(1)).to_rfc3339(),
            "updatedAt": now.to_rfc3339(),
            "status": first_status,
            "reason": "年度体检复诊",
            "modality": "ONLINE",
            "counterpartName": "王医生",
            "joinUrl": "https://meet.example/demo"
        },
        {
            "id": "apt-2",
            "patientId": Uuid::new_v4().to_string(),
            "doctorId": Uuid::new_v4().to_string(),
            "scheduledAt": (now + Duration::hours(96)).to_rfc3339(),
            "updatedAt": now.to_rfc3339(),
            "status": "PENDING_PAYMENT",
            "reason": "初诊",
            "modality": "ONSITE",
            "counterpartName": "李医生"
        }
    ]);
    decode_appointments(&payload)
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt::init();

    println!("🚀 门户引擎演示\n");

    let mut engine = PortalEngine::new(
        Arc::new(DemoRegistry),
        Arc::new(ConsoleSurface),
        Arc::new(DemoChecker),
        EngineConfig {
            review_prompt: ReviewPromptConfig {
                navigate_delay: std::time::Duration::from_millis(500),
            },
            advisor: AdvisorConfig::default(),
        },
    );

    // 1. 首轮刷新：建立基线
    let appointments = sample_appointments("CONFIRMED");
    let feed = engine.refresh(&appointments, &[], true, Utc::now()).await;
    println!("📋 首轮通知流 ({}条):", feed.len());
    for item in &feed {
        println!("   [{}] {}", item.id, item.title);
    }

    // 2. 第二轮刷新：apt-1完成就诊，触发评价引导
    println!("\n✅ apt-1 就诊完成");
    let appointments = sample_appointments("COMPLETED");
    engine.refresh(&appointments, &[], true, Utc::now()).await;

    // 等延迟跳转计时器触发
    tokio::time::sleep(std::time::Duration::from_millis(800)).await;

    engine.shutdown();
    println!("\n演示结束");
    Ok(())
}
