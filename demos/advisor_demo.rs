//! 药物相互作用顾问演示程序
//!
//! 展示防抖与按签发顺序的后写优先竞态处理。

use async_trait::async_trait;
use portal_core::{NotificationAction, NotificationVariant, Result};
use portal_engine::{AdvisorConfig, InteractionAdvisor, InteractionChecker, UiSurface};
use std::sync::Arc;
use std::time::Duration;

/// 演示用的检查服务：列表越短响应越慢，制造乱序返回
struct SlowPairChecker;

#[async_trait]
impl InteractionChecker for SlowPairChecker {
    async fn check(&self, medications: &[String]) -> Result<Vec<String>> {
        if medications.len() == 2 {
            tokio::time::sleep(Duration::from_millis(400)).await;
        }
        Ok(vec![format!("建议复核: {}", medications.join(" + "))])
    }
}

struct ConsoleSurface;

#[async_trait]
impl UiSurface for ConsoleSurface {
    async fn notify(
        &self,
        message: &str,
        _variant: NotificationVariant,
        _action: Option<NotificationAction>,
    ) {
        println!("🔔 {}", message);
    }

    async fn navigate(&self, _target: &str) {}
}

fn meds(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    println!("🚀 相互作用顾问演示\n");

    let advisor = Arc::new(InteractionAdvisor::new(
        Arc::new(SlowPairChecker),
        Arc::new(ConsoleSurface),
        AdvisorConfig {
            debounce: Duration::from_millis(100),
        },
    ));

    // 1. 单味药：不访问远端
    advisor.check_now(meds(&["阿司匹林"])).await;
    println!("单味药告警集合: {:?}（无网络调用）", advisor.warnings());

    // 2. 竞态：先签发慢请求A，再签发快请求B，B先返回
    let slow = advisor.clone();
    let request_a = tokio::spawn(async move {
        slow.check_now(meds(&["阿司匹林", "华法林"])).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    advisor
        .check_now(meds(&["阿司匹林", "华法林", "布洛芬"]))
        .await;
    request_a.await.ok();

    println!("竞态后的权威结果: {:?}", advisor.warnings());

    // 3. 防抖：快速连续编辑只发最后一次
    advisor.medications_edited(meds(&["A", "B"]));
    advisor.medications_edited(meds(&["A", "B", "C"]));
    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("防抖后的结果: {:?}", advisor.warnings());

    advisor.shutdown();
    println!("\n演示结束");
}
