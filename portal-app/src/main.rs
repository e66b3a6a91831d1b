//! 门户宿主主程序
//!
//! 周期性拉取后端数据，驱动引擎刷新周期，把提示与跳转落到日志界面。

mod settings;
mod surface;

use anyhow::Context;
use clap::Parser;
use portal_engine::{AdvisorConfig, EngineConfig, PortalEngine, ReviewPromptConfig};
use portal_integration::{AppointmentApi, HttpInteractionChecker, MedicalHistoryApi, ReviewApi};
use settings::AppSettings;
use std::sync::Arc;
use std::time::Duration;
use surface::TracingSurface;
use tracing::{error, info, warn};

/// 门户宿主命令行参数
#[derive(Parser, Debug)]
#[command(name = "portal-app")]
#[command(about = "医疗预约门户宿主 - 通知投影与生命周期引擎")]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 后端基础URL（覆盖配置文件）
    #[arg(short, long)]
    base_url: Option<String>,

    /// 当前患者ID
    #[arg(short, long)]
    patient_id: Option<String>,

    /// 刷新间隔（秒）
    #[arg(long)]
    poll_interval: Option<u64>,

    /// 日志级别
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(&args.log_level)
        .init();

    info!("启动门户宿主...");

    let mut settings = AppSettings::load(args.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(base_url) = args.base_url {
        settings.backend.base_url = base_url;
    }
    if let Some(patient_id) = args.patient_id {
        settings.patient_id = patient_id;
    }
    if let Some(secs) = args.poll_interval {
        settings.poll_interval_secs = secs;
    }

    info!("门户配置:");
    info!("  后端地址: {}", settings.backend.base_url);
    info!("  患者ID: {}", settings.patient_id);
    info!("  刷新间隔: {}s", settings.poll_interval_secs);

    let backend = settings.backend_api_config();
    let appointments_api = AppointmentApi::new(backend.clone())?;
    let history_api = MedicalHistoryApi::new(backend.clone())?;
    let review_api = Arc::new(ReviewApi::new(backend.clone())?);
    let checker = Arc::new(HttpInteractionChecker::new(backend)?);
    let ui = Arc::new(TracingSurface);

    let mut engine = PortalEngine::new(
        review_api,
        ui,
        checker,
        EngineConfig {
            review_prompt: ReviewPromptConfig {
                navigate_delay: Duration::from_millis(settings.review_navigate_delay_ms),
            },
            advisor: AdvisorConfig {
                debounce: Duration::from_millis(settings.advisor_debounce_ms),
            },
        },
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(settings.poll_interval_secs));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                refresh_once(&mut engine, &appointments_api, &history_api, &settings).await;
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("信号处理失败: {}", e);
                }
                info!("收到退出信号，清理在途计时器");
                break;
            }
        }
    }

    engine.shutdown();
    Ok(())
}

/// 执行一次刷新周期；拉取失败只记录并跳过本轮，不中断主循环
async fn refresh_once(
    engine: &mut PortalEngine,
    appointments_api: &AppointmentApi,
    history_api: &MedicalHistoryApi,
    settings: &AppSettings,
) {
    let appointments = match appointments_api
        .list_for_patient(&settings.patient_id, None)
        .await
    {
        Ok(records) => records,
        Err(e) => {
            warn!("预约数据拉取失败，跳过本轮刷新: {}", e);
            return;
        }
    };

    // 病史拉取失败时按空流处理，预约侧的投影照常进行
    let history = match history_api.list_for_patient(&settings.patient_id).await {
        Ok(records) => records,
        Err(e) => {
            warn!("病史数据拉取失败，本轮按空处理: {}", e);
            Vec::new()
        }
    };

    let feed = engine
        .refresh(&appointments, &history, settings.verified, chrono::Utc::now())
        .await;

    info!("本轮通知流共{}条", feed.len());
    for item in &feed {
        info!("  [{}] {} - {}", item.id, item.title, item.description);
    }
}
