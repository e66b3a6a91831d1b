//! # 门户集成模块
//!
//! 与外部后端的集成边界，提供：
//! - 数据解码：松散JSON到类型化记录的校验解码
//! - 后端API客户端：预约、病史、评价登记
//! - 药物相互作用服务客户端

pub mod api;
pub mod decode;
pub mod interactions;

// 重新导出主要类型
pub use api::{AppointmentApi, BackendApiConfig, MedicalHistoryApi, ReviewApi};
pub use decode::{decode_appointment, decode_appointments, decode_history, decode_history_record};
pub use interactions::HttpInteractionChecker;
