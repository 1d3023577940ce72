//! FaceApp 图片上传与滤镜协议的异步客户端。
//!
//! 上传一张照片得到服务分配的 `code`，随后按滤镜名反复请求渲染结果；
//! 句柄可序列化为 `{"code", "device_id"}`，交给另一个进程继续处理而无需重新上传。
//!
//! ```no_run
//! use std::sync::Arc;
//! use faces::{FaceClient, FaceConfig, RemotePhoto};
//!
//! # async fn run() -> Result<(), faces::FaceError> {
//! let client = Arc::new(FaceClient::new(FaceConfig::default())?);
//! let photo = RemotePhoto::upload_bytes(client.clone(), std::fs::read("face.jpg").unwrap()).await?;
//! let smile = photo.apply_filter("smile", false).await?;
//!
//! // 在另一个进程中重建
//! let json = photo.to_json()?;
//! let same = RemotePhoto::from_json(client, &json)?;
//! assert_eq!(same.code(), photo.code());
//! # let _ = smile;
//! # Ok(())
//! # }
//! ```

/// 统一错误处理模块
pub mod error;

/// 配置模块
pub mod config;

/// HTTP 传输协作方
pub mod http;

/// 设备标识生成
pub mod device;

/// 功能聚合模块
pub mod features;

// 导出常用类型供外部使用
pub use config::FaceConfig;
pub use error::{FaceError, ServiceErrorCode, TransportError};
pub use features::photo::{
    FaceClient, FilterCatalog, FilterInfo, FilteredImage, PhotoArgs, PhotoRecord, RemotePhoto,
};
pub use http::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
