pub mod client;
pub mod handle;
pub mod models;

// 对外导出常用类型
pub use client::FaceClient;
pub use handle::RemotePhoto;
pub use models::{FilterCatalog, FilterInfo, FilteredImage, PhotoArgs, PhotoRecord, PhotoSource};
