use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::FaceError;

/// 服务目录中的单个滤镜
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterInfo {
    pub id: String,
    #[serde(default)]
    pub is_paid: bool,
    /// 服务端仅支持裁剪模式
    #[serde(default)]
    pub only_cropped: bool,
}

/// 随上传响应返回的滤镜目录
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterCatalog {
    entries: Vec<FilterInfo>,
}

impl FilterCatalog {
    pub fn new(entries: Vec<FilterInfo>) -> Self {
        Self { entries }
    }

    /// 从上传响应 JSON 中提取 `filters` 字段。
    ///
    /// 逐条解析：格式不符的条目被跳过，其余条目保留；`filters` 缺失或不是数组时返回空目录。
    pub(crate) fn from_response(body: &serde_json::Value) -> Self {
        let Some(items) = body.get("filters").and_then(serde_json::Value::as_array) else {
            return Self::default();
        };
        let entries = items
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| {
                match serde_json::from_value::<FilterInfo>(item.clone()) {
                    Ok(info) => Some(info),
                    Err(e) => {
                        tracing::warn!("跳过无法解析的滤镜条目 #{}: {} ({})", idx, item, e);
                        None
                    }
                }
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[FilterInfo] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 可用（非付费）滤镜标识
    pub fn free_filters(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|f| !f.is_paid)
            .map(|f| f.id.as_str())
            .collect()
    }

    /// 是否为仅裁剪滤镜。按标识精确匹配，不做任何规范化；付费滤镜不在此列。
    pub fn is_crop_only(&self, filter_name: &str) -> bool {
        self.entries
            .iter()
            .any(|f| f.id == filter_name && f.only_cropped && !f.is_paid)
    }
}

/// 句柄的序列化形式，用于在进程间传递已上传的图片
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhotoRecord {
    pub code: String,
    pub device_id: String,
}

/// 滤镜渲染结果
#[derive(Debug, Clone)]
pub struct FilteredImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    /// 实际发出的 cropped 参数（可能被仅裁剪策略强制为 true）
    pub cropped: bool,
}

impl FilteredImage {
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
    }
}

/// 构造句柄的松散参数集合：图片字节、URL、或 code + device_id 三选一
#[derive(Debug, Clone, Default)]
pub struct PhotoArgs {
    pub bytes: Option<Vec<u8>>,
    pub url: Option<String>,
    pub code: Option<String>,
    pub device_id: Option<String>,
}

/// 校验通过的图片来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoSource {
    Bytes(Vec<u8>),
    Url(Url),
    Existing { code: String, device_id: String },
}

impl PhotoArgs {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Some(bytes.into()),
            ..Self::default()
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn existing(code: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            device_id: Some(device_id.into()),
            ..Self::default()
        }
    }

    /// 校验参数组合，空值视为未提供
    pub fn into_source(self) -> Result<PhotoSource, FaceError> {
        let bytes = self.bytes.filter(|b| !b.is_empty());
        let url = self.url.filter(|u| !u.is_empty());
        let code = self.code.filter(|c| !c.is_empty());
        let device_id = self.device_id.filter(|d| !d.is_empty());

        match (bytes, url, code, device_id) {
            (Some(bytes), None, None, None) => Ok(PhotoSource::Bytes(bytes)),
            (None, Some(url), None, None) => Url::parse(&url)
                .map(PhotoSource::Url)
                .map_err(|e| FaceError::InvalidUrl(format!("{url}: {e}"))),
            (None, None, Some(code), Some(device_id)) => {
                Ok(PhotoSource::Existing { code, device_id })
            }
            (bytes, url, code, device_id) => Err(FaceError::InvalidArgumentSet(format!(
                "请提供 bytes、url 或 code + device_id 之一 (bytes={}, url={}, code={}, device_id={})",
                bytes.is_some(),
                url.is_some(),
                code.is_some(),
                device_id.is_some()
            ))),
        }
    }
}
