use std::fmt;
use std::sync::Arc;

use reqwest::Url;
use serde_json::Value;

use super::client::FaceClient;
use super::models::{FilterCatalog, FilteredImage, PhotoArgs, PhotoRecord, PhotoSource};
use crate::device::{generate_device_id, is_valid_device_id};
use crate::error::FaceError;
use crate::http::{ReqwestTransport, Transport};

/// 上传响应体在错误信息中保留的最大长度
const RESPONSE_EXCERPT_LEN: usize = 200;

/// 远端服务上的一张已上传图片。
///
/// 句柄只存在“已绑定”一种可观察状态：`code` 与 `device_id` 均非空，且构造后不可更改。
/// 需要换图时请重新构造。句柄不持有需要显式释放的资源，远端图片的生命周期与之无关。
pub struct RemotePhoto<T: Transport = ReqwestTransport> {
    client: Arc<FaceClient<T>>,
    code: String,
    device_id: String,
    catalog: FilterCatalog,
    raw_response: Option<Value>,
}

impl<T: Transport> RemotePhoto<T> {
    /// 按参数集合构造：上传字节、下载 URL 后上传、或按 code + device_id 重建
    pub async fn open(client: Arc<FaceClient<T>>, args: PhotoArgs) -> Result<Self, FaceError> {
        match args.into_source()? {
            PhotoSource::Bytes(bytes) => Self::upload(client, bytes).await,
            PhotoSource::Url(url) => Self::upload_from(client, url).await,
            PhotoSource::Existing { code, device_id } => Self::from_parts(client, code, device_id),
        }
    }

    pub async fn upload_bytes(
        client: Arc<FaceClient<T>>,
        bytes: impl Into<Vec<u8>>,
    ) -> Result<Self, FaceError> {
        Self::open(client, PhotoArgs::from_bytes(bytes)).await
    }

    pub async fn upload_url(client: Arc<FaceClient<T>>, url: &str) -> Result<Self, FaceError> {
        Self::open(client, PhotoArgs::from_url(url)).await
    }

    /// 由已有的 code + device_id 重建句柄，不发起任何网络请求
    pub fn from_parts(
        client: Arc<FaceClient<T>>,
        code: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Result<Self, FaceError> {
        let code = code.into();
        let device_id = device_id.into();
        if code.is_empty() {
            return Err(FaceError::InvalidArgumentSet("code 不能为空".to_string()));
        }
        if !is_valid_device_id(&device_id) {
            return Err(FaceError::InvalidArgumentSet(format!(
                "无效的 device_id: {device_id:?}"
            )));
        }
        Ok(Self {
            client,
            code,
            device_id,
            catalog: FilterCatalog::default(),
            raw_response: None,
        })
    }

    pub fn from_record(client: Arc<FaceClient<T>>, record: PhotoRecord) -> Result<Self, FaceError> {
        Self::from_parts(client, record.code, record.device_id)
    }

    /// 解析 `to_json` 的输出；格式错误返回 `FaceError::Parse`
    pub fn from_json(client: Arc<FaceClient<T>>, json: &str) -> Result<Self, FaceError> {
        let record: PhotoRecord = serde_json::from_str(json)?;
        Self::from_record(client, record)
    }

    /// 为重建的句柄附加此前保存的滤镜目录
    pub fn with_catalog(mut self, catalog: FilterCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    async fn upload_from(client: Arc<FaceClient<T>>, url: Url) -> Result<Self, FaceError> {
        let bytes = client.fetch_source(url).await?;
        Self::upload(client, bytes).await
    }

    async fn upload(client: Arc<FaceClient<T>>, bytes: Vec<u8>) -> Result<Self, FaceError> {
        let device_id = generate_device_id();
        let resp = client.upload(&device_id, bytes).await?;

        // 失败响应不一定是 JSON，解析失败按“未返回 code”处理
        let body: Option<Value> = serde_json::from_slice(&resp.body).ok();
        let raw_code = body.as_ref().and_then(|v| v.get("code"));
        if let Some(raw) = raw_code.filter(|v| !v.is_string() && !v.is_null()) {
            tracing::debug!("上传响应中的 code 不是字符串，按未返回处理: {}", raw);
        }
        let code = raw_code
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        let Some(code) = code else {
            if let Some(err) = client.error_code(&resp) {
                tracing::debug!("上传被拒绝: error_code = {}", err.as_str());
                return Err(err.into_upload_error());
            }
            let text = String::from_utf8_lossy(&resp.body);
            let detail: String = text.chars().take(RESPONSE_EXCERPT_LEN).collect();
            return Err(FaceError::UnexpectedResponse {
                status: resp.status.as_u16(),
                detail,
            });
        };

        let catalog = body
            .as_ref()
            .map(FilterCatalog::from_response)
            .unwrap_or_default();
        tracing::info!(
            "图片上传成功: code = {}, 可用滤镜 {} 个",
            code,
            catalog.free_filters().len()
        );

        Ok(Self {
            client,
            code,
            device_id,
            catalog,
            raw_response: body,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn client(&self) -> &Arc<FaceClient<T>> {
        &self.client
    }

    /// 上传时捕获的滤镜目录；重建的句柄为空目录（除非通过 `with_catalog` 附加）
    pub fn catalog(&self) -> &FilterCatalog {
        &self.catalog
    }

    /// 可用（非付费）滤镜标识
    pub fn filters(&self) -> Vec<&str> {
        self.catalog.free_filters()
    }

    /// 上传时的原始响应体，仅用于调试
    pub fn raw_response(&self) -> Option<&Value> {
        self.raw_response.as_ref()
    }

    /// 对图片应用滤镜，返回渲染后的图片字节。
    ///
    /// 目录中标记为仅裁剪的免费滤镜会强制 `cropped = true`；付费滤镜沿用调用方的参数。
    /// 滤镜名按原样匹配；含空白字符的名称可能不被服务识别为仅裁剪滤镜。
    /// 服务错误立即返回，不做重试。
    pub async fn apply_filter(
        &self,
        filter_name: &str,
        cropped: bool,
    ) -> Result<FilteredImage, FaceError> {
        if filter_name.is_empty() {
            return Err(FaceError::InvalidArgumentSet("滤镜名不能为空".to_string()));
        }

        let cropped = cropped || self.catalog.is_crop_only(filter_name);
        let resp = self
            .client
            .get_filter(&self.code, &self.device_id, filter_name, cropped)
            .await?;

        if let Some(err) = self.client.error_code(&resp) {
            return Err(err.into_filter_error(filter_name));
        }
        if !resp.status.is_success() {
            return Err(FaceError::UnexpectedResponse {
                status: resp.status.as_u16(),
                detail: format!("滤镜 {filter_name} 未返回错误码"),
            });
        }

        let content_type = resp.content_type().map(str::to_string);
        Ok(FilteredImage {
            bytes: resp.body,
            content_type,
            cropped,
        })
    }

    pub fn record(&self) -> PhotoRecord {
        PhotoRecord {
            code: self.code.clone(),
            device_id: self.device_id.clone(),
        }
    }

    /// 导出为 `{"code": ..., "device_id": ...}`，便于上传/处理分离的进程间传递
    pub fn to_json(&self) -> Result<String, FaceError> {
        Ok(serde_json::to_string(&self.record())?)
    }
}

impl<T: Transport> Clone for RemotePhoto<T> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            code: self.code.clone(),
            device_id: self.device_id.clone(),
            catalog: self.catalog.clone(),
            raw_response: self.raw_response.clone(),
        }
    }
}

impl<T: Transport> fmt::Debug for RemotePhoto<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemotePhoto")
            .field("code", &self.code)
            .field("device_id", &self.device_id)
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> fmt::Display for RemotePhoto<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RemotePhoto#{}", self.code)
    }
}
