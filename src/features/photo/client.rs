use reqwest::Url;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};

use crate::config::FaceConfig;
use crate::error::{FaceError, ServiceErrorCode};
use crate::http::{ReqwestTransport, Transport, TransportRequest, TransportResponse};

/// multipart 上传使用的字段名
const UPLOAD_FIELD: &str = "file";

/// 面向某一代服务 API 的客户端：已校验的配置 + 传输实现。
///
/// 不保存任何与设备相关的状态，请求头每次调用重新构建，
/// 因此多个句柄可以安全地共享同一个客户端并发请求。
pub struct FaceClient<T: Transport = ReqwestTransport> {
    config: FaceConfig,
    endpoint: Url,
    transport: T,
}

impl FaceClient<ReqwestTransport> {
    /// 使用默认 reqwest 传输；配置了超时时使用独立 Client，否则复用全局 Client
    pub fn new(config: FaceConfig) -> Result<Self, FaceError> {
        let transport = match config.timeout() {
            Some(timeout) => ReqwestTransport::with_timeout(timeout)?,
            None => ReqwestTransport::shared()?,
        };
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> FaceClient<T> {
    pub fn with_transport(config: FaceConfig, transport: T) -> Result<Self, FaceError> {
        let mut endpoint = config.validate()?;
        if let Ok(mut segments) = endpoint.path_segments_mut() {
            segments.pop_if_empty();
        }
        Ok(Self {
            config,
            endpoint,
            transport,
        })
    }

    pub fn config(&self) -> &FaceConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 上传端点
    pub fn upload_url(&self) -> Url {
        self.endpoint.clone()
    }

    /// 滤镜端点：`{prefix}/{code}/filters/{filter}?cropped={0|1}`，路径段按需百分号编码
    pub fn filter_url(&self, code: &str, filter_name: &str, cropped: bool) -> Result<Url, FaceError> {
        let mut url = self.endpoint.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| FaceError::Config(format!("base_url `{}` 不是层级 URL", self.endpoint)))?;
            segments.push(code).push("filters").push(filter_name);
        }
        url.query_pairs_mut()
            .append_pair("cropped", if cropped { "1" } else { "0" });
        Ok(url)
    }

    /// 为单次请求构建独立的请求头
    pub fn request_headers(&self, device_id: &str) -> Result<HeaderMap, FaceError> {
        let user_agent = HeaderValue::from_str(&self.config.user_agent)
            .map_err(|_| FaceError::Config(format!("无效的 user_agent: {}", self.config.user_agent)))?;
        let device_header = HeaderName::from_bytes(self.config.device_id_header.as_bytes())
            .map_err(|_| {
                FaceError::Config(format!("无效的请求头名称: {}", self.config.device_id_header))
            })?;
        let device_value = HeaderValue::from_str(device_id)
            .map_err(|_| FaceError::InvalidArgumentSet(format!("无效的 device_id: {device_id:?}")))?;

        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(USER_AGENT, user_agent);
        headers.insert(device_header, device_value);
        Ok(headers)
    }

    /// 读取服务错误码；空值视为未返回
    pub fn error_code(&self, resp: &TransportResponse) -> Option<ServiceErrorCode> {
        resp.header_str(&self.config.error_code_header)
            .filter(|raw| !raw.is_empty())
            .map(ServiceErrorCode::parse)
    }

    /// 下载 URL 内容作为待上传图片；传输错误原样上抛
    pub(crate) async fn fetch_source(&self, url: Url) -> Result<Vec<u8>, FaceError> {
        tracing::debug!("下载图片来源: {}", url);
        let resp = self
            .transport
            .execute(TransportRequest::get(url.clone(), HeaderMap::new()))
            .await?;
        if !resp.status.is_success() {
            // 与服务行为保持一致：内容照常上传，由服务判定是否为图片
            tracing::warn!("图片来源 {} 返回 HTTP {}", url, resp.status);
        }
        Ok(resp.body)
    }

    pub(crate) async fn upload(
        &self,
        device_id: &str,
        bytes: Vec<u8>,
    ) -> Result<TransportResponse, FaceError> {
        let headers = self.request_headers(device_id)?;
        tracing::debug!(
            "上传图片: endpoint = {}, device_id = {}, size = {}",
            self.endpoint,
            device_id,
            bytes.len()
        );
        let request = TransportRequest::post_file(self.upload_url(), headers, UPLOAD_FIELD, bytes);
        Ok(self.transport.execute(request).await?)
    }

    pub(crate) async fn get_filter(
        &self,
        code: &str,
        device_id: &str,
        filter_name: &str,
        cropped: bool,
    ) -> Result<TransportResponse, FaceError> {
        let url = self.filter_url(code, filter_name, cropped)?;
        let headers = self.request_headers(device_id)?;
        tracing::debug!(
            "应用滤镜: code = {}, filter = {}, cropped = {}",
            code,
            filter_name,
            cropped
        );
        Ok(self
            .transport
            .execute(TransportRequest::get(url, headers))
            .await?)
    }
}
