use once_cell::sync::OnceCell;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, StatusCode, Url};
use std::future::Future;
use std::time::Duration;

use crate::error::TransportError;

/// 全局复用的 HTTP Client（统一连接池/Keep-Alive），避免每次请求重复创建。
///
/// 说明：
/// - 仅共享连接池，不共享任何请求头；请求头每次调用独立构建。
/// - `Client` 本身是线程安全的，适合全局复用。
static CLIENT_DEFAULT: OnceCell<Client> = OnceCell::new();

/// 默认配置的 HTTP Client（不额外设置 timeout）。
pub fn client_default() -> Result<&'static Client, reqwest::Error> {
    CLIENT_DEFAULT.get_or_try_init(|| Client::builder().build())
}

/// 请求体
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    /// 单文件 multipart 上传
    Multipart {
        field: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

/// 交给传输层执行的一次请求
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl TransportRequest {
    pub fn get(url: Url, headers: HeaderMap) -> Self {
        Self {
            method: Method::GET,
            url,
            headers,
            body: RequestBody::Empty,
        }
    }

    pub fn post_file(url: Url, headers: HeaderMap, field: &str, bytes: Vec<u8>) -> Self {
        Self {
            method: Method::POST,
            url,
            headers,
            body: RequestBody::Multipart {
                field: field.to_string(),
                file_name: field.to_string(),
                bytes,
            },
        }
    }
}

/// 传输层返回的原始响应
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// 读取字符串形式的响应头；不存在或非 ASCII 时返回 None
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

/// HTTP 传输协作方。
///
/// 核心协议只依赖这个契约；连接池、TLS、套接字级重试均由实现方负责。
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

/// 基于 reqwest 的默认传输实现
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// 复用全局共享的 Client
    pub fn shared() -> Result<Self, TransportError> {
        Ok(Self {
            client: client_default()?.clone(),
        })
    }

    /// 使用独立的带超时 Client
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn execute(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send {
        let builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);

        async move {
            let builder = match request.body {
                RequestBody::Empty => builder,
                RequestBody::Multipart {
                    field,
                    file_name,
                    bytes,
                } => {
                    let part = Part::bytes(bytes).file_name(file_name);
                    builder.multipart(Form::new().part(field, part))
                }
            };

            let resp = builder.send().await?;
            let status = resp.status();
            let headers = resp.headers().clone();
            let body = resp.bytes().await?.to_vec();

            Ok(TransportResponse {
                status,
                headers,
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RequestBody, TransportRequest, TransportResponse};
    use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
    use reqwest::{Method, StatusCode, Url};

    #[test]
    fn post_file_uses_field_as_file_name() {
        let url = Url::parse("http://example.invalid/photos").expect("url");
        let req = TransportRequest::post_file(url, HeaderMap::new(), "file", vec![1, 2, 3]);
        assert_eq!(req.method, Method::POST);
        assert_eq!(
            req.body,
            RequestBody::Multipart {
                field: "file".to_string(),
                file_name: "file".to_string(),
                bytes: vec![1, 2, 3],
            }
        );
    }

    #[test]
    fn response_header_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("x-faceapp-errorcode", HeaderValue::from_static("bad_filter_id"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/jpeg"));
        let resp = TransportResponse {
            status: StatusCode::OK,
            headers,
            body: Vec::new(),
        };
        assert_eq!(resp.header_str("X-FaceApp-ErrorCode"), Some("bad_filter_id"));
        assert_eq!(resp.content_type(), Some("image/jpeg"));
        assert_eq!(resp.header_str("X-Missing"), None);
    }
}
