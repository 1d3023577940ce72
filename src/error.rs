use thiserror::Error;

/// 传输层错误（由 HTTP 协作方产生，按原样向上抛出）
#[derive(Error, Debug)]
pub enum TransportError {
    /// reqwest 请求错误
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// 其它传输实现产生的错误
    #[error("{0}")]
    Other(String),
}

/// 客户端统一错误类型
#[derive(Error, Debug)]
pub enum FaceError {
    /// 构造参数组合无效（未发生任何网络请求）
    #[error("参数组合无效: {0}")]
    InvalidArgumentSet(String),

    /// 图片来源 URL 无法解析
    #[error("无效的 URL: {0}")]
    InvalidUrl(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 服务无法解码该图片
    #[error("图片格式不被服务接受")]
    BadImageType,

    /// 图片中未检测到人脸
    #[error("图片中未检测到人脸")]
    NoFacesDetected,

    /// 服务不认识该滤镜标识
    #[error("滤镜标识无效: {0}")]
    BadFilterIdentifier(String),

    /// 未映射的服务错误码（原样保留）
    #[error("服务错误: {0}")]
    ServiceError(String),

    /// 服务既未返回结果，也未返回错误码
    #[error("意外的服务响应: HTTP {status} - {detail}")]
    UnexpectedResponse { status: u16, detail: String },

    /// 序列化记录解析失败
    #[error("记录解析错误: {0}")]
    Parse(String),

    /// 传输层错误
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// 服务通过错误头返回的机器可读错误码
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceErrorCode {
    /// `photo_bad_type`
    PhotoBadType,
    /// `photo_no_faces`
    PhotoNoFaces,
    /// `bad_filter_id`
    BadFilterId,
    /// 其它未知错误码
    Other(String),
}

impl ServiceErrorCode {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "photo_bad_type" => Self::PhotoBadType,
            "photo_no_faces" => Self::PhotoNoFaces,
            "bad_filter_id" => Self::BadFilterId,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::PhotoBadType => "photo_bad_type",
            Self::PhotoNoFaces => "photo_no_faces",
            Self::BadFilterId => "bad_filter_id",
            Self::Other(raw) => raw,
        }
    }

    /// 上传阶段的错误映射：仅识别图片类型与人脸检测两类错误。
    pub fn into_upload_error(self) -> FaceError {
        match self {
            Self::PhotoBadType => FaceError::BadImageType,
            Self::PhotoNoFaces => FaceError::NoFacesDetected,
            other => FaceError::ServiceError(other.as_str().to_string()),
        }
    }

    /// 滤镜阶段的错误映射：仅识别滤镜标识错误。
    pub fn into_filter_error(self, filter_name: &str) -> FaceError {
        match self {
            Self::BadFilterId => FaceError::BadFilterIdentifier(filter_name.to_string()),
            other => FaceError::ServiceError(other.as_str().to_string()),
        }
    }
}

impl FaceError {
    /// 是否属于“调用方输入有误”类错误（图片或滤镜需要更换，重试无意义）
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            FaceError::InvalidArgumentSet(_)
                | FaceError::InvalidUrl(_)
                | FaceError::BadImageType
                | FaceError::NoFacesDetected
                | FaceError::BadFilterIdentifier(_)
        )
    }
}

// =============== Error conversions for common external errors ===============

impl From<reqwest::Error> for FaceError {
    fn from(err: reqwest::Error) -> Self {
        FaceError::Transport(TransportError::Http(err))
    }
}

impl From<config::ConfigError> for FaceError {
    fn from(err: config::ConfigError) -> Self {
        FaceError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for FaceError {
    fn from(err: serde_json::Error) -> Self {
        FaceError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{FaceError, ServiceErrorCode, TransportError};

    #[test]
    fn upload_mapping_recognizes_image_errors_only() {
        assert!(matches!(
            ServiceErrorCode::parse("photo_bad_type").into_upload_error(),
            FaceError::BadImageType
        ));
        assert!(matches!(
            ServiceErrorCode::parse("photo_no_faces").into_upload_error(),
            FaceError::NoFacesDetected
        ));
        match ServiceErrorCode::parse("bad_filter_id").into_upload_error() {
            FaceError::ServiceError(raw) => assert_eq!(raw, "bad_filter_id"),
            other => panic!("expected ServiceError, got: {other:?}"),
        }
    }

    #[test]
    fn filter_mapping_keeps_unknown_token_verbatim() {
        match ServiceErrorCode::parse("bad_filter_id").into_filter_error("smile") {
            FaceError::BadFilterIdentifier(name) => assert_eq!(name, "smile"),
            other => panic!("expected BadFilterIdentifier, got: {other:?}"),
        }
        match ServiceErrorCode::parse("Rate_Limited ").into_filter_error("smile") {
            FaceError::ServiceError(raw) => assert_eq!(raw, "Rate_Limited "),
            other => panic!("expected ServiceError, got: {other:?}"),
        }
    }

    #[test]
    fn transport_error_display_is_not_wrapped() {
        let err: FaceError = TransportError::Other("connection reset".to_string()).into();
        assert_eq!(err.to_string(), "connection reset");
        assert!(!err.is_input_error());
    }

    #[test]
    fn input_errors_are_distinguished_from_service_errors() {
        assert!(FaceError::NoFacesDetected.is_input_error());
        assert!(FaceError::BadFilterIdentifier("x".into()).is_input_error());
        assert!(!FaceError::ServiceError("oops".into()).is_input_error());
    }
}
