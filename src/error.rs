use std::collections::BTreeMap;
use std::error::Error as StdError;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// 调用外部天气接口失败时的统一错误
///
/// 未设置状态码时按 500 处理，参数表默认为空。
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ExternalServiceError {
    message: String,
    status_code: Option<StatusCode>,
    endpoint: String,
    parameters: BTreeMap<String, String>,
    #[source]
    cause: Option<BoxError>,
}

impl ExternalServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
            endpoint: String::new(),
            parameters: BTreeMap::new(),
            cause: None,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_parameters(mut self, parameters: BTreeMap<String, String>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        self.status_code
    }

    /// 响应时实际使用的状态码
    pub fn status(&self) -> StatusCode {
        self.status_code
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// 日志用的完整描述，包含状态码、地址和参数
    pub fn details(&self) -> String {
        let params = self
            .parameters
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        let mut out = format!(
            "{}, status: {}, endpoint: '{}', parameters: [{}]",
            self.message,
            self.status(),
            self.endpoint,
            params
        );
        if let Some(cause) = &self.cause {
            out.push_str(&format!(", cause: {}", cause));
        }
        out
    }
}

impl IntoResponse for ExternalServiceError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.message,
        )
            .into_response()
    }
}
