//! 错误处理模块
//!
//! 该模块提供 ImagineKube 项目的统一错误类型，资源查询、配置加载与
//! 上游服务调用的错误都归并到这里，再由 HTTP 层转换为状态码。

use thiserror::Error;

/// ImagineKube 统一错误类型
#[derive(Error, Debug)]
pub enum Error {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 资源不存在
    #[error("{resource} \"{name}\" 不存在")]
    NotFound {
        /// 资源类型
        resource: String,
        /// 资源名称
        name: String,
    },

    /// 资源类型未注册
    #[error("不支持的资源类型: {0}")]
    ResourceNotSupported(String),

    /// 请求参数错误
    #[error("请求参数错误: {0}")]
    BadRequest(String),

    /// 无权访问
    #[error("禁止访问: {0}")]
    Forbidden(String),

    /// Kubernetes API 错误
    #[error("Kubernetes API 错误: {0}")]
    Kubernetes(String),

    /// 上游服务错误
    #[error("上游服务错误: {0}")]
    Upstream(String),

    /// JSON 错误
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// 创建资源不存在错误
    pub fn not_found(resource: impl Into<String>, name: impl Into<String>) -> Self {
        Error::NotFound {
            resource: resource.into(),
            name: name.into(),
        }
    }

    /// 是否为资源不存在错误
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

/// ImagineKube 结果类型别名
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = Error::not_found("workspaces", "demo");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "workspaces \"demo\" 不存在");
    }

    #[test]
    fn test_messages_by_kind() {
        assert_eq!(Error::Config("x".to_string()).to_string(), "配置错误: x");
        assert_eq!(
            Error::ResourceNotSupported("widgets".to_string()).to_string(),
            "不支持的资源类型: widgets"
        );
        assert_eq!(Error::Upstream("x".to_string()).to_string(), "上游服务错误: x");
    }

    #[test]
    fn test_json_error_conversion() {
        let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: Error = parsed.unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
        assert!(!err.is_not_found());
    }
}
