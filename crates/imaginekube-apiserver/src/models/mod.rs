//! 业务模型
//!
//! 在资源查询之上实现租户与应用商店的读写逻辑。

pub mod openpitrix;
pub mod tenant;

use imaginekube_common::Error;

/// 将 Kubernetes 客户端错误转换为统一错误类型
pub(crate) fn kube_error(resource: &str, name: &str, err: kube::Error) -> Error {
    match err {
        kube::Error::Api(response) => match response.code {
            404 => Error::not_found(resource, name),
            403 => Error::Forbidden(response.message),
            400 | 409 | 422 => Error::BadRequest(response.message),
            _ => Error::Kubernetes(response.message),
        },
        other => Error::Kubernetes(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::error::ErrorResponse;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("code {}", code),
            reason: String::new(),
            code,
        })
    }

    #[test]
    fn test_kube_error() {
        assert!(kube_error("workspacetemplates", "demo", api_error(404)).is_not_found());
        assert!(matches!(
            kube_error("workspacetemplates", "demo", api_error(409)),
            Error::BadRequest(_)
        ));
        assert!(matches!(
            kube_error("workspacetemplates", "demo", api_error(403)),
            Error::Forbidden(_)
        ));
        assert!(matches!(
            kube_error("workspacetemplates", "demo", api_error(500)),
            Error::Kubernetes(_)
        ));
    }
}
