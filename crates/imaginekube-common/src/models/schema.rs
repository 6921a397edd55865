//! 资源类型标识
//!
//! GroupVersion 与 GroupVersionResource，用于在资源注册表中定位资源类型。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// API 组与版本
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupVersion {
    /// API 组，核心组为空字符串
    pub group: String,
    /// 版本
    pub version: String,
}

impl GroupVersion {
    /// 创建新的 GroupVersion
    pub fn new(group: &str, version: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
        }
    }

    /// 为该组版本附加资源名
    pub fn with_resource(&self, resource: &str) -> GroupVersionResource {
        GroupVersionResource::new(&self.group, &self.version, resource)
    }

    /// 对象中的 apiVersion 字段值
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for GroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.api_version())
    }
}

/// 资源类型的唯一标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupVersionResource {
    /// API 组
    pub group: String,
    /// 版本
    pub version: String,
    /// 资源复数名
    pub resource: String,
}

impl GroupVersionResource {
    /// 创建新的 GroupVersionResource
    pub fn new(group: &str, version: &str, resource: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            resource: resource.to_string(),
        }
    }

    /// 所属组版本
    pub fn group_version(&self) -> GroupVersion {
        GroupVersion::new(&self.group, &self.version)
    }
}

impl fmt::Display for GroupVersionResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group_version(), self.resource)
    }
}

impl FromStr for GroupVersionResource {
    type Err = Error;

    /// 解析 `group/version/resource` 或核心组的 `version/resource`
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [version, resource] if !version.is_empty() && !resource.is_empty() => {
                Ok(Self::new("", version, resource))
            }
            [group, version, resource]
                if !group.is_empty() && !version.is_empty() && !resource.is_empty() =>
            {
                Ok(Self::new(group, version, resource))
            }
            _ => Err(Error::BadRequest(format!("无效的资源标识: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let core = GroupVersionResource::new("", "v1", "pods");
        assert_eq!(core.to_string(), "v1/pods");

        let apps = GroupVersion::new("apps", "v1").with_resource("deployments");
        assert_eq!(apps.to_string(), "apps/v1/deployments");
        assert_eq!(apps.group_version().api_version(), "apps/v1");
    }

    #[test]
    fn test_from_str() {
        let gvr: GroupVersionResource = "tenant.imaginekube.com/v1alpha1/workspaces".parse().unwrap();
        assert_eq!(gvr.group, "tenant.imaginekube.com");
        assert_eq!(gvr.resource, "workspaces");

        let core: GroupVersionResource = "v1/namespaces".parse().unwrap();
        assert!(core.group.is_empty());

        assert!("namespaces".parse::<GroupVersionResource>().is_err());
        assert!("a/b/c/d".parse::<GroupVersionResource>().is_err());
    }
}
