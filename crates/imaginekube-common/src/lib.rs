//! ImagineKube Common - 跨模块共享工具与数据结构
//!
//! 该模块提供 ImagineKube 项目中各组件共享的数据结构、错误处理和工具函数。
//! 包括资源类型标识、列表查询模型、标签/字段选择器以及统一的错误处理机制。

pub mod constants;
pub mod error;
pub mod models;
pub mod selector;

/// 重新导出常用类型，方便使用
pub use error::Error;
pub use error::Result;
pub use models::api::ListResult;
pub use models::query::{Pagination, Query};
pub use models::schema::{GroupVersion, GroupVersionResource};
pub use selector::{FieldSelector, LabelSelector, Labels};
