//! 数据模型模块
//!
//! 该模块定义了 ImagineKube 各组件共享的数据模型，包括资源类型标识、
//! 列表查询条件与分页列表结果。

pub mod api;
pub mod query;
pub mod schema;
