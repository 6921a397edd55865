//! API 响应模型

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 分页列表结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult {
    /// 当前页对象
    pub items: Vec<Value>,
    /// 过滤后的对象总数
    pub total_items: usize,
}

impl ListResult {
    /// 创建新的列表结果
    pub fn new(items: Vec<Value>, total_items: usize) -> Self {
        Self { items, total_items }
    }

    /// 当前页的对象名称，便于断言与日志
    pub fn names(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| item.pointer("/metadata/name").and_then(Value::as_str))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_list_result() {
        let result = ListResult::new(vec![json!({"metadata": {"name": "a"}})], 3);
        let encoded = serde_json::to_value(&result).unwrap();
        assert_eq!(encoded["totalItems"], 3);
        assert_eq!(result.names(), vec!["a"]);
    }
}
