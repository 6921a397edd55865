//! 标签与字段选择器
//!
//! 提供 Kubernetes 风格的标签选择器解析与匹配、列表过滤使用的简化标签匹配，
//! 以及基于对象 JSON 路径的字段选择器。

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;

/// 标签集合
pub type Labels = BTreeMap<String, String>;

#[derive(Clone, Debug, Eq, PartialEq)]
enum Operator {
    Equals(String),
    NotEquals(String),
    In(Vec<String>),
    NotIn(Vec<String>),
    Exists,
    NotExists,
}

/// 单条标签约束
#[derive(Clone, Debug, Eq, PartialEq)]
struct Requirement {
    key: String,
    operator: Operator,
}

impl Requirement {
    fn new(key: impl Into<String>, operator: Operator) -> Self {
        Self {
            key: key.into(),
            operator,
        }
    }

    fn matches(&self, labels: &Labels) -> bool {
        let actual = labels.get(&self.key);
        match &self.operator {
            Operator::Equals(expected) => actual == Some(expected),
            Operator::NotEquals(expected) => actual != Some(expected),
            Operator::In(allowed) => actual
                .map(|value| allowed.iter().any(|candidate| candidate == value))
                .unwrap_or(false),
            Operator::NotIn(disallowed) => actual
                .map(|value| !disallowed.iter().any(|candidate| candidate == value))
                .unwrap_or(true),
            Operator::Exists => actual.is_some(),
            Operator::NotExists => actual.is_none(),
        }
    }
}

/// 标签选择器，所有约束同时满足才算匹配
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    /// 解析选择器字符串，空字符串匹配一切
    pub fn parse(raw: &str) -> Result<Self> {
        let mut requirements = Vec::new();
        for expr in split_selector_terms(raw) {
            if expr.trim().is_empty() {
                continue;
            }
            requirements.push(parse_requirement(expr).map_err(Error::BadRequest)?);
        }
        Ok(Self { requirements })
    }

    /// 是否为空选择器
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// 判断标签集合是否满足选择器
    pub fn matches(&self, labels: &Labels) -> bool {
        self.requirements
            .iter()
            .all(|requirement| requirement.matches(labels))
    }
}

fn parse_requirement(expr: &str) -> std::result::Result<Requirement, String> {
    let trimmed = expr.trim();

    if let Some(key) = trimmed.strip_prefix('!') {
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("标签选择器 '{}' 缺少键", expr));
        }
        return Ok(Requirement::new(key, Operator::NotExists));
    }

    if let Some(requirement) = parse_set_requirement(trimmed)? {
        return Ok(requirement);
    }

    if let Some((key, value)) = trimmed.split_once("!=") {
        return equality(expr, key, value, false);
    }
    if let Some((key, value)) = trimmed.split_once("==") {
        return equality(expr, key, value, true);
    }
    if let Some((key, value)) = trimmed.split_once('=') {
        return equality(expr, key, value, true);
    }

    if trimmed.contains(char::is_whitespace) {
        return Err(format!("标签选择器 '{}' 缺少操作符", expr));
    }
    Ok(Requirement::new(trimmed, Operator::Exists))
}

fn equality(
    expr: &str,
    key: &str,
    value: &str,
    equals: bool,
) -> std::result::Result<Requirement, String> {
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("标签选择器 '{}' 缺少键", expr));
    }
    let value = value.trim().to_string();
    let operator = if equals {
        Operator::Equals(value)
    } else {
        Operator::NotEquals(value)
    };
    Ok(Requirement::new(key, operator))
}

fn parse_set_requirement(expr: &str) -> std::result::Result<Option<Requirement>, String> {
    let Some(start) = expr.find('(') else {
        return Ok(None);
    };
    let Some(end) = expr.rfind(')') else {
        return Err(format!("标签选择器 '{}' 缺少右括号", expr));
    };
    if end < start || !expr[end + 1..].trim().is_empty() {
        return Err(format!("标签选择器 '{}' 括号不匹配", expr));
    }

    let head: Vec<&str> = expr[..start].split_whitespace().collect();
    let [key, operator] = head.as_slice() else {
        return Err(format!("标签选择器 '{}' 应为 '<键> <操作符> (...)'", expr));
    };

    let values: Vec<String> = expr[start + 1..end]
        .split(',')
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect();

    match *operator {
        "in" => Ok(Some(Requirement::new(*key, Operator::In(values)))),
        "notin" => Ok(Some(Requirement::new(*key, Operator::NotIn(values)))),
        other => Err(format!("标签选择器不支持操作符 '{}'", other)),
    }
}

/// 按逗号切分选择器，括号内的逗号不切分
fn split_selector_terms(raw: &str) -> Vec<&str> {
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (index, ch) in raw.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                terms.push(&raw[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    terms.push(&raw[start..]);
    terms
}

/// 列表过滤使用的简化标签匹配
///
/// 支持 `key`（存在）、`key=value` 与 `key!=value` 三种写法，
/// `key!=` 表示键存在且值非空。
pub fn label_match(labels: &Labels, filter: &str) -> bool {
    let (key, value, opposite) = match filter.split_once('=') {
        Some((key, value)) => match key.strip_suffix('!') {
            Some(key) => (key, value, true),
            None => (key, value, false),
        },
        None => (filter, "*", false),
    };

    match labels.get(key) {
        Some(actual) if opposite => actual != value,
        Some(actual) => value == "*" || actual == value,
        None => false,
    }
}

/// 将仅含等值约束的选择器转换为标签集合
pub fn labels_from_selector(raw: &str) -> Result<Labels> {
    let mut labels = Labels::new();
    for term in raw.split(',') {
        let term = term.trim();
        if term.is_empty() {
            continue;
        }
        let (key, value) = term
            .split_once("==")
            .or_else(|| term.split_once('='))
            .ok_or_else(|| Error::BadRequest(format!("无效的标签选择器: {}", term)))?;
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() || key.ends_with('!') || value.contains('=') {
            return Err(Error::BadRequest(format!("无效的标签选择器: {}", term)));
        }
        labels.insert(key.to_string(), value.to_string());
    }
    Ok(labels)
}

/// 合并两个标签集合，`extra` 中的值覆盖 `base`
pub fn merge_labels(base: Labels, extra: &Labels) -> Labels {
    let mut merged = base;
    for (key, value) in extra {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// 将标签集合格式化为选择器字符串，键按字典序排列
pub fn labels_to_selector(labels: &Labels) -> String {
    labels
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(",")
}

/// 字段选择器，按对象序列化后的 JSON 路径比较
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldSelector {
    terms: Vec<(String, String, bool)>,
}

impl FieldSelector {
    /// 解析 `a.b=c,d!=e` 形式的字段选择器
    pub fn parse(raw: &str) -> Result<Self> {
        let mut terms = Vec::new();
        for term in raw.split(',') {
            let term = term.trim();
            if term.is_empty() {
                continue;
            }
            let (path, value, equals) = if let Some((path, value)) = term.split_once("!=") {
                (path, value, false)
            } else if let Some((path, value)) = term.split_once("==") {
                (path, value, true)
            } else if let Some((path, value)) = term.split_once('=') {
                (path, value, true)
            } else {
                return Err(Error::BadRequest(format!("无效的字段选择器: {}", term)));
            };
            let path = path.trim();
            if path.is_empty() {
                return Err(Error::BadRequest(format!("字段选择器 '{}' 缺少字段", term)));
            }
            terms.push((path.to_string(), value.trim().to_string(), equals));
        }
        Ok(Self { terms })
    }

    /// 判断对象是否满足所有字段约束，缺失字段按空字符串处理
    pub fn matches(&self, object: &Value) -> bool {
        self.terms.iter().all(|(path, expected, equals)| {
            let actual = lookup_field(object, path);
            (actual == *expected) == *equals
        })
    }
}

fn lookup_field(object: &Value, path: &str) -> String {
    let mut current = object;
    for segment in path.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return String::new(),
        }
    }
    match current {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
