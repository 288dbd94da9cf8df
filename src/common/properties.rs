use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// 事件属性值，仅允许布尔、数字、字符串三种类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

pub type Properties = BTreeMap<String, PropertyValue>;

/// 属性转换失败的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertiesError {
    NotAnObject,
    UnsupportedValue { key: String },
}

impl fmt::Display for PropertiesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "properties must be a json object"),
            Self::UnsupportedValue { key } => {
                write!(f, "property '{}' must be a boolean, number or string", key)
            }
        }
    }
}

impl std::error::Error for PropertiesError {}

/// 将请求中的 `properties` 对象展开为扁平属性表
///
/// 嵌套对象、数组、null 均视为非法，整个请求被拒绝。
pub fn properties_from_json(value: &Value) -> Result<Properties, PropertiesError> {
    let object = value.as_object().ok_or(PropertiesError::NotAnObject)?;

    let mut properties = Properties::new();
    for (key, item) in object {
        let converted = match item {
            Value::Bool(b) => PropertyValue::Bool(*b),
            Value::Number(n) => match n.as_f64() {
                Some(f) => PropertyValue::Number(f),
                None => {
                    return Err(PropertiesError::UnsupportedValue { key: key.clone() });
                }
            },
            Value::String(s) => PropertyValue::String(s.clone()),
            Value::Null | Value::Array(_) | Value::Object(_) => {
                return Err(PropertiesError::UnsupportedValue { key: key.clone() });
            }
        };
        properties.insert(key.clone(), converted);
    }

    Ok(properties)
}
