use serde_json::{Map, Value};

/// 入站请求体的宽松读取视图
///
/// 字段存在即视为提供（包括 `null`）；非法 JSON 或非对象请求体视为空文档，
/// 由后续的必填校验给出错误码。
#[derive(Debug, Default)]
pub struct RequestDocument {
    fields: Map<String, Value>,
}

impl RequestDocument {
    /// 超出 f64 范围的数字（如 `1e400`）会使整个请求体解析失败，同样按空文档处理
    pub fn parse(raw: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(raw) {
            Ok(Value::Object(fields)) => Self { fields },
            _ => Self::default(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// 以文本方式读取字段：数字、布尔取其 JSON 文本，`null` 为空串
    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).map(value_as_text)
    }

    /// 以布尔方式读取字段
    pub fn flag(&self, field: &str) -> Option<bool> {
        self.get(field).map(value_as_flag)
    }
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_as_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.as_str(), "1" | "t" | "T" | "TRUE" | "true" | "True"),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_json_is_empty() {
        let doc = RequestDocument::parse(b"not json");
        assert!(!doc.contains("distinct_id"));

        let doc = RequestDocument::parse(b"[1,2,3]");
        assert!(!doc.contains("distinct_id"));
    }

    #[test]
    fn out_of_range_number_empties_document() {
        let doc = RequestDocument::parse(br#"{"distinct_id": 1e400, "event_type": "track"}"#);
        assert!(!doc.contains("distinct_id"));
        assert!(!doc.contains("event_type"));
    }

    #[test]
    fn null_counts_as_present() {
        let doc = RequestDocument::parse(br#"{"distinct_id": null}"#);
        assert!(doc.contains("distinct_id"));
        assert_eq!(doc.text("distinct_id").as_deref(), Some(""));
    }

    #[test]
    fn scalars_read_as_text() {
        let doc = RequestDocument::parse(br#"{"a": "u1", "b": 42, "c": true}"#);
        assert_eq!(doc.text("a").as_deref(), Some("u1"));
        assert_eq!(doc.text("b").as_deref(), Some("42"));
        assert_eq!(doc.text("c").as_deref(), Some("true"));
        assert_eq!(doc.text("missing"), None);
    }

    #[test]
    fn flags_are_lenient() {
        let doc = RequestDocument::parse(
            br#"{"a": true, "b": "true", "c": 1, "d": 0, "e": "no", "f": false}"#,
        );
        assert_eq!(doc.flag("a"), Some(true));
        assert_eq!(doc.flag("b"), Some(true));
        assert_eq!(doc.flag("c"), Some(true));
        assert_eq!(doc.flag("d"), Some(false));
        assert_eq!(doc.flag("e"), Some(false));
        assert_eq!(doc.flag("f"), Some(false));
    }
}
