use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use super::properties::{Properties, PropertyValue};

pub const LIB_NAME: &str = "Rust";
pub const LIB_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SIGNUP_EVENT: &str = "$SignUp";

/// 上报记录类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Track,
    ProfileSet,
    ProfileSetOnce,
    TrackSignup,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Track => "track",
            RecordType::ProfileSet => "profile_set",
            RecordType::ProfileSetOnce => "profile_set_once",
            RecordType::TrackSignup => "track_signup",
        }
    }

    /// 事件类记录（track / track_signup）需要携带 `event` 字段
    pub fn is_event(&self) -> bool {
        matches!(self, RecordType::Track | RecordType::TrackSignup)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibInfo {
    #[serde(rename = "$lib")]
    pub lib: String,
    #[serde(rename = "$lib_version")]
    pub lib_version: String,
    #[serde(rename = "$lib_method")]
    pub lib_method: String,
}

impl Default for LibInfo {
    fn default() -> Self {
        Self {
            lib: LIB_NAME.to_string(),
            lib_version: LIB_VERSION.to_string(),
            lib_method: "code".to_string(),
        }
    }
}

/// 交给 Consumer 的单条上报记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub time: u64,
    pub distinct_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    pub properties: Properties,
    pub lib: LibInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(rename = "_track_id")]
    pub track_id: u32,
}

impl EventRecord {
    pub fn new(
        record_type: RecordType,
        distinct_id: &str,
        event: Option<&str>,
        mut properties: Properties,
        is_login_id: bool,
    ) -> Self {
        if record_type.is_event() {
            properties.insert("$lib".into(), PropertyValue::from(LIB_NAME));
            properties.insert("$lib_version".into(), PropertyValue::from(LIB_VERSION));
        }
        if is_login_id {
            properties.insert("$is_login_id".into(), PropertyValue::Bool(true));
        }

        Self {
            record_type,
            time: now_millis(),
            distinct_id: distinct_id.to_string(),
            original_id: None,
            event: event.map(str::to_string),
            properties,
            lib: LibInfo::default(),
            project: None,
            track_id: (Uuid::new_v4().as_u128() as u32) >> 1,
        }
    }

    pub fn with_original_id(mut self, original_id: &str) -> Self {
        self.original_id = Some(original_id.to_string());
        self
    }

    pub fn with_project(mut self, project: Option<&str>) -> Self {
        self.project = project.filter(|p| !p.is_empty()).map(str::to_string);
        self
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_record_carries_lib_properties() {
        let mut properties = Properties::new();
        properties.insert("plan".into(), "pro".into());

        let record = EventRecord::new(RecordType::Track, "u1", Some("login"), properties, true)
            .with_project(Some("default"));
        let encoded = serde_json::to_value(&record).expect("encode");

        assert_eq!(encoded["type"], "track");
        assert_eq!(encoded["event"], "login");
        assert_eq!(encoded["project"], "default");
        assert_eq!(encoded["properties"]["plan"], "pro");
        assert_eq!(encoded["properties"]["$lib"], LIB_NAME);
        assert_eq!(encoded["properties"]["$is_login_id"], true);
        assert_eq!(encoded["lib"]["$lib_method"], "code");
        assert!(encoded.get("original_id").is_none());
    }

    #[test]
    fn record_type_names_match_wire_format() {
        for record_type in [
            RecordType::Track,
            RecordType::ProfileSet,
            RecordType::ProfileSetOnce,
            RecordType::TrackSignup,
        ] {
            let encoded = serde_json::to_value(record_type).expect("encode");
            assert_eq!(encoded, record_type.as_str());
        }
    }

    #[test]
    fn profile_record_has_no_event_fields() {
        let empty = Properties::new();
        let record = EventRecord::new(RecordType::ProfileSet, "u1", None, empty, false);
        let encoded = serde_json::to_value(record.with_project(Some(""))).expect("encode");

        assert_eq!(encoded["type"], "profile_set");
        assert!(encoded.get("event").is_none());
        assert!(encoded.get("project").is_none());
        assert!(encoded["properties"].as_object().expect("object").is_empty());
    }
}
