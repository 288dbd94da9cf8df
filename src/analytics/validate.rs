use anyhow::bail;
use regex::Regex;
use std::sync::OnceLock;

use crate::common::properties::{Properties, PropertyValue};

pub const MAX_DISTINCT_ID_LEN: usize = 255;
pub const MAX_STRING_VALUE_LEN: usize = 8192;

const RESERVED_KEYS: &[&str] = &[
    "distinct_id",
    "original_id",
    "time",
    "properties",
    "id",
    "first_id",
    "second_id",
    "users",
    "events",
    "event",
    "user_id",
    "date",
    "datetime",
];

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z_$][a-zA-Z0-9_$]{0,99}$").expect("key pattern is a valid regex")
    })
}

pub fn check_distinct_id(distinct_id: &str) -> anyhow::Result<()> {
    if distinct_id.is_empty() {
        bail!("property [distinct_id] can't be empty");
    }
    if distinct_id.len() > MAX_DISTINCT_ID_LEN {
        bail!(
            "the max length of property [distinct_id] is {}",
            MAX_DISTINCT_ID_LEN
        );
    }
    Ok(())
}

pub fn check_original_id(original_id: &str) -> anyhow::Result<()> {
    if original_id.is_empty() {
        bail!("property [original_id] can't be empty");
    }
    if original_id.len() > MAX_DISTINCT_ID_LEN {
        bail!(
            "the max length of property [original_id] is {}",
            MAX_DISTINCT_ID_LEN
        );
    }
    Ok(())
}

/// 事件名与属性名共用同一命名规则
pub fn check_key(key: &str) -> anyhow::Result<()> {
    let reserved = RESERVED_KEYS.iter().any(|r| r.eq_ignore_ascii_case(key));
    if reserved || !key_pattern().is_match(key) {
        bail!(
            "property key must be a valid variable name. [key='{}']",
            key
        );
    }
    Ok(())
}

pub fn check_properties(properties: &Properties) -> anyhow::Result<()> {
    for (key, value) in properties {
        check_key(key)?;
        if let PropertyValue::String(s) = value {
            if s.len() > MAX_STRING_VALUE_LEN {
                bail!(
                    "the max length of property value is {}. [key='{}']",
                    MAX_STRING_VALUE_LEN,
                    key
                );
            }
        }
    }
    Ok(())
}
