use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::KeydeckError;

pub const KEY_PREFIX: &str = "key_";
const KEY_BODY_LEN: usize = 26;
const KEY_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Characters of the value left readable when a key is masked.
pub const MASK_VISIBLE_PREFIX: usize = 12;
const MASK_SUFFIX: &str = "•••••••••••••••";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    pub id: String,
    pub name: String,
    pub value: String,
    pub usage_count: i64,
    pub max_usage: i64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl ApiKeyRecord {
    /// The value with everything past the first 12 characters hidden.
    pub fn masked_value(&self) -> String {
        mask_value(&self.value)
    }

    pub fn usage_label(&self) -> String {
        format!("{} / {}", self.usage_count, self.max_usage)
    }

    /// Fraction of the limit consumed, clamped to `0.0..=1.0`.
    pub fn usage_ratio(&self) -> f64 {
        if self.max_usage <= 0 {
            return 1.0;
        }
        (self.usage_count as f64 / self.max_usage as f64).clamp(0.0, 1.0)
    }

    pub fn is_exhausted(&self) -> bool {
        self.usage_count >= self.max_usage
    }

    /// Copy the set fields of `update` onto this record.
    pub fn apply(&mut self, update: &UpdateApiKey) {
        if let Some(ref name) = update.name {
            self.name = name.clone();
        }
        if let Some(ref value) = update.value {
            self.value = value.clone();
        }
        if let Some(max_usage) = update.max_usage {
            self.max_usage = max_usage;
        }
    }
}

/// Row handed to the store on insert. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApiKey {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub usage_count: i64,
    pub max_usage: i64,
}

impl NewApiKey {
    /// Fresh record for `name` with a generated value and zero usage.
    pub fn generate(name: &str, max_usage: i64) -> Self {
        Self {
            name: name.trim().to_string(),
            value: generate_key_value(),
            usage_count: 0,
            max_usage,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateApiKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_usage: Option<i64>,
}

impl UpdateApiKey {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn replace_value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.value.is_none() && self.max_usage.is_none()
    }
}

/// Name ordering for list queries. Comparison is case-sensitive byte order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn parse(s: &str) -> Result<Self, KeydeckError> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(KeydeckError::InvalidInput(format!(
                "sort order must be 'asc' or 'desc', got '{other}'"
            ))),
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            SortOrder::Asc => "▲",
            SortOrder::Desc => "▼",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generate a key value: `key_` + 26 lowercase base36 characters.
///
/// Values are not checked against existing keys.
pub fn generate_key_value() -> String {
    let mut rng = rand::thread_rng();
    let body: String = (0..KEY_BODY_LEN)
        .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
        .collect();
    format!("{KEY_PREFIX}{body}")
}

pub fn mask_value(value: &str) -> String {
    let prefix: String = value.chars().take(MASK_VISIBLE_PREFIX).collect();
    format!("{prefix}{MASK_SUFFIX}")
}
