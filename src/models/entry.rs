// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journal entry model for storage and API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One user's journal record for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/lib/generated/")
)]
pub struct Entry {
    /// Store-assigned surrogate ID
    pub id: String,
    /// Owning user ID
    pub owner_id: String,
    /// Calendar date (`YYYY-MM-DD`); unique per owner
    pub date: NaiveDate,
    /// Positive moment of the day
    pub rose: Option<String>,
    /// Difficulty of the day
    pub thorn: Option<String>,
    /// Hope for tomorrow
    pub bud: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// Build a fresh entry from the supplied fields.
    pub fn new(id: String, owner_id: &str, date: NaiveDate, fields: &EntryFields) -> Self {
        let now = Utc::now();
        Self {
            id,
            owner_id: owner_id.to_string(),
            date,
            rose: fields.rose.clone(),
            thorn: fields.thorn.clone(),
            bud: fields.bud.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// The three free-text fields of an entry, each optional.
///
/// Used both as creation input and as a partial update: a `Some` field
/// overwrites, a `None` field leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thorn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bud: Option<String>,
}

impl EntryFields {
    /// True when at least one field is non-empty after trimming.
    pub fn has_content(&self) -> bool {
        [&self.rose, &self.thorn, &self.bud]
            .into_iter()
            .flatten()
            .any(|value| !value.trim().is_empty())
    }

    /// Overwrite the fields of `entry` that are present in `self`.
    pub fn merge_into(&self, entry: &mut Entry) {
        if let Some(rose) = &self.rose {
            entry.rose = Some(rose.clone());
        }
        if let Some(thorn) = &self.thorn {
            entry.thorn = Some(thorn.clone());
        }
        if let Some(bud) = &self.bud {
            entry.bud = Some(bud.clone());
        }
    }

    /// Which fields carry non-blank text.
    pub fn presence(&self) -> FieldPresence {
        let filled = |value: &Option<String>| {
            value
                .as_deref()
                .is_some_and(|text| !text.trim().is_empty())
        };
        FieldPresence {
            rose: filled(&self.rose),
            thorn: filled(&self.thorn),
            bud: filled(&self.bud),
        }
    }
}

/// Field-presence summary recorded when an entry is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPresence {
    pub rose: bool,
    pub thorn: bool,
    pub bud: bool,
}

/// A page of entries plus the unpaginated total.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/lib/generated/")
)]
pub struct EntryPage {
    pub entries: Vec<Entry>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total: u64,
}

/// Result of an upsert: the stored entry and whether it was newly created.
#[derive(Debug, Clone)]
pub struct Upserted {
    pub entry: Entry,
    pub created: bool,
}

/// Acknowledgement returned by a successful delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/lib/generated/")
)]
pub struct RemoveAck {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Entry {
        Entry::new(
            "id-1".to_string(),
            "user-1",
            NaiveDate::from_ymd_opt(2025, 7, 18).unwrap(),
            &EntryFields {
                rose: Some("a".to_string()),
                thorn: Some("b".to_string()),
                bud: Some("c".to_string()),
            },
        )
    }

    #[test]
    fn test_merge_only_overwrites_present_fields() {
        let mut entry = sample();
        let changes = EntryFields {
            rose: Some("x".to_string()),
            ..Default::default()
        };

        changes.merge_into(&mut entry);

        assert_eq!(entry.rose.as_deref(), Some("x"));
        assert_eq!(entry.thorn.as_deref(), Some("b"));
        assert_eq!(entry.bud.as_deref(), Some("c"));
    }

    #[test]
    fn test_has_content_ignores_whitespace() {
        let blank = EntryFields {
            rose: Some("   ".to_string()),
            thorn: Some(String::new()),
            bud: None,
        };
        assert!(!blank.has_content());

        let filled = EntryFields {
            bud: Some(" tomorrow ".to_string()),
            ..blank
        };
        assert!(filled.has_content());
    }

    #[test]
    fn test_entry_json_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["date"], "2025-07-18");
        assert_eq!(json["ownerId"], "user-1");
        assert!(json.get("createdAt").is_some());
    }
}
