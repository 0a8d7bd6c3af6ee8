//! Core data models for inventory items.
//!
//! A [`ShorthandRecord`] is one entry of the compact `RAW` listing in the
//! data file; [`Item`] is the expanded record used by filtering, sampling
//! and prompt building.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Status assigned to every item at load time.
pub const DEFAULT_STATUS: &str = "keeping";

/// Ordinal size bucket derived from volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Size {
    XS,
    S,
    M,
    L,
    XL,
}

impl Size {
    pub fn as_str(&self) -> &'static str {
        match self {
            Size::XS => "XS",
            Size::S => "S",
            Size::M => "M",
            Size::L => "L",
            Size::XL => "XL",
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket a volume in liters: ≤1 XS, ≤10 S, ≤50 M, ≤200 L, else XL.
pub fn derive_size(volume_liters: f64) -> Size {
    if volume_liters <= 1.0 {
        Size::XS
    } else if volume_liters <= 10.0 {
        Size::S
    } else if volume_liters <= 50.0 {
        Size::M
    } else if volume_liters <= 200.0 {
        Size::L
    } else {
        Size::XL
    }
}

/// Tag mapping. `room` and `category` drive filtering and location lookup;
/// any other keys in the source are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tags {
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Free-form detail mapping (`color`, `material`, `contents`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Detail(pub Map<String, Value>);

impl Detail {
    /// String value for `key`; non-string and empty values read as absent.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Compact record as written in the data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ShorthandRecord {
    pub n: String,
    pub v: f64,
    pub t: Tags,
    pub d: Value,
    pub l: Value,
    pub u: Value,
    pub a: Value,
    pub i: Value,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub det: Option<Detail>,
}

impl ShorthandRecord {
    /// Keys that every record must carry.
    pub const REQUIRED_KEYS: [&'static str; 8] = ["n", "v", "t", "d", "l", "u", "a", "i"];
}

/// Fully expanded inventory item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    pub tags: Tags,
    pub volume_liters: f64,
    pub size: Size,
    pub date_obtained: Value,
    pub last_used: Value,
    pub usage_frequency: Value,
    pub attachment: Value,
    pub status: String,
    pub description: String,
    pub icon: Value,
    pub detail: Option<Detail>,
}

impl Item {
    /// Expand a shorthand record found at 1-based `position` in the listing.
    pub fn from_shorthand(position: usize, raw: ShorthandRecord) -> Self {
        Self {
            id: item_id(position),
            name: raw.n,
            tags: raw.t,
            volume_liters: raw.v,
            size: derive_size(raw.v),
            date_obtained: raw.d,
            last_used: raw.l,
            usage_frequency: raw.u,
            attachment: raw.a,
            status: DEFAULT_STATUS.to_string(),
            description: raw.desc.unwrap_or_default(),
            icon: raw.i,
            detail: raw.det,
        }
    }

    /// Detail text for `key`, treating a missing detail map as empty.
    pub fn detail_text(&self, key: &str) -> Option<&str> {
        self.detail.as_ref().and_then(|d| d.text(key))
    }

    /// Numeric part of the `obj-NNN` id.
    pub fn id_number(&self) -> Option<u64> {
        self.id.strip_prefix("obj-")?.parse().ok()
    }
}

/// Stable id for the record at 1-based `position`.
pub fn item_id(position: usize) -> String {
    format!("obj-{:03}", position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn size_thresholds() {
        assert_eq!(derive_size(0.0), Size::XS);
        assert_eq!(derive_size(1.0), Size::XS);
        assert_eq!(derive_size(1.01), Size::S);
        assert_eq!(derive_size(10.0), Size::S);
        assert_eq!(derive_size(10.5), Size::M);
        assert_eq!(derive_size(50.0), Size::M);
        assert_eq!(derive_size(200.0), Size::L);
        assert_eq!(derive_size(200.5), Size::XL);
    }

    #[test]
    fn size_is_monotonic() {
        let mut prev = derive_size(0.0);
        let mut v = 0.0;
        while v < 400.0 {
            let s = derive_size(v);
            assert!(s >= prev, "size went down at {v}");
            prev = s;
            v += 0.25;
        }
    }

    #[test]
    fn ids_are_zero_padded_and_unique() {
        assert_eq!(item_id(1), "obj-001");
        assert_eq!(item_id(42), "obj-042");
        assert_eq!(item_id(999), "obj-999");
        assert_eq!(item_id(1000), "obj-1000");

        let ids: std::collections::HashSet<_> = (1..=1500).map(item_id).collect();
        assert_eq!(ids.len(), 1500);
    }

    #[test]
    fn expands_shorthand() {
        let raw: ShorthandRecord = serde_json::from_value(json!({
            "n": "Socks (12)", "v": 2, "t": { "room": "bedroom" },
            "d": "2021-03", "l": "2024-01", "u": "daily", "a": "low", "i": "sock"
        }))
        .unwrap();

        let item = Item::from_shorthand(7, raw);
        assert_eq!(item.id, "obj-007");
        assert_eq!(item.size, Size::S);
        assert_eq!(item.status, "keeping");
        assert_eq!(item.description, "");
        assert!(item.detail.is_none());
        assert_eq!(item.detail_text("contents"), None);
        assert_eq!(item.id_number(), Some(7));
    }

    #[test]
    fn item_serializes_camel_case() {
        let raw: ShorthandRecord = serde_json::from_value(json!({
            "n": "Mug", "v": 0.4, "t": { "room": "kitchen", "category": "drinkware", "brand": "ikea" },
            "d": "2020", "l": "2024", "u": "daily", "a": "medium", "i": "mug"
        }))
        .unwrap();
        let value = serde_json::to_value(Item::from_shorthand(1, raw)).unwrap();

        assert_eq!(value["volumeLiters"], json!(0.4));
        assert_eq!(value["size"], json!("XS"));
        assert_eq!(value["tags"]["brand"], json!("ikea"));
        assert_eq!(value["detail"], Value::Null);
    }

    #[test]
    fn detail_text_ignores_non_strings() {
        let detail: Detail =
            serde_json::from_value(json!({ "color": "Red", "contents": ["a"], "material": "" }))
                .unwrap();
        assert_eq!(detail.text("color"), Some("Red"));
        assert_eq!(detail.text("contents"), None);
        assert_eq!(detail.text("material"), None);
    }
}
