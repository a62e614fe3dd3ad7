//! Row extraction for loosely-shaped JSON exports (open-data portals, GIS
//! services). Portals nest their rows under different keys and wrap feature
//! attributes in `properties`/`attributes`; these helpers flatten that into
//! one object per row.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use super::MONITORING_CITIES;

pub type Row = Map<String, Value>;

/// Where a source nests its rows, searched in order.
#[derive(Debug, Clone, Copy)]
pub struct RowShape {
    /// Top-level keys holding a row array.
    pub keys: &'static [&'static str],
    /// `(wrapper, keys)` pairs for arrays one level down, e.g. `result.records`.
    pub nested: &'static [(&'static str, &'static [&'static str])],
    /// Object-valued fields merged into the row.
    pub flatten: &'static [&'static str],
}

impl RowShape {
    /// Rows of `payload`. A bare object with no recognizable list is one row.
    pub fn extract(&self, payload: &Value) -> Vec<Row> {
        let map = match payload {
            Value::Array(items) => return objects(items).cloned().collect(),
            Value::Object(map) => map,
            _ => return Vec::new(),
        };

        let top = self.keys.iter().filter_map(|k| map.get(*k));
        let nested = self.nested.iter().flat_map(|(wrapper, keys)| {
            keys.iter()
                .filter_map(move |k| map.get(*wrapper).and_then(Value::as_object)?.get(*k))
        });

        for candidate in top.chain(nested) {
            if let Value::Array(items) = candidate {
                let rows: Vec<Row> = objects(items).map(|r| self.flatten_row(r)).collect();
                if !rows.is_empty() {
                    return rows;
                }
            }
        }
        vec![self.flatten_row(map)]
    }

    fn flatten_row(&self, row: &Row) -> Row {
        let mut out = row.clone();
        for key in self.flatten {
            if let Some(Value::Object(inner)) = row.get(*key) {
                out.extend(inner.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        out
    }
}

fn objects(items: &[Value]) -> impl Iterator<Item = &Row> {
    items.iter().filter_map(Value::as_object)
}

/// First non-blank string among `keys`, trimmed.
pub fn pick_str<'a>(row: &'a Row, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| row.get(*k)?.as_str())
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// First finite number among `keys`. Strings like `"72%"` are accepted.
pub fn pick_number(row: &Row, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| match row.get(*k)? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let digits: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            digits.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    })
}

/// Lowercase ASCII slug, at most 72 characters.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for c in value.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    slug.chars().take(72).collect()
}

/// RFC 3339, naive ISO datetime or plain date.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Monitoring city named in `text` by slug, English or Thai label.
pub fn mentioned_city(text: &str) -> Option<&'static str> {
    let t = text.to_lowercase();
    MONITORING_CITIES
        .iter()
        .find(|c| {
            t.contains(c.slug) || t.contains(&c.label_en.to_lowercase()) || t.contains(c.label_th)
        })
        .map(|c| c.slug)
}

/// City for a row: named in `text` or in the row's own city field. An
/// unknown city field becomes its own slug; nothing at all is `national`.
pub fn city_slug(text: &str, direct: Option<&str>) -> String {
    if let Some(slug) = mentioned_city(text).or_else(|| direct.and_then(mentioned_city)) {
        return slug.to_string();
    }
    match slugify(direct.unwrap_or_default()) {
        s if s.is_empty() => "national".to_string(),
        s => s,
    }
}

/// JSON scalars as map-feature properties; nested values are skipped.
pub fn primitive_properties(row: &Row, limit: usize) -> Vec<(String, crate::model::PropertyValue)> {
    use crate::model::PropertyValue;
    row.iter()
        .filter_map(|(k, v)| {
            let pv = match v {
                Value::String(s) => PropertyValue::Text(s.clone()),
                Value::Number(n) => PropertyValue::Number(n.as_f64()?),
                Value::Bool(b) => PropertyValue::Flag(*b),
                Value::Null => PropertyValue::Null,
                _ => return None,
            };
            Some((k.clone(), pv))
        })
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SHAPE: RowShape = RowShape {
        keys: &["records", "data"],
        nested: &[("result", &["records"])],
        flatten: &["properties"],
    };

    fn row(v: Value) -> Row {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn finds_rows_at_each_nesting() {
        assert_eq!(SHAPE.extract(&json!([{"a": 1}, 2, {"b": 2}])).len(), 2);
        assert_eq!(SHAPE.extract(&json!({"data": [{"a": 1}]})).len(), 1);

        let rows = SHAPE.extract(&json!({
            "records": [],
            "result": {"records": [{"id": 1, "properties": {"title": "Pole"}}]}
        }));
        assert_eq!(rows.len(), 1);
        assert_eq!(pick_str(&rows[0], &["title"]), Some("Pole"));

        assert_eq!(SHAPE.extract(&json!({"title": "single"})).len(), 1);
        assert!(SHAPE.extract(&json!("text")).is_empty());
    }

    #[test]
    fn picks_skip_blank_and_parse_numeric_strings() {
        let r = row(json!({"name": "  ", "title": " Sensor grid ", "progress": "72%", "pct": 10}));
        assert_eq!(pick_str(&r, &["name", "title"]), Some("Sensor grid"));
        assert_eq!(pick_number(&r, &["progress", "pct"]), Some(72.0));
        assert_eq!(pick_number(&r, &["missing"]), None);
    }

    #[test]
    fn slugs_are_ascii_and_bounded() {
        assert_eq!(slugify("Smart Pole -- Rollout!"), "smart-pole-rollout");
        assert_eq!(slugify("โครงการ"), "");
        assert_eq!(slugify(&"x".repeat(100)).len(), 72);
    }

    #[test]
    fn cities_resolve_by_name_field_or_default() {
        assert_eq!(city_slug("Phuket CCTV expansion", None), "phuket");
        assert_eq!(city_slug("CCTV", Some("เชียงใหม่")), "chiang-mai");
        assert_eq!(city_slug("CCTV", Some("Nan Province")), "nan-province");
        assert_eq!(city_slug("CCTV", None), "national");
    }

    #[test]
    fn timestamps_accept_common_portal_formats() {
        assert_eq!(
            parse_timestamp("2026-02-01").map(|d| d.to_rfc3339()).as_deref(),
            Some("2026-02-01T00:00:00+00:00")
        );
        assert!(parse_timestamp("2026-02-01T08:30:00.123").is_some());
        assert!(parse_timestamp("2026-02-01T08:30:00+07:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
