//! Tabular frames
//!
//! A [`Frame`] is the uniform result shape handed back to callers: a named
//! table of ordered, typed, nullable columns. Log store output is schema-less
//! per record, so query results are pivoted through [`rows_to_frame`] to get a
//! stable column layout that consumers can render.

#![warn(clippy::all, rust_2018_idioms)]

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::types::{QueryStatistics, QueryStatus, ResultRow};

/// Frame construction failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("column '{field}' has {actual} values, expected {expected}")]
    RaggedColumns {
        field: String,
        expected: usize,
        actual: usize,
    },
}

/// Values of a single column. Absent values are `None`, never a zero value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum FieldValues {
    String(Vec<Option<String>>),
    Int64(Vec<Option<i64>>),
    Boolean(Vec<Option<bool>>),
}

impl FieldValues {
    pub fn len(&self) -> usize {
        match self {
            FieldValues::String(v) => v.len(),
            FieldValues::Int64(v) => v.len(),
            FieldValues::Boolean(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(flatten)]
    pub values: FieldValues,
}

impl Field {
    pub fn strings<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: FieldValues::String(values.into_iter().map(|v| Some(v.into())).collect()),
        }
    }

    pub fn nullable_strings(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            values: FieldValues::String(values),
        }
    }

    pub fn int64s(name: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            name: name.into(),
            values: FieldValues::Int64(values.into_iter().map(Some).collect()),
        }
    }

    pub fn booleans(name: impl Into<String>, values: impl IntoIterator<Item = bool>) -> Self {
        Self {
            name: name.into(),
            values: FieldValues::Boolean(values.into_iter().map(Some).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Frame-level metadata attached to query results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameMeta {
    /// Job status at the time the snapshot was fetched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<QueryStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<QueryStatistics>,
}

/// A named, refId-tagged table. Every field has the same length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawFrame")]
pub struct Frame {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<FrameMeta>,
}

/// Wire form of a [`Frame`], checked by [`Frame::try_new`] on the way in
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFrame {
    name: String,
    #[serde(default)]
    ref_id: Option<String>,
    fields: Vec<Field>,
    #[serde(default)]
    meta: Option<FrameMeta>,
}

impl TryFrom<RawFrame> for Frame {
    type Error = FrameError;

    fn try_from(raw: RawFrame) -> Result<Self, Self::Error> {
        let mut frame = Frame::try_new(raw.name, raw.fields)?;
        frame.ref_id = raw.ref_id;
        frame.meta = raw.meta;
        Ok(frame)
    }
}

impl Frame {
    /// Build a frame, rejecting columns of unequal length
    pub fn try_new(name: impl Into<String>, fields: Vec<Field>) -> Result<Self, FrameError> {
        if let Some(first) = fields.first() {
            let expected = first.len();
            if let Some(ragged) = fields.iter().find(|f| f.len() != expected) {
                return Err(FrameError::RaggedColumns {
                    field: ragged.name.clone(),
                    expected,
                    actual: ragged.len(),
                });
            }
        }

        Ok(Self {
            name: name.into(),
            ref_id: None,
            fields,
            meta: None,
        })
    }

    pub fn with_ref_id(mut self, ref_id: impl Into<String>) -> Self {
        self.ref_id = Some(ref_id.into());
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Number of rows (0 for a frame with no columns)
    pub fn row_count(&self) -> usize {
        self.fields.first().map(Field::len).unwrap_or(0)
    }
}

/// Pivot schema-less result rows into a frame.
///
/// Columns are the union of field names in first-seen order: the first row's
/// fields, then any new names from later rows in the order met. A row lacking
/// a column contributes `null`. Pairs without a field name are skipped; a name
/// repeated within one row keeps its last value.
pub fn rows_to_frame(
    name: impl Into<String>,
    rows: &[ResultRow],
    statistics: Option<QueryStatistics>,
    status: Option<QueryStatus>,
) -> Frame {
    let mut column_index: HashMap<&str, usize> = HashMap::new();
    let mut column_names: Vec<&str> = Vec::new();

    for row in rows {
        for result_field in row {
            if let Some(field) = result_field.field.as_deref() {
                if !column_index.contains_key(field) {
                    column_index.insert(field, column_names.len());
                    column_names.push(field);
                }
            }
        }
    }

    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(rows.len()); column_names.len()];

    for row in rows {
        let mut cells: Vec<Option<String>> = vec![None; column_names.len()];
        for result_field in row {
            if let Some(idx) = result_field
                .field
                .as_deref()
                .and_then(|field| column_index.get(field))
            {
                cells[*idx] = result_field.value.clone();
            }
        }
        for (column, cell) in columns.iter_mut().zip(cells) {
            column.push(cell);
        }
    }

    let fields = column_names
        .into_iter()
        .zip(columns)
        .map(|(name, values)| Field::nullable_strings(name, values))
        .collect();

    let meta = if statistics.is_some() || status.is_some() {
        Some(FrameMeta { status, statistics })
    } else {
        None
    };

    Frame {
        name: name.into(),
        ref_id: None,
        fields,
        meta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::data_plane::cloudwatch_logs::types::ResultField;
    use pretty_assertions::assert_eq;

    fn row(pairs: &[(&str, &str)]) -> ResultRow {
        pairs.iter().map(|(f, v)| ResultField::new(*f, *v)).collect()
    }

    fn strings(values: &[Option<&str>]) -> FieldValues {
        FieldValues::String(values.iter().map(|v| v.map(str::to_string)).collect())
    }

    #[test]
    fn test_column_union_in_first_seen_order() {
        let rows = vec![row(&[("a", "1"), ("b", "2")]), row(&[("b", "3"), ("c", "4")])];

        let frame = rows_to_frame("A", &rows, None, None);

        assert_eq!(frame.field_names(), vec!["a", "b", "c"]);
        assert_eq!(frame.row_count(), 2);
        assert_eq!(frame.field("a").unwrap().values, strings(&[Some("1"), None]));
        assert_eq!(frame.field("b").unwrap().values, strings(&[Some("2"), Some("3")]));
        assert_eq!(frame.field("c").unwrap().values, strings(&[None, Some("4")]));
        assert!(frame.meta.is_none());
    }

    #[test]
    fn test_reserved_fields_are_plain_columns() {
        let rows = vec![row(&[
            ("@timestamp", "2020-03-20 10:37:23.000"),
            ("@message", "hello"),
            ("@ptr", "abcdefg"),
        ])];

        let frame = rows_to_frame("A", &rows, None, None);

        assert_eq!(frame.field_names(), vec!["@timestamp", "@message", "@ptr"]);
        assert!(matches!(frame.field("@ptr").unwrap().values, FieldValues::String(_)));
    }

    #[test]
    fn test_unnamed_and_repeated_fields() {
        let rows = vec![vec![
            ResultField::new("a", "first"),
            ResultField {
                field: None,
                value: Some("orphan".to_string()),
            },
            ResultField::new("a", "second"),
        ]];

        let frame = rows_to_frame("A", &rows, None, None);

        assert_eq!(frame.field_names(), vec!["a"]);
        assert_eq!(frame.field("a").unwrap().values, strings(&[Some("second")]));
    }

    #[test]
    fn test_empty_rows_keep_statistics() {
        let stats = QueryStatistics::new(0.0, 0.0, 10.0);
        let frame = rows_to_frame("A", &[], Some(stats.clone()), Some(QueryStatus::Running));

        assert_eq!(frame.row_count(), 0);
        assert!(frame.fields().is_empty());
        let meta = frame.meta.unwrap();
        assert_eq!(meta.statistics, Some(stats));
        assert_eq!(meta.status, Some(QueryStatus::Running));
    }

    #[test]
    fn test_try_new_rejects_ragged_columns() {
        let err = Frame::try_new(
            "bad",
            vec![
                Field::strings("name", ["a", "b"]),
                Field::int64s("percent", [1]),
            ],
        )
        .unwrap_err();

        assert_eq!(
            err,
            FrameError::RaggedColumns {
                field: "percent".to_string(),
                expected: 2,
                actual: 1,
            }
        );
    }

    #[test]
    fn test_frame_serialization_shape() {
        let frame = Frame::try_new("StopQueryResponse", vec![Field::booleans("success", [false])])
            .unwrap()
            .with_ref_id("B");

        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "StopQueryResponse",
                "refId": "B",
                "fields": [{ "name": "success", "type": "boolean", "values": [false] }]
            })
        );

        let back: Frame = serde_json::from_value(json).unwrap();
        assert_eq!(back, frame);
    }

    #[test]
    fn test_deserialize_rejects_ragged_columns() {
        let err = serde_json::from_value::<Frame>(serde_json::json!({
            "name": "A",
            "fields": [
                { "name": "a", "type": "string", "values": ["1", "2"] },
                { "name": "b", "type": "int64", "values": [1] }
            ]
        }))
        .unwrap_err();

        assert!(err.to_string().contains("column 'b' has 1 values, expected 2"));
    }
}
