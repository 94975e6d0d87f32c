//! Visualization records and the model-produced chart specification.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// A table row: column name → cell value.
pub type Row = Map<String, Value>;

/// Axis configuration for a chart.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VizConfig {
    /// Column plotted on the x axis.
    #[serde(rename = "xKey")]
    pub x_key: String,
    /// Columns plotted on the y axis.
    #[serde(rename = "yKeys")]
    pub y_keys: Vec<String>,
}

/// A persisted visualization record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Visualization {
    /// Server-assigned identity.
    pub id: String,
    /// Chart title.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Chart family (`line`, `bar`, `area`, `pie`, `scatter`).
    pub chart_type: String,
    /// Underlying rows.
    #[serde(default)]
    pub data: Vec<Row>,
    /// Axis configuration.
    pub config: VizConfig,
    /// Model-produced insight text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<String>,
    /// Where the data came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

/// Payload for creating a visualization record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewVisualization {
    /// Chart title.
    pub name: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Chart family.
    pub chart_type: String,
    /// Underlying rows.
    pub data: Vec<Row>,
    /// Axis configuration.
    pub config: VizConfig,
    /// Model-produced insight text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<String>,
    /// Where the data came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

/// Chart specification requested from the text-generation service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Chart family.
    pub chart_type: String,
    /// Chart title.
    pub name: String,
    /// Brief description.
    #[serde(default)]
    pub description: Option<String>,
    /// Column for the x axis.
    #[serde(rename = "xKey")]
    pub x_key: String,
    /// Columns for the y axis.
    #[serde(rename = "yKeys", default)]
    pub y_keys: Vec<String>,
    /// Key insights.
    #[serde(default)]
    pub insights: Option<String>,
}

/// JSON schema constraining the chart-specification call.
#[must_use]
pub fn chart_spec_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "chart_type": { "type": "string" },
            "name": { "type": "string" },
            "description": { "type": "string" },
            "xKey": { "type": "string" },
            "yKeys": { "type": "array", "items": { "type": "string" } },
            "insights": { "type": "string" }
        }
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_spec_parses_wire_keys() {
        let v = json!({
            "chart_type": "bar",
            "name": "Sales by region",
            "description": "Totals per region",
            "xKey": "region",
            "yKeys": ["total"],
            "insights": "West leads"
        });
        let spec: ChartSpec = serde_json::from_value(v).unwrap();
        assert_eq!(spec.x_key, "region");
        assert_eq!(spec.y_keys, vec!["total"]);
    }

    #[test]
    fn chart_spec_tolerates_missing_optionals() {
        let v = json!({"chart_type": "line", "name": "T", "xKey": "x"});
        let spec: ChartSpec = serde_json::from_value(v).unwrap();
        assert!(spec.y_keys.is_empty());
        assert!(spec.insights.is_none());
    }

    #[test]
    fn viz_config_round_trips_camel_keys() {
        let cfg = VizConfig {
            x_key: "month".into(),
            y_keys: vec!["revenue".into(), "cost".into()],
        };
        let v = serde_json::to_value(&cfg).unwrap();
        assert_eq!(v, json!({"xKey": "month", "yKeys": ["revenue", "cost"]}));
    }

    #[test]
    fn schema_lists_all_spec_fields() {
        let schema = chart_spec_schema();
        let props = schema["properties"].as_object().unwrap();
        for key in ["chart_type", "name", "description", "xKey", "yKeys", "insights"] {
            assert!(props.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn new_visualization_serializes_snake_fields() {
        let nv = NewVisualization {
            name: "Chart".into(),
            description: None,
            chart_type: "pie".into(),
            data: vec![],
            config: VizConfig::default(),
            insights: None,
            source_file: Some("Orchestration Analysis".into()),
        };
        let v = serde_json::to_value(&nv).unwrap();
        assert_eq!(v["chart_type"], "pie");
        assert_eq!(v["source_file"], "Orchestration Analysis");
        assert!(v.get("description").is_none());
    }
}
