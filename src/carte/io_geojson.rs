// District boundaries as GeoJSON feature collections.

use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;

use circo_results::Row;

use crate::carte::io_common::simplify_file_name;
use crate::carte::*;

/// A GeoJSON feature. The geometry is carried through untouched.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_kind")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<JSValue>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Row,
    #[serde(default)]
    pub geometry: JSValue,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "collection_kind")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

fn feature_kind() -> String {
    "Feature".to_string()
}

fn collection_kind() -> String {
    "FeatureCollection".to_string()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Row, D::Error>
where
    D: Deserializer<'de>,
{
    let o: Option<Row> = Option::deserialize(deserializer)?;
    Ok(o.unwrap_or_default())
}

impl Default for FeatureCollection {
    fn default() -> Self {
        FeatureCollection {
            kind: collection_kind(),
            features: vec![],
        }
    }
}

impl FeatureCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }
}

pub fn feature_collection_from_value(js: JSValue, what: &str) -> CarteResult<FeatureCollection> {
    ensure!(
        js.get("features").map(|f| f.is_array()).unwrap_or(false),
        UnexpectedPayloadSnafu { what }
    );
    let fc: FeatureCollection = serde_json::from_value(js).context(ParsingJsonSnafu {})?;
    if fc.kind != "FeatureCollection" {
        warn!(
            "feature_collection_from_value: unexpected type {:?}, reading the features anyway",
            fc.kind
        );
    }
    Ok(fc)
}

pub async fn read_feature_collection(path: &str) -> CarteResult<FeatureCollection> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .context(OpeningFileSnafu { path })?;
    let js: JSValue = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    let fc = feature_collection_from_value(js, "contours")?;
    debug!(
        "read_feature_collection: {}: {} features",
        simplify_file_name(path),
        fc.features.len()
    );
    Ok(fc)
}

/// Concatenates the features of several collections, in order.
pub fn merge(collections: Vec<FeatureCollection>) -> FeatureCollection {
    let features = collections.into_iter().flat_map(|c| c.features).collect();
    FeatureCollection {
        kind: collection_kind(),
        features,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn read_collection() {
        let js = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"codeCirconscription": "0101"},
                 "geometry": {"type": "Point", "coordinates": [5.2, 46.2]}},
                {"type": "Feature", "properties": null, "geometry": null}
            ]
        });
        let fc = feature_collection_from_value(js, "contours").unwrap();
        assert_eq!(fc.len(), 2);
        assert_eq!(fc.features[0].properties["codeCirconscription"], json!("0101"));
        assert!(fc.features[1].properties.is_empty());
        assert_eq!(fc.features[1].geometry, JSValue::Null);
    }

    #[test]
    fn geometry_is_kept() {
        let geometry = json!({"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]});
        let js = json!({"type": "FeatureCollection",
            "features": [{"type": "Feature", "properties": {}, "geometry": geometry.clone()}]});
        let fc = feature_collection_from_value(js, "contours").unwrap();
        let back = serde_json::to_value(&fc).unwrap();
        assert_eq!(back["features"][0]["geometry"], geometry);
    }

    #[tokio::test]
    async fn read_file() {
        let path = concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/testdata/circonscriptions.geojson"
        );
        let fc = read_feature_collection(path).await.unwrap();
        assert_eq!(fc.len(), 3);
        assert_eq!(fc.features[0].properties["code_circo"], json!("0503"));
    }

    #[test]
    fn not_a_collection() {
        let res = feature_collection_from_value(json!({"data": []}), "contours");
        assert!(matches!(res, Err(CarteError::UnexpectedPayload { .. })));
    }

    #[test]
    fn merge_keeps_order() {
        let a = FeatureCollection {
            kind: collection_kind(),
            features: vec![Feature {
                kind: feature_kind(),
                id: Some(json!(1)),
                properties: Row::new(),
                geometry: JSValue::Null,
            }],
        };
        let mut b = a.clone();
        b.features[0].id = Some(json!(2));
        let m = merge(vec![a, b]);
        assert_eq!(m.len(), 2);
        assert_eq!(m.features[1].id, Some(json!(2)));
    }
}
