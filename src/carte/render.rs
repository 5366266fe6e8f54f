use std::collections::HashMap;
use std::fs;

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::json;
use serde_json::Value as JSValue;
use snafu::prelude::*;
use text_diff::print_diff;

use circo_results::codes::feature_code;
use circo_results::fields::{resolve_text, value_text};
use circo_results::{Bloc, DistrictResult, FieldAliases, Reconciliation};

use crate::carte::config_reader::CarteConfig;
use crate::carte::io_geojson::FeatureCollection;
use crate::carte::*;

const FALLBACK_FILL: &str = "#B0B0B0";
const UNAVAILABLE: &str = "Résultats indisponibles";
const NO_RESULTS: &str = "Aucun résultat disponible";
const SUMMARY_HEADING: &str = "Sièges remportés par bloc";
const MAX_SCORE_LINES: usize = 4;

/// Colors and labels of the blocs.
#[derive(PartialEq, Debug, Clone)]
pub struct Palette {
    /// In configuration order, for the legend.
    entries: Vec<(Bloc, String, String)>,
    colors: HashMap<Bloc, String>,
    labels: HashMap<Bloc, String>,
    default_fill: String,
    unavailable_message: String,
}

impl Palette {
    pub fn from_config(config: &CarteConfig) -> Palette {
        let entries: Vec<(Bloc, String, String)> = config
            .blocs
            .iter()
            .map(|s| {
                let label = s.label.clone().unwrap_or_else(|| s.name.name().to_string());
                (s.name.clone(), s.color.clone(), label)
            })
            .collect();
        let colors: HashMap<Bloc, String> = entries
            .iter()
            .map(|(b, c, _)| (b.clone(), c.clone()))
            .collect();
        let labels: HashMap<Bloc, String> = entries
            .iter()
            .map(|(b, _, l)| (b.clone(), l.clone()))
            .collect();
        let default_fill = config
            .output_settings
            .default_fill
            .clone()
            .or_else(|| colors.get(&Bloc::Divers).cloned())
            .unwrap_or_else(|| FALLBACK_FILL.to_string());
        let unavailable_message = config
            .output_settings
            .unavailable_message
            .clone()
            .unwrap_or_else(|| UNAVAILABLE.to_string());
        Palette {
            entries,
            colors,
            labels,
            default_fill,
            unavailable_message,
        }
    }

    pub fn color(&self, bloc: &Bloc) -> Option<&str> {
        self.colors.get(bloc).map(|s| s.as_str())
    }

    /// The display label. Blocs that are not configured show their own name.
    pub fn label(&self, bloc: &Bloc) -> String {
        self.labels
            .get(bloc)
            .cloned()
            .unwrap_or_else(|| bloc.name().to_string())
    }

    pub fn fill(&self, bloc: Option<&Bloc>) -> &str {
        bloc.and_then(|b| self.color(b))
            .unwrap_or(self.default_fill.as_str())
    }
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct FeatureStyle {
    pub color: String,
    pub weight: u32,
    #[serde(rename = "fillColor")]
    pub fill_color: String,
    #[serde(rename = "fillOpacity")]
    pub fill_opacity: f64,
}

pub fn style_feature(result: Option<&DistrictResult>, palette: &Palette) -> FeatureStyle {
    FeatureStyle {
        color: "#444".to_string(),
        weight: 1,
        fill_color: palette.fill(result.map(|r| &r.bloc)).to_string(),
        fill_opacity: 0.65,
    }
}

fn escape_html(s: &str) -> String {
    let mut res = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => res.push_str("&amp;"),
            '<' => res.push_str("&lt;"),
            '>' => res.push_str("&gt;"),
            '"' => res.push_str("&quot;"),
            '\'' => res.push_str("&#39;"),
            x => res.push(x),
        }
    }
    res
}

/// The popup of a district: winner, bloc, party and the first score fields.
pub fn popup_html(
    result: Option<&DistrictResult>,
    aliases: &FieldAliases,
    palette: &Palette,
) -> String {
    let r = match result {
        Some(r) => r,
        None => return format!("<p>{}</p>", escape_html(&palette.unavailable_message)),
    };
    let winner = &r.winner;
    let mut lines: Vec<String> = Vec::new();
    if let Some(identity) = resolve_text(winner, &aliases.identity) {
        lines.push(format!("<strong>{}</strong>", escape_html(&identity)));
    }
    let label = palette.label(&r.bloc);
    if !label.is_empty() {
        lines.push(format!("<span>{}</span>", escape_html(&label)));
    }
    if let Some(party) = resolve_text(winner, &aliases.party) {
        lines.push(format!("<span>{}</span>", escape_html(&party)));
    }
    let score_lines = aliases
        .score
        .iter()
        .filter_map(|field| {
            let v = winner.get(field).and_then(value_text)?;
            Some(format!(
                "<strong>{}</strong> : {}",
                escape_html(field),
                escape_html(&v)
            ))
        })
        .take(MAX_SCORE_LINES);
    lines.extend(score_lines);
    if lines.is_empty() {
        lines.push(escape_html(&palette.unavailable_message));
    }
    format!("<div class=\"popup-content\">{}</div>", lines.join("<br/>"))
}

/// The boundaries with the style and the popup of each district in their properties.
///
/// Returns the collection and the number of features without any result.
pub fn styled_collection(
    boundaries: &FeatureCollection,
    reconciliation: &Reconciliation,
    aliases: &FieldAliases,
    palette: &Palette,
) -> (JSValue, usize) {
    let mut fc = boundaries.clone();
    let mut unmatched = 0_usize;
    for feature in fc.features.iter_mut() {
        let result = feature_code(&feature.properties, aliases)
            .and_then(|code| reconciliation.get(&code));
        if result.is_none() {
            unmatched += 1;
        }
        let style = style_feature(result, palette);
        let props = &mut feature.properties;
        props.insert("style".to_string(), json!(style));
        props.insert(
            "popup".to_string(),
            JSValue::String(popup_html(result, aliases, palette)),
        );
        if let Some(r) = result {
            props.insert("bloc".to_string(), JSValue::String(r.bloc.name().to_string()));
            props.insert("blocLabel".to_string(), JSValue::String(palette.label(&r.bloc)));
        }
    }
    if unmatched > 0 {
        info!(
            "styled_collection: {} of {} features without results",
            unmatched,
            fc.features.len()
        );
    }
    (json!(fc), unmatched)
}

/// The seats per bloc, most seats first.
pub fn summary_js(
    title: &str,
    reconciliation: &Reconciliation,
    palette: &Palette,
    unmatched_features: usize,
    swing_delta: Option<JSValue>,
) -> JSValue {
    let seats: Vec<JSValue> = reconciliation
        .bloc_totals
        .sorted_desc()
        .iter()
        .map(|(bloc, total)| {
            json!({
                "bloc": bloc.name(),
                "label": palette.label(bloc),
                "total": total,
                "color": palette.fill(Some(bloc)),
            })
        })
        .collect();
    let mut summary = json!({
        "title": title,
        "heading": SUMMARY_HEADING,
        "seats": seats,
        "legend": legend_js(palette),
        "districts": reconciliation.districts.len(),
        "skippedRows": reconciliation.skipped_rows,
        "unmatchedFeatures": unmatched_features,
        "swingDelta": swing_delta,
    });
    if reconciliation.bloc_totals.is_empty() {
        summary["message"] = json!(NO_RESULTS);
    }
    debug!("summary_js: {:?}", summary);
    summary
}

/// The configured blocs, in configuration order.
pub fn legend_js(palette: &Palette) -> JSValue {
    let entries: Vec<JSValue> = palette
        .entries
        .iter()
        .map(|(bloc, color, label)| json!({"bloc": bloc.name(), "label": label, "color": color}))
        .collect();
    json!(entries)
}

/// Compares the summary with a reference summary and prints the differences.
pub fn check_reference(summary: &JSValue, reference_path: &str) -> CarteResult<()> {
    let contents = fs::read_to_string(reference_path).context(OpeningFileSnafu {
        path: reference_path,
    })?;
    let reference: JSValue = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    let pretty_reference = serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
    let pretty_summary = serde_json::to_string_pretty(summary).context(ParsingJsonSnafu {})?;
    if pretty_reference != pretty_summary {
        warn!("Found differences with the reference summary");
        print_diff(pretty_reference.as_str(), pretty_summary.as_str(), "\n");
        whatever!("Difference detected between computed summary and reference summary")
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use circo_results::{reconcile, ReconcileOptions, Row};

    fn row(js: JSValue) -> Row {
        js.as_object().cloned().unwrap()
    }

    fn sample() -> (Reconciliation, ReconcileOptions) {
        let options = ReconcileOptions::default();
        let rows = vec![
            row(json!({"CodeCirconscription": "0101", "Nom": "Dupont", "Nuance": "RN",
                       "Voix": "12 345", "Pourcentage": "45,2"})),
            row(json!({"CodeCirconscription": "0101", "Nom": "Martin", "Nuance": "ENS",
                       "Voix": 9000})),
            row(json!({"CodeCirconscription": "0102", "Nom": "Durand <Jr>", "Nuance": "LFI",
                       "Elu": "oui"})),
            row(json!({"CodeCirconscription": "0103", "Nuance": "UG", "Voix": 1})),
        ];
        (reconcile(&rows, &options), options)
    }

    fn feature(code: Option<&str>) -> JSValue {
        match code {
            Some(c) => json!({"type": "Feature", "properties": {"code_circo": c}, "geometry": null}),
            None => json!({"type": "Feature", "properties": {}, "geometry": null}),
        }
    }

    #[test]
    fn palette_fallbacks() {
        let palette = Palette::from_config(&CarteConfig::default());
        assert_eq!(palette.color(&Bloc::RassemblementNational), Some("#4575b4"));
        assert_eq!(palette.fill(None), "#bdbdbd");
        let unknown = Bloc::from_name("Parti Inconnu XYZ");
        assert_eq!(palette.label(&unknown), "Parti Inconnu XYZ");
        assert_eq!(palette.fill(Some(&unknown)), "#bdbdbd");
    }

    #[test]
    fn popup_contents() {
        let (rec, options) = sample();
        let palette = Palette::from_config(&CarteConfig::default());
        let code = circo_results::DistrictCode::new("0101").unwrap();
        let html = popup_html(rec.get(&code), &options.aliases, &palette);
        assert!(html.starts_with("<div class=\"popup-content\">"));
        assert!(html.contains("<strong>Dupont</strong>"));
        assert!(html.contains("<span>Rassemblement National</span>"));
        assert!(html.contains("<strong>Voix</strong> : 12 345"));

        let code = circo_results::DistrictCode::new("0102").unwrap();
        let html = popup_html(rec.get(&code), &options.aliases, &palette);
        assert!(html.contains("Durand &lt;Jr&gt;"));

        assert_eq!(
            popup_html(None, &options.aliases, &palette),
            "<p>Résultats indisponibles</p>"
        );
    }

    #[test]
    fn styled_features() {
        let (rec, options) = sample();
        let palette = Palette::from_config(&CarteConfig::default());
        let fc: FeatureCollection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [feature(Some("0101")), feature(Some("0199")), feature(None)]
        }))
        .unwrap();
        let (js, unmatched) = styled_collection(&fc, &rec, &options.aliases, &palette);
        assert_eq!(unmatched, 2);
        let props = &js["features"][0]["properties"];
        assert_eq!(props["style"]["fillColor"], json!("#4575b4"));
        assert_eq!(props["style"]["weight"], json!(1));
        assert_eq!(props["bloc"], json!("Rassemblement National"));
        let props = &js["features"][1]["properties"];
        assert_eq!(props["style"]["fillColor"], json!("#bdbdbd"));
        assert_eq!(props["popup"], json!("<p>Résultats indisponibles</p>"));
    }

    #[test]
    fn summary_order() {
        let (rec, _) = sample();
        let palette = Palette::from_config(&CarteConfig::default());
        let summary = summary_js("Test", &rec, &palette, 0, Some(json!(3)));
        assert_eq!(summary["districts"], json!(3));
        let seats = summary["seats"].as_array().unwrap();
        let total: u64 = seats.iter().map(|s| s["total"].as_u64().unwrap()).sum();
        assert_eq!(total, 3);
        let totals: Vec<u64> = seats.iter().map(|s| s["total"].as_u64().unwrap()).collect();
        let mut sorted = totals.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(totals, sorted);
        assert_eq!(summary["swingDelta"], json!(3));
        assert!(summary.get("message").is_none());
    }

    #[test]
    fn empty_summary() {
        let palette = Palette::from_config(&CarteConfig::default());
        let summary = summary_js("Test", &Reconciliation::default(), &palette, 5, None);
        assert_eq!(summary["message"], json!("Aucun résultat disponible"));
        assert_eq!(summary["seats"], json!([]));
        assert_eq!(summary["unmatchedFeatures"], json!(5));
    }

    #[test]
    fn legend_in_config_order() {
        let palette = Palette::from_config(&CarteConfig::default());
        let legend = legend_js(&palette);
        let legend = legend.as_array().unwrap();
        assert_eq!(legend.len(), 9);
        assert_eq!(legend[0]["bloc"], json!("Nouveau Front Populaire"));
    }
}
