//! Canonical district codes for result rows and boundary features.
//!
//! Both sides must produce the same format for the same district, otherwise no row
//! ever joins a feature. The canonical format is the department code (at least two
//! characters) followed by the district number (at least two digits), uppercased:
//! `0503`, `7512`, `2A01`, `97101`.

use log::debug;

use crate::config::{DistrictCode, FieldAliases, Row};
use crate::fields::{resolve_text, value_text};

/// Shorter values in a direct code field are not district codes.
const MIN_DIRECT_CODE_LEN: usize = 4;

/// The canonical code of a result row.
///
/// The direct code fields are tried first. If none of them holds a plausible code, the
/// code is composed from the department and the district number.
pub fn result_code(row: &Row, aliases: &FieldAliases) -> Option<DistrictCode> {
    let direct = aliases
        .code
        .iter()
        .filter_map(|field| row.get(field))
        .filter_map(value_text)
        .find(|s| s.chars().count() >= MIN_DIRECT_CODE_LEN);
    if let Some(s) = direct {
        return DistrictCode::new(&s);
    }
    let department = resolve_text(row, &aliases.department)?;
    let number = resolve_text(row, &aliases.district_number)?;
    compose_code(&department, &number)
}

/// Builds a code from a department code and a district number within the department.
///
/// `("5", "3")` gives `0503`, `("75", "12")` gives `7512`, `("2A", "1")` gives `2A01`.
pub fn compose_code(department: &str, number: &str) -> Option<DistrictCode> {
    let dep = pad_numeric(department.trim(), 2);
    let num = pad_numeric(number.trim(), 2);
    if dep.is_empty() || num.is_empty() {
        return None;
    }
    DistrictCode::new(&format!("{}{}", dep, num))
}

// Left-pads purely numeric strings with zeros. Anything else passes through.
// Codes that are already long enough are never shortened.
fn pad_numeric(s: &str, width: usize) -> String {
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) && s.len() < width {
        format!("{:0>width$}", s, width = width)
    } else {
        s.to_string()
    }
}

/// The canonical code of a boundary feature, read from its properties.
pub fn feature_code(properties: &Row, aliases: &FieldAliases) -> Option<DistrictCode> {
    let code = resolve_text(properties, &aliases.feature_code).and_then(|s| DistrictCode::new(&s));
    if code.is_none() {
        debug!("feature_code: no code in properties {:?}", properties.keys());
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: serde_json::Value) -> Row {
        v.as_object().unwrap().clone()
    }

    fn code(s: &str) -> Option<DistrictCode> {
        DistrictCode::new(s)
    }

    #[test]
    fn composition_pads_both_parts() {
        assert_eq!(compose_code("5", "3"), code("0503"));
        assert_eq!(compose_code("75", "12"), code("7512"));
        assert_eq!(compose_code("05", "3"), code("0503"));
        assert_eq!(compose_code("971", "2"), code("97102"));
        assert_eq!(compose_code("2a", "1"), code("2A01"));
        assert_eq!(compose_code("", "1"), None);
    }

    #[test]
    fn direct_code_wins() {
        let aliases = FieldAliases::default();
        let r = row(json!({"CodeCirconscription": " 0101 ", "CodeDepartement": "75", "NumeroCirconscription": "2"}));
        assert_eq!(result_code(&r, &aliases), code("0101"));
    }

    #[test]
    fn short_direct_code_is_ignored() {
        let aliases = FieldAliases::default();
        let r = row(json!({"code_circo": "12", "Code du département": "5", "Code de la circonscription": 3}));
        assert_eq!(result_code(&r, &aliases), code("0503"));
        // A later direct field may still carry the full code.
        let r2 = row(json!({"CodeCirconscription": "12", "code_circo": "7512"}));
        assert_eq!(result_code(&r2, &aliases), code("7512"));
    }

    #[test]
    fn no_code_is_absent() {
        let aliases = FieldAliases::default();
        assert_eq!(result_code(&row(json!({"Nom": "X"})), &aliases), None);
        assert_eq!(
            result_code(&row(json!({"CodeDepartement": "75"})), &aliases),
            None
        );
        assert_eq!(
            result_code(&row(json!({"CodeCirconscription": ""})), &aliases),
            None
        );
    }

    #[test]
    fn numeric_codes() {
        let aliases = FieldAliases::default();
        let r = row(json!({"CodeDepartement": 5, "NumeroCirconscription": 3}));
        assert_eq!(result_code(&r, &aliases), code("0503"));
    }

    #[test]
    fn feature_codes() {
        let aliases = FieldAliases::default();
        assert_eq!(
            feature_code(&row(json!({"code_circo": "0503"})), &aliases),
            code("0503")
        );
        assert_eq!(
            feature_code(&row(json!({"codeCirconscription": "2a01"})), &aliases),
            code("2A01")
        );
        // Keys are case-sensitive.
        assert_eq!(feature_code(&row(json!({"CODE_CIRCO": "0503"})), &aliases), None);
        assert_eq!(feature_code(&row(json!({})), &aliases), None);
    }
}
