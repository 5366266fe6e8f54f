mod config;

pub mod blocs;
pub mod builder;
pub mod codes;
pub mod fields;
pub mod manual;
pub mod winner;

use log::{debug, info};

use std::collections::BTreeMap;

pub use crate::config::*;

use crate::codes::result_code;
use crate::fields::resolve_text;
use crate::winner::select_winner;

/// Reconciles a snapshot of result rows into one result per district and the
/// seat totals per bloc.
///
/// Arguments:
/// * `rows` all the result rows of one fetch cycle. The rows are never modified.
/// * `options` the field aliases, bloc tables and default bloc to use.
///
/// This never fails. Rows without a district code are skipped and counted, and
/// all the other anomalies of the data are resolved by the documented fallbacks.
pub fn reconcile(rows: &[Row], options: &ReconcileOptions) -> Reconciliation {
    info!("reconcile: processing {:?} rows", rows.len());

    let mut groups: BTreeMap<DistrictCode, Vec<&Row>> = BTreeMap::new();
    let mut skipped_rows: usize = 0;
    for (idx, row) in rows.iter().enumerate() {
        match result_code(row, &options.aliases) {
            Some(code) => groups.entry(code).or_default().push(row),
            None => {
                debug!("reconcile: row {} has no district code, skipping", idx);
                skipped_rows += 1;
            }
        }
    }

    let mut districts: BTreeMap<DistrictCode, DistrictResult> = BTreeMap::new();
    let mut bloc_totals = BlocTotals::default();
    for (code, candidates) in groups.into_iter() {
        let winner = match select_winner(&candidates, &options.aliases) {
            Some(w) => w,
            None => continue,
        };
        let bloc = winner_bloc(winner.row, options);
        debug!(
            "reconcile: district {}: {} candidates, bloc {} ({:?})",
            code,
            candidates.len(),
            bloc,
            winner.basis
        );
        bloc_totals.increment(&bloc);
        districts.insert(
            code.clone(),
            DistrictResult {
                code,
                winner: winner.row.clone(),
                bloc,
                basis: winner.basis,
                candidates: candidates.len(),
            },
        );
    }

    info!(
        "reconcile: {} districts, {} rows skipped without a district code",
        districts.len(),
        skipped_rows
    );
    for (bloc, count) in bloc_totals.sorted_desc() {
        info!("reconcile: {:>4} {}", count, bloc);
    }

    Reconciliation {
        districts,
        bloc_totals,
        skipped_rows,
    }
}

/// The bloc of a winning row: the bloc field if present, otherwise the party field,
/// otherwise the default bloc.
pub fn winner_bloc(row: &Row, options: &ReconcileOptions) -> Bloc {
    resolve_text(row, &options.aliases.bloc)
        .and_then(|s| options.blocs.classify(&s))
        .or_else(|| {
            resolve_text(row, &options.aliases.party).and_then(|s| options.blocs.classify(&s))
        })
        .unwrap_or_else(|| options.default_bloc.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::feature_code;
    use serde_json::{json, Value};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn rows(v: Value) -> Vec<Row> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn two_districts_end_to_end() {
        init();
        let data = rows(json!([
            {"CodeCirconscription": "0101", "Nom": "Alpha", "Nuance": "RN", "Voix": "10 000", "Elu": "non"},
            {"CodeCirconscription": "0101", "Nom": "Beta", "Nuance": "UG", "Voix": "9 000", "Elu": "oui"},
            {"CodeDepartement": "5", "NumeroCirconscription": "3", "Nom": "Gamma", "Nuance": "ENS", "Voix": "12 000"},
            {"CodeDepartement": "5", "NumeroCirconscription": "3", "Nom": "Delta", "Nuance": "LR", "Voix": "15 500"},
            {"Nom": "Total", "Voix": "46 500"}
        ]));
        let features = rows(json!([
            {"code_circo": "0101"},
            {"codeCirconscription": "0503"}
        ]));
        let options = ReconcileOptions::default();
        let res = reconcile(&data, &options);

        assert_eq!(res.districts.len(), 2);
        assert_eq!(res.bloc_totals.total(), 2);
        assert_eq!(res.skipped_rows, 1);

        let aliases = &options.aliases;
        let d1 = res.get(&feature_code(&features[0], aliases).unwrap()).unwrap();
        assert_eq!(d1.winner["Nom"], json!("Beta"));
        assert_eq!(d1.bloc, Bloc::NouveauFrontPopulaire);
        assert_eq!(d1.basis, WinnerBasis::ElectedFlag);
        assert_eq!(d1.candidates, 2);

        let d2 = res.get(&feature_code(&features[1], aliases).unwrap()).unwrap();
        assert_eq!(d2.winner["Nom"], json!("Delta"));
        assert_eq!(d2.bloc, Bloc::LesRepublicains);
        assert_eq!(d2.basis, WinnerBasis::HighestScore(15500.0));
    }

    #[test]
    fn bloc_field_before_party_then_default() {
        let options = ReconcileOptions::default();
        let data = rows(json!([
            {"code_circo": "0201", "Bloc": "Ensemble !", "Nuance": "RN"},
            {"code_circo": "0202", "Bloc": "", "Nuance": "RN"},
            {"code_circo": "0203", "Nom": "Sans étiquette"},
            {"code_circo": "0204", "Parti": "Parti Inconnu XYZ"}
        ]));
        let res = reconcile(&data, &options);
        let bloc = |c: &str| res.get(&DistrictCode::new(c).unwrap()).unwrap().bloc.clone();
        assert_eq!(bloc("0201"), Bloc::Ensemble);
        assert_eq!(bloc("0202"), Bloc::RassemblementNational);
        assert_eq!(bloc("0203"), Bloc::Divers);
        assert_eq!(
            bloc("0204"),
            Bloc::Unclassified("Parti Inconnu XYZ".to_string())
        );
        assert_eq!(res.bloc_totals.total(), 4);
    }

    #[test]
    fn totals_match_districts() {
        let options = ReconcileOptions::default();
        let data = rows(json!([
            {"code_circo": "7501", "Nuance": "RN", "Voix": 3},
            {"code_circo": "7501", "Nuance": "LFI", "Voix": 5},
            {"code_circo": "7502", "Nuance": "LFI", "Voix": 5},
            {"code_circo": "7503", "Nuance": "RN", "Voix": 5},
            {"code_circo": "", "Nuance": "RN", "Voix": 5},
            {"code_circo": "75", "Nuance": "RN", "Voix": 5}
        ]));
        let res = reconcile(&data, &options);
        assert_eq!(res.districts.len(), 3);
        assert_eq!(res.skipped_rows, 2);
        assert_eq!(res.bloc_totals.total() as usize, res.districts.len());
        assert_eq!(res.bloc_totals.get(&Bloc::NouveauFrontPopulaire), 2);
        assert_eq!(res.bloc_totals.get(&Bloc::RassemblementNational), 1);
        assert_eq!(
            res.bloc_totals.sorted_desc(),
            vec![
                (Bloc::NouveauFrontPopulaire, 2),
                (Bloc::RassemblementNational, 1)
            ]
        );
    }

    #[test]
    fn empty_input() {
        let res = reconcile(&[], &ReconcileOptions::default());
        assert!(res.districts.is_empty());
        assert!(res.bloc_totals.is_empty());
        assert_eq!(res.skipped_rows, 0);
    }

    #[test]
    fn reconcile_is_repeatable() {
        let options = ReconcileOptions::default();
        let data = rows(json!([
            {"code_circo": "0101", "Nuance": "RN", "Voix": 3},
            {"code_circo": "0101", "Nuance": "LFI", "Voix": 3}
        ]));
        assert_eq!(reconcile(&data, &options), reconcile(&data, &options));
    }
}
