use log::debug;

use crate::config::{FieldAliases, Row, WinnerBasis};
use crate::fields::{is_truthy_flag, parse_score};

/// The winning row of a district, with its position in the group.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Winner<'a> {
    pub row: &'a Row,
    pub index: usize,
    pub basis: WinnerBasis,
}

fn has_elected_flag(row: &Row, aliases: &FieldAliases) -> bool {
    aliases
        .elected_flag
        .iter()
        .filter_map(|field| row.get(field))
        .any(is_truthy_flag)
}

/// The best readable score of a row, across all the score fields.
/// Missing and unreadable fields are skipped, not counted as zero.
pub fn best_score(row: &Row, aliases: &FieldAliases) -> Option<f64> {
    aliases
        .score
        .iter()
        .filter_map(|field| row.get(field))
        .filter_map(parse_score)
        .fold(None, |acc: Option<f64>, x| match acc {
            Some(a) if a >= x => Some(a),
            _ => Some(x),
        })
}

/// Picks the winner among the candidates of one district.
///
/// The first candidate (in input order) with an elected flag wins. Without any flag,
/// the candidate with the strictly highest score wins, and the first one is kept on
/// ties. Candidates without any score rank below every scored candidate.
/// Returns None only when there are no candidates.
pub fn select_winner<'a>(candidates: &[&'a Row], aliases: &FieldAliases) -> Option<Winner<'a>> {
    let first: &'a Row = *candidates.first()?;

    if let Some((index, row)) = candidates
        .iter()
        .copied()
        .enumerate()
        .find(|(_, row)| has_elected_flag(row, aliases))
    {
        return Some(Winner {
            row,
            index,
            basis: WinnerBasis::ElectedFlag,
        });
    }

    let mut best: Winner<'a> = Winner {
        row: first,
        index: 0,
        basis: WinnerBasis::FirstCandidate,
    };
    let mut best_value: Option<f64> = None;
    for (index, row) in candidates.iter().copied().enumerate() {
        if let Some(score) = best_score(row, aliases) {
            let better = match best_value {
                Some(b) => score > b,
                None => true,
            };
            if better {
                best_value = Some(score);
                best = Winner {
                    row,
                    index,
                    basis: WinnerBasis::HighestScore(score),
                };
            }
        }
    }
    debug!(
        "select_winner: {} candidates, winner at {} ({:?})",
        candidates.len(),
        best.index,
        best.basis
    );
    Some(best)
}
