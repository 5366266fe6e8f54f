// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// One tabular record: one candidate in one district-round.
///
/// There is no fixed schema. Depending on the vintage of the dataset, the same
/// logical attribute may live under different field names, see [FieldAliases].
pub type Row = serde_json::Map<String, serde_json::Value>;

/// A canonical political grouping.
///
/// Labels that cannot be classified are kept as-is in [Bloc::Unclassified],
/// so that an unknown party still gets its own bucket in the totals.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Bloc {
    NouveauFrontPopulaire,
    Ensemble,
    RassemblementNational,
    LesRepublicains,
    DiversDroite,
    DiversGauche,
    Centre,
    Divers,
    Autres,
    Unclassified(String),
}

impl Bloc {
    /// All the canonical blocs, in display order.
    pub const CANONICAL: [Bloc; 9] = [
        Bloc::NouveauFrontPopulaire,
        Bloc::Ensemble,
        Bloc::RassemblementNational,
        Bloc::LesRepublicains,
        Bloc::DiversDroite,
        Bloc::DiversGauche,
        Bloc::Centre,
        Bloc::Divers,
        Bloc::Autres,
    ];

    /// The identifier of the bloc, as found in the datasets and the configuration files.
    pub fn name(&self) -> &str {
        match self {
            Bloc::NouveauFrontPopulaire => "Nouveau Front Populaire",
            Bloc::Ensemble => "Ensemble",
            Bloc::RassemblementNational => "Rassemblement National",
            Bloc::LesRepublicains => "Les Républicains",
            Bloc::DiversDroite => "Divers droite",
            Bloc::DiversGauche => "Divers gauche",
            Bloc::Centre => "Centre",
            Bloc::Divers => "Divers",
            Bloc::Autres => "Autres",
            Bloc::Unclassified(s) => s.as_str(),
        }
    }

    /// Total: any name that is not exactly a canonical identifier is unclassified.
    pub fn from_name(name: &str) -> Bloc {
        Bloc::CANONICAL
            .iter()
            .find(|b| b.name() == name)
            .cloned()
            .unwrap_or_else(|| Bloc::Unclassified(name.to_string()))
    }

    pub fn is_canonical(&self) -> bool {
        !matches!(self, Bloc::Unclassified(_))
    }
}

impl Display for Bloc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<String> for Bloc {
    fn from(s: String) -> Self {
        Bloc::from_name(&s)
    }
}

impl From<Bloc> for String {
    fn from(b: Bloc) -> Self {
        b.name().to_string()
    }
}

/// The canonical code of an electoral district, as shared between the results
/// and the boundaries (for instance `0503` or `2A01`).
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct DistrictCode(String);

impl DistrictCode {
    /// Trims and uppercases the raw code. Returns None if nothing is left.
    pub fn new(raw: &str) -> Option<DistrictCode> {
        let s = raw.trim();
        if s.is_empty() {
            None
        } else {
            Some(DistrictCode(s.to_uppercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for DistrictCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ******** Output data structures *********

/// How the winner of a district was picked.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum WinnerBasis {
    /// One of the candidates carried an elected flag.
    ElectedFlag,
    /// No flag: the candidate with the highest score.
    HighestScore(f64),
    /// No flag and no readable score in the whole group: the first candidate.
    FirstCandidate,
}

#[derive(PartialEq, Debug, Clone)]
pub struct DistrictResult {
    pub code: DistrictCode,
    pub winner: Row,
    pub bloc: Bloc,
    pub basis: WinnerBasis,
    /// Number of rows that were grouped under this district.
    pub candidates: usize,
}

/// Number of districts won, per bloc.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct BlocTotals(BTreeMap<Bloc, u32>);

impl BlocTotals {
    pub fn increment(&mut self, bloc: &Bloc) {
        *self.0.entry(bloc.clone()).or_insert(0) += 1;
    }

    pub fn get(&self, bloc: &Bloc) -> u32 {
        self.0.get(bloc).cloned().unwrap_or(0)
    }

    /// The sum of all the seats.
    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Bloc, &u32)> {
        self.0.iter()
    }

    /// Descending by seat count. Blocs with the same count keep the bloc order.
    pub fn sorted_desc(&self) -> Vec<(Bloc, u32)> {
        let mut l: Vec<(Bloc, u32)> = self.0.iter().map(|(b, c)| (b.clone(), *c)).collect();
        l.sort_by(|a, b| b.1.cmp(&a.1));
        l
    }
}

/// The outcome of one reconciliation pass over a snapshot of result rows.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Reconciliation {
    pub districts: BTreeMap<DistrictCode, DistrictResult>,
    pub bloc_totals: BlocTotals,
    /// Rows without any resolvable district code.
    pub skipped_rows: usize,
}

impl Reconciliation {
    pub fn get(&self, code: &DistrictCode) -> Option<&DistrictResult> {
        self.districts.get(code)
    }
}

// ********* Configuration **********

fn to_strings(l: &[&str]) -> Vec<String> {
    l.iter().map(|s| s.to_string()).collect()
}

/// The acceptable field names for each logical attribute of a row, in order of preference.
///
/// The datasets published for successive elections do not agree on column names. All the
/// lookups go through these lists instead of hard-coding one name per vintage.
/// When deserializing, a missing list keeps its default value.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldAliases {
    /// Fields carrying the full district code (department + number).
    pub code: Vec<String>,
    pub department: Vec<String>,
    /// Number of the district within its department.
    pub district_number: Vec<String>,
    pub bloc: Vec<String>,
    pub party: Vec<String>,
    pub elected_flag: Vec<String>,
    pub score: Vec<String>,
    pub identity: Vec<String>,
    /// Keys of the boundary feature properties carrying the district code.
    pub feature_code: Vec<String>,
}

impl Default for FieldAliases {
    fn default() -> Self {
        FieldAliases {
            code: to_strings(&[
                "CodeCirconscription",
                "code_circo",
                "Code_circonscription",
                "code_circonscription",
                "Code Circonscription",
                "Code circonscription législative",
            ]),
            department: to_strings(&[
                "CodeDepartement",
                "code_departement",
                "Code_departement",
                "Code département",
                "Code du département",
            ]),
            district_number: to_strings(&[
                "NumeroCirconscription",
                "numero_circonscription",
                "num_circo",
                "Code de la circonscription",
            ]),
            bloc: to_strings(&[
                "Bloc",
                "BlocPolitique",
                "Bloc_politique",
                "BlocPolitiqueMajoritaire",
                "BlocMajoritaire",
                "BlocMajoritaire2",
                "Bloc2",
                "Bloc second tour",
                "BlocSecondTour",
                "Bloc_politique_second_tour",
            ]),
            party: to_strings(&[
                "Nuance",
                "NuanceListe",
                "NuanceListe2",
                "Nuance_Candidat",
                "Parti",
                "LibelleParti",
                "LibelleNuance",
            ]),
            elected_flag: to_strings(&[
                "Elu",
                "elu",
                "EstElu",
                "est_elu",
                "Elu_T2",
                "EluSecondTour",
            ]),
            score: to_strings(&[
                "Voix",
                "VoixSecondTour",
                "Voix_2",
                "NbVoix",
                "NombreVoix",
                "NombreVoixSecondTour",
                "Score",
                "ScoreSecondTour",
                "Pourcentage",
                "PourcentageVoix",
                "PourcentageVoixExprimés",
                "PourcentageVoixExprimes",
                "PourcentageVoixInscrits",
                "PourcentageExp",
                "Score%",
            ]),
            identity: to_strings(&[
                "Prenom",
                "Prénom",
                "PrenomCandidat",
                "Prenom_Candidat",
                "PrénomCandidat",
                "Nom",
                "NomCandidat",
                "Nom_Candidat",
                "Nom de famille",
            ]),
            feature_code: to_strings(&[
                "code_circo",
                "CodeCirconscription",
                "codeCirconscription",
                "code_circonscription",
            ]),
        }
    }
}

/// Everything a reconciliation pass needs besides the rows themselves.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ReconcileOptions {
    pub aliases: FieldAliases,
    pub blocs: crate::blocs::BlocTable,
    /// Used when the winner has neither a bloc nor a party field.
    pub default_bloc: Bloc,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        ReconcileOptions {
            aliases: FieldAliases::default(),
            blocs: crate::blocs::BlocTable::default(),
            default_bloc: Bloc::Divers,
        }
    }
}
