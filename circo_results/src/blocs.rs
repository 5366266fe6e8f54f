use std::collections::HashMap;

use log::debug;

use crate::config::Bloc;

// Official short nuance codes.
const NUANCES: &[(&str, Bloc)] = &[
    ("NFP", Bloc::NouveauFrontPopulaire),
    ("UG", Bloc::NouveauFrontPopulaire),
    ("G", Bloc::NouveauFrontPopulaire),
    ("SOC", Bloc::NouveauFrontPopulaire),
    ("EELV", Bloc::NouveauFrontPopulaire),
    ("LFI", Bloc::NouveauFrontPopulaire),
    ("FI", Bloc::NouveauFrontPopulaire),
    ("DVG", Bloc::DiversGauche),
    ("DVC", Bloc::Centre),
    ("UDI", Bloc::Centre),
    ("DVD", Bloc::DiversDroite),
    ("UDC", Bloc::DiversDroite),
    ("MODEM", Bloc::Ensemble),
    ("ENS", Bloc::Ensemble),
    ("REN", Bloc::Ensemble),
    ("HOR", Bloc::Ensemble),
    ("RE", Bloc::Ensemble),
    ("LR", Bloc::LesRepublicains),
    ("RN", Bloc::RassemblementNational),
    ("UXD", Bloc::RassemblementNational),
    ("DLF", Bloc::RassemblementNational),
    ("EXD", Bloc::RassemblementNational),
    ("DIV", Bloc::Divers),
    ("REG", Bloc::Divers),
    ("AUT", Bloc::Autres),
];

// Full party and coalition names, including the spellings of older datasets.
// Keys are uppercase.
const ALIASES: &[(&str, Bloc)] = &[
    ("NOUVEAU FRONT POPULAIRE", Bloc::NouveauFrontPopulaire),
    ("UNION DE LA GAUCHE", Bloc::NouveauFrontPopulaire),
    ("LA FRANCE INSOUMISE", Bloc::NouveauFrontPopulaire),
    ("PARTI SOCIALISTE", Bloc::NouveauFrontPopulaire),
    ("EUROPE ECOLOGIE LES VERTS", Bloc::NouveauFrontPopulaire),
    ("EUROPE ÉCOLOGIE LES VERTS", Bloc::NouveauFrontPopulaire),
    ("ENSEMBLE", Bloc::Ensemble),
    ("ENSEMBLE !", Bloc::Ensemble),
    ("ENSEMBLE POUR LA RÉPUBLIQUE", Bloc::Ensemble),
    ("ENSEMBLE POUR LA REPUBLIQUE", Bloc::Ensemble),
    ("RENAISSANCE", Bloc::Ensemble),
    ("MOUVEMENT DÉMOCRATE", Bloc::Ensemble),
    ("MOUVEMENT DEMOCRATE", Bloc::Ensemble),
    ("HORIZONS", Bloc::Ensemble),
    ("RASSEMBLEMENT NATIONAL", Bloc::RassemblementNational),
    ("UNION DE L'EXTREME DROITE", Bloc::RassemblementNational),
    ("UNION DE L'EXTRÊME DROITE", Bloc::RassemblementNational),
    ("LES RÉPUBLICAINS", Bloc::LesRepublicains),
    ("LES REPUBLICAINS", Bloc::LesRepublicains),
    ("DIVERS DROITE", Bloc::DiversDroite),
    ("DIVERS GAUCHE", Bloc::DiversGauche),
    ("DIVERS CENTRE", Bloc::Centre),
    ("CENTRE", Bloc::Centre),
    ("DIVERS", Bloc::Divers),
    ("RÉGIONALISTE", Bloc::Divers),
    ("REGIONALISTE", Bloc::Divers),
    ("AUTRES", Bloc::Autres),
];

/// The two lookup tables used to classify a party label into a bloc.
///
/// The datasets mix short nuance codes (`RN`, `LFI`) and free-text labels
/// (`Ensemble !`). The nuance codes are tried first, then the labels.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BlocTable {
    nuances: HashMap<String, Bloc>,
    aliases: HashMap<String, Bloc>,
}

impl Default for BlocTable {
    fn default() -> Self {
        BlocTable {
            nuances: NUANCES
                .iter()
                .map(|(k, b)| (k.to_string(), b.clone()))
                .collect(),
            aliases: ALIASES
                .iter()
                .map(|(k, b)| (k.to_string(), b.clone()))
                .collect(),
        }
    }
}

impl BlocTable {
    /// Adds or replaces a nuance code.
    pub fn with_nuance(mut self, code: &str, bloc: Bloc) -> BlocTable {
        self.nuances.insert(code.trim().to_uppercase(), bloc);
        self
    }

    /// Adds or replaces a free-text label.
    pub fn with_alias(mut self, label: &str, bloc: Bloc) -> BlocTable {
        self.aliases.insert(label.trim().to_uppercase(), bloc);
        self
    }

    /// Classifies a raw party or bloc label.
    ///
    /// Returns None only for an empty label. A label that is neither a known nuance code
    /// nor a known alias is returned unchanged (trimmed) as an unclassified bloc.
    pub fn classify(&self, raw: &str) -> Option<Bloc> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let key = trimmed.to_uppercase();
        if let Some(b) = self.nuances.get(&key) {
            return Some(b.clone());
        }
        if let Some(b) = self.aliases.get(&key) {
            return Some(b.clone());
        }
        debug!("classify: no bloc known for {:?}, keeping the label", trimmed);
        Some(Bloc::Unclassified(trimmed.to_string()))
    }
}

/// Classifies with the built-in tables.
pub fn classify(raw: &str) -> Option<Bloc> {
    BlocTable::default().classify(raw)
}
