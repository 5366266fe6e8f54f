pub use crate::config::*;

use crate::blocs::BlocTable;

/// A builder for collecting result rows from several sources before reconciling them.
///
/// ```
/// use circo_results::builder::Builder;
/// use circo_results::Bloc;
/// use serde_json::json;
///
/// let mut builder = Builder::new().default_bloc(Bloc::Autres);
///
/// builder.add_value(&json!({"code_circo": "7501", "Nuance": "RN", "Voix": "12 000"}));
/// builder.add_value(&json!({"code_circo": "7501", "Nuance": "LFI", "Voix": "15 000"}));
///
/// let res = builder.reconcile();
/// assert_eq!(res.bloc_totals.get(&Bloc::NouveauFrontPopulaire), 1);
/// ```
pub struct Builder {
    pub(crate) _options: ReconcileOptions,
    pub(crate) _rows: Vec<Row>,
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new()
    }
}

impl Builder {
    pub fn new() -> Builder {
        Builder {
            _options: ReconcileOptions::default(),
            _rows: Vec::new(),
        }
    }

    pub fn aliases(mut self, aliases: &FieldAliases) -> Builder {
        self._options.aliases = aliases.clone();
        self
    }

    pub fn bloc_table(mut self, blocs: &BlocTable) -> Builder {
        self._options.blocs = blocs.clone();
        self
    }

    pub fn default_bloc(mut self, bloc: Bloc) -> Builder {
        self._options.default_bloc = bloc;
        self
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self._options
    }

    pub fn add_row(&mut self, row: &Row) {
        self._rows.push(row.clone());
    }

    pub fn add_rows(&mut self, rows: &[Row]) {
        self._rows.extend(rows.iter().cloned());
    }

    /// Adds a JSON value. Only objects are rows: anything else is ignored and
    /// false is returned.
    pub fn add_value(&mut self, value: &serde_json::Value) -> bool {
        match value.as_object() {
            Some(row) => {
                self._rows.push(row.clone());
                true
            }
            None => false,
        }
    }

    pub fn num_rows(&self) -> usize {
        self._rows.len()
    }

    pub fn reconcile(&self) -> Reconciliation {
        crate::reconcile(&self._rows, &self._options)
    }
}
