//! Round catalog: the immutable set of flags the quiz draws from.

/// Catalog loading from the bundled data set or user files.
pub mod loader;

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of answer options shown for every flag.
pub const OPTIONS_PER_ROUND: usize = 4;

/// A single flag together with the answers offered for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagRecord {
    /// Unique identifier (e.g. `south-korea`).
    pub id: String,
    /// Correct answer.
    pub country: String,
    /// Opaque reference to the flag image. The bundled catalog uses emoji glyphs.
    pub flag: String,
    /// Answer options in display order; contains `country` exactly once.
    pub options: Vec<String>,
}

impl FlagRecord {
    /// Whether `option` is the correct answer for this flag.
    pub fn is_correct(&self, option: &str) -> bool {
        self.country == option
    }
}

/// Reasons a catalog is rejected at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// No rounds to pick from.
    #[error("flag catalog is empty")]
    Empty,
    /// Two records share the same id.
    #[error("duplicate flag id `{0}`")]
    DuplicateId(String),
    /// A record does not carry exactly four options.
    #[error("flag `{id}` has {count} options, expected {}", OPTIONS_PER_ROUND)]
    OptionCount {
        /// Offending record.
        id: String,
        /// Number of options found.
        count: usize,
    },
    /// The correct answer is missing from the options.
    #[error("flag `{0}` does not list its country among the options")]
    CountryNotInOptions(String),
    /// The correct answer appears more than once.
    #[error("flag `{0}` lists its country more than once")]
    DuplicateCountryOption(String),
}

/// Validated, non-empty list of flags.
#[derive(Debug, Clone)]
pub struct RoundCatalog {
    records: Vec<FlagRecord>,
}

impl RoundCatalog {
    /// Validate `records` and build a catalog.
    pub fn new(records: Vec<FlagRecord>) -> Result<Self, CatalogError> {
        if records.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.id.as_str()) {
                return Err(CatalogError::DuplicateId(record.id.clone()));
            }
            if record.options.len() != OPTIONS_PER_ROUND {
                return Err(CatalogError::OptionCount {
                    id: record.id.clone(),
                    count: record.options.len(),
                });
            }
            match record
                .options
                .iter()
                .filter(|option| record.is_correct(option))
                .count()
            {
                0 => return Err(CatalogError::CountryNotInOptions(record.id.clone())),
                1 => {}
                _ => return Err(CatalogError::DuplicateCountryOption(record.id.clone())),
            }
        }

        Ok(Self { records })
    }

    /// Number of rounds available.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false; an empty catalog cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&FlagRecord> {
        self.records.get(index)
    }

    /// Look a record up by id.
    pub fn find(&self, id: &str) -> Option<&FlagRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// All records in catalog order.
    pub fn records(&self) -> &[FlagRecord] {
        &self.records
    }
}

/// Draw a round uniformly at random, returning its index and record.
///
/// Draws are independent, so the same flag can come up twice in a row.
pub fn pick_random_round<'a, R: Rng + ?Sized>(
    catalog: &'a RoundCatalog,
    rng: &mut R,
) -> (usize, &'a FlagRecord) {
    let index = rng.gen_range(0..catalog.records.len());
    (index, &catalog.records[index])
}
