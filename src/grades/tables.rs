use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use std::path::Path;

use super::types::SubjectRecord;
use super::utility::normalize_whitespace;

/// Which field of a [`SubjectRecord`] a [`CreditTable`] is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SubjectKey {
    /// Subject code, e.g. `CS3351`.
    #[default]
    Code,
    /// Subject name, e.g. `Data Structures`.
    Name,
}

impl SubjectKey {
    /// Returns the normalised lookup key of `record` under this scheme.
    pub fn of(self, record: &SubjectRecord) -> String {
        match self {
            SubjectKey::Code => normalize_whitespace(&record.subject_code),
            SubjectKey::Name => normalize_whitespace(&record.subject_name),
        }
    }
}

/// Credit snapshot for CSBS 2022-26, CSBS 2023-27 and AIML 2023-27, keyed by code.
static BUILTIN_CREDITS: &[(&str, f64)] = &[
    // CSBS 2023 - 2027
    ("CY23111", 3.0),
    ("CY23121", 1.0),
    ("GE23111", 3.0),
    ("GE23112", 0.0),
    ("GE23121", 1.0),
    ("GE23122", 1.0),
    ("GE23131", 4.0),
    ("HS23111", 3.0),
    ("MA23111", 4.0),
    ("AD23211", 3.0),
    ("AD23221", 1.0),
    ("GE23211", 3.0),
    ("GE23213", 0.0),
    ("GE23221", 1.0),
    ("HS23211", 2.0),
    ("MA23211", 4.0),
    ("PH23211", 3.0),
    ("PH23221", 1.0),
    ("CB23311", 4.0),
    ("CS23312", 3.0),
    ("CS23314", 3.0),
    ("EC23331", 4.0),
    ("MA23311", 3.0),
    ("CS23322", 1.0),
    ("CS23324", 1.0),
    ("CB23IC1", 1.0),
    // CSBS 2022 - 2026
    ("BS3171", 2.0),
    ("CY3151", 3.0),
    ("GE3151", 3.0),
    ("GE3152", 1.0),
    ("GE3171", 2.0),
    ("GE3172", 1.0),
    ("HS3152", 3.0),
    ("MA3151", 4.0),
    ("PH3151", 3.0),
    ("AD3251", 3.0),
    ("AD3271", 2.0),
    ("BE3251", 3.0),
    ("GE3251", 4.0),
    ("GE3252", 1.0),
    ("GE3271", 2.0),
    ("GE3272", 2.0),
    ("HS3252", 2.0),
    ("MA3251", 4.0),
    ("PH3256", 3.0),
    ("AD3351", 4.0),
    ("AD3491", 3.0),
    ("CS3351", 4.0),
    ("CS3381", 1.5),
    ("CS3391", 3.0),
    ("CW3301", 3.0),
    ("CW3311", 1.5),
    ("GE3361", 1.0),
    ("MA3354", 4.0),
    ("AD3461", 2.0),
    ("AL3451", 3.0),
    ("AL3452", 4.0),
    ("CS3481", 1.5),
    ("CS3492", 3.0),
    ("CW3401", 3.0),
    ("CW3411", 1.5),
    ("GE3451", 2.0),
    ("MA3391", 4.0),
    ("CCD332", 3.0),
    ("CCS346", 3.0),
    ("CS3691", 4.0),
    ("CW3501", 3.0),
    ("CW3551", 3.0),
    ("CW3511", 2.0),
    ("MX3084", 0.0),
    // AIML 2023 - 2027
    ("AL23311", 3.0),
    ("CS23411", 3.0),
    ("AL23321", 1.0),
    ("CS23421", 1.0),
];

/// Immutable subject → credit weight mapping for one curriculum snapshot.
#[derive(Debug, Clone)]
pub struct CreditTable {
    key: SubjectKey,
    credits: HashMap<String, f64>,
}

impl CreditTable {
    /// The code-keyed snapshot compiled into the binary.
    pub fn builtin() -> Self {
        let credits = BUILTIN_CREDITS
            .iter()
            .map(|(code, credit)| (code.to_string(), *credit))
            .collect();
        Self {
            key: SubjectKey::Code,
            credits,
        }
    }

    /// Builds a table from `(key, credit)` pairs.
    ///
    /// Keys are whitespace-normalised. Two keys that normalise to the same
    /// value, or a negative or non-finite credit, are rejected.
    pub fn from_entries<I, K>(key: SubjectKey, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut credits = HashMap::new();
        for (raw, credit) in entries {
            let normalized = normalize_whitespace(raw.as_ref());
            if normalized.is_empty() {
                bail!("empty subject key in credit table");
            }
            if !credit.is_finite() || credit < 0.0 {
                bail!("credit for '{normalized}' must be a non-negative number, got {credit}");
            }
            if credits.insert(normalized.clone(), credit).is_some() {
                bail!("duplicate subject key '{normalized}' in credit table");
            }
        }
        Ok(Self { key, credits })
    }

    /// Loads a table from a JSON object on disk:
    /// ```json
    /// { "CS3351": 4, "CS3381": 1.5 }
    /// ```
    pub fn load(path: impl AsRef<Path>, key: SubjectKey) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read credit table '{}'", path.display()))?;
        Self::parse(&content, key)
            .with_context(|| format!("invalid credit table '{}'", path.display()))
    }

    /// Parses the JSON form accepted by [`CreditTable::load`].
    pub fn parse(json: &str, key: SubjectKey) -> Result<Self> {
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
        let entries: Vec<(String, f64)> = object
            .into_iter()
            .map(|(k, v)| -> Result<(String, f64)> {
                let credit = v
                    .as_f64()
                    .with_context(|| format!("credit for '{k}' is not a number"))?;
                Ok((k, credit))
            })
            .collect::<Result<_>>()?;
        Self::from_entries(key, entries)
    }

    pub fn key(&self) -> SubjectKey {
        self.key
    }

    pub fn len(&self) -> usize {
        self.credits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credits.is_empty()
    }

    /// Credit weight for `record`, or `None` if the table has no entry for it.
    pub fn credit_for(&self, record: &SubjectRecord) -> Option<f64> {
        self.credits.get(&self.key.of(record)).copied()
    }
}

/// Letter grade → grade point.
static LETTER_POINTS: &[(&str, u8)] = &[
    ("O", 10),
    ("A+", 9),
    ("A", 8),
    ("B+", 7),
    ("B", 6),
    ("C", 5),
    ("U", 0),
];

/// Immutable letter grade → point mapping.
#[derive(Debug, Clone)]
pub struct LetterGrades {
    points: HashMap<&'static str, u8>,
}

impl LetterGrades {
    /// The failing grade; excluded from both GPA sums.
    pub const FAIL: &'static str = "U";

    /// Grade point for `letter` (whitespace-trimmed), if it is a known token.
    pub fn points(&self, letter: &str) -> Option<u8> {
        self.points.get(letter.trim()).copied()
    }

    pub fn is_fail(letter: &str) -> bool {
        letter.trim() == Self::FAIL
    }
}

impl Default for LetterGrades {
    fn default() -> Self {
        Self {
            points: LETTER_POINTS.iter().copied().collect(),
        }
    }
}
