use std::{collections::HashMap, fmt, fs, io::Cursor, path::Path, slice};

use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;
use tracing::{debug, warn};

/// Columns a data line is expected to carry: first name, two unused, field.
const RECORD_COLUMNS: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("Cannot load the database")]
    LoadFailure,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Record {
    pub first_name: String,
    pub field: String,
}

impl Record {
    /// Reads column 0 and column 3 positionally. Absent columns come back empty.
    pub fn from_record(record: &StringRecord) -> Record {
        let first_name = record.get(0).unwrap_or_default().to_string();
        let field = record.get(3).unwrap_or_default().to_string();

        Record { first_name, field }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Roster {
    pub header: Option<String>,
    pub records: Vec<Record>,
}

impl Roster {
    /// Number of data lines. Content without even a header line counts as 0
    /// students rather than -1.
    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn field_groups(&self) -> FieldGroups {
        let mut groups = FieldGroups::default();

        for record in self.records.iter() {
            groups.insert(&record.field, &record.first_name);
        }

        groups
    }

    pub fn report(&self) -> Report {
        Report {
            total: self.total(),
            groups: self.field_groups(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldGroup {
    pub field: String,
    pub names: Vec<String>,
}

impl FieldGroup {
    pub fn count(&self) -> usize {
        self.names.len()
    }
}

/// First names keyed by field label.
///
/// Iteration yields groups in the order their label was first inserted, and
/// names within a group in insertion order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldGroups {
    groups: Vec<FieldGroup>,
    index: HashMap<String, usize>,
}

impl FieldGroups {
    pub fn insert(&mut self, field: &str, first_name: &str) {
        let slot = match self.index.get(field) {
            Some(&slot) => slot,
            None => {
                let slot = self.groups.len();
                self.groups.push(FieldGroup {
                    field: field.to_owned(),
                    names: vec![],
                });
                self.index.insert(field.to_owned(), slot);
                slot
            }
        };

        self.groups[slot].names.push(first_name.to_owned());
    }

    pub fn get(&self, field: &str) -> Option<&FieldGroup> {
        self.index.get(field).map(|&slot| &self.groups[slot])
    }

    pub fn iter(&self) -> slice::Iter<'_, FieldGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<'a> IntoIterator for &'a FieldGroups {
    type Item = &'a FieldGroup;
    type IntoIter = slice::Iter<'a, FieldGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    pub total: usize,
    pub groups: FieldGroups,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of students: {}", self.total)?;

        for group in &self.groups {
            writeln!(
                f,
                "Number of students in {}: {}. List: {}",
                group.field,
                group.count(),
                group.names.join(", ")
            )?;
        }

        Ok(())
    }
}

/// Splits roster text into a header and data records.
///
/// Fields are split on bare commas; quotes carry no meaning. Lines that are
/// blank after trimming are dropped before the header is picked, so they
/// never count as students.
pub fn parse_roster(content: &str) -> Result<Roster, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // short records are kept, not rejected
        .quoting(false)
        .from_reader(Cursor::new(content.trim().as_bytes()));

    let mut header: Option<String> = None;
    let mut records: Vec<Record> = vec![];

    for result in rdr.records() {
        let record = result.map_err(|e| {
            debug!(error = %e, "failed to parse roster");
            LoadError::LoadFailure
        })?;

        if is_blank(&record) {
            continue;
        }

        if header.is_none() {
            header = Some(record.iter().collect::<Vec<_>>().join(","));
            continue;
        }

        if record.len() < RECORD_COLUMNS {
            let line = record.position().map(|p| p.line());
            warn!(?line, columns = record.len(), "short record: {:?}", record);
        }

        records.push(Record::from_record(&record));
    }

    debug!(records = records.len(), "parsed roster");

    Ok(Roster { header, records })
}

/// A line holding nothing but whitespace, with no commas.
fn is_blank(record: &StringRecord) -> bool {
    record.len() <= 1 && record.get(0).map_or(true, |f| f.trim().is_empty())
}

pub fn load_roster<P: AsRef<Path>>(path: P) -> Result<Roster, LoadError> {
    let path = path.as_ref();

    let content = fs::read_to_string(path).map_err(|e| {
        debug!(path = %path.display(), error = %e, "failed to read roster");
        LoadError::LoadFailure
    })?;

    parse_roster(&content)
}

/// Loads the roster at `path` and prints its report to stdout.
pub fn count_students<P: AsRef<Path>>(path: P) -> Result<Report, LoadError> {
    let report = load_roster(path)?.report();

    print!("{}", report);

    Ok(report)
}
