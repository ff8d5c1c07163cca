//! Input Rows - entity metadata from the CSV export

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// `type, id, name, color, looks_like, copy_from`
pub const FIELD_COUNT: usize = 6;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to open input {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Line {line}: expected 6 fields, found {found}")]
    FieldCount { line: u64, found: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRow {
    pub entity_type: String,
    pub id: String,
    pub name: String,
    pub color: String,
    /// Unused.
    pub looks_like: String,
    /// Unused.
    pub copy_from: String,
}

impl InputRow {
    pub fn from_record(record: &csv::StringRecord) -> Result<Self, InputError> {
        if record.len() != FIELD_COUNT {
            return Err(InputError::FieldCount {
                line: record.position().map_or(0, |p| p.line()),
                found: record.len(),
            });
        }
        let field = |i: usize| record.get(i).unwrap_or_default().to_string();
        Ok(Self {
            entity_type: field(0),
            id: field(1),
            name: field(2),
            color: field(3),
            looks_like: field(4),
            copy_from: field(5),
        })
    }

    /// Rows without an id or a name produce no output.
    pub fn is_renderable(&self) -> bool {
        !self.id.is_empty() && !self.name.is_empty()
    }

    /// Lowercased type tag used for preset lookup and the output path.
    pub fn type_tag(&self) -> String {
        self.entity_type.to_lowercase()
    }
}

/// Rows after the header, parsed lazily so a bad row aborts where it occurs.
pub fn read_rows<R: Read>(reader: R) -> impl Iterator<Item = Result<InputRow, InputError>> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader)
        .into_records()
        .map(|record| InputRow::from_record(&record?))
}

pub fn open_rows(path: &Path) -> Result<impl Iterator<Item = Result<InputRow, InputError>>, InputError> {
    let file = File::open(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(read_rows(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
type,id,name,color,looks_like,copy_from
MONSTER,mon_test,Test Creature,c_white,,
item,,Nameless,red,,
item,itm_rock,,red,,
furniture,f_table,A table,\"light_gray\",,
";

    #[test]
    fn test_header_skipped_and_fields_mapped() {
        let rows: Vec<_> = read_rows(CSV.as_bytes()).collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].type_tag(), "monster");
        assert_eq!(rows[0].id, "mon_test");
        assert_eq!(rows[0].color, "c_white");
        assert_eq!(rows[3].color, "light_gray");
    }

    #[test]
    fn test_rows_missing_id_or_name_not_renderable() {
        let rows: Vec<_> = read_rows(CSV.as_bytes()).collect::<Result<_, _>>().unwrap();
        let renderable: Vec<_> = rows.iter().filter(|r| r.is_renderable()).map(|r| r.id.as_str()).collect();
        assert_eq!(renderable, vec!["mon_test", "f_table"]);
    }

    #[test]
    fn test_wrong_field_count_rejected() {
        let data = "type,id,name,color,looks_like,copy_from\nitem,itm_a,A,red\n";
        let err = read_rows(data.as_bytes()).next().unwrap().unwrap_err();
        assert!(matches!(err, InputError::FieldCount { line: 2, found: 4 }));
    }
}
