//! Tag catalog loading
//!
//! A catalog is a plain text file with one `display name,tag id` pair per line.
//! The tag id is the deduplication key: the first display name seen for a tag
//! wins and output order follows first occurrence.

use crate::errors::CatalogError;
use crate::types::Column;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

const UTF8_BOM: char = '\u{feff}';

/// Lines [`TagCatalog::parse_with_stats`] dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    /// Non-comment lines without a usable `name,tag` pair
    pub malformed: usize,
    /// Entries whose tag id was already taken
    pub duplicates: usize,
}

/// Ordered, deduplicated set of output columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagCatalog {
    columns: Vec<Column>,
}

impl TagCatalog {
    /// Read and parse a catalog file
    ///
    /// Fails only when the file cannot be read; malformed lines are skipped.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::parse(&text);

        info!(
            event_type = "catalog_loaded",
            path = %path.display(),
            columns = catalog.len(),
            "Loaded tag catalog"
        );

        Ok(catalog)
    }

    /// Parse catalog text
    ///
    /// ```rust
    /// use histgrid_core::TagCatalog;
    ///
    /// let catalog = TagCatalog::parse("A,tag1\nB,tag1\n#x,y\nA,tag2\n");
    /// let ids: Vec<_> = catalog.columns().iter().map(|c| c.tag_id.as_str()).collect();
    /// assert_eq!(ids, ["tag1", "tag2"]);
    /// ```
    pub fn parse(text: &str) -> Self {
        Self::parse_with_stats(text).0
    }

    /// Parse catalog text, also counting the lines that were dropped
    pub fn parse_with_stats(text: &str) -> (Self, CatalogStats) {
        let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        let mut stats = CatalogStats::default();

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((name, tag_id)) = split_entry(line) else {
                stats.malformed += 1;
                continue;
            };

            if seen.insert(tag_id.to_string()) {
                columns.push(Column::new(name, tag_id));
            } else {
                stats.duplicates += 1;
            }
        }

        if stats != CatalogStats::default() {
            debug!(
                event_type = "catalog_lines_skipped",
                malformed = stats.malformed,
                duplicates = stats.duplicates,
                "Skipped catalog lines"
            );
        }

        (Self { columns }, stats)
    }

    /// Reject a catalog with no usable entries
    pub fn non_empty(self) -> Result<Self, CatalogError> {
        if self.columns.is_empty() {
            Err(CatalogError::Empty)
        } else {
            Ok(self)
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }
}

impl FromIterator<Column> for TagCatalog {
    /// Build from already-split pairs, applying the same first-wins dedup
    fn from_iter<I: IntoIterator<Item = Column>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let columns = iter
            .into_iter()
            .filter(|c| !c.display_name.is_empty() && !c.tag_id.is_empty())
            .filter(|c| seen.insert(c.tag_id.clone()))
            .collect();
        Self { columns }
    }
}

/// Split a trimmed line at its first comma into (name, tag id)
///
/// The comma must be neither the first nor the last character and both halves
/// must be non-empty after trimming.
fn split_entry(line: &str) -> Option<(&str, &str)> {
    let comma = line.find(',')?;
    if comma == 0 || comma == line.len() - 1 {
        return None;
    }
    let name = line[..comma].trim();
    let tag_id = line[comma + 1..].trim();
    if name.is_empty() || tag_id.is_empty() {
        return None;
    }
    Some((name, tag_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn pairs(catalog: &TagCatalog) -> Vec<(&str, &str)> {
        catalog
            .columns()
            .iter()
            .map(|c| (c.display_name.as_str(), c.tag_id.as_str()))
            .collect()
    }

    #[test]
    fn test_mixed_valid_and_malformed_lines() {
        let (catalog, stats) = TagCatalog::parse_with_stats(
            "A,tag1\nA,tag2\n# comment\nbad-line\n,tag3\nname4,\n",
        );
        assert_eq!(pairs(&catalog), vec![("A", "tag1"), ("A", "tag2")]);
        assert_eq!(
            stats,
            CatalogStats {
                malformed: 3,
                duplicates: 0
            }
        );
    }

    #[test]
    fn test_first_display_name_wins() {
        let catalog = TagCatalog::parse("A,tag1\nB,tag1\n#x,y\nA,tag2\n");
        assert_eq!(pairs(&catalog), vec![("A", "tag1"), ("A", "tag2")]);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let text = "\n   \n,leading\ntrailing,\nnocomma\n  ,  \nname ,  id  \n";
        let catalog = TagCatalog::parse(text);
        assert_eq!(pairs(&catalog), vec![("name", "id")]);
    }

    #[test]
    fn test_only_first_comma_splits() {
        let catalog = TagCatalog::parse("Flow, m3/h,DCS.FT101,extra\n");
        assert_eq!(pairs(&catalog), vec![("Flow", "m3/h,DCS.FT101,extra")]);
    }

    #[test]
    fn test_bom_and_crlf() {
        let catalog = TagCatalog::parse("\u{feff}Temp,T1\r\nPress,P1\r\n");
        assert_eq!(pairs(&catalog), vec![("Temp", "T1"), ("Press", "P1")]);
    }

    #[test]
    fn test_non_empty_rejects_empty_catalog() {
        let catalog = TagCatalog::parse("# only comments\n\n");
        assert!(catalog.is_empty());
        assert!(matches!(catalog.non_empty(), Err(CatalogError::Empty)));
    }

    #[test]
    fn test_from_iter_dedups() {
        let catalog: TagCatalog = vec![
            Column::new("A", "t1"),
            Column::new("B", "t1"),
            Column::new("", "t2"),
            Column::new("C", "t3"),
        ]
        .into_iter()
        .collect();
        assert_eq!(pairs(&catalog), vec![("A", "t1"), ("C", "t3")]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Level,LT201").unwrap();
        writeln!(file, "Level copy,LT201").unwrap();
        let catalog = TagCatalog::load(file.path()).unwrap();
        assert_eq!(pairs(&catalog), vec![("Level", "LT201")]);
    }

    #[test]
    fn test_load_missing_file_is_unreadable() {
        let err = TagCatalog::load("/definitely/not/here/tags.txt").unwrap_err();
        assert!(matches!(err, CatalogError::Unreadable { .. }));
    }
}
