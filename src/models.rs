use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// What the search value identifies: a student, a center by its 5-digit
/// number, or a center by its name. Each variant maps to exactly one remote
/// lookup function, so an unrecognised search type cannot reach the wire.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Name,
    Number,
    School,
}

impl SearchType {
    pub fn parse(raw: &str) -> Option<SearchType> {
        match raw {
            "name" => Some(SearchType::Name),
            "number" => Some(SearchType::Number),
            "school" => Some(SearchType::School),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::Name => "name",
            SearchType::Number => "number",
            SearchType::School => "school",
        }
    }

    /// Label shown on the results page summary
    pub fn display_label(self) -> &'static str {
        match self {
            SearchType::Name => "Student Name",
            SearchType::Number => "Center Number",
            SearchType::School => "School/Center",
        }
    }
}

/// Examination level codes as stored by the results service
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum LevelCode {
    #[value(name = "OLG")]
    Olg,
    #[value(name = "OLT")]
    Olt,
    #[value(name = "ALG")]
    Alg,
    #[value(name = "ALT")]
    Alt,
}

impl LevelCode {
    pub fn parse(raw: &str) -> Option<LevelCode> {
        match raw {
            "OLG" => Some(LevelCode::Olg),
            "OLT" => Some(LevelCode::Olt),
            "ALG" => Some(LevelCode::Alg),
            "ALT" => Some(LevelCode::Alt),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LevelCode::Olg => "OLG",
            LevelCode::Olt => "OLT",
            LevelCode::Alg => "ALG",
            LevelCode::Alt => "ALT",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            LevelCode::Olg => "O-Level General",
            LevelCode::Olt => "O-Level Technical",
            LevelCode::Alg => "A-Level General",
            LevelCode::Alt => "A-Level Technical",
        }
    }
}

/// One result row as returned by the lookup functions. Read-only for the
/// lifetime of a page view; the level stays a raw string so a code we do not
/// know about still renders and filters.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SearchResult {
    pub record_id: String,
    pub student_name: String,
    pub center_name: String,
    pub center_number: String,
    pub level: String,
    pub year: i32,
    #[serde(default)]
    pub papers_passed: String,
    #[serde(default)]
    pub student_grades: String,
    pub entry_date: String,
}

impl SearchResult {
    /// Grades split out of the comma-joined column, empty entries dropped
    pub fn grades(&self) -> Vec<&str> {
        split_list(&self.student_grades)
    }

    /// Passed papers split out of the comma-joined column
    pub fn papers(&self) -> Vec<&str> {
        split_list(&self.papers_passed)
    }

    /// Human-readable level, falling back to the raw code
    pub fn level_display(&self) -> &str {
        LevelCode::parse(&self.level)
            .map(LevelCode::display_name)
            .unwrap_or(&self.level)
    }
}

fn split_list(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_codes_round_trip_and_display() {
        for (code, display) in [
            ("OLG", "O-Level General"),
            ("OLT", "O-Level Technical"),
            ("ALG", "A-Level General"),
            ("ALT", "A-Level Technical"),
        ] {
            let level = LevelCode::parse(code).unwrap();
            assert_eq!(level.as_str(), code);
            assert_eq!(level.display_name(), display);
        }
        assert_eq!(LevelCode::parse("XYZ"), None);
        assert_eq!(LevelCode::parse("olg"), None);
    }

    #[test]
    fn search_types_round_trip() {
        for raw in ["name", "number", "school"] {
            assert_eq!(SearchType::parse(raw).unwrap().as_str(), raw);
        }
        assert_eq!(SearchType::parse("Name"), None);
        assert_eq!(SearchType::parse(""), None);
    }

    #[test]
    fn comma_joined_columns_split_cleanly() {
        let result = SearchResult {
            record_id: "r1".into(),
            student_name: "Jane Doe".into(),
            center_name: "Hillcrest".into(),
            center_number: "10021".into(),
            level: "OLG".into(),
            year: 2023,
            papers_passed: "Mathematics, English Language,,Biology ".into(),
            student_grades: "".into(),
            entry_date: "2023-08-01".into(),
        };
        assert_eq!(
            result.papers(),
            vec!["Mathematics", "English Language", "Biology"]
        );
        assert!(result.grades().is_empty());
        assert_eq!(result.level_display(), "O-Level General");
    }
}
