//! Dataset file discovery rules.

use std::path::Path;

/// File name suffixes that mark a file as a dataset document.
pub const DATA_SUFFIXES: [&str; 4] =
    ["_data.yaml", "_data.yml", "_data.json", "_data.csv"];

/// Whether a path looks like a dataset file.
pub fn is_dataset_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    DATA_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognizes_dataset_suffixes() {
        assert!(is_dataset_file(Path::new("data/countries_data.json")));
        assert!(is_dataset_file(Path::new("units/base_SI_units_data.yaml")));
        assert!(is_dataset_file(Path::new("prefixes_data.yml")));
        assert!(is_dataset_file(Path::new("languages_data.csv")));
    }

    #[test]
    fn test_rejects_other_files() {
        assert!(!is_dataset_file(Path::new("countries_schema.yaml")));
        assert!(!is_dataset_file(Path::new("notes.yaml")));
        assert!(!is_dataset_file(Path::new("countries_data.toml")));
    }
}
