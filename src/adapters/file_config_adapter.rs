//! INI file configuration adapter.

use crate::domain::error::QuantError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, QuantError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| QuantError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, QuantError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| QuantError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[data]
directory = ./data
codes = AAPL, PETR4.SA

[indicators]
short_window = 50
long_window = 200

[optimizer]
objective = max_sharpe
l2_gamma = 0.1
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("data", "directory"),
            Some("./data".to_string())
        );
        assert_eq!(
            adapter.get_string("indicators", "long_window"),
            Some("200".to_string())
        );
        assert_eq!(
            adapter.get_string("optimizer", "l2_gamma"),
            Some("0.1".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[risk]\nconfidence = 0.95\n").unwrap();
        assert_eq!(adapter.get_string("risk", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn non_numeric_values_come_back_verbatim() {
        let adapter =
            FileConfigAdapter::from_string("[indicators]\nrsi_window = abc\n").unwrap();
        assert_eq!(
            adapter.get_string("indicators", "rsi_window"),
            Some("abc".to_string())
        );
    }

    #[test]
    fn lookups_ignore_case_and_surrounding_whitespace() {
        let adapter =
            FileConfigAdapter::from_string("[Optimizer]\nObjective =   max_sharpe  \n").unwrap();
        assert_eq!(
            adapter.get_string("optimizer", "objective"),
            Some("max_sharpe".to_string())
        );
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[output]\ndirectory = /tmp/reports\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("output", "directory"),
            Some("/tmp/reports".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(QuantError::ConfigParse { .. })));
    }
}
