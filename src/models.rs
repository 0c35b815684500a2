use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub input_file: String,
    pub sheet_name: String,
    pub output_directory: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_file: "grade_tracker_form.xlsx".to_string(),
            sheet_name: "Sheet1".to_string(),
            output_directory: Some("output".to_string()),
        }
    }
}

impl Config {
    pub fn load_from_file(file_path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(file_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, file_path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(file_path, content)?;
        Ok(())
    }
}

/// One raw spreadsheet row, before any grade parsing.
/// The two grade fields hold the free text exactly as the student typed it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    pub name: String,
    pub school: String,
    pub year: String,
    pub raw_current: String,
    pub raw_predicted: String,
}

/// True for cell content that carries no grade information
/// ("-", "n/a" and friends, or nothing at all).
pub fn is_blank_cell(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    text.is_empty() || matches!(text.as_str(), "-" | "n/a" | "na" | "nan")
}
