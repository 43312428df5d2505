use serde::{Deserialize, Serialize};

use crate::songprint::MatchResult;

/// Output format for match results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Simple song name format: "Artist - Song"
    Simple,
    /// Full JSON with all metadata
    Json,
    /// CSV format for logging
    Csv,
    /// Custom format with placeholders
    Custom(&'static str),
}

/// Formatted match output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutput {
    pub format: String,
    pub content: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl MatchOutput {
    /// Format a match result according to the specified format
    pub fn format_result(result: &MatchResult, format: OutputFormat) -> Self {
        let content = match format {
            OutputFormat::Simple => match &result.artist_name {
                Some(artist) => format!("{} - {}", artist, result.song_name),
                None => result.song_name.clone(),
            },
            OutputFormat::Json => {
                serde_json::to_string(&result).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Csv => {
                format!(
                    "\"{}\",\"{}\",\"{:.2}\",\"{}\",\"{}\"",
                    result.song_name,
                    result.artist_name.as_deref().unwrap_or(""),
                    result.offset_seconds,
                    result.score,
                    result.recognition_timestamp.format("%Y-%m-%d %H:%M:%S UTC")
                )
            }
            OutputFormat::Custom(template) => Self::format_custom(result, template),
        };

        MatchOutput {
            format: format.to_string(),
            content,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Format using a custom template with placeholders
    fn format_custom(result: &MatchResult, template: &str) -> String {
        template
            .replace("{song}", &result.song_name)
            .replace("{artist}", result.artist_name.as_deref().unwrap_or("Unknown"))
            .replace("{offset}", &format!("{:.2}", result.offset_seconds))
            .replace("{score}", &result.score.to_string())
            .replace(
                "{timestamp}",
                &result
                    .recognition_timestamp
                    .format("%Y-%m-%d %H:%M:%S UTC")
                    .to_string(),
            )
    }

    /// Get CSV header
    pub fn csv_header() -> &'static str {
        "\"Song\",\"Artist\",\"Offset\",\"Score\",\"Timestamp\""
    }
}

impl std::fmt::Display for MatchOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Simple => write!(f, "Simple"),
            OutputFormat::Json => write!(f, "Json"),
            OutputFormat::Csv => write!(f, "Csv"),
            OutputFormat::Custom(template) => write!(f, "Custom({})", template),
        }
    }
}
