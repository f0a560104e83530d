//! Output formatting for the podwire CLI
//!
//! Commands build a serializable result and hand it to [`Output`], which
//! renders it as a human-readable table or as JSON.
//!
//! Automatically detects TTY context to decide on colors.

use clap::ValueEnum;
use serde::Serialize;
use std::io::IsTerminal;
use std::str::FromStr;

mod json;

pub use self::json::JsonOutput;

/// Output format for CLI results
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format (default)
    #[default]
    Table,
    /// JSON format for machine consumption
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: '{}'", s)),
        }
    }
}

/// Configuration for output rendering
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Disable colored output
    pub no_color: bool,
}

impl OutputConfig {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            no_color: false,
        }
    }

    /// Create an OutputConfig with automatic TTY detection and optional color override.
    ///
    /// Colors are off when stdout is not a TTY, unless `color_override` is
    /// `Some(true)`. `Some(false)` always turns them off.
    pub fn auto_detect_with_color_override(
        format: OutputFormat,
        color_override: Option<bool>,
    ) -> Self {
        let use_color = color_override.unwrap_or_else(|| std::io::stdout().is_terminal());
        Self {
            no_color: !use_color,
            ..Self::new(format)
        }
    }

    pub fn use_colors(&self) -> bool {
        !self.no_color
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

/// Types that can be displayed as a table.
///
/// JSON rendering comes from `Serialize`.
pub trait TableDisplay: Serialize {
    fn to_table(&self) -> String;
}

/// Result wrapper for formatted output
pub struct Output<'a, T> {
    data: T,
    config: &'a OutputConfig,
}

impl<'a, T: TableDisplay> Output<'a, T> {
    pub fn new(data: T, config: &'a OutputConfig) -> Self {
        Self { data, config }
    }

    /// Get the rendered string without printing
    pub fn render_to_string(&self) -> String {
        match self.config.format {
            OutputFormat::Table => self.data.to_table(),
            OutputFormat::Json => JsonOutput::format(&self.data),
        }
    }

    /// Render the output to stdout
    pub fn render(&self) -> anyhow::Result<()> {
        println!("{}", self.render_to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Greeting {
        name: String,
    }

    impl TableDisplay for Greeting {
        fn to_table(&self) -> String {
            format!("Hello, {}", self.name)
        }
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("table".parse::<OutputFormat>(), Ok(OutputFormat::Table));
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("csv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_color_override() {
        let on = OutputConfig::auto_detect_with_color_override(OutputFormat::Table, Some(true));
        assert!(on.use_colors());
        let off = OutputConfig::auto_detect_with_color_override(OutputFormat::Table, Some(false));
        assert!(!off.use_colors());
    }

    #[test]
    fn test_render_by_format() {
        let greeting = || Greeting {
            name: "App".to_string(),
        };

        let table = OutputConfig::new(OutputFormat::Table);
        assert_eq!(Output::new(greeting(), &table).render_to_string(), "Hello, App");

        let json = OutputConfig::new(OutputFormat::Json);
        assert!(Output::new(greeting(), &json)
            .render_to_string()
            .contains("\"name\": \"App\""));
    }
}
