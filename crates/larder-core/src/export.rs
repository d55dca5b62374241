use crate::{models::FoodItem, Error, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Markdown,
}

impl ExportFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            "md" | "markdown" => Some(ExportFormat::Markdown),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "md",
        }
    }
}

/// Exporter for saved inventory items
pub struct Exporter;

impl Exporter {
    /// Export items to a file with automatic format detection
    pub fn export_to_file<P: AsRef<Path>>(items: &[FoodItem], path: P) -> Result<()> {
        let path = path.as_ref();

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ExportFormat::from_extension)
            .ok_or_else(|| {
                Error::Config(
                    "Could not determine export format from extension. Use .json, .csv, or .md"
                        .to_string(),
                )
            })?;

        Self::export_to_file_with_format(items, path, format)
    }

    /// Export items to a file with explicit format
    pub fn export_to_file_with_format<P: AsRef<Path>>(
        items: &[FoodItem],
        path: P,
        format: ExportFormat,
    ) -> Result<()> {
        let content = match format {
            ExportFormat::Json => Self::to_json(items)?,
            ExportFormat::Csv => Self::to_csv(items),
            ExportFormat::Markdown => Self::to_markdown(items),
        };

        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;

        Ok(())
    }

    pub fn to_json(items: &[FoodItem]) -> Result<String> {
        Ok(serde_json::to_string_pretty(items)?)
    }

    pub fn to_csv(items: &[FoodItem]) -> String {
        let mut output = String::new();

        output.push_str("Code,Name,Brand,Quantity,Unit,Nutri-Score,Expiration Date,Saved At\n");

        for item in items {
            let expiration = item
                .expiration_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();

            output.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                Self::escape_csv(&item.code),
                Self::escape_csv(&item.product_name),
                Self::escape_csv(&item.brands),
                item.quantity,
                item.unit,
                item.nutriscore_grade.as_deref().unwrap_or(""),
                expiration,
                item.created_at.format("%Y-%m-%d"),
            ));
        }

        output
    }

    pub fn to_markdown(items: &[FoodItem]) -> String {
        let mut output = String::new();

        output.push_str("# Saved Foods\n\n");
        output.push_str("| Code | Name | Brand | Qty | Expires |\n");
        output.push_str("|------|------|-------|-----|---------|\n");

        for item in items {
            let expiration = item
                .expiration_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string());

            output.push_str(&format!(
                "| {} | {} | {} | {} {} | {} |\n",
                item.code, item.product_name, item.brands, item.quantity, item.unit, expiration,
            ));
        }

        output
    }

    /// Quote a CSV field when it contains a comma, quote, or newline.
    fn escape_csv(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }
}
