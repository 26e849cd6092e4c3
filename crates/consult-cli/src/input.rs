//! Loading business figures from files

use crate::cli::{DataFormat, InputArgs};
use anyhow::{Context, Result};
use consult_analysis::BusinessInputs;
use std::path::Path;

/// Figures selected by `--input` or `--sample`, validated
pub fn load_inputs(args: &InputArgs) -> Result<BusinessInputs> {
    let inputs = match &args.input {
        Some(path) => read_inputs(path)?,
        None => BusinessInputs::sample(),
    };
    inputs.validate()?;
    Ok(inputs)
}

/// Read a JSON or TOML file, chosen by extension (JSON unless `.toml`)
pub fn read_inputs(path: &Path) -> Result<BusinessInputs> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_inputs(&text, format_for(path))
        .with_context(|| format!("Invalid business figures in {}", path.display()))
}

pub fn parse_inputs(text: &str, format: DataFormat) -> Result<BusinessInputs> {
    Ok(match format {
        DataFormat::Json => serde_json::from_str(text)?,
        DataFormat::Toml => toml::from_str(text)?,
    })
}

pub fn format_for(path: &Path) -> DataFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("toml") => DataFormat::Toml,
        _ => DataFormat::Json,
    }
}

/// Demo figures serialized in `format`
pub fn sample_document(format: DataFormat) -> Result<String> {
    let sample = BusinessInputs::sample();
    Ok(match format {
        DataFormat::Json => serde_json::to_string_pretty(&sample)?,
        DataFormat::Toml => toml::to_string_pretty(&sample)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(format_for(Path::new("q3.toml")), DataFormat::Toml);
        assert_eq!(format_for(Path::new("Q3.TOML")), DataFormat::Toml);
        assert_eq!(format_for(Path::new("q3.json")), DataFormat::Json);
        assert_eq!(format_for(Path::new("figures")), DataFormat::Json);
    }

    #[test]
    fn test_sample_documents_parse_back() {
        for format in [DataFormat::Json, DataFormat::Toml] {
            let doc = sample_document(format).unwrap();
            assert_eq!(parse_inputs(&doc, format).unwrap(), BusinessInputs::sample());
        }
    }

    #[test]
    fn test_toml_sample_has_tables() {
        let doc = sample_document(DataFormat::Toml).unwrap();
        assert!(doc.contains("[financial]"));
        assert!(doc.contains("[marketing]"));
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = read_inputs(Path::new("/nonexistent/figures.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/figures.json"));
    }

    #[test]
    fn test_load_sample() {
        let args = InputArgs {
            input: None,
            sample: true,
        };
        let inputs = load_inputs(&args).unwrap();
        assert_eq!(inputs.financial.shares_outstanding, 50_000.0);
    }

    #[test]
    fn test_load_rejects_out_of_range_file() {
        let mut sample = BusinessInputs::sample();
        sample.marketing.gross_margin_pct = 65.0;
        let path: PathBuf = std::env::temp_dir().join(format!("consult-cli-{}.json", std::process::id()));
        std::fs::write(&path, serde_json::to_string(&sample).unwrap()).unwrap();

        let result = load_inputs(&InputArgs {
            input: Some(path.clone()),
            sample: false,
        });
        std::fs::remove_file(&path).unwrap();

        let err = result.unwrap_err();
        assert!(err.to_string().contains("between 0 and 1"));
    }
}
