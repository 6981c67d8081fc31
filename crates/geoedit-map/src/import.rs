//! File import: format dispatch, size limits and decoders.
//!
//! GeoJSON and delimited text are decoded here. Shapefile archives need a
//! caller-provided [`Decoder`]; without one a `.zip` import is rejected.

use crate::ingest::{IngestInput, Row};
use geoedit_core::{Error, IngestionFormatError, PropertyValue, Result};
use geoedit_settings::ImportSettings;
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportFormat {
    /// Comma separated values with a header row
    Csv,
    /// GeoJSON (`.json` or `.geojson`)
    GeoJson,
    /// Zipped shapefile
    Zip,
}

impl ImportFormat {
    pub fn from_extension(extension: &str) -> std::result::Result<Self, IngestionFormatError> {
        match extension.to_ascii_lowercase().as_str() {
            "csv" => Ok(ImportFormat::Csv),
            "json" | "geojson" => Ok(ImportFormat::GeoJson),
            "zip" => Ok(ImportFormat::Zip),
            _ => Err(IngestionFormatError::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }

    /// Picks the format from a file name.
    pub fn from_path(path: &Path) -> std::result::Result<Self, IngestionFormatError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(extension)
    }

    /// Size limit for this format, in bytes.
    pub fn size_limit(self, settings: &ImportSettings) -> u64 {
        match self {
            ImportFormat::Csv => settings.csv_max_bytes,
            ImportFormat::GeoJson => settings.geojson_max_bytes,
            ImportFormat::Zip => settings.zip_max_bytes,
        }
    }
}

impl fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportFormat::Csv => write!(f, "CSV"),
            ImportFormat::GeoJson => write!(f, "GeoJSON"),
            ImportFormat::Zip => write!(f, "Shapefile (zip)"),
        }
    }
}

/// Byte-level decoder for one input format.
pub trait Decoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> std::result::Result<IngestInput, IngestionFormatError>;
}

/// Decodes GeoJSON text.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoJsonDecoder;

impl Decoder for GeoJsonDecoder {
    fn decode(&self, bytes: &[u8]) -> std::result::Result<IngestInput, IngestionFormatError> {
        let text = utf8(bytes)?;
        if text.trim().is_empty() {
            return Err(IngestionFormatError::Empty);
        }
        let value: Value =
            serde_json::from_str(text).map_err(|e| IngestionFormatError::InvalidJson {
                reason: e.to_string(),
            })?;
        Ok(IngestInput::Json(value))
    }
}

/// Decodes delimited text with a header row.
///
/// Cells are typed dynamically: empty cells are null, `true`/`false` are
/// booleans and numeric text becomes a number. Quoted fields may contain
/// delimiters, doubled quotes and line breaks.
#[derive(Debug, Clone, Copy)]
pub struct CsvDecoder {
    pub delimiter: char,
}

impl Default for CsvDecoder {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

impl Decoder for CsvDecoder {
    fn decode(&self, bytes: &[u8]) -> std::result::Result<IngestInput, IngestionFormatError> {
        let text = utf8(bytes)?;
        let records = split_records(text.trim_start_matches('\u{feff}'), self.delimiter)?;

        let mut records = records.into_iter();
        let (_, header) = records.next().ok_or(IngestionFormatError::Empty)?;
        let header: Vec<String> = header.into_iter().map(|h| h.trim().to_string()).collect();

        let mut rows = Vec::new();
        for (line, fields) in records {
            if fields.len() != header.len() {
                return Err(IngestionFormatError::InvalidTable {
                    line,
                    reason: format!("expected {} fields, found {}", header.len(), fields.len()),
                });
            }
            let row: Row = header
                .iter()
                .cloned()
                .zip(fields.iter().map(|f| cell_value(f)))
                .collect();
            rows.push(row);
        }
        Ok(IngestInput::Rows(rows))
    }
}

fn cell_value(text: &str) -> Value {
    match PropertyValue::infer(text) {
        PropertyValue::Null => Value::Null,
        PropertyValue::Bool(b) => Value::Bool(b),
        PropertyValue::Number(n) => Value::Number(n),
        PropertyValue::String(s) => Value::String(s),
    }
}

/// Splits text into records of fields, skipping blank lines. Each record
/// carries the 1-based line it starts on.
fn split_records(
    text: &str,
    delimiter: char,
) -> std::result::Result<Vec<(usize, Vec<String>)>, IngestionFormatError> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut start_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            '\r' => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                push_record(&mut records, start_line, std::mem::take(&mut fields));
                line += 1;
                start_line = line;
            }
            c if c == delimiter => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(IngestionFormatError::InvalidTable {
            line: start_line,
            reason: "unterminated quoted field".to_string(),
        });
    }
    fields.push(field);
    push_record(&mut records, start_line, fields);
    Ok(records)
}

fn push_record(records: &mut Vec<(usize, Vec<String>)>, line: usize, fields: Vec<String>) {
    let blank = fields.len() == 1 && fields[0].trim().is_empty();
    if !blank {
        records.push((line, fields));
    }
}

fn utf8(bytes: &[u8]) -> std::result::Result<&str, IngestionFormatError> {
    std::str::from_utf8(bytes).map_err(|e| IngestionFormatError::Decode {
        reason: e.to_string(),
    })
}

/// Reads files into normalizer input.
pub struct Importer {
    settings: ImportSettings,
    archive_decoder: Option<Box<dyn Decoder>>,
}

impl Importer {
    pub fn new(settings: ImportSettings) -> Self {
        Self {
            settings,
            archive_decoder: None,
        }
    }

    /// Registers the decoder used for `.zip` shapefile archives.
    pub fn with_archive_decoder(mut self, decoder: Box<dyn Decoder>) -> Self {
        self.archive_decoder = Some(decoder);
        self
    }

    /// Rejects inputs over the configured limit for their format.
    pub fn check_size(
        &self,
        format: ImportFormat,
        size: u64,
    ) -> std::result::Result<(), IngestionFormatError> {
        let limit = format.size_limit(&self.settings);
        if size > limit {
            return Err(IngestionFormatError::FileTooLarge { size, limit });
        }
        Ok(())
    }

    /// Decodes bytes of a known format.
    pub fn decode(
        &self,
        format: ImportFormat,
        bytes: &[u8],
    ) -> std::result::Result<IngestInput, IngestionFormatError> {
        self.check_size(format, bytes.len() as u64)?;
        match format {
            ImportFormat::Csv => CsvDecoder::default().decode(bytes),
            ImportFormat::GeoJson => GeoJsonDecoder.decode(bytes),
            ImportFormat::Zip => match &self.archive_decoder {
                Some(decoder) => decoder.decode(bytes),
                None => Err(IngestionFormatError::Decode {
                    reason: "no decoder registered for shapefile archives".to_string(),
                }),
            },
        }
    }

    /// Reads and decodes a file. The size limit is checked before the file
    /// contents are read.
    pub async fn read_file(&self, path: &Path) -> Result<IngestInput> {
        let format = ImportFormat::from_path(path)?;
        let size = tokio::fs::metadata(path).await?.len();
        self.check_size(format, size)?;

        tracing::info!("Reading {} file {}", format, path.display());
        let bytes = tokio::fs::read(path).await?;
        self.decode(format, &bytes).map_err(Error::from)
    }
}

impl Default for Importer {
    fn default() -> Self {
        Self::new(ImportSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_dispatch() {
        assert_eq!(
            ImportFormat::from_path(Path::new("points.CSV")).unwrap(),
            ImportFormat::Csv
        );
        assert_eq!(
            ImportFormat::from_path(Path::new("a.geojson")).unwrap(),
            ImportFormat::GeoJson
        );
        assert_eq!(
            ImportFormat::from_path(Path::new("a.json")).unwrap(),
            ImportFormat::GeoJson
        );
        assert_eq!(
            ImportFormat::from_path(Path::new("a.zip")).unwrap(),
            ImportFormat::Zip
        );
        assert!(matches!(
            ImportFormat::from_path(Path::new("a.kml")),
            Err(IngestionFormatError::UnsupportedFormat { .. })
        ));
        assert!(ImportFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_size_limit() {
        let importer = Importer::new(ImportSettings {
            csv_max_bytes: 4,
            ..Default::default()
        });
        assert!(matches!(
            importer.decode(ImportFormat::Csv, b"a,b\n1,2"),
            Err(IngestionFormatError::FileTooLarge { size: 7, limit: 4 })
        ));
    }

    #[test]
    fn test_csv_typing_and_quotes() {
        let text = "name,lat,lon,visited\n\"Smith, J.\",40.1,47.5,true\n\"say \"\"hi\"\"\",,1,\n";
        let rows = match CsvDecoder::default().decode(text.as_bytes()).unwrap() {
            IngestInput::Rows(rows) => rows,
            other => panic!("expected rows, got {:?}", other),
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], json!("Smith, J."));
        assert_eq!(rows[0]["lat"], json!(40.1));
        assert_eq!(rows[0]["visited"], json!(true));
        assert_eq!(rows[1]["name"], json!("say \"hi\""));
        assert_eq!(rows[1]["lat"], Value::Null);
        assert_eq!(rows[1]["lon"], json!(1));
    }

    #[test]
    fn test_csv_errors() {
        assert!(matches!(
            CsvDecoder::default().decode(b"a,b\n1,2,3\n"),
            Err(IngestionFormatError::InvalidTable { line: 2, .. })
        ));
        assert!(matches!(
            CsvDecoder::default().decode(b"a,b\n\"1,2\n"),
            Err(IngestionFormatError::InvalidTable { .. })
        ));
        assert!(matches!(
            CsvDecoder::default().decode(b""),
            Err(IngestionFormatError::Empty)
        ));
    }

    #[test]
    fn test_geojson_decoder() {
        assert!(matches!(
            GeoJsonDecoder.decode(b"{\"type\": "),
            Err(IngestionFormatError::InvalidJson { .. })
        ));
        assert!(matches!(
            GeoJsonDecoder.decode(b"  "),
            Err(IngestionFormatError::Empty)
        ));
        assert!(matches!(
            GeoJsonDecoder.decode(b"{\"type\": \"FeatureCollection\", \"features\": []}"),
            Ok(IngestInput::Json(_))
        ));
    }

    #[test]
    fn test_zip_requires_decoder() {
        struct OneLayer;
        impl Decoder for OneLayer {
            fn decode(&self, _: &[u8]) -> std::result::Result<IngestInput, IngestionFormatError> {
                Ok(IngestInput::Layers(vec![
                    json!({"type": "FeatureCollection", "features": []}),
                ]))
            }
        }

        assert!(matches!(
            Importer::default().decode(ImportFormat::Zip, b"PK"),
            Err(IngestionFormatError::Decode { .. })
        ));
        let importer = Importer::default().with_archive_decoder(Box::new(OneLayer));
        assert!(matches!(
            importer.decode(ImportFormat::Zip, b"PK"),
            Ok(IngestInput::Layers(_))
        ));
    }
}
