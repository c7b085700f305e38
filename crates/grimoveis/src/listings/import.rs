//! CSV seed files for the listing store.
//!
//! One listing per row, columns named like the JSON fields. `images` holds
//! `|`-separated URIs; an empty `price` means the sentinel; empty optional
//! columns are left out. Each row goes through create-mode validation.

use serde::Deserialize;
use serde_json::{Map, Number, Value};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::domain::{ListingDraft, PRICE_ON_REQUEST};
use super::validation::{
    validate_create, ValidationErrors, AREA, BATHROOMS, BEDROOMS, CITY, CONDO_FEE, DESCRIPTION,
    FEATURED, HAS_GARAGE, HAS_POOL, IMAGES, NEIGHBORHOOD, PRICE, PURPOSE, TITLE, TYPE,
};

#[derive(Debug)]
pub enum ListingImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    /// `row` is 1-based and excludes the header.
    InvalidRow { row: usize, errors: ValidationErrors },
}

impl std::fmt::Display for ListingImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingImportError::Io(err) => write!(f, "failed to read listing seed: {}", err),
            ListingImportError::Csv(err) => write!(f, "invalid listing CSV data: {}", err),
            ListingImportError::InvalidRow { row, errors } => {
                write!(f, "row {} is not a valid listing: {}", row, errors)
            }
        }
    }
}

impl std::error::Error for ListingImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListingImportError::Io(err) => Some(err),
            ListingImportError::Csv(err) => Some(err),
            ListingImportError::InvalidRow { errors, .. } => Some(errors),
        }
    }
}

impl From<std::io::Error> for ListingImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ListingImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingRow {
    title: String,
    description: String,
    #[serde(default)]
    price: String,
    city: String,
    neighborhood: String,
    #[serde(rename = "type")]
    property_type: String,
    purpose: String,
    bedrooms: String,
    bathrooms: String,
    area: String,
    #[serde(default)]
    condo_fee: String,
    #[serde(default)]
    has_pool: String,
    #[serde(default)]
    has_garage: String,
    #[serde(default)]
    featured: String,
    images: String,
}

impl ListingRow {
    fn into_payload(self) -> Value {
        let mut payload = Map::new();
        payload.insert(TITLE.into(), Value::String(self.title));
        payload.insert(DESCRIPTION.into(), Value::String(self.description));
        payload.insert(PRICE.into(), price_cell(&self.price));
        payload.insert(CITY.into(), Value::String(self.city));
        payload.insert(NEIGHBORHOOD.into(), Value::String(self.neighborhood));
        payload.insert(TYPE.into(), Value::String(self.property_type));
        payload.insert(PURPOSE.into(), Value::String(self.purpose));
        payload.insert(BEDROOMS.into(), number_cell(&self.bedrooms));
        payload.insert(BATHROOMS.into(), number_cell(&self.bathrooms));
        payload.insert(AREA.into(), number_cell(&self.area));

        for (key, raw) in [
            (CONDO_FEE, &self.condo_fee),
            (HAS_POOL, &self.has_pool),
            (HAS_GARAGE, &self.has_garage),
            (FEATURED, &self.featured),
        ] {
            if raw.is_empty() {
                continue;
            }
            let cell = if key == CONDO_FEE {
                number_cell(raw)
            } else {
                flag_cell(raw)
            };
            payload.insert(key.into(), cell);
        }

        let images = self
            .images
            .split('|')
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
            .map(|uri| Value::String(uri.to_string()))
            .collect();
        payload.insert(IMAGES.into(), Value::Array(images));

        Value::Object(payload)
    }
}

/// Unparsable numbers stay strings so validation reports them.
fn number_cell(raw: &str) -> Value {
    match serde_json::from_str::<Number>(raw) {
        Ok(number) => Value::Number(number),
        Err(_) => Value::String(raw.to_string()),
    }
}

fn price_cell(raw: &str) -> Value {
    if raw.is_empty() {
        Value::String(PRICE_ON_REQUEST.to_string())
    } else {
        number_cell(raw)
    }
}

fn flag_cell(raw: &str) -> Value {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Value::Bool(true),
        "false" | "no" | "0" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

pub struct ListingImporter;

impl ListingImporter {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Vec<ListingDraft>, ListingImportError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Parses every row; the first invalid row aborts the import.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ListingDraft>, ListingImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut drafts = Vec::new();

        for (index, record) in csv_reader.deserialize::<ListingRow>().enumerate() {
            let payload = record?.into_payload();
            let draft = validate_create(&payload).map_err(|errors| {
                ListingImportError::InvalidRow {
                    row: index + 1,
                    errors,
                }
            })?;
            drafts.push(draft);
        }

        Ok(drafts)
    }
}
