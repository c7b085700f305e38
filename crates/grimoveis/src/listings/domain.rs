use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};
use uuid::Uuid;

/// Literal stored in place of a numeric price when the price is not published.
pub const PRICE_ON_REQUEST: &str = "ASK FOR PRICE";

/// Opaque, server-generated listing identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub String);

impl ListingId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ListingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    House,
    Apartment,
    Land,
    Commercial,
}

impl PropertyType {
    pub const LABELS: [&'static str; 4] = ["house", "apartment", "land", "commercial"];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "house" => Some(Self::House),
            "apartment" => Some(Self::Apartment),
            "land" => Some(Self::Land),
            "commercial" => Some(Self::Commercial),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::House => "house",
            Self::Apartment => "apartment",
            Self::Land => "land",
            Self::Commercial => "commercial",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Sale,
    Lease,
}

impl Purpose {
    pub const LABELS: [&'static str; 2] = ["sale", "lease"];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "sale" => Some(Self::Sale),
            "lease" => Some(Self::Lease),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Lease => "lease",
        }
    }
}

/// Asking price: a non-negative amount or the "ask for price" sentinel.
///
/// Amounts keep the JSON number exactly as submitted, so `350000` is never
/// echoed back as `350000.0`. Consumers that aggregate prices must handle
/// [`Price::OnRequest`] explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum Price {
    Amount(Number),
    OnRequest,
}

impl Price {
    pub fn amount(&self) -> Option<f64> {
        match self {
            Price::Amount(number) => number.as_f64(),
            Price::OnRequest => None,
        }
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Price::Amount(number) => number.serialize(serializer),
            Price::OnRequest => serializer.serialize_str(PRICE_ON_REQUEST),
        }
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(number) => Ok(Price::Amount(number)),
            Value::String(text) if text == PRICE_ON_REQUEST => Ok(Price::OnRequest),
            other => Err(D::Error::custom(format!(
                "expected a number or \"{PRICE_ON_REQUEST}\", got {other}"
            ))),
        }
    }
}

/// A persisted property listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub city: String,
    pub neighborhood: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub purpose: Purpose,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area: Number,
    /// Present only for condominium units.
    pub condo_fee: Option<Number>,
    pub has_pool: bool,
    pub has_garage: bool,
    pub featured: bool,
    pub images: Vec<String>,
    pub views: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    pub fn from_draft(id: ListingId, draft: ListingDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            price: draft.price,
            city: draft.city,
            neighborhood: draft.neighborhood,
            property_type: draft.property_type,
            purpose: draft.purpose,
            bedrooms: draft.bedrooms,
            bathrooms: draft.bathrooms,
            area: draft.area,
            condo_fee: draft.condo_fee,
            has_pool: draft.has_pool,
            has_garage: draft.has_garage,
            featured: draft.featured,
            images: draft.images,
            views: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_condominium(&self) -> bool {
        self.condo_fee.is_some()
    }

    /// Merges the supplied fields; everything the patch leaves out stays as is.
    pub fn apply(&mut self, patch: &ListingPatch, now: DateTime<Utc>) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(price) = &patch.price {
            self.price = price.clone();
        }
        if let Some(city) = &patch.city {
            self.city = city.clone();
        }
        if let Some(neighborhood) = &patch.neighborhood {
            self.neighborhood = neighborhood.clone();
        }
        if let Some(property_type) = patch.property_type {
            self.property_type = property_type;
        }
        if let Some(purpose) = patch.purpose {
            self.purpose = purpose;
        }
        if let Some(bedrooms) = patch.bedrooms {
            self.bedrooms = bedrooms;
        }
        if let Some(bathrooms) = patch.bathrooms {
            self.bathrooms = bathrooms;
        }
        if let Some(area) = &patch.area {
            self.area = area.clone();
        }
        if let Some(condo_fee) = &patch.condo_fee {
            self.condo_fee = condo_fee.clone();
        }
        if let Some(has_pool) = patch.has_pool {
            self.has_pool = has_pool;
        }
        if let Some(has_garage) = patch.has_garage {
            self.has_garage = has_garage;
        }
        if let Some(featured) = patch.featured {
            self.featured = featured;
        }
        if let Some(images) = &patch.images {
            self.images = images.clone();
        }
        self.updated_at = now.max(self.updated_at);
    }
}

/// A fully validated creation payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub price: Price,
    pub city: String,
    pub neighborhood: String,
    pub property_type: PropertyType,
    pub purpose: Purpose,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area: Number,
    pub condo_fee: Option<Number>,
    pub has_pool: bool,
    pub has_garage: bool,
    pub featured: bool,
    pub images: Vec<String>,
}

/// A validated partial update. `None` means "leave unchanged"; for the condo
/// fee, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub property_type: Option<PropertyType>,
    pub purpose: Option<Purpose>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub area: Option<Number>,
    pub condo_fee: Option<Option<Number>>,
    pub has_pool: Option<bool>,
    pub has_garage: Option<bool>,
    pub featured: Option<bool>,
    pub images: Option<Vec<String>>,
}

impl ListingPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Completes the patch into a draft when every required field is present.
    pub fn into_draft(self) -> Option<ListingDraft> {
        Some(ListingDraft {
            title: self.title?,
            description: self.description?,
            price: self.price?,
            city: self.city?,
            neighborhood: self.neighborhood?,
            property_type: self.property_type?,
            purpose: self.purpose?,
            bedrooms: self.bedrooms?,
            bathrooms: self.bathrooms?,
            area: self.area?,
            condo_fee: self.condo_fee.flatten(),
            has_pool: self.has_pool.unwrap_or(false),
            has_garage: self.has_garage.unwrap_or(false),
            featured: self.featured.unwrap_or(false),
            images: self.images?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sentinel_price_serializes_as_the_literal_string() {
        assert_eq!(
            serde_json::to_value(Price::OnRequest).expect("serialize"),
            json!("ASK FOR PRICE")
        );
        let parsed: Price = serde_json::from_value(json!("ASK FOR PRICE")).expect("parse");
        assert_eq!(parsed, Price::OnRequest);
        assert_eq!(parsed.amount(), None);
    }

    #[test]
    fn integer_prices_keep_their_representation() {
        let parsed: Price = serde_json::from_value(json!(350000)).expect("parse");
        assert_eq!(serde_json::to_string(&parsed).expect("serialize"), "350000");
        assert_eq!(parsed.amount(), Some(350000.0));
    }

    #[test]
    fn other_strings_are_not_prices() {
        assert!(serde_json::from_value::<Price>(json!("ask for price")).is_err());
    }
}
