//! Schema checks applied to inbound listing payloads before they reach a store.
//!
//! Every field is checked and every violation is reported, so a client can fix
//! a payload in one round trip. Malformed input never panics or errors out of
//! band: it is the expected failure and comes back as a list of messages.

use serde_json::{Map, Number, Value};
use url::Url;

use super::domain::{ListingDraft, ListingPatch, Price, PropertyType, Purpose, PRICE_ON_REQUEST};

/// Whether required fields must be present (`Create`) or may be omitted (`Update`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    Create,
    Update,
}

/// Ordered, human-readable violations for one payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .messages.join("; "))]
pub struct ValidationErrors {
    messages: Vec<String>,
}

impl ValidationErrors {
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }

    /// True when some message names `field`.
    pub fn mentions(&self, field: &str) -> bool {
        let quoted = format!("\"{field}");
        self.messages.iter().any(|message| message.starts_with(&quoted))
    }
}

pub(crate) const TITLE: &str = "title";
pub(crate) const DESCRIPTION: &str = "description";
pub(crate) const PRICE: &str = "price";
pub(crate) const CITY: &str = "city";
pub(crate) const NEIGHBORHOOD: &str = "neighborhood";
pub(crate) const TYPE: &str = "type";
pub(crate) const CONDO_FEE: &str = "condoFee";
pub(crate) const BEDROOMS: &str = "bedrooms";
pub(crate) const BATHROOMS: &str = "bathrooms";
pub(crate) const HAS_POOL: &str = "hasPool";
pub(crate) const HAS_GARAGE: &str = "hasGarage";
pub(crate) const AREA: &str = "area";
pub(crate) const IMAGES: &str = "images";
pub(crate) const FEATURED: &str = "featured";
pub(crate) const PURPOSE: &str = "purpose";

/// Client-settable fields in reporting order.
pub const RECOGNIZED_FIELDS: [&str; 15] = [
    TITLE,
    DESCRIPTION,
    PRICE,
    CITY,
    NEIGHBORHOOD,
    TYPE,
    CONDO_FEE,
    BEDROOMS,
    BATHROOMS,
    HAS_POOL,
    HAS_GARAGE,
    AREA,
    IMAGES,
    FEATURED,
    PURPOSE,
];

/// Checks `payload` against the listing schema.
///
/// In `Create` mode the returned patch carries every required field.
pub fn validate(payload: &Value, mode: ValidationMode) -> Result<ListingPatch, ValidationErrors> {
    let Some(fields) = payload.as_object() else {
        return Err(ValidationErrors::new(vec![
            "\"value\" must be of type object".to_string(),
        ]));
    };

    let mut reader = FieldReader::new(fields, mode);
    let patch = ListingPatch {
        title: reader.text(TITLE, 3, 100, true),
        description: reader.text(DESCRIPTION, 10, 1000, false),
        price: reader.price(),
        city: reader.text(CITY, 2, 50, false),
        neighborhood: reader.text(NEIGHBORHOOD, 2, 50, false),
        property_type: reader.choice(TYPE, PropertyType::parse, &PropertyType::LABELS),
        condo_fee: reader.condo_fee(),
        bedrooms: reader.count(BEDROOMS),
        bathrooms: reader.count(BATHROOMS),
        has_pool: reader.flag(HAS_POOL),
        has_garage: reader.flag(HAS_GARAGE),
        area: reader.amount(AREA, true),
        images: reader.images(),
        featured: reader.flag(FEATURED),
        purpose: reader.choice(PURPOSE, Purpose::parse, &Purpose::LABELS),
    };
    reader.reject_unknown();

    reader.finish(patch)
}

pub fn validate_create(payload: &Value) -> Result<ListingDraft, ValidationErrors> {
    validate(payload, ValidationMode::Create)?
        .into_draft()
        .ok_or_else(|| ValidationErrors::new(vec!["listing payload is incomplete".to_string()]))
}

pub fn validate_update(payload: &Value) -> Result<ListingPatch, ValidationErrors> {
    validate(payload, ValidationMode::Update)
}

struct FieldReader<'a> {
    fields: &'a Map<String, Value>,
    mode: ValidationMode,
    messages: Vec<String>,
}

impl<'a> FieldReader<'a> {
    fn new(fields: &'a Map<String, Value>, mode: ValidationMode) -> Self {
        Self {
            fields,
            mode,
            messages: Vec::new(),
        }
    }

    fn violation(&mut self, key: &str, detail: impl std::fmt::Display) {
        self.messages.push(format!("\"{key}\" {detail}"));
    }

    fn field(&mut self, key: &str, required: bool) -> Option<&'a Value> {
        let fields = self.fields;
        let value = fields.get(key);
        if value.is_none() && required && self.mode == ValidationMode::Create {
            self.violation(key, "is required");
        }
        value
    }

    fn text(&mut self, key: &str, min: usize, max: usize, trim: bool) -> Option<String> {
        let Value::String(raw) = self.field(key, true)? else {
            self.violation(key, "must be a string");
            return None;
        };
        let text = if trim { raw.trim() } else { raw.as_str() };
        let length = text.chars().count();

        if length == 0 {
            self.violation(key, "is not allowed to be empty");
            None
        } else if length < min {
            self.violation(key, format!("length must be at least {min} characters long"));
            None
        } else if length > max {
            self.violation(
                key,
                format!("length must be less than or equal to {max} characters long"),
            );
            None
        } else {
            Some(text.to_string())
        }
    }

    fn choice<T>(&mut self, key: &str, parse: fn(&str) -> Option<T>, labels: &[&str]) -> Option<T> {
        let value = self.field(key, true)?;
        match value.as_str().and_then(parse) {
            Some(choice) => Some(choice),
            None => {
                self.violation(key, format!("must be one of [{}]", labels.join(", ")));
                None
            }
        }
    }

    fn non_negative(&mut self, key: &str, value: &Value) -> Option<Number> {
        let Value::Number(number) = value else {
            self.violation(key, "must be a number");
            return None;
        };
        match number.as_f64() {
            Some(amount) if amount >= 0.0 => Some(number.clone()),
            _ => {
                self.violation(key, "must be greater than or equal to 0");
                None
            }
        }
    }

    fn amount(&mut self, key: &str, required: bool) -> Option<Number> {
        let value = self.field(key, required)?;
        self.non_negative(key, value)
    }

    fn count(&mut self, key: &str) -> Option<u32> {
        let value = self.field(key, true)?;
        let number = self.non_negative(key, value)?;

        let whole = match number.as_u64() {
            Some(whole) => Some(whole),
            None => number
                .as_f64()
                .filter(|amount| amount.fract() == 0.0 && *amount <= u32::MAX as f64)
                .map(|amount| amount as u64),
        };

        match whole.map(u32::try_from) {
            Some(Ok(count)) => Some(count),
            Some(Err(_)) => {
                self.violation(key, format!("must be less than or equal to {}", u32::MAX));
                None
            }
            None => {
                self.violation(key, "must be an integer");
                None
            }
        }
    }

    fn flag(&mut self, key: &str) -> Option<bool> {
        match self.field(key, false)? {
            Value::Bool(flag) => Some(*flag),
            _ => {
                self.violation(key, "must be a boolean");
                None
            }
        }
    }

    fn price(&mut self) -> Option<Price> {
        match self.field(PRICE, true)? {
            Value::String(text) if text == PRICE_ON_REQUEST => Some(Price::OnRequest),
            Value::Number(number) if number.as_f64().is_some_and(|amount| amount >= 0.0) => {
                Some(Price::Amount(number.clone()))
            }
            _ => {
                self.violation(
                    PRICE,
                    format!("must be a number greater than or equal to 0 or \"{PRICE_ON_REQUEST}\""),
                );
                None
            }
        }
    }

    fn condo_fee(&mut self) -> Option<Option<Number>> {
        match self.field(CONDO_FEE, false)? {
            Value::Null => Some(None),
            value => self.non_negative(CONDO_FEE, value).map(Some),
        }
    }

    fn images(&mut self) -> Option<Vec<String>> {
        let Value::Array(items) = self.field(IMAGES, true)? else {
            self.violation(IMAGES, "must be an array");
            return None;
        };
        if items.is_empty() {
            self.violation(IMAGES, "must contain at least 1 items");
            return None;
        }

        let mut images = Vec::with_capacity(items.len());
        let mut valid = true;
        for (index, item) in items.iter().enumerate() {
            let key = format!("{IMAGES}[{index}]");
            match item {
                Value::String(uri) if Url::parse(uri).is_ok() => images.push(uri.clone()),
                Value::String(_) => {
                    self.violation(&key, "must be a valid uri");
                    valid = false;
                }
                _ => {
                    self.violation(&key, "must be a string");
                    valid = false;
                }
            }
        }

        valid.then_some(images)
    }

    fn reject_unknown(&mut self) {
        let fields = self.fields;
        let unknown: Vec<&String> = fields
            .keys()
            .filter(|key| !RECOGNIZED_FIELDS.contains(&key.as_str()))
            .collect();
        for key in unknown {
            self.violation(key, "is not allowed");
        }
    }

    fn finish(self, patch: ListingPatch) -> Result<ListingPatch, ValidationErrors> {
        if self.messages.is_empty() {
            Ok(patch)
        } else {
            Err(ValidationErrors::new(self.messages))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete_payload() -> Value {
        json!({
            "title": "Casa com piscina",
            "description": "Casa ampla com quatro quartos e quintal.",
            "price": 450000,
            "city": "Curitiba",
            "neighborhood": "Batel",
            "type": "house",
            "purpose": "sale",
            "bedrooms": 4,
            "bathrooms": 3,
            "area": 220.5,
            "hasPool": true,
            "images": ["https://res.cloudinary.com/demo/image/upload/casa.jpg"]
        })
    }

    fn without(field: &str) -> Value {
        let mut payload = complete_payload();
        payload
            .as_object_mut()
            .expect("object payload")
            .remove(field);
        payload
    }

    #[test]
    fn complete_payload_becomes_a_draft_with_defaults() {
        let draft = validate_create(&complete_payload()).expect("valid payload");
        assert_eq!(draft.title, "Casa com piscina");
        assert_eq!(draft.property_type, PropertyType::House);
        assert_eq!(draft.purpose, Purpose::Sale);
        assert_eq!(draft.bedrooms, 4);
        assert!(draft.has_pool);
        assert!(!draft.has_garage);
        assert!(!draft.featured);
        assert_eq!(draft.condo_fee, None);
    }

    #[test]
    fn every_missing_required_field_is_named() {
        for field in [
            TITLE,
            DESCRIPTION,
            PRICE,
            CITY,
            NEIGHBORHOOD,
            TYPE,
            PURPOSE,
            BEDROOMS,
            BATHROOMS,
            AREA,
            IMAGES,
        ] {
            let errors = validate_create(&without(field)).expect_err("field is required");
            assert_eq!(
                errors.messages(),
                &[format!("\"{field}\" is required")],
                "missing {field}"
            );
        }
    }

    #[test]
    fn optional_fields_may_be_omitted_on_create() {
        for field in [CONDO_FEE, HAS_POOL, HAS_GARAGE, FEATURED] {
            assert!(validate_create(&without(field)).is_ok(), "{field} is optional");
        }
    }

    #[test]
    fn violations_are_collected_not_fail_fast() {
        let payload = json!({
            "title": "ab",
            "description": "short",
            "price": -1,
            "city": "Curitiba",
            "neighborhood": "Batel",
            "type": "castle",
            "purpose": "rent",
            "bedrooms": 1.5,
            "bathrooms": -2,
            "area": "big",
            "images": []
        });

        let errors = validate_create(&payload).expect_err("invalid payload");
        assert_eq!(
            errors.messages(),
            &[
                "\"title\" length must be at least 3 characters long".to_string(),
                "\"description\" length must be at least 10 characters long".to_string(),
                "\"price\" must be a number greater than or equal to 0 or \"ASK FOR PRICE\""
                    .to_string(),
                "\"type\" must be one of [house, apartment, land, commercial]".to_string(),
                "\"bedrooms\" must be an integer".to_string(),
                "\"bathrooms\" must be greater than or equal to 0".to_string(),
                "\"area\" must be a number".to_string(),
                "\"images\" must contain at least 1 items".to_string(),
                "\"purpose\" must be one of [sale, lease]".to_string(),
            ]
        );
    }

    #[test]
    fn price_accepts_only_the_exact_sentinel() {
        let mut payload = complete_payload();
        payload["price"] = json!("ASK FOR PRICE");
        let draft = validate_create(&payload).expect("sentinel accepted");
        assert_eq!(draft.price, Price::OnRequest);

        for rejected in [json!("ask for price"), json!("100000"), json!(-0.5), json!(null)] {
            payload["price"] = rejected.clone();
            let errors = validate_create(&payload).expect_err("rejected price");
            assert!(errors.mentions(PRICE), "{rejected} should be rejected");
        }
    }

    #[test]
    fn condo_fee_accepts_null_and_non_negative_numbers() {
        let mut payload = complete_payload();
        payload["condoFee"] = json!(null);
        assert_eq!(validate_create(&payload).expect("null fee").condo_fee, None);

        payload["condoFee"] = json!(850);
        assert_eq!(
            validate_create(&payload).expect("numeric fee").condo_fee,
            Some(Number::from(850))
        );

        payload["condoFee"] = json!(-10);
        assert!(validate_create(&payload)
            .expect_err("negative fee")
            .mentions(CONDO_FEE));
    }

    #[test]
    fn images_must_be_absolute_uris() {
        let mut payload = complete_payload();
        payload["images"] = json!(["https://cdn.example.com/a.jpg", "not a uri", 7]);

        let errors = validate_create(&payload).expect_err("bad images");
        assert_eq!(
            errors.messages(),
            &[
                "\"images[1]\" must be a valid uri".to_string(),
                "\"images[2]\" must be a string".to_string(),
            ]
        );
        assert!(errors.mentions(IMAGES));
    }

    #[test]
    fn whole_floats_count_as_integers() {
        let mut payload = complete_payload();
        payload["bedrooms"] = json!(2.0);
        assert_eq!(validate_create(&payload).expect("whole float").bedrooms, 2);
    }

    #[test]
    fn title_is_trimmed_before_length_checks() {
        let mut payload = complete_payload();
        payload["title"] = json!("   Loft   ");
        assert_eq!(validate_create(&payload).expect("trimmed").title, "Loft");

        payload["title"] = json!("  a  ");
        assert!(validate_create(&payload).expect_err("too short").mentions(TITLE));
    }

    #[test]
    fn system_and_unknown_fields_are_not_allowed() {
        let mut payload = complete_payload();
        payload["views"] = json!(1000);
        payload["id"] = json!("abc");

        let errors = validate_create(&payload).expect_err("system fields");
        assert_eq!(
            errors.messages(),
            &[
                "\"id\" is not allowed".to_string(),
                "\"views\" is not allowed".to_string(),
            ]
        );
    }

    #[test]
    fn update_mode_allows_partial_payloads() {
        let patch = validate_update(&json!({ "city": "Londrina" })).expect("partial update");
        assert_eq!(patch.city.as_deref(), Some("Londrina"));
        assert!(patch.title.is_none());
        assert!(patch.condo_fee.is_none());

        assert!(validate_update(&json!({})).expect("empty update").is_empty());
    }

    #[test]
    fn update_mode_still_checks_supplied_fields() {
        let errors = validate_update(&json!({ "type": "villa", "bedrooms": null }))
            .expect_err("bad update");
        assert!(errors.mentions(TYPE));
        assert!(errors.mentions(BEDROOMS));
    }

    #[test]
    fn update_mode_can_clear_the_condo_fee() {
        let patch = validate_update(&json!({ "condoFee": null })).expect("clear fee");
        assert_eq!(patch.condo_fee, Some(None));
    }

    #[test]
    fn non_object_payloads_are_reported() {
        let errors = validate(&json!([1, 2]), ValidationMode::Update).expect_err("array body");
        assert_eq!(errors.messages(), &["\"value\" must be of type object".to_string()]);
    }
}
