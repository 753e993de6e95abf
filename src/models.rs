use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical property categories recognized by the catalog.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    House,
    Apartment,
    Condo,
    Land,
    Commercial,
    Office,
    Warehouse,
}

impl PropertyType {
    /// Wire name, also used as the metadata value in the vector index.
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::House => "house",
            PropertyType::Apartment => "apartment",
            PropertyType::Condo => "condo",
            PropertyType::Land => "land",
            PropertyType::Commercial => "commercial",
            PropertyType::Office => "office",
            PropertyType::Warehouse => "warehouse",
        }
    }

    /// Spanish label used in synthesized descriptions and summaries.
    pub fn label_es(&self) -> &'static str {
        match self {
            PropertyType::House => "Casa",
            PropertyType::Apartment => "Departamento",
            PropertyType::Condo => "Condominio",
            PropertyType::Land => "Terreno",
            PropertyType::Commercial => "Local comercial",
            PropertyType::Office => "Oficina",
            PropertyType::Warehouse => "Bodega",
        }
    }
}

/// Structured constraints extracted from free text or supplied by the
/// caller. Every field is independently optional; an absent field imposes
/// no constraint on the vector query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyFilter {
    /// Lower price bound, MXN.
    pub min_price: Option<f64>,
    /// Upper price bound, MXN.
    pub max_price: Option<f64>,
    /// Minimum bedroom count ("at least" semantics).
    pub bedrooms: Option<u32>,
    /// Minimum bathroom count ("at least" semantics).
    pub bathrooms: Option<u32>,
    pub property_type: Option<PropertyType>,
    pub city: Option<String>,
    /// Never set by the extractor; accepted from explicit caller filters.
    pub state: Option<String>,
    /// "Anywhere in CDMX": expanded to the fixed borough list by the
    /// index-filter translator instead of matching a literal city string.
    pub cdmx: bool,
}

impl PropertyFilter {
    /// True when no field constrains the query.
    pub fn is_empty(&self) -> bool {
        self.min_price.is_none()
            && self.max_price.is_none()
            && self.bedrooms.is_none()
            && self.bathrooms.is_none()
            && self.property_type.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && !self.cdmx
    }

    /// Combine extracted filters with caller-supplied ones. Explicit values
    /// win field-by-field; the CDMX flag is kept if either side set it.
    pub fn merge(extracted: PropertyFilter, explicit: Option<PropertyFilter>) -> PropertyFilter {
        let Some(explicit) = explicit else {
            return extracted;
        };
        PropertyFilter {
            min_price: explicit.min_price.or(extracted.min_price),
            max_price: explicit.max_price.or(extracted.max_price),
            bedrooms: explicit.bedrooms.or(extracted.bedrooms),
            bathrooms: explicit.bathrooms.or(extracted.bathrooms),
            property_type: explicit.property_type.or(extracted.property_type),
            city: explicit.city.or(extracted.city),
            state: explicit.state.or(extracted.state),
            cdmx: explicit.cdmx || extracted.cdmx,
        }
    }
}

/// Full property row from the system of record. Owned and mutated only by
/// the relational collaborator; this crate reads it for display and for
/// description synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub property_type: PropertyType,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub neighborhood: Option<String>,
    /// MXN.
    pub price: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    #[serde(default)]
    pub area_m2: Option<f64>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A canonical record enriched with its similarity score and the text the
/// index actually matched against.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedProperty {
    #[serde(flatten)]
    pub property: PropertyRecord,
    pub relevance_score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_reason: Option<String>,
}

/// Search request as received from the outer HTTP layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub filters: Option<PropertyFilter>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default = "default_true")]
    pub include_analysis: bool,
}

fn default_true() -> bool {
    true
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            filters: None,
            limit: None,
            include_analysis: true,
        }
    }
}

/// Search response returned to the outer HTTP layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    /// Effective filter actually applied (extracted + explicit).
    pub filters: PropertyFilter,
    pub properties: Vec<RankedProperty>,
    /// Returned count, after truncation to the requested limit.
    pub total: usize,
    /// Match count after merge, before truncation.
    pub total_matches: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> PropertyRecord {
        PropertyRecord {
            id: "prop-1".to_string(),
            title: "Casa en Cancún".to_string(),
            description: "Amplia casa con alberca".to_string(),
            property_type: PropertyType::House,
            city: "Cancún".to_string(),
            state: "Quintana Roo".to_string(),
            neighborhood: None,
            price: 2_500_000.0,
            bedrooms: 3,
            bathrooms: 2,
            area_m2: Some(220.0),
            amenities: vec!["alberca".to_string()],
            features: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_property_type_serializes_lowercase() {
        let json = serde_json::to_value(PropertyType::House).unwrap();
        assert_eq!(json, "house");
        let json = serde_json::to_value(PropertyType::Warehouse).unwrap();
        assert_eq!(json, "warehouse");
    }

    #[test]
    fn test_property_type_round_trips() {
        let back: PropertyType = serde_json::from_str("\"condo\"").unwrap();
        assert_eq!(back, PropertyType::Condo);
    }

    #[test]
    fn test_filter_uses_camel_case_keys() {
        let filter = PropertyFilter {
            max_price: Some(3_000_000.0),
            property_type: Some(PropertyType::House),
            ..Default::default()
        };
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json["maxPrice"], 3_000_000.0);
        assert_eq!(json["propertyType"], "house");
    }

    #[test]
    fn test_filter_merge_explicit_wins_field_by_field() {
        let extracted = PropertyFilter {
            max_price: Some(2_000_000.0),
            bedrooms: Some(2),
            city: Some("Cancún".to_string()),
            ..Default::default()
        };
        let explicit = PropertyFilter {
            max_price: Some(5_000_000.0),
            bathrooms: Some(2),
            ..Default::default()
        };
        let merged = PropertyFilter::merge(extracted, Some(explicit));
        // Explicit max price replaces the extracted one
        assert_eq!(merged.max_price, Some(5_000_000.0));
        // Fields only one side set are kept
        assert_eq!(merged.bedrooms, Some(2));
        assert_eq!(merged.bathrooms, Some(2));
        assert_eq!(merged.city.as_deref(), Some("Cancún"));
    }

    #[test]
    fn test_filter_merge_without_explicit_is_identity() {
        let extracted = PropertyFilter {
            bedrooms: Some(3),
            ..Default::default()
        };
        let merged = PropertyFilter::merge(extracted.clone(), None);
        assert_eq!(merged, extracted);
    }

    #[test]
    fn test_filter_is_empty() {
        assert!(PropertyFilter::default().is_empty());
        let f = PropertyFilter {
            cdmx: true,
            ..Default::default()
        };
        assert!(!f.is_empty());
    }

    #[test]
    fn test_search_request_defaults() {
        let req: SearchRequest = serde_json::from_str(r#"{"query": "casa en Tulum"}"#).unwrap();
        assert_eq!(req.query, "casa en Tulum");
        assert!(req.filters.is_none());
        assert!(req.limit.is_none());
        assert!(req.include_analysis);
    }

    #[test]
    fn test_ranked_property_flattens_record() {
        let ranked = RankedProperty {
            property: sample_record(),
            relevance_score: 0.91,
            match_reason: None,
        };
        let json = serde_json::to_value(&ranked).unwrap();
        // Record fields sit at the top level next to the score
        assert_eq!(json["id"], "prop-1");
        assert_eq!(json["propertyType"], "house");
        assert!((json["relevanceScore"].as_f64().unwrap() - 0.91).abs() < 1e-6);
        assert!(json.get("matchReason").is_none());
    }

    #[test]
    fn test_property_record_deserializes_with_defaults() {
        let json = r#"{
            "id": "p9",
            "title": "Terreno en Tulum",
            "propertyType": "land",
            "city": "Tulum",
            "state": "Quintana Roo",
            "price": 900000,
            "bedrooms": 0,
            "bathrooms": 0,
            "createdAt": "2024-03-01T12:00:00Z"
        }"#;
        let record: PropertyRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.property_type, PropertyType::Land);
        assert!(record.description.is_empty());
        assert!(record.amenities.is_empty());
        assert!(record.area_m2.is_none());
    }
}
