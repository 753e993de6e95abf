//! Translation from a [`PropertyFilter`] to the index's metadata filter DSL
//! (`$eq` / `$gte` / `$lte` / `$in` clauses, implicitly AND-ed).

use serde_json::{json, Map, Value};

use crate::extract::CDMX_BOROUGHS;
use crate::models::PropertyFilter;

/// Build the metadata filter for a query. Returns `None` when the filter has
/// no structured constraints, so the query runs unfiltered.
pub fn to_index_filter(filter: &PropertyFilter) -> Option<Value> {
    let mut clauses = Map::new();

    if let Some(ty) = filter.property_type {
        clauses.insert("propertyType".to_string(), json!({ "$eq": ty.as_str() }));
    }

    // CDMX expands to its boroughs; the index stores borough names as the
    // city for capital listings.
    if filter.cdmx {
        clauses.insert("city".to_string(), json!({ "$in": CDMX_BOROUGHS }));
    } else if let Some(city) = &filter.city {
        clauses.insert("city".to_string(), json!({ "$eq": city }));
    }

    if let Some(state) = &filter.state {
        clauses.insert("state".to_string(), json!({ "$eq": state }));
    }

    let mut price = Map::new();
    if let Some(min) = filter.min_price {
        price.insert("$gte".to_string(), json!(min));
    }
    if let Some(max) = filter.max_price {
        price.insert("$lte".to_string(), json!(max));
    }
    if !price.is_empty() {
        clauses.insert("price".to_string(), Value::Object(price));
    }

    // Room counts are at-least constraints
    if let Some(bedrooms) = filter.bedrooms {
        clauses.insert("bedrooms".to_string(), json!({ "$gte": bedrooms }));
    }
    if let Some(bathrooms) = filter.bathrooms {
        clauses.insert("bathrooms".to_string(), json!({ "$gte": bathrooms }));
    }

    if clauses.is_empty() {
        None
    } else {
        Some(Value::Object(clauses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyType;

    #[test]
    fn test_empty_filter_translates_to_none() {
        assert_eq!(to_index_filter(&PropertyFilter::default()), None);
    }

    #[test]
    fn test_equality_clauses() {
        let filter = PropertyFilter {
            property_type: Some(PropertyType::House),
            city: Some("Cancún".to_string()),
            ..Default::default()
        };
        let dsl = to_index_filter(&filter).unwrap();
        assert_eq!(dsl["propertyType"]["$eq"], "house");
        assert_eq!(dsl["city"]["$eq"], "Cancún");
    }

    #[test]
    fn test_price_band_merges_into_one_clause() {
        let filter = PropertyFilter {
            min_price: Some(1_600_000.0),
            max_price: Some(2_400_000.0),
            ..Default::default()
        };
        let dsl = to_index_filter(&filter).unwrap();
        assert_eq!(dsl["price"]["$gte"], 1_600_000.0);
        assert_eq!(dsl["price"]["$lte"], 2_400_000.0);
    }

    #[test]
    fn test_max_price_only() {
        let filter = PropertyFilter {
            max_price: Some(3_000_000.0),
            ..Default::default()
        };
        let dsl = to_index_filter(&filter).unwrap();
        assert_eq!(dsl["price"]["$lte"], 3_000_000.0);
        assert!(dsl["price"].get("$gte").is_none());
    }

    #[test]
    fn test_room_counts_are_at_least() {
        let filter = PropertyFilter {
            bedrooms: Some(3),
            bathrooms: Some(2),
            ..Default::default()
        };
        let dsl = to_index_filter(&filter).unwrap();
        assert_eq!(dsl["bedrooms"]["$gte"], 3);
        assert_eq!(dsl["bathrooms"]["$gte"], 2);
    }

    #[test]
    fn test_cdmx_expands_to_borough_list() {
        let filter = PropertyFilter {
            cdmx: true,
            ..Default::default()
        };
        let dsl = to_index_filter(&filter).unwrap();
        let boroughs = dsl["city"]["$in"].as_array().unwrap();
        assert_eq!(boroughs.len(), 16);
        assert!(boroughs.iter().any(|b| b == "Coyoacán"));
        assert!(dsl["city"].get("$eq").is_none());
    }

    #[test]
    fn test_cdmx_wins_over_city_string() {
        let filter = PropertyFilter {
            cdmx: true,
            city: Some("Cancún".to_string()),
            ..Default::default()
        };
        let dsl = to_index_filter(&filter).unwrap();
        assert!(dsl["city"].get("$in").is_some());
    }
}
