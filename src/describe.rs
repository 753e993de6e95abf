//! Property description synthesis.
//!
//! One fixed, explicit field order: type, city/state, neighborhood,
//! bedroom/bathroom counts, area, price, free-text description, amenities,
//! features. The indexing job embeds exactly this text, and search results
//! echo it as the match reason, so any drift in the ordering would make
//! stored and compared embeddings incomparable. Nothing else in the crate
//! is allowed to assemble this text.

use crate::models::PropertyRecord;

/// Render the canonical embedding text for a property.
pub fn synthesize(record: &PropertyRecord) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(9);

    parts.push(format!(
        "{} en {}, {}.",
        record.property_type.label_es(),
        record.city,
        record.state
    ));

    if let Some(neighborhood) = record.neighborhood.as_deref() {
        if !neighborhood.trim().is_empty() {
            parts.push(format!("Colonia {}.", neighborhood.trim()));
        }
    }

    if record.bedrooms > 0 || record.bathrooms > 0 {
        let mut rooms = Vec::with_capacity(2);
        if record.bedrooms > 0 {
            rooms.push(plural(record.bedrooms, "recámara", "recámaras"));
        }
        if record.bathrooms > 0 {
            rooms.push(plural(record.bathrooms, "baño", "baños"));
        }
        parts.push(format!("{}.", rooms.join(", ")));
    }

    if let Some(area) = record.area_m2 {
        if area > 0.0 {
            parts.push(format!("{} m² de construcción.", trim_float(area)));
        }
    }

    parts.push(format!("Precio: {} MXN.", format_mxn(record.price)));

    let description = record.description.trim();
    if !description.is_empty() {
        parts.push(description.to_string());
    }

    if !record.amenities.is_empty() {
        parts.push(format!("Amenidades: {}.", record.amenities.join(", ")));
    }

    if !record.features.is_empty() {
        parts.push(format!("Características: {}.", record.features.join(", ")));
    }

    parts.join(" ")
}

fn plural(count: u32, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("1 {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// "$2,500,000": integer part grouped by thousands, fractions dropped.
pub fn format_mxn(price: f64) -> String {
    let whole = price.round().max(0.0) as u64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("${grouped}")
}

fn trim_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as u64)
    } else {
        format!("{value:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyType;
    use chrono::Utc;

    fn full_record() -> PropertyRecord {
        PropertyRecord {
            id: "prop-1".to_string(),
            title: "Casa en Cancún".to_string(),
            description: "Amplia casa con alberca y jardín privado".to_string(),
            property_type: PropertyType::House,
            city: "Cancún".to_string(),
            state: "Quintana Roo".to_string(),
            neighborhood: Some("Supermanzana 17".to_string()),
            price: 2_500_000.0,
            bedrooms: 3,
            bathrooms: 2,
            area_m2: Some(220.0),
            amenities: vec!["alberca".to_string(), "jardín".to_string()],
            features: vec!["cocina integral".to_string()],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_field_order_is_fixed() {
        let text = synthesize(&full_record());
        let positions = [
            text.find("Casa en Cancún, Quintana Roo").unwrap(),
            text.find("Colonia Supermanzana 17").unwrap(),
            text.find("3 recámaras, 2 baños").unwrap(),
            text.find("220 m²").unwrap(),
            text.find("Precio: $2,500,000 MXN").unwrap(),
            text.find("Amplia casa con alberca").unwrap(),
            text.find("Amenidades: alberca, jardín").unwrap(),
            text.find("Características: cocina integral").unwrap(),
        ];
        for pair in positions.windows(2) {
            assert!(pair[0] < pair[1], "field order drifted: {text}");
        }
    }

    #[test]
    fn test_synthesize_is_deterministic() {
        let record = full_record();
        assert_eq!(synthesize(&record), synthesize(&record));
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let mut record = full_record();
        record.neighborhood = None;
        record.area_m2 = None;
        record.description = String::new();
        record.amenities.clear();
        record.features.clear();
        let text = synthesize(&record);
        assert!(!text.contains("Colonia"));
        assert!(!text.contains("m²"));
        assert!(!text.contains("Amenidades"));
        assert!(!text.contains("Características"));
        assert!(text.contains("Precio: $2,500,000 MXN"));
    }

    #[test]
    fn test_singular_room_counts() {
        let mut record = full_record();
        record.bedrooms = 1;
        record.bathrooms = 1;
        let text = synthesize(&record);
        assert!(text.contains("1 recámara, 1 baño"));
    }

    #[test]
    fn test_land_without_rooms() {
        let mut record = full_record();
        record.property_type = PropertyType::Land;
        record.bedrooms = 0;
        record.bathrooms = 0;
        let text = synthesize(&record);
        assert!(text.starts_with("Terreno en Cancún"));
        assert!(!text.contains("recámara"));
        assert!(!text.contains("baño"));
    }

    #[test]
    fn test_format_mxn_groups_thousands() {
        assert_eq!(format_mxn(0.0), "$0");
        assert_eq!(format_mxn(950.0), "$950");
        assert_eq!(format_mxn(8_500.0), "$8,500");
        assert_eq!(format_mxn(2_500_000.0), "$2,500,000");
        assert_eq!(format_mxn(12_345_678.0), "$12,345,678");
    }

    #[test]
    fn test_format_mxn_rounds_fractions() {
        assert_eq!(format_mxn(1_999_999.6), "$2,000,000");
    }
}
