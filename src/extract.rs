//! Free-text filter extraction.
//!
//! A fixed, ordered set of independent heuristic matchers turns a query like
//! "casa con alberca en Cancún bajo 3 millones" into a structured
//! [`PropertyFilter`]. Matchers never fail: anything they do not recognize is
//! simply left unset. This is deliberately not a full NLU layer.
//!
//! All regex and keyword tables are compiled once in [`FilterExtractor::new`]
//! and injected into the engine, so there is no module-level mutable state.

use regex::Regex;

use crate::models::{PropertyFilter, PropertyType};

/// Boroughs a CDMX-wide query expands to in the index filter. The extractor
/// only raises the flag; the filter translator consumes this list.
pub const CDMX_BOROUGHS: [&str; 16] = [
    "Álvaro Obregón",
    "Azcapotzalco",
    "Benito Juárez",
    "Coyoacán",
    "Cuajimalpa",
    "Cuauhtémoc",
    "Gustavo A. Madero",
    "Iztacalco",
    "Iztapalapa",
    "Magdalena Contreras",
    "Miguel Hidalgo",
    "Milpa Alta",
    "Tláhuac",
    "Tlalpan",
    "Venustiano Carranza",
    "Xochimilco",
];

/// Numbers with optional thousands separators and decimals: 3 / 3.5 / 3,500,000
const AMOUNT: &str = r"((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?)";
/// Magnitude suffix. Million variants precede "mil" so the alternation never
/// stops short inside "millones".
const MAGNITUDE: &str = r"(millones|mill[óo]n|millions?|mil|k|thousand)";

pub struct FilterExtractor {
    max_price: Regex,
    min_price: Regex,
    around_price: Regex,
    bedrooms: Regex,
    bathrooms: Regex,
    type_table: Vec<(PropertyType, Regex)>,
    cdmx: Regex,
    city_table: Vec<(&'static str, Regex)>,
}

impl FilterExtractor {
    pub fn new() -> Self {
        let price = |prefixes: &str| {
            re(&format!(r"(?i)\b(?:{prefixes})\s*\$?\s*{AMOUNT}\s*{MAGNITUDE}?\b"))
        };

        let type_table = [
            (
                PropertyType::House,
                r"casas?|houses?|homes?|residencias?",
            ),
            (
                PropertyType::Apartment,
                r"departamentos?|deptos?|depas?|apartamentos?|apartments?|flats?",
            ),
            (PropertyType::Condo, r"condominios?|condos?"),
            (
                PropertyType::Land,
                r"terrenos?|lotes?|predios?|land|lots?",
            ),
            (
                PropertyType::Commercial,
                r"local(?:es)?\s+comercial(?:es)?|local(?:es)?|commercial|comercial",
            ),
            (PropertyType::Office, r"oficinas?|offices?|despachos?"),
            (
                PropertyType::Warehouse,
                r"bodegas?|warehouses?|naves?\s+industrial(?:es)?|naves?",
            ),
        ]
        .into_iter()
        .map(|(ty, words)| (ty, re(&format!(r"(?i)\b(?:{words})\b"))))
        .collect();

        // Canonical city name + accepted spellings (accented and plain).
        let city_table = [
            ("Cancún", r"canc[úu]n"),
            ("Playa del Carmen", r"playa\s+del\s+carmen"),
            ("Tulum", r"tulum"),
            ("Mérida", r"m[ée]rida"),
            ("Guadalajara", r"guadalajara|gdl"),
            ("Zapopan", r"zapopan"),
            ("Monterrey", r"monterrey|mty"),
            ("Querétaro", r"quer[ée]taro"),
            ("Puebla", r"puebla"),
            ("San Miguel de Allende", r"san\s+miguel\s+de\s+allende"),
            ("Puerto Vallarta", r"(?:puerto\s+)?vallarta"),
            ("Tijuana", r"tijuana"),
            ("León", r"le[óo]n"),
            ("Mazatlán", r"mazatl[áa]n"),
            ("Oaxaca", r"oaxaca"),
            ("Acapulco", r"acapulco"),
            ("Los Cabos", r"los\s+cabos|cabo\s+san\s+lucas"),
            ("Cuernavaca", r"cuernavaca"),
            ("Toluca", r"toluca"),
            ("Aguascalientes", r"aguascalientes"),
        ]
        .into_iter()
        .map(|(name, words)| (name, re(&format!(r"(?i)\b(?:{words})\b"))))
        .collect();

        Self {
            max_price: price(
                r"under|below|less\s+than|up\s+to|at\s+most|bajo|debajo\s+de|menos\s+de|hasta|m[áa]ximo",
            ),
            min_price: price(
                r"over|above|more\s+than|at\s+least|starting\s+at|from|sobre|m[áa]s\s+de|desde|arriba\s+de|m[íi]nimo|a\s+partir\s+de",
            ),
            around_price: price(
                r"around|about|approximately|roughly|cerca\s+de|alrededor\s+de|aproximadamente",
            ),
            bedrooms: re(
                r"(?i)\b(\d+(?:\.\d+)?)\s*(?:bedrooms?|beds?|rec[áa]maras?|habitaci[óo]n(?:es)?|dormitorios?|cuartos?)\b",
            ),
            bathrooms: re(r"(?i)\b(\d+(?:\.\d+)?)\s*(?:bathrooms?|baths?|ba[ñn]os?)\b"),
            type_table,
            cdmx: re(
                r"(?i)\b(?:cdmx|df|distrito\s+federal|ciudad\s+de\s+m[ée]xico|mexico\s+city)\b",
            ),
            city_table,
        }
    }

    /// Run every matcher over the raw query. Never fails; unrecognized
    /// categories stay unset.
    pub fn extract(&self, text: &str) -> PropertyFilter {
        let mut filter = PropertyFilter::default();

        self.extract_price(text, &mut filter);

        if let Some(n) = capture_count(&self.bedrooms, text) {
            filter.bedrooms = Some(n);
        }
        if let Some(n) = capture_count(&self.bathrooms, text) {
            filter.bathrooms = Some(n);
        }

        // Fixed priority order; the first type with a keyword hit wins.
        filter.property_type = self
            .type_table
            .iter()
            .find(|(_, pattern)| pattern.is_match(text))
            .map(|(ty, _)| *ty);

        // A CDMX alias means "anywhere in the capital": raise the borough
        // expansion flag instead of picking one city string.
        if self.cdmx.is_match(text) {
            filter.cdmx = true;
        } else {
            filter.city = self
                .city_table
                .iter()
                .find(|(_, pattern)| pattern.is_match(text))
                .map(|(name, _)| (*name).to_string());
        }

        filter
    }

    /// Price families are tried in a fixed order (max, min, around); the
    /// first family that matches wins and later price mentions are ignored.
    fn extract_price(&self, text: &str, filter: &mut PropertyFilter) {
        if let Some(value) = first_amount(&self.max_price, text) {
            filter.max_price = Some(value);
            return;
        }
        if let Some(value) = first_amount(&self.min_price, text) {
            filter.min_price = Some(value);
            return;
        }
        if let Some(value) = first_amount(&self.around_price, text) {
            // "around X": a ±20% band rather than a point constraint
            filter.min_price = Some(value * 0.8);
            filter.max_price = Some(value * 1.2);
        }
    }
}

impl Default for FilterExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static extractor pattern compiles")
}

/// Parse the first price expression for one regex family.
///
/// A bare small integer without a magnitude suffix or thousands separators is
/// not a price ("hasta 3 recámaras" must not become max_price = 3).
fn first_amount(pattern: &Regex, text: &str) -> Option<f64> {
    let caps = pattern.captures(text)?;
    let raw = caps.get(1)?.as_str();
    let value: f64 = raw.replace(',', "").parse().ok()?;
    let magnitude = caps.get(2).map(|m| m.as_str().to_lowercase());

    let multiplier = match magnitude.as_deref() {
        Some(m) if m.starts_with("mill") => 1_000_000.0,
        Some("mil") | Some("k") | Some("thousand") => 1_000.0,
        Some(_) | None => 1.0,
    };

    let priced = value * multiplier;
    let plausible = magnitude.is_some() || raw.contains(',') || priced >= 100_000.0;
    (plausible && priced.is_finite() && priced > 0.0).then_some(priced)
}

fn capture_count(pattern: &Regex, text: &str) -> Option<u32> {
    let caps = pattern.captures(text)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    // "2.5 baños" counts as 2 for the at-least filter
    let floored = value.floor();
    (floored >= 0.0 && floored <= u32::MAX as f64).then_some(floored as u32)
}
