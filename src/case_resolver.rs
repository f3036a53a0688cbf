// src/case_resolver.rs

use crate::types::VehicleType;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

static CASE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)").expect("literal regex"));

/// Extract the leading numeric prefix of a file name,
/// e.g. "3_two_cars.jpg" -> Some(3). No prefix -> None.
pub fn extract_case_id(source_name: &str) -> Option<u32> {
    let base = Path::new(source_name).file_name()?.to_str()?;
    CASE_ID_RE.captures(base)?.get(1)?.as_str().parse().ok()
}

/// Maps a scene case id to the hand-authored left-to-right vehicle types
/// for that scene, and assigns one type per detected box.
pub struct CaseResolver {
    table: BTreeMap<u32, Vec<VehicleType>>,
    fallback: VehicleType,
}

impl CaseResolver {
    pub fn new(table: BTreeMap<u32, Vec<VehicleType>>, fallback: VehicleType) -> Self {
        Self { table, fallback }
    }

    /// Returns exactly `detected` types, one per box in ascending-x order.
    ///
    /// Unknown or absent case ids assign the fallback type to every box.
    /// Length mismatches are resolved explicitly: surplus case entries are
    /// ignored, surplus detections receive the fallback type.
    pub fn resolve(&self, case_id: Option<u32>, detected: usize) -> Vec<VehicleType> {
        let Some(expected) = case_id.and_then(|id| self.table.get(&id)) else {
            if let Some(id) = case_id {
                debug!(
                    "Unknown case id {id}, assigning {} to all {detected} detection(s)",
                    self.fallback
                );
            }
            return vec![self.fallback; detected];
        };

        if expected.len() > detected {
            debug!(
                "Case lists {} vehicle(s) but only {detected} detected, ignoring surplus entries",
                expected.len()
            );
        } else if expected.len() < detected {
            debug!(
                "{detected} detection(s) exceed the {} case entries, padding with {}",
                expected.len(),
                self.fallback
            );
        }

        (0..detected)
            .map(|i| expected.get(i).copied().unwrap_or(self.fallback))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> CaseResolver {
        let table = BTreeMap::from([
            (1, vec![VehicleType::Hatchback, VehicleType::Suv]),
            (5, vec![VehicleType::Truck]),
        ]);
        CaseResolver::new(table, VehicleType::Suv)
    }

    #[test]
    fn test_extract_case_id_leading_digits() {
        assert_eq!(extract_case_id("3_two_cars.jpg"), Some(3));
        assert_eq!(extract_case_id("12.png"), Some(12));
        assert_eq!(extract_case_id("test_cases/7_street.jpg"), Some(7));
    }

    #[test]
    fn test_extract_case_id_without_prefix() {
        assert_eq!(extract_case_id("street.jpg"), None);
        assert_eq!(extract_case_id("case_3.jpg"), None);
        assert_eq!(extract_case_id(""), None);
    }

    #[test]
    fn test_unknown_case_assigns_fallback_to_all() {
        let types = resolver().resolve(Some(99), 3);
        assert_eq!(types, vec![VehicleType::Suv; 3]);
    }

    #[test]
    fn test_absent_case_id_assigns_fallback() {
        let types = resolver().resolve(None, 2);
        assert_eq!(types, vec![VehicleType::Suv; 2]);
    }

    #[test]
    fn test_known_case_assigns_positionally() {
        let types = resolver().resolve(Some(1), 2);
        assert_eq!(types, vec![VehicleType::Hatchback, VehicleType::Suv]);
    }

    #[test]
    fn test_excess_detections_padded_with_fallback() {
        let types = resolver().resolve(Some(5), 3);
        assert_eq!(
            types,
            vec![VehicleType::Truck, VehicleType::Suv, VehicleType::Suv]
        );
    }

    #[test]
    fn test_surplus_case_entries_ignored() {
        let types = resolver().resolve(Some(1), 1);
        assert_eq!(types, vec![VehicleType::Hatchback]);
    }
}
