use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CatalogEntry {
    pub country: &'static str,
    pub capital: &'static str,
    pub region: &'static str,
}

impl CatalogEntry {
    const fn new(country: &'static str, capital: &'static str, region: &'static str) -> Self {
        Self {
            country,
            capital,
            region,
        }
    }

    /// Route-facing label, e.g. `"Berlin, Germany"`.
    pub fn label(&self) -> String {
        format!("{}, {}", self.capital, self.country)
    }
}

pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry::new("Germany", "Berlin", "Europe"),
    CatalogEntry::new("France", "Paris", "Europe"),
    CatalogEntry::new("Netherlands", "Amsterdam", "Europe"),
    CatalogEntry::new("United Kingdom", "London", "Europe"),
    CatalogEntry::new("Spain", "Madrid", "Europe"),
    CatalogEntry::new("Italy", "Rome", "Europe"),
    CatalogEntry::new("Poland", "Warsaw", "Europe"),
    CatalogEntry::new("Sweden", "Stockholm", "Europe"),
    CatalogEntry::new("Austria", "Vienna", "Europe"),
    CatalogEntry::new("Belgium", "Brussels", "Europe"),
    CatalogEntry::new("United States", "Washington, D.C.", "North America"),
    CatalogEntry::new("Canada", "Ottawa", "North America"),
    CatalogEntry::new("Mexico", "Mexico City", "North America"),
    CatalogEntry::new("Brazil", "Brasilia", "South America"),
    CatalogEntry::new("Argentina", "Buenos Aires", "South America"),
    CatalogEntry::new("Chile", "Santiago", "South America"),
    CatalogEntry::new("Japan", "Tokyo", "Asia"),
    CatalogEntry::new("China", "Beijing", "Asia"),
    CatalogEntry::new("South Korea", "Seoul", "Asia"),
    CatalogEntry::new("India", "New Delhi", "Asia"),
    CatalogEntry::new("Singapore", "Singapore", "Asia"),
    CatalogEntry::new("Thailand", "Bangkok", "Asia"),
    CatalogEntry::new("United Arab Emirates", "Abu Dhabi", "Middle East"),
    CatalogEntry::new("Turkey", "Ankara", "Middle East"),
    CatalogEntry::new("Egypt", "Cairo", "Africa"),
    CatalogEntry::new("Nigeria", "Abuja", "Africa"),
    CatalogEntry::new("Kenya", "Nairobi", "Africa"),
    CatalogEntry::new("South Africa", "Pretoria", "Africa"),
    CatalogEntry::new("Australia", "Canberra", "Oceania"),
    CatalogEntry::new("New Zealand", "Wellington", "Oceania"),
];

pub fn labels() -> impl Iterator<Item = String> {
    CATALOG.iter().map(CatalogEntry::label)
}

pub fn find(label: &str) -> Option<&'static CatalogEntry> {
    let label = label.trim();
    CATALOG.iter().find(|entry| entry.label() == label)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{CATALOG, find, labels};

    #[test]
    fn labels_are_unique() {
        let unique: HashSet<String> = labels().collect();
        assert_eq!(unique.len(), CATALOG.len());
    }

    #[test]
    fn find_matches_capital_and_country() {
        let berlin = find("Berlin, Germany").unwrap();
        assert_eq!(berlin.country, "Germany");
        assert_eq!(berlin.region, "Europe");

        assert!(find("  Tokyo, Japan ").is_some());
        assert!(find("Atlantis, Nowhere").is_none());
    }
}
