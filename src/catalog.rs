// src/catalog.rs

use serde::Deserialize;

/// Option sets offered by the selector fields of the form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub companies: Vec<String>,
    #[serde(default = "default_bill_types")]
    pub bill_types: Vec<String>,
    #[serde(default = "default_items")]
    pub items: Vec<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            companies: Vec::new(),
            bill_types: default_bill_types(),
            items: default_items(),
        }
    }
}

fn default_bill_types() -> Vec<String> {
    ["DUPLICATE - SELLERS COPY", "BUYERS COPY", "Quote", "Receipt"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_items() -> Vec<String> {
    [
        "M.S. Pipe",
        "M.S. Angle",
        "M.S. Flat",
        "M.S. Channel",
        "G.I. Sheet",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Catalog {
    pub fn is_bill_type(&self, value: &str) -> bool {
        let value = value.trim();
        self.bill_types.iter().any(|t| t == value)
    }

    pub fn has_company(&self, value: &str) -> bool {
        contains_ignore_case(&self.companies, value)
    }

    pub fn has_item(&self, value: &str) -> bool {
        contains_ignore_case(&self.items, value)
    }
}

fn contains_ignore_case(list: &[String], value: &str) -> bool {
    let value = value.trim();
    list.iter().any(|v| v.eq_ignore_ascii_case(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bill_types_are_the_four_copies() {
        let catalog = Catalog::default();
        assert_eq!(catalog.bill_types.len(), 4);
        assert!(catalog.is_bill_type("BUYERS COPY"));
        assert!(catalog.is_bill_type(" Quote "));
        assert!(!catalog.is_bill_type("quote"));
        assert!(!catalog.is_bill_type(""));
    }

    #[test]
    fn company_lookup_ignores_case() {
        let catalog = Catalog {
            companies: vec!["Acme Steel".to_string()],
            ..Catalog::default()
        };
        assert!(catalog.has_company("acme steel"));
        assert!(!catalog.has_company("Acme"));
    }
}
