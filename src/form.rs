// src/form.rs

use crate::catalog::Catalog;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Selector input that switches a field over to free text.
pub const ADD_NEW: &str = "Add New";

/// Every input of the invoice form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    CompanyName,
    CustomCompanyName,
    BillNumber,
    BillType,
    BillDate,
    ConsignmentNumber,
    ItemDescription,
    CustomItemDescription,
    Quantity,
    Bundles,
    Rate,
}

impl Field {
    pub const ALL: [Field; 11] = [
        Field::CompanyName,
        Field::CustomCompanyName,
        Field::BillNumber,
        Field::BillType,
        Field::BillDate,
        Field::ConsignmentNumber,
        Field::ItemDescription,
        Field::CustomItemDescription,
        Field::Quantity,
        Field::Bundles,
        Field::Rate,
    ];

    /// Wire name, also used when reporting errors.
    pub fn name(self) -> &'static str {
        match self {
            Field::CompanyName => "companyName",
            Field::CustomCompanyName => "customCompanyName",
            Field::BillNumber => "billNumber",
            Field::BillType => "billType",
            Field::BillDate => "billDate",
            Field::ConsignmentNumber => "consignmentNumber",
            Field::ItemDescription => "itemDescription",
            Field::CustomItemDescription => "customItemDescription",
            Field::Quantity => "quantity",
            Field::Bundles => "bundles",
            Field::Rate => "rate",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::CompanyName => "Company Name",
            Field::CustomCompanyName => "New Company Name",
            Field::BillNumber => "Bill Number",
            Field::BillType => "Bill Type",
            Field::BillDate => "Bill Date",
            Field::ConsignmentNumber => "Consignment Number",
            Field::ItemDescription => "Item Description",
            Field::CustomItemDescription => "New Item Description",
            Field::Quantity => "Quantity",
            Field::Bundles => "Bundles",
            Field::Rate => "Rate",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State of a selector field that can fall back to free text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selector {
    #[default]
    Empty,
    Predefined(String),
    AddNew { custom: String },
}

impl Selector {
    pub fn from_input(raw: &str) -> Self {
        match raw.trim() {
            "" => Selector::Empty,
            ADD_NEW => Selector::AddNew {
                custom: String::new(),
            },
            value => Selector::Predefined(value.to_string()),
        }
    }

    /// Apply a new selector input. Re-selecting "Add New" keeps the typed text;
    /// anything else replaces the state and drops it.
    fn select(&mut self, raw: &str) {
        let next = Selector::from_input(raw);
        if matches!(
            (&*self, &next),
            (Selector::AddNew { .. }, Selector::AddNew { .. })
        ) {
            return;
        }
        *self = next;
    }

    /// Returns false when the selector is not on "Add New".
    fn set_custom(&mut self, text: &str) -> bool {
        match self {
            Selector::AddNew { custom } => {
                *custom = text.to_string();
                true
            }
            _ => false,
        }
    }

    /// The value the selector shows.
    pub fn selected(&self) -> &str {
        match self {
            Selector::Empty => "",
            Selector::Predefined(value) => value,
            Selector::AddNew { .. } => ADD_NEW,
        }
    }

    pub fn custom_text(&self) -> &str {
        match self {
            Selector::AddNew { custom } => custom,
            _ => "",
        }
    }

    pub fn is_add_new(&self) -> bool {
        matches!(self, Selector::AddNew { .. })
    }

    pub fn resolve(&self) -> Option<Choice> {
        match self {
            Selector::Empty => None,
            Selector::Predefined(value) => Some(Choice::Predefined(value.trim().to_string())),
            Selector::AddNew { custom } if custom.trim().is_empty() => None,
            Selector::AddNew { custom } => Some(Choice::Custom(custom.trim().to_string())),
        }
    }
}

/// A resolved selector value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Predefined(String),
    Custom(String),
}

impl Choice {
    pub fn value(&self) -> &str {
        match self {
            Choice::Predefined(v) | Choice::Custom(v) => v,
        }
    }
}

/// Raw form inputs, exactly as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub company: Selector,
    pub bill_number: String,
    pub bill_type: String,
    pub bill_date: String,
    pub consignment_number: String,
    pub item: Selector,
    pub quantity: String,
    pub bundles: String,
    pub rate: String,
}

impl FormFields {
    /// Update one input. Returns false when the value was ignored because the
    /// paired selector is not on "Add New".
    pub fn set(&mut self, field: Field, value: &str) -> bool {
        match field {
            Field::CompanyName => self.company.select(value),
            Field::CustomCompanyName => return self.company.set_custom(value),
            Field::BillNumber => self.bill_number = value.to_string(),
            Field::BillType => self.bill_type = value.to_string(),
            Field::BillDate => self.bill_date = value.to_string(),
            Field::ConsignmentNumber => self.consignment_number = value.to_string(),
            Field::ItemDescription => self.item.select(value),
            Field::CustomItemDescription => return self.item.set_custom(value),
            Field::Quantity => self.quantity = value.to_string(),
            Field::Bundles => self.bundles = value.to_string(),
            Field::Rate => self.rate = value.to_string(),
        }
        true
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::CompanyName => self.company.selected(),
            Field::CustomCompanyName => self.company.custom_text(),
            Field::BillNumber => &self.bill_number,
            Field::BillType => &self.bill_type,
            Field::BillDate => &self.bill_date,
            Field::ConsignmentNumber => &self.consignment_number,
            Field::ItemDescription => self.item.selected(),
            Field::CustomItemDescription => self.item.custom_text(),
            Field::Quantity => &self.quantity,
            Field::Bundles => &self.bundles,
            Field::Rate => &self.rate,
        }
    }

    /// Replace "Add New" selections with their typed text. `None` while a
    /// selector is still unresolved.
    pub fn resolve(&self) -> Option<InvoicePayload> {
        let company = self.company.resolve()?;
        let item = self.item.resolve()?;
        Some(InvoicePayload {
            company_name: company.value().to_string(),
            bill_number: self.bill_number.trim().to_string(),
            bill_type: self.bill_type.trim().to_string(),
            bill_date: self.bill_date.trim().to_string(),
            consignment_number: self.consignment_number.trim().to_string(),
            item_description: item.value().to_string(),
            quantity: self.quantity.trim().to_string(),
            bundles: self.bundles.trim().to_string(),
            rate: self.rate.trim().to_string(),
        })
    }
}

/// JSON body posted to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePayload {
    pub company_name: String,
    pub bill_number: String,
    pub bill_type: String,
    pub bill_date: String,
    pub consignment_number: String,
    pub item_description: String,
    pub quantity: String,
    pub bundles: String,
    pub rate: String,
}

/// Per-field messages for the inputs currently failing validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<Field, String>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn fields(&self) -> Vec<Field> {
        self.0.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    fn insert(&mut self, field: Field, message: &str) {
        self.0.insert(field, message.to_string());
    }

    fn remove(&mut self, field: Field) -> bool {
        self.0.remove(&field).is_some()
    }
}

/// Knobs that differ between deployments of the form.
#[derive(Debug, Clone, Default)]
pub struct FormRules {
    pub catalog: Catalog,
    pub require_consignment_number: bool,
}

pub fn validate(fields: &FormFields, rules: &FormRules) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    match &fields.company {
        Selector::Empty => errors.insert(Field::CompanyName, "Company name is required"),
        Selector::AddNew { custom } if custom.trim().is_empty() => errors.insert(
            Field::CustomCompanyName,
            "Please enter the new company name",
        ),
        _ => {}
    }

    if is_blank(&fields.bill_number) {
        errors.insert(Field::BillNumber, "Bill number is required");
    }

    if is_blank(&fields.bill_type) {
        errors.insert(Field::BillType, "Bill type is required");
    } else if !rules.catalog.is_bill_type(&fields.bill_type) {
        errors.insert(Field::BillType, "Select a valid bill type");
    }

    if is_blank(&fields.bill_date) {
        errors.insert(Field::BillDate, "Bill date is required");
    } else if NaiveDate::parse_from_str(fields.bill_date.trim(), "%Y-%m-%d").is_err() {
        errors.insert(
            Field::BillDate,
            "Bill date must be a valid date (YYYY-MM-DD)",
        );
    }

    if rules.require_consignment_number && is_blank(&fields.consignment_number) {
        errors.insert(Field::ConsignmentNumber, "Consignment number is required");
    }

    match &fields.item {
        Selector::Empty => errors.insert(Field::ItemDescription, "Item description is required"),
        Selector::AddNew { custom } if custom.trim().is_empty() => errors.insert(
            Field::CustomItemDescription,
            "Please enter the new item description",
        ),
        _ => {}
    }

    // Integrality of quantity/bundles is not enforced.
    if !is_positive_number(&fields.quantity) {
        errors.insert(Field::Quantity, "Valid quantity is required");
    }
    if !is_positive_number(&fields.bundles) {
        errors.insert(Field::Bundles, "Valid number of bundles is required");
    }
    if !is_positive_number(&fields.rate) {
        errors.insert(Field::Rate, "Valid rate is required");
    }

    errors
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn is_positive_number(value: &str) -> bool {
    value
        .trim()
        .parse::<f64>()
        .map(|v| v.is_finite() && v > 0.0)
        .unwrap_or(false)
}

/// Form inputs plus the errors currently shown against them.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    fields: FormFields,
    errors: ValidationErrors,
    rules: FormRules,
}

impl FormState {
    pub fn new(rules: FormRules) -> Self {
        Self {
            fields: FormFields::default(),
            errors: ValidationErrors::default(),
            rules,
        }
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn rules(&self) -> &FormRules {
        &self.rules
    }

    /// Change one input and drop any error shown against it.
    pub fn set(&mut self, field: Field, value: &str) -> bool {
        let applied = self.fields.set(field, value);
        if !applied {
            debug!(field = %field, "Ignoring custom text while selector is not on Add New");
            return false;
        }

        self.errors.remove(field);
        match field {
            Field::CompanyName if !self.fields.company.is_add_new() => {
                self.errors.remove(Field::CustomCompanyName);
            }
            Field::ItemDescription if !self.fields.item.is_add_new() => {
                self.errors.remove(Field::CustomItemDescription);
            }
            _ => {}
        }
        true
    }

    /// Recompute all errors. Returns true when the form may be submitted.
    pub fn validate(&mut self) -> bool {
        self.errors = validate(&self.fields, &self.rules);
        self.errors.is_empty()
    }

    pub fn reset(&mut self) {
        self.fields = FormFields::default();
        self.errors = ValidationErrors::default();
    }
}
