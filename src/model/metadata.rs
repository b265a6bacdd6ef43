//! Kinds referenced as descriptive metadata by processes, flows and methods.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::{HasRefs, Ref, RefPaths, RootFields};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    #[serde(flatten)]
    pub root: RootFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefax: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl HasRefs for Actor {
    fn collect_refs<'a>(&'a self, _out: &mut RefPaths<'a>) {}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    #[serde(flatten)]
    pub root: RootFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_currency: Option<Ref>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl HasRefs for Currency {
    fn collect_refs<'a>(&'a self, out: &mut RefPaths<'a>) {
        out.one("refCurrency", &self.ref_currency);
    }
}

/// Data quality system; indicator definitions stay in `other`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DqSystem {
    #[serde(flatten)]
    pub root: RootFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_uncertainties: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Ref>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl HasRefs for DqSystem {
    fn collect_refs<'a>(&'a self, out: &mut RefPaths<'a>) {
        out.one("source", &self.source);
    }
}

/// Environmental product declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Epd {
    #[serde(flatten)]
    pub root: RootFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifier: Option<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_operator: Option<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pcr: Option<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<EpdProduct>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl HasRefs for Epd {
    fn collect_refs<'a>(&'a self, out: &mut RefPaths<'a>) {
        out.one("manufacturer", &self.manufacturer);
        out.one("verifier", &self.verifier);
        out.one("programOperator", &self.program_operator);
        out.one("pcr", &self.pcr);
        if let Some(product) = &self.product {
            out.one("product.flow", &product.flow);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpdProduct {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(flatten)]
    pub root: RootFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl HasRefs for Location {
    fn collect_refs<'a>(&'a self, _out: &mut RefPaths<'a>) {}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(flatten)]
    pub root: RootFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_method: Option<Ref>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<ProjectVariant>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl HasRefs for Project {
    fn collect_refs<'a>(&'a self, out: &mut RefPaths<'a>) {
        out.one("impactMethod", &self.impact_method);
        for (i, variant) in self.variants.iter().enumerate() {
            out.nested("variants", i, "productSystem", &variant.product_system);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectVariant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_system: Option<Ref>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Stored calculation result (the `Result` root kind)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    #[serde(flatten)]
    pub root: RootFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_method: Option<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_system: Option<Ref>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl HasRefs for CalculationResult {
    fn collect_refs<'a>(&'a self, out: &mut RefPaths<'a>) {
        out.one("impactMethod", &self.impact_method);
        out.one("productSystem", &self.product_system);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(flatten)]
    pub root: RootFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl HasRefs for Source {
    fn collect_refs<'a>(&'a self, _out: &mut RefPaths<'a>) {}
}
