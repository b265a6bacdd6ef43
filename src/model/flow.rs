use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::model::{HasRefs, Ref, RefPaths, RootFields};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    #[serde(flatten)]
    pub root: RootFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_infrastructure_flow: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Ref>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flow_properties: Vec<FlowPropertyFactor>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Flow {
    pub fn reference_factor(&self) -> Option<&FlowPropertyFactor> {
        self.flow_properties
            .iter()
            .find(|f| f.is_ref_flow_property.unwrap_or(false))
            .or_else(|| self.flow_properties.first())
    }
}

impl HasRefs for Flow {
    fn collect_refs<'a>(&'a self, out: &mut RefPaths<'a>) {
        out.one("location", &self.location);
        for (i, factor) in self.flow_properties.iter().enumerate() {
            out.nested("flowProperties", i, "flowProperty", &factor.flow_property);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowPropertyFactor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_property: Option<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_ref_flow_property: Option<bool>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowProperty {
    #[serde(flatten)]
    pub root: RootFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_property_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_group: Option<Ref>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl HasRefs for FlowProperty {
    fn collect_refs<'a>(&'a self, out: &mut RefPaths<'a>) {
        out.one("unitGroup", &self.unit_group);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitGroup {
    #[serde(flatten)]
    pub root: RootFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_flow_property: Option<Ref>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<Unit>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl UnitGroup {
    pub fn reference_unit(&self) -> Option<&Unit> {
        self.units.iter().find(|u| u.is_ref_unit.unwrap_or(false))
    }

    pub fn unit(&self, id: &Uuid) -> Option<&Unit> {
        self.units.iter().find(|u| u.id.as_ref() == Some(id))
    }
}

impl HasRefs for UnitGroup {
    fn collect_refs<'a>(&'a self, out: &mut RefPaths<'a>) {
        out.one("defaultFlowProperty", &self.default_flow_property);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_ref_unit: Option<bool>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactCategory {
    #[serde(flatten)]
    pub root: RootFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Ref>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub impact_factors: Vec<ImpactFactor>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl HasRefs for ImpactCategory {
    fn collect_refs<'a>(&'a self, out: &mut RefPaths<'a>) {
        out.one("source", &self.source);
        for (i, factor) in self.impact_factors.iter().enumerate() {
            out.nested("impactFactors", i, "flow", &factor.flow);
        }
    }
}

/// Characterization factor of one flow within an impact category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactFactor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Ref>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactMethod {
    #[serde(flatten)]
    pub root: RootFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Ref>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub impact_categories: Vec<Ref>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl HasRefs for ImpactMethod {
    fn collect_refs<'a>(&'a self, out: &mut RefPaths<'a>) {
        out.one("source", &self.source);
        out.list("impactCategories", &self.impact_categories);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialIndicator {
    #[serde(flatten)]
    pub root: RootFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_variable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_quantity: Option<Ref>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl HasRefs for SocialIndicator {
    fn collect_refs<'a>(&'a self, out: &mut RefPaths<'a>) {
        out.one("activityQuantity", &self.activity_quantity);
    }
}
