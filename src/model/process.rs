use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LcaError, Result};
use crate::model::{HasRefs, Ref, RefPaths, RootFields};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    #[serde(flatten)]
    pub root: RootFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_allocation_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_infrastructure_process: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq_system: Option<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_dq_system: Option<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_dq_system: Option<Ref>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exchanges: Vec<Exchange>,
    /// Process-scoped parameters, stored inline
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allocation_factors: Vec<AllocationFactor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_documentation: Option<ProcessDocumentation>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Process {
    /// Output exchanges flagged as the quantitative reference
    pub fn functional_units(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges
            .iter()
            .filter(|e| e.is_quantitative_reference && !e.is_input)
    }

    /// The single functional unit; none or several is a corrupt process
    pub fn functional_unit(&self) -> Result<&Exchange> {
        let mut units = self.functional_units();
        match (units.next(), units.next()) {
            (Some(unit), None) => Ok(unit),
            (None, _) => Err(LcaError::Schema(format!(
                "process {} has no functional-unit output",
                self.root.id
            ))),
            (Some(_), Some(_)) => Err(LcaError::Schema(format!(
                "process {} has more than one functional-unit output",
                self.root.id
            ))),
        }
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter().filter(|e| e.is_input)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter().filter(|e| !e.is_input)
    }
}

impl HasRefs for Process {
    fn collect_refs<'a>(&'a self, out: &mut RefPaths<'a>) {
        out.one("location", &self.location);
        out.one("dqSystem", &self.dq_system);
        out.one("exchangeDqSystem", &self.exchange_dq_system);
        out.one("socialDqSystem", &self.social_dq_system);
        for (i, exchange) in self.exchanges.iter().enumerate() {
            out.nested("exchanges", i, "flow", &exchange.flow);
            out.nested("exchanges", i, "flowProperty", &exchange.flow_property);
            out.nested("exchanges", i, "defaultProvider", &exchange.default_provider);
            out.nested("exchanges", i, "location", &exchange.location);
        }
        for (i, factor) in self.allocation_factors.iter().enumerate() {
            out.nested("allocationFactors", i, "product", &factor.product);
        }
        if let Some(doc) = &self.process_documentation {
            out.one("processDocumentation.reviewer", &doc.reviewer);
            out.one("processDocumentation.dataSetOwner", &doc.data_set_owner);
            out.one("processDocumentation.dataGenerator", &doc.data_generator);
            out.one("processDocumentation.dataDocumentor", &doc.data_documentor);
            out.one("processDocumentation.publication", &doc.publication);
            out.list("processDocumentation.sources", &doc.sources);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<i64>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_formula: Option<String>,
    #[serde(default)]
    pub is_input: bool,
    #[serde(default)]
    pub is_quantitative_reference: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_avoided_product: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<Ref>,
    /// Units live inside unit groups and are not root entities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_property: Option<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq_entry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<Uncertainty>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationFactor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Ref>,
    #[serde(default)]
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl AllocationFactor {
    /// Internal id of the exchange a causal factor applies to
    pub fn exchange_internal_id(&self) -> Option<i64> {
        self.other
            .get("exchange")
            .and_then(|e| e.get("internalId"))
            .and_then(Value::as_i64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDocumentation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geography_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completeness_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_selection_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set_owner: Option<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_generator: Option<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_documentor: Option<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication: Option<Ref>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Ref>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Uncertainty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geom_mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geom_sd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sd: Option<f64>,
}

/// Global or process-scoped parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    #[serde(flatten)]
    pub root: RootFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_input_parameter: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<Uncertainty>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Parameter {
    pub fn is_global(&self) -> bool {
        self.parameter_scope.as_deref() == Some("GLOBAL_SCOPE")
    }

    pub fn is_input(&self) -> bool {
        self.is_input_parameter.unwrap_or(false)
    }
}

impl HasRefs for Parameter {
    fn collect_refs<'a>(&'a self, _out: &mut RefPaths<'a>) {}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSystem {
    #[serde(flatten)]
    pub root: RootFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_process: Option<Ref>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub processes: Vec<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_amount: Option<f64>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl HasRefs for ProductSystem {
    fn collect_refs<'a>(&'a self, out: &mut RefPaths<'a>) {
        out.one("refProcess", &self.ref_process);
        out.list("processes", &self.processes);
    }
}
