use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{LcaError, Result};
use crate::model::{
    Entity, EntityGraph, EntityKey, EntityKind, Exchange, Parameter, Process, ProcessDocumentation,
    Ref, Uncertainty,
};
use crate::report::model::{
    allocation_method_label, AllocationKind, AllocationRow, AllocationSection, Direction,
    DocumentationRow, ExchangeRow, ParameterRow, ParameterScope, ParameterSection,
    ProcessTypeCode, ReportData,
};

const NOT_AVAILABLE: &str = "N/A";
const SYSTEM_BOUNDARY: &str = "Cradle-to-Gate";

/// Inputs to assembly that do not come from the product-system graph
#[derive(Debug, Clone, Default)]
pub struct AssemblyOptions {
    /// Shown as the process type unless the documentation carries one
    pub process_code: ProcessTypeCode,
    /// Global parameters of the dataset; only those the process formulas
    /// mention end up in the report
    pub globals: Vec<Parameter>,
}

pub struct ReportAssembler;

impl ReportAssembler {
    pub fn assemble(graph: &EntityGraph, options: &AssemblyOptions) -> Result<ReportData> {
        let root = graph.root_handle().read().clone();
        let Entity::ProductSystem(system) = &root else {
            return Err(LcaError::Schema(format!(
                "reports are built from product systems, not {}",
                root.kind()
            )));
        };

        let process_entity = graph
            .follow(&graph.root, "refProcess")
            .map(|h| h.read().clone())
            .ok_or_else(|| {
                LcaError::Schema(format!("product system {} has no reference process", root.id()))
            })?;
        let Entity::Process(process) = &process_entity else {
            return Err(LcaError::Schema(format!(
                "reference process of {} is a {}",
                root.id(),
                process_entity.kind()
            )));
        };
        let view = ProcessView {
            graph,
            key: EntityKey::new(EntityKind::Process, process.root.id),
            process,
        };

        let functional_unit = view.functional_unit()?;
        let empty_doc = ProcessDocumentation::default();
        let doc = process.process_documentation.as_ref().unwrap_or(&empty_doc);

        let (inputs, outputs): (Vec<_>, Vec<_>) = process
            .exchanges
            .iter()
            .enumerate()
            .map(|(i, e)| view.exchange_row(i, e))
            .partition(|row| row.direction == Direction::Input);

        Ok(ReportData {
            system_name: system
                .root
                .name
                .clone()
                .unwrap_or_else(|| system.root.id.to_string()),
            process_name: or_na(process.root.name.as_deref()),
            reference_flow: view.reference_flow(functional_unit),
            description: or_na(process.root.description.as_deref()),
            documentation: view.documentation(doc, options.process_code),
            goal_scope: doc
                .project_description
                .clone()
                .unwrap_or_else(|| "No goal or scope info available.".to_string()),
            boundary: doc
                .data_selection_description
                .clone()
                .unwrap_or_else(|| "Detailed boundary description not available".to_string()),
            inputs,
            outputs,
            parameters: parameter_section(process, &options.globals),
            allocation: view.allocation(),
            sources: view.citations(doc),
            created: date_only(doc.creation_date.as_deref()),
            point_of_contact: view
                .linked_name("processDocumentation.dataSetOwner", doc.data_set_owner.as_ref())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            version: process
                .root
                .version
                .clone()
                .unwrap_or_else(|| "1.0.0".to_string()),
        })
    }
}

/// The reference process together with the graph it was resolved in
struct ProcessView<'a> {
    graph: &'a EntityGraph,
    key: EntityKey,
    process: &'a Process,
}

impl<'a> ProcessView<'a> {
    fn linked(&self, field: &str) -> Option<Entity> {
        self.graph.follow(&self.key, field).map(|h| h.read().clone())
    }

    /// Name of the resolved target, falling back to the name on the reference
    fn linked_name(&self, field: &str, fallback: Option<&Ref>) -> Option<String> {
        self.linked(field)
            .and_then(|e| e.name().map(str::to_string))
            .or_else(|| fallback.and_then(|r| r.name.clone()))
    }

    fn functional_unit(&self) -> Result<&'a Exchange> {
        self.process.functional_unit()
    }

    fn exchange_index(&self, exchange: &Exchange) -> Option<usize> {
        self.process
            .exchanges
            .iter()
            .position(|e| std::ptr::eq(e, exchange))
    }

    fn flow_name(&self, index: usize, exchange: &Exchange) -> String {
        self.linked_name(&format!("exchanges[{}].flow", index), exchange.flow.as_ref())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    fn reference_flow(&self, unit: &Exchange) -> String {
        let name = match self.exchange_index(unit) {
            Some(i) => self.flow_name(i, unit),
            None => NOT_AVAILABLE.to_string(),
        };
        format!("{} {} of {}", crate::report::model::sci(unit.amount), unit_name(unit), name)
    }

    fn exchange_row(&self, index: usize, exchange: &Exchange) -> ExchangeRow {
        let flow = self.linked(&format!("exchanges[{}].flow", index));
        let compartment = flow
            .as_ref()
            .and_then(|f| f.root().category.clone())
            .or_else(|| exchange.flow.as_ref().and_then(|r| r.category.clone()))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        ExchangeRow {
            compartment,
            flow_name: self.flow_name(index, exchange),
            direction: if exchange.is_input {
                Direction::Input
            } else {
                Direction::Output
            },
            amount: exchange.amount,
            unit: unit_name(exchange),
            dqi: or_na(exchange.dq_entry.as_deref()),
        }
    }

    fn documentation(&self, doc: &ProcessDocumentation, code: ProcessTypeCode) -> Vec<DocumentationRow> {
        let location = self
            .linked_name("location", self.process.location.as_ref())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let process_type = doc
            .other
            .get("processType")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| code.to_string());
        vec![
            DocumentationRow::new("Location", location),
            DocumentationRow::new("Valid From", date_only(doc.valid_from.as_deref())),
            DocumentationRow::new("Valid Until", date_only(doc.valid_until.as_deref())),
            DocumentationRow::new("Creation Date", date_only(doc.creation_date.as_deref())),
            DocumentationRow::new("Process Type", process_type),
            DocumentationRow::new(
                "Process Scope",
                single_line(doc.technology_description.as_deref().unwrap_or(NOT_AVAILABLE)),
            ),
            DocumentationRow::new("System Boundary", SYSTEM_BOUNDARY),
            DocumentationRow::new(
                "Completeness",
                single_line(doc.completeness_description.as_deref().unwrap_or(NOT_AVAILABLE)),
            ),
        ]
    }

    fn allocation(&self) -> AllocationSection {
        let factors = self
            .process
            .allocation_factors
            .iter()
            .enumerate()
            .filter_map(|(i, factor)| {
                let kind = factor
                    .allocation_type
                    .as_deref()
                    .and_then(AllocationKind::from_schema)?;
                let product = self
                    .linked_name(&format!("allocationFactors[{}].product", i), factor.product.as_ref())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string());
                let unit = factor
                    .product
                    .as_ref()
                    .and_then(|r| r.other.get("refUnit"))
                    .and_then(|v| v.as_str())
                    .unwrap_or(NOT_AVAILABLE)
                    .to_string();
                Some(AllocationRow {
                    kind,
                    exchange: factor.exchange_internal_id(),
                    product,
                    amount: factor.value,
                    unit,
                })
            })
            .collect();
        AllocationSection {
            default_method: allocation_method_label(self.process.default_allocation_method.as_deref())
                .to_string(),
            factors,
        }
    }

    fn citations(&self, doc: &ProcessDocumentation) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for (i, source) in doc.sources.iter().enumerate() {
            if seen.insert(source.id) {
                out.push(self.citation(&format!("processDocumentation.sources[{}]", i), source));
            }
        }
        if let Some(publication) = &doc.publication {
            if seen.insert(publication.id) {
                out.push(self.citation("processDocumentation.publication", publication));
            }
        }
        out
    }

    fn citation(&self, field: &str, reference: &Ref) -> String {
        match self.linked(field) {
            Some(Entity::Source(source)) => {
                let mut text = source
                    .root
                    .name
                    .clone()
                    .unwrap_or_else(|| reference.display_name());
                if let Some(year) = source.year {
                    text.push_str(&format!(" ({})", year));
                }
                let title = source
                    .text_reference
                    .as_deref()
                    .filter(|t| !t.is_empty())
                    .or(source.root.description.as_deref().filter(|d| !d.is_empty()));
                if let Some(title) = title {
                    text.push_str(&format!(". {}", title));
                }
                if let Some(url) = source.url.as_deref().filter(|u| !u.is_empty()) {
                    text.push_str(&format!(". Online: {}", url.replace("\r\n", "")));
                }
                single_line(&text)
            }
            _ => reference.display_name(),
        }
    }
}

fn unit_name(exchange: &Exchange) -> String {
    exchange
        .unit
        .as_ref()
        .and_then(|u| u.name.clone())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn or_na(value: Option<&str>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

/// Table cells must not break across lines
fn single_line(text: &str) -> String {
    text.replace("\r\n", " ").replace('\n', " ")
}

/// Calendar date of a schema timestamp, `N/A` when absent
fn date_only(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return NOT_AVAILABLE.to_string();
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.date_naive().format("%Y-%m-%d").to_string();
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return ts.date().format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    raw.split('T').next().unwrap_or(raw).to_string()
}

fn parameter_section(process: &Process, globals: &[Parameter]) -> ParameterSection {
    let mut rows: Vec<ParameterRow> = process
        .parameters
        .iter()
        .map(|p| parameter_row(p, ParameterScope::Process))
        .collect();

    let mentioned = formula_identifiers(process);
    let mut used: Vec<&Parameter> = globals
        .iter()
        .filter(|g| g.is_global())
        .filter(|g| g.root.name.as_ref().map(|n| mentioned.contains(n)).unwrap_or(false))
        .collect();
    used.sort_by(|a, b| a.root.name.cmp(&b.root.name));
    used.dedup_by(|a, b| a.root.name == b.root.name);
    rows.extend(used.into_iter().map(|p| parameter_row(p, ParameterScope::Global)));

    ParameterSection { rows }
}

fn parameter_row(p: &Parameter, scope: ParameterScope) -> ParameterRow {
    ParameterRow {
        scope,
        name: p.root.name.clone().unwrap_or_default(),
        value: p.value.unwrap_or(0.0),
        is_input: p.is_input(),
        formula: p.formula.clone().filter(|f| !f.trim().is_empty()),
        uncertainty: uncertainty_text(p.uncertainty.as_ref()),
        description: single_line(p.root.description.as_deref().unwrap_or("")),
    }
}

/// Identifiers appearing in any formula of the process
fn formula_identifiers(process: &Process) -> BTreeSet<String> {
    let formulas = process
        .exchanges
        .iter()
        .filter_map(|e| e.amount_formula.as_deref())
        .chain(process.parameters.iter().filter_map(|p| p.formula.as_deref()));
    let mut out = BTreeSet::new();
    for formula in formulas {
        for token in formula.split(|c: char| !(c.is_alphanumeric() || c == '_')) {
            if token.chars().next().map(|c| c.is_alphabetic() || c == '_').unwrap_or(false) {
                out.insert(token.to_string());
            }
        }
    }
    out
}

/// `Triangle Distribution (max:13.0, min:5.0, mode:7.5)` or `none`
pub fn uncertainty_text(uncertainty: Option<&Uncertainty>) -> String {
    let Some(u) = uncertainty else {
        return "none".to_string();
    };
    let kind = u
        .distribution_type
        .as_deref()
        .map(title_case)
        .unwrap_or_else(|| "Unknown Distribution".to_string());
    let values = [
        ("gmean", u.geom_mean),
        ("gsdev", u.geom_sd),
        ("max", u.maximum),
        ("ave", u.mean),
        ("min", u.minimum),
        ("mode", u.mode),
        ("sdev", u.sd),
    ];
    let pairs: Vec<String> = values
        .iter()
        .filter_map(|(name, value)| {
            value.map(|v| format!("{}:{}", name, crate::report::model::plain(v)))
        })
        .collect();
    format!("{} ({})", kind, pairs.join(", "))
}

fn title_case(raw: &str) -> String {
    raw.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let lower = w.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncertainty_text() {
        let u = Uncertainty {
            distribution_type: Some("TRIANGLE_DISTRIBUTION".to_string()),
            geom_mean: None,
            geom_sd: None,
            maximum: Some(13.0),
            mean: None,
            minimum: Some(5.0),
            mode: Some(7.5),
            sd: None,
        };
        assert_eq!(
            uncertainty_text(Some(&u)),
            "Triangle Distribution (max:13.0, min:5.0, mode:7.5)"
        );
        assert_eq!(uncertainty_text(None), "none");
    }

    #[test]
    fn test_date_only() {
        assert_eq!(date_only(Some("2023-04-05T10:11:12Z")), "2023-04-05");
        assert_eq!(date_only(Some("2023-04-05T10:11:12.345+02:00")), "2023-04-05");
        assert_eq!(date_only(Some("2023-04-05")), "2023-04-05");
        assert_eq!(date_only(Some("  ")), "N/A");
        assert_eq!(date_only(None), "N/A");
    }

    #[test]
    fn test_formula_identifiers() {
        let process: Process = serde_json::from_value(serde_json::json!({
            "@id": "7a1c2e0f-1b2c-4d3e-8f90-a1b2c3d4e5f6",
            "exchanges": [{"amount": 1.0, "amountFormula": "heat_rate * 2.5"}],
            "parameters": [{"@id": "11111111-2222-4333-8444-555555555555", "name": "eff", "formula": "1/heat_rate + loss"}]
        }))
        .unwrap();
        let ids = formula_identifiers(&process);
        assert!(ids.contains("heat_rate"));
        assert!(ids.contains("loss"));
        assert!(!ids.contains("2"));
    }
}
