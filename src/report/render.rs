use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::Result;
use crate::report::model::{
    sci, AllocationKind, ExchangeRow, ParameterScope, ParameterSection, ReportData,
};

pub const DISCLAIMER: &str = "This report was prepared as an account of work sponsored by an \
agency of the United States Government. Neither the United States Government nor any agency \
thereof, nor any of their employees, makes any warranty, express or implied, or assumes any legal \
liability or responsibility for the accuracy, completeness, or usefulness of any information, \
apparatus, product, or process disclosed, or represents that its use would not infringe privately \
owned rights. Reference herein to any specific commercial product, process, or service by trade \
name, trademark, manufacturer, or otherwise does not necessarily constitute or imply its \
endorsement, recommendation, or favoring by the United States Government or any agency thereof. \
The views and opinions of authors expressed herein do not necessarily state or reflect those of \
the United States Government or any agency thereof.";

const HEADER_FILE: &str = "header.md";
const FOOTER_FILE: &str = "footer.md";

/// Fixed fragments wrapped around every rendered report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTemplate {
    pub header: String,
    pub footer: String,
}

impl Default for ReportTemplate {
    fn default() -> Self {
        Self {
            header: String::new(),
            footer: format!("# Disclaimer/Terms of Use\n{}\n", DISCLAIMER),
        }
    }
}

impl ReportTemplate {
    /// `header.md` and `footer.md` from `dir`; missing files keep the defaults
    pub fn load(dir: &Path) -> Result<Self> {
        let mut template = Self::default();
        if let Some(header) = read_fragment(&dir.join(HEADER_FILE))? {
            template.header = header;
        }
        if let Some(footer) = read_fragment(&dir.join(FOOTER_FILE))? {
            template.footer = footer;
        }
        Ok(template)
    }
}

fn read_fragment(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            log::debug!("using template fragment {}", path.display());
            Ok(Some(text))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Trailing whitespace stripped from every line, exactly one final newline.
/// Idempotent, so saved reports reload byte for byte.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        out.push_str(line.trim_end());
        out.push('\n');
    }
    let trimmed = out.trim_end_matches('\n').len();
    out.truncate(trimmed);
    out.push('\n');
    out
}

pub fn render(data: &ReportData, template: &ReportTemplate) -> String {
    let mut md = String::new();
    if !template.header.trim().is_empty() {
        md.push_str(&template.header);
        md.push_str("\n\n");
    }

    let _ = write!(
        md,
        "# Overview\n\n\
         ## Process Name\n{}\n\n\
         ## Reference Flow\n{}\n\n\
         ## Brief Description\n{}\n\n\
         # Metadata\n{}\n\
         ## Relevant Flows Included:\n\n{}\n\n\
         # Process Description\n\n\
         ## Goal & Scope\n{}\n\n\
         ## Boundary & Description\n{}\n\n\
         ## Methods\n\n\
         ### Input Flows\n{}\n\
         ### Output Flows\n{}\n\
         ### Process Parameters\n{}\n\
         ### Allocation\n{}\n\n\
         ### Calculations\nNo calculations available.\n\n\
         ## References\n{}\n\n\
         # Document Control Information\n\
         Date Created\n:   {}\n\n\
         Point of Contact\n:   {}\n\n\
         Revision History\n:   {}\n\n\
         How to Cite This Document\n:   TBA\n\n",
        data.process_name,
        data.reference_flow,
        data.description,
        documentation_table(data),
        RELEVANT_FLOWS,
        data.goal_scope,
        data.boundary,
        exchange_table(&data.inputs, "No input flows available."),
        exchange_table(&data.outputs, "No output flows available."),
        parameter_text(&data.parameters),
        allocation_text(data),
        if data.sources.is_empty() {
            "None".to_string()
        } else {
            data.sources.join("\n\n")
        },
        data.created,
        data.point_of_contact,
        data.version,
    );

    md.push_str(&template.footer);
    normalize(&md)
}

const RELEVANT_FLOWS: &str = "Releases to Air\n\
:   - [ ] Greenhouse Gases\n    - [ ] Criteria Air Pollutants\n    - [ ] Other\n\n\
Releases to Water\n\
:   - [ ] Inorganic Emissions\n    - [ ] Organic Emissions\n    - [ ] Other\n\n\
Releases to Soil\n\
:   - [ ] Inorganic Emissions\n    - [ ] Organic Emissions\n    - [ ] Other\n\n\
Water Usage\n\
:   - [ ] Water Demand\n    - [ ] Water Consumption";

fn documentation_table(data: &ReportData) -> String {
    if data.documentation.is_empty() {
        return "No process documentation available.\n".to_string();
    }
    let mut md = String::from("| Feature | Information |\n|-----------|----------|\n");
    for row in &data.documentation {
        let _ = writeln!(md, "| {} | {} |", row.feature, row.information);
    }
    md
}

fn exchange_table(rows: &[ExchangeRow], empty: &str) -> String {
    if rows.is_empty() {
        return format!("{}\n", empty);
    }
    let mut md = String::from(
        "| Compartment | Flow Name | Quantity | Unit | DQI |\n\
         |-------------|-----------|----------|------|-----|\n",
    );
    for row in rows {
        let _ = writeln!(
            md,
            "| {} | {} | {} | {} | {} |",
            row.compartment,
            row.flow_name,
            sci(row.amount),
            row.unit,
            row.dqi
        );
    }
    md
}

/// Formulas of calculated parameters first, then one table for both scopes
fn parameter_text(section: &ParameterSection) -> String {
    if section.is_empty() {
        return "None\n".to_string();
    }
    let mut md = String::new();

    let formulas: Vec<String> = [ParameterScope::Process, ParameterScope::Global]
        .into_iter()
        .flat_map(|scope| section.ordered(scope))
        .filter(|row| !row.is_input)
        .filter_map(|row| row.formula.as_deref().map(|f| formula_text(&row.name, f)))
        .collect();
    if !formulas.is_empty() {
        md.push_str("The following are parameter formulas used or referenced in this process.\n\n");
        for formula in formulas {
            md.push_str(&formula);
            md.push_str("\n\n");
        }
    }

    md.push_str(
        "The following table provides process and global parameter values and their \
         associated uncertainty.\n\n\
         | Scope | Name | Value | Uncertainty | Description |\n\
         |:------|:-----|------:|:------------|:------------|\n",
    );
    for (scope, label) in [
        (ParameterScope::Process, "Process"),
        (ParameterScope::Global, "Global"),
    ] {
        let rows = section.ordered(scope);
        if rows.is_empty() {
            continue;
        }
        let _ = writeln!(md, "| {} |  |  |  |  |", label);
        for row in rows {
            let _ = writeln!(
                md,
                "|  | {} | {} | {} | {} |",
                row.name,
                sci(row.value),
                row.uncertainty,
                row.description
            );
        }
    }
    md
}

/// `name = formula` with markdown emphasis characters escaped
fn formula_text(name: &str, formula: &str) -> String {
    let equation = if name.is_empty() {
        formula.to_string()
    } else {
        format!("{} = {}", name, formula)
    };
    equation.replace('*', "\\*").replace('_', "\\_")
}

fn allocation_text(data: &ReportData) -> String {
    let section = &data.allocation;
    let mut md = format!("Default allocation: {}", section.default_method);
    if section.factors.is_empty() {
        return md;
    }
    md.push_str("\n\n");
    for kind in [AllocationKind::Economic, AllocationKind::Physical, AllocationKind::Causal] {
        let rows: Vec<_> = section.factors.iter().filter(|f| f.kind == kind).collect();
        if rows.is_empty() {
            continue;
        }
        let _ = write!(md, "{} allocation factors:\n\n", kind.label());
        if kind == AllocationKind::Causal {
            md.push_str("| Flow | Product | Amount |\n|-----:|:--------|-------:|\n");
            for row in rows {
                let flow = row
                    .exchange
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-1".to_string());
                let _ = writeln!(md, "| {} | {} | {} |", flow, row.product, sci(row.amount));
            }
        } else {
            md.push_str("| Product | Amount | Unit |\n|:--------|-------:|:-----|\n");
            for row in rows {
                let _ = writeln!(md, "| {} | {} | {} |", row.product, sci(row.amount), row.unit);
            }
        }
        md.push('\n');
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::model::{
        AllocationRow, AllocationSection, Direction, DocumentationRow, ParameterRow,
    };

    fn sample() -> ReportData {
        ReportData {
            system_name: "ERCOT 2030".to_string(),
            process_name: "Electricity, at grid".to_string(),
            reference_flow: "1.000E+00 MWh of electricity".to_string(),
            description: "Grid mix".to_string(),
            documentation: vec![DocumentationRow::new("Location", "US-TX")],
            goal_scope: "N/A".to_string(),
            boundary: "N/A".to_string(),
            inputs: vec![ExchangeRow {
                compartment: "Resources".to_string(),
                flow_name: "natural gas".to_string(),
                direction: Direction::Input,
                amount: 1234.56,
                unit: "kg".to_string(),
                dqi: "(1;2;3;4;5)".to_string(),
            }],
            outputs: Vec::new(),
            parameters: ParameterSection {
                rows: vec![ParameterRow {
                    scope: ParameterScope::Process,
                    name: "heat_rate".to_string(),
                    value: 7.5,
                    is_input: false,
                    formula: Some("a*b".to_string()),
                    uncertainty: "none".to_string(),
                    description: String::new(),
                }],
            },
            allocation: AllocationSection {
                default_method: "Physical".to_string(),
                factors: vec![AllocationRow {
                    kind: AllocationKind::Physical,
                    exchange: None,
                    product: "electricity".to_string(),
                    amount: 1.0,
                    unit: "MWh".to_string(),
                }],
            },
            sources: Vec::new(),
            created: "N/A".to_string(),
            point_of_contact: "N/A".to_string(),
            version: "1.0.0".to_string(),
        }
    }

    #[test]
    fn test_render_is_deterministic_and_normalized() {
        let template = ReportTemplate::default();
        let first = render(&sample(), &template);
        let second = render(&sample(), &template);
        assert_eq!(first, second);
        assert_eq!(normalize(&first), first);
        assert!(first.lines().all(|l| l == l.trim_end()));
    }

    #[test]
    fn test_render_sections() {
        let md = render(&sample(), &ReportTemplate::default());
        assert!(md.starts_with("# Overview\n"));
        assert!(md.contains("| Resources | natural gas | 1.235E+03 | kg | (1;2;3;4;5) |"));
        assert!(md.contains("No output flows available."));
        assert!(md.contains("heat\\_rate = a\\*b"));
        assert!(md.contains("| Process |  |  |  |  |"));
        assert!(md.contains("Physical allocation factors:"));
        assert!(md.contains("## References\nNone"));
        assert!(md.ends_with("thereof.\n"));
    }

    #[test]
    fn test_template_fragments_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("header.md"), "% Unit process report").unwrap();
        let template = ReportTemplate::load(dir.path()).unwrap();
        assert_eq!(template.header, "% Unit process report");
        assert_eq!(template.footer, ReportTemplate::default().footer);

        let md = render(&sample(), &template);
        assert!(md.starts_with("% Unit process report\n\n# Overview"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize("a  \r\nb\t\n\n\n");
        assert_eq!(once, "a\nb\n");
        assert_eq!(normalize(&once), once);
    }
}
