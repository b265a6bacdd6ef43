//! Intermediate representation of a unit-process report.
//!
//! The assembler fills these from a hydrated graph; the renderer turns them
//! into markdown. Nothing here touches a backend.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportData {
    /// Product system name; the report file is named after it
    pub system_name: String,
    pub process_name: String,
    pub reference_flow: String,
    pub description: String,
    pub documentation: Vec<DocumentationRow>,
    pub goal_scope: String,
    pub boundary: String,
    pub inputs: Vec<ExchangeRow>,
    pub outputs: Vec<ExchangeRow>,
    pub parameters: ParameterSection,
    pub allocation: AllocationSection,
    pub sources: Vec<String>,
    pub created: String,
    pub point_of_contact: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentationRow {
    pub feature: String,
    pub information: String,
}

impl DocumentationRow {
    pub fn new(feature: &str, information: impl Into<String>) -> Self {
        Self {
            feature: feature.to_string(),
            information: information.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRow {
    pub compartment: String,
    pub flow_name: String,
    pub direction: Direction,
    pub amount: f64,
    pub unit: String,
    pub dqi: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParameterScope {
    Process,
    Global,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRow {
    pub scope: ParameterScope,
    pub name: String,
    pub value: f64,
    pub is_input: bool,
    pub formula: Option<String>,
    pub uncertainty: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSection {
    pub rows: Vec<ParameterRow>,
}

impl ParameterSection {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows ordered for the table: process before global, inputs before
    /// calculated parameters
    pub fn ordered(&self, scope: ParameterScope) -> Vec<&ParameterRow> {
        let (inputs, calculated): (Vec<_>, Vec<_>) = self
            .rows
            .iter()
            .filter(|r| r.scope == scope)
            .partition(|r| r.is_input);
        inputs.into_iter().chain(calculated).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AllocationKind {
    Physical,
    Economic,
    Causal,
}

impl AllocationKind {
    pub fn from_schema(name: &str) -> Option<Self> {
        match name {
            "PHYSICAL_ALLOCATION" => Some(Self::Physical),
            "ECONOMIC_ALLOCATION" => Some(Self::Economic),
            "CAUSAL_ALLOCATION" => Some(Self::Causal),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Physical => "Physical",
            Self::Economic => "Economic",
            Self::Causal => "Causal",
        }
    }
}

/// Label of a default allocation method as stored on a process
pub fn allocation_method_label(name: Option<&str>) -> &'static str {
    name.and_then(AllocationKind::from_schema)
        .map(AllocationKind::label)
        .unwrap_or("No allocation")
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRow {
    pub kind: AllocationKind,
    /// Internal id of the exchange, causal factors only
    pub exchange: Option<i64>,
    pub product: String,
    pub amount: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationSection {
    pub default_method: String,
    pub factors: Vec<AllocationRow>,
}

/// The nine process type codes a report can be labelled with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessTypeCode {
    Ep,
    Mp,
    #[default]
    Bp,
    Ip,
    Ec,
    Tp,
    Rp,
    Wt,
    Ap,
}

impl ProcessTypeCode {
    pub const ALL: [ProcessTypeCode; 9] = [
        Self::Ep,
        Self::Mp,
        Self::Bp,
        Self::Ip,
        Self::Ec,
        Self::Tp,
        Self::Rp,
        Self::Wt,
        Self::Ap,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::Ep => "EP",
            Self::Mp => "MP",
            Self::Bp => "BP",
            Self::Ip => "IP",
            Self::Ec => "EC",
            Self::Tp => "TP",
            Self::Rp => "RP",
            Self::Wt => "WT",
            Self::Ap => "AP",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ep => "Extraction Process",
            Self::Mp => "Manufacturing Process",
            Self::Bp => "Basic Process",
            Self::Ip => "Installation Process",
            Self::Ec => "Energy Conversion",
            Self::Tp => "Transportation Process",
            Self::Rp => "Recovery Process",
            Self::Wt => "Waste Treatment",
            Self::Ap => "Auxiliary Process",
        }
    }
}

impl fmt::Display for ProcessTypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.code())
    }
}

impl FromStr for ProcessTypeCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown process type code '{}'", s))
    }
}

/// Scientific notation with three decimals and a signed two digit exponent,
/// e.g. `1.235E+03`
pub fn sci(value: f64) -> String {
    if value.is_nan() {
        return "NAN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    let raw = format!("{:.3E}", value);
    match raw.split_once('E') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}E{}{:02}", mantissa, sign, exponent.abs())
        }
        None => raw,
    }
}

/// Plain number the way a reader expects it: `13.0`, `0.25`
pub fn plain(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
