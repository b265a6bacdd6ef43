use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of root entity kinds of the LCA schema.
///
/// The serialized form is the `@type` tag used by both the JSON-LD archive
/// and the modeling service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Actor,
    Currency,
    #[serde(rename = "DQSystem")]
    DqSystem,
    Epd,
    Flow,
    FlowProperty,
    ImpactCategory,
    ImpactMethod,
    Location,
    Parameter,
    Process,
    ProductSystem,
    Project,
    Result,
    SocialIndicator,
    Source,
    UnitGroup,
}

impl EntityKind {
    pub const ALL: [EntityKind; 17] = [
        EntityKind::Actor,
        EntityKind::Currency,
        EntityKind::DqSystem,
        EntityKind::Epd,
        EntityKind::Flow,
        EntityKind::FlowProperty,
        EntityKind::ImpactCategory,
        EntityKind::ImpactMethod,
        EntityKind::Location,
        EntityKind::Parameter,
        EntityKind::Process,
        EntityKind::ProductSystem,
        EntityKind::Project,
        EntityKind::Result,
        EntityKind::SocialIndicator,
        EntityKind::Source,
        EntityKind::UnitGroup,
    ];

    /// The `@type` tag
    pub fn type_name(self) -> &'static str {
        match self {
            EntityKind::Actor => "Actor",
            EntityKind::Currency => "Currency",
            EntityKind::DqSystem => "DQSystem",
            EntityKind::Epd => "Epd",
            EntityKind::Flow => "Flow",
            EntityKind::FlowProperty => "FlowProperty",
            EntityKind::ImpactCategory => "ImpactCategory",
            EntityKind::ImpactMethod => "ImpactMethod",
            EntityKind::Location => "Location",
            EntityKind::Parameter => "Parameter",
            EntityKind::Process => "Process",
            EntityKind::ProductSystem => "ProductSystem",
            EntityKind::Project => "Project",
            EntityKind::Result => "Result",
            EntityKind::SocialIndicator => "SocialIndicator",
            EntityKind::Source => "Source",
            EntityKind::UnitGroup => "UnitGroup",
        }
    }

    /// Folder holding documents of this kind inside a JSON-LD archive
    pub fn folder(self) -> &'static str {
        match self {
            EntityKind::Actor => "actors",
            EntityKind::Currency => "currencies",
            EntityKind::DqSystem => "dq_systems",
            EntityKind::Epd => "epds",
            EntityKind::Flow => "flows",
            EntityKind::FlowProperty => "flow_properties",
            EntityKind::ImpactCategory => "lcia_categories",
            EntityKind::ImpactMethod => "lcia_methods",
            EntityKind::Location => "locations",
            EntityKind::Parameter => "parameters",
            EntityKind::Process => "processes",
            EntityKind::ProductSystem => "product_systems",
            EntityKind::Project => "projects",
            EntityKind::Result => "results",
            EntityKind::SocialIndicator => "social_indicators",
            EntityKind::Source => "sources",
            EntityKind::UnitGroup => "unit_groups",
        }
    }

    /// Human readable label used in menus and messages
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Actor => "actor",
            EntityKind::Currency => "currency",
            EntityKind::DqSystem => "data quality system",
            EntityKind::Epd => "EPD",
            EntityKind::Flow => "flow",
            EntityKind::FlowProperty => "flow property",
            EntityKind::ImpactCategory => "impact category",
            EntityKind::ImpactMethod => "impact method",
            EntityKind::Location => "location",
            EntityKind::Parameter => "parameter",
            EntityKind::Process => "process",
            EntityKind::ProductSystem => "product system",
            EntityKind::Project => "project",
            EntityKind::Result => "result",
            EntityKind::SocialIndicator => "social indicator",
            EntityKind::Source => "source",
            EntityKind::UnitGroup => "unit group",
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_name() == name)
    }

    pub fn from_folder(folder: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.folder() == folder)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    /// Accepts the `@type` tag, the archive folder, or the label
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::from_type_name(trimmed)
            .or_else(|| Self::from_folder(trimmed))
            .or_else(|| {
                Self::ALL
                    .into_iter()
                    .find(|kind| kind.label().eq_ignore_ascii_case(trimmed))
            })
            .ok_or_else(|| format!("unknown entity kind '{}'", s))
    }
}
