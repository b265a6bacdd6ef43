//! Static field catalog for every root entity kind.
//!
//! Paths use the JSON-LD key names; `.` descends into an object and `[]`
//! iterates an array. Paths containing `[]` are resolvable but not editable.

use crate::model::{EdgeRole, EntityKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    Text,
    Number,
    Flag,
    Reference(EntityKind, EdgeRole),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub path: &'static str,
    pub shape: FieldShape,
}

impl FieldDef {
    pub fn is_editable(&self) -> bool {
        !self.path.contains("[]")
    }

    pub fn reference(&self) -> Option<(EntityKind, EdgeRole)> {
        match self.shape {
            FieldShape::Reference(kind, role) => Some((kind, role)),
            _ => None,
        }
    }
}

const fn text(path: &'static str) -> FieldDef {
    FieldDef { path, shape: FieldShape::Text }
}

const fn number(path: &'static str) -> FieldDef {
    FieldDef { path, shape: FieldShape::Number }
}

const fn flag(path: &'static str) -> FieldDef {
    FieldDef { path, shape: FieldShape::Flag }
}

const fn owns(path: &'static str, kind: EntityKind) -> FieldDef {
    FieldDef { path, shape: FieldShape::Reference(kind, EdgeRole::Ownership) }
}

const fn meta(path: &'static str, kind: EntityKind) -> FieldDef {
    FieldDef { path, shape: FieldShape::Reference(kind, EdgeRole::Metadata) }
}

/// Attributes every root entity carries
const COMMON: &[FieldDef] = &[
    text("name"),
    text("category"),
    text("description"),
    text("version"),
    text("lastChange"),
];

const ACTOR: &[FieldDef] = &[
    text("address"),
    text("city"),
    text("country"),
    text("email"),
    text("telefax"),
    text("telephone"),
    text("website"),
    text("zipCode"),
];

const CURRENCY: &[FieldDef] = &[
    text("code"),
    number("conversionFactor"),
    meta("refCurrency", EntityKind::Currency),
];

const DQ_SYSTEM: &[FieldDef] = &[
    flag("hasUncertainties"),
    meta("source", EntityKind::Source),
];

const EPD: &[FieldDef] = &[
    text("urn"),
    meta("manufacturer", EntityKind::Actor),
    meta("verifier", EntityKind::Actor),
    meta("programOperator", EntityKind::Actor),
    meta("pcr", EntityKind::Source),
    owns("product.flow", EntityKind::Flow),
    number("product.amount"),
];

const FLOW: &[FieldDef] = &[
    text("flowType"),
    text("cas"),
    text("formula"),
    text("synonyms"),
    flag("isInfrastructureFlow"),
    meta("location", EntityKind::Location),
    owns("flowProperties[].flowProperty", EntityKind::FlowProperty),
];

const FLOW_PROPERTY: &[FieldDef] = &[
    text("flowPropertyType"),
    owns("unitGroup", EntityKind::UnitGroup),
];

const IMPACT_CATEGORY: &[FieldDef] = &[
    text("code"),
    text("refUnit"),
    meta("source", EntityKind::Source),
    owns("impactFactors[].flow", EntityKind::Flow),
];

const IMPACT_METHOD: &[FieldDef] = &[
    text("code"),
    meta("source", EntityKind::Source),
    owns("impactCategories[]", EntityKind::ImpactCategory),
];

const LOCATION: &[FieldDef] = &[
    text("code"),
    number("latitude"),
    number("longitude"),
];

const PARAMETER: &[FieldDef] = &[
    text("parameterScope"),
    flag("isInputParameter"),
    number("value"),
    text("formula"),
];

const PROCESS: &[FieldDef] = &[
    text("processType"),
    text("defaultAllocationMethod"),
    flag("isInfrastructureProcess"),
    meta("location", EntityKind::Location),
    meta("dqSystem", EntityKind::DqSystem),
    meta("exchangeDqSystem", EntityKind::DqSystem),
    meta("socialDqSystem", EntityKind::DqSystem),
    owns("exchanges[].flow", EntityKind::Flow),
    meta("exchanges[].flowProperty", EntityKind::FlowProperty),
    meta("exchanges[].defaultProvider", EntityKind::Process),
    meta("exchanges[].location", EntityKind::Location),
    meta("allocationFactors[].product", EntityKind::Flow),
    text("processDocumentation.validFrom"),
    text("processDocumentation.validUntil"),
    text("processDocumentation.creationDate"),
    text("processDocumentation.timeDescription"),
    text("processDocumentation.geographyDescription"),
    text("processDocumentation.technologyDescription"),
    text("processDocumentation.completenessDescription"),
    text("processDocumentation.dataSelectionDescription"),
    text("processDocumentation.projectDescription"),
    meta("processDocumentation.reviewer", EntityKind::Actor),
    meta("processDocumentation.dataSetOwner", EntityKind::Actor),
    meta("processDocumentation.dataGenerator", EntityKind::Actor),
    meta("processDocumentation.dataDocumentor", EntityKind::Actor),
    meta("processDocumentation.publication", EntityKind::Source),
    meta("processDocumentation.sources[]", EntityKind::Source),
];

const PRODUCT_SYSTEM: &[FieldDef] = &[
    number("targetAmount"),
    owns("refProcess", EntityKind::Process),
    meta("processes[]", EntityKind::Process),
];

const PROJECT: &[FieldDef] = &[
    meta("impactMethod", EntityKind::ImpactMethod),
    meta("variants[].productSystem", EntityKind::ProductSystem),
];

const RESULT: &[FieldDef] = &[
    meta("impactMethod", EntityKind::ImpactMethod),
    meta("productSystem", EntityKind::ProductSystem),
];

const SOCIAL_INDICATOR: &[FieldDef] = &[
    text("activityVariable"),
    text("unitOfMeasurement"),
    text("evaluationScheme"),
    owns("activityQuantity", EntityKind::FlowProperty),
];

const SOURCE: &[FieldDef] = &[
    text("url"),
    text("textReference"),
    number("year"),
];

const UNIT_GROUP: &[FieldDef] = &[
    // Points back at a flow property that itself owns this unit group
    meta("defaultFlowProperty", EntityKind::FlowProperty),
];

/// Kind specific fields, without the common attributes
pub fn kind_fields(kind: EntityKind) -> &'static [FieldDef] {
    match kind {
        EntityKind::Actor => ACTOR,
        EntityKind::Currency => CURRENCY,
        EntityKind::DqSystem => DQ_SYSTEM,
        EntityKind::Epd => EPD,
        EntityKind::Flow => FLOW,
        EntityKind::FlowProperty => FLOW_PROPERTY,
        EntityKind::ImpactCategory => IMPACT_CATEGORY,
        EntityKind::ImpactMethod => IMPACT_METHOD,
        EntityKind::Location => LOCATION,
        EntityKind::Parameter => PARAMETER,
        EntityKind::Process => PROCESS,
        EntityKind::ProductSystem => PRODUCT_SYSTEM,
        EntityKind::Project => PROJECT,
        EntityKind::Result => RESULT,
        EntityKind::SocialIndicator => SOCIAL_INDICATOR,
        EntityKind::Source => SOURCE,
        EntityKind::UnitGroup => UNIT_GROUP,
    }
}

pub fn fields(kind: EntityKind) -> impl Iterator<Item = &'static FieldDef> {
    COMMON.iter().chain(kind_fields(kind).iter())
}

pub fn field(kind: EntityKind, path: &str) -> Option<&'static FieldDef> {
    fields(kind).find(|def| def.path == path)
}

/// Reference fields of a kind, in declaration order
pub fn reference_fields(kind: EntityKind) -> impl Iterator<Item = &'static FieldDef> {
    kind_fields(kind).iter().filter(|def| def.reference().is_some())
}

pub fn editable_fields(kind: EntityKind) -> impl Iterator<Item = &'static FieldDef> {
    fields(kind).filter(|def| def.is_editable())
}
