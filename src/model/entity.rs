use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::registry;
use crate::model::{
    normalize_path, Actor, CalculationResult, Currency, DqSystem, EntityKind, Epd, Flow,
    FlowProperty, ImpactCategory, ImpactMethod, Location, Parameter, Process, ProductSystem,
    Project, Ref, RefSlot, SocialIndicator, Source, UnitGroup,
};

/// Attributes shared by every root entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootFields {
    #[serde(rename = "@id")]
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_change: Option<String>,
}

impl RootFields {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
            category: None,
            description: None,
            version: None,
            last_change: None,
        }
    }
}

/// Collects `(path, reference)` pairs while walking an entity
#[derive(Debug, Default)]
pub struct RefPaths<'a> {
    items: Vec<(String, &'a Ref)>,
}

impl<'a> RefPaths<'a> {
    pub fn one(&mut self, path: &str, r: &'a Option<Ref>) {
        if let Some(r) = r {
            self.items.push((path.to_string(), r));
        }
    }

    pub fn list(&mut self, path: &str, refs: &'a [Ref]) {
        for (i, r) in refs.iter().enumerate() {
            self.items.push((format!("{}[{}]", path, i), r));
        }
    }

    pub fn nested(&mut self, prefix: &str, index: usize, field: &str, r: &'a Option<Ref>) {
        if let Some(r) = r {
            self.items.push((format!("{}[{}].{}", prefix, index, field), r));
        }
    }

    pub fn into_inner(self) -> Vec<(String, &'a Ref)> {
        self.items
    }
}

/// Implemented by every kind-specific entity body
pub trait HasRefs {
    fn collect_refs<'a>(&'a self, out: &mut RefPaths<'a>);
}

/// A root entity: one variant per kind of the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum Entity {
    Actor(Actor),
    Currency(Currency),
    #[serde(rename = "DQSystem")]
    DqSystem(DqSystem),
    Epd(Epd),
    Flow(Flow),
    FlowProperty(FlowProperty),
    ImpactCategory(ImpactCategory),
    ImpactMethod(ImpactMethod),
    Location(Location),
    Parameter(Parameter),
    Process(Process),
    ProductSystem(ProductSystem),
    Project(Project),
    Result(CalculationResult),
    SocialIndicator(SocialIndicator),
    Source(Source),
    UnitGroup(UnitGroup),
}

macro_rules! each_variant {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            Entity::Actor($inner) => $body,
            Entity::Currency($inner) => $body,
            Entity::DqSystem($inner) => $body,
            Entity::Epd($inner) => $body,
            Entity::Flow($inner) => $body,
            Entity::FlowProperty($inner) => $body,
            Entity::ImpactCategory($inner) => $body,
            Entity::ImpactMethod($inner) => $body,
            Entity::Location($inner) => $body,
            Entity::Parameter($inner) => $body,
            Entity::Process($inner) => $body,
            Entity::ProductSystem($inner) => $body,
            Entity::Project($inner) => $body,
            Entity::Result($inner) => $body,
            Entity::SocialIndicator($inner) => $body,
            Entity::Source($inner) => $body,
            Entity::UnitGroup($inner) => $body,
        }
    };
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Actor(_) => EntityKind::Actor,
            Entity::Currency(_) => EntityKind::Currency,
            Entity::DqSystem(_) => EntityKind::DqSystem,
            Entity::Epd(_) => EntityKind::Epd,
            Entity::Flow(_) => EntityKind::Flow,
            Entity::FlowProperty(_) => EntityKind::FlowProperty,
            Entity::ImpactCategory(_) => EntityKind::ImpactCategory,
            Entity::ImpactMethod(_) => EntityKind::ImpactMethod,
            Entity::Location(_) => EntityKind::Location,
            Entity::Parameter(_) => EntityKind::Parameter,
            Entity::Process(_) => EntityKind::Process,
            Entity::ProductSystem(_) => EntityKind::ProductSystem,
            Entity::Project(_) => EntityKind::Project,
            Entity::Result(_) => EntityKind::Result,
            Entity::SocialIndicator(_) => EntityKind::SocialIndicator,
            Entity::Source(_) => EntityKind::Source,
            Entity::UnitGroup(_) => EntityKind::UnitGroup,
        }
    }

    pub fn root(&self) -> &RootFields {
        each_variant!(self, e => &e.root)
    }

    pub fn root_mut(&mut self) -> &mut RootFields {
        each_variant!(self, e => &mut e.root)
    }

    pub fn id(&self) -> Uuid {
        self.root().id
    }

    pub fn name(&self) -> Option<&str> {
        self.root().name.as_deref()
    }

    pub fn display_name(&self) -> String {
        self.name()
            .map(str::to_string)
            .unwrap_or_else(|| self.id().to_string())
    }

    pub fn to_ref(&self) -> Ref {
        let root = self.root();
        let mut r = Ref::new(self.kind(), root.id, root.name.clone());
        r.category = root.category.clone();
        r
    }

    /// Every reference field occurrence, typed by the registry.
    ///
    /// Paths the registry does not know are skipped; they carry no expected
    /// kind and therefore cannot be resolved safely.
    pub fn references(&self) -> Vec<RefSlot<'_>> {
        let mut paths = RefPaths::default();
        each_variant!(self, e => e.collect_refs(&mut paths));

        let kind = self.kind();
        paths
            .into_inner()
            .into_iter()
            .filter_map(|(field, target)| {
                let normalized = normalize_path(&field);
                match registry::field(kind, &normalized).and_then(|def| def.reference()) {
                    Some((expected, role)) => Some(RefSlot {
                        field,
                        target,
                        expected,
                        role,
                    }),
                    None => {
                        log::warn!("{} field '{}' is not a registered reference", kind, field);
                        None
                    }
                }
            })
            .collect()
    }

    pub fn as_process(&self) -> Option<&Process> {
        match self {
            Entity::Process(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_product_system(&self) -> Option<&ProductSystem> {
        match self {
            Entity::ProductSystem(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_flow(&self) -> Option<&Flow> {
        match self {
            Entity::Flow(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_flow_property(&self) -> Option<&FlowProperty> {
        match self {
            Entity::FlowProperty(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_unit_group(&self) -> Option<&UnitGroup> {
        match self {
            Entity::UnitGroup(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_actor(&self) -> Option<&Actor> {
        match self {
            Entity::Actor(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_source(&self) -> Option<&Source> {
        match self {
            Entity::Source(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_location(&self) -> Option<&Location> {
        match self {
            Entity::Location(l) => Some(l),
            _ => None,
        }
    }
}
