pub mod assembler;
pub mod converter;
pub mod file;
pub mod model;
pub mod render;

pub use assembler::{AssemblyOptions, ReportAssembler};
pub use converter::{Converter, OutputFormat, PandocConverter};
pub use file::{sanitize_file_name, Report, Saved};
pub use model::*;
pub use render::{render, ReportTemplate};

use crate::error::Result;
use crate::model::EntityGraph;

/// Assemble and render a product-system graph in one step
pub fn build_report(
    graph: &EntityGraph,
    options: &AssemblyOptions,
    template: &ReportTemplate,
) -> Result<Report> {
    let data = ReportAssembler::assemble(graph, options)?;
    Ok(Report::new(data.system_name.clone(), render(&data, template)))
}
