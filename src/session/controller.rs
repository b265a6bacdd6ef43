use std::path::PathBuf;

use itertools::Itertools;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{LcaError, Result};
use crate::model::{registry, Depth, Entity, EntityGraph, EntityKind, FieldShape, Process};
use crate::report::{
    build_report, sanitize_file_name, sci, AssemblyOptions, Converter, OutputFormat,
    ProcessTypeCode, Report, ReportTemplate, Saved,
};
use crate::session::state::{transition, Command, Effect, MenuEntry, State, GLOBAL_MENU};
use crate::store::{discover_archives, BackendConfig, Descriptor, EntityStore};

/// What happens to the state after an effect ran
enum Next {
    /// Take the transition's target state
    Proceed,
    Stay,
    Goto(State),
}

/// The product system the session works on
struct Selection {
    system: Descriptor,
    graph: EntityGraph,
}

impl Selection {
    fn reference_process(&self) -> Option<Process> {
        let handle = self.graph.follow(&self.graph.root, "refProcess")?;
        let entity = handle.read();
        entity.as_process().cloned()
    }
}

/// A report on disk the session can show or convert
struct CurrentReport {
    report: Report,
    path: PathBuf,
}

/// Drives one interactive session: parses input, runs the transition table
/// and applies the error policy to whatever the effects return.
pub struct SessionController {
    config: AppConfig,
    state: State,
    store: Option<EntityStore>,
    converter: Box<dyn Converter>,
    archives: Vec<PathBuf>,
    systems: Vec<Descriptor>,
    chosen: Option<Descriptor>,
    selection: Option<Selection>,
    process_code: ProcessTypeCode,
    current: Option<CurrentReport>,
    pending_overwrite: Option<Report>,
}

impl SessionController {
    pub fn new(config: AppConfig, converter: Box<dyn Converter>) -> Self {
        Self {
            config,
            state: State::Main,
            store: None,
            converter,
            archives: Vec::new(),
            systems: Vec::new(),
            chosen: None,
            selection: None,
            process_code: ProcessTypeCode::default(),
            current: None,
            pending_overwrite: None,
        }
    }

    /// Use an already connected store, replacing any current one
    pub async fn attach(&mut self, store: EntityStore) {
        self.disconnect().await;
        self.store = Some(store);
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn is_connected(&self) -> bool {
        self.store.is_some()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.store.as_ref().map(|s| s.endpoint())
    }

    pub fn selected_system(&self) -> Option<&Descriptor> {
        self.selection.as_ref().map(|s| &s.system)
    }

    pub fn process_code(&self) -> ProcessTypeCode {
        self.process_code
    }

    pub fn report(&self) -> Option<&Report> {
        self.current.as_ref().map(|c| &c.report)
    }

    pub fn prompt(&self) -> String {
        format!("[{}] > ", self.state)
    }

    pub fn banner(&self) -> String {
        let mut out = vec![
            "Unit process documentation and report tool".to_string(),
            String::new(),
        ];
        out.push(menu_text(self.state));
        out.join("\n")
    }

    /// Process one input line to completion and return the text to show
    pub async fn handle(&mut self, line: &str) -> String {
        let Some(command) = Command::parse(line) else {
            return String::new();
        };
        let Some(t) = transition(self.state, &command) else {
            return format!(
                "Unrecognized command '{}' in {}. Type 'help' for options.",
                line.trim(),
                self.state
            );
        };

        let mut out = Vec::new();
        let next = match self.execute(t.effect, t.next, &mut out).await {
            Ok(Next::Proceed) => t.next,
            Ok(Next::Stay) => self.state,
            Ok(Next::Goto(state)) => state,
            Err(e) => self.recover(e, &mut out).await,
        };
        if next != self.state {
            log::debug!("{} -> {}", self.state, next);
            self.state = next;
        }
        out.join("\n")
    }

    /// Read commands from `input` until `quit` or end of input. End of input
    /// quits as well, so the connection is always released.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        output.write_all(self.banner().as_bytes()).await?;
        output.write_all(b"\n").await?;

        while !self.is_finished() {
            output.write_all(self.prompt().as_bytes()).await?;
            output.flush().await?;

            let line = match lines.next_line().await? {
                Some(line) => line,
                None => "quit".to_string(),
            };
            let text = self.handle(&line).await;
            if !text.is_empty() {
                output.write_all(text.as_bytes()).await?;
                output.write_all(b"\n").await?;
            }
        }
        output.flush().await?;
        Ok(())
    }

    async fn execute(&mut self, effect: Effect, target: State, out: &mut Vec<String>) -> Result<Next> {
        match effect {
            Effect::ShowMenu => {
                out.push(menu_text(target));
                Ok(Next::Proceed)
            }
            Effect::ShowHelp(topic) => {
                out.push(help_text(target, topic.as_deref()));
                Ok(Next::Proceed)
            }

            Effect::SetDataDir(dir) => {
                self.config.archive.data_dir = PathBuf::from(dir);
                out.push(format!(
                    "Data directory set to {}",
                    self.config.archive.data_dir.display()
                ));
                self.list_archives(out);
                Ok(Next::Proceed)
            }
            Effect::ListArchives => {
                self.list_archives(out);
                Ok(Next::Proceed)
            }
            Effect::OpenArchive(target) => {
                let Some(path) = self.archive_path(target.as_deref(), out) else {
                    return Ok(Next::Stay);
                };
                self.open(BackendConfig::Archive { path }, out).await
            }
            Effect::SetHost(host) => {
                self.config.service.host = host;
                out.push(format!("Service endpoint is {}", self.config.service.endpoint()));
                Ok(Next::Proceed)
            }
            Effect::SetPort(port) => match port.parse::<u16>() {
                Ok(port) => {
                    self.config.service.port = port;
                    out.push(format!("Service endpoint is {}", self.config.service.endpoint()));
                    Ok(Next::Proceed)
                }
                Err(_) => {
                    out.push(format!("'{}' is not a valid port number.", port));
                    Ok(Next::Stay)
                }
            },
            Effect::OpenService => {
                let config = BackendConfig::Service(self.config.service.clone());
                self.open(config, out).await
            }

            Effect::ListSystems => {
                let Some(store) = &self.store else {
                    out.push("Not connected. Use 'connect' first.".to_string());
                    return Ok(Next::Stay);
                };
                self.systems = store.summaries(EntityKind::ProductSystem).await?;
                if self.systems.is_empty() {
                    out.push(format!("No product systems found in {}.", store.endpoint()));
                } else {
                    out.push("Product systems:".to_string());
                    out.push(numbered(self.systems.iter().map(Descriptor::display_name)));
                    out.push("Pick one with 'choose <number>'.".to_string());
                }
                Ok(Next::Proceed)
            }
            Effect::ChooseSystem(raw) => {
                match pick(&self.systems, &raw) {
                    Some(system) => {
                        out.push(format!(
                            "Chosen '{}'. Confirm with 'yes' or discard with 'no'.",
                            system.display_name()
                        ));
                        self.chosen = Some(system.clone());
                    }
                    None => out.push(format!(
                        "'{}' is not in the list; use 'list' to see the product systems.",
                        raw
                    )),
                }
                Ok(Next::Proceed)
            }
            Effect::ConfirmSystem => {
                let Some(system) = self.chosen.take() else {
                    out.push("Choose a product system first.".to_string());
                    return Ok(Next::Stay);
                };
                let graph = self.store()?.select(system.kind, system.id, Depth::Full).await?;
                out.push(format!(
                    "Working on '{}' ({} entities loaded).",
                    system.display_name(),
                    graph.len()
                ));
                self.selection = Some(Selection { system, graph });
                out.push(menu_text(target));
                Ok(Next::Proceed)
            }
            Effect::RejectSystem => {
                self.chosen = None;
                out.push("Choice discarded.".to_string());
                Ok(Next::Proceed)
            }
            Effect::RequireSelection => {
                if self.selection.is_none() {
                    out.push("Select a product system first.".to_string());
                    return Ok(Next::Stay);
                }
                out.push(menu_text(target));
                Ok(Next::Proceed)
            }

            Effect::ShowDescription => {
                let process = self.reference_process()?;
                out.push(
                    process
                        .root
                        .description
                        .unwrap_or_else(|| "No description available.".to_string()),
                );
                Ok(Next::Proceed)
            }
            Effect::ShowDocumentation => {
                let process = self.reference_process()?;
                out.push(documentation_text(&process));
                Ok(Next::Proceed)
            }
            Effect::ShowCategory => {
                let process = self.reference_process()?;
                out.push(
                    process
                        .root
                        .category
                        .unwrap_or_else(|| "Uncategorized".to_string()),
                );
                Ok(Next::Proceed)
            }
            Effect::ShowFlows => {
                let process = self.reference_process()?;
                out.push(flows_text(&process));
                Ok(Next::Proceed)
            }

            Effect::ListFields => {
                let process = self.reference_process()?;
                let doc = serde_json::to_value(Entity::Process(process))
                    .map_err(|e| LcaError::Schema(e.to_string()))?;
                for def in registry::editable_fields(EntityKind::Process) {
                    let shown = field_value(&doc, def.path);
                    let hint = match def.shape {
                        FieldShape::Reference(kind, _) => format!(" ({} UUID)", kind),
                        _ => String::new(),
                    };
                    out.push(format!("  {}{} = {}", def.path, hint, shown));
                }
                Ok(Next::Proceed)
            }
            Effect::SetField { field, value } => {
                let id = self.reference_process_id()?;
                self.store()?
                    .edit(EntityKind::Process, id, &field, &value)
                    .await?;
                out.push(format!("Updated {}. Use 'commit' to write it back.", field));
                Ok(Next::Proceed)
            }
            Effect::SetProcessType(code) => match code.parse::<ProcessTypeCode>() {
                Ok(code) => {
                    self.process_code = code;
                    out.push(format!("Process type set to {}", code));
                    Ok(Next::Proceed)
                }
                Err(reason) => {
                    out.push(format!(
                        "{}; choose one of {}",
                        reason,
                        ProcessTypeCode::ALL.iter().map(|c| c.code()).join(", ")
                    ));
                    Ok(Next::Proceed)
                }
            },
            Effect::Commit => {
                let id = self.reference_process_id()?;
                self.store()?.commit(EntityKind::Process, id).await?;
                out.push("Changes committed.".to_string());
                Ok(Next::Proceed)
            }

            Effect::Generate => self.generate(out).await,
            Effect::ConfirmOverwrite => {
                let Some(report) = self.pending_overwrite.take() else {
                    out.push("Nothing to confirm.".to_string());
                    return Ok(Next::Proceed);
                };
                let saved = report.save(&self.config.report.output_dir, true)?;
                self.keep_report(report, saved, out);
                Ok(Next::Proceed)
            }
            Effect::DeclineOverwrite => {
                match self.pending_overwrite.take() {
                    Some(report) => out.push(format!(
                        "Kept the existing {}.",
                        report.path_in(&self.config.report.output_dir).display()
                    )),
                    None => out.push("Nothing to confirm.".to_string()),
                }
                Ok(Next::Proceed)
            }
            Effect::ShowReport => {
                match &self.current {
                    Some(current) => out.push(current.report.render()),
                    None => out.push("No report yet; use 'generate' or 'read'.".to_string()),
                }
                Ok(Next::Proceed)
            }
            Effect::ReadReport(path) => {
                let path = match path {
                    Some(path) => PathBuf::from(path),
                    None => match self.expected_report_path() {
                        Some(path) => path,
                        None => {
                            out.push("Use 'read <path>' to open a saved report.".to_string());
                            return Ok(Next::Proceed);
                        }
                    },
                };
                let report = Report::load(&path)?;
                out.push(format!("Loaded report '{}' from {}", report.name, path.display()));
                self.current = Some(CurrentReport { report, path });
                Ok(Next::Proceed)
            }

            Effect::ProbeConverter => {
                if self.converter.is_available().await {
                    out.push(format!("Using {} for conversion.", self.converter.name()));
                } else {
                    out.push(format!(
                        "Warning: {} is not available; conversions will fail.",
                        self.converter.name()
                    ));
                }
                out.push(menu_text(target));
                Ok(Next::Proceed)
            }
            Effect::Convert(format) => self.convert(format, out).await,

            Effect::Shutdown => {
                self.shutdown(out).await;
                Ok(Next::Proceed)
            }
        }
    }

    /// Session error policy. Returns the state to continue in.
    async fn recover(&mut self, error: LcaError, out: &mut Vec<String>) -> State {
        log::warn!("{} in {}", error, self.state);
        match error {
            LcaError::Schema(_) => {
                out.push(format!("Error: {}", error));
                out.push("The dataset is inconsistent; disconnected.".to_string());
                self.warn_dirty(out).await;
                self.disconnect().await;
                out.push(menu_text(State::Connect));
                State::Connect
            }
            LcaError::Validation { .. } => {
                out.push(format!("Error: {}", error));
                out.push("Nothing was changed; earlier edits are kept.".to_string());
                self.state
            }
            LcaError::WriteUnsupported { .. } => {
                out.push(format!("Note: {}", error));
                out.push("Edits stay in this session only.".to_string());
                self.state
            }
            LcaError::Conversion { ref report, .. } => {
                out.push(format!("Error: {}", error));
                out.push(format!("The markdown report is still at {}", report.display()));
                self.state
            }
            LcaError::NoSelection => {
                out.push(format!("Error: {}", error));
                out.push("Select a product system first ('select' from the main menu).".to_string());
                self.state
            }
            LcaError::MissingReport(_) => {
                out.push(format!("Error: {}", error));
                out.push("Generate a report first ('report' then 'generate').".to_string());
                self.state
            }
            _ => {
                out.push(format!("Error: {}", error));
                self.state
            }
        }
    }

    fn store(&self) -> Result<&EntityStore> {
        self.store
            .as_ref()
            .ok_or_else(|| LcaError::connection("session", "not connected"))
    }

    fn list_archives(&mut self, out: &mut Vec<String>) {
        let dir = &self.config.archive.data_dir;
        self.archives = match discover_archives(dir) {
            Ok(found) => found,
            Err(e) => {
                log::debug!("cannot list {}: {}", dir.display(), e);
                Vec::new()
            }
        };
        if self.archives.is_empty() {
            out.push(format!("No archives found in {}.", dir.display()));
            return;
        }
        out.push(format!("Archives in {}:", dir.display()));
        out.push(numbered(self.archives.iter().map(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.display().to_string())
        })));
    }

    /// Resolve `open` arguments: a list number, a path, or the only archive
    fn archive_path(&self, target: Option<&str>, out: &mut Vec<String>) -> Option<PathBuf> {
        let Some(target) = target else {
            if let [only] = self.archives.as_slice() {
                return Some(only.clone());
            }
            out.push("Use 'open <number|path>'.".to_string());
            return None;
        };
        if let Ok(n) = target.parse::<usize>() {
            return match n.checked_sub(1).and_then(|i| self.archives.get(i)) {
                Some(path) => Some(path.clone()),
                None => {
                    out.push(format!("No archive number {}; use 'list'.", n));
                    None
                }
            };
        }
        let path = PathBuf::from(target);
        if path.is_relative() && !path.exists() {
            return Some(self.config.archive.data_dir.join(path));
        }
        Some(path)
    }

    /// Connect to a new backend. The previous connection is only released
    /// once the new one is up.
    async fn open(&mut self, config: BackendConfig, out: &mut Vec<String>) -> Result<Next> {
        match EntityStore::connect(&config).await {
            Ok(store) => {
                self.disconnect().await;
                out.push(format!("Connected to {}", store.endpoint()));
                self.store = Some(store);
                out.push(menu_text(State::Main));
                Ok(Next::Proceed)
            }
            Err(e @ LcaError::Connection { .. }) => {
                out.push(format!("Error: {}", e));
                if let Some(endpoint) = self.endpoint() {
                    out.push(format!("Still connected to {}", endpoint));
                }
                out.push(menu_text(State::Connect));
                Ok(Next::Goto(State::Connect))
            }
            Err(e) => Err(e),
        }
    }

    /// Release the current connection and everything selected through it
    async fn disconnect(&mut self) {
        self.systems.clear();
        self.chosen = None;
        self.selection = None;
        self.pending_overwrite = None;
        if let Some(store) = self.store.take() {
            let endpoint = store.endpoint().to_string();
            if let Err(e) = store.close().await {
                log::warn!("closing {} failed: {}", endpoint, e);
            }
            log::info!("disconnected from {}", endpoint);
        }
    }

    fn selection(&self) -> Result<&Selection> {
        self.selection
            .as_ref()
            .ok_or(LcaError::NoSelection)
    }

    fn reference_process(&self) -> Result<Process> {
        let selection = self.selection()?;
        selection.reference_process().ok_or_else(|| {
            LcaError::Schema(format!(
                "product system {} has no reference process",
                selection.system.id
            ))
        })
    }

    fn reference_process_id(&self) -> Result<Uuid> {
        Ok(self.reference_process()?.root.id)
    }

    fn expected_report_path(&self) -> Option<PathBuf> {
        let system = self.selected_system()?;
        Some(
            self.config
                .report
                .output_dir
                .join(sanitize_file_name(&system.display_name())),
        )
    }

    async fn generate(&mut self, out: &mut Vec<String>) -> Result<Next> {
        let Some(system) = self.selected_system().cloned() else {
            out.push("Select a product system first.".to_string());
            return Ok(Next::Proceed);
        };
        let store = self.store()?;

        // re-select so edited references are followed
        let graph = store.select(system.kind, system.id, Depth::Full).await?;
        let mut globals = Vec::new();
        for parameter in store.summaries(EntityKind::Parameter).await? {
            let handle = store.get(EntityKind::Parameter, parameter.id).await?;
            let entity = handle.read();
            if let Entity::Parameter(p) = &*entity {
                if p.is_global() {
                    globals.push(p.clone());
                }
            }
        }
        let options = AssemblyOptions {
            process_code: self.process_code,
            globals,
        };
        let template = ReportTemplate::load(&self.config.report.template_dir)?;
        let report = build_report(&graph, &options, &template)?;
        if let Some(selection) = self.selection.as_mut() {
            selection.graph = graph;
        }

        match report.save(&self.config.report.output_dir, false) {
            Ok(saved) => {
                self.keep_report(report, saved, out);
                Ok(Next::Proceed)
            }
            Err(LcaError::ReportExists(path)) => {
                out.push(format!(
                    "{} already exists with different content. Overwrite it? (yes/no)",
                    path.display()
                ));
                self.pending_overwrite = Some(report);
                Ok(Next::Proceed)
            }
            Err(e) => Err(e),
        }
    }

    fn keep_report(&mut self, report: Report, saved: Saved, out: &mut Vec<String>) {
        match &saved {
            Saved::Written(path) => out.push(format!("Report written to {}", path.display())),
            Saved::Unchanged(path) => {
                out.push(format!("{} is already up to date.", path.display()))
            }
        }
        self.current = Some(CurrentReport {
            report,
            path: saved.path().to_path_buf(),
        });
    }

    async fn convert(&mut self, format: OutputFormat, out: &mut Vec<String>) -> Result<Next> {
        let path = match (&self.current, self.expected_report_path()) {
            (Some(current), _) => current.path.clone(),
            (None, Some(path)) => path,
            (None, None) => {
                out.push("No report to publish. Generate a report first.".to_string());
                return Ok(Next::Proceed);
            }
        };
        let written = self.converter.convert(&path, format).await?;
        out.push(format!("Published {}", written.display()));
        Ok(Next::Proceed)
    }

    async fn warn_dirty(&self, out: &mut Vec<String>) {
        if let Some(store) = &self.store {
            let dirty = store.dirty().await;
            if !dirty.is_empty() {
                out.push(format!(
                    "Warning: discarding {} uncommitted edit(s): {}",
                    dirty.len(),
                    dirty.iter().join(", ")
                ));
            }
        }
    }

    async fn shutdown(&mut self, out: &mut Vec<String>) {
        self.warn_dirty(out).await;
        self.disconnect().await;
        out.push("Goodbye.".to_string());
    }
}

fn pick<'a>(items: &'a [Descriptor], raw: &str) -> Option<&'a Descriptor> {
    let n = raw.trim().parse::<usize>().ok()?;
    items.get(n.checked_sub(1)?)
}

fn numbered(items: impl Iterator<Item = String>) -> String {
    items
        .enumerate()
        .map(|(i, item)| format!("  {}. {}", i + 1, item))
        .join("\n")
}

fn menu_line(entry: &MenuEntry) -> String {
    format!("  {:<22} {}", entry.usage, entry.help)
}

fn menu_text(state: State) -> String {
    let mut lines = vec![format!("{} options:", state)];
    lines.extend(state.menu().iter().chain(GLOBAL_MENU).map(menu_line));
    lines.join("\n")
}

fn help_text(state: State, topic: Option<&str>) -> String {
    let Some(topic) = topic else {
        return menu_text(state);
    };
    state
        .menu()
        .iter()
        .chain(GLOBAL_MENU)
        .find(|entry| entry.command.eq_ignore_ascii_case(topic))
        .map(|entry| format!("{}\n  {}", entry.usage, entry.help))
        .unwrap_or_else(|| format!("'{}' is not an option in {}.", topic, state))
}

/// Display form of a registry field in a serialized entity
fn field_value(doc: &Value, path: &str) -> String {
    let pointer = format!("/{}", path.replace('.', "/"));
    match doc.pointer(&pointer) {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(map)) => match (map.get("name"), map.get("@id")) {
            (Some(Value::String(name)), _) => name.clone(),
            (_, Some(Value::String(id))) => id.clone(),
            _ => Value::Object(map.clone()).to_string(),
        },
        Some(other) => other.to_string(),
    }
}

fn documentation_text(process: &Process) -> String {
    let Some(doc) = &process.process_documentation else {
        return "No process documentation available.".to_string();
    };
    let rows = [
        ("Valid from", doc.valid_from.as_deref()),
        ("Valid until", doc.valid_until.as_deref()),
        ("Creation date", doc.creation_date.as_deref()),
        ("Time", doc.time_description.as_deref()),
        ("Geography", doc.geography_description.as_deref()),
        ("Technology", doc.technology_description.as_deref()),
        ("Completeness", doc.completeness_description.as_deref()),
        ("Data selection", doc.data_selection_description.as_deref()),
        ("Project", doc.project_description.as_deref()),
    ];
    let mut lines: Vec<String> = rows
        .iter()
        .filter_map(|(label, value)| value.map(|v| format!("{}: {}", label, v)))
        .collect();
    if let Some(reviewer) = &doc.reviewer {
        lines.push(format!("Reviewer: {}", reviewer.display_name()));
    }
    if let Some(owner) = &doc.data_set_owner {
        lines.push(format!("Data set owner: {}", owner.display_name()));
    }
    if lines.is_empty() {
        return "No process documentation available.".to_string();
    }
    lines.join("\n")
}

fn flows_text(process: &Process) -> String {
    if process.exchanges.is_empty() {
        return "No flows available.".to_string();
    }
    process
        .exchanges
        .iter()
        .map(|e| {
            format!(
                "  {:<6} {} | {} {}",
                if e.is_input { "input" } else { "output" },
                e.flow.as_ref().map(|f| f.display_name()).unwrap_or_default(),
                sci(e.amount),
                e.unit.as_ref().map(|u| u.display_name()).unwrap_or_default()
            )
        })
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::PandocConverter;

    fn controller(dir: &std::path::Path) -> SessionController {
        let mut config = AppConfig::default();
        config.archive.data_dir = dir.join("data");
        config.report.output_dir = dir.join("output");
        config.report.template_dir = dir.join("template");
        SessionController::new(
            config,
            Box::new(PandocConverter::new("definitely-not-a-converter-binary", dir)),
        )
    }

    #[tokio::test]
    async fn test_unrecognized_command_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = controller(dir.path());
        let reply = session.handle("dance").await;
        assert!(reply.starts_with("Unrecognized command 'dance'"));
        assert_eq!(session.state(), State::Main);

        // offered in REPORT, not in MAIN
        session.handle("generate").await;
        assert_eq!(session.state(), State::Main);
        assert!(session.report().is_none());
    }

    #[tokio::test]
    async fn test_review_requires_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = controller(dir.path());
        let reply = session.handle("review").await;
        assert!(reply.contains("Select a product system first."));
        assert_eq!(session.state(), State::Main);
    }

    #[tokio::test]
    async fn test_missing_selection_in_review_stays_put() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = controller(dir.path());
        session.state = State::Review;
        let reply = session.handle("description").await;
        assert!(reply.contains("no product system selected"), "{}", reply);
        assert!(!reply.contains("disconnected"));
        assert_eq!(session.state(), State::Review);
    }

    #[tokio::test]
    async fn test_open_missing_archive_returns_to_connect() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = controller(dir.path());
        session.handle("connect").await;
        session.handle("file").await;
        assert_eq!(session.state(), State::ConnectArchive);

        let reply = session.handle("open /no/such/archive.zip").await;
        assert!(reply.contains("Error: connection to"));
        assert_eq!(session.state(), State::Connect);
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_port_must_be_numeric() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = controller(dir.path());
        session.handle("connect").await;
        session.handle("service").await;
        let reply = session.handle("port eighty").await;
        assert!(reply.contains("not a valid port"));
        assert_eq!(session.state(), State::ConnectService);
        session.handle("port 8081").await;
        assert_eq!(session.config.service.port, 8081);
    }

    #[tokio::test]
    async fn test_help_for_one_command() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = controller(dir.path());
        let reply = session.handle("help connect").await;
        assert!(reply.starts_with("connect\n"));
        let reply = session.handle("help quit").await;
        assert!(reply.contains("Release the connection"));
    }

    #[tokio::test]
    async fn test_read_detached_report() {
        let dir = tempfile::tempdir().unwrap();
        let saved = Report::new("ERCOT 2030", "# Overview\n")
            .save(&dir.path().join("output"), false)
            .unwrap();

        let mut session = controller(dir.path());
        session.handle("report").await;
        let reply = session
            .handle(&format!("read {}", saved.path().display()))
            .await;
        assert!(reply.contains("Loaded report 'ERCOT_2030'"));
        assert_eq!(session.handle("show").await, "# Overview\n");
    }

    #[tokio::test]
    async fn test_process_type_code() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = controller(dir.path());
        session.state = State::Edit;
        session.handle("ptype ec").await;
        assert_eq!(session.process_code(), ProcessTypeCode::Ec);
        let reply = session.handle("ptype zz").await;
        assert!(reply.contains("EP, MP, BP"));
        assert_eq!(session.process_code(), ProcessTypeCode::Ec);
    }

    #[tokio::test]
    async fn test_quit_reaches_terminal_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = controller(dir.path());
        session.handle("connect").await;
        let reply = session.handle("quit").await;
        assert!(reply.ends_with("Goodbye."));
        assert!(session.is_finished());
        // nothing is offered any more
        assert!(session.handle("menu").await.starts_with("Unrecognized"));
    }

    #[test]
    fn test_field_value_display() {
        let doc = serde_json::json!({
            "name": "electricity",
            "processDocumentation": {"reviewer": {"@id": "x", "name": "Jo Reviewer"}},
            "version": null
        });
        assert_eq!(field_value(&doc, "name"), "electricity");
        assert_eq!(field_value(&doc, "processDocumentation.reviewer"), "Jo Reviewer");
        assert_eq!(field_value(&doc, "version"), "-");
        assert_eq!(field_value(&doc, "description"), "-");
    }
}
