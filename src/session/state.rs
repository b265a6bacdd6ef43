//! Session states, commands and the pure transition table.

use std::fmt;

use crate::report::OutputFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Main,
    Connect,
    ConnectService,
    ConnectArchive,
    SelectSystem,
    Review,
    Edit,
    Report,
    Publish,
    Quit,
}

impl State {
    pub fn name(self) -> &'static str {
        match self {
            State::Main => "MAIN",
            State::Connect => "CONNECT",
            State::ConnectService => "CONNECT_SERVICE",
            State::ConnectArchive => "CONNECT_ARCHIVE",
            State::SelectSystem => "SELECT_SYSTEM",
            State::Review => "REVIEW",
            State::Edit => "EDIT",
            State::Report => "REPORT",
            State::Publish => "PUBLISH",
            State::Quit => "QUIT",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == State::Quit
    }

    /// Commands offered in this state, global commands excluded
    pub fn menu(self) -> &'static [MenuEntry] {
        match self {
            State::Main => MAIN_MENU,
            State::Connect => CONNECT_MENU,
            State::ConnectService => SERVICE_MENU,
            State::ConnectArchive => ARCHIVE_MENU,
            State::SelectSystem => SELECT_MENU,
            State::Review => REVIEW_MENU,
            State::Edit => EDIT_MENU,
            State::Report => REPORT_MENU,
            State::Publish => PUBLISH_MENU,
            State::Quit => &[],
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    pub command: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
}

const fn entry(command: &'static str, usage: &'static str, help: &'static str) -> MenuEntry {
    MenuEntry {
        command,
        usage,
        help,
    }
}

const BACK: MenuEntry = entry("back", "back", "Return to the previous menu.");

pub const GLOBAL_MENU: &[MenuEntry] = &[
    entry("help", "help [command]", "Show help for this menu or for one command."),
    entry("menu", "menu", "Show the options of the current menu."),
    entry("quit", "quit", "Release the connection and leave the session."),
];

const MAIN_MENU: &[MenuEntry] = &[
    entry("connect", "connect", "Connect to a JSON-LD archive or a running modeling service."),
    entry("select", "select", "Choose the product system to work on."),
    entry("review", "review", "Open the review data menu."),
    entry("edit", "edit", "Edit fields of the reference process."),
    entry("report", "report", "Generate, show or read the markdown report."),
    entry("publish", "publish", "Convert the report to pdf, docx or html."),
];

const CONNECT_MENU: &[MenuEntry] = &[
    entry("file", "file", "Connect to a JSON-LD zip archive in your data directory."),
    entry("service", "service", "Connect to a modeling service over IPC."),
    BACK,
];

const ARCHIVE_MENU: &[MenuEntry] = &[
    entry("dir", "dir <path>", "Change the data directory searched for archives."),
    entry("list", "list", "List the zip archives in the data directory."),
    entry("open", "open <number|path>", "Open an archive by list number or path."),
    BACK,
];

const SERVICE_MENU: &[MenuEntry] = &[
    entry("host", "host <name>", "Set the service host."),
    entry("port", "port <number>", "Set the service port."),
    entry("open", "open", "Connect to the service at host:port."),
    BACK,
];

const SELECT_MENU: &[MenuEntry] = &[
    entry("list", "list", "List the product systems of the dataset."),
    entry("choose", "choose <number>", "Pick a product system from the list."),
    entry("yes", "yes", "Confirm the chosen product system."),
    entry("no", "no", "Discard the choice."),
    BACK,
];

const REVIEW_MENU: &[MenuEntry] = &[
    entry("description", "description", "Show the unit process description."),
    entry("documentation", "documentation", "Show the unit process documentation."),
    entry("category", "category", "Show the unit process category."),
    entry("flows", "flows", "Show the unit process input/output flows."),
    BACK,
];

const EDIT_MENU: &[MenuEntry] = &[
    entry("fields", "fields", "List editable fields and their current values."),
    entry(
        "set",
        "set <field> <value>",
        "Set a field; reference fields take the target's UUID, empty clears.",
    ),
    entry("ptype", "ptype <code>", "Choose the process type code (EP, MP, BP, ...)."),
    entry("commit", "commit", "Write the edited process back to the data source."),
    BACK,
];

const REPORT_MENU: &[MenuEntry] = &[
    entry("generate", "generate", "Assemble the report and write it as markdown."),
    entry("yes", "yes", "Confirm overwriting an existing report."),
    entry("no", "no", "Keep the existing report."),
    entry("show", "show", "Show the current report on screen."),
    entry("read", "read [path]", "Read a saved markdown report without a connection."),
    BACK,
];

const PUBLISH_MENU: &[MenuEntry] = &[
    entry("pdf", "pdf", "Convert the markdown report to pdf."),
    entry("docx", "docx", "Convert the markdown report to Microsoft Word."),
    entry("html", "html", "Convert the markdown report to standalone html."),
    BACK,
];

/// A parsed input line. Arguments are kept raw; the controller validates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help(Option<String>),
    Menu,
    Quit,
    Back,
    Connect,
    Select,
    Review,
    Edit,
    Report,
    Publish,
    File,
    Service,
    Dir(String),
    List,
    Open(Option<String>),
    Host(String),
    Port(String),
    Choose(String),
    Yes,
    No,
    Description,
    Documentation,
    Category,
    Flows,
    Fields,
    Set { field: String, value: String },
    ProcessType(String),
    Commit,
    Generate,
    Show,
    Read(Option<String>),
    Convert(OutputFormat),
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let arg = || (!rest.is_empty()).then(|| rest.to_string());

        let command = match word.to_ascii_lowercase().as_str() {
            "help" | "?" => Command::Help(arg()),
            "menu" => Command::Menu,
            "quit" | "q" | "exit" => Command::Quit,
            "back" | "b" => Command::Back,
            "connect" => Command::Connect,
            "select" => Command::Select,
            "review" => Command::Review,
            "edit" => Command::Edit,
            "report" => Command::Report,
            "publish" => Command::Publish,
            "file" => Command::File,
            "service" => Command::Service,
            "dir" => match arg() {
                Some(path) => Command::Dir(path),
                None => Command::Unknown(line.to_string()),
            },
            "list" | "ls" => Command::List,
            "open" => Command::Open(arg()),
            "host" => match arg() {
                Some(host) => Command::Host(host),
                None => Command::Unknown(line.to_string()),
            },
            "port" => match arg() {
                Some(port) => Command::Port(port),
                None => Command::Unknown(line.to_string()),
            },
            "choose" => match arg() {
                Some(n) => Command::Choose(n),
                None => Command::Unknown(line.to_string()),
            },
            "yes" | "y" => Command::Yes,
            "no" | "n" => Command::No,
            "description" => Command::Description,
            "documentation" => Command::Documentation,
            "category" => Command::Category,
            "flows" => Command::Flows,
            "fields" => Command::Fields,
            "set" => match rest.split_once(char::is_whitespace) {
                Some((field, value)) => Command::Set {
                    field: field.to_string(),
                    value: value.trim().to_string(),
                },
                None if !rest.is_empty() => Command::Set {
                    field: rest.to_string(),
                    value: String::new(),
                },
                None => Command::Unknown(line.to_string()),
            },
            "ptype" => match arg() {
                Some(code) => Command::ProcessType(code),
                None => Command::Unknown(line.to_string()),
            },
            "commit" => Command::Commit,
            "generate" => Command::Generate,
            "show" => Command::Show,
            "read" => Command::Read(arg()),
            "pdf" => Command::Convert(OutputFormat::Pdf),
            "docx" => Command::Convert(OutputFormat::Docx),
            "html" => Command::Convert(OutputFormat::Html),
            _ => Command::Unknown(line.to_string()),
        };
        Some(command)
    }
}

/// Side effect the controller runs when a transition fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ShowMenu,
    ShowHelp(Option<String>),
    SetDataDir(String),
    ListArchives,
    OpenArchive(Option<String>),
    SetHost(String),
    SetPort(String),
    OpenService,
    RequireSelection,
    ListSystems,
    ChooseSystem(String),
    ConfirmSystem,
    RejectSystem,
    ShowDescription,
    ShowDocumentation,
    ShowCategory,
    ShowFlows,
    ListFields,
    SetField { field: String, value: String },
    SetProcessType(String),
    Commit,
    Generate,
    ConfirmOverwrite,
    DeclineOverwrite,
    ShowReport,
    ReadReport(Option<String>),
    ProbeConverter,
    Convert(OutputFormat),
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: State,
    pub effect: Effect,
}

fn to(next: State, effect: Effect) -> Option<Transition> {
    Some(Transition { next, effect })
}

/// The menu graph. `None` means the command is not offered in `state`:
/// the session re-prompts and nothing changes.
pub fn transition(state: State, command: &Command) -> Option<Transition> {
    use Command as C;
    use State as S;

    if state.is_terminal() {
        return None;
    }
    match command {
        C::Quit => return to(S::Quit, Effect::Shutdown),
        C::Help(topic) => return to(state, Effect::ShowHelp(topic.clone())),
        C::Menu => return to(state, Effect::ShowMenu),
        _ => {}
    }

    match (state, command) {
        (S::Main, C::Connect) => to(S::Connect, Effect::ShowMenu),
        (S::Main, C::Select) => to(S::SelectSystem, Effect::ListSystems),
        (S::Main, C::Review) => to(S::Review, Effect::RequireSelection),
        (S::Main, C::Edit) => to(S::Edit, Effect::RequireSelection),
        (S::Main, C::Report) => to(S::Report, Effect::ShowMenu),
        (S::Main, C::Publish) => to(S::Publish, Effect::ProbeConverter),

        (S::Connect, C::File) => to(S::ConnectArchive, Effect::ListArchives),
        (S::Connect, C::Service) => to(S::ConnectService, Effect::ShowMenu),
        (S::Connect, C::Back) => to(S::Main, Effect::ShowMenu),

        (S::ConnectArchive, C::Dir(path)) => to(state, Effect::SetDataDir(path.clone())),
        (S::ConnectArchive, C::List) => to(state, Effect::ListArchives),
        (S::ConnectArchive, C::Open(target)) => to(S::Main, Effect::OpenArchive(target.clone())),
        (S::ConnectArchive, C::Back) => to(S::Connect, Effect::ShowMenu),

        (S::ConnectService, C::Host(host)) => to(state, Effect::SetHost(host.clone())),
        (S::ConnectService, C::Port(port)) => to(state, Effect::SetPort(port.clone())),
        (S::ConnectService, C::Open(None)) => to(S::Main, Effect::OpenService),
        (S::ConnectService, C::Back) => to(S::Connect, Effect::ShowMenu),

        (S::SelectSystem, C::List) => to(state, Effect::ListSystems),
        (S::SelectSystem, C::Choose(n)) => to(state, Effect::ChooseSystem(n.clone())),
        (S::SelectSystem, C::Yes) => to(S::Review, Effect::ConfirmSystem),
        (S::SelectSystem, C::No) => to(state, Effect::RejectSystem),
        (S::SelectSystem, C::Back) => to(S::Main, Effect::ShowMenu),

        (S::Review, C::Description) => to(state, Effect::ShowDescription),
        (S::Review, C::Documentation) => to(state, Effect::ShowDocumentation),
        (S::Review, C::Category) => to(state, Effect::ShowCategory),
        (S::Review, C::Flows) => to(state, Effect::ShowFlows),
        (S::Review, C::Back) => to(S::Main, Effect::ShowMenu),

        (S::Edit, C::Fields) => to(state, Effect::ListFields),
        (S::Edit, C::Set { field, value }) => to(
            state,
            Effect::SetField {
                field: field.clone(),
                value: value.clone(),
            },
        ),
        (S::Edit, C::ProcessType(code)) => to(state, Effect::SetProcessType(code.clone())),
        (S::Edit, C::Commit) => to(state, Effect::Commit),
        (S::Edit, C::Back) => to(S::Main, Effect::ShowMenu),

        (S::Report, C::Generate) => to(state, Effect::Generate),
        (S::Report, C::Yes) => to(state, Effect::ConfirmOverwrite),
        (S::Report, C::No) => to(state, Effect::DeclineOverwrite),
        (S::Report, C::Show) => to(state, Effect::ShowReport),
        (S::Report, C::Read(path)) => to(state, Effect::ReadReport(path.clone())),
        (S::Report, C::Back) => to(S::Main, Effect::ShowMenu),

        (S::Publish, C::Convert(format)) => to(state, Effect::Convert(*format)),
        (S::Publish, C::Back) => to(S::Main, Effect::ShowMenu),

        _ => None,
    }
}

/// Every state that can be entered
pub const ALL_STATES: [State; 10] = [
    State::Main,
    State::Connect,
    State::ConnectService,
    State::ConnectArchive,
    State::SelectSystem,
    State::Review,
    State::Edit,
    State::Report,
    State::Publish,
    State::Quit,
];
