// Splits launcher-private flags from the arguments forwarded to the application.
use std::ffi::{OsStr, OsString};

pub const SHIM_VERSION_FLAG: &str = "--shim-version";
pub const LIST_VERSIONS_FLAG: &str = "--list-versions";
pub const SWITCH_VERSION_FLAG: &str = "--switch-version";
pub const USE_VERSION_FLAG: &str = "--use-version";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivateCommand {
    /// Print the launcher's own version
    ShimVersion,
    /// List installed versions, marking the current one
    ListVersions,
    /// Repoint the current version; `None` when the id was left out
    SwitchVersion(Option<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// Set when the first argument is a launcher-private command.
    pub command: Option<PrivateCommand>,
    /// Value of the first non-empty `--use-version=<id>`.
    pub use_version: Option<String>,
    /// Arguments for the real application, original order, private flags removed.
    pub forwarded: Vec<OsString>,
}

impl Invocation {
    /// Parse arguments that follow the program name.
    pub fn parse<I>(args: I) -> Self
    where
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        if let Some(command) = parse_private_command(&args) {
            return Self {
                command: Some(command),
                ..Self::default()
            };
        }
        let mut use_version = None;
        let mut forwarded = Vec::with_capacity(args.len());
        for arg in args {
            match use_version_value(&arg) {
                Some(value) => {
                    if use_version.is_none() && !value.trim().is_empty() {
                        use_version = Some(value.trim().to_string());
                    }
                }
                None => forwarded.push(arg),
            }
        }
        Self {
            command: None,
            use_version,
            forwarded,
        }
    }
}

fn parse_private_command(args: &[OsString]) -> Option<PrivateCommand> {
    let first = args.first()?.to_str()?;
    match first {
        SHIM_VERSION_FLAG => Some(PrivateCommand::ShimVersion),
        LIST_VERSIONS_FLAG => Some(PrivateCommand::ListVersions),
        SWITCH_VERSION_FLAG => Some(PrivateCommand::SwitchVersion(
            args.get(1).and_then(|a| a.to_str()).map(str::to_string),
        )),
        other => other
            .strip_prefix(SWITCH_VERSION_FLAG)
            .and_then(|rest| rest.strip_prefix('='))
            .map(|id| PrivateCommand::SwitchVersion(Some(id.to_string()).filter(|s| !s.is_empty()))),
    }
}

fn use_version_value(arg: &OsStr) -> Option<&str> {
    arg.to_str()?
        .strip_prefix(USE_VERSION_FLAG)?
        .strip_prefix('=')
}
