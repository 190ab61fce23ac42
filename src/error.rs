use std::fmt;

/// Error kinds raised while driving the wizard
#[derive(Debug)]
pub enum WizardError {
    /// The catalog document could not be fetched or parsed
    CatalogFetch(String),

    /// A single artifact (plain or template file) could not be fetched, rendered or written
    ArtifactFetch { url: String, message: String },

    /// The bundle archive could not be fetched or unpacked
    BundleFetch { url: String, message: String },

    /// Tag listing for an application could not be fetched or parsed
    VersionLookup { app: String, message: String },

    /// User input failed validation
    InputValidation(String),

    /// A directory could not be created for a reason other than "already exists"
    DirectoryCreate { path: String, message: String },

    /// A required binary is not on the executable search path
    MissingDependency(String),

    /// The orchestration command could not be run or exited unsuccessfully
    ComposeFailed { command: String, exit_code: Option<i32> },
}

impl fmt::Display for WizardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardError::CatalogFetch(msg) => {
                write!(f, "Failed to load the list of templates: {}", msg)
            }
            WizardError::ArtifactFetch { url, message } => {
                write!(f, "Failed to load file '{}': {}", url, message)
            }
            WizardError::BundleFetch { url, message } => {
                write!(f, "Failed to load bundle '{}': {}", url, message)
            }
            WizardError::VersionLookup { app, message } => {
                write!(f, "Failed to list versions of '{}': {}", app, message)
            }
            WizardError::InputValidation(msg) => write!(f, "{}", msg),
            WizardError::DirectoryCreate { path, message } => {
                write!(f, "Failed to create directory '{}': {}", path, message)
            }
            WizardError::MissingDependency(binary) => {
                write!(
                    f,
                    "'{}' is not installed or not available in PATH",
                    binary
                )
            }
            WizardError::ComposeFailed { command, exit_code } => match exit_code {
                Some(code) => write!(f, "'{}' exited with code {}", command, code),
                None => write!(f, "'{}' could not be run", command),
            },
        }
    }
}

impl std::error::Error for WizardError {}

/// Why the wizard stopped, mapped to the final message and the process exit code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// Installation finished
    Completed,

    /// The user declined, backed out of the first stage, or interrupted
    Cancelled,

    /// A required binary is missing
    MissingDependency(String),

    /// Anything unrecoverable
    Failed(String),
}

impl ExitReason {
    pub fn exit_code(&self) -> u8 {
        match self {
            ExitReason::Completed | ExitReason::Cancelled => 0,
            ExitReason::MissingDependency(_) | ExitReason::Failed(_) => 1,
        }
    }

    /// Title and body of the exit screen
    pub fn message(&self) -> (&'static str, String) {
        match self {
            ExitReason::Completed | ExitReason::Cancelled => (
                "Exiting...",
                concat!(
                    "Script ends normally.\n\n",
                    "You may run this script anytime with command:\n",
                    "        docker-menu",
                )
                .to_string(),
            ),
            ExitReason::MissingDependency(binary) => (
                "Missing dependency",
                format!(
                    "{}\n\nPlease install it and run docker-menu again.",
                    WizardError::MissingDependency(binary.clone())
                ),
            ),
            ExitReason::Failed(msg) => ("Failed!", msg.clone()),
        }
    }
}

impl From<&anyhow::Error> for ExitReason {
    fn from(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<WizardError>() {
            Some(WizardError::MissingDependency(binary)) => {
                ExitReason::MissingDependency(binary.clone())
            }
            _ => ExitReason::Failed(format!("{:#}", err)),
        }
    }
}
