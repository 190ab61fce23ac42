use crate::config::Settings;
use crate::traits::{
    CommandExecutor, FileSystem, HttpClient, InquireUserInput, Output, RealCommandExecutor,
    RealFileSystem, ReqwestClient, TerminalOutput, UserInput,
};
use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Application context that holds all dependencies for dependency injection
pub struct Context {
    pub fs: Arc<dyn FileSystem>,
    pub input: Arc<dyn UserInput>,
    pub output: Arc<dyn Output>,
    pub command: Arc<dyn CommandExecutor>,
    pub http: Arc<dyn HttpClient>,
    pub settings: Settings,
    /// Set by the Ctrl-C handler while no prompt owns the terminal
    pub interrupted: Arc<AtomicBool>,
}

impl Context {
    /// Create a new context with real implementations (for production use)
    pub fn new(settings: Settings) -> Result<Self> {
        Ok(Self {
            fs: Arc::new(RealFileSystem),
            input: Arc::new(InquireUserInput),
            output: Arc::new(TerminalOutput),
            command: Arc::new(RealCommandExecutor::new()),
            http: Arc::new(ReqwestClient::new(settings.timeout)?),
            settings,
            interrupted: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Create a test context with specific mock implementations
    #[cfg(test)]
    pub fn test_with(
        fs: Arc<dyn FileSystem>,
        input: Arc<dyn UserInput>,
        output: Arc<dyn Output>,
        command: Arc<dyn CommandExecutor>,
        http: Arc<dyn HttpClient>,
        settings: Settings,
    ) -> Self {
        Self {
            fs,
            input,
            output,
            command,
            http,
            settings,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether Ctrl-C was pressed outside of a prompt
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}
