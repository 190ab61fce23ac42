use std::sync::Mutex;

/// Output message captured by MockOutput for testing
#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub enum OutputMessage {
    Success(String),
    Error(String),
    Warning(String),
    Info(String),
    Section(String),
    Dimmed(String),
    BrightWhite(String),
    Live(String),
    Blank,
    Clear,
}

/// Trait for terminal output operations to enable testing with mocks
pub trait Output: Send + Sync {
    /// Print a success message
    fn success(&self, message: &str);

    /// Print an error message
    fn error(&self, message: &str);

    /// Print a warning message
    fn warning(&self, message: &str);

    /// Print an info message (the "Loading..." boxes)
    fn info(&self, message: &str);

    /// Print a section header
    fn section(&self, title: &str);

    /// Print a dimmed/muted message
    fn dimmed(&self, message: &str);

    /// Print a message in bright white (for titles and emphasis)
    fn bright_white(&self, message: &str);

    /// Print one line of a child process's output in the progress view.
    ///
    /// Not a `Prompt`: the view only shows output and expects no reply.
    fn live_line(&self, line: &str);

    /// Print a blank line
    fn blank(&self);

    /// Clear the terminal
    fn clear(&self);
}

/// Real terminal output implementation using the output module
pub struct TerminalOutput;

impl Output for TerminalOutput {
    fn success(&self, message: &str) {
        crate::output::success(message);
    }

    fn error(&self, message: &str) {
        crate::output::error(message);
    }

    fn warning(&self, message: &str) {
        crate::output::warning(message);
    }

    fn info(&self, message: &str) {
        crate::output::info(message);
    }

    fn section(&self, title: &str) {
        crate::output::section(title);
    }

    fn dimmed(&self, message: &str) {
        crate::output::dimmed(message);
    }

    fn bright_white(&self, message: &str) {
        crate::output::bright_white(message);
    }

    fn live_line(&self, line: &str) {
        crate::output::live_line(line);
    }

    fn blank(&self) {
        crate::output::blank();
    }

    fn clear(&self) {
        crate::output::clear_screen();
    }
}

/// Mock output implementation for testing (captures output)
#[allow(dead_code)]
pub struct MockOutput {
    messages: Mutex<Vec<OutputMessage>>,
}

#[allow(dead_code)]
impl MockOutput {
    /// Create new mock output
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Get all captured messages
    pub fn get_messages(&self) -> Vec<OutputMessage> {
        self.messages.lock().unwrap().clone()
    }

    /// Check if a specific message was output
    pub fn contains_message(&self, message: &OutputMessage) -> bool {
        self.messages.lock().unwrap().contains(message)
    }

    /// Check if any error message was output
    pub fn has_error(&self) -> bool {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .any(|m| matches!(m, OutputMessage::Error(_)))
    }

    /// Get all error messages
    pub fn get_errors(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter_map(|m| {
                if let OutputMessage::Error(msg) = m {
                    Some(msg.clone())
                } else {
                    None
                }
            })
            .collect()
    }

    /// Get all lines shown in the progress view
    pub fn get_live_lines(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter_map(|m| {
                if let OutputMessage::Live(line) = m {
                    Some(line.clone())
                } else {
                    None
                }
            })
            .collect()
    }

    /// Get all messages formatted as text
    pub fn to_text(&self) -> String {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|msg| match msg {
                OutputMessage::Success(s) => format!("✓ {}", s),
                OutputMessage::Error(s) => format!("✗ {}", s),
                OutputMessage::Warning(s) => format!("⚠ {}", s),
                OutputMessage::Info(s) => s.clone(),
                OutputMessage::Section(s) => format!("\n=== {} ===", s),
                OutputMessage::Dimmed(s) => s.clone(),
                OutputMessage::BrightWhite(s) => s.clone(),
                OutputMessage::Live(s) => format!("│ {}", s),
                OutputMessage::Blank => String::new(),
                OutputMessage::Clear => "<clear>".to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn push(&self, message: OutputMessage) {
        self.messages.lock().unwrap().push(message);
    }
}

impl Default for MockOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl Output for MockOutput {
    fn success(&self, message: &str) {
        self.push(OutputMessage::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(OutputMessage::Error(message.to_string()));
    }

    fn warning(&self, message: &str) {
        self.push(OutputMessage::Warning(message.to_string()));
    }

    fn info(&self, message: &str) {
        self.push(OutputMessage::Info(message.to_string()));
    }

    fn section(&self, title: &str) {
        self.push(OutputMessage::Section(title.to_string()));
    }

    fn dimmed(&self, message: &str) {
        self.push(OutputMessage::Dimmed(message.to_string()));
    }

    fn bright_white(&self, message: &str) {
        self.push(OutputMessage::BrightWhite(message.to_string()));
    }

    fn live_line(&self, line: &str) {
        self.push(OutputMessage::Live(line.to_string()));
    }

    fn blank(&self) {
        self.push(OutputMessage::Blank);
    }

    fn clear(&self) {
        self.push(OutputMessage::Clear);
    }
}
