use crate::wizard::versions::{PickEntry, TagTree};
use anyhow::Result;
use inquire::InquireError;
use std::collections::VecDeque;
use std::sync::Mutex;

const HELP_LABEL: &str = "? Help";
const BACK_LABEL: &str = "← Go back";

/// A selectable menu line
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub key: String,
    pub description: String,
}

impl MenuItem {
    pub fn new(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
        }
    }

    fn label(&self) -> String {
        if self.description.is_empty() {
            self.key.clone()
        } else {
            format!("{} - {}", self.key, self.description)
        }
    }
}

/// The fixed set of blocking prompts the wizard can show
#[derive(Debug)]
pub enum Prompt<'a> {
    /// Yes/no question
    Confirm { text: &'a str, default: bool },

    /// Single choice from a list, optionally with Help and Back entries
    Menu {
        title: &'a str,
        text: &'a str,
        items: &'a [MenuItem],
        help: bool,
        back: bool,
    },

    /// Input that is never echoed
    MaskedInput { text: &'a str },

    /// Free text input
    TextInput { text: &'a str },

    /// Message box acknowledged by the user
    Message { title: &'a str, text: &'a str },

    /// Hierarchical choice over a tag tree
    Pick { text: &'a str, tree: &'a TagTree },
}

impl Prompt<'_> {
    /// Short description used by mocks and debug logs (never includes values)
    pub fn describe(&self) -> String {
        match self {
            Prompt::Confirm { text, .. } => format!("confirm: {}", text),
            Prompt::Menu { title, .. } => format!("menu: {}", title),
            Prompt::MaskedInput { text } => format!("masked: {}", text),
            Prompt::TextInput { text } => format!("text: {}", text),
            Prompt::Message { title, .. } => format!("message: {}", title),
            Prompt::Pick { text, .. } => format!("pick: {}", text),
        }
    }
}

/// What the user did with a prompt
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Answer to a Confirm prompt
    Confirmed(bool),

    /// Selected menu key, picked tag, or entered text
    Value(String),

    /// Help requested from a menu
    Help,

    /// Escape or the Back entry
    Cancel,

    /// Ctrl-C
    Interrupt,

    /// Message box dismissed
    Acknowledged,
}

/// Trait for user input operations to enable testing with mocks
pub trait UserInput: Send + Sync {
    /// Show a prompt and block until the user answers it
    fn ask(&self, prompt: Prompt<'_>) -> Result<Reply>;
}

/// Real user input implementation using inquire crate
pub struct InquireUserInput;

impl InquireUserInput {
    fn menu(
        &self,
        title: &str,
        text: &str,
        items: &[MenuItem],
        help: bool,
        back: bool,
    ) -> Result<Reply> {
        use inquire::Select;

        let mut options: Vec<String> = Vec::new();
        if back {
            options.push(BACK_LABEL.to_string());
        }
        options.extend(items.iter().map(MenuItem::label));
        if help {
            options.push(HELP_LABEL.to_string());
        }

        crate::output::section(title);
        let answer = Select::new(text, options).raw_prompt();

        reply_from(answer, |choice| {
            let offset = usize::from(back);
            if back && choice.index == 0 {
                Reply::Cancel
            } else if choice.index - offset < items.len() {
                Reply::Value(items[choice.index - offset].key.clone())
            } else {
                Reply::Help
            }
        })
    }

    fn pick(&self, text: &str, tree: &TagTree) -> Result<Reply> {
        use inquire::Select;

        let mut path: Vec<String> = Vec::new();
        loop {
            let entries = tree.entries(&path);
            let nested = !path.is_empty();

            let mut options: Vec<String> = Vec::new();
            if nested {
                options.push(BACK_LABEL.to_string());
            }
            options.extend(entries.iter().map(PickEntry::label));

            let message = if nested {
                format!("{} ({})", text, tree.prefix_of(&path).unwrap_or_default())
            } else {
                text.to_string()
            };

            let choice = match Select::new(&message, options).raw_prompt() {
                Ok(choice) => choice,
                Err(InquireError::OperationCanceled) if nested => {
                    path.pop();
                    continue;
                }
                Err(InquireError::OperationCanceled) => return Ok(Reply::Cancel),
                Err(InquireError::OperationInterrupted) => return Ok(Reply::Interrupt),
                Err(e) => return Err(e.into()),
            };

            if nested && choice.index == 0 {
                path.pop();
                continue;
            }

            match &entries[choice.index - usize::from(nested)] {
                PickEntry::Tag(tag) => return Ok(Reply::Value(tag.clone())),
                PickEntry::Group { segment, .. } => path.push(segment.clone()),
            }
        }
    }
}

impl UserInput for InquireUserInput {
    fn ask(&self, prompt: Prompt<'_>) -> Result<Reply> {
        match prompt {
            Prompt::Confirm { text, default } => {
                use inquire::Confirm;
                let answer = Confirm::new(text).with_default(default).prompt();
                reply_from(answer, Reply::Confirmed)
            }
            Prompt::Menu {
                title,
                text,
                items,
                help,
                back,
            } => self.menu(title, text, items, help, back),
            Prompt::MaskedInput { text } => {
                use inquire::{Password, PasswordDisplayMode};
                let answer = Password::new(text)
                    .without_confirmation()
                    .with_display_mode(PasswordDisplayMode::Masked)
                    .prompt();
                reply_from(answer, Reply::Value)
            }
            Prompt::TextInput { text } => {
                use inquire::Text;
                let answer = Text::new(text).prompt();
                reply_from(answer, Reply::Value)
            }
            Prompt::Message { title, text } => {
                use inquire::Select;
                crate::output::section(title);
                crate::output::bright_white(text);
                crate::output::blank();
                let answer = Select::new("", vec!["OK".to_string()]).prompt();
                reply_from(answer, |_| Reply::Acknowledged)
            }
            Prompt::Pick { text, tree } => self.pick(text, tree),
        }
    }
}

/// Map inquire's Esc / Ctrl-C errors to replies, keeping real failures as errors
fn reply_from<T>(answer: Result<T, InquireError>, on_ok: impl FnOnce(T) -> Reply) -> Result<Reply> {
    match answer {
        Ok(value) => Ok(on_ok(value)),
        Err(InquireError::OperationCanceled) => Ok(Reply::Cancel),
        Err(InquireError::OperationInterrupted) => Ok(Reply::Interrupt),
        Err(e) => Err(e.into()),
    }
}

/// Mock user input implementation for testing
#[allow(dead_code)]
pub struct MockUserInput {
    replies: Mutex<VecDeque<Reply>>,
    asked: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockUserInput {
    /// Create new mock with no pre-configured replies
    pub fn new() -> Self {
        Self::with_replies(Vec::new())
    }

    /// Create mock with pre-configured replies
    pub fn with_replies(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Descriptions of every prompt shown so far
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }

    /// Number of replies not consumed yet
    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

impl Default for MockUserInput {
    fn default() -> Self {
        Self::new()
    }
}

impl UserInput for MockUserInput {
    fn ask(&self, prompt: Prompt<'_>) -> Result<Reply> {
        self.asked.lock().unwrap().push(prompt.describe());

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| {
                anyhow::anyhow!("No more mock replies available for {}", prompt.describe())
            })?;

        let fits = match (&prompt, &reply) {
            (_, Reply::Cancel | Reply::Interrupt) => true,
            (Prompt::Confirm { .. }, Reply::Confirmed(_)) => true,
            (Prompt::Menu { items, .. }, Reply::Value(key)) => {
                // Verify the answer is in the options
                if !items.iter().any(|item| &item.key == key) {
                    anyhow::bail!("Mock reply '{}' is not in the menu options: {:?}", key, items);
                }
                true
            }
            (Prompt::Menu { help, .. }, Reply::Help) => *help,
            (
                Prompt::MaskedInput { .. } | Prompt::TextInput { .. } | Prompt::Pick { .. },
                Reply::Value(_),
            ) => true,
            (Prompt::Message { .. }, Reply::Acknowledged) => true,
            _ => false,
        };

        if !fits {
            anyhow::bail!("Mock reply {:?} does not fit prompt {}", reply, prompt.describe());
        }

        Ok(reply)
    }
}
