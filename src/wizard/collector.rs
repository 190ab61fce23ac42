use super::session::is_blank;
use crate::traits::{Output, Prompt, Reply, UserInput};
use anyhow::{Result, bail};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SECRET_NAME: Regex = Regex::new(r"(?i)password").unwrap();
}

const EMPTY_INPUT: &str = "Input was empty. Please, try again";
const SECRET_MISMATCH: &str = "Passwords does not match or input was empty. Please, try again";

/// Variables whose name mentions a password are entered twice and never echoed
pub fn is_secret(name: &str) -> bool {
    SECRET_NAME.is_match(name)
}

/// Outcome of collecting one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collected {
    Value(String),

    /// The user backed out; return to the previous stage
    Back,

    /// Ctrl-C; end the session
    Interrupted,
}

/// Prompts for template variables until a usable value is entered
pub struct VariableCollector<'a> {
    input: &'a dyn UserInput,
    output: &'a dyn Output,
}

impl<'a> VariableCollector<'a> {
    pub fn new(input: &'a dyn UserInput, output: &'a dyn Output) -> Self {
        Self { input, output }
    }

    /// Collect a value for `name`. Empty or mismatched input is re-prompted.
    pub fn collect(&self, name: &str) -> Result<Collected> {
        if is_secret(name) {
            self.collect_secret(name)
        } else {
            self.collect_plain(name)
        }
    }

    fn collect_plain(&self, name: &str) -> Result<Collected> {
        let text = format!("Please, input {}", name);
        loop {
            match self.input.ask(Prompt::TextInput { text: &text })? {
                Reply::Value(value) if !is_blank(&value) => {
                    log::debug!("Collected value for '{}'", name);
                    return Ok(Collected::Value(value));
                }
                Reply::Value(_) => self.output.error(EMPTY_INPUT),
                reply => return interrupted_or_back(reply),
            }
        }
    }

    fn collect_secret(&self, name: &str) -> Result<Collected> {
        let first_text = format!("Please, input {}", name);
        let second_text = format!("Please, input {} one more time", name);
        loop {
            let first = match self.input.ask(Prompt::MaskedInput { text: &first_text })? {
                Reply::Value(value) => value,
                reply => return interrupted_or_back(reply),
            };
            let second = match self.input.ask(Prompt::MaskedInput { text: &second_text })? {
                Reply::Value(value) => value,
                reply => return interrupted_or_back(reply),
            };

            if !is_blank(&first) && first == second {
                log::debug!("Collected confirmed secret for '{}'", name);
                return Ok(Collected::Value(first));
            }

            // Both entries are asked again
            self.output.error(SECRET_MISMATCH);
        }
    }
}

fn interrupted_or_back(reply: Reply) -> Result<Collected> {
    match reply {
        Reply::Cancel => Ok(Collected::Back),
        Reply::Interrupt => Ok(Collected::Interrupted),
        other => bail!("Unexpected reply to an input prompt: {:?}", other),
    }
}
