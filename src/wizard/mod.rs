//! The interactive wizard: category → template → variables → install
//!
//! Each stage handler returns a [`Transition`]; the loop in [`Wizard::drive`] applies it to
//! the session's current stage until an exit is reached.

pub mod collector;
pub mod help;
pub mod installer;
pub mod session;
pub mod stage;
pub mod versions;

use crate::catalog::{self, Catalog};
use crate::context::Context;
use crate::error::{ExitReason, WizardError};
use crate::traits::{Prompt, Reply};
use anyhow::{Result, bail};
use collector::{Collected, VariableCollector};
use session::Session;
use stage::{Stage, Step, Transition};

const CONFIRM_START: &str =
    "Do you want to create Docker container from the list of preinstalled images?";

/// Run the whole session and show the exit screen. Never panics on user or network errors.
pub fn run(ctx: &Context) -> ExitReason {
    let reason = match start(ctx) {
        Ok(reason) => reason,
        Err(e) => {
            log::error!("{:#}", e);
            ExitReason::from(&e)
        }
    };

    finish(ctx, &reason);
    reason
}

fn start(ctx: &Context) -> Result<ExitReason> {
    preflight(ctx)?;

    if !ctx.settings.skip_confirm {
        let reply = ctx.input.ask(Prompt::Confirm {
            text: CONFIRM_START,
            default: true,
        })?;
        match reply {
            Reply::Confirmed(true) => {}
            Reply::Confirmed(false) => return Ok(ExitReason::Completed),
            _ => return Ok(ExitReason::Cancelled),
        }
    }

    ctx.output.info("Loading list of templates");
    let catalog = catalog::load(ctx.http.as_ref(), &ctx.settings)?;

    Wizard::new(ctx, &catalog).drive()
}

/// The compose binary must be installed before anything is downloaded
fn preflight(ctx: &Context) -> Result<()> {
    let program = ctx
        .settings
        .compose_command
        .split_whitespace()
        .next()
        .unwrap_or_default();

    if !ctx.command.is_on_path(program) {
        bail!(WizardError::MissingDependency(program.to_string()));
    }
    Ok(())
}

/// Show the exit screen, pause, then clear the terminal
fn finish(ctx: &Context, reason: &ExitReason) {
    let (title, text) = reason.message();
    log::info!("Session ended: {:?}", reason);

    ctx.output.section(title);
    ctx.output.bright_white(&text);
    std::thread::sleep(ctx.settings.exit_delay);
    ctx.output.clear();

    // Keep the failure visible after the screen is cleared
    if reason.exit_code() != 0 {
        ctx.output.error(&text);
    }
}

struct Wizard<'a> {
    ctx: &'a Context,
    catalog: &'a Catalog,
    session: Session,
}

impl<'a> Wizard<'a> {
    fn new(ctx: &'a Context, catalog: &'a Catalog) -> Self {
        Self {
            ctx,
            catalog,
            session: Session::new(),
        }
    }

    fn drive(&mut self) -> Result<ExitReason> {
        loop {
            if self.ctx.is_interrupted() {
                return Ok(ExitReason::Cancelled);
            }

            let current = self.session.stage;
            let transition = match current {
                Stage::CategorySelect => self.select_category()?,
                Stage::TemplateSelect => self.select_template()?,
                Stage::VariableInput => self.collect_variables()?,
                Stage::Install => installer::install(self.ctx, &self.session, self.catalog)?,
            };
            log::debug!("{} -> {:?}", current.name(), transition);

            match stage::apply(current, transition) {
                Step::Continue(next) => self.session.stage = next,
                Step::Exit(reason) => return Ok(reason),
            }
        }
    }

    fn select_category(&mut self) -> Result<Transition> {
        let items = self.catalog.category_items();
        let reply = self.ctx.input.ask(Prompt::Menu {
            title: "Category selection",
            text: "Please, select the matching category from the list:",
            items: &items,
            help: true,
            back: false,
        })?;

        match reply {
            Reply::Value(key) => match self.session.select_category(self.catalog, &key) {
                Ok(()) => {
                    log::info!("Selected category '{}'", key);
                    Ok(Transition::Proceed)
                }
                Err(e) => {
                    self.ctx.output.error(&e.to_string());
                    Ok(Transition::Stay)
                }
            },
            Reply::Help => Ok(self.general_help()),
            Reply::Cancel => Ok(Transition::Back),
            Reply::Interrupt => Ok(Transition::Abort(ExitReason::Cancelled)),
            other => bail!("Unexpected reply to category menu: {:?}", other),
        }
    }

    fn select_template(&mut self) -> Result<Transition> {
        let catalog = self.catalog;
        let category = self
            .session
            .category()
            .and_then(|key| catalog.category(key))
            .ok_or_else(|| anyhow::anyhow!("No category selected"))?;

        let items = category.template_items();
        if items.is_empty() {
            self.ctx.output.warning("This category has no templates yet");
            return Ok(Transition::Back);
        }

        let reply = self.ctx.input.ask(Prompt::Menu {
            title: "Template selection",
            text: "Please, select the template from the list:",
            items: &items,
            help: true,
            back: true,
        })?;

        match reply {
            Reply::Value(key) => {
                let workdir = self.ctx.settings.base_dir.join(&key);
                let selected = self.session.select_template(self.catalog, &key, workdir.clone());
                if let Err(e) = selected {
                    self.ctx.output.error(&e.to_string());
                    return Ok(Transition::Stay);
                }
                installer::ensure_dir(self.ctx.fs.as_ref(), &workdir)?;
                log::info!("Selected template '{}' in {}", key, workdir.display());
                Ok(Transition::Proceed)
            }
            Reply::Help => Ok(self.general_help()),
            Reply::Cancel => Ok(Transition::Back),
            Reply::Interrupt => Ok(Transition::Abort(ExitReason::Cancelled)),
            other => bail!("Unexpected reply to template menu: {:?}", other),
        }
    }

    fn collect_variables(&mut self) -> Result<Transition> {
        self.session.clear_variables();
        let template = self.session.template(self.catalog)?;
        let collector = VariableCollector::new(self.ctx.input.as_ref(), self.ctx.output.as_ref());

        for name in &template.vars {
            loop {
                match collector.collect(name)? {
                    Collected::Value(value) => match self.session.record(name, value) {
                        Ok(()) => break,
                        Err(e) => self.ctx.output.error(&e.to_string()),
                    },
                    Collected::Back => return Ok(Transition::Back),
                    Collected::Interrupted => {
                        return Ok(Transition::Abort(ExitReason::Cancelled));
                    }
                }
            }
        }

        for app in &template.versions {
            let picked = versions::select_version(
                self.ctx.http.as_ref(),
                self.ctx.input.as_ref(),
                &self.ctx.settings,
                app,
            )?;
            match picked {
                Collected::Value(tag) => {
                    log::info!("Using {}:{}", app, tag);
                    self.session.record(&versions::version_variable(app), tag)?;
                }
                Collected::Back => return Ok(Transition::Back),
                Collected::Interrupted => return Ok(Transition::Abort(ExitReason::Cancelled)),
            }
        }

        Ok(Transition::Proceed)
    }

    /// Show the repository README; failing to load it is not fatal
    fn general_help(&self) -> Transition {
        match help::show(self.ctx, help::README_PATH) {
            Ok(Reply::Interrupt) => Transition::Abort(ExitReason::Cancelled),
            Ok(_) => Transition::Stay,
            Err(e) => {
                log::warn!("{:#}", e);
                self.ctx.output.error(&format!("{:#}", e));
                Transition::Stay
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::test_helpers::{CatalogBuilder, TemplateBuilder};
    use crate::traits::{
        FileSystem, MockCommandExecutor, MockFileSystem, MockHttpClient, MockOutput, MockUserInput,
        OutputMessage,
    };
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    const BASE: &str = "http://repo.test/docker/";

    struct Fixture {
        ctx: Context,
        fs: Arc<MockFileSystem>,
        input: Arc<MockUserInput>,
        output: Arc<MockOutput>,
        command: Arc<MockCommandExecutor>,
        http: Arc<MockHttpClient>,
    }

    fn fixture(http: MockHttpClient, replies: Vec<Reply>, command: MockCommandExecutor) -> Fixture {
        let fs = Arc::new(MockFileSystem::new());
        let input = Arc::new(MockUserInput::with_replies(replies));
        let output = Arc::new(MockOutput::new());
        let command = Arc::new(command);
        let http = Arc::new(http);
        let ctx = Context::test_with(
            fs.clone(),
            input.clone(),
            output.clone(),
            command.clone(),
            http.clone(),
            Settings::for_tests(Path::new("/home/user")),
        );
        Fixture {
            ctx,
            fs,
            input,
            output,
            command,
            http,
        }
    }

    fn nginx_catalog(template: TemplateBuilder) -> CatalogBuilder {
        CatalogBuilder::new()
            .category("web", "Web servers")
            .template("web", "nginx", template)
    }

    fn repository(catalog: &CatalogBuilder) -> MockHttpClient {
        MockHttpClient::new().with_response(&format!("{}docker.yml", BASE), catalog.to_yaml())
    }

    fn value(s: &str) -> Reply {
        Reply::Value(s.to_string())
    }

    #[test]
    fn test_full_run_renders_and_starts_services() {
        let catalog = nginx_catalog(TemplateBuilder::new("Nginx").var("port").url("nginx.conf.j2"));
        let http = repository(&catalog)
            .with_response(&format!("{}nginx.conf.j2", BASE), "server { listen {{port}}; }");
        let f = fixture(
            http,
            vec![Reply::Confirmed(true), value("web"), value("nginx"), value("8080")],
            MockCommandExecutor::new(),
        );

        let reason = run(&f.ctx);

        assert_eq!(reason, ExitReason::Completed);
        let workdir = PathBuf::from("/home/user/nginx");
        assert_eq!(
            f.fs.get_file_contents(&workdir.join("nginx.conf")).unwrap(),
            "server { listen 8080; }"
        );
        let calls = f.command.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].working_dir, workdir);
        assert_eq!(
            f.input.asked(),
            vec![
                format!("confirm: {}", CONFIRM_START),
                "menu: Category selection".to_string(),
                "menu: Template selection".to_string(),
                "text: Please, input port".to_string(),
            ]
        );
        assert!(f.output.to_text().contains("Script ends normally."));
        assert!(f.output.contains_message(&OutputMessage::Clear));
    }

    #[test]
    fn test_declining_exits_without_network() {
        let f = fixture(
            MockHttpClient::new(),
            vec![Reply::Confirmed(false)],
            MockCommandExecutor::new(),
        );

        assert_eq!(run(&f.ctx), ExitReason::Completed);
        assert!(f.http.requests().is_empty());
    }

    #[test]
    fn test_missing_compose_binary_checked_first() {
        let f = fixture(
            MockHttpClient::new(),
            vec![],
            MockCommandExecutor::new().with_available(&[]),
        );

        let reason = run(&f.ctx);

        assert_eq!(reason, ExitReason::MissingDependency("docker-compose".to_string()));
        assert_eq!(reason.exit_code(), 1);
        assert!(f.http.requests().is_empty());
        assert!(f.input.asked().is_empty());
        assert!(f.output.has_error());
    }

    #[test]
    fn test_catalog_failure_is_fatal() {
        let f = fixture(
            MockHttpClient::new(),
            vec![Reply::Confirmed(true)],
            MockCommandExecutor::new(),
        );

        let reason = run(&f.ctx);

        assert!(matches!(reason, ExitReason::Failed(ref msg) if msg.contains("list of templates")));
        assert_eq!(reason.exit_code(), 1);
    }

    #[test]
    fn test_back_from_first_menu_ends_session() {
        let catalog = nginx_catalog(TemplateBuilder::new("Nginx"));
        let f = fixture(
            repository(&catalog),
            vec![Reply::Confirmed(true), Reply::Cancel],
            MockCommandExecutor::new(),
        );

        assert_eq!(run(&f.ctx), ExitReason::Cancelled);
        assert!(f.command.calls().is_empty());
    }

    #[test]
    fn test_cancel_during_variables_returns_to_template_menu() {
        let catalog = nginx_catalog(TemplateBuilder::new("Nginx").var("password_db"));
        let f = fixture(
            repository(&catalog),
            vec![
                Reply::Confirmed(true),
                value("web"),
                value("nginx"),
                value("secret1"),
                Reply::Cancel,
                Reply::Cancel,
                Reply::Cancel,
            ],
            MockCommandExecutor::new(),
        );

        assert_eq!(run(&f.ctx), ExitReason::Cancelled);
        assert_eq!(
            f.input.asked()[3..],
            [
                "masked: Please, input password_db",
                "masked: Please, input password_db one more time",
                "menu: Template selection",
                "menu: Category selection",
            ]
        );
        assert!(f.command.calls().is_empty());
    }

    #[test]
    fn test_whitespace_secret_pair_is_asked_again() {
        let catalog = nginx_catalog(TemplateBuilder::new("Nginx").var("password_db"));
        let f = fixture(
            repository(&catalog),
            vec![
                Reply::Confirmed(true),
                value("web"),
                value("nginx"),
                value("   "),
                value("   "),
                value("s3"),
                value("s3"),
            ],
            MockCommandExecutor::new(),
        );

        let reason = run(&f.ctx);

        assert_eq!(reason, ExitReason::Completed);
        assert_eq!(f.input.remaining(), 0);
        assert_eq!(f.command.calls().len(), 1);
    }

    #[test]
    fn test_help_redisplays_same_menu() {
        let catalog = nginx_catalog(TemplateBuilder::new("Nginx"));
        let http = repository(&catalog)
            .with_response(&format!("{}README", BASE), "Choose a category first.");
        let f = fixture(
            http,
            vec![
                Reply::Confirmed(true),
                Reply::Help,
                Reply::Acknowledged,
                Reply::Cancel,
            ],
            MockCommandExecutor::new(),
        );

        assert_eq!(run(&f.ctx), ExitReason::Cancelled);
        assert_eq!(
            f.input.asked()[1..],
            [
                "menu: Category selection",
                "message: Help",
                "menu: Category selection",
            ]
        );
    }

    #[test]
    fn test_help_failure_is_not_fatal() {
        let catalog = nginx_catalog(TemplateBuilder::new("Nginx"));
        let f = fixture(
            repository(&catalog),
            vec![Reply::Confirmed(true), Reply::Help, Reply::Cancel],
            MockCommandExecutor::new(),
        );

        assert_eq!(run(&f.ctx), ExitReason::Cancelled);
        assert!(f.output.has_error());
        assert_eq!(f.input.remaining(), 0);
    }

    #[test]
    fn test_fetch_failure_abort_exits_cleanly() {
        let catalog = nginx_catalog(TemplateBuilder::new("Nginx").var("port").url("nginx.conf.j2"));
        let http = repository(&catalog)
            .with_error(&format!("{}nginx.conf.j2", BASE), "Network is unreachable");
        let f = fixture(
            http,
            vec![
                Reply::Confirmed(true),
                value("web"),
                value("nginx"),
                value("8080"),
                Reply::Confirmed(false),
            ],
            MockCommandExecutor::new(),
        );

        let reason = run(&f.ctx);

        assert_eq!(reason, ExitReason::Cancelled);
        assert_eq!(reason.exit_code(), 0);
        assert!(f.fs.list_files().is_empty());
        assert!(f.command.calls().is_empty());
    }

    #[test]
    fn test_fetch_failure_retry_reenters_template_menu() {
        let catalog = nginx_catalog(TemplateBuilder::new("Nginx").url("nginx.conf.j2"));
        let f = fixture(
            repository(&catalog),
            vec![
                Reply::Confirmed(true),
                value("web"),
                value("nginx"),
                Reply::Confirmed(true),
                Reply::Cancel,
                Reply::Cancel,
            ],
            MockCommandExecutor::new(),
        );

        assert_eq!(run(&f.ctx), ExitReason::Cancelled);
        assert_eq!(
            f.input.asked()[3..],
            [
                "confirm: Do you want to try again?",
                "menu: Template selection",
                "menu: Category selection",
            ]
        );
    }

    #[test]
    fn test_version_lookup_failure_uses_latest() {
        let catalog = nginx_catalog(
            TemplateBuilder::new("Nginx")
                .version("nginx")
                .url("docker-compose.yml.j2"),
        );
        let http = repository(&catalog).with_response(
            &format!("{}docker-compose.yml.j2", BASE),
            "image: nginx:{{nginx_version}}",
        );
        let f = fixture(
            http,
            vec![Reply::Confirmed(true), value("web"), value("nginx")],
            MockCommandExecutor::new(),
        );

        assert_eq!(run(&f.ctx), ExitReason::Completed);
        assert_eq!(
            f.fs
                .get_file_contents(Path::new("/home/user/nginx/docker-compose.yml"))
                .unwrap(),
            "image: nginx:latest"
        );
    }

    #[test]
    fn test_existing_workdir_is_reused() {
        let catalog = nginx_catalog(TemplateBuilder::new("Nginx"));
        let f = fixture(
            repository(&catalog),
            vec![Reply::Confirmed(true), value("web"), value("nginx")],
            MockCommandExecutor::new(),
        );
        f.fs.create_dir_all(Path::new("/home/user/nginx")).unwrap();

        assert_eq!(run(&f.ctx), ExitReason::Completed);
    }

    #[test]
    fn test_workdir_failure_is_fatal() {
        let catalog = nginx_catalog(TemplateBuilder::new("Nginx"));
        let f = fixture(
            repository(&catalog),
            vec![Reply::Confirmed(true), value("web"), value("nginx")],
            MockCommandExecutor::new(),
        );
        f.fs.fail_create_dir(Path::new("/home/user/nginx"));

        let reason = run(&f.ctx);

        assert!(matches!(reason, ExitReason::Failed(ref msg) if msg.contains("/home/user/nginx")));
        assert!(f.command.calls().is_empty());
    }

    #[test]
    fn test_interrupt_at_prompt_ends_session() {
        let catalog = nginx_catalog(TemplateBuilder::new("Nginx").var("port"));
        let f = fixture(
            repository(&catalog),
            vec![Reply::Confirmed(true), value("web"), Reply::Interrupt],
            MockCommandExecutor::new(),
        );

        assert_eq!(run(&f.ctx), ExitReason::Cancelled);
    }

    #[test]
    fn test_skip_confirm() {
        let catalog = nginx_catalog(TemplateBuilder::new("Nginx"));
        let mut f = fixture(
            repository(&catalog),
            vec![Reply::Cancel],
            MockCommandExecutor::new(),
        );
        f.ctx.settings.skip_confirm = true;

        assert_eq!(run(&f.ctx), ExitReason::Cancelled);
        assert_eq!(f.input.asked(), vec!["menu: Category selection"]);
    }
}
