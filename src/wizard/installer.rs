use super::help;
use super::session::Session;
use super::stage::{Stage, Transition};
use crate::artifact::ArtifactFetcher;
use crate::catalog::{Catalog, Template};
use crate::config::COMPOSE_UP_ARGS;
use crate::context::Context;
use crate::error::{ExitReason, WizardError};
use crate::traits::{DirStatus, FileSystem, Prompt, Reply};
use anyhow::{Result, bail};
use std::path::{Component, Path};

/// Create `path` unless it already exists
pub fn ensure_dir(fs: &dyn FileSystem, path: &Path) -> Result<DirStatus> {
    match fs.create_dir_all(path) {
        Ok(status) => {
            if status == DirStatus::Created {
                log::info!("Created directory {}", path.display());
            }
            Ok(status)
        }
        Err(e) => Err(WizardError::DirectoryCreate {
            path: path.display().to_string(),
            message: format!("{:#}", e),
        }
        .into()),
    }
}

/// Materialise the selected template and bring it up.
///
/// Download failures offer a retry; any later failure is returned as an error.
pub fn install(ctx: &Context, session: &Session, catalog: &Catalog) -> Result<Transition> {
    let template = session.template(catalog)?;
    let workdir = session
        .workdir()
        .ok_or_else(|| anyhow::anyhow!("No working directory selected"))?;

    for name in &template.vars {
        if !session.is_satisfied(name) {
            bail!(WizardError::InputValidation(format!("Variable '{}' has no value", name)));
        }
    }

    ensure_dir(ctx.fs.as_ref(), workdir)?;

    ctx.output.info("Loading composer files");
    let fetcher = ArtifactFetcher::new(ctx.http.as_ref(), ctx.fs.as_ref(), &ctx.settings);

    for url in &template.urls {
        if ctx.is_interrupted() {
            return Ok(Transition::Abort(ExitReason::Cancelled));
        }
        if let Err(e) = fetcher.fetch_file(url, workdir, session.variables()) {
            return offer_retry(ctx, &e, Stage::TemplateSelect);
        }
    }

    if let Some(bundle) = &template.bundle {
        if ctx.is_interrupted() {
            return Ok(Transition::Abort(ExitReason::Cancelled));
        }
        if let Err(e) = fetcher.fetch_bundle(bundle, workdir) {
            return offer_retry(ctx, &e, Stage::CategorySelect);
        }
    }

    create_subdirectories(ctx.fs.as_ref(), template, workdir)?;

    run_compose(ctx, workdir)?;
    if ctx.is_interrupted() {
        return Ok(Transition::Abort(ExitReason::Cancelled));
    }

    if let Some(path) = &template.help {
        if help::show(ctx, path)? == Reply::Interrupt {
            return Ok(Transition::Abort(ExitReason::Cancelled));
        }
    }

    Ok(Transition::Finish)
}

fn create_subdirectories(fs: &dyn FileSystem, template: &Template, workdir: &Path) -> Result<()> {
    for dir in &template.dirs {
        let relative = Path::new(dir);
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            bail!(WizardError::DirectoryCreate {
                path: dir.clone(),
                message: "must be a relative path inside the working directory".to_string(),
            });
        }
        ensure_dir(fs, &workdir.join(relative))?;
    }
    Ok(())
}

/// Run the compose command in `workdir`, showing its output as it arrives
fn run_compose(ctx: &Context, workdir: &Path) -> Result<()> {
    let command_line = ctx.settings.compose_command.as_str();
    let mut parts = command_line.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("Compose command is empty"))?;
    let mut args: Vec<&str> = parts.collect();
    args.extend_from_slice(COMPOSE_UP_ARGS);

    let display = format!("{} {}", program, args.join(" "));
    log::info!("Running '{}' in {}", display, workdir.display());
    ctx.output.section(&format!("Running {}", display));
    ctx.output.dimmed(&workdir.display().to_string());

    let output = ctx.output.clone();
    let mut on_line = |line: &str| {
        log::debug!("compose: {}", line);
        output.live_line(line);
    };

    let code = match ctx.command.stream(program, &args, workdir, &mut on_line) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            bail!(WizardError::ComposeFailed {
                command: display,
                exit_code: None,
            });
        }
    };
    ctx.output.blank();

    if code != 0 && !ctx.is_interrupted() {
        bail!(WizardError::ComposeFailed {
            command: display,
            exit_code: Some(code),
        });
    }

    log::info!("'{}' finished with code {}", display, code);
    if code == 0 {
        ctx.output.success(&format!("Containers started from {}", workdir.display()));
    }
    Ok(())
}

/// Show a download failure and ask whether to start over from `restart`
fn offer_retry(ctx: &Context, err: &anyhow::Error, restart: Stage) -> Result<Transition> {
    log::error!("{:#}", err);
    ctx.output.error(&format!("{:#}", err));

    let reply = ctx.input.ask(Prompt::Confirm {
        text: "Do you want to try again?",
        default: true,
    })?;

    match reply {
        Reply::Confirmed(true) => {
            log::info!("Retrying from {}", restart.name());
            Ok(Transition::Restart(restart))
        }
        _ => Ok(Transition::Abort(ExitReason::Cancelled)),
    }
}
