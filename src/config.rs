use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://repo.vps.ua/docker/";
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.hub.docker.com/v1/repositories/{app}/tags";
pub const DEFAULT_COMPOSE_COMMAND: &str = "docker-compose";

/// Arguments passed to the orchestration command
pub const COMPOSE_UP_ARGS: &[&str] = &["up", "-d"];

#[derive(Parser, Debug)]
#[command(name = "docker-menu")]
#[command(
    about = "Create docker containers from predefined templates with an interactive wizard",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Base URL of the template repository (catalog, README, artifacts)
    #[arg(long, env = "DOCKER_MENU_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Directory under which one working directory per template is created (defaults to home)
    #[arg(long, env = "DOCKER_MENU_BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    /// Tag listing endpoint; `{app}` is replaced with the application name
    #[arg(long, env = "DOCKER_MENU_REGISTRY_URL", default_value = DEFAULT_REGISTRY_URL)]
    pub registry_url: String,

    /// Orchestration command run in the working directory with `up -d`
    #[arg(long, env = "DOCKER_MENU_COMPOSE", default_value = DEFAULT_COMPOSE_COMMAND)]
    pub compose_command: String,

    /// Timeout for every HTTP request, in seconds
    #[arg(long, env = "DOCKER_MENU_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,

    /// Pause before the exit screen is cleared, in seconds
    #[arg(long, default_value_t = 3)]
    pub exit_delay: u64,

    /// Log file path (defaults to ~/.docker-menu/docker-menu.log)
    #[arg(long, env = "DOCKER_MENU_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Skip the opening confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Resolved runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: Url,
    pub base_dir: PathBuf,
    pub registry_url: String,
    pub compose_command: String,
    pub timeout: Duration,
    pub exit_delay: Duration,
    pub log_file: PathBuf,
    pub log_level: log::LevelFilter,
    pub skip_confirm: bool,
}

impl Settings {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let base_url = parse_base_url(&cli.base_url)?;

        if !cli.registry_url.contains("{app}") {
            bail!(
                "Registry URL must contain the '{{app}}' placeholder: {}",
                cli.registry_url
            );
        }

        if cli.compose_command.trim().is_empty() {
            bail!("Compose command must not be empty");
        }

        let base_dir = match cli.base_dir {
            Some(dir) => dir,
            None => home_dir()?,
        };

        let log_file = match cli.log_file {
            Some(path) => path,
            None => home_dir()?.join(".docker-menu").join("docker-menu.log"),
        };

        let log_level = match cli.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        Ok(Self {
            base_url,
            base_dir,
            registry_url: cli.registry_url,
            compose_command: cli.compose_command,
            timeout: Duration::from_secs(cli.timeout),
            exit_delay: Duration::from_secs(cli.exit_delay),
            log_file,
            log_level,
            skip_confirm: cli.yes,
        })
    }

    /// Resolve a catalog-relative path against the base URL
    pub fn resolve(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Invalid path relative to {}: {}", self.base_url, path))
    }

    /// Tag listing URL for an application
    pub fn registry_url_for(&self, app: &str) -> String {
        self.registry_url.replace("{app}", app)
    }
}

/// Parse the base URL, forcing a trailing slash so joins stay beneath it
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }

    let url = Url::parse(&normalized).with_context(|| format!("Invalid base URL: {}", raw))?;
    if url.cannot_be_a_base() {
        bail!("Base URL cannot be used as a base: {}", raw);
    }

    Ok(url)
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))
}

#[cfg(test)]
impl Settings {
    /// Settings pointing at a fake repository, for tests
    pub fn for_tests(base_dir: &std::path::Path) -> Self {
        Self {
            base_url: Url::parse("http://repo.test/docker/").unwrap(),
            base_dir: base_dir.to_path_buf(),
            registry_url: "http://registry.test/{app}/tags".to_string(),
            compose_command: DEFAULT_COMPOSE_COMMAND.to_string(),
            timeout: Duration::from_secs(1),
            exit_delay: Duration::ZERO,
            log_file: base_dir.join("docker-menu.log"),
            log_level: log::LevelFilter::Info,
            skip_confirm: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["docker-menu"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let settings = Settings::from_cli(parse(&[
            "--base-url",
            "http://example.com/docker",
            "--base-dir",
            "/tmp/x",
        ]))
        .unwrap();
        assert_eq!(settings.base_url.as_str(), "http://example.com/docker/");
        assert_eq!(
            settings.resolve("docker.yml").unwrap().as_str(),
            "http://example.com/docker/docker.yml"
        );
    }

    #[test]
    fn test_resolve_nested_path() {
        let settings = Settings::from_cli(parse(&["--base-dir", "/tmp/x"])).unwrap();
        assert_eq!(
            settings.resolve("nginx/nginx.conf.j2").unwrap().as_str(),
            "http://repo.vps.ua/docker/nginx/nginx.conf.j2"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result =
            Settings::from_cli(parse(&["--base-url", "not a url", "--base-dir", "/tmp/x"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_registry_url_requires_placeholder() {
        let result = Settings::from_cli(parse(&[
            "--registry-url",
            "http://registry.test/tags",
            "--base-dir",
            "/tmp/x",
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_registry_url_for_app() {
        let settings = Settings::from_cli(parse(&["--base-dir", "/tmp/x"])).unwrap();
        assert_eq!(
            settings.registry_url_for("nginx"),
            "https://registry.hub.docker.com/v1/repositories/nginx/tags"
        );
    }

    #[test]
    fn test_verbosity_levels() {
        let settings = Settings::from_cli(parse(&["-vv", "--base-dir", "/tmp/x"])).unwrap();
        assert_eq!(settings.log_level, log::LevelFilter::Trace);

        let settings = Settings::from_cli(parse(&["--base-dir", "/tmp/x"])).unwrap();
        assert_eq!(settings.log_level, log::LevelFilter::Info);
    }

    #[test]
    fn test_explicit_base_dir() {
        let settings = Settings::from_cli(parse(&["--base-dir", "/srv/compose", "--yes"])).unwrap();
        assert_eq!(settings.base_dir, PathBuf::from("/srv/compose"));
        assert!(settings.skip_confirm);
    }
}
