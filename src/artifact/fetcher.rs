use super::archive::Compression;
use super::renderer::TemplateRenderer;
use crate::config::Settings;
use crate::error::WizardError;
use crate::traits::{FileSystem, HttpClient};
use anyhow::{Context, Result, bail};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Suffix marking a file that is rendered before being written
pub const TEMPLATE_SUFFIX: &str = ".j2";

lazy_static! {
    static ref TEMPLATE_NAME: Regex =
        Regex::new(&format!(r"(?i)^(.+){}$", regex::escape(TEMPLATE_SUFFIX))).unwrap();
}

/// How a declared URL is materialised in the working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Rendered, written as `output_name` (suffix stripped)
    Template { output_name: String },

    /// Written byte for byte as `output_name`
    Plain { output_name: String },
}

impl ArtifactKind {
    /// Classify a catalog URL by its final path segment
    pub fn classify(url: &str) -> Result<Self> {
        let name = file_name(url)?;
        match TEMPLATE_NAME.captures(&name) {
            Some(caps) => Ok(ArtifactKind::Template {
                output_name: caps[1].to_string(),
            }),
            None => Ok(ArtifactKind::Plain { output_name: name }),
        }
    }

    pub fn output_name(&self) -> &str {
        match self {
            ArtifactKind::Template { output_name } | ArtifactKind::Plain { output_name } => {
                output_name
            }
        }
    }
}

/// Final path segment of a URL, without query or fragment
pub fn file_name(url: &str) -> Result<String> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() && name != "." && name != ".." => Ok(name.to_string()),
        _ => bail!("URL has no file name: {}", url),
    }
}

/// Downloads declared artifacts into a template's working directory
pub struct ArtifactFetcher<'a> {
    http: &'a dyn HttpClient,
    fs: &'a dyn FileSystem,
    settings: &'a Settings,
    renderer: TemplateRenderer,
}

impl<'a> ArtifactFetcher<'a> {
    pub fn new(http: &'a dyn HttpClient, fs: &'a dyn FileSystem, settings: &'a Settings) -> Self {
        Self {
            http,
            fs,
            settings,
            renderer: TemplateRenderer::new(),
        }
    }

    /// Fetch one file (rendering `.j2` templates with `variables`) into `workdir`.
    ///
    /// On failure no partially written file is left behind and the error is an
    /// `ArtifactFetch`.
    pub fn fetch_file(
        &self,
        url: &str,
        workdir: &Path,
        variables: &BTreeMap<String, String>,
    ) -> Result<PathBuf> {
        let kind = ArtifactKind::classify(url).map_err(|e| artifact_error(url, &e))?;
        let destination = workdir.join(kind.output_name());

        let contents = self
            .download(url, &kind, variables)
            .map_err(|e| artifact_error(url, &e))?;

        if let Err(e) = self.fs.write(&destination, &contents) {
            self.discard(&destination);
            return Err(artifact_error(url, &e));
        }

        log::info!("Saved {} as {}", url, destination.display());
        Ok(destination)
    }

    fn download(
        &self,
        url: &str,
        kind: &ArtifactKind,
        variables: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>> {
        let resolved = self.settings.resolve(url)?;

        match kind {
            ArtifactKind::Template { .. } => {
                let raw = self.http.get_text(resolved.as_str())?;
                let rendered = self.renderer.render(url, &raw, variables)?;
                Ok(rendered.into_bytes())
            }
            ArtifactKind::Plain { .. } => self.http.get_bytes(resolved.as_str()),
        }
    }

    /// Download a bundle into `workdir`, unpack it when it is a recognised compressed
    /// tarball, and always delete the downloaded archive afterwards.
    ///
    /// Returns the number of unpacked entries.
    pub fn fetch_bundle(&self, url: &str, workdir: &Path) -> Result<usize> {
        let name = file_name(url).map_err(|e| bundle_error(url, &e))?;
        let archive_path = workdir.join(&name);

        let result = self.download_and_unpack(url, &name, &archive_path, workdir);
        self.discard(&archive_path);

        let count = result.map_err(|e| bundle_error(url, &e))?;
        log::info!("Unpacked {} entries from {}", count, url);
        Ok(count)
    }

    fn download_and_unpack(
        &self,
        url: &str,
        name: &str,
        archive_path: &Path,
        workdir: &Path,
    ) -> Result<usize> {
        let resolved = self.settings.resolve(url)?;
        let bytes = self.http.get_bytes(resolved.as_str())?;
        self.fs
            .write(archive_path, &bytes)
            .with_context(|| format!("Failed to save bundle {}", name))?;

        match Compression::from_file_name(name) {
            Some(compression) => self.fs.unpack_tarball(archive_path, compression, workdir),
            None => {
                log::warn!("Bundle {} is not a recognised archive, nothing unpacked", name);
                Ok(0)
            }
        }
    }

    /// Remove a file if present; a missing file is fine
    fn discard(&self, path: &Path) {
        if !self.fs.exists(path) {
            return;
        }
        if let Err(e) = self.fs.remove_file(path) {
            log::warn!("Failed to clean up {}: {:#}", path.display(), e);
        }
    }
}

fn artifact_error(url: &str, err: &anyhow::Error) -> anyhow::Error {
    WizardError::ArtifactFetch {
        url: url.to_string(),
        message: format!("{:#}", err),
    }
    .into()
}

fn bundle_error(url: &str, err: &anyhow::Error) -> anyhow::Error {
    WizardError::BundleFetch {
        url: url.to_string(),
        message: format!("{:#}", err),
    }
    .into()
}
