pub mod archive;
pub mod fetcher;
pub mod renderer;

pub use fetcher::ArtifactFetcher;
