use std::path::PathBuf;

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SnipError {
    #[error("file name '{0}' does not match expected pattern")]
    PatternMismatch(String),

    #[error("file with identifier {0} was not found")]
    #[diagnostic(help("every reference and blank id in the QC template needs a raw file"))]
    MissingTemplateMember(String),

    #[error("the id {0} was not found in the component QC template")]
    UnknownIdentifier(String),

    #[error("a metadata file and a component QC template can not be used at the same time")]
    ConflictingMetadataSource,

    #[error("snip directory not empty: {0}")]
    #[diagnostic(help("pass --replace-existing to overwrite it"))]
    DestinationNotEmpty(Utf8PathBuf),

    #[error("missing sibling file: {0}")]
    MissingSibling(Utf8PathBuf),

    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to read QC template at {0}")]
    TemplateRead(Utf8PathBuf),

    #[error("failed to parse QC template: {0}")]
    TemplateParse(String),

    #[error("invalid QC template: {0}")]
    InvalidTemplate(String),

    #[error("failed to read metadata file at {0}")]
    MetadataRead(Utf8PathBuf),

    #[error("failed to parse metadata file: {0}")]
    MetadataParse(String),

    #[error("failed to serialize metadata: {0}")]
    Serialize(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("git command failed: {0}")]
    Git(String),

    #[error("required tool not found: {0}")]
    MissingTool(String),

    #[error("private assets are missing and no repository URL is configured")]
    #[diagnostic(help("set private_assets_url in snipify.json or pass --destination"))]
    MissingAssetsUrl,
}
