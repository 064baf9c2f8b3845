//! Validation logic for project and config files
//!
//! Goes beyond a successful read, checking for things the editor would
//! silently change or skip: files in an outdated version, emission ranges
//! outside the configured limits, step ages out of order, saves larger
//! than `savefile_maxsize` and textures that cannot be found.

use crate::config::{resolve_path, Config, CONFIG_FILE_NAME, CONFIG_FILE_VERSION};
use crate::math::Vector2f;
use crate::project::{Project, SearchPaths};
use crate::record::{self, Table};
use crate::schema::config::config_version;
use crate::schema::migrate::cfg;
use crate::schema::{
    self, names, read_config_table_unsanitized, read_project_table, SchemaError, State,
    PROJECT_FILE_VERSION,
};
use crate::steps::Step;
use crate::texture::TextureLoader;
use std::fs;
use std::path::Path;

/// Severity of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
        }
    }
}

/// Type of validation issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueType {
    /// The text is not a valid record file
    Syntax,
    /// A mandatory field is absent
    MissingField,
    /// A field holds a value of the wrong type
    WrongType,
    /// The file comes from a newer version of the tool
    UnsupportedVersion,
    /// The project declares no particle systems
    NoParticleSystems,
    /// A field has the right type but an unrecognized value
    InvalidValue,
    /// The file would be upgraded when saved
    OutdatedVersion,
    /// The saved project would exceed `savefile_maxsize`
    OversizedFile,
    /// A texture or background image cannot be found or decoded
    MissingResource,
    /// Step ages are not in ascending order
    UnorderedSteps,
    /// A value is outside the range the editor clamps it to
    OutOfRange,
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueType::Syntax => write!(f, "syntax"),
            IssueType::MissingField => write!(f, "missing_field"),
            IssueType::WrongType => write!(f, "wrong_type"),
            IssueType::UnsupportedVersion => write!(f, "unsupported_version"),
            IssueType::NoParticleSystems => write!(f, "no_particle_systems"),
            IssueType::InvalidValue => write!(f, "invalid_value"),
            IssueType::OutdatedVersion => write!(f, "outdated_version"),
            IssueType::OversizedFile => write!(f, "oversized_file"),
            IssueType::MissingResource => write!(f, "missing_resource"),
            IssueType::UnorderedSteps => write!(f, "unordered_steps"),
            IssueType::OutOfRange => write!(f, "out_of_range"),
        }
    }
}

/// A validation issue found in the input
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Line number (1-indexed), known only for syntax errors
    pub line: Option<usize>,
    /// Severity of the issue
    pub severity: Severity,
    /// Type of issue
    pub issue_type: IssueType,
    /// Human-readable message describing the issue
    pub message: String,
    /// Optional suggestion for fixing the issue
    pub suggestion: Option<String>,
    /// Field path or system the issue belongs to
    pub context: Option<String>,
}

impl ValidationIssue {
    /// Create a new error
    pub fn error(issue_type: IssueType, message: impl Into<String>) -> Self {
        Self {
            line: None,
            severity: Severity::Error,
            issue_type,
            message: message.into(),
            suggestion: None,
            context: None,
        }
    }

    /// Create a new warning
    pub fn warning(issue_type: IssueType, message: impl Into<String>) -> Self {
        Self {
            line: None,
            severity: Severity::Warning,
            issue_type,
            message: message.into(),
            suggestion: None,
            context: None,
        }
    }

    /// Attach a line number
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Add a suggestion to this issue
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add context to this issue
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Error issue for a failed read
    pub fn from_schema_error(err: &SchemaError) -> Self {
        match err {
            SchemaError::Syntax(e) => {
                ValidationIssue::error(IssueType::Syntax, e.message.clone()).at_line(e.line)
            }
            SchemaError::Field(e) => {
                let issue_type = match e {
                    record::FieldError::Missing { .. } => IssueType::MissingField,
                    _ => IssueType::WrongType,
                };
                ValidationIssue::error(issue_type, err.to_string()).with_context(e.path())
            }
            SchemaError::UnsupportedVersion { .. } => {
                ValidationIssue::error(IssueType::UnsupportedVersion, err.to_string())
                    .with_suggestion("Update pfx to read files from newer editors")
            }
            SchemaError::NoParticleSystems => {
                ValidationIssue::error(IssueType::NoParticleSystems, err.to_string())
                    .with_suggestion("Add at least one entry to particle_systems")
            }
            SchemaError::InvalidValue { path, .. } => {
                ValidationIssue::error(IssueType::InvalidValue, err.to_string())
                    .with_context(path.clone())
            }
        }
    }
}

/// What a record file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Project,
    Config,
}

impl FileKind {
    /// A file is a config when it is named `config.lua` or declares a
    /// `config_version`; everything else is a project.
    pub fn detect(path: Option<&Path>, table: &Table) -> FileKind {
        let named_config = path
            .and_then(|p| p.file_name())
            .is_some_and(|name| name == CONFIG_FILE_NAME);
        if named_config || table.contains(cfg::VERSION) {
            FileKind::Config
        } else {
            FileKind::Project
        }
    }
}

/// Validator for project and config files
pub struct Validator<'a> {
    config: &'a Config,
    loader: &'a dyn TextureLoader,
    /// Collected validation issues
    issues: Vec<ValidationIssue>,
}

impl<'a> Validator<'a> {
    /// Create a validator checking limits and asset paths from `config`
    pub fn new(config: &'a Config, loader: &'a dyn TextureLoader) -> Self {
        Self { config, loader, issues: Vec::new() }
    }

    /// Read and validate a file.
    ///
    /// Texture names are resolved against the configured search paths,
    /// which are taken relative to the file's directory.
    pub fn validate_file(&mut self, path: &Path) -> std::io::Result<()> {
        let source = fs::read_to_string(path)?;
        let base = path.parent().unwrap_or(Path::new("."));
        self.validate_source(Some(path), &source, base);
        Ok(())
    }

    /// Validate record text
    pub fn validate_source(&mut self, path: Option<&Path>, source: &str, base: &Path) {
        let table = match record::parse(source) {
            Ok(t) => t,
            Err(e) => {
                self.issues.push(ValidationIssue::from_schema_error(&SchemaError::Syntax(e)));
                return;
            }
        };

        match FileKind::detect(path, &table) {
            FileKind::Project => self.validate_project(table, base),
            FileKind::Config => self.validate_config(table),
        }
    }

    fn validate_project(&mut self, table: Table, base: &Path) {
        if let Ok(version) = schema::project_version(&table) {
            if version < PROJECT_FILE_VERSION {
                self.issues.push(
                    ValidationIssue::warning(
                        IssueType::OutdatedVersion,
                        format!(
                            "project file version {} will be upgraded to {} on save",
                            version, PROJECT_FILE_VERSION
                        ),
                    )
                    .with_context(names::VERSION)
                    .with_suggestion("Run `pfx fmt` to upgrade the file"),
                );
            }
        }

        let state = match read_project_table(table) {
            Ok(s) => s,
            Err(e) => {
                self.issues.push(ValidationIssue::from_schema_error(&e));
                return;
            }
        };

        let saved = schema::write_project(&state).len();
        let max = self.config.savefile_maxsize as usize;
        if saved > max {
            self.issues.push(
                ValidationIssue::warning(
                    IssueType::OversizedFile,
                    format!("project is {} bytes when saved, over savefile_maxsize of {}", saved, max),
                )
                .with_suggestion("Raise savefile_maxsize in config.lua"),
            );
        }

        self.check_systems(&state);
        self.check_resources(&state, base);
    }

    fn check_systems(&mut self, state: &State) {
        let limits = &self.config.gui_limits;
        for (i, system) in state.systems.iter().enumerate() {
            let prefix = format!("{}[{}]", names::PARTICLE_SYSTEMS, i + 1);

            let unordered = [
                (names::COLOR_STEPS, ages_ordered(&system.color_steps)),
                (names::SIZE_STEPS, ages_ordered(&system.size_steps)),
                (names::ROTATION_STEPS, ages_ordered(&system.rotation_steps)),
                (names::POSITION_STEPS, ages_ordered(&system.position_steps)),
                (names::VELOCITY_STEPS, ages_ordered(&system.velocity_steps)),
            ];
            for (name, ordered) in unordered {
                if !ordered {
                    self.issues.push(
                        ValidationIssue::warning(
                            IssueType::UnorderedSteps,
                            "step ages are not in ascending order and will be clamped",
                        )
                        .with_context(format!("{}.{}", prefix, name)),
                    );
                }
            }

            if !system.init.is_sanitized(system.num_particles, limits) {
                self.issues.push(
                    ValidationIssue::warning(
                        IssueType::OutOfRange,
                        "emission ranges are inverted or outside gui_limits and will be clamped",
                    )
                    .with_context(format!("{}.{}", prefix, names::EMISSION)),
                );
            }
            if system.num_particles > limits.max_num_particles {
                self.issues.push(
                    ValidationIssue::warning(
                        IssueType::OutOfRange,
                        format!(
                            "num_particles {} exceeds gui_limits.max_num_particles of {}",
                            system.num_particles, limits.max_num_particles
                        ),
                    )
                    .with_context(format!("{}.{}", prefix, names::NUM_PARTICLES)),
                );
            }
        }
    }

    fn check_resources(&mut self, state: &State, base: &Path) {
        let paths = SearchPaths {
            textures: resolve_path(base, Path::new(&self.config.textures_path)),
            backgrounds: resolve_path(base, Path::new(&self.config.backgrounds_path)),
        };
        let viewport = Vector2f::new(self.config.width as f32, self.config.height as f32);
        let (_, errors) = Project::from_state(state, self.loader, &paths, viewport);
        for e in errors {
            self.issues.push(
                ValidationIssue::warning(IssueType::MissingResource, e.to_string()).with_suggestion(
                    format!("Place the file next to the project or under {}", paths.textures.display()),
                ),
            );
        }
    }

    fn validate_config(&mut self, table: Table) {
        if let Ok(version) = config_version(&table) {
            if version < CONFIG_FILE_VERSION {
                self.issues.push(
                    ValidationIssue::warning(
                        IssueType::OutdatedVersion,
                        format!(
                            "config version {} will be upgraded to {} on save",
                            version, CONFIG_FILE_VERSION
                        ),
                    )
                    .with_context(cfg::VERSION),
                );
            }
        }

        match read_config_table_unsanitized(table) {
            Ok(config) => {
                for e in config.validate() {
                    self.issues.push(
                        ValidationIssue::warning(
                            IssueType::OutOfRange,
                            format!("'{}' {}", e.field, e.message),
                        )
                        .with_context(e.field),
                    );
                }
            }
            Err(e) => self.issues.push(ValidationIssue::from_schema_error(&e)),
        }
    }

    /// Get all collected issues
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Consume the validator and return all issues
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }

    /// Check if there are any errors (not just warnings)
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity == Severity::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity == Severity::Warning).count()
    }
}

fn ages_ordered<T>(steps: &[Step<T>]) -> bool {
    steps.windows(2).all(|w| w[0].age <= w[1].age)
}
