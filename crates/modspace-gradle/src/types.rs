//! Domain types for Gradle dependency declarations.

use modspace_core::{ModspaceError, ModuleDescriptor, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Placeholder written when a remote declaration is regenerated without a
/// known version.
pub const UNKNOWN_VERSION: &str = "UNKNOWN";

/// Dependency records keyed by dependency name.
pub type DependencyMap = BTreeMap<String, DependencyRecord>;

/// Declaration verb of a dependency line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncludeType {
    Compile,
    Api,
    Implementation,
}

impl IncludeType {
    pub const ALL: [Self; 3] = [Self::Compile, Self::Api, Self::Implementation];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Api => "api",
            Self::Implementation => "implementation",
        }
    }
}

impl FromStr for IncludeType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "compile" => Ok(Self::Compile),
            "api" => Ok(Self::Api),
            "implementation" => Ok(Self::Implementation),
            _ => Err(()),
        }
    }
}

impl fmt::Display for IncludeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quote character a declaration was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteStyle {
    Single,
    Double,
}

impl QuoteStyle {
    pub fn as_char(self) -> char {
        match self {
            Self::Single => '\'',
            Self::Double => '"',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '\'' => Some(Self::Single),
            '"' => Some(Self::Double),
            _ => None,
        }
    }
}

/// One dependency declared in a module's build file.
///
/// `name` is the identity key: a remote artifact name, or the project path of
/// a source dependency (`"primary:secondary"` for nested projects).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRecord {
    name: String,
    pub group: Option<String>,
    pub include_type: IncludeType,
    pub quote: QuoteStyle,
    pub is_source_dependency: bool,
    /// Literal version or variable reference (`$libVersion`), stored verbatim.
    pub last_known_version: Option<String>,
}

impl DependencyRecord {
    pub fn new(
        name: impl Into<String>,
        include_type: IncludeType,
        quote: QuoteStyle,
        is_source_dependency: bool,
    ) -> Self {
        Self {
            name: name.into(),
            group: None,
            include_type,
            quote,
            is_source_dependency,
            last_known_version: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.last_known_version = Some(version.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Merges a newer observation of the same dependency.
    ///
    /// Include type, quote and source flag are last-write-wins; group and
    /// version are only replaced when `other` carries one. Fails without
    /// mutating `self` when the names differ.
    pub fn update_from(&mut self, other: &Self) -> Result<()> {
        if other.name != self.name {
            return Err(ModspaceError::NameMismatch {
                expected: self.name.clone(),
                found: other.name.clone(),
            });
        }

        self.include_type = other.include_type;
        self.quote = other.quote;
        self.is_source_dependency = other.is_source_dependency;

        if let Some(group) = &other.group {
            self.group = Some(group.clone());
        }
        if let Some(version) = &other.last_known_version {
            self.last_known_version = Some(version.clone());
        }
        Ok(())
    }

    /// Regenerates the declaration text, without leading whitespace.
    ///
    /// Source form: `api project(":name")`.
    /// Remote form: `api 'group:name:version'`, quoted with the recorded
    /// quote style and `UNKNOWN` standing in for a missing version.
    pub fn to_declaration(&self) -> String {
        self.render(self.group.as_deref().unwrap_or_default(), &self.name)
    }

    /// Regenerates the declaration with the coordinates of the manifest
    /// module it refers to.
    pub fn to_declaration_for(&self, module: &ModuleDescriptor) -> String {
        self.render(&module.group, &module.name)
    }

    fn render(&self, group: &str, name: &str) -> String {
        if self.is_source_dependency {
            return format!("{} project(\":{}\")", self.include_type, name);
        }
        let quote = self.quote.as_char();
        let version = self.last_known_version.as_deref().unwrap_or(UNKNOWN_VERSION);
        format!("{} {quote}{group}:{name}:{version}{quote}", self.include_type)
    }
}
