//! Line grammar for Gradle build and settings files.
//!
//! Each line is trimmed and matched in full against a tolerant pattern.
//! Lines that do not match (comments, blocks, plugin statements) are not
//! dependencies and are ignored.
//!
//! Build file declarations:
//! - `implementation 'com.example:core:1.2.0'`
//! - `api("com.example:core:$coreVersion")`
//! - `compile project(":core")`, `api project(':feature:login')`
//!
//! Settings file statements:
//! - `include ':app'`, `include ':app', ':core'` (continued across pieces)
//! - `project(':core').projectDir = new File('../core')`

use crate::settings::SettingsSnapshot;
use crate::types::{DependencyRecord, IncludeType, QuoteStyle};
use modspace_core::ModspaceError;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static DEPENDENCY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"^(?P<include>compile|api|implementation)\b ?(?P<project>project)? ?\(?"#,
        r#"(?P<quote>["']):?(?P<group>[A-Za-z0-9._-]*):?(?P<name>[A-Za-z0-9_-]*)"#,
        r#":?(?P<version>\$?[A-Za-z0-9._-]+)?["']\)?$"#,
    ))
    .expect("Invalid regex")
});

static SETTINGS_PROJECT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^["']:?(?P<dep>[A-Za-z0-9_:-]+)["']\)?$"#).expect("Invalid regex")
});

static SETTINGS_INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^include\b\s*\(?["']?:?(?P<dep>[A-Za-z0-9_:-]+)["']?\)?$"#)
        .expect("Invalid regex")
});

static SETTINGS_EXTERNAL_PROJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"^project\s*\(["']?:?(?P<dep>[A-Za-z0-9_:-]+)["']?\)\.projectDir\s*=\s*"#,
        r#"(?:new\s*File|file)\s*\(["']?(?P<path>[A-Za-z0-9_:./\\-]+)["']?\)$"#,
    ))
    .expect("Invalid regex")
});

/// Parses one build file line into a dependency declaration.
pub fn match_dependency(line: &str) -> Option<DependencyRecord> {
    let caps = DEPENDENCY_PATTERN.captures(line.trim())?;
    let include_type: IncludeType = caps.name("include")?.as_str().parse().ok()?;
    let quote = QuoteStyle::from_char(caps.name("quote")?.as_str().chars().next()?)?;

    let record = if caps.name("project").is_some() {
        source_dependency(&caps, include_type, quote)?
    } else {
        remote_dependency(&caps, include_type, quote)?
    };
    tracing::trace!("Matched dependency '{}' in {:?}", record.name(), line);
    Some(record)
}

fn capture<'a>(caps: &Captures<'a>, group: &str) -> Option<&'a str> {
    caps.name(group).map(|m| m.as_str()).filter(|s| !s.is_empty())
}

/// `project(":a:b")` captures `a` as the group slot and `b` as the name slot;
/// the dependency is named after the whole project path.
fn source_dependency(
    caps: &Captures<'_>,
    include_type: IncludeType,
    quote: QuoteStyle,
) -> Option<DependencyRecord> {
    let name = match (capture(caps, "group"), capture(caps, "name")) {
        (Some(prefix), Some(name)) => format!("{prefix}:{name}"),
        (Some(single), None) | (None, Some(single)) => single.to_string(),
        (None, None) => return None,
    };
    Some(DependencyRecord::new(name, include_type, quote, true))
}

fn remote_dependency(
    caps: &Captures<'_>,
    include_type: IncludeType,
    quote: QuoteStyle,
) -> Option<DependencyRecord> {
    let name = capture(caps, "name")?;
    let mut record = DependencyRecord::new(name, include_type, quote, false);
    record.group = capture(caps, "group").map(str::to_string);
    record.last_known_version = capture(caps, "version").map(str::to_string);
    Some(record)
}

/// Scans settings file pieces in order.
///
/// A bare quoted name only counts as a project while an `include` statement
/// is being continued; any other non-blank piece ends the continuation.
/// Blank pieces are skipped and leave the continuation open.
pub fn match_settings<S: AsRef<str>>(lines: &[S]) -> SettingsSnapshot {
    let mut result = SettingsSnapshot::new();
    let mut is_include_continuation = false;

    for raw in lines {
        let line = raw.as_ref().trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = SETTINGS_PROJECT_NAME.captures(line) {
            if is_include_continuation {
                result.add_internal_project(&caps["dep"]);
            } else {
                tracing::warn!(
                    "{}",
                    ModspaceError::ParseAnomaly {
                        line: line.to_string()
                    }
                );
            }
            continue;
        }

        if let Some(caps) = SETTINGS_INCLUDE.captures(line) {
            result.add_internal_project(&caps["dep"]);
            is_include_continuation = true;
            continue;
        }

        is_include_continuation = false;

        if let Some(caps) = SETTINGS_EXTERNAL_PROJECT.captures(line) {
            result.add_external_project(&caps["dep"], &caps["path"]);
        }
    }

    tracing::debug!(
        "Parsed settings: {} projects ({} internal, {} external)",
        result.all_projects.len(),
        result.internal_projects.len(),
        result.external_projects.len()
    );
    result
}

/// Project names registered by one settings line, split on commas.
///
/// An opening line must start with an `include` piece; a `continuation` line
/// holds bare quoted names only. `None` when the line is anything else.
pub(crate) fn include_statement_names(line: &str, continuation: bool) -> Option<Vec<String>> {
    let mut names = Vec::new();
    for piece in line.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let pattern = if names.is_empty() && !continuation {
            &SETTINGS_INCLUDE
        } else {
            &SETTINGS_PROJECT_NAME
        };
        names.push(pattern.captures(piece)?["dep"].to_string());
    }
    (!names.is_empty()).then_some(names)
}

/// The `(name, path)` bound by a `projectDir` assignment line.
pub(crate) fn project_dir_binding(line: &str) -> Option<(String, String)> {
    let caps = SETTINGS_EXTERNAL_PROJECT.captures(line.trim())?;
    Some((caps["dep"].to_string(), caps["path"].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUPS: [&str; 3] = [
        "com.android.support.constraint",
        "com.123asdf.1a3.fffff1.2222334",
        "com.123_.asdfeef.asdfdff",
    ];
    const ARTIFACTS: [&str; 2] = ["artifact", "module-n_ame"];
    const VERSIONS: [&str; 5] = [
        "1.3.4",
        "0.31234123123.4412312414124124",
        "$someVersion",
        "$some_version",
        "$someVersion.someName",
    ];

    fn assert_remote(
        line: &str,
        include: IncludeType,
        quote: QuoteStyle,
        group: &str,
        name: &str,
        version: &str,
    ) {
        let dep = match_dependency(line).unwrap_or_else(|| panic!("no match for {line}"));
        assert_eq!(dep.include_type, include, "{line}");
        assert_eq!(dep.quote, quote, "{line}");
        assert_eq!(dep.group.as_deref(), Some(group), "{line}");
        assert_eq!(dep.name(), name, "{line}");
        assert_eq!(dep.last_known_version.as_deref(), Some(version), "{line}");
        assert!(!dep.is_source_dependency, "{line}");
    }

    #[test]
    fn test_remote_declaration_forms() {
        for include in IncludeType::ALL {
            for quote in [QuoteStyle::Single, QuoteStyle::Double] {
                let q = quote.as_char();
                for group in GROUPS {
                    for name in ARTIFACTS {
                        for version in VERSIONS {
                            let with_parens =
                                format!("{include} ({q}{group}:{name}:{version}{q})");
                            let without_parens =
                                format!("{include} {q}{group}:{name}:{version}{q}");
                            for line in [&with_parens, &without_parens] {
                                assert_remote(line, include, quote, group, name, version);
                                let compact = line.replace(' ', "");
                                assert_remote(&compact, include, quote, group, name, version);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_source_declaration_forms() {
        for include in IncludeType::ALL {
            for q in ['\'', '"'] {
                for name in ARTIFACTS {
                    for line in [
                        format!("{include} project({q}:{name}{q})"),
                        format!("{include} project {q}:{name}{q}"),
                        format!("{include} project ({q}:{name}{q})"),
                    ] {
                        let dep = match_dependency(&line)
                            .unwrap_or_else(|| panic!("no match for {line}"));
                        assert_eq!(dep.include_type, include);
                        assert_eq!(dep.name(), name);
                        assert_eq!(dep.quote.as_char(), q);
                        assert!(dep.group.is_none());
                        assert!(dep.last_known_version.is_none());
                        assert!(dep.is_source_dependency, "{line}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_nested_source_dependency_name() {
        let dep = match_dependency("api project(\":primary:secondary\")").unwrap();
        assert!(dep.is_source_dependency);
        assert_eq!(dep.name(), "primary:secondary");
        assert!(dep.group.is_none());

        let dep = match_dependency("implementation project(':primar324y:secon13_-ry')").unwrap();
        assert_eq!(dep.name(), "primar324y:secon13_-ry");
    }

    #[test]
    fn test_leading_whitespace_is_ignored() {
        let dep = match_dependency("\t    implementation 'g:n:1.0'\r").unwrap();
        assert_eq!(dep.name(), "n");
        assert_eq!(dep.last_known_version.as_deref(), Some("1.0"));
    }

    #[test]
    fn test_remote_without_version() {
        let dep = match_dependency("api 'com.example:core'").unwrap();
        assert_eq!(dep.group.as_deref(), Some("com.example"));
        assert_eq!(dep.name(), "core");
        assert!(dep.last_known_version.is_none());
    }

    #[test]
    fn test_non_matching_lines() {
        for line in [
            "",
            "   ",
            "// implementation 'g:n:1.0'",
            "dependencies {",
            "}",
            "apply plugin: 'java'",
            "testImplementation 'junit:junit:4.13.2'",
            "implementation fileTree(dir: 'libs', include: ['*.jar'])",
            "implementation 'g:n:1.0' // pinned",
            "implementation ''",
            "api(':core')",
        ] {
            assert!(match_dependency(line).is_none(), "unexpected match for {line:?}");
        }
    }

    #[test]
    fn test_generated_lines_round_trip() {
        for line in [
            "api project(\":core\")",
            "implementation project(\":feature:login\")",
            "compile 'com.example:core:1.2.3'",
            "implementation \"com.example:core:1.2.3\"",
            "api 'com.example:core:$coreVersion'",
            "api \"com.example:core:UNKNOWN\"",
        ] {
            let dep = match_dependency(line).unwrap();
            assert_eq!(dep.to_declaration(), line);
        }
    }

    #[test]
    fn test_settings_includes() {
        let lines = ["include ':app'", "include(':core')", "include \"feature:login\""];
        let settings = match_settings(&lines);
        let all: Vec<&str> = settings.all_projects.iter().map(String::as_str).collect();
        assert_eq!(all, vec!["app", "core", "feature:login"]);
        assert_eq!(settings.internal_projects.len(), 3);
        assert!(settings.external_projects.is_empty());
    }

    #[test]
    fn test_settings_include_continuation() {
        // Pieces as produced by splitting `include ':app',\n    ':core', ':ui'`.
        let lines = ["include ':app'", "", "    ':core'", " ':ui'"];
        let settings = match_settings(&lines);
        assert_eq!(settings.internal_projects.len(), 3);
        assert!(settings.contains("core"));
        assert!(settings.contains("ui"));
    }

    #[test]
    fn test_settings_external_project() {
        let lines = [
            "include ':networking'",
            "project(':networking').projectDir = new File('../libs/networking')",
            "project(\":storage\").projectDir = file(\"/abs/storage\")",
        ];
        let settings = match_settings(&lines);
        assert_eq!(
            settings.external_projects.get("networking").map(String::as_str),
            Some("../libs/networking")
        );
        assert_eq!(
            settings.external_projects.get("storage").map(String::as_str),
            Some("/abs/storage")
        );
        assert!(settings.contains("storage"));
        assert!(!settings.internal_projects.contains("storage"));
        assert!(settings.internal_projects.contains("networking"));
    }

    #[test]
    fn test_settings_continuation_anomaly_is_skipped() {
        let lines = ["':orphan'", "include ':app'"];
        let settings = match_settings(&lines);
        assert!(!settings.contains("orphan"));
        assert!(settings.contains("app"));
    }

    #[test]
    fn test_settings_continuation_ends_on_other_statement() {
        let lines = [
            "include ':app'",
            "rootProject.name = 'demo'",
            "':late'",
        ];
        let settings = match_settings(&lines);
        assert!(settings.contains("app"));
        assert!(!settings.contains("late"));
    }

    #[test]
    fn test_settings_external_path_ends_continuation() {
        let lines = [
            "include ':core'",
            "project(':core').projectDir = new File('../core')",
            "':stray'",
        ];
        let settings = match_settings(&lines);
        assert!(!settings.contains("stray"));
        assert_eq!(settings.all_projects.len(), 1);
    }

    #[test]
    fn test_include_statement_names() {
        assert_eq!(
            include_statement_names("  include ':app', ':core',\r", false),
            Some(vec!["app".to_string(), "core".to_string()])
        );
        assert_eq!(
            include_statement_names("':feature:login'", true),
            Some(vec!["feature:login".to_string()])
        );
        assert_eq!(include_statement_names("':feature:login'", false), None);
        assert_eq!(include_statement_names("include ':a' // note", false), None);
        assert_eq!(include_statement_names("rootProject.name = 'demo'", false), None);
        assert_eq!(include_statement_names("", true), None);
    }

    #[test]
    fn test_project_dir_binding() {
        assert_eq!(
            project_dir_binding("project(':core').projectDir = file('../core')\r"),
            Some(("core".to_string(), "../core".to_string()))
        );
        assert_eq!(project_dir_binding("include ':core'"), None);
    }
}
