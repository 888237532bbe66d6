//! Extension SQL: install, uninstall and versioned schema updates

use crate::context::OperationContext;
use crate::policy::Phase;
use extman_errors::{Error, InstallError};
use extman_events::{AppEvent, EventEmitter, LifecycleEvent};
use extman_manifest::ExtensionManifest;
use semver::Version;
use std::path::PathBuf;

/// Placeholder replaced by the configured table prefix
pub const TABLE_PREFIX_PLACEHOLDER: &str = "#__";

/// Split a SQL script into statements.
///
/// Semicolons inside quoted strings or identifiers do not split. `--` and
/// `/* */` comments are dropped, as is `#` to end of line unless it starts
/// the `#__` prefix placeholder. A doubled quote inside a string stays part
/// of it.
#[must_use]
pub fn split_statements(sql: &str) -> Vec<String> {
    let chars: Vec<char> = sql.chars().collect();
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut i = 0;

    let at = |i: usize| chars.get(i).copied();

    while i < chars.len() {
        let c = chars[i];

        if let Some(q) = quote {
            current.push(c);
            if c == q {
                if at(i + 1) == Some(q) {
                    current.push(q);
                    i += 1;
                } else {
                    quote = None;
                }
            }
            i += 1;
            continue;
        }

        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                current.push(c);
            }
            '-' if at(i + 1) == Some('-') => {
                i = skip_line(&chars, i);
                current.push('\n');
                continue;
            }
            '#' if !(at(i + 1) == Some('_') && at(i + 2) == Some('_')) => {
                i = skip_line(&chars, i);
                current.push('\n');
                continue;
            }
            '/' if at(i + 1) == Some('*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && at(i + 1) == Some('/')) {
                    i += 1;
                }
                i += 2;
                current.push(' ');
                continue;
            }
            ';' => {
                push_statement(&mut statements, &current);
                current.clear();
            }
            _ => current.push(c),
        }
        i += 1;
    }
    push_statement(&mut statements, &current);
    statements
}

fn skip_line(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && chars[i] != '\n' {
        i += 1;
    }
    i
}

fn push_statement(statements: &mut Vec<String>, current: &str) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
}

/// Replace `#__` with `prefix` outside quoted strings
#[must_use]
pub fn replace_prefix(statement: &str, prefix: &str) -> String {
    let mut out = String::with_capacity(statement.len());
    let mut quote: Option<char> = None;
    let mut rest = statement;

    while let Some(c) = rest.chars().next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if matches!(c, '\'' | '"') => quote = Some(c),
            None if rest.starts_with(TABLE_PREFIX_PLACEHOLDER) => {
                out.push_str(prefix);
                rest = &rest[TABLE_PREFIX_PLACEHOLDER.len()..];
                continue;
            }
            None => {}
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Parse a schema update file stem; `1.2` is read as `1.2.0`
#[must_use]
pub fn parse_schema_version(stem: &str) -> Option<Version> {
    Version::parse(stem).ok().or_else(|| {
        let parts = stem.split('.').count();
        match parts {
            1 => Version::parse(&format!("{stem}.0.0")).ok(),
            2 => Version::parse(&format!("{stem}.0")).ok(),
            _ => None,
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnError {
    Stop,
    Continue,
}

#[derive(Debug, Default)]
struct BatchOutcome {
    executed: usize,
    failures: Vec<String>,
}

/// Run every statement of `files` in order; statement numbers count across
/// the whole batch starting at 1
async fn run_batch(
    ctx: &OperationContext<'_>,
    label: &str,
    files: &[PathBuf],
    on_error: OnError,
) -> Result<BatchOutcome, Error> {
    let mut outcome = BatchOutcome::default();
    let mut number = 0;

    for file in files {
        let content = match ctx.fs.read_to_string(file).await {
            Ok(content) => content,
            Err(err) => {
                let failure = InstallError::SqlBatchFailed {
                    phase: label.to_string(),
                    statement: number + 1,
                    message: format!("cannot read {}: {err}", file.display()),
                };
                if on_error == OnError::Stop {
                    return Err(failure.into());
                }
                outcome.failures.push(failure.to_string());
                continue;
            }
        };

        for statement in split_statements(&content) {
            number += 1;
            let statement = replace_prefix(&statement, &ctx.config.table_prefix);
            match ctx.state.execute_sql(&statement).await {
                Ok(_) => outcome.executed += 1,
                Err(err) => {
                    let failure = InstallError::SqlBatchFailed {
                        phase: label.to_string(),
                        statement: number,
                        message: err.to_string(),
                    };
                    if on_error == OnError::Stop {
                        return Err(failure.into());
                    }
                    outcome.failures.push(failure.to_string());
                }
            }
        }
    }
    Ok(outcome)
}

fn admin_relative(ctx: &OperationContext<'_>, paths: Vec<&str>) -> Vec<PathBuf> {
    paths.into_iter().map(|p| ctx.paths.admin.join(p)).collect()
}

fn sql_applied(ctx: &OperationContext<'_>, statements: usize, version: Option<&Version>) {
    ctx.emit(AppEvent::Lifecycle(LifecycleEvent::SqlApplied {
        route: ctx.route,
        element: ctx.element.to_string(),
        statements,
        schema_version: version.map(ToString::to_string),
    }));
}

/// Run the install SQL batch, stopping at the first failing statement
///
/// # Errors
///
/// Returns `InstallError::SqlBatchFailed` naming the failing statement.
pub(crate) async fn run_install_sql(
    ctx: &mut OperationContext<'_>,
    manifest: &ExtensionManifest,
) -> Result<(), Error> {
    let files = admin_relative(ctx, manifest.install_sql_files(&ctx.config.database_driver));
    if files.is_empty() {
        return Ok(());
    }
    let outcome = run_batch(ctx, "install", &files, OnError::Stop).await?;
    sql_applied(ctx, outcome.executed, None);
    Ok(())
}

/// Run the uninstall SQL batch past failures, collecting each one
pub(crate) async fn run_uninstall_sql(
    ctx: &mut OperationContext<'_>,
    manifest: &ExtensionManifest,
) -> Result<(), Error> {
    let files = admin_relative(ctx, manifest.uninstall_sql_files(&ctx.config.database_driver));
    if files.is_empty() {
        return Ok(());
    }
    let outcome = run_batch(ctx, "uninstall", &files, OnError::Continue).await?;
    sql_applied(ctx, outcome.executed, None);

    for failure in outcome.failures {
        let err: Error = InstallError::Failed { message: failure }.into();
        ctx.collect(Phase::UninstallSql, &err);
    }
    Ok(())
}

/// Versioned update scripts of the installed tree, oldest first
async fn schema_update_files(
    ctx: &OperationContext<'_>,
    manifest: &ExtensionManifest,
) -> Result<Vec<(Version, PathBuf)>, Error> {
    let mut found = Vec::new();

    for dir in admin_relative(ctx, manifest.schema_paths(&ctx.config.database_driver)) {
        if !ctx.fs.is_dir(&dir).await {
            continue;
        }
        for path in ctx.fs.list_dir(&dir).await? {
            if path.extension().and_then(|e| e.to_str()) != Some("sql") {
                continue;
            }
            let version = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(parse_schema_version);
            match version {
                Some(version) => found.push((version, path)),
                None => ctx.emit_debug(format!(
                    "ignoring schema file without a version name: {}",
                    path.display()
                )),
            }
        }
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found)
}

fn newest(files: &[(Version, PathBuf)]) -> Option<&Version> {
    files.last().map(|(version, _)| version)
}

/// Run update scripts newer than the recorded schema version, then record
/// the newest version seen
///
/// With no recorded version every script runs.
///
/// # Errors
///
/// Returns `InstallError::SqlBatchFailed` at the first failing statement.
pub(crate) async fn run_schema_updates(
    ctx: &mut OperationContext<'_>,
    manifest: &ExtensionManifest,
    extension_id: i64,
) -> Result<(), Error> {
    let files = schema_update_files(ctx, manifest).await?;
    let Some(latest) = newest(&files).cloned() else {
        return Ok(());
    };

    let recorded = ctx
        .state
        .schema_version(extension_id)
        .await?
        .as_deref()
        .and_then(parse_schema_version)
        .unwrap_or_else(|| Version::new(0, 0, 0));

    let pending: Vec<PathBuf> = files
        .iter()
        .filter(|(version, _)| *version > recorded)
        .map(|(_, path)| path.clone())
        .collect();
    let outcome = run_batch(ctx, "update", &pending, OnError::Stop).await?;

    let applied = latest.max(recorded);
    ctx.state
        .set_schema_version(extension_id, &applied.to_string())
        .await?;
    sql_applied(ctx, outcome.executed, Some(&applied));
    Ok(())
}

/// Record the newest shipped update script as already applied
///
/// A fresh install's SQL already creates the latest schema.
pub(crate) async fn stamp_schema_version(
    ctx: &mut OperationContext<'_>,
    manifest: &ExtensionManifest,
    extension_id: i64,
) -> Result<(), Error> {
    let files = schema_update_files(ctx, manifest).await?;
    if let Some(latest) = newest(&files) {
        ctx.state
            .set_schema_version(extension_id, &latest.to_string())
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn splits_on_semicolons_outside_quotes() {
        let sql = "CREATE TABLE #__a (t TEXT);\nINSERT INTO #__a VALUES ('x;y');\n\n";
        assert_eq!(
            split_statements(sql),
            [
                "CREATE TABLE #__a (t TEXT)",
                "INSERT INTO #__a VALUES ('x;y')"
            ]
        );
    }

    #[test]
    fn drops_comments_but_keeps_prefix() {
        let sql = "-- header; still comment\n# mysql style;\n/* block; */ DELETE FROM #__a;";
        assert_eq!(split_statements(sql), ["DELETE FROM #__a"]);
    }

    #[test]
    fn doubled_quotes_stay_inside_strings() {
        let sql = "INSERT INTO t VALUES ('it''s; fine'); SELECT 1";
        assert_eq!(
            split_statements(sql),
            ["INSERT INTO t VALUES ('it''s; fine')", "SELECT 1"]
        );
    }

    #[test]
    fn empty_script_has_no_statements() {
        assert!(split_statements("  \n-- nothing\n;;").is_empty());
    }

    #[test]
    fn prefix_is_not_replaced_inside_strings() {
        assert_eq!(
            replace_prefix("INSERT INTO #__items VALUES ('#__raw')", "ext_"),
            "INSERT INTO ext_items VALUES ('#__raw')"
        );
    }

    #[test]
    fn schema_versions_accept_short_forms() {
        assert_eq!(parse_schema_version("1.2"), Some(Version::new(1, 2, 0)));
        assert_eq!(parse_schema_version("2"), Some(Version::new(2, 0, 0)));
        assert_eq!(parse_schema_version("1.2.3"), Some(Version::new(1, 2, 3)));
        assert_eq!(parse_schema_version("install"), None);
    }

    proptest! {
        #[test]
        fn split_recovers_joined_statements(
            parts in prop::collection::vec("[A-Za-z0-9 ()_,=]{1,24}", 1..6)
        ) {
            let parts: Vec<String> = parts
                .into_iter()
                .filter(|p| !p.trim().is_empty())
                .collect();
            let sql = parts.join(";\n");
            let expected: Vec<String> = parts.iter().map(|p| p.trim().to_string()).collect();
            prop_assert_eq!(split_statements(&sql), expected);
        }
    }
}
