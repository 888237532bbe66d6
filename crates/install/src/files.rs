//! Copying and removing the files a manifest declares

use crate::context::OperationContext;
use crate::policy::Phase;
use crate::steps::InstallationStep;
use extman_errors::{Error, InstallError};
use extman_events::{AppEvent, EventEmitter, LifecycleEvent};
use extman_manifest::{ExtensionManifest, FileSet, LanguageSet, MediaSet};
use extman_types::ClientScope;
use std::path::{Component, Path, PathBuf};

/// One file or folder name of a file set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEntry {
    pub name: String,
    pub folder: bool,
}

/// Work needed to move a tree from a previous file list to a current one
///
/// Every current entry is copied; previous entries missing from the current
/// list are removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSyncPlan {
    pub copy: Vec<SyncEntry>,
    pub remove: Vec<SyncEntry>,
}

impl FileSyncPlan {
    #[must_use]
    pub fn new(previous: Option<&FileSet>, current: Option<&FileSet>) -> Self {
        let copy: Vec<SyncEntry> = current
            .map(|set| set.entries().map(to_entry).collect())
            .unwrap_or_default();
        let keep = current.map(FileSet::names).unwrap_or_default();
        let remove = previous
            .map(|set| {
                set.entries()
                    .filter(|entry| !keep.contains(entry.name()))
                    .map(to_entry)
                    .collect()
            })
            .unwrap_or_default();

        Self { copy, remove }
    }
}

fn to_entry(entry: extman_manifest::FileEntry<'_>) -> SyncEntry {
    SyncEntry {
        name: entry.name().to_string(),
        folder: entry.is_folder(),
    }
}

/// Join a manifest-relative name onto `base`, refusing escapes
fn safe_join(base: &Path, name: &str) -> Result<PathBuf, Error> {
    let relative = Path::new(name);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || name.trim().is_empty() {
        return Err(InstallError::FileCopyFailed {
            source_path: name.to_string(),
            destination: base.display().to_string(),
            message: "path must stay inside the extension tree".to_string(),
        }
        .into());
    }
    Ok(base.join(relative))
}

fn folder_of(base: &Path, set: &FileSet) -> Result<PathBuf, Error> {
    match set.folder.as_deref().filter(|f| !f.is_empty()) {
        Some(folder) => safe_join(base, folder),
        None => Ok(base.to_path_buf()),
    }
}

/// Copy one file or folder, recording it when the destination is new
async fn copy_entry(
    ctx: &mut OperationContext<'_>,
    src: &Path,
    dst: &Path,
    folder: bool,
) -> Result<(), Error> {
    let copy_failed = |message: String| InstallError::FileCopyFailed {
        source_path: src.display().to_string(),
        destination: dst.display().to_string(),
        message,
    };

    if !ctx.fs.exists(src).await {
        return Err(copy_failed("source does not exist".to_string()).into());
    }
    let existed = ctx.fs.exists(dst).await;
    if existed && !ctx.overwrite {
        return Err(copy_failed("destination already exists".to_string()).into());
    }

    let copied = if folder {
        ctx.fs.copy_directory(src, dst).await
    } else {
        ctx.fs.copy_file(src, dst).await
    };
    copied.map_err(|e| copy_failed(e.to_string()))?;

    if !existed {
        ctx.push(if folder {
            InstallationStep::CopiedFolder(dst.to_path_buf())
        } else {
            InstallationStep::CopiedFile(dst.to_path_buf())
        });
    }
    Ok(())
}

/// Remove entries below `target`; missing paths are skipped
///
/// Returns how many entries were removed and the failures met on the way.
async fn remove_entries(
    ctx: &OperationContext<'_>,
    target: &Path,
    entries: &[SyncEntry],
) -> (usize, Vec<String>) {
    let mut removed = 0;
    let mut failures = Vec::new();

    for entry in entries {
        let path = match safe_join(target, &entry.name) {
            Ok(path) => path,
            Err(err) => {
                failures.push(err.to_string());
                continue;
            }
        };
        if !ctx.fs.exists(&path).await {
            continue;
        }
        let result = if entry.folder || ctx.fs.is_dir(&path).await {
            ctx.fs.remove_dir_all(&path).await
        } else {
            ctx.fs.remove_file(&path).await
        };
        match result {
            Ok(()) => removed += 1,
            Err(err) => failures.push(format!("cannot remove {}: {err}", path.display())),
        }
    }
    (removed, failures)
}

/// Bring one install tree in line with the current file list
///
/// Copy failures abort; removals of obsolete entries only warn.
///
/// # Errors
///
/// Returns `InstallError::FileCopyFailed` when a current entry cannot be
/// copied.
pub(crate) async fn sync_scope(
    ctx: &mut OperationContext<'_>,
    scope: ClientScope,
    previous: Option<&FileSet>,
    current: Option<&FileSet>,
) -> Result<(), Error> {
    let plan = FileSyncPlan::new(previous, current);
    let target = ctx.paths.dir(scope).to_path_buf();
    let source = match current {
        Some(set) => folder_of(&ctx.source, set)?,
        None => ctx.source.clone(),
    };

    for entry in &plan.copy {
        let src = safe_join(&source, &entry.name)?;
        let dst = safe_join(&target, &entry.name)?;
        copy_entry(ctx, &src, &dst, entry.folder).await?;
    }

    let (removed, failures) = remove_entries(ctx, &target, &plan.remove).await;
    for failure in failures {
        let err: Error = InstallError::Failed { message: failure }.into();
        ctx.warn(Phase::CopyFiles, &err);
    }

    ctx.emit(AppEvent::Lifecycle(LifecycleEvent::FilesSynchronized {
        route: ctx.route,
        element: ctx.element.to_string(),
        scope,
        copied: plan.copy.len(),
        removed,
    }));
    Ok(())
}

/// Copy the lifecycle script file into the administrator tree
///
/// # Errors
///
/// Returns `InstallError::FileCopyFailed` if the declared file is missing or
/// cannot be copied.
pub(crate) async fn copy_script_file(ctx: &mut OperationContext<'_>) -> Result<(), Error> {
    let Some(script) = ctx.manifest.scriptfile.clone() else {
        return Ok(());
    };
    let src = safe_join(&ctx.source, &script)?;
    let name = Path::new(&script)
        .file_name()
        .map_or_else(|| script.clone(), |n| n.to_string_lossy().into_owned());
    let dst = ctx.paths.admin.join(name);
    copy_entry(ctx, &src, &dst, false).await
}

fn media_target(ctx: &OperationContext<'_>, media: &MediaSet) -> Result<PathBuf, Error> {
    let destination = media
        .destination
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or(ctx.element.as_str());
    safe_join(&ctx.paths.media_root(), destination)
}

/// Copy the media file set below `<site>/media/<destination>`
///
/// # Errors
///
/// Returns an error if the destination cannot be created or an entry cannot
/// be copied.
pub(crate) async fn copy_media(ctx: &mut OperationContext<'_>, media: &MediaSet) -> Result<(), Error> {
    let target = media_target(ctx, media)?;
    let source = folder_of(&ctx.source, &media.files)?;

    if !ctx.fs.exists(&target).await {
        ctx.fs
            .create_dir_all(&target)
            .await
            .map_err(|e| InstallError::DirectoryCreateFailed {
                path: target.display().to_string(),
                message: e.to_string(),
            })?;
        ctx.push(InstallationStep::CreatedDirectory(target.clone()));
    }

    for entry in media.files.entries() {
        let src = safe_join(&source, entry.name())?;
        let dst = safe_join(&target, entry.name())?;
        copy_entry(ctx, &src, &dst, entry.is_folder()).await?;
    }
    Ok(())
}

fn language_destination(root: &Path, tag: &str, file: &str) -> Result<PathBuf, Error> {
    let name = Path::new(file)
        .file_name()
        .map_or_else(|| file.to_string(), |n| n.to_string_lossy().into_owned());
    safe_join(&safe_join(root, tag)?, &name)
}

/// Copy language files into `<root>/language/<tag>/`
///
/// # Errors
///
/// Returns an error if a language file cannot be copied.
pub(crate) async fn copy_languages(
    ctx: &mut OperationContext<'_>,
    scope: ClientScope,
    set: &LanguageSet,
) -> Result<(), Error> {
    let root = ctx.paths.language_root(scope);
    let source = match set.folder.as_deref().filter(|f| !f.is_empty()) {
        Some(folder) => safe_join(&ctx.source, folder)?,
        None => ctx.source.clone(),
    };

    for language in &set.languages {
        let src = safe_join(&source, &language.file)?;
        let dst = language_destination(&root, &language.tag, &language.file)?;
        copy_entry(ctx, &src, &dst, false).await?;
    }
    Ok(())
}

/// Remove the media entries an installed manifest declares
///
/// The destination directory goes too once it is empty.
pub(crate) async fn remove_media(ctx: &OperationContext<'_>, manifest: &ExtensionManifest) -> Vec<String> {
    let Some(media) = manifest.media.as_ref() else {
        return Vec::new();
    };
    let target = match media_target(ctx, media) {
        Ok(target) => target,
        Err(err) => return vec![err.to_string()],
    };

    let entries: Vec<SyncEntry> = media.files.entries().map(to_entry).collect();
    let (_, mut failures) = remove_entries(ctx, &target, &entries).await;

    if ctx.fs.is_dir(&target).await {
        match ctx.fs.list_dir(&target).await {
            Ok(children) if children.is_empty() => {
                if let Err(err) = ctx.fs.remove_dir_all(&target).await {
                    failures.push(format!("cannot remove {}: {err}", target.display()));
                }
            }
            Ok(_) => {}
            Err(err) => failures.push(err.to_string()),
        }
    }
    failures
}

/// Remove the site and administrator language files of a manifest
pub(crate) async fn remove_languages(
    ctx: &OperationContext<'_>,
    manifest: &ExtensionManifest,
) -> Vec<String> {
    let mut failures = Vec::new();
    let sets = [
        (ClientScope::Site, manifest.languages.as_ref()),
        (ClientScope::Administrator, manifest.admin_languages()),
    ];

    for (scope, set) in sets {
        let Some(set) = set else { continue };
        let root = ctx.paths.language_root(scope);
        for language in &set.languages {
            let path = match language_destination(&root, &language.tag, &language.file) {
                Ok(path) => path,
                Err(err) => {
                    failures.push(err.to_string());
                    continue;
                }
            };
            if ctx.fs.exists(&path).await {
                if let Err(err) = ctx.fs.remove_file(&path).await {
                    failures.push(format!("cannot remove {}: {err}", path.display()));
                }
            }
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn files(names: &[&str]) -> FileSet {
        FileSet {
            folder: None,
            files: names.iter().map(ToString::to_string).collect(),
            folders: Vec::new(),
        }
    }

    fn names(entries: &[SyncEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn diff_copies_current_and_removes_dropped() {
        let previous = files(&["a.php", "b.php", "c.php"]);
        let current = files(&["b.php", "c.php", "d.php"]);
        let plan = FileSyncPlan::new(Some(&previous), Some(&current));

        assert_eq!(names(&plan.copy), ["b.php", "c.php", "d.php"]);
        assert_eq!(names(&plan.remove), ["a.php"]);
    }

    #[test]
    fn fresh_install_removes_nothing() {
        let current = FileSet {
            folder: Some("site".to_string()),
            files: vec!["x.php".to_string()],
            folders: vec!["views".to_string()],
        };
        let plan = FileSyncPlan::new(None, Some(&current));
        assert_eq!(plan.copy.len(), 2);
        assert!(plan.copy[1].folder);
        assert!(plan.remove.is_empty());
    }

    #[test]
    fn folder_kind_of_removed_entry_is_kept() {
        let previous = FileSet {
            folder: None,
            files: Vec::new(),
            folders: vec!["legacy".to_string()],
        };
        let plan = FileSyncPlan::new(Some(&previous), None);
        assert_eq!(
            plan.remove,
            [SyncEntry {
                name: "legacy".to_string(),
                folder: true
            }]
        );
    }

    #[test]
    fn escaping_names_are_refused() {
        let base = Path::new("/srv/site");
        assert!(safe_join(base, "../etc/passwd").is_err());
        assert!(safe_join(base, "/etc/passwd").is_err());
        assert!(safe_join(base, "").is_err());
        assert_eq!(
            safe_join(base, "views/default.php").unwrap(),
            PathBuf::from("/srv/site/views/default.php")
        );
    }

    proptest! {
        #[test]
        fn plan_matches_set_difference(
            previous in prop::collection::btree_set("[a-e]{1,2}", 0..8),
            current in prop::collection::btree_set("[a-e]{1,2}", 0..8),
        ) {
            let prev: Vec<&str> = previous.iter().map(String::as_str).collect();
            let cur: Vec<&str> = current.iter().map(String::as_str).collect();
            let plan = FileSyncPlan::new(Some(&files(&prev)), Some(&files(&cur)));

            let copied: BTreeSet<&str> = plan.copy.iter().map(|e| e.name.as_str()).collect();
            let removed: BTreeSet<&str> = plan.remove.iter().map(|e| e.name.as_str()).collect();
            let expected: BTreeSet<&str> = previous
                .difference(&current)
                .map(String::as_str)
                .collect();

            prop_assert_eq!(copied, cur.iter().copied().collect::<BTreeSet<_>>());
            prop_assert_eq!(removed, expected);
        }
    }
}
