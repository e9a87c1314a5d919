use std::path::{Path, PathBuf};

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::crawl_engine::crawl_types::HarvestResult;
use crate::utils::SNAPSHOT_FILE_NAME;

static RESERVED_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\:*?"<>|]"#).expect("Invalid reserved character regex"));

/// Folder name for an extension: `/` becomes a space, other reserved
/// filesystem characters become `_`. Falls back to the identifier when the
/// name sanitizes to nothing usable.
#[must_use]
pub fn sanitize_folder_name(name: &str, identifier: &str) -> String {
    let clean = |raw: &str| {
        let spaced = raw.replace('/', " ");
        RESERVED_CHARS.replace_all(&spaced, "_").trim().to_string()
    };

    let folder = clean(name);
    if folder.is_empty() || folder == "." || folder == ".." {
        clean(identifier)
    } else {
        folder
    }
}

/// Write `content.html` and a `<folder>.url` shortcut under
/// `save_dir/<folder>` and return the folder's absolute path.
///
/// A folder already holding another extension's snapshot is never reused;
/// the identifier is appended to the name instead.
pub async fn save_snapshot(
    save_dir: &Path,
    name: &str,
    identifier: &str,
    url: &str,
    html: &str,
) -> HarvestResult<PathBuf> {
    let save_dir = std::path::absolute(save_dir)?;
    tokio::fs::create_dir_all(&save_dir).await?;

    let shortcut = format!("[InternetShortcut]\nURL={url}\n");
    let preferred = sanitize_folder_name(name, identifier);

    let folder_name = if claim_folder(&save_dir, &preferred, &shortcut).await? {
        preferred
    } else {
        let unique = sanitize_folder_name(&format!("{name} ({identifier})"), identifier);
        debug!(
            "{preferred:?} belongs to another extension, saving {identifier} as {unique:?}"
        );
        tokio::fs::create_dir_all(save_dir.join(&unique)).await?;
        unique
    };
    let folder = save_dir.join(&folder_name);

    let shortcut_path = folder.join(format!("{folder_name}.url"));
    tokio::fs::write(&shortcut_path, &shortcut).await?;
    debug!("URL shortcut saved: {}", shortcut_path.display());

    let html_path = folder.join(SNAPSHOT_FILE_NAME);
    tokio::fs::write(&html_path, html).await?;
    debug!("HTML snapshot saved: {}", html_path.display());

    Ok(folder)
}

/// Take `save_dir/<folder_name>` for the extension behind `shortcut`.
///
/// Succeeds when the folder is newly created or already carries this exact
/// shortcut from an earlier pass. Only one of several racing tasks can create
/// the directory.
async fn claim_folder(save_dir: &Path, folder_name: &str, shortcut: &str) -> HarvestResult<bool> {
    let folder = save_dir.join(folder_name);
    match tokio::fs::create_dir(&folder).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            let existing = folder.join(format!("{folder_name}.url"));
            match tokio::fs::read_to_string(&existing).await {
                Ok(content) => Ok(content == shortcut),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(e.into()),
            }
        }
        Err(e) => Err(e.into()),
    }
}
