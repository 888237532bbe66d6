//! Registry queries: listing, discovery and manifest-cache refresh

use crate::{ExtensionTarget, OpsCtx};
use chrono::Utc;
use extman_errors::Error;
use extman_events::EventEmitter;
use extman_manifest::ManifestCache;
use extman_state::ExtensionRecord;
use extman_types::{DiscoveryReport, ExtensionSummary};

fn summarize(ctx: &OpsCtx, record: &ExtensionRecord) -> ExtensionSummary {
    let version = match ManifestCache::from_json(&record.manifest_cache) {
        Ok(cache) if !cache.version.is_empty() => Some(cache.version),
        Ok(_) => None,
        Err(err) => {
            ctx.emit_debug(format!(
                "unreadable manifest cache for {}: {err}",
                record.element
            ));
            None
        }
    };
    record.summary(version)
}

/// List registered extensions
///
/// # Errors
///
/// Returns an error if the registry cannot be queried.
pub async fn list_extensions(ctx: &OpsCtx) -> Result<Vec<ExtensionSummary>, Error> {
    let records = ctx.state.list_extensions().await?;
    Ok(records.iter().map(|r| summarize(ctx, r)).collect())
}

/// Components found on disk that the registry does not know
///
/// # Errors
///
/// Returns an error if a component tree cannot be scanned.
pub async fn discover(ctx: &OpsCtx) -> Result<DiscoveryReport, Error> {
    let operation = ctx.begin("discover");
    let result = ctx
        .installer
        .discover(Some(ctx.tx.clone()))
        .await
        .map(|candidates| DiscoveryReport {
            candidates: candidates.iter().map(|c| c.summary()).collect(),
            scanned_at: Utc::now(),
        });
    ctx.end(&operation, result)
}

/// Re-read an installed descriptor into the registry
///
/// # Errors
///
/// Returns an error if the target is unknown or its descriptor is missing.
pub async fn refresh_cache(ctx: &OpsCtx, target: &str) -> Result<ExtensionSummary, Error> {
    let operation = ctx.begin("refresh-cache");
    let result = async {
        let record = ExtensionTarget::parse(target)?.resolve(&ctx.state).await?;
        let refreshed = ctx
            .installer
            .refresh_manifest_cache(record.extension_id)
            .await?;
        Ok::<_, Error>(summarize(ctx, &refreshed))
    }
    .await;
    ctx.end(&operation, result)
}
