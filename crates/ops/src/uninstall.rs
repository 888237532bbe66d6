//! Uninstall command implementation
//!
//! Delegates to `extman_install` for the actual removal logic.

use crate::{ExtensionTarget, OpsCtx};
use extman_errors::Error;
use extman_install::UninstallContext;
use extman_types::UninstallReport;

/// Uninstall a component named by id or element
///
/// A report with `success == false` is still returned: cleanup after the
/// hooks is best-effort and the caller decides how to surface leftovers.
///
/// # Errors
///
/// Returns an error if the target is not registered, is protected, its
/// descriptor is missing, or a hook refuses the removal.
pub async fn uninstall(ctx: &OpsCtx, target: &str) -> Result<UninstallReport, Error> {
    let operation = ctx.begin("uninstall");
    let result = async {
        let record = ExtensionTarget::parse(target)?.resolve(&ctx.state).await?;
        let context = UninstallContext::new()
            .with_extension_id(record.extension_id)
            .with_event_sender(ctx.tx.clone());
        Ok::<_, Error>(ctx.installer.uninstall(context).await?.into_report())
    }
    .await;
    ctx.end(&operation, result)
}
