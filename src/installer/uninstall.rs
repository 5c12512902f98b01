//! Uninstall workflow.

use tracing::{info, warn};

use super::{InstallSession, SUCCESS_TITLE, UNINSTALL_SUCCESS_DETAIL};
use crate::cleanup::{self, TeardownReport};

/// Title of the per-item error notification.
const REMOVAL_FAILED_TITLE: &str = "Unable to remove file";

/// Remove every installed artifact, regardless of the current install state.
///
/// Each path that cannot be removed gets its own error notification; the run
/// still ends with the success notification so the user always gets feedback.
pub async fn uninstall(session: &InstallSession) -> TeardownReport {
    info!("Uninstalling Molly Wallet from {}", session.install_root.display());
    session.progress.report(0, "Uninstalling Molly Wallet").await;

    let report = cleanup::teardown(&session.install_root, &session.staging_dir, &session.profile);

    for failure in &report.failures {
        warn!("Unable to remove {failure}");
        session.progress.notify_error(REMOVAL_FAILED_TITLE, failure.to_string()).await;
    }

    info!(
        "Removed {} path(s), {} failure(s)",
        report.removed.len(),
        report.failures.len()
    );
    session.progress.report(100, "Uninstall complete").await;
    session.progress.notify_success(SUCCESS_TITLE, UNINSTALL_SUCCESS_DETAIL).await;
    report
}
