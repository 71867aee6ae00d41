//! Reconciliation of a single resource.

use tracing::{error, info};

use crate::error::Result;
use crate::resource::Resource;
use crate::state::{Action, plan};

/// Evaluate a resource and run the one operation that converges it.
///
/// Failures propagate unchanged; retrying is up to the caller on a later
/// pass.
pub async fn reconcile(resource: &dyn Resource) -> Result<Action> {
    let id = resource.id();

    let state = resource.evaluate().await?;
    let action = match plan(&state) {
        Ok(action) => action,
        Err(e) => {
            error!(resource = %id, current = %state.current, want = %state.want, "cannot plan: {}", e);
            return Err(e);
        }
    };

    match action {
        Action::Create => resource.create().await?,
        Action::Delete => resource.delete().await?,
        Action::Update => resource.update().await?,
        Action::Noop => {}
    }

    info!(
        resource = %id,
        current = %state.current,
        want = %state.want,
        update = state.update,
        action = %action,
        "reconciled"
    );
    Ok(action)
}
