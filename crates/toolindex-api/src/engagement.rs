use std::collections::HashSet;

use toolindex_core::engagement::EngagementKind;
use toolindex_db::Database;
use toolindex_types::api::ToggleResponse;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

/// Toggle and report the new count. The count is re-read after the toggle
/// so concurrent toggles by other users are reflected.
pub(crate) async fn toggle_and_count(
    state: &AppState,
    kind: EngagementKind,
    subject_id: String,
    actor_id: String,
) -> Result<ToggleResponse, ApiError> {
    blocking(state, move |db| {
        let outcome = db.toggle_engagement(kind, &subject_id, &actor_id)?;
        let count = db.engagement_count(kind, &subject_id)?;
        Ok(ToggleResponse {
            liked: outcome.liked,
            count,
        })
    })
    .await
}

/// Subjects among `subject_ids` the viewer has engaged with. Empty for
/// anonymous viewers.
pub(crate) fn viewer_engagements(
    db: &Database,
    kind: EngagementKind,
    viewer: Option<&str>,
    subject_ids: &[String],
) -> Result<HashSet<String>, ApiError> {
    match viewer {
        Some(actor) => Ok(db.engaged_subjects(kind, actor, subject_ids)?),
        None => Ok(Default::default()),
    }
}
