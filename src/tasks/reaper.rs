use anyhow::{Context, Result};
use time::Duration;

use crate::core::state::AppState;
use crate::core::time::{elapsed_minutes, primitive_now_utc};
use crate::db::types::TestSkill;
use crate::repositories;
use crate::repositories::test_results::InProgressCandidate;
use crate::services::grading;

/// One sweep over every InProgress attempt: anything past its test's
/// duration plus the grace period is force-submitted. The candidate list
/// is snapshotted up front and each item has its own failure boundary, so
/// one bad row never aborts the batch.
pub(crate) async fn auto_submit_expired(state: &AppState) -> Result<()> {
    let candidates = repositories::test_results::list_in_progress_with_test(state.db())
        .await
        .context("Failed to fetch in-progress test results")?;

    if candidates.is_empty() {
        return Ok(());
    }

    let now = primitive_now_utc();
    let grace = Duration::minutes(state.settings().session().grace_period_minutes);
    let mut submitted = 0usize;

    for candidate in &candidates {
        let allowed = candidate.created_at.assume_utc()
            + Duration::minutes(candidate.test_duration_minutes as i64)
            + grace;
        if now.assume_utc() <= allowed {
            continue;
        }

        match force_submit(state, candidate, now).await {
            Ok(()) => submitted += 1,
            Err(err) => {
                tracing::error!(
                    test_result_id = %candidate.id,
                    user_id = %candidate.user_id,
                    error = %err,
                    "Failed to auto-submit expired test result"
                );
            }
        }
    }

    if submitted > 0 {
        tracing::info!(submitted, "Auto-submitted expired test results");
    }
    metrics::counter!("expired_results_submitted_total").increment(submitted as u64);

    Ok(())
}

async fn force_submit(
    state: &AppState,
    candidate: &InProgressCandidate,
    now: time::PrimitiveDateTime,
) -> Result<()> {
    let elapsed = elapsed_minutes(candidate.created_at, now) as i32;

    match candidate.test_skill {
        TestSkill::Lr | TestSkill::FourSkills => {
            let test_result =
                repositories::test_results::find_by_id(state.db(), &candidate.id)
                    .await
                    .context("Failed to fetch test result")?
                    .context("Test result disappeared")?;

            // Grades from whatever answers were saved; unanswered questions
            // count as skipped.
            grading::submit_lr(state, &test_result, elapsed).await?;
            tracing::info!(
                test_result_id = %candidate.id,
                elapsed_minutes = elapsed,
                "Auto-submitted expired LR test"
            );
        }
        TestSkill::Writing | TestSkill::Speaking => {
            // No scorer call here: scoring is deferred to the out-of-band
            // grading pass, and the attempt is parked in an explicit state
            // rather than an unscored Graded.
            let claimed = repositories::test_results::claim_pending_manual_grading(
                state.db(),
                &candidate.id,
                elapsed,
                now,
            )
            .await
            .context("Failed to mark test result pending manual grading")?;

            if claimed {
                tracing::info!(
                    test_result_id = %candidate.id,
                    elapsed_minutes = elapsed,
                    "Expired Writing/Speaking test parked for manual grading"
                );
            }
        }
    }

    Ok(())
}
