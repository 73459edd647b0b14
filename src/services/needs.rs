// src/services/needs.rs

//! Mutations on needs and their volunteers.
//!
//! Every operation takes the store handle and the caller's session explicitly
//! and reports failures as `NeedError`, never by panicking.

use validator::Validate;

use crate::{
    error::NeedError,
    models::need::{Category, CreateNeedRequest, Need, NewNeed, ParseCategoryError, canonical_city},
    services::guard::{is_owner, require_owner, require_session},
    session::Session,
    store::{Store, UnvolunteerOutcome, VolunteerOutcome},
    utils::html::strip_tags,
};

/// Validates the input and stores a new open need owned by the caller.
pub async fn create_need(
    store: &dyn Store,
    session: Option<&Session>,
    input: CreateNeedRequest,
) -> Result<Need, NeedError> {
    let session = require_session(session)?;

    let mut input = input.normalized();
    input.title = strip_tags(&input.title);
    input.description = strip_tags(&input.description);
    input.validate()?;

    let category: Category = input
        .category
        .parse()
        .map_err(|e: ParseCategoryError| NeedError::ValidationFailed(e.to_string()))?;
    let city = canonical_city(&input.city)
        .ok_or_else(|| NeedError::ValidationFailed(format!("unknown city '{}'", input.city)))?;

    let new_need = NewNeed {
        user_id: session.user_id.clone(),
        title: input.title,
        description: input.description,
        category,
        city: city.to_string(),
        phone_whatsapp: input.phone_whatsapp,
    };

    let need = store.create_need(&new_need).await.map_err(|e| {
        tracing::error!("Failed to create need: {:?}", e);
        NeedError::from(e)
    })?;

    tracing::info!(need_id = %need.id, user_id = %need.user_id, "need created");
    Ok(need)
}

/// Records the caller as a volunteer. Returns the need's new volunteer count.
///
/// Owners cannot volunteer for their own need.
pub async fn volunteer_for_need(
    store: &dyn Store,
    session: Option<&Session>,
    need_id: &str,
) -> Result<i32, NeedError> {
    let session = require_session(session)?;

    let need = store
        .find_need(need_id)
        .await?
        .ok_or(NeedError::NeedNotFound)?;

    if is_owner(Some(session), &need) {
        return Err(NeedError::OwnNeed);
    }

    let outcome = store
        .add_volunteer(need_id, &session.user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to add volunteer: {:?}", e);
            NeedError::from(e)
        })?;

    match outcome {
        VolunteerOutcome::Added { volunteer_count } => {
            tracing::info!(need_id, user_id = %session.user_id, volunteer_count, "volunteer added");
            Ok(volunteer_count)
        }
        VolunteerOutcome::NeedMissing => Err(NeedError::NeedNotFound),
        VolunteerOutcome::NeedResolved => Err(NeedError::NeedResolved),
        VolunteerOutcome::AlreadyVolunteered => Err(NeedError::AlreadyVolunteered),
    }
}

/// Withdraws the caller's volunteering. Returns the need's new volunteer count.
pub async fn unvolunteer_for_need(
    store: &dyn Store,
    session: Option<&Session>,
    need_id: &str,
) -> Result<i32, NeedError> {
    let session = require_session(session)?;

    let outcome = store
        .remove_volunteer(need_id, &session.user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to remove volunteer: {:?}", e);
            NeedError::from(e)
        })?;

    match outcome {
        UnvolunteerOutcome::Removed { volunteer_count } => {
            tracing::info!(need_id, user_id = %session.user_id, volunteer_count, "volunteer removed");
            Ok(volunteer_count)
        }
        UnvolunteerOutcome::NotVolunteered => Err(NeedError::NotVolunteered),
    }
}

/// Marks the need resolved. Resolving twice is a no-op success.
pub async fn resolve_need(
    store: &dyn Store,
    session: Option<&Session>,
    need_id: &str,
) -> Result<(), NeedError> {
    let need = owned_need(store, session, need_id).await?;

    if need.is_resolved {
        return Ok(());
    }

    // A concurrent delete can remove the row between the check and the update.
    if !store.mark_resolved(need_id).await? {
        return Err(NeedError::NeedNotFound);
    }

    tracing::info!(need_id, "need resolved");
    Ok(())
}

/// Deletes the need; its volunteer rows go with it.
pub async fn delete_need(
    store: &dyn Store,
    session: Option<&Session>,
    need_id: &str,
) -> Result<(), NeedError> {
    owned_need(store, session, need_id).await?;

    if !store.delete_need(need_id).await? {
        return Err(NeedError::NeedNotFound);
    }

    tracing::info!(need_id, "need deleted");
    Ok(())
}

/// Loads the need and checks the caller owns it.
async fn owned_need(
    store: &dyn Store,
    session: Option<&Session>,
    need_id: &str,
) -> Result<Need, NeedError> {
    require_session(session)?;

    let need = store
        .find_need(need_id)
        .await?
        .ok_or(NeedError::NeedNotFound)?;

    require_owner(session, &need)?;
    Ok(need)
}
