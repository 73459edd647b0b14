// src/services/queries.rs

//! Read side: need listings, need details and the user's dashboard.

use std::collections::HashMap;

use url::Url;

use crate::{
    error::NeedError,
    models::{
        need::{Category, DashboardStats, NeedAuthorRow, NeedDetail, NeedFilter, NeedListParams, NeedListing},
        volunteer::VolunteerInfo,
    },
    services::guard::{is_owner, is_volunteer, require_session},
    session::Session,
    store::Store,
};

/// Turns raw query parameters into a filter; an unknown category is a validation failure.
pub fn filter_from_params(params: NeedListParams) -> Result<NeedFilter, NeedError> {
    let category = params
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| c.parse::<Category>())
        .transpose()
        .map_err(|e| NeedError::ValidationFailed(e.to_string()))?;

    let city = params
        .city
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    Ok(NeedFilter {
        city,
        category,
        resolved: params.resolved,
    })
}

/// Needs matching the filter, newest first, each with author and volunteers.
pub async fn list_needs(store: &dyn Store, filter: &NeedFilter) -> Result<Vec<NeedListing>, NeedError> {
    let rows = store.list_needs(filter).await?;
    attach_volunteers(store, rows).await
}

/// One need with author, volunteers and the viewer's relation to it.
pub async fn get_need(
    store: &dyn Store,
    session: Option<&Session>,
    need_id: &str,
    public_base_url: &str,
) -> Result<NeedDetail, NeedError> {
    let row = store
        .find_need_with_author(need_id)
        .await?
        .ok_or(NeedError::NeedNotFound)?;

    let volunteers = store.volunteers_for(&[row.need.id.clone()]).await?;
    let listing = row.into_listing(volunteers);

    Ok(NeedDetail {
        is_owner: is_owner(session, &listing.need),
        has_volunteered: is_volunteer(session, &listing.volunteers),
        share_url: share_url(public_base_url, &listing.need.id),
        listing,
    })
}

/// Needs created by the caller, open and resolved.
pub async fn my_needs(store: &dyn Store, session: Option<&Session>) -> Result<Vec<NeedListing>, NeedError> {
    let session = require_session(session)?;
    let rows = store.needs_by_owner(&session.user_id).await?;
    attach_volunteers(store, rows).await
}

/// Needs the caller volunteered for.
pub async fn my_volunteering(
    store: &dyn Store,
    session: Option<&Session>,
) -> Result<Vec<NeedListing>, NeedError> {
    let session = require_session(session)?;
    let rows = store.needs_volunteered_by(&session.user_id).await?;
    attach_volunteers(store, rows).await
}

pub async fn dashboard_stats(store: &dyn Store, session: Option<&Session>) -> Result<DashboardStats, NeedError> {
    let session = require_session(session)?;
    let owned = store.needs_by_owner(&session.user_id).await?;
    let volunteered = store.needs_volunteered_by(&session.user_id).await?;

    let resolved = |rows: &[NeedAuthorRow]| rows.iter().filter(|r| r.need.is_resolved).count();
    let owned_resolved = resolved(&owned);
    let volunteered_resolved = resolved(&volunteered);

    Ok(DashboardStats {
        active_needs: owned.len() - owned_resolved,
        active_commitments: volunteered.len() - volunteered_resolved,
        completed: owned_resolved + volunteered_resolved,
    })
}

/// Public link to the need's page, or `None` when the base URL is unusable.
pub fn share_url(public_base_url: &str, need_id: &str) -> Option<String> {
    let mut base = Url::parse(public_base_url).ok()?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(&format!("needs/{need_id}")).ok().map(String::from)
}

/// Loads volunteers for all rows in one query and groups them per need.
async fn attach_volunteers(
    store: &dyn Store,
    rows: Vec<NeedAuthorRow>,
) -> Result<Vec<NeedListing>, NeedError> {
    let ids: Vec<String> = rows.iter().map(|r| r.need.id.clone()).collect();

    let mut by_need: HashMap<String, Vec<VolunteerInfo>> = HashMap::new();
    for volunteer in store.volunteers_for(&ids).await? {
        by_need.entry(volunteer.volunteer.need_id.clone()).or_default().push(volunteer);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let volunteers = by_need.remove(&row.need.id).unwrap_or_default();
            row.into_listing(volunteers)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_parses_category_and_trims_city() {
        let filter = filter_from_params(NeedListParams {
            city: Some("  rabat ".into()),
            category: Some("Food".into()),
            resolved: None,
        })
        .unwrap();
        assert_eq!(filter.city.as_deref(), Some("rabat"));
        assert_eq!(filter.category, Some(Category::Food));
        assert_eq!(filter.resolved, None);
    }

    #[test]
    fn filter_rejects_unknown_category() {
        let err = filter_from_params(NeedListParams {
            category: Some("astrology".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.code(), "validation_failed");
    }

    #[test]
    fn blank_filter_values_are_ignored() {
        let filter = filter_from_params(NeedListParams {
            city: Some(" ".into()),
            category: Some("".into()),
            resolved: Some(true),
        })
        .unwrap();
        assert!(filter.city.is_none());
        assert!(filter.category.is_none());
        assert_eq!(filter.resolved, Some(true));
    }

    #[test]
    fn share_url_joins_base_and_id() {
        assert_eq!(
            share_url("https://dirkhir.ma", "abc").as_deref(),
            Some("https://dirkhir.ma/needs/abc")
        );
        assert_eq!(
            share_url("https://dirkhir.ma/app", "abc").as_deref(),
            Some("https://dirkhir.ma/app/needs/abc")
        );
        assert_eq!(share_url("not a url", "abc"), None);
    }
}
