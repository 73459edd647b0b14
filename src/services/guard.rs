// src/services/guard.rs

//! Authorization predicates over the optional request session.

use crate::{
    error::NeedError,
    models::{need::Need, volunteer::VolunteerInfo},
    session::Session,
};

/// A session counts only when it names a user.
pub fn is_authenticated(session: Option<&Session>) -> bool {
    session.is_some_and(|s| !s.user_id.is_empty())
}

/// True iff the session belongs to the need's owner.
pub fn is_owner(session: Option<&Session>, need: &Need) -> bool {
    session.is_some_and(|s| s.user_id == need.user_id)
}

/// True iff the session's user is among the volunteers.
pub fn is_volunteer(session: Option<&Session>, volunteers: &[VolunteerInfo]) -> bool {
    session.is_some_and(|s| volunteers.iter().any(|v| v.volunteer.user_id == s.user_id))
}

pub fn require_session(session: Option<&Session>) -> Result<&Session, NeedError> {
    session
        .filter(|_| is_authenticated(session))
        .ok_or(NeedError::Unauthenticated)
}

/// Anonymous callers get `Unauthenticated`, other users `Unauthorized`.
pub fn require_owner(session: Option<&Session>, need: &Need) -> Result<(), NeedError> {
    require_session(session)?;
    if is_owner(session, need) {
        Ok(())
    } else {
        Err(NeedError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::{need::Category, volunteer::NeedVolunteer};

    fn session(user_id: &str) -> Session {
        Session {
            user_id: user_id.into(),
            name: "Test".into(),
            email: format!("{user_id}@example.com"),
            role: "member".into(),
        }
    }

    fn need(owner: &str) -> Need {
        Need {
            id: "need-1".into(),
            user_id: owner.into(),
            title: "Help moving boxes".into(),
            description: "Two hours of help carrying boxes downstairs.".into(),
            category: Category::Other,
            city: "Fez".into(),
            phone_whatsapp: None,
            volunteer_count: 0,
            is_resolved: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn owner_check_matches_user_id() {
        let need = need("u1");
        assert!(is_owner(Some(&session("u1")), &need));
        assert!(!is_owner(Some(&session("u2")), &need));
        assert!(!is_owner(None, &need));
    }

    #[test]
    fn require_owner_distinguishes_anonymous_from_stranger() {
        let need = need("u1");
        assert_eq!(require_owner(None, &need), Err(NeedError::Unauthenticated));
        assert_eq!(require_owner(Some(&session("u2")), &need), Err(NeedError::Unauthorized));
        assert_eq!(require_owner(Some(&session("u1")), &need), Ok(()));
    }

    #[test]
    fn volunteer_check_scans_the_list() {
        let volunteers = vec![VolunteerInfo {
            volunteer: NeedVolunteer {
                id: "v1".into(),
                need_id: "need-1".into(),
                user_id: "u2".into(),
                created_at: Utc::now(),
            },
            name: "Volunteer".into(),
            username: "helper".into(),
        }];
        assert!(is_volunteer(Some(&session("u2")), &volunteers));
        assert!(!is_volunteer(Some(&session("u3")), &volunteers));
        assert!(!is_volunteer(None, &volunteers));
    }

    #[test]
    fn session_without_user_id_is_anonymous() {
        assert!(is_authenticated(Some(&session("u3"))));
        assert!(!is_authenticated(Some(&session(""))));
        assert!(!is_authenticated(None));
        assert_eq!(require_session(Some(&session(""))), Err(NeedError::Unauthenticated));
        assert_eq!(require_owner(Some(&session("")), &need("")), Err(NeedError::Unauthenticated));
    }
}
