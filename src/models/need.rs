// src/models/need.rs

use std::{fmt, str::FromStr, sync::LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use crate::models::volunteer::VolunteerInfo;

/// Loose phone pattern: optional leading '+', then digits, spaces, dashes, parentheses.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s\-\(\)]+$").expect("valid phone regex"));

/// Cities a need can be posted in.
pub const CITIES: [&str; 15] = [
    "Tangier",
    "Tetouan",
    "Fez",
    "Meknes",
    "Rabat",
    "Casablanca",
    "Marrakech",
    "Agadir",
    "Essaouira",
    "Laayoune",
    "Oujda",
    "Kenitra",
    "Safi",
    "El Jadida",
    "Nador",
];

/// Returns the canonical spelling of a supported city, matching case-insensitively.
pub fn canonical_city(input: &str) -> Option<&'static str> {
    let input = input.trim();
    CITIES
        .iter()
        .copied()
        .find(|city| city.eq_ignore_ascii_case(input))
}

/// Kind of help being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Education,
    Cleaning,
    Financial,
    Health,
    Food,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Education,
        Category::Cleaning,
        Category::Financial,
        Category::Health,
        Category::Food,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Education => "education",
            Category::Cleaning => "cleaning",
            Category::Financial => "financial",
            Category::Health => "health",
            Category::Food => "food",
            Category::Other => "other",
        }
    }

    /// Display label shown by the site.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Education => "Éducation",
            Category::Cleaning => "Nettoyage",
            Category::Financial => "Aide financière",
            Category::Health => "Santé",
            Category::Food => "Nourriture",
            Category::Other => "Autre",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{0}'")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

impl TryFrom<String> for Category {
    type Error = ParseCategoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Represents the 'needs' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Need {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    #[sqlx(try_from = "String")]
    pub category: Category,
    pub city: String,
    #[serde(rename = "phoneWhatsApp")]
    pub phone_whatsapp: Option<String>,

    /// Denormalized count of `need_volunteers` rows for this need.
    pub volunteer_count: i32,
    pub is_resolved: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated values for inserting a need.
#[derive(Debug, Clone)]
pub struct NewNeed {
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub city: String,
    pub phone_whatsapp: Option<String>,
}

fn validate_category(category: &str) -> Result<(), ValidationError> {
    category
        .parse::<Category>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("category").with_message("Please select a valid category".into()))
}

fn validate_city(city: &str) -> Result<(), ValidationError> {
    canonical_city(city)
        .map(|_| ())
        .ok_or_else(|| ValidationError::new("city").with_message("Please select a valid city".into()))
}

/// DTO for creating a new need.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNeedRequest {
    #[validate(length(
        min = 5,
        max = 100,
        message = "Title must be between 5 and 100 characters"
    ))]
    pub title: String,

    #[validate(length(
        min = 20,
        max = 500,
        message = "Description must be between 20 and 500 characters"
    ))]
    pub description: String,

    #[validate(custom(function = validate_category))]
    pub category: String,

    #[validate(custom(function = validate_city))]
    pub city: String,

    #[serde(default, rename = "phoneWhatsApp")]
    #[validate(
        length(max = 20, message = "Phone number is too long"),
        regex(path = *PHONE_RE, message = "Please enter a valid phone number")
    )]
    pub phone_whatsapp: Option<String>,
}

impl CreateNeedRequest {
    /// Trims text fields and turns a blank phone number into `None`.
    pub fn normalized(self) -> Self {
        let phone_whatsapp = self
            .phone_whatsapp
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        Self {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category.trim().to_lowercase(),
            city: self.city.trim().to_string(),
            phone_whatsapp,
        }
    }
}

/// Filter for the need listing.
#[derive(Debug, Clone, Default)]
pub struct NeedFilter {
    /// Exact, case-insensitive city match.
    pub city: Option<String>,
    pub category: Option<Category>,
    /// `None` and `Some(false)` list open needs, `Some(true)` lists resolved ones.
    pub resolved: Option<bool>,
}

/// Query parameters for listing needs.
#[derive(Debug, Default, Deserialize)]
pub struct NeedListParams {
    pub city: Option<String>,
    pub category: Option<String>,
    pub resolved: Option<bool>,
}

/// Public profile of a need's author.
#[derive(Debug, Clone, Serialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub username: String,
}

/// Need row joined with its author's profile.
#[derive(Debug, Clone, FromRow)]
pub struct NeedAuthorRow {
    #[sqlx(flatten)]
    pub need: Need,
    pub author_name: String,
    pub author_username: String,
}

impl NeedAuthorRow {
    pub fn into_listing(self, volunteers: Vec<VolunteerInfo>) -> NeedListing {
        let author = Author {
            id: self.need.user_id.clone(),
            name: self.author_name,
            username: self.author_username,
        };
        NeedListing {
            need: self.need,
            author,
            volunteers,
        }
    }
}

/// A need as shown in listings: the row, its author and its volunteers.
#[derive(Debug, Clone, Serialize)]
pub struct NeedListing {
    #[serde(flatten)]
    pub need: Need,
    pub author: Author,
    pub volunteers: Vec<VolunteerInfo>,
}

/// A need as shown on its detail page, with flags for the current viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedDetail {
    #[serde(flatten)]
    pub listing: NeedListing,
    pub is_owner: bool,
    pub has_volunteered: bool,
    pub share_url: Option<String>,
}

/// Counters shown on the user's dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Open needs owned by the user.
    pub active_needs: usize,
    /// Open needs the user volunteered for.
    pub active_commitments: usize,
    /// Resolved needs, owned or volunteered.
    pub completed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateNeedRequest {
        CreateNeedRequest {
            title: "Groceries for my neighbour".into(),
            description: "Weekly shopping for an elderly neighbour who cannot walk far.".into(),
            category: "food".into(),
            city: "rabat".into(),
            phone_whatsapp: Some("+212 6 12-34-56".into()),
        }
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("Health".parse::<Category>(), Ok(Category::Health));
        assert!("transportation".parse::<Category>().is_err());
    }

    #[test]
    fn city_lookup_returns_canonical_name() {
        assert_eq!(canonical_city("el jadida"), Some("El Jadida"));
        assert_eq!(canonical_city("Paris"), None);
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().normalized().validate().is_ok());
    }

    #[test]
    fn blank_phone_is_absent() {
        let req = CreateNeedRequest {
            phone_whatsapp: Some("   ".into()),
            ..request()
        }
        .normalized();
        assert_eq!(req.phone_whatsapp, None);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn rejects_bad_phone_and_short_title() {
        let req = CreateNeedRequest {
            title: "Hey".into(),
            phone_whatsapp: Some("call me".into()),
            ..request()
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("phone_whatsapp"));
    }

    #[test]
    fn rejects_unknown_category_and_city() {
        let req = CreateNeedRequest {
            category: "petcare".into(),
            city: "Lyon".into(),
            ..request()
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("category"));
        assert!(fields.contains_key("city"));
    }
}
