use chrono::{DateTime, Utc};
use kernel::id::{BuyerId, FavoriteId};

use crate::domain::entity::profile::ProfileSummary;
use crate::domain::value_object::ProfileId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Favorite {
    pub favorite_id: FavoriteId,
    pub buyer_id: BuyerId,
    pub profile_id: ProfileId,
    pub created_at: DateTime<Utc>,
}

impl Favorite {
    pub fn new(buyer_id: BuyerId, profile_id: ProfileId) -> Self {
        Self {
            favorite_id: FavoriteId::new(),
            buyer_id,
            profile_id,
            created_at: Utc::now(),
        }
    }
}

/// Favorite joined with the profile it points at
#[derive(Debug, Clone)]
pub struct FavoriteEntry {
    pub favorite: Favorite,
    pub profile: ProfileSummary,
}

/// Listing order by favorite creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }
}
