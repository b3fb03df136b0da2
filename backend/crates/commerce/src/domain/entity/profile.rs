//! Catalog profile as seen by checkout and fulfillment

use serde::{Deserialize, Serialize};

use crate::domain::value_object::ProfileId;

/// One private contact channel of a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMethod {
    /// e.g. `phone`, `email`, `line`
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub id: ProfileId,
    pub display_name: String,
    /// Minor currency units
    pub price: i64,
    pub is_approved: bool,
    pub contact_methods: Vec<ContactMethod>,
}

impl Profile {
    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            id: self.id,
            display_name: self.display_name.clone(),
            price: self.price,
            is_approved: self.is_approved,
        }
    }
}

/// Public part of a profile; never carries contact data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub id: ProfileId,
    pub display_name: String,
    pub price: i64,
    pub is_approved: bool,
}
