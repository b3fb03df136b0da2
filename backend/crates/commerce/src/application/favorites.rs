//! Favorites Ledger

use std::collections::HashMap;
use std::sync::Arc;

use kernel::id::BuyerId;

use crate::domain::entity::{Favorite, FavoriteEntry, SortOrder};
use crate::domain::value_object::ProfileId;
use crate::domain::{CommerceStore, ProfileStore};
use crate::error::{CommerceError, CommerceResult};

pub struct FavoritesLedger<S, P>
where
    S: CommerceStore,
    P: ProfileStore + Send + Sync + 'static,
{
    repo: Arc<S>,
    profiles: Arc<P>,
}

impl<S, P> Clone for FavoritesLedger<S, P>
where
    S: CommerceStore,
    P: ProfileStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            profiles: self.profiles.clone(),
        }
    }
}

impl<S, P> FavoritesLedger<S, P>
where
    S: CommerceStore,
    P: ProfileStore + Send + Sync + 'static,
{
    pub fn new(repo: Arc<S>, profiles: Arc<P>) -> Self {
        Self { repo, profiles }
    }

    /// Upsert; adding twice is a no-op returning the original row
    pub async fn add(&self, buyer_id: BuyerId, profile_id: ProfileId) -> CommerceResult<Favorite> {
        let exists = self
            .profiles
            .get_profile(profile_id)
            .await?
            .is_some_and(|p| p.is_approved);
        if !exists {
            return Err(CommerceError::ProfileNotFound(profile_id));
        }

        let favorite = self
            .repo
            .upsert_favorite(&Favorite::new(buyer_id, profile_id))
            .await?;
        tracing::debug!(buyer_id = %buyer_id, profile_id = %profile_id, "Favorite saved");
        Ok(favorite)
    }

    /// Idempotent
    pub async fn remove(&self, buyer_id: BuyerId, profile_id: ProfileId) -> CommerceResult<()> {
        if self.repo.delete_favorite(&buyer_id, profile_id).await? {
            tracing::debug!(buyer_id = %buyer_id, profile_id = %profile_id, "Favorite removed");
        }
        Ok(())
    }

    /// Favorites joined with profile summaries; favorites whose profile is
    /// gone from the catalog are left out
    pub async fn list(&self, buyer_id: BuyerId, order: SortOrder) -> CommerceResult<Vec<FavoriteEntry>> {
        let favorites = self.repo.list_favorites(&buyer_id, order).await?;
        let ids: Vec<ProfileId> = favorites.iter().map(|f| f.profile_id).collect();

        let mut summaries: HashMap<ProfileId, _> = self
            .profiles
            .get_profile_summaries(&ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        Ok(favorites
            .into_iter()
            .filter_map(|favorite| {
                summaries
                    .remove(&favorite.profile_id)
                    .map(|profile| FavoriteEntry { favorite, profile })
            })
            .collect())
    }
}
