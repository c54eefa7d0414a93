// bagworks/src/services/profiles.rs
use crate::error::BagworksResult;
use crate::model::{AuthContext, CustomerPreferences, PreferencesUpdate, Profile, ProfileUpdate};
use crate::outbox::{OutboxProcessor, SideEffect};
use crate::services::notifications::admin_alerts;
use crate::store::ProfileStore;

use std::sync::Arc;
use tracing::{info, instrument};

pub struct ProfileService {
  profiles: Arc<dyn ProfileStore>,
  effects: Arc<OutboxProcessor>,
}

impl ProfileService {
  pub fn new(profiles: Arc<dyn ProfileStore>, effects: Arc<OutboxProcessor>) -> Self {
    Self { profiles, effects }
  }

  pub async fn get(&self, auth: &AuthContext) -> BagworksResult<Option<Profile>> {
    Ok(self.profiles.get_profile(auth.user_id).await?)
  }

  /// Saves the caller's profile. The first save counts as the user joining
  /// and alerts the admins.
  #[instrument(name = "ProfileService::upsert", skip_all, fields(user_id = %auth.user_id))]
  pub async fn upsert(&self, auth: &AuthContext, update: ProfileUpdate) -> BagworksResult<Profile> {
    let (profile, created) = self.profiles.upsert_profile(update.into_profile(auth.user_id)).await?;
    if created {
      info!("New customer profile.");
      self
        .effects
        .submit([SideEffect::NotifyAdmins {
          draft: admin_alerts::new_user(profile.full_name.as_deref(), profile.email.as_deref()),
        }])
        .await;
    }
    Ok(profile)
  }

  /// Empty preferences when the caller never saved any.
  pub async fn preferences(&self, auth: &AuthContext) -> BagworksResult<CustomerPreferences> {
    let stored = self.profiles.get_preferences(auth.user_id).await?;
    Ok(stored.unwrap_or_else(|| CustomerPreferences {
      user_id: auth.user_id,
      ..Default::default()
    }))
  }

  #[instrument(name = "ProfileService::save_preferences", skip_all, fields(user_id = %auth.user_id))]
  pub async fn save_preferences(
    &self,
    auth: &AuthContext,
    update: PreferencesUpdate,
  ) -> BagworksResult<CustomerPreferences> {
    let saved = self
      .profiles
      .upsert_preferences(update.into_preferences(auth.user_id))
      .await?;
    info!(
      product_types = saved.preferred_product_types.len(),
      sizes = saved.preferred_sizes.len(),
      "Preferences saved."
    );
    Ok(saved)
  }
}
