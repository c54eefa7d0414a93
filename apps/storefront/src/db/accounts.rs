// storefront/src/db/accounts.rs

use super::rows::{PreferencesRow, ProfileRow, RoleRow, UpsertedProfileRow, PREFERENCES_COLUMNS, PROFILE_COLUMNS};
use super::PgStore;

use anyhow::Result;
use async_trait::async_trait;
use bagworks::store::{ProfileStore, RoleDirectory};
use bagworks::{CustomerPreferences, Profile, Role};
use uuid::Uuid;

#[async_trait]
impl ProfileStore for PgStore {
  async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
    let query = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1");
    let row = sqlx::query_as::<_, ProfileRow>(&query)
      .bind(user_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row.map(Profile::from))
  }

  async fn upsert_profile(&self, profile: Profile) -> Result<(Profile, bool)> {
    // xmax is zero only on rows the INSERT branch produced.
    let query = format!(
      "INSERT INTO profiles \
         (id, email, full_name, business_name, business_type, gst_number, phone, address, city, state, pincode) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
       ON CONFLICT (id) DO UPDATE SET \
         email = EXCLUDED.email, full_name = EXCLUDED.full_name, \
         business_name = EXCLUDED.business_name, business_type = EXCLUDED.business_type, \
         gst_number = EXCLUDED.gst_number, phone = EXCLUDED.phone, address = EXCLUDED.address, \
         city = EXCLUDED.city, state = EXCLUDED.state, pincode = EXCLUDED.pincode, updated_at = NOW() \
       RETURNING {PROFILE_COLUMNS}, (xmax = 0) AS created"
    );
    let row = sqlx::query_as::<_, UpsertedProfileRow>(&query)
      .bind(profile.id)
      .bind(&profile.email)
      .bind(&profile.full_name)
      .bind(&profile.business_name)
      .bind(&profile.business_type)
      .bind(&profile.gst_number)
      .bind(&profile.phone)
      .bind(&profile.address)
      .bind(&profile.city)
      .bind(&profile.state)
      .bind(&profile.pincode)
      .fetch_one(&self.pool)
      .await?;
    Ok((row.profile.into(), row.created))
  }

  async fn list_profiles(&self) -> Result<Vec<Profile>> {
    let query = format!("SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY created_at, id");
    let rows = sqlx::query_as::<_, ProfileRow>(&query).fetch_all(&self.pool).await?;
    Ok(rows.into_iter().map(Profile::from).collect())
  }

  async fn count_profiles(&self) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM profiles")
      .fetch_one(&self.pool)
      .await?;
    Ok(count)
  }

  async fn get_preferences(&self, user_id: Uuid) -> Result<Option<CustomerPreferences>> {
    let query = format!("SELECT {PREFERENCES_COLUMNS} FROM customer_preferences WHERE user_id = $1");
    let row = sqlx::query_as::<_, PreferencesRow>(&query)
      .bind(user_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row.map(CustomerPreferences::from))
  }

  async fn upsert_preferences(&self, preferences: CustomerPreferences) -> Result<CustomerPreferences> {
    let query = format!(
      "INSERT INTO customer_preferences (user_id, preferred_product_types, preferred_sizes, notes) \
       VALUES ($1, $2, $3, $4) \
       ON CONFLICT (user_id) DO UPDATE SET \
         preferred_product_types = EXCLUDED.preferred_product_types, \
         preferred_sizes = EXCLUDED.preferred_sizes, \
         notes = EXCLUDED.notes, updated_at = NOW() \
       RETURNING {PREFERENCES_COLUMNS}"
    );
    let row = sqlx::query_as::<_, PreferencesRow>(&query)
      .bind(preferences.user_id)
      .bind(&preferences.preferred_product_types)
      .bind(&preferences.preferred_sizes)
      .bind(&preferences.notes)
      .fetch_one(&self.pool)
      .await?;
    Ok(row.into())
  }
}

#[async_trait]
impl RoleDirectory for PgStore {
  async fn roles_for(&self, user_id: Uuid) -> Result<Vec<Role>> {
    let rows = sqlx::query_as::<_, RoleRow>("SELECT role FROM user_roles WHERE user_id = $1 ORDER BY granted_at")
      .bind(user_id)
      .fetch_all(&self.pool)
      .await?;
    Ok(rows.iter().filter_map(RoleRow::role).collect())
  }

  async fn admin_ids(&self) -> Result<Vec<Uuid>> {
    let ids = sqlx::query_scalar::<_, Uuid>(
      "SELECT user_id FROM user_roles WHERE lower(role) = 'admin' ORDER BY granted_at, user_id",
    )
    .fetch_all(&self.pool)
    .await?;
    Ok(ids)
  }
}
