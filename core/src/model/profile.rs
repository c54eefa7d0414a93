// bagworks/src/model/profile.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A customer's business profile. `id` is the user id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub id: Uuid,
  pub email: Option<String>,
  pub full_name: Option<String>,
  pub business_name: Option<String>,
  pub business_type: Option<String>,
  pub gst_number: Option<String>,
  pub phone: Option<String>,
  pub address: Option<String>,
  pub city: Option<String>,
  pub state: Option<String>,
  pub pincode: Option<String>,
}

impl Profile {
  /// Names of the fields checkout needs that are missing or blank.
  pub fn missing_checkout_fields(&self) -> Vec<&'static str> {
    let required = [
      ("business_name", &self.business_name),
      ("phone", &self.phone),
      ("address", &self.address),
    ];
    required
      .into_iter()
      .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
      .map(|(name, _)| name)
      .collect()
  }

  /// Full name, else business name. Blank values are skipped.
  pub fn display_name(&self) -> Option<&str> {
    fn present(value: &Option<String>) -> Option<&str> {
      value.as_deref().filter(|n| !n.trim().is_empty())
    }
    present(&self.full_name).or_else(|| present(&self.business_name))
  }
}

/// Fields a user may write on their own profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
  pub email: Option<String>,
  pub full_name: Option<String>,
  pub business_name: Option<String>,
  pub business_type: Option<String>,
  pub gst_number: Option<String>,
  pub phone: Option<String>,
  pub address: Option<String>,
  pub city: Option<String>,
  pub state: Option<String>,
  pub pincode: Option<String>,
}

impl ProfileUpdate {
  /// Builds the stored profile; blank strings are stored as `None`.
  pub fn into_profile(self, user_id: Uuid) -> Profile {
    fn clean(value: Option<String>) -> Option<String> {
      value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }
    Profile {
      id: user_id,
      email: clean(self.email),
      full_name: clean(self.full_name),
      business_name: clean(self.business_name),
      business_type: clean(self.business_type),
      gst_number: clean(self.gst_number),
      phone: clean(self.phone),
      address: clean(self.address),
      city: clean(self.city),
      state: clean(self.state),
      pincode: clean(self.pincode),
    }
  }
}

/// What a customer tends to order, kept so admins can tailor quotes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerPreferences {
  pub user_id: Uuid,
  pub preferred_product_types: Vec<String>,
  pub preferred_sizes: Vec<String>,
  pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PreferencesUpdate {
  #[serde(default)]
  pub preferred_product_types: Vec<String>,
  #[serde(default)]
  pub preferred_sizes: Vec<String>,
  pub notes: Option<String>,
}

impl PreferencesUpdate {
  /// Trims every entry, drops blanks and repeats, keeps the caller's order.
  pub fn into_preferences(self, user_id: Uuid) -> CustomerPreferences {
    fn tidy(values: Vec<String>) -> Vec<String> {
      let mut out: Vec<String> = Vec::with_capacity(values.len());
      for v in values {
        let v = v.trim();
        if !v.is_empty() && !out.iter().any(|seen| seen == v) {
          out.push(v.to_string());
        }
      }
      out
    }
    CustomerPreferences {
      user_id,
      preferred_product_types: tidy(self.preferred_product_types),
      preferred_sizes: tidy(self.preferred_sizes),
      notes: self.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn names_missing_checkout_fields() {
    let profile = Profile {
      business_name: Some("Acme Bags".into()),
      phone: Some("   ".into()),
      ..Default::default()
    };
    assert_eq!(profile.missing_checkout_fields(), vec!["phone", "address"]);
  }

  #[test]
  fn display_name_skips_blank_full_name() {
    let mut profile = Profile {
      full_name: Some("  ".into()),
      business_name: Some("Loom Co".into()),
      ..Default::default()
    };
    assert_eq!(profile.display_name(), Some("Loom Co"));

    profile.full_name = Some("Meera".into());
    assert_eq!(profile.display_name(), Some("Meera"));

    profile.full_name = None;
    profile.business_name = Some("".into());
    assert_eq!(profile.display_name(), None);
  }

  #[test]
  fn preferences_update_is_tidied() {
    let prefs = PreferencesUpdate {
      preferred_product_types: vec![" D Cut ".into(), "BOPP".into(), "D Cut".into(), " ".into()],
      preferred_sizes: vec!["12x15".into()],
      notes: Some("   ".into()),
    }
    .into_preferences(Uuid::nil());
    assert_eq!(prefs.preferred_product_types, vec!["D Cut", "BOPP"]);
    assert_eq!(prefs.preferred_sizes, vec!["12x15"]);
    assert_eq!(prefs.notes, None);
  }

  #[test]
  fn update_trims_blanks() {
    let profile = ProfileUpdate {
      full_name: Some("  Priya ".into()),
      city: Some("".into()),
      ..Default::default()
    }
    .into_profile(Uuid::nil());
    assert_eq!(profile.full_name.as_deref(), Some("Priya"));
    assert_eq!(profile.city, None);
  }
}
