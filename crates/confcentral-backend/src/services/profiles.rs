use std::sync::Arc;

use confcentral::data::{ProfileForm, ProfileMiniForm, StringMessage};
use confcentral::errors::ServiceError;
use confcentral::id::SessionKey;
use confcentral::log;

use crate::auth::{Caller, Identity};
use crate::mapping::{apply_profile_form, profile_to_form};
use crate::models::Profile;
use crate::store::Datastore;

pub const EMPTY_WISHLIST: &str = "You have no items in your wishlist.";

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn Datastore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { store }
    }

    /// Returns the caller's profile, creating it on first access.
    pub async fn profile_for(&self, identity: &Identity) -> Result<Profile, ServiceError> {
        if let Some(profile) = self.store.get_profile(&identity.user_id).await? {
            return Ok(profile);
        }
        log::info!("Creating profile for user {}", identity.user_id);
        self.store.get_or_insert_profile(Profile::new(identity)).await
    }

    pub async fn get_profile(&self, caller: &Caller) -> Result<ProfileForm, ServiceError> {
        let profile = self.profile_for(caller.require()?).await?;
        Ok(profile_to_form(&profile))
    }

    pub async fn save_profile(
        &self,
        caller: &Caller,
        form: ProfileMiniForm,
    ) -> Result<ProfileForm, ServiceError> {
        let identity = caller.require()?;
        self.profile_for(identity).await?;

        let profile = self
            .store
            .update_profile(
                &identity.user_id,
                Box::new(move |profile: &mut Profile| -> Result<(), ServiceError> {
                    apply_profile_form(profile, &form);
                    Ok(())
                }),
            )
            .await?;
        Ok(profile_to_form(&profile))
    }

    pub async fn add_to_wishlist(
        &self,
        caller: &Caller,
        session: SessionKey,
    ) -> Result<ProfileForm, ServiceError> {
        let identity = caller.require()?;
        self.profile_for(identity).await?;

        let profile = self
            .store
            .update_profile(
                &identity.user_id,
                Box::new(move |profile: &mut Profile| -> Result<(), ServiceError> {
                    if profile.session_keys_wishlist.contains(&session) {
                        return Err(ServiceError::BadRequest(
                            "This item is already in your wishlist.".to_string(),
                        ));
                    }
                    profile.session_keys_wishlist.push(session);
                    Ok(())
                }),
            )
            .await?;
        Ok(profile_to_form(&profile))
    }

    pub async fn remove_from_wishlist(
        &self,
        caller: &Caller,
        session: SessionKey,
    ) -> Result<ProfileForm, ServiceError> {
        let identity = caller.require()?;
        self.profile_for(identity).await?;

        let profile = self
            .store
            .update_profile(
                &identity.user_id,
                Box::new(move |profile: &mut Profile| -> Result<(), ServiceError> {
                    let Some(position) = profile
                        .session_keys_wishlist
                        .iter()
                        .position(|key| key == &session)
                    else {
                        return Err(ServiceError::BadRequest(
                            "Unable to delete because this item was not in your wishlist."
                                .to_string(),
                        ));
                    };
                    profile.session_keys_wishlist.remove(position);
                    Ok(())
                }),
            )
            .await?;
        Ok(profile_to_form(&profile))
    }

    pub async fn wishlist(&self, caller: &Caller) -> Result<StringMessage, ServiceError> {
        let profile = self.profile_for(caller.require()?).await?;
        if profile.session_keys_wishlist.is_empty() {
            return Ok(StringMessage::new(EMPTY_WISHLIST));
        }

        let keys: Vec<&str> = profile
            .session_keys_wishlist
            .iter()
            .map(SessionKey::as_str)
            .collect();
        Ok(StringMessage::new(keys.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{Harness, caller};
    use confcentral::data::TeeShirtSize;

    #[tokio::test]
    async fn profiles_are_created_lazily() {
        let harness = Harness::new();
        let form = harness.profiles.get_profile(&caller("ferris")).await.unwrap();
        assert_eq!(form.display_name, "ferris");
        assert_eq!(form.main_email, "ferris@example.com");
        assert_eq!(form.tee_shirt_size, TeeShirtSize::NotSpecified);

        let err = harness.profiles.get_profile(&Caller::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthenticated));
    }

    #[tokio::test]
    async fn save_profile_patches_present_fields() {
        let harness = Harness::new();
        let form = harness
            .profiles
            .save_profile(
                &caller("ferris"),
                ProfileMiniForm {
                    display_name: Some("Ferris the Crab".to_string()),
                    tee_shirt_size: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(form.display_name, "Ferris the Crab");

        let form = harness
            .profiles
            .save_profile(
                &caller("ferris"),
                ProfileMiniForm {
                    display_name: None,
                    tee_shirt_size: Some(TeeShirtSize::MW),
                },
            )
            .await
            .unwrap();
        assert_eq!(form.display_name, "Ferris the Crab");
        assert_eq!(form.tee_shirt_size, TeeShirtSize::MW);
    }

    #[tokio::test]
    async fn wishlist_rejects_duplicates_and_unknown_removals() {
        let harness = Harness::new();
        let ferris = caller("ferris");
        let key = SessionKey::from("s1");

        assert_eq!(harness.profiles.wishlist(&ferris).await.unwrap().data, EMPTY_WISHLIST);

        let form = harness.profiles.add_to_wishlist(&ferris, key.clone()).await.unwrap();
        assert_eq!(form.session_keys_wishlist, vec![key.clone()]);
        let err = harness
            .profiles
            .add_to_wishlist(&ferris, key.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));

        harness
            .profiles
            .add_to_wishlist(&ferris, SessionKey::from("s2"))
            .await
            .unwrap();
        assert_eq!(harness.profiles.wishlist(&ferris).await.unwrap().data, "s1, s2");

        let form = harness.profiles.remove_from_wishlist(&ferris, key.clone()).await.unwrap();
        assert_eq!(form.session_keys_wishlist, vec![SessionKey::from("s2")]);
        let err = harness
            .profiles
            .remove_from_wishlist(&ferris, key)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
        assert_eq!(harness.profiles.wishlist(&ferris).await.unwrap().data, "s2");
    }
}
