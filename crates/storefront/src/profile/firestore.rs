//! [`ProfileStore`] over the Firestore REST API.

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use vogue_core::UserId;

use super::{
    AuthenticatedUser, ProfileField, ProfileStore, ProfileStoreError, USERS_COLLECTION,
    UserProfile,
};
use crate::firestore::{FirestoreClient, FirestoreError, value};

impl ProfileStore for FirestoreClient {
    async fn fetch_profile(&self, user: &UserId) -> Result<Option<UserProfile>, ProfileStoreError> {
        let Some(document) = self.get_document(USERS_COLLECTION, user.as_str()).await? else {
            return Ok(None);
        };
        Ok(Some(UserProfile::from_fields(document.fields)?))
    }

    async fn profile_exists(&self, user: &UserId) -> Result<bool, ProfileStoreError> {
        Ok(self
            .get_document(USERS_COLLECTION, user.as_str())
            .await?
            .is_some())
    }

    async fn create_profile(&self, user: &AuthenticatedUser) -> Result<(), ProfileStoreError> {
        let now = Utc::now();
        let mut fields = value::encode_fields(&user.new_profile_fields(now));
        fields.insert("createdAt".to_string(), value::timestamp(now));

        match self
            .create_document(USERS_COLLECTION, Some(user.id.as_str()), fields)
            .await
        {
            Ok(_) => Ok(()),
            Err(FirestoreError::Api { status: 409, .. }) => {
                debug!(user_id = %user.id, "Profile already exists");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_field(
        &self,
        user: &UserId,
        field: ProfileField,
        value: &Value,
    ) -> Result<(), ProfileStoreError> {
        FirestoreClient::update_field(self, USERS_COLLECTION, user.as_str(), field.as_str(), value)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    ProfileStoreError::NotFound(user.clone())
                } else {
                    e.into()
                }
            })
    }
}
