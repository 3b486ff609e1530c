use crate::error::FunctionError;
use crate::metrics;
use crate::store::{validate_segment, DocumentPath, DocumentStore, Fields};
use crate::types::*;
use std::sync::Arc;

pub const UNAUTHENTICATED_MESSAGE: &str = "User is not authenticated";

/// Creates a house and makes the caller its first administrator.
pub struct HouseHandler {
    store: Arc<dyn DocumentStore>,
    house_id: HouseIdStrategy,
}

impl HouseHandler {
    pub fn new(store: Arc<dyn DocumentStore>, house_id: HouseIdStrategy) -> Self {
        Self { store, house_id }
    }

    /// Writes the house document, then the caller's admin grant under it.
    ///
    /// The two writes are not atomic: if the grant fails, the house stays.
    pub async fn generate_my_house(&self, auth: &AuthContext) -> Result<HouseCreated, FunctionError> {
        let Some(user_id) = auth.caller_id.as_deref() else {
            metrics::increment_unauthenticated();
            return Err(FunctionError::unauthenticated(UNAUTHENTICATED_MESSAGE));
        };

        let result = self.create_house(user_id).await;
        match &result {
            Ok(created) => {
                metrics::increment_house_created();
                tracing::info!(
                    house_doc_id = %created.house_doc_id,
                    admin_user = %created.admin_user,
                    "House document has been created: ID = {}, admin user = {}",
                    created.house_doc_id,
                    created.admin_user
                );
            }
            Err(_) => metrics::increment_house_create_failed(),
        }
        result
    }

    async fn create_house(&self, user_id: &str) -> Result<HouseCreated, FunctionError> {
        // Reject ids that cannot be a document id before anything is written.
        validate_segment(user_id)?;
        let permissions = DocumentPath::collection(PERMISSIONS_COLLECTION)?;

        let house = match &self.house_id {
            HouseIdStrategy::Fixed(id) => {
                let house = permissions.document(id)?;
                self.store.set(&house, Fields::new()).await?;
                house
            }
            HouseIdStrategy::Generated => self.store.add(&permissions, Fields::new()).await?,
        };

        let admin = house.subcollection(ADMIN_COLLECTION)?.document(user_id)?;
        self.store.set(&admin, Fields::new()).await?;

        Ok(HouseCreated {
            house_doc_id: house.id().to_string(),
            admin_user: user_id.to_string(),
        })
    }
}
