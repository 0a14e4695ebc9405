use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use crate::error::{LeaveError, LeaveResult};
use crate::model::leave_type::LeaveType;
use crate::store::LeaveStore;

/// Leave types with their workflow chain already parsed, so approvals never
/// re-split the stored definition.
pub struct LeaveTypeCache {
    store: Arc<dyn LeaveStore>,
    cache: Cache<u64, Arc<LeaveType>>,
}

impl LeaveTypeCache {
    pub fn new(store: Arc<dyn LeaveStore>, ttl: Duration) -> Self {
        Self {
            store,
            cache: Cache::builder()
                .max_capacity(1_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// An active type, as required for new requests.
    pub async fn get(&self, id: u64) -> LeaveResult<Arc<LeaveType>> {
        let leave_type = self.get_any(id).await?;
        if !leave_type.status.is_active() {
            return Err(LeaveError::not_found(format!("leave type {id}")));
        }
        Ok(leave_type)
    }

    /// The type of an existing request, retired types included.
    pub async fn get_any(&self, id: u64) -> LeaveResult<Arc<LeaveType>> {
        if let Some(leave_type) = self.cache.get(&id).await {
            return Ok(leave_type);
        }
        let leave_type = self
            .store
            .find_leave_type(id)
            .await?
            .map(Arc::new)
            .ok_or_else(|| LeaveError::not_found(format!("leave type {id}")))?;
        self.cache.insert(id, leave_type.clone()).await;
        debug!(leave_type_id = id, "Leave type cached");
        Ok(leave_type)
    }

    /// Every active type, refreshing the cache on the way.
    pub async fn active(&self) -> LeaveResult<Vec<Arc<LeaveType>>> {
        let types: Vec<_> = self
            .store
            .active_leave_types()
            .await?
            .into_iter()
            .map(Arc::new)
            .collect();
        let inserts: Vec<_> = types
            .iter()
            .map(|t| self.cache.insert(t.id, t.clone()))
            .collect();
        futures::future::join_all(inserts).await;
        Ok(types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_type::fixtures::{annual, excuse};
    use crate::model::record_status::RecordStatus;
    use crate::model::role::Role;
    use crate::store::memory::MemoryStore;

    #[actix_web::test]
    async fn serves_parsed_chain() {
        let store = Arc::new(MemoryStore::new());
        store.add_leave_type(annual(1, "MANAGER,HR"));
        let cache = LeaveTypeCache::new(store, Duration::from_secs(60));

        let leave_type = cache.get(1).await.unwrap();
        assert_eq!(leave_type.workflow.steps(), &[Role::Manager, Role::Hr]);
        assert!(Arc::ptr_eq(&leave_type, &cache.get(1).await.unwrap()));
    }

    #[actix_web::test]
    async fn unknown_type_is_not_found() {
        let cache = LeaveTypeCache::new(Arc::new(MemoryStore::new()), Duration::from_secs(60));
        assert!(matches!(cache.get(9).await, Err(LeaveError::NotFound(_))));
    }

    #[actix_web::test]
    async fn retired_type_only_resolves_for_existing_requests() {
        let store = Arc::new(MemoryStore::new());
        store.add_leave_type(LeaveType {
            status: RecordStatus::Deleted,
            ..annual(9, "MANAGER")
        });
        let cache = LeaveTypeCache::new(store, Duration::from_secs(60));

        assert!(matches!(cache.get(9).await, Err(LeaveError::NotFound(_))));
        assert_eq!(cache.get_any(9).await.unwrap().id, 9);
        // a cached retired type is still refused for new requests
        assert!(matches!(cache.get(9).await, Err(LeaveError::NotFound(_))));
    }

    #[actix_web::test]
    async fn lists_active_types_in_store_order() {
        let store = Arc::new(MemoryStore::new());
        store.add_leave_type(annual(1, "MANAGER"));
        store.add_leave_type(excuse(2));
        let cache = LeaveTypeCache::new(store, Duration::from_secs(60));

        let ids: Vec<_> = cache.active().await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(cache.get(2).await.unwrap().name, "Mazeret İzni (Saatlik)");
    }
}
