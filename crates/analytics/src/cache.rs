use crate::forecast::TrendModel;
use chrono::Utc;
use core_types::UserId;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

/// A best-effort store of the most recently fitted model per user.
///
/// Implementations may drop entries at any time. Readers must treat a miss as
/// "refit", which always gives the same answer.
pub trait ModelCache: Send + Sync {
    fn get(&self, user_id: UserId) -> Option<TrendModel>;
    fn put(&self, user_id: UserId, model: TrendModel);
    fn evict(&self, user_id: UserId);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An in-process [`ModelCache`] with a fixed capacity and a maximum entry age.
///
/// When full, the entry trained longest ago is evicted first. A poisoned lock
/// behaves like an empty cache.
///
/// Nothing reads it back yet: [`crate::Forecaster::forecast_for_user`] always
/// refits and only writes the fresh model here.
#[derive(Debug)]
pub struct BoundedModelCache {
    capacity: usize,
    max_age: Duration,
    entries: RwLock<HashMap<UserId, TrendModel>>,
}

impl BoundedModelCache {
    pub fn new(capacity: usize, max_age: Duration) -> Self {
        Self {
            capacity,
            max_age,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn is_fresh(&self, model: &TrendModel) -> bool {
        match (Utc::now() - model.trained_at).to_std() {
            Ok(age) => age <= self.max_age,
            // Trained "in the future" (clock skew): keep it.
            Err(_) => true,
        }
    }
}

impl ModelCache for BoundedModelCache {
    fn get(&self, user_id: UserId) -> Option<TrendModel> {
        let entries = self.entries.read().ok()?;
        entries
            .get(&user_id)
            .filter(|model| self.is_fresh(model))
            .cloned()
    }

    fn put(&self, user_id: UserId, model: TrendModel) {
        if self.capacity == 0 {
            return;
        }
        let Ok(mut entries) = self.entries.write() else {
            tracing::warn!(user_id, "Model cache lock poisoned; skipping insert.");
            return;
        };
        entries.insert(user_id, model);

        while entries.len() > self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, m)| m.trained_at)
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    entries.remove(&id);
                    tracing::debug!(evicted_user_id = id, "Evicted oldest cached model.");
                }
                None => break,
            }
        }
    }

    fn evict(&self, user_id: UserId) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(&user_id);
        }
    }

    fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }
}
