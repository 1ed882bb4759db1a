use super::{NavigationAction, NavigationMethod};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationCacheEntry {
    pub method: NavigationMethod,
    pub resolved_at: Instant,
}

impl NavigationCacheEntry {
    pub fn is_valid(&self, duration: Duration) -> bool {
        self.resolved_at.elapsed() < duration
    }
}

/// Resolved navigation methods keyed by device id and action family.
///
/// Several engines may share one cache; entries for different devices never interact.
#[derive(Debug)]
pub struct NavigationCache {
    duration: Duration,
    entries: Mutex<HashMap<(String, NavigationAction), NavigationCacheEntry>>,
}

impl NavigationCache {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The cached method, if one was resolved within the cache window. Expired entries
    /// are dropped on the way.
    pub async fn get(&self, device_id: &str, action: NavigationAction) -> Option<NavigationMethod> {
        let mut entries = self.entries.lock().await;
        let key = (device_id.to_string(), action);
        match entries.get(&key) {
            Some(entry) if entry.is_valid(self.duration) => Some(entry.method),
            Some(_) => {
                entries.remove(&key);
                tracing::debug!(device = device_id, action = %action, "navigation cache entry expired");
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, device_id: &str, action: NavigationAction, method: NavigationMethod) {
        self.entries.lock().await.insert(
            (device_id.to_string(), action),
            NavigationCacheEntry {
                method,
                resolved_at: Instant::now(),
            },
        );
    }

    pub async fn invalidate(&self, device_id: &str, action: NavigationAction) {
        self.entries
            .lock()
            .await
            .remove(&(device_id.to_string(), action));
    }

    /// Raw entry, expired or not.
    pub async fn entry(&self, device_id: &str, action: NavigationAction) -> Option<NavigationCacheEntry> {
        self.entries
            .lock()
            .await
            .get(&(device_id.to_string(), action))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_window() {
        let cache = NavigationCache::new(Duration::from_secs(300));
        cache.insert("emulator-5554", NavigationAction::Home, NavigationMethod::Gesture).await;

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(
            cache.get("emulator-5554", NavigationAction::Home).await,
            Some(NavigationMethod::Gesture)
        );

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("emulator-5554", NavigationAction::Home).await, None);
        assert!(cache.entry("emulator-5554", NavigationAction::Home).await.is_none());
    }

    #[tokio::test]
    async fn test_keys_are_per_device_and_action() {
        let cache = NavigationCache::new(Duration::from_secs(300));
        cache.insert("a", NavigationAction::Home, NavigationMethod::Gesture).await;
        cache.insert("b", NavigationAction::Home, NavigationMethod::Hardware).await;

        assert_eq!(cache.get("a", NavigationAction::Home).await, Some(NavigationMethod::Gesture));
        assert_eq!(cache.get("b", NavigationAction::Home).await, Some(NavigationMethod::Hardware));
        assert_eq!(cache.get("a", NavigationAction::RecentApps).await, None);

        cache.invalidate("a", NavigationAction::Home).await;
        assert_eq!(cache.get("a", NavigationAction::Home).await, None);
        assert_eq!(cache.get("b", NavigationAction::Home).await, Some(NavigationMethod::Hardware));
    }
}
