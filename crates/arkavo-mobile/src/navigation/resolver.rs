use super::cache::NavigationCache;
use super::strategy::{NavigationContext, find_navigation_button, strategy_for};
use super::{NavigationAction, NavigationMethod};
use crate::device::DeviceProperties;
use crate::observe::CaptureOptions;
use crate::{MobileError, Result};
use serde::Serialize;
use std::sync::Arc;

/// How a navigation request was carried out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationOutcome {
    pub action: NavigationAction,
    pub method: NavigationMethod,
    /// The method came from the cache without probing the device.
    pub from_cache: bool,
    /// Methods that were tried and failed before `method` succeeded.
    pub fallbacks: Vec<NavigationMethod>,
}

/// Picks and caches the navigation method per device.
///
/// Detection order: gesture navigation when the OS reports it, else an on-screen
/// navigation-bar button, else hardware keys. A failing gesture falls straight through
/// to hardware keys. Hardware key failures are surfaced.
pub struct NavigationResolver {
    cache: Arc<NavigationCache>,
}

impl NavigationResolver {
    pub fn new(cache: Arc<NavigationCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<NavigationCache> {
        &self.cache
    }

    pub async fn navigate(
        &self,
        ctx: &NavigationContext<'_>,
        action: NavigationAction,
    ) -> Result<NavigationOutcome> {
        let device_id = ctx.channel.device_id();

        if let Some(method) = self.cache.get(device_id, action).await {
            tracing::debug!(device = device_id, action = %action, method = %method, "navigation cache hit");
            match strategy_for(method).attempt(ctx, action).await {
                Ok(()) => {
                    return Ok(NavigationOutcome {
                        action,
                        method,
                        from_cache: true,
                        fallbacks: Vec::new(),
                    });
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        device = device_id,
                        action = %action,
                        method = %method,
                        error = %e,
                        "cached navigation method failed, re-detecting"
                    );
                    self.cache.invalidate(device_id, action).await;
                }
            }
        }

        let chain = self.detect(ctx, action).await?;
        let mut fallbacks = Vec::new();
        for method in chain {
            match strategy_for(method).attempt(ctx, action).await {
                Ok(()) => {
                    tracing::info!(device = device_id, action = %action, method = %method, "navigation method resolved");
                    self.cache.insert(device_id, action, method).await;
                    return Ok(NavigationOutcome {
                        action,
                        method,
                        from_cache: false,
                        fallbacks,
                    });
                }
                Err(e) if e.is_fatal() || method == NavigationMethod::Hardware => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        device = device_id,
                        action = %action,
                        method = %method,
                        error = %e,
                        "navigation method failed, falling back"
                    );
                    fallbacks.push(method);
                }
            }
        }

        Err(MobileError::Command(format!(
            "no navigation method succeeded for {} on {}",
            action, device_id
        )))
    }

    /// Ordered strategies to try for `action`. Always ends with hardware keys.
    async fn detect(
        &self,
        ctx: &NavigationContext<'_>,
        action: NavigationAction,
    ) -> Result<Vec<NavigationMethod>> {
        let device_id = ctx.channel.device_id();

        match DeviceProperties::query(ctx.channel).await {
            Ok(properties) if properties.gesture_navigation() => {
                tracing::debug!(
                    device = device_id,
                    os_version = %properties.os_version,
                    "gesture navigation enabled"
                );
                return Ok(vec![NavigationMethod::Gesture, NavigationMethod::Hardware]);
            }
            Ok(properties) => {
                tracing::debug!(
                    device = device_id,
                    os_version = %properties.os_version,
                    navigation_mode = ?properties.navigation_mode,
                    "gesture navigation not available"
                );
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::debug!(device = device_id, error = %e, "device properties unreadable");
            }
        }

        let button = match ctx.reader.capture(CaptureOptions::cached()).await {
            Ok(snapshot) => find_navigation_button(&snapshot, action).unwrap_or(None),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::debug!(device = device_id, error = %e, "no element tree for navigation bar lookup");
                None
            }
        };

        if button.is_some() {
            Ok(vec![NavigationMethod::Element, NavigationMethod::Hardware])
        } else {
            Ok(vec![NavigationMethod::Hardware])
        }
    }
}
