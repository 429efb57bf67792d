use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serenity::{all::ComponentInteraction, client::Cache, http::Http};
use tokio::sync::RwLock;

use crate::commands::CommandArguments;

pub type DynComponent = Arc<dyn Component + Send + Sync>;

/// Separates the registered id from the action in a component's custom id, as in
/// `"<id>:<action>"`.
pub const ID_SEPARATOR: char = ':';

#[async_trait]
pub trait Component {
    /// Runs whenever Discord sends a component interaction whose custom id starts with
    /// the ID registered for this [`Component`] on insertion.
    async fn run(&self, interaction: ComponentInteraction, args: CommandArguments) -> anyhow::Result<()>;
    /// Runs whenever the the [`Component`] is removed from the map after its timeout or
    /// after evoking [`ComponentMap::timeout`] with the ID matching that registered for
    /// this [`Component`] on insertion. By default it's a no-op.
    #[allow(unused_variables)]
    async fn cleanup(&self, id: String, http: Arc<Http>, cache: Arc<Cache>) -> anyhow::Result<()> { Ok(()) }
}

/// Splits `"<id>:<action>"` into its parts. Ids without an action have an empty one.
pub fn split_custom_id(custom_id: &str) -> (&str, &str) {
    custom_id.split_once(ID_SEPARATOR).unwrap_or((custom_id, ""))
}

struct ComponentInner {
    component_map: RwLock<HashMap<String, (DynComponent, DateTime<Utc>)>>,
    watching:      AtomicBool,
}

impl ComponentInner {
    #[inline]
    fn new() -> Self {
        Self {
            component_map: RwLock::new(HashMap::new()),
            watching:      AtomicBool::new(false),
        }
    }

    async fn insert(&self, id: String, f: DynComponent, timeout_duration: Option<Duration>) {
        let when = Utc::now() + timeout_duration.unwrap_or(Duration::minutes(5));
        let _ = self.component_map.write().await.insert(id, (f, when));
    }

    async fn get(&self, id: &str) -> Option<DynComponent> {
        let lock = self.component_map.read().await;
        lock.get(id).map(|(f, _)| f.clone())
    }
}

#[derive(Clone)]
pub struct ComponentMap {
    inner: Arc<ComponentInner>,
}

impl ComponentMap {
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ComponentInner::new()),
        }
    }

    // Schedule an id for removal on the watcher's next pass.
    pub async fn timeout(&self, id: &str) -> anyhow::Result<()> {
        let mut component_map = self.inner.component_map.write().await;
        let (_, timeout) = component_map
            .get_mut(id)
            .context(format!("'{id}' wasn't found in the component map"))?;
        *timeout = Utc::now();
        Ok(())
    }

    /// Removes the expired components, running their cleanup. Returns how many were
    /// removed.
    pub async fn sweep(&self, http: Arc<Http>, cache: Arc<Cache>) -> usize {
        let now = Utc::now();

        let kill_list = {
            let map = self.inner.component_map.read().await;
            map.iter()
                .filter(|(_, (_, time))| *time <= now)
                .map(|(id, _)| id.clone())
                .collect::<Vec<_>>()
        };

        let mut removed = 0;
        for id in kill_list {
            let entry = self.inner.component_map.write().await.remove(&id);
            if let Some((f, _)) = entry {
                tracing::debug!("Removed component listener: {id}");
                removed += 1;
                if let Err(e) = f.cleanup(id.clone(), http.clone(), cache.clone()).await {
                    tracing::error!("Couldn't clean up component \"{id}\": {e}");
                }
            }
        }

        removed
    }

    pub async fn timeout_watcher(&self, http: Arc<Http>, cache: Arc<Cache>) {
        loop {
            self.sweep(http.clone(), cache.clone()).await;
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        }
    }

    /// True for the first caller only, across every clone of this map.
    pub fn claim_watcher(&self) -> bool { !self.inner.watching.swap(true, Ordering::SeqCst) }

    /// Starts [`Self::timeout_watcher`] unless it already runs. Returns whether it was
    /// started.
    pub fn spawn_timeout_watcher(&self, http: Arc<Http>, cache: Arc<Cache>) -> bool {
        if !self.claim_watcher() {
            return false;
        }
        let map = self.clone();
        tokio::spawn(async move { map.timeout_watcher(http, cache).await });
        true
    }

    #[inline]
    pub async fn insert(&self, id: String, f: DynComponent, timeout_duration: Option<Duration>) {
        self.inner.insert(id, f, timeout_duration).await;
    }

    pub async fn contains(&self, id: &str) -> bool { self.inner.component_map.read().await.contains_key(id) }

    // Returns `None` if there's nothing ran
    pub async fn run(
        &self,
        custom_id: &str,
        interaction: ComponentInteraction,
        args: CommandArguments,
    ) -> Option<anyhow::Result<()>> {
        let (id, _) = split_custom_id(custom_id);
        // The lock isn't held while the component runs so it may time itself out.
        let f = self.inner.get(id).await?;
        Some(f.run(interaction, args).await)
    }
}

impl Default for ComponentMap {
    fn default() -> Self { Self::new() }
}
