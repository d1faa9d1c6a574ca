use std::sync::Arc;

use models::{
    AppKey, AppTree, ComponentKey, ComponentVersions, EnvKey, EnvironmentTree, APPS_SET,
};
use tracing::{debug, instrument, warn};

use crate::errors::ServiceError;
use crate::storage::KvBackend;

/// Validated environment write: the environment plus its component versions.
struct EnvWrite<'a> {
    key: EnvKey,
    components: Vec<(ComponentKey, &'a str)>,
}

struct AppWrite<'a> {
    key: AppKey,
    envs: Vec<EnvWrite<'a>>,
}

fn plan_env<'a>(key: EnvKey, components: &'a ComponentVersions) -> Result<EnvWrite<'a>, ServiceError> {
    let components = components
        .iter()
        .map(|(name, version)| -> Result<_, ServiceError> {
            Ok((key.component(name.as_str())?, version.as_str()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(EnvWrite { key, components })
}

fn plan_app<'a>(key: AppKey, envs: &'a EnvironmentTree) -> Result<AppWrite<'a>, ServiceError> {
    let envs = envs
        .iter()
        .map(|(env, components)| plan_env(key.env(env.as_str())?, components))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AppWrite { key, envs })
}

/// Reads and writes of the version tree, composed from backend primitives.
///
/// Writes check every name of the payload before the first backend call. The
/// backend calls of one write are not atomic: a concurrent reader can observe
/// a component in its environment set before its version is stored.
#[derive(Clone)]
pub struct VersionService {
    store: Arc<dyn KvBackend>,
}

impl VersionService {
    pub fn new(store: Arc<dyn KvBackend>) -> Self { Self { store } }

    // Reads never reject a name: one that cannot address a node (empty, or
    // the reserved root set name) can hold nothing, so it reads as empty.

    /// Version of one component; `None` when it was never written.
    pub async fn get_version(&self, app: &str, env: &str, component: &str) -> Result<Option<String>, ServiceError> {
        match ComponentKey::new(app, env, component) {
            Ok(key) => self.read_version(&key).await,
            Err(e) => {
                debug!(error = %e, "unaddressable component reads as absent");
                Ok(None)
            }
        }
    }

    /// Components of one environment with their versions.
    pub async fn get_environment(&self, app: &str, env: &str) -> Result<ComponentVersions, ServiceError> {
        match EnvKey::new(app, env) {
            Ok(key) => self.read_environment(&key).await,
            Err(e) => {
                debug!(error = %e, "unaddressable environment reads as empty");
                Ok(ComponentVersions::new())
            }
        }
    }

    /// Environments of one app; an unknown app yields an empty map.
    pub async fn get_app(&self, app: &str) -> Result<EnvironmentTree, ServiceError> {
        match AppKey::new(app) {
            Ok(key) => self.read_app(&key).await,
            Err(e) => {
                debug!(error = %e, "unaddressable app reads as empty");
                Ok(EnvironmentTree::new())
            }
        }
    }

    /// The whole tree, materialized in memory.
    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<AppTree, ServiceError> {
        let mut tree = AppTree::new();
        for app in self.store.list_members(APPS_SET).await? {
            let key = match AppKey::new(app.as_str()) {
                Ok(k) => k,
                Err(e) => {
                    warn!(%app, error = %e, "skipping unaddressable app member");
                    continue;
                }
            };
            let envs = self.read_app(&key).await?;
            tree.insert(app, envs);
        }
        Ok(tree)
    }

    pub async fn set_component(&self, app: &str, env: &str, component: &str, version: &str) -> Result<(), ServiceError> {
        let key = ComponentKey::new(app, env, component)?;
        self.write_component(&key, version).await
    }

    /// Register `env` under `app` and store every component version.
    pub async fn set_environment(&self, app: &str, env: &str, components: &ComponentVersions) -> Result<(), ServiceError> {
        let plan = plan_env(EnvKey::new(app, env)?, components)?;
        self.write_environment(&plan).await
    }

    /// Register `app` and write each of its environments.
    pub async fn set_app(&self, app: &str, envs: &EnvironmentTree) -> Result<(), ServiceError> {
        let plan = plan_app(AppKey::new(app)?, envs)?;
        self.write_app(&plan).await
    }

    /// Write several environments of `app` without registering `app` itself
    /// in the root set.
    pub async fn set_environments(&self, app: &str, envs: &EnvironmentTree) -> Result<(), ServiceError> {
        let plan = plan_app(AppKey::new(app)?, envs)?;
        for env in &plan.envs {
            self.write_environment(env).await?;
        }
        Ok(())
    }

    /// Write several components of one environment without registering the
    /// environment in its app's set.
    pub async fn set_components(&self, app: &str, env: &str, components: &ComponentVersions) -> Result<(), ServiceError> {
        let plan = plan_env(EnvKey::new(app, env)?, components)?;
        for (key, version) in &plan.components {
            self.write_component(key, version).await?;
        }
        Ok(())
    }

    /// Write a full tree payload, app by app.
    #[instrument(skip(self, tree), fields(apps = tree.len()))]
    pub async fn set_all(&self, tree: &AppTree) -> Result<(), ServiceError> {
        let plans = tree
            .iter()
            .map(|(app, envs)| plan_app(AppKey::new(app.as_str())?, envs))
            .collect::<Result<Vec<_>, _>>()?;
        for plan in &plans {
            self.write_app(plan).await?;
        }
        Ok(())
    }

    async fn read_version(&self, key: &ComponentKey) -> Result<Option<String>, ServiceError> {
        debug!(key = %key, "read version");
        Ok(self.store.get_value(&key.value_key()).await?)
    }

    async fn read_environment(&self, key: &EnvKey) -> Result<ComponentVersions, ServiceError> {
        let mut versions = ComponentVersions::new();
        for component in self.store.list_members(&key.set_key()).await? {
            let ck = match key.component(component.as_str()) {
                Ok(k) => k,
                Err(e) => {
                    warn!(env = %key, %component, error = %e, "skipping unaddressable component member");
                    continue;
                }
            };
            // membership without a stored version (interrupted write) reads as ""
            let version = self.read_version(&ck).await?.unwrap_or_default();
            versions.insert(component, version);
        }
        Ok(versions)
    }

    async fn read_app(&self, key: &AppKey) -> Result<EnvironmentTree, ServiceError> {
        let mut envs = EnvironmentTree::new();
        for env in self.store.list_members(&key.set_key()).await? {
            let ek = match key.env(env.as_str()) {
                Ok(k) => k,
                Err(e) => {
                    warn!(app = %key, %env, error = %e, "skipping unaddressable environment member");
                    continue;
                }
            };
            let components = self.read_environment(&ek).await?;
            envs.insert(env, components);
        }
        Ok(envs)
    }

    async fn write_component(&self, key: &ComponentKey, version: &str) -> Result<(), ServiceError> {
        debug!(key = %key, version, "write component");
        self.store.add_member(&key.env().set_key(), key.name()).await?;
        self.store.set_value(&key.value_key(), version).await?;
        Ok(())
    }

    async fn write_environment(&self, plan: &EnvWrite<'_>) -> Result<(), ServiceError> {
        debug!(env = %plan.key, components = plan.components.len(), "write environment");
        self.store.add_member(&plan.key.app().set_key(), plan.key.name()).await?;
        for (key, version) in &plan.components {
            self.write_component(key, version).await?;
        }
        Ok(())
    }

    async fn write_app(&self, plan: &AppWrite<'_>) -> Result<(), ServiceError> {
        debug!(app = %plan.key, envs = plan.envs.len(), "write app");
        self.store.add_member(APPS_SET, plan.key.name()).await?;
        for env in &plan.envs {
            self.write_environment(env).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn service() -> (VersionService, MemoryStore) {
        let store = MemoryStore::new();
        (VersionService::new(Arc::new(store.clone())), store)
    }

    fn components(pairs: &[(&str, &str)]) -> ComponentVersions {
        pairs.iter().map(|(c, v)| (c.to_string(), v.to_string())).collect()
    }

    #[tokio::test]
    async fn set_then_get_component() -> Result<(), anyhow::Error> {
        let (svc, _) = service();
        svc.set_component("app", "env", "api", "1.2.3").await?;
        assert_eq!(svc.get_version("app", "env", "api").await?.as_deref(), Some("1.2.3"));
        // setting a component registers the component only, not the env or app
        assert!(svc.get_app("app").await?.is_empty());
        assert_eq!(svc.get_environment("app", "env").await?, components(&[("api", "1.2.3")]));
        Ok(())
    }

    #[tokio::test]
    async fn repeated_set_is_idempotent() -> Result<(), anyhow::Error> {
        let (svc, store) = service();
        svc.set_component("app", "env", "api", "1.0").await?;
        svc.set_component("app", "env", "api", "1.0").await?;
        assert_eq!(svc.get_version("app", "env", "api").await?.as_deref(), Some("1.0"));
        assert_eq!(store.list_members("app:env").await?, vec!["api"]);
        Ok(())
    }

    #[tokio::test]
    async fn empty_backend_reads_empty() -> Result<(), anyhow::Error> {
        let (svc, _) = service();
        assert!(svc.get_all().await?.is_empty());
        assert!(svc.get_app("nonexistent-app").await?.is_empty());
        assert!(svc.get_environment("app", "env").await?.is_empty());
        assert_eq!(svc.get_version("app", "env", "missing").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn missing_and_empty_versions_are_distinct() -> Result<(), anyhow::Error> {
        let (svc, _) = service();
        svc.set_component("app", "env", "blank", "").await?;
        assert_eq!(svc.get_version("app", "env", "blank").await?, Some(String::new()));
        assert_eq!(svc.get_version("app", "env", "other").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn full_tree_roundtrip() -> Result<(), anyhow::Error> {
        let (svc, _) = service();
        let tree: AppTree = [(
            "svcA".to_string(),
            [("prod".to_string(), components(&[("api", "1.0.0"), ("db", "2.0.0")]))].into(),
        )]
        .into();
        svc.set_all(&tree).await?;

        assert_eq!(svc.get_all().await?, tree);
        assert_eq!(svc.get_app("svcA").await?, tree["svcA"]);
        assert_eq!(svc.get_version("svcA", "prod", "api").await?.as_deref(), Some("1.0.0"));
        Ok(())
    }

    #[tokio::test]
    async fn environment_without_components_exists() -> Result<(), anyhow::Error> {
        let (svc, _) = service();
        svc.set_app("svc", &[("staging".to_string(), ComponentVersions::new())].into()).await?;
        let app = svc.get_app("svc").await?;
        assert_eq!(app.len(), 1);
        assert!(app["staging"].is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn invalid_name_writes_nothing() -> Result<(), anyhow::Error> {
        let (svc, store) = service();
        let envs: EnvironmentTree = [
            ("prod".to_string(), components(&[("api", "1.0")])),
            ("staging".to_string(), components(&[("", "2.0")])),
        ]
        .into();
        let err = svc.set_app("svc", &envs).await.unwrap_err();
        assert!(matches!(err, ServiceError::Model(_)));
        assert!(store.is_empty().await);

        assert!(svc.set_app(APPS_SET, &EnvironmentTree::new()).await.is_err());
        assert!(store.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn unaddressable_names_read_empty() -> Result<(), anyhow::Error> {
        let (svc, _) = service();
        let envs: EnvironmentTree = [("prod".to_string(), components(&[("api", "1")]))].into();
        svc.set_app("svc", &envs).await?;
        // the root set holds app names, never environments
        assert!(svc.get_app(APPS_SET).await?.is_empty());
        assert!(svc.get_environment(APPS_SET, "svc").await?.is_empty());
        assert!(svc.get_environment("svc", "").await?.is_empty());
        assert_eq!(svc.get_version("svc", "", "api").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn names_with_separator_stay_apart() -> Result<(), anyhow::Error> {
        let (svc, _) = service();
        svc.set_component("a:b", "c", "d", "left").await?;
        svc.set_component("a", "b:c", "d", "right").await?;
        assert_eq!(svc.get_version("a:b", "c", "d").await?.as_deref(), Some("left"));
        assert_eq!(svc.get_version("a", "b:c", "d").await?.as_deref(), Some("right"));
        Ok(())
    }

    #[tokio::test]
    async fn partial_writes_register_only_below_their_level() -> Result<(), anyhow::Error> {
        let (svc, _) = service();
        svc.set_environments("svc", &[("prod".to_string(), components(&[("api", "3")]))].into()).await?;
        assert!(svc.get_all().await?.is_empty());
        assert_eq!(svc.get_app("svc").await?["prod"], components(&[("api", "3")]));

        svc.set_components("svc", "qa", &components(&[("web", "4")])).await?;
        assert!(!svc.get_app("svc").await?.contains_key("qa"));
        assert_eq!(svc.get_environment("svc", "qa").await?, components(&[("web", "4")]));
        Ok(())
    }

    #[tokio::test]
    async fn member_without_version_reads_empty() -> Result<(), anyhow::Error> {
        let (svc, store) = service();
        // half-finished write: membership recorded, version not yet stored
        store.add_member("app:env", "api").await?;
        assert_eq!(svc.get_environment("app", "env").await?, components(&[("api", "")]));
        Ok(())
    }

    #[tokio::test]
    async fn backend_errors_propagate() -> Result<(), anyhow::Error> {
        let (svc, store) = service();
        // "apps" holding a string makes every root read fail
        store.set_value(APPS_SET, "oops").await?;
        assert!(matches!(svc.get_all().await, Err(ServiceError::Store(_))));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_disjoint_writes_are_kept() -> Result<(), anyhow::Error> {
        let (svc, _) = service();
        let mut handles = Vec::new();
        for i in 0..8 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move {
                let comps = components(&[(format!("c{i}a").as_str(), "1"), (format!("c{i}b").as_str(), "2")]);
                svc.set_environment("app", "env", &comps).await
            }));
        }
        for h in handles {
            h.await??;
        }
        let env = svc.get_environment("app", "env").await?;
        assert_eq!(env.len(), 16);
        assert_eq!(svc.get_app("app").await?.len(), 1);
        Ok(())
    }
}
