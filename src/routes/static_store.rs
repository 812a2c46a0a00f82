//! Routes enumerated from the configuration file

use std::collections::HashMap;

use async_trait::async_trait;

use super::{Route, RouteError, RouteStore};
use crate::config::ImageFolder;

/// In-memory route table, read-only after startup
#[derive(Debug, Default)]
pub struct StaticRouteStore {
    routes: HashMap<String, Route>,
}

impl StaticRouteStore {
    /// Build the table from configured image folders
    pub fn new(folders: &[ImageFolder]) -> Self {
        let routes = folders
            .iter()
            .map(|f| {
                let route = Route {
                    name: f.route.clone(),
                    directory: f.directory.clone(),
                    accepts_uploads: f.accepts_uploads,
                    all_random: f.all_random,
                };
                (route.name.clone(), route)
            })
            .collect();

        Self { routes }
    }

    /// Get a route by name
    pub fn get(&self, name: &str) -> Option<&Route> {
        self.routes.get(name)
    }

    /// Routes contributing to the combined random pool, sorted by name
    pub fn all_random(&self) -> Vec<Route> {
        let mut routes: Vec<Route> = self
            .routes
            .values()
            .filter(|r| r.all_random)
            .cloned()
            .collect();
        routes.sort_by(|a, b| a.name.cmp(&b.name));
        routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[async_trait]
impl RouteStore for StaticRouteStore {
    async fn resolve(&self, name: &str) -> Result<Option<Route>, RouteError> {
        Ok(self.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn folder(route: &str, all_random: bool, accepts_uploads: bool) -> ImageFolder {
        ImageFolder {
            directory: PathBuf::from(format!("/srv/{}", route)),
            route: route.to_string(),
            all_random,
            accepts_uploads,
        }
    }

    #[tokio::test]
    async fn test_resolve_configured_route() {
        let store = StaticRouteStore::new(&[folder("cats", false, true)]);

        let route = store.resolve("cats").await.unwrap().unwrap();
        assert_eq!(route.directory, PathBuf::from("/srv/cats"));
        assert!(route.accepts_uploads);
        assert!(!route.all_random);
    }

    #[tokio::test]
    async fn test_resolve_unknown_route() {
        let store = StaticRouteStore::new(&[folder("cats", false, false)]);
        assert_eq!(store.resolve("nonexistent-route").await.unwrap(), None);
    }

    #[test]
    fn test_all_random_filter() {
        let store = StaticRouteStore::new(&[
            folder("dogs", true, false),
            folder("cats", false, false),
            folder("birds", true, false),
        ]);

        let names: Vec<_> = store.all_random().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["birds", "dogs"]);
        assert_eq!(store.len(), 3);
    }
}
