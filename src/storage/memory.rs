//! Memory storage
//!
//! Will be destroyed on system shutdown

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::links::ShortLink;

use super::CreateLinkValues;
use super::Error;
use super::Result;
use super::Storage;
use super::UpdateLinkValues;

/// An in-memory storage
///
/// Will be destroyed on system shutdown
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// All links in storage, keyed by code
    links: Arc<Mutex<HashMap<String, ShortLink>>>,
}

impl Memory {
    /// Create a new empty Memory storage
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for Memory {
    async fn try_insert_link(&self, values: &CreateLinkValues<'_>) -> Result<ShortLink> {
        let mut links = self.links.lock().await;

        match links.entry(values.code.to_string()) {
            Entry::Occupied(_) => Err(Error::Collision(values.code.to_string())),
            Entry::Vacant(entry) => {
                let now = Utc::now();

                let link = ShortLink {
                    code: values.code.to_string(),
                    original_url: values.original_url.to_string(),
                    owner_id: values.owner_id.copied(),
                    click_count: 0,
                    is_active: true,
                    expires_at: values.expires_at.copied(),
                    created_at: now,
                    updated_at: now,
                };

                Ok(entry.insert(link).clone())
            }
        }
    }

    async fn find_single_link_by_code(&self, code: &str) -> Result<Option<ShortLink>> {
        Ok(self.links.lock().await.get(code).cloned())
    }

    async fn find_all_links_by_owner(&self, owner_id: &Uuid) -> Result<Vec<ShortLink>> {
        let mut links = self
            .links
            .lock()
            .await
            .values()
            .filter(|link| link.owner_id.as_ref() == Some(owner_id) && link.is_active)
            .cloned()
            .collect::<Vec<ShortLink>>();

        links.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.code.cmp(&a.code))
        });

        Ok(links)
    }

    async fn increment_click_count(&self, code: &str) -> Result<u64> {
        self.links
            .lock()
            .await
            .get_mut(code)
            .map(|link| {
                link.click_count += 1;

                link.click_count
            })
            .ok_or_else(|| Error::NotFound(code.to_string()))
    }

    async fn update_link(&self, code: &str, values: &UpdateLinkValues<'_>) -> Result<ShortLink> {
        self.links
            .lock()
            .await
            .get_mut(code)
            .map(|link| {
                if let Some(original_url) = values.original_url {
                    link.original_url = original_url.to_string();
                }

                if let Some(is_active) = values.is_active {
                    link.is_active = is_active;
                }

                if let Some(expires_at) = values.expires_at {
                    link.expires_at = expires_at.copied();
                }

                link.updated_at = Utc::now();

                link.clone()
            })
            .ok_or_else(|| Error::NotFound(code.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn values<'a>(code: &'a str, owner_id: Option<&'a Uuid>) -> CreateLinkValues<'a> {
        CreateLinkValues {
            code,
            original_url: "https://example.com/",
            owner_id,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_try_insert_and_find() {
        let storage = Memory::new();

        let link = storage
            .try_insert_link(&values("abc123", None))
            .await
            .unwrap();
        assert_eq!(link.code, "abc123");
        assert_eq!(link.click_count, 0);
        assert!(link.is_active);

        let found = storage.find_single_link_by_code("abc123").await.unwrap();
        assert_eq!(Some(link), found);

        let missing = storage.find_single_link_by_code("nope").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_try_insert_collision_keeps_original() {
        let storage = Memory::new();

        storage
            .try_insert_link(&values("abc123", None))
            .await
            .unwrap();

        let other = CreateLinkValues {
            original_url: "https://other.example.com/",
            ..values("abc123", None)
        };
        let err = storage.try_insert_link(&other).await.unwrap_err();
        assert!(matches!(err, Error::Collision(code) if code == "abc123"));

        let found = storage
            .find_single_link_by_code("abc123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.original_url, "https://example.com/");
    }

    #[tokio::test]
    async fn test_try_insert_collision_with_inactive() {
        let storage = Memory::new();

        storage
            .try_insert_link(&values("abc123", None))
            .await
            .unwrap();

        let deactivate = UpdateLinkValues {
            is_active: Some(false),
            ..UpdateLinkValues::default()
        };
        storage.update_link("abc123", &deactivate).await.unwrap();

        let err = storage
            .try_insert_link(&values("abc123", None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Collision(_)));
    }

    #[tokio::test]
    async fn test_concurrent_try_insert_same_code() {
        let storage = Memory::new();

        let handles = (0..20)
            .map(|_| {
                let storage = storage.clone();
                tokio::spawn(async move { storage.try_insert_link(&values("race", None)).await })
            })
            .collect::<Vec<_>>();

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 1);
    }

    #[tokio::test]
    async fn test_increment_click_count() {
        let storage = Memory::new();

        storage
            .try_insert_link(&values("abc123", None))
            .await
            .unwrap();

        assert_eq!(storage.increment_click_count("abc123").await.unwrap(), 1);
        assert_eq!(storage.increment_click_count("abc123").await.unwrap(), 2);

        let err = storage.increment_click_count("nope").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_link() {
        let storage = Memory::new();
        let expires_at = Utc::now() + Duration::days(1);

        let link = storage
            .try_insert_link(&values("abc123", None))
            .await
            .unwrap();

        let update = UpdateLinkValues {
            original_url: Some("https://updated.example.com/"),
            expires_at: Some(Some(&expires_at)),
            ..UpdateLinkValues::default()
        };
        let updated = storage.update_link("abc123", &update).await.unwrap();
        assert_eq!(updated.original_url, "https://updated.example.com/");
        assert_eq!(updated.expires_at, Some(expires_at));
        assert_eq!(updated.created_at, link.created_at);
        assert_eq!(updated.click_count, 0);
        assert!(updated.is_active);

        let clear = UpdateLinkValues {
            expires_at: Some(None),
            ..UpdateLinkValues::default()
        };
        let cleared = storage.update_link("abc123", &clear).await.unwrap();
        assert_eq!(cleared.expires_at, None);
        assert_eq!(cleared.original_url, "https://updated.example.com/");

        let err = storage
            .update_link("nope", &UpdateLinkValues::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_all_links_by_owner() {
        let storage = Memory::new();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        storage
            .try_insert_link(&values("first", Some(&owner)))
            .await
            .unwrap();
        storage
            .try_insert_link(&values("second", Some(&owner)))
            .await
            .unwrap();
        storage
            .try_insert_link(&values("third", Some(&owner)))
            .await
            .unwrap();
        storage
            .try_insert_link(&values("theirs", Some(&other)))
            .await
            .unwrap();
        storage
            .try_insert_link(&values("anonymous", None))
            .await
            .unwrap();

        let deactivate = UpdateLinkValues {
            is_active: Some(false),
            ..UpdateLinkValues::default()
        };
        storage.update_link("second", &deactivate).await.unwrap();

        let links = storage.find_all_links_by_owner(&owner).await.unwrap();
        let codes = links
            .iter()
            .map(|link| link.code.as_str())
            .collect::<Vec<&str>>();

        assert_eq!(codes, ["third", "first"]);
    }

    #[tokio::test]
    async fn test_find_all_links_by_owner_created_at_same_moment() {
        let storage = Memory::new();
        let owner = Uuid::new_v4();

        for code in ["aaa", "ccc", "bbb"] {
            storage
                .try_insert_link(&values(code, Some(&owner)))
                .await
                .unwrap();
        }

        let now = Utc::now();
        for link in storage.links.lock().await.values_mut() {
            link.created_at = now;
        }

        let codes = storage
            .find_all_links_by_owner(&owner)
            .await
            .unwrap()
            .into_iter()
            .map(|link| link.code)
            .collect::<Vec<String>>();

        assert_eq!(codes, ["ccc", "bbb", "aaa"]);
    }
}
