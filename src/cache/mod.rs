//! The four cache domains and the loaders that fill them.
//!
//! | domain    | key            | loader                    | sharding   |
//! |-----------|----------------|---------------------------|------------|
//! | raw       | `RawKey`       | upstream market           | per region |
//! | localized | `LocalizedKey` | enrichment pipeline       | per region |
//! | documents | `MetadataKey`  | repository `find_one`     | global     |
//! | dumps     | `MetadataKey`  | repository `find_all`     | global     |

mod loading;

pub use loading::{CacheLoader, LoadingCache};

use async_trait::async_trait;
use futures::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Settings;
use crate::db::metadata_repo::{Document, MetadataRepository, StoreError};
use crate::enrich::{self, MarketView};
use crate::error::GatewayError;
use crate::keys::{LocalizedKey, MetadataKey, RawKey};
use crate::market::{MarketResponse, MarketSource};

pub type RawCache = LoadingCache<RawKey, Arc<MarketResponse>, RawLoader>;
pub type LocalizedCache = LoadingCache<LocalizedKey, Arc<MarketView>, LocalizedLoader>;
/// `None` records that the store has no such document.
pub type DocumentCache = LoadingCache<MetadataKey, Option<Arc<Document>>, DocumentLoader>;
pub type DumpCache = LoadingCache<MetadataKey, Arc<Vec<Document>>, DumpLoader>;

/// Raw domain: one upstream call per miss.
pub struct RawLoader {
    market: Arc<dyn MarketSource>,
}

#[async_trait]
impl CacheLoader<RawKey, Arc<MarketResponse>> for RawLoader {
    async fn load(&self, key: &RawKey) -> Result<Arc<MarketResponse>, GatewayError> {
        if !key.endpoint.is_cacheable() {
            return Err(GatewayError::Internal(format!("{key} must not be cached")));
        }
        self.market.fetch(key).await.map(Arc::new)
    }
}

/// Localized domain: joins the region's raw cache with the document cache.
pub struct LocalizedLoader {
    raw: RawCache,
    documents: DocumentCache,
}

#[async_trait]
impl CacheLoader<LocalizedKey, Arc<MarketView>> for LocalizedLoader {
    async fn load(&self, key: &LocalizedKey) -> Result<Arc<MarketView>, GatewayError> {
        enrich::localize(key, &self.raw, &self.documents)
            .await
            .map(Arc::new)
    }
}

pub struct DocumentLoader {
    repo: Arc<dyn MetadataRepository>,
}

#[async_trait]
impl CacheLoader<MetadataKey, Option<Arc<Document>>> for DocumentLoader {
    async fn load(&self, key: &MetadataKey) -> Result<Option<Arc<Document>>, GatewayError> {
        match self.repo.find_one(&key.collection, &key.query).await {
            Ok(doc) => Ok(Some(Arc::new(doc))),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

pub struct DumpLoader {
    repo: Arc<dyn MetadataRepository>,
}

#[async_trait]
impl CacheLoader<MetadataKey, Arc<Vec<Document>>> for DumpLoader {
    async fn load(&self, key: &MetadataKey) -> Result<Arc<Vec<Document>>, GatewayError> {
        log::info!("loading full collection {}", key.collection);
        self.repo
            .find_all(&key.collection)
            .await
            .map(Arc::new)
            .map_err(Into::into)
    }
}

/// Owns every cache domain. Built once at startup.
pub struct CacheManager {
    raw: HashMap<String, RawCache>,
    localized: HashMap<String, LocalizedCache>,
    documents: DocumentCache,
    dumps: DumpCache,
}

impl CacheManager {
    pub fn new(
        settings: &Settings,
        market: Arc<dyn MarketSource>,
        repo: Arc<dyn MetadataRepository>,
    ) -> Self {
        let documents = DocumentCache::new(
            "ITEM_DB",
            settings.metadata_cache,
            DocumentLoader {
                repo: Arc::clone(&repo),
            },
        );
        let dumps = DumpCache::new("FULL_ITEM_DB", settings.dump_cache, DumpLoader { repo });

        let mut raw = HashMap::new();
        let mut localized = HashMap::new();
        for region in settings.regions.codes() {
            let tag = region.to_uppercase();
            let raw_cache = RawCache::new(
                &format!("{tag}_RAW"),
                settings.raw_cache,
                RawLoader {
                    market: Arc::clone(&market),
                },
            );
            let localized_cache = LocalizedCache::new(
                &format!("{tag}_LOCALIZED"),
                settings.localized_cache,
                LocalizedLoader {
                    raw: raw_cache.clone(),
                    documents: documents.clone(),
                },
            );
            raw.insert(region.to_owned(), raw_cache);
            localized.insert(region.to_owned(), localized_cache);
        }

        Self {
            raw,
            localized,
            documents,
            dumps,
        }
    }

    pub fn raw(&self, region: &str) -> Result<&RawCache, GatewayError> {
        self.raw
            .get(&region.to_lowercase())
            .ok_or_else(|| GatewayError::InvalidRegion(region.to_owned()))
    }

    pub fn localized(&self, region: &str) -> Result<&LocalizedCache, GatewayError> {
        self.localized
            .get(&region.to_lowercase())
            .ok_or_else(|| GatewayError::InvalidRegion(region.to_owned()))
    }

    pub fn documents(&self) -> &DocumentCache {
        &self.documents
    }

    pub fn dumps(&self) -> &DumpCache {
        &self.dumps
    }

    /// Load every listed collection into the dump domain; succeeds only
    /// when all of them loaded.
    pub async fn warm_dumps(&self, collections: &[String]) -> Result<(), GatewayError> {
        try_join_all(collections.iter().map(|c| {
            let key = MetadataKey::collection(c.clone());
            async move { self.dumps.get(&key).await }
        }))
        .await?;
        log::info!("warmed {} collections", collections.len());
        Ok(())
    }

    pub async fn clear_dumps(&self) {
        self.dumps.invalidate_all().await;
        log::info!("cleared {}", self.dumps.name());
    }
}
