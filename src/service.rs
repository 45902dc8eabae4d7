//! Request-level operations behind the HTTP handlers.
//!
//! Every operation validates its input before touching a cache, so a bad
//! region or language never costs an upstream call.

use futures::future::try_join_all;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cache::CacheManager;
use crate::config::{RegionRegistry, Settings};
use crate::db::metadata_repo::{Document, MetadataRepository};
use crate::enrich::{self, MarketView};
use crate::error::GatewayError;
use crate::keys::{CollectionKind, Endpoint, ItemId, LocalizedKey, MetadataKey, RawKey};
use crate::market::items::{Enriched, MissingItem, WaitListItem};
use crate::market::{parse, MarketResponse, MarketSource};

/// Language used when a request names none.
const DEFAULT_LANGUAGE: &str = "en";
/// The one region with its own default language.
const KOREAN: &str = "kr";

/// Price of one enhancement level (`/v1/{region}/price`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    pub name: Option<String>,
    pub id: i64,
    pub sid: i64,
    pub base_price: i64,
    pub icon: Option<String>,
}

/// One collection, or every language's collection keyed by name.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Dump {
    One(Arc<Vec<Document>>),
    All(BTreeMap<String, Arc<Vec<Document>>>),
}

pub struct MarketService {
    regions: RegionRegistry,
    languages: Vec<String>,
    admin_api_key: String,
    market: Arc<dyn MarketSource>,
    repo: Arc<dyn MetadataRepository>,
    caches: CacheManager,
}

impl MarketService {
    pub fn new(
        settings: &Settings,
        market: Arc<dyn MarketSource>,
        repo: Arc<dyn MetadataRepository>,
    ) -> Self {
        let caches = CacheManager::new(settings, Arc::clone(&market), Arc::clone(&repo));
        Self {
            regions: settings.regions.clone(),
            languages: settings.languages.clone(),
            admin_api_key: settings.admin_api_key.clone(),
            market,
            repo,
            caches,
        }
    }

    pub fn caches(&self) -> &CacheManager {
        &self.caches
    }

    /// Lower-cased `region` if it is configured.
    pub fn region(&self, region: &str) -> Result<String, GatewayError> {
        if self.regions.contains(region) {
            Ok(region.to_lowercase())
        } else {
            Err(GatewayError::InvalidRegion(region.to_owned()))
        }
    }

    /// Resolve the requested language for `region`: `kr` defaults to Korean,
    /// everything else to English.
    pub fn language(&self, requested: Option<&str>, region: &str) -> Result<String, GatewayError> {
        let lang = match requested {
            Some(lang) => lang.to_lowercase(),
            None if region.eq_ignore_ascii_case(KOREAN) => KOREAN.to_owned(),
            None => DEFAULT_LANGUAGE.to_owned(),
        };
        self.check_language(&lang)?;
        Ok(lang)
    }

    fn check_language(&self, lang: &str) -> Result<(), GatewayError> {
        if self.languages.iter().any(|l| l.eq_ignore_ascii_case(lang)) {
            Ok(())
        } else {
            Err(GatewayError::InvalidLanguage(lang.to_owned()))
        }
    }

    pub fn check_admin_key(&self, key: Option<&str>) -> Result<(), GatewayError> {
        match key {
            Some(key) if key == self.admin_api_key => Ok(()),
            _ => Err(GatewayError::Unauthorized),
        }
    }

    // ───────────── enriched market views ─────────────

    pub async fn hot_list(
        &self,
        region: &str,
        lang: Option<&str>,
    ) -> Result<Arc<MarketView>, GatewayError> {
        let region = self.region(region)?;
        let lang = self.language(lang, &region)?;
        let key = LocalizedKey::new(0_i64, 0, &region, Endpoint::HotList, &lang);
        self.caches.localized(&region)?.get(&key).await
    }

    pub async fn market_list(
        &self,
        region: &str,
        main_category: i64,
        sub_category: i64,
    ) -> Result<Arc<MarketView>, GatewayError> {
        let region = self.region(region)?;
        let key = LocalizedKey::neutral(main_category, sub_category, &region, Endpoint::MarketList);
        self.caches.localized(&region)?.get(&key).await
    }

    /// Every enhancement level of each item, in the order of `ids`.
    pub async fn sub_list(
        &self,
        region: &str,
        ids: &[i64],
        lang: Option<&str>,
    ) -> Result<Vec<Arc<MarketView>>, GatewayError> {
        let region = self.region(region)?;
        let lang = self.language(lang, &region)?;
        let keys = ids
            .iter()
            .map(|&id| LocalizedKey::new(id, 0, &region, Endpoint::SubList, &lang))
            .collect();
        self.localized_many(&region, keys).await
    }

    pub async fn search_list(
        &self,
        region: &str,
        ids: &[i64],
    ) -> Result<Vec<Arc<MarketView>>, GatewayError> {
        let region = self.region(region)?;
        let keys = ids
            .iter()
            .map(|id| LocalizedKey::neutral(id.to_string(), 0, &region, Endpoint::SearchList))
            .collect();
        self.localized_many(&region, keys).await
    }

    pub async fn bidding_list(
        &self,
        region: &str,
        ids: &[i64],
        sids: &[i64],
    ) -> Result<Vec<Arc<MarketView>>, GatewayError> {
        self.per_level(region, ids, sids, Endpoint::BiddingList).await
    }

    pub async fn price_info(
        &self,
        region: &str,
        ids: &[i64],
        sids: &[i64],
    ) -> Result<Vec<Arc<MarketView>>, GatewayError> {
        self.per_level(region, ids, sids, Endpoint::PriceInfo).await
    }

    async fn per_level(
        &self,
        region: &str,
        ids: &[i64],
        sids: &[i64],
        endpoint: Endpoint,
    ) -> Result<Vec<Arc<MarketView>>, GatewayError> {
        let region = self.region(region)?;
        let keys = pair(ids, sids)?
            .into_iter()
            .map(|(id, sid)| LocalizedKey::neutral(id, sid, &region, endpoint))
            .collect();
        self.localized_many(&region, keys).await
    }

    /// Items waiting to be listed. Never cached.
    pub async fn wait_list(
        &self,
        region: &str,
        lang: Option<&str>,
    ) -> Result<Vec<Enriched<WaitListItem>>, GatewayError> {
        let region = self.region(region)?;
        let lang = self.language(lang, &region)?;
        let res = self
            .market
            .fetch(&RawKey::new(0_i64, 0, &region, Endpoint::WaitList))
            .await?;
        let items = parse::records::<WaitListItem>(res.result_msg()?)?;
        enrich::enrich(items, &lang, self.caches.documents()).await
    }

    /// Name and base price of one enhancement level of an item.
    pub async fn price(
        &self,
        region: &str,
        id: i64,
        sid: i64,
        lang: Option<&str>,
    ) -> Result<PriceSummary, GatewayError> {
        let region = self.region(region)?;
        let lang = self.language(lang, &region)?;
        let key = LocalizedKey::new(id, 0, &region, Endpoint::SubList, &lang);
        let view = self.caches.localized(&region)?.get(&key).await?;

        let levels = match &*view {
            MarketView::SubList(levels) => levels,
            MarketView::Unlisted(_) if sid != 0 => {
                return Err(GatewayError::NoSubItem { id, sid })
            }
            _ => return Err(GatewayError::InvalidPriceItem { id, sid }),
        };
        if levels.len() == 1 && sid != 0 {
            return Err(GatewayError::NoSubItem { id, sid });
        }
        // No document means no name, and a nameless item has no price.
        if levels.first().and_then(Enriched::found).is_none() {
            return Err(GatewayError::InvalidPriceItem { id, sid });
        }

        levels
            .iter()
            .filter_map(Enriched::found)
            .find(|item| item.sid == sid)
            .map(|item| PriceSummary {
                name: item.name.clone(),
                id: item.id,
                sid: item.sid,
                base_price: item.base_price,
                icon: item.icon.clone(),
            })
            .ok_or(GatewayError::InvalidPriceItem { id, sid })
    }

    async fn localized_many(
        &self,
        region: &str,
        keys: Vec<LocalizedKey>,
    ) -> Result<Vec<Arc<MarketView>>, GatewayError> {
        let cache = self.caches.localized(region)?;
        try_join_all(keys.iter().map(|key| cache.get(key))).await
    }

    // ───────────── raw passthrough ─────────────

    /// Upstream responses as received, one per `(id, sid)` target. The wait
    /// list bypasses the cache.
    pub async fn raw(
        &self,
        region: &str,
        endpoint: Endpoint,
        targets: Vec<(ItemId, i64)>,
    ) -> Result<Vec<Arc<MarketResponse>>, GatewayError> {
        let region = self.region(region)?;
        let keys: Vec<RawKey> = targets
            .into_iter()
            .map(|(id, sid)| RawKey::new(id, sid, &region, endpoint))
            .collect();

        if !endpoint.is_cacheable() {
            return try_join_all(keys.iter().map(|key| async move {
                self.market.fetch(key).await.map(Arc::new)
            }))
            .await;
        }
        let cache = self.caches.raw(&region)?;
        try_join_all(keys.iter().map(|key| cache.get(key))).await
    }

    /// Raw sub lists of `ids`.
    pub async fn raw_sub_list(
        &self,
        region: &str,
        ids: &[i64],
    ) -> Result<Vec<Arc<MarketResponse>>, GatewayError> {
        let targets = ids.iter().map(|&id| (ItemId::from(id), 0)).collect();
        self.raw(region, Endpoint::SubList, targets).await
    }

    /// One raw search for all `ids`, joined with commas the way the
    /// upstream accepts them.
    pub async fn raw_search(
        &self,
        region: &str,
        ids: &[i64],
    ) -> Result<Arc<MarketResponse>, GatewayError> {
        let joined = ids
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let mut found = self
            .raw(region, Endpoint::SearchList, vec![(ItemId::from(joined), 0)])
            .await?;
        found
            .pop()
            .ok_or_else(|| GatewayError::Internal("search produced no response".into()))
    }

    pub async fn raw_per_level(
        &self,
        region: &str,
        endpoint: Endpoint,
        ids: &[i64],
        sids: &[i64],
    ) -> Result<Vec<Arc<MarketResponse>>, GatewayError> {
        let targets = pair(ids, sids)?
            .into_iter()
            .map(|(id, sid)| (ItemId::from(id), sid))
            .collect();
        self.raw(region, endpoint, targets).await
    }

    // ───────────── metadata ─────────────

    /// Documents of `ids` in the `kind` collection of `lang` (English when
    /// absent). Unknown ids become inline 452 objects.
    pub async fn documents(
        &self,
        kind: CollectionKind,
        ids: &[i64],
        lang: Option<&str>,
    ) -> Result<Vec<Value>, GatewayError> {
        let lang = match lang {
            Some(lang) => {
                self.check_language(lang)?;
                lang.to_lowercase()
            }
            None => DEFAULT_LANGUAGE.to_owned(),
        };
        if ids.is_empty() {
            return Err(GatewayError::ItemNotFound);
        }

        let collection = kind.collection(&lang);
        let documents = self.caches.documents();
        try_join_all(ids.iter().map(|&id| {
            let key = MetadataKey::item(collection.as_str(), id);
            async move {
                let doc = documents.get(&key).await?;
                Ok::<_, GatewayError>(match doc {
                    Some(doc) => (*doc).clone(),
                    None => serde_json::to_value(MissingItem::new(id, None))
                        .map_err(|e| GatewayError::Internal(e.to_string()))?,
                })
            }
        }))
        .await
    }

    /// Whole `kind` collection for `lang`, or for every configured language
    /// when `lang` is absent.
    pub async fn dump(&self, kind: CollectionKind, lang: Option<&str>) -> Result<Dump, GatewayError> {
        let dumps = self.caches.dumps();
        if let Some(lang) = lang {
            self.check_language(lang)?;
            let key = MetadataKey::collection(kind.collection(&lang.to_lowercase()));
            return dumps.get(&key).await.map(Dump::One);
        }

        let all = try_join_all(self.languages.iter().map(|lang| {
            let collection = kind.collection(lang);
            async move {
                let docs = dumps.get(&MetadataKey::collection(collection.as_str())).await?;
                Ok::<_, GatewayError>((collection, docs))
            }
        }))
        .await?;
        Ok(Dump::All(all.into_iter().collect()))
    }

    // ───────────── admin ─────────────

    /// Load every collection the store has into the dump domain.
    pub async fn warm_dumps(&self) -> Result<(), GatewayError> {
        let collections = self.repo.collections().await?;
        self.caches.warm_dumps(&collections).await
    }

    pub async fn clear_dumps(&self) {
        self.caches.clear_dumps().await;
    }

    pub async fn health(&self) -> Result<(), GatewayError> {
        self.repo.ping().await.map_err(Into::into)
    }
}

/// Zip `ids` with `sids`; no sids means sub id 0 for every id.
pub fn pair(ids: &[i64], sids: &[i64]) -> Result<Vec<(i64, i64)>, GatewayError> {
    if sids.is_empty() {
        return Ok(ids.iter().map(|&id| (id, 0)).collect());
    }
    if ids.len() != sids.len() {
        return Err(GatewayError::MismatchedIds {
            ids: ids.len(),
            sids: sids.len(),
        });
    }
    Ok(ids.iter().copied().zip(sids.iter().copied()).collect())
}
