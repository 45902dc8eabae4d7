#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use trademarket_gateway::config::{CacheSettings, RegionRegistry, Settings};
use trademarket_gateway::db::metadata_repo::{Document, MetadataRepository, StoreError};
use trademarket_gateway::error::GatewayError;
use trademarket_gateway::keys::{Endpoint, MetadataQuery, RawKey};
use trademarket_gateway::market::{MarketResponse, MarketSource};
use trademarket_gateway::service::MarketService;

pub const ADMIN_KEY: &str = "let-me-in";

/// Canned upstream. Unknown keys answer with the `"0"` sentinel.
#[derive(Default)]
pub struct StubMarket {
    replies: Mutex<HashMap<(Endpoint, String), (i64, String)>>,
    delays: Mutex<HashMap<String, Duration>>,
    failing: AtomicBool,
    calls: AtomicUsize,
    seen: Mutex<Vec<RawKey>>,
}

impl StubMarket {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, endpoint: Endpoint, id: impl ToString, msg: &str) {
        self.reply_with_code(endpoint, id, 0, msg);
    }

    pub fn reply_with_code(&self, endpoint: Endpoint, id: impl ToString, code: i64, msg: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert((endpoint, id.to_string()), (code, msg.to_owned()));
    }

    /// Hold every call for item `id` for `delay`.
    pub fn delay(&self, id: impl ToString, delay: Duration) {
        self.delays.lock().unwrap().insert(id.to_string(), delay);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, endpoint: Endpoint) -> usize {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|k| k.endpoint == endpoint)
            .count()
    }
}

#[async_trait]
impl MarketSource for StubMarket {
    async fn fetch(&self, key: &RawKey) -> Result<MarketResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(key.clone());

        let id = key.item_id.to_string();
        let delay = self.delays.lock().unwrap().get(&id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(GatewayError::Upstream(format!("{key}: connection refused")));
        }

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&(key.endpoint, id))
            .cloned();
        let (code, msg) = reply.unwrap_or((0, "0".to_owned()));
        MarketResponse::from_json(json!({ "resultCode": code, "resultMsg": msg }))
    }
}

/// In-memory metadata store.
#[derive(Default)]
pub struct StubMetadata {
    collections: Mutex<BTreeMap<String, BTreeMap<i64, Document>>>,
    down: AtomicBool,
    lookups: AtomicUsize,
}

impl StubMetadata {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, collection: &str, doc: Value) {
        let id = doc["id"].as_i64().expect("document needs an id");
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_owned())
            .or_default()
            .insert(id, doc);
    }

    /// Add an item document named `name` to `collection`.
    pub fn item(&self, collection: &str, id: i64, name: &str) {
        self.insert(
            collection,
            json!({ "_id": "internal", "id": id, "name": name, "icon": format!("{id}.png") }),
        );
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl MetadataRepository for StubMetadata {
    async fn find_one(
        &self,
        collection: &str,
        query: &MetadataQuery,
    ) -> Result<Document, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let collections = self.collections.lock().unwrap();
        let docs = collections.get(collection).ok_or(StoreError::NotFound)?;
        let doc = match query {
            MetadataQuery::Id(id) => docs.get(id),
            MetadataQuery::All => docs.values().next(),
        };
        doc.cloned()
            .map(trademarket_gateway::db::metadata_repo::strip_internal)
            .ok_or(StoreError::NotFound)
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let collections = self.collections.lock().unwrap();
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .cloned()
                    .map(trademarket_gateway::db::metadata_repo::strip_internal)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn collections(&self) -> Result<Vec<String>, StoreError> {
        self.check()?;
        Ok(self.collections.lock().unwrap().keys().cloned().collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }
}

pub fn settings() -> Settings {
    let cache = CacheSettings::new(1_000, Duration::from_secs(60));
    Settings {
        server_addr: "127.0.0.1:0".into(),
        database_url: "postgres://unused".into(),
        db_max_connections: 1,
        regions: RegionRegistry::parse("na=na.market.test,eu=eu.market.test,kr=kr.market.test")
            .unwrap(),
        languages: vec!["en".into(), "de".into(), "kr".into()],
        admin_api_key: ADMIN_KEY.into(),
        upstream_timeout: Duration::from_secs(1),
        raw_cache: cache,
        localized_cache: cache,
        metadata_cache: cache,
        dump_cache: CacheSettings::new(20, Duration::from_secs(60)),
    }
}

pub fn service(market: Arc<StubMarket>, metadata: Arc<StubMetadata>) -> MarketService {
    MarketService::new(&settings(), market, metadata)
}

/// A hot list record: 12 dash-separated fields.
pub fn hot_record(id: i64, min: i64, max: i64, price: i64) -> String {
    format!("{id}-{min}-{max}-{price}-10-200-1-500-{}-{}-{price}-1700000000", price - 100, price + 100)
}

/// A sub list record: 10 dash-separated fields.
pub fn sub_record(id: i64, sid: i64, max: i64, price: i64) -> String {
    format!("{id}-{sid}-{max}-{price}-3-40-{}-{}-{price}-1700000000", price - 10, price + 10)
}
