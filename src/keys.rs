//! Cache keys: one upstream call, one localized artifact, one metadata lookup.

use serde_json::{json, Value};
use std::fmt;

use crate::error::GatewayError;

/// Trademarket endpoints the gateway knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    HotList,
    MarketList,
    SubList,
    SearchList,
    BiddingList,
    PriceInfo,
    WaitList,
}

impl Endpoint {
    /// Path segment used by the upstream (`/Trademarket/{name}`).
    pub fn upstream_name(self) -> &'static str {
        match self {
            Endpoint::HotList => "GetWorldMarketHotList",
            Endpoint::MarketList => "GetWorldMarketList",
            Endpoint::SubList => "GetWorldMarketSubList",
            Endpoint::SearchList => "GetWorldMarketSearchList",
            Endpoint::BiddingList => "GetBiddingInfoList",
            Endpoint::PriceInfo => "GetMarketPriceInfo",
            Endpoint::WaitList => "GetWorldMarketWaitList",
        }
    }

    /// The wait list moves too fast to be worth caching.
    pub fn is_cacheable(self) -> bool {
        !matches!(self, Endpoint::WaitList)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.upstream_name())
    }
}

/// Item identifier as the upstream expects it: numeric for most endpoints,
/// textual for the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemId {
    Int(i64),
    Text(String),
}

impl ItemId {
    pub fn as_int(&self) -> Result<i64, GatewayError> {
        match self {
            ItemId::Int(id) => Ok(*id),
            ItemId::Text(s) => s
                .parse()
                .map_err(|_| GatewayError::BadRequest(format!("non-numeric item id `{s}`"))),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ItemId::Int(id) => json!(id),
            ItemId::Text(s) => json!(s),
        }
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        ItemId::Int(id)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        ItemId::Text(id)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        ItemId::Text(id.to_owned())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Int(id) => write!(f, "{id}"),
            ItemId::Text(s) => f.write_str(s),
        }
    }
}

/// Identifies exactly one upstream call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawKey {
    pub item_id: ItemId,
    pub sub_id: i64,
    pub region: String,
    pub endpoint: Endpoint,
}

impl RawKey {
    pub fn new(item_id: impl Into<ItemId>, sub_id: i64, region: &str, endpoint: Endpoint) -> Self {
        Self {
            item_id: item_id.into(),
            sub_id,
            region: region.to_lowercase(),
            endpoint,
        }
    }

    /// Attach a display language.
    pub fn localize(self, language: &str) -> LocalizedKey {
        LocalizedKey {
            item_id: self.item_id,
            sub_id: self.sub_id,
            region: self.region,
            endpoint: self.endpoint,
            language: language.to_owned(),
        }
    }
}

impl fmt::Display for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}[{}:{}]",
            self.region, self.endpoint, self.item_id, self.sub_id
        )
    }
}

/// One enriched, display-ready result: a raw call plus a language.
///
/// Language-independent endpoints use [`LocalizedKey::NEUTRAL`] so every
/// language shares a single entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalizedKey {
    pub item_id: ItemId,
    pub sub_id: i64,
    pub region: String,
    pub endpoint: Endpoint,
    pub language: String,
}

impl LocalizedKey {
    pub const NEUTRAL: &'static str = "";

    pub fn new(
        item_id: impl Into<ItemId>,
        sub_id: i64,
        region: &str,
        endpoint: Endpoint,
        language: &str,
    ) -> Self {
        RawKey::new(item_id, sub_id, region, endpoint).localize(language)
    }

    pub fn neutral(item_id: impl Into<ItemId>, sub_id: i64, region: &str, endpoint: Endpoint) -> Self {
        Self::new(item_id, sub_id, region, endpoint, Self::NEUTRAL)
    }

    /// The upstream call this artifact is derived from.
    pub fn raw(&self) -> RawKey {
        RawKey {
            item_id: self.item_id.clone(),
            sub_id: self.sub_id,
            region: self.region.clone(),
            endpoint: self.endpoint,
        }
    }
}

impl fmt::Display for LocalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.raw(), self.language)
    }
}

/// Filter half of a [`MetadataKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataQuery {
    /// Every document of the collection.
    All,
    /// The document whose `id` field matches.
    Id(i64),
}

impl MetadataQuery {
    /// The filter rendered as a document, e.g. `{"id": 10007}`.
    pub fn to_document(&self) -> Value {
        match self {
            MetadataQuery::All => json!({}),
            MetadataQuery::Id(id) => json!({ "id": id }),
        }
    }
}

/// A single-document or whole-collection lookup in the metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetadataKey {
    /// Collection name including language and type suffix (`en_recipes`).
    pub collection: String,
    pub query: MetadataQuery,
}

impl MetadataKey {
    pub fn item(collection: impl Into<String>, id: i64) -> Self {
        Self {
            collection: collection.into(),
            query: MetadataQuery::Id(id),
        }
    }

    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            query: MetadataQuery::All,
        }
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.collection, self.query.to_document())
    }
}

/// Family of metadata collections; each language has one of every kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Items,
    Recipes,
    MRecipes,
    RecipeMatGroups,
    MRecipeMatGroups,
}

impl CollectionKind {
    /// Kind named by a `/util/{kind}` path segment.
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "db" => Some(CollectionKind::Items),
            "recipe" => Some(CollectionKind::Recipes),
            "mrecipe" => Some(CollectionKind::MRecipes),
            "matgroup" => Some(CollectionKind::RecipeMatGroups),
            "mmatgroup" => Some(CollectionKind::MRecipeMatGroups),
            _ => None,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            CollectionKind::Items => "",
            CollectionKind::Recipes => "_recipes",
            CollectionKind::MRecipes => "_mrecipes",
            CollectionKind::RecipeMatGroups => "_recipes_matgroups",
            CollectionKind::MRecipeMatGroups => "_mrecipes_matgroups",
        }
    }

    /// Collection name for `language`, e.g. `de_recipes`.
    pub fn collection(self, language: &str) -> String {
        format!("{}{}", language, self.suffix())
    }
}
