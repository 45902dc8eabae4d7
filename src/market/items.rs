//! Typed records decoded from one `-` separated segment of `resultMsg`.

use serde::Serialize;
use std::collections::BTreeMap;

use super::parse::Fields;
use crate::error::GatewayError;

/// A record type with a fixed positional schema.
pub trait Record: Sized {
    /// Minimum number of fields a segment must carry.
    const FIELDS: usize;

    fn from_fields(fields: &Fields<'_>) -> Result<Self, GatewayError>;
}

/// Records that identify an item and can take a display name and icon
/// from the metadata store.
pub trait Nameable {
    fn item_id(&self) -> i64;
    fn sub_id(&self) -> i64;
    /// `(min, max)` enhancement levels for the display prefix.
    fn enhancement(&self) -> (i64, i64);
    fn set_display(&mut self, name: String, icon: Option<String>);
}

/// Entry of `GetWorldMarketHotList`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotListItem {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub id: i64,
    pub sub_id: i64,
    pub min_enhance: i64,
    pub max_enhance: i64,
    pub base_price: i64,
    pub current_stock: i64,
    pub total_trades: i64,
    pub price_change_direction: i64,
    pub price_change_value: i64,
    pub price_min: i64,
    pub price_max: i64,
    pub last_sold_price: i64,
    pub last_sold_time: i64,
}

impl Record for HotListItem {
    const FIELDS: usize = 12;

    fn from_fields(f: &Fields<'_>) -> Result<Self, GatewayError> {
        // The second field is both the sub id and the minimum enhancement.
        Ok(Self {
            name: None,
            icon: None,
            id: f.int(0)?,
            sub_id: f.int(1)?,
            min_enhance: f.int(1)?,
            max_enhance: f.int(2)?,
            base_price: f.int(3)?,
            current_stock: f.int(4)?,
            total_trades: f.int(5)?,
            price_change_direction: f.int(6)?,
            price_change_value: f.int(7)?,
            price_min: f.int(8)?,
            price_max: f.int(9)?,
            last_sold_price: f.int(10)?,
            last_sold_time: f.int(11)?,
        })
    }
}

impl Nameable for HotListItem {
    fn item_id(&self) -> i64 {
        self.id
    }

    fn sub_id(&self) -> i64 {
        self.sub_id
    }

    fn enhancement(&self) -> (i64, i64) {
        (self.min_enhance, self.max_enhance)
    }

    fn set_display(&mut self, name: String, icon: Option<String>) {
        self.name = Some(name);
        self.icon = icon;
    }
}

/// One enhancement level of an item (`GetWorldMarketSubList`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub id: i64,
    pub sid: i64,
    pub min_enhance: i64,
    pub max_enhance: i64,
    pub base_price: i64,
    pub current_stock: i64,
    pub total_trades: i64,
    pub price_min: i64,
    pub price_max: i64,
    pub last_sold_price: i64,
    pub last_sold_time: i64,
}

impl Record for Item {
    const FIELDS: usize = 10;

    fn from_fields(f: &Fields<'_>) -> Result<Self, GatewayError> {
        Ok(Self {
            name: None,
            icon: None,
            id: f.int(0)?,
            sid: f.int(1)?,
            min_enhance: f.int(1)?,
            max_enhance: f.int(2)?,
            base_price: f.int(3)?,
            current_stock: f.int(4)?,
            total_trades: f.int(5)?,
            price_min: f.int(6)?,
            price_max: f.int(7)?,
            last_sold_price: f.int(8)?,
            last_sold_time: f.int(9)?,
        })
    }
}

impl Nameable for Item {
    fn item_id(&self) -> i64 {
        self.id
    }

    fn sub_id(&self) -> i64 {
        self.sid
    }

    fn enhancement(&self) -> (i64, i64) {
        (self.min_enhance, self.max_enhance)
    }

    fn set_display(&mut self, name: String, icon: Option<String>) {
        self.name = Some(name);
        self.icon = icon;
    }
}

/// Placeholder for an item the market has no listing for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnlistedItem {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub id: i64,
    pub sid: i64,
}

impl UnlistedItem {
    pub fn new(id: i64, sid: i64) -> Self {
        Self {
            name: None,
            icon: None,
            id,
            sid,
        }
    }
}

/// Entry of a category listing (`GetWorldMarketList`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub id: i64,
    pub current_stock: i64,
    pub total_trades: i64,
    pub base_price: i64,
}

impl Record for ListItem {
    const FIELDS: usize = 4;

    fn from_fields(f: &Fields<'_>) -> Result<Self, GatewayError> {
        Ok(Self {
            id: f.int(0)?,
            current_stock: f.int(1)?,
            total_trades: f.int(2)?,
            base_price: f.int(3)?,
        })
    }
}

/// Result of `GetWorldMarketSearchList`. Stats are absent when the market
/// does not list the item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    pub id: i64,
    pub current_stock: Option<i64>,
    pub total_trades: Option<i64>,
    pub base_price: Option<i64>,
}

impl SearchItem {
    pub fn unlisted(id: i64) -> Self {
        Self {
            id,
            current_stock: None,
            total_trades: None,
            base_price: None,
        }
    }
}

impl Record for SearchItem {
    const FIELDS: usize = 4;

    // Price comes before trades here, unlike the category listing.
    fn from_fields(f: &Fields<'_>) -> Result<Self, GatewayError> {
        Ok(Self {
            id: f.int(0)?,
            current_stock: Some(f.int(1)?),
            base_price: Some(f.int(2)?),
            total_trades: Some(f.int(3)?),
        })
    }
}

/// One price level of the order book (`GetBiddingInfoList`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub price: i64,
    pub buyers: i64,
    pub sellers: i64,
}

impl Record for Order {
    const FIELDS: usize = 3;

    fn from_fields(f: &Fields<'_>) -> Result<Self, GatewayError> {
        Ok(Self {
            price: f.int(0)?,
            buyers: f.int(1)?,
            sellers: f.int(2)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderBook {
    pub id: i64,
    pub sid: i64,
    pub orders: Vec<Order>,
}

/// Daily prices keyed by Unix timestamp (as a string), oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceHistory {
    pub id: i64,
    pub sid: i64,
    pub history: BTreeMap<String, String>,
}

/// Item waiting to be listed (`GetWorldMarketWaitList`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitListItem {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub id: i64,
    #[serde(rename = "subId")]
    pub sid: i64,
    pub price: i64,
    /// Unix time at which the item goes live.
    pub live_at: i64,
}

impl Record for WaitListItem {
    const FIELDS: usize = 4;

    fn from_fields(f: &Fields<'_>) -> Result<Self, GatewayError> {
        Ok(Self {
            name: None,
            icon: None,
            id: f.int(0)?,
            sid: f.int(1)?,
            price: f.int(2)?,
            live_at: f.int(3)?,
        })
    }
}

impl Nameable for WaitListItem {
    fn item_id(&self) -> i64 {
        self.id
    }

    fn sub_id(&self) -> i64 {
        self.sid
    }

    fn enhancement(&self) -> (i64, i64) {
        (self.sid, self.sid)
    }

    fn set_display(&mut self, name: String, icon: Option<String>) {
        self.name = Some(name);
        self.icon = icon;
    }
}

/// Inline stand-in for an item the metadata store does not know.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingItem {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<i64>,
    pub error: u16,
    pub message: &'static str,
}

impl MissingItem {
    pub fn new(id: i64, sid: Option<i64>) -> Self {
        Self {
            id,
            sid,
            error: GatewayError::ItemNotFound.code(),
            message: "Does not exist in database",
        }
    }
}

/// A record after the metadata join.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Enriched<T> {
    Found(T),
    Missing(MissingItem),
}

impl<T> Enriched<T> {
    pub fn found(&self) -> Option<&T> {
        match self {
            Enriched::Found(t) => Some(t),
            Enriched::Missing(_) => None,
        }
    }
}
