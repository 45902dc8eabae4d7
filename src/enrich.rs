//! Turns raw market responses into display-ready views: record decoding,
//! the metadata join and the derived display fields.

use chrono::Utc;
use futures::future::try_join_all;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::cache::{DocumentCache, RawCache};
use crate::db::metadata_repo::Document;
use crate::error::GatewayError;
use crate::keys::{Endpoint, LocalizedKey, MetadataKey};
use crate::market::items::{
    Enriched, HotListItem, Item, ListItem, MissingItem, Nameable, OrderBook, PriceHistory,
    SearchItem, UnlistedItem,
};
use crate::market::parse;

/// Item ids whose levels 1..=5 read `+1`..`+5` instead of `PRI`..`PEN`.
const PLAIN_LEVEL_IDS: [i64; 10] = [
    14019, 14020, 14021, 14022, 14023, 14024, 14025, 14026, 14028, 14029,
];

const LEVEL_LABELS: [&str; 5] = ["PRI: ", "DUO: ", "TRI: ", "TET: ", "PEN: "];

/// The cached value of the localized domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MarketView {
    HotList(Vec<Enriched<HotListItem>>),
    MarketList(Vec<ListItem>),
    SubList(Vec<Enriched<Item>>),
    /// Sub list of an item the market has no listing for.
    Unlisted(Vec<UnlistedItem>),
    Search(SearchItem),
    Orders(OrderBook),
    History(PriceHistory),
}

/// Build the view for `key` from the raw and document caches.
pub async fn localize(
    key: &LocalizedKey,
    raw: &RawCache,
    documents: &DocumentCache,
) -> Result<MarketView, GatewayError> {
    match key.endpoint {
        Endpoint::HotList => {
            let res = raw.get(&key.raw()).await?;
            let items = parse::records::<HotListItem>(res.result_msg()?)?;
            enrich(items, &key.language, documents)
                .await
                .map(MarketView::HotList)
        }
        Endpoint::MarketList => {
            let res = raw.get(&key.raw()).await?;
            parse::records::<ListItem>(res.result_msg()?).map(MarketView::MarketList)
        }
        Endpoint::SubList => {
            let id = key.item_id.as_int()?;
            let raw_key = key.raw();
            let doc_key = MetadataKey::item(key.language.as_str(), id);
            let (res, doc) = tokio::try_join!(raw.get(&raw_key), documents.get(&doc_key))?;

            if res.is_no_data() {
                return Ok(MarketView::Unlisted(vec![UnlistedItem::new(id, key.sub_id)]));
            }
            let items = parse::records::<Item>(res.result_msg()?)?;
            Ok(MarketView::SubList(
                items
                    .into_iter()
                    .map(|item| apply(item, doc.as_deref()))
                    .collect(),
            ))
        }
        Endpoint::SearchList => {
            let id = key.item_id.as_int()?;
            let res = raw.get(&key.raw()).await?;
            let item = parse::first_record::<SearchItem>(res.result_msg()?)?;
            Ok(MarketView::Search(
                item.unwrap_or_else(|| SearchItem::unlisted(id)),
            ))
        }
        Endpoint::BiddingList => {
            let id = key.item_id.as_int()?;
            let res = raw.get(&key.raw()).await?;
            let orders = if res.is_no_data() {
                Vec::new()
            } else {
                parse::records(res.result_msg()?)?
            };
            Ok(MarketView::Orders(OrderBook {
                id,
                sid: key.sub_id,
                orders,
            }))
        }
        Endpoint::PriceInfo => {
            let id = key.item_id.as_int()?;
            let res = raw.get(&key.raw()).await?;
            let history = if res.is_no_data() {
                Default::default()
            } else {
                parse::price_history(res.result_msg()?, Utc::now())
            };
            Ok(MarketView::History(PriceHistory {
                id,
                sid: key.sub_id,
                history,
            }))
        }
        Endpoint::WaitList => Err(GatewayError::Internal(
            "the wait list has no localized view".into(),
        )),
    }
}

/// Join `items` with their documents in `collection`.
///
/// Each distinct item id is looked up once; output order follows `items`.
pub async fn enrich<T: Nameable>(
    items: Vec<T>,
    collection: &str,
    documents: &DocumentCache,
) -> Result<Vec<Enriched<T>>, GatewayError> {
    let mut seen = HashSet::new();
    let ids: Vec<i64> = items
        .iter()
        .map(Nameable::item_id)
        .filter(|id| seen.insert(*id))
        .collect();

    let found = try_join_all(ids.iter().map(|&id| {
        let key = MetadataKey::item(collection, id);
        async move { documents.get(&key).await.map(|doc| (id, doc)) }
    }))
    .await?;
    let by_id: HashMap<i64, Option<Arc<Document>>> = found.into_iter().collect();

    Ok(items
        .into_iter()
        .map(|item| {
            let doc = by_id.get(&item.item_id()).and_then(|doc| doc.as_deref());
            apply(item, doc)
        })
        .collect())
}

/// Fill name and icon of `item` from `doc`, or stand in an error object
/// when there is no document.
pub fn apply<T: Nameable>(mut item: T, doc: Option<&Document>) -> Enriched<T> {
    let Some(doc) = doc else {
        return Enriched::Missing(MissingItem::new(item.item_id(), Some(item.sub_id())));
    };

    let (min, max) = item.enhancement();
    let name = doc.get("name").and_then(Value::as_str).unwrap_or_default();
    let icon = doc.get("icon").and_then(Value::as_str).map(str::to_owned);
    item.set_display(
        format!("{}{name}", enhancement_prefix(item.item_id(), min, max)),
        icon,
    );
    Enriched::Found(item)
}

/// Display prefix for an item at enhancement levels `min..=max`.
pub fn enhancement_prefix(id: i64, min: i64, max: i64) -> String {
    if min < max && min != 0 {
        return format!("+{min} ");
    }
    if min != max {
        return String::new();
    }

    match min {
        0 => String::new(),
        1..=5 if PLAIN_LEVEL_IDS.contains(&id) => format!("+{min} "),
        1..=5 => LEVEL_LABELS[(min - 1) as usize].to_owned(),
        16..=20 => LEVEL_LABELS[(min - 16) as usize].to_owned(),
        _ => format!("+{min} "),
    }
}
