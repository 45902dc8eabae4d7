//! Upstream request bodies, one shape per endpoint.

use serde_json::{json, Value};

use crate::keys::{Endpoint, RawKey};

/// JSON body for `key`, or `None` for endpoints that take no body.
pub fn body(key: &RawKey) -> Option<Value> {
    let id = key.item_id.to_json();
    match key.endpoint {
        Endpoint::HotList | Endpoint::WaitList => None,
        Endpoint::MarketList => Some(json!({
            "keyType": 0,
            "mainCategory": id,
            "subCategory": key.sub_id,
        })),
        Endpoint::SubList => Some(json!({
            "keyType": 0,
            "mainKey": id,
        })),
        Endpoint::SearchList => Some(json!({
            "searchResult": key.item_id.to_string(),
        })),
        Endpoint::BiddingList | Endpoint::PriceInfo => Some(json!({
            "keyType": 0,
            "mainKey": id,
            "subKey": key.sub_id,
        })),
    }
}
