mod common;

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use common::{hot_record, service, sub_record, StubMarket, StubMetadata};
use trademarket_gateway::enrich::MarketView;
use trademarket_gateway::keys::{CollectionKind, Endpoint};
use trademarket_gateway::market::items::Enriched;
use trademarket_gateway::service::Dump;

fn sub_list_ids(views: &[Arc<MarketView>]) -> Vec<i64> {
    views
        .iter()
        .map(|view| match &**view {
            MarketView::SubList(levels) => match &levels[0] {
                Enriched::Found(item) => item.id,
                Enriched::Missing(missing) => missing.id,
            },
            MarketView::Unlisted(items) => items[0].id,
            other => panic!("unexpected view {other:?}"),
        })
        .collect()
}

#[tokio::test]
async fn fan_out_keeps_request_order() {
    let market = StubMarket::new();
    let metadata = StubMetadata::new();
    for (id, delay) in [(5, 300), (3, 10), (9, 150)] {
        market.reply(Endpoint::SubList, id, &sub_record(id, 0, 0, 1_000 + id));
        market.delay(id, Duration::from_millis(delay));
        metadata.item("en", id, &format!("Item {id}"));
    }
    let svc = service(Arc::clone(&market), metadata);

    let views = svc.sub_list("na", &[5, 3, 9], None).await.unwrap();

    assert_eq!(sub_list_ids(&views), vec![5, 3, 9]);
    assert_eq!(market.calls(), 3);
}

#[tokio::test]
async fn unknown_region_never_reaches_the_market() {
    let market = StubMarket::new();
    let svc = service(Arc::clone(&market), StubMetadata::new());

    let err = svc.sub_list("xx", &[10007], None).await.unwrap_err();
    assert_eq!(err.code(), 453);
    let err = svc.hot_list("moon", None).await.unwrap_err();
    assert_eq!(err.code(), 453);
    let err = svc.raw_sub_list("xx", &[1]).await.unwrap_err();
    assert_eq!(err.code(), 453);

    assert_eq!(market.calls(), 0);
}

#[tokio::test]
async fn invalid_language_is_rejected_before_any_lookup() {
    let market = StubMarket::new();
    let metadata = StubMetadata::new();
    let svc = service(Arc::clone(&market), Arc::clone(&metadata));

    let err = svc.hot_list("na", Some("xx")).await.unwrap_err();
    assert_eq!(err.code(), 456);
    assert_eq!(market.calls(), 0);
    assert_eq!(metadata.lookups(), 0);
}

#[tokio::test]
async fn language_defaults_follow_the_region() {
    let svc = service(StubMarket::new(), StubMetadata::new());

    assert_eq!(svc.language(None, "kr").unwrap(), "kr");
    assert_eq!(svc.language(None, "KR").unwrap(), "kr");
    assert_eq!(svc.language(None, "eu").unwrap(), "en");
    assert_eq!(svc.language(Some("DE"), "eu").unwrap(), "de");
}

#[tokio::test]
async fn region_is_case_insensitive() {
    let market = StubMarket::new();
    market.reply(Endpoint::MarketList, 1, "10-1-2-3");
    let svc = service(Arc::clone(&market), StubMetadata::new());

    svc.market_list("NA", 1, 0).await.unwrap();
    svc.market_list("na", 1, 0).await.unwrap();

    assert_eq!(market.calls(), 1);
}

#[tokio::test]
async fn mismatched_ids_and_sids_fail_fast() {
    let market = StubMarket::new();
    let svc = service(Arc::clone(&market), StubMetadata::new());

    let err = svc.bidding_list("na", &[1, 2], &[0]).await.unwrap_err();
    assert_eq!(err.code(), 454);
    assert_eq!(market.calls(), 0);
}

#[tokio::test]
async fn empty_market_list_is_an_empty_array() {
    let market = StubMarket::new();
    market.reply(Endpoint::MarketList, 25, "0");
    let svc = service(market, StubMetadata::new());

    let view = svc.market_list("eu", 25, 1).await.unwrap();

    assert_eq!(*view, MarketView::MarketList(Vec::new()));
    assert_eq!(serde_json::to_value(&*view).unwrap(), json!([]));
}

#[tokio::test]
async fn hot_list_inlines_items_without_metadata() {
    let market = StubMarket::new();
    let metadata = StubMetadata::new();
    let msg = format!(
        "{}|{}|",
        hot_record(10007, 0, 0, 5_000),
        hot_record(44444, 1, 1, 9_000)
    );
    market.reply(Endpoint::HotList, 0, &msg);
    metadata.item("en", 10007, "Kzarka Longsword");
    let svc = service(market, metadata);

    let view = svc.hot_list("na", None).await.unwrap();
    let body = serde_json::to_value(&*view).unwrap();

    assert_eq!(body[0]["name"], "Kzarka Longsword");
    assert_eq!(body[0]["icon"], "10007.png");
    assert_eq!(body[0]["subId"], 0);
    assert_eq!(
        body[1],
        json!({ "id": 44444, "sid": 1, "error": 452, "message": "Does not exist in database" })
    );
}

#[tokio::test]
async fn languages_share_one_upstream_call() {
    let market = StubMarket::new();
    let metadata = StubMetadata::new();
    market.reply(Endpoint::HotList, 0, &hot_record(10007, 16, 16, 5_000));
    metadata.item("en", 10007, "Kzarka Longsword");
    metadata.item("de", 10007, "Kzarka-Langschwert");
    let svc = service(Arc::clone(&market), Arc::clone(&metadata));

    let en = svc.hot_list("na", Some("en")).await.unwrap();
    let de = svc.hot_list("na", Some("de")).await.unwrap();

    let name = |view: &MarketView| serde_json::to_value(view).unwrap()[0]["name"].clone();
    assert_eq!(name(&en), "PRI: Kzarka Longsword");
    assert_eq!(name(&de), "PRI: Kzarka-Langschwert");
    assert_eq!(market.calls(), 1);
    assert_eq!(metadata.lookups(), 2);
}

#[tokio::test]
async fn unlisted_item_gets_a_placeholder() {
    let market = StubMarket::new();
    let metadata = StubMetadata::new();
    metadata.item("en", 11653, "Ring of Crescent Guardian");
    let svc = service(market, metadata);

    let views = svc.sub_list("na", &[11653], None).await.unwrap();

    assert_eq!(
        serde_json::to_value(&*views[0]).unwrap(),
        json!([{ "name": null, "icon": null, "id": 11653, "sid": 0 }])
    );
}

#[tokio::test]
async fn search_list_without_listing_has_empty_stats() {
    let market = StubMarket::new();
    market.reply(Endpoint::SearchList, 1, "1-100-2500-7");
    let svc = service(market, StubMetadata::new());

    let views = svc.search_list("na", &[1, 2]).await.unwrap();
    let body = serde_json::to_value(&views).unwrap();

    assert_eq!(
        body,
        json!([
            { "id": 1, "currentStock": 100, "totalTrades": 7, "basePrice": 2500 },
            { "id": 2, "currentStock": null, "totalTrades": null, "basePrice": null }
        ])
    );
}

#[tokio::test]
async fn orders_and_history_without_data_are_empty() {
    let market = StubMarket::new();
    market.reply_with_code(Endpoint::BiddingList, 7, 8, "");
    let svc = service(market, StubMetadata::new());

    let orders = svc.bidding_list("na", &[7], &[2]).await.unwrap();
    let history = svc.price_info("na", &[7], &[]).await.unwrap();

    assert_eq!(
        serde_json::to_value(&*orders[0]).unwrap(),
        json!({ "id": 7, "sid": 2, "orders": [] })
    );
    assert_eq!(
        serde_json::to_value(&*history[0]).unwrap(),
        json!({ "id": 7, "sid": 0, "history": {} })
    );
}

#[tokio::test]
async fn orders_are_decoded_per_level() {
    let market = StubMarket::new();
    market.reply(Endpoint::BiddingList, 7, "100-1-0|110-0-3|");
    let svc = service(market, StubMetadata::new());

    let orders = svc.bidding_list("na", &[7], &[]).await.unwrap();

    assert_eq!(
        serde_json::to_value(&*orders[0]).unwrap(),
        json!({
            "id": 7, "sid": 0,
            "orders": [
                { "price": 100, "buyers": 1, "sellers": 0 },
                { "price": 110, "buyers": 0, "sellers": 3 }
            ]
        })
    );
}

#[tokio::test]
async fn malformed_records_fail_the_request() {
    let market = StubMarket::new();
    market.reply(Endpoint::MarketList, 1, "10-1-2-3|11-x-2-3");
    let svc = service(market, StubMetadata::new());

    let err = svc.market_list("na", 1, 0).await.unwrap_err();
    assert_eq!(err.code(), 513);
}

#[tokio::test]
async fn upstream_failures_are_reported_and_not_cached() {
    let market = StubMarket::new();
    market.reply(Endpoint::MarketList, 1, "10-1-2-3");
    market.set_failing(true);
    let svc = service(Arc::clone(&market), StubMetadata::new());

    assert_eq!(svc.market_list("na", 1, 0).await.unwrap_err().code(), 514);

    market.set_failing(false);
    svc.market_list("na", 1, 0).await.unwrap();
    assert_eq!(market.calls(), 2);
}

#[tokio::test]
async fn wait_list_is_never_cached() {
    let market = StubMarket::new();
    let metadata = StubMetadata::new();
    market.reply(Endpoint::WaitList, 0, "10007-15-2500000000-1700000000|");
    metadata.item("en", 10007, "Kzarka Longsword");
    let svc = service(Arc::clone(&market), metadata);

    let first = svc.wait_list("na", None).await.unwrap();
    svc.wait_list("na", None).await.unwrap();

    assert_eq!(market.calls_for(Endpoint::WaitList), 2);
    let body = serde_json::to_value(&first).unwrap();
    assert_eq!(body[0]["name"], "+15 Kzarka Longsword");
    assert_eq!(body[0]["subId"], 15);
    assert_eq!(body[0]["liveAt"], 1_700_000_000);
}

#[tokio::test]
async fn price_picks_the_requested_level() {
    let market = StubMarket::new();
    let metadata = StubMetadata::new();
    let levels = (0..=5)
        .map(|sid| sub_record(10007, sid, sid, 1_000_000 * (sid + 1)))
        .collect::<Vec<_>>()
        .join("|");
    market.reply(Endpoint::SubList, 10007, &levels);
    metadata.item("en", 10007, "Kzarka Longsword");
    let svc = service(market, metadata);

    let price = svc.price("na", 10007, 3, None).await.unwrap();
    assert_eq!(
        serde_json::to_value(&price).unwrap(),
        json!({
            "name": "TRI: Kzarka Longsword",
            "id": 10007,
            "sid": 3,
            "basePrice": 4_000_000,
            "icon": "10007.png"
        })
    );

    let err = svc.price("na", 10007, 9, None).await.unwrap_err();
    assert_eq!(err.code(), 458);
}

#[tokio::test]
async fn price_rejects_levels_of_single_level_items() {
    let market = StubMarket::new();
    let metadata = StubMetadata::new();
    market.reply(Endpoint::SubList, 44195, &sub_record(44195, 0, 0, 25_000));
    metadata.item("en", 44195, "Memory Fragment");
    let svc = service(market, metadata);

    assert_eq!(svc.price("na", 44195, 2, None).await.unwrap_err().code(), 457);
    assert_eq!(svc.price("na", 44195, 0, None).await.unwrap().base_price, 25_000);
}

#[tokio::test]
async fn price_of_unknown_item_is_invalid() {
    let market = StubMarket::new();
    market.reply(Endpoint::SubList, 1, &sub_record(1, 0, 0, 500));
    let svc = service(market, StubMetadata::new());

    assert_eq!(svc.price("na", 1, 0, None).await.unwrap_err().code(), 458);
}

#[tokio::test]
async fn documents_inline_unknown_ids() {
    let metadata = StubMetadata::new();
    metadata.item("de_recipes", 1, "Rezept");
    let svc = service(StubMarket::new(), Arc::clone(&metadata));

    let docs = svc
        .documents(CollectionKind::Recipes, &[1, 2], Some("de"))
        .await
        .unwrap();

    assert_eq!(docs[0], json!({ "id": 1, "name": "Rezept", "icon": "1.png" }));
    assert_eq!(
        docs[1],
        json!({ "id": 2, "error": 452, "message": "Does not exist in database" })
    );

    // Misses are remembered too.
    svc.documents(CollectionKind::Recipes, &[1, 2], Some("de"))
        .await
        .unwrap();
    assert_eq!(metadata.lookups(), 2);
}

#[tokio::test]
async fn documents_need_ids_and_a_known_language() {
    let svc = service(StubMarket::new(), StubMetadata::new());

    let err = svc.documents(CollectionKind::Items, &[], None).await.unwrap_err();
    assert_eq!(err.code(), 452);
    let err = svc
        .documents(CollectionKind::Items, &[1], Some("xx"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), 456);
}

#[tokio::test]
async fn store_outage_is_reported() {
    let metadata = StubMetadata::new();
    metadata.set_down(true);
    let svc = service(StubMarket::new(), Arc::clone(&metadata));

    let err = svc.documents(CollectionKind::Items, &[1], None).await.unwrap_err();
    assert_eq!(err.code(), 512);
    assert_eq!(svc.health().await.unwrap_err().code(), 512);
}

#[tokio::test]
async fn dump_without_language_covers_every_language() {
    let metadata = StubMetadata::new();
    metadata.item("en_mrecipes", 1, "Recipe");
    metadata.item("de_mrecipes", 1, "Rezept");
    let svc = service(StubMarket::new(), metadata);

    let Dump::All(all) = svc.dump(CollectionKind::MRecipes, None).await.unwrap() else {
        panic!("expected every language");
    };
    assert_eq!(
        all.keys().cloned().collect::<Vec<_>>(),
        vec!["de_mrecipes", "en_mrecipes", "kr_mrecipes"]
    );
    assert_eq!(all["de_mrecipes"][0]["name"], "Rezept");
    assert!(all["kr_mrecipes"].is_empty());

    let Dump::One(en) = svc.dump(CollectionKind::MRecipes, Some("en")).await.unwrap() else {
        panic!("expected one language");
    };
    assert_eq!(en[0]["name"], "Recipe");
    assert!(en[0].get("_id").is_none());
}

#[tokio::test]
async fn warming_and_clearing_the_dumps() {
    let metadata = StubMetadata::new();
    metadata.item("en", 1, "One");
    metadata.item("en_recipes", 2, "Two");
    let svc = service(StubMarket::new(), Arc::clone(&metadata));

    svc.warm_dumps().await.unwrap();
    assert_eq!(metadata.lookups(), 2);

    svc.dump(CollectionKind::Items, Some("en")).await.unwrap();
    assert_eq!(metadata.lookups(), 2);

    svc.clear_dumps().await;
    svc.dump(CollectionKind::Items, Some("en")).await.unwrap();
    assert_eq!(metadata.lookups(), 3);
}

#[tokio::test]
async fn admin_key_must_match() {
    let svc = service(StubMarket::new(), StubMetadata::new());

    assert!(svc.check_admin_key(Some(common::ADMIN_KEY)).is_ok());
    assert_eq!(svc.check_admin_key(Some("guess")).unwrap_err().code(), 401);
    assert_eq!(svc.check_admin_key(None).unwrap_err().code(), 401);
}
