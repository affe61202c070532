//! Label CRUD, validation and the ref/type reconciliation helpers.

mod common;

use common::FakeTransport;
use labelbase_client::{
    LabelFields, LabelType, LabelbaseClient, LabelbaseError, Session, ValidationError,
};
use reqwest::Method;
use serde_json::{json, Value};

const TXID: &str = "f91d0a8a78462bc59398f2c5d7a84fcff491c26ba54c4833478b202796c8aafd";

fn client(fake: &FakeTransport) -> LabelbaseClient<&FakeTransport> {
    LabelbaseClient::with_session(fake, Session::with_labelbase("5"))
}

fn label(id: i64, reference: &str, label_type: &str, text: &str) -> Value {
    json!({"id": id, "ref": reference, "type": label_type, "label": text})
}

// ---------------------------------------------------------------------------
// Plain CRUD
// ---------------------------------------------------------------------------

#[test]
fn list_get_and_delete_use_item_paths() {
    let fake = FakeTransport::new();
    fake.reply(json!([label(1, TXID, "tx", "rent")]))
        .reply(label(1, TXID, "tx", "rent"))
        .reply_empty();

    let client = client(&fake);
    let labels = client.labels(None).unwrap();

    let all = labels.list().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].label_type, LabelType::Tx);

    let one = labels.get("1").unwrap();
    assert_eq!(one.reference, TXID);

    assert!(labels.delete("1"));

    assert_eq!(
        fake.requests(),
        vec![
            "GET labelbase/5/label",
            "GET labelbase/5/label/1",
            "DELETE labelbase/5/label/1",
        ]
    );
}

#[test]
fn failed_delete_reports_false() {
    let fake = FakeTransport::new();
    fake.reply_status(403);

    let client = client(&fake);
    assert!(!client.labels(None).unwrap().delete("1"));
}

#[test]
fn create_posts_fields_to_collection() {
    let fake = FakeTransport::new();
    fake.reply(json!({"id": 3, "ref": TXID, "type": "tx", "label": "rent", "origin": "wpkh"}));

    let client = client(&fake);
    let fields = LabelFields::new(TXID, LabelType::Tx)
        .with_label("rent")
        .with_origin("wpkh")
        .with_field("note", "unchecked extra");
    let created = client.labels(None).unwrap().create(&fields).unwrap().unwrap();

    assert_eq!(created.id, "3");
    assert_eq!(created.origin.as_deref(), Some("wpkh"));

    let call = &fake.calls()[0];
    assert_eq!(call.method, Method::POST);
    assert_eq!(call.path, "labelbase/5/label");
    assert_eq!(
        call.body,
        Some(json!({
            "ref": TXID,
            "type": "tx",
            "label": "rent",
            "origin": "wpkh",
            "note": "unchecked extra"
        }))
    );
}

#[test]
fn create_rejects_invalid_combinations_before_sending() {
    let fake = FakeTransport::new();
    let client = client(&fake);
    let labels = client.labels(None).unwrap();

    let err = labels
        .create(&LabelFields::new("a:0", "output").with_origin("wpkh"))
        .unwrap_err();
    assert!(matches!(
        err,
        LabelbaseError::Validation(ValidationError::OriginRequiresTx { .. })
    ));

    let err = labels
        .create(&LabelFields::new(TXID, "tx").with_spendable(true))
        .unwrap_err();
    assert!(matches!(
        err,
        LabelbaseError::Validation(ValidationError::SpendableRequiresOutput { .. })
    ));

    let err = labels.create(&LabelFields::default()).unwrap_err();
    assert!(matches!(
        err,
        LabelbaseError::Validation(ValidationError::NoData)
    ));

    assert_eq!(fake.call_count(), 0);
}

#[test]
fn create_with_valid_origin_reaches_the_server() {
    let fake = FakeTransport::new();
    fake.reply_status(500);

    let client = client(&fake);
    let result = client
        .labels(None)
        .unwrap()
        .create(&LabelFields::new(TXID, "tx").with_origin("wpkh"));

    // Validation passed; the remote failure surfaces as "no result".
    assert!(result.unwrap().is_none());
    assert_eq!(fake.count(Method::POST), 1);
}

#[test]
fn update_merges_over_stored_record() {
    let fake = FakeTransport::new();
    fake.reply(json!({
        "id": 7, "ref": "a:1", "type": "output", "label": "old",
        "spendable": true, "labelbase": 5
    }))
    .reply(json!({"id": 7, "ref": "a:1", "type": "output", "label": "new", "spendable": false}));

    let client = client(&fake);
    let updated = client
        .labels(None)
        .unwrap()
        .update("7", &LabelFields::default().with_label("new").with_spendable(false))
        .unwrap();
    assert_eq!(updated.label, "new");

    assert_eq!(
        fake.requests(),
        vec!["GET labelbase/5/label/7", "PUT labelbase/5/label/7"]
    );
    assert_eq!(
        fake.last_body(),
        Some(json!({
            "id": "7", "ref": "a:1", "type": "output", "label": "new",
            "spendable": false, "labelbase": 5
        }))
    );
}

#[test]
fn update_drops_spendable_for_non_output_labels() {
    let fake = FakeTransport::new();
    fake.reply(json!({"id": 2, "ref": TXID, "type": "tx", "label": "x", "origin": "o"}))
        .reply(label(2, TXID, "tx", "x"));

    let client = client(&fake);
    client
        .labels(None)
        .unwrap()
        .update("2", &LabelFields::default().with_spendable(true));

    let body = fake.last_body().unwrap();
    assert!(body.get("spendable").is_none());
    // Only `spendable` is stripped here; origin stays.
    assert_eq!(body["origin"], json!("o"));
}

#[test]
fn update_aborts_when_record_cannot_be_read() {
    let fake = FakeTransport::new();
    fake.reply_not_found();

    let client = client(&fake);
    let result = client
        .labels(None)
        .unwrap()
        .update("99", &LabelFields::default().with_label("new"));

    assert!(result.is_none());
    assert_eq!(fake.count(Method::PUT), 0);
    assert_eq!(fake.call_count(), 1);
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

#[test]
fn find_returns_first_match_in_listing_order() {
    let fake = FakeTransport::new();
    fake.reply(json!([
        label(0, "a", "output", "other type"),
        label(1, "a", "tx", "first"),
        label(2, "a", "tx", "second"),
    ]));

    let client = client(&fake);
    let found = client
        .labels(None)
        .unwrap()
        .find_by_ref_and_type("a", "tx")
        .unwrap();

    assert_eq!(found.id, "1");
    assert_eq!(found.label, "first");
}

#[test]
fn find_is_exact_and_case_sensitive() {
    let fake = FakeTransport::new();
    fake.reply(json!([label(1, "A", "tx", ""), label(2, "a", "TX", "")]))
        .reply(json!([]))
        .reply_status(502);

    let client = client(&fake);
    let labels = client.labels(None).unwrap();
    assert!(labels.find_by_ref_and_type("a", "tx").is_none());
    assert!(labels.find_by_ref_and_type("a", "tx").is_none());
    assert!(labels.find_by_ref_and_type("a", "tx").is_none());
}

#[test]
fn get_or_create_returns_existing_label_untouched() {
    let fake = FakeTransport::new();
    fake.reply(json!([label(4, "a", "tx", "keep me")]));

    let client = client(&fake);
    let found = client
        .labels(None)
        .unwrap()
        .get_or_create_by_ref_and_type("a", "tx", &LabelFields::default().with_label("ignored"))
        .unwrap()
        .unwrap();

    assert_eq!(found.label, "keep me");
    assert_eq!(fake.requests(), vec!["GET labelbase/5/label"]);
}

#[test]
fn get_or_create_on_empty_labelbase_lists_once_and_creates_once() {
    let fake = FakeTransport::new();
    fake.reply(json!([])).reply(label(1, "a", "tx", ""));

    let client = client(&fake);
    let created = client
        .labels(None)
        .unwrap()
        .get_or_create_by_ref_and_type("a", "tx", &LabelFields::default())
        .unwrap()
        .unwrap();

    assert_eq!(created.reference, "a");
    assert_eq!(created.label_type, LabelType::Tx);
    assert_eq!(fake.count(Method::GET), 1);
    assert_eq!(fake.count(Method::POST), 1);
    assert_eq!(fake.last_body(), Some(json!({"ref": "a", "type": "tx"})));
}

#[test]
fn get_or_create_validates_the_new_record() {
    let fake = FakeTransport::new();
    fake.reply(json!([]));

    let client = client(&fake);
    let err = client
        .labels(None)
        .unwrap()
        .get_or_create_by_ref_and_type("a", "tx", &LabelFields::default().with_spendable(true))
        .unwrap_err();

    assert!(matches!(err, LabelbaseError::Validation(_)));
    assert_eq!(fake.requests(), vec!["GET labelbase/5/label"]);
}

#[test]
fn update_or_create_updates_match_and_strips_spendable() {
    let fake = FakeTransport::new();
    let stored = json!({"id": 1, "ref": "a", "type": "tx", "label": "old", "spendable": true});
    fake.reply(json!([stored.clone()]))
        .reply(stored.clone())
        .reply(stored)
        .reply(label(1, "a", "tx", "new"));

    let client = client(&fake);
    let updated = client
        .labels(None)
        .unwrap()
        .update_or_create_by_ref_and_type("a", "tx", &LabelFields::default().with_label("new"))
        .unwrap()
        .unwrap();

    assert_eq!(updated.label, "new");
    assert_eq!(
        fake.requests(),
        vec![
            "GET labelbase/5/label",
            "GET labelbase/5/label/1",
            "GET labelbase/5/label/1",
            "PUT labelbase/5/label/1",
        ]
    );
    assert_eq!(fake.count(Method::POST), 0);

    let body = fake.last_body().unwrap();
    assert_eq!(body["label"], json!("new"));
    assert!(body.get("spendable").is_none());
}

#[test]
fn update_or_create_keeps_spendable_on_outputs() {
    let fake = FakeTransport::new();
    let stored = json!({"id": 3, "ref": "a:0", "type": "output", "label": "", "spendable": true});
    fake.reply(json!([stored.clone()]))
        .reply(stored.clone())
        .reply(stored.clone())
        .reply(stored);

    let client = client(&fake);
    client
        .labels(None)
        .unwrap()
        .update_or_create_by_ref_and_type("a:0", "output", &LabelFields::default().with_spendable(false))
        .unwrap();

    assert_eq!(fake.last_body().unwrap()["spendable"], json!(false));
}

#[test]
fn update_or_create_creates_when_missing() {
    let fake = FakeTransport::new();
    fake.reply(json!([label(1, "b", "tx", "")]))
        .reply(json!({"id": 2, "ref": "a:0", "type": "output", "label": "change", "spendable": false}));

    let client = client(&fake);
    let created = client
        .labels(None)
        .unwrap()
        .update_or_create_by_ref_and_type(
            "a:0",
            "output",
            &LabelFields::default().with_label("change").with_spendable(false),
        )
        .unwrap()
        .unwrap();

    assert_eq!(created.id, "2");
    assert_eq!(fake.requests(), vec!["GET labelbase/5/label", "POST labelbase/5/label"]);
    assert_eq!(
        fake.last_body(),
        Some(json!({"ref": "a:0", "type": "output", "label": "change", "spendable": false}))
    );
}

#[test]
fn update_or_create_aborts_when_refetch_fails() {
    let fake = FakeTransport::new();
    fake.reply(json!([label(1, "a", "tx", "")])).reply_not_found();

    let client = client(&fake);
    let result = client
        .labels(None)
        .unwrap()
        .update_or_create_by_ref_and_type("a", "tx", &LabelFields::default().with_label("x"))
        .unwrap();

    assert!(result.is_none());
    assert_eq!(fake.count(Method::PUT), 0);
    assert_eq!(fake.count(Method::POST), 0);
}

#[test]
fn helpers_use_explicit_labelbase() {
    let fake = FakeTransport::new();
    fake.reply(json!([]));

    let client = client(&fake);
    client.labels(Some("77")).unwrap().find_by_ref_and_type("a", "tx");

    assert_eq!(fake.requests(), vec!["GET labelbase/77/label"]);
}

#[test]
fn helpers_write_nothing_when_listing_fails() {
    let fake = FakeTransport::new();
    fake.reply_status(500).reply_status(500);

    let client = client(&fake);
    let labels = client.labels(None).unwrap();
    let fields = LabelFields::default().with_label("x");

    let created = labels.get_or_create_by_ref_and_type("a", "tx", &fields).unwrap();
    assert!(created.is_none());

    let updated = labels.update_or_create_by_ref_and_type("a", "tx", &fields).unwrap();
    assert!(updated.is_none());

    assert_eq!(
        fake.requests(),
        vec!["GET labelbase/5/label", "GET labelbase/5/label"]
    );
    assert_eq!(fake.count(Method::POST), 0);
    assert_eq!(fake.count(Method::PUT), 0);
}

#[test]
fn listing_skips_records_that_do_not_decode() {
    let fake = FakeTransport::new();
    let listing = json!([
        {"id": 2, "ref": "b", "type": "tx", "label": null},
        {"id": 3, "type": "tx", "label": "no ref"},
        label(1, "a", "tx", "ok"),
    ]);
    fake.reply(listing.clone()).reply(listing);

    let client = client(&fake);
    let labels = client.labels(None).unwrap();

    let all = labels.list().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].label, "");

    let found = labels
        .get_or_create_by_ref_and_type("a", "tx", &LabelFields::default())
        .unwrap()
        .unwrap();
    assert_eq!(found.id, "1");
    assert_eq!(fake.count(Method::POST), 0);
}

#[test]
fn update_or_create_merges_only_caller_fields_over_stored_record() {
    let fake = FakeTransport::new();
    // The record is re-pointed between the listing and the re-read.
    let moved = json!({"id": 1, "ref": "b", "type": "tx", "label": "old"});
    fake.reply(json!([label(1, "a", "tx", "old")]))
        .reply(moved.clone())
        .reply(moved)
        .reply(label(1, "b", "tx", "new"));

    let client = client(&fake);
    client
        .labels(None)
        .unwrap()
        .update_or_create_by_ref_and_type("a", "tx", &LabelFields::default().with_label("new"))
        .unwrap();

    let body = fake.last_body().unwrap();
    assert_eq!(body["ref"], json!("b"));
    assert_eq!(body["label"], json!("new"));
}
