use pdc_ledger::records::decode_record;
use pdc_ledger::{
    CallerIdentity, Invocation, LedgerConfig, LedgerErrorCode, LedgerHandler, MemoryStore,
    ProductRecord,
};
use proptest::prelude::*;

fn setup() -> (LedgerHandler, MemoryStore) {
    let config = LedgerConfig::default();
    let store = MemoryStore::for_config(&config);
    let handler = LedgerHandler::new(config).expect("handler");
    (handler, store)
}

fn add_product(payload: serde_json::Value) -> Invocation {
    Invocation::new("addProduct")
        .with_args(["a", "b", "c", "d"])
        .with_transient("product", payload.to_string())
}

fn manufacturer() -> CallerIdentity {
    CallerIdentity::new("ManufacturerMSP")
}

proptest! {
    #[test]
    fn valid_products_round_trip(
        name in "[a-zA-Z0-9_-]{1,32}",
        color in "\\PC{1,16}",
        owner in "\\PC{1,16}",
        price in 1i64..=i64::MAX,
    ) {
        let (handler, store) = setup();
        handler
            .dispatch(
                &store,
                &manufacturer(),
                &add_product(serde_json::json!({
                    "name": name, "color": color, "owner": owner, "price": price
                })),
            )
            .expect("valid product");
        let bytes = handler
            .dispatch(&store, &manufacturer(), &Invocation::new("readProduct").with_arg(name.clone()))
            .expect("read back");
        let record: ProductRecord = decode_record(&bytes).expect("decode");
        prop_assert_eq!(record.doc_type, "product");
        prop_assert_eq!(record.name, name);
        prop_assert_eq!(record.color, color);
        prop_assert_eq!(record.owner, owner);
        prop_assert_eq!(record.price, price);
    }

    #[test]
    fn non_positive_prices_never_write(
        name in "[a-z]{1,8}",
        price in i64::MIN..=0i64,
    ) {
        let (handler, store) = setup();
        let err = handler
            .dispatch(
                &store,
                &manufacturer(),
                &add_product(serde_json::json!({
                    "name": name, "color": "red", "owner": "alice", "price": price
                })),
            )
            .expect_err("non-positive price");
        prop_assert_eq!(err.code(), LedgerErrorCode::Validation);
        prop_assert_eq!(store.current_seq(), 0);
    }

    #[test]
    fn any_empty_string_field_never_writes(
        blank in 0usize..3,
        price in 1i64..1_000_000,
    ) {
        let mut fields = [String::from("widget"), String::from("red"), String::from("alice")];
        fields[blank].clear();
        let (handler, store) = setup();
        let err = handler
            .dispatch(
                &store,
                &manufacturer(),
                &add_product(serde_json::json!({
                    "name": fields[0], "color": fields[1], "owner": fields[2], "price": price
                })),
            )
            .expect_err("empty field");
        prop_assert_eq!(err.code(), LedgerErrorCode::Validation);
        prop_assert_eq!(store.current_seq(), 0);
    }

    #[test]
    fn second_create_always_conflicts(
        first_price in 1i64..1000,
        second_price in 1i64..1000,
        second_color in "[a-z]{1,8}",
    ) {
        let (handler, store) = setup();
        handler
            .dispatch(
                &store,
                &manufacturer(),
                &add_product(serde_json::json!({
                    "name": "widget", "color": "red", "owner": "alice", "price": first_price
                })),
            )
            .expect("first create");
        let before = store.entry("collectionProducts", "widget");
        let err = handler
            .dispatch(
                &store,
                &manufacturer(),
                &add_product(serde_json::json!({
                    "name": "widget", "color": second_color, "owner": "bob", "price": second_price
                })),
            )
            .expect_err("duplicate");
        prop_assert_eq!(err.code(), LedgerErrorCode::AlreadyExists);
        prop_assert_eq!(store.entry("collectionProducts", "widget"), before);
    }

    #[test]
    fn unknown_function_names_are_rejected(name in "[a-zA-Z]{1,24}") {
        prop_assume!(pdc_ledger::Function::parse(&name).is_none());
        let (handler, store) = setup();
        let err = handler
            .dispatch(&store, &manufacturer(), &Invocation::new(name))
            .expect_err("unknown");
        prop_assert_eq!(err.code(), LedgerErrorCode::UnknownFunction);
    }
}
