//! Tests for typed getters.

use std::collections::BTreeMap;

use chrono::TimeZone;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use sqlcache_lib::cache::{Cache, CacheConfig, CacheHandle, Freshness, Ttl};
use sqlcache_lib::clock::ManualClock;
use sqlcache_lib::model::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Session {
    user: String,
    roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Quota {
    remaining: u32,
}

fn cache() -> (Cache, ManualClock) {
    let clock = ManualClock::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap());
    let cache = Cache::open_with_clock(CacheConfig::in_memory(), clock.clone()).unwrap();
    (cache, clock)
}

#[test]
fn test_int_and_mismatch() {
    let (cache, _clock) = cache();
    cache.set("a", 42, Ttl::Never).unwrap();
    assert_eq!(cache.get_int("a", 0).unwrap(), 42);
    assert_eq!(cache.get_string("a", "x").unwrap(), "x");
    assert_eq!(cache.get_float("a", 1.5).unwrap(), 1.5);
    assert!(!cache.get_bool("a", false).unwrap());
}

#[test]
fn test_missing_returns_default() {
    let (cache, _clock) = cache();
    assert_eq!(cache.get_int("missing", -1).unwrap(), -1);
    assert_eq!(cache.get_string("missing", "none").unwrap(), "none");
    assert_eq!(cache.get_array("missing", vec![Value::Null]).unwrap(), vec![Value::Null]);
}

#[test]
fn test_expired_returns_default() {
    let (cache, clock) = cache();
    cache.set("a", 7, 1).unwrap();
    clock.advance_secs(1);
    assert_eq!(cache.get_int("a", 0).unwrap(), 0);
}

#[test]
fn test_each_kind() {
    let (cache, _clock) = cache();
    cache.set("f", 2.5, Ttl::Never).unwrap();
    cache.set("b", true, Ttl::Never).unwrap();
    cache.set("s", "text", Ttl::Never).unwrap();
    cache.set("raw", Value::bytes(vec![0u8, 1, 2]), Ttl::Never).unwrap();
    cache.set("list", vec!["x", "y"], Ttl::Never).unwrap();

    let mut fields = BTreeMap::new();
    fields.insert("k".to_string(), 1);
    cache.set("map", fields, Ttl::Never).unwrap();

    assert_eq!(cache.get_float("f", 0.0).unwrap(), 2.5);
    assert!(cache.get_bool("b", false).unwrap());
    assert_eq!(cache.get_string("s", "").unwrap(), "text");
    assert_eq!(cache.get_bytes("raw", Vec::new()).unwrap(), vec![0, 1, 2]);
    assert_eq!(
        cache.get_array("list", Vec::new()).unwrap(),
        vec![Value::from("x"), Value::from("y")]
    );
    assert_eq!(cache.get_map("map", BTreeMap::new()).unwrap()["k"], Value::Int(1));

    // Arrays are not bytes and bytes are not arrays.
    assert_eq!(cache.get_bytes("list", vec![9]).unwrap(), vec![9]);
    assert!(cache.get_array("raw", Vec::new()).unwrap().is_empty());
}

#[test]
fn test_instance_of() {
    let (cache, _clock) = cache();
    let session = Session {
        user: "ada".to_string(),
        roles: vec!["admin".to_string()],
    };
    cache.set("session", Value::instance(&session).unwrap(), 3600).unwrap();

    let fallback = Session {
        user: "guest".to_string(),
        roles: Vec::new(),
    };
    assert_eq!(cache.get_instance_of("session", fallback.clone()).unwrap(), session);
    assert_eq!(
        cache.get_instance_of("session", Quota { remaining: 3 }).unwrap(),
        Quota { remaining: 3 }
    );
    assert_eq!(cache.get_instance_of("missing", fallback.clone()).unwrap(), fallback);

    cache.set("plain", "ada", Ttl::Never).unwrap();
    assert_eq!(cache.get_instance_of("plain", fallback.clone()).unwrap(), fallback);
}

#[test]
fn test_instance_with_changed_layout_falls_back() {
    let (cache, _clock) = cache();
    // Tagged as `Session`, but encoded from an older shape of the type.
    let stale = Value::Instance {
        type_name: std::any::type_name::<Session>().to_string(),
        data: bincode::serialize(&"ada".to_string()).unwrap(),
    };
    cache.set("session", stale, Ttl::Never).unwrap();

    let fallback = Session {
        user: "guest".to_string(),
        roles: Vec::new(),
    };
    assert_eq!(cache.get_instance_of("session", fallback.clone()).unwrap(), fallback);

    let garbage = Value::Instance {
        type_name: std::any::type_name::<Session>().to_string(),
        data: vec![0xff],
    };
    cache.set("session", garbage, Ttl::Never).unwrap();
    assert_eq!(cache.get_instance_of("session", fallback.clone()).unwrap(), fallback);
}

#[test]
fn test_instance_of_within_window() {
    let (cache, clock) = cache();
    let session = Session {
        user: "ada".to_string(),
        roles: vec!["admin".to_string()],
    };
    cache.set("session", Value::instance(&session).unwrap(), Ttl::Never).unwrap();
    clock.advance_secs(3);

    let fallback = Session {
        user: "guest".to_string(),
        roles: Vec::new(),
    };
    assert_eq!(
        cache
            .get_instance_of_within("session", fallback.clone(), Freshness::max_age_secs(10))
            .unwrap(),
        session
    );
    assert_eq!(
        cache
            .get_instance_of_within("session", fallback.clone(), Freshness::max_age_secs(2))
            .unwrap(),
        fallback
    );
    assert_eq!(cache.get_instance_of("session", fallback).unwrap(), session);
}

#[test]
fn test_typed_with_window() {
    let (cache, clock) = cache();
    cache.set("a", 5, Ttl::Never).unwrap();
    clock.advance_secs(3);
    assert_eq!(cache.get_typed("a", 0i64, Freshness::max_age_secs(10)).unwrap(), 5);
    assert_eq!(cache.get_typed("a", 0i64, Freshness::max_age_secs(2)).unwrap(), 0);
    assert_eq!(
        cache.get_typed("a", Value::Null, Freshness::Any).unwrap(),
        Value::Int(5)
    );
}
