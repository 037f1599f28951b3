use std::fs;

use michisuji::route::Route;
use michisuji::router::{Router, RouterConfig};
use michisuji::error::RouterError;

fn caching_config(cache_file: std::path::PathBuf) -> RouterConfig {
    RouterConfig {
        cache_enabled: true,
        cache_file,
    }
}

fn caching_router(config: &RouterConfig) -> Router<&'static str> {
    let mut router = Router::with_config(config.clone()).unwrap();
    router.add_route(Route::with_name("/foo", "h", Some(&["GET"]), "foo").unwrap());
    router
}

#[test]
fn test_cache_round_trip_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let config = caching_config(dir.path().join("routes.cache.json"));

    let mut router1 = caching_router(&config);
    let result = router1.match_route("GET", "/foo").unwrap();
    assert!(result.is_success());

    assert!(config.cache_file.is_file());
    let cache1 = fs::read(&config.cache_file).unwrap();

    let mut router2 = caching_router(&config);
    let result = router2.match_route("GET", "/foo").unwrap();
    assert!(result.is_success());
    assert_eq!(result.matched_route_name(), Some("foo"));
    assert_eq!(result.matched_route().unwrap().handler(), &"h");

    let cache2 = fs::read(&config.cache_file).unwrap();
    assert_eq!(cache1, cache2);
}

#[test]
fn test_cached_table_is_frozen_but_registry_still_grows() {
    let dir = tempfile::tempdir().unwrap();
    let config = caching_config(dir.path().join("routes.cache.json"));

    // 1台目がキャッシュを作る
    let mut router1 = caching_router(&config);
    assert!(router1.match_route("GET", "/foo").unwrap().is_success());

    // 2台目はキャッシュ読込後の追加ルートをテーブルへは反映しない
    let mut router2 = caching_router(&config);
    router2.add_route(Route::with_name("/late", "h", Some(&["GET"]), "late").unwrap());

    assert!(router2.match_route("GET", "/foo").unwrap().is_success());
    assert!(router2.match_route("GET", "/late").unwrap().is_failure());

    // 名前レジストリには載るのでURI生成はできる
    assert_eq!(router2.generate_uri("late").unwrap(), "/late");
}

#[test]
fn test_missing_cache_file_is_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    let config = caching_config(dir.path().join("not-yet-written.json"));
    let router: Result<Router<&'static str>, _> = Router::with_config(config);
    assert!(router.is_ok());
}

#[test]
fn test_missing_cache_directory_fails_on_write() {
    let dir = tempfile::tempdir().unwrap();
    let config = caching_config(dir.path().join("no-such-dir").join("cache.json"));

    let mut router = caching_router(&config);
    let err = router.match_route("GET", "/foo").unwrap_err();
    match &err {
        RouterError::CacheDirectoryMissing(_) => {}
        other => panic!("unexpected error: {}", other),
    }
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_unwritable_cache_directory_fails_on_write() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("dir");
    fs::create_dir(&sub).unwrap();
    let mut perms = fs::metadata(&sub).unwrap().permissions();
    perms.set_readonly(true);
    fs::set_permissions(&sub, perms).unwrap();

    let config = caching_config(sub.join("cache.json"));
    let mut router = caching_router(&config);
    let err = router.match_route("GET", "/foo").unwrap_err();
    assert!(err.to_string().contains("is not writable"));

    // tempdirの後始末ができるように戻す
    let mut perms = fs::metadata(&sub).unwrap().permissions();
    perms.set_readonly(false);
    fs::set_permissions(&sub, perms).unwrap();
}

#[test]
fn test_unwritable_cache_file_fails_on_write() {
    let dir = tempfile::tempdir().unwrap();
    let cache_file = dir.path().join("cache.json");
    fs::write(&cache_file, b"").unwrap();
    let mut perms = fs::metadata(&cache_file).unwrap().permissions();
    perms.set_readonly(true);
    fs::set_permissions(&cache_file, perms).unwrap();

    let config = caching_config(cache_file.clone());
    let mut router = caching_router(&config);
    let err = router.match_route("GET", "/foo").unwrap_err();
    match &err {
        RouterError::CacheFileNotWritable(_) => {}
        other => panic!("unexpected error: {}", other),
    }
    assert!(err.to_string().contains("is not writable"));

    let mut perms = fs::metadata(&cache_file).unwrap().permissions();
    perms.set_readonly(false);
    fs::set_permissions(&cache_file, perms).unwrap();
}

#[test]
fn test_malformed_cache_contents_fail_at_construction() {
    let dir = tempfile::tempdir().unwrap();
    let cache_file = dir.path().join("cache.json");
    fs::write(&cache_file, b"\"hello\"").unwrap();

    let config = caching_config(cache_file);
    let err = match Router::<&'static str>::with_config(config) {
        Ok(_) => panic!("malformed cache must not load"),
        Err(err) => err,
    };
    assert!(err.to_string().contains("MUST contain a serialized dispatch table"));
}

#[test]
fn test_cache_with_unsupported_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let cache_file = dir.path().join("cache.json");
    fs::write(
        &cache_file,
        b"{\"version\":999,\"statics\":[],\"dynamics\":[]}",
    )
    .unwrap();

    let config = caching_config(cache_file);
    let err = match Router::<&'static str>::with_config(config) {
        Ok(_) => panic!("unsupported table version must not load"),
        Err(err) => err,
    };
    assert!(err.to_string().contains("unsupported table version"));
}

#[test]
fn test_caching_disabled_never_writes() {
    let dir = tempfile::tempdir().unwrap();
    let cache_file = dir.path().join("cache.json");
    let config = RouterConfig {
        cache_enabled: false,
        cache_file: cache_file.clone(),
    };

    let mut router = Router::with_config(config).unwrap();
    router.add_route(Route::new("/foo", "h", Some(&["GET"])).unwrap());
    assert!(router.match_route("GET", "/foo").unwrap().is_success());
    assert!(!cache_file.exists());
}

#[test]
fn test_cached_match_with_params_and_dynamic_routes() {
    let dir = tempfile::tempdir().unwrap();
    let config = caching_config(dir.path().join("routes.cache.json"));

    let mut router1 = Router::with_config(config.clone()).unwrap();
    router1.add_route(Route::with_name("/foo/{id:\\d+}", "h", Some(&["GET"]), "foo").unwrap());
    let result = router1.match_route("GET", "/foo/42").unwrap();
    assert!(result.is_success());

    let mut router2 = Router::with_config(config).unwrap();
    router2.add_route(Route::with_name("/foo/{id:\\d+}", "h", Some(&["GET"]), "foo").unwrap());
    let result = router2.match_route("GET", "/foo/42").unwrap();
    assert!(result.is_success());
    assert_eq!(result.matched_params().get("id").map(String::as_str), Some("42"));

    let result = router2.match_route("POST", "/foo/42").unwrap();
    assert!(result.is_method_failure());
}
