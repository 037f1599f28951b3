use ahash::AHashMap as Map;

use michisuji::{Route, Router, RouteOptions, boxed_handler, BoxedHandler};
use std::sync::Arc;

// ルート登録 → 照合 → URI生成 のひと通りを流すデモ
fn main() {
    env_logger::try_init_from_env(env_logger::Env::default().default_filter_or("debug")).unwrap_or_else(|_| ());

    let mut router: Router<Arc<BoxedHandler<String>>> = Router::new();

    let hello = boxed_handler(|mut body: String| async move {
        body.push_str("Hello, World!");
        body
    });

    router.add_route(Route::with_name("/hello[/{name}]", hello.clone(), Some(&["GET"]), "hello").unwrap());

    let mut blog = Route::with_name("/blog/{id:\\d+}[/{slug}]", hello, Some(&["GET", "POST"]), "blog").unwrap();
    blog.set_options(RouteOptions::new().with_default("slug", "untitled"));
    router.add_route(blog);

    for (method, path) in [
        ("GET", "/hello"),
        ("GET", "/hello/371tti"),
        ("POST", "/hello"),
        ("GET", "/blog/42/some-post"),
        ("GET", "/nothing"),
    ] {
        let result = router.match_route(method, path).unwrap();
        if result.is_success() {
            println!(
                "{} {} -> {} {:?}",
                method,
                path,
                result.matched_route_name().unwrap_or("?"),
                result.matched_params()
            );
        } else if result.is_method_failure() {
            println!("{} {} -> 405 allowed: {:?}", method, path, result.allowed_methods());
        } else {
            println!("{} {} -> 404", method, path);
        }
    }

    let mut subs = Map::default();
    subs.insert("id".to_string(), "7".to_string());
    println!("blog uri: {}", router.generate_uri_with("blog", &subs, None).unwrap());

    subs.insert("slug".to_string(), "release-notes".to_string());
    println!("blog uri: {}", router.generate_uri_with("blog", &subs, None).unwrap());
}
