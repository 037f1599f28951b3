//! Request router with cacheable dispatch table and URI generation
//!
//! キャッシュ可能なディスパッチテーブルと逆引きURI生成を持つリクエストルータ
//!
//! Routes accumulate in a pending queue and are injected lazily at the
//! start of every match or generate call. The compiled dispatcher is
//! kept per instance and rebuilt only when fresh injection adds routes;
//! a table loaded from the cache file is frozen and authoritative while
//! the name registry still sees later registrations.

use std::fs;
use std::path::{Path, PathBuf};

use ahash::AHashMap as Map;
use log::{debug, warn};
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dispatch::{DispatchOutcome, DispatchTable, Dispatcher, RouteCollector, TABLE_VERSION};
use crate::error::RouterError;
use crate::pattern::{self, Token};
use crate::route::result::RouteResult;
use crate::route::{Route, RouteOptions};
use crate::utils::method::Method;

/// Trait for a generic router implementation.
///
/// This trait defines the interface for registering routes, matching a
/// request against them, resolving allowed methods, and generating a URI
/// back from a route name.
///
/// 汎用ルータ実装のためのトレイト。
/// ルート登録、リクエストの照合、許可メソッドの解決、ルート名からのURI生成のインターフェースを定義します。
pub trait GenRouter<H>: Send + Sync {
    /// Register a route. Takes effect at the next match or generate call.
    ///
    /// ルートを登録します。反映は次回のmatch/generate時です。
    fn add_route(&mut self, route: Route<H>);
    /// Match a request method and path against the registered routes.
    ///
    /// メソッドとパスを登録済みルートと照合します。
    fn match_route(&mut self, method: &str, path: &str) -> Result<RouteResult<H>, RouterError>;
    /// Generate a URI from a route name, substitutions and options.
    ///
    /// ルート名と置換値からURIを生成します。
    fn generate_uri_with(
        &mut self,
        name: &str,
        substitutions: &Map<String, String>,
        options: Option<&RouteOptions>,
    ) -> Result<String, RouterError>;
}

/// Router configuration.
///
/// `cache_file` is only consulted when `cache_enabled` is set.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub cache_enabled: bool,
    pub cache_file: PathBuf,
}

impl Default for RouterConfig {
    fn default() -> RouterConfig {
        RouterConfig {
            cache_enabled: false,
            cache_file: PathBuf::from("data/cache/michisuji.cache.json"),
        }
    }
}

/// Default router implementation.
///
/// デフォルトのルータ実装。
/// 登録済みルートのレジストリとコンパイル済みテーブルの2相構造を持ちます。
pub struct Router<H> {
    collector: RouteCollector,
    routes: Vec<Route<H>>,
    route_index: Map<String, usize>,
    routes_to_inject: Vec<Route<H>>,
    dispatch_data: Option<DispatchTable>,
    dispatcher: Option<Dispatcher>,
    has_cache: bool,
    config: RouterConfig,
}

impl<H> Router<H> {
    /// メソッド指定なしのルートに充てる標準メソッド一覧
    pub const HTTP_METHODS_STANDARD: [Method; 8] = [
        Method::HEAD,
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
        Method::TRACE,
    ];

    pub fn new() -> Router<H> {
        Router {
            collector: RouteCollector::new(),
            routes: Vec::new(),
            route_index: Map::default(),
            routes_to_inject: Vec::new(),
            dispatch_data: None,
            dispatcher: None,
            has_cache: false,
            config: RouterConfig::default(),
        }
    }

    /// Build a router with an explicit configuration. When caching is
    /// enabled this attempts a cache load immediately: an absent or
    /// unreadable file is tolerated, malformed contents are a hard error.
    pub fn with_config(config: RouterConfig) -> Result<Router<H>, RouterError> {
        let mut router = Router::new();
        router.config = config;
        if router.config.cache_enabled {
            router.load_dispatch_data()?;
        }
        Ok(router)
    }

    #[inline]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// ルートを保留キューに積む（遅延注入）
    pub fn add_route(&mut self, route: Route<H>) {
        self.routes_to_inject.push(route);
    }

    /// Match a request method and raw path.
    ///
    /// The path is percent-decoded before dispatch, so clients may encode
    /// reserved characters (including `%2F`) freely.
    pub fn match_route(&mut self, method: &str, path: &str) -> Result<RouteResult<H>, RouterError>
    where
        H: Clone,
    {
        self.inject_routes()?;

        let decoded = percent_decode_str(path).decode_utf8_lossy().into_owned();
        let outcome = self.dispatch(&Method::from_str(method), &decoded)?;

        Ok(match outcome {
            DispatchOutcome::Found { value, params } => self.marshal_matched_route(method, &value, params),
            DispatchOutcome::MethodNotAllowed(allowed) => RouteResult::from_route_failure(Some(allowed)),
            DispatchOutcome::NotFound => RouteResult::from_route_failure(None),
        })
    }

    /// Generate a URI from a route name alone.
    pub fn generate_uri(&mut self, name: &str) -> Result<String, RouterError> {
        self.generate_uri_with(name, &Map::default(), None)
    }

    /// Generate a URI from a route name, substitutions and per-call
    /// options. Call options override route options one level deep;
    /// merged `defaults` only fill substitution keys the caller left out.
    pub fn generate_uri_with(
        &mut self,
        name: &str,
        substitutions: &Map<String, String>,
        options: Option<&RouteOptions>,
    ) -> Result<String, RouterError> {
        self.inject_routes()?;

        let route = match self.route_index.get(name) {
            Some(&slot) => &self.routes[slot],
            None => return Err(RouterError::RouteNotFound(name.to_string())),
        };

        let merged_options = match options {
            Some(overrides) => route.options().merge(overrides),
            None => route.options().clone(),
        };

        let mut merged_subs = merged_options.defaults.clone();
        for (key, value) in substitutions {
            merged_subs.insert(key.clone(), value.clone());
        }

        // 具体的なバリアントから順に試す
        let mut variants = pattern::parse(route.path())?;
        variants.reverse();

        let mut missing: Vec<String> = Vec::new();
        'variants: for variant in &variants {
            missing = missing_parameters(variant, &merged_subs);
            if !missing.is_empty() {
                continue;
            }

            let mut path = String::new();
            for token in variant {
                match token {
                    Token::Literal(text) => path.push_str(text),
                    Token::Param { name: param, constraint } => {
                        let value = match merged_subs.get(param.as_str()) {
                            Some(value) => value,
                            None => continue 'variants,
                        };
                        let matcher = Regex::new(&format!("^{}$", constraint)).map_err(|err| {
                            RouterError::InvalidPattern(format!(
                                "parameter [{}] has an invalid regex `{}`: {}",
                                param, constraint, err
                            ))
                        })?;
                        if !matcher.is_match(value) {
                            // 制約違反は小さいバリアントへはフォールバックしない
                            return Err(RouterError::ConstraintMismatch {
                                param: param.clone(),
                                constraint: constraint.clone(),
                            });
                        }
                        path.push_str(value);
                    }
                }
            }
            return Ok(path);
        }

        let mut received: Vec<String> = substitutions.keys().cloned().collect();
        received.sort();
        Err(RouterError::MissingParameters {
            route: name.to_string(),
            expected: missing,
            received,
        })
    }

    /// 保留キューをレジストリ（とテーブル）へ反映する
    fn inject_routes(&mut self) -> Result<(), RouterError> {
        if self.routes_to_inject.is_empty() {
            return Ok(());
        }
        let pending: Vec<Route<H>> = self.routes_to_inject.drain(..).collect();
        for route in pending {
            self.inject_route(route)?;
        }
        Ok(())
    }

    fn inject_route(&mut self, route: Route<H>) -> Result<(), RouterError> {
        let name = route.name().to_string();
        let path = route.path().to_string();
        let methods: Vec<Method> = match route.methods() {
            Some(list) => list.to_vec(),
            None => Self::HTTP_METHODS_STANDARD.to_vec(),
        };

        // 名前衝突は後勝ち。スキャン順は初回登録位置を保つ
        match self.route_index.get(&name) {
            Some(&slot) => self.routes[slot] = route,
            None => {
                self.route_index.insert(name, self.routes.len());
                self.routes.push(route);
            }
        }

        // キャッシュ済みテーブルは凍結。レジストリだけが新ルートを知る
        if !self.has_cache {
            self.collector.add_route(&methods, &path, &path)?;
            self.dispatcher = None;
        }
        Ok(())
    }

    fn dispatch(&mut self, method: &Method, path: &str) -> Result<DispatchOutcome, RouterError> {
        if let Some(dispatcher) = &self.dispatcher {
            return Ok(dispatcher.dispatch(method, path));
        }

        let table = self.dispatch_data()?;
        let dispatcher = match Dispatcher::new(&table) {
            Ok(dispatcher) => dispatcher,
            Err(err) if self.has_cache => {
                return Err(RouterError::InvalidCacheContents(
                    self.config.cache_file.clone(),
                    err.to_string(),
                ));
            }
            Err(err) => return Err(err),
        };
        debug!(
            "dispatch table compiled: {} static, {} dynamic entries",
            table.statics.len(),
            table.dynamics.len()
        );

        let outcome = dispatcher.dispatch(method, path);
        self.dispatcher = Some(dispatcher);
        Ok(outcome)
    }

    fn dispatch_data(&mut self) -> Result<DispatchTable, RouterError> {
        if let Some(table) = &self.dispatch_data {
            return Ok(table.clone());
        }

        let table = self.collector.table();
        if self.config.cache_enabled {
            self.cache_dispatch_data(&table)?;
        }
        Ok(table)
    }

    /// Reconcile a table-level FOUND against the live registry: the first
    /// registered route with the matched literal path that still allows
    /// the method wins, and its defaults seed the parameters.
    fn marshal_matched_route(&self, method: &str, value: &str, captured: Map<String, String>) -> RouteResult<H>
    where
        H: Clone,
    {
        let matched = self
            .routes
            .iter()
            .find(|route| route.path() == value && route.is_allowed_method(method));

        match matched {
            Some(route) => {
                let mut params = route.options().defaults.clone();
                for (key, val) in captured {
                    params.insert(key, val);
                }
                RouteResult::from_route(route.clone(), params)
            }
            // テーブルとレジストリが食い違った場合（古いキャッシュ等）
            None => self.marshal_method_not_allowed(value),
        }
    }

    fn marshal_method_not_allowed(&self, path: &str) -> RouteResult<H> {
        let mut allowed: Vec<Method> = Vec::new();
        for route in &self.routes {
            if route.path() != path {
                continue;
            }
            let methods = match route.methods() {
                Some(list) => list.to_vec(),
                None => Self::HTTP_METHODS_STANDARD.to_vec(),
            };
            for method in methods {
                if !allowed.contains(&method) {
                    allowed.push(method);
                }
            }
        }
        RouteResult::from_route_failure(Some(allowed))
    }

    fn load_dispatch_data(&mut self) -> Result<(), RouterError> {
        let bytes = match fs::read(&self.config.cache_file) {
            Ok(bytes) => bytes,
            Err(err) => {
                // 未作成・読めないキャッシュは「キャッシュなし」扱い
                warn!(
                    "route cache \"{}\" not loaded: {}",
                    self.config.cache_file.display(),
                    err
                );
                return Ok(());
            }
        };

        let table: DispatchTable = serde_json::from_slice(&bytes).map_err(|err| {
            RouterError::InvalidCacheContents(self.config.cache_file.clone(), err.to_string())
        })?;
        if table.version != TABLE_VERSION {
            return Err(RouterError::InvalidCacheContents(
                self.config.cache_file.clone(),
                format!("unsupported table version {}", table.version),
            ));
        }

        debug!("route cache loaded from \"{}\"", self.config.cache_file.display());
        self.dispatch_data = Some(table);
        self.has_cache = true;
        Ok(())
    }

    fn cache_dispatch_data(&self, table: &DispatchTable) -> Result<(), RouterError> {
        let cache_file = &self.config.cache_file;
        let cache_dir = match cache_file.parent() {
            Some(dir) if dir != Path::new("") => dir,
            _ => Path::new("."),
        };

        if !cache_dir.is_dir() {
            return Err(RouterError::CacheDirectoryMissing(cache_dir.to_path_buf()));
        }
        if fs::metadata(cache_dir)?.permissions().readonly() {
            return Err(RouterError::CacheDirectoryNotWritable(cache_dir.to_path_buf()));
        }
        if cache_file.exists() && fs::metadata(cache_file)?.permissions().readonly() {
            return Err(RouterError::CacheFileNotWritable(cache_file.clone()));
        }

        let bytes = serde_json::to_vec(table).map_err(|err| {
            RouterError::InvalidCacheContents(cache_file.clone(), err.to_string())
        })?;
        fs::write(cache_file, bytes)?;
        debug!("route cache written to \"{}\"", cache_file.display());
        Ok(())
    }
}

impl<H> Default for Router<H> {
    fn default() -> Router<H> {
        Router::new()
    }
}

impl<H> GenRouter<H> for Router<H>
where
    H: Clone + Send + Sync,
{
    fn add_route(&mut self, route: Route<H>) {
        Router::add_route(self, route);
    }

    fn match_route(&mut self, method: &str, path: &str) -> Result<RouteResult<H>, RouterError> {
        Router::match_route(self, method, path)
    }

    fn generate_uri_with(
        &mut self,
        name: &str,
        substitutions: &Map<String, String>,
        options: Option<&RouteOptions>,
    ) -> Result<String, RouterError> {
        Router::generate_uri_with(self, name, substitutions, options)
    }
}

/// 1つでも欠けたら必要パラメータの全件を返す（エラー報告用）
fn missing_parameters(variant: &[Token], substitutions: &Map<String, String>) -> Vec<String> {
    let mut required: Vec<String> = Vec::new();
    for token in variant {
        if let Some(name) = token.param_name() {
            required.push(name.to_string());
        }
    }
    if required.iter().any(|name| !substitutions.contains_key(name.as_str())) {
        return required;
    }
    Vec::new()
}
