//! Route registration records
//!
//! ルート登録レコード
//!
//! A `Route` couples a path pattern with a handler, an optional method
//! set, a name for reverse lookup and free-form options. It is built
//! once, validated eagerly, and then only read by the router.

pub mod result;

use ahash::AHashMap as Map;

use crate::error::RouterError;
use crate::utils::method::Method;

/// Free-form route options.
///
/// The router itself only reads `defaults` (parameter fallback values
/// merged into matches and URI generation); everything else rides along
/// in `extra` for host frameworks.
#[derive(Clone, Debug, Default)]
pub struct RouteOptions {
    pub defaults: Map<String, String>,
    pub extra: Map<String, serde_json::Value>,
}

impl RouteOptions {
    pub fn new() -> RouteOptions {
        RouteOptions::default()
    }

    /// デフォルト値を1件追加するビルダ
    pub fn with_default(mut self, key: &str, value: &str) -> RouteOptions {
        self.defaults.insert(key.to_string(), value.to_string());
        self
    }

    /// Merge per-call options over these, one level deep; the override
    /// side wins for identical keys.
    pub fn merge(&self, overrides: &RouteOptions) -> RouteOptions {
        let mut merged = self.clone();
        for (key, value) in &overrides.defaults {
            merged.defaults.insert(key.clone(), value.clone());
        }
        for (key, value) in &overrides.extra {
            merged.extra.insert(key.clone(), value.clone());
        }
        merged
    }
}

/// A single route registration, generic over the handler type.
///
/// ハンドラ型`H`は不透明。共有したい場合は`Arc`系を渡す
#[derive(Clone, Debug)]
pub struct Route<H> {
    path: String,
    handler: H,
    methods: Option<Vec<Method>>,
    name: String,
    options: RouteOptions,
}

impl<H> Route<H> {
    /// Build a route. `methods: None` means every standard HTTP method;
    /// an explicit list is validated and normalized to uppercase.
    pub fn new(path: &str, handler: H, methods: Option<&[&str]>) -> Result<Route<H>, RouterError> {
        let methods = match methods {
            Some(list) => Some(Self::validate_methods(list)?),
            None => None,
        };
        let name = match &methods {
            None => path.to_string(),
            Some(list) => {
                let joined: Vec<&str> = list.iter().map(|m| m.to_str()).collect();
                format!("{}^{}", path, joined.join(":"))
            }
        };
        Ok(Route {
            path: path.to_string(),
            handler,
            methods,
            name,
            options: RouteOptions::new(),
        })
    }

    /// 明示的な名前付きで構築する
    pub fn with_name(path: &str, handler: H, methods: Option<&[&str]>, name: &str) -> Result<Route<H>, RouterError> {
        let mut route = Route::new(path, handler, methods)?;
        route.name = name.to_string();
        Ok(route)
    }

    fn validate_methods(methods: &[&str]) -> Result<Vec<Method>, RouterError> {
        if methods.is_empty() {
            return Err(RouterError::EmptyMethods);
        }
        methods.iter().map(|m| Method::from_token(m)).collect()
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// パス変更はテーブルへ自動反映されない。再登録が必要
    #[inline]
    pub fn set_path(&mut self, path: &str) {
        self.path = path.to_string();
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    #[inline]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    #[inline]
    pub fn methods(&self) -> Option<&[Method]> {
        self.methods.as_deref()
    }

    #[inline]
    pub fn options(&self) -> &RouteOptions {
        &self.options
    }

    #[inline]
    pub fn set_options(&mut self, options: RouteOptions) {
        self.options = options;
    }

    /// Whether the route accepts the given method (case-insensitive).
    #[inline]
    pub fn is_allowed_method(&self, method: &str) -> bool {
        match &self.methods {
            None => true,
            Some(list) => list.contains(&Method::from_str(&method.to_uppercase())),
        }
    }
}
