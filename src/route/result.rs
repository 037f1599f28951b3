//! Match outcome values
//!
//! マッチ結果の値。成功か失敗のどちらかで、生成後は不変

use ahash::AHashMap as Map;

use crate::route::Route;
use crate::utils::method::Method;

/// The outcome of a match attempt.
///
/// A failure with `allowed_methods == None` means no route exists for
/// the path at all; `Some` (possibly empty) means the path exists but
/// rejects the method. Matching failures are ordinary values, never
/// errors.
#[derive(Debug)]
pub struct RouteResult<H> {
    success: bool,
    route: Option<Route<H>>,
    params: Map<String, String>,
    allowed_methods: Option<Vec<Method>>,
}

impl<H> RouteResult<H> {
    /// 成功の結果を作る
    pub fn from_route(route: Route<H>, params: Map<String, String>) -> RouteResult<H> {
        RouteResult {
            success: true,
            route: Some(route),
            params,
            allowed_methods: None,
        }
    }

    /// 失敗の結果を作る
    pub fn from_route_failure(methods: Option<Vec<Method>>) -> RouteResult<H> {
        RouteResult {
            success: false,
            route: None,
            params: Map::default(),
            allowed_methods: methods,
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.success
    }

    #[inline]
    pub fn is_failure(&self) -> bool {
        !self.success
    }

    /// Whether the failure is specifically a method mismatch.
    #[inline]
    pub fn is_method_failure(&self) -> bool {
        !self.success && self.allowed_methods.is_some()
    }

    #[inline]
    pub fn matched_route(&self) -> Option<&Route<H>> {
        self.route.as_ref()
    }

    #[inline]
    pub fn matched_route_name(&self) -> Option<&str> {
        self.route.as_ref().map(|route| route.name())
    }

    /// デフォルトマージ済みのキャプチャ群（失敗時は空）
    #[inline]
    pub fn matched_params(&self) -> &Map<String, String> {
        &self.params
    }

    /// On success the matched route's own declared methods (`None` when
    /// unconstrained); on failure the stored allowed set.
    pub fn allowed_methods(&self) -> Option<&[Method]> {
        if self.success {
            self.route.as_ref().and_then(|route| route.methods())
        } else {
            self.allowed_methods.as_deref()
        }
    }
}
