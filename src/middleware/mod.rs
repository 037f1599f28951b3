//! Handler delegation
//!
//! ハンドラ委譲まわり
//!
//! The router never writes a 404/405 response itself. A successful
//! `RouteResult` processes the matched route's handler; a failed one
//! hands the context to the next handler in the host's chain.

use std::{future::Future, pin::Pin, sync::Arc};

use crate::route::Route;
use crate::route::result::RouteResult;

/// Boxed async handler type for routed requests.
///
/// ルーティング用のBox化された非同期ハンドラ型。
/// コンテキストを受け取り、コンテキストを返すFutureを生成します。
pub type BoxedHandler<C> = Box<
    dyn Fn(C)
            -> Pin<
                Box<dyn Future<Output = C> + Send>,
            > + Send
        + Sync,
>;

/// 非同期クロージャをArc入りのBoxedHandlerに包む
pub fn boxed_handler<C, F, Fut>(handler: F) -> Arc<BoxedHandler<C>>
where
    F: Fn(C) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = C> + Send + 'static,
{
    let boxed: BoxedHandler<C> = Box::new(move |c| Box::pin(handler(c)));
    Arc::new(boxed)
}

/// A terminal processing step in the host's request chain.
///
/// リクエスト処理チェーンの終端
#[async_trait::async_trait]
pub trait RequestHandler<C>: Send + Sync
where
    C: Send + 'static,
{
    async fn handle(&self, ctx: C) -> C;
}

/// A processing step that may delegate to the next handler.
///
/// 次のハンドラへ委譲できる処理ステップ
#[async_trait::async_trait]
pub trait Middleware<C>: Send + Sync
where
    C: Send + 'static,
{
    async fn process(&self, ctx: C, next: &dyn RequestHandler<C>) -> C;
}

#[async_trait::async_trait]
impl<C> RequestHandler<C> for BoxedHandler<C>
where
    C: Send + 'static,
{
    async fn handle(&self, ctx: C) -> C {
        (self)(ctx).await
    }
}

#[async_trait::async_trait]
impl<C> RequestHandler<C> for Arc<BoxedHandler<C>>
where
    C: Send + 'static,
{
    async fn handle(&self, ctx: C) -> C {
        (self)(ctx).await
    }
}

#[async_trait::async_trait]
impl<C> Middleware<C> for BoxedHandler<C>
where
    C: Send + 'static,
{
    async fn process(&self, ctx: C, _next: &dyn RequestHandler<C>) -> C {
        (self)(ctx).await
    }
}

#[async_trait::async_trait]
impl<C> Middleware<C> for Arc<BoxedHandler<C>>
where
    C: Send + 'static,
{
    async fn process(&self, ctx: C, _next: &dyn RequestHandler<C>) -> C {
        (self)(ctx).await
    }
}

#[async_trait::async_trait]
impl<C, H> Middleware<C> for Route<H>
where
    C: Send + 'static,
    H: Middleware<C>,
{
    async fn process(&self, ctx: C, next: &dyn RequestHandler<C>) -> C {
        self.handler().process(ctx, next).await
    }
}

#[async_trait::async_trait]
impl<C, H> Middleware<C> for RouteResult<H>
where
    C: Send + 'static,
    H: Middleware<C>,
{
    async fn process(&self, ctx: C, next: &dyn RequestHandler<C>) -> C {
        match self.matched_route() {
            Some(route) => route.process(ctx, next).await,
            None => next.handle(ctx).await,
        }
    }
}
