pub mod router;
pub mod route;
pub mod pattern;
pub mod dispatch;
pub mod middleware;
pub mod utils;
pub mod error;

pub use crate::router::Router as Router;
pub use crate::router::RouterConfig as RouterConfig;
pub use crate::router::GenRouter as GenRouter;
pub use crate::route::Route as Route;
pub use crate::route::RouteOptions as RouteOptions;
pub use crate::route::result::RouteResult as RouteResult;
pub use crate::middleware::BoxedHandler as BoxedHandler;
pub use crate::middleware::boxed_handler as boxed_handler;
pub use crate::error::RouterError as RouterError;
