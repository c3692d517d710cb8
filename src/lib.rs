//! Unidirectional state container: a single state value evolved by a pure
//! reducer over dispatched actions, observed through subscriptions and
//! intercepted by a composable middleware chain. Async actions receive
//! dispatch and state-read capabilities and may issue nested dispatches,
//! each taking full effect before their execution resumes.

mod async_action;
mod container;
mod dispatcher;
mod factory;
mod middleware;
mod store;

pub use async_action::{AsyncAction, AsyncTask};
pub use container::{GetState, InitAction, Subscription};
pub use dispatcher::Dispatcher;
pub use middleware::{DispatchFn, Middleware, MiddlewareApi, MiddlewareLayer, NextFn};
pub use store::Store;
