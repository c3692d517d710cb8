use anyhow::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::container::GetState;
use crate::dispatcher::Dispatcher;

/// The inline async action shape: a one-shot callable granted dispatch and
/// state-read capabilities, resolving to a result once its own execution
/// (including nested dispatches) finishes.
pub type AsyncTask<State, R> =
    Box<dyn FnOnce(Dispatcher<State>, GetState<State>) -> BoxFuture<'static, Result<R>> + Send>;

/// A named, reusable async action unit. Instances are consumed by dispatch;
/// the unit may issue nested dispatches of any shape through the handed-in
/// dispatcher, each taking full effect before execution resumes past it.
/// Use `Output = ()` for units without a result.
#[async_trait]
pub trait AsyncAction<State>: Send
where
    State: Clone + Send + 'static,
{
    type Output: Send;

    async fn dispatch(
        self,
        dispatcher: Dispatcher<State>,
        get_state: GetState<State>,
    ) -> Result<Self::Output>;
}
