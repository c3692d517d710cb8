use std::future::Future;

use anyhow::Result;

use crate::async_action::AsyncTask;
use crate::container::GetState;
use crate::dispatcher::Dispatcher;

/// Boxes an inline async body into a dispatchable task.
pub(crate) fn inline<State, R, F, Fut>(body: F) -> AsyncTask<State, R>
where
    State: Clone + Send + 'static,
    R: Send + 'static,
    F: FnOnce(Dispatcher<State>, GetState<State>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    Box::new(move |dispatcher, get_state| {
        let fut = body(dispatcher, get_state);
        Box::pin(fut)
    })
}

/// Builds a parameterized async action. Each invocation of the returned
/// factory clones the body and moves the given parameter into a fresh task,
/// so concurrently dispatched instances cannot observe each other's argument.
pub(crate) fn parameterized<State, P, R, F, Fut>(body: F) -> impl Fn(P) -> AsyncTask<State, R> + Send + Sync
where
    State: Clone + Send + 'static,
    P: Send + 'static,
    R: Send + 'static,
    F: Fn(Dispatcher<State>, GetState<State>, P) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    move |param: P| {
        let body = body.clone();
        let task: AsyncTask<State, R> = Box::new(move |dispatcher, get_state| {
            let fut = body(dispatcher, get_state, param);
            Box::pin(fut)
        });
        task
    }
}
