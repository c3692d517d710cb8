use std::any::Any;
use std::future::Future;

use anyhow::Result;

use crate::async_action::{AsyncAction, AsyncTask};
use crate::container::{GetState, Subscription};
use crate::dispatcher::Dispatcher;
use crate::factory;
use crate::middleware::Middleware;

/// The public entry point: owns the dispatch pipeline for one state value.
pub struct Store<State> {
    dispatcher: Dispatcher<State>,
}

impl<State> Store<State>
where
    State: Clone + Default + Send + 'static,
{
    /// Builds a store by seeding the reducer with the default state and the
    /// reserved [`crate::InitAction`] marker, exactly once.
    pub fn new<R>(reducer: R) -> Result<Self>
    where
        R: Fn(State, &dyn Any) -> Result<State> + Send + Sync + 'static,
    {
        Ok(Self {
            dispatcher: Dispatcher::new(reducer)?,
        })
    }

    /// A cloneable handle over the same pipeline, for handing to other tasks.
    pub fn dispatcher(&self) -> Dispatcher<State> {
        self.dispatcher.clone()
    }

    pub fn get_state(&self) -> State {
        self.dispatcher.container().get_state()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&State) + Send + Sync + 'static,
    {
        self.dispatcher.container().subscribe(callback)
    }

    /// Replaces the active middleware chain. Layers observe actions in
    /// registration order on the way in and in reverse on the way out.
    pub fn register_middleware(&self, middlewares: Vec<Middleware<State>>) {
        self.dispatcher.install_middleware(middlewares);
    }

    pub fn dispatch<A: Any + Send>(&self, action: A) -> Result<()> {
        self.dispatcher.dispatch(action)
    }

    pub async fn dispatch_task<F, Fut, R>(&self, task: F) -> Result<R>
    where
        F: FnOnce(Dispatcher<State>, GetState<State>) -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        self.dispatcher.dispatch_task(task).await
    }

    pub async fn dispatch_unit<A>(&self, unit: A) -> Result<A::Output>
    where
        A: AsyncAction<State>,
    {
        self.dispatcher.dispatch_unit(unit).await
    }

    /// Wraps an inline async body into a dispatchable task. Mostly useful to
    /// pin down the closure's capability types at the definition site.
    pub fn async_action<R, F, Fut>(&self, body: F) -> AsyncTask<State, R>
    where
        R: Send + 'static,
        F: FnOnce(Dispatcher<State>, GetState<State>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
    {
        factory::inline(body)
    }

    /// Builds a parameterized async action: every invocation of the returned
    /// factory yields an independent task closing over its own argument.
    pub fn parameterized_async_action<P, R, F, Fut>(
        &self,
        body: F,
    ) -> impl Fn(P) -> AsyncTask<State, R> + Send + Sync
    where
        P: Send + 'static,
        R: Send + 'static,
        F: Fn(Dispatcher<State>, GetState<State>, P) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
    {
        factory::parameterized(body)
    }
}
