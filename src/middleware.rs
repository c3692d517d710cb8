use std::any::Any;
use std::sync::Arc;

use anyhow::Result;

use crate::container::StateContainer;

/// A fully composed dispatch path ending at the container.
pub type DispatchFn = Arc<dyn Fn(&dyn Any) -> Result<()> + Send + Sync>;

/// The rest of the chain, as seen by a single layer.
pub type NextFn = dyn Fn(&dyn Any) -> Result<()>;

/// One link of the chain: receives the action and the next dispatch function.
pub type MiddlewareLayer = Box<dyn Fn(&dyn Any, &NextFn) -> Result<()> + Send + Sync>;

/// Middleware producer: given the container surface, builds a layer. Invoked
/// once, at registration.
pub type Middleware<State> = Box<dyn FnOnce(MiddlewareApi<State>) -> MiddlewareLayer + Send>;

/// Read and dispatch surface granted to middleware. Its `dispatch` goes
/// straight to the container, bypassing the chain.
pub struct MiddlewareApi<State> {
    container: Arc<StateContainer<State>>,
}

impl<State> MiddlewareApi<State>
where
    State: Clone + Send + 'static,
{
    pub(crate) fn new(container: Arc<StateContainer<State>>) -> Self {
        Self { container }
    }

    pub fn get_state(&self) -> State {
        self.container.get_state()
    }

    pub fn dispatch<A: Any + Send>(&self, action: A) -> Result<()> {
        self.container.dispatch(&action)
    }
}

impl<State> Clone for MiddlewareApi<State> {
    fn clone(&self) -> Self {
        Self {
            container: self.container.clone(),
        }
    }
}

/// Builds the single composed dispatch function. Layers are applied
/// right-to-left so the first producer in `producers` ends up outermost:
/// it observes the action first and the chain's completion last. With no
/// producers the terminal dispatch is returned as-is.
pub(crate) fn compose<State>(
    producers: Vec<Middleware<State>>,
    api: MiddlewareApi<State>,
    terminal: DispatchFn,
) -> DispatchFn
where
    State: Clone + Send + 'static,
{
    let layers: Vec<MiddlewareLayer> = producers
        .into_iter()
        .map(|produce| produce(api.clone()))
        .collect();

    let mut dispatch = terminal;
    for layer in layers.into_iter().rev() {
        let next = dispatch;
        dispatch = Arc::new(move |action: &dyn Any| layer(action, &*next));
    }
    dispatch
}
