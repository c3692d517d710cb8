use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;

use crate::async_action::AsyncAction;
use crate::container::{GetState, StateContainer};
use crate::middleware::{self, DispatchFn, Middleware, MiddlewareApi};

/// Cloneable dispatch facade. This is the capability handed to async actions,
/// so their nested dispatches re-enter the same pipeline.
pub struct Dispatcher<State> {
    inner: Arc<Inner<State>>,
}

struct Inner<State> {
    container: Arc<StateContainer<State>>,
    chain: RwLock<DispatchFn>,
}

impl<State> Dispatcher<State>
where
    State: Clone + Send + 'static,
{
    pub(crate) fn new<R>(reducer: R) -> Result<Self>
    where
        State: Default,
        R: Fn(State, &dyn Any) -> Result<State> + Send + Sync + 'static,
    {
        let container = Arc::new(StateContainer::new(reducer)?);
        let terminal = Self::terminal(&container);
        Ok(Self {
            inner: Arc::new(Inner {
                container,
                chain: RwLock::new(terminal),
            }),
        })
    }

    /// Plain action: runs the middleware chain and the reducer to completion
    /// before returning.
    pub fn dispatch<A: Any + Send>(&self, action: A) -> Result<()> {
        let chain = self.inner.chain.read().clone();
        chain(&action)
    }

    /// Inline async callable: invoked with a dispatcher bound back to this
    /// pipeline and a state accessor. The returned future resolves once the
    /// callable's own execution finishes; an error inside it resolves the
    /// future as `Err`.
    pub async fn dispatch_task<F, Fut, R>(&self, task: F) -> Result<R>
    where
        F: FnOnce(Dispatcher<State>, GetState<State>) -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        task(self.clone(), self.get_state_accessor()).await
    }

    /// Named async action unit, see [`AsyncAction`].
    pub async fn dispatch_unit<A>(&self, unit: A) -> Result<A::Output>
    where
        A: AsyncAction<State>,
    {
        unit.dispatch(self.clone(), self.get_state_accessor()).await
    }

    pub(crate) fn container(&self) -> &Arc<StateContainer<State>> {
        &self.inner.container
    }

    pub(crate) fn get_state_accessor(&self) -> GetState<State> {
        GetState::new(self.inner.container.clone())
    }

    /// Replaces the active chain with a freshly composed one.
    pub(crate) fn install_middleware(&self, producers: Vec<Middleware<State>>) {
        let count = producers.len();
        let api = MiddlewareApi::new(self.inner.container.clone());
        let terminal = Self::terminal(&self.inner.container);
        let composed = middleware::compose(producers, api, terminal);
        *self.inner.chain.write() = composed;
        log::debug!("middleware chain rebuilt with {count} layers");
    }

    fn terminal(container: &Arc<StateContainer<State>>) -> DispatchFn {
        let container = container.clone();
        Arc::new(move |action: &dyn Any| container.dispatch(action))
    }
}

impl<State> Clone for Dispatcher<State> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::store::Store;
    use async_trait::async_trait;
    use std::time::Duration;

    #[derive(Clone, Default, Debug, PartialEq)]
    struct TestState {
        counter: i32,
    }

    struct Increment;

    fn reducer(mut state: TestState, action: &dyn Any) -> Result<TestState> {
        if action.downcast_ref::<Increment>().is_some() {
            state.counter += 1;
        }
        Ok(state)
    }

    struct IncrementAndEcho {
        param: i32,
    }

    #[async_trait]
    impl AsyncAction<TestState> for IncrementAndEcho {
        type Output = i32;

        async fn dispatch(
            self,
            dispatcher: Dispatcher<TestState>,
            get_state: GetState<TestState>,
        ) -> Result<i32> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let before = get_state.get().counter;
            dispatcher.dispatch(Increment)?;
            assert_eq!(get_state.get().counter, before + 1);
            Ok(self.param)
        }
    }

    struct ChainedEcho {
        param: i32,
    }

    #[async_trait]
    impl AsyncAction<TestState> for ChainedEcho {
        type Output = i32;

        async fn dispatch(
            self,
            dispatcher: Dispatcher<TestState>,
            _get_state: GetState<TestState>,
        ) -> Result<i32> {
            let inner = dispatcher
                .dispatch_unit(IncrementAndEcho { param: self.param })
                .await?;
            dispatcher.dispatch(Increment)?;
            Ok(self.param + inner)
        }
    }

    struct TouchOnce;

    #[async_trait]
    impl AsyncAction<TestState> for TouchOnce {
        type Output = ();

        async fn dispatch(
            self,
            dispatcher: Dispatcher<TestState>,
            _get_state: GetState<TestState>,
        ) -> Result<()> {
            dispatcher.dispatch(Increment)
        }
    }

    #[tokio::test]
    async fn unit_dispatch_resolves_result() {
        let store = Store::new(reducer).unwrap();
        let result = store
            .dispatch_unit(IncrementAndEcho { param: 60 })
            .await
            .unwrap();
        assert_eq!(result, 60);
        assert_eq!(store.get_state().counter, 1);
    }

    #[tokio::test]
    async fn nested_unit_dispatch_composes_results() {
        let store = Store::new(reducer).unwrap();
        let result = store.dispatch_unit(ChainedEcho { param: 60 }).await.unwrap();
        assert_eq!(result, 120);
        assert_eq!(store.get_state().counter, 2);
    }

    #[tokio::test]
    async fn unit_without_result_runs_to_completion() {
        let store = Store::new(reducer).unwrap();
        store.dispatch_unit(TouchOnce).await.unwrap();
        assert_eq!(store.get_state().counter, 1);
    }

    #[tokio::test]
    async fn plain_dispatch_interleaves_with_suspended_units() {
        let store = Store::new(reducer).unwrap();
        let suspended = store.dispatch_task(
            |_dispatcher: Dispatcher<TestState>, get_state: GetState<TestState>| async move {
                tokio::time::sleep(Duration::from_millis(40)).await;
                Ok(get_state.get().counter)
            },
        );
        let side = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            store.dispatch(Increment)
        };

        let (observed, side_result) = tokio::join!(suspended, side);
        side_result.unwrap();
        assert_eq!(observed.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_dispatchers_serialize_on_the_container() {
        let store = Store::new(reducer).unwrap();
        let mut handles = Vec::new();
        for _ in 0..4 {
            let dispatcher = store.dispatcher();
            handles.push(tokio::spawn(async move {
                for _ in 0..50 {
                    dispatcher.dispatch(Increment).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.get_state().counter, 200);
    }
}
