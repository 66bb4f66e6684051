//! Background environment for running [`Task`]s.

use std::{
    error::Error,
    future::{Future, IntoFuture},
};

use derive_more::Display;
use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _,
};
use tokio::task;
use tracing as log;

#[cfg(doc)]
use crate::Task;

/// Background environment running long-living [`Task`]s on a single thread.
///
/// Resolves once every spawned [`Task`] finishes, or as soon as any of them
/// fails.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set of tasks.
    set: task::LocalSet,

    /// Names and handles of the spawned tasks.
    handles: Vec<(&'static str, task::JoinHandle<Result<(), Box<dyn Error>>>)>,
}

impl Background {
    /// Spawns a new [`Task`] with the provided `name` inside the
    /// [`Background`] environment.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        let handle = self.set.spawn_local(async move {
            log::debug!("`{name}` task started");
            future.await.map_err(Box::<dyn Error>::from)
        });
        self.handles.push((name, handle));
    }
}

impl IntoFuture for Background {
    type Output = Result<(), Failure>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, handles } = self;

        let tasks = handles.into_iter().map(|(name, h)| {
            h.map(move |res| {
                let source: Box<dyn Error> = match res {
                    Ok(Ok(())) => {
                        log::info!("`{name}` task finished");
                        return Ok(());
                    }
                    Ok(Err(e)) => e,
                    Err(e) => Box::new(e),
                };
                Err(Failure { task: name, source })
            })
            .boxed_local()
        });

        future::try_join_all(tasks.chain([set.map(Ok).boxed_local()]))
            .map(|res| res.map(drop))
            .boxed_local()
    }
}

/// Failure of a [`Task`] spawned in a [`Background`].
#[derive(Debug, Display)]
#[display("`{task}` task failed: {source}")]
pub struct Failure {
    /// Name of the failed [`Task`].
    pub task: &'static str,

    /// Error the [`Task`] failed with.
    pub source: Box<dyn Error>,
}

impl Error for Failure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.source)
    }
}
