use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::resolver::{Resolver, WeatherState};

/// A mounted weather display.
///
/// Mounting spawns one resolution on the current Tokio runtime. Unmounting
/// (or dropping the widget) cancels it; nothing is published afterwards.
#[derive(Debug)]
pub struct WeatherWidget {
    state: watch::Receiver<WeatherState>,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl WeatherWidget {
    pub fn mount(resolver: Resolver) -> Self {
        let (tx, rx) = watch::channel(WeatherState::new());
        let token = CancellationToken::new();
        let run_token = token.clone();

        let task = tokio::spawn(async move {
            resolver
                .resolve(&run_token, |state| {
                    tx.send_replace(state.clone());
                })
                .await;
        });

        Self {
            state: rx,
            token,
            task: Some(task),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> WeatherState {
        self.state.borrow().clone()
    }

    pub fn is_mounted(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Wait until loading finishes.
    ///
    /// If the widget was unmounted first, returns the last published state,
    /// which is still loading.
    pub async fn resolved(&mut self) -> WeatherState {
        if let Ok(state) = self.state.wait_for(|s| !s.loading).await {
            return state.clone();
        }
        self.state.borrow().clone()
    }

    pub fn unmount(&self) {
        if !self.token.is_cancelled() {
            debug!("unmounting weather widget");
            self.token.cancel();
        }
    }

    /// Unmount and wait for the resolution task to wind down.
    pub async fn close(mut self) {
        self.unmount();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                debug!("weather task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for WeatherWidget {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
