//! A chat session: conversation state plus a busy flag.
//!
//! One request runs at a time. A prompt submitted while another is in
//! flight is rejected with [`Error::Busy`], not queued.

use crate::history::{ConversationState, DisplayEntry};
use crate::loop_runner::{Answer, ConversationLoop};
use docent_core::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// Shared handle to one conversation.
#[derive(Debug, Default)]
pub struct Session {
    state: Mutex<ConversationState>,
    busy: AtomicBool,
}

/// Clears the busy flag when dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn try_begin(&self) -> Result<BusyGuard<'_>, Error> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard(&self.busy))
            .map_err(|_| Error::Busy)
    }

    /// Run one prompt through the loop.
    pub async fn submit(&self, runner: &ConversationLoop, prompt: &str) -> Result<Answer, Error> {
        let _guard = self.try_begin()?;
        let mut state = self.state.lock().await;
        runner.respond(&mut state, prompt).await
    }

    /// Reset the conversation. Rejected while a request is in flight.
    pub async fn clear(&self) -> Result<(), Error> {
        let _guard = self.try_begin()?;
        self.state.lock().await.clear();
        Ok(())
    }

    pub async fn display(&self) -> Vec<DisplayEntry> {
        self.state.lock().await.display()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docent_core::error::ProviderError;
    use docent_core::provider::{
        BlockDelta, BlockStart, EventReceiver, Provider, ProviderRequest, StreamEvent,
    };
    use docent_core::tool::ToolRegistry;
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Answers after being released, so a request can be held in flight.
    struct GatedProvider {
        gate: Arc<Notify>,
        entered: Arc<Notify>,
    }

    #[async_trait]
    impl Provider for GatedProvider {
        fn name(&self) -> &str {
            "gated"
        }

        async fn stream(&self, _request: ProviderRequest) -> Result<EventReceiver, ProviderError> {
            self.entered.notify_one();
            self.gate.notified().await;
            let (tx, rx) = tokio::sync::mpsc::channel(4);
            tx.send(Ok(StreamEvent::BlockStart {
                index: 0,
                block: BlockStart::Text {
                    text: String::new(),
                },
            }))
            .await
            .unwrap();
            tx.send(Ok(StreamEvent::BlockDelta {
                index: 0,
                delta: BlockDelta::Text("answer".into()),
            }))
            .await
            .unwrap();
            tx.send(Ok(StreamEvent::MessageStop)).await.unwrap();
            Ok(rx)
        }
    }

    #[tokio::test]
    async fn second_prompt_rejected_while_busy() {
        let gate = Arc::new(Notify::new());
        let entered = Arc::new(Notify::new());
        let provider = Arc::new(GatedProvider {
            gate: gate.clone(),
            entered: entered.clone(),
        });
        let runner = Arc::new(ConversationLoop::new(
            provider,
            "m",
            Arc::new(ToolRegistry::new()),
        ));
        let session = Arc::new(Session::new());

        let first = {
            let session = session.clone();
            let runner = runner.clone();
            tokio::spawn(async move { session.submit(&runner, "first").await })
        };

        entered.notified().await;
        assert!(session.is_busy());

        let err = session.submit(&runner, "second").await.unwrap_err();
        assert!(matches!(err, Error::Busy));
        assert!(matches!(session.clear().await, Err(Error::Busy)));

        gate.notify_one();
        let answer = first.await.unwrap().unwrap();
        assert_eq!(answer.text, "answer");
        assert!(!session.is_busy());

        // Only the accepted prompt made it into history
        let display = session.display().await;
        assert_eq!(display.len(), 2);
    }

    #[tokio::test]
    async fn busy_flag_released_after_failure() {
        struct Failing;

        #[async_trait]
        impl Provider for Failing {
            fn name(&self) -> &str {
                "failing"
            }
            async fn stream(&self, _r: ProviderRequest) -> Result<EventReceiver, ProviderError> {
                Err(ProviderError::Network("connection refused".into()))
            }
        }

        let runner = ConversationLoop::new(Arc::new(Failing), "m", Arc::new(ToolRegistry::new()));
        let session = Session::new();

        assert!(session.submit(&runner, "q").await.is_err());
        assert!(!session.is_busy());
        assert!(session.display().await.is_empty());
        session.clear().await.unwrap();
    }
}
