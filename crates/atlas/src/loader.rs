//! Image loader that resolves parts on tokio tasks and completes on the main loop.
//!
//! Callbacks are never run on the loading task. Each finished load is sent
//! back over a channel and [`ConsoleLoader::drain`] runs its callback, the
//! way a UI toolkit posts results to its main thread.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use atlas_cells::{
    Error, ImageLoader, ImageRequest, ImageSource, LoadCallback, LoadedPart,
    MessagePartRequestHandler, Result,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::store::TranscriptStore;

type Handler = MessagePartRequestHandler<TranscriptStore>;

/// A finished load waiting for its callback.
pub struct Completion {
    request: ImageRequest,
    result: Result<()>,
    callback: LoadCallback,
}

/// Loads images for the transcript.
pub struct ConsoleLoader {
    handler: Arc<Handler>,
    completions: mpsc::UnboundedSender<Completion>,
    in_flight: Arc<AtomicUsize>,
    paused: Mutex<HashSet<String>>,
    deferred: Mutex<Vec<(ImageRequest, LoadCallback)>>,
}

impl ConsoleLoader {
    /// Creates a loader over `handler` and the receiver its completions arrive on.
    pub fn new(handler: Handler) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (completions, receiver) = mpsc::unbounded_channel();
        (
            Self {
                handler: Arc::new(handler),
                completions,
                in_flight: Arc::new(AtomicUsize::new(0)),
                paused: Mutex::new(HashSet::new()),
                deferred: Mutex::new(Vec::new()),
            },
            receiver,
        )
    }

    /// Number of loads started but not yet completed.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Number of loads held back by paused tags.
    pub fn deferred(&self) -> usize {
        self.deferred.lock().len()
    }

    /// Runs callbacks until no load is in flight.
    ///
    /// Callbacks may start further loads, which are waited for as well.
    pub async fn drain(&self, receiver: &mut mpsc::UnboundedReceiver<Completion>) {
        while self.in_flight() > 0 {
            let Some(completion) = receiver.recv().await else {
                break;
            };
            match &completion.result {
                Ok(()) => {
                    info!(source = %completion.request.source, tag = %completion.request.tag, "Image loaded");
                }
                Err(error) => {
                    warn!(source = %completion.request.source, %error, "Image load failed");
                }
            }
            (completion.callback)(completion.result);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn start(&self, request: ImageRequest, callback: LoadCallback) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let handler = Arc::clone(&self.handler);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = fetch(&handler, &request).await;
            if completions
                .send(Completion {
                    request,
                    result,
                    callback,
                })
                .is_err()
            {
                debug!("Main loop gone, dropping completion");
            }
        });
    }
}

impl ImageLoader for ConsoleLoader {
    fn load(&self, request: ImageRequest, on_complete: LoadCallback) {
        if self.paused.lock().contains(&request.tag) {
            debug!(tag = %request.tag, source = %request.source, "Load deferred");
            self.deferred.lock().push((request, on_complete));
            return;
        }
        self.start(request, on_complete);
    }

    fn pause_tag(&self, tag: &str) {
        self.paused.lock().insert(tag.to_string());
    }

    fn resume_tag(&self, tag: &str) {
        self.paused.lock().remove(tag);
        let ready: Vec<_> = {
            let mut deferred = self.deferred.lock();
            let (ready, held) = deferred.drain(..).partition(|(request, _)| request.tag == tag);
            *deferred = held;
            ready
        };
        for (request, callback) in ready {
            self.start(request, callback);
        }
    }
}

async fn fetch(handler: &Handler, request: &ImageRequest) -> Result<()> {
    match &request.source {
        ImageSource::Url(url) => {
            // Remote URLs are only reported.
            debug!(%url, "Remote image requested");
            Ok(())
        }
        ImageSource::Part(id) => {
            let LoadedPart { data, from } = handler.load(id.as_str()).await?;
            let decoded =
                image::load_from_memory(&data).map_err(|e| Error::ImageLoad(e.to_string()))?;
            debug!(
                part = %id,
                ?from,
                width = decoded.width(),
                height = decoded.height(),
                "Part decoded"
            );
            Ok(())
        }
    }
}
