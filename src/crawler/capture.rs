//! Network capture recorder
//!
//! A fetcher reports what happens on the wire during one navigation by pushing
//! events into a [`NetworkCapture`]. The crawler resets the recorder before each
//! fetch attempt and drains it once the navigation has completed, so captured
//! traffic always belongs to exactly one page.

use crate::page::{Download, Resource, ResourceRequest};
use std::collections::BTreeMap;

/// Default upper bound for buffered events per navigation
pub const DEFAULT_CAPTURE_CAPACITY: usize = 10_000;

/// One network event observed during a navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    /// A response was received
    Response {
        url: String,
        status_code: u16,
        headers: BTreeMap<String, String>,
    },

    /// A request finished without failure
    RequestFinished {
        url: String,
        sizes: BTreeMap<String, u64>,
        headers: BTreeMap<String, String>,
    },

    /// A request failed
    RequestFailed { url: String, failure: String },
}

/// Traffic of one navigation, sorted into page record fields
#[derive(Debug, Clone, Default)]
pub struct CapturedTraffic {
    pub elements: Vec<Resource>,
    pub requests: Vec<ResourceRequest>,
    pub failed_requests: Vec<ResourceRequest>,
    pub downloads: Vec<Download>,
}

/// Bounded buffer for the network events of a single navigation
#[derive(Debug)]
pub struct NetworkCapture {
    events: Vec<NetworkEvent>,
    downloads: Vec<Download>,
    capacity: usize,
    dropped: usize,
}

impl NetworkCapture {
    /// Creates a recorder that buffers at most `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::new(),
            downloads: Vec::new(),
            capacity,
            dropped: 0,
        }
    }

    /// Clears everything recorded so far
    pub fn reset(&mut self) {
        self.events.clear();
        self.downloads.clear();
        self.dropped = 0;
    }

    /// Buffers an event, dropping it once the buffer is full
    pub fn record(&mut self, event: NetworkEvent) {
        if self.events.len() >= self.capacity {
            self.dropped += 1;
            return;
        }
        self.events.push(event);
    }

    /// Records a received response
    pub fn on_response(&mut self, url: &str, status_code: u16, headers: BTreeMap<String, String>) {
        self.record(NetworkEvent::Response {
            url: url.to_string(),
            status_code,
            headers,
        });
    }

    /// Records a request that finished
    pub fn on_request_finished(
        &mut self,
        url: &str,
        sizes: BTreeMap<String, u64>,
        headers: BTreeMap<String, String>,
    ) {
        self.record(NetworkEvent::RequestFinished {
            url: url.to_string(),
            sizes,
            headers,
        });
    }

    /// Records a request that failed
    pub fn on_request_failed(&mut self, url: &str, failure: impl Into<String>) {
        self.record(NetworkEvent::RequestFailed {
            url: url.to_string(),
            failure: failure.into(),
        });
    }

    /// Records a download started by the navigation
    ///
    /// Downloads are kept outside the bounded buffer so they can always be cancelled.
    pub fn on_download(&mut self, download: Download) {
        self.downloads.push(download);
    }

    /// Returns true if at least one response was captured
    pub fn has_responses(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, NetworkEvent::Response { .. }))
    }

    /// Number of buffered events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if nothing has been captured
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.downloads.is_empty()
    }

    /// Number of events dropped because the buffer was full
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Empties the recorder into typed page record fields
    pub fn drain(&mut self) -> CapturedTraffic {
        if self.dropped > 0 {
            tracing::warn!(
                "Network capture full: dropped {} events after {}",
                self.dropped,
                self.capacity
            );
        }

        let mut traffic = CapturedTraffic {
            downloads: std::mem::take(&mut self.downloads),
            ..CapturedTraffic::default()
        };

        for event in self.events.drain(..) {
            match event {
                NetworkEvent::Response {
                    url,
                    status_code,
                    headers,
                } => traffic.elements.push(Resource {
                    url,
                    status_code: Some(status_code),
                    headers,
                }),
                NetworkEvent::RequestFinished {
                    url,
                    sizes,
                    headers,
                } => traffic.requests.push(ResourceRequest {
                    url,
                    sizes,
                    failure: None,
                    headers,
                }),
                NetworkEvent::RequestFailed { url, failure } => {
                    traffic.failed_requests.push(ResourceRequest::failed(url, failure))
                }
            }
        }

        self.dropped = 0;
        traffic
    }
}

impl Default for NetworkCapture {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPTURE_CAPACITY)
    }
}
