//! Single-flight request queue.
//!
//! Wraps one [`DirectionsFetcher`] so that at most one load runs at a time.
//! Requests posted while a load is in flight are parked in a
//! [`BoundedQueue`]; when the current load finishes, its caller is notified
//! and the most recently parked request starts next.
//!
//! ```text
//!   post(R0) ──► load(R0)                    active = R0
//!   post(R1) ──► pending [R1]
//!   post(R2) ──► pending [R2 R1]             (capacity 1: [R2], R1 displaced)
//!        R0 done ─► notify R0 ─► pop front ─► load(R2)
//! ```
//!
//! The pending queue is pushed and popped at the front, so service order is
//! last-in-first-out. With the default capacity of one, a new request
//! silently replaces the one waiting.

use std::cell::RefCell;
use std::sync::{Arc, Weak};

use parking_lot::ReentrantMutex;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::config::FetcherConfig;
use crate::directions::{notify_guarded, DirectionsFetcher, EndCallback};
use crate::geo::LatLng;
use crate::provider::{DirectionsProvider, ProviderError, ProviderFactory, ProviderId};
use crate::queue::BoundedQueue;
use crate::route::{Route, RouteOptions, VehicleType};
use crate::status::StatusCode;
use crate::transport::DirectionsTransport;

/// A request parked while another one is in flight.
#[derive(Clone)]
struct QueuedRequest {
    waypoints: Vec<LatLng>,
    vehicle: VehicleType,
    options: RouteOptions,
    callback: EndCallback,
}

struct FlightSession<T: DirectionsTransport> {
    fetcher: Option<Arc<DirectionsFetcher<T>>>,
    /// Callback of the request currently being served.
    active: Option<EndCallback>,
}

struct FlightInner<T: DirectionsTransport + Clone> {
    factory: ProviderFactory,
    transport: T,
    runtime: Handle,
    config: FetcherConfig,
    /// Re-entrant: the completion handler may start the next load, and a
    /// synchronous failure of that load re-enters the handler on the same
    /// thread. RefCell borrows are never held across a load.
    session: ReentrantMutex<RefCell<FlightSession<T>>>,
    pending: BoundedQueue<QueuedRequest>,
}

/// Serializes directions requests through one fetcher.
pub struct SingleFlightRequestQueue<T: DirectionsTransport + Clone> {
    inner: Arc<FlightInner<T>>,
}

impl<T: DirectionsTransport + Clone> SingleFlightRequestQueue<T> {
    pub fn new(factory: ProviderFactory, transport: T, runtime: Handle) -> Self {
        Self::with_config(factory, transport, runtime, FetcherConfig::default())
    }

    pub fn with_config(
        factory: ProviderFactory,
        transport: T,
        runtime: Handle,
        config: FetcherConfig,
    ) -> Self {
        Self {
            inner: Arc::new(FlightInner {
                factory,
                transport,
                runtime,
                config,
                session: ReentrantMutex::new(RefCell::new(FlightSession {
                    fetcher: None,
                    active: None,
                })),
                pending: BoundedQueue::new(config.queue_capacity()),
            }),
        }
    }

    /// Binds the queue to provider `id`.
    ///
    /// Does nothing if that provider is already bound. A load in flight on
    /// the previous fetcher still reports to its caller.
    ///
    /// # Errors
    ///
    /// Returns the factory's error if the provider cannot be created.
    pub fn set_provider(&self, id: ProviderId) -> Result<(), ProviderError> {
        self.inner.set_provider(id)
    }

    /// Binds an already constructed provider.
    pub fn bind_provider(&self, provider: Arc<dyn DirectionsProvider>) {
        self.inner.bind_provider(provider);
    }

    pub fn provider_id(&self) -> Option<ProviderId> {
        let guard = self.inner.session.lock();
        let session = guard.borrow();
        session.fetcher.as_ref().map(|f| f.provider_id())
    }

    /// Posts a request, starting it now if nothing is in flight.
    ///
    /// A `None` callback is ignored. If no provider is bound yet, the
    /// registry's default provider is bound first; if that fails the
    /// callback receives `InvalidRequest` on the calling thread.
    pub fn post_request(
        &self,
        waypoints: &[LatLng],
        vehicle: VehicleType,
        options: &RouteOptions,
        callback: Option<EndCallback>,
    ) {
        let Some(callback) = callback else {
            warn!(
                waypoints = waypoints.len(),
                "directions request posted without a callback, ignoring"
            );
            return;
        };
        self.inner.post(QueuedRequest {
            waypoints: waypoints.to_vec(),
            vehicle,
            options: *options,
            callback,
        });
    }

    /// Two-point form of [`post_request`](Self::post_request).
    pub fn post_between(
        &self,
        start: LatLng,
        stop: LatLng,
        vehicle: VehicleType,
        options: &RouteOptions,
        callback: Option<EndCallback>,
    ) {
        self.post_request(&[start, stop], vehicle, options, callback);
    }

    /// Cancels the request in flight; the next parked one then starts.
    pub fn cancel(&self) {
        let fetcher = {
            let guard = self.inner.session.lock();
            let session = guard.borrow();
            session.fetcher.clone()
        };
        if let Some(fetcher) = fetcher {
            fetcher.cancel();
        }
    }

    /// Whether a request is being served.
    pub fn is_busy(&self) -> bool {
        self.inner.session.lock().borrow().active.is_some()
    }

    pub fn pending_len(&self) -> usize {
        self.inner.pending.size()
    }

    /// The bound fetcher, if any.
    pub fn fetcher(&self) -> Option<Arc<DirectionsFetcher<T>>> {
        self.inner.session.lock().borrow().fetcher.clone()
    }
}

impl<T: DirectionsTransport + Clone> FlightInner<T> {
    fn set_provider(self: &Arc<Self>, id: ProviderId) -> Result<(), ProviderError> {
        let guard = self.session.lock();
        let bound = guard.borrow().fetcher.as_ref().map(|f| f.provider_id());
        if bound == Some(id) {
            return Ok(());
        }
        let provider = self.factory.create(id)?;
        self.bind_provider(provider);
        Ok(())
    }

    fn bind_provider(self: &Arc<Self>, provider: Arc<dyn DirectionsProvider>) {
        let id = provider.id();
        let fetcher = DirectionsFetcher::with_config(
            provider,
            self.transport.clone(),
            self.runtime.clone(),
            &self.config,
        );

        let weak: Weak<Self> = Arc::downgrade(self);
        fetcher.set_end_callback(move |status, routes| {
            if let Some(inner) = weak.upgrade() {
                inner.on_fetch_complete(status, routes);
            }
        });

        let guard = self.session.lock();
        guard.borrow_mut().fetcher = Some(Arc::new(fetcher));
        debug!(provider = %id, "single-flight queue bound to provider");
    }

    fn post(self: &Arc<Self>, request: QueuedRequest) {
        let guard = self.session.lock();

        if guard.borrow().active.is_some() {
            debug!(
                waypoints = request.waypoints.len(),
                pending = self.pending.size(),
                "directions request parked"
            );
            self.pending.push_front(request, false);
            return;
        }

        if guard.borrow().fetcher.is_none() {
            let default = self.factory.registry().default_provider();
            if let Err(e) = self.set_provider(default) {
                warn!(provider = %default, error = %e, "no directions provider available");
                notify_guarded(&request.callback, StatusCode::InvalidRequest, &[]);
                return;
            }
        }

        self.start(&guard, request);
    }

    /// Makes `request` the active one and loads it.
    fn start(&self, guard: &RefCell<FlightSession<T>>, request: QueuedRequest) {
        let fetcher = {
            let mut session = guard.borrow_mut();
            session.active = Some(Arc::clone(&request.callback));
            session.fetcher.clone()
        };
        let Some(fetcher) = fetcher else {
            guard.borrow_mut().active = None;
            notify_guarded(&request.callback, StatusCode::InvalidRequest, &[]);
            return;
        };

        info!(
            provider = %fetcher.provider_id(),
            waypoints = request.waypoints.len(),
            "serving directions request"
        );
        fetcher.load(&request.waypoints, request.vehicle, &request.options);
    }

    fn on_fetch_complete(&self, status: StatusCode, routes: &[Route]) {
        let guard = self.session.lock();

        // The active callback stays installed while it runs so that a
        // request posted from inside it is parked rather than started.
        let finished = guard.borrow().active.clone();
        match finished {
            Some(callback) => notify_guarded(&callback, status, routes),
            None => debug!(status = %status, "load finished with no active request"),
        }

        match self.pending.try_pop_front() {
            Some(next) => self.start(&guard, next),
            None => guard.borrow_mut().active = None,
        }
    }
}

impl<T: DirectionsTransport + Clone> Drop for SingleFlightRequestQueue<T> {
    fn drop(&mut self) {
        let guard = self.inner.session.lock();
        self.inner.pending.clear();

        let session = guard.borrow();
        if let Some(fetcher) = &session.fetcher {
            // The in-flight caller is still owed its notification.
            match session.active.clone() {
                Some(callback) => {
                    fetcher.set_end_callback(move |status, routes| callback(status, routes))
                }
                None => fetcher.clear_end_callback(),
            }
        }
    }
}
