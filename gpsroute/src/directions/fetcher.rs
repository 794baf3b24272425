//! Chunked directions fetcher.
//!
//! A [`DirectionsFetcher`] resolves one waypoint list at a time. `load`
//! returns immediately; the work runs as a task on the tokio runtime the
//! fetcher was built with:
//!
//! ```text
//!   load(waypoints)
//!     │  split into chunks of max_waypoints_per_request (shared boundaries)
//!     ▼
//!   for each chunk:  Chunking(i) ─► throttle ─► AwaitingResponse(i) ─► parse ─► accumulate
//!     │                                             │ transport error / bad status
//!     ▼                                             ▼
//!   Completed (Ok | ZeroResults)                 Error / Cancelled
//!     │
//!     ▼
//!   state published, get_status waiters released, end callback invoked
//! ```
//!
//! Every load ends with exactly one call to the end callback. A new
//! `load` while one is in flight cancels the old one, whose callback then
//! reports a cancelled status.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::chunk::split_into_chunks;
use super::notify_guarded;
use super::throttle::RequestThrottle;
use crate::config::FetcherConfig;
use crate::geo::LatLng;
use crate::provider::{DirectionsProvider, ProviderId};
use crate::route::{accumulate, Route, RouteOptions, VehicleType};
use crate::status::StatusCode;
use crate::transport::{DirectionsTransport, TransportError, TRANSPORT_CANCELLED};

/// Callback invoked once when a load finishes.
pub type EndCallback = Arc<dyn Fn(StatusCode, &[Route]) + Send + Sync>;

/// Progress of the current load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    /// Building the request for chunk `i`.
    Chunking(usize),
    /// Waiting for the response to chunk `i`.
    AwaitingResponse(usize),
    Completed,
    Error,
    Cancelled,
}

impl FetchState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FetchState::Completed | FetchState::Error | FetchState::Cancelled
        )
    }
}

struct FetchSession {
    state: FetchState,
    routes: Vec<Route>,
    /// Incremented by every `load`; tasks only write while it still matches.
    generation: u64,
    /// Generation and status of the most recently finished load.
    finished: Option<(u64, StatusCode)>,
    cancel: Option<CancellationToken>,
}

struct FetchShared {
    session: Mutex<FetchSession>,
    finished: Condvar,
    on_end: Mutex<Option<EndCallback>>,
}

impl FetchShared {
    /// Publishes partial routes while the load is still current.
    fn publish(&self, generation: u64, state: FetchState, routes: Option<&[Route]>) -> bool {
        let mut session = self.session.lock();
        if session.generation != generation {
            return false;
        }
        session.state = state;
        if let Some(routes) = routes {
            session.routes = routes.to_vec();
        }
        true
    }

    fn finish(&self, generation: u64, state: FetchState, status: StatusCode, routes: Vec<Route>) {
        {
            let mut session = self.session.lock();
            if session.generation == generation {
                session.state = state;
                session.routes = routes.clone();
                session.finished = Some((generation, status));
                session.cancel = None;
            }
        }
        self.finished.notify_all();

        debug!(
            generation = generation,
            status = %status,
            routes = routes.len(),
            "directions load finished"
        );

        let callback = self.on_end.lock().clone();
        if let Some(callback) = callback {
            notify_guarded(&callback, status, &routes);
        }
    }
}

/// Fetches directions for arbitrarily long waypoint lists.
pub struct DirectionsFetcher<T: DirectionsTransport> {
    provider: Arc<dyn DirectionsProvider>,
    transport: Arc<T>,
    runtime: Handle,
    throttle: Arc<RequestThrottle>,
    shared: Arc<FetchShared>,
}

impl<T: DirectionsTransport> DirectionsFetcher<T> {
    /// Creates a fetcher that runs its loads on `runtime`.
    pub fn new(provider: Arc<dyn DirectionsProvider>, transport: T, runtime: Handle) -> Self {
        Self::with_config(provider, transport, runtime, &FetcherConfig::default())
    }

    pub fn with_config(
        provider: Arc<dyn DirectionsProvider>,
        transport: T,
        runtime: Handle,
        config: &FetcherConfig,
    ) -> Self {
        let interval = config
            .min_request_interval()
            .unwrap_or_else(|| provider.min_request_interval());

        Self {
            provider,
            transport: Arc::new(transport),
            runtime,
            throttle: Arc::new(RequestThrottle::new(interval)),
            shared: Arc::new(FetchShared {
                session: Mutex::new(FetchSession {
                    state: FetchState::Idle,
                    routes: Vec::new(),
                    generation: 0,
                    finished: None,
                    cancel: None,
                }),
                finished: Condvar::new(),
                on_end: Mutex::new(None),
            }),
        }
    }

    pub fn provider(&self) -> &Arc<dyn DirectionsProvider> {
        &self.provider
    }

    pub fn provider_id(&self) -> ProviderId {
        self.provider.id()
    }

    /// Installs the end callback; it is read when a load finishes, so a
    /// replacement applies to the load in flight.
    pub fn set_end_callback<F>(&self, callback: F)
    where
        F: Fn(StatusCode, &[Route]) + Send + Sync + 'static,
    {
        *self.shared.on_end.lock() = Some(Arc::new(callback));
    }

    pub fn clear_end_callback(&self) {
        *self.shared.on_end.lock() = None;
    }

    /// Starts resolving `waypoints`.
    ///
    /// With fewer than two waypoints, or a provider that cannot carry two
    /// per request, the load fails synchronously with `BadArguments` and
    /// the callback runs on the calling thread.
    pub fn load(&self, waypoints: &[LatLng], vehicle: VehicleType, options: &RouteOptions) {
        let max = self.provider.max_waypoints_per_request();
        let chunks = split_into_chunks(waypoints, max);

        let (generation, token) = {
            let mut session = self.shared.session.lock();
            if let Some(previous) = session.cancel.take() {
                debug!(
                    generation = session.generation,
                    "superseding in-flight directions load"
                );
                previous.cancel();
                session.finished = Some((
                    session.generation,
                    StatusCode::Http(TRANSPORT_CANCELLED),
                ));
            }

            session.generation += 1;
            session.routes.clear();

            if chunks.is_empty() {
                session.state = FetchState::Error;
                session.finished = Some((session.generation, StatusCode::BadArguments));
                (session.generation, None)
            } else {
                let token = CancellationToken::new();
                session.state = FetchState::Chunking(0);
                session.cancel = Some(token.clone());
                (session.generation, Some(token))
            }
        };
        self.shared.finished.notify_all();

        let Some(token) = token else {
            warn!(
                waypoints = waypoints.len(),
                max_per_request = max,
                "directions load rejected"
            );
            let callback = self.shared.on_end.lock().clone();
            if let Some(callback) = callback {
                notify_guarded(&callback, StatusCode::BadArguments, &[]);
            }
            return;
        };

        info!(
            provider = %self.provider.id(),
            waypoints = waypoints.len(),
            chunks = chunks.len(),
            generation = generation,
            "directions load started"
        );

        let task = FetchTask {
            provider: Arc::clone(&self.provider),
            transport: Arc::clone(&self.transport),
            throttle: Arc::clone(&self.throttle),
            shared: Arc::clone(&self.shared),
            generation,
            token,
            chunks,
            vehicle,
            options: *options,
        };
        let shared = Arc::clone(&self.shared);
        let handle = self.runtime.spawn(task.run());
        self.runtime.spawn(async move {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    warn!(generation = generation, "directions load panicked");
                    shared.finish(
                        generation,
                        FetchState::Error,
                        StatusCode::UnknownError,
                        Vec::new(),
                    );
                }
            }
        });
    }

    /// Two-point form of [`load`](Self::load).
    pub fn load_between(
        &self,
        start: LatLng,
        stop: LatLng,
        vehicle: VehicleType,
        options: &RouteOptions,
    ) {
        self.load(&[start, stop], vehicle, options);
    }

    /// Cancels the load in flight, if any.
    pub fn cancel(&self) {
        if let Some(token) = &self.shared.session.lock().cancel {
            token.cancel();
        }
    }

    /// Blocks until the current load finishes and returns its status.
    ///
    /// Returns `Timeout` if `timeout` elapses first. A load superseded by a
    /// newer one reports a cancelled status. This blocks the calling
    /// thread and must not be called from the fetcher's runtime workers.
    pub fn get_status(&self, timeout: Option<Duration>) -> StatusCode {
        // An unrepresentable deadline means wait without one.
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut session = self.shared.session.lock();
        let generation = session.generation;

        loop {
            match session.finished {
                Some((finished, status)) if finished == generation => return status,
                Some((finished, _)) if finished > generation => {
                    return StatusCode::Http(TRANSPORT_CANCELLED)
                }
                _ if generation == 0 => return StatusCode::InvalidRequest,
                _ => {}
            }

            match deadline {
                Some(deadline) => {
                    if self
                        .shared
                        .finished
                        .wait_until(&mut session, deadline)
                        .timed_out()
                    {
                        return match session.finished {
                            Some((finished, status)) if finished == generation => status,
                            _ => StatusCode::Timeout,
                        };
                    }
                }
                None => self.shared.finished.wait(&mut session),
            }
        }
    }

    /// Status of the most recently finished load.
    pub fn status(&self) -> StatusCode {
        self.shared
            .session
            .lock()
            .finished
            .map_or(StatusCode::InvalidRequest, |(_, status)| status)
    }

    pub fn state(&self) -> FetchState {
        self.shared.session.lock().state
    }

    /// Routes accumulated so far by the current load.
    pub fn routes(&self) -> Vec<Route> {
        self.shared.session.lock().routes.clone()
    }
}

struct FetchTask<T: DirectionsTransport> {
    provider: Arc<dyn DirectionsProvider>,
    transport: Arc<T>,
    throttle: Arc<RequestThrottle>,
    shared: Arc<FetchShared>,
    generation: u64,
    token: CancellationToken,
    chunks: Vec<Vec<LatLng>>,
    vehicle: VehicleType,
    options: RouteOptions,
}

impl<T: DirectionsTransport> FetchTask<T> {
    async fn run(self) {
        let total = self.chunks.len();
        let mut routes: Vec<Route> = Vec::new();

        for (index, chunk) in self.chunks.iter().enumerate() {
            if self.token.is_cancelled() {
                return self.cancelled(routes);
            }
            self.shared
                .publish(self.generation, FetchState::Chunking(index), None);

            let request = match self.provider.build_request(chunk, self.vehicle, &self.options) {
                Ok(request) => request,
                Err(status) => {
                    warn!(chunk = index, status = %status, "could not build directions request");
                    return self.failed(status, routes);
                }
            };

            tokio::select! {
                biased;
                _ = self.token.cancelled() => return self.cancelled(routes),
                _ = self.throttle.until_ready() => {}
            }

            self.shared
                .publish(self.generation, FetchState::AwaitingResponse(index), None);
            debug!(chunk = index, total = total, url = %request.url, "requesting chunk");

            let response = tokio::select! {
                biased;
                _ = self.token.cancelled() => Err(TransportError::cancelled()),
                response = self.transport.send(&request) => response,
            };

            let body = match response {
                Ok(body) => body,
                Err(e) if e.is_cancelled() => return self.cancelled(routes),
                Err(e) => {
                    let status = self
                        .provider
                        .classify_error(&e)
                        .unwrap_or(StatusCode::Http(e.code));
                    warn!(chunk = index, error = %e, status = %status, "directions request failed");
                    return self.failed(status, routes);
                }
            };

            let route = match self.provider.parse_response(&body, self.vehicle, &self.options) {
                Ok(route) => route,
                Err(status) => {
                    warn!(chunk = index, status = %status, "directions response rejected");
                    return self.failed(status, routes);
                }
            };

            accumulate(&mut routes, route, self.options.is_linked());
            self.shared
                .publish(self.generation, FetchState::Chunking(index + 1), Some(&routes));
        }

        let status = if routes.is_empty() {
            StatusCode::ZeroResults
        } else {
            StatusCode::Ok
        };
        self.shared
            .finish(self.generation, FetchState::Completed, status, routes);
    }

    fn failed(&self, status: StatusCode, routes: Vec<Route>) {
        self.shared
            .finish(self.generation, FetchState::Error, status, routes);
    }

    fn cancelled(&self, routes: Vec<Route>) {
        debug!(generation = self.generation, "directions load cancelled");
        self.shared.finish(
            self.generation,
            FetchState::Cancelled,
            TransportError::cancelled().into(),
            routes,
        );
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::geo::{Location, Locations, Polyline};
    use crate::provider::{ProviderRegistry, ProviderSettings};
    use crate::route::{Summary, TravelOptions};
    use crate::transport::tests::MockTransport;
    use crate::transport::DirectionsRequest;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    /// Provider whose responses are the chunk's points as text
    /// (`"lat,lng;lat,lng;..."`), each segment counting 100 m and 10 s.
    pub struct EchoProvider {
        pub max_waypoints: usize,
    }

    impl DirectionsProvider for EchoProvider {
        fn id(&self) -> ProviderId {
            ProviderId::Osrm
        }

        fn supported_travel_options(&self) -> TravelOptions {
            BTreeMap::new()
        }

        fn max_waypoints_per_request(&self) -> usize {
            self.max_waypoints
        }

        fn build_request(
            &self,
            chunk: &[LatLng],
            _vehicle: VehicleType,
            _options: &RouteOptions,
        ) -> Result<DirectionsRequest, StatusCode> {
            let points: Vec<String> = chunk.iter().map(|p| p.to_string()).collect();
            Ok(DirectionsRequest::get(format!("echo://{}", points.join(";"))))
        }

        fn parse_response(
            &self,
            body: &[u8],
            vehicle: VehicleType,
            options: &RouteOptions,
        ) -> Result<Route, StatusCode> {
            let text = std::str::from_utf8(body).map_err(|_| StatusCode::InvalidRequest)?;
            if text == "NOT_FOUND" {
                return Err(StatusCode::NotFound);
            }
            let points: Vec<LatLng> = text
                .split(';')
                .map(|p| p.parse().map_err(|_| StatusCode::InvalidRequest))
                .collect::<Result<_, _>>()?;

            let segments = points.len().saturating_sub(1) as f64;
            let mut route = Route::new(vehicle, *options);
            route.summary = Summary::new(100.0 * segments, 10.0 * segments);
            route.polyline = Polyline::from_path(points.clone());
            route.locations =
                Locations::from(points.into_iter().map(Location::from).collect::<Vec<_>>());
            Ok(route)
        }
    }

    /// Scripts an echo response for each chunk of `waypoints`.
    pub fn script_echo(transport: &MockTransport, waypoints: &[LatLng], max: usize) {
        for chunk in split_into_chunks(waypoints, max) {
            let points: Vec<String> = chunk.iter().map(|p| p.to_string()).collect();
            transport.push_ok(points.join(";"));
        }
    }

    pub fn line(n: usize) -> Vec<LatLng> {
        (0..n).map(|i| LatLng::new(0.0, i as f64 * 0.01)).collect()
    }

    fn fetcher(max: usize, transport: MockTransport) -> DirectionsFetcher<MockTransport> {
        DirectionsFetcher::new(
            Arc::new(EchoProvider {
                max_waypoints: max,
            }),
            transport,
            Handle::current(),
        )
    }

    fn recording_callback(
        fetcher: &DirectionsFetcher<MockTransport>,
    ) -> mpsc::Receiver<(StatusCode, Vec<Route>)> {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        fetcher.set_end_callback(move |status, routes| {
            let _ = tx.lock().send((status, routes.to_vec()));
        });
        rx
    }

    async fn wait_status(fetcher: &DirectionsFetcher<MockTransport>) -> StatusCode {
        tokio::task::block_in_place(|| fetcher.get_status(Some(Duration::from_secs(5))))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_single_chunk_ok() {
        let transport = MockTransport::new();
        let waypoints = line(3);
        script_echo(&transport, &waypoints, 25);

        let fetcher = fetcher(25, transport.clone());
        let rx = recording_callback(&fetcher);
        fetcher.load(&waypoints, VehicleType::Car, &RouteOptions::road());

        assert_eq!(wait_status(&fetcher).await, StatusCode::Ok);
        assert_eq!(fetcher.state(), FetchState::Completed);
        assert_eq!(transport.request_count(), 1);

        let (status, routes) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(status, StatusCode::Ok);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].summary.distance(), 200.0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_get_status_accepts_unbounded_timeout() {
        let transport = MockTransport::new();
        let waypoints = line(3);
        script_echo(&transport, &waypoints, 25);

        let fetcher = fetcher(25, transport);
        fetcher.load(&waypoints, VehicleType::Car, &RouteOptions::road());

        let status =
            tokio::task::block_in_place(|| fetcher.get_status(Some(Duration::MAX)));
        assert_eq!(status, StatusCode::Ok);
    }

    /// Echoes like [`EchoProvider`] but panics while parsing.
    struct PanickingProvider(EchoProvider);

    impl DirectionsProvider for PanickingProvider {
        fn id(&self) -> ProviderId {
            self.0.id()
        }

        fn supported_travel_options(&self) -> TravelOptions {
            self.0.supported_travel_options()
        }

        fn max_waypoints_per_request(&self) -> usize {
            self.0.max_waypoints_per_request()
        }

        fn build_request(
            &self,
            chunk: &[LatLng],
            vehicle: VehicleType,
            options: &RouteOptions,
        ) -> Result<DirectionsRequest, StatusCode> {
            self.0.build_request(chunk, vehicle, options)
        }

        fn parse_response(
            &self,
            _body: &[u8],
            _vehicle: VehicleType,
            _options: &RouteOptions,
        ) -> Result<Route, StatusCode> {
            panic!("parser blew up");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panicking_load_still_finishes() {
        let transport = MockTransport::new();
        let waypoints = line(3);
        script_echo(&transport, &waypoints, 25);

        let fetcher = DirectionsFetcher::new(
            Arc::new(PanickingProvider(EchoProvider { max_waypoints: 25 })),
            transport,
            Handle::current(),
        );
        let rx = recording_callback(&fetcher);
        fetcher.load(&waypoints, VehicleType::Car, &RouteOptions::road());

        assert_eq!(wait_status(&fetcher).await, StatusCode::UnknownError);
        assert_eq!(fetcher.state(), FetchState::Error);

        let (status, routes) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(status, StatusCode::UnknownError);
        assert!(routes.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_linked_chunks_merge_into_one_route() {
        let transport = MockTransport::new();
        let waypoints = line(5);
        script_echo(&transport, &waypoints, 3);

        let fetcher = fetcher(3, transport.clone());
        fetcher.load(&waypoints, VehicleType::Car, &RouteOptions::road());

        assert_eq!(wait_status(&fetcher).await, StatusCode::Ok);
        let routes = fetcher.routes();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].summary.distance(), 400.0);
        assert_eq!(routes[0].summary.duration(), 40.0);
        assert_eq!(routes[0].polyline.len(), 5);
        assert_eq!(routes[0].locations.len(), 5);

        let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(urls.len(), 2);
        assert!(urls[0].ends_with(&waypoints[2].to_string()));
        assert!(urls[1].starts_with(&format!("echo://{}", waypoints[2])));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unlinked_chunks_stay_separate() {
        let transport = MockTransport::new();
        let waypoints = line(6);
        script_echo(&transport, &waypoints, 3);

        let fetcher = fetcher(3, transport);
        fetcher.load(
            &waypoints,
            VehicleType::Car,
            &RouteOptions::road().with_linked(false),
        );

        assert_eq!(wait_status(&fetcher).await, StatusCode::Ok);
        assert_eq!(fetcher.routes().len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_bad_arguments_are_synchronous() {
        let transport = MockTransport::new();
        let fetcher = fetcher(25, transport.clone());
        let rx = recording_callback(&fetcher);

        fetcher.load(&line(1), VehicleType::Car, &RouteOptions::road());
        let (status, routes) = rx.try_recv().unwrap();
        assert_eq!(status, StatusCode::BadArguments);
        assert!(routes.is_empty());
        assert_eq!(fetcher.get_status(None), StatusCode::BadArguments);
        assert_eq!(fetcher.state(), FetchState::Error);
        assert_eq!(transport.request_count(), 0);

        let narrow = self::fetcher(1, transport.clone());
        narrow.load(&line(10), VehicleType::Car, &RouteOptions::road());
        assert_eq!(narrow.get_status(None), StatusCode::BadArguments);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_transport_failure_aborts_remaining_chunks() {
        let transport = MockTransport::new();
        let waypoints = line(5);
        let chunks = split_into_chunks(&waypoints, 3);
        let first: Vec<String> = chunks[0].iter().map(|p| p.to_string()).collect();
        transport.push_ok(first.join(";"));
        transport.push_err(503);

        let fetcher = fetcher(3, transport.clone());
        let rx = recording_callback(&fetcher);
        fetcher.load(&waypoints, VehicleType::Car, &RouteOptions::road());

        assert_eq!(wait_status(&fetcher).await, StatusCode::Http(503));
        assert_eq!(fetcher.state(), FetchState::Error);
        assert_eq!(transport.request_count(), 2);

        let (status, routes) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(status, StatusCode::Http(503));
        assert_eq!(routes.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_provider_status_aborts() {
        let transport = MockTransport::new();
        transport.push_ok("NOT_FOUND");

        let fetcher = fetcher(3, transport.clone());
        fetcher.load(&line(5), VehicleType::Car, &RouteOptions::road());

        assert_eq!(wait_status(&fetcher).await, StatusCode::NotFound);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_get_status_times_out() {
        let transport = MockTransport::new().with_delay(Duration::from_secs(2));
        let waypoints = line(2);
        script_echo(&transport, &waypoints, 25);

        let fetcher = fetcher(25, transport);
        fetcher.load(&waypoints, VehicleType::Car, &RouteOptions::road());

        let status = tokio::task::block_in_place(|| {
            fetcher.get_status(Some(Duration::from_millis(50)))
        });
        assert_eq!(status, StatusCode::Timeout);
        assert!(!fetcher.state().is_terminal());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_reports_cancelled_once() {
        let transport = MockTransport::new().with_delay(Duration::from_secs(5));
        let waypoints = line(2);
        script_echo(&transport, &waypoints, 25);

        let fetcher = fetcher(25, transport);
        let rx = recording_callback(&fetcher);
        fetcher.load(&waypoints, VehicleType::Car, &RouteOptions::road());
        tokio::time::sleep(Duration::from_millis(20)).await;
        fetcher.cancel();

        let status = wait_status(&fetcher).await;
        assert!(status.is_cancelled());
        assert_eq!(fetcher.state(), FetchState::Cancelled);

        let (status, _) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(status, StatusCode::Http(TRANSPORT_CANCELLED));
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_new_load_supersedes_previous() {
        let transport = MockTransport::new().with_delay(Duration::from_millis(200));
        let first = line(2);
        let second = vec![LatLng::new(1.0, 1.0), LatLng::new(1.0, 2.0)];
        // The first load is cancelled before its response is consumed.
        script_echo(&transport, &second, 25);

        let fetcher = fetcher(25, transport);
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&finished);
        fetcher.set_end_callback(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        fetcher.load(&first, VehicleType::Car, &RouteOptions::road());
        fetcher.load(&second, VehicleType::Car, &RouteOptions::road());

        assert_eq!(wait_status(&fetcher).await, StatusCode::Ok);
        let routes = fetcher.routes();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].polyline.path()[0], second[0]);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panicking_callback_is_contained() {
        let transport = MockTransport::new();
        let waypoints = line(2);
        script_echo(&transport, &waypoints, 25);
        script_echo(&transport, &waypoints, 25);

        let fetcher = fetcher(25, transport);
        fetcher.set_end_callback(|_, _| panic!("callback failure"));
        fetcher.load(&waypoints, VehicleType::Car, &RouteOptions::road());
        assert_eq!(wait_status(&fetcher).await, StatusCode::Ok);

        fetcher.load(&waypoints, VehicleType::Car, &RouteOptions::road());
        assert_eq!(wait_status(&fetcher).await, StatusCode::Ok);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_callback_replaced_mid_flight() {
        let transport = MockTransport::new().with_delay(Duration::from_millis(100));
        let waypoints = line(2);
        script_echo(&transport, &waypoints, 25);

        let fetcher = fetcher(25, transport);
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let c1 = Arc::clone(&first);
        fetcher.set_end_callback(move |_, _| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        fetcher.load(&waypoints, VehicleType::Car, &RouteOptions::road());

        let c2 = Arc::clone(&second);
        fetcher.set_end_callback(move |_, _| {
            c2.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(wait_status(&fetcher).await, StatusCode::Ok);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_osrm_provider_end_to_end() {
        let registry = ProviderRegistry::new();
        registry
            .add(
                ProviderId::Osrm,
                ProviderSettings::default().with_base_url("http://osrm.local"),
            )
            .unwrap();
        let provider = crate::provider::ProviderFactory::new(registry)
            .create(ProviderId::Osrm)
            .unwrap();

        let transport = MockTransport::new();
        transport.push_ok(crate::provider::OSRM_OK_BODY);
        let fetcher = DirectionsFetcher::new(provider, transport.clone(), Handle::current());
        fetcher.load_between(
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 1.0),
            VehicleType::Car,
            &RouteOptions::road(),
        );

        assert_eq!(wait_status(&fetcher).await, StatusCode::Ok);
        assert_eq!(fetcher.routes()[0].locations.len(), 2);
        assert!(transport.requests()[0]
            .url
            .starts_with("http://osrm.local/route/v1/driving/0,0;1,0"));
    }

    #[test]
    fn test_get_status_before_any_load() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let fetcher = DirectionsFetcher::new(
            Arc::new(EchoProvider { max_waypoints: 25 }),
            MockTransport::new(),
            runtime.handle().clone(),
        );
        assert_eq!(fetcher.get_status(None), StatusCode::InvalidRequest);
        assert_eq!(fetcher.state(), FetchState::Idle);
    }
}
