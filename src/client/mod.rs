//! Detection Client Module
//!
//! The cache orchestrator. Sits above two independent LRU cache instances
//! (device-identifier keyed and header-fingerprint keyed), decides which one
//! applies to each lookup, and invalidates both whenever the server-side
//! data generation changes.
//!
//! The remote detection call always happens outside any cache lock, so a
//! slow server never stalls unrelated cache operations.

mod key;

pub use key::HeaderFingerprint;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, info};

use crate::cache::{LruCache, DEFAULT_CACHE_CAPACITY};
use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::models::{DetectionRequest, DeviceData, ModelMarketingName, ServiceInfo};
use crate::service::DetectionService;

/// Version of the client API surface.
const API_VERSION: &str = "1.0.0";

/// Which of the two caches a lookup goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CacheKind {
    DeviceId,
    Headers,
}

/// The two cache instances, replaced together as one unit.
#[derive(Debug)]
struct CachePair {
    /// Keyed by device identifier
    device_id: LruCache<String, DeviceData>,
    /// Keyed by header fingerprint
    headers: LruCache<String, DeviceData>,
}

/// Device OS enumeration, built once from the service.
#[derive(Debug, Clone)]
struct DeviceOsData {
    /// Distinct OS names, sorted
    oses: Vec<String>,
    /// Non-empty versions per OS, in service order
    versions_by_os: HashMap<String, Vec<String>>,
}

/// Make/model enumeration, built once from the service.
#[derive(Debug, Clone)]
struct MakeModelData {
    /// Distinct maker brand names, sorted
    makes: Vec<String>,
    /// Models per maker, in service order
    models_by_make: HashMap<String, Vec<ModelMarketingName>>,
}

// == Detection Client ==
/// Client for a remote device-capability detection service with local
/// LRU caching.
///
/// Caching is off until [`set_cache_size`](Self::set_cache_size) or
/// [`configure`](Self::configure) is called; without it every lookup goes
/// to the network. All methods take `&self` and are safe to call from
/// concurrent tasks.
pub struct DetectionClient<S> {
    /// Remote detection service collaborator
    service: S,
    /// Cache-key builder over the service's important-headers list
    fingerprint: HeaderFingerprint,
    /// All static capability names the server knows, sorted
    static_caps: Vec<String>,
    /// All virtual capability names the server knows, sorted
    virtual_caps: Vec<String>,
    /// Static capability filter applied to lookups, None = all
    requested_static: RwLock<Option<Vec<String>>>,
    /// Virtual capability filter applied to lookups, None = all
    requested_virtual: RwLock<Option<Vec<String>>>,
    /// Last seen server data generation marker
    generation: Mutex<String>,
    /// Both caches, None until caching is configured. Swapping the Arc is
    /// the atomic visibility boundary for reconfiguration.
    caches: RwLock<Option<Arc<CachePair>>>,
    /// Bumped on every filter change and reconfiguration; an in-flight
    /// lookup that started before the bump will not insert its result.
    epoch: AtomicU64,
    /// Memoized device OS enumeration, fetched on first use
    device_os_data: Mutex<Option<DeviceOsData>>,
    /// Memoized make/model enumeration, fetched on first use
    make_model_data: Mutex<Option<MakeModelData>>,
}

impl<S: DetectionService> DetectionClient<S> {
    // == Construction ==
    /// Connects to the detection service and builds a client.
    ///
    /// Fetches the service info once to learn the important-headers list
    /// and the capability catalogs, and seeds the generation marker from it.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidInfo`] if the info payload is empty or
    /// malformed, or any transport error from the collaborator unchanged.
    pub async fn connect(service: S) -> Result<Self> {
        let info = service.info().await?;
        if !info.is_complete() {
            return Err(ClientError::InvalidInfo(
                "service returned empty data or a wrong format".to_string(),
            ));
        }

        let mut static_caps = info.static_caps;
        static_caps.sort();
        let mut virtual_caps = info.virtual_caps;
        virtual_caps.sort();

        info!(
            api_version = %info.api_version,
            server_version = %info.server_version,
            important_headers = info.important_headers.len(),
            "detection client initialized"
        );

        Ok(Self {
            service,
            fingerprint: HeaderFingerprint::new(info.important_headers),
            static_caps,
            virtual_caps,
            requested_static: RwLock::new(None),
            requested_virtual: RwLock::new(None),
            generation: Mutex::new(info.ltime),
            caches: RwLock::new(None),
            epoch: AtomicU64::new(0),
            device_os_data: Mutex::new(None),
            make_model_data: Mutex::new(None),
        })
    }

    /// Returns this client's API version.
    pub fn api_version(&self) -> &'static str {
        API_VERSION
    }

    /// Re-fetches the service info.
    pub async fn info(&self) -> Result<ServiceInfo> {
        let info = self.service.info().await?;
        if !info.is_complete() {
            return Err(ClientError::InvalidInfo(
                "service returned empty data or a wrong format".to_string(),
            ));
        }
        Ok(info)
    }

    // == Lookups ==
    /// Detects the device matching a single user-agent string.
    pub async fn lookup_useragent(&self, useragent: &str) -> Result<DeviceData> {
        let mut headers = HashMap::new();
        headers.insert("User-Agent".to_string(), useragent.to_string());

        let (caps, vcaps) = self.requested_filters();
        let request = DetectionRequest::from_headers(headers, caps, vcaps);
        self.lookup(request, CacheKind::Headers).await
    }

    /// Detects a device by its identifier.
    pub async fn lookup_device_id(&self, device_id: &str) -> Result<DeviceData> {
        let (caps, vcaps) = self.requested_filters();
        let request = DetectionRequest::from_device_id(device_id, caps, vcaps);
        self.lookup(request, CacheKind::DeviceId).await
    }

    /// Detects the device matching a full header map, as taken from an
    /// incoming HTTP request.
    ///
    /// Header name matching is case-insensitive; only the service's
    /// important headers participate in the lookup and the cache key.
    pub async fn lookup_headers(&self, headers: &HashMap<String, String>) -> Result<DeviceData> {
        let lookup_headers = self.fingerprint.normalize(headers);
        let (caps, vcaps) = self.requested_filters();
        let request = DetectionRequest::from_headers(lookup_headers, caps, vcaps);
        self.lookup(request, CacheKind::Headers).await
    }

    /// Resolves one detection request through the applicable cache.
    ///
    /// Cache hit: returns the cached result with no network access.
    /// Cache miss: calls the service, surfaces applicative errors without
    /// caching them, invalidates both caches if the generation marker moved,
    /// and only then inserts the fresh result.
    async fn lookup(&self, request: DetectionRequest, kind: CacheKind) -> Result<DeviceData> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let cache_key = match kind {
            CacheKind::DeviceId => request.device_id.clone(),
            CacheKind::Headers => self.fingerprint.key_for(&request.lookup_headers),
        };

        // An empty key means there is nothing stable to cache under:
        // such requests bypass the cache entirely.
        let caches = self.caches();
        if !cache_key.is_empty() {
            if let Some(pair) = &caches {
                let cached = match kind {
                    CacheKind::DeviceId => pair.device_id.get(&cache_key),
                    CacheKind::Headers => pair.headers.get(&cache_key),
                };
                if let Some(device) = cached {
                    return Ok(device);
                }
            }
        }

        // Miss: the remote call runs outside every cache lock. A transport
        // failure propagates here and leaves cache state untouched.
        let device = self.service.detect(&request).await?;
        if device.is_error() {
            return Err(ClientError::Detection(device.error));
        }

        // Invalidate before inserting, so the fresh result survives its
        // own invalidation pass.
        self.refresh_generation(&device.ltime);

        // A filter change or reconfiguration while the call was in flight
        // makes this result unusable for later lookups: skip the insert.
        let stale = self.epoch.load(Ordering::SeqCst) != epoch;
        if !cache_key.is_empty() && !stale {
            if let Some(pair) = &caches {
                match kind {
                    CacheKind::DeviceId => pair.device_id.put(cache_key, device.clone()),
                    CacheKind::Headers => pair.headers.put(cache_key, device.clone()),
                }
            }
        }
        Ok(device)
    }

    // == Cache Configuration ==
    /// Enables caching, replacing any previous cache instances.
    ///
    /// The header-fingerprint cache gets `header_cache_size` entries; the
    /// device-identifier cache gets the default capacity. All previously
    /// cached state is discarded.
    pub fn set_cache_size(&self, header_cache_size: usize) {
        self.replace_caches(header_cache_size, DEFAULT_CACHE_CAPACITY);
    }

    /// Enables caching with both capacities taken from a [`Config`].
    pub fn configure(&self, config: &Config) {
        self.replace_caches(config.header_cache_size, config.device_cache_size);
    }

    fn replace_caches(&self, header_cache_size: usize, device_cache_size: usize) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let pair = Arc::new(CachePair {
            device_id: LruCache::new(device_cache_size),
            headers: LruCache::new(header_cache_size),
        });
        debug!(
            header_capacity = pair.headers.capacity(),
            device_capacity = pair.device_id.capacity(),
            "caches configured"
        );
        *self
            .caches
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(pair);
    }

    /// Returns the current (device-id cache, header cache) entry counts,
    /// zero for an unconfigured cache.
    pub fn cache_sizes(&self) -> (usize, usize) {
        match self.caches() {
            Some(pair) => (pair.device_id.len(), pair.headers.len()),
            None => (0, 0),
        }
    }

    /// Clears both caches without changing their configuration. In-flight
    /// lookups that started before the call will not insert their result.
    pub fn invalidate_all(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.clear_caches();
    }

    // == Capability Filters ==
    /// True if the server knows `name` as a static capability.
    pub fn has_static_capability(&self, name: &str) -> bool {
        self.static_caps
            .binary_search_by(|cap| cap.as_str().cmp(name))
            .is_ok()
    }

    /// True if the server knows `name` as a virtual capability.
    pub fn has_virtual_capability(&self, name: &str) -> bool {
        self.virtual_caps
            .binary_search_by(|cap| cap.as_str().cmp(name))
            .is_ok()
    }

    /// Restricts lookups to the given static capabilities. Unknown names
    /// are dropped; `None` resets the filter.
    ///
    /// Cached results were computed under the previous filter and are not
    /// reusable, so both caches are invalidated.
    pub fn set_requested_static_capabilities(&self, caps: Option<&[&str]>) {
        let filtered = caps.map(|list| {
            list.iter()
                .filter(|name| self.has_static_capability(name))
                .map(|name| name.to_string())
                .collect()
        });
        *self
            .requested_static
            .write()
            .unwrap_or_else(PoisonError::into_inner) = filtered;
        self.invalidate_all();
    }

    /// Restricts lookups to the given virtual capabilities. Unknown names
    /// are dropped; `None` resets the filter. Invalidates both caches.
    pub fn set_requested_virtual_capabilities(&self, vcaps: Option<&[&str]>) {
        let filtered = vcaps.map(|list| {
            list.iter()
                .filter(|name| self.has_virtual_capability(name))
                .map(|name| name.to_string())
                .collect()
        });
        *self
            .requested_virtual
            .write()
            .unwrap_or_else(PoisonError::into_inner) = filtered;
        self.invalidate_all();
    }

    /// Restricts lookups to the given capabilities, splitting the list into
    /// static and virtual names. `None` resets both filters. Invalidates
    /// both caches.
    pub fn set_requested_capabilities(&self, caps: Option<&[&str]>) {
        match caps {
            None => {
                *self
                    .requested_static
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = None;
                *self
                    .requested_virtual
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = None;
            }
            Some(list) => {
                let static_names = list
                    .iter()
                    .filter(|name| self.has_static_capability(name))
                    .map(|name| name.to_string())
                    .collect();
                let virtual_names = list
                    .iter()
                    .filter(|name| self.has_virtual_capability(name))
                    .map(|name| name.to_string())
                    .collect();
                *self
                    .requested_static
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = Some(static_names);
                *self
                    .requested_virtual
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = Some(virtual_names);
            }
        }
        self.invalidate_all();
    }

    // == Device Enumeration ==
    /// Returns all device OS names the service knows, sorted.
    ///
    /// The enumeration is fetched from the service once and memoized;
    /// later calls are answered locally.
    pub async fn all_oses(&self) -> Result<Vec<String>> {
        Ok(self.load_device_os_data().await?.oses)
    }

    /// Returns all known versions of the given device OS, with empty
    /// version strings dropped.
    ///
    /// # Errors
    /// Returns [`ClientError::NotFound`] if the OS name is unknown.
    pub async fn all_versions_for_os(&self, os_name: &str) -> Result<Vec<String>> {
        let data = self.load_device_os_data().await?;
        match data.versions_by_os.get(os_name) {
            Some(versions) => Ok(versions.clone()),
            None => Err(ClientError::NotFound(format!(
                "device OS `{os_name}` does not exist"
            ))),
        }
    }

    /// Returns all device maker brand names the service knows, sorted.
    ///
    /// Fetched once and memoized, like [`all_oses`](Self::all_oses).
    pub async fn all_device_makes(&self) -> Result<Vec<String>> {
        Ok(self.load_make_model_data().await?.makes)
    }

    /// Returns the model and marketing names of every device of the given
    /// maker.
    ///
    /// # Errors
    /// Returns [`ClientError::NotFound`] if the maker is unknown.
    pub async fn all_devices_for_make(&self, make: &str) -> Result<Vec<ModelMarketingName>> {
        let data = self.load_make_model_data().await?;
        match data.models_by_make.get(make) {
            Some(models) => Ok(models.clone()),
            None => Err(ClientError::NotFound(format!(
                "device maker `{make}` does not exist"
            ))),
        }
    }

    /// Returns the important-header names learned from the service.
    pub fn important_headers(&self) -> &[String] {
        self.fingerprint.important_headers()
    }

    // == Internals ==
    /// Snapshot of the current cache pair, if configured.
    fn caches(&self) -> Option<Arc<CachePair>> {
        self.caches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Clones of the current capability filters.
    fn requested_filters(&self) -> (Option<Vec<String>>, Option<Vec<String>>) {
        let caps = self
            .requested_static
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let vcaps = self
            .requested_virtual
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        (caps, vcaps)
    }

    /// Compares the server's generation marker with the stored one and, on
    /// a change, updates the marker and clears both caches.
    ///
    /// The marker is updated under its lock before the clears, so two
    /// concurrent responses carrying the same new marker trigger only one
    /// invalidation pass.
    fn refresh_generation(&self, ltime: &str) {
        if ltime.is_empty() {
            return;
        }
        {
            let mut generation = self
                .generation
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *generation == ltime {
                return;
            }
            debug!(
                from = %generation.as_str(),
                to = %ltime,
                "server data generation changed, invalidating caches"
            );
            *generation = ltime.to_string();
        }
        // The epoch is left alone here: the lookup that observed the new
        // marker still inserts its own fresh result.
        self.clear_caches();
    }

    /// Fill-on-first-use access to the device OS enumeration.
    ///
    /// The lock is never held across the network call; two concurrent
    /// first callers may both fetch, and the later store wins with
    /// identical data.
    async fn load_device_os_data(&self) -> Result<DeviceOsData> {
        {
            let guard = self
                .device_os_data
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(data) = &*guard {
                return Ok(data.clone());
            }
        }

        let entries = self.service.all_device_os_versions().await?;
        let mut versions_by_os: HashMap<String, Vec<String>> = HashMap::new();
        for entry in entries {
            let versions = versions_by_os.entry(entry.device_os).or_default();
            if !entry.device_os_version.is_empty() {
                versions.push(entry.device_os_version);
            }
        }
        let mut oses: Vec<String> = versions_by_os.keys().cloned().collect();
        oses.sort();
        debug!(oses = oses.len(), "device OS enumeration loaded");

        let data = DeviceOsData {
            oses,
            versions_by_os,
        };
        *self
            .device_os_data
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(data.clone());
        Ok(data)
    }

    /// Fill-on-first-use access to the make/model enumeration, with the
    /// same locking discipline as
    /// [`load_device_os_data`](Self::load_device_os_data).
    async fn load_make_model_data(&self) -> Result<MakeModelData> {
        {
            let guard = self
                .make_model_data
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(data) = &*guard {
                return Ok(data.clone());
            }
        }

        let entries = self.service.all_make_models().await?;
        let mut models_by_make: HashMap<String, Vec<ModelMarketingName>> = HashMap::new();
        for entry in entries {
            models_by_make
                .entry(entry.brand_name)
                .or_default()
                .push(ModelMarketingName {
                    model_name: entry.model_name,
                    marketing_name: entry.marketing_name,
                });
        }
        let mut makes: Vec<String> = models_by_make.keys().cloned().collect();
        makes.sort();
        debug!(makes = makes.len(), "make/model enumeration loaded");

        let data = MakeModelData {
            makes,
            models_by_make,
        };
        *self
            .make_model_data
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(data.clone());
        Ok(data)
    }

    /// Empties both caches without bumping the epoch.
    fn clear_caches(&self) {
        if let Some(pair) = self.caches() {
            pair.device_id.clear();
            pair.headers.clear();
        }
    }
}
