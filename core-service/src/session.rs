//! # Player Session
//!
//! Wires the track store, discovery, import pipeline and playback engine
//! from a [`CoreConfig`] and owns their lifecycle.
//!
//! ```ignore
//! let session = PlayerSession::builder(config).start().await?;
//! let track = session.import_file("song.mp3", bytes, None).await?;
//! session.play(track).await?;
//! session.shutdown().await;
//! ```

use crate::error::Result;
use bridge_traits::time::Clock;
use bytes::Bytes;
use core_library::db::{create_pool, DatabaseConfig};
use core_library::models::{StorageStatus, Track};
use core_library::{SqliteTrackRepository, TrackRepository};
use core_metadata::discovery::{search_or_empty, DiscoveryService, OfflineDiscovery, TrackCandidate};
use core_metadata::{DurationProbe, ImportService};
use core_playback::{EngineConfig, EngineDeps, PlayOutcome, PlaybackEngine};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, Receiver};
use core_runtime::logging::init_logging;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Collects optional overrides before [`start`](Self::start).
pub struct PlayerSessionBuilder {
    config: CoreConfig,
    engine_config: EngineConfig,
    repository: Option<Arc<dyn TrackRepository>>,
    discovery: Option<Arc<dyn DiscoveryService>>,
    probe: Option<Arc<dyn DurationProbe>>,
    events: Option<EventBus>,
}

impl PlayerSessionBuilder {
    pub fn engine_config(mut self, engine_config: EngineConfig) -> Self {
        self.engine_config = engine_config;
        self
    }

    /// Uses `repository` instead of opening the SQLite store.
    pub fn repository(mut self, repository: Arc<dyn TrackRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Uses `discovery` instead of the configured provider.
    pub fn discovery(mut self, discovery: Arc<dyn DiscoveryService>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    pub fn duration_probe(mut self, probe: Arc<dyn DurationProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Builds every component and starts the engine.
    ///
    /// # Errors
    ///
    /// - `Runtime` when the configuration was edited into an invalid state
    /// - `Library` when the store cannot be opened
    /// - `Playback` when the engine configuration is invalid
    pub async fn start(self) -> Result<PlayerSession> {
        let config = self.config;
        config.validate()?;

        if let Some(logging) = config.logging.clone() {
            // A host may already own the global subscriber.
            if let Err(e) = init_logging(logging) {
                warn!(error = %e, "Logging not initialised");
            }
        }

        let repository = match self.repository {
            Some(repository) => repository,
            None => open_repository(&config).await?,
        };
        let discovery = match self.discovery {
            Some(discovery) => discovery,
            None => default_discovery(&config),
        };
        let events = self.events.unwrap_or_default();

        let mut import = ImportService::new(repository.clone(), discovery.clone(), events.clone())
            .with_clock(config.clock.clone());
        if let Some(probe) = self.probe {
            import = import.with_probe(probe);
        }

        let engine = PlaybackEngine::new(
            EngineDeps {
                audio_element: config.audio_element.clone(),
                object_urls: config.object_url_factory.clone(),
                widget_host: config.stream_widget_host.clone(),
                repository,
                discovery: discovery.clone(),
                settings: config.settings_store.clone(),
                clock: config.clock.clone(),
                events: events.clone(),
            },
            self.engine_config,
        )?;
        engine.start().await?;

        info!("Player session started");
        Ok(PlayerSession {
            config,
            engine,
            import,
            discovery,
            events,
        })
    }
}

async fn open_repository(config: &CoreConfig) -> Result<Arc<dyn TrackRepository>> {
    let db_config = match &config.database_path {
        Some(path) => DatabaseConfig::new(path),
        None => DatabaseConfig::in_memory(),
    }
    .storage_quota_bytes(config.storage_quota_bytes);

    debug!(url = %db_config.database_url, "Opening track store");
    let pool = create_pool(&db_config).await?;
    Ok(Arc::new(SqliteTrackRepository::with_quota(
        pool,
        db_config.storage_quota_bytes,
    )))
}

#[cfg(feature = "gemini")]
fn default_discovery(config: &CoreConfig) -> Arc<dyn DiscoveryService> {
    use core_metadata::providers::{GeminiConfig, GeminiDiscovery};

    let gemini = config
        .discovery_api_key
        .clone()
        .map(GeminiConfig::new)
        .or_else(GeminiConfig::from_env);

    match (gemini, config.http_client.clone()) {
        (Some(gemini), Some(http)) => {
            info!(model = %gemini.model, "Using Gemini discovery");
            return Arc::new(GeminiDiscovery::new(http, gemini));
        }
        (Some(_), None) => warn!("Discovery key set but no HttpClient available"),
        (None, _) => {}
    }

    info!("Discovery offline");
    Arc::new(OfflineDiscovery)
}

#[cfg(not(feature = "gemini"))]
fn default_discovery(_config: &CoreConfig) -> Arc<dyn DiscoveryService> {
    info!("Discovery offline");
    Arc::new(OfflineDiscovery)
}

/// A running player: library, discovery and playback behind one handle.
pub struct PlayerSession {
    config: CoreConfig,
    engine: PlaybackEngine,
    import: ImportService,
    discovery: Arc<dyn DiscoveryService>,
    events: EventBus,
}

impl PlayerSession {
    pub fn builder(config: CoreConfig) -> PlayerSessionBuilder {
        PlayerSessionBuilder {
            config,
            engine_config: EngineConfig::default(),
            repository: None,
            discovery: None,
            probe: None,
            events: None,
        }
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.events.subscribe()
    }

    /// Remote candidates for a free-text query. Failures and blank queries
    /// yield an empty list.
    #[instrument(skip(self))]
    pub async fn discover(&self, query: &str) -> Vec<TrackCandidate> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        search_or_empty(self.discovery.as_ref(), query).await
    }

    /// Plays a discovery result as a fresh remote track.
    pub async fn play_candidate(&self, candidate: &TrackCandidate) -> Result<PlayOutcome> {
        let track = candidate.to_remote_track(self.config.clock.unix_timestamp_millis());
        self.play(track).await
    }

    pub async fn play(&self, track: Track) -> Result<PlayOutcome> {
        Ok(self.engine.play(track).await?)
    }

    /// Imports a local audio file into the library.
    pub async fn import_file(
        &self,
        filename: &str,
        data: Bytes,
        mime_type: Option<String>,
    ) -> Result<Track> {
        Ok(self.import.import_local_file(filename, data, mime_type).await?)
    }

    /// Saves edited metadata and refreshes the playing track if it is the
    /// one edited.
    pub async fn update_track(&self, track: &Track) -> Result<()> {
        self.import.update_track(track).await?;
        self.engine.refresh_track(track);
        Ok(())
    }

    /// Deletes a track. Playback stops first when it is the current track.
    pub async fn delete_track(&self, id: &str) -> Result<bool> {
        if self.engine.snapshot().current_track_id() == Some(id) {
            self.engine.stop().await;
        }
        Ok(self.import.delete_track(id).await?)
    }

    /// Deletes every track, stopping playback first.
    pub async fn purge(&self) -> Result<u64> {
        self.engine.stop().await;
        Ok(self.import.purge().await?)
    }

    pub async fn status(&self) -> Result<StorageStatus> {
        Ok(self.import.status().await?)
    }

    pub async fn tracks(&self) -> Result<Vec<Track>> {
        Ok(self.import.list().await?)
    }

    pub async fn track(&self, id: &str) -> Result<Option<Track>> {
        Ok(self.import.get(id).await?)
    }

    /// Stops playback and the engine's background tasks.
    pub async fn shutdown(&self) {
        self.engine.shutdown().await;
        info!("Player session stopped");
    }
}

