//! Keeps a ranked, radius-filtered feed and its map markers current.

use async_trait::async_trait;
use geo::Point;
use orbit_incident_models::{Incident, IncidentType};
use orbit_server_models::{ChangeEvent, FeedQueryParams};

use crate::{
    FeedError,
    markers::{MarkerOp, MarkerSet},
    score::{RankedIncident, rank},
    spatial::{DEFAULT_RADIUS_KM, default_center, to_point, within_radius},
};

/// Where the composer loads incidents from.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetches incidents matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the incidents cannot be loaded.
    async fn fetch(&self, query: &FeedQueryParams) -> Result<Vec<Incident>, FeedError>;
}

/// User-selected feed filters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedFilter {
    /// Only this type, or every type when `None`.
    pub incident_type: Option<IncidentType>,
    /// Rolling time window in hours.
    pub window_hours: u32,
    /// View radius in kilometres.
    pub radius_km: f64,
}

impl Default for FeedFilter {
    fn default() -> Self {
        Self {
            incident_type: None,
            window_hours: 24,
            radius_km: DEFAULT_RADIUS_KM,
        }
    }
}

impl FeedFilter {
    fn query(&self) -> FeedQueryParams {
        FeedQueryParams {
            incident_type: self.incident_type,
            hours: Some(self.window_hours),
            limit: None,
        }
    }
}

/// Ranked feed plus the marker state derived from it.
///
/// Every change notification triggers a full reload; there is no
/// incremental patching of the list.
pub struct FeedComposer<S> {
    source: S,
    filter: FeedFilter,
    center: Point<f64>,
    ranked: Vec<RankedIncident>,
    markers: MarkerSet,
}

impl<S: FeedSource> FeedComposer<S> {
    /// Creates an empty composer centered on the default view.
    #[must_use]
    pub fn new(source: S, filter: FeedFilter) -> Self {
        Self {
            source,
            filter,
            center: default_center(),
            ranked: Vec::new(),
            markers: MarkerSet::new(),
        }
    }

    /// Current filters.
    #[must_use]
    pub const fn filter(&self) -> &FeedFilter {
        &self.filter
    }

    /// Current view center.
    #[must_use]
    pub const fn center(&self) -> Point<f64> {
        self.center
    }

    /// Markers currently on the map.
    #[must_use]
    pub const fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    /// Every loaded incident, highest priority first, regardless of radius.
    #[must_use]
    pub fn ranked(&self) -> &[RankedIncident] {
        &self.ranked
    }

    /// Loaded incidents within the view radius, highest priority first.
    pub fn visible(&self) -> impl Iterator<Item = &RankedIncident> {
        let center = self.center;
        let radius_km = self.filter.radius_km;
        self.ranked
            .iter()
            .filter(move |r| within_radius(center, to_point(r.incident.location), radius_km))
    }

    /// Fetches the feed again and reconciles the markers.
    ///
    /// On error the previous feed and markers are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the source fails.
    pub async fn reload(&mut self) -> Result<Vec<MarkerOp>, FeedError> {
        let incidents = self.source.fetch(&self.filter.query()).await?;
        log::debug!("Reloaded feed: {} incident(s)", incidents.len());
        self.ranked = rank(incidents);
        Ok(self.sync_markers())
    }

    /// Reacts to a server change notification by reloading.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the reload fails.
    pub async fn handle_change(&mut self, event: &ChangeEvent) -> Result<Vec<MarkerOp>, FeedError> {
        log::debug!("Change {:?} for {:?}", event.kind, event.incident_id);
        self.reload().await
    }

    /// Replaces the type and time filters and reloads.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the reload fails. The previous filter is
    /// kept in that case, so [`Self::filter`] still describes the loaded
    /// incidents.
    pub async fn set_filter(
        &mut self,
        incident_type: Option<IncidentType>,
        window_hours: u32,
    ) -> Result<Vec<MarkerOp>, FeedError> {
        let previous = self.filter;
        self.filter.incident_type = incident_type;
        self.filter.window_hours = window_hours;

        let result = self.reload().await;
        if result.is_err() {
            self.filter = previous;
        }
        result
    }

    /// Moves the view center. Only the markers change; no reload happens.
    pub fn set_view_center(&mut self, center: Point<f64>) -> Vec<MarkerOp> {
        self.center = center;
        self.sync_markers()
    }

    /// Changes the view radius. Only the markers change; no reload happens.
    pub fn set_radius(&mut self, radius_km: f64) -> Vec<MarkerOp> {
        self.filter.radius_km = radius_km;
        self.sync_markers()
    }

    fn sync_markers(&mut self) -> Vec<MarkerOp> {
        self.markers.reconcile(
            self.ranked.iter().map(|r| &r.incident),
            self.center,
            self.filter.radius_km,
        )
    }
}
