//! Transaction lookup across surfaces
//!
//! Surfaces are searched in [`Surface::LOOKUP_ORDER`]; the first surface
//! holding the identifier wins.

use action_primitives::PageNavigator;
use firco_core_types::{
    LiveMatch, LocationResult, RowHandle, StatusMarkers, Surface, TransactionRequest,
};
use tracing::{debug, info, warn};

use crate::bpm::BpmSurface;
use crate::errors::LocatorError;
use crate::firco::FircoSurface;

/// Finds which surface currently holds a transaction
#[derive(Debug, Clone)]
pub struct TransactionLocator {
    firco: FircoSurface,
    bpm: Option<BpmSurface>,
}

impl TransactionLocator {
    pub fn new(firco: FircoSurface) -> Self {
        Self { firco, bpm: None }
    }

    /// Enable the BPM fallback
    pub fn with_bpm(mut self, bpm: BpmSurface) -> Self {
        self.bpm = Some(bpm);
        self
    }

    pub fn firco(&self) -> &FircoSurface {
        &self.firco
    }

    pub fn bpm(&self) -> Option<&BpmSurface> {
        self.bpm.as_ref()
    }

    /// Locate `request` on the signed-in Firco session behind `nav`
    pub async fn locate(
        &self,
        nav: &mut dyn PageNavigator,
        request: &TransactionRequest,
    ) -> Result<LocationResult, LocatorError> {
        for surface in Surface::LOOKUP_ORDER {
            info!(
                transaction = %request.id(),
                surface = surface.as_str(),
                "searching surface"
            );
            let found = match surface {
                Surface::Live => self
                    .locate_live(nav, request)
                    .await?
                    .map(LocationResult::FoundInLive),
                Surface::History => self
                    .present_in(nav, request, surface)
                    .await?
                    .then_some(LocationResult::FoundInHistory),
                Surface::SanctionsBypass => self
                    .present_in(nav, request, surface)
                    .await?
                    .then_some(LocationResult::FoundInSanctionsBypass),
                Surface::Bpm => self.check_bpm(nav, request).await?,
            };

            if let Some(location) = found {
                info!(
                    transaction = %request.id(),
                    surface = surface.as_str(),
                    "transaction located"
                );
                return Ok(location);
            }
        }

        info!(transaction = %request.id(), "transaction not found on any surface");
        Ok(LocationResult::NotFoundAnywhere)
    }

    /// Search the live surface only and open the selected row.
    ///
    /// Several matches fail with [`LocatorError::AmbiguousMatch`] unless the
    /// request asks for the latest one, in which case the grid is sorted
    /// newest first and the top row is taken.
    pub async fn locate_live(
        &self,
        nav: &mut dyn PageNavigator,
        request: &TransactionRequest,
    ) -> Result<Option<LiveMatch>, LocatorError> {
        let firco = &self.firco;
        firco.open_live_messages(nav).await?;
        firco.clear_filter(nav).await?;
        firco.apply_data_filter(nav, request.id()).await?;

        let row_count = firco.count_results(nav, Surface::Live).await?;
        match row_count {
            0 => return Ok(None),
            1 => {}
            count if !request.perform_on_latest() => {
                warn!(transaction = %request.id(), count, "multiple live matches");
                return Err(LocatorError::AmbiguousMatch {
                    identifier: request.id().to_string(),
                    count,
                });
            }
            count => {
                info!(transaction = %request.id(), count, "multiple live matches, taking the latest");
                firco.sort_latest_first(nav).await?;
            }
        }

        let selected = RowHandle { index: 0 };
        let raw = firco.read_markers(nav, selected.index).await?;
        firco.select_row(nav, selected.index).await?;
        let markers = StatusMarkers::classify(&raw);
        debug!(
            transaction = %request.id(),
            environment = %markers.environment,
            current_status = markers.current_status.label(),
            status = %markers.status_text,
            "live row markers"
        );

        Ok(Some(LiveMatch {
            row_count,
            selected,
            markers,
        }))
    }

    async fn present_in(
        &self,
        nav: &mut dyn PageNavigator,
        request: &TransactionRequest,
        surface: Surface,
    ) -> Result<bool, LocatorError> {
        let firco = &self.firco;
        match surface {
            Surface::History => firco.open_history(nav).await?,
            Surface::SanctionsBypass => firco.open_sanctions_bypass(nav).await?,
            Surface::Live | Surface::Bpm => return Ok(false),
        }
        firco.clear_filter(nav).await?;
        firco.apply_data_filter(nav, request.id()).await?;
        Ok(firco.count_results(nav, surface).await? > 0)
    }

    async fn check_bpm(
        &self,
        nav: &mut dyn PageNavigator,
        request: &TransactionRequest,
    ) -> Result<Option<LocationResult>, LocatorError> {
        let Some(bpm) = &self.bpm else {
            debug!("BPM fallback not configured");
            return Ok(None);
        };
        let Some(market) = request.market() else {
            info!(transaction = %request.id(), "transaction type not defined, skipping BPM");
            return Ok(None);
        };

        let report = bpm.check(nav, request.id(), Some(market)).await?;
        if report.status.is_conclusive() {
            Ok(Some(LocationResult::FoundInBpm(report.finding())))
        } else {
            debug!(verdict = report.status.as_str(), "BPM verdict not conclusive");
            Ok(None)
        }
    }
}
