//! BPM tracker page object

use action_primitives::{Credentials, NavError, NavResult, PageNavigator, WaitPolicy, WaitState};
use firco_core_types::{
    validate_bpm_row, BpmRowReport, BpmRowStatus, MarketType, TransactionId,
};
use tracing::{debug, info, warn};

use crate::selectors::BpmSelectors;

/// Read-only access to the BPM tracker
#[derive(Debug, Clone)]
pub struct BpmSurface {
    url: String,
    credentials: Credentials,
    selectors: BpmSelectors,
    policy: WaitPolicy,
}

impl BpmSurface {
    pub fn new(
        url: impl Into<String>,
        credentials: Credentials,
        selectors: BpmSelectors,
        policy: WaitPolicy,
    ) -> Self {
        Self {
            url: url.into(),
            credentials,
            selectors,
            policy,
        }
    }

    pub fn selectors(&self) -> &BpmSelectors {
        &self.selectors
    }

    pub async fn login(&self, nav: &mut dyn PageNavigator) -> NavResult<()> {
        let s = &self.selectors;
        nav.goto(&self.url).await?;
        nav.wait_for_load(self.policy.load_timeout).await?;

        if !nav.is_visible(&s.username_input).await? {
            debug!("BPM login form absent, session already signed in");
            return Ok(());
        }

        nav.fill(&s.username_input, &self.credentials.username)
            .await?;
        nav.fill(&s.password_input, &self.credentials.password)
            .await?;
        nav.click(&s.submit_button).await?;
        nav.wait_for_load(self.policy.load_timeout).await?;

        if nav.is_visible(&s.username_input).await? {
            return Err(NavError::PermissionDenied(format!(
                "BPM rejected the credentials of {}",
                self.credentials.username
            )));
        }
        info!(user = %self.credentials.username, "logged in to BPM");
        Ok(())
    }

    /// Tick the ORI options and the market, then submit the options modal.
    ///
    /// Without a market the option tree is submitted as is.
    pub async fn select_options(
        &self,
        nav: &mut dyn PageNavigator,
        market: Option<MarketType>,
    ) -> NavResult<()> {
        let s = &self.selectors;
        nav.wait_for(&s.options_modal, WaitState::Visible, self.policy.element_timeout)
            .await?;
        nav.click(&s.ori_checkbox).await?;
        nav.click(&s.ori_tsf_option).await?;

        match market {
            Some(market) => {
                let option = s.market_option_for(market);
                nav.wait_for(&option, WaitState::Visible, self.policy.element_timeout)
                    .await?;
                nav.click(&option).await?;
                debug!(market = %market, "market option selected");
            }
            None => warn!("no market type given, submitting BPM options without one"),
        }

        nav.click(&s.modal_submit).await?;
        nav.pause(self.policy.settle).await;
        Ok(())
    }

    /// Run the advanced search and return the cells of the first matching row
    pub async fn search(
        &self,
        nav: &mut dyn PageNavigator,
        identifier: &TransactionId,
    ) -> NavResult<Option<Vec<String>>> {
        let s = &self.selectors;
        nav.click(&s.search_tab).await?;
        nav.wait_for(&s.reference_input, WaitState::Visible, self.policy.element_timeout)
            .await?;
        nav.fill(&s.reference_input, identifier.as_str()).await?;
        nav.click(&s.search_button).await?;
        nav.wait_for_load(self.policy.load_timeout).await?;
        nav.pause(self.policy.settle).await;

        let row = s.result_row_for(identifier.as_str());
        if nav.count(&row).await? == 0 {
            return Ok(None);
        }
        let cells = nav.child_texts(&row, 0, &s.result_cells).await?;
        Ok(Some(cells))
    }

    /// Full BPM check for one transaction
    pub async fn check(
        &self,
        nav: &mut dyn PageNavigator,
        identifier: &TransactionId,
        market: Option<MarketType>,
    ) -> NavResult<BpmRowReport> {
        self.login(nav).await?;
        self.select_options(nav, market).await?;

        let report = match self.search(nav, identifier).await? {
            Some(cells) => validate_bpm_row(&cells, identifier.as_str()),
            None => BpmRowReport::without_row(
                BpmRowStatus::NotFound,
                format!("Transaction {} not found in BPM.", identifier),
            ),
        };
        info!(
            transaction = %identifier,
            verdict = report.status.as_str(),
            "BPM row classified"
        );
        Ok(report)
    }
}
