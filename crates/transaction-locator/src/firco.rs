//! Firco Continuity page object
//!
//! Stateless with respect to the page: every operation receives the
//! navigator of the session it should drive.

use std::time::Duration;

use action_primitives::{
    Credentials, NavError, NavResult, PageNavigator, WaitPolicy, WaitState,
};
use firco_core_types::{Comment, DispositionAction, RawMarkers, Surface, TransactionId};
use tracing::{debug, info, warn};

use crate::selectors::FircoSelectors;

const LIVE_MESSAGES_TITLE: &str = "Live Messages";
const OVERLAY_TIMEOUT: Duration = Duration::from_secs(5);
const OVERLAY_BUTTON_TIMEOUT: Duration = Duration::from_secs(3);

/// Drives the Firco screens for one deployment
#[derive(Debug, Clone)]
pub struct FircoSurface {
    url: String,
    selectors: FircoSelectors,
    policy: WaitPolicy,
}

impl FircoSurface {
    pub fn new(url: impl Into<String>, selectors: FircoSelectors, policy: WaitPolicy) -> Self {
        Self {
            url: url.into(),
            selectors,
            policy,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn selectors(&self) -> &FircoSelectors {
        &self.selectors
    }

    pub fn policy(&self) -> &WaitPolicy {
        &self.policy
    }

    /// Open the application and sign in.
    ///
    /// A page that shows no login form is treated as already signed in.
    pub async fn login(
        &self,
        nav: &mut dyn PageNavigator,
        credentials: &Credentials,
    ) -> NavResult<()> {
        let s = &self.selectors;
        nav.goto(&self.url).await?;
        nav.wait_for_load(self.policy.load_timeout).await?;

        if !nav.is_visible(&s.username_input).await? {
            debug!(user = %credentials.username, "login form absent, session already signed in");
            return Ok(());
        }

        nav.fill(&s.username_input, &credentials.username).await?;
        nav.fill(&s.password_input, &credentials.password).await?;
        nav.click(&s.submit_button).await?;
        nav.wait_for_load(self.policy.load_timeout).await?;

        if nav.is_visible(&s.username_input).await? {
            return Err(NavError::PermissionDenied(format!(
                "Firco rejected the credentials of {}",
                credentials.username
            )));
        }
        info!(user = %credentials.username, "logged in to Firco");
        Ok(())
    }

    pub async fn open_live_messages(&self, nav: &mut dyn PageNavigator) -> NavResult<()> {
        let s = &self.selectors;
        nav.click(&s.live_messages_link).await?;
        nav.wait_for(
            &s.live_messages_header,
            WaitState::Visible,
            self.policy.element_timeout,
        )
        .await?;

        let header = nav.text(&s.live_messages_header).await?.unwrap_or_default();
        if !header.contains(LIVE_MESSAGES_TITLE) {
            return Err(NavError::NotFound(format!(
                "expected the '{}' header, found '{}'",
                LIVE_MESSAGES_TITLE, header
            )));
        }

        if !nav.is_visible(&s.live_messages_tab_selected).await? {
            debug!("live messages tab not selected, selecting it");
            nav.click(&s.live_messages_tab).await?;
            nav.wait_for(
                &s.live_messages_tab_selected,
                WaitState::Visible,
                self.policy.element_timeout,
            )
            .await?;
        }
        Ok(())
    }

    pub async fn open_history(&self, nav: &mut dyn PageNavigator) -> NavResult<()> {
        nav.click(&self.selectors.history_link).await?;
        nav.pause(self.policy.settle).await;
        Ok(())
    }

    pub async fn open_sanctions_bypass(&self, nav: &mut dyn PageNavigator) -> NavResult<()> {
        self.open_live_messages(nav).await?;
        nav.click(&self.selectors.sanctions_bypass_tab).await?;
        nav.pause(self.policy.settle).await;
        Ok(())
    }

    /// Remove a column filter left over from an earlier search
    pub async fn clear_filter(&self, nav: &mut dyn PageNavigator) -> NavResult<()> {
        let icon = &self.selectors.filtered_column_icon;
        if nav.is_visible(icon).await? {
            nav.click(icon).await?;
            nav.pause(self.policy.settle).await;
            if nav.is_visible(icon).await? {
                warn!("column filter still active after clearing");
            } else {
                debug!("column filter cleared");
            }
        }
        Ok(())
    }

    /// Filter the message-id column on `identifier`
    pub async fn apply_data_filter(
        &self,
        nav: &mut dyn PageNavigator,
        identifier: &TransactionId,
    ) -> NavResult<()> {
        let s = &self.selectors;
        nav.click(&s.message_id_menu_opener).await?;
        nav.click(&s.data_filters_item).await?;
        nav.wait_for(
            &s.data_filter_input,
            WaitState::Visible,
            self.policy.element_timeout,
        )
        .await?;
        nav.fill(&s.data_filter_input, identifier.as_str()).await?;
        nav.click(&s.add_filter_button).await?;
        nav.click(&s.confirm_filter_button).await?;
        Ok(())
    }

    /// Count filtered rows, capturing the result grid
    pub async fn count_results(
        &self,
        nav: &mut dyn PageNavigator,
        surface: Surface,
    ) -> NavResult<usize> {
        let s = &self.selectors;
        nav.pause(self.policy.settle).await;

        let count = if nav.is_visible(&s.no_data_notice).await? {
            0
        } else {
            nav.count(&s.result_rows).await?
        };

        let shot = match count {
            0 => "no_transactions",
            1 => "one_transaction",
            _ => "more_transactions",
        };
        let name = match surface {
            Surface::Live => shot.to_string(),
            other => format!("{}_{}", other.as_str(), shot),
        };
        nav.screenshot(&name).await?;

        debug!(surface = surface.as_str(), count, "search results counted");
        Ok(count)
    }

    pub async fn sort_latest_first(&self, nav: &mut dyn PageNavigator) -> NavResult<()> {
        nav.click(&self.selectors.date_menu_opener).await?;
        nav.click(&self.selectors.sort_descending).await?;
        nav.pause(self.policy.settle).await;
        Ok(())
    }

    /// Open the row at `index`, unlocking it first when an administrator lock is shown
    pub async fn select_row(&self, nav: &mut dyn PageNavigator, index: usize) -> NavResult<()> {
        if nav.count(&self.selectors.padlock_icon).await? > 0 {
            self.unlock(nav).await?;
        }
        nav.click_nth(&self.selectors.result_rows, index).await?;
        nav.pause(self.policy.settle).await;
        Ok(())
    }

    async fn unlock(&self, nav: &mut dyn PageNavigator) -> NavResult<()> {
        let s = &self.selectors;
        info!("row is locked, unlocking");
        nav.click(&s.padlock_icon).await?;
        nav.wait_for(&s.unlock_overlay, WaitState::Visible, OVERLAY_TIMEOUT)
            .await?;

        match nav
            .wait_for(&s.close_overlay_button, WaitState::Visible, OVERLAY_BUTTON_TIMEOUT)
            .await
        {
            Ok(()) => nav.click(&s.close_overlay_button).await?,
            Err(err) if err.is_timeout() => {
                debug!("close button missing on lock overlay, using OK");
                nav.wait_for(&s.overlay_ok_button, WaitState::Visible, OVERLAY_BUTTON_TIMEOUT)
                    .await?;
                nav.click(&s.overlay_ok_button).await?;
            }
            Err(err) => return Err(err),
        }
        nav.pause(self.policy.settle).await;
        Ok(())
    }

    /// Raw status markers of the row at `index`
    pub async fn read_markers(
        &self,
        nav: &mut dyn PageNavigator,
        index: usize,
    ) -> NavResult<RawMarkers> {
        let s = &self.selectors;
        let cells = nav
            .child_texts(&s.result_rows, index, &s.result_cells)
            .await?;
        let cell = |position: usize| {
            position
                .checked_sub(1)
                .and_then(|i| cells.get(i))
                .map(|text| text.trim().to_string())
                .unwrap_or_default()
        };
        let columns = s.live_columns;
        Ok(RawMarkers::new(
            cell(columns.holding_qm),
            cell(columns.current_status),
            cell(columns.status),
        ))
    }

    pub async fn fill_comment(
        &self,
        nav: &mut dyn PageNavigator,
        comment: &Comment,
    ) -> NavResult<()> {
        let field = &self.selectors.comment_field;
        nav.wait_for(field, WaitState::Visible, self.policy.element_timeout)
            .await?;
        nav.fill(field, comment.as_str()).await
    }

    /// Walk every hit row, capturing each one. Returns the number of hits shown.
    pub async fn review_hits(&self, nav: &mut dyn PageNavigator) -> NavResult<usize> {
        let s = &self.selectors;
        nav.screenshot("hit_0").await?;

        let rows = nav.count(&s.hit_rows).await?;
        let mut reviewed = 0;
        for index in s.first_hit_row..rows {
            match nav.click_nth(&s.hit_rows, index).await {
                Ok(()) => {
                    reviewed += 1;
                    nav.screenshot(&format!("hit_{}", reviewed)).await?;
                }
                Err(err) => warn!(index, %err, "could not open hit row"),
            }
        }
        debug!(hits = reviewed, "hits reviewed");
        Ok(reviewed)
    }

    /// Click the action button and confirm it
    pub async fn apply_action(
        &self,
        nav: &mut dyn PageNavigator,
        action: DispositionAction,
    ) -> NavResult<()> {
        let slug = action.slug();
        nav.screenshot(&format!("{}_1", slug)).await?;
        nav.click(self.selectors.action_button(action)).await?;
        nav.screenshot(&format!("{}_2", slug)).await?;
        nav.click(&self.selectors.confirm_button).await?;
        nav.screenshot(&format!("{}_3", slug)).await?;
        info!(action = %action, "action confirmed");
        Ok(())
    }

    pub async fn escalate(&self, nav: &mut dyn PageNavigator) -> NavResult<()> {
        nav.click(&self.selectors.escalate_button).await?;
        nav.pause(self.policy.settle / 2).await;
        info!("transaction escalated");
        Ok(())
    }

    /// Sign out. Returns `false` when the page shows the BPM application
    /// and there is nothing to sign out of.
    pub async fn logout(&self, nav: &mut dyn PageNavigator, bpm_marker: &str) -> NavResult<bool> {
        let url = nav.current_url().await?;
        if !bpm_marker.is_empty() && url.contains(bpm_marker) {
            debug!(%url, "on the BPM application, skipping Firco logout");
            return Ok(false);
        }
        nav.pause(self.policy.settle).await;
        nav.click(&self.selectors.logout_button).await?;
        info!("logged out of Firco");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, FircoUi, HOME, LOGIN};
    use action_primitives::scripted::{Script, ScriptedNavigator, ANY_VIEW};

    fn surface() -> FircoSurface {
        FircoUi::new().firco_surface()
    }

    #[tokio::test]
    async fn test_login_fills_credentials() {
        let mut nav = ScriptedNavigator::new(FircoUi::new().script());
        surface()
            .login(&mut nav, &fixtures::operator())
            .await
            .expect("login");

        let s = FircoSelectors::default();
        assert_eq!(nav.script().current_view(), HOME);
        assert_eq!(
            nav.script().fills(),
            vec![
                (s.username_input.clone(), "506".to_string()),
                (s.password_input.clone(), "operator-secret".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_rejected_login_is_a_permission_error() {
        let mut nav = ScriptedNavigator::new(FircoUi::new().reject_logins().script());
        let err = surface()
            .login(&mut nav, &fixtures::operator())
            .await
            .expect_err("rejected");
        assert!(matches!(err, NavError::PermissionDenied(_)));
        assert!(!err.to_string().contains("operator-secret"));
        assert_eq!(nav.script().current_view(), LOGIN);
    }

    #[tokio::test]
    async fn test_signed_in_session_skips_the_form() {
        let script = Script::new(HOME).on_goto("firco.test", HOME);
        let mut nav = ScriptedNavigator::new(script);
        surface()
            .login(&mut nav, &fixtures::manager())
            .await
            .expect("login");
        assert!(nav.script().fills().is_empty());
    }

    #[tokio::test]
    async fn test_review_hits_captures_each_hit() {
        let mut nav = ScriptedNavigator::new(FircoUi::new().hits(2).script());
        let reviewed = surface().review_hits(&mut nav).await.expect("hits");
        assert_eq!(reviewed, 2);
        assert_eq!(nav.script().screenshots(), vec!["hit_0", "hit_1", "hit_2"]);
    }

    #[tokio::test]
    async fn test_apply_action_confirms_with_screenshots() {
        let mut nav = ScriptedNavigator::new(FircoUi::new().script());
        surface()
            .apply_action(&mut nav, DispositionAction::Block)
            .await
            .expect("action");

        let s = FircoSelectors::default();
        assert_eq!(nav.script().clicks(), vec![s.block_button, s.confirm_button]);
        assert_eq!(
            nav.script().screenshots(),
            vec!["block_1", "block_2", "block_3"]
        );
    }

    #[tokio::test]
    async fn test_unlock_falls_back_to_ok_button() {
        let s = FircoSelectors::default();
        let script = FircoUi::new()
            .live(vec![fixtures::posted_success()])
            .locked()
            .script()
            .count(ANY_VIEW, &s.result_rows, 1)
            .fail(
                &s.close_overlay_button,
                NavError::Timeout("close button".into()),
                1,
            );
        let mut nav = ScriptedNavigator::new(script);
        surface().select_row(&mut nav, 0).await.expect("selected");

        let clicks = nav.script().clicks();
        assert_eq!(
            clicks,
            vec![s.padlock_icon, s.overlay_ok_button, s.result_rows]
        );
    }

    #[tokio::test]
    async fn test_logout_skipped_on_bpm_pages() {
        let script = Script::new(HOME).on_goto("bpm.test", HOME);
        let mut nav = ScriptedNavigator::new(script);
        nav.goto(fixtures::BPM_URL).await.expect("goto");

        let logged_out = surface().logout(&mut nav, "mtexrt").await.expect("logout");
        assert!(!logged_out);
        assert!(nav.script().clicks().is_empty());
    }

    #[tokio::test]
    async fn test_logout_on_firco_pages() {
        let mut nav = ScriptedNavigator::new(FircoUi::new().script());
        nav.goto(fixtures::FIRCO_URL).await.expect("goto");

        let logged_out = surface().logout(&mut nav, "mtexrt").await.expect("logout");
        assert!(logged_out);
        assert_eq!(nav.script().current_view(), LOGIN);
    }

    #[tokio::test]
    async fn test_read_markers_uses_configured_columns() {
        let s = FircoSelectors::default();
        let mut cells = vec![""; 12];
        cells[3] = "PostedTxnToFirco";
        cells[9] = "26";
        cells[10] = " SUCCESS ";
        let script = Script::new(HOME).rows(ANY_VIEW, &s.result_rows, &s.result_cells, vec![cells]);
        let mut nav = ScriptedNavigator::new(script);

        let markers = surface().read_markers(&mut nav, 0).await.expect("markers");
        assert_eq!(markers, RawMarkers::new("26", "PostedTxnToFirco", "SUCCESS"));

        let missing = surface().read_markers(&mut nav, 4).await.expect("markers");
        assert_eq!(missing, RawMarkers::default());
    }
}
