//! Selector catalogues for the Firco and BPM user interfaces
//!
//! Every selector is plain CSS unless prefixed with `text=` (exact trimmed
//! text) or `xpath=`. Defaults match the production screens; deployments can
//! override any of them from the configuration file.

use firco_core_types::{DispositionAction, MarketType};
use serde::{Deserialize, Serialize};

/// 1-based cell positions read from a live result row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveColumns {
    pub current_status: usize,
    pub holding_qm: usize,
    pub status: usize,
}

impl Default for LiveColumns {
    fn default() -> Self {
        Self {
            current_status: 4,
            holding_qm: 10,
            status: 11,
        }
    }
}

/// Firco Continuity screens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FircoSelectors {
    // Login form
    pub username_input: String,
    pub password_input: String,
    pub submit_button: String,

    // Navigation
    pub live_messages_link: String,
    pub live_messages_header: String,
    pub live_messages_tab: String,
    pub live_messages_tab_selected: String,
    pub history_link: String,
    pub sanctions_bypass_tab: String,

    // Column filters
    pub filtered_column_icon: String,
    pub message_id_menu_opener: String,
    pub data_filters_item: String,
    pub data_filter_input: String,
    pub add_filter_button: String,
    pub confirm_filter_button: String,

    // Result grid
    pub no_data_notice: String,
    pub result_rows: String,
    pub result_cells: String,
    pub date_menu_opener: String,
    pub sort_descending: String,
    pub live_columns: LiveColumns,

    // Row lock overlay
    pub padlock_icon: String,
    pub unlock_overlay: String,
    pub close_overlay_button: String,
    pub overlay_ok_button: String,

    // Transaction details
    pub comment_field: String,
    pub hit_rows: String,
    /// Rows above this index in the hit table are headers
    pub first_hit_row: usize,
    pub escalate_button: String,
    pub stp_release_button: String,
    pub release_button: String,
    pub block_button: String,
    pub reject_button: String,
    pub confirm_button: String,
    pub logout_button: String,
}

impl Default for FircoSelectors {
    fn default() -> Self {
        Self {
            username_input: "input[name='username']".into(),
            password_input: "input[name='PASSWORD']".into(),
            submit_button: "input[type='submit'][value='Submit']".into(),

            live_messages_link: "li#root-menu-0 a.hide.unload-page".into(),
            live_messages_header: "div.stick#text-element-8".into(),
            live_messages_tab:
                "xpath=//a[contains(@class,'tab-center')][contains(normalize-space(.),'Live Messages')]"
                    .into(),
            live_messages_tab_selected:
                "xpath=//a[contains(@class,'tab-center-selected')][contains(normalize-space(.),'Live Messages')]"
                    .into(),
            history_link: "li#root-menu-1".into(),
            sanctions_bypass_tab:
                "xpath=//a[contains(@class,'tab-center')][contains(normalize-space(.),'Sanctions Bypass View')]"
                    .into(),

            filtered_column_icon: "a.column-filtered-icon".into(),
            message_id_menu_opener: "#fmf-table-column-message-id-col-menu-opener".into(),
            data_filters_item: "text=Data filters...".into(),
            data_filter_input: "[id='text-input-element-44']".into(),
            add_filter_button: "[id='Add Filter Button']".into(),
            confirm_filter_button: "[id='Confirm Button']".into(),

            no_data_notice: "div.no-data-notice-wrapper div.no-data-notice".into(),
            result_rows: "table#table-element-1 tbody tr".into(),
            result_cells: "td".into(),
            date_menu_opener: "#fmf-table-column-filtered-date-col-menu-opener".into(),
            sort_descending: "text=Sort descending".into(),
            live_columns: LiveColumns::default(),

            padlock_icon: "div.sprite.table-icon.admin-locked-icon".into(),
            unlock_overlay: "div#overlay-titlebar".into(),
            close_overlay_button: "input[id='Close Overlay Button']".into(),
            overlay_ok_button: "input[type='button'][value='OK']".into(),

            comment_field: "textarea.stick.ui-autocomplete-input[name='COMMENT']".into(),
            hit_rows: "table.hit-table.live tbody tr".into(),
            first_hit_row: 3,
            escalate_button: "input[value='Esc_Sanctions']".into(),
            stp_release_button: "input[value='STP_Release']".into(),
            release_button: "input[value='Release']".into(),
            block_button: "input[value='Block']".into(),
            reject_button: "input[value='Reject']".into(),
            confirm_button: "input[id='Confirm Button']".into(),
            logout_button: "#logout-button".into(),
        }
    }
}

impl FircoSelectors {
    pub fn action_button(&self, action: DispositionAction) -> &str {
        match action {
            DispositionAction::StpRelease => &self.stp_release_button,
            DispositionAction::Release => &self.release_button,
            DispositionAction::Block => &self.block_button,
            DispositionAction::Reject => &self.reject_button,
        }
    }
}

/// BPM tracker screens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BpmSelectors {
    pub username_input: String,
    pub password_input: String,
    pub submit_button: String,

    // Options modal
    pub options_modal: String,
    pub ori_checkbox: String,
    pub ori_tsf_option: String,
    /// `{market}` is replaced with the market display value
    pub market_option: String,
    pub modal_submit: String,

    // Advanced search
    pub search_tab: String,
    pub reference_input: String,
    pub search_button: String,
    /// `{reference}` is replaced with the transaction identifier
    pub result_row: String,
    pub result_cells: String,

    /// URL fragment identifying the BPM application
    pub url_marker: String,
}

impl Default for BpmSelectors {
    fn default() -> Self {
        Self {
            username_input: "input[name='username']".into(),
            password_input: "input[name='PASSWORD']".into(),
            submit_button: "input[type='submit'][value='Submit']".into(),

            options_modal: "div.modal-content[role='document']".into(),
            ori_checkbox:
                "xpath=//li[contains(normalize-space(.),'ORI')]//i[contains(@class,'fa-square-o')]"
                    .into(),
            ori_tsf_option: "xpath=//div//i[contains(normalize-space(.),'ORI-TSF')]".into(),
            market_option:
                "xpath=//li//span[contains(@class,'inf-name')][contains(normalize-space(.),'{market}')]//i[contains(@class,'fa-square-o')]"
                    .into(),
            modal_submit: "button.btn.btn-primary".into(),

            search_tab: "li.nav-item.nav-link a[href='#search']".into(),
            reference_input:
                "xpath=//div[contains(@class,'search-item')]/label[contains(normalize-space(.),'REFERENCE')]/following-sibling::input[1]"
                    .into(),
            search_button: "button.btn.btn-primary".into(),
            result_row: "div.trow:has(> div.tcell[title='{reference}'])".into(),
            result_cells: "div.tcell".into(),

            url_marker: "mtexrt".into(),
        }
    }
}

impl BpmSelectors {
    pub fn market_option_for(&self, market: MarketType) -> String {
        self.market_option.replace("{market}", market.label())
    }

    /// Identifiers are restricted to `[A-Za-z0-9_./-]`, so no quoting is needed
    pub fn result_row_for(&self, reference: &str) -> String {
        self.result_row.replace("{reference}", reference)
    }
}
