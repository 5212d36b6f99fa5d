//! Scripted Firco and BPM screens for tests
//!
//! [`FircoUi`] renders the default selector catalogues into a
//! [`Script`] so tests only describe what each surface contains.

use action_primitives::scripted::{Script, ANY_VIEW};
use action_primitives::{Credentials, WaitPolicy};
use firco_core_types::RawMarkers;

use crate::bpm::BpmSurface;
use crate::firco::FircoSurface;
use crate::locator::TransactionLocator;
use crate::selectors::{BpmSelectors, FircoSelectors};

pub const FIRCO_URL: &str = "https://firco.test/continuity";
pub const BPM_URL: &str = "https://bpm.test/mtexrt/index";

pub const LOGIN: &str = "login";
pub const HOME: &str = "home";
pub const LIVE: &str = "live";
pub const LIVE_RESULTS: &str = "live_results";
pub const LIVE_SORTED: &str = "live_sorted";
pub const HISTORY: &str = "history";
pub const HISTORY_RESULTS: &str = "history_results";
pub const SANCTIONS: &str = "sanctions";
pub const SANCTIONS_RESULTS: &str = "sanctions_results";
pub const BPM_LOGIN: &str = "bpm_login";
pub const BPM_HOME: &str = "bpm_home";

pub fn operator() -> Credentials {
    Credentials::new("506", "operator-secret")
}

pub fn manager() -> Credentials {
    Credentials::new("507", "manager-secret")
}

/// Cells of a live row carrying `markers` at the default column positions
pub fn live_row(markers: &RawMarkers) -> Vec<String> {
    let columns = FircoSelectors::default().live_columns;
    let mut cells = vec![String::new(); 12];
    cells[columns.holding_qm - 1] = markers.holding_qm.clone();
    cells[columns.current_status - 1] = markers.current_status.clone();
    cells[columns.status - 1] = markers.status.clone();
    cells
}

/// Cells of a BPM result row (REFERENCE, CURRENT STATUS, HOLDING QM, STATUS)
pub fn bpm_row(reference: &str, current_status: &str, holding_qm: &str, status: &str) -> Vec<String> {
    let mut cells = vec![String::new(); 12];
    cells[1] = reference.to_string();
    cells[3] = current_status.to_string();
    cells[9] = holding_qm.to_string();
    cells[10] = status.to_string();
    cells
}

/// Markers of an actionable live row
pub fn posted_success() -> RawMarkers {
    RawMarkers::new("12-QM", "PostedTxnToFirco", "SUCCESS")
}

/// Contents of every surface for one scripted run
#[derive(Debug, Clone, Default)]
pub struct FircoUi {
    live: Vec<Vec<String>>,
    live_sorted: Option<Vec<Vec<String>>>,
    history: usize,
    sanctions: usize,
    bpm: Option<(String, Vec<String>)>,
    locked: bool,
    hits: usize,
    reject_logins: bool,
}

impl FircoUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live rows in grid order
    pub fn live(mut self, rows: Vec<RawMarkers>) -> Self {
        self.live = rows.iter().map(live_row).collect();
        self
    }

    /// Live rows after sorting newest first; defaults to grid order
    pub fn live_sorted(mut self, rows: Vec<RawMarkers>) -> Self {
        self.live_sorted = Some(rows.iter().map(live_row).collect());
        self
    }

    pub fn history(mut self, rows: usize) -> Self {
        self.history = rows;
        self
    }

    pub fn sanctions_bypass(mut self, rows: usize) -> Self {
        self.sanctions = rows;
        self
    }

    pub fn bpm(mut self, reference: &str, cells: Vec<String>) -> Self {
        self.bpm = Some((reference.to_string(), cells));
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn hits(mut self, hits: usize) -> Self {
        self.hits = hits;
        self
    }

    /// Login forms stay on screen after submitting
    pub fn reject_logins(mut self) -> Self {
        self.reject_logins = true;
        self
    }

    pub fn script(&self) -> Script {
        let f = FircoSelectors::default();
        let b = BpmSelectors::default();
        let mut script = Script::new(LOGIN)
            .on_goto("firco.test", LOGIN)
            .on_goto("bpm.test", BPM_LOGIN)
            .count(LOGIN, &f.username_input, 1)
            .count(BPM_LOGIN, &b.username_input, 1)
            .on_click(ANY_VIEW, &f.logout_button, LOGIN)
            .texts(ANY_VIEW, &f.live_messages_header, &["Live Messages"])
            .count(ANY_VIEW, &f.live_messages_tab_selected, 1)
            .visible(ANY_VIEW, &f.filtered_column_icon, false)
            .on_click(ANY_VIEW, &f.live_messages_link, LIVE)
            .on_click(LIVE, &f.confirm_filter_button, LIVE_RESULTS)
            .on_click(LIVE_RESULTS, &f.sort_descending, LIVE_SORTED)
            .on_click(ANY_VIEW, &f.history_link, HISTORY)
            .on_click(HISTORY, &f.confirm_filter_button, HISTORY_RESULTS)
            .on_click(ANY_VIEW, &f.sanctions_bypass_tab, SANCTIONS)
            .on_click(SANCTIONS, &f.confirm_filter_button, SANCTIONS_RESULTS)
            .count(ANY_VIEW, &f.hit_rows, f.first_hit_row + self.hits)
            .count(ANY_VIEW, &f.padlock_icon, usize::from(self.locked));

        if !self.reject_logins {
            script = script
                .on_click(LOGIN, &f.submit_button, HOME)
                .on_click(BPM_LOGIN, &b.submit_button, BPM_HOME);
        }

        let sorted = self.live_sorted.clone().unwrap_or_else(|| self.live.clone());
        for (view, rows) in [(LIVE_RESULTS, &self.live), (LIVE_SORTED, &sorted)] {
            script = script
                .count(view, &f.result_rows, rows.len())
                .visible(view, &f.no_data_notice, rows.is_empty())
                .rows(
                    view,
                    &f.result_rows,
                    &f.result_cells,
                    rows.iter()
                        .map(|row| row.iter().map(String::as_str).collect())
                        .collect(),
                );
        }
        for (view, rows) in [(HISTORY_RESULTS, self.history), (SANCTIONS_RESULTS, self.sanctions)] {
            script = script
                .count(view, &f.result_rows, rows)
                .visible(view, &f.no_data_notice, rows == 0);
        }

        if let Some((reference, cells)) = &self.bpm {
            let row = b.result_row_for(reference);
            script = script.count(BPM_HOME, &row, 1).rows(
                BPM_HOME,
                &row,
                &b.result_cells,
                vec![cells.iter().map(String::as_str).collect()],
            );
        }
        script
    }

    pub fn firco_surface(&self) -> FircoSurface {
        FircoSurface::new(FIRCO_URL, FircoSelectors::default(), WaitPolicy::immediate())
    }

    pub fn bpm_surface(&self) -> BpmSurface {
        BpmSurface::new(
            BPM_URL,
            Credentials::new("bpm-reader", "bpm-secret"),
            BpmSelectors::default(),
            WaitPolicy::immediate(),
        )
    }

    pub fn locator(&self) -> TransactionLocator {
        TransactionLocator::new(self.firco_surface()).with_bpm(self.bpm_surface())
    }
}
