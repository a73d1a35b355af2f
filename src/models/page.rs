//! Catalogue request parameters and per-page results.

use serde::{Deserialize, Serialize};

use crate::models::RawRecord;

/// The fixed filter map sent with every catalogue request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParams {
    /// Exam tier code (`targetCd`)
    pub target_code: String,
    pub begin_year: u16,
    pub end_year: u16,
    pub month_all: String,
    pub month_list: String,
    pub months: Vec<String>,
    pub subject_list: String,
    pub subject: String,
    pub sort: String,
    pub page_size: Option<u32>,
    pub search_flag: String,
}

impl FilterParams {
    /// Form fields for one page, in the order the site serializes them.
    ///
    /// `months` are sent as repeated `month` fields after the scalar fields.
    pub fn to_form(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("targetCd", self.target_code.clone()),
            ("beginYear", self.begin_year.to_string()),
            ("endYear", self.end_year.to_string()),
            ("monthAll", self.month_all.clone()),
            ("monthList", self.month_list.clone()),
            ("subjList", self.subject_list.clone()),
            ("subj", self.subject.clone()),
            ("sort", self.sort.clone()),
            ("pageIndex", page.to_string()),
            ("searchFlag", self.search_flag.clone()),
        ];
        if let Some(size) = self.page_size {
            form.push(("pageSize", size.to_string()));
        }
        form.extend(
            self.months
                .iter()
                .map(|m| m.trim())
                .filter(|m| !m.is_empty())
                .map(|m| ("month", m.to_string())),
        );
        form
    }
}

/// How a fetched page ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageOutcome {
    /// Records were extracted; pagination continues
    Records,
    /// The response had no list; pagination is complete
    Empty,
    /// A list was present but nothing could be extracted from it
    Unparsed,
}

/// Records extracted from one catalogue page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    pub page: u32,
    pub records: Vec<RawRecord>,
    pub outcome: PageOutcome,
}

impl PageResult {
    /// Classify a page from its marker check and extracted records.
    pub fn new(page: u32, has_list: bool, records: Vec<RawRecord>) -> Self {
        let outcome = match (has_list, records.is_empty()) {
            (false, _) => PageOutcome::Empty,
            (true, true) => PageOutcome::Unparsed,
            (true, false) => PageOutcome::Records,
        };
        let records = if has_list { records } else { Vec::new() };
        Self {
            page,
            records,
            outcome,
        }
    }

    pub fn has_more(&self) -> bool {
        self.outcome == PageOutcome::Records
    }
}
