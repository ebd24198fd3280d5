use std::time::Duration;

use url::Url;

use crate::browser::Selector;
use crate::config::{ScraperConfig, SelectorSection, TimingSection};
use crate::error::ConfigError;

/// Structural selectors for every control the stages touch.
#[derive(Debug, Clone)]
pub struct PortalLayout {
    pub consent: Selector,
    report_type_input: String,
    pub date_input: Selector,
    pub submit: Selector,
    pub results_body: Selector,
    pub empty_marker: Selector,
    pub result_link: Selector,
    pub detail_table: Selector,
    pub detail_row: Selector,
    pub detail_cell: Selector,
}

impl PortalLayout {
    /// The report-type checkbox is matched on its value code.
    pub fn report_type(&self, code: &str) -> Selector {
        Selector::attribute(&self.report_type_input, "value", code)
    }
}

impl From<&SelectorSection> for PortalLayout {
    fn from(section: &SelectorSection) -> Self {
        Self {
            consent: Selector::id(&section.consent_id),
            report_type_input: section.report_type_input.clone(),
            date_input: Selector::id(&section.date_input_id),
            submit: Selector::css(&section.submit),
            results_body: Selector::css(&section.results_body),
            empty_marker: Selector::css(&section.empty_marker),
            result_link: Selector::css(&section.result_link),
            detail_table: Selector::css(&section.detail_table),
            detail_row: Selector::css(&section.detail_row),
            detail_cell: Selector::css(&section.detail_cell),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StageTiming {
    pub stage_timeout: Duration,
    pub settle: Duration,
    pub poll_interval: Duration,
}

impl From<&TimingSection> for StageTiming {
    fn from(section: &TimingSection) -> Self {
        Self {
            stage_timeout: section.stage_timeout(),
            settle: section.settle(),
            poll_interval: section.poll_interval(),
        }
    }
}

/// Everything the stages need, resolved once from configuration.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub entry_url: Url,
    pub layout: PortalLayout,
    pub timing: StageTiming,
    pub date_format: String,
    pub min_columns: usize,
}

impl PipelineSettings {
    pub fn from_config(config: &ScraperConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let entry_url = Url::parse(&config.portal.base_url).map_err(|err| ConfigError::Invalid {
            field: "portal.base_url",
            reason: err.to_string(),
        })?;
        Ok(Self {
            entry_url,
            layout: PortalLayout::from(&config.selectors),
            timing: StageTiming::from(&config.timing),
            date_format: config.portal.date_format.clone(),
            min_columns: config.extraction.min_columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_keys_report_type_on_value_code() {
        let layout = PortalLayout::from(&SelectorSection::default());
        assert_eq!(layout.report_type("11").to_css(), "input.report_types[value=\"11\"]");
        assert_eq!(layout.consent.to_css(), "#agree_statement");
        assert_eq!(layout.date_input.to_css(), "#fromDate");
    }

    #[test]
    fn settings_resolve_from_default_config() {
        let settings = PipelineSettings::from_config(&ScraperConfig::default()).unwrap();
        assert_eq!(settings.entry_url.as_str(), "https://efdsearch.senate.gov/search/");
        assert_eq!(settings.timing.stage_timeout, Duration::from_secs(10));
        assert_eq!(settings.min_columns, 9);
    }
}
