use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::ScrapeError;
use crate::models::job::{JobDetails, UNDISCLOSED_SALARY};

/// Matches once a detail page has rendered its main content.
pub const DETAIL_READY_SELECTOR: &str = "h1, #jobDescriptionText, .jobsearch-jobDescriptionText";
/// Matches once the search-results page has rendered its cards.
pub const LISTING_READY_SELECTOR: &str = "div.job_seen_beacon";

const CURRENCY_MARKER: char = '$';

/// Turns detail-page markup into structured fields.
pub trait DetailExtractor: Send + Sync {
    fn extract(&self, html: &str) -> Result<JobDetails, ScrapeError>;
}

/// Selectors for Indeed-style detail pages.
#[derive(Debug)]
pub struct IndeedExtractor {
    title: Selector,
    company: Selector,
    location: Selector,
    salary: Selector,
    description: Selector,
}

impl IndeedExtractor {
    pub fn new() -> Result<Self, ScrapeError> {
        Ok(Self {
            title: parse("h1")?,
            company: parse(r#"div[data-testid="jobsearch-CompanyInfoContainer"] a"#)?,
            location: parse(r#"div[data-testid="inlineHeader-companyLocation"]"#)?,
            salary: parse(r#"div[data-testid="jobsearch-OtherJobDetailsContainer"] span"#)?,
            description: parse("div.jobsearch-JobComponent-description")?,
        })
    }
}

impl DetailExtractor for IndeedExtractor {
    fn extract(&self, html: &str) -> Result<JobDetails, ScrapeError> {
        let doc = Html::parse_document(html);

        Ok(JobDetails {
            job_title: first(&doc, &self.title).and_then(element_text),
            company: first(&doc, &self.company).and_then(element_text),
            location: first(&doc, &self.location).and_then(element_text),
            salary: normalize_salary(first(&doc, &self.salary).and_then(element_text).as_deref()),
            description: first(&doc, &self.description).map(|el| el.html()),
        })
    }
}

/// Keep salary text only when it carries a currency marker.
pub fn normalize_salary(raw: Option<&str>) -> String {
    match raw {
        Some(text) if text.contains(CURRENCY_MARKER) => text.to_string(),
        _ => UNDISCLOSED_SALARY.to_string(),
    }
}

/// Collect absolute detail-page URLs from a search-results page.
///
/// Each `div.job_seen_beacon` card contributes its own `href` or, failing
/// that, the first link inside it. Relative links resolve against `page_url`.
/// Duplicates are dropped, keeping first-seen order.
pub fn parse_listing(html: &str, page_url: &str) -> Result<Vec<String>, ScrapeError> {
    let base = Url::parse(page_url)?;
    let card_sel = parse(LISTING_READY_SELECTOR)?;
    let link_sel = parse("a[href]")?;
    let doc = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for card in doc.select(&card_sel) {
        let href = card
            .value()
            .attr("href")
            .or_else(|| card.select(&link_sel).next().and_then(|a| a.value().attr("href")));

        let Some(href) = href.map(str::trim).filter(|h| !h.is_empty()) else {
            tracing::debug!("Skipping job card without a link");
            continue;
        };

        match base.join(href) {
            Ok(url) => {
                let url = url.to_string();
                if seen.insert(url.clone()) {
                    urls.push(url);
                }
            }
            Err(e) => tracing::debug!("Skipping unresolvable link {href}: {e}"),
        }
    }
    Ok(urls)
}

fn parse(css: &str) -> Result<Selector, ScrapeError> {
    crate::fetch::parse_selector(css)
}

fn first<'a>(doc: &'a Html, sel: &Selector) -> Option<ElementRef<'a>> {
    doc.select(sel).next()
}

fn element_text(el: ElementRef<'_>) -> Option<String> {
    let text = el.text().map(str::trim).filter(|t| !t.is_empty()).collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}
