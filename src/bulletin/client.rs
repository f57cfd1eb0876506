// src/bulletin/client.rs
use once_cell::sync::Lazy;
use reqwest::header;
use scraper::{Html, Selector};
use std::time::Duration;

use crate::bulletin::models::{BulletinDate, LISTING_URL};
use crate::utils::error::BulletinError;

const USER_AGENT: &str = concat!("bulletin_extractor/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 60;

// Bulletin links on the listing page
static BULLETIN_LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a.mail-link").expect("Failed to compile BULLETIN_LINK_SELECTOR")
});

fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
}

/// Downloads raw PDF bytes from `url`.
pub async fn download_pdf(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, BulletinError> {
    tracing::info!("Downloading bulletin from: {}", url);

    let response = client
        .get(url)
        .header(header::ACCEPT, "application/pdf,*/*")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!("HTTP error status: {} for URL: {}", status, url);
        return Err(BulletinError::Http(status));
    }

    let body = response.bytes().await?;
    tracing::debug!("Downloaded {} bytes from {}", body.len(), url);
    Ok(body.to_vec())
}

/// Finds the bulletin link for `label` (`DD-MM-YYYY`) in the listing page HTML.
/// Relative hrefs are resolved against the listing URL.
pub fn find_listing_link(html: &str, label: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let href = document
        .select(&BULLETIN_LINK_SELECTOR)
        .find(|a| a.text().collect::<String>().contains(label))
        .and_then(|a| a.value().attr("href"))?;

    let base = reqwest::Url::parse(LISTING_URL).ok()?;
    base.join(href.trim()).ok().map(String::from)
}

/// Fetches the bulletin for `date`: the direct archive URL first, then the
/// link published on the listing page.
pub async fn fetch_bulletin(date: &BulletinDate) -> Result<Vec<u8>, BulletinError> {
    let client = build_client()?;

    match download_pdf(&client, &date.direct_url()).await {
        Ok(bytes) => return Ok(bytes),
        Err(e) => tracing::warn!("Direct download failed ({}), searching the listing page", e),
    }

    let response = client.get(LISTING_URL).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(BulletinError::Http(status));
    }
    let html = response.text().await?;

    let label = date.listing_label();
    let link = find_listing_link(&html, &label).ok_or_else(|| BulletinError::NotFound(label.clone()))?;
    tracing::info!("Found bulletin link for {}: {}", label, link);

    download_pdf(&client, &link).await
}
