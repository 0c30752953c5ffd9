//! Road-safety news and high-severity driving alerts.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ProvidersConfig;
use crate::error::ProviderError;
use crate::types::Severity;
use crate::upstream;

const NEWSAPI_URL: &str = "https://newsapi.org/v2/everything";
const PROVIDER_NAME: &str = "NewsAPI";

const FEED_QUERY: &str = "road accident driving safety traffic India";
const FEED_PAGE_SIZE: u32 = 10;
const ALERT_QUERY: &str = "road accident closed highway India";
const ALERT_PAGE_SIZE: u32 = 5;

/// Alert descriptions are cut to this many characters.
pub const ALERT_DESCRIPTION_CHARS: usize = 150;

const HIGH_KEYWORDS: &[&str] = &[
    "fatal",
    "death",
    "killed",
    "multiple casualties",
    "road closed",
    "highway blocked",
    "major accident",
];

const MEDIUM_KEYWORDS: &[&str] = &[
    "accident",
    "crash",
    "collision",
    "injured",
    "traffic jam",
    "road block",
];

/// Classify article text by keyword, case-insensitively. High keywords win.
pub fn classify_news_severity(text: &str) -> Severity {
    let lower = text.to_lowercase();
    if HIGH_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Severity::High
    } else if MEDIUM_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Severity::Medium
    } else {
        Severity::Low
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub severity: Severity,
}

impl NewsArticle {
    /// Shorten the description for display as a driving alert.
    pub fn into_alert(mut self) -> Self {
        self.description = self.description.map(|d| {
            let mut short: String = d.chars().take(ALERT_DESCRIPTION_CHARS).collect();
            short.push_str("...");
            short
        });
        self
    }
}

/// Response body for the news feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsFeed {
    pub articles: Vec<NewsArticle>,
    pub count: usize,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_mock: bool,
}

/// Response body for high-severity alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertFeed {
    pub alerts: Vec<NewsArticle>,
    pub count: usize,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_mock: bool,
}

/// Four fixed articles, timestamped relative to now.
pub fn mock_news() -> Vec<NewsArticle> {
    let now = Utc::now();
    let article = |n: u32, title: &str, description: &str, source: &str, age_hours: i64, severity| {
        NewsArticle {
            id: format!("mock_news_{n}"),
            title: title.to_string(),
            description: Some(description.to_string()),
            source: source.to_string(),
            url: Some("#".to_string()),
            published_at: Some((now - Duration::hours(age_hours)).to_rfc3339()),
            image_url: None,
            severity,
        }
    };
    vec![
        article(
            1,
            "NH44 Partially Closed Due to Road Widening Work",
            "National Highway 44 is partially closed near Siddipet for ongoing road widening. Commuters advised to use alternate routes.",
            "Times of India",
            1,
            Severity::High,
        ),
        article(
            2,
            "Heavy Rains Expected Across Telangana - Drive Carefully",
            "IMD has issued a yellow alert for heavy rains. Drivers are advised to reduce speed and keep headlights on.",
            "NDTV",
            2,
            Severity::Medium,
        ),
        article(
            3,
            "Traffic Diversion on Outer Ring Road This Weekend",
            "GHMC has announced traffic diversions on ORR for maintenance work from Saturday evening to Sunday morning.",
            "Deccan Chronicle",
            3,
            Severity::Medium,
        ),
        article(
            4,
            "New Drunk Driving Crackdown Begins in Hyderabad",
            "Hyderabad Traffic Police have started special naka checking from midnight to 4 AM at major city entry points.",
            "The Hindu",
            24,
            Severity::Low,
        ),
    ]
}

fn mock_alerts() -> Vec<NewsArticle> {
    mock_news()
        .into_iter()
        .filter(|a| a.severity == Severity::High)
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsApiResponse {
    #[serde(default)]
    pub articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub url_to_image: Option<String>,
    pub published_at: Option<String>,
    pub source: Option<NewsApiSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsApiSource {
    pub name: Option<String>,
}

impl NewsApiArticle {
    /// Convert, dropping untitled and `[Removed]` placeholder entries.
    /// Severity is judged from `severity_text(title, description)`.
    fn into_article(self, severity_text: impl Fn(&str, Option<&str>) -> String) -> Option<NewsArticle> {
        let title = self.title.filter(|t| !t.is_empty() && !t.contains("[Removed]"))?;
        let severity = classify_news_severity(&severity_text(&title, self.description.as_deref()));
        Some(NewsArticle {
            id: self.url.clone().unwrap_or_default(),
            title,
            description: self.description,
            source: self
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "Unknown".to_string()),
            url: self.url,
            published_at: self.published_at,
            image_url: self.url_to_image,
            severity,
        })
    }
}

/// Build the feed from a NewsAPI payload; severity considers title and description.
pub fn feed_from_response(response: NewsApiResponse) -> Vec<NewsArticle> {
    response
        .articles
        .into_iter()
        .filter_map(|a| {
            a.into_article(|title, description| format!("{title} {}", description.unwrap_or_default()))
        })
        .collect()
}

/// Build alerts from a NewsAPI payload; only high-severity titles survive.
pub fn alerts_from_response(response: NewsApiResponse) -> Vec<NewsArticle> {
    response
        .articles
        .into_iter()
        .filter_map(|a| a.into_article(|title, _| title.to_string()))
        .filter(|a| a.severity == Severity::High)
        .map(NewsArticle::into_alert)
        .collect()
}

/// A source of road-safety news.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn latest(&self) -> Result<Vec<NewsArticle>, ProviderError>;

    async fn alerts(&self) -> Result<Vec<NewsArticle>, ProviderError>;
}

/// NewsAPI.org "everything" search client.
pub struct NewsApiClient {
    client: reqwest::Client,
    api_key: String,
    timeout_secs: u64,
}

impl NewsApiClient {
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> Result<Self, ProviderError> {
        Ok(Self {
            client: upstream::build_client(PROVIDER_NAME, timeout_secs)?,
            api_key: api_key.into(),
            timeout_secs,
        })
    }

    async fn search(&self, query: &str, page_size: u32) -> Result<NewsApiResponse, ProviderError> {
        let url = upstream::url_with_params(
            PROVIDER_NAME,
            NEWSAPI_URL,
            &[
                ("q", query.to_string()),
                ("language", "en".to_string()),
                ("sortBy", "publishedAt".to_string()),
                ("pageSize", page_size.to_string()),
                ("apiKey", self.api_key.clone()),
            ],
        )?;
        upstream::get_json(&self.client, PROVIDER_NAME, url, self.timeout_secs).await
    }
}

#[async_trait]
impl NewsProvider for NewsApiClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn latest(&self) -> Result<Vec<NewsArticle>, ProviderError> {
        Ok(feed_from_response(self.search(FEED_QUERY, FEED_PAGE_SIZE).await?))
    }

    async fn alerts(&self) -> Result<Vec<NewsArticle>, ProviderError> {
        Ok(alerts_from_response(self.search(ALERT_QUERY, ALERT_PAGE_SIZE).await?))
    }
}

/// News lookups with mock fallback.
#[derive(Clone, Default)]
pub struct NewsService {
    provider: Option<Arc<dyn NewsProvider>>,
}

impl NewsService {
    pub fn from_config(config: &ProvidersConfig) -> Result<Self, ProviderError> {
        let provider = match config.news_key() {
            Some(key) => Some(Arc::new(NewsApiClient::new(key, config.news_timeout_secs)?)
                as Arc<dyn NewsProvider>),
            None => None,
        };
        Ok(Self { provider })
    }

    pub fn with_provider(provider: Arc<dyn NewsProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    pub fn is_mock(&self) -> bool {
        self.provider.is_none()
    }

    pub async fn feed(&self) -> NewsFeed {
        let mock = || {
            let articles = mock_news();
            NewsFeed {
                count: articles.len(),
                articles,
                is_mock: true,
            }
        };
        let Some(provider) = &self.provider else {
            debug!("News provider not configured, serving mock data");
            return mock();
        };
        match provider.latest().await {
            Ok(articles) => {
                debug!(count = articles.len(), "News articles fetched");
                NewsFeed {
                    count: articles.len(),
                    articles,
                    is_mock: false,
                }
            }
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "News lookup failed, serving mock data");
                mock()
            }
        }
    }

    /// High-severity alerts. A failed live lookup yields an empty mock list.
    pub async fn alerts(&self) -> AlertFeed {
        let Some(provider) = &self.provider else {
            let alerts = mock_alerts();
            return AlertFeed {
                count: alerts.len(),
                alerts,
                is_mock: true,
            };
        };
        match provider.alerts().await {
            Ok(alerts) => AlertFeed {
                count: alerts.len(),
                alerts,
                is_mock: false,
            },
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "News alerts lookup failed");
                AlertFeed {
                    alerts: Vec::new(),
                    count: 0,
                    is_mock: true,
                }
            }
        }
    }
}

impl std::fmt::Debug for NewsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsService")
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_string()))
            .finish()
    }
}
