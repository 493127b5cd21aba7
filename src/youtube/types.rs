//! Parameter types for the public service operations.

use clap::ValueEnum;

use super::request::RequestDescriptor;

/// Sort order for search results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SearchOrder {
  #[default]
  Relevance,
  Date,
  ViewCount,
}

impl SearchOrder {
  pub fn as_api_value(self) -> &'static str {
    match self {
      SearchOrder::Relevance => "relevance",
      SearchOrder::Date => "date",
      SearchOrder::ViewCount => "viewCount",
    }
  }
}

/// Coarse duration classes understood by the search endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum VideoDuration {
  /// Under 4 minutes
  Short,
  /// 4 to 20 minutes
  Medium,
  /// Over 20 minutes
  Long,
}

impl VideoDuration {
  pub fn as_api_value(self) -> &'static str {
    match self {
      VideoDuration::Short => "short",
      VideoDuration::Medium => "medium",
      VideoDuration::Long => "long",
    }
  }
}

/// Video quality filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum VideoDefinition {
  Standard,
  High,
}

impl VideoDefinition {
  pub fn as_api_value(self) -> &'static str {
    match self {
      VideoDefinition::Standard => "standard",
      VideoDefinition::High => "high",
    }
  }
}

/// Filters for video search, mapped onto the upstream `search.list`
/// parameter names.
#[derive(Clone, Debug)]
pub struct SearchFilters {
  pub order: SearchOrder,
  /// ISO 3166-1 alpha-2 region code, e.g. "VN" or "US".
  pub region_code: Option<String>,
  /// ISO 639-1 language code used for relevance ranking.
  pub relevance_language: Option<String>,
  /// RFC 3339 timestamps bounding the upload date.
  pub published_after: Option<String>,
  pub published_before: Option<String>,
  pub video_duration: Option<VideoDuration>,
  pub video_definition: Option<VideoDefinition>,
  pub page_token: Option<String>,
  pub max_results: u32,
}

impl Default for SearchFilters {
  fn default() -> Self {
    Self {
      order: SearchOrder::default(),
      region_code: None,
      relevance_language: None,
      published_after: None,
      published_before: None,
      video_duration: None,
      video_definition: None,
      page_token: None,
      max_results: 25,
    }
  }
}

impl SearchFilters {
  pub(crate) fn apply(&self, request: RequestDescriptor) -> RequestDescriptor {
    request
      .param("order", self.order.as_api_value())
      .param("maxResults", self.max_results.to_string())
      .opt_param("regionCode", self.region_code.clone())
      .opt_param("relevanceLanguage", self.relevance_language.clone())
      .opt_param("publishedAfter", self.published_after.clone())
      .opt_param("publishedBefore", self.published_before.clone())
      .opt_param("videoDuration", self.video_duration.map(VideoDuration::as_api_value))
      .opt_param(
        "videoDefinition",
        self.video_definition.map(VideoDefinition::as_api_value),
      )
      .opt_param("pageToken", self.page_token.clone())
  }
}
