use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use ytscout::cache::{CacheStore, NoopStore, SqliteStore};
use ytscout::config::Config;
use ytscout::keys::KeyPool;
use ytscout::util::extract_video_id;
use ytscout::youtube::{
  SearchFilters, SearchOrder, VideoDefinition, VideoDuration, YouTubeClient, YouTubeService,
};

#[derive(Parser, Debug)]
#[command(name = "ytscout")]
#[command(about = "YouTube content research from the command line")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/ytscout/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Skip the response cache for this invocation
  #[arg(long)]
  no_cache: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Search for videos by keyword
  Search {
    query: String,

    /// Results per page (1-50)
    #[arg(short = 'n', long, default_value_t = 25)]
    max_results: u32,

    /// Sort order
    #[arg(long, value_enum)]
    order: Option<SearchOrder>,

    /// ISO 3166-1 region code, e.g. VN or US
    #[arg(long)]
    region: Option<String>,

    /// ISO 639-1 language code for relevance ranking
    #[arg(long)]
    language: Option<String>,

    /// Duration class
    #[arg(long, value_enum)]
    duration: Option<VideoDuration>,

    /// Definition class
    #[arg(long, value_enum)]
    definition: Option<VideoDefinition>,

    /// Only videos published after this RFC 3339 timestamp
    #[arg(long)]
    published_after: Option<String>,

    /// Page token from a previous response
    #[arg(long)]
    page_token: Option<String>,
  },

  /// Fetch channel records by channel ID
  Channels {
    #[arg(required = true)]
    ids: Vec<String>,
  },

  /// Fetch video records by video ID or URL
  Videos {
    #[arg(required = true)]
    ids: Vec<String>,
  },

  /// Fetch one page of a playlist
  Playlist {
    playlist_id: String,

    /// Page token from a previous response
    #[arg(long)]
    page_token: Option<String>,

    /// Results per page (1-50)
    #[arg(short = 'n', long, default_value_t = 50)]
    page_size: u32,
  },

  /// Fetch one page of a video's comment threads
  Comments {
    /// Video ID or URL
    video: String,

    /// Page token from a previous response
    #[arg(long)]
    page_token: Option<String>,

    /// Results per page (1-100)
    #[arg(short = 'n', long, default_value_t = 100)]
    page_size: u32,
  },

  /// Cache maintenance
  Cache {
    #[command(subcommand)]
    command: CacheCommand,
  },
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
  /// Drop every cached response
  Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  let _log_guard = ytscout::logging::init()?;

  let args = Args::parse();
  let config = Config::load(args.config.as_deref())?;

  // Cache maintenance doesn't need keys and always talks to the real store.
  let needs_keys = !matches!(args.command, Command::Cache { .. });
  let raw_keys = if needs_keys {
    config.api_key_block()?
  } else {
    String::new()
  };

  let pool = Arc::new(KeyPool::from_raw(&raw_keys));
  let client = YouTubeClient::new(pool);

  let skip_cache = (args.no_cache || config.no_cache) && needs_keys;
  let response = if skip_cache {
    run(YouTubeService::with_parts(client, NoopStore), &args.command).await?
  } else {
    let store = open_store(&config)?;
    run(YouTubeService::with_parts(client, store), &args.command).await?
  };

  println!("{}", serde_json::to_string_pretty(&response)?);

  Ok(())
}

fn open_store(config: &Config) -> Result<SqliteStore> {
  match &config.cache_path {
    Some(path) => SqliteStore::open_at(path),
    None => SqliteStore::open(),
  }
}

async fn run<S: CacheStore>(service: YouTubeService<S>, command: &Command) -> Result<Value> {
  match command {
    Command::Search {
      query,
      max_results,
      order,
      region,
      language,
      duration,
      definition,
      published_after,
      page_token,
    } => {
      let filters = SearchFilters {
        order: (*order).unwrap_or_default(),
        max_results: *max_results,
        region_code: region.clone(),
        relevance_language: language.clone(),
        video_duration: *duration,
        video_definition: *definition,
        published_after: published_after.clone(),
        published_before: None,
        page_token: page_token.clone(),
      };
      Ok(service.search_videos(query, &filters).await?)
    }

    Command::Channels { ids } => {
      let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
      Ok(service.get_channel_details(&refs).await?)
    }

    Command::Videos { ids } => {
      let resolved: Vec<String> = ids
        .iter()
        .map(|input| {
          extract_video_id(input).ok_or_else(|| eyre!("Not a video ID or URL: {}", input))
        })
        .collect::<Result<_>>()?;
      let refs: Vec<&str> = resolved.iter().map(String::as_str).collect();
      Ok(service.get_video_details(&refs).await?)
    }

    Command::Playlist {
      playlist_id,
      page_token,
      page_size,
    } => {
      Ok(
        service
          .get_playlist_items(playlist_id, page_token.as_deref(), *page_size)
          .await?,
      )
    }

    Command::Comments {
      video,
      page_token,
      page_size,
    } => {
      let id =
        extract_video_id(video).ok_or_else(|| eyre!("Not a video ID or URL: {}", video))?;
      Ok(
        service
          .get_comment_threads(&id, page_token.as_deref(), *page_size)
          .await?,
      )
    }

    Command::Cache {
      command: CacheCommand::Clear,
    } => {
      service.clear_cache();
      Ok(serde_json::json!({ "cleared": true }))
    }
  }
}
