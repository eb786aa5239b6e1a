use std::path::PathBuf;

use clap::{Parser, Subcommand};

use catalog_recommender::crawlers::shl::CatalogCrawlerShl;
use catalog_recommender::domain::corpus::Corpus;
use catalog_recommender::models::config::{ServerConfig, StrategyKind};
use catalog_recommender::processing::coverage::check_urls;
use catalog_recommender::processing::crawler::{crawl_catalog_links, parse_catalog_items};
use catalog_recommender::processing::embedding::FastEmbedEncoder;
use catalog_recommender::processing::indexer::build_embedding_index;
use catalog_recommender::processing::recommender::Recommender;
use catalog_recommender::processing::{clamp_top_k, handle_message};
use catalog_recommender::repository::{CatalogReader, FileRepository};

#[derive(Parser, Debug)]
#[command(name = "catalog-recommender", about = "Crawl a product catalog and rank items for free-text queries")]
struct Cli {
    /// Optional YAML configuration layered over `config/default.yaml`
    #[arg(long, global = true, env = "APP_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured ranking strategy
    #[arg(long, global = true, value_enum)]
    strategy: Option<StrategyKind>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover item detail links from the paginated catalog
    Crawl,
    /// Fetch and parse every discovered detail page into the corpus snapshot
    Parse,
    /// Encode the corpus and write the embeddings snapshot
    BuildIndex,
    /// Rank the corpus against a single query and print the results
    Recommend {
        query: String,
        /// Number of results, clamped to the allowed range
        #[arg(long)]
        top_k: Option<i64>,
    },
    /// Report which URLs are present in the corpus snapshot
    Check { urls: Vec<String> },
    /// Answer recommendation requests over a ZeroMQ REP socket
    Serve,
}

fn fail(message: String) -> ! {
    log::error!("{message}");
    std::process::exit(1);
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => fail(format!("Failed to serialize output: {e}")),
    }
}

fn load_recommender(config: &ServerConfig, repo: &FileRepository) -> Recommender {
    match Recommender::load(config, repo) {
        Ok(recommender) => recommender,
        Err(e) => fail(format!("Failed to initialize recommender: {e}")),
    }
}

fn build_crawler(config: &ServerConfig) -> CatalogCrawlerShl {
    match CatalogCrawlerShl::new(config.crawler.clone()) {
        Ok(crawler) => crawler,
        Err(e) => fail(format!("Failed to build crawler: {e}")),
    }
}

fn serve(config: &ServerConfig, recommender: &Recommender) {
    let context = zmq::Context::new();
    let responder = match context.socket(zmq::REP) {
        Ok(socket) => socket,
        Err(e) => fail(format!("Cannot create zmq socket: {e}")),
    };
    if let Err(e) = responder.bind(&config.zmq_address) {
        fail(format!("Cannot bind to {}: {e}", config.zmq_address));
    }
    log::info!(
        "Serving {:?} recommendations on {}",
        recommender.strategy().kind(),
        config.zmq_address
    );

    loop {
        let msg = match responder.recv_bytes(0) {
            Ok(msg) => msg,
            Err(e) => {
                log::error!("Failed to receive message: {e}");
                continue;
            }
        };
        let reply = handle_message(recommender, &msg);
        let bytes = match serde_json::to_vec(&reply) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("Failed to serialize reply: {e}");
                b"{\"error\":\"internal error\"}".to_vec()
            }
        };
        if let Err(e) = responder.send(bytes, 0) {
            log::error!("Failed to send reply: {e}");
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = Cli::parse();

    let mut config = match ServerConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => fail(format!("Failed to load configuration: {e}")),
    };
    if let Some(strategy) = cli.strategy {
        config.strategy = strategy;
    }
    let repo = FileRepository::from_config(&config);

    match cli.command {
        Command::Crawl => {
            if let Err(e) = crawl_catalog_links(&build_crawler(&config), &repo).await {
                fail(format!("Failed to crawl catalog links: {e}"));
            }
        }
        Command::Parse => {
            if let Err(e) = parse_catalog_items(&build_crawler(&config), &repo).await {
                fail(format!("Failed to parse catalog items: {e}"));
            }
        }
        Command::BuildIndex => {
            let encoder = match FastEmbedEncoder::try_new(&config.embedding_model) {
                Ok(encoder) => encoder,
                Err(e) => fail(e.to_string()),
            };
            if let Err(e) = build_embedding_index(&repo, &encoder) {
                fail(format!("Failed to build embedding index: {e}"));
            }
        }
        Command::Recommend { query, top_k } => {
            let recommender = load_recommender(&config, &repo);
            match recommender.recommend(&query, clamp_top_k(top_k)) {
                Ok(results) => print_json(&results),
                Err(e) => fail(format!("Recommendation failed: {e}")),
            }
        }
        Command::Check { urls } => {
            let corpus = match repo.list_items() {
                Ok(items) => Corpus::new(items),
                Err(e) => fail(format!("Failed to load corpus: {e}")),
            };
            print_json(&check_urls(&corpus, &urls));
        }
        Command::Serve => {
            let recommender = load_recommender(&config, &repo);
            serve(&config, &recommender);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommend_top_k_defaults_through_clamp() {
        let cli = Cli::try_parse_from(["catalog-recommender", "recommend", "java"]).expect("parses");

        match cli.command {
            Command::Recommend { top_k, .. } => {
                assert_eq!(top_k, None);
                assert_eq!(clamp_top_k(top_k), catalog_recommender::DEFAULT_TOP_K);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
