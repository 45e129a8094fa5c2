//! PrivMail party process driver: parse CLI, connect the party mesh, load
//! this party's shares, build the search circuit, run the online phase and
//! report statistics. Run once per party, pointed at that party's own share
//! files.

use anyhow::{Context, Result};
use clap::Parser;
use privmail_engine::backend::gmw::GmwBackend;
use privmail_engine::backend::Backend;
use privmail_engine::channel_utils::tcp_channel::{connect_mesh, PeerAddr};
use privmail_engine::circuit::build_search_circuit;
use privmail_engine::cli::{Args, ResolvedConfig, SearchMode};
use privmail_engine::corpus::load_corpus;
use privmail_engine::index::load_index;
use privmail_engine::input::InputBuilder;
use privmail_engine::query::QueryFile;
use privmail_engine::report::Stats;
use privmail_engine::wire::Circuit;
use tracing_subscriber::EnvFilter;

fn init_logging(disable: bool) {
    if disable {
        return;
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn run(config: &ResolvedConfig) -> Result<()> {
    let query = QueryFile::load(&config.query_file_path)
        .with_context(|| format!("loading query file {}", config.query_file_path.display()))?;

    let mails = match &config.mail_dir_path {
        Some(dir) => load_corpus(dir, &query.bucket_scheme)
            .with_context(|| format!("loading mail directory {}", dir.display()))?,
        None => Vec::new(),
    };

    let index = match &config.index_file_path {
        Some(path) => Some(
            load_index(path, &query.bucket_scheme)
                .with_context(|| format!("loading index file {}", path.display()))?,
        ),
        None => None,
    };
    let num_of_emails_in_index = index.as_ref().map(|i| i.num_of_emails).unwrap_or(0);

    tracing::info!(
        search_mode = %config.search_mode,
        num_of_emails = mails.len(),
        "loaded shares, building circuit"
    );

    let mut circuit = Circuit::new();
    let mut input = InputBuilder::new();
    let outputs = build_search_circuit(
        &mut circuit,
        &mut input,
        config.search_mode,
        &query,
        &mails,
        index.as_ref(),
    )
    .context("building search circuit")?;
    let my_inputs = input.into_inputs();

    let my_addr = config
        .parties
        .iter()
        .find(|p| p.id == config.my_id)
        .context("--my-id not found among --parties")?
        .addr;
    let peers: Vec<PeerAddr> = config
        .parties
        .iter()
        .filter(|p| p.id != config.my_id)
        .map(|p| PeerAddr { id: p.id, addr: p.addr })
        .collect();
    let channels = connect_mesh(config.my_id, my_addr, &peers)
        .context("connecting party mesh")?;

    let mut backend = GmwBackend::new(config.my_id, config.parties.len(), channels)
        .context("initialising GMW backend")?;
    let _shares = backend.run(&circuit, &my_inputs).context("running circuit")?;
    backend.finish().context("final synchronisation barrier")?;

    tracing::info!(num_results = outputs.len(), "search circuit evaluated");

    let stats = Stats::new(
        config.search_mode,
        config.parties.len(),
        &query,
        &mails,
        num_of_emails_in_index,
        backend.stats(),
    );

    match &config.json_path {
        Some(path) => {
            let json = serde_json::to_string_pretty(&stats).context("serialising statistics")?;
            std::fs::write(path, json)
                .with_context(|| format!("writing statistics to {}", path.display()))?;
        }
        None => println!("{stats}"),
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let disable_logging = args.disable_logging;
    let print_configuration = args.print_configuration;
    let config = args.resolve()?;

    init_logging(disable_logging);

    if print_configuration {
        println!("{config:#?}");
        return Ok(());
    }

    if config.search_mode == SearchMode::Index && config.mail_dir_path.is_some() {
        tracing::warn!("--mail-dir-path is ignored in index mode");
    }

    run(&config)
}
