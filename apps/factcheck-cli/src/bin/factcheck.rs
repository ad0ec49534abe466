use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use factcheck_core::config::{expand_path, Config};
use factcheck_core::settings::FactcheckSettings;
use factcheck_core::sources::DirectorySource;
use factcheck_core::traits::SourceProvider;
use factcheck_embed::default_embedder;
use factcheck_index::{EmbeddingCache, EvidenceIndex};
use factcheck_verdict::{ClassificationReport, Granularity, VerdictMapper};

const USAGE: &str = "Usage: factcheck <command> [args...]

Commands:
  probe [sources_dir] \"<claim>\"          retrieve evidence for a claim from every source
                                       (sources_dir defaults to data.sources_dir)
  score <predictions.jsonl> [--granularity full|ternary|binary]
                                       score normalized predictions against ground truth
  taxonomies                           list registered verdict taxonomies";

fn progress_bar(len: u64, unit: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let template = format!("{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {unit} {{msg}}");
    if let Ok(style) = ProgressStyle::default_bar().template(&template) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

fn load_mapper(settings: &FactcheckSettings) -> anyhow::Result<VerdictMapper> {
    let mut mapper = VerdictMapper::builtin()?;
    for dir in &settings.taxonomy.dirs {
        let loaded = mapper.load_dir(&expand_path(dir))?;
        tracing::info!(dir = %dir, loaded, "Loaded taxonomy tables");
    }
    Ok(mapper)
}

fn probe(config: &Config, settings: &FactcheckSettings, args: &[String]) -> anyhow::Result<()> {
    let (root, claim) = match args {
        [claim] => (config.sources_dir().context("no sources_dir argument and no data.sources_dir configured")?, claim),
        [dir, claim] => (expand_path(dir), claim),
        _ => anyhow::bail!("Usage: factcheck probe [sources_dir] \"<claim>\""),
    };
    let source = DirectorySource::new(root);
    let source_ids = source.source_ids()?;
    if source_ids.is_empty() {
        anyhow::bail!("no source directories under {}", source.root().display());
    }
    let embedder = default_embedder(&settings.embedding)?;
    let retrieval = &settings.retrieval;
    let query = retrieval.build_query(claim);

    println!("Claim: {claim}");
    println!("Sources: {} | top_k {} | min_similarity {}", source_ids.len(), retrieval.top_k, retrieval.min_similarity);

    let mut cache = EmbeddingCache::new();
    let pb = progress_bar(source_ids.len() as u64, "sources");
    let mut indexes = Vec::with_capacity(source_ids.len());
    for source_id in &source_ids {
        pb.set_message(source_id.clone());
        let documents = source.documents(source_id)?;
        indexes.push(EvidenceIndex::build_cached(&documents, &settings.chunking, embedder.clone(), &mut cache)?);
        pb.inc(1);
    }
    pb.finish_with_message("indexed");

    for index in &indexes {
        let evidence = index.query(&query, retrieval.top_k, retrieval.min_similarity)?;
        println!("\n== {} ({} chunks, {} retrieved)", index.source_id(), index.len(), evidence.len());
        if evidence.is_empty() {
            println!("   no passage reached the similarity threshold");
        }
        for (i, entry) in evidence.iter().enumerate() {
            let preview: String = entry.chunk.content.chars().take(160).collect();
            println!("[E{}] {:.3} {}  {}", i + 1, entry.score, entry.chunk.id, preview);
        }
    }
    Ok(())
}

/// One JSON line of a predictions file.
#[derive(Debug, Deserialize)]
struct PredictionRecord {
    #[serde(default)]
    claim: Option<String>,
    truth: String,
    truth_taxonomy: String,
    predicted: String,
    predicted_taxonomy: String,
}

fn parse_granularity(value: &str) -> anyhow::Result<Granularity> {
    match value {
        "full" => Ok(Granularity::Full),
        "ternary" => Ok(Granularity::Ternary),
        "binary" => Ok(Granularity::Binary),
        other => anyhow::bail!("unknown granularity '{other}' (expected full, ternary or binary)"),
    }
}

fn score(settings: &FactcheckSettings, args: &[String]) -> anyhow::Result<()> {
    let mut path = None;
    let mut granularity = Granularity::Ternary;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--granularity" | "-g" => {
                let value = args.get(i + 1).context("--granularity requires a value")?;
                granularity = parse_granularity(value)?;
                i += 1;
            }
            arg if !arg.starts_with('-') => path = Some(expand_path(arg)),
            other => anyhow::bail!("unknown flag '{other}'"),
        }
        i += 1;
    }
    let path: PathBuf = path.context("Usage: factcheck score <predictions.jsonl> [--granularity full|ternary|binary]")?;
    let mapper = load_mapper(settings)?;

    let content = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();

    let mut truth = Vec::with_capacity(lines.len());
    let mut predicted = Vec::with_capacity(lines.len());
    let mut unmapped: BTreeMap<String, usize> = BTreeMap::new();
    let pb = progress_bar(lines.len() as u64, "rows");
    for (n, line) in lines.iter().enumerate() {
        let record: PredictionRecord =
            serde_json::from_str(line).with_context(|| format!("{}:{}: malformed record", path.display(), n + 1))?;
        let t = mapper.normalize(&record.truth, &record.truth_taxonomy);
        let p = mapper.normalize(&record.predicted, &record.predicted_taxonomy);
        match (t, p) {
            (Ok(t), Ok(p)) => {
                truth.push(t);
                predicted.push(p);
            }
            (t, p) => {
                for err in [t.err(), p.err()].into_iter().flatten() {
                    tracing::warn!(row = n + 1, claim = record.claim.as_deref().unwrap_or(""), error = %err, "Unmapped label");
                    if let factcheck_core::Error::UnmappedVerdict { label, taxonomy } = err {
                        *unmapped.entry(format!("{taxonomy}:{label}")).or_default() += 1;
                    }
                }
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("normalized");

    let unmapped_rows = lines.len() - truth.len();
    if truth.is_empty() {
        anyhow::bail!("no scorable rows in {} ({unmapped_rows} unmapped)", path.display());
    }
    let report = ClassificationReport::compute(&truth, &predicted, granularity)?;
    println!("\n{report}");
    println!("unmapped: {unmapped_rows} of {} rows", lines.len());
    for (label, count) in &unmapped {
        println!("  {label}: {count}");
    }
    Ok(())
}

fn taxonomies(settings: &FactcheckSettings) -> anyhow::Result<()> {
    let mapper = load_mapper(settings)?;
    for id in mapper.taxonomy_ids() {
        if let Some(table) = mapper.taxonomy(id) {
            let description = table.description().map(|d| format!(": {d}")).unwrap_or_default();
            println!("{id} v{} ({} labels){description}", table.version(), table.len());
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {e}"); e })?;
    let settings = config.settings()?;

    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    match cmd.as_str() {
        "probe" => probe(&config, &settings, &args),
        "score" => score(&settings, &args),
        "taxonomies" => taxonomies(&settings),
        _ => {
            eprintln!("Unknown command: {cmd}\n\n{USAGE}");
            std::process::exit(1);
        }
    }
}
