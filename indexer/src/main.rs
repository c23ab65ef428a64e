use anyhow::Result;
use clap::{Parser, Subcommand};
use lemmadex_core::{
    lemmatizer_for, BooleanSearcher, CorpusPaths, InvertedIndex, StatisticsComputer, VectorSpaceRanker, DEFAULT_TOP_K,
};
use tracing_subscriber::{fmt, EnvFilter};

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the inverted index and TF-IDF weights, and query them", long_about = None)]
struct Cli {
    /// Corpus root holding tokens/, lemmas/, tfidf-tokens/, tfidf-lemmas/ and inverted_index.txt
    #[arg(long, global = true, default_value = "./data")]
    data: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the inverted index from per-document lemma files
    Build {
        /// Lemma directory (default: <data>/lemmas)
        #[arg(long)]
        lemmas: Option<PathBuf>,
        /// Index file to write (default: <data>/inverted_index.txt)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Compute DF, IDF and TF-IDF for the token and lemma tracks
    Stats {
        #[arg(long)]
        tokens: Option<PathBuf>,
        #[arg(long)]
        lemmas: Option<PathBuf>,
        #[arg(long)]
        out_tokens: Option<PathBuf>,
        #[arg(long)]
        out_lemmas: Option<PathBuf>,
    },
    /// Boolean search; reads queries from stdin when no expression is given
    Query {
        #[arg(long)]
        index: Option<PathBuf>,
        /// Lemma directory used to canonicalize query terms
        #[arg(long)]
        lemmas: Option<PathBuf>,
        /// Use a Snowball stemmer for this language instead of the lemma table
        #[arg(long)]
        stemmer: Option<String>,
        expr: Option<String>,
    },
    /// Rank documents by cosine similarity to a free-text query
    Rank {
        /// Weight directory (default: <data>/tfidf-lemmas)
        #[arg(long)]
        tfidf: Option<PathBuf>,
        #[arg(short, long, default_value_t = DEFAULT_TOP_K)]
        k: usize,
        /// Print results as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
        query: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let mut paths = CorpusPaths::new(&cli.data);

    match cli.command {
        Commands::Build { lemmas, output } => {
            if let Some(dir) = lemmas { paths.lemmas = dir; }
            if let Some(file) = output { paths.index_file = file; }
            build_index(&paths)
        }
        Commands::Stats { tokens, lemmas, out_tokens, out_lemmas } => {
            if let Some(dir) = tokens { paths.tokens = dir; }
            if let Some(dir) = lemmas { paths.lemmas = dir; }
            if let Some(dir) = out_tokens { paths.tfidf_tokens = dir; }
            if let Some(dir) = out_lemmas { paths.tfidf_lemmas = dir; }
            let report = StatisticsComputer::new(paths).run()?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Query { index, lemmas, stemmer, expr } => {
            if let Some(file) = index { paths.index_file = file; }
            if let Some(dir) = lemmas { paths.lemmas = dir; }
            query_index(&paths, stemmer.as_deref(), expr)
        }
        Commands::Rank { tfidf, k, json, query } => {
            if let Some(dir) = tfidf { paths.tfidf_lemmas = dir; }
            rank(&paths, k, json, &query)
        }
    }
}

fn build_index(paths: &CorpusPaths) -> Result<()> {
    let index = InvertedIndex::from_lemma_dir(&paths.lemmas)?;
    index.save(&paths.index_file)?;
    tracing::info!(output = %paths.index_file.display(), "index build complete");
    Ok(())
}

fn query_index(paths: &CorpusPaths, stemmer: Option<&str>, expr: Option<String>) -> Result<()> {
    let index = InvertedIndex::load(&paths.index_file)?;
    let lemmatizer = lemmatizer_for(stemmer, &paths.lemmas)?;
    let searcher = BooleanSearcher::new(&index, lemmatizer.as_ref());

    if let Some(expr) = expr {
        let hits = searcher.search(&expr)?;
        print_ids(&hits);
        return Ok(());
    }

    let stdin = io::stdin();
    let mut out = io::stdout();
    write!(out, "> ")?;
    out.flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim() == "exit" { break; }
        match searcher.search(&line) {
            Ok(hits) if hits.is_empty() => println!("no documents match"),
            Ok(hits) => print_ids(&hits),
            Err(err) => eprintln!("invalid query: {err}"),
        }
        write!(out, "> ")?;
        out.flush()?;
    }
    Ok(())
}

fn print_ids(ids: &[String]) {
    println!("{} document(s)", ids.len());
    for id in ids {
        println!("- {id}");
    }
}

fn rank(paths: &CorpusPaths, k: usize, json: bool, query: &str) -> Result<()> {
    let ranker = VectorSpaceRanker::load(&paths.tfidf_lemmas)?;
    let hits = ranker.search(query, k);
    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else {
        for hit in hits {
            println!("{}\t{:.6}", hit.doc_id, hit.score);
        }
    }
    Ok(())
}
