use std::{collections::HashSet, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pipeline_core::{
    config::normalize_base_url, load_settings, HttpPipelineApi, MoveOutcome, PipelineDataSource,
    PipelineSeed, PipelineView, PipelineViewModel, ReconcileStrategy, StageTransitionController,
};
use shared::domain::{CandidateId, FilterState, JobId, StageId};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pipeline", about = "Inspect and update a job's candidate pipeline")]
struct Args {
    /// Settings file (defaults to ./pipeline.toml).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured API base URL.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    job_id: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the board, one stage column at a time.
    Show {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        min_score: Option<f64>,
        #[arg(long)]
        ai_only: bool,
        #[arg(long)]
        read_only: bool,
    },
    /// Move a candidate to another stage and print the reconciled board.
    Move {
        #[arg(long)]
        candidate: String,
        #[arg(long)]
        stage: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref());
    if let Some(server_url) = &args.server_url {
        settings.api_base_url = normalize_base_url(server_url);
    }
    info!(
        api_base_url = %settings.api_base_url,
        job_id = %args.job_id,
        "starting pipeline client"
    );

    let api = HttpPipelineApi::from_settings(&settings).context("failed to build api client")?;
    let source = PipelineDataSource::open(
        Arc::new(api),
        JobId::new(args.job_id.clone()),
        PipelineSeed::default(),
        ReconcileStrategy::Refetch,
    )
    .await;

    let snapshot = source.snapshot().await;
    if !snapshot.is_complete() {
        bail!(
            "{}",
            snapshot
                .error
                .unwrap_or_else(|| "pipeline did not load".to_string())
        );
    }

    match args.command {
        Command::Show {
            search,
            min_score,
            ai_only,
            read_only,
        } => {
            let mut view_model = PipelineViewModel::new(!read_only);
            view_model.set_filters(FilterState {
                search,
                min_score,
                ai_only,
            });
            let view = view_model.view(&snapshot, HashSet::new());
            print_board(&view);
        }
        Command::Move { candidate, stage } => {
            let controller = StageTransitionController::new(Arc::clone(&source));
            let outcome = controller
                .move_stage(
                    &CandidateId::new(candidate.clone()),
                    &StageId::new(stage.clone()),
                )
                .await
                .with_context(|| format!("failed to move {candidate} to {stage}"))?;
            match outcome {
                MoveOutcome::Moved => println!("Moved {candidate} to {stage}."),
                MoveOutcome::Unchanged => println!("{candidate} is already in {stage}."),
                MoveOutcome::AlreadyPending => println!("A move for {candidate} is in progress."),
            }

            let snapshot = source.snapshot().await;
            let view = PipelineViewModel::new(true).view(&snapshot, HashSet::new());
            print_board(&view);
        }
    }

    source.dispose().await;
    Ok(())
}

fn print_board(view: &PipelineView) {
    if let Some(job) = &view.job {
        println!("{} ({})", job.title, job.id);
    }
    if let Some(error) = &view.error {
        println!("! {error}");
    }

    for column in &view.board.columns {
        let marker = if column.known { "" } else { " [unknown stage]" };
        println!("\n== {} ({}){marker}", column.name, column.count());
        for candidate in &column.candidates {
            let name = candidate.name.as_deref().unwrap_or("(unnamed)");
            let email = candidate.email.as_deref().unwrap_or("-");
            let score = candidate
                .match_score
                .map(|score| format!("{score:.0}"))
                .unwrap_or_else(|| "-".to_string());
            let applied = candidate
                .applied_at
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string());
            let lock = if view.can_move(&candidate.id) { "" } else { " (locked)" };
            println!(
                "  {:<12} {:<24} {:<28} score {:>3}  applied {applied}{lock}",
                candidate.id.as_str(),
                name,
                email,
                score
            );
        }
    }

    println!(
        "\n{} of {} candidates visible",
        view.board.total_visible, view.board.total_candidates
    );
}
