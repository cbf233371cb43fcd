use std::env;
use std::process;

use tinyci::{Engine, EngineConfig, JobStatus, RunRecord};
use tracing_subscriber::EnvFilter;

fn usage(program: &str) -> ! {
    eprintln!("Usage:");
    eprintln!("  {} run <owner/repo> [branch] [commit-sha]", program);
    eprintln!("  {} auth <owner/repo> <token>", program);
    eprintln!("  {} runs [limit]", program);
    eprintln!("  {} show <run-id>", program);
    process::exit(1);
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage(&args[0]);
    }

    let engine = Engine::new(EngineConfig::default());

    match args[1].as_str() {
        "run" => {
            if args.len() < 3 {
                usage(&args[0]);
            }
            let repo = &args[2];
            let branch = args.get(3).map(String::as_str);
            let sha = args.get(4).map(String::as_str);

            match engine.run_manual(repo, branch, sha).await {
                Ok(record) => {
                    print_run(&record);
                }
                Err(e) => {
                    eprintln!("Run failed: {}", e);
                    process::exit(1);
                }
            }
        }
        "auth" => {
            if args.len() < 4 {
                usage(&args[0]);
            }
            if let Err(e) = engine.auth_store().store(&args[2], &args[3]) {
                eprintln!("Failed to store credential: {}", e);
                process::exit(1);
            }
            println!("Stored credential for {}", args[2]);
        }
        "runs" => {
            let limit = args
                .get(2)
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(10);
            match engine.run_store().list_recent_runs(limit) {
                Ok(runs) if runs.is_empty() => println!("No runs recorded yet."),
                Ok(runs) => {
                    for record in runs {
                        println!(
                            "{}  {:?}  {} @ {} ({})",
                            record.id,
                            record.status,
                            record.repo_name,
                            record.branch,
                            record.commit_sha
                        );
                    }
                }
                Err(e) => {
                    eprintln!("Failed to list runs: {}", e);
                    process::exit(1);
                }
            }
        }
        "show" => {
            if args.len() < 3 {
                usage(&args[0]);
            }
            match engine.run_store().get_run(&args[2]) {
                Ok(record) => print_run(&record),
                Err(e) => {
                    eprintln!("{}", e);
                    process::exit(1);
                }
            }
        }
        other => {
            eprintln!("Unknown command: {}", other);
            usage(&args[0]);
        }
    }
}

fn print_run(record: &RunRecord) {
    println!("Run {} - {:?}", record.id, record.status);
    println!(
        "  {} @ {} ({})",
        record.repo_name, record.branch, record.commit_sha
    );

    let mut job_names: Vec<&String> = record.results.keys().collect();
    job_names.sort();
    for name in job_names {
        let job = &record.results[name];
        println!("  {}: {:?}", name, job.status);
        if job.status == JobStatus::Skipped {
            continue;
        }
        for step in &job.steps {
            println!("    {} - {:?}", step.name, step.status);
            for line in step.logs.lines() {
                println!("      | {}", line);
            }
        }
    }
}
