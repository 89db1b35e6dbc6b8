use std::fmt::Formatter;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use tracing::info;

use peregrine_planning::classical::ground;
use peregrine_planning::heuristics::HeuristicKind;
use peregrine_planning::parsing::{find_domain_of, parse_domain, parse_problem};
use peregrine_planning::search::{parallel, run_search, AlgorithmKind, SearchResult, SearchTree};
use peregrine_planning::validation::PlanValidator;

/// Forward-search STRIPS planner for PDDL domain/problem files.
#[derive(Debug, Parser)]
#[command(name = "peregrine", rename_all = "kebab-case")]
struct Opt {
    /// If not set, a `domain.pddl` file is looked up in the directory of the
    /// problem file or in the parent directory.
    #[arg(long, short)]
    domain: Option<PathBuf>,
    problem: PathBuf,

    /// Search algorithm: bfs, astar, greedy, or parallel to race them.
    #[arg(long, short, default_value = "astar")]
    algorithm: String,

    /// Heuristic guiding astar and greedy: goal_count, h_add or h_max.
    #[arg(long, default_value = "h_add")]
    heuristic: HeuristicKind,

    /// Wall-clock search timeout in seconds.
    #[arg(long, short, default_value_t = 30.0)]
    timeout: f64,

    /// Replay the found plan through the validator before reporting it.
    #[arg(long)]
    validate: bool,

    /// Print the full result (plan records, metrics, search tree) as JSON.
    #[arg(long)]
    json: bool,

    /// Return failure with code 1 if the problem is not solved.
    #[arg(long)]
    expect_sat: bool,

    /// Return failure with code 1 if the problem is not proved unsolvable.
    #[arg(long)]
    expect_unsat: bool,

    /// If a plan is found, it will be written to the indicated file.
    #[arg(short = 'p', long = "plan")]
    plan_file: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let opt = Opt::parse();

    let problem_file = &opt.problem;
    ensure!(
        problem_file.exists(),
        "Problem file {} does not exist",
        problem_file.display()
    );
    let problem_file = problem_file.canonicalize()?;
    let domain_file = match opt.domain.clone() {
        Some(path) => path,
        None => find_domain_of(&problem_file)
            .context("Consider specifying the domain with the option -d/--domain")?,
    };

    let domain_text = std::fs::read_to_string(&domain_file)
        .with_context(|| format!("Could not read {}", domain_file.display()))?;
    let problem_text = std::fs::read_to_string(&problem_file)
        .with_context(|| format!("Could not read {}", problem_file.display()))?;

    let domain = parse_domain(&domain_text)?;
    let problem = parse_problem(&problem_text)?;
    let task = Arc::new(ground(&domain, &problem)?);
    info!(
        task = task.name.as_str(),
        actions = task.actions.len(),
        objects = task.objects.len(),
        "grounded task"
    );

    let timeout = Duration::from_secs_f64(opt.timeout);
    let result = if opt.algorithm == "parallel" {
        match parallel::race(&task, timeout) {
            Some(winner) => {
                info!(algorithm = %winner.algorithm, "race winner");
                winner.result
            }
            None => SearchResult {
                success: false,
                plan: vec![],
                nodes_expanded: 0,
                nodes_generated: 0,
                search_time_ms: timeout.as_secs_f64() * 1000.0,
                plan_length: 0,
                initial_h: 0.0,
                final_h: 0.0,
                tree: SearchTree::default(),
                error_message: Some("No algorithm found a solution".to_string()),
            },
        }
    } else {
        let algorithm: AlgorithmKind = opt.algorithm.parse().map_err(anyhow::Error::msg)?;
        run_search(task.clone(), algorithm, Some(opt.heuristic), timeout)
    };

    if result.success {
        println!("Got plan: {} actions", result.plan_length);
        println!("=============");
        for action in result.plan_names(&task) {
            println!("{action}");
        }
        if let Some(plan_file) = &opt.plan_file {
            let mut output =
                File::create(plan_file).with_context(|| format!("Option -p failed to create file {plan_file}"))?;
            for action in result.plan_names(&task) {
                writeln!(output, "{action}").context("Error while writing plan.")?;
            }
        }
        if opt.validate {
            let report = PlanValidator::new(task.clone()).validate(&result.plan);
            ensure!(
                report.valid,
                "Plan failed validation: {}",
                report.error_message.unwrap_or_default()
            );
            println!("Plan validated: {} steps", result.plan_length);
        }
    } else if let Some(message) = &result.error_message {
        println!("{message}");
    }

    if opt.json {
        let response = serde_json::json!({
            "success": result.success,
            "plan": result.plan_records(&task),
            "metrics": result.metrics(),
            "search_tree": &result.tree,
            "error_message": &result.error_message,
        });
        println!("{}", serde_json::to_string_pretty(&response)?);
    }

    let summary = Summary {
        solution: if result.success {
            Some(Solution::Sat)
        } else if result.error_message.as_deref() == Some("No solution exists") {
            Some(Solution::Unsat)
        } else {
            None
        },
        cost: result.success.then_some(result.plan_length as f64),
        runtime_ms: result.search_time_ms,
    };
    println!("{summary}");
    if opt.expect_sat && !summary.proved_sat() {
        std::process::exit(1);
    }
    if opt.expect_unsat && summary.solution != Some(Solution::Unsat) {
        std::process::exit(1);
    }
    Ok(())
}

struct Summary {
    solution: Option<Solution>,
    cost: Option<f64>,
    runtime_ms: f64,
}

impl Summary {
    pub fn proved_sat(&self) -> bool {
        self.solution == Some(Solution::Sat)
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[summary] solution:{} cost:{} runtime:{}ms",
            match self.solution {
                Some(Solution::Sat) => "SAT",
                Some(Solution::Unsat) => "UNSAT",
                None => "_",
            },
            self.cost.map_or_else(|| "_".to_string(), |cost| format!("{cost}")),
            self.runtime_ms.round() as u64
        )
    }
}

#[derive(Eq, PartialEq)]
enum Solution {
    Unsat,
    Sat,
}
