//! Workload command handlers

use anyhow::Result;

use crate::discovery::{ConsoleChecklist, Pick};
use crate::models::{Environment, Workload};
use crate::readiness::{ReadinessObserver, ReadinessState};
use crate::services::DeploymentService;

const TABLE_HEADERS: [&str; 6] = ["NAME", "NAMESPACE", "IMAGE", "STATUS", "CREATED", "CONTROLLED BY"];

/// Render workloads as an aligned table
pub fn render_table(workloads: &[Workload]) -> String {
    let rows: Vec<[String; 6]> = workloads
        .iter()
        .map(|w| {
            [
                w.name().to_string(),
                w.namespace().to_string(),
                w.image().to_string(),
                w.status().to_string(),
                w.created_at().format("%Y-%m-%d %H:%M:%S").to_string(),
                if w.controlled_by().is_empty() {
                    "-".to_string()
                } else {
                    w.controlled_by().join(",")
                },
            ]
        })
        .collect();

    let mut widths = TABLE_HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let headers = TABLE_HEADERS.map(str::to_string);
    for row in std::iter::once(&headers).chain(&rows) {
        let last = row.len() - 1;
        for (idx, cell) in row.iter().enumerate() {
            if idx == last {
                out.push_str(cell);
            } else {
                out.push_str(&format!("{:<width$}  ", cell, width = widths[idx]));
            }
        }
        out.push('\n');
    }
    out
}

/// Prints readiness progress to stderr and dumps the log on timeout
pub struct ConsoleReadiness {
    max_cycles: u32,
    last: Option<ReadinessState>,
}

impl ConsoleReadiness {
    pub fn new(max_cycles: u32) -> Self {
        Self {
            max_cycles,
            last: None,
        }
    }
}

impl ReadinessObserver for ConsoleReadiness {
    fn on_progress(&mut self, cycle: u32, state: &ReadinessState) {
        // Repeated states only show up in the debug log
        if self.last.as_ref() != Some(state) {
            eprintln!("[{}/{}] {}", cycle, self.max_cycles, state);
            self.last = Some(state.clone());
        }
    }

    fn on_timeout(&mut self, log: &str) {
        eprintln!("--- last log output ---");
        eprintln!("{}", log.trim_end());
        eprintln!("-----------------------");
    }
}

/// `discover`: print every workload in `env`
pub async fn handle_discover(service: &DeploymentService, env: &Environment) -> Result<()> {
    let workloads = service.discover(env, &mut ConsoleChecklist).await?;
    if workloads.is_empty() {
        println!("No workloads found in {}", env);
    } else {
        print!("{}", render_table(&workloads));
    }
    Ok(())
}

/// `exec`: run a command in the selected workload and return its exit code
pub async fn handle_exec(
    service: &DeploymentService,
    env: &Environment,
    pick: Pick,
    command: &[String],
) -> Result<i32> {
    service.exec(env, pick, command, &mut ConsoleChecklist).await
}

/// `wait`: block until the deployment reports completion
pub async fn handle_wait(service: &DeploymentService, env: &Environment) -> Result<()> {
    let mut observer = ConsoleReadiness::new(service.config().readiness.max_cycles.max(1));
    service
        .wait_ready(env, &mut observer, &mut ConsoleChecklist)
        .await?;
    println!("Deployment complete");
    Ok(())
}

/// `check-logs`: scan workload logs, failing on findings unless `ignore_errors`
pub async fn handle_check_logs(
    service: &DeploymentService,
    env: &Environment,
    ignore_errors: bool,
) -> Result<()> {
    let report = service.check_logs(env, &mut ConsoleChecklist).await?;
    print!("{}", report);

    if ignore_errors {
        if report.has_errors() {
            tracing::warn!(
                "Ignoring {} error line(s) in {}",
                report.findings().len(),
                env
            );
        }
        return Ok(());
    }
    report.into_result()?;
    Ok(())
}
