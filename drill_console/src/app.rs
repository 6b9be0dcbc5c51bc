use std::time::Duration;

use color_eyre::Result;
use drill_core::{
    ActionCategory, ActionId, DrillSession, Exit, FaultId, Phase, SessionError,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::unbounded_channel;
use tracing::{debug, info, warn};

use crate::command_text::{parse_command_line, ConsoleCommand, HELP_TEXT};
use crate::driver::{TickDriver, TickMessage};
use crate::xp::{XpLedger, FAILURE_PENALTY_XP, RETRY_COST_XP};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverEffect {
    #[default]
    Keep,
    Start,
    Stop,
}

/// Console output and side effects produced by one input or tick.
#[derive(Debug, Default, PartialEq)]
pub struct Reply {
    pub lines: Vec<String>,
    pub driver: DriverEffect,
    pub exit: bool,
}

impl Reply {
    fn line(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleOptions {
    pub json: bool,
    pub xp: i64,
}

pub struct ConsoleApp {
    session: DrillSession,
    xp: XpLedger,
    json: bool,
    log_mark: u64,
    attempt: u32,
    seed: u64,
    accepted: bool,
}

impl ConsoleApp {
    pub fn new(session: DrillSession, seed: u64, options: ConsoleOptions) -> Self {
        Self {
            session,
            xp: XpLedger::new(options.xp),
            json: options.json,
            log_mark: 0,
            attempt: 1,
            seed,
            accepted: false,
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &DrillSession {
        &self.session
    }

    pub fn xp(&self) -> &XpLedger {
        &self.xp
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.session.config().tick_period_ms)
    }

    pub fn intro(&mut self) -> Vec<String> {
        let mut lines = vec![format!(
            "Adversarial drill on track {} (seed {}). Type 'begin' to start, 'help' for commands.",
            self.session.track().id(),
            self.seed
        )];
        self.drain_log(&mut lines);
        lines
    }

    pub fn handle_line(&mut self, input: &str) -> Reply {
        match parse_command_line(input) {
            Ok(command) => self.handle_command(command),
            Err(err) => {
                warn!(target: "drill::console", input, error = %err, "command.rejected");
                Reply::line(format!("error: {err}"))
            }
        }
    }

    pub fn handle_command(&mut self, command: ConsoleCommand) -> Reply {
        debug!(target: "drill::console", ?command, "command.received");
        match command {
            ConsoleCommand::Begin => self.begin(),
            ConsoleCommand::Select(fault) => self.with_session(|session| session.select_fault(fault)),
            ConsoleCommand::Act { fault, action } => self.act(fault, action),
            ConsoleCommand::Status => Reply {
                lines: self.status_lines(),
                ..Reply::default()
            },
            ConsoleCommand::Actions => Reply {
                lines: palette_lines(),
                ..Reply::default()
            },
            ConsoleCommand::Debug => Reply {
                lines: self.debug_lines(),
                ..Reply::default()
            },
            ConsoleCommand::Retry => self.retry(),
            ConsoleCommand::Accept => self.accept(),
            ConsoleCommand::Exit => self.exit(),
            ConsoleCommand::Help => Reply {
                lines: HELP_TEXT.iter().map(|line| line.to_string()).collect(),
                ..Reply::default()
            },
        }
    }

    pub fn handle_tick(&mut self) -> Reply {
        let report = match self.session.tick() {
            Ok(report) => report,
            Err(err) => {
                debug!(target: "drill::console", error = %err, "tick.dropped");
                return Reply {
                    driver: DriverEffect::Stop,
                    ..Reply::default()
                };
            }
        };
        let mut reply = Reply::default();
        self.drain_log(&mut reply.lines);
        match report.transition {
            Some(Phase::Failed) => {
                reply.driver = DriverEffect::Stop;
                reply.lines.push(format!(
                    "Drill failed. Type 'retry' (-{RETRY_COST_XP} XP) or 'accept' (-{FAILURE_PENALTY_XP} XP)."
                ));
            }
            Some(Phase::Succeeded) => {
                reply.driver = DriverEffect::Stop;
                reply
                    .lines
                    .push("Drill passed. Type 'accept' to record the result.".to_string());
            }
            _ => {}
        }
        reply
    }

    /// Hands the session back to the caller. Sessions left before a
    /// terminal phase carry no score.
    pub fn into_exit(self) -> Exit {
        self.session.abort()
    }

    /// Input closed. A failed drill is settled as accepted.
    pub fn handle_eof(&mut self) -> Reply {
        if self.session.phase() == Phase::Failed {
            return self.accept();
        }
        Reply {
            driver: DriverEffect::Stop,
            exit: true,
            ..Reply::default()
        }
    }

    pub fn accepted(&self) -> bool {
        self.accepted
    }

    fn begin(&mut self) -> Reply {
        match self.session.begin() {
            Ok(()) => {
                let mut reply = Reply {
                    driver: DriverEffect::Start,
                    ..Reply::default()
                };
                self.drain_log(&mut reply.lines);
                reply
            }
            Err(err) => Reply::line(format!("error: {err}")),
        }
    }

    fn act(&mut self, fault: Option<FaultId>, action: ActionId) -> Reply {
        self.with_session(|session| {
            match fault {
                Some(fault) => session.apply_action_to(fault, action),
                None => session.apply_action(action),
            }
            .map(|_| ())
        })
    }

    fn with_session(
        &mut self,
        command: impl FnOnce(&mut DrillSession) -> Result<(), SessionError>,
    ) -> Reply {
        match command(&mut self.session) {
            Ok(()) => {
                let mut reply = Reply::default();
                self.drain_log(&mut reply.lines);
                reply
            }
            Err(err) => Reply::line(format!("error: {err}")),
        }
    }

    /// A failed drill must be settled through `accept` or `retry`.
    fn exit(&self) -> Reply {
        if self.session.phase() == Phase::Failed {
            return Reply::line(format!(
                "error: drill failed; type 'retry' (-{RETRY_COST_XP} XP) or 'accept' (-{FAILURE_PENALTY_XP} XP)"
            ));
        }
        Reply {
            lines: Vec::new(),
            driver: DriverEffect::Stop,
            exit: true,
        }
    }

    fn retry(&mut self) -> Reply {
        if self.session.phase() != Phase::Failed {
            return Reply::line("error: retry is only available after a failed drill");
        }
        if let Err(err) = self.session.reset() {
            return Reply::line(format!("error: {err}"));
        }
        let balance = self.xp.charge(RETRY_COST_XP, "retry");
        self.attempt += 1;
        self.log_mark = 0;
        let mut reply = Reply::line(format!(
            "Retrying drill (-{RETRY_COST_XP} XP, balance {balance}). Type 'begin' when ready."
        ));
        self.drain_log(&mut reply.lines);
        reply
    }

    fn accept(&mut self) -> Reply {
        let Some(completion) = self.session.completion() else {
            return Reply::line("error: nothing to accept until the drill finishes");
        };
        self.accepted = true;
        let (success, final_health) = completion.signal();
        info!(
            target: "drill::console",
            success,
            final_health,
            attempt = self.attempt,
            "session.completed"
        );

        let mut lines = Vec::new();
        if success {
            let proof = completion.proof(
                self.session.track().id(),
                format!("drill-{:016x}-{}", self.seed, self.attempt),
            );
            lines.push(format!(
                "Competence verified: {:.0}% uptime, {} threat(s) neutralized.",
                proof.uptime, proof.failures_resolved
            ));
            if self.json {
                match serde_json::to_string(&proof) {
                    Ok(json) => lines.push(json),
                    Err(err) => lines.push(format!("error: {err}")),
                }
            } else {
                lines.push(format!("Session proof: {}", proof.session_id));
            }
        } else {
            let balance = self.xp.charge(FAILURE_PENALTY_XP, "failure");
            lines.push(format!(
                "Drill recorded as failed (-{FAILURE_PENALTY_XP} XP, balance {balance})."
            ));
        }
        Reply {
            lines,
            driver: DriverEffect::Stop,
            exit: true,
        }
    }

    fn status_lines(&self) -> Vec<String> {
        let snapshot = self.session.snapshot();
        if self.json {
            return match snapshot.to_json() {
                Ok(json) => vec![json],
                Err(err) => vec![format!("error: {err}")],
            };
        }
        let mut lines = vec![format!(
            "{} | uptime {:.0}% | T-{}s | active {} | neutralized {} | XP {}",
            snapshot.phase,
            snapshot.health,
            snapshot.time_remaining,
            snapshot.active_faults.len(),
            snapshot.threats_neutralized,
            self.xp.balance()
        )];
        for fault in &snapshot.active_faults {
            let marker = if snapshot.selected == Some(fault.id) { '>' } else { ' ' };
            lines.push(format!(
                "{marker} {} [{}] {}: {} (-{:.1}/tick)",
                fault.id, fault.severity, fault.title, fault.symptom, fault.decay_rate
            ));
        }
        lines
    }

    fn debug_lines(&self) -> Vec<String> {
        let Some(overlay) = self.session.debug_overlay() else {
            return vec!["error: debug overlay disabled; restart with --debug".to_string()];
        };
        if self.json {
            return match serde_json::to_string(&overlay) {
                Ok(json) => vec![json],
                Err(err) => vec![format!("error: {err}")],
            };
        }
        let mut lines = vec![format!(
            "decay {:.1}/tick | period {}ms",
            overlay.total_decay, overlay.tick_period_ms
        )];
        for entry in overlay.entries {
            let remedy = entry
                .recommended
                .map(|action| action.as_str())
                .unwrap_or("-");
            let root_cause = self
                .session
                .state()
                .fault(entry.fault)
                .map(|fault| fault.root_cause)
                .unwrap_or("");
            lines.push(format!(
                "{} {} SOL: {} ({})",
                entry.fault, entry.kind, remedy, root_cause
            ));
        }
        lines
    }

    fn drain_log(&mut self, lines: &mut Vec<String>) {
        let log = self.session.state().log();
        lines.extend(log.since(self.log_mark).into_iter().map(ToString::to_string));
        self.log_mark = log.appended();
    }
}

fn palette_lines() -> Vec<String> {
    ActionCategory::ALL
        .into_iter()
        .map(|category| {
            let actions: Vec<String> = category
                .actions()
                .map(|action| format!("{} ({})", action, action.label()))
                .collect();
            format!("{}: {}", category.label(), actions.join(", "))
        })
        .collect()
}

/// Serialises stdin lines and timer ticks onto one task until the player
/// exits, accepts a result, or stdin closes.
pub async fn run_console(mut app: ConsoleApp) -> Result<(Exit, bool)> {
    let (tick_tx, mut tick_rx) = unbounded_channel::<TickMessage>();
    let mut driver = TickDriver::default();
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    let intro = app.intro();
    write_lines(&mut stdout, &intro).await?;

    loop {
        let reply = tokio::select! {
            line = input.next_line() => match line? {
                Some(line) if line.trim().is_empty() => Reply::default(),
                Some(line) => app.handle_line(&line),
                None => app.handle_eof(),
            },
            Some(message) = tick_rx.recv() => {
                if driver.accepts(message) {
                    app.handle_tick()
                } else {
                    debug!(target: "drill::console", generation = message.generation, "tick.stale");
                    Reply::default()
                }
            }
        };

        match reply.driver {
            DriverEffect::Start => {
                driver.start(app.tick_period(), tick_tx.clone());
            }
            DriverEffect::Stop => driver.stop(),
            DriverEffect::Keep => {}
        }
        write_lines(&mut stdout, &reply.lines).await?;
        if reply.exit {
            break;
        }
    }

    driver.stop();
    write_lines(&mut stdout, &[format!("XP balance {}", app.xp().balance())]).await?;
    let accepted = app.accepted();
    Ok((app.into_exit(), accepted))
}

async fn write_lines(stdout: &mut tokio::io::Stdout, lines: &[String]) -> Result<()> {
    for line in lines {
        stdout.write_all(line.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }
    stdout.flush().await?;
    Ok(())
}
