//! Interactive questionnaire over stdin/stdout against a running API.

use anyhow::{Context, Result};
use tokio::io::{self, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

use crate::client::api::{ApiClient, FlowBackend};
use crate::client::flow::{Phase, QuestionnaireFlow};
use crate::client::questions::{FieldKind, StaticQuestion};
use crate::client::report::render_phase;

pub async fn run(base_url: &str) -> Result<()> {
    info!("Starting questionnaire against {base_url}");
    let mut flow = QuestionnaireFlow::new(ApiClient::new(base_url));
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    stdout
        .write_all(b"Study abroad advisor: answer a few questions to get your report.\n\n")
        .await?;

    loop {
        if matches!(flow.phase(), Phase::Failed(_)) {
            write_phase(&mut stdout, &flow).await?;
            if !confirm(&mut stdout, &mut lines, "Try again? [y/N] ").await? {
                return Ok(());
            }
            stdout.write_all(b"\nRetrying...\n").await?;
            flow.retry().await;
            continue;
        }
        if flow.phase().is_terminal() {
            write_phase(&mut stdout, &flow).await?;
            return Ok(());
        }

        let prompt = prompt_for(&flow);
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            stdout.write_all(b"\nInput closed, exiting.\n").await?;
            return Ok(());
        };

        if matches!(flow.phase(), Phase::DynamicStep(_)) {
            stdout.write_all(b"Thinking...\n").await?;
        }
        if let Err(e) = flow.submit(&line).await {
            stdout.write_all(format!("  {}\n", e.message).as_bytes()).await?;
        }
    }
}

fn prompt_for<B: FlowBackend>(flow: &QuestionnaireFlow<B>) -> String {
    if let Some(q) = flow.static_question() {
        return static_prompt(q);
    }
    match (flow.phase(), flow.dynamic_question()) {
        (Phase::DynamicStep(j), Some(q)) => {
            let mut text = format!("\n[Follow-up {j}] {}\n", q.question);
            if !q.reason.is_empty() {
                text.push_str(&format!("  ({})\n", q.reason));
            }
            text.push_str("> ");
            text
        }
        _ => "> ".to_string(),
    }
}

fn static_prompt(q: &StaticQuestion) -> String {
    let mut text = format!("{}\n", q.label);
    if let FieldKind::Select(options) = q.kind {
        for (i, option) in options.iter().enumerate() {
            text.push_str(&format!("  {}. {option}\n", i + 1));
        }
    } else if !q.placeholder.is_empty() {
        text.push_str(&format!("  {}\n", q.placeholder));
    }
    text.push_str("> ");
    text
}

async fn write_phase<B: FlowBackend, W: AsyncWrite + Unpin>(
    out: &mut W,
    flow: &QuestionnaireFlow<B>,
) -> Result<()> {
    out.write_all(b"\n").await?;
    out.write_all(render_phase(flow.phase()).as_bytes()).await?;
    out.flush().await?;
    Ok(())
}

async fn confirm<W, R>(
    out: &mut W,
    lines: &mut io::Lines<R>,
    question: &str,
) -> Result<bool>
where
    W: AsyncWrite + Unpin,
    R: tokio::io::AsyncBufRead + Unpin,
{
    out.write_all(question.as_bytes()).await?;
    out.flush().await?;
    let answer = lines.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
