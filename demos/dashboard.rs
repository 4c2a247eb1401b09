//! Dashboard demo
//!
//! Prints each panel built from mock data. When `AGENTOPS_BASE_URL` is set,
//! also starts the task queue monitor against that API for a short while
//! and prints every derived update.

use std::sync::Arc;
use std::time::Duration;

use agentops::events::{ERROR_EVENT, UPDATE_EVENT};
use agentops::panels::{
    AgentCommunicationNetwork, AgentCoordinationControls, AgentPerformanceScoreboard, ApiLoadBalancing,
    BusinessTimelineCalendar, InterAgentCommunication, LeadPipeline, MarketAnalysis, Panel,
    ProjectStatusTracking,
};
use agentops::poller::config::BASE_URL_ENV;
use agentops::poller::PollEvent;
use agentops::services::AgentTaskQueueMonitoring;
use agentops::telemetry::{init_tracing, DEFAULT_FILTER};
use agentops::view::ViewModelStore;
use anyhow::Context;

fn print_panel<P: Panel>(panel: &P)
where
    P::View: serde::Serialize,
{
    println!("== {} ==", P::TITLE);
    match serde_json::to_string_pretty(&*panel.view()) {
        Ok(text) => println!("{}\n", text.lines().take(12).collect::<Vec<_>>().join("\n")),
        Err(e) => println!("(failed to render: {})\n", e),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(DEFAULT_FILTER);
    println!("🚀 AgentOps Monitor - Dashboard Demo\n");

    let mut rng = rand::thread_rng();
    print_panel(&AgentCommunicationNetwork::new(&mut rng));
    print_panel(&AgentCoordinationControls::new(&mut rng));
    print_panel(&AgentPerformanceScoreboard::new(&mut rng));
    print_panel(&ApiLoadBalancing::new(&mut rng));
    print_panel(&BusinessTimelineCalendar::new(&mut rng));
    print_panel(&InterAgentCommunication::new(&mut rng));
    print_panel(&LeadPipeline::new(&mut rng));
    print_panel(&MarketAnalysis::new(&mut rng));
    print_panel(&ProjectStatusTracking::new(&mut rng));

    let base_url = match std::env::var(BASE_URL_ENV) {
        Ok(url) => url,
        Err(_) => {
            println!("Set {} to poll a live API.", BASE_URL_ENV);
            return Ok(());
        }
    };

    let monitor = AgentTaskQueueMonitoring::connect(&base_url).context("building queue monitor")?;
    let poller = monitor.poller();

    let store = Arc::new(ViewModelStore::new());
    let binding = store.bind(poller, &[UPDATE_EVENT], |snapshot| snapshot.derived.clone());
    poller.subscribe(ERROR_EVENT, |event| {
        if let PollEvent::Failed { tier, message } = event {
            eprintln!("tier {} failed: {}", tier, message);
        }
        Ok(())
    });

    poller.start().await.context("initial load")?;
    println!("Monitoring {} timers", poller.active_timers().len());

    let mut updates = store.subscribe();
    let deadline = tokio::time::sleep(Duration::from_secs(35));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                if let Some(derived) = state.ready() {
                    println!("queue health: {}", derived["queue_health"]["overall_score"]);
                }
            }
        }
    }

    binding.unbind(poller);
    poller.stop().await;
    println!("\n✅ Demo completed");
    Ok(())
}
