use std::sync::Arc;

use rand::RngCore;
use serde::Serialize;

use super::{mean, round1, Panel};
use crate::mock;
use crate::model::{ApiNode, BalancingStrategy, NodeHealth};

const NODE_COUNT: usize = 6;

/// Traffic share the strategy would route to one node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeShare {
    pub node: ApiNode,
    /// Share of traffic in `0..=100`; unhealthy nodes receive none
    pub traffic_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadBalancingView {
    pub strategy: BalancingStrategy,
    pub nodes: Vec<NodeShare>,
    pub healthy_nodes: usize,
    pub total_requests_per_second: f64,
    pub average_response_time_ms: f64,
}

/// API load balancing panel
#[derive(Debug, Default)]
pub struct ApiLoadBalancing {
    nodes: Arc<Vec<ApiNode>>,
    strategy: Option<BalancingStrategy>,
    region_filter: Option<String>,
}

/// Relative routing weight of a node under a strategy
fn routing_weight(node: &ApiNode, strategy: BalancingStrategy) -> f64 {
    if node.health == NodeHealth::Unhealthy {
        return 0.0;
    }
    match strategy {
        BalancingStrategy::RoundRobin => 1.0,
        BalancingStrategy::LeastConnections => 1.0 / (node.active_connections as f64 + 1.0),
        BalancingStrategy::Weighted => node.weight as f64,
        BalancingStrategy::ResponseTime => 1.0 / node.average_response_time_ms.max(1.0),
    }
}

impl ApiLoadBalancing {
    pub fn new(rng: &mut dyn RngCore) -> Self {
        let mut panel = Self::default();
        panel.refresh(rng);
        panel
    }

    pub fn strategy(&self) -> BalancingStrategy {
        self.strategy.unwrap_or(BalancingStrategy::RoundRobin)
    }

    pub fn set_strategy(&mut self, strategy: BalancingStrategy) {
        self.strategy = Some(strategy);
    }

    pub fn filter_region(&mut self, region: Option<&str>) {
        self.region_filter = region.map(str::to_string);
    }
}

impl Panel for ApiLoadBalancing {
    type View = LoadBalancingView;
    const TITLE: &'static str = "API Load Balancing";

    fn refresh(&mut self, rng: &mut dyn RngCore) {
        self.nodes = Arc::new(mock::api_nodes(rng, NODE_COUNT));
    }

    fn view(&self) -> Arc<LoadBalancingView> {
        let strategy = self.strategy();
        let visible: Vec<&ApiNode> = self
            .nodes
            .iter()
            .filter(|n| self.region_filter.as_deref().map_or(true, |r| n.region == r))
            .collect();

        let weights: Vec<f64> = visible.iter().map(|n| routing_weight(n, strategy)).collect();
        let total_weight: f64 = weights.iter().sum();

        let nodes = visible
            .iter()
            .zip(&weights)
            .map(|(node, weight)| NodeShare {
                node: (*node).clone(),
                traffic_percent: if total_weight > 0.0 {
                    round1(weight / total_weight * 100.0)
                } else {
                    0.0
                },
            })
            .collect();

        Arc::new(LoadBalancingView {
            strategy,
            nodes,
            healthy_nodes: visible.iter().filter(|n| n.health == NodeHealth::Healthy).count(),
            total_requests_per_second: round1(visible.iter().map(|n| n.requests_per_second).sum()),
            average_response_time_ms: round1(mean(visible.iter().map(|n| n.average_response_time_ms))),
        })
    }
}
