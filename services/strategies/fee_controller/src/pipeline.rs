//! Estimator → attestation → policy pipeline
//!
//! ```text
//! [tick: feed + pool reader] ─┐
//!                             ├─▶ EstimatorStage ──(drop-oldest queue)──▶ PolicyStage ──▶ InstructionSink
//! [analysis interval] ────────┘
//! ```
//!
//! The estimator never waits on the policy engine. The policy stage handles one
//! recommendation at a time, so the decide → sign → commit sequence never interleaves.
//! On stop the estimator finishes its current cycle and closes the queue; the policy
//! stage drains what is queued. Both get a bounded grace period before being aborted.

use agent_shared::{Agent, AgentMetrics, BoundedQueue, MetricsCollector, PushOutcome};
use anyhow::{bail, Result};
use async_trait::async_trait;
use ethers::signers::LocalWallet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};
use types::{PoolId, SharedClock};
use vigil_config::{ControllerConfig, ScheduleConfig};

use crate::attestation::{AttestedRecommendation, Attestor};
use crate::estimator::MarketEstimator;
use crate::policy::PolicyEngine;
use crate::pool_reader::PoolStateReader;
use crate::price_feed::PriceFeed;
use crate::sink::InstructionSink;

/// External collaborators, injected so tests can substitute doubles
#[derive(Clone)]
pub struct PipelineDeps {
    pub feed: Arc<dyn PriceFeed>,
    pub pool_reader: Arc<dyn PoolStateReader>,
    pub sink: Arc<dyn InstructionSink>,
    pub clock: SharedClock,
}

pub type RecommendationQueue = BoundedQueue<AttestedRecommendation>;

pub struct EstimatorStage {
    estimator: MarketEstimator,
    feed: Arc<dyn PriceFeed>,
    pool_reader: Arc<dyn PoolStateReader>,
    attestor: Option<Arc<Attestor>>,
    queue: Arc<RecommendationQueue>,
    metrics: Arc<MetricsCollector>,
    pool_id: PoolId,
    decimals: (u8, u8),
    request_timeout: Duration,
}

impl EstimatorStage {
    pub fn estimator(&self) -> &MarketEstimator {
        &self.estimator
    }

    /// Refresh both price sources. Failures keep the last known values.
    pub async fn on_tick(&mut self) {
        self.metrics.increment_ticks();

        match time::timeout(self.request_timeout, self.feed.fetch()).await {
            Ok(Ok(quote)) => {
                self.estimator.record_external_price(quote.price);
            }
            Ok(Err(e)) => {
                self.metrics.increment_feed_failures();
                crate::log_network_warning!(
                    "External price unavailable ({}), keeping last known {:?}",
                    e,
                    self.estimator.last_external_price()
                );
            }
            Err(_) => {
                self.metrics.increment_feed_failures();
                crate::log_network_warning!(
                    "External price timed out after {:?}, keeping last known {:?}",
                    self.request_timeout,
                    self.estimator.last_external_price()
                );
            }
        }

        match self.pool_reader.read_slot(&self.pool_id).await {
            Ok(slot) => {
                let (d0, d1) = self.decimals;
                self.estimator.record_pool_state(&slot, d0, d1);
            }
            Err(e) => {
                self.metrics.increment_errors();
                warn!(pool = %self.pool_id, error = %e, "Pool state unavailable after retries");
            }
        }

        let snapshot = self.estimator.compute_snapshot();
        debug!(
            volatility = %snapshot.volatility,
            spread = %snapshot.spread,
            liquidity = snapshot.liquidity_depth,
            confidence = %snapshot.confidence,
            "Market metrics updated"
        );
    }

    /// Produce, attest and enqueue one recommendation
    pub fn on_analysis(&mut self) {
        let recommendation = self.estimator.analyze();
        self.metrics.increment_recommendations();
        crate::log_metrics!(
            "Recommendation {} bps (volatility {}, spread {}, confidence {})",
            recommendation.recommended_fee,
            recommendation.volatility,
            recommendation.spread,
            recommendation.confidence
        );

        let input = match &self.attestor {
            Some(attestor) => match attestor.attest(recommendation) {
                Ok(attested) => attested,
                Err(e) => {
                    self.metrics.increment_errors();
                    crate::log_error!("Attestation failed: {}", e);
                    AttestedRecommendation::unattested(recommendation)
                }
            },
            None => AttestedRecommendation::unattested(recommendation),
        };

        match self.queue.push(input) {
            PushOutcome::Enqueued => {}
            PushOutcome::DroppedOldest(stale) => {
                self.metrics.increment_dropped();
                debug!(
                    fee = stale.recommendation.recommended_fee,
                    "Dropped superseded recommendation"
                );
            }
            PushOutcome::Closed(_) => debug!("Queue closed, recommendation discarded"),
        }
    }

    pub async fn run(mut self, schedule: ScheduleConfig, mut shutdown: watch::Receiver<bool>) {
        let mut tick = time::interval(schedule.tick_interval());
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut analysis = time::interval_at(
            time::Instant::now() + schedule.analysis_interval(),
            schedule.analysis_interval(),
        );
        analysis.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !*shutdown.borrow() {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = tick.tick() => self.on_tick().await,
                _ = analysis.tick() => self.on_analysis(),
            }
        }

        self.queue.close();
        info!("Estimator stage stopped");
    }
}

pub struct PolicyStage {
    engine: PolicyEngine,
    sink: Arc<dyn InstructionSink>,
    queue: Arc<RecommendationQueue>,
    metrics: Arc<MetricsCollector>,
}

impl PolicyStage {
    pub fn engine(&self) -> &PolicyEngine {
        &self.engine
    }

    pub async fn handle(&mut self, input: AttestedRecommendation) {
        let outcome = match self.engine.process(&input) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.metrics.increment_errors();
                crate::log_error!("Policy processing failed: {}", e);
                return;
            }
        };

        if !outcome.decision.approved {
            self.metrics.increment_rejected();
            return;
        }
        self.metrics.increment_approved();

        if let Some(instruction) = outcome.instruction {
            match self.sink.submit(instruction).await {
                Ok(()) => self.metrics.increment_instructions(),
                Err(e) => {
                    self.metrics.increment_errors();
                    crate::log_error!("Instruction delivery failed: {}", e);
                }
            }
        }
    }

    pub async fn run(mut self) {
        while let Some(input) = self.queue.recv().await {
            self.handle(input).await;
        }
        info!(
            last_fee = self.engine.last_fee(),
            nonce = self.engine.nonce(),
            "Policy stage stopped"
        );
    }
}

pub struct FeeController {
    schedule: ScheduleConfig,
    metrics: Arc<MetricsCollector>,
    shutdown_tx: watch::Sender<bool>,
    stages: Option<(EstimatorStage, PolicyStage)>,
    tasks: Vec<JoinHandle<()>>,
}

impl FeeController {
    pub fn new(config: &ControllerConfig, wallet: LocalWallet, deps: PipelineDeps) -> Self {
        let metrics = Arc::new(MetricsCollector::new());
        let queue = Arc::new(BoundedQueue::new(config.schedule.queue_capacity));

        let attestor = config.policy.require_attestation.then(|| {
            Arc::new(Attestor::from_wallet(
                wallet.clone(),
                deps.clock.clone(),
                config.attestation.replay_guard(),
            ))
        });

        let estimator_stage = EstimatorStage {
            estimator: MarketEstimator::new(config.estimator.clone(), deps.clock.clone()),
            feed: deps.feed,
            pool_reader: deps.pool_reader,
            attestor: attestor.clone(),
            queue: queue.clone(),
            metrics: metrics.clone(),
            pool_id: config.network.pool_id,
            decimals: (config.network.token0_decimals, config.network.token1_decimals),
            request_timeout: config.network.request_timeout(),
        };

        let policy_stage = PolicyStage {
            engine: PolicyEngine::new(
                config.policy.clone(),
                wallet,
                config.network.pool_id,
                deps.clock,
                attestor,
            ),
            sink: deps.sink,
            queue,
            metrics: metrics.clone(),
        };

        let (shutdown_tx, _) = watch::channel(false);
        Self {
            schedule: config.schedule.clone(),
            metrics,
            shutdown_tx,
            stages: Some((estimator_stage, policy_stage)),
            tasks: Vec::new(),
        }
    }

    /// Stages before `start` takes them; lets callers drive cycles by hand
    pub fn stages_mut(&mut self) -> Option<(&mut EstimatorStage, &mut PolicyStage)> {
        self.stages.as_mut().map(|(e, p)| (e, p))
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }
}

#[async_trait]
impl Agent for FeeController {
    fn name(&self) -> &'static str {
        "fee_controller"
    }

    async fn start(&mut self) -> Result<()> {
        let Some((estimator_stage, policy_stage)) = self.stages.take() else {
            bail!("Fee controller already started");
        };

        let shutdown = self.shutdown_tx.subscribe();
        let schedule = self.schedule.clone();
        self.tasks
            .push(tokio::spawn(estimator_stage.run(schedule, shutdown)));
        self.tasks.push(tokio::spawn(policy_stage.run()));

        crate::log_success!(
            "Fee controller running: tick {:?}, analysis {:?}",
            self.schedule.tick_interval(),
            self.schedule.analysis_interval()
        );
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        // Receivers may already be gone if the tasks exited on their own
        let _ = self.shutdown_tx.send(true);

        let deadline = time::Instant::now() + self.schedule.shutdown_grace();
        for mut task in self.tasks.drain(..) {
            match time::timeout_at(deadline, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Pipeline task ended abnormally: {}", e),
                Err(_) => {
                    warn!(
                        "{} Pipeline task exceeded {:?} grace period, aborting",
                        crate::logging::LogEmoji::CLOCK,
                        self.schedule.shutdown_grace()
                    );
                    task.abort();
                }
            }
        }

        let m = self.metrics.get_metrics();
        crate::log_metrics!(
            "Shutdown after {:?}: ticks={} feed_failures={} recommendations={} dropped={} approved={} rejected={} instructions={} errors={}",
            self.metrics.uptime(),
            m.ticks,
            m.feed_failures,
            m.recommendations_produced,
            m.recommendations_dropped,
            m.approved,
            m.rejected,
            m.instructions_emitted,
            m.errors
        );
        Ok(())
    }

    fn metrics(&self) -> AgentMetrics {
        self.metrics.get_metrics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use crate::sink::ChannelSink;
    use crate::testing::{InMemoryPoolReader, ScriptedPriceFeed};
    use amm::{PoolSlot, Q96, U256};
    use rust_decimal_macros::dec;
    use tokio::sync::mpsc;
    use types::{DecisionReason, ManualClock, SignedInstruction};

    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    struct Harness {
        controller: FeeController,
        feed: Arc<ScriptedPriceFeed>,
        clock: Arc<ManualClock>,
        rx: mpsc::Receiver<SignedInstruction>,
    }

    fn harness(require_attestation: bool, queue_capacity: usize) -> Harness {
        let mut config = ControllerConfig::default();
        config.network.pool_id = PoolId([7; 32]);
        config.network.token0_decimals = 18;
        config.network.token1_decimals = 18;
        config.policy.require_attestation = require_attestation;
        config.schedule.queue_capacity = queue_capacity;

        let feed = Arc::new(ScriptedPriceFeed::new([dec!(1)]));
        let pool_reader = Arc::new(InMemoryPoolReader::new());
        pool_reader.set_slot(
            config.network.pool_id,
            PoolSlot {
                sqrt_price_x96: U256::from(Q96),
                liquidity: 1_000_000,
                ..Default::default()
            },
        );
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let (sink, rx) = ChannelSink::new(16);

        let deps = PipelineDeps {
            feed: feed.clone(),
            pool_reader,
            sink: Arc::new(sink),
            clock: clock.clone(),
        };
        Harness {
            controller: FeeController::new(&config, TEST_KEY.parse().unwrap(), deps),
            feed,
            clock,
            rx,
        }
    }

    #[tokio::test]
    async fn test_tick_records_both_sources() {
        let mut h = harness(false, 8);
        let (estimator, _) = h.controller.stages_mut().unwrap();
        estimator.on_tick().await;

        assert_eq!(estimator.estimator().last_external_price(), Some(dec!(1)));
        assert_eq!(estimator.estimator().last_pool_price(), Some(dec!(1)));
        assert_eq!(estimator.estimator().compute_snapshot().liquidity_depth, 1_000_000);
        assert_eq!(h.controller.metrics().ticks, 1);
    }

    #[tokio::test]
    async fn test_feed_failure_keeps_last_price() {
        let mut h = harness(false, 8);
        h.feed.push_failure(FeedError::Http { status: 503 });
        let (estimator, _) = h.controller.stages_mut().unwrap();

        estimator.on_tick().await;
        estimator.on_tick().await;

        assert_eq!(estimator.estimator().last_external_price(), Some(dec!(1)));
        assert_eq!(estimator.estimator().external_observations(), 1);
        let metrics = h.controller.metrics();
        assert_eq!(metrics.ticks, 2);
        assert_eq!(metrics.feed_failures, 1);
    }

    #[tokio::test]
    async fn test_attested_recommendation_becomes_instruction() {
        let mut h = harness(true, 8);
        let (estimator, policy) = h.controller.stages_mut().unwrap();
        estimator.on_tick().await;
        estimator.on_analysis();

        let input = estimator.queue.recv().await.unwrap();
        assert!(input.attestations.is_some());
        policy.handle(input).await;

        // Calm market recommends the 300 bps base fee; one step down from 3000
        let instruction = h.rx.recv().await.unwrap();
        assert_eq!(instruction.fee, 2_700);
        assert_eq!(instruction.nonce, 1);
        assert!(instruction.has_valid_signature());
        assert_eq!(policy.engine().last_fee(), 2_700);

        let metrics = h.controller.metrics();
        assert_eq!(metrics.approved, 1);
        assert_eq!(metrics.instructions_emitted, 1);
    }

    #[tokio::test]
    async fn test_stripped_attestation_is_rejected() {
        let mut h = harness(true, 8);
        let (estimator, policy) = h.controller.stages_mut().unwrap();
        estimator.on_tick().await;
        estimator.on_analysis();

        let mut input = estimator.queue.recv().await.unwrap();
        input.attestations = None;
        policy.handle(input).await;

        assert!(h.rx.try_recv().is_err());
        assert_eq!(policy.engine().nonce(), 0);
        assert_eq!(h.controller.metrics().rejected, 1);
    }

    #[tokio::test]
    async fn test_consecutive_cycles_need_fresh_timestamps() {
        let mut h = harness(true, 8);
        let (estimator, policy) = h.controller.stages_mut().unwrap();

        estimator.on_tick().await;
        estimator.on_analysis();
        let first = estimator.queue.recv().await.unwrap();
        policy.handle(first.clone()).await;

        // Same attestation again is a replay
        policy.handle(first).await;
        assert_eq!(policy.engine().nonce(), 1);

        h.clock.advance(30);
        estimator.on_analysis();
        let second = estimator.queue.recv().await.unwrap();
        policy.handle(second).await;
        assert_eq!(policy.engine().nonce(), 2);
        assert_eq!(policy.engine().last_fee(), 2_400);
    }

    #[tokio::test]
    async fn test_queue_drops_oldest_recommendation() {
        let mut h = harness(false, 2);
        let (estimator, _) = h.controller.stages_mut().unwrap();
        estimator.on_tick().await;

        for _ in 0..3 {
            estimator.on_analysis();
        }
        assert_eq!(estimator.queue.len(), 2);

        let metrics = h.controller.metrics();
        assert_eq!(metrics.recommendations_produced, 3);
        assert_eq!(metrics.recommendations_dropped, 1);
    }

    #[tokio::test]
    async fn test_low_confidence_cycle_is_rejected() {
        let mut h = harness(false, 8);
        let (estimator, policy) = h.controller.stages_mut().unwrap();

        // No observations yet: confidence stays at the 0.5 floor
        estimator.on_analysis();
        let input = estimator.queue.recv().await.unwrap();
        let decision = policy.engine().decide(&input.recommendation);
        assert_eq!(decision.reason, DecisionReason::LowConfidence);

        policy.handle(input).await;
        assert_eq!(h.controller.metrics().rejected, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_until_stopped() {
        let mut h = harness(false, 8);
        h.controller.start().await.unwrap();
        assert!(h.controller.is_running());
        assert!(h.controller.start().await.is_err());

        // Analysis fires at 30s and 60s
        tokio::time::sleep(Duration::from_secs(61)).await;
        h.controller.stop().await.unwrap();
        assert!(!h.controller.is_running());

        let mut fees = Vec::new();
        while let Some(instruction) = h.rx.recv().await {
            fees.push((instruction.nonce, instruction.fee));
        }
        assert_eq!(fees, vec![(1, 2_700), (2, 2_400)]);

        let metrics = h.controller.metrics();
        assert!(metrics.ticks >= 12);
        assert_eq!(metrics.recommendations_produced, 2);
        assert_eq!(metrics.errors, 0);
    }
}
