use hq_core::plan::Plan;
use hq_core::{ActivityStatus, OverallHealth, Severity, TickerKind};
use hq_intel::agent_status::AgentHealth;
use hq_intel::gateway::{DisconnectedGateway, LiveSession, StaticGateway};
use hq_intel::{
    Aggregator, FilePlanStore, IntelConfig, IntelError, IntelService, PlanContextProvider,
};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

struct StateTree {
    dir: TempDir,
}

impl StateTree {
    fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        fs::create_dir_all(dir.path().join("cron").join("runs")).expect("runs dir");
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn config(&self) -> IntelConfig {
        IntelConfig::from_state_dir(self.root())
    }

    fn write_runs(&self, job_id: &str, lines: &[String]) {
        let path = self.root().join("cron").join("runs").join(format!("{job_id}.jsonl"));
        fs::write(path, lines.join("\n")).expect("write run log");
    }

    fn write_goals(&self, agent_id: &str, content: &str) {
        let dir = self.root().join("agents-context").join(agent_id);
        fs::create_dir_all(&dir).expect("goals dir");
        fs::write(dir.join("goals.md"), content).expect("write goals");
    }

    fn write_plan(&self, name: &str, content: &str) {
        let dir = self.root().join("plans");
        fs::create_dir_all(&dir).expect("plans dir");
        fs::write(dir.join(name), content).expect("write plan");
    }

    fn aggregator(&self) -> Aggregator {
        let config = self.config();
        let plans = Arc::new(FilePlanStore::new(&config.plans_dir));
        Aggregator::new(&config, Arc::new(DisconnectedGateway), plans)
    }
}

fn run_line(ts: i64, status: &str, summary: &str) -> String {
    serde_json::json!({ "ts": ts, "status": status, "summary": summary, "durationMs": 1200 })
        .to_string()
}

#[tokio::test]
async fn deploy_failure_shows_as_doing_without_raising_a_blocker() {
    let tree = StateTree::new();
    tree.write_runs(
        "elon-deploy",
        &[
            run_line(1000, "ok", "deployed"),
            run_line(2000, "error", "BLOCKED: waiting on CI"),
        ],
    );

    let data = tree.aggregator().compute_at(2100).await.expect("snapshot");
    let elon = data.agent("elon").expect("elon present");
    assert_eq!(elon.doing.as_deref(), Some("BLOCKED: waiting on CI"));
    assert_eq!(elon.doing_timestamp, Some(2000));
    assert_eq!(elon.last_activity_ms, Some(2000));
    // recent activity, no live session and no goal blockers
    assert_eq!(elon.activity_status, ActivityStatus::Waiting);
    assert_eq!(elon.success_rate_24h, 50);
    assert_eq!(elon.activity_sparkline.len(), 2);

    assert!(data.blockers.is_empty());
    assert_eq!(data.blocked_agents, 0);
    assert_eq!(data.overall_health, OverallHealth::Green);
    assert_eq!(data.ticker.len(), 2);
    assert_eq!(data.ticker[0].ts, 2000);
    assert_eq!(data.ticker[0].kind, TickerKind::CronError);
    assert_eq!(data.ticker[0].agent_id, "elon");

    let scout = data.agent("scout").expect("scout present");
    assert_eq!(scout.activity_status, ActivityStatus::Offline);
    assert_eq!(scout.success_rate_24h, 100);
    assert!(scout.doing.is_none());
}

#[tokio::test]
async fn heartbeat_and_goal_blockers_are_reported_in_order() {
    let tree = StateTree::new();
    tree.write_runs(
        "henry-heartbeat",
        &[run_line(
            1500,
            "ok",
            "Fleet check\n**CEO Input Needed**: approve ad spend\nall else fine",
        )],
    );
    tree.write_goals("warren", "## Blockers\n- API key expired\n## Active\n- [ ] ship v2");
    tree.write_goals("quill", "## Blockers\n- waiting on Juan for brand voice\n");

    let data = tree.aggregator().compute_at(2100).await.expect("snapshot");
    assert_eq!(data.blockers.len(), 3);
    assert_eq!(data.blockers[0].severity, Severity::Critical);
    assert_eq!(data.blockers[0].summary, "CEO Input Needed: approve ad spend");
    assert_eq!(data.blockers[0].reported_by, "henry");
    assert_eq!(data.blockers[0].first_seen_ms, 1500);

    assert_eq!(data.blockers[1].reported_by, "warren");
    assert_eq!(data.blockers[1].severity, Severity::Warning);
    assert!(!data.blockers[1].requires_ceo);
    assert_eq!(data.blockers[1].first_seen_ms, 2100);
    assert_eq!(data.blockers[2].reported_by, "quill");
    assert!(data.blockers[2].requires_ceo);

    let warren = data.agent("warren").expect("warren");
    assert_eq!(warren.blockers, vec!["API key expired"]);
    assert_eq!(warren.active_goals, vec!["ship v2"]);
    assert!(warren.completed_goals.is_empty());
    assert_eq!(warren.activity_status, ActivityStatus::Blocked);

    assert_eq!(data.blocked_agents, 2);
    assert_eq!(data.overall_health, OverallHealth::Yellow);
}

#[tokio::test]
async fn plan_fields_are_empty_without_an_active_plan() {
    let tree = StateTree::new();
    tree.write_plan(
        "draft.json",
        r#"{"id":"draft","title":"Someday","status":"draft","phases":[{"id":"p1","name":"Build","status":"in-progress"}]}"#,
    );
    let data = tree.aggregator().compute_at(5_000).await.expect("snapshot");
    assert_eq!(data.plan_progress, 0);
    assert_eq!(data.current_phase, "");
    assert!(data.phases.is_empty());
    assert!(data.agents.iter().all(|agent| agent.plan_context.is_none()));
}

#[tokio::test]
async fn active_plan_feeds_phases_and_agent_context() {
    let tree = StateTree::new();
    tree.write_plan(
        "launch.json",
        r#"{
            "id": "launch", "title": "Launch", "status": "active", "updatedAt": 10,
            "phases": [{"id": "p1", "name": "Ship", "emoji": "🚀", "status": "in-progress"}],
            "subPlans": [{"id": "s1", "title": "Release", "parentPhaseId": "p1", "tasks": [
                {"id": "t1", "name": "Cut release", "assignedTo": "elon", "status": "in-progress"},
                {"id": "t2", "name": "Changelog", "assignedTo": "quill", "status": "completed"}
            ]}]
        }"#,
    );
    let data = tree.aggregator().compute_at(5_000).await.expect("snapshot");
    assert_eq!(data.plan_progress, 50);
    assert_eq!(data.current_phase, "🚀 Ship");
    assert_eq!(data.phases.len(), 1);
    assert_eq!(data.phases[0].agents, vec!["elon", "quill"]);

    let context = data
        .agent("elon")
        .and_then(|agent| agent.plan_context.clone())
        .expect("elon plan context");
    assert_eq!(context.task_name, "Cut release");
    assert_eq!(context.progress, 50);
}

struct CountingPlans {
    store: FilePlanStore,
    loads: AtomicUsize,
}

impl PlanContextProvider for CountingPlans {
    fn plans(&self) -> Vec<Plan> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.store.load_plans()
    }
}

#[tokio::test]
async fn plans_are_loaded_once_per_snapshot() {
    let tree = StateTree::new();
    tree.write_plan(
        "launch.json",
        r#"{
            "id": "launch", "title": "Launch", "status": "active",
            "phases": [{"id": "p1", "name": "Ship", "status": "in-progress"}],
            "subPlans": [{"id": "s1", "title": "Release", "parentPhaseId": "p1", "tasks": [
                {"id": "t1", "name": "Cut release", "assignedTo": "elon", "status": "pending"},
                {"id": "t2", "name": "Post", "assignedTo": "herald", "status": "pending"}
            ]}]
        }"#,
    );
    let config = tree.config();
    let plans = Arc::new(CountingPlans {
        store: FilePlanStore::new(&config.plans_dir),
        loads: AtomicUsize::new(0),
    });
    let aggregator = Aggregator::new(&config, Arc::new(DisconnectedGateway), plans.clone());

    let data = aggregator.compute_at(5_000).await.expect("snapshot");
    assert_eq!(plans.loads.load(Ordering::SeqCst), 1);
    assert_eq!(data.phases.len(), 1);
    assert!(data.agent("elon").and_then(|a| a.plan_context.as_ref()).is_some());
    assert!(data.agent("herald").and_then(|a| a.plan_context.as_ref()).is_some());
}

#[tokio::test]
async fn ticker_and_sparkline_stay_bounded_and_ordered() {
    let tree = StateTree::new();
    for job in ["elon-deploy", "elon-build", "scout-daily", "herald-news", "quill-blog", "tasks-sync", "ghost-x"] {
        let lines = (0..40)
            .map(|i| run_line(10_000 + i * 37 + job.len() as i64, if i % 3 == 0 { "error" } else { "ok" }, "tick"))
            .collect::<Vec<_>>();
        tree.write_runs(job, &lines);
    }
    let data = tree.aggregator().compute_at(20_000).await.expect("snapshot");

    assert!(data.ticker.len() <= 30);
    assert!(data.ticker.windows(2).all(|pair| pair[0].ts >= pair[1].ts));
    for agent in &data.agents {
        assert!(agent.activity_sparkline.len() <= 24);
        assert!(agent
            .activity_sparkline
            .windows(2)
            .all(|pair| pair[0].ts <= pair[1].ts));
        assert!(agent.success_rate_24h <= 100);
    }
    let elon = data.agent("elon").expect("elon");
    assert_eq!(elon.activity_sparkline.len(), 24);
}

#[tokio::test]
async fn service_caches_validates_and_reports_statuses() {
    let tree = StateTree::new();
    tree.write_runs("elon-deploy", &[run_line(1000, "ok", "deployed")]);
    fs::write(
        tree.root().join("cron").join("jobs.json"),
        r#"{"jobs":[{"id":"scout-daily","agentId":"scout","state":{"consecutiveErrors":3}}]}"#,
    )
    .expect("write registry");

    let now = chrono::Utc::now().timestamp_millis();
    let gateway = StaticGateway::new(vec![LiveSession {
        agent_id: "elon".to_string(),
        updated_at: now,
        key: None,
    }]);
    let config = tree.config();
    let plans = Arc::new(FilePlanStore::new(&config.plans_dir));
    let service = IntelService::new(config, Arc::new(gateway), plans);

    let first = service.snapshot().await.expect("first snapshot");
    let second = service.snapshot().await.expect("second snapshot");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(
        first.agent("elon").map(|agent| agent.activity_status),
        Some(ActivityStatus::Executing)
    );

    let err = service
        .agent_intelligence("Elon!")
        .await
        .expect_err("invalid id rejected");
    assert!(matches!(err, IntelError::InvalidAgentId(_)));
    assert_eq!(err.public_message(), "Invalid agent ID");
    assert!(service
        .agent_intelligence("ghost")
        .await
        .expect("well-formed id")
        .is_none());
    assert!(service
        .agent_intelligence("elon")
        .await
        .expect("elon")
        .is_some());

    assert!(matches!(
        service.run_history("../../etc/passwd", 10, 0),
        Err(IntelError::InvalidJobId(_))
    ));
    let page = service.run_history("elon-deploy", 10, 0).expect("history");
    assert_eq!(page.total, 1);

    let statuses = service.agent_statuses().await;
    let status = |id: &str| {
        statuses
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.status)
            .expect("agent status")
    };
    assert_eq!(status("scout"), AgentHealth::Error);
    assert_eq!(status("elon"), AgentHealth::Active);
    assert_eq!(status("henry"), AgentHealth::Offline);

    let fleet = service.fleet_run_stats();
    assert_eq!(fleet.total_jobs, 1);
    assert_eq!(fleet.total_runs, 1);
}
