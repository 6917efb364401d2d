//! Test harness with testcontainers for integration testing.
//!
//! One Postgres container is shared by every test in the binary. Each test
//! gets its own freshly migrated database inside it, since report numbers
//! are counted per day across the whole table.

use anyhow::{Context, Result};
use axum::Router;
use server_core::kernel::test_dependencies::{MockLlm, MockTelegram, MockWhatsApp};
use server_core::kernel::{ServerDeps, TestDependencies};
use server_core::server::{build_app, AppOptions, AppState};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tempfile::TempDir;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

pub const TEST_VERIFY_TOKEN: &str = "test-verify-token";

/// Shared test infrastructure that persists across all tests.
struct SharedTestInfra {
    /// Server URL without a database name
    server_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

/// Global shared infrastructure - initialized once, reused by all tests.
static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .with_cmd(["-c", "max_connections=200"])
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;

        Ok(Self {
            server_url: format!("postgresql://postgres:postgres@{}:{}", pg_host, pg_port),
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }

    fn url_for(&self, database: &str) -> String {
        format!("{}/{}", self.server_url, database)
    }
}

/// Test harness that manages test infrastructure.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     let outcome = process_message(&text_message("628111", "..."), &ctx.deps).await;
/// }
/// ```
pub struct TestHarness {
    /// Pool for this test's private database
    pub db_pool: PgPool,
    /// Rule-based extraction, default policy
    pub deps: ServerDeps,
    /// Scriptable LLM, wired in only through [`TestHarness::deps_with`]
    pub llm: MockLlm,
    pub whatsapp: MockWhatsApp,
    pub telegram: MockTelegram,
    pub media_dir: TempDir,
    database: String,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        let infra = SharedTestInfra::get().await;
        self.db_pool.close().await;
        if let Ok(admin) = PgPool::connect(&infra.url_for("postgres")).await {
            let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS {} WITH (FORCE)", self.database))
                .execute(&admin)
                .await;
        }
    }
}

impl TestHarness {
    /// Creates and migrates a private database, then wires mock services.
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        let database = format!("test_{}", uuid::Uuid::new_v4().simple());
        let admin = PgPool::connect(&infra.url_for("postgres"))
            .await
            .context("Failed to connect to Postgres")?;
        sqlx::query(&format!("CREATE DATABASE {}", database))
            .execute(&admin)
            .await
            .context("Failed to create test database")?;
        admin.close().await;

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&infra.url_for(&database))
            .await
            .context("Failed to connect to test database")?;

        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run migrations")?;

        let llm = MockLlm::new();
        let whatsapp = MockWhatsApp::new();
        let telegram = MockTelegram::new();
        let media_dir = TempDir::new().context("Failed to create media dir")?;

        let deps = TestDependencies {
            llm: None,
            whatsapp: whatsapp.clone(),
            telegram: telegram.clone(),
            ..TestDependencies::new()
        }
        .into_server_deps(db_pool.clone(), media_dir.path());
        deps.media_storage.init().await?;

        Ok(Self {
            db_pool,
            deps,
            llm,
            whatsapp,
            telegram,
            media_dir,
            database,
        })
    }

    /// Deps sharing this harness's database and mocks, with adjusted
    /// settings.
    pub fn deps_with(&self, configure: impl FnOnce(TestDependencies) -> TestDependencies) -> ServerDeps {
        let base = TestDependencies {
            llm: None,
            whatsapp: self.whatsapp.clone(),
            telegram: self.telegram.clone(),
            ..TestDependencies::new()
        };
        configure(base).into_server_deps(self.db_pool.clone(), self.media_dir.path())
    }

    /// Router over the default deps, rate limiting off
    pub fn app(&self) -> Router {
        self.app_with(self.deps.clone())
    }

    pub fn app_with(&self, deps: ServerDeps) -> Router {
        build_app(
            AppState {
                deps,
                webhook_verify_token: TEST_VERIFY_TOKEN.to_string(),
            },
            AppOptions::default(),
        )
    }

    /// Let spawned notification and webhook tasks finish.
    pub async fn settle(&self) {
        tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;
    }
}
