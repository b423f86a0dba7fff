//! # Storefront 웹 서버 진입점
//!
//! 이 파일은 애플리케이션의 **시작점(entry point)**입니다.
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. SQLite 연결 풀 생성 및 마이그레이션 실행
//! 4. 상품 캐시 적재 (저장소가 비어 있으면 기본 상품 기록)
//! 5. 운영자 계정 준비 (비밀번호 해싱)
//! 6. 만료 세션 정리 작업 시작
//! 7. HTTP 서버 시작, 종료 신호를 받으면 정리 후 종료

use anyhow::Result; // 어떤 에러 타입이든 담을 수 있는 범용 Result (시작 실패 보고용)
// 라이브러리 크레이트(src/lib.rs)의 공개 항목을 가져옵니다. 통합 테스트도 같은 경로를 씁니다.
use storefront::{
    app,
    config::Config,
    db,
    routes::AppState,
    services::{credentials::AdminCredentials, sessions::SessionSweeper},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt}; // .with() / .init() 확장 메서드

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1단계: 환경변수 로딩 ──
    // .env 파일이 없어도 에러 없이 넘어갑니다.
    dotenvy::dotenv().ok();

    // ── 2단계: 로깅 초기화 ──
    // RUST_LOG가 없으면 storefront, tower_http, axum 모듈을 debug 레벨로 설정
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // ── 3단계: 설정 로딩 ──
    let config = Config::from_env()?;
    tracing::info!("Starting storefront server on {}:{}", config.host, config.port);

    if config.uses_default_credentials() {
        tracing::warn!("ADMIN_USERNAME/ADMIN_PASSWORD not set, using default operator credentials");
    }

    // ── 4단계: 저장소 연결 ──
    // 연결 실패나 마이그레이션 실패는 시작 실패로 처리합니다.
    tracing::info!("Connecting to store and running migrations...");
    let pool = db::connect(&config.database_url, 5).await?;

    // ── 5단계: 애플리케이션 상태 생성 ──
    let admin = AdminCredentials::new(&config.admin_username, &config.admin_password)?;
    let state = AppState::new(pool, admin);

    let cached = state.catalog.load(&state.pool).await?;
    tracing::info!("Catalog cache loaded with {} products", cached);

    // ── 6단계: 만료 세션 정리 작업 ──
    // state.sessions는 Arc이므로 clone()은 참조 카운트만 늘립니다 (같은 저장소를 공유).
    let sweeper = SessionSweeper::spawn(state.sessions.clone(), config.session_sweep_interval);

    // ── 7단계: 서버 시작 ──
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // 종료 신호(Ctrl+C, SIGTERM)를 받으면 진행 중인 요청을 마무리하고 반환합니다.
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    // tokio::select!: 두 future 중 먼저 끝나는 쪽을 기다리고 나머지는 취소합니다.
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
