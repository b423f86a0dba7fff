//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 저장소(SQLite)와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 서비스 계층(services/)과 라우트 핸들러(routes/)에서 이 모듈의 함수를 호출합니다.
//!
//! 세 개의 테이블을 컬렉션처럼 사용합니다:
//! - `products`: 상품
//! - `orders`: 처리 대기 중인 주문
//! - `delivered_orders`: 배송 완료된 주문
//!
//! 여러 컬렉션에 걸친 트랜잭션은 사용하지 않습니다. 조회/삽입/삭제/정렬만 사용하며,
//! 모든 호출은 `bounded()`로 감싸 `STORE_TIMEOUT` 안에 끝나지 않으면 에러로 처리합니다.
//!
//! 각 하위 모듈:
//! - `products`: 상품 CRUD 쿼리
//! - `orders`: 처리 대기/배송 완료 주문 쿼리
//! - `sequence`: 다음 productId/orderId 계산용 쿼리

pub mod orders;
pub mod products;
pub mod sequence;

use std::future::Future;
use std::time::Duration;

use sqlx::{migrate::Migrator, sqlite::SqlitePoolOptions, SqlitePool};

use crate::error::AppError;

/// 저장소 호출 하나에 허용하는 최대 시간
pub const STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// `./migrations` 폴더의 SQL 파일들을 컴파일 타임에 포함시킵니다.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// 저장소 호출을 제한 시간 안에서 실행합니다.
///
/// - 시간 초과 → `AppError::StoreTimeout`
/// - sqlx 에러 → `AppError::Database`
///
/// 재시도는 하지 않습니다.
pub async fn bounded<T, F>(op: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    // tokio::time::timeout은 Result를 한 겹 더 씌웁니다:
    // - 바깥 Err(Elapsed): 제한 시간 초과 (op는 이 시점에 drop되어 취소됨)
    // - 안쪽 Result: op 자체의 성공/실패
    match tokio::time::timeout(STORE_TIMEOUT, op).await {
        // AppError::from: #[from] 덕분에 sqlx::Error → AppError::Database 변환이 자동 구현됨
        Ok(result) => result.map_err(AppError::from),
        Err(_) => Err(AppError::StoreTimeout),
    }
}

/// 연결 풀을 만들고 아직 실행되지 않은 마이그레이션을 적용합니다.
///
/// 유휴 연결을 닫지 않도록 설정합니다. `sqlite::memory:`는 연결이 닫히면
/// 데이터가 사라지기 때문입니다.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(STORE_TIMEOUT)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect(database_url)
        .await?;

    MIGRATOR.run(&pool).await?;

    Ok(pool)
}

/// 연결 하나짜리 인메모리 저장소. 테스트에서 사용합니다.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    connect("sqlite::memory:", 1).await
}

/// 저장소가 응답하는지 확인합니다 (`SELECT 1`).
pub async fn ping(pool: &SqlitePool) -> Result<(), AppError> {
    bounded(sqlx::query("SELECT 1").execute(pool)).await?;
    Ok(())
}
