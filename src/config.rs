//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: SQLite 데이터베이스 경로 (필수)
//! - `ADMIN_USERNAME` / `ADMIN_PASSWORD`: 운영자 계정 (기본값 admin/admin)
//! - `HOST`: 서버 바인딩 주소
//! - `PORT`: 서버 포트 번호
//! - `SESSION_SWEEP_SECS`: 만료 세션 정리 주기 (초)

use std::env; // 환경변수 읽기 (env::var)
use std::time::Duration;

// #[derive(Debug, Clone)]: {:?} 출력과 .clone() 복제를 컴파일러가 자동 구현합니다.

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후 `main`에서 각 컴포넌트에 나눠 줍니다.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 데이터베이스 URL (예: "sqlite:data/storefront.db?mode=rwc")
    pub database_url: String,
    /// 운영자 로그인 이름
    pub admin_username: String,
    /// 운영자 비밀번호 (시작 시 argon2로 해싱한 뒤 원문은 버립니다)
    pub admin_password: String,
    /// 서버가 바인딩할 호스트 주소 (기본값: "0.0.0.0")
    pub host: String,
    /// 서버 포트 번호 (기본값: 8085)
    pub port: u16,
    /// 만료 세션 정리 주기 (기본값: 1시간)
    pub session_sweep_interval: Duration,
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// # 에러
    /// `DATABASE_URL`은 필수이며, 없으면 에러가 발생합니다.
    /// 나머지 설정은 기본값이 있어 환경변수가 없어도 동작합니다.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            // 파싱 실패 시에도 기본값으로 떨어집니다 (잘못된 PORT로 시작이 실패하지 않음).
            port: env::var("PORT")
                .unwrap_or_else(|_| "8085".to_string())
                .parse()
                .unwrap_or(8085),
            session_sweep_interval: Duration::from_secs(
                env::var("SESSION_SWEEP_SECS")
                    // Result → Option 변환 후 체이닝: 없거나, 숫자가 아니거나, 0이면 기본값
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(3600),
            ),
        })
    }

    /// 기본 계정(admin/admin)을 그대로 쓰는지 확인합니다. 시작 시 경고 로그에 사용합니다.
    pub fn uses_default_credentials(&self) -> bool {
        self.admin_username == "admin" && self.admin_password == "admin"
    }
}
