//! # pmapi-app
//!
//! pmproxy PMAPI 클라이언트 바이너리 진입점.
//! 설정 로드, 어댑터 와이어링, 서브커맨드 실행.

mod query;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use pmapi_core::config::AppConfig;
use pmapi_core::config_manager::ConfigManager;
use pmapi_core::models::context::ContextId;
use pmapi_core::ports::pmapi::PmApi;
use pmapi_network::{PmApiClient, ReqwestTransport};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::query::{ensure_all_found, QueryRunner};

/// pmproxy PMAPI 클라이언트
///
/// Performance Co-Pilot 메트릭을 pmproxy REST API로 조회한다.
#[derive(Parser, Debug)]
#[command(name = "pmapi")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// pmproxy URL (기본: 설정 파일 또는 http://localhost:44322)
    #[arg(long, short = 'u', global = true)]
    url: Option<String>,

    /// 컨텍스트를 바인딩할 컨테이너 이름
    #[arg(long, short = 'c', global = true)]
    container: Option<String>,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 새 컨텍스트 생성
    Context,
    /// 메트릭 메타데이터 조회
    Metadata {
        /// 메트릭 이름
        #[arg(required = true)]
        names: Vec<String>,
        /// 누락된 메트릭이 있으면 실패
        #[arg(long)]
        strict: bool,
    },
    /// 메트릭 인스턴스 도메인 조회
    Instances {
        name: String,
        /// 기존 컨텍스트 ID (없으면 익명 조회)
        #[arg(long)]
        context: Option<u64>,
    },
    /// 메트릭 현재값 조회
    Fetch {
        #[arg(required = true)]
        names: Vec<String>,
        /// 기존 컨텍스트 ID (없으면 익명 조회)
        #[arg(long)]
        context: Option<u64>,
    },
    /// 사용 가능한 컨테이너 목록
    Containers,
    /// 컨텍스트 생성부터 값 조회까지 전체 질의
    Query {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

/// 설정 로드 (파일 + 환경변수) 후 CLI 인자로 오버라이드
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => ConfigManager::with_path(path.clone())
            .with_context(|| format!("설정 로드 실패: {}", path.display()))?
            .get(),
        None => match ConfigManager::new() {
            Ok(manager) => manager.get(),
            Err(e) => {
                warn!("설정 파일 사용 불가, 기본값 사용: {e}");
                AppConfig::default_config()
            }
        },
    };

    if let Some(url) = &args.url {
        config.pmproxy.url = url.clone();
    }
    if let Some(container) = &args.container {
        config.pmproxy.container = Some(container.clone());
    }

    config.validate().context("설정 검증 실패")?;
    Ok(config)
}

/// 설정으로부터 PMAPI 클라이언트 구성
fn build_client(config: &AppConfig) -> Result<Arc<dyn PmApi>> {
    let transport = ReqwestTransport::new(config.pmproxy.request_timeout())
        .context("HTTP 전송 초기화 실패")?;
    let client = PmApiClient::new(Arc::new(transport), config.request.to_request_options());
    Ok(Arc::new(client))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(command: Command, config: &AppConfig, api: Arc<dyn PmApi>) -> Result<()> {
    let url = config.base_url();
    let container = config.pmproxy.container();

    match command {
        Command::Context => {
            let context = api.create_context(url, container).await?;
            print_json(&context)
        }
        Command::Metadata { names, strict } => {
            let context = api.create_context(url, container).await?;
            let metadata = api
                .get_metric_metadata(url, context.context, &names)
                .await?;
            if strict {
                ensure_all_found(&names, &metadata)?;
            } else {
                let missing = metadata.missing_names(&names);
                if !missing.is_empty() {
                    warn!("찾을 수 없는 메트릭: {}", missing.join(", "));
                }
            }
            print_json(&metadata)
        }
        Command::Instances { name, context } => {
            let indom = api
                .get_metric_instances(url, context.map(ContextId), &name)
                .await?;
            print_json(&indom)
        }
        Command::Fetch { names, context } => {
            let values = api
                .get_metric_values(url, context.map(ContextId), &names)
                .await?;
            print_json(&values)
        }
        Command::Containers => {
            let containers = api.list_containers(url).await?;
            print_json(&containers)
        }
        Command::Query { names } => {
            let runner = QueryRunner::new(api, url, container.map(str::to_string));
            let result = runner.run(&names).await?;
            print_json(&result)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "pmapi={},pmapi_app={},pmapi_core={},pmapi_network={}",
        args.log_level, args.log_level, args.log_level, args.log_level
    );
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let config = load_config(&args)?;
    info!("pmproxy: {}", config.base_url());
    debug!("설정: {config:?}");

    let api = build_client(&config)?;
    run(args.command, &config, api).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn cli_overrides_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let args = Args::parse_from([
            "pmapi",
            "--config",
            config_path.to_str().unwrap(),
            "--url",
            "http://pmproxy.internal:44322/",
            "--container",
            "web",
            "fetch",
            "kernel.all.load",
        ]);

        let config = load_config(&args).unwrap();
        assert_eq!(config.base_url(), "http://pmproxy.internal:44322");
        assert_eq!(config.pmproxy.container(), Some("web"));
        assert!(config_path.exists());
        assert!(build_client(&config).is_ok());
    }

    #[test]
    fn invalid_url_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let args = Args::parse_from([
            "pmapi",
            "--config",
            config_path.to_str().unwrap(),
            "--url",
            "localhost",
            "context",
        ]);
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn parses_subcommands() {
        let args = Args::parse_from(["pmapi", "instances", "disk.dev.read", "--context", "7"]);
        match args.command {
            Command::Instances { name, context } => {
                assert_eq!(name, "disk.dev.read");
                assert_eq!(context, Some(7));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let args = Args::parse_from(["pmapi", "metadata", "a.b", "c.d", "--strict"]);
        assert!(matches!(
            args.command,
            Command::Metadata { ref names, strict: true } if names.len() == 2
        ));
    }
}
