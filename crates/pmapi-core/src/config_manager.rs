//! 설정 파일 관리.
//!
//! 플랫폼별 설정 디렉토리에 JSON 파일로 설정을 저장/로드한다.
//! `PMAPI_URL`, `PMAPI_CONTAINER` 환경변수는 조회 시점에만 파일 값을 덮어쓴다
//! (파일에는 저장하지 않음). 환경변수는 관리자 생성 시점 값을 사용한다.

use crate::config::AppConfig;
use crate::error::PmApiError;
use directories::ProjectDirs;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// 설정 파일 이름
const CONFIG_FILE_NAME: &str = "config.json";

/// pmproxy URL 환경변수
pub const ENV_URL: &str = "PMAPI_URL";

/// 컨테이너 환경변수
pub const ENV_CONTAINER: &str = "PMAPI_CONTAINER";

/// 설정 관리자
///
/// 설정 파일의 로드/저장 및 런타임 설정 변경을 관리한다.
/// 내부에는 파일 내용 그대로를 보관하고, 환경변수는 [`ConfigManager::get`]에서만 적용한다.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
    config_path: PathBuf,
    env: HashMap<&'static str, String>,
}

impl ConfigManager {
    /// 플랫폼 기본 경로로 설정 관리자 생성
    ///
    /// 설정 파일이 없으면 기본 설정을 생성하고 저장한다.
    pub fn new() -> Result<Self, PmApiError> {
        let config_path = Self::config_dir()?.join(CONFIG_FILE_NAME);
        Self::with_path(config_path)
    }

    /// 지정된 경로로 설정 관리자 생성
    pub fn with_path(config_path: PathBuf) -> Result<Self, PmApiError> {
        Self::with_path_and_env(config_path, |key| std::env::var(key).ok())
    }

    /// 지정된 경로와 환경변수 조회 함수로 설정 관리자 생성
    pub fn with_path_and_env<F>(config_path: PathBuf, lookup: F) -> Result<Self, PmApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    PmApiError::Config(format!(
                        "설정 디렉토리 생성 실패: {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
                info!("설정 디렉토리 생성: {}", parent.display());
            }
        }

        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let default_config = AppConfig::default_config();
            Self::save_to_file(&config_path, &default_config)?;
            info!("기본 설정 파일 생성: {}", config_path.display());
            default_config
        };

        let env: HashMap<&'static str, String> = [ENV_URL, ENV_CONTAINER]
            .into_iter()
            .filter_map(|key| lookup(key).map(|value| (key, value)))
            .collect();

        let manager = Self {
            config: Arc::new(RwLock::new(config)),
            config_path,
            env,
        };
        manager.get().validate()?;
        Ok(manager)
    }

    /// 환경변수가 적용된 현재 설정 반환 (복제본)
    pub fn get(&self) -> AppConfig {
        apply_env_overrides(self.file_config(), |key| self.env.get(key).cloned())
    }

    /// 파일에 저장된 설정 반환 (환경변수 미적용)
    pub fn file_config(&self) -> AppConfig {
        self.config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// 설정 업데이트 및 파일 저장
    ///
    /// `new_config`는 파일 설정으로 저장된다. 검증은 환경변수 적용 후 값으로 한다.
    pub fn update(&self, new_config: AppConfig) -> Result<(), PmApiError> {
        apply_env_overrides(new_config.clone(), |key| self.env.get(key).cloned()).validate()?;
        Self::save_to_file(&self.config_path, &new_config)?;

        *self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = new_config;
        debug!("설정 저장 완료: {}", self.config_path.display());

        Ok(())
    }

    /// 파일 설정의 특정 필드만 업데이트
    pub fn update_with<F>(&self, updater: F) -> Result<AppConfig, PmApiError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.file_config();
        updater(&mut config);
        self.update(config.clone())?;
        Ok(config)
    }

    /// 설정 파일 경로 반환
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// 설정 다시 로드
    pub fn reload(&self) -> Result<(), PmApiError> {
        let config = Self::load_from_file(&self.config_path)?;
        apply_env_overrides(config.clone(), |key| self.env.get(key).cloned()).validate()?;

        *self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = config;
        info!("설정 다시 로드 완료");
        Ok(())
    }

    /// 플랫폼별 설정 디렉토리 경로
    ///
    /// Linux: `~/.config/pmapi/`, macOS: `~/Library/Application Support/io.pcp.pmapi/`
    pub fn config_dir() -> Result<PathBuf, PmApiError> {
        ProjectDirs::from("io", "pcp", "pmapi")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| PmApiError::Config("홈 디렉토리를 찾을 수 없습니다".to_string()))
    }

    fn load_from_file(path: &Path) -> Result<AppConfig, PmApiError> {
        let content = fs::read_to_string(path).map_err(|e| {
            PmApiError::Config(format!("설정 파일 읽기 실패: {}: {}", path.display(), e))
        })?;

        let config: AppConfig = serde_json::from_str(&content).map_err(|e| {
            PmApiError::Config(format!("설정 파일 파싱 실패: {}: {}", path.display(), e))
        })?;

        debug!("설정 파일 로드 완료: {}", path.display());
        Ok(config)
    }

    fn save_to_file(path: &Path, config: &AppConfig) -> Result<(), PmApiError> {
        let content = serde_json::to_string_pretty(config)?;

        fs::write(path, content).map_err(|e| {
            PmApiError::Config(format!("설정 파일 저장 실패: {}: {}", path.display(), e))
        })?;

        Ok(())
    }
}

/// 환경변수 값으로 설정 덮어쓰기. 빈 값은 무시한다.
pub fn apply_env_overrides<F>(mut config: AppConfig, lookup: F) -> AppConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_URL).filter(|v| !v.trim().is_empty()) {
        debug!("{ENV_URL} 환경변수 적용: {url}");
        config.pmproxy.url = url;
    }
    if let Some(container) = lookup(ENV_CONTAINER).filter(|v| !v.trim().is_empty()) {
        debug!("{ENV_CONTAINER} 환경변수 적용: {container}");
        config.pmproxy.container = Some(container);
    }
    config
}
