//! 설정 로드 및 관리.
//!
//! 기본값 → JSON 설정 파일 → 환경변수(`HAWK_SECTION__FIELD`) 순으로 병합한다.
//! 런타임 변경(새로고침 주기 등)은 메모리에 반영하고 파일이 있으면 저장한다.

use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::error::CoreError;

/// 설정 파일 이름
const CONFIG_FILE_NAME: &str = "config.json";

/// 환경변수 접두사
const ENV_PREFIX: &str = "HAWK";

/// 설정 관리자
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// 현재 설정 (스레드 안전)
    config: Arc<RwLock<AppConfig>>,
    /// 설정 파일 경로 (없으면 메모리 전용)
    config_path: Option<PathBuf>,
    /// 환경변수 접두사
    env_prefix: String,
}

impl ConfigManager {
    /// 설정 로드
    ///
    /// `path`가 주어지면 해당 파일이 반드시 존재해야 한다.
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self, CoreError> {
        let config = Self::build(path, Some(env_prefix))?;
        config.validate()?;

        match path {
            Some(p) => info!("설정 로드 완료: {}", p.display()),
            None => info!("설정 로드 완료: 기본값 + 환경변수"),
        }

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path: path.map(Path::to_path_buf),
            env_prefix: env_prefix.to_string(),
        })
    }

    /// 메모리 전용 관리자 (파일 저장 없음)
    pub fn in_memory(config: AppConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            config_path: None,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// 기본값 + 파일 (+ 환경변수) 병합
    fn build(path: Option<&Path>, env_prefix: Option<&str>) -> Result<AppConfig, CoreError> {
        let defaults = Config::try_from(&AppConfig::default_config())
            .map_err(|e| CoreError::Config(format!("기본 설정 변환 실패: {e}")))?;

        let mut builder = Config::builder().add_source(defaults);
        if let Some(p) = path {
            builder = builder.add_source(File::from(p.to_path_buf()).format(FileFormat::Json));
        }
        if let Some(prefix) = env_prefix {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        builder
            .build()
            .and_then(|c| c.try_deserialize::<AppConfig>())
            .map_err(|e| CoreError::Config(format!("설정 병합 실패: {e}")))
    }

    /// 현재 설정 반환 (복제본)
    pub fn get(&self) -> AppConfig {
        self.config.read().clone()
    }

    /// 특정 필드만 업데이트 (검증 후 반영, 파일이 있으면 저장)
    ///
    /// 파일에는 파일 계층(기본값 + 파일)에 변경을 적용한 결과만 저장한다.
    /// 환경변수 값은 메모리에만 남는다.
    pub fn update_with<F>(&self, updater: F) -> Result<AppConfig, CoreError>
    where
        F: Fn(&mut AppConfig),
    {
        let mut candidate = self.get();
        updater(&mut candidate);
        candidate.validate()?;

        if let Some(path) = &self.config_path {
            let mut persisted = Self::build(Some(path), None)?;
            updater(&mut persisted);
            persisted.validate()?;
            Self::save_to_file(path, &persisted)?;
            debug!("설정 저장 완료: {}", path.display());
        }

        *self.config.write() = candidate.clone();
        Ok(candidate)
    }

    /// 설정 다시 로드
    pub fn reload(&self) -> Result<(), CoreError> {
        let config = Self::build(self.config_path.as_deref(), Some(&self.env_prefix))?;
        config.validate()?;
        *self.config.write() = config;
        info!("설정 다시 로드 완료");
        Ok(())
    }

    /// 설정 파일 경로 반환
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// 플랫폼별 기본 설정 파일 경로
    ///
    /// - macOS: `~/Library/Application Support/com.hawk.dashboard/config.json`
    /// - Linux: `~/.config/dashboard/config.json`
    /// - Windows: `%APPDATA%\hawk\dashboard\config\config.json`
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "hawk", "dashboard")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    fn save_to_file(path: &Path, config: &AppConfig) -> Result<(), CoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(config)?;
        fs::write(path, json)?;
        Ok(())
    }
}
