// src/config/cookie.rs

use crate::{
    config::ExternalConfig,
    constants,
    error::{AppError, AppResult},
};
use anyhow::{Context, anyhow};
use log::{debug, info};
use std::{fs, path::PathBuf};

pub(super) fn get_config_path() -> AppResult<PathBuf> {
    let path = dirs::home_dir()
        .ok_or_else(|| AppError::Other(anyhow!("无法获取用户主目录")))?
        .join(constants::CONFIG_DIR_NAME)
        .join(constants::CONFIG_FILE_NAME);
    Ok(path)
}

pub(crate) fn load_or_create_external_config() -> AppResult<ExternalConfig> {
    let config_path = get_config_path()?;
    if config_path.is_file() {
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("读取配置文件 '{}' 失败", config_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件 '{}' 失败", config_path.display()))
            .map_err(AppError::from)
    } else {
        info!("配置文件 {:?} 不存在，将创建默认配置。", config_path);
        let config = ExternalConfig::default_app_config();

        if let Some(dir) = config_path.parent() {
            fs::create_dir_all(dir)?;
        }

        let json_content = serde_json::to_string_pretty(&config)?;
        fs::write(&config_path, json_content)?;

        Ok(config)
    }
}

/// 将某个学校的登录 Cookie 写入配置文件，供下次导入使用
pub fn save_cookie(school: &str, cookie: &str) -> AppResult<()> {
    if cookie.is_empty() {
        return Ok(());
    }

    let config_path = get_config_path()?;
    let mut config = load_or_create_external_config()?;
    config.cookies.insert(school.to_string(), cookie.to_string());

    let json_content = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, json_content)
        .with_context(|| format!("保存Cookie到 '{}' 失败", config_path.display()))?;

    info!("已将 '{}' 的 Cookie 保存至配置文件: {}", school, config_path.display());
    Ok(())
}

/// 依次从命令行参数、环境变量、配置文件中查找 Cookie，返回 (Cookie, 来源描述)
pub fn resolve_cookie(
    cli_cookie: Option<&str>,
    school: &str,
    saved: Option<&String>,
) -> (Option<String>, String) {
    if let Some(cookie) = cli_cookie && !cookie.is_empty() {
        debug!("使用来自命令行参数的 Cookie");
        return (Some(cookie.to_string()), "命令行参数".to_string());
    }
    if let Ok(cookie) = std::env::var(constants::COOKIE_ENV_VAR) && !cookie.is_empty() {
        debug!("使用来自环境变量 {} 的 Cookie", constants::COOKIE_ENV_VAR);
        return (Some(cookie), format!("环境变量 ({})", constants::COOKIE_ENV_VAR));
    }
    if let Some(cookie) = saved && !cookie.is_empty() {
        debug!("使用配置文件中 '{}' 的 Cookie", school);
        return (Some(cookie.clone()), "本地配置文件".to_string());
    }
    debug!("未找到 '{}' 可用的 Cookie", school);
    (None, "未找到".to_string())
}
