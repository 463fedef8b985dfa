// src/lib.rs

pub mod bridge;
pub mod canonical;
pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod extractor;
pub mod models;
pub mod symbols;
pub mod ui;
pub mod utils;
pub mod workflows;

use crate::{
    bridge::ConsoleBridge,
    cli::Cli,
    client::RobustClient,
    config::AppConfig,
    error::{AppError, AppResult},
    workflows::{ImportOptions, ImportOutcome},
};
use colored::*;
use log::{debug, info, warn};
use std::sync::{Arc, atomic::AtomicBool};

/// 一次导入所需的共享状态
#[derive(Clone)]
pub struct ImportJobContext {
    pub config: Arc<AppConfig>,
    pub http_client: Arc<RobustClient>,
    pub cancellation_token: Arc<AtomicBool>,
}

/// 库的公共入口点，由 `main.rs` 调用
pub async fn run_from_cli(args: Arc<Cli>, cancellation_token: Arc<AtomicBool>) -> AppResult<()> {
    debug!("CLI 参数: {:?}", args);
    let config = Arc::new(AppConfig::new(&args)?);
    debug!("加载的应用配置: {:?}", config);

    if args.list_schools {
        print_school_list(&config);
        return Ok(());
    }

    let school_key = args
        .school
        .clone()
        .ok_or_else(|| AppError::UserInputError("请使用 --school 指定学校".to_string()))?;
    let profile = config
        .school(&school_key)
        .ok_or_else(|| AppError::UnknownSchool(school_key.clone()))?;

    let cookie = if args.file.is_some() {
        None
    } else {
        resolve_session_cookie(&args, &config, &school_key)?
    };

    let http_client = Arc::new(RobustClient::new(&config, cookie)?);
    let context = ImportJobContext {
        config: config.clone(),
        http_client,
        cancellation_token,
    };
    let bridge = ConsoleBridge::new(config.output_dir.clone(), args.yes);
    let options = ImportOptions {
        school_key,
        file: args.file.clone(),
        url_override: args.url.clone(),
        campus: args.campus.clone(),
        semester: args.semester,
    };

    ui::print_header(&format!("导入课表: {}", profile.display_name));
    match workflows::run_import(&context, &bridge, &options).await? {
        ImportOutcome::Completed(summary) => {
            info!("'{}' 导入完成，共 {} 门课程", summary.school, summary.canonical_count);
        }
        ImportOutcome::Cancelled => {
            println!("\n{} 已取消导入，未保存任何数据。", *symbols::SKIP);
        }
    }
    Ok(())
}

fn resolve_session_cookie(args: &Cli, config: &AppConfig, school_key: &str) -> AppResult<Option<String>> {
    let prompted = if args.ask_cookie {
        Some(ui::prompt_hidden("请输入教务系统的 Cookie (输入内容不会显示)")?)
    } else {
        None
    };
    let cli_cookie = prompted.as_deref().or(args.cookie.as_deref());
    let (cookie, source) =
        config::cookie::resolve_cookie(cli_cookie, school_key, config.cookies.get(school_key));

    match &cookie {
        Some(value) => {
            info!("从 {} 加载 Cookie", source);
            println!("\n{} 已从 {} 加载 Cookie。", *symbols::INFO, source);
            if args.save_cookie {
                config::cookie::save_cookie(school_key, value)?;
                println!("{} Cookie 已保存，下次可直接使用。", *symbols::OK);
            }
        }
        None => {
            warn!("未找到 '{}' 的 Cookie", school_key);
            println!(
                "\n{}",
                format!(
                    "{} 未找到 Cookie，将以未登录状态访问教务系统。",
                    *symbols::WARN
                )
                .yellow()
            );
        }
    }
    Ok(cookie)
}

fn print_school_list(config: &AppConfig) {
    ui::print_header("可用的学校配置");
    for (key, profile) in &config.schools {
        let source = if profile.document_url.is_some() {
            "在线获取"
        } else {
            "需 --file"
        };
        println!(
            "  {:<8} {} {}",
            key.yellow(),
            profile.display_name,
            format!("[{:?}, {}]", profile.extractor, source).dimmed()
        );
    }
}
